//! Collaborator interfaces for the language model.
//!
//! The engine never talks to a concrete API. It needs two capabilities:
//! - [`CompletionClient`]: stream a chat completion as incremental text chunks
//! - [`EmbeddingClient`]: embed a batch of strings
//!
//! Anything implementing both is an [`LlmClient`]. The HTTP client in [`crate::openai`] and the
//! scripted doubles in the tests are just different implementations.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ctx::CallContext;
use crate::error::{Error, Result};

/// Role of a message in a chat request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A role-tagged chat message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// One item of a streamed completion.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatChunk {
    /// Incremental text.
    Delta(String),
    /// The completion marker. Nothing after it is read.
    Done,
}

/// A lazy, finite, non-restartable stream of completion chunks.
pub type ChatStream<'a> = Box<dyn Iterator<Item = Result<ChatChunk>> + 'a>;

pub trait CompletionClient {
    /// Start a streaming completion for `messages`.
    ///
    /// Implementations should bound transport time by `ctx.remaining()`.
    fn stream_chat<'a>(
        &'a self,
        messages: &[ChatMessage],
        ctx: &CallContext,
    ) -> Result<ChatStream<'a>>;
}

pub trait EmbeddingClient {
    /// Embed every input. Must return exactly one vector per input, in input order.
    fn embed_texts(&self, texts: &[String], ctx: &CallContext) -> Result<Vec<Vec<f32>>>;
}

/// The full collaborator surface the engine consumes.
pub trait LlmClient: CompletionClient + EmbeddingClient {}

impl<T: CompletionClient + EmbeddingClient + ?Sized> LlmClient for T {}

impl<T: CompletionClient + ?Sized> CompletionClient for &T {
    fn stream_chat<'a>(
        &'a self,
        messages: &[ChatMessage],
        ctx: &CallContext,
    ) -> Result<ChatStream<'a>> {
        (**self).stream_chat(messages, ctx)
    }
}

impl<T: EmbeddingClient + ?Sized> EmbeddingClient for &T {
    fn embed_texts(&self, texts: &[String], ctx: &CallContext) -> Result<Vec<Vec<f32>>> {
        (**self).embed_texts(texts, ctx)
    }
}

/// Drive a completion to the end and return the concatenated text.
///
/// The deadline and cancellation in `ctx` are checked before every chunk. Exhausting the
/// iterator without a [`ChatChunk::Done`] marker is accepted as the end of the stream.
pub fn complete<C: CompletionClient + ?Sized>(
    client: &C,
    messages: &[ChatMessage],
    ctx: &CallContext,
) -> Result<String> {
    ctx.check()?;
    let stream = client.stream_chat(messages, ctx)?;
    collect_stream(stream, ctx)
}

pub fn collect_stream(stream: ChatStream<'_>, ctx: &CallContext) -> Result<String> {
    let mut out = String::new();
    let mut chunks = 0usize;

    for item in stream {
        ctx.check()?;
        match item? {
            ChatChunk::Delta(text) => {
                chunks += 1;
                out.push_str(&text);
            }
            ChatChunk::Done => {
                debug!(chunks, chars = out.len(), "completion stream finished");
                return Ok(out);
            }
        }
    }

    debug!(chunks, "completion stream ended without a completion marker");
    Ok(out)
}

/// Embed `texts` and verify the collaborator kept its side of the contract.
pub fn embed_checked<E: EmbeddingClient + ?Sized>(
    client: &E,
    texts: &[String],
    ctx: &CallContext,
) -> Result<Vec<Vec<f32>>> {
    ctx.check()?;
    let vectors = client.embed_texts(texts, ctx)?;

    if vectors.len() != texts.len() {
        return Err(Error::msg(format!(
            "embedding count mismatch: sent {}, received {}",
            texts.len(),
            vectors.len()
        )));
    }

    if let Some(first) = vectors.first() {
        let dim = first.len();
        if dim == 0 || vectors.iter().any(|v| v.len() != dim) {
            return Err(Error::msg("embedding vectors have inconsistent dimensions"));
        }
    }

    Ok(vectors)
}

/// Cosine similarity; zero vectors score `0.0`.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut na2 = 0.0f32;
    let mut nb2 = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        na2 += x * x;
        nb2 += y * y;
    }
    if na2 == 0.0 || nb2 == 0.0 {
        0.0
    } else {
        dot / (na2.sqrt() * nb2.sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ctx::CancelFlag;

    struct Scripted(Vec<Result<ChatChunk>>);

    impl CompletionClient for Scripted {
        fn stream_chat<'a>(
            &'a self,
            _messages: &[ChatMessage],
            _ctx: &CallContext,
        ) -> Result<ChatStream<'a>> {
            let items: Vec<Result<ChatChunk>> = self
                .0
                .iter()
                .map(|r| match r {
                    Ok(c) => Ok(c.clone()),
                    Err(e) => Err(Error::client(e.to_string())),
                })
                .collect();
            Ok(Box::new(items.into_iter()))
        }
    }

    #[test]
    fn complete_stops_at_done_marker() -> anyhow::Result<()> {
        let client = Scripted(vec![
            Ok(ChatChunk::Delta("Hello ".into())),
            Ok(ChatChunk::Delta("there".into())),
            Ok(ChatChunk::Done),
            Ok(ChatChunk::Delta("ignored".into())),
        ]);
        let text = complete(&client, &[ChatMessage::user("hi")], &CallContext::default())?;
        assert_eq!(text, "Hello there");
        Ok(())
    }

    #[test]
    fn complete_accepts_exhausted_stream() -> anyhow::Result<()> {
        let client = Scripted(vec![Ok(ChatChunk::Delta("partial".into()))]);
        let text = complete(&client, &[], &CallContext::default())?;
        assert_eq!(text, "partial");
        Ok(())
    }

    #[test]
    fn complete_propagates_chunk_errors() {
        let client = Scripted(vec![
            Ok(ChatChunk::Delta("a".into())),
            Err(Error::client("connection reset")),
        ]);
        let err = complete(&client, &[], &CallContext::default()).unwrap_err();
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn complete_honours_cancellation() {
        let flag = CancelFlag::new();
        flag.cancel();
        let client = Scripted(vec![Ok(ChatChunk::Done)]);
        let err = complete(&client, &[], &CallContext::new(None, flag)).unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }

    struct FixedEmbeddings(Vec<Vec<f32>>);

    impl EmbeddingClient for FixedEmbeddings {
        fn embed_texts(&self, _texts: &[String], _ctx: &CallContext) -> Result<Vec<Vec<f32>>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn embed_checked_rejects_count_mismatch() {
        let client = FixedEmbeddings(vec![vec![1.0, 0.0]]);
        let texts = vec!["a".to_string(), "b".to_string()];
        let err = embed_checked(&client, &texts, &CallContext::default()).unwrap_err();
        assert!(err.to_string().contains("count mismatch"));
    }

    #[test]
    fn embed_checked_rejects_ragged_vectors() {
        let client = FixedEmbeddings(vec![vec![1.0, 0.0], vec![1.0]]);
        let texts = vec!["a".to_string(), "b".to_string()];
        assert!(embed_checked(&client, &texts, &CallContext::default()).is_err());
    }

    #[test]
    fn cosine_handles_zero_vectors() {
        assert_eq!(cosine(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert!((cosine(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
    }
}
