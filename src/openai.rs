//! Blocking client for OpenAI-compatible `/chat/completions` and `/embeddings` endpoints.
//!
//! Completions are requested with `stream: true` and consumed as server-sent events; the
//! `data: [DONE]` line becomes [`ChatChunk::Done`]. Every request uses the remaining time of its
//! [`CallContext`] as the transport timeout.

use std::io::{BufRead, BufReader};

use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ctx::CallContext;
use crate::error::{Error, Result};
use crate::llm::{ChatChunk, ChatMessage, ChatStream, CompletionClient, EmbeddingClient};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Connection and model settings.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API root, e.g. `https://api.openai.com/v1` or `http://localhost:11434/v1`.
    pub base_url: String,
    /// Sent as a bearer token when present.
    pub api_key: Option<String>,
    pub chat_model: String,
    pub embedding_model: String,
    pub temperature: f32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            chat_model: "gpt-4o-mini".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            temperature: 0.2,
        }
    }
}

pub struct OpenAiClient {
    http: Client,
    config: OpenAiConfig,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let http = Client::builder().build().map_err(transport)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    fn post(&self, path: &str, ctx: &CallContext) -> RequestBuilder {
        let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), path);
        let mut req = self.http.post(url);
        if let Some(key) = &self.config.api_key {
            req = req.bearer_auth(key);
        }
        if let Some(remaining) = ctx.remaining() {
            req = req.timeout(remaining);
        }
        req
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

impl CompletionClient for OpenAiClient {
    fn stream_chat<'a>(
        &'a self,
        messages: &[ChatMessage],
        ctx: &CallContext,
    ) -> Result<ChatStream<'a>> {
        let body = ChatRequest {
            model: &self.config.chat_model,
            messages,
            stream: true,
            temperature: self.config.temperature,
        };

        let resp = send(self.post("chat/completions", ctx).json(&body))?;
        debug!(model = %self.config.chat_model, "completion stream opened");
        Ok(Box::new(SseStream::new(BufReader::new(resp))))
    }
}

impl EmbeddingClient for OpenAiClient {
    fn embed_texts(&self, texts: &[String], ctx: &CallContext) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let body = EmbeddingRequest {
            model: &self.config.embedding_model,
            input: texts,
        };

        let resp = send(self.post("embeddings", ctx).json(&body))?;
        let mut parsed: EmbeddingResponse = resp.json().map_err(transport)?;

        // The API documents `index`; don't rely on response order.
        parsed.data.sort_by_key(|d| d.index);
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}

fn send(req: RequestBuilder) -> Result<Response> {
    req.send()
        .map_err(transport)?
        .error_for_status()
        .map_err(transport)
}

fn transport(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::TimedOut
    } else {
        Error::client(err.to_string())
    }
}

/// Server-sent-event reader yielding completion chunks.
struct SseStream<R: BufRead> {
    reader: R,
    done: bool,
}

impl<R: BufRead> SseStream<R> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            done: false,
        }
    }

    fn fail(&mut self, err: Error) -> Option<Result<ChatChunk>> {
        self.done = true;
        Some(Err(err))
    }
}

impl<R: BufRead> Iterator for SseStream<R> {
    type Item = Result<ChatChunk>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            let mut line = String::new();
            match self.reader.read_line(&mut line) {
                Ok(0) => {
                    self.done = true;
                    return None;
                }
                Ok(_) => {}
                Err(err) => return self.fail(Error::client(format!("stream read failed: {err}"))),
            }

            let Some(data) = line.trim().strip_prefix("data:") else {
                // Comments, `event:` lines, and keep-alive blanks.
                continue;
            };
            let data = data.trim();

            if data == "[DONE]" {
                self.done = true;
                return Some(Ok(ChatChunk::Done));
            }

            let chunk: StreamChunk = match serde_json::from_str(data) {
                Ok(chunk) => chunk,
                Err(err) => {
                    return self.fail(Error::client(format!("malformed stream chunk: {err}")));
                }
            };

            let text: String = chunk
                .choices
                .into_iter()
                .filter_map(|c| c.delta.content)
                .collect();
            if !text.is_empty() {
                return Some(Ok(ChatChunk::Delta(text)));
            }
        }
    }
}
