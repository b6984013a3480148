//! High-level API for answering questions about a transcript.
//!
//! We expose a single entry point (`Engine`) that wires the pipeline together:
//! parse → resolve intent and range → select evidence (with coverage) → draft or extract →
//! assemble.
//!
//! The engine holds no per-query state. One `Engine` can serve many queries, including
//! concurrently from several threads when the client is `Sync`.

use tracing::{info, info_span, warn};
use uuid::Uuid;

use crate::answer::{AnswerOrigin, AnswerResult};
use crate::ctx::{CallContext, CancelFlag};
use crate::error::{Error, Result};
use crate::evidence::{self, Selection};
use crate::extractive;
use crate::generator;
use crate::intent::{self, QueryIntent, Resolution, Scope};
use crate::llm::LlmClient;
use crate::opts::Opts;
use crate::parser::parse_transcript;
use crate::segments::SegmentIndex;

/// The transcript question-answering engine.
///
/// Typical usage:
/// - Construct once with an [`LlmClient`] (an HTTP client, or a test double).
/// - Call [`Engine::answer`] for each `(query, transcript)` pair.
///
/// Design notes:
/// - Every stage gets its own [`CallContext`], so each external call is bounded by the timeout
///   configured for that stage in [`Opts`].
/// - Collaborator failures never reach the caller. Intent falls back to `Unrelated`, relevance
///   ranking to "no evidence", and drafting to quoted segments.
/// - Time-range excerpts never call the model.
pub struct Engine<C: LlmClient> {
    client: C,
    opts: Opts,
}

impl<C: LlmClient> Engine<C> {
    /// Create an engine with default [`Opts`].
    pub fn new(client: C) -> Self {
        Self::with_opts(client, Opts::default())
    }

    pub fn with_opts(client: C, opts: Opts) -> Self {
        Self { client, opts }
    }

    /// Answer `user_query` about `transcript_text`.
    ///
    /// For a transcript with at least one valid cue this always returns an [`AnswerResult`];
    /// collaborator failures degrade to deterministic fallbacks. The only error is
    /// [`Error::Parse`] when the transcript has no valid cues.
    pub fn answer(&self, user_query: &str, transcript_text: &str) -> Result<AnswerResult> {
        self.answer_with_cancel(user_query, transcript_text, &CancelFlag::new())
    }

    /// Like [`Engine::answer`], but aborts with [`Error::Cancelled`] once `cancel` is set.
    pub fn answer_with_cancel(
        &self,
        user_query: &str,
        transcript_text: &str,
        cancel: &CancelFlag,
    ) -> Result<AnswerResult> {
        let request_id = Uuid::new_v4();
        let span = info_span!("answer", %request_id);
        let _guard = span.enter();

        let parsed = parse_transcript(transcript_text)?;
        self.answer_index(user_query, &parsed.index, cancel)
    }

    /// Answer against an already parsed transcript.
    pub fn answer_index(
        &self,
        user_query: &str,
        index: &SegmentIndex,
        cancel: &CancelFlag,
    ) -> Result<AnswerResult> {
        check_cancel(cancel)?;

        let resolution = intent::resolve(
            &self.client,
            user_query,
            index.duration(),
            &self.call_context(self.opts.classification_timeout, cancel),
        )?;

        let selection = evidence::select(
            &self.client,
            index,
            &resolution,
            user_query,
            &self.opts,
            &self.call_context(self.opts.embedding_timeout, cancel),
        )?;

        let result = self.respond(user_query, &resolution, selection, cancel)?;

        info!(
            status = ?result.status,
            origin = ?result.origin,
            evidence = result.evidence.len(),
            source = ?resolution.source,
            "query answered"
        );

        Ok(result)
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn opts(&self) -> &Opts {
        &self.opts
    }

    fn respond(
        &self,
        user_query: &str,
        resolution: &Resolution,
        selection: Selection,
        cancel: &CancelFlag,
    ) -> Result<AnswerResult> {
        let language = resolution.language;
        let range = resolution.range();

        match selection.intent {
            QueryIntent::Unrelated => Ok(AnswerResult::assemble(
                QueryIntent::Unrelated,
                extractive::insufficient(language),
                Vec::new(),
                AnswerOrigin::Extractive,
            )),

            QueryIntent::TimeRange { .. } => {
                // Scope is always a window for time-range intents; resolution enforces it.
                let Some(range) = range else {
                    return Err(Error::msg("time-range intent resolved without a window"));
                };
                let content = extractive::excerpt(
                    range,
                    &selection.evidence,
                    selection.coverage.as_ref(),
                    language,
                );
                Ok(AnswerResult::assemble(
                    selection.intent,
                    content,
                    selection.evidence,
                    AnswerOrigin::Extractive,
                ))
            }

            QueryIntent::Summary { .. } => {
                let drafted = generator::draft(
                    &self.client,
                    user_query,
                    &selection.evidence,
                    language,
                    &self.opts,
                    &self.call_context(self.opts.generation_timeout, cancel),
                );

                match drafted {
                    Ok(text) => {
                        // A partial window keeps its caveat ahead of the draft.
                        let content = match selection
                            .coverage
                            .as_ref()
                            .and_then(|c| c.caveat(language))
                        {
                            Some(caveat) => format!("{caveat}\n{text}"),
                            None => text,
                        };
                        Ok(AnswerResult::assemble(
                            selection.intent,
                            content,
                            selection.evidence,
                            AnswerOrigin::Model,
                        ))
                    }
                    Err(Error::Cancelled) => Err(Error::Cancelled),
                    Err(err) => {
                        warn!(error = %err, "falling back to extractive summary");
                        let sample = match resolution.scope {
                            Scope::Relevance => selection.evidence,
                            Scope::Range(_) | Scope::Whole => evidence::representative_sample(
                                &selection.evidence,
                                self.opts.fallback_sample_size,
                            ),
                        };
                        let content = extractive::summary(
                            range,
                            &sample,
                            selection.coverage.as_ref(),
                            language,
                        );
                        Ok(AnswerResult::assemble(
                            selection.intent,
                            content,
                            sample,
                            AnswerOrigin::Extractive,
                        ))
                    }
                }
            }
        }
    }

    fn call_context(
        &self,
        timeout: Option<std::time::Duration>,
        cancel: &CancelFlag,
    ) -> CallContext {
        CallContext::new(timeout, cancel.clone())
    }
}

fn check_cancel(cancel: &CancelFlag) -> Result<()> {
    if cancel.is_cancelled() {
        Err(Error::Cancelled)
    } else {
        Ok(())
    }
}
