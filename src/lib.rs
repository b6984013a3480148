//! `transcript-qa`: retrieval-grounded question answering over timestamped transcripts.
//!
//! This crate provides:
//! - Transcript parsing into an ordered segment index
//! - Intent and time-range resolution (heuristics first, model fallback)
//! - Evidence selection by window, whole transcript, or embedding relevance
//! - Coverage reporting for windows the transcript only partly covers
//! - Model-drafted answers verified against their evidence, with an extractive fallback
//!
//! The language model is an external collaborator behind the [`llm`] traits. The engine holds
//! no global state and never persists anything.

// High-level API (most consumers should start here).
pub mod engine;
pub mod opts;

// Results and errors.
pub mod answer;
pub mod error;

// Transcript model and parsing.
pub mod parser;
pub mod segments;
pub mod timestamp;

// Pipeline stages.
pub mod coverage;
pub mod evidence;
pub mod extractive;
pub mod generator;
pub mod intent;
pub mod language;

// Collaborator interfaces and call context.
pub mod ctx;
pub mod llm;

#[cfg(feature = "openai")]
pub mod openai;

// Output selection and encoder interfaces.
pub mod answer_encoder;
pub mod output_type;

// Logging configuration and control.
#[cfg(feature = "logging")]
pub mod logging;

pub use answer::{AnswerOrigin, AnswerResult, AnswerStatus};
pub use ctx::{CallContext, CancelFlag};
pub use engine::Engine;
pub use error::{Error, Result};
pub use evidence::Evidence;
pub use intent::{Anchor, QueryIntent, TimeRangeSpec};
pub use llm::{ChatChunk, ChatMessage, ChatStream, CompletionClient, EmbeddingClient, LlmClient};
pub use opts::Opts;
pub use output_type::OutputType;
pub use segments::{Segment, SegmentIndex};

#[cfg(feature = "logging")]
pub use logging::init as init_logging;
