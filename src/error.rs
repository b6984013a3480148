use std::error::Error as StdError;

use thiserror::Error;

/// The crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// The crate-wide error type.
///
/// Only [`Error::Parse`] and [`Error::Cancelled`] ever escape [`crate::Engine::answer`]. The
/// `*Unavailable` variants describe collaborator failures the engine recovers from locally; they
/// show up in logs and in the lower-level stage APIs, never in an answer.
///
/// This is intentionally decoupled from `anyhow` so downstream libraries aren't forced to
/// adopt `anyhow` in their own public APIs.
#[derive(Debug, Error)]
pub enum Error {
    /// The transcript contained zero valid timestamped cues.
    #[error("no valid transcript cues found ({lines} line(s) inspected)")]
    Parse { lines: usize },

    #[error("intent classification unavailable: {0}")]
    ClassificationUnavailable(String),

    #[error("draft generation unavailable: {0}")]
    GenerationUnavailable(String),

    #[error("embeddings unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// A completion or embedding collaborator failed at the transport level.
    #[error("llm client error: {0}")]
    Client(String),

    #[error("external call timed out")]
    TimedOut,

    #[error("operation cancelled by caller")]
    Cancelled,

    #[error("{0}")]
    Message(String),

    #[error(transparent)]
    Other(#[from] Box<dyn StdError + Send + Sync>),
}

impl Error {
    pub(crate) fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    /// Build a transport-level collaborator error.
    pub fn client(message: impl Into<String>) -> Self {
        Self::Client(message.into())
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Message(format!("{err:#}"))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Other(Box::new(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Other(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_mentions_inspected_lines() {
        let err = Error::Parse { lines: 3 };
        assert!(err.to_string().contains("3 line(s)"));
    }

    #[test]
    fn anyhow_errors_keep_their_context_chain() {
        let err: Error = anyhow::anyhow!("root cause").context("outer").into();
        let msg = err.to_string();
        assert!(msg.contains("outer"));
        assert!(msg.contains("root cause"));
    }
}
