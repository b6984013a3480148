use serde::Serialize;

use crate::evidence::Evidence;
use crate::intent::QueryIntent;

/// Whether the transcript could support an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerStatus {
    Answered,
    InsufficientEvidence,
}

/// How the answer text was produced. Informational only; status does not depend on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerOrigin {
    /// A validated model draft.
    Model,
    /// Quoted transcript segments.
    Extractive,
}

/// The engine's only externally visible output.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerResult {
    pub status: AnswerStatus,
    pub content: String,
    /// The evidence actually used for `content`, in chronological order.
    pub evidence: Vec<Evidence>,
    pub origin: AnswerOrigin,
}

impl AnswerResult {
    /// Package a final answer. Status is `InsufficientEvidence` exactly when the final intent is
    /// `Unrelated`, in which case no evidence is attached.
    pub fn assemble(
        intent: QueryIntent,
        content: String,
        evidence: Vec<Evidence>,
        origin: AnswerOrigin,
    ) -> Self {
        match intent {
            QueryIntent::Unrelated => Self {
                status: AnswerStatus::InsufficientEvidence,
                content,
                evidence: Vec::new(),
                origin,
            },
            QueryIntent::Summary { .. } | QueryIntent::TimeRange { .. } => Self {
                status: AnswerStatus::Answered,
                content,
                evidence,
                origin,
            },
        }
    }

    pub fn is_answered(&self) -> bool {
        self.status == AnswerStatus::Answered
    }
}
