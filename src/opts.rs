use std::time::Duration;

/// Options that control how a query is answered.
///
/// This struct represents *library-level configuration*, not CLI flags directly.
/// The CLI is responsible for mapping user input into this type so that:
/// - the library remains reusable outside of a CLI context
/// - other frontends (services, tests, batch jobs) can construct options programmatically
#[derive(Debug, Clone)]
pub struct Opts {
    /// Maximum number of segments kept by relevance ranking.
    pub top_k: usize,

    /// Minimum cosine similarity for a segment to count as relevant to the query.
    ///
    /// If no segment reaches it, the query is answered as unrelated to the transcript.
    pub min_similarity: f32,

    /// Number of segments quoted by the extractive summary fallback.
    pub fallback_sample_size: usize,

    /// Minimum number of distinct content tokens a model draft must share with its evidence.
    ///
    /// Drafts with fewer content tokens than this only need to share all of them.
    pub min_overlap_tokens: usize,

    /// Minimum share of the draft's content tokens that must appear in the evidence.
    pub min_overlap_ratio: f32,

    /// Timeout for the intent classification request. `None` disables it.
    pub classification_timeout: Option<Duration>,

    /// Timeout for the batched embedding request. `None` disables it.
    pub embedding_timeout: Option<Duration>,

    /// Timeout for the streaming draft completion. `None` disables it.
    pub generation_timeout: Option<Duration>,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            top_k: 6,
            min_similarity: 0.30,
            fallback_sample_size: 8,
            min_overlap_tokens: 2,
            min_overlap_ratio: 0.05,
            classification_timeout: Some(Duration::from_secs(20)),
            embedding_timeout: Some(Duration::from_secs(30)),
            generation_timeout: Some(Duration::from_secs(120)),
        }
    }
}

impl Opts {
    /// Apply the same timeout to every external call.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.classification_timeout = timeout;
        self.embedding_timeout = timeout;
        self.generation_timeout = timeout;
        self
    }
}
