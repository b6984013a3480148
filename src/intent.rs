//! Intent and range resolution.
//!
//! Resolution is a two-tier cascade:
//! 1. [`heuristics`]: an ordered chain of pure matchers over known phrasings (absolute ranges,
//!    relative fractions, whole-video summary requests) in Chinese and English.
//! 2. [`classifier`]: one structured classification request to the model, used only when no
//!    heuristic matched.
//!
//! A heuristic hit always wins, so common time-range and summary queries never leave the process.

pub mod classifier;
pub mod heuristics;

use serde::Serialize;
use tracing::{debug, warn};

use crate::ctx::CallContext;
use crate::error::Error;
use crate::language::Language;
use crate::llm::CompletionClient;

/// Which end of the transcript a relative range is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    Head,
    Tail,
}

/// A requested time window, as the user phrased it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimeRangeSpec {
    #[default]
    None,
    Absolute {
        start_seconds: f64,
        end_seconds: f64,
    },
    Relative {
        anchor: Anchor,
        numerator: u32,
        denominator: u32,
    },
}

impl TimeRangeSpec {
    /// Build an absolute range, swapping reversed endpoints. Rejects negative or non-finite bounds.
    pub fn absolute(a: f64, b: f64) -> Option<Self> {
        if !a.is_finite() || !b.is_finite() || a < 0.0 || b < 0.0 {
            return None;
        }
        let (start_seconds, end_seconds) = if a <= b { (a, b) } else { (b, a) };
        Some(Self::Absolute {
            start_seconds,
            end_seconds,
        })
    }

    /// Build a relative range. The fraction must lie in `(0, 1]`.
    pub fn relative(anchor: Anchor, numerator: u32, denominator: u32) -> Option<Self> {
        if numerator == 0 || denominator == 0 || numerator > denominator {
            return None;
        }
        Some(Self::Relative {
            anchor,
            numerator,
            denominator,
        })
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Resolve to absolute seconds against the transcript duration.
    ///
    /// `Head` covers `[0, d·n/den]`; `Tail` covers `[d·(1 − n/den), d]`.
    pub fn resolve(&self, duration: f64) -> Option<ResolvedRange> {
        match *self {
            Self::None => None,
            Self::Absolute {
                start_seconds,
                end_seconds,
            } => Some(ResolvedRange {
                start_seconds,
                end_seconds,
            }),
            Self::Relative {
                anchor,
                numerator,
                denominator,
            } => {
                let fraction = f64::from(numerator) / f64::from(denominator);
                let duration = duration.max(0.0);
                Some(match anchor {
                    Anchor::Head => ResolvedRange {
                        start_seconds: 0.0,
                        end_seconds: duration * fraction,
                    },
                    Anchor::Tail => ResolvedRange {
                        start_seconds: duration * (1.0 - fraction),
                        end_seconds: duration,
                    },
                })
            }
        }
    }
}

/// A window in absolute seconds, `start_seconds <= end_seconds`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResolvedRange {
    pub start_seconds: f64,
    pub end_seconds: f64,
}

impl ResolvedRange {
    /// Inclusive on both ends.
    pub fn contains(&self, seconds: f64) -> bool {
        seconds >= self.start_seconds && seconds <= self.end_seconds
    }
}

/// What the user wants from the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum QueryIntent {
    /// A summary of the whole transcript, or of the sub-window in `range`.
    Summary { range: TimeRangeSpec },
    /// A verbatim excerpt of a time window.
    TimeRange { range: TimeRangeSpec },
    /// The query is not about the transcript.
    Unrelated,
}

/// Where the evidence for a resolved query comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scope {
    /// Segments starting inside a window.
    Range(ResolvedRange),
    /// Every segment of the transcript.
    Whole,
    /// Segments ranked by embedding similarity to the query.
    Relevance,
}

/// Which tier produced the classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Heuristic,
    Model,
    /// The model tier failed; the query defaulted to `Unrelated`.
    Fallback,
}

/// The output of [`resolve`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub intent: QueryIntent,
    pub scope: Scope,
    pub language: Language,
    pub source: Source,
}

impl Resolution {
    fn unrelated(language: Language, source: Source) -> Self {
        Self {
            intent: QueryIntent::Unrelated,
            scope: Scope::Relevance,
            language,
            source,
        }
    }

    /// The resolved absolute window, when the query named one.
    pub fn range(&self) -> Option<ResolvedRange> {
        match self.scope {
            Scope::Range(range) => Some(range),
            _ => None,
        }
    }
}

/// Classify `query` against a transcript of `duration` seconds.
///
/// Never fails: a model-tier failure of any kind resolves to [`QueryIntent::Unrelated`].
/// The only error surfaced is caller cancellation, which the engine propagates.
pub fn resolve<C: CompletionClient + ?Sized>(
    client: &C,
    query: &str,
    duration: f64,
    ctx: &CallContext,
) -> std::result::Result<Resolution, Error> {
    let language = Language::detect(query);

    if query.trim().is_empty() {
        debug!("empty query resolves to unrelated");
        return Ok(Resolution::unrelated(language, Source::Heuristic));
    }

    if let Some(intent) = heuristics::classify(query) {
        debug!(?intent, "heuristic intent match");
        return Ok(finish(intent, false, language, duration, Source::Heuristic));
    }

    match classifier::classify(client, query, duration, ctx) {
        Ok(classification) => {
            debug!(intent = ?classification.intent, "model intent classification");
            let language = classification.language.unwrap_or(language);
            Ok(finish(
                classification.intent,
                classification.relevance,
                language,
                duration,
                Source::Model,
            ))
        }
        Err(Error::Cancelled) => Err(Error::Cancelled),
        Err(err) => {
            warn!(error = %err, "intent classification failed; treating query as unrelated");
            Ok(Resolution::unrelated(language, Source::Fallback))
        }
    }
}

fn finish(
    intent: QueryIntent,
    relevance: bool,
    language: Language,
    duration: f64,
    source: Source,
) -> Resolution {
    let scope = match intent {
        QueryIntent::Summary { range } | QueryIntent::TimeRange { range } => {
            match range.resolve(duration) {
                Some(resolved) => Scope::Range(resolved),
                None if relevance => Scope::Relevance,
                None => Scope::Whole,
            }
        }
        QueryIntent::Unrelated => Scope::Relevance,
    };

    // A time-range request without a usable window has nothing to excerpt.
    if matches!(intent, QueryIntent::TimeRange { .. }) && !matches!(scope, Scope::Range(_)) {
        return Resolution::unrelated(language, source);
    }

    Resolution {
        intent,
        scope,
        language,
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ChatMessage, ChatStream};

    struct NoModel;

    impl CompletionClient for NoModel {
        fn stream_chat<'a>(
            &'a self,
            _messages: &[ChatMessage],
            _ctx: &CallContext,
        ) -> crate::Result<ChatStream<'a>> {
            Err(Error::client("model must not be called"))
        }
    }

    #[test]
    fn relative_ranges_resolve_against_duration() {
        let tail = TimeRangeSpec::relative(Anchor::Tail, 1, 2).expect("valid fraction");
        assert_eq!(
            tail.resolve(40.0),
            Some(ResolvedRange {
                start_seconds: 20.0,
                end_seconds: 40.0
            })
        );

        let head = TimeRangeSpec::relative(Anchor::Head, 1, 4).expect("valid fraction");
        assert_eq!(
            head.resolve(40.0),
            Some(ResolvedRange {
                start_seconds: 0.0,
                end_seconds: 10.0
            })
        );
    }

    #[test]
    fn invalid_specs_are_rejected() {
        assert!(TimeRangeSpec::relative(Anchor::Head, 0, 3).is_none());
        assert!(TimeRangeSpec::relative(Anchor::Head, 4, 3).is_none());
        assert!(TimeRangeSpec::absolute(-1.0, 3.0).is_none());
        assert!(TimeRangeSpec::absolute(f64::NAN, 3.0).is_none());
        assert_eq!(TimeRangeSpec::None.resolve(10.0), None);
    }

    #[test]
    fn absolute_swaps_reversed_bounds() {
        assert_eq!(
            TimeRangeSpec::absolute(9.0, 3.0),
            Some(TimeRangeSpec::Absolute {
                start_seconds: 3.0,
                end_seconds: 9.0
            })
        );
    }

    #[test]
    fn heuristic_hits_never_call_the_model() -> anyhow::Result<()> {
        let ctx = CallContext::default();

        let r = resolve(&NoModel, "what happened 8:30 to 9:05", 600.0, &ctx)?;
        assert!(matches!(r.intent, QueryIntent::TimeRange { .. }));
        assert_eq!(r.source, Source::Heuristic);
        assert_eq!(
            r.range(),
            Some(ResolvedRange {
                start_seconds: 510.0,
                end_seconds: 545.0
            })
        );

        let r = resolve(&NoModel, "总结一下", 600.0, &ctx)?;
        assert_eq!(
            r.intent,
            QueryIntent::Summary {
                range: TimeRangeSpec::None
            }
        );
        assert_eq!(r.scope, Scope::Whole);
        assert_eq!(r.language, Language::Zh);
        Ok(())
    }

    #[test]
    fn model_failure_defaults_to_unrelated() -> anyhow::Result<()> {
        let r = resolve(
            &NoModel,
            "does the speaker like cats",
            60.0,
            &CallContext::default(),
        )?;
        assert_eq!(r.intent, QueryIntent::Unrelated);
        assert_eq!(r.source, Source::Fallback);
        assert_eq!(r.scope, Scope::Relevance);
        Ok(())
    }

    #[test]
    fn empty_query_is_unrelated_without_a_model_call() -> anyhow::Result<()> {
        let r = resolve(&NoModel, "   ", 60.0, &CallContext::default())?;
        assert_eq!(r.intent, QueryIntent::Unrelated);
        assert_eq!(r.source, Source::Heuristic);
        Ok(())
    }
}
