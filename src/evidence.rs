//! Evidence selection.
//!
//! Evidence is always a chronologically ordered subset of the [`SegmentIndex`]; nothing
//! synthesized is ever inserted. Three strategies exist, chosen by the resolved [`Scope`]:
//! - a window: every segment whose *start* lies inside it
//! - the whole transcript
//! - relevance: top-K segments by embedding similarity to the query

use serde::Serialize;
use tracing::{debug, warn};

use crate::coverage::CoverageReport;
use crate::ctx::CallContext;
use crate::error::{Error, Result};
use crate::intent::{QueryIntent, Resolution, ResolvedRange, Scope, Source};
use crate::llm::{EmbeddingClient, cosine, embed_checked};
use crate::opts::Opts;
use crate::segments::{Segment, SegmentIndex};

/// One segment used to ground an answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evidence {
    pub segment: Segment,
    /// Position of the segment in the [`SegmentIndex`].
    pub index: usize,
}

/// Citation marker for the evidence item at `position` (0-based) in an evidence list: `E1`, `E2`, …
pub fn citation_marker(position: usize) -> String {
    format!("E{}", position + 1)
}

/// The evidence chosen for one query.
#[derive(Debug, Clone)]
pub struct Selection {
    /// The intent after selection. Relevance ranking may force `Unrelated`, or promote a
    /// model's `Unrelated` classification that turns out to have supporting segments.
    pub intent: QueryIntent,
    pub evidence: Vec<Evidence>,
    /// Present whenever the query named a window.
    pub coverage: Option<CoverageReport>,
}

/// Select evidence for a resolved query.
///
/// Only caller cancellation is returned as an error; embedding failures degrade to an empty
/// relevance result.
pub fn select<E: EmbeddingClient + ?Sized>(
    client: &E,
    index: &SegmentIndex,
    resolution: &Resolution,
    query: &str,
    opts: &Opts,
    ctx: &CallContext,
) -> Result<Selection> {
    match resolution.scope {
        Scope::Range(range) => Ok(Selection {
            intent: resolution.intent,
            evidence: in_range(index, range),
            coverage: Some(CoverageReport::analyze(range, index)),
        }),
        Scope::Whole => Ok(Selection {
            intent: resolution.intent,
            evidence: whole(index),
            coverage: None,
        }),
        // Only a model that actually answered "unrelated" can be overruled by similarity. A
        // failed classification or an empty query stays unrelated.
        Scope::Relevance
            if resolution.intent == QueryIntent::Unrelated && resolution.source != Source::Model =>
        {
            Ok(Selection {
                intent: QueryIntent::Unrelated,
                evidence: Vec::new(),
                coverage: None,
            })
        }
        Scope::Relevance => {
            let evidence = match relevant(client, index, query, opts, ctx) {
                Ok(evidence) => evidence,
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(err) => {
                    warn!(error = %err, "relevance ranking unavailable");
                    Vec::new()
                }
            };

            let intent = if evidence.is_empty() {
                QueryIntent::Unrelated
            } else {
                match resolution.intent {
                    QueryIntent::Unrelated => QueryIntent::Summary {
                        range: Default::default(),
                    },
                    other => other,
                }
            };

            if intent != resolution.intent {
                debug!(from = ?resolution.intent, to = ?intent, "similarity override");
            }

            Ok(Selection {
                intent,
                evidence,
                coverage: None,
            })
        }
    }
}

/// Every segment whose start lies in `range` (inclusive). End times are not constrained, and a
/// segment that starts before the window is excluded even if it overlaps it.
pub fn in_range(index: &SegmentIndex, range: ResolvedRange) -> Vec<Evidence> {
    index
        .segments()
        .iter()
        .enumerate()
        .filter(|(_, s)| range.contains(s.start_seconds))
        .map(|(i, s)| Evidence {
            segment: s.clone(),
            index: i,
        })
        .collect()
}

pub fn whole(index: &SegmentIndex) -> Vec<Evidence> {
    index
        .segments()
        .iter()
        .enumerate()
        .map(|(i, s)| Evidence {
            segment: s.clone(),
            index: i,
        })
        .collect()
}

/// A uniformly spaced subsample spanning the beginning, middle, and end of `evidence`.
///
/// The first and last items are always included when `size >= 2`.
pub fn representative_sample(evidence: &[Evidence], size: usize) -> Vec<Evidence> {
    let n = evidence.len();
    if size == 0 || n == 0 {
        return Vec::new();
    }
    if size >= n {
        return evidence.to_vec();
    }
    if size == 1 {
        return vec![evidence[0].clone()];
    }

    let steps = size - 1;
    let mut picked: Vec<usize> = (0..size)
        .map(|i| (i * (n - 1) + steps / 2) / steps)
        .collect();
    picked.dedup();

    picked.into_iter().map(|i| evidence[i].clone()).collect()
}

/// Rank segments by cosine similarity to the query and keep the top `opts.top_k` that reach
/// `opts.min_similarity`, in chronological order.
///
/// The query and every segment are embedded in a single batch, query first.
pub fn relevant<E: EmbeddingClient + ?Sized>(
    client: &E,
    index: &SegmentIndex,
    query: &str,
    opts: &Opts,
    ctx: &CallContext,
) -> Result<Vec<Evidence>> {
    if opts.top_k == 0 {
        return Ok(Vec::new());
    }

    let mut batch = Vec::with_capacity(index.len() + 1);
    batch.push(query.to_string());
    batch.extend(index.segments().iter().map(|s| s.text.clone()));

    let vectors = embed_checked(client, &batch, ctx).map_err(|err| match err {
        Error::Cancelled => Error::Cancelled,
        other => Error::EmbeddingUnavailable(other.to_string()),
    })?;

    let (query_vec, segment_vecs) = vectors
        .split_first()
        .ok_or_else(|| Error::EmbeddingUnavailable("empty embedding response".into()))?;

    let mut scored: Vec<(usize, f32)> = segment_vecs
        .iter()
        .enumerate()
        .map(|(i, v)| (i, cosine(query_vec, v)))
        .filter(|(_, score)| *score >= opts.min_similarity)
        .collect();

    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    scored.truncate(opts.top_k);
    scored.sort_by_key(|(i, _)| *i);

    debug!(
        candidates = index.len(),
        kept = scored.len(),
        best = scored.iter().map(|(_, s)| *s).fold(f32::NAN, f32::max),
        "relevance ranking"
    );

    let segments = index.segments();
    Ok(scored
        .into_iter()
        .map(|(i, _)| Evidence {
            segment: segments[i].clone(),
            index: i,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::TimeRangeSpec;
    use crate::language::Language;

    fn index(cues: &[(f64, f64, &str)]) -> SegmentIndex {
        SegmentIndex::new(
            cues.iter()
                .map(|(s, e, t)| Segment::new(*s, *e, *t))
                .collect(),
        )
        .expect("non-empty index")
    }

    /// Embeds by keyword: dimension 0 for "rust", 1 for "cooking", 2 otherwise.
    struct KeywordEmbeddings;

    impl EmbeddingClient for KeywordEmbeddings {
        fn embed_texts(&self, texts: &[String], _ctx: &CallContext) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| {
                    let t = t.to_lowercase();
                    if t.contains("rust") {
                        vec![1.0, 0.0, 0.0]
                    } else if t.contains("cooking") {
                        vec![0.0, 1.0, 0.0]
                    } else {
                        vec![0.0, 0.0, 1.0]
                    }
                })
                .collect())
        }
    }

    struct BrokenEmbeddings;

    impl EmbeddingClient for BrokenEmbeddings {
        fn embed_texts(&self, _texts: &[String], _ctx: &CallContext) -> Result<Vec<Vec<f32>>> {
            Err(Error::client("503 service unavailable"))
        }
    }

    fn relevance_resolution(intent: QueryIntent) -> Resolution {
        Resolution {
            intent,
            scope: Scope::Relevance,
            language: Language::En,
            source: Source::Model,
        }
    }

    #[test]
    fn range_selection_uses_start_times_only() {
        let idx = index(&[
            (0.0, 12.0, "straddles the start"),
            (10.0, 15.0, "inside"),
            (18.0, 30.0, "starts inside, ends outside"),
            (21.0, 25.0, "after"),
        ]);
        let got = in_range(
            &idx,
            ResolvedRange {
                start_seconds: 10.0,
                end_seconds: 20.0,
            },
        );

        let texts: Vec<&str> = got.iter().map(|e| e.segment.text.as_str()).collect();
        assert_eq!(texts, vec!["inside", "starts inside, ends outside"]);
        assert_eq!(got[0].index, 1);
        assert_eq!(got[1].index, 2);
    }

    #[test]
    fn representative_sample_spans_the_transcript() {
        let idx = index(
            &(0..20)
                .map(|i| (i as f64, i as f64 + 1.0, "x"))
                .collect::<Vec<_>>(),
        );
        let all = whole(&idx);

        let sample = representative_sample(&all, 5);
        let picked: Vec<usize> = sample.iter().map(|e| e.index).collect();
        assert_eq!(picked.len(), 5);
        assert_eq!(picked.first(), Some(&0));
        assert_eq!(picked.last(), Some(&19));
        assert!(picked.windows(2).all(|w| w[0] < w[1]));

        assert_eq!(representative_sample(&all[..3], 8).len(), 3);
        assert!(representative_sample(&all, 0).is_empty());
    }

    #[test]
    fn relevance_keeps_matching_segments_in_order() -> anyhow::Result<()> {
        let idx = index(&[
            (0.0, 5.0, "Rust ownership basics"),
            (5.0, 10.0, "a cooking tangent"),
            (10.0, 15.0, "more on Rust lifetimes"),
        ]);

        let got = relevant(
            &KeywordEmbeddings,
            &idx,
            "what about rust?",
            &Opts::default(),
            &CallContext::default(),
        )?;
        let picked: Vec<usize> = got.iter().map(|e| e.index).collect();
        assert_eq!(picked, vec![0, 2]);
        Ok(())
    }

    #[test]
    fn relevance_respects_top_k() -> anyhow::Result<()> {
        let idx = index(&[
            (0.0, 5.0, "rust one"),
            (5.0, 10.0, "rust two"),
            (10.0, 15.0, "rust three"),
        ]);
        let opts = Opts {
            top_k: 2,
            ..Opts::default()
        };

        let got = relevant(&KeywordEmbeddings, &idx, "rust", &opts, &CallContext::default())?;
        let picked: Vec<usize> = got.iter().map(|e| e.index).collect();
        assert_eq!(picked, vec![0, 1]);
        Ok(())
    }

    #[test]
    fn no_similar_segment_forces_unrelated() -> anyhow::Result<()> {
        let idx = index(&[(0.0, 5.0, "Rust ownership basics")]);
        let resolution = relevance_resolution(QueryIntent::Summary {
            range: TimeRangeSpec::None,
        });

        let sel = select(
            &KeywordEmbeddings,
            &idx,
            &resolution,
            "best cooking recipes",
            &Opts::default(),
            &CallContext::default(),
        )?;
        assert_eq!(sel.intent, QueryIntent::Unrelated);
        assert!(sel.evidence.is_empty());
        Ok(())
    }

    #[test]
    fn similar_segments_promote_unrelated_classification() -> anyhow::Result<()> {
        let idx = index(&[(0.0, 5.0, "Rust ownership basics")]);
        let sel = select(
            &KeywordEmbeddings,
            &idx,
            &relevance_resolution(QueryIntent::Unrelated),
            "rust?",
            &Opts::default(),
            &CallContext::default(),
        )?;
        assert!(matches!(sel.intent, QueryIntent::Summary { .. }));
        assert_eq!(sel.evidence.len(), 1);
        Ok(())
    }

    #[test]
    fn failed_classification_is_never_promoted() -> anyhow::Result<()> {
        let idx = index(&[(0.0, 5.0, "Rust ownership basics")]);
        let resolution = Resolution {
            source: Source::Fallback,
            ..relevance_resolution(QueryIntent::Unrelated)
        };

        let sel = select(
            &KeywordEmbeddings,
            &idx,
            &resolution,
            "rust?",
            &Opts::default(),
            &CallContext::default(),
        )?;
        assert_eq!(sel.intent, QueryIntent::Unrelated);
        assert!(sel.evidence.is_empty());
        Ok(())
    }

    #[test]
    fn embedding_failure_yields_unrelated() -> anyhow::Result<()> {
        let idx = index(&[(0.0, 5.0, "Rust ownership basics")]);
        let sel = select(
            &BrokenEmbeddings,
            &idx,
            &relevance_resolution(QueryIntent::Unrelated),
            "rust?",
            &Opts::default(),
            &CallContext::default(),
        )?;
        assert_eq!(sel.intent, QueryIntent::Unrelated);
        assert!(sel.evidence.is_empty());
        Ok(())
    }
}
