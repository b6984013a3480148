use serde::Serialize;

use crate::timestamp::format_cue_label;

/// One timestamped transcript cue.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Segment {
    pub start_seconds: f64,
    pub end_seconds: f64,
    pub text: String,
    /// The bracketed timing exactly as it appeared in the transcript, e.g.
    /// `[00:08:30,670 --> 00:08:34,130]`. `None` for segments built in code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Segment {
    pub fn new(start_seconds: f64, end_seconds: f64, text: impl Into<String>) -> Self {
        Self {
            start_seconds,
            end_seconds,
            text: text.into(),
            label: None,
        }
    }

    /// The bracketed timing label: the source text when known, otherwise rebuilt from seconds.
    pub fn cue_label(&self) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None => format_cue_label(self.start_seconds, self.end_seconds),
        }
    }

    /// The cue as quoted in answers, e.g. `[00:00:01.000 --> 00:00:02.500] hi`.
    pub fn to_cue_line(&self) -> String {
        format!("{} {}", self.cue_label(), self.text)
    }
}

/// The ordered, read-only set of segments parsed from one transcript.
///
/// Construction guarantees at least one segment, so `min_start`/`max_end` always describe a real
/// span.
#[derive(Debug, Clone)]
pub struct SegmentIndex {
    segments: Vec<Segment>,
    min_start: f64,
    max_end: f64,
}

impl SegmentIndex {
    /// Build an index from parsed segments. Returns `None` for an empty list.
    pub fn new(segments: Vec<Segment>) -> Option<Self> {
        if segments.is_empty() {
            return None;
        }

        let min_start = segments
            .iter()
            .map(|s| s.start_seconds)
            .fold(f64::INFINITY, f64::min);
        let max_end = segments
            .iter()
            .map(|s| s.end_seconds.max(s.start_seconds))
            .fold(f64::NEG_INFINITY, f64::max);

        Some(Self {
            segments,
            min_start,
            max_end,
        })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn min_start(&self) -> f64 {
        self.min_start
    }

    pub fn max_end(&self) -> f64 {
        self.max_end
    }

    /// Total duration used to resolve relative ranges.
    pub fn duration(&self) -> f64 {
        self.max_end
    }
}
