use serde::Serialize;

use crate::intent::ResolvedRange;
use crate::language::Language;
use crate::segments::SegmentIndex;
use crate::timestamp::format_window;

/// Bounds closer than this are treated as equal.
const EPSILON_SECONDS: f64 = 0.001;

/// How much of a requested window the transcript actually covers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoverageReport {
    pub requested_start: f64,
    pub requested_end: f64,
    /// Intersection of the request with the transcript span. When the two are disjoint,
    /// `available_start > available_end`.
    pub available_start: f64,
    pub available_end: f64,
    pub is_partial: bool,
}

impl CoverageReport {
    /// Intersect `requested` with `[index.min_start(), index.max_end()]`.
    pub fn analyze(requested: ResolvedRange, index: &SegmentIndex) -> Self {
        let available_start = requested.start_seconds.max(index.min_start());
        let available_end = requested.end_seconds.min(index.max_end());

        let non_empty_request = requested.end_seconds - requested.start_seconds > EPSILON_SECONDS;
        let trimmed = available_start - requested.start_seconds > EPSILON_SECONDS
            || requested.end_seconds - available_end > EPSILON_SECONDS;

        Self {
            requested_start: requested.start_seconds,
            requested_end: requested.end_seconds,
            available_start,
            available_end,
            is_partial: non_empty_request && trimmed,
        }
    }

    /// The transcript has no data at all inside the requested window.
    pub fn is_disjoint(&self) -> bool {
        self.available_start > self.available_end
    }

    pub fn requested_window(&self) -> String {
        format_window(self.requested_start, self.requested_end)
    }

    pub fn available_window(&self) -> Option<String> {
        (!self.is_disjoint()).then(|| format_window(self.available_start, self.available_end))
    }

    /// A caveat line for partial coverage, or `None` when the window is fully covered.
    pub fn caveat(&self, language: Language) -> Option<String> {
        if !self.is_partial {
            return None;
        }

        let requested = self.requested_window();
        Some(match (self.available_window(), language) {
            (Some(available), Language::En) => format!(
                "Note: requested {requested}, available coverage only {available}."
            ),
            (Some(available), Language::Zh) => format!(
                "注意：请求的时间段为 {requested}，转写实际仅覆盖 {available}。"
            ),
            (None, Language::En) => format!(
                "Note: requested {requested}, but the transcript has no coverage in that window."
            ),
            (None, Language::Zh) => {
                format!("注意：请求的时间段为 {requested}，但转写（transcript）在该时间段内没有内容。")
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segments::Segment;

    fn index(start: f64, end: f64) -> SegmentIndex {
        SegmentIndex::new(vec![Segment::new(start, end, "x")])
        .expect("non-empty index")
    }

    fn range(start: f64, end: f64) -> ResolvedRange {
        ResolvedRange {
            start_seconds: start,
            end_seconds: end,
        }
    }

    #[test]
    fn window_past_the_end_is_partial() {
        let report = CoverageReport::analyze(range(180.0, 240.0), &index(0.0, 199.0));
        assert!(report.is_partial);
        assert_eq!(report.available_end, 199.0);
        assert_eq!(report.requested_window(), "03:00-04:00");
        assert_eq!(report.available_window().as_deref(), Some("03:00-03:19"));

        let caveat = report.caveat(Language::En).expect("partial caveat");
        assert!(caveat.contains("03:00-04:00"));
        assert!(caveat.contains("03:00-03:19"));
    }

    #[test]
    fn covered_window_is_not_partial() {
        let report = CoverageReport::analyze(range(10.0, 20.0), &index(0.0, 60.0));
        assert!(!report.is_partial);
        assert!(report.caveat(Language::En).is_none());
    }

    #[test]
    fn window_before_the_start_is_partial() {
        let report = CoverageReport::analyze(range(0.0, 30.0), &index(12.0, 60.0));
        assert!(report.is_partial);
        assert_eq!(report.available_start, 12.0);
    }

    #[test]
    fn empty_request_is_never_partial() {
        let report = CoverageReport::analyze(range(100.0, 100.0), &index(0.0, 60.0));
        assert!(!report.is_partial);
    }

    #[test]
    fn disjoint_window_reports_no_coverage() {
        let report = CoverageReport::analyze(range(300.0, 360.0), &index(0.0, 60.0));
        assert!(report.is_partial);
        assert!(report.is_disjoint());
        assert!(report.available_window().is_none());
        let caveat = report.caveat(Language::Zh).expect("partial caveat");
        assert!(caveat.contains("05:00-06:00"));
        assert!(caveat.contains("transcript"));
    }
}
