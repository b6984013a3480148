//! Deterministic answers built by quoting transcript segments.
//!
//! Used for every time-range excerpt, and whenever a model draft is unavailable or ungrounded.

use crate::coverage::CoverageReport;
use crate::evidence::Evidence;
use crate::intent::ResolvedRange;
use crate::language::Language;
use crate::timestamp::format_window;

/// A verbatim excerpt of a window: header, optional coverage caveat, then every cue.
pub fn excerpt(
    range: ResolvedRange,
    evidence: &[Evidence],
    coverage: Option<&CoverageReport>,
    language: Language,
) -> String {
    let window = format_window(range.start_seconds, range.end_seconds);
    let mut lines = vec![match language {
        Language::En => format!("Transcript excerpt {window}:"),
        Language::Zh => format!("时间段 {window} 的转写内容："),
    }];

    if let Some(caveat) = coverage.and_then(|c| c.caveat(language)) {
        lines.push(caveat);
    }

    if evidence.is_empty() {
        lines.push(no_segments_line(language));
    } else {
        lines.extend(quote(evidence));
    }

    lines.join("\n")
}

/// A degraded-but-faithful summary: header plus representative cues quoted with timestamps.
///
/// `sample` should already be the representative subsample to quote.
pub fn summary(
    range: Option<ResolvedRange>,
    sample: &[Evidence],
    coverage: Option<&CoverageReport>,
    language: Language,
) -> String {
    let header = match (range, language) {
        (None, Language::En) => "Transcript highlights (quoted directly from the transcript):".to_string(),
        (None, Language::Zh) => "转写要点（直接摘录自转写原文）：".to_string(),
        (Some(r), Language::En) => format!(
            "Transcript highlights {} (quoted directly from the transcript):",
            format_window(r.start_seconds, r.end_seconds)
        ),
        (Some(r), Language::Zh) => format!(
            "时间段 {} 的转写要点（直接摘录自转写原文）：",
            format_window(r.start_seconds, r.end_seconds)
        ),
    };

    let mut lines = vec![header];
    if let Some(caveat) = coverage.and_then(|c| c.caveat(language)) {
        lines.push(caveat);
    }
    if sample.is_empty() {
        lines.push(no_segments_line(language));
    } else {
        lines.extend(quote(sample));
    }
    lines.join("\n")
}

fn no_segments_line(language: Language) -> String {
    match language {
        Language::En => "No transcript segments start within this window.".to_string(),
        Language::Zh => "该时间段内没有开始的转写片段（transcript）。".to_string(),
    }
}

/// The answer for queries the transcript cannot support. Always mentions "transcript".
pub fn insufficient(language: Language) -> String {
    match language {
        Language::En => {
            "The transcript does not contain evidence relevant to this question.".to_string()
        }
        Language::Zh => "转写内容（transcript）中没有与该问题相关的证据。".to_string(),
    }
}

fn quote(evidence: &[Evidence]) -> impl Iterator<Item = String> + '_ {
    evidence.iter().map(|e| e.segment.to_cue_line())
}
