//! Transcript parsing into a [`SegmentIndex`].
//!
//! Each line is parsed independently. A line must open with a bracketed timing pair such as
//! `[00:08:30.670 --> 00:08:34.130]`; the remainder of the line is the cue text.
//!
//! Non-cue lines are dropped (never appended to the previous cue) and recorded as
//! [`ParseWarning`]s so callers can surface them. Blank lines are skipped without a warning.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::segments::{Segment, SegmentIndex};
use crate::timestamp::parse_clock;

static CUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?P<label>\[\s*(?P<start>\d{1,3}(?::\d{1,2}){1,2}(?:[.,]\d+)?)\s*(?:-->|->|–|—)\s*(?P<end>\d{1,3}(?::\d{1,2}){1,2}(?:[.,]\d+)?)\s*\])\s*(?P<text>.*)$",
    )
    .expect("cue regex is valid")
});

/// A line that did not contribute a cue.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseWarning {
    /// 1-based line number in the input.
    pub line_number: usize,
    pub reason: String,
}

/// The result of parsing a transcript: the index plus anything we skipped along the way.
#[derive(Debug, Clone)]
pub struct ParsedTranscript {
    pub index: SegmentIndex,
    pub warnings: Vec<ParseWarning>,
}

/// Parse raw transcript text.
///
/// Fails only when no line yields a valid cue.
pub fn parse_transcript(text: &str) -> Result<ParsedTranscript> {
    let mut segments = Vec::new();
    let mut warnings = Vec::new();
    let mut lines = 0usize;

    for (i, line) in text.lines().enumerate() {
        lines += 1;
        let line_number = i + 1;

        if line.trim().is_empty() {
            continue;
        }

        match parse_cue(line) {
            Ok((segment, note)) => {
                if let Some(reason) = note {
                    warnings.push(ParseWarning {
                        line_number,
                        reason,
                    });
                }
                segments.push(segment);
            }
            Err(reason) => warnings.push(ParseWarning {
                line_number,
                reason,
            }),
        }
    }

    if !warnings.is_empty() {
        warn!(
            skipped = warnings.len(),
            first_line = warnings[0].line_number,
            "transcript contained lines that are not valid cues"
        );
    }

    let index = SegmentIndex::new(segments).ok_or(Error::Parse { lines })?;
    debug!(
        segments = index.len(),
        min_start = index.min_start(),
        max_end = index.max_end(),
        "parsed transcript"
    );

    Ok(ParsedTranscript { index, warnings })
}

/// Parse a single cue line. On success, also returns an optional note about repairs made.
fn parse_cue(line: &str) -> std::result::Result<(Segment, Option<String>), String> {
    let caps = CUE_RE
        .captures(line)
        .ok_or_else(|| "line does not start with a [start --> end] timestamp".to_string())?;

    let start = parse_clock(&caps["start"])
        .ok_or_else(|| format!("invalid start timestamp '{}'", &caps["start"]))?;
    let end = parse_clock(&caps["end"])
        .ok_or_else(|| format!("invalid end timestamp '{}'", &caps["end"]))?;

    let (end, note) = if end < start {
        (
            start,
            Some(format!(
                "cue ends before it starts ({} < {}); end clamped to start",
                &caps["end"], &caps["start"]
            )),
        )
    } else {
        (end, None)
    };

    Ok((
        Segment {
            start_seconds: start,
            end_seconds: end,
            text: caps["text"].trim().to_string(),
            label: Some(caps["label"].to_string()),
        },
        note,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bracketed_cues_in_order() -> anyhow::Result<()> {
        let text = "[00:00:00.000 --> 00:00:02.500] hello\n[00:00:02.500 --> 00:00:05.000] world\n";
        let parsed = parse_transcript(text)?;

        let segs = parsed.index.segments();
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0].text, "hello");
        assert_eq!(segs[1].start_seconds, 2.5);
        assert_eq!(segs[1].end_seconds, 5.0);
        assert!(parsed.warnings.is_empty());
        Ok(())
    }

    #[test]
    fn accepts_heterogeneous_timestamp_shapes() -> anyhow::Result<()> {
        let text = "[00:01.000 --> 00:02.000] short form\n\
                    [00:00:03,000 --> 00:00:04,250] srt commas\n\
                    [0:05 -> 0:06] no millis\n\
                    [1:00:00.5 --> 1:00:01.5] hours";
        let parsed = parse_transcript(text)?;

        let segs = parsed.index.segments();
        assert_eq!(segs.len(), 4);
        assert_eq!(segs[0].start_seconds, 1.0);
        assert_eq!(segs[1].end_seconds, 4.25);
        assert_eq!(segs[2].start_seconds, 5.0);
        assert_eq!(segs[3].start_seconds, 3600.5);

        assert_eq!(segs[1].to_cue_line(), "[00:00:03,000 --> 00:00:04,250] srt commas");
        assert_eq!(segs[2].label.as_deref(), Some("[0:05 -> 0:06]"));
        Ok(())
    }

    #[test]
    fn drops_non_cue_lines_with_warnings() -> anyhow::Result<()> {
        let text = "WEBVTT\n\n[00:00:01.000 --> 00:00:02.000] first\ncontinued text\n[bad --> 00:00:03.000] nope\n";
        let parsed = parse_transcript(text)?;

        assert_eq!(parsed.index.len(), 1);
        assert_eq!(parsed.index.segments()[0].text, "first");

        let lines: Vec<usize> = parsed.warnings.iter().map(|w| w.line_number).collect();
        assert_eq!(lines, vec![1, 4, 5]);
        Ok(())
    }

    #[test]
    fn clamps_inverted_cues() -> anyhow::Result<()> {
        let parsed = parse_transcript("[00:00:05.000 --> 00:00:04.000] backwards")?;
        let seg = &parsed.index.segments()[0];
        assert_eq!(seg.start_seconds, 5.0);
        assert_eq!(seg.end_seconds, 5.0);
        assert_eq!(seg.to_cue_line(), "[00:00:05.000 --> 00:00:04.000] backwards");
        assert_eq!(parsed.warnings.len(), 1);
        assert!(parsed.warnings[0].reason.contains("clamped"));
        Ok(())
    }

    #[test]
    fn zero_cues_is_a_parse_error() {
        let err = parse_transcript("just some words\nand more words").unwrap_err();
        assert!(matches!(err, Error::Parse { lines: 2 }));

        let err = parse_transcript("").unwrap_err();
        assert!(matches!(err, Error::Parse { lines: 0 }));
    }
}
