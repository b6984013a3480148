//! Timestamp parsing and formatting shared by the parser, the resolver, and the answer text.

/// Format seconds as a cue timestamp (`HH:MM:SS.mmm`).
///
/// Rounding policy:
/// - We round to the nearest millisecond to reduce drift when converting from `f64`.
pub fn format_cue_timestamp(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;

    let ms = total_ms % 1000;
    let total_s = total_ms / 1000;

    let s = total_s % 60;
    let total_m = total_s / 60;

    let m = total_m % 60;
    let h = total_m / 60;

    format!("{h:02}:{m:02}:{s:02}.{ms:03}")
}

/// Format a cue's bracketed timing label, e.g. `[00:08:30.670 --> 00:08:34.130]`.
pub fn format_cue_label(start_seconds: f64, end_seconds: f64) -> String {
    format!(
        "[{} --> {}]",
        format_cue_timestamp(start_seconds),
        format_cue_timestamp(end_seconds)
    )
}

/// Format a window as `MM:SS-MM:SS`, or `H:MM:SS-H:MM:SS` once either bound reaches an hour.
///
/// Seconds are floored: a cue ending at 199.6s is reported as `03:19`.
pub fn format_window(start_seconds: f64, end_seconds: f64) -> String {
    let with_hours = start_seconds >= 3600.0 || end_seconds >= 3600.0;
    format!(
        "{}-{}",
        format_clock(start_seconds, with_hours),
        format_clock(end_seconds, with_hours)
    )
}

fn format_clock(seconds: f64, with_hours: bool) -> String {
    let total_s = seconds.max(0.0).floor() as u64;
    let s = total_s % 60;
    let total_m = total_s / 60;

    if with_hours {
        let m = total_m % 60;
        let h = total_m / 60;
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{total_m:02}:{s:02}")
    }
}

/// Parse a colon-separated clock value into seconds.
///
/// Accepts `H:MM:SS(.fff)`, `MM:SS(.fff)`, with either `.` or `,` before the fraction.
/// Two-part values are minutes and seconds.
pub fn parse_clock(raw: &str) -> Option<f64> {
    let normalized = raw.trim().replace(',', ".");
    let parts: Vec<&str> = normalized.split(':').collect();

    let (hours, minutes, seconds) = match parts.as_slice() {
        [m, s] => ("0", *m, *s),
        [h, m, s] => (*h, *m, *s),
        _ => return None,
    };

    let hours: u64 = parse_digits(hours)?;
    let minutes: u64 = parse_digits(minutes)?;
    let seconds = parse_seconds(seconds)?;

    if parts.len() == 3 && minutes >= 60 {
        return None;
    }
    if seconds >= 60.0 {
        return None;
    }

    Some(hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds)
}

fn parse_digits(raw: &str) -> Option<u64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

fn parse_seconds(raw: &str) -> Option<f64> {
    let (whole, fraction) = match raw.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (raw, None),
    };

    let whole = parse_digits(whole)? as f64;
    match fraction {
        None => Some(whole),
        Some(f) if !f.is_empty() && f.bytes().all(|b| b.is_ascii_digit()) => {
            let digits = f.len() as i32;
            let value: f64 = f.parse().ok()?;
            Some(whole + value / 10f64.powi(digits))
        }
        Some(_) => None,
    }
}
