//! Heuristic tier of intent resolution.
//!
//! Each range matcher is a pure function tried in order; the first hit wins. Summary phrasing is
//! matched separately so that "summarize the first third" scopes a summary instead of asking for
//! an excerpt.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::{Anchor, QueryIntent, TimeRangeSpec};
use crate::timestamp::parse_clock;

type RangeMatcher = fn(&str) -> Option<TimeRangeSpec>;

/// Tried in order.
const RANGE_MATCHERS: &[RangeMatcher] = &[
    match_clock_range,
    match_minute_range_zh,
    match_minute_range_en,
    match_fraction_zh,
    match_half_zh,
    match_fraction_en,
];

const SUMMARY_PHRASES_ZH: &[&str] = &[
    "总结", "概括", "摘要", "概要", "总览", "介绍重点", "重点", "要点", "讲了什么", "讲了啥",
    "讲的什么", "讲的啥", "说了什么", "说了啥", "主要内容", "大意", "内容是什么", "讲什么",
];

static CLOCK_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(\d{1,3}(?::[0-5]\d){1,2}(?:\.\d+)?)\s*(?:-|–|—|~|to|until|till|through|and|到|至)\s*(\d{1,3}(?::[0-5]\d){1,2}(?:\.\d+)?)",
    )
    .expect("clock range regex is valid")
});

static MINUTE_RANGE_ZH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"第?\s*(\d+)\s*分(?:钟)?(?:\s*(\d+)\s*秒)?\s*(?:-|~|到|至)\s*第?\s*(\d+)\s*分(?:钟)?(?:\s*(\d+)\s*秒)?",
    )
    .expect("chinese minute range regex is valid")
});

static MINUTE_RANGE_EN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bminutes?\s+(\d+)\s*(?:-|to|until|till|through|and)\s*(?:minutes?\s+)?(\d+)\b")
        .expect("english minute range regex is valid")
});

static FRACTION_ZH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(最后|末尾|前|后|末)\s*(?:的)?\s*(?:(\d+)\s*/\s*(\d+)|([一二两三四五六七八九十\d]+)\s*分之\s*([一二两三四五六七八九十\d]+))",
    )
    .expect("chinese fraction regex is valid")
});

/// "一半" anywhere, otherwise "半" must close the phrase or carry a unit (段, 场, 部分, 程) so
/// that words like "半导体" or "前半年" don't read as a window.
static HALF_ZH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(最后|前|后|上|下)\s*(?:一半|半(?:段|场|部分|程)|半(?:$|[\s,.?!，。？！的讲说]))")
        .expect("chinese half regex is valid")
});

static FRACTION_EN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(first|last|latter|final|opening|closing|beginning|ending|second)\s+(?:(\d+)\s*/\s*(\d+)|(?:(one|two|three|a|an)\s+)?(half|halves|thirds?|quarters?|fourths?|fifths?))\b",
    )
    .expect("english fraction regex is valid")
});

static SUMMARY_EN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:summar(?:y|ize|ise|izing|ising)|overview|recap|key points|main points|key takeaways|highlights|gist|tl;?dr|what(?:'s| is| was) (?:this|the) (?:video|talk|transcript|recording|meeting|episode|lecture) about)\b",
    )
    .expect("english summary regex is valid")
});

/// Classify a query using local heuristics only. `None` means "no confident match".
pub fn classify(query: &str) -> Option<QueryIntent> {
    let normalized = normalize(query);
    let range = match_range_normalized(&normalized);
    let summary = is_summary_normalized(&normalized);

    match (range, summary) {
        (Some(range), true) => Some(QueryIntent::Summary { range }),
        (Some(range), false) => Some(QueryIntent::TimeRange { range }),
        (None, true) => Some(QueryIntent::Summary {
            range: TimeRangeSpec::None,
        }),
        (None, false) => None,
    }
}

/// The first range any matcher finds in `query`.
pub fn match_range(query: &str) -> Option<TimeRangeSpec> {
    match_range_normalized(&normalize(query))
}

/// Whether `query` asks for a summary or overview.
pub fn is_summary_request(query: &str) -> bool {
    is_summary_normalized(&normalize(query))
}

fn match_range_normalized(normalized: &str) -> Option<TimeRangeSpec> {
    RANGE_MATCHERS.iter().find_map(|m| m(normalized))
}

fn is_summary_normalized(normalized: &str) -> bool {
    SUMMARY_PHRASES_ZH.iter().any(|p| normalized.contains(p)) || SUMMARY_EN_RE.is_match(normalized)
}

/// Lowercase and fold full-width punctuation that commonly shows up in Chinese input.
fn normalize(query: &str) -> String {
    query
        .chars()
        .map(|c| match c {
            '：' => ':',
            '～' | '〜' => '~',
            '－' => '-',
            '／' => '/',
            '０'..='９' => char::from_u32(c as u32 - '０' as u32 + '0' as u32).unwrap_or(c),
            c => c,
        })
        .collect::<String>()
        .to_lowercase()
}

fn match_clock_range(q: &str) -> Option<TimeRangeSpec> {
    let caps = CLOCK_RANGE_RE.captures(q)?;
    let start = parse_clock(&caps[1])?;
    let end = parse_clock(&caps[2])?;
    TimeRangeSpec::absolute(start, end)
}

fn match_minute_range_zh(q: &str) -> Option<TimeRangeSpec> {
    let caps = MINUTE_RANGE_ZH_RE.captures(q)?;
    let start = minutes_and_seconds(&caps, 1, 2)?;
    let end = minutes_and_seconds(&caps, 3, 4)?;
    TimeRangeSpec::absolute(start, end)
}

fn match_minute_range_en(q: &str) -> Option<TimeRangeSpec> {
    let caps = MINUTE_RANGE_EN_RE.captures(q)?;
    let start: f64 = caps[1].parse().ok()?;
    let end: f64 = caps[2].parse().ok()?;
    TimeRangeSpec::absolute(start * 60.0, end * 60.0)
}

fn minutes_and_seconds(caps: &Captures<'_>, minutes: usize, seconds: usize) -> Option<f64> {
    let m: f64 = caps.get(minutes)?.as_str().parse().ok()?;
    let s: f64 = match caps.get(seconds) {
        Some(s) => s.as_str().parse().ok()?,
        None => 0.0,
    };
    Some(m * 60.0 + s)
}

fn match_fraction_zh(q: &str) -> Option<TimeRangeSpec> {
    let caps = FRACTION_ZH_RE.captures(q)?;
    let anchor = anchor_zh(&caps[1])?;

    let (numerator, denominator) = match (caps.get(2), caps.get(3)) {
        (Some(n), Some(d)) => (n.as_str().parse().ok()?, d.as_str().parse().ok()?),
        // "三分之一": the denominator comes first.
        _ => (
            zh_number(caps.get(5)?.as_str())?,
            zh_number(caps.get(4)?.as_str())?,
        ),
    };

    TimeRangeSpec::relative(anchor, numerator, denominator)
}

fn match_half_zh(q: &str) -> Option<TimeRangeSpec> {
    let caps = HALF_ZH_RE.captures(q)?;
    TimeRangeSpec::relative(anchor_zh(&caps[1])?, 1, 2)
}

fn match_fraction_en(q: &str) -> Option<TimeRangeSpec> {
    let caps = FRACTION_EN_RE.captures(q)?;
    let word = &caps[1];
    let anchor = match word {
        "first" | "opening" | "beginning" => Anchor::Head,
        _ => Anchor::Tail,
    };

    if let (Some(n), Some(d)) = (caps.get(2), caps.get(3)) {
        if word == "second" {
            return None;
        }
        return TimeRangeSpec::relative(anchor, n.as_str().parse().ok()?, d.as_str().parse().ok()?);
    }

    let unit = caps.get(5)?.as_str();
    let denominator = match unit.trim_end_matches('s') {
        "half" | "halve" => 2,
        "third" => 3,
        "quarter" | "fourth" => 4,
        "fifth" => 5,
        _ => return None,
    };

    // "second half" is the tail half; "second third" would be a middle window we can't express.
    if word == "second" && denominator != 2 {
        return None;
    }

    let numerator = match caps.get(4).map(|m| m.as_str()) {
        None | Some("one" | "a" | "an") => 1,
        Some("two") => 2,
        Some("three") => 3,
        Some(_) => return None,
    };

    TimeRangeSpec::relative(anchor, numerator, denominator)
}

fn anchor_zh(word: &str) -> Option<Anchor> {
    match word {
        "前" | "上" => Some(Anchor::Head),
        "后" | "最后" | "末尾" | "末" | "下" => Some(Anchor::Tail),
        _ => None,
    }
}

/// Parse a small Chinese or Arabic numeral (`三`, `十`, `两`, `12`).
fn zh_number(raw: &str) -> Option<u32> {
    if let Ok(n) = raw.parse() {
        return Some(n);
    }

    let digit = |c: char| -> Option<u32> {
        Some(match c {
            '一' => 1,
            '二' | '两' => 2,
            '三' => 3,
            '四' => 4,
            '五' => 5,
            '六' => 6,
            '七' => 7,
            '八' => 8,
            '九' => 9,
            _ => return None,
        })
    };

    let chars: Vec<char> = raw.chars().collect();
    match chars.as_slice() {
        [c] if *c == '十' => Some(10),
        [c] => digit(*c),
        ['十', u] => Some(10 + digit(*u)?),
        [t, '十'] => Some(digit(*t)? * 10),
        [t, '十', u] => Some(digit(*t)? * 10 + digit(*u)?),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rel(anchor: Anchor, n: u32, d: u32) -> Option<TimeRangeSpec> {
        TimeRangeSpec::relative(anchor, n, d)
    }

    fn abs(start: f64, end: f64) -> Option<TimeRangeSpec> {
        TimeRangeSpec::absolute(start, end)
    }

    #[test]
    fn clock_ranges() {
        assert_eq!(match_range("what happened 8:30 to 9:05"), abs(510.0, 545.0));
        assert_eq!(match_range("3:00-4:00"), abs(180.0, 240.0));
        assert_eq!(match_range("3:00到4:00说了什么"), abs(180.0, 240.0));
        assert_eq!(match_range("between 1:02:03 and 1:05:00"), abs(3723.0, 3900.0));
        assert_eq!(match_range("3：00～4：00"), abs(180.0, 240.0));
        assert_eq!(match_range("9:05 - 8:30"), abs(510.0, 545.0));
    }

    #[test]
    fn minute_ranges() {
        assert_eq!(match_range("第3分钟到第4分钟"), abs(180.0, 240.0));
        assert_eq!(match_range("3分到4分30秒讲了啥"), abs(180.0, 270.0));
        assert_eq!(match_range("minutes 2 to 5"), abs(120.0, 300.0));
    }

    #[test]
    fn chinese_fractions() {
        assert_eq!(match_range("前1/3"), rel(Anchor::Head, 1, 3));
        assert_eq!(match_range("最后1/4讲了什么"), rel(Anchor::Tail, 1, 4));
        assert_eq!(match_range("前三分之一"), rel(Anchor::Head, 1, 3));
        assert_eq!(match_range("后三分之二"), rel(Anchor::Tail, 2, 3));
        assert_eq!(match_range("后半"), rel(Anchor::Tail, 1, 2));
        assert_eq!(match_range("最后一半讲了啥"), rel(Anchor::Tail, 1, 2));
        assert_eq!(match_range("前半段"), rel(Anchor::Head, 1, 2));
        assert_eq!(match_range("下半场"), rel(Anchor::Tail, 1, 2));
        assert_eq!(match_range("后半讲了什么"), rel(Anchor::Tail, 1, 2));
    }

    #[test]
    fn half_inside_ordinary_words_is_not_a_window() {
        assert_eq!(match_range("介绍一下半导体"), None);
        assert_eq!(match_range("前半年的销量怎么样"), None);
        assert_eq!(match_range("上半身的动作"), None);
        assert_eq!(classify("介绍一下半导体"), None);
    }

    #[test]
    fn english_fractions() {
        assert_eq!(match_range("the first third"), rel(Anchor::Head, 1, 3));
        assert_eq!(match_range("latter half please"), rel(Anchor::Tail, 1, 2));
        assert_eq!(match_range("Last Quarter"), rel(Anchor::Tail, 1, 4));
        assert_eq!(match_range("the second half"), rel(Anchor::Tail, 1, 2));
        assert_eq!(match_range("last two thirds"), rel(Anchor::Tail, 2, 3));
        assert_eq!(match_range("first 1/3"), rel(Anchor::Head, 1, 3));
        assert_eq!(match_range("the second third"), None);
    }

    #[test]
    fn summary_phrasing() {
        assert!(is_summary_request("总结一下"));
        assert!(is_summary_request("介绍重点"));
        assert!(is_summary_request("Please summarize this"));
        assert!(is_summary_request("What is this video about?"));
        assert!(is_summary_request("tl;dr"));
        assert!(!is_summary_request("what happened 8:30 to 9:05"));
        assert!(!is_summary_request("what is the capital of France"));
    }

    #[test]
    fn combinations() {
        assert_eq!(
            classify("summarize the first third"),
            Some(QueryIntent::Summary {
                range: TimeRangeSpec::Relative {
                    anchor: Anchor::Head,
                    numerator: 1,
                    denominator: 3
                }
            })
        );
        assert!(matches!(
            classify("8:30-9:05"),
            Some(QueryIntent::TimeRange { .. })
        ));
        assert_eq!(
            classify("summarize"),
            Some(QueryIntent::Summary {
                range: TimeRangeSpec::None
            })
        );
        assert_eq!(classify("how tall is the eiffel tower"), None);
    }

    #[test]
    fn chinese_numerals() {
        assert_eq!(zh_number("三"), Some(3));
        assert_eq!(zh_number("两"), Some(2));
        assert_eq!(zh_number("十"), Some(10));
        assert_eq!(zh_number("十二"), Some(12));
        assert_eq!(zh_number("二十"), Some(20));
        assert_eq!(zh_number("7"), Some(7));
        assert_eq!(zh_number("半"), None);
    }
}
