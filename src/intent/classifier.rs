//! Model tier of intent resolution: one structured classification request.

use serde::Deserialize;

use super::{Anchor, QueryIntent, TimeRangeSpec};
use crate::ctx::CallContext;
use crate::error::{Error, Result};
use crate::language::Language;
use crate::llm::{ChatMessage, CompletionClient, complete};

pub const SYSTEM_PROMPT: &str = "You classify user intent for transcript QA. \
The user is asking about a timestamped transcript of a video or meeting. \
Reply with a single JSON object and nothing else: \
{\"intent\": \"summary\" | \"time_range\" | \"question\" | \"unrelated\", \
\"range\": null | {\"start\": <seconds>, \"end\": <seconds>} | \
{\"anchor\": \"head\" | \"tail\", \"numerator\": <int>, \"denominator\": <int>}, \
\"language\": \"zh\" | \"en\"}. \
Use \"summary\" for requests to summarize or overview the content, \"time_range\" for requests \
to show what was said in a time window (range required), \"question\" for questions about \
specific content of the transcript, and \"unrelated\" for anything not about the transcript.";

/// A parsed model classification.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub intent: QueryIntent,
    /// Evidence should be chosen by relevance rather than the whole transcript.
    pub relevance: bool,
    pub language: Option<Language>,
}

#[derive(Debug, Deserialize)]
struct Reply {
    intent: String,
    #[serde(default)]
    range: Option<WireRange>,
    #[serde(default)]
    language: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireRange {
    Absolute {
        start: f64,
        end: f64,
    },
    Relative {
        anchor: String,
        numerator: u32,
        denominator: u32,
    },
}

/// Ask the model to classify `query`. Every failure maps to
/// [`Error::ClassificationUnavailable`], except caller cancellation.
pub fn classify<C: CompletionClient + ?Sized>(
    client: &C,
    query: &str,
    duration: f64,
    ctx: &CallContext,
) -> Result<Classification> {
    let messages = [
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "Transcript duration: {duration:.1} seconds.\nUser query: {query}"
        )),
    ];

    let reply = complete(client, &messages, ctx).map_err(|err| match err {
        Error::Cancelled => Error::Cancelled,
        other => Error::ClassificationUnavailable(other.to_string()),
    })?;

    parse_reply(&reply)
}

/// Parse a strict JSON classification reply. A surrounding Markdown code fence is tolerated.
pub fn parse_reply(raw: &str) -> Result<Classification> {
    let body = strip_code_fence(raw);
    let reply: Reply = serde_json::from_str(body)
        .map_err(|e| Error::ClassificationUnavailable(format!("malformed reply: {e}")))?;

    let range = match reply.range {
        None => TimeRangeSpec::None,
        Some(wire) => to_spec(wire).ok_or_else(|| {
            Error::ClassificationUnavailable("reply contains an invalid range".into())
        })?,
    };

    let (intent, relevance) = match reply.intent.trim().to_ascii_lowercase().as_str() {
        "summary" => (QueryIntent::Summary { range }, false),
        "question" => (QueryIntent::Summary { range }, true),
        "time_range" | "timerange" if !range.is_none() => (QueryIntent::TimeRange { range }, false),
        "time_range" | "timerange" => {
            return Err(Error::ClassificationUnavailable(
                "time_range reply without a range".into(),
            ));
        }
        "unrelated" => (QueryIntent::Unrelated, true),
        other => {
            return Err(Error::ClassificationUnavailable(format!(
                "unknown intent '{other}'"
            )));
        }
    };

    Ok(Classification {
        intent,
        relevance,
        language: reply.language.as_deref().and_then(Language::from_tag),
    })
}

fn to_spec(wire: WireRange) -> Option<TimeRangeSpec> {
    match wire {
        WireRange::Absolute { start, end } => TimeRangeSpec::absolute(start, end),
        WireRange::Relative {
            anchor,
            numerator,
            denominator,
        } => {
            let anchor = match anchor.to_ascii_lowercase().as_str() {
                "head" => Anchor::Head,
                "tail" => Anchor::Tail,
                _ => return None,
            };
            TimeRangeSpec::relative(anchor, numerator, denominator)
        }
    }
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
