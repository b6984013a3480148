//! Model-drafted answers, verified against their evidence.
//!
//! A draft is only usable if it is non-empty and lexically overlaps the evidence it was given.
//! Anything else (timeouts, transport errors, empty or off-topic completions) is reported as
//! [`Error::GenerationUnavailable`] so the caller can fall back to extraction.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::ctx::CallContext;
use crate::error::{Error, Result};
use crate::evidence::{Evidence, citation_marker};
use crate::language::{Language, is_cjk};
use crate::llm::{ChatMessage, CompletionClient, complete};
use crate::opts::Opts;

pub const SYSTEM_PROMPT: &str = "You are a transcript-grounded summarization assistant. \
You answer questions about a video or meeting using only the numbered transcript evidence \
you are given. Every statement must be supported by the evidence, cited with its marker \
such as [E1]. Never introduce names, numbers, events, or other facts that are absent from \
the evidence.";

static CITATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\s*(E\d+(?:\s*[,，]\s*E?\d+)*)\s*\]").expect("citation regex is valid")
});

static CITATION_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("citation number regex is valid"));

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "been", "but", "by", "can", "did", "do", "does",
    "for", "from", "had", "has", "have", "he", "her", "his", "how", "i", "if", "in", "into", "is",
    "it", "its", "of", "on", "or", "our", "she", "so", "that", "the", "their", "them", "then",
    "there", "these", "they", "this", "those", "to", "was", "we", "were", "what", "when", "where",
    "which", "who", "will", "with", "would", "you", "your",
];

const STOP_CHARS_ZH: &[char] = &[
    '的', '了', '是', '在', '我', '你', '他', '她', '它', '们', '这', '那', '和', '就', '也', '都',
    '有', '个', '一', '不', '吗', '呢', '吧', '啊',
];

/// Token overlap between a draft and its evidence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Overlap {
    /// Distinct content tokens in the draft.
    pub draft_tokens: usize,
    /// Distinct draft tokens that also occur in the evidence.
    pub shared_tokens: usize,
}

impl Overlap {
    pub fn ratio(&self) -> f32 {
        if self.draft_tokens == 0 {
            0.0
        } else {
            self.shared_tokens as f32 / self.draft_tokens as f32
        }
    }
}

/// Build the chat request for a grounded draft.
pub fn build_messages(query: &str, evidence: &[Evidence], language: Language) -> Vec<ChatMessage> {
    let mut payload = String::new();
    payload.push_str("Question: ");
    payload.push_str(query.trim());
    payload.push_str("\n\nEvidence (transcript segments in chronological order):\n");

    for (i, e) in evidence.iter().enumerate() {
        payload.push_str(&format!(
            "[{}] {}\n",
            citation_marker(i),
            e.segment.to_cue_line()
        ));
    }

    payload.push_str(&format!(
        "\nInstructions:\n\
         - Answer using only the evidence above; never add facts that are not in it.\n\
         - Cite the supporting segments with their markers, e.g. [E1] or [E2].\n\
         - If the evidence does not answer the question, say so briefly.\n\
         - Write the answer in {}.\n",
        language.name()
    ));

    vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(payload)]
}

/// Request a draft and return it only if it passes grounding validation.
pub fn draft<C: CompletionClient + ?Sized>(
    client: &C,
    query: &str,
    evidence: &[Evidence],
    language: Language,
    opts: &Opts,
    ctx: &CallContext,
) -> Result<String> {
    if evidence.is_empty() {
        return Err(Error::GenerationUnavailable("no evidence to draft from".into()));
    }

    let messages = build_messages(query, evidence, language);
    let text = complete(client, &messages, ctx).map_err(|err| match err {
        Error::Cancelled => Error::Cancelled,
        other => Error::GenerationUnavailable(other.to_string()),
    })?;

    validate(&text, evidence, opts)?;

    let dangling = dangling_citations(&text, evidence.len());
    if !dangling.is_empty() {
        warn!(?dangling, evidence = evidence.len(), "draft cites evidence that does not exist");
    }

    Ok(text)
}

/// Reject empty drafts and drafts without enough lexical overlap with the evidence.
pub fn validate(draft: &str, evidence: &[Evidence], opts: &Opts) -> Result<Overlap> {
    if draft.trim().is_empty() {
        return Err(Error::GenerationUnavailable("draft is empty".into()));
    }

    let overlap = overlap(draft, evidence);
    let required = opts.min_overlap_tokens.min(overlap.draft_tokens).max(1);

    debug!(
        draft_tokens = overlap.draft_tokens,
        shared_tokens = overlap.shared_tokens,
        ratio = overlap.ratio(),
        "draft grounding check"
    );

    if overlap.shared_tokens < required || overlap.ratio() < opts.min_overlap_ratio {
        return Err(Error::GenerationUnavailable(format!(
            "draft is not grounded in the evidence ({} of {} content tokens shared)",
            overlap.shared_tokens, overlap.draft_tokens
        )));
    }

    Ok(overlap)
}

/// Measure how many of the draft's content tokens occur in the evidence. Citation markers are
/// ignored.
pub fn overlap(draft: &str, evidence: &[Evidence]) -> Overlap {
    let stripped = CITATION_RE.replace_all(draft, " ");
    let draft_tokens = content_tokens(&stripped);

    let mut evidence_tokens = HashSet::new();
    for e in evidence {
        evidence_tokens.extend(content_tokens(&e.segment.text));
    }

    Overlap {
        draft_tokens: draft_tokens.len(),
        shared_tokens: draft_tokens.intersection(&evidence_tokens).count(),
    }
}

/// Citation numbers in `draft` that point past an evidence list of `len` items.
pub fn dangling_citations(draft: &str, len: usize) -> Vec<usize> {
    let mut out = Vec::new();
    for caps in CITATION_RE.captures_iter(draft) {
        for m in CITATION_NUMBER_RE.find_iter(&caps[1]) {
            if let Ok(n) = m.as_str().parse::<usize>() {
                if n == 0 || n > len {
                    out.push(n);
                }
            }
        }
    }
    out
}

/// Lowercased words (non-CJK alphanumeric runs, stopwords removed) plus CJK character bigrams.
fn content_tokens(text: &str) -> HashSet<String> {
    let mut tokens = HashSet::new();
    let mut word = String::new();
    let mut cjk_run: Vec<char> = Vec::new();

    let flush_word = |word: &mut String, tokens: &mut HashSet<String>| {
        if word.chars().count() >= 2 && !STOPWORDS.contains(&word.as_str()) {
            tokens.insert(std::mem::take(word));
        } else {
            word.clear();
        }
    };

    for c in text.chars() {
        if is_cjk(c) {
            flush_word(&mut word, &mut tokens);
            cjk_run.push(c);
        } else {
            flush_cjk(&mut cjk_run, &mut tokens);
            if c.is_alphanumeric() {
                word.extend(c.to_lowercase());
            } else {
                flush_word(&mut word, &mut tokens);
            }
        }
    }
    flush_word(&mut word, &mut tokens);
    flush_cjk(&mut cjk_run, &mut tokens);

    tokens
}

fn flush_cjk(run: &mut Vec<char>, tokens: &mut HashSet<String>) {
    match run.len() {
        0 => {}
        1 => {
            if !STOP_CHARS_ZH.contains(&run[0]) {
                tokens.insert(run[0].to_string());
            }
        }
        _ => {
            for pair in run.windows(2) {
                if STOP_CHARS_ZH.contains(&pair[0]) && STOP_CHARS_ZH.contains(&pair[1]) {
                    continue;
                }
                tokens.insert(pair.iter().collect());
            }
        }
    }
    run.clear();
}
