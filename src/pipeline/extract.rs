//! Response extraction: locate the JSON object inside free-form model text.
//!
//! Models are asked to answer with bare JSON but routinely wrap it in a
//! ```` ```json ```` fence or surround it with commentary. Extraction runs an
//! ordered list of strategies; the first one that matches wins:
//!
//! 1. [`ExtractionStrategy::Fenced`]    — inner object of a fenced code block
//!    (optionally tagged `json`)
//! 2. [`ExtractionStrategy::BraceScan`] — greedy span from the first `{` to
//!    the last `}`
//! 3. [`ExtractionStrategy::Raw`]       — the whole text, unchanged
//!
//! Extraction never fails. Whether the candidate is valid is decided by
//! [`crate::pipeline::validate`].

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Which rule produced an extraction candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractionStrategy {
    Fenced,
    BraceScan,
    Raw,
}

impl fmt::Display for ExtractionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExtractionStrategy::Fenced => "fenced",
            ExtractionStrategy::BraceScan => "brace-scan",
            ExtractionStrategy::Raw => "raw",
        })
    }
}

/// A candidate payload and the strategy that found it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extraction<'a> {
    pub candidate: &'a str,
    pub strategy: ExtractionStrategy,
}

type Rule = fn(&str) -> Option<&str>;

/// Strategies in priority order. `Raw` is the terminal fallback and is not
/// listed.
const RULES: &[(ExtractionStrategy, Rule)] = &[
    (ExtractionStrategy::Fenced, fenced_block),
    (ExtractionStrategy::BraceScan, brace_span),
];

/// Extract the most plausible JSON candidate from `text`.
pub fn extract_candidate(text: &str) -> Extraction<'_> {
    RULES
        .iter()
        .find_map(|(strategy, rule)| {
            rule(text).map(|candidate| Extraction {
                candidate,
                strategy: *strategy,
            })
        })
        .unwrap_or(Extraction {
            candidate: text,
            strategy: ExtractionStrategy::Raw,
        })
}

// ── Rule 1: fenced code block ────────────────────────────────────────────────

static RE_FENCED_OBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(\{.*?\})\s*```").unwrap());

/// Inner object of the first fenced block, if any.
pub fn fenced_block(text: &str) -> Option<&str> {
    RE_FENCED_OBJECT
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

// ── Rule 2: brace scan ───────────────────────────────────────────────────────

/// Greedy span from the first `{` to the last `}`.
pub fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
