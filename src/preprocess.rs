//! Text cleanup applied before scoring.
//!
//! Emails arrive with HTML entities, odd symbols, and unbounded length.
//! The pipeline is: decode entities, drop everything outside the
//! word/space/light-punctuation set, collapse whitespace, and cap the word
//! count so downstream scoring (and any remote model call) sees a bounded
//! input.

use once_cell::sync::Lazy;
use regex::Regex;

/// Inputs are capped at this many words after cleaning.
pub const MAX_WORDS: usize = 400;

static CLEAN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s.,!?-]").expect("clean regex"));
static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Clean and truncate raw email text. Returns an empty string for inputs
/// that carry no usable content.
pub fn preprocess(text: &str) -> String {
    let decoded = html_escape::decode_html_entities(text);
    let cleaned = CLEAN_RE.replace_all(&decoded, " ");
    let collapsed = WS_RE.replace_all(&cleaned, " ");
    let trimmed = collapsed.trim();

    let words: Vec<&str> = trimmed.split(' ').filter(|w| !w.is_empty()).collect();
    if words.len() > MAX_WORDS {
        words[..MAX_WORDS].join(" ")
    } else {
        trimmed.to_string()
    }
}
