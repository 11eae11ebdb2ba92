//! Lexicon-based sentiment polarity.
//!
//! Always available; used whenever the remote sentiment model is disabled
//! or unreachable. The summed integer lexicon score is squashed into a
//! POSITIVE/NEGATIVE pair shaped like a model's softmax output so the
//! ensemble can consume either source interchangeably.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

static LEXICON: Lazy<HashMap<String, i32>> = Lazy::new(|| {
    let raw = include_str!("../sentiment_lexicon.json");
    serde_json::from_str::<HashMap<String, i32>>(raw).expect("valid sentiment lexicon")
});

/// Polarity pair in [0,1]; the two sides sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct SentimentScores {
    pub positive: f32,
    pub negative: f32,
}

impl SentimentScores {
    /// Map a summed lexicon score to a polarity pair. tanh keeps a single
    /// strong word from saturating the pair on short texts.
    pub fn from_raw(score: i32) -> Self {
        let positive = 0.5 * (1.0 + (score as f32 / 4.0).tanh());
        Self {
            positive,
            negative: 1.0 - positive,
        }
    }

    pub fn neutral() -> Self {
        Self {
            positive: 0.5,
            negative: 0.5,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SentimentAnalyzer;

impl SentimentAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn lexicon_terms(&self) -> usize {
        LEXICON.len()
    }

    #[inline]
    fn word_score(&self, w: &str) -> i32 {
        *LEXICON.get(w).unwrap_or(&0)
    }

    /// Returns (summed score, token count). A negator within the three
    /// preceding tokens inverts the sign of a scored word, so "not happy"
    /// counts negative.
    pub fn score_text(&self, text: &str) -> (i32, usize) {
        let tokens: Vec<String> = tokenize(text).collect();
        let mut score: i32 = 0;

        for i in 0..tokens.len() {
            let w = tokens[i].as_str();
            let negated = (1..=3).any(|k| i >= k && is_negator(tokens[i - k].as_str()));

            let base = self.word_score(w);
            if base != 0 {
                score += if negated { -base } else { base };
            }
        }

        (score, tokens.len())
    }

    /// Polarity pair for the ensemble.
    pub fn polarity(&self, text: &str) -> SentimentScores {
        let (score, tokens) = self.score_text(text);
        if tokens == 0 {
            return SentimentScores::neutral();
        }
        SentimentScores::from_raw(score)
    }
}

/// Alphanumeric tokens, lower-cased.
fn tokenize(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_ascii_lowercase())
}

/// Single-token negators ("no longer" is covered by "no" alone after
/// tokenization).
fn is_negator(tok: &str) -> bool {
    matches!(
        tok,
        "not" | "no" | "never" | "isn't" | "wasn't" | "aren't" | "won't" | "can't" | "cannot"
            | "without"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_words_score_positive() {
        let a = SentimentAnalyzer::new();
        let (score, _) = a.score_text("Thanks, the support was excellent and helpful.");
        assert!(score > 0, "expected positive score, got {score}");
    }

    #[test]
    fn negative_words_score_negative() {
        let a = SentimentAnalyzer::new();
        let (score, _) = a.score_text("Critical error, the system crashed and I am stuck.");
        assert!(score < 0, "expected negative score, got {score}");
    }

    #[test]
    fn negation_inverts_nearby_word() {
        let a = SentimentAnalyzer::new();
        let (plain, _) = a.score_text("I am happy with this");
        let (negated, _) = a.score_text("I am not happy with this");
        assert!(plain > 0);
        assert!(negated < 0, "negated score should flip, got {negated}");
    }

    #[test]
    fn polarity_pair_sums_to_one() {
        let a = SentimentAnalyzer::new();
        let p = a.polarity("wonderful news, congratulations!");
        assert!((p.positive + p.negative - 1.0).abs() < 1e-6);
        assert!(p.positive > 0.5);
    }

    #[test]
    fn empty_text_is_neutral() {
        let a = SentimentAnalyzer::new();
        assert_eq!(a.polarity(""), SentimentScores::neutral());
    }
}
