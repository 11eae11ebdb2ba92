// src/classify/mod.rs
//! Classification pipeline entry: ensemble scoring with a rules-only
//! fallback.
//!
//! Order:
//! 1) Preprocess (clean + truncate); empty input yields the neutral result.
//! 2) Sentiment polarity — remote model when available, lexicon otherwise.
//! 3) Optional zero-shot hint for inputs long enough to be worth a call.
//! 4) Keyword hits + structural signals → weighted two-sum combine.
//! Any failure along the way drops to the rules-only path.

pub mod remote;
pub mod scoring;
pub mod vocab;
pub mod weights;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::InferConfig;
use crate::preprocess::preprocess;
use crate::sentiment::{SentimentAnalyzer, SentimentScores};

// Re-export convenient types.
pub use remote::{DynInferClient, InferClient, ZeroShotOutcome};
pub use scoring::{EnsembleOutcome, StructureSignals, ZeroShotSide};
pub use vocab::Vocabulary;
pub use weights::{HotReloadWeights, Weights};

/// Triage label for an email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Label {
    #[serde(rename = "Productive")]
    Productive,
    #[serde(rename = "Non-Productive")]
    NonProductive,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Productive => "Productive",
            Label::NonProductive => "Non-Productive",
        }
    }
}

/// Intermediate scores surfaced to the client for explainability.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreBreakdown {
    pub sentiment_scores: SentimentScores,
    pub productive_keywords_found: usize,
    pub nonproductive_keywords_found: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zero_shot_top_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zero_shot_confidence: Option<f32>,
    pub productive_score: f32,
    pub nonproductive_score: f32,
}

impl ScoreBreakdown {
    fn empty() -> Self {
        Self {
            sentiment_scores: SentimentScores::neutral(),
            productive_keywords_found: 0,
            nonproductive_keywords_found: 0,
            zero_shot_top_label: None,
            zero_shot_confidence: None,
            productive_score: 0.0,
            nonproductive_score: 0.0,
        }
    }
}

/// Full classification result for one email.
#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    pub label: Label,
    pub confidence: f32,
    pub method: &'static str,
    pub details: ScoreBreakdown,
    pub processed_text: String,
    pub signals: StructureSignals,
}

/// Stateless-per-request classifier; built once and shared behind an `Arc`.
pub struct Classifier {
    vocab: Vocabulary,
    weights: HotReloadWeights,
    analyzer: SentimentAnalyzer,
    infer: DynInferClient,
    zero_shot_min_chars: usize,
}

impl Classifier {
    pub fn new(vocab: Vocabulary, infer: DynInferClient, zero_shot_min_chars: usize) -> Self {
        Self {
            vocab,
            weights: HotReloadWeights::new(None),
            analyzer: SentimentAnalyzer::new(),
            infer,
            zero_shot_min_chars,
        }
    }

    /// Build from on-disk config and environment.
    pub fn from_env() -> anyhow::Result<Self> {
        let vocab = Vocabulary::from_toml()?;
        let infer_cfg = InferConfig::load_or_default();
        let client = remote::build_client_from_config(&infer_cfg);
        Ok(Self::new(vocab, client, infer_cfg.zero_shot_min_chars))
    }

    pub fn provider_name(&self) -> &'static str {
        self.infer.provider_name()
    }

    pub fn lexicon_terms(&self) -> usize {
        self.analyzer.lexicon_terms()
    }

    /// Classify one email. Never fails: ensemble errors drop to the rules
    /// path, and even that has a neutral last resort.
    pub async fn classify(&self, text: &str) -> Classification {
        match self.ensemble(text).await {
            Ok(c) => c,
            Err(err) => {
                warn!(error = %err, "ensemble scoring failed; falling back to rules");
                self.classify_with_rules(text)
            }
        }
    }

    async fn ensemble(&self, text: &str) -> anyhow::Result<Classification> {
        let processed = preprocess(text);
        if processed.is_empty() {
            return Ok(neutral_classification(text));
        }

        let w = self.weights.current();

        let (sentiment, method) = match self.infer.sentiment(&processed).await {
            Some(s) => (s, "remote_ensemble"),
            None => (self.analyzer.polarity(&processed), "lexicon_ensemble"),
        };

        let zero_shot = if processed.chars().count() > self.zero_shot_min_chars {
            self.infer
                .zero_shot(&processed, &self.vocab.zero_shot().candidate_labels)
                .await
        } else {
            None
        };

        // Keywords and structure are read off the raw text: cleaning can
        // eat the very punctuation the structural signals care about.
        let productive_hits = self.vocab.productive_hits(text);
        let nonproductive_hits = self.vocab.nonproductive_hits(text);
        let signals = StructureSignals::from_text(text);

        let zs_input = zero_shot
            .as_ref()
            .map(|z| (self.vocab.label_side(&z.label), z.score));

        let outcome = scoring::combine(
            sentiment,
            productive_hits,
            nonproductive_hits,
            zs_input,
            &signals,
            &w,
        );

        Ok(Classification {
            label: outcome.label,
            confidence: outcome.confidence,
            method,
            details: ScoreBreakdown {
                sentiment_scores: sentiment,
                productive_keywords_found: productive_hits,
                nonproductive_keywords_found: nonproductive_hits,
                zero_shot_top_label: zero_shot.as_ref().map(|z| z.label.clone()),
                zero_shot_confidence: zero_shot.as_ref().map(|z| z.score),
                productive_score: outcome.productive_score,
                nonproductive_score: outcome.nonproductive_score,
            },
            processed_text: processed,
            signals,
        })
    }

    /// Rules-only fallback: word-set intersection against the smaller
    /// vocabularies plus three structural adjustments.
    pub fn classify_with_rules(&self, text: &str) -> Classification {
        use std::collections::HashSet;

        let fallback = self.vocab.fallback();
        let lower = text.to_lowercase();
        let words: HashSet<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();

        let mut productive_score = fallback
            .productive
            .iter()
            .filter(|k| words.contains(k.as_str()))
            .count();
        let mut nonproductive_score = fallback
            .nonproductive
            .iter()
            .filter(|k| words.contains(k.as_str()))
            .count();

        let signals = StructureSignals::from_text(text);
        if signals.question_marks > 0 {
            productive_score += 1;
        }
        if signals.word_count > 50 {
            productive_score += 1;
        }
        if signals.word_count < 20 && nonproductive_score > 0 {
            nonproductive_score += 2;
        }

        let (label, confidence) = if productive_score > nonproductive_score {
            (Label::Productive, 0.75)
        } else {
            (Label::NonProductive, 0.65)
        };

        Classification {
            label,
            confidence,
            method: "rules",
            details: ScoreBreakdown {
                productive_keywords_found: productive_score,
                nonproductive_keywords_found: nonproductive_score,
                productive_score: productive_score as f32,
                nonproductive_score: nonproductive_score as f32,
                ..ScoreBreakdown::empty()
            },
            processed_text: preprocess(text),
            signals,
        }
    }
}

/// Neutral result for inputs with no scoreable content.
fn neutral_classification(text: &str) -> Classification {
    Classification {
        label: Label::Productive,
        confidence: 0.5,
        method: "fallback",
        details: ScoreBreakdown::empty(),
        processed_text: String::new(),
        signals: StructureSignals::from_text(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn rules_classifier() -> Classifier {
        let vocab = Vocabulary::from_toml_str(vocab::DEFAULT_VOCAB_TOML).unwrap();
        Classifier::new(vocab, Arc::new(remote::DisabledClient), 10)
    }

    #[test]
    fn rules_path_flags_support_mail_productive() {
        let c = rules_classifier();
        let out =
            c.classify_with_rules("Please help, the login page shows an error. Can you fix it?");
        assert_eq!(out.label, Label::Productive);
        assert!((out.confidence - 0.75).abs() < f32::EPSILON);
        assert_eq!(out.method, "rules");
    }

    #[test]
    fn rules_path_flags_short_social_mail_non_productive() {
        let c = rules_classifier();
        let out = c.classify_with_rules("Thanks for the birthday party invitation");
        assert_eq!(out.label, Label::NonProductive);
        assert!((out.confidence - 0.65).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn symbol_only_input_is_neutral() {
        let c = rules_classifier();
        let out = c.classify("@@@ ###").await;
        assert_eq!(out.label, Label::Productive);
        assert!((out.confidence - 0.5).abs() < f32::EPSILON);
        assert_eq!(out.method, "fallback");
    }
}
