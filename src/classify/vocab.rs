// src/classify/vocab.rs
//! Vocabulary config: keyword lists for the ensemble and the rules
//! fallback, plus the zero-shot candidate labels and their partition.
//!
//! Loaded once at startup from `TRIAGE_VOCAB_PATH` if set, otherwise from
//! the compiled-in default. Ensemble keywords are matched with
//! word-boundary regexes so that "hi" matches "Hi team" but not "this".

use regex::Regex;
use serde::Deserialize;
use std::fs;

use super::scoring::ZeroShotSide;

pub const ENV_VOCAB_PATH: &str = "TRIAGE_VOCAB_PATH";
pub const DEFAULT_VOCAB_TOML: &str = include_str!("../../config/vocab.toml");

/* ----------------------------
Config schema (from TOML)
---------------------------- */

#[derive(Debug, Clone, Deserialize)]
pub struct VocabRoot {
    pub keywords: KeywordSection,
    pub zero_shot: ZeroShotSection,
    pub fallback: FallbackSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeywordSection {
    pub productive: Vec<String>,
    pub nonproductive: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ZeroShotSection {
    pub candidate_labels: Vec<String>,
    pub business_labels: Vec<String>,
    pub social_labels: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FallbackSection {
    pub productive: Vec<String>,
    pub nonproductive: Vec<String>,
}

/* ----------------------------
Compiled vocabulary
---------------------------- */

#[derive(Debug)]
pub struct Vocabulary {
    cfg: VocabRoot,
    productive: Vec<Regex>,
    nonproductive: Vec<Regex>,
}

impl Vocabulary {
    /// Load from `TRIAGE_VOCAB_PATH`, or the embedded default.
    pub fn from_toml() -> anyhow::Result<Self> {
        match std::env::var(ENV_VOCAB_PATH) {
            Ok(path) => {
                let content = fs::read_to_string(&path).map_err(|e| {
                    anyhow::anyhow!("Failed to read vocabulary config at {path}: {e}")
                })?;
                Self::from_toml_str(&content)
            }
            Err(_) => Self::from_toml_str(DEFAULT_VOCAB_TOML),
        }
    }

    /// Build from a TOML string.
    pub fn from_toml_str(toml_str: &str) -> anyhow::Result<Self> {
        let cfg: VocabRoot = toml::from_str(toml_str)?;
        let productive = compile_keywords(&cfg.keywords.productive)?;
        let nonproductive = compile_keywords(&cfg.keywords.nonproductive)?;
        Ok(Self {
            cfg,
            productive,
            nonproductive,
        })
    }

    /// Number of productive vocabulary entries present in `text`.
    /// Each entry counts at most once, however often it occurs.
    pub fn productive_hits(&self, text: &str) -> usize {
        count_hits(&self.productive, text)
    }

    /// Number of nonproductive vocabulary entries present in `text`.
    pub fn nonproductive_hits(&self, text: &str) -> usize {
        count_hits(&self.nonproductive, text)
    }

    pub fn zero_shot(&self) -> &ZeroShotSection {
        &self.cfg.zero_shot
    }

    pub fn fallback(&self) -> &FallbackSection {
        &self.cfg.fallback
    }

    /// Which side of the partition a zero-shot label falls on.
    pub fn label_side(&self, label: &str) -> ZeroShotSide {
        if self.cfg.zero_shot.business_labels.iter().any(|l| l == label) {
            ZeroShotSide::Business
        } else if self.cfg.zero_shot.social_labels.iter().any(|l| l == label) {
            ZeroShotSide::Social
        } else {
            ZeroShotSide::Neither
        }
    }
}

fn compile_keywords(words: &[String]) -> anyhow::Result<Vec<Regex>> {
    words
        .iter()
        .map(|w| {
            Regex::new(&format!(r"(?i)\b{}\b", regex::escape(w)))
                .map_err(|e| anyhow::anyhow!("keyword `{w}` regex error: {e}"))
        })
        .collect()
}

fn count_hits(patterns: &[Regex], text: &str) -> usize {
    patterns.iter().filter(|re| re.is_match(text)).count()
}
