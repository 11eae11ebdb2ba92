// src/config/infer.rs
//! Remote inference config (`config/infer.json`).

use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};
use tracing::warn;

pub const ENV_INFER_CONFIG_PATH: &str = "INFER_CONFIG_PATH";
pub const DEFAULT_INFER_CONFIG_PATH: &str = "config/infer.json";

fn default_provider() -> String {
    "huggingface".to_string()
}
fn default_daily_limit() -> u32 {
    20
}
fn default_zero_shot_min_chars() -> usize {
    10
}
fn default_sentiment_model() -> String {
    "distilbert-base-uncased-finetuned-sst-2-english".to_string()
}
fn default_zero_shot_model() -> String {
    "facebook/bart-large-mnli".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferConfig {
    pub enabled: bool,
    /// "huggingface" (case-insensitive)
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_daily_limit")]
    pub daily_limit: u32,
    /// "ENV" means: read from HF_API_TOKEN
    #[serde(default)]
    pub api_key: String,
    /// Zero-shot is skipped for inputs at or below this many characters.
    #[serde(default = "default_zero_shot_min_chars")]
    pub zero_shot_min_chars: usize,
    #[serde(default = "default_sentiment_model")]
    pub sentiment_model: String,
    #[serde(default = "default_zero_shot_model")]
    pub zero_shot_model: String,
}

impl Default for InferConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: default_provider(),
            daily_limit: default_daily_limit(),
            api_key: String::new(),
            zero_shot_min_chars: default_zero_shot_min_chars(),
            sentiment_model: default_sentiment_model(),
            zero_shot_model: default_zero_shot_model(),
        }
    }
}

impl InferConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)?;
        let mut cfg: InferConfig = serde_json::from_str(&data)?;

        cfg.provider = cfg.provider.to_lowercase();

        // Resolve the api key if "ENV". Only an *enabled* config insists on
        // the variable being present.
        if cfg.api_key.trim().eq_ignore_ascii_case("env") {
            cfg.api_key = match env::var("HF_API_TOKEN") {
                Ok(key) => key,
                Err(_) if cfg.enabled => {
                    anyhow::bail!("Missing HF_API_TOKEN env var")
                }
                Err(_) => String::new(),
            };
        }

        Ok(cfg)
    }

    /// Load from `INFER_CONFIG_PATH` (default `config/infer.json`); any
    /// failure leaves remote inference disabled.
    pub fn load_or_default() -> Self {
        let path = env::var(ENV_INFER_CONFIG_PATH)
            .unwrap_or_else(|_| DEFAULT_INFER_CONFIG_PATH.to_string());
        match Self::load_from_file(&path) {
            Ok(cfg) => cfg,
            Err(err) => {
                warn!(%path, error = %err, "inference config unavailable; remote inference disabled");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_disabled_with_known_models() {
        let cfg = InferConfig::default();
        assert!(!cfg.enabled);
        assert_eq!(cfg.provider, "huggingface");
        assert_eq!(cfg.daily_limit, 20);
        assert!(cfg.sentiment_model.contains("sst-2"));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: InferConfig = serde_json::from_str(r#"{"enabled": false}"#).unwrap();
        assert_eq!(cfg.zero_shot_min_chars, 10);
        assert_eq!(cfg.zero_shot_model, "facebook/bart-large-mnli");
    }
}
