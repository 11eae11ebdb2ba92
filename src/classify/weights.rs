//! Runtime-calibrated ensemble weights with hot-reload from
//! `config/weights.json`.
//!
//! On each `current()` call we check the file's modified time and reload if
//! changed. Missing or malformed files leave the compiled-in defaults in
//! place, so the scorer always has a full weight table.

use serde::Deserialize;
use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::RwLock,
    time::SystemTime,
};

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct Weights {
    /// Negative sentiment feeds the productive sum (trouble reports read
    /// negative).
    pub w_sentiment_negative: f32,
    /// Positive sentiment feeds the nonproductive sum (social mail reads
    /// positive).
    pub w_sentiment_positive: f32,
    pub w_keyword_productive: f32,
    pub w_keyword_nonproductive: f32,
    pub w_zero_shot: f32,
    pub question_bonus: f32,
    pub short_social_bonus: f32,
    pub long_body_bonus: f32,
    pub shouting_bonus: f32,
    pub exclamation_bonus: f32,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            w_sentiment_negative: 0.2,
            w_sentiment_positive: 0.3,
            w_keyword_productive: 0.3,
            w_keyword_nonproductive: 0.4,
            w_zero_shot: 0.4,
            question_bonus: 0.2,
            short_social_bonus: 0.3,
            long_body_bonus: 0.1,
            shouting_bonus: 0.1,
            exclamation_bonus: 0.1,
        }
    }
}

/// Hot-reload wrapper: reloads when the config file mtime changes.
#[derive(Debug)]
pub struct HotReloadWeights {
    path: PathBuf,
    inner: RwLock<State>,
}

#[derive(Debug)]
struct State {
    weights: Weights,
    last_modified: Option<SystemTime>,
}

impl HotReloadWeights {
    /// Create with a path (defaults to "config/weights.json" if `None`).
    pub fn new(path: Option<&Path>) -> Self {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("config/weights.json"));
        Self {
            path,
            inner: RwLock::new(State {
                weights: Weights::default(),
                last_modified: None,
            }),
        }
    }

    /// Get the latest weights, reloading if the config file changed.
    pub fn current(&self) -> Weights {
        // Fast path: check metadata without grabbing the write lock.
        let needs_reload = match fs::metadata(&self.path).and_then(|m| m.modified()) {
            Ok(mtime) => {
                let guard = self.inner.read().unwrap();
                guard.last_modified != Some(mtime)
            }
            // If the file isn't there, keep defaults; no reload.
            Err(_) => false,
        };

        if !needs_reload {
            return self.inner.read().unwrap().weights;
        }

        // Slow path: reload with the write lock, double-checking for races.
        let mut guard = self.inner.write().unwrap();
        if let Ok(meta) = fs::metadata(&self.path) {
            if let Ok(mtime) = meta.modified() {
                if guard.last_modified != Some(mtime) {
                    if let Ok(w) = load_weights_file(&self.path) {
                        guard.weights = w;
                        guard.last_modified = Some(mtime);
                    }
                }
            }
        }
        guard.weights
    }
}

/// Load weights directly (no caching). Public for tests/tools.
pub fn load_weights_file(path: &Path) -> io::Result<Weights> {
    let bytes = fs::read(path)?;
    let w: Weights = serde_json::from_slice(&bytes)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(w)
}
