//! Remote inference adapter: provider abstraction + file cache + daily
//! call budget.
//!
//! The ensemble can consume a hosted sentiment model and a hosted
//! zero-shot model. Every call degrades to `None` on failure so the
//! lexicon path always has the last word. Real calls are wrapped with a
//! file cache (repeat submissions are common in a triage queue) and a
//! per-day budget persisted beside the cache.

use std::fmt::Write as _;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::infer::InferConfig;
use crate::sentiment::SentimentScores;

// ------------------------------------------------------------
// Public surface
// ------------------------------------------------------------

/// Top zero-shot label with its confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZeroShotOutcome {
    pub label: String,
    pub score: f32,
}

/// Client used by the classifier. Both calls return `None` when the
/// provider is disabled, over budget, or failing.
#[async_trait]
pub trait InferClient: Send + Sync {
    async fn sentiment(&self, input: &str) -> Option<SentimentScores>;
    async fn zero_shot(&self, input: &str, labels: &[String]) -> Option<ZeroShotOutcome>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

pub type DynInferClient = Arc<dyn InferClient>;

/// Set to "mock" to force the deterministic mock client (tests/local runs).
pub const ENV_TEST_MODE: &str = "INFER_TEST_MODE";

/// Build a client from the on-disk config.
pub fn build_client() -> DynInferClient {
    build_client_from_config(&InferConfig::load_or_default())
}

/// Factory: build a client according to config and environment.
pub fn build_client_from_config(config: &InferConfig) -> DynInferClient {
    if std::env::var(ENV_TEST_MODE)
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        let client = CachingClient::new(MockClient::neutral(), default_cache_dir(), config.daily_limit);
        return Arc::new(client);
    }

    if !config.enabled {
        return Arc::new(DisabledClient);
    }

    match config.provider.as_str() {
        "huggingface" => {
            let provider = HfProvider::new(config);
            let client = CachingClient::new(provider, default_cache_dir(), config.daily_limit);
            Arc::new(client)
        }
        _ => Arc::new(DisabledClient),
    }
}

// ------------------------------------------------------------
// Concrete clients
// ------------------------------------------------------------

/// Returns `None` always; used when remote inference is disabled.
pub struct DisabledClient;

#[async_trait]
impl InferClient for DisabledClient {
    async fn sentiment(&self, _input: &str) -> Option<SentimentScores> {
        None
    }
    async fn zero_shot(&self, _input: &str, _labels: &[String]) -> Option<ZeroShotOutcome> {
        None
    }
    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

/// Deterministic client for tests and local runs.
#[derive(Clone, Default)]
pub struct MockClient {
    pub sentiment: Option<SentimentScores>,
    pub zero_shot: Option<ZeroShotOutcome>,
}

impl MockClient {
    /// Neutral polarity, no zero-shot hint.
    pub fn neutral() -> Self {
        Self {
            sentiment: Some(SentimentScores::neutral()),
            zero_shot: None,
        }
    }
}

#[async_trait]
impl InferClient for MockClient {
    async fn sentiment(&self, _input: &str) -> Option<SentimentScores> {
        self.sentiment
    }
    async fn zero_shot(&self, _input: &str, _labels: &[String]) -> Option<ZeroShotOutcome> {
        self.zero_shot.clone()
    }
    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Hugging Face Inference API provider. Requires an API token; without one
/// every call returns `None`.
pub struct HfProvider {
    http: reqwest::Client,
    api_key: String,
    sentiment_model: String,
    zero_shot_model: String,
}

const HF_API_BASE: &str = "https://api-inference.huggingface.co/models";

impl HfProvider {
    pub fn new(config: &InferConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("email-triage-analyzer/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client");
        Self {
            http,
            api_key: config.api_key.clone(),
            sentiment_model: config.sentiment_model.clone(),
            zero_shot_model: config.zero_shot_model.clone(),
        }
    }
}

#[async_trait]
impl InferClient for HfProvider {
    async fn sentiment(&self, input: &str) -> Option<SentimentScores> {
        if self.api_key.is_empty() {
            return None;
        }

        #[derive(Serialize)]
        struct Req<'a> {
            inputs: &'a str,
        }
        #[derive(Deserialize)]
        struct LabelScore {
            label: String,
            score: f32,
        }

        let resp = self
            .http
            .post(format!("{HF_API_BASE}/{}", self.sentiment_model))
            .bearer_auth(&self.api_key)
            .json(&Req { inputs: input })
            .send()
            .await
            .ok()?;
        if !resp.status().is_success() {
            return None;
        }

        let body: Vec<Vec<LabelScore>> = resp.json().await.ok()?;
        let scores = body.first()?;
        let mut positive = None;
        let mut negative = None;
        for ls in scores {
            match ls.label.as_str() {
                "POSITIVE" => positive = Some(ls.score),
                "NEGATIVE" => negative = Some(ls.score),
                _ => {}
            }
        }
        Some(SentimentScores {
            positive: positive?,
            negative: negative?,
        })
    }

    async fn zero_shot(&self, input: &str, labels: &[String]) -> Option<ZeroShotOutcome> {
        if self.api_key.is_empty() || labels.is_empty() {
            return None;
        }

        #[derive(Serialize)]
        struct Params<'a> {
            candidate_labels: &'a [String],
        }
        #[derive(Serialize)]
        struct Req<'a> {
            inputs: &'a str,
            parameters: Params<'a>,
        }
        #[derive(Deserialize)]
        struct Resp {
            labels: Vec<String>,
            scores: Vec<f32>,
        }

        let resp = self
            .http
            .post(format!("{HF_API_BASE}/{}", self.zero_shot_model))
            .bearer_auth(&self.api_key)
            .json(&Req {
                inputs: input,
                parameters: Params {
                    candidate_labels: labels,
                },
            })
            .send()
            .await
            .ok()?;
        if !resp.status().is_success() {
            return None;
        }

        let body: Resp = resp.json().await.ok()?;
        let label = body.labels.first()?.clone();
        let score = body.scores.first().copied()?;
        Some(ZeroShotOutcome { label, score })
    }

    fn provider_name(&self) -> &'static str {
        "huggingface"
    }
}

// ------------------------------------------------------------
// Caching wrapper (file cache + daily budget)
// ------------------------------------------------------------

/// Wraps a provider with a file cache and a per-day call budget. Cache hits
/// never consume budget; only real provider calls do.
pub struct CachingClient<C: InferClient> {
    inner: C,
    cache_dir: PathBuf,
    daily_limit_max: u32,
    counter: Mutex<DailyCounter>,
}

impl<C: InferClient> CachingClient<C> {
    pub fn new(inner: C, cache_dir: PathBuf, daily_limit_max: u32) -> Self {
        let _ = fs::create_dir_all(&cache_dir);
        let counter = Mutex::new(load_daily_counter(&cache_dir).unwrap_or_default());
        Self {
            inner,
            cache_dir,
            daily_limit_max,
            counter,
        }
    }

    fn budget_available(&self) -> bool {
        let mut g = self.counter.lock().expect("poisoned counter");
        if g.is_expired() {
            g.reset_to_today();
            let _ = save_daily_counter(&self.cache_dir, &g);
        }
        g.count < self.daily_limit_max
    }

    fn consume_budget(&self) {
        let mut g = self.counter.lock().expect("poisoned counter");
        g.count = g.count.saturating_add(1);
        let _ = save_daily_counter(&self.cache_dir, &g);
    }

    fn read_cached<T: DeserializeOwned>(&self, kind: &str, input: &str) -> Option<T> {
        read_cache_file(&self.cache_dir, &cache_key(kind, input))
    }

    fn write_cached<T: Serialize>(&self, kind: &str, input: &str, value: &T) {
        let _ = write_cache_file(&self.cache_dir, &cache_key(kind, input), value);
    }
}

#[async_trait]
impl<C: InferClient> InferClient for CachingClient<C> {
    async fn sentiment(&self, input: &str) -> Option<SentimentScores> {
        if let Some(hit) = self.read_cached::<SentimentScores>("sentiment", input) {
            return Some(hit);
        }
        if !self.budget_available() {
            return None;
        }
        let fresh = self.inner.sentiment(input).await?;
        self.consume_budget();
        self.write_cached("sentiment", input, &fresh);
        Some(fresh)
    }

    async fn zero_shot(&self, input: &str, labels: &[String]) -> Option<ZeroShotOutcome> {
        // The label set is part of the key; a config change must miss.
        let keyed = format!("{}|{input}", labels.join(","));
        if let Some(hit) = self.read_cached::<ZeroShotOutcome>("zero-shot", &keyed) {
            return Some(hit);
        }
        if !self.budget_available() {
            return None;
        }
        let fresh = self.inner.zero_shot(input, labels).await?;
        self.consume_budget();
        self.write_cached("zero-shot", &keyed, &fresh);
        Some(fresh)
    }

    fn provider_name(&self) -> &'static str {
        self.inner.provider_name()
    }
}

// ------------------------------------------------------------
// File cache helpers
// ------------------------------------------------------------

fn default_cache_dir() -> PathBuf {
    PathBuf::from("cache/infer")
}

fn cache_key(kind: &str, input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(kind.as_bytes());
    hasher.update([0]);
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(16);
    for b in digest.iter().take(8) {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

fn cache_path(dir: &Path, key: &str) -> PathBuf {
    dir.join(format!("{key}.json"))
}

fn read_cache_file<T: DeserializeOwned>(dir: &Path, key: &str) -> Option<T> {
    let mut file = fs::File::open(cache_path(dir, key)).ok()?;
    let mut buf = String::new();
    file.read_to_string(&mut buf).ok()?;
    serde_json::from_str(&buf).ok()
}

fn write_cache_file<T: Serialize>(dir: &Path, key: &str, value: &T) -> io::Result<()> {
    let path = cache_path(dir, key);
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string());
    let mut f = fs::File::create(&tmp)?;
    f.write_all(json.as_bytes())?;
    fs::rename(tmp, path)?;
    Ok(())
}

// ------------------------------------------------------------
// Daily counter helpers
// ------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DailyCounter {
    date: String,
    count: u32,
}

impl Default for DailyCounter {
    fn default() -> Self {
        Self {
            date: today(),
            count: 0,
        }
    }
}

impl DailyCounter {
    fn is_expired(&self) -> bool {
        self.date != today()
    }
    fn reset_to_today(&mut self) {
        self.date = today();
        self.count = 0;
    }
}

/// Days since the UNIX epoch as a string; sufficient for equality and
/// rollover.
fn today() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
        .as_secs();
    (secs / 86_400).to_string()
}

fn counter_path(dir: &Path) -> PathBuf {
    dir.join("daily_count.json")
}

fn load_daily_counter(dir: &Path) -> io::Result<DailyCounter> {
    let s = fs::read_to_string(counter_path(dir))?;
    let dc: DailyCounter =
        serde_json::from_str(&s).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(dc)
}

fn save_daily_counter(dir: &Path, dc: &DailyCounter) -> io::Result<()> {
    let p = counter_path(dir);
    let tmp = p.with_extension("json.tmp");
    let s = serde_json::to_string(dc).unwrap_or_else(|_| "{}".to_string());
    let mut f = fs::File::create(&tmp)?;
    f.write_all(s.as_bytes())?;
    fs::rename(tmp, p)?;
    Ok(())
}
