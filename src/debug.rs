//! In-memory diagnostics: a bounded history of recent classifications and
//! aggregate counters, exposed under /debug.

use std::{collections::VecDeque, sync::Mutex};

use axum::{extract::Query, routing::get, Json, Router};
use chrono::Utc;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::classify::Label;

const HISTORY_CAP: usize = 500;
const LAT_CAP: usize = 200;
const DEFAULT_HISTORY_LIMIT: usize = 50;

#[derive(Clone, Serialize)]
pub struct RecordedAnalysis {
    pub at: String,
    pub label: Label,
    pub confidence: f32,
    pub method: String,
    pub latency_ms: u64,
}

#[derive(Default, Clone, Serialize)]
pub struct Stats {
    pub analyze_requests: u64,
    pub productive: u64,
    pub non_productive: u64,
    pub rolling_avg_ms: Option<f64>,
}

static HISTORY: Lazy<Mutex<VecDeque<RecordedAnalysis>>> =
    Lazy::new(|| Mutex::new(VecDeque::with_capacity(HISTORY_CAP)));
static STATS: Lazy<Mutex<Stats>> = Lazy::new(|| Mutex::new(Stats::default()));
static LAT_MS: Lazy<Mutex<VecDeque<u64>>> = Lazy::new(|| Mutex::new(VecDeque::with_capacity(LAT_CAP)));

/// Record one completed analysis.
pub fn record(label: Label, confidence: f32, method: &str, latency_ms: u64) {
    {
        let mut h = HISTORY.lock().expect("history lock");
        if h.len() == HISTORY_CAP {
            h.pop_front();
        }
        h.push_back(RecordedAnalysis {
            at: Utc::now().to_rfc3339(),
            label,
            confidence,
            method: method.to_string(),
            latency_ms,
        });
    }
    {
        let mut s = STATS.lock().expect("stats lock");
        s.analyze_requests += 1;
        match label {
            Label::Productive => s.productive += 1,
            Label::NonProductive => s.non_productive += 1,
        }
    }
    {
        let mut l = LAT_MS.lock().expect("latency lock");
        if l.len() == LAT_CAP {
            l.pop_front();
        }
        l.push_back(latency_ms);
    }
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/debug/history", get(history))
        .route("/debug/stats", get(stats))
}

async fn history(Query(q): Query<HistoryQuery>) -> Json<Vec<RecordedAnalysis>> {
    let limit = q.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    let h = HISTORY.lock().expect("history lock");
    let rows = h.iter().rev().take(limit).cloned().collect::<Vec<_>>();
    Json(rows)
}

async fn stats() -> Json<Stats> {
    let mut out = STATS.lock().expect("stats lock").clone();
    let l = LAT_MS.lock().expect("latency lock");
    if !l.is_empty() {
        out.rolling_avg_ms = Some(l.iter().sum::<u64>() as f64 / l.len() as f64);
    }
    Json(out)
}
