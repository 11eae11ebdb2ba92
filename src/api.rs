use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, Method},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use metrics::{counter, histogram};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::classify::{Classification, Classifier, Label, ScoreBreakdown};
use crate::debug;
use crate::error::ApiError;
use crate::extract;
use crate::respond;

/// Whole-request body cap (text + file parts).
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;
/// Anything shorter (trimmed) is rejected as having no content to triage.
const MIN_TEXT_CHARS: usize = 10;
const ORIGINAL_PREVIEW_CHARS: usize = 300;
const PROCESSED_PREVIEW_CHARS: usize = 200;

#[derive(Clone)]
pub struct AppState {
    classifier: Arc<Classifier>,
}

impl AppState {
    pub fn new(classifier: Classifier) -> Self {
        Self {
            classifier: Arc::new(classifier),
        }
    }

    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self::new(Classifier::from_env()?))
    }

    pub fn lexicon_terms(&self) -> usize {
        self.classifier.lexicon_terms()
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/analyze", post(analyze))
        .route("/api/examples", get(examples))
        .merge(debug::router())
        .fallback(not_found)
        .layer(cors)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

/* ----------------------------
/api/health
---------------------------- */

#[derive(Serialize)]
struct EngineInfo {
    remote_provider: &'static str,
    remote_enabled: bool,
    lexicon_terms: usize,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    checked_at: String,
    engines: EngineInfo,
    features: Vec<&'static str>,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let provider = state.classifier.provider_name();
    Json(HealthResponse {
        status: "healthy",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        checked_at: Utc::now().to_rfc3339(),
        engines: EngineInfo {
            remote_provider: provider,
            remote_enabled: provider != "disabled",
            lexicon_terms: state.classifier.lexicon_terms(),
        },
        features: vec![
            "hybrid ensemble scoring",
            "lexicon sentiment fallback",
            "zero-shot hinting",
            "txt and pdf uploads",
            "canned reply suggestions",
        ],
    })
}

/* ----------------------------
/api/analyze
---------------------------- */

#[derive(Serialize)]
struct TextStats {
    text_length: usize,
    word_count: usize,
    processed_words: usize,
    question_marks: usize,
    exclamation_marks: usize,
    uppercase_ratio: f32,
}

#[derive(Serialize)]
pub struct AnalyzeResponse {
    classification: Label,
    confidence: f32,
    suggested_response: String,
    original_text: String,
    processed_text: String,
    ai_method: &'static str,
    analysis_details: ScoreBreakdown,
    analysis: TextStats,
    engine: EngineInfo,
}

async fn analyze(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let started = Instant::now();
    counter!("triage_analyze_requests_total").increment(1);

    let mut text_input: Option<String> = None;
    let mut file_input: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await? {
        let part = field.name().map(str::to_string);
        match part.as_deref() {
            Some("text") => {
                let value = field.text().await?;
                if !value.trim().is_empty() {
                    text_input = Some(value.trim().to_string());
                }
            }
            Some("file") => {
                let name = field.file_name().map(str::to_string);
                let bytes = field.bytes().await?;
                if let Some(name) = name {
                    file_input = Some((name, bytes.to_vec()));
                }
            }
            _ => {}
        }
    }

    // Direct text wins over the file part when both are present.
    let email_text = if let Some(text) = text_input {
        info!("processing direct text input");
        text
    } else if let Some((name, bytes)) = file_input {
        if !extract::allowed_file(&name) {
            return Err(ApiError::BadRequest(
                "Invalid file format. Please upload .txt or .pdf files only.".to_string(),
            ));
        }
        info!(file = %name, "processing uploaded file");
        extract::extract_from_upload(&name, &bytes)?
    } else {
        return Err(short_input_error());
    };

    if email_text.trim().chars().count() < MIN_TEXT_CHARS {
        return Err(short_input_error());
    }

    let classification = state.classifier.classify(&email_text).await;
    let reply = respond::suggested_reply(
        classification.label,
        classification.confidence,
        &email_text,
    );

    let latency_ms = started.elapsed().as_millis() as u64;
    debug::record(
        classification.label,
        classification.confidence,
        classification.method,
        latency_ms,
    );
    counter!("triage_classifications_total", "label" => classification.label.as_str())
        .increment(1);
    histogram!("triage_analyze_latency_ms").record(latency_ms as f64);
    info!(
        id = %anon_hash(&email_text),
        label = classification.label.as_str(),
        confidence = classification.confidence,
        method = classification.method,
        latency_ms,
        "analysis completed"
    );

    let provider = state.classifier.provider_name();
    Ok(Json(build_response(
        email_text,
        classification,
        reply.to_string(),
        EngineInfo {
            remote_provider: provider,
            remote_enabled: provider != "disabled",
            lexicon_terms: state.classifier.lexicon_terms(),
        },
    )))
}

fn short_input_error() -> ApiError {
    ApiError::BadRequest(
        "Please provide email content with at least 10 characters.".to_string(),
    )
}

fn build_response(
    email_text: String,
    classification: Classification,
    suggested_response: String,
    engine: EngineInfo,
) -> AnalyzeResponse {
    let stats = TextStats {
        text_length: email_text.chars().count(),
        word_count: classification.signals.word_count,
        processed_words: classification
            .processed_text
            .split_whitespace()
            .count(),
        question_marks: classification.signals.question_marks,
        exclamation_marks: classification.signals.exclamation_marks,
        uppercase_ratio: classification.signals.uppercase_ratio,
    };

    AnalyzeResponse {
        classification: classification.label,
        confidence: classification.confidence,
        suggested_response,
        original_text: truncate_chars(&email_text, ORIGINAL_PREVIEW_CHARS),
        processed_text: truncate_chars(&classification.processed_text, PROCESSED_PREVIEW_CHARS),
        ai_method: classification.method,
        analysis_details: classification.details,
        analysis: stats,
        engine,
    }
}

/// Char-safe preview truncation with an ellipsis marker.
fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let mut out: String = s.chars().take(max).collect();
        out.push_str("...");
        out
    } else {
        s.to_string()
    }
}

/// Short stable id for log lines; raw email text is never logged.
fn anon_hash(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/* ----------------------------
/api/examples
---------------------------- */

const PRODUCTIVE_EXAMPLES: [&str; 3] = [
    "Hi, I'm experiencing a critical issue with my account login. The system keeps showing 'Authentication Failed' error even with correct credentials. This is urgent as I need to access my dashboard for an important client presentation today. Please help resolve this ASAP. Error code: AUTH_2023_FAILED",
    "Good morning, I need immediate assistance with a payment processing error. Transaction ID: TXN123456 failed but the amount was debited from my account. This is affecting our business operations and needs urgent attention from your technical team. The issue occurred at 2:30 PM yesterday.",
    "There seems to be a critical bug in your latest software update v2.1.5. The export function is not working properly and throwing a 500 internal server error. This is blocking our entire workflow and we need a fix or rollback procedure immediately. Our team of 15 people cannot proceed with their tasks.",
];

const NON_PRODUCTIVE_EXAMPLES: [&str; 3] = [
    "Thank you so much for the excellent customer service last month! Your team really went above and beyond to help us during the system migration process. We truly appreciate the dedication and professionalism shown by everyone involved. Looking forward to our continued partnership!",
    "Happy New Year to you and your entire team! Wishing everyone at your company a prosperous 2024 filled with success, growth, and innovation. Thank you for being such wonderful business partners throughout this past year. Here's to many more years of collaboration!",
    "Just wanted to express my heartfelt gratitude for the birthday wishes and the thoughtful gift card you sent. It really made my day special and showed how much you value our business relationship! Looking forward to continuing our great partnership in the coming months.",
];

#[derive(Serialize)]
struct ExamplesResponse {
    productive: Vec<&'static str>,
    non_productive: Vec<&'static str>,
}

async fn examples() -> Json<ExamplesResponse> {
    Json(ExamplesResponse {
        productive: PRODUCTIVE_EXAMPLES.to_vec(),
        non_productive: NON_PRODUCTIVE_EXAMPLES.to_vec(),
    })
}
