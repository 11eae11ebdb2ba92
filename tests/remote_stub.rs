// tests/remote_stub.rs
//
// Exercises the inference adapter stack without any network:
// - mock client plumbed through the ensemble
// - caching wrapper budget + cache-hit semantics
// - factory selection via config and INFER_TEST_MODE

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use serial_test::serial;

use email_triage_analyzer::classify::remote::{
    build_client_from_config, CachingClient, InferClient, MockClient, ZeroShotOutcome,
    ENV_TEST_MODE,
};
use email_triage_analyzer::classify::vocab::{Vocabulary, DEFAULT_VOCAB_TOML};
use email_triage_analyzer::classify::{Classifier, Label};
use email_triage_analyzer::config::InferConfig;
use email_triage_analyzer::sentiment::SentimentScores;

fn classifier_with(client: MockClient) -> Classifier {
    let vocab = Vocabulary::from_toml_str(DEFAULT_VOCAB_TOML).expect("default vocab");
    Classifier::new(vocab, Arc::new(client), 10)
}

/// Create a unique temporary directory in std::env::temp_dir().
fn unique_tmp_dir(tag: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    dir.push(format!("triage_infer_{tag}_{nanos}"));
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[tokio::test]
async fn remote_sentiment_drives_the_method_tag() {
    let client = MockClient {
        sentiment: Some(SentimentScores {
            positive: 0.05,
            negative: 0.95,
        }),
        zero_shot: None,
    };
    let c = classifier_with(client);

    let out = c
        .classify("The deployment pipeline failed again and I cannot reach the admin console.")
        .await;
    assert_eq!(out.method, "remote_ensemble");
    assert_eq!(out.label, Label::Productive);
    assert!((out.details.sentiment_scores.negative - 0.95).abs() < 1e-6);
}

#[tokio::test]
async fn zero_shot_social_label_pushes_non_productive() {
    let client = MockClient {
        sentiment: None,
        zero_shot: Some(ZeroShotOutcome {
            label: "thank you message".to_string(),
            score: 0.9,
        }),
    };
    let c = classifier_with(client);

    // No vocabulary keywords at all; the zero-shot hint decides.
    let out = c.classify("See you at the office later today then.").await;
    assert_eq!(out.label, Label::NonProductive);
    assert_eq!(out.details.zero_shot_top_label.as_deref(), Some("thank you message"));
    // Sentiment fell back to the lexicon even though zero-shot was remote.
    assert_eq!(out.method, "lexicon_ensemble");
}

#[tokio::test]
async fn zero_shot_business_label_pushes_productive() {
    let client = MockClient {
        sentiment: None,
        zero_shot: Some(ZeroShotOutcome {
            label: "technical support request".to_string(),
            score: 0.9,
        }),
    };
    let c = classifier_with(client);

    let out = c.classify("See you at the office later today then.").await;
    assert_eq!(out.label, Label::Productive);
}

#[tokio::test]
async fn zero_shot_skipped_for_tiny_inputs() {
    let client = MockClient {
        sentiment: None,
        zero_shot: Some(ZeroShotOutcome {
            label: "thank you message".to_string(),
            score: 0.9,
        }),
    };
    let vocab = Vocabulary::from_toml_str(DEFAULT_VOCAB_TOML).unwrap();
    // Threshold above the processed length: the hint must not be consulted.
    let c = Classifier::new(vocab, Arc::new(client), 500);

    let out = c.classify("A fairly ordinary status note for the records.").await;
    assert!(out.details.zero_shot_top_label.is_none());
}

#[tokio::test]
async fn budget_blocks_fresh_calls_but_cache_still_serves() {
    let dir = unique_tmp_dir("budget");
    let client = CachingClient::new(MockClient::neutral(), dir.clone(), 1);

    // First call: real, consumes the single budget slot.
    assert!(client.sentiment("first email body").await.is_some());
    // Different input: budget exhausted, no cache entry → None.
    assert!(client.sentiment("second email body").await.is_none());
    // Repeat of the first input: served from cache despite the budget.
    assert!(client.sentiment("first email body").await.is_some());

    let _ = fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn zero_shot_cache_keys_include_the_label_set() {
    let dir = unique_tmp_dir("labels");
    let client = CachingClient::new(
        MockClient {
            sentiment: None,
            zero_shot: Some(ZeroShotOutcome {
                label: "business inquiry".to_string(),
                score: 0.8,
            }),
        },
        dir.clone(),
        2,
    );

    let labels_a = vec!["business inquiry".to_string()];
    let labels_b = vec!["thank you message".to_string()];

    // Two distinct label sets must consume two budget slots (no false hit).
    assert!(client.zero_shot("same body", &labels_a).await.is_some());
    assert!(client.zero_shot("same body", &labels_b).await.is_some());
    // Budget is now exhausted; only cached pairs keep answering.
    assert!(client.zero_shot("same body", &labels_a).await.is_some());
    assert!(client.zero_shot("other body", &labels_a).await.is_none());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
#[serial]
fn factory_honors_test_mode_and_disabled_config() {
    std::env::set_var(ENV_TEST_MODE, "mock");
    let client = build_client_from_config(&InferConfig::default());
    assert_eq!(client.provider_name(), "mock");
    std::env::remove_var(ENV_TEST_MODE);

    let disabled = build_client_from_config(&InferConfig::default());
    assert_eq!(disabled.provider_name(), "disabled");

    let unknown = build_client_from_config(&InferConfig {
        enabled: true,
        provider: "something-else".to_string(),
        ..InferConfig::default()
    });
    assert_eq!(unknown.provider_name(), "disabled");
}
