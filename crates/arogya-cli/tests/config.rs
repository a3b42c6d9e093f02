use std::time::Duration;

use arogya_cli::config::{ArogyaConfig, CredentialSource, InboxBackend, ResponseMode, parse_config};
use arogya_core::models::intake::Locale;
use arogya_intake::escalation::ResponseDelivery;

const PRE_VERSIONED: &str = r#"{
    "region": "ap-south-1",
    "bucket": "arogya-intake",
    "model_id": "us.anthropic.claude-sonnet-4-20250514-v1:0",
    "locale": "local",
    "credentials": { "type": "profile", "profile_name": "clinic" },
    "decision_timeout_secs": 8,
    "capture_timeout_secs": 45,
    "inbox": "s3",
    "created_at": "2026-03-01T09:30:00Z"
}"#;

#[test]
fn pre_versioned_config_migrates_to_polling() {
    let config = parse_config(PRE_VERSIONED).unwrap();

    assert_eq!(config.config_version, 1);
    assert_eq!(config.response_delivery, ResponseMode::Poll);
    assert_eq!(config.poll_interval_secs, 5);
    assert_eq!(config.locale, Locale::Local);
    assert_eq!(
        config.credentials,
        CredentialSource::Profile {
            profile_name: "clinic".to_string()
        }
    );
    assert_eq!(config.inbox, InboxBackend::S3);
}

#[test]
fn newer_config_version_is_rejected() {
    let mut json: serde_json::Value = serde_json::from_str(PRE_VERSIONED).unwrap();
    json["config_version"] = serde_json::json!(7);

    let err = parse_config(&json.to_string()).unwrap_err();
    assert!(err.to_string().contains("newer than this build supports"));
}

#[test]
fn saved_shape_parses_back_unchanged() {
    let mut config = ArogyaConfig::new("ap-south-1", "arogya-intake");
    config.inbox = InboxBackend::Memory;
    config.response_delivery = ResponseMode::Push;

    let text = serde_json::to_string_pretty(&config).unwrap();
    let parsed = parse_config(&text).unwrap();

    assert_eq!(parsed.config_version, 1);
    assert_eq!(parsed.region, "ap-south-1");
    assert_eq!(parsed.bucket, "arogya-intake");
    assert_eq!(parsed.inbox, InboxBackend::Memory);
    assert_eq!(parsed.response_delivery, ResponseMode::Push);
    assert_eq!(parsed.created_at, config.created_at);
}

#[test]
fn engine_settings_follow_config() {
    let mut config = ArogyaConfig::new("ap-south-1", "arogya-intake");
    config.decision_timeout_secs = 3;
    config.capture_timeout_secs = 20;
    config.poll_interval_secs = 0;

    let settings = config.engine_settings();
    assert_eq!(settings.decision_timeout, Duration::from_secs(3));
    assert_eq!(settings.capture_timeout, Duration::from_secs(20));
    assert_eq!(settings.model_id, config.model_id);
    // A zero interval would spin.
    assert_eq!(
        settings.response_delivery,
        ResponseDelivery::Poll {
            interval: Duration::from_secs(1)
        }
    );

    config.response_delivery = ResponseMode::Push;
    assert_eq!(config.engine_settings().response_delivery, ResponseDelivery::Push);
}

#[test]
fn zero_timeouts_are_raised_to_one_second() {
    let mut config = ArogyaConfig::new("ap-south-1", "arogya-intake");
    config.decision_timeout_secs = 0;
    config.capture_timeout_secs = 0;

    let settings = config.engine_settings();
    assert_eq!(settings.decision_timeout, Duration::from_secs(1));
    assert_eq!(settings.capture_timeout, Duration::from_secs(1));
}
