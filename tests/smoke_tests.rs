use newsletter_events::components::event_extractor::ExtractionProfile;
use newsletter_events::config::{Config, FileSettings};
use newsletter_events::pipeline::RunStage;
use newsletter_events::startup;
use std::path::PathBuf;

fn test_config(dir: &std::path::Path) -> Config {
    Config {
        sender: "news@example.org".to_string(),
        gemini_api_key: "test_api_key".to_string(),
        gemini_model: "gemini-2.5-flash".to_string(),
        profile: ExtractionProfile::Extended,
        max_chars: None,
        temperature: None,
        token_path: dir.join("token.json"),
        client_secrets_path: dir.join("credentials.json"),
        output_path: dir.join("events.json"),
        google_client_id: Some("client-id".to_string()),
        google_client_secret: Some("client-secret".to_string()),
    }
}

/// Smoke test to verify that the pipeline can be wired without network access
#[test]
fn test_pipeline_builds() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = startup::build_pipeline(&test_config(dir.path())).unwrap();
    assert_eq!(pipeline.stage(), RunStage::Idle);
}

/// Without a secrets file or client ID the pipeline cannot be built
#[test]
fn test_pipeline_requires_client_secrets() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.google_client_secret = None;

    assert!(startup::build_pipeline(&config).is_err());
}

/// Smoke test to verify that the config can be resolved from variables
#[test]
fn test_config_loads() {
    let config = Config::from_sources(FileSettings::default(), |key| match key {
        "NEWSLETTER_SENDER" => Some("news@example.org".to_string()),
        "GEMINI_API_KEY" => Some("key".to_string()),
        "EXTRACTION_PROFILE" => Some("minimal".to_string()),
        _ => None,
    })
    .unwrap();

    assert_eq!(config.profile, ExtractionProfile::Minimal);
    assert_eq!(config.output_path, PathBuf::from("events.json"));
    assert_eq!(config.extraction_settings().max_chars, 10_000);
}
