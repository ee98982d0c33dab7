//! Integration tests for Configuration System

use coursegen::config::{ConfigLoader, CoursegenConfig, ValidationError};
use coursegen::logging::LogOutput;
use std::collections::HashMap;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_config_file_drives_workflow_options() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("coursegen.toml");
    std::fs::write(
        &config_file,
        r#"
[primary_store]
base_url = "http://store.local/api"

[generation]
base_url = "http://ai.local"
request_timeout_ms = 30000

[polling]
interval_ms = 5000
max_polls = 60

[workflow]
update_concurrency = 2
correlation_prefix = "sec_"

[logging]
level = "debug"
output = "file"
file = "logs/coursegen.log"
"#,
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(&config_file).unwrap();
    assert!(config.validate().is_ok());

    let options = config.workflow_options();
    assert_eq!(options.poll.interval, Duration::from_secs(5));
    assert_eq!(options.poll.ceiling(), Duration::from_secs(300));
    assert_eq!(options.update_concurrency, 2);
    assert_eq!(options.correlation_prefix, "sec_");
    assert_eq!(config.generation.request_timeout_ms, 30_000);
    assert_eq!(config.logging.output, LogOutput::File);
}

#[test]
fn test_environment_overrides_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("coursegen.toml");
    std::fs::write(
        &config_file,
        "[generation]\nbase_url = \"http://ai.local\"\n[polling]\nmax_polls = 60\n",
    )
    .unwrap();

    let mut env = HashMap::new();
    env.insert("COURSEGEN__POLLING__MAX_POLLS".to_string(), "10".to_string());
    env.insert(
        "COURSEGEN__PRIMARY_STORE__BASE_URL".to_string(),
        "http://store.env".to_string(),
    );

    let config = ConfigLoader::new()
        .with_user_file(None)
        .with_file(&config_file)
        .with_environment(env)
        .load()
        .unwrap();

    assert_eq!(config.polling.max_polls, 10);
    assert_eq!(config.primary_store.base_url, "http://store.env");
    assert_eq!(config.generation.base_url, "http://ai.local");
}

#[test]
fn test_invalid_values_are_all_reported() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("coursegen.toml");
    std::fs::write(
        &config_file,
        r#"
[primary_store]
base_url = "store.local"

[generation]
base_url = "http://ai.local"

[polling]
interval_ms = 0

[workflow]
correlation_prefix = ""
"#,
    )
    .unwrap();

    let errors = ConfigLoader::load_from_file(&config_file)
        .unwrap()
        .validate()
        .unwrap_err();
    assert_eq!(errors.len(), 3);
    assert!(errors
        .iter()
        .any(|e| matches!(e, ValidationError::Endpoint(name, _) if name == "primary_store")));
    assert!(errors.iter().any(|e| matches!(e, ValidationError::Polling(_))));
    assert!(errors.iter().any(|e| matches!(e, ValidationError::Workflow(_))));
}

#[test]
fn test_malformed_toml_is_a_config_error() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("coursegen.toml");
    std::fs::write(&config_file, "[polling\ninterval_ms = ").unwrap();
    assert!(ConfigLoader::load_from_file(&config_file).is_err());
}

#[test]
fn test_defaults_without_any_source() {
    let config = ConfigLoader::new()
        .with_user_file(None)
        .with_environment(HashMap::new())
        .load()
        .unwrap();
    let defaults = CoursegenConfig::default();
    assert_eq!(config.polling, defaults.polling);
    assert_eq!(config.workflow, defaults.workflow);
    assert_eq!(config.generation.connect_timeout_ms, 10_000);
}
