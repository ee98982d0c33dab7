//! User-level config file discovery

use crate::integration::test_utils::with_xdg_env;
use coursegen::config::{user_config_path, ConfigLoader};
use std::collections::HashMap;
use tempfile::TempDir;

#[test]
fn test_user_config_path_follows_xdg_config_home() {
    let test_dir = TempDir::new().unwrap();
    with_xdg_env(&test_dir, || {
        let path = user_config_path().unwrap();
        assert_eq!(path, test_dir.path().join("coursegen").join("config.toml"));
    });
}

#[test]
fn test_user_config_is_loaded_and_explicit_file_wins() {
    let test_dir = TempDir::new().unwrap();
    let app_dir = test_dir.path().join("coursegen");
    std::fs::create_dir_all(&app_dir).unwrap();
    std::fs::write(
        app_dir.join("config.toml"),
        "[generation]\nbase_url = \"http://user.ai\"\n[polling]\nmax_polls = 42\n",
    )
    .unwrap();
    let explicit = test_dir.path().join("project.toml");
    std::fs::write(&explicit, "[generation]\nbase_url = \"http://project.ai\"\n").unwrap();

    with_xdg_env(&test_dir, || {
        let user_only = ConfigLoader::new()
            .with_environment(HashMap::new())
            .load()
            .unwrap();
        assert_eq!(user_only.generation.base_url, "http://user.ai");
        assert_eq!(user_only.polling.max_polls, 42);

        let layered = ConfigLoader::new()
            .with_file(&explicit)
            .with_environment(HashMap::new())
            .load()
            .unwrap();
        assert_eq!(layered.generation.base_url, "http://project.ai");
        assert_eq!(layered.polling.max_polls, 42);
    });
}

#[test]
fn test_missing_user_config_falls_back_to_defaults() {
    let test_dir = TempDir::new().unwrap();
    with_xdg_env(&test_dir, || {
        let config = ConfigLoader::new()
            .with_environment(HashMap::new())
            .load()
            .unwrap();
        assert_eq!(config.polling.max_polls, 200);
        assert!(config.generation.base_url.is_empty());
    });
}
