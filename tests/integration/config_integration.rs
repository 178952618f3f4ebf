//! Integration tests for Configuration System

use super::test_utils::with_env;
use multilevel::{ConfigLoader, Engine, EngineConfig, EngineError};
use serde_json::json;
use tempfile::TempDir;

#[tokio::test]
async fn test_engine_from_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("engine.toml");

    std::fs::write(
        &config_file,
        r#"
max_dimension_distance = 0.5

[default_level]
id = "BASE"
dimension = 1.0
phases = ["analysis"]
timeout_ms = 2000

[[levels]]
id = "DEEP"
dimension = 3.0
phases = ["analysis", "processing", "output"]
timeout_ms = 15000
"#,
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(&config_file).unwrap();
    assert!(config.validate().is_ok());

    let engine = Engine::from_config(config).unwrap();
    let ids: Vec<String> = engine.list_levels().into_iter().map(|l| l.id).collect();
    assert_eq!(ids, vec!["BASE", "DEEP"]);
    assert!(engine.level_info("STANDARD").is_err());

    let ctx = engine.process(&json!({ "dimension": 2.9 }), None).await.unwrap();
    assert_eq!(ctx.artifacts.len(), 3);
    assert_eq!(ctx.dimension, 3.0);
}

#[test]
fn test_invalid_config_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("engine.toml");
    std::fs::write(
        &config_file,
        r#"
[[levels]]
id = "BROKEN"
dimension = -1.0
phases = ["unknown"]
timeout_ms = 5000
"#,
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(&config_file).unwrap();
    let errors = config.validate().unwrap_err();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].to_string().contains("Dimension must be a positive number"));
    assert!(errors[0].to_string().contains("Invalid phases: unknown"));

    match Engine::from_config(config) {
        Err(EngineError::ConfigError(msg)) => assert!(msg.contains("BROKEN")),
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("invalid configuration accepted"),
    }
}

#[test]
fn test_workspace_environment_file_is_layered() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path();
    let config_dir = workspace.join("config");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("config.toml"), "debug = false\nmin_timeout_ms = 400\n").unwrap();
    std::fs::write(config_dir.join("staging.toml"), "debug = true\n").unwrap();

    let empty_home = temp_dir.path().join("xdg").to_string_lossy().to_string();
    let config = with_env(
        &[
            ("XDG_CONFIG_HOME", Some(empty_home.as_str())),
            ("MULTILEVEL_ENV", Some("staging")),
        ],
        || ConfigLoader::load(workspace).unwrap(),
    );

    assert!(config.debug);
    assert_eq!(config.min_timeout_ms, 400);
    assert_eq!(config.default_level, EngineConfig::default().default_level);
}

#[test]
fn test_environment_overrides_workspace_file() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path();
    let config_dir = workspace.join("config");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("config.toml"), "default_dimension = 2.0\n").unwrap();

    let empty_home = temp_dir.path().join("xdg").to_string_lossy().to_string();
    let config = with_env(
        &[
            ("XDG_CONFIG_HOME", Some(empty_home.as_str())),
            ("MULTILEVEL_ENV", None),
            ("MULTILEVEL_DEFAULT_DIMENSION", Some("4.5")),
        ],
        || ConfigLoader::load(workspace).unwrap(),
    );

    assert_eq!(config.default_dimension, 4.5);
}
