//! Coverage for config parsing, file loading and env overrides.

use std::time::Duration;

use taskdraft::config::{LlmConfig, TaskdraftConfig, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};

fn parse(toml_str: &str) -> TaskdraftConfig {
    match TaskdraftConfig::from_toml(toml_str) {
        Ok(config) => config,
        Err(err) => panic!("config should parse: {err}"),
    }
}

#[test]
fn empty_file_gives_defaults() {
    let config = parse("");
    assert_eq!(config.llm.base_url, "http://localhost:11434");
    assert_eq!(config.llm.model, DEFAULT_MODEL);
    assert_eq!(config.llm.timeout_secs, DEFAULT_TIMEOUT_SECS);
    assert_eq!(config.llm.timeout(), Duration::from_secs(30));
}

#[test]
fn partial_sections_keep_other_defaults() {
    let config = parse(
        r#"
[llm]
model = "llama3:8b"

[logging]
dir = "/var/log/taskdraft"
"#,
    );
    assert_eq!(config.llm.model, "llama3:8b");
    assert_eq!(config.llm.base_url, "http://localhost:11434");
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.logging.dir.as_deref(), Some("/var/log/taskdraft"));
}

#[test]
fn mistyped_value_is_an_error() {
    let result = TaskdraftConfig::from_toml("[llm]\ntimeout_secs = \"thirty\"\n");
    assert!(result.is_err());
}

#[test]
fn env_overrides_beat_file_values() {
    let mut config = parse("[llm]\nbase_url = \"http://file:11434\"\ntimeout_secs = 10\n");
    config.apply_overrides(|key| match key {
        "TASKDRAFT_OLLAMA_URL" => Some("http://env:11434".to_owned()),
        "TASKDRAFT_TIMEOUT_SECS" => Some("45".to_owned()),
        "TASKDRAFT_LOG_LEVEL" => Some("debug".to_owned()),
        _ => None,
    });
    assert_eq!(config.llm.base_url, "http://env:11434");
    assert_eq!(config.llm.timeout_secs, 45);
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn load_with_reads_file_from_env_path() {
    let tmp = tempfile::tempdir().expect("should create temp dir");
    let path = tmp.path().join("taskdraft.toml");
    std::fs::write(&path, "[llm]\nmodel = \"phi3\"\n").expect("should write config");

    let path_str = path.display().to_string();
    let config = TaskdraftConfig::load_with(|key| match key {
        "TASKDRAFT_CONFIG_PATH" => Some(path_str.clone()),
        "OLLAMA_BASE_URL" => Some("http://gpu:11434".to_owned()),
        _ => None,
    });
    let config = match config {
        Ok(config) => config,
        Err(err) => panic!("config should load: {err}"),
    };
    assert_eq!(config.llm.model, "phi3");
    assert_eq!(config.llm.base_url, "http://gpu:11434");
}

#[test]
fn missing_file_gives_defaults() {
    let tmp = tempfile::tempdir().expect("should create temp dir");
    let path_str = tmp.path().join("absent.toml").display().to_string();
    let config = TaskdraftConfig::load_with(|key| match key {
        "TASKDRAFT_CONFIG_PATH" => Some(path_str.clone()),
        _ => None,
    });
    assert!(matches!(config, Ok(c) if c.llm.model == DEFAULT_MODEL));
}

#[test]
fn broken_file_is_an_error() {
    let tmp = tempfile::tempdir().expect("should create temp dir");
    let path = tmp.path().join("taskdraft.toml");
    std::fs::write(&path, "[llm\nmodel = ").expect("should write config");

    let path_str = path.display().to_string();
    let config = TaskdraftConfig::load_with(|key| match key {
        "TASKDRAFT_CONFIG_PATH" => Some(path_str.clone()),
        _ => None,
    });
    assert!(config.is_err());
}

#[test]
fn llm_default_matches_config_default() {
    let llm = LlmConfig::default();
    assert_eq!(llm.model, TaskdraftConfig::default().llm.model);
}
