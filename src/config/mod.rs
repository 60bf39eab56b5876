//! Configuration loading.
//!
//! Loads `./taskdraft.toml` (or `$TASKDRAFT_CONFIG_PATH`). Environment
//! variables override file values; file values override defaults.
//!
//! Precedence: env vars > config file > defaults.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::providers::ollama::DEFAULT_OLLAMA_URL;

/// Default model name.
pub const DEFAULT_MODEL: &str = "mistral";

/// Default model call timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

// ── Top-level config ────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TaskdraftConfig {
    /// Model server settings (`[llm]`).
    pub llm: LlmConfig,
    /// Logging settings (`[logging]`).
    pub logging: LoggingConfig,
}

impl TaskdraftConfig {
    /// Load configuration with precedence: env vars > TOML file > defaults.
    ///
    /// If the file does not exist, returns defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Load using a custom env resolver (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_with(env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let path = Self::config_path_with(&env);
        let mut config = Self::load_from_file(&path)?;
        config.apply_overrides(&env);
        Ok(config)
    }

    /// Load from a TOML file only, no env overrides.
    fn load_from_file(path: &PathBuf) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                tracing::debug!(path = %path.display(), "loading config from file");
                Self::from_toml(&contents)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "failed to read config file {}: {e}",
                path.display()
            )),
        }
    }

    /// Resolve the config path: `$TASKDRAFT_CONFIG_PATH` or `./taskdraft.toml`.
    fn config_path_with(env: impl Fn(&str) -> Option<String>) -> PathBuf {
        env("TASKDRAFT_CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("taskdraft.toml"))
    }

    /// Apply environment variable overrides (env > config > defaults).
    ///
    /// Takes a resolver function for testability (avoids unsafe `set_var` in tests).
    pub fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        // LLM. The OLLAMA_* names are accepted for compatibility with
        // existing `.env` files.
        if let Some(v) = env("TASKDRAFT_OLLAMA_URL").or_else(|| env("OLLAMA_BASE_URL")) {
            self.llm.base_url = v;
        }
        if let Some(v) = env("TASKDRAFT_MODEL").or_else(|| env("OLLAMA_MODEL")) {
            self.llm.model = v;
        }
        if let Some(v) = env("TASKDRAFT_TIMEOUT_SECS") {
            match v.parse() {
                Ok(n) => self.llm.timeout_secs = n,
                Err(_) => tracing::warn!(
                    var = "TASKDRAFT_TIMEOUT_SECS",
                    value = %v,
                    "ignoring invalid env override"
                ),
            }
        }

        // Logging.
        if let Some(v) = env("TASKDRAFT_LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Some(v) = env("TASKDRAFT_LOG_DIR") {
            self.logging.dir = Some(v);
        }
    }

    /// Parse a TOML string into config.
    ///
    /// # Errors
    ///
    /// Returns an error on invalid TOML or mistyped values.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).context("failed to parse config TOML")
    }
}

// ── LLM config ──────────────────────────────────────────────────

/// Model server configuration (`[llm]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Ollama base URL.
    pub base_url: String,
    /// Model name.
    pub model: String,
    /// Upper bound for one model call, in seconds.
    pub timeout_secs: u64,
}

impl LlmConfig {
    /// Model call timeout. Zero is raised to one second.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_URL.to_owned(),
            model: DEFAULT_MODEL.to_owned(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

// ── Logging config ──────────────────────────────────────────────

/// Logging configuration (`[logging]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub level: String,
    /// Directory for rotating JSON logs. Console only when unset.
    pub dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            dir: None,
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────
