//! Taskdraft CLI entry point.
//!
//! Provides `extract` for turning a description into a task record and
//! `check` for probing the configured model server.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::io::Read;
use std::path::Path;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use taskdraft::config::TaskdraftConfig;
use taskdraft::extractors::RuleBasedExtractor;
use taskdraft::logging::{self, LoggingGuard};
use taskdraft::pipeline::TaskExtractor;
use taskdraft::providers::ollama::{model_is_available, OllamaClient};

/// Taskdraft: structured tasks from free-form descriptions.
#[derive(Parser)]
#[command(name = "taskdraft", version, about)]
struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Command {
    /// Extract a task from a description and print it as JSON.
    Extract {
        /// Task description. Use `-` to read it from stdin.
        prompt: String,
        /// Reference date (YYYY-MM-DD) for relative phrases. Defaults to today.
        #[arg(long)]
        today: Option<NaiveDate>,
        /// Skip the model and use the rule-based extractor only.
        #[arg(long)]
        offline: bool,
        /// Pretty-print the JSON output.
        #[arg(long)]
        pretty: bool,
    },
    /// Check that the model server is reachable and the model is pulled.
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = TaskdraftConfig::load().context("failed to load configuration")?;
    let _logging_guard = init_logging(&config)?;

    match cli.command {
        Command::Extract {
            prompt,
            today,
            offline,
            pretty,
        } => handle_extract(&config, &prompt, today, offline, pretty).await,
        Command::Check => handle_check(&config).await,
    }
}

/// Console logging, plus JSON files when `[logging] dir` is set.
fn init_logging(config: &TaskdraftConfig) -> anyhow::Result<Option<LoggingGuard>> {
    match &config.logging.dir {
        Some(dir) => logging::init_production(Path::new(dir), &config.logging.level).map(Some),
        None => {
            logging::init_cli(&config.logging.level);
            Ok(None)
        }
    }
}

/// Run one extraction and print the task.
async fn handle_extract(
    config: &TaskdraftConfig,
    prompt: &str,
    today: Option<NaiveDate>,
    offline: bool,
    pretty: bool,
) -> anyhow::Result<()> {
    let prompt = if prompt == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read prompt from stdin")?;
        buf
    } else {
        prompt.to_owned()
    };
    let reference = today.unwrap_or_else(|| chrono::Local::now().date_naive());

    let task = if offline {
        RuleBasedExtractor::new().extract(&prompt, reference)
    } else {
        let extractor =
            TaskExtractor::from_config(&config.llm).context("failed to build model client")?;
        let outcome = extractor.run(&prompt, reference).await;
        info!(path = ?outcome.path, "extraction finished");
        outcome.task
    };

    let json = if pretty {
        serde_json::to_string_pretty(&task)?
    } else {
        serde_json::to_string(&task)?
    };
    println!("{json}");
    Ok(())
}

/// Probe `/api/version` and `/api/tags`.
async fn handle_check(config: &TaskdraftConfig) -> anyhow::Result<()> {
    let client = OllamaClient::new(&config.llm.base_url, config.llm.timeout())
        .context("failed to build model client")?;

    let version = client
        .version()
        .await
        .with_context(|| format!("model server at {} is unreachable", config.llm.base_url))?;
    println!("ollama {version} at {}", config.llm.base_url);

    let models = client
        .list_models()
        .await
        .context("failed to list models")?;
    if model_is_available(&models, &config.llm.model) {
        println!("model {} is available", config.llm.model);
        Ok(())
    } else {
        warn!(model = %config.llm.model, available = ?models, "configured model not pulled");
        anyhow::bail!(
            "model {} is not available; run `ollama pull {}`",
            config.llm.model,
            config.llm.model
        )
    }
}
