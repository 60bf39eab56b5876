//! Structured logging setup and the pipeline observability hook.
//!
//! Two subscriber modes:
//! - **Production** ([`init_production`]): JSON file layer (daily rotation) + console layer
//! - **CLI** ([`init_cli`]): console-only for one-shot commands
//!
//! Components never log through ambient state directly. They report
//! [`PipelineEvent`]s to an injected [`PipelineObserver`]; the default
//! [`TracingObserver`] turns each event into one `tracing` record.

use std::path::Path;
use std::sync::Mutex;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Holds the non-blocking writer guard for file logging.
///
/// The [`WorkerGuard`] must be kept alive for the duration of the process.
/// Dropping it flushes pending log entries and closes the file.
pub struct LoggingGuard {
    _guard: WorkerGuard,
}

/// Initialise logging with a JSON file layer and a console layer.
///
/// Writes JSON logs to `{logs_dir}/taskdraft.log.YYYY-MM-DD` with daily
/// rotation. Human-readable output goes to stderr. `RUST_LOG` wins over
/// `default_level` when set.
///
/// # Errors
///
/// Returns an error if the logs directory cannot be created or a global
/// subscriber is already installed.
pub fn init_production(logs_dir: &Path, default_level: &str) -> anyhow::Result<LoggingGuard> {
    std::fs::create_dir_all(logs_dir).map_err(|e| {
        anyhow::anyhow!(
            "failed to create logs directory {}: {e}",
            logs_dir.display()
        )
    })?;

    let file_appender = tracing_appender::rolling::daily(logs_dir, "taskdraft.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking);

    let console_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(json_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))?;

    Ok(LoggingGuard { _guard: guard })
}

/// Initialise console-only logging on stderr.
///
/// Stdout stays clean for command output. Silently keeps an existing
/// subscriber if one is already installed.
pub fn init_cli(default_level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_level))
        .with_writer(std::io::stderr)
        .try_init();
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

// ---------------------------------------------------------------------------
// Pipeline events
// ---------------------------------------------------------------------------

/// Something worth reporting that happened inside the extraction pipeline.
///
/// Every recovered failure has its own variant so operators can watch
/// model-path degradation separately from ordinary field defaulting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    /// The prompt was empty or whitespace only.
    EmptyPrompt,
    /// A request was sent to the model.
    ModelRequested {
        /// Model identifier.
        model: String,
    },
    /// The model call failed before producing text.
    TransportFailure {
        /// Sanitised error description.
        detail: String,
    },
    /// The model call did not finish within the configured bound.
    ModelTimeout {
        /// Timeout that expired, in milliseconds.
        timeout_ms: u64,
    },
    /// Model text could not be turned into a field mapping.
    MalformedResponse {
        /// Leading part of the offending text.
        preview: String,
    },
    /// A required field was missing and got its default.
    FieldDefaulted {
        /// Field name.
        field: &'static str,
    },
    /// A field was present but unusable and got its default.
    FieldInvalid {
        /// Field name.
        field: &'static str,
        /// The rejected value, rendered as text.
        value: String,
    },
    /// A due-date phrase could not be resolved.
    DateUnresolved {
        /// The phrase that failed.
        phrase: String,
    },
    /// The model path produced the final task.
    ModelPathCompleted,
    /// The rule-based extractor produced the final task.
    FallbackUsed {
        /// Why the model path was abandoned.
        reason: String,
    },
    /// Audio transcription failed or produced no text.
    TranscriptionFailed {
        /// Error description.
        detail: String,
    },
}

/// Receives [`PipelineEvent`]s from every pipeline component.
pub trait PipelineObserver: Send + Sync {
    /// Handle a single event.
    fn on_event(&self, event: &PipelineEvent);
}

/// Observer that forwards every event to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn on_event(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::EmptyPrompt => {
                tracing::warn!(event = "empty_prompt", "empty prompt, using rule-based extraction");
            }
            PipelineEvent::ModelRequested { model } => {
                tracing::debug!(event = "model_requested", %model, "requesting task extraction");
            }
            PipelineEvent::TransportFailure { detail } => {
                tracing::warn!(event = "transport_failure", %detail, "model call failed");
            }
            PipelineEvent::ModelTimeout { timeout_ms } => {
                tracing::warn!(event = "model_timeout", timeout_ms, "model call timed out");
            }
            PipelineEvent::MalformedResponse { preview } => {
                tracing::warn!(event = "malformed_response", %preview, "model output is not a task object");
            }
            PipelineEvent::FieldDefaulted { field } => {
                tracing::debug!(event = "field_defaulted", field, "missing field defaulted");
            }
            PipelineEvent::FieldInvalid { field, value } => {
                tracing::info!(event = "field_invalid", field, %value, "invalid field defaulted");
            }
            PipelineEvent::DateUnresolved { phrase } => {
                tracing::info!(event = "date_unresolved", %phrase, "due date phrase not understood");
            }
            PipelineEvent::ModelPathCompleted => {
                tracing::info!(event = "model_path_completed", "task extracted by model");
            }
            PipelineEvent::FallbackUsed { reason } => {
                tracing::warn!(event = "fallback_used", %reason, "task extracted by rules");
            }
            PipelineEvent::TranscriptionFailed { detail } => {
                tracing::warn!(event = "transcription_failed", %detail, "no prompt from audio");
            }
        }
    }
}

/// Observer that keeps every event in memory.
///
/// Meant for tests that assert on which recovery boundaries fired.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<PipelineEvent>>,
}

impl RecordingObserver {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events recorded so far, in order.
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Whether any recorded event satisfies `predicate`.
    pub fn any(&self, predicate: impl Fn(&PipelineEvent) -> bool) -> bool {
        self.events().iter().any(predicate)
    }
}

impl PipelineObserver for RecordingObserver {
    fn on_event(&self, event: &PipelineEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

/// Shorten text for log fields, respecting char boundaries.
pub fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_owned();
    }
    let shortened: String = text.chars().take(max_chars).collect();
    format!("{shortened}...")
}
