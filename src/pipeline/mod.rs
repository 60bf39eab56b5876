//! Extraction pipeline: model path first, rule-based fallback on any failure.
//!
//! The pipeline is an explicit stage machine:
//!
//! ```text
//! Requested ──ok──▶ Responded(text) ──parsed──▶ Parsed(map) ──▶ Model result
//!     │                   │
//!     │ transport/        │ malformed
//!     │ timeout/status    │
//!     ▼                   ▼
//!  Fallback(reason) ─────────────────────────────────────────▶ Rule-based result
//! ```
//!
//! Both terminals produce an [`ExtractedTask`]. Nothing here returns an
//! error to the caller; every recovered failure is reported to the
//! injected [`PipelineObserver`] instead.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::config::LlmConfig;
use crate::extractors::RuleBasedExtractor;
use crate::logging::{PipelineEvent, PipelineObserver, TracingObserver};
use crate::providers::ollama::OllamaClient;
use crate::providers::transcription::Transcriber;
use crate::providers::{ModelRequest, ProviderError, TaskModelClient};
use crate::types::{ExtractedTask, DEFAULT_TEXT};

pub mod parser;
pub mod prompts;
pub mod validation;

use parser::StructuredResponseParser;
use validation::FieldValidator;

/// Which path produced the final task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionPath {
    /// Model output, parsed and validated.
    Model,
    /// Rule-based extractor.
    Fallback,
}

/// Why the model path was abandoned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// The prompt was blank; the model was never called.
    EmptyPrompt,
    /// The model could not be reached or the envelope was unreadable.
    Transport(String),
    /// The model call exceeded its timeout.
    Timeout,
    /// The model server answered with a non-success status.
    HttpStatus(u16),
    /// The configured model is not available.
    ModelUnavailable(String),
    /// The model's text held no usable task object.
    MalformedResponse,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPrompt => f.write_str("empty prompt"),
            Self::Transport(detail) => write!(f, "transport failure: {detail}"),
            Self::Timeout => f.write_str("model timeout"),
            Self::HttpStatus(status) => write!(f, "model returned status {status}"),
            Self::ModelUnavailable(model) => write!(f, "model {model} unavailable"),
            Self::MalformedResponse => f.write_str("malformed model response"),
        }
    }
}

/// Final task plus how it was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutcome {
    /// The extracted task.
    pub task: ExtractedTask,
    /// Path that produced it.
    pub path: ExtractionPath,
    /// Set when `path` is [`ExtractionPath::Fallback`].
    pub fallback: Option<FallbackReason>,
}

/// Pipeline stages. `Parsed` and `Fallback` are the only ways out.
enum Stage {
    Requested,
    Responded(String),
    Parsed(Map<String, Value>),
    Fallback(FallbackReason),
}

/// Public entry point: prompt in, [`ExtractedTask`] out.
pub struct TaskExtractor {
    client: Arc<dyn TaskModelClient>,
    model: String,
    timeout: Duration,
    parser: StructuredResponseParser,
    validator: FieldValidator,
    fallback: RuleBasedExtractor,
    observer: Arc<dyn PipelineObserver>,
}

impl fmt::Debug for TaskExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskExtractor")
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl TaskExtractor {
    /// Extractor reporting to [`TracingObserver`].
    pub fn new(client: Arc<dyn TaskModelClient>, model: &str, timeout: Duration) -> Self {
        Self::with_observer(client, model, timeout, Arc::new(TracingObserver))
    }

    /// Extractor whose components all report to `observer`.
    pub fn with_observer(
        client: Arc<dyn TaskModelClient>,
        model: &str,
        timeout: Duration,
        observer: Arc<dyn PipelineObserver>,
    ) -> Self {
        Self {
            client,
            model: model.to_owned(),
            timeout,
            parser: StructuredResponseParser::with_observer(Arc::clone(&observer)),
            validator: FieldValidator::with_observer(Arc::clone(&observer)),
            fallback: RuleBasedExtractor::with_observer(Arc::clone(&observer)),
            observer,
        }
    }

    /// Extractor backed by an Ollama server as described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] if the HTTP client cannot be built.
    pub fn from_config(config: &LlmConfig) -> Result<Self, ProviderError> {
        let timeout = config.timeout();
        let client = OllamaClient::new(&config.base_url, timeout)?;
        Ok(Self::new(Arc::new(client), &config.model, timeout))
    }

    /// Extract a task from `prompt`. Never fails.
    pub async fn generate(&self, prompt: &str, reference: NaiveDate) -> ExtractedTask {
        self.run(prompt, reference).await.task
    }

    /// Extract a task and report which path produced it.
    pub async fn run(&self, prompt: &str, reference: NaiveDate) -> PipelineOutcome {
        if prompt.trim().is_empty() {
            self.observer.on_event(&PipelineEvent::EmptyPrompt);
            return self.fall_back("", reference, FallbackReason::EmptyPrompt);
        }

        let mut stage = Stage::Requested;
        loop {
            stage = match stage {
                Stage::Requested => self.request(prompt, reference).await,
                Stage::Responded(text) => self.parse(&text),
                Stage::Parsed(candidate) => {
                    let task = self.complete(prompt, &candidate, reference);
                    self.observer.on_event(&PipelineEvent::ModelPathCompleted);
                    return PipelineOutcome {
                        task,
                        path: ExtractionPath::Model,
                        fallback: None,
                    };
                }
                Stage::Fallback(reason) => return self.fall_back(prompt, reference, reason),
            };
        }
    }

    /// Transcribe `audio` and extract a task from the transcript.
    ///
    /// Returns `None` when transcription fails or yields no text; callers
    /// treat that as "no prompt".
    pub async fn generate_from_audio(
        &self,
        transcriber: &dyn Transcriber,
        audio: &[u8],
        reference: NaiveDate,
    ) -> Option<ExtractedTask> {
        let transcript = match transcriber.transcribe(audio).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                self.observer.on_event(&PipelineEvent::TranscriptionFailed {
                    detail: "empty transcript".to_owned(),
                });
                return None;
            }
            Err(e) => {
                self.observer.on_event(&PipelineEvent::TranscriptionFailed {
                    detail: e.to_string(),
                });
                return None;
            }
        };
        Some(self.generate(&transcript, reference).await)
    }

    /// `Requested` → `Responded` or `Fallback`.
    async fn request(&self, prompt: &str, reference: NaiveDate) -> Stage {
        let request =
            ModelRequest::structured(&self.model, prompt, prompts::instruction_template(reference));
        self.observer.on_event(&PipelineEvent::ModelRequested {
            model: self.model.clone(),
        });

        match tokio::time::timeout(self.timeout, self.client.generate(&request)).await {
            Ok(Ok(text)) => Stage::Responded(text),
            Ok(Err(e)) => Stage::Fallback(self.classify_failure(e)),
            Err(_) => {
                self.report_timeout();
                Stage::Fallback(FallbackReason::Timeout)
            }
        }
    }

    /// `Responded` → `Parsed` or `Fallback`.
    fn parse(&self, text: &str) -> Stage {
        match self.parser.parse(text) {
            Some(candidate) => Stage::Parsed(candidate),
            None => Stage::Fallback(FallbackReason::MalformedResponse),
        }
    }

    fn complete(
        &self,
        prompt: &str,
        candidate: &Map<String, Value>,
        reference: NaiveDate,
    ) -> ExtractedTask {
        let mut task = self.validator.validate(candidate, reference);
        if task.description == DEFAULT_TEXT {
            task.description = prompt.trim().to_owned();
        }
        task
    }

    fn fall_back(&self, prompt: &str, reference: NaiveDate, reason: FallbackReason) -> PipelineOutcome {
        self.observer.on_event(&PipelineEvent::FallbackUsed {
            reason: reason.to_string(),
        });
        PipelineOutcome {
            task: self.fallback.extract(prompt, reference),
            path: ExtractionPath::Fallback,
            fallback: Some(reason),
        }
    }

    fn classify_failure(&self, error: ProviderError) -> FallbackReason {
        if error.is_timeout() {
            self.report_timeout();
            return FallbackReason::Timeout;
        }
        self.observer.on_event(&PipelineEvent::TransportFailure {
            detail: error.to_string(),
        });
        match error {
            ProviderError::HttpStatus { status, .. } => FallbackReason::HttpStatus(status),
            ProviderError::ModelUnavailable(model) => FallbackReason::ModelUnavailable(model),
            other => FallbackReason::Transport(other.to_string()),
        }
    }

    fn report_timeout(&self) {
        let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
        self.observer
            .on_event(&PipelineEvent::ModelTimeout { timeout_ms });
    }
}
