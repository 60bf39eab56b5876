//! Generative-model client boundary.
//!
//! Defines the [`TaskModelClient`] trait and the request/response types the
//! extraction pipeline uses to talk to a model. The pipeline only assumes a
//! text-in/text-out call; [`ollama::OllamaClient`] is the HTTP implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod ollama;
pub mod transcription;

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// Output format hint sent with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    /// Ask for a single JSON object.
    #[default]
    Json,
    /// Free text.
    Text,
}

/// A single non-streaming request to a generative model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRequest {
    /// Model identifier, e.g. `mistral`.
    pub model: String,
    /// The user's prompt text.
    pub prompt: String,
    /// Instruction template sent as the system prompt.
    pub system: String,
    /// Requested output format.
    pub format: ResponseFormat,
    /// Always `false` for extraction.
    pub stream: bool,
}

impl ModelRequest {
    /// Build a structured, non-streaming request.
    pub fn structured(model: &str, prompt: &str, system: String) -> Self {
        Self {
            model: model.to_owned(),
            prompt: prompt.to_owned(),
            system,
            format: ResponseFormat::Json,
            stream: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors returned by model clients.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// HTTP transport failure.
    #[error("model request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The call did not complete in time.
    #[error("model request timed out")]
    Timeout,
    /// Upstream responded with an error status.
    #[error("model returned non-success status {status}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Sanitised response body.
        body: String,
    },
    /// The requested model is not available on the server.
    #[error("model not available: {0}")]
    ModelUnavailable(String),
    /// Response envelope did not match the expected schema.
    #[error("model response parse error: {0}")]
    Parse(String),
}

impl ProviderError {
    /// Whether this error came from the client's own timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout => true,
            Self::Request(e) => e.is_timeout(),
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// HTTP helpers
// ---------------------------------------------------------------------------

/// Check HTTP response status and return body text or a structured error.
///
/// # Errors
///
/// Returns `ProviderError::Request` on transport failure, `ProviderError::HttpStatus` on non-2xx.
pub async fn check_http_response(response: reqwest::Response) -> Result<String, ProviderError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(ProviderError::HttpStatus {
            status: status.as_u16(),
            body: sanitize_http_error_body(&body),
        });
    }
    Ok(body)
}

/// Collapse whitespace and truncate an error body for logging.
pub fn sanitize_http_error_body(raw: &str) -> String {
    const MAX_ERROR_BODY_CHARS: usize = 256;

    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() > MAX_ERROR_BODY_CHARS {
        let shortened = collapsed
            .chars()
            .take(MAX_ERROR_BODY_CHARS)
            .collect::<String>();
        return format!("{shortened}...[truncated]");
    }
    collapsed
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Text-in/text-out generative model client.
///
/// Implementations must be `Send + Sync` so one client can serve concurrent
/// extractions.
#[async_trait]
pub trait TaskModelClient: Send + Sync {
    /// Send `request` and return the model's raw text output.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] on transport, status, or envelope failure.
    async fn generate(&self, request: &ModelRequest) -> Result<String, ProviderError>;
}
