//! Ollama client using the `/api/generate` API.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{check_http_response, ModelRequest, ProviderError, ResponseFormat, TaskModelClient};

/// Default Ollama API base URL.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Timeout for the lightweight health endpoints.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Wire types (pub for integration testing)
// ---------------------------------------------------------------------------

/// Ollama generate API request body.
#[doc(hidden)]
#[derive(Debug, Serialize)]
pub struct GenerateRequest {
    /// Model name.
    pub model: String,
    /// User prompt.
    pub prompt: String,
    /// System prompt.
    pub system: String,
    /// Disable streaming.
    pub stream: bool,
    /// `"json"` to force a JSON object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

/// Ollama generate API response body.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    /// Generated text.
    pub response: String,
    /// Model that served the response.
    #[serde(default)]
    pub model: Option<String>,
    /// Whether generation finished.
    #[serde(default)]
    pub done: Option<bool>,
}

/// Response body of `/api/version`.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct VersionResponse {
    /// Server version string.
    pub version: String,
}

/// Response body of `/api/tags`.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct TagsResponse {
    /// Locally available models.
    #[serde(default)]
    pub models: Vec<TagEntry>,
}

/// One model entry in `/api/tags`.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct TagEntry {
    /// Model name including tag, e.g. `mistral:latest`.
    pub name: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Ollama generate API client.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    /// Base URL for the Ollama API.
    #[doc(hidden)]
    pub base_url: String,
    client: reqwest::Client,
}

impl OllamaClient {
    /// Create a client whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Request` if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            client,
        })
    }

    /// Server version from `/api/version`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] if the server is unreachable or replies badly.
    pub async fn version(&self) -> Result<String, ProviderError> {
        let url = format!("{}/api/version", self.base_url);
        let response = self.client.get(&url).timeout(PROBE_TIMEOUT).send().await?;
        let body = check_http_response(response).await?;
        let parsed: VersionResponse =
            serde_json::from_str(&body).map_err(|e| ProviderError::Parse(e.to_string()))?;
        Ok(parsed.version)
    }

    /// Names of locally pulled models from `/api/tags`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] if the server is unreachable or replies badly.
    pub async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self.client.get(&url).timeout(PROBE_TIMEOUT).send().await?;
        let body = check_http_response(response).await?;
        parse_tags(&body)
    }
}

// ---------------------------------------------------------------------------
// Request / Response builders (pub for integration testing)
// ---------------------------------------------------------------------------

/// Build an Ollama generate request from a model request.
#[doc(hidden)]
pub fn build_request(request: &ModelRequest) -> GenerateRequest {
    let format = match request.format {
        ResponseFormat::Json => Some("json".to_owned()),
        ResponseFormat::Text => None,
    };
    GenerateRequest {
        model: request.model.clone(),
        prompt: request.prompt.clone(),
        system: request.system.clone(),
        stream: request.stream,
        format,
    }
}

/// Extract the generated text from an Ollama generate response.
///
/// # Errors
///
/// Returns `ProviderError::Parse` if the envelope cannot be deserialized.
#[doc(hidden)]
pub fn parse_response(body: &str) -> Result<String, ProviderError> {
    let resp: GenerateResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Parse(e.to_string()))?;
    Ok(resp.response)
}

/// Parse the model list out of an `/api/tags` body.
///
/// # Errors
///
/// Returns `ProviderError::Parse` on malformed JSON.
#[doc(hidden)]
pub fn parse_tags(body: &str) -> Result<Vec<String>, ProviderError> {
    let tags: TagsResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Parse(e.to_string()))?;
    Ok(tags.models.into_iter().map(|m| m.name).collect())
}

/// Whether `wanted` is among `available`, treating a missing tag as `latest`.
pub fn model_is_available(available: &[String], wanted: &str) -> bool {
    let normalized = if wanted.contains(':') {
        wanted.to_owned()
    } else {
        format!("{wanted}:latest")
    };
    available.iter().any(|name| name == wanted || *name == normalized)
}

// ---------------------------------------------------------------------------
// Trait impl
// ---------------------------------------------------------------------------

#[async_trait::async_trait]
impl TaskModelClient for OllamaClient {
    async fn generate(&self, request: &ModelRequest) -> Result<String, ProviderError> {
        let api_request = build_request(request);

        let url = format!("{}/api/generate", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(&api_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout
                } else {
                    ProviderError::Request(e)
                }
            })?;

        if response.status().as_u16() == 404 {
            return Err(ProviderError::ModelUnavailable(request.model.clone()));
        }

        let payload = check_http_response(response).await?;
        parse_response(&payload)
    }
}
