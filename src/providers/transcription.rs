//! Audio transcription boundary.
//!
//! Transcription is an external service. The pipeline only needs plain text
//! back, and treats any failure as "no prompt".

use async_trait::async_trait;

/// Errors from a transcription service.
#[derive(Debug, thiserror::Error)]
pub enum TranscriptionError {
    /// The service could not be reached or rejected the request.
    #[error("transcription service failed: {0}")]
    Service(String),
    /// The audio payload could not be decoded.
    #[error("unsupported audio payload: {0}")]
    UnsupportedAudio(String),
}

/// Turns an audio payload into plain text.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe `audio` into text.
    ///
    /// # Errors
    ///
    /// Returns [`TranscriptionError`] when no transcript could be produced.
    async fn transcribe(&self, audio: &[u8]) -> Result<String, TranscriptionError>;
}
