//! Generative model trait definition.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// The model used when no override is configured.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-pro-preview-03-25";

/// Fixed generation parameters for song evaluation.
///
/// Low randomness and a capped output length: the model is asked for a
/// deterministic structured report, not creative writing.
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
    /// Request timeout.
    pub timeout: Duration,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            top_k: 32,
            top_p: 0.95,
            max_output_tokens: 8192,
            timeout: Duration::from_secs(120),
        }
    }
}

/// Errors that can occur when interacting with a generative model.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Request timeout")]
    Timeout,

    #[error("Prompt blocked by safety filter: {0}")]
    Blocked(String),
}

/// Trait for generative models that can evaluate audio.
///
/// Implementations receive the fixed rubric plus the encoded audio and
/// return the model's raw textual output.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Get the provider's name (e.g., "gemini").
    fn name(&self) -> &str;

    /// Run a single generation over the supplied audio.
    ///
    /// # Arguments
    /// * `mime_type` - MIME type of the audio payload.
    /// * `audio_b64` - Base64-encoded audio bytes.
    ///
    /// # Returns
    /// The model's textual output, to be decoded by the extraction chain.
    async fn generate_from_audio(
        &self,
        mime_type: &str,
        audio_b64: &str,
    ) -> Result<String, ModelError>;
}
