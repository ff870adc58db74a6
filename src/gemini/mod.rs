//! Generative-model abstraction layer.
//!
//! The evaluation pipeline talks to a trait so tests can script responses;
//! the one production implementation targets the Gemini REST API.

mod client;
mod provider;

pub use client::GeminiModel;
pub use provider::{GenerationOptions, GenerativeModel, ModelError, DEFAULT_GEMINI_MODEL};
