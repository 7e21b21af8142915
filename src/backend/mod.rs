//! # Backend Abstractions
//!
//! Trait seams for the model backends the pipeline consumes: text scoring
//! (primary emotion, optional secondary signal) and free-text generation.
//! Backends are opaque collaborators injected at construction; the pipeline
//! never constructs one itself.
//!
//! ## Architecture
//!
//! - **`TextScorer` / `TextGenerator`**: object-safe async traits over the
//!   two backend shapes
//! - **`BackendError`**: transport/parse/availability taxonomy shared by all
//!   backends, classified for the retry layer
//! - **`ModelHandle`**: explicit load/unload lifecycle around an injected
//!   backend, replacing implicit process-global model state

pub mod handle;

pub use handle::{ModelHandle, ModelState};

use crate::resilience::Retryable;
use crate::scoring::ScoreMap;
use async_trait::async_trait;

/// Errors produced by model backends
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Network/timeout class failure; retrying may succeed
    #[error("Transient backend failure: {0}")]
    Transient(String),

    /// Structured output failed schema or parse validation. Retried by the
    /// generation schema loop, not the transport retry policy.
    #[error("Malformed backend output: {0}")]
    MalformedOutput(String),

    /// Backend is absent or not loaded; retrying will not help
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

impl Retryable for BackendError {
    fn is_retryable(&self) -> bool {
        matches!(self, BackendError::Transient(_))
    }
}

/// Base contract every backend implements
#[async_trait]
pub trait Backend: Send + Sync {
    /// Identifier recorded in analysis results and logs
    fn name(&self) -> &str;

    /// Acquire backend resources. Defaults to a no-op for backends that are
    /// ready at construction.
    async fn load(&self) -> Result<(), BackendError> {
        Ok(())
    }
}

/// Classification backend mapping text to raw label scores
#[async_trait]
pub trait TextScorer: Backend {
    async fn score(&self, text: &str) -> Result<ScoreMap, BackendError>;
}

/// Free-text generation backend
#[async_trait]
pub trait TextGenerator: Backend {
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, BackendError>;
}

/// Sampling parameters passed to a generation backend
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    pub max_output_tokens: u32,
    pub temperature: f64,
    pub top_p: f64,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_output_tokens: 300,
            temperature: 0.7,
            top_p: 0.9,
        }
    }
}
