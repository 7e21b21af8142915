use thiserror::Error;

/// Crate-wide error type for the empath core.
///
/// Module-local errors (backend, store, analysis) convert into this at the
/// public API boundary; most degraded conditions never become errors at all
/// and resolve to fallback values instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EmpathError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Analysis error: {0}")]
    AnalysisError(String),
    #[error("Generation error: {0}")]
    GenerationError(String),
    #[error("Resource error: {0}")]
    ResourceError(String),
    #[error("Event error: {0}")]
    EventError(String),
}

pub type Result<T> = std::result::Result<T, EmpathError>;

/// Failures from an external cache or history store.
///
/// These never abort the pipeline; layers above degrade to miss/no-op and log.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store operation failed: {0}")]
    Operation(String),
}

impl From<StoreError> for EmpathError {
    fn from(err: StoreError) -> Self {
        EmpathError::ResourceError(err.to_string())
    }
}

impl From<crate::scoring::ValidationError> for EmpathError {
    fn from(err: crate::scoring::ValidationError) -> Self {
        EmpathError::ValidationError(err.to_string())
    }
}

impl From<crate::analysis::AnalysisError> for EmpathError {
    fn from(err: crate::analysis::AnalysisError) -> Self {
        EmpathError::AnalysisError(err.to_string())
    }
}

impl From<crate::config::ConfigurationError> for EmpathError {
    fn from(err: crate::config::ConfigurationError) -> Self {
        EmpathError::ConfigurationError(err.to_string())
    }
}

impl From<crate::events::PublishError> for EmpathError {
    fn from(err: crate::events::PublishError) -> Self {
        EmpathError::EventError(err.to_string())
    }
}
