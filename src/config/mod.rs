//! # Empath Core Configuration System
//!
//! Explicit, validated configuration for every tunable in the analysis
//! pipeline. Fixed vocabulary (label mappings, lexicons, event names) lives in
//! [`crate::constants`]; everything here is policy that a deployment may
//! legitimately want to change.
//!
//! ## Architecture
//!
//! - **Single Source of Truth**: YAML files under `config/`, one optional
//!   override file per environment
//! - **Defaults Everywhere**: every field has a built-in default, so a missing
//!   file or a partial file is never fatal
//! - **Explicit Validation**: bad values fail loading, not the first request
//!
//! ## Usage
//!
//! ```rust,no_run
//! use empath_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load configuration (environment auto-detected)
//! let manager = ConfigManager::load()?;
//!
//! let retries = manager.config().retry.max_attempts;
//! let threshold = manager.config().circuit_breaker.failure_threshold;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration for the empath core
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct EmpathConfig {
    /// Analysis pipeline thresholds and gates
    pub analysis: AnalysisConfig,

    /// Retry policy for transient backend failures
    pub retry: RetryConfig,

    /// Circuit breaker behavior per guarded operation
    pub circuit_breaker: CircuitBreakerConfig,

    /// Response caching policy
    pub cache: CacheConfig,

    /// Per-user conversation history bounds
    pub history: HistoryConfig,

    /// Response generation sampling and schema-retry policy
    pub generation: GenerationConfig,

    /// Event channel sizing
    pub telemetry: TelemetryConfig,
}

impl EmpathConfig {
    /// Validate cross-field invariants. Field-level range errors carry the
    /// offending value so a bad deploy is diagnosable from the error alone.
    pub fn validate(&self) -> ConfigResult<()> {
        self.analysis.validate()?;
        self.retry.validate()?;
        self.circuit_breaker.validate()?;
        self.cache.validate()?;
        self.history.validate()?;
        self.generation.validate()?;
        self.telemetry.validate()?;
        Ok(())
    }
}

fn require_probability(field: &str, value: f64) -> ConfigResult<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigurationError::invalid_value(
            field,
            value.to_string(),
            "must be a probability in [0, 1]",
        ))
    }
}

/// Thresholds and gates applied by the analysis orchestrator
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Inputs with fewer tokens than this are "short" for context folding
    /// and the low-confidence neutral floor
    pub short_token_limit: usize,

    /// Distributions whose maximum probability falls below this get the
    /// neutral floor applied for short or interrogative inputs
    pub low_confidence_threshold: f64,

    /// Primary scores above this trigger re-analysis without folded context
    pub reanalysis_threshold: f64,

    /// Minimum input length (characters) before the secondary signal
    /// backend is consulted
    pub secondary_min_chars: usize,

    /// Minimum secondary-signal score admitted into the primary score map
    pub secondary_confidence_threshold: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            short_token_limit: 5,
            low_confidence_threshold: 0.7,
            reanalysis_threshold: 0.75,
            secondary_min_chars: 10,
            secondary_confidence_threshold: 0.7,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.short_token_limit == 0 {
            return Err(ConfigurationError::invalid_value(
                "analysis.short_token_limit",
                "0",
                "must be at least 1",
            ));
        }
        require_probability(
            "analysis.low_confidence_threshold",
            self.low_confidence_threshold,
        )?;
        require_probability("analysis.reanalysis_threshold", self.reanalysis_threshold)?;
        require_probability(
            "analysis.secondary_confidence_threshold",
            self.secondary_confidence_threshold,
        )?;
        Ok(())
    }
}

/// Retry policy parameters for transient backend failures
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total invocation attempts, including the first
    pub max_attempts: u32,

    /// Delay before the first retry
    pub initial_delay_ms: u64,

    /// Multiplier applied to the delay after every retry
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 1_000,
            backoff_factor: 1.5,
        }
    }
}

impl RetryConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_attempts == 0 {
            return Err(ConfigurationError::invalid_value(
                "retry.max_attempts",
                "0",
                "must be at least 1",
            ));
        }
        if !self.backoff_factor.is_finite() || self.backoff_factor < 1.0 {
            return Err(ConfigurationError::invalid_value(
                "retry.backoff_factor",
                self.backoff_factor.to_string(),
                "must be at least 1.0",
            ));
        }
        Ok(())
    }
}

/// Circuit breaker parameters per guarded operation identity
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before the circuit opens
    pub failure_threshold: u32,

    /// How long an open circuit rejects calls before admitting a probe
    pub reset_timeout_ms: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout_ms: 30_000,
        }
    }
}

impl CircuitBreakerConfig {
    pub fn reset_timeout(&self) -> Duration {
        Duration::from_millis(self.reset_timeout_ms)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.failure_threshold == 0 {
            return Err(ConfigurationError::invalid_value(
                "circuit_breaker.failure_threshold",
                "0",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Response caching policy
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Entry lifetime; zero disables cache writes entirely
    pub ttl_seconds: u64,

    /// Minimum primary score before a response is worth caching
    pub store_confidence_threshold: f64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 3_600,
            store_confidence_threshold: 0.6,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        require_probability(
            "cache.store_confidence_threshold",
            self.store_confidence_threshold,
        )
    }
}

/// Per-user conversation history bounds
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Messages retained per user; the oldest beyond this are evicted
    pub max_entries: usize,

    /// Recent messages folded into analysis as context
    pub context_messages: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_entries: 10,
            context_messages: 2,
        }
    }
}

impl HistoryConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_entries == 0 {
            return Err(ConfigurationError::invalid_value(
                "history.max_entries",
                "0",
                "must be at least 1",
            ));
        }
        if self.context_messages > self.max_entries {
            return Err(ConfigurationError::invalid_value(
                "history.context_messages",
                self.context_messages.to_string(),
                "cannot exceed history.max_entries",
            ));
        }
        Ok(())
    }
}

/// Response generation sampling and schema-retry policy
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Output token budget per generation call
    pub max_output_tokens: u32,

    /// Starting sampling temperature
    pub temperature: f64,

    /// Nucleus sampling parameter
    pub top_p: f64,

    /// Attempts at producing parseable, emotion-aligned output before the
    /// canned fallback is used
    pub schema_attempts: u32,

    /// Temperature added after each malformed or misaligned attempt
    pub temperature_increment: f64,

    /// Ceiling the temperature never exceeds while climbing
    pub temperature_cap: f64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_output_tokens: 300,
            temperature: 0.7,
            top_p: 0.9,
            schema_attempts: 3,
            temperature_increment: 0.1,
            temperature_cap: 0.9,
        }
    }
}

impl GenerationConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.schema_attempts == 0 {
            return Err(ConfigurationError::invalid_value(
                "generation.schema_attempts",
                "0",
                "must be at least 1",
            ));
        }
        require_probability("generation.top_p", self.top_p)?;
        require_probability("generation.temperature_cap", self.temperature_cap)?;
        if !self.temperature.is_finite()
            || self.temperature < 0.0
            || self.temperature > self.temperature_cap
        {
            return Err(ConfigurationError::invalid_value(
                "generation.temperature",
                self.temperature.to_string(),
                "must be within [0, temperature_cap]",
            ));
        }
        Ok(())
    }
}

/// Event channel sizing
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Broadcast channel capacity for lifecycle events
    pub event_channel_capacity: usize,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            event_channel_capacity: 1_000,
        }
    }
}

impl TelemetryConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.event_channel_capacity == 0 {
            return Err(ConfigurationError::invalid_value(
                "telemetry.event_channel_capacity",
                "0",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}
