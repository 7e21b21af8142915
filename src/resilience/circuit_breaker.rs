//! # Circuit Breaker Implementation
//!
//! Provides fault isolation to prevent repeated calls into a failing backend.
//! This implementation follows the classic circuit breaker pattern with three
//! states: Closed (normal operation), Open (failing fast), and HalfOpen
//! (testing recovery with a single probe).

use crate::config::CircuitBreakerConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Circuit breaker states representing the current operational mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Normal operation - calls are allowed through
    Closed,
    /// Failure mode - calls fail fast without executing
    Open,
    /// Testing recovery - a single probe call is in flight
    HalfOpen,
}

impl CircuitState {
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    pub fn is_half_open(&self) -> bool {
        matches!(self, Self::HalfOpen)
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
            Self::HalfOpen => write!(f, "half_open"),
        }
    }
}

/// Errors that can occur during circuit breaker operation
#[derive(Debug, thiserror::Error)]
pub enum CircuitBreakerError<E> {
    /// Circuit is open, rejecting calls without executing them
    #[error("Circuit breaker is open for {component}")]
    CircuitOpen { component: String },

    /// Operation executed and failed; the failure has been recorded
    #[error("Operation failed: {0}")]
    OperationFailed(E),
}

/// Mutable breaker state, kept behind one mutex so the check-and-transition
/// step is linearizable across concurrent callers.
#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    consecutive_failures: u32,
    /// When the circuit last opened, for reset timeout checks
    opened_at: Option<Instant>,
    /// When the in-flight half-open probe was admitted. A probe whose future
    /// was dropped never reports back; once another reset timeout elapses the
    /// slot is considered stale and a replacement probe is admitted.
    probe_started_at: Option<Instant>,
}

/// Core circuit breaker for one guarded operation identity
#[derive(Debug)]
pub struct CircuitBreaker {
    /// Component name for logging and registry lookup
    name: String,

    /// Configuration parameters
    config: CircuitBreakerConfig,

    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    /// Create a new circuit breaker with the given name and configuration
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        let name = name.into();
        info!(
            component = %name,
            failure_threshold = config.failure_threshold,
            reset_timeout_ms = config.reset_timeout_ms,
            "🛡️ Circuit breaker initialized"
        );

        Self {
            name,
            config,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                opened_at: None,
                probe_started_at: None,
            }),
        }
    }

    /// Get current circuit state
    pub async fn state(&self) -> CircuitState {
        self.inner.lock().await.state
    }

    /// Get component name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Execute an operation with circuit breaker protection.
    ///
    /// Success and failure are recorded only after an admitted call returns,
    /// so cancelling the returned future mid-flight leaves the failure
    /// counter untouched.
    pub async fn call<F, T, E, Fut>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !self.should_allow_call().await {
            return Err(CircuitBreakerError::CircuitOpen {
                component: self.name.clone(),
            });
        }

        match operation().await {
            Ok(value) => {
                self.record_success().await;
                Ok(value)
            }
            Err(error) => {
                self.record_failure().await;
                Err(CircuitBreakerError::OperationFailed(error))
            }
        }
    }

    /// Check if a call should be allowed, applying timeout-driven transitions
    async fn should_allow_call(&self) -> bool {
        let mut inner = self.inner.lock().await;
        match inner.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                let timeout_elapsed = match inner.opened_at {
                    Some(opened_at) => opened_at.elapsed() >= self.config.reset_timeout(),
                    None => {
                        // Open without a timestamp should not happen; allow recovery
                        warn!(component = %self.name, "Circuit open but no timestamp recorded");
                        true
                    }
                };
                if timeout_elapsed {
                    inner.state = CircuitState::HalfOpen;
                    inner.probe_started_at = Some(Instant::now());
                    info!(component = %self.name, "🟡 Circuit breaker half-open (probing recovery)");
                    true
                } else {
                    debug!(component = %self.name, "Fast-failing call, circuit open");
                    false
                }
            }
            CircuitState::HalfOpen => {
                // One probe at a time; admit a replacement only when the
                // current probe has been gone longer than the reset timeout.
                let probe_stale = match inner.probe_started_at {
                    Some(started_at) => started_at.elapsed() >= self.config.reset_timeout(),
                    None => true,
                };
                if probe_stale {
                    inner.probe_started_at = Some(Instant::now());
                    warn!(component = %self.name, "Half-open probe went silent, admitting replacement probe");
                    true
                } else {
                    debug!(component = %self.name, "Probe in flight, rejecting concurrent call");
                    false
                }
            }
        }
    }

    /// Record a successful operation
    async fn record_success(&self) {
        let mut inner = self.inner.lock().await;
        match inner.state {
            CircuitState::Closed => {
                inner.consecutive_failures = 0;
            }
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Closed;
                inner.consecutive_failures = 0;
                inner.opened_at = None;
                inner.probe_started_at = None;
                info!(component = %self.name, "🟢 Circuit breaker closed (recovered)");
            }
            CircuitState::Open => {
                warn!(component = %self.name, "Success recorded while circuit is open");
            }
        }
    }

    /// Record a failed operation
    async fn record_failure(&self) {
        let mut inner = self.inner.lock().await;
        match inner.state {
            CircuitState::Closed => {
                inner.consecutive_failures += 1;
                if inner.consecutive_failures >= self.config.failure_threshold {
                    inner.state = CircuitState::Open;
                    inner.opened_at = Some(Instant::now());
                    error!(
                        component = %self.name,
                        consecutive_failures = inner.consecutive_failures,
                        failure_threshold = self.config.failure_threshold,
                        "🔴 Circuit breaker opened (failing fast)"
                    );
                }
            }
            CircuitState::HalfOpen => {
                // Probe failure reopens immediately with a fresh timestamp
                inner.state = CircuitState::Open;
                inner.opened_at = Some(Instant::now());
                inner.probe_started_at = None;
                error!(component = %self.name, "🔴 Circuit breaker reopened (probe failed)");
            }
            CircuitState::Open => {}
        }
    }
}
