//! # Retry Policy with Exponential Backoff
//!
//! Wraps transient operations in bounded retries, consulting a circuit
//! breaker before every attempt. Retries never bypass the breaker: a
//! rejection fails the call immediately without consuming an attempt,
//! so an open circuit is not hammered by the retry loop.

use crate::config::RetryConfig;
use crate::resilience::circuit_breaker::{CircuitBreaker, CircuitBreakerError};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Classifies errors as transient (worth retrying) or permanent.
pub trait Retryable {
    /// Whether a retry has any chance of succeeding
    fn is_retryable(&self) -> bool;
}

/// Terminal outcome of a retry-wrapped operation
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    /// The circuit breaker rejected the call before it could execute.
    /// No attempts were consumed.
    #[error("Circuit breaker is open for {component}")]
    CircuitOpen { component: String },

    /// All attempts were used up, or the error was not retryable
    #[error("Operation failed after {attempts} attempt(s): {source}")]
    Failed { attempts: u32, source: E },
}

/// Bounded retry with multiplicative backoff between attempts
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn max_attempts(&self) -> u32 {
        self.config.max_attempts
    }

    /// Execute an operation under this policy, guarded by the given breaker.
    ///
    /// Every attempt goes through the breaker so failures count toward its
    /// threshold and an open circuit short-circuits the loop.
    pub async fn execute<F, Fut, T, E>(
        &self,
        breaker: &CircuitBreaker,
        mut operation: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + std::fmt::Display,
    {
        let mut delay = Duration::from_millis(self.config.initial_delay_ms);
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match breaker.call(&mut operation).await {
                Ok(value) => return Ok(value),
                Err(CircuitBreakerError::CircuitOpen { component }) => {
                    return Err(RetryError::CircuitOpen { component });
                }
                Err(CircuitBreakerError::OperationFailed(source)) => {
                    if !source.is_retryable() || attempt >= self.config.max_attempts {
                        return Err(RetryError::Failed { attempts: attempt, source });
                    }

                    warn!(
                        component = breaker.name(),
                        attempt,
                        max_attempts = self.config.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %source,
                        "🔧 Attempt failed, retrying after backoff"
                    );

                    sleep(delay).await;
                    delay = delay.mul_f64(self.config.backoff_factor);
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}
