//! # Resilience Module
//!
//! Fault tolerance for the scoring and generation backends: circuit breakers
//! to isolate a failing dependency, retry policies with exponential backoff
//! gated by those breakers, and a registry handing out one breaker per
//! guarded operation identity.
//!
//! ## Architecture
//!
//! - **Circuit Breakers**: Closed/Open/HalfOpen per operation identity, with
//!   linearizable transitions and a single-probe half-open phase
//! - **Retry Policies**: bounded attempts, exponential backoff, failure
//!   classification via [`Retryable`]
//! - **Registry**: get-or-create breakers keyed by component name, shared
//!   across concurrent requests
//!
//! ## Usage
//!
//! ```rust,no_run
//! use empath_core::config::{CircuitBreakerConfig, RetryConfig};
//! use empath_core::resilience::{CircuitBreaker, RetryPolicy};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let breaker = CircuitBreaker::new("primary_scorer", CircuitBreakerConfig::default());
//! let policy = RetryPolicy::new(RetryConfig::default());
//!
//! let result: Result<&str, _> = policy
//!     .execute(&breaker, || async {
//!         // Backend call here
//!         Ok::<&str, empath_core::backend::BackendError>("scored")
//!     })
//!     .await;
//! # Ok(())
//! # }
//! ```

pub mod circuit_breaker;
pub mod registry;
pub mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerError, CircuitState};
pub use registry::CircuitBreakerRegistry;
pub use retry::{RetryError, RetryPolicy, Retryable};
