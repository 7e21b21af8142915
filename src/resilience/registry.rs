//! # Circuit Breaker Registry
//!
//! Process-wide registry keyed by operation identity. Callers that guard the
//! same logical operation share one breaker, so failure counts accumulate
//! across every call site instead of fragmenting per caller.

use crate::config::CircuitBreakerConfig;
use crate::resilience::circuit_breaker::{CircuitBreaker, CircuitState};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Shared registry of named circuit breakers
#[derive(Debug)]
pub struct CircuitBreakerRegistry {
    breakers: DashMap<String, Arc<CircuitBreaker>>,
    default_config: CircuitBreakerConfig,
}

impl CircuitBreakerRegistry {
    pub fn new(default_config: CircuitBreakerConfig) -> Self {
        Self {
            breakers: DashMap::new(),
            default_config,
        }
    }

    /// Get the breaker for an operation identity, creating it on first use.
    ///
    /// Creation is atomic per key: concurrent first callers converge on a
    /// single breaker instance.
    pub fn get_or_create(&self, name: &str) -> Arc<CircuitBreaker> {
        self.breakers
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!(component = name, "Registering circuit breaker");
                Arc::new(CircuitBreaker::new(name, self.default_config.clone()))
            })
            .clone()
    }

    /// Number of registered breakers
    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }

    /// Snapshot of every breaker's current state, for health reporting.
    ///
    /// Collects the Arcs first so no map shard lock is held across an await.
    pub async fn states(&self) -> HashMap<String, CircuitState> {
        let snapshot: Vec<(String, Arc<CircuitBreaker>)> = self
            .breakers
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        let mut states = HashMap::with_capacity(snapshot.len());
        for (name, breaker) in snapshot {
            states.insert(name, breaker.state().await);
        }
        states
    }
}

impl Default for CircuitBreakerRegistry {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_or_create_returns_same_instance() {
        let registry = CircuitBreakerRegistry::default();

        let first = registry.get_or_create("model.scoring");
        let second = registry.get_or_create("model.scoring");

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_distinct_names_get_distinct_breakers() {
        let registry = CircuitBreakerRegistry::default();

        let scoring = registry.get_or_create("model.scoring");
        let generation = registry.get_or_create("model.generation");

        assert!(!Arc::ptr_eq(&scoring, &generation));
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn test_states_snapshot() {
        let registry = CircuitBreakerRegistry::new(CircuitBreakerConfig {
            failure_threshold: 1,
            reset_timeout_ms: 60_000,
        });

        let healthy = registry.get_or_create("healthy");
        let broken = registry.get_or_create("broken");

        let _ = healthy.call(|| async { Ok::<_, String>(()) }).await;
        let _ = broken.call(|| async { Err::<(), _>("down".to_string()) }).await;

        let states = registry.states().await;
        assert_eq!(states.get("healthy"), Some(&CircuitState::Closed));
        assert_eq!(states.get("broken"), Some(&CircuitState::Open));
    }

    #[tokio::test]
    async fn test_shared_breaker_accumulates_failures() {
        let registry = CircuitBreakerRegistry::new(CircuitBreakerConfig {
            failure_threshold: 2,
            reset_timeout_ms: 60_000,
        });

        // Two call sites resolving the same identity share failure counts
        let site_a = registry.get_or_create("model.scoring");
        let site_b = registry.get_or_create("model.scoring");

        let _ = site_a.call(|| async { Err::<(), _>("one") }).await;
        let _ = site_b.call(|| async { Err::<(), _>("two") }).await;

        assert_eq!(site_a.state().await, CircuitState::Open);
    }
}
