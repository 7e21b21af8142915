//! # Chat Service
//!
//! The caller-facing composition of the whole pipeline: cache in front,
//! analysis orchestration in the middle, response generation behind it.
//! One `chat` call is one user turn; `health` reports whether the moving
//! parts underneath are in shape to serve.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::analysis::{AnalysisError, AnalysisOrchestrator, AnalysisResult};
use crate::backend::{Backend, ModelHandle, ModelState, TextGenerator, TextScorer};
use crate::cache::{response_cache_key, CacheLayer, CacheStore};
use crate::config::EmpathConfig;
use crate::constants::events;
use crate::events::{EventPublisher, PublishedEvent};
use crate::generation::ResponderService;
use crate::history::{ConversationHistory, HistoryStore};
use crate::resilience::{CircuitBreakerRegistry, CircuitState, RetryPolicy};

/// Breaker identity guarding scoring calls
const SCORING_BREAKER: &str = "model.scoring";
/// Breaker identity guarding generation calls
const GENERATION_BREAKER: &str = "model.generation";

/// One complete chat turn, which is also the value stored in the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatOutcome {
    /// The reply text shown to the user
    #[serde(rename = "ai_response")]
    pub reply: String,

    /// The analysis the reply was generated from
    #[serde(rename = "user_emotion_analysis")]
    pub analysis: AnalysisResult,

    /// Request identifier; cache hits keep the identifier of the turn that
    /// produced them
    pub response_id: String,

    #[serde(rename = "model_used")]
    pub model: String,

    pub from_cache: bool,
}

/// Point-in-time view of the service's dependencies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    /// "ok" when every required dependency is serviceable, else "degraded"
    pub status: String,
    pub cache_reachable: bool,
    pub primary_scorer: ModelState,
    pub secondary_scorer: Option<ModelState>,
    pub generator: ModelState,
}

/// Builder wiring backends, stores, and configuration into a [`ChatService`].
pub struct ChatServiceBuilder {
    primary_scorer: Arc<ModelHandle<dyn TextScorer>>,
    secondary_scorer: Option<Arc<ModelHandle<dyn TextScorer>>>,
    generator: Arc<ModelHandle<dyn TextGenerator>>,
    cache_store: Arc<dyn CacheStore>,
    history_store: Arc<dyn HistoryStore>,
    config: EmpathConfig,
}

impl ChatServiceBuilder {
    pub fn new(
        primary_scorer: Arc<ModelHandle<dyn TextScorer>>,
        generator: Arc<ModelHandle<dyn TextGenerator>>,
        cache_store: Arc<dyn CacheStore>,
        history_store: Arc<dyn HistoryStore>,
    ) -> Self {
        Self {
            primary_scorer,
            secondary_scorer: None,
            generator,
            cache_store,
            history_store,
            config: EmpathConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EmpathConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_secondary_scorer(mut self, handle: Arc<ModelHandle<dyn TextScorer>>) -> Self {
        self.secondary_scorer = Some(handle);
        self
    }

    pub fn build(self) -> ChatService {
        let config = self.config;
        let events = EventPublisher::new(config.telemetry.event_channel_capacity);
        let registry = CircuitBreakerRegistry::new(config.circuit_breaker.clone());

        let history = Arc::new(ConversationHistory::new(
            self.history_store,
            config.history.clone(),
        ));
        let cache = CacheLayer::new(self.cache_store, config.cache.ttl());

        let mut orchestrator = AnalysisOrchestrator::new(
            Arc::clone(&self.primary_scorer),
            Arc::clone(&history),
            config.analysis.clone(),
            RetryPolicy::new(config.retry.clone()),
            registry.get_or_create(SCORING_BREAKER),
        )
        .with_event_publisher(events.clone());
        if let Some(secondary) = self.secondary_scorer.clone() {
            orchestrator = orchestrator.with_secondary_scorer(secondary);
        }
        let orchestrator = Arc::new(orchestrator);

        let responder = ResponderService::new(
            Arc::clone(&self.generator),
            history,
            config.generation.clone(),
            RetryPolicy::new(config.retry.clone()),
            registry.get_or_create(GENERATION_BREAKER),
        )
        .with_alignment(Arc::clone(&orchestrator))
        .with_event_publisher(events.clone());

        ChatService {
            cache,
            orchestrator,
            responder,
            registry,
            events,
            primary_scorer: self.primary_scorer,
            secondary_scorer: self.secondary_scorer,
            generator: self.generator,
            store_confidence_threshold: config.cache.store_confidence_threshold,
        }
    }
}

/// The composed chat pipeline behind a single entry point.
pub struct ChatService {
    cache: CacheLayer,
    orchestrator: Arc<AnalysisOrchestrator>,
    responder: ResponderService,
    registry: CircuitBreakerRegistry,
    events: EventPublisher,
    primary_scorer: Arc<ModelHandle<dyn TextScorer>>,
    secondary_scorer: Option<Arc<ModelHandle<dyn TextScorer>>>,
    generator: Arc<ModelHandle<dyn TextGenerator>>,
    store_confidence_threshold: f64,
}

impl ChatService {
    pub fn builder(
        primary_scorer: Arc<ModelHandle<dyn TextScorer>>,
        generator: Arc<ModelHandle<dyn TextGenerator>>,
        cache_store: Arc<dyn CacheStore>,
        history_store: Arc<dyn HistoryStore>,
    ) -> ChatServiceBuilder {
        ChatServiceBuilder::new(primary_scorer, generator, cache_store, history_store)
    }

    /// Process one user turn: cache lookup, analysis, generation, and the
    /// confidence-gated cache write.
    ///
    /// The only surfaced error is the orchestrator's fatal double-fallback
    /// case; every other failure mode resolves to a degraded outcome.
    pub async fn chat(
        &self,
        message: &str,
        user_id: &str,
    ) -> Result<ChatOutcome, AnalysisError> {
        let started = Instant::now();
        let response_id = new_response_id();
        let key = response_cache_key(message);

        if let Some(mut cached) = self.cache.fetch::<ChatOutcome>(&key).await {
            if cached.analysis.validate().is_ok() {
                cached.from_cache = true;
                info!(
                    response_id = %response_id,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "🟢 Chat served from cache"
                );
                return Ok(cached);
            }
            warn!(
                response_id = %response_id,
                "🟡 Cached outcome failed validation, treating as miss"
            );
        }

        let analysis = self.orchestrator.analyze(message, user_id).await?;
        let reply = self.responder.respond(message, &analysis, user_id).await;

        let outcome = ChatOutcome {
            reply: reply.response,
            analysis,
            response_id,
            model: self.responder.generator_name().to_string(),
            from_cache: false,
        };

        if outcome.analysis.primary_score() > self.store_confidence_threshold {
            self.cache.store(&key, &outcome).await;
        } else {
            debug!(
                score = outcome.analysis.primary_score(),
                threshold = self.store_confidence_threshold,
                "Confidence below cache threshold, skipping cache write"
            );
        }

        info!(
            response_id = %outcome.response_id,
            primary_emotion = %outcome.analysis.primary(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "🟢 Chat turn completed"
        );

        Ok(outcome)
    }

    /// Drive every model handle through its load sequence, publishing
    /// lifecycle events. Load failures leave the handle Failed and the
    /// pipeline degraded; they are not errors here.
    pub async fn warm_up(&self) {
        load_backend(&self.events, &self.primary_scorer).await;
        if let Some(secondary) = &self.secondary_scorer {
            load_backend(&self.events, secondary).await;
        }
        load_backend(&self.events, &self.generator).await;
    }

    /// Probe the cache and report every model's lifecycle state.
    pub async fn health(&self) -> HealthReport {
        let cache_reachable = self.cache.is_reachable().await;
        let primary_scorer = self.orchestrator.primary_state();
        let secondary_scorer = self.orchestrator.secondary_state();
        let generator = self.responder.generator_state();

        let healthy =
            cache_reachable && primary_scorer.is_ready() && generator.is_ready();

        HealthReport {
            status: if healthy { "ok" } else { "degraded" }.to_string(),
            cache_reachable,
            primary_scorer,
            secondary_scorer,
            generator,
        }
    }

    /// Current state of every circuit breaker, keyed by operation identity
    pub async fn breaker_states(&self) -> HashMap<String, CircuitState> {
        self.registry.states().await
    }

    /// Subscribe to pipeline lifecycle events
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<PublishedEvent> {
        self.events.subscribe()
    }

    pub fn orchestrator(&self) -> &AnalysisOrchestrator {
        &self.orchestrator
    }
}

fn new_response_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("req_{}", &hex[..8])
}

async fn load_backend<T>(events_channel: &EventPublisher, handle: &ModelHandle<T>)
where
    T: ?Sized + Backend,
{
    match handle.load().await {
        Ok(()) => {
            let context = serde_json::json!({ "backend": handle.backend_name() });
            if let Err(err) = events_channel.publish(events::MODEL_LOADED, &context) {
                warn!(error = %err, "Event publish failed");
            }
        }
        Err(load_err) => {
            let context = serde_json::json!({
                "backend": handle.backend_name(),
                "error": load_err.to_string(),
            });
            if let Err(err) = events_channel.publish(events::MODEL_LOAD_FAILED, &context) {
                warn!(error = %err, "Event publish failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_id_shape() {
        let id = new_response_id();
        assert!(id.starts_with("req_"));
        assert_eq!(id.len(), 12);
        assert!(id[4..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_chat_outcome_wire_names() {
        let outcome = ChatOutcome {
            reply: "hello".to_string(),
            analysis: AnalysisResult::empty_input("model"),
            response_id: "req_00000000".to_string(),
            model: "gen".to_string(),
            from_cache: false,
        };

        let value = serde_json::to_value(&outcome).unwrap();
        assert!(value.get("ai_response").is_some());
        assert!(value.get("user_emotion_analysis").is_some());
        assert!(value.get("model_used").is_some());
        assert!(value.get("reply").is_none());
    }
}
