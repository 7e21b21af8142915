//! End-to-end tests for the chat service boundary: response caching, the
//! generation schema loop, health reporting, and model warm-up, all against
//! scripted backends and in-memory stores.

mod common;

use std::sync::Arc;

use common::mocks::{
    fast_config, reply_json, GenerateOutcome, ScoreOutcome, ScriptedGenerator, ScriptedScorer,
    UnavailableCacheStore,
};
use empath_core::backend::{ModelHandle, ModelState, TextGenerator, TextScorer};
use empath_core::cache::MemoryCacheStore;
use empath_core::constants::events;
use empath_core::generation::FALLBACK_RESPONSE;
use empath_core::history::MemoryHistoryStore;
use empath_core::resilience::CircuitState;
use empath_core::scoring::CanonicalLabel;
use empath_core::service::ChatService;

fn scorer_handle(scorer: Arc<ScriptedScorer>) -> Arc<ModelHandle<dyn TextScorer>> {
    Arc::new(ModelHandle::ready(scorer))
}

fn generator_handle(generator: Arc<ScriptedGenerator>) -> Arc<ModelHandle<dyn TextGenerator>> {
    Arc::new(ModelHandle::ready(generator))
}

fn service_with(scorer: Arc<ScriptedScorer>, generator: Arc<ScriptedGenerator>) -> ChatService {
    ChatService::builder(
        scorer_handle(scorer),
        generator_handle(generator),
        Arc::new(MemoryCacheStore::new()),
        Arc::new(MemoryHistoryStore::new()),
    )
    .with_config(fast_config())
    .build()
}

#[tokio::test]
async fn test_second_identical_message_is_served_from_cache() {
    let scorer = Arc::new(
        ScriptedScorer::new("scorer").with_default_scores(&[("joy", 0.9), ("neutral", 0.1)]),
    );
    let generator = Arc::new(
        ScriptedGenerator::new("generator")
            .with_default_response(reply_json("That is wonderful to hear!")),
    );
    let service = service_with(Arc::clone(&scorer), Arc::clone(&generator));

    let first = service.chat("i just got the job offer", "u1").await.unwrap();
    assert!(!first.from_cache);
    assert_eq!(first.reply, "That is wonderful to hear!");
    let scorer_calls = scorer.call_count();

    let second = service.chat("i just got the job offer", "u1").await.unwrap();
    assert!(second.from_cache);
    assert_eq!(second.reply, first.reply);
    // A cache hit keeps the identifier of the turn that produced it
    assert_eq!(second.response_id, first.response_id);
    // Neither model ran a second time
    assert_eq!(scorer.call_count(), scorer_calls);
    assert_eq!(generator.call_count(), 1);
}

#[tokio::test]
async fn test_low_confidence_outcome_is_not_cached() {
    let scorer = Arc::new(
        ScriptedScorer::new("scorer").with_default_scores(&[("joy", 0.55), ("sadness", 0.45)]),
    );
    let generator = Arc::new(ScriptedGenerator::new("generator"));
    let service = service_with(scorer, generator);

    let first = service
        .chat("the weather seems fine enough", "u1")
        .await
        .unwrap();
    assert!(!first.from_cache);
    assert!((first.analysis.primary_score() - 0.55).abs() < 1e-9);

    let second = service
        .chat("the weather seems fine enough", "u1")
        .await
        .unwrap();
    assert!(!second.from_cache);
    assert_ne!(second.response_id, first.response_id);
}

#[tokio::test]
async fn test_malformed_output_retries_with_raised_temperature() {
    let scorer = Arc::new(
        ScriptedScorer::new("scorer").with_default_scores(&[("joy", 0.9), ("neutral", 0.1)]),
    );
    let generator = Arc::new(ScriptedGenerator::new("generator").with_script([
        GenerateOutcome::Raw("this is not json at all".to_string()),
        GenerateOutcome::Raw(reply_json("Sounds like great news!")),
    ]));
    let service = service_with(scorer, Arc::clone(&generator));

    let outcome = service
        .chat("i just got promoted at work", "u1")
        .await
        .unwrap();

    assert_eq!(outcome.reply, "Sounds like great news!");
    let temperatures = generator.temperatures();
    assert_eq!(temperatures.len(), 2);
    assert!((temperatures[0] - 0.7).abs() < 1e-9);
    assert!((temperatures[1] - 0.8).abs() < 1e-9);
}

#[tokio::test]
async fn test_misaligned_reply_is_regenerated() {
    let scorer = Arc::new(ScriptedScorer::new("scorer").with_script([
        ScoreOutcome::scores(&[("sadness", 0.9), ("neutral", 0.1)]),
        ScoreOutcome::scores(&[("joy", 0.9), ("neutral", 0.1)]),
        ScoreOutcome::scores(&[("sadness", 0.85), ("neutral", 0.15)]),
    ]));
    let generator = Arc::new(ScriptedGenerator::new("generator").with_script([
        GenerateOutcome::Raw(reply_json("Yay, that is amazing news!")),
        GenerateOutcome::Raw(reply_json("I am so sorry. That sounds heavy.")),
    ]));
    let service = service_with(Arc::clone(&scorer), Arc::clone(&generator));

    let outcome = service.chat("my cat died this morning", "u1").await.unwrap();

    // The upbeat candidate fails the alignment check against the sad
    // analysis and is regenerated.
    assert_eq!(outcome.reply, "I am so sorry. That sounds heavy.");
    assert_eq!(generator.call_count(), 2);
    // One scoring call for the message, one per candidate reply
    assert_eq!(scorer.call_count(), 3);
}

#[tokio::test]
async fn test_exhausted_generation_attempts_fall_back_to_canned_reply() {
    let scorer = Arc::new(ScriptedScorer::new("scorer"));
    let generator = Arc::new(ScriptedGenerator::new("generator").with_script([
        GenerateOutcome::Raw("definitely not json".to_string()),
        GenerateOutcome::Raw("```json still broken".to_string()),
        GenerateOutcome::Raw(
            r#"{"appraisal": "Challenge", "regulation": [], "response": ""}"#.to_string(),
        ),
    ]));
    let service = service_with(scorer, Arc::clone(&generator));
    let mut receiver = service.subscribe();

    let outcome = service
        .chat("today was honestly quite hard", "u1")
        .await
        .unwrap();

    assert_eq!(outcome.reply, FALLBACK_RESPONSE);
    assert_eq!(generator.call_count(), 3);

    let analyzed = receiver.recv().await.unwrap();
    assert_eq!(analyzed.name, events::ANALYSIS_COMPLETED);
    let fell_back = receiver.recv().await.unwrap();
    assert_eq!(fell_back.name, events::RESPONSE_FALLBACK);
}

#[tokio::test]
async fn test_unreachable_cache_degrades_health_but_not_chat() {
    let scorer = Arc::new(ScriptedScorer::new("scorer"));
    let generator = Arc::new(ScriptedGenerator::new("generator"));
    let service = ChatService::builder(
        scorer_handle(scorer),
        generator_handle(generator),
        Arc::new(UnavailableCacheStore),
        Arc::new(MemoryHistoryStore::new()),
    )
    .with_config(fast_config())
    .build();

    let outcome = service
        .chat("hello there my old friend", "u1")
        .await
        .unwrap();
    assert!(!outcome.from_cache);
    assert_eq!(outcome.analysis.primary(), CanonicalLabel::Happy);

    let health = service.health().await;
    assert_eq!(health.status, "degraded");
    assert!(!health.cache_reachable);
    assert_eq!(health.primary_scorer, ModelState::Ready);
}

#[tokio::test]
async fn test_health_is_ok_when_every_dependency_is_ready() {
    let service = service_with(
        Arc::new(ScriptedScorer::new("scorer")),
        Arc::new(ScriptedGenerator::new("generator")),
    );

    let health = service.health().await;

    assert_eq!(health.status, "ok");
    assert!(health.cache_reachable);
    assert_eq!(health.primary_scorer, ModelState::Ready);
    assert_eq!(health.generator, ModelState::Ready);
    assert!(health.secondary_scorer.is_none());
}

#[tokio::test]
async fn test_warm_up_loads_models_and_publishes_lifecycle_events() {
    let scorer = Arc::new(ScriptedScorer::new("scorer"));
    let generator = Arc::new(ScriptedGenerator::new("generator").with_failing_load());
    let cold_scorer: Arc<ModelHandle<dyn TextScorer>> = Arc::new(ModelHandle::new(scorer));
    let cold_generator: Arc<ModelHandle<dyn TextGenerator>> =
        Arc::new(ModelHandle::new(generator));
    let service = ChatService::builder(
        cold_scorer,
        cold_generator,
        Arc::new(MemoryCacheStore::new()),
        Arc::new(MemoryHistoryStore::new()),
    )
    .with_config(fast_config())
    .build();
    let mut receiver = service.subscribe();

    service.warm_up().await;

    let health = service.health().await;
    assert_eq!(health.primary_scorer, ModelState::Ready);
    assert_eq!(health.generator, ModelState::Failed);
    assert_eq!(health.status, "degraded");

    let loaded = receiver.recv().await.unwrap();
    assert_eq!(loaded.name, events::MODEL_LOADED);
    assert_eq!(loaded.context["backend"], "scorer");
    let failed = receiver.recv().await.unwrap();
    assert_eq!(failed.name, events::MODEL_LOAD_FAILED);
    assert_eq!(failed.context["backend"], "generator");
}

#[tokio::test]
async fn test_breaker_states_cover_both_model_components() {
    let service = service_with(
        Arc::new(ScriptedScorer::new("scorer")),
        Arc::new(ScriptedGenerator::new("generator")),
    );

    let states = service.breaker_states().await;

    assert_eq!(states.len(), 2);
    assert_eq!(states.get("model.scoring"), Some(&CircuitState::Closed));
    assert_eq!(states.get("model.generation"), Some(&CircuitState::Closed));
}
