//! # Analysis Orchestrator
//!
//! Drives a single user message through the full decision pipeline: context
//! folding, retry-guarded primary scoring, secondary signal folding,
//! normalization, confidence shaping, and the re-analysis pass. Every backend
//! failure along the way degrades to a usable neutral result; the only error
//! `analyze` can surface is the double-fallback case where even the degraded
//! result cannot be constructed.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tracing::{debug, warn};

use crate::backend::{ModelHandle, ModelState, TextScorer};
use crate::config::AnalysisConfig;
use crate::constants::events;
use crate::events::EventPublisher;
use crate::history::ConversationHistory;
use crate::logging::{log_analysis_operation, log_error};
use crate::resilience::{CircuitBreaker, RetryError, RetryPolicy};
use crate::scoring::{
    CanonicalLabel, Distribution, DistributionNormalizer, ScoreMap, ValidationError,
};

use super::context::{fold_short_input_context, has_question_cue, normalize_input, token_count};
use super::result::AnalysisResult;

/// Model label reported when the primary scorer was never consulted because
/// its handle was not in the Ready state.
const UNAVAILABLE_MODEL: &str = "unavailable (model not ready)";

/// Raw key under which the folded secondary signal enters the score map.
/// It maps to the sarcastic canonical label during normalization.
const SECONDARY_SIGNAL_KEY: &str = "sarcasm";

/// The single fatal failure mode of the analysis pipeline.
///
/// Scoring failures, open circuits, unavailable models, and invalid
/// distributions all degrade to fallback results instead of erroring. Only
/// when the degraded fallback itself cannot be built does `analyze` return
/// this.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("degraded fallback could not be constructed: {source}")]
    FallbackConstruction {
        #[source]
        source: ValidationError,
    },
}

/// Orchestrates scoring backends, history context, and distribution shaping
/// into validated [`AnalysisResult`]s.
pub struct AnalysisOrchestrator {
    primary: Arc<ModelHandle<dyn TextScorer>>,
    secondary: Option<Arc<ModelHandle<dyn TextScorer>>>,
    normalizer: DistributionNormalizer,
    history: Arc<ConversationHistory>,
    retry_policy: RetryPolicy,
    breaker: Arc<CircuitBreaker>,
    config: AnalysisConfig,
    events: EventPublisher,
}

impl AnalysisOrchestrator {
    pub fn new(
        primary: Arc<ModelHandle<dyn TextScorer>>,
        history: Arc<ConversationHistory>,
        config: AnalysisConfig,
        retry_policy: RetryPolicy,
        breaker: Arc<CircuitBreaker>,
    ) -> Self {
        Self {
            primary,
            secondary: None,
            normalizer: DistributionNormalizer::new(),
            history,
            retry_policy,
            breaker,
            config,
            events: EventPublisher::default(),
        }
    }

    /// Attach an optional secondary signal scorer (sarcasm detection).
    pub fn with_secondary_scorer(mut self, handle: Arc<ModelHandle<dyn TextScorer>>) -> Self {
        self.secondary = Some(handle);
        self
    }

    /// Share an event publisher instead of the orchestrator's private one.
    pub fn with_event_publisher(mut self, events: EventPublisher) -> Self {
        self.events = events;
        self
    }

    pub fn events(&self) -> &EventPublisher {
        &self.events
    }

    /// Lifecycle state of the primary scorer, for health reporting.
    pub fn primary_state(&self) -> ModelState {
        self.primary.state()
    }

    /// Lifecycle state of the secondary scorer, if one is attached.
    pub fn secondary_state(&self) -> Option<ModelState> {
        self.secondary.as_ref().map(|handle| handle.state())
    }

    /// Analyze a user message in the context of their conversation history.
    ///
    /// The input is recorded to the user's history after the result is
    /// determined, so the message never provides context for its own
    /// analysis. Empty or whitespace-only input short-circuits to a certain
    /// neutral result without touching any backend or the history store.
    pub async fn analyze(
        &self,
        text: &str,
        user_id: &str,
    ) -> Result<AnalysisResult, AnalysisError> {
        let started = Instant::now();

        if text.trim().is_empty() {
            debug!(user_id = %user_id, "Empty input, returning certain neutral");
            let result = AnalysisResult::empty_input(format!(
                "{} (empty input)",
                self.primary.backend_name()
            ));
            return Ok(self.finish(result, user_id, "empty_input", false, started));
        }

        let recent = self.history.recent(user_id).await;
        let history_available = !recent.is_empty();

        let normalized = normalize_input(text);
        let folded =
            fold_short_input_context(&normalized, &recent, self.config.short_token_limit);

        if !self.primary.is_ready() {
            warn!(
                backend = self.primary.backend_name(),
                state = %self.primary.state(),
                "🟡 Primary scorer not ready, returning degraded result"
            );
            let result = self.degraded_result(UNAVAILABLE_MODEL)?;
            self.history.record(user_id, text).await;
            return Ok(self.finish(result, user_id, "model_unavailable", true, started));
        }

        let scoring_text = folded.as_deref().unwrap_or(&normalized);
        let (mut distribution, mut degraded) = self.score_pass(scoring_text, &normalized).await;

        // High confidence with context present can mean the folded history
        // overwhelmed the current message. Re-score the message alone and
        // trust that outcome.
        if history_available {
            if let Some((_, score)) = distribution.primary() {
                if score > self.config.reanalysis_threshold {
                    debug!(
                        score,
                        threshold = self.config.reanalysis_threshold,
                        "🔧 Re-scoring raw text to confirm high-confidence result"
                    );
                    let (second, second_degraded) =
                        self.score_pass(&normalized, &normalized).await;
                    distribution = second;
                    degraded = second_degraded;
                }
            }
        }

        let model = if degraded {
            format!("{} (fallback)", self.primary.backend_name())
        } else {
            self.primary.backend_name().to_string()
        };

        let result = match AnalysisResult::from_distribution(distribution, &model) {
            Ok(result) => result,
            Err(err) => {
                warn!(
                    error = %err,
                    "🟡 Result finalization rejected distribution, using degraded fallback"
                );
                degraded = true;
                self.degraded_result(&format!(
                    "{} (fallback)",
                    self.primary.backend_name()
                ))?
            }
        };

        self.history.record(user_id, text).await;

        let status = if degraded { "degraded" } else { "completed" };
        Ok(self.finish(result, user_id, status, degraded, started))
    }

    /// Analyze text detached from any conversation: no history read, no
    /// history write, no events. Used to validate candidate replies without
    /// polluting the user's context.
    pub async fn analyze_text(&self, text: &str) -> Result<AnalysisResult, AnalysisError> {
        if text.trim().is_empty() {
            return Ok(AnalysisResult::empty_input(format!(
                "{} (empty input)",
                self.primary.backend_name()
            )));
        }

        if !self.primary.is_ready() {
            return self.degraded_result(UNAVAILABLE_MODEL);
        }

        let normalized = normalize_input(text);
        let (distribution, degraded) = self.score_pass(&normalized, &normalized).await;

        let model = if degraded {
            format!("{} (fallback)", self.primary.backend_name())
        } else {
            self.primary.backend_name().to_string()
        };

        match AnalysisResult::from_distribution(distribution, &model) {
            Ok(result) => Ok(result),
            Err(_) => self.degraded_result(&format!(
                "{} (fallback)",
                self.primary.backend_name()
            )),
        }
    }

    /// One full scoring pass: primary scoring, secondary fold, normalization,
    /// degraded-singleton collapse, and the low-confidence neutral floor.
    ///
    /// Infallible: every failure mode resolves to a usable distribution, with
    /// the degraded flag recording that a fallback shaped the outcome.
    async fn score_pass(&self, scoring_text: &str, normalized: &str) -> (Distribution, bool) {
        let mut degraded = false;

        let mut scores = match self.score_primary(scoring_text).await {
            Some(scores) => scores,
            None => {
                degraded = true;
                ScoreMap::new()
            }
        };

        self.fold_secondary_signal(normalized, &mut scores).await;

        let mut distribution = if scores.is_empty() {
            degraded = true;
            Distribution::degraded_neutral()
        } else {
            match self.normalizer.normalize(&scores) {
                Ok(distribution) => distribution,
                Err(err) => {
                    warn!(
                        error = %err,
                        "🟡 Normalizer rejected raw scores, using degraded singleton"
                    );
                    degraded = true;
                    Distribution::degraded_neutral()
                }
            }
        };

        // An all-zero distribution is the scorer saying "no signal"; the
        // degraded singleton is the policy answer to that.
        if distribution.is_all_zero() {
            debug!("All-zero distribution, collapsing to degraded singleton");
            degraded = true;
            distribution = Distribution::degraded_neutral();
        }

        if self.needs_neutral_floor(normalized, &distribution) {
            match apply_neutral_floor(&distribution, self.config.low_confidence_threshold) {
                Ok(floored) => {
                    debug!(
                        max_value = distribution.max_value(),
                        "🎭 Low-confidence short input, applying neutral floor"
                    );
                    distribution = floored;
                }
                Err(err) => {
                    warn!(error = %err, "🟡 Neutral floor produced invalid mass, keeping original");
                }
            }
        }

        (distribution, degraded)
    }

    /// Score through the retry policy and circuit breaker. `None` means the
    /// scorer could not produce anything and the pipeline should continue
    /// with empty scores.
    async fn score_primary(&self, text: &str) -> Option<ScoreMap> {
        let scorer = self.primary.get()?;
        let text = text.to_string();

        let outcome = self
            .retry_policy
            .execute(&self.breaker, || {
                let scorer = Arc::clone(&scorer);
                let text = text.clone();
                async move { scorer.score(&text).await }
            })
            .await;

        match outcome {
            Ok(scores) => Some(scores),
            Err(RetryError::CircuitOpen { component }) => {
                warn!(
                    component = %component,
                    "🔴 Scoring circuit open, continuing without primary scores"
                );
                None
            }
            Err(RetryError::Failed { attempts, source }) => {
                warn!(
                    attempts,
                    error = %source,
                    "🟡 Primary scoring failed, continuing without primary scores"
                );
                None
            }
        }
    }

    /// Fold the secondary signal (sarcasm) into the primary score map.
    ///
    /// Consulted only for inputs long enough to carry tone, and only when the
    /// secondary handle is attached and Ready. Failures are swallowed; the
    /// signal is additive garnish, never load-bearing.
    async fn fold_secondary_signal(&self, normalized: &str, scores: &mut ScoreMap) {
        let Some(handle) = &self.secondary else {
            return;
        };
        if !handle.is_ready() || normalized.chars().count() < self.config.secondary_min_chars {
            return;
        }
        let Some(scorer) = handle.get() else {
            return;
        };

        match scorer.score(normalized).await {
            Ok(secondary) => {
                let winner = secondary
                    .iter()
                    .filter(|(raw, _)| {
                        CanonicalLabel::from_raw(raw) == Some(CanonicalLabel::Sarcastic)
                    })
                    .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

                if let Some((_, score)) = winner {
                    if score > self.config.secondary_confidence_threshold {
                        debug!(score, "🎭 Folding secondary sarcasm signal into scores");
                        scores.add(SECONDARY_SIGNAL_KEY, score);
                    }
                }
            }
            Err(err) => {
                warn!(
                    backend = handle.backend_name(),
                    error = %err,
                    "🟡 Secondary scorer failed, continuing without signal"
                );
            }
        }
    }

    /// Short or interrogative inputs with no confident winner get pinned to
    /// neutral rather than trusting a noisy spread.
    fn needs_neutral_floor(&self, normalized: &str, distribution: &Distribution) -> bool {
        (token_count(normalized) < self.config.short_token_limit || has_question_cue(normalized))
            && distribution.max_value() < self.config.low_confidence_threshold
    }

    fn degraded_result(&self, model: &str) -> Result<AnalysisResult, AnalysisError> {
        AnalysisResult::degraded_fallback(model).map_err(|source| {
            log_error(
                "analysis",
                "degraded_fallback",
                &source.to_string(),
                Some("double fallback failure"),
            );
            AnalysisError::FallbackConstruction { source }
        })
    }

    /// Publish the lifecycle event and emit the structured operation log.
    fn finish(
        &self,
        result: AnalysisResult,
        user_id: &str,
        status: &str,
        degraded: bool,
        started: Instant,
    ) -> AnalysisResult {
        let elapsed_ms = started.elapsed().as_millis() as u64;
        let primary = result.primary().to_string();

        let event_name = if degraded {
            events::ANALYSIS_DEGRADED
        } else {
            events::ANALYSIS_COMPLETED
        };
        let context = serde_json::json!({
            "user_id": user_id,
            "primary_emotion": primary,
            "primary_score": result.primary_score(),
            "model_used": result.model(),
        });
        if let Err(err) = self.events.publish(event_name, &context) {
            warn!(error = %err, "Event publish failed");
        }

        log_analysis_operation(
            "analyze",
            user_id,
            Some(&primary),
            status,
            Some(elapsed_ms),
            None,
        );

        result
    }
}

/// Force neutral to exactly the floor value and rescale the remaining labels
/// so their mass is exactly the complement. The shaped distribution sums to
/// 1.0 with neutral at the floor.
fn apply_neutral_floor(
    distribution: &Distribution,
    floor: f64,
) -> Result<Distribution, ValidationError> {
    let mut weights: BTreeMap<CanonicalLabel, f64> = distribution.iter().collect();

    let rest_mass: f64 = weights
        .iter()
        .filter(|(label, _)| !label.is_neutral())
        .map(|(_, value)| *value)
        .sum();

    if rest_mass > 0.0 {
        let scale = (1.0 - floor) / rest_mass;
        for (label, value) in weights.iter_mut() {
            if label.is_neutral() {
                *value = floor;
            } else {
                *value *= scale;
            }
        }
        weights.entry(CanonicalLabel::Neutral).or_insert(floor);
    } else {
        // Nothing to carry the complementary mass, so neutral takes it all
        weights.insert(CanonicalLabel::Neutral, 1.0);
    }

    Distribution::try_new(weights)
}
