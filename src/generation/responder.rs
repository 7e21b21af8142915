//! # Responder Service
//!
//! Produces the empathetic reply for an analyzed message. Generation runs a
//! bounded schema loop: each attempt goes through the transport-level retry
//! policy, the raw output is parsed against the reply contract, and the
//! candidate is checked for emotional alignment with the analysis. Malformed
//! or misaligned attempts regenerate with slightly raised temperature. When
//! every attempt is spent the canned fallback goes out instead; the caller
//! never sees an error.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::analysis::{AnalysisOrchestrator, AnalysisResult};
use crate::backend::{GenerationOptions, ModelHandle, ModelState, TextGenerator};
use crate::config::GenerationConfig;
use crate::constants::events;
use crate::events::EventPublisher;
use crate::history::ConversationHistory;
use crate::resilience::{CircuitBreaker, RetryError, RetryPolicy};
use crate::scoring::CanonicalLabel;

use super::prompt::build_prompt;
use super::reply::{parse_reply, GeneratedReply};

/// The reply of last resort, used when generation cannot produce a valid,
/// aligned response within the attempt budget.
pub const FALLBACK_RESPONSE: &str =
    "Thanks for sharing that with me. I'm here and listening. What feels most important to you right now?";

impl GeneratedReply {
    /// The canned fallback reply
    pub fn fallback() -> Self {
        Self {
            appraisal: Default::default(),
            regulation: Vec::new(),
            response: FALLBACK_RESPONSE.to_string(),
        }
    }
}

/// Generation-side orchestration: prompt building, the schema loop, and
/// alignment validation.
pub struct ResponderService {
    generator: Arc<ModelHandle<dyn TextGenerator>>,
    retry_policy: RetryPolicy,
    breaker: Arc<CircuitBreaker>,
    config: GenerationConfig,
    history: Arc<ConversationHistory>,
    alignment: Option<Arc<AnalysisOrchestrator>>,
    events: EventPublisher,
}

impl ResponderService {
    pub fn new(
        generator: Arc<ModelHandle<dyn TextGenerator>>,
        history: Arc<ConversationHistory>,
        config: GenerationConfig,
        retry_policy: RetryPolicy,
        breaker: Arc<CircuitBreaker>,
    ) -> Self {
        Self {
            generator,
            retry_policy,
            breaker,
            config,
            history,
            alignment: None,
            events: EventPublisher::default(),
        }
    }

    /// Validate candidate replies against this orchestrator before accepting
    /// them. Without one, every parseable reply is accepted.
    pub fn with_alignment(mut self, orchestrator: Arc<AnalysisOrchestrator>) -> Self {
        self.alignment = Some(orchestrator);
        self
    }

    /// Share an event publisher instead of the responder's private one.
    pub fn with_event_publisher(mut self, events: EventPublisher) -> Self {
        self.events = events;
        self
    }

    /// Backend identifier of the generator
    pub fn generator_name(&self) -> &str {
        self.generator.backend_name()
    }

    /// Lifecycle state of the generator, for health reporting
    pub fn generator_state(&self) -> ModelState {
        self.generator.state()
    }

    /// Generate a reply for an analyzed message.
    ///
    /// Infallible by contract: transport failures, malformed output, and
    /// misaligned candidates all resolve to the canned fallback after the
    /// attempt budget is spent.
    pub async fn respond(
        &self,
        user_text: &str,
        analysis: &AnalysisResult,
        user_id: &str,
    ) -> GeneratedReply {
        let context = self.history.recent(user_id).await;
        let prompt = build_prompt(analysis, user_text, &context);

        let mut options = GenerationOptions {
            max_output_tokens: self.config.max_output_tokens,
            temperature: self.config.temperature,
            top_p: self.config.top_p,
        };

        for attempt in 1..=self.config.schema_attempts {
            let Some(raw) = self.generate_once(&prompt, &options).await else {
                break;
            };

            match parse_reply(&raw) {
                Ok(reply) => {
                    if self.is_aligned(&reply.response, analysis).await {
                        debug!(
                            attempt,
                            temperature = options.temperature,
                            "🟢 Generated aligned reply"
                        );
                        self.publish(
                            events::RESPONSE_GENERATED,
                            user_id,
                            analysis,
                            attempt,
                        );
                        return reply;
                    }
                    warn!(
                        attempt,
                        expected = %analysis.primary(),
                        "🎭 Reply misaligned with analysis, regenerating"
                    );
                }
                Err(err) => {
                    warn!(attempt, error = %err, "🟡 Malformed generation output, regenerating");
                }
            }

            options.temperature = (options.temperature + self.config.temperature_increment)
                .min(self.config.temperature_cap);
        }

        warn!(
            user_id = %user_id,
            attempts = self.config.schema_attempts,
            "🟡 Generation attempts exhausted, using canned fallback"
        );
        self.publish(
            events::RESPONSE_FALLBACK,
            user_id,
            analysis,
            self.config.schema_attempts,
        );
        GeneratedReply::fallback()
    }

    /// One transport-level generation call through retry and breaker.
    /// `None` means the transport definitively failed and the schema loop
    /// should stop burning attempts.
    async fn generate_once(&self, prompt: &str, options: &GenerationOptions) -> Option<String> {
        let generator = match self.generator.get() {
            Some(generator) => generator,
            None => {
                warn!(
                    backend = self.generator.backend_name(),
                    state = %self.generator.state(),
                    "🟡 Generator not ready"
                );
                return None;
            }
        };

        let prompt = prompt.to_string();
        let options = options.clone();

        let outcome = self
            .retry_policy
            .execute(&self.breaker, || {
                let generator = Arc::clone(&generator);
                let prompt = prompt.clone();
                let options = options.clone();
                async move { generator.generate(&prompt, &options).await }
            })
            .await;

        match outcome {
            Ok(raw) => Some(raw),
            Err(RetryError::CircuitOpen { component }) => {
                warn!(component = %component, "🔴 Generation circuit open");
                None
            }
            Err(RetryError::Failed { attempts, source }) => {
                warn!(attempts, error = %source, "🟡 Generation transport failed");
                None
            }
        }
    }

    /// Check a candidate reply's emotional alignment with the analysis.
    ///
    /// An expected neutral accepts neutral, happy, or surprised candidates;
    /// other labels must match exactly. Analysis failures accept rather than
    /// over-reject.
    async fn is_aligned(&self, candidate: &str, analysis: &AnalysisResult) -> bool {
        let Some(orchestrator) = &self.alignment else {
            return true;
        };

        let expected = analysis.primary();
        match orchestrator.analyze_text(candidate).await {
            Ok(check) => {
                let got = check.primary();
                if expected == CanonicalLabel::Neutral {
                    matches!(
                        got,
                        CanonicalLabel::Neutral | CanonicalLabel::Happy | CanonicalLabel::Surprised
                    )
                } else {
                    got == expected
                }
            }
            Err(err) => {
                warn!(error = %err, "Alignment check failed, accepting reply");
                true
            }
        }
    }

    fn publish(&self, event_name: &str, user_id: &str, analysis: &AnalysisResult, attempt: u32) {
        let context = serde_json::json!({
            "user_id": user_id,
            "primary_emotion": analysis.primary().to_string(),
            "attempt": attempt,
            "model": self.generator.backend_name(),
        });
        if let Err(err) = self.events.publish(event_name, &context) {
            warn!(error = %err, "Event publish failed");
        }
    }
}
