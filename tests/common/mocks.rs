//! Scripted backend and store doubles.
//!
//! Each mock records every call it receives so tests can assert on exactly
//! what the pipeline sent to its collaborators, in call order. Scripted
//! outcomes are consumed from the front; once a script runs dry the mock
//! falls back to its default behavior.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use empath_core::backend::{
    Backend, BackendError, GenerationOptions, TextGenerator, TextScorer,
};
use empath_core::cache::CacheStore;
use empath_core::config::{CircuitBreakerConfig, EmpathConfig, RetryConfig};
use empath_core::error::StoreError;
use empath_core::scoring::ScoreMap;

/// One scripted outcome of a scoring call
#[derive(Debug, Clone)]
pub enum ScoreOutcome {
    /// Return these raw label scores
    Scores(Vec<(String, f64)>),
    /// Fail with a retryable transport error
    TransientFailure,
    /// Fail with a permanent availability error
    Unavailable,
}

impl ScoreOutcome {
    pub fn scores(entries: &[(&str, f64)]) -> Self {
        Self::Scores(
            entries
                .iter()
                .map(|(label, score)| (label.to_string(), *score))
                .collect(),
        )
    }
}

#[derive(Debug, Default)]
struct ScorerState {
    scored_texts: Vec<String>,
    script: VecDeque<ScoreOutcome>,
}

/// Scripted [`TextScorer`] that records every text it is asked to score
#[derive(Debug)]
pub struct ScriptedScorer {
    name: String,
    fail_load: bool,
    default_scores: Vec<(String, f64)>,
    state: Arc<Mutex<ScorerState>>,
}

impl ScriptedScorer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fail_load: false,
            default_scores: vec![("joy".to_string(), 0.8), ("neutral".to_string(), 0.2)],
            state: Arc::new(Mutex::new(ScorerState::default())),
        }
    }

    /// Replace the scores returned once the script is exhausted
    pub fn with_default_scores(mut self, entries: &[(&str, f64)]) -> Self {
        self.default_scores = entries
            .iter()
            .map(|(label, score)| (label.to_string(), *score))
            .collect();
        self
    }

    /// Queue outcomes consumed in order ahead of the defaults
    pub fn with_script(self, outcomes: impl IntoIterator<Item = ScoreOutcome>) -> Self {
        self.state.lock().script.extend(outcomes);
        self
    }

    /// Make `load` fail, leaving a handle in the Failed state
    pub fn with_failing_load(mut self) -> Self {
        self.fail_load = true;
        self
    }

    /// Every text scored so far, in call order
    pub fn scored_texts(&self) -> Vec<String> {
        self.state.lock().scored_texts.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().scored_texts.len()
    }
}

#[async_trait]
impl Backend for ScriptedScorer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self) -> Result<(), BackendError> {
        if self.fail_load {
            Err(BackendError::Unavailable("scripted load failure".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl TextScorer for ScriptedScorer {
    async fn score(&self, text: &str) -> Result<ScoreMap, BackendError> {
        let outcome = {
            let mut state = self.state.lock();
            state.scored_texts.push(text.to_string());
            state.script.pop_front()
        };

        match outcome {
            Some(ScoreOutcome::Scores(entries)) => Ok(entries.into_iter().collect()),
            Some(ScoreOutcome::TransientFailure) => {
                Err(BackendError::Transient("scripted timeout".into()))
            }
            Some(ScoreOutcome::Unavailable) => {
                Err(BackendError::Unavailable("scripted outage".into()))
            }
            None => Ok(self
                .default_scores
                .iter()
                .map(|(label, score)| (label.clone(), *score))
                .collect()),
        }
    }
}

/// One scripted outcome of a generation call
#[derive(Debug, Clone)]
pub enum GenerateOutcome {
    /// Return this raw model output
    Raw(String),
    /// Fail with a retryable transport error
    TransientFailure,
}

#[derive(Debug, Default)]
struct GeneratorState {
    prompts: Vec<String>,
    temperatures: Vec<f64>,
    script: VecDeque<GenerateOutcome>,
}

/// Scripted [`TextGenerator`] that records every prompt and the sampling
/// temperature it was called with
#[derive(Debug)]
pub struct ScriptedGenerator {
    name: String,
    fail_load: bool,
    default_response: String,
    state: Arc<Mutex<GeneratorState>>,
}

impl ScriptedGenerator {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fail_load: false,
            default_response: reply_json("I hear you. That sounds like a lot to carry."),
            state: Arc::new(Mutex::new(GeneratorState::default())),
        }
    }

    /// Replace the raw output returned once the script is exhausted
    pub fn with_default_response(mut self, raw: impl Into<String>) -> Self {
        self.default_response = raw.into();
        self
    }

    /// Queue outcomes consumed in order ahead of the default
    pub fn with_script(self, outcomes: impl IntoIterator<Item = GenerateOutcome>) -> Self {
        self.state.lock().script.extend(outcomes);
        self
    }

    /// Make `load` fail, leaving a handle in the Failed state
    pub fn with_failing_load(mut self) -> Self {
        self.fail_load = true;
        self
    }

    /// Every prompt generated against so far, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.state.lock().prompts.clone()
    }

    /// The temperature of each call, in call order
    pub fn temperatures(&self) -> Vec<f64> {
        self.state.lock().temperatures.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().prompts.len()
    }
}

#[async_trait]
impl Backend for ScriptedGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self) -> Result<(), BackendError> {
        if self.fail_load {
            Err(BackendError::Unavailable("scripted load failure".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, BackendError> {
        let outcome = {
            let mut state = self.state.lock();
            state.prompts.push(prompt.to_string());
            state.temperatures.push(options.temperature);
            state.script.pop_front()
        };

        match outcome {
            Some(GenerateOutcome::Raw(raw)) => Ok(raw),
            Some(GenerateOutcome::TransientFailure) => {
                Err(BackendError::Transient("scripted timeout".into()))
            }
            None => Ok(self.default_response.clone()),
        }
    }
}

/// Well-formed reply JSON wrapping the given response text
pub fn reply_json(response: &str) -> String {
    format!(
        r#"{{"appraisal": "Challenge", "regulation": ["reappraisal"], "response": "{response}"}}"#
    )
}

/// Cache store standing in for an unreachable backing service
#[derive(Debug, Default)]
pub struct UnavailableCacheStore;

#[async_trait]
impl CacheStore for UnavailableCacheStore {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

/// Default configuration with retry backoff tightened so failure-path tests
/// do not spend wall-clock time sleeping
pub fn fast_config() -> EmpathConfig {
    let mut config = EmpathConfig::default();
    config.retry = RetryConfig {
        max_attempts: 3,
        initial_delay_ms: 2,
        backoff_factor: 1.0,
    };
    config.circuit_breaker = CircuitBreakerConfig {
        failure_threshold: 50,
        reset_timeout_ms: 10_000,
    };
    config
}
