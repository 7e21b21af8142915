#![allow(clippy::doc_markdown)] // Allow technical terms like ScoreMap, DashMap in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Empath Core
//!
//! Resilience and decision-orchestration core for an emotion-aware chat
//! pipeline. The crate turns raw, unreliable model backends into a dependable
//! conversational loop: score the user's message, shape the scores into a
//! validated emotion distribution, generate an aligned reply, and degrade
//! gracefully at every seam where a dependency can fail.
//!
//! ## Architecture
//!
//! The pipeline composes three layers behind one entry point:
//!
//! - **Resilience**: circuit breakers with a single-probe half-open phase,
//!   retry policies with exponential backoff, and soft-failing cache and
//!   history stores. A failing backend degrades the outcome, never the call.
//! - **Decision**: the [`analysis`] orchestrator folds conversation context
//!   into short inputs, merges an optional secondary signal, normalizes raw
//!   scores into a canonical distribution, and applies confidence shaping
//!   before committing to a primary emotion.
//! - **Generation**: the [`generation`] responder builds a persona prompt,
//!   runs a bounded schema loop over the generation backend, validates the
//!   reply's emotional alignment, and falls back to a canned response rather
//!   than surfacing an error.
//!
//! ## Module Organization
//!
//! - [`service`] - Caller-boundary composition: `ChatService`, health reporting
//! - [`analysis`] - Analysis orchestration and immutable results
//! - [`generation`] - Prompt construction, reply contract, responder loop
//! - [`scoring`] - Canonical labels, score maps, distribution normalization
//! - [`resilience`] - Circuit breakers, retry policies, breaker registry
//! - [`backend`] - Backend trait seams and the model lifecycle handle
//! - [`cache`] / [`history`] - Soft-failing store layers
//! - [`config`] - Validated YAML configuration with sensible defaults
//! - [`events`] - Broadcast lifecycle events
//! - [`error`] / [`logging`] / [`constants`] - Shared ambient concerns
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use empath_core::backend::ModelHandle;
//! use empath_core::cache::MemoryCacheStore;
//! use empath_core::history::MemoryHistoryStore;
//! use empath_core::service::ChatService;
//! # use empath_core::backend::{Backend, BackendError, GenerationOptions, TextGenerator, TextScorer};
//! # use empath_core::scoring::ScoreMap;
//! # struct Scorer;
//! # #[async_trait::async_trait]
//! # impl Backend for Scorer { fn name(&self) -> &str { "scorer" } }
//! # #[async_trait::async_trait]
//! # impl TextScorer for Scorer {
//! #     async fn score(&self, _text: &str) -> Result<ScoreMap, BackendError> {
//! #         Ok(ScoreMap::from([("neutral", 1.0)]))
//! #     }
//! # }
//! # struct Generator;
//! # #[async_trait::async_trait]
//! # impl Backend for Generator { fn name(&self) -> &str { "generator" } }
//! # #[async_trait::async_trait]
//! # impl TextGenerator for Generator {
//! #     async fn generate(&self, _p: &str, _o: &GenerationOptions) -> Result<String, BackendError> {
//! #         Ok(r#"{"response": "hello"}"#.to_string())
//! #     }
//! # }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let scorer: Arc<ModelHandle<dyn TextScorer>> =
//!     Arc::new(ModelHandle::ready(Arc::new(Scorer)));
//! let generator: Arc<ModelHandle<dyn TextGenerator>> =
//!     Arc::new(ModelHandle::ready(Arc::new(Generator)));
//!
//! let service = ChatService::builder(
//!     scorer,
//!     generator,
//!     Arc::new(MemoryCacheStore::new()),
//!     Arc::new(MemoryHistoryStore::new()),
//! )
//! .build();
//!
//! let outcome = service.chat("I had a rough day", "user-1").await?;
//! println!("{} ({})", outcome.reply, outcome.analysis.primary());
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod backend;
pub mod cache;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod generation;
pub mod history;
pub mod logging;
pub mod resilience;
pub mod scoring;
pub mod service;

pub use analysis::{AnalysisError, AnalysisOrchestrator, AnalysisResult};
pub use config::{ConfigManager, EmpathConfig};
// Re-export constants events with different name to avoid conflict
pub use constants::events as system_events;
pub use error::{EmpathError, Result, StoreError};
pub use generation::{GeneratedReply, ResponderService};
pub use scoring::{CanonicalLabel, Distribution, DistributionNormalizer, ScoreMap};
pub use service::{ChatOutcome, ChatService, HealthReport};
