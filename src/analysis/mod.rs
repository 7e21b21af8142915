//! # Emotion Analysis
//!
//! The decision side of the pipeline: turning one user message plus its
//! conversation context into a validated [`AnalysisResult`].
//!
//! ## Key Components
//!
//! - **AnalysisOrchestrator**: the full pipeline with context folding, retry
//!   and circuit-breaker guarded scoring, secondary signal folding, and
//!   confidence shaping
//! - **AnalysisResult**: immutable, validated outcome carrying the
//!   distribution, primary label, intensity, and model identifier
//! - **Context helpers**: input normalization and short-input history folding
//!
//! The orchestrator is built to degrade instead of fail: scorer errors, open
//! circuits, and unavailable models all produce marked fallback results. The
//! only error `analyze` can return is [`AnalysisError::FallbackConstruction`].

pub mod context;
pub mod orchestrator;
pub mod result;

pub use context::{
    fold_short_input_context, has_emotional_cue, has_question_cue, normalize_input, token_count,
};
pub use orchestrator::{AnalysisError, AnalysisOrchestrator};
pub use result::{intensity_from_score, AnalysisResult, LabelScore};
