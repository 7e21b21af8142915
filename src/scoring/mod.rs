//! # Scoring Types and Normalization
//!
//! The data backbone of the analysis pipeline: raw backend scores
//! ([`ScoreMap`]), the canonical label vocabulary ([`CanonicalLabel`]),
//! validated probability distributions ([`Distribution`]), and the
//! deterministic normalizer mapping between them.
//!
//! ## Architecture
//!
//! Backends emit [`ScoreMap`]s at the adapter boundary; everything downstream
//! works in canonical [`Distribution`]s, so label mapping happens in exactly
//! one place. Distribution construction is validated, never coerced.

pub mod distribution;
pub mod labels;
pub mod normalizer;
pub mod score_map;

pub use distribution::{Distribution, ValidationError, DEGRADED_NEUTRAL_WEIGHT};
pub use labels::CanonicalLabel;
pub use normalizer::DistributionNormalizer;
pub use score_map::ScoreMap;
