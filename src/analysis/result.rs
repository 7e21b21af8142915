//! # Analysis Results
//!
//! The immutable value an analysis produces: a validated distribution plus
//! the decisions derived from it (primary label, intensity, secondary
//! ordering) and the identifier of the model that produced it. Degraded
//! paths mark the identifier rather than changing the shape, so consumers
//! always handle one type.

use crate::constants::system::INTENSITY_CAP;
use crate::scoring::{CanonicalLabel, Distribution, ValidationError};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Fixed intensity reported for empty input
const EMPTY_INPUT_INTENSITY: f64 = 5.0;

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Bounded, saturating intensity transform over a primary score
pub fn intensity_from_score(primary_score: f64) -> f64 {
    round_to((primary_score * INTENSITY_CAP).min(INTENSITY_CAP), 2)
}

/// A canonical label paired with its probability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: CanonicalLabel,
    pub score: f64,
}

/// One complete emotion analysis outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    distribution: Distribution,
    #[serde(rename = "primary_emotion")]
    primary: CanonicalLabel,
    primary_score: f64,
    intensity: f64,
    #[serde(rename = "secondary_emotions")]
    secondary: Vec<LabelScore>,
    #[serde(rename = "model_used")]
    model: String,
}

impl AnalysisResult {
    /// Derive a full result from a validated distribution.
    ///
    /// Primary selection follows the distribution's tie-break rule; the
    /// secondary list carries every other label, highest score first, ties
    /// keeping canonical order.
    pub fn from_distribution(
        distribution: Distribution,
        model: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let (primary, primary_score) = distribution.primary().ok_or(ValidationError::Empty)?;

        let mut secondary: Vec<LabelScore> = distribution
            .iter()
            .filter(|(label, _)| *label != primary)
            .map(|(label, score)| LabelScore {
                label,
                score: round_to(score, 5),
            })
            .collect();
        secondary.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

        Ok(Self {
            distribution,
            primary,
            primary_score,
            intensity: intensity_from_score(primary_score),
            secondary,
            model: model.into(),
        })
    }

    /// The fixed result for empty or whitespace-only input
    pub fn empty_input(model: impl Into<String>) -> Self {
        Self {
            distribution: Distribution::certain_neutral(),
            primary: CanonicalLabel::Neutral,
            primary_score: 1.0,
            intensity: EMPTY_INPUT_INTENSITY,
            secondary: Vec::new(),
            model: model.into(),
        }
    }

    /// The degraded neutral fallback used when no validated result could be
    /// constructed. Fallible so the double-fallback-failure path is
    /// representable.
    pub fn degraded_fallback(model: impl Into<String>) -> Result<Self, ValidationError> {
        Self::from_distribution(Distribution::degraded_neutral(), model)
    }

    /// Re-check invariants on a result that bypassed the constructors, such
    /// as one deserialized from the cache.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.distribution.contains(self.primary) {
            return Err(ValidationError::PrimaryNotInDistribution { label: self.primary });
        }
        if !self.primary_score.is_finite() {
            return Err(ValidationError::NotFinite { label: self.primary });
        }
        if !(0.0..=1.0).contains(&self.primary_score) {
            return Err(ValidationError::OutOfRange {
                label: self.primary,
                value: self.primary_score,
            });
        }
        Ok(())
    }

    pub fn distribution(&self) -> &Distribution {
        &self.distribution
    }

    pub fn primary(&self) -> CanonicalLabel {
        self.primary
    }

    pub fn primary_score(&self) -> f64 {
        self.primary_score
    }

    pub fn intensity(&self) -> f64 {
        self.intensity
    }

    /// Non-primary labels, highest score first
    pub fn secondary(&self) -> &[LabelScore] {
        &self.secondary
    }

    /// Identifier of the model that produced this result; degraded paths
    /// carry a marker suffix
    pub fn model(&self) -> &str {
        &self.model
    }
}
