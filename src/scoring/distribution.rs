use crate::constants::system::NORMALIZATION_EPSILON;
use crate::scoring::{CanonicalLabel, ScoreMap};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Probability weight of the degraded neutral singleton
pub const DEGRADED_NEUTRAL_WEIGHT: f64 = 0.7;

/// Invariant violations detected when constructing a [`Distribution`] or an
/// analysis result from one. Never silently repaired beyond the documented
/// fallback paths.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("distribution is empty")]
    Empty,
    #[error("probability for {label} is not finite")]
    NotFinite { label: CanonicalLabel },
    #[error("probability {value} for {label} is outside [0, 1]")]
    OutOfRange { label: CanonicalLabel, value: f64 },
    #[error("probability mass {sum} is neither ~1.0, all-zero, nor the degraded neutral singleton")]
    BadMass { sum: f64 },
    #[error("primary label {label} is not a key of the distribution")]
    PrimaryNotInDistribution { label: CanonicalLabel },
}

/// A validated probability distribution over the canonical label set.
///
/// Construction enforces the mass invariant: values sum to ~1.0 (within
/// [`NORMALIZATION_EPSILON`]), or the map is all-zero (the "no signal"
/// shape callers must resolve via a policy fallback), or it is the degraded
/// neutral singleton `{neutral: 0.7}`. Violations are construction errors,
/// never coerced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distribution(BTreeMap<CanonicalLabel, f64>);

impl Distribution {
    /// Validate and construct a distribution from canonical weights
    pub fn try_new(weights: BTreeMap<CanonicalLabel, f64>) -> Result<Self, ValidationError> {
        if weights.is_empty() {
            return Err(ValidationError::Empty);
        }

        for (label, value) in &weights {
            if !value.is_finite() {
                return Err(ValidationError::NotFinite { label: *label });
            }
            if !(0.0..=1.0).contains(value) {
                return Err(ValidationError::OutOfRange {
                    label: *label,
                    value: *value,
                });
            }
        }

        let sum: f64 = weights.values().sum();
        let near_one = (sum - 1.0).abs() <= NORMALIZATION_EPSILON;
        let all_zero = weights.values().all(|value| *value == 0.0);
        let degraded_singleton = weights.len() == 1
            && weights
                .get(&CanonicalLabel::Neutral)
                .is_some_and(|value| (value - DEGRADED_NEUTRAL_WEIGHT).abs() <= NORMALIZATION_EPSILON);

        if near_one || all_zero || degraded_singleton {
            Ok(Self(weights))
        } else {
            Err(ValidationError::BadMass { sum })
        }
    }

    /// The degraded neutral singleton `{neutral: 0.7}`, used when no usable
    /// signal survived the pipeline
    pub fn degraded_neutral() -> Self {
        Self(BTreeMap::from([(
            CanonicalLabel::Neutral,
            DEGRADED_NEUTRAL_WEIGHT,
        )]))
    }

    /// The fully confident neutral distribution `{neutral: 1.0}`, used for
    /// empty input
    pub fn certain_neutral() -> Self {
        Self(BTreeMap::from([(CanonicalLabel::Neutral, 1.0)]))
    }

    /// Weight for a label, zero when absent
    pub fn get(&self, label: CanonicalLabel) -> f64 {
        self.0.get(&label).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, label: CanonicalLabel) -> bool {
        self.0.contains_key(&label)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate entries in canonical label order
    pub fn iter(&self) -> impl Iterator<Item = (CanonicalLabel, f64)> + '_ {
        self.0.iter().map(|(label, value)| (*label, *value))
    }

    pub fn sum(&self) -> f64 {
        self.0.values().sum()
    }

    pub fn max_value(&self) -> f64 {
        self.0.values().copied().fold(0.0, f64::max)
    }

    /// Whether every label carries exactly zero weight (the "no signal" shape)
    pub fn is_all_zero(&self) -> bool {
        self.0.values().all(|value| *value == 0.0)
    }

    /// The primary label and its probability: strictly greatest weight wins;
    /// exact ties resolve to the earliest label in canonical iteration order.
    pub fn primary(&self) -> Option<(CanonicalLabel, f64)> {
        let mut best: Option<(CanonicalLabel, f64)> = None;
        for (label, value) in self.iter() {
            match best {
                Some((_, best_value)) if value <= best_value => {}
                _ => best = Some((label, value)),
            }
        }
        best
    }

    /// Re-express this distribution as a raw score map, with canonical label
    /// names as the raw keys
    pub fn to_score_map(&self) -> ScoreMap {
        self.iter()
            .map(|(label, value)| (label.to_string(), value))
            .collect()
    }
}
