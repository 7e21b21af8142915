use crate::constants::system::NORMALIZATION_EPSILON;
use crate::scoring::{CanonicalLabel, Distribution, ScoreMap, ValidationError};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Deterministic mapping from raw backend scores to a validated
/// [`Distribution`] over the canonical label set.
///
/// The mapping is total: any input yields a legal distribution. A zero-mass
/// input yields the all-zero shape, which callers must resolve with their own
/// policy fallback; an input whose labels are all unknown collapses to
/// neutral.
#[derive(Debug, Clone, Copy, Default)]
pub struct DistributionNormalizer;

impl DistributionNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalize raw scores into canonical probabilities.
    ///
    /// Steps: accumulate scores into canonical buckets (raw labels sharing a
    /// canonical label sum); drop unknown raw labels with a debug log; fall
    /// back to `{neutral: 0.5}` when nothing mapped; rescale to unit mass
    /// once, at the end, and only when the bucket sum drifts more than
    /// [`NORMALIZATION_EPSILON`] from 1.0. Deferring the division to a single
    /// epsilon-gated step makes a second pass over the output an exact no-op.
    pub fn normalize(&self, raw: &ScoreMap) -> Result<Distribution, ValidationError> {
        let total = raw.total();
        let mut weights: BTreeMap<CanonicalLabel, f64> = BTreeMap::new();

        if total == 0.0 {
            // No mass to distribute: every canonical label at zero weight,
            // so callers can detect the condition and apply their fallback.
            warn!(raw_labels = raw.len(), "Zero-mass score map, emitting all-zero distribution");
            for label in CanonicalLabel::ALL {
                weights.insert(label, 0.0);
            }
            return Distribution::try_new(weights);
        }

        for (raw_label, score) in raw.iter() {
            if !score.is_finite() || score < 0.0 {
                debug!(raw_label, score, "Skipping non-finite or negative raw score");
                continue;
            }
            match CanonicalLabel::from_raw(raw_label) {
                Some(canonical) => {
                    *weights.entry(canonical).or_insert(0.0) += score;
                }
                None => {
                    debug!(raw_label, score, "Dropping unknown raw label");
                }
            }
        }

        if weights.is_empty() {
            warn!("No raw label mapped to the canonical set, falling back to neutral");
            weights.insert(CanonicalLabel::Neutral, 0.5);
        }

        let sum: f64 = weights.values().sum();
        let within_epsilon = (sum - 1.0).abs() <= NORMALIZATION_EPSILON;
        let in_range = weights.values().all(|value| *value <= 1.0);
        if sum > 0.0 && !(within_epsilon && in_range) {
            debug!(sum, "Rescaling canonical buckets to unit mass");
            for value in weights.values_mut() {
                *value /= sum;
            }
        }

        Distribution::try_new(weights)
    }
}
