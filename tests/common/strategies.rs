//! Proptest strategies for raw scoring inputs.

use empath_core::scoring::{CanonicalLabel, ScoreMap};
use proptest::prelude::*;

/// Raw labels the primary scoring backend vocabulary can emit
pub const KNOWN_RAW_LABELS: &[&str] = &[
    "anger", "disgust", "fear", "joy", "neutral", "sadness", "surprise",
];

/// One raw label the canonical mapping recognizes
pub fn known_raw_label() -> impl Strategy<Value = String> {
    prop::sample::select(KNOWN_RAW_LABELS).prop_map(|label| label.to_string())
}

/// A raw label the canonical mapping does not recognize
pub fn unknown_raw_label() -> impl Strategy<Value = String> {
    "[a-z]{3,12}".prop_filter("label must not map onto the canonical vocabulary", |raw| {
        CanonicalLabel::from_raw(raw).is_none()
    })
}

/// A positive raw score, spanning well past the unit range backends are
/// supposed to stay inside
pub fn positive_raw_score() -> impl Strategy<Value = f64> {
    0.001..10.0f64
}

/// A raw score map over known labels with at least one positive entry.
/// Duplicate labels collapse through the map, so the result holds between
/// one and five distinct entries.
pub fn known_score_map() -> impl Strategy<Value = ScoreMap> {
    prop::collection::vec((known_raw_label(), positive_raw_score()), 1..=5)
        .prop_map(|entries| entries.into_iter().collect())
}
