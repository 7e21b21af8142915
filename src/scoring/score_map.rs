use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raw label scores exactly as a scoring backend produced them, before any
/// canonical mapping or normalization.
///
/// Keys are backend-specific raw labels; values are non-negative scores with
/// no guarantee of summing to anything in particular. Duplicate semantic
/// labels may appear under different raw keys. Backed by a `BTreeMap` so
/// iteration, and therefore float accumulation downstream, is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreMap(BTreeMap<String, f64>);

impl ScoreMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a raw label's score, replacing any existing value
    pub fn insert(&mut self, label: impl Into<String>, score: f64) {
        self.0.insert(label.into(), score);
    }

    /// Add to a raw label's score, starting from zero when absent
    pub fn add(&mut self, label: impl Into<String>, score: f64) {
        *self.0.entry(label.into()).or_insert(0.0) += score;
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.0.get(label).copied()
    }

    /// Sum of all finite, non-negative scores
    pub fn total(&self) -> f64 {
        self.0
            .values()
            .filter(|score| score.is_finite() && **score >= 0.0)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate raw entries in deterministic (lexicographic) key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(label, score)| (label.as_str(), *score))
    }
}

impl FromIterator<(String, f64)> for ScoreMap {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[(&str, f64); N]> for ScoreMap {
    fn from(entries: [(&str, f64); N]) -> Self {
        entries
            .into_iter()
            .map(|(label, score)| (label.to_string(), score))
            .collect()
    }
}
