use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical emotion labels forming the fixed output vocabulary.
///
/// Declaration order doubles as the canonical iteration order used for
/// deterministic tie-breaking when two labels carry the same probability,
/// so the derived `Ord` is part of the contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalLabel {
    Angry,
    Disgusted,
    Fearful,
    Happy,
    Neutral,
    Sad,
    Surprised,
    Sarcastic,
    NotSarcastic,
}

impl CanonicalLabel {
    /// Every canonical label, in canonical iteration order
    pub const ALL: [CanonicalLabel; 9] = [
        Self::Angry,
        Self::Disgusted,
        Self::Fearful,
        Self::Happy,
        Self::Neutral,
        Self::Sad,
        Self::Surprised,
        Self::Sarcastic,
        Self::NotSarcastic,
    ];

    /// Map a backend-specific raw label onto the canonical vocabulary.
    ///
    /// Raw labels that already spell a canonical label map to themselves;
    /// anything else yields `None` and is treated as a data-quality signal
    /// by the normalizer, never an error.
    pub fn from_raw(raw: &str) -> Option<Self> {
        let lowered = raw.trim().to_lowercase();
        match lowered.as_str() {
            "anger" => Some(Self::Angry),
            "disgust" => Some(Self::Disgusted),
            "fear" => Some(Self::Fearful),
            "joy" => Some(Self::Happy),
            "sadness" => Some(Self::Sad),
            "surprise" => Some(Self::Surprised),
            "sarcasm" | "label_1" => Some(Self::Sarcastic),
            "label_0" => Some(Self::NotSarcastic),
            other => other.parse().ok(),
        }
    }

    /// Check if this label is a secondary-signal label rather than a primary emotion
    pub fn is_secondary_signal(&self) -> bool {
        matches!(self, Self::Sarcastic | Self::NotSarcastic)
    }

    /// Check if this is the neutral label
    pub fn is_neutral(&self) -> bool {
        matches!(self, Self::Neutral)
    }
}

impl fmt::Display for CanonicalLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Angry => write!(f, "angry"),
            Self::Disgusted => write!(f, "disgusted"),
            Self::Fearful => write!(f, "fearful"),
            Self::Happy => write!(f, "happy"),
            Self::Neutral => write!(f, "neutral"),
            Self::Sad => write!(f, "sad"),
            Self::Surprised => write!(f, "surprised"),
            Self::Sarcastic => write!(f, "sarcastic"),
            Self::NotSarcastic => write!(f, "not_sarcastic"),
        }
    }
}

impl std::str::FromStr for CanonicalLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "angry" => Ok(Self::Angry),
            "disgusted" => Ok(Self::Disgusted),
            "fearful" => Ok(Self::Fearful),
            "happy" => Ok(Self::Happy),
            "neutral" => Ok(Self::Neutral),
            "sad" => Ok(Self::Sad),
            "surprised" => Ok(Self::Surprised),
            "sarcastic" => Ok(Self::Sarcastic),
            "not_sarcastic" => Ok(Self::NotSarcastic),
            _ => Err(format!("Invalid canonical label: {s}")),
        }
    }
}

impl Default for CanonicalLabel {
    fn default() -> Self {
        Self::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_mapping_covers_model_vocabulary() {
        assert_eq!(CanonicalLabel::from_raw("anger"), Some(CanonicalLabel::Angry));
        assert_eq!(
            CanonicalLabel::from_raw("disgust"),
            Some(CanonicalLabel::Disgusted)
        );
        assert_eq!(CanonicalLabel::from_raw("fear"), Some(CanonicalLabel::Fearful));
        assert_eq!(CanonicalLabel::from_raw("joy"), Some(CanonicalLabel::Happy));
        assert_eq!(
            CanonicalLabel::from_raw("sadness"),
            Some(CanonicalLabel::Sad)
        );
        assert_eq!(
            CanonicalLabel::from_raw("surprise"),
            Some(CanonicalLabel::Surprised)
        );
        assert_eq!(
            CanonicalLabel::from_raw("sarcasm"),
            Some(CanonicalLabel::Sarcastic)
        );
        assert_eq!(
            CanonicalLabel::from_raw("label_1"),
            Some(CanonicalLabel::Sarcastic)
        );
        assert_eq!(
            CanonicalLabel::from_raw("label_0"),
            Some(CanonicalLabel::NotSarcastic)
        );
    }

    #[test]
    fn test_canonical_names_map_to_themselves() {
        for label in CanonicalLabel::ALL {
            assert_eq!(CanonicalLabel::from_raw(&label.to_string()), Some(label));
        }
    }

    #[test]
    fn test_raw_mapping_is_case_insensitive() {
        assert_eq!(CanonicalLabel::from_raw("JOY"), Some(CanonicalLabel::Happy));
        assert_eq!(
            CanonicalLabel::from_raw(" Neutral "),
            Some(CanonicalLabel::Neutral)
        );
    }

    #[test]
    fn test_unknown_raw_label_is_dropped() {
        assert_eq!(CanonicalLabel::from_raw("positive"), None);
        assert_eq!(CanonicalLabel::from_raw(""), None);
    }

    #[test]
    fn test_canonical_order_is_declaration_order() {
        let mut sorted = CanonicalLabel::ALL.to_vec();
        sorted.sort();
        assert_eq!(sorted, CanonicalLabel::ALL.to_vec());
        assert!(CanonicalLabel::Angry < CanonicalLabel::Neutral);
        assert!(CanonicalLabel::Neutral < CanonicalLabel::Sarcastic);
    }

    #[test]
    fn test_label_serde_round_trip() {
        let json = serde_json::to_string(&CanonicalLabel::NotSarcastic).unwrap();
        assert_eq!(json, "\"not_sarcastic\"");
        let parsed: CanonicalLabel = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, CanonicalLabel::NotSarcastic);
    }
}
