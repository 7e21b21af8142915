//! # System Constants
//!
//! Core constants and event names that define the operational boundaries of the
//! empath analysis core.
//!
//! Everything here is fixed vocabulary rather than tunable policy; tunable values
//! live in [`crate::config`].

/// Lifecycle events emitted through the [`EventPublisher`](crate::events::EventPublisher)
pub mod events {
    // Analysis lifecycle events
    pub const ANALYSIS_COMPLETED: &str = "analysis.completed";
    pub const ANALYSIS_DEGRADED: &str = "analysis.degraded";

    // Response generation events
    pub const RESPONSE_GENERATED: &str = "response.generated";
    pub const RESPONSE_FALLBACK: &str = "response.fallback";

    // Model lifecycle events
    pub const MODEL_LOADED: &str = "model.loaded";
    pub const MODEL_LOAD_FAILED: &str = "model.load_failed";
}

/// Fixed lexical cues consulted by the analysis pipeline
pub mod lexicon {
    /// Keywords that mark a message as emotionally salient for context folding.
    /// Matched as substrings against lowercased text.
    pub const EMOTIONAL_KEYWORDS: &[&str] =
        &["sad", "happy", "angry", "fear", "died", "love", "hate"];

    /// Interrogative tokens that trigger the low-confidence neutral floor.
    /// Matched as substrings against lowercased text.
    pub const QUESTION_TOKENS: &[&str] = &["how", "what", "why", "where", "when"];
}

/// System-wide constants
pub mod system {
    /// Version compatibility marker
    pub const EMPATH_CORE_VERSION: &str = "0.1.0";

    /// Cache schema version; bumping this implicitly invalidates every cached response
    pub const CACHE_SCHEMA_VERSION: &str = "1.2";

    /// Tolerance when deciding whether a probability mass needs renormalization
    pub const NORMALIZATION_EPSILON: f64 = 1e-5;

    /// User identity applied when the caller does not supply one
    pub const DEFAULT_USER_ID: &str = "default";

    /// Intensity scale ceiling for the saturating `score * 7` transform
    pub const INTENSITY_CAP: f64 = 7.0;
}
