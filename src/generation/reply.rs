//! # Structured Reply Contract
//!
//! The JSON shape a generation backend must produce and the lenient parser
//! that recovers it from real model output. Models wrap JSON in code fences
//! or surround it with prose often enough that strict parsing alone would
//! reject a large share of usable replies.

use serde::{Deserialize, Serialize};

use crate::backend::BackendError;

/// Lazarus-style appraisal of the user's situation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Appraisal {
    Threat,
    #[default]
    Challenge,
}

/// A parsed, well-formed generated reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedReply {
    #[serde(default)]
    pub appraisal: Appraisal,

    /// Suggested regulation strategies; empty for low-intensity exchanges
    #[serde(default)]
    pub regulation: Vec<String>,

    /// The reply text shown to the user
    pub response: String,
}

/// Parse raw backend output into a [`GeneratedReply`].
///
/// Recovery order: strip ```json / ``` fences, try the whole string, then
/// fall back to the outermost brace span. A reply that deserializes but has
/// an empty `response` is still malformed.
pub fn parse_reply(raw: &str) -> Result<GeneratedReply, BackendError> {
    let trimmed = raw.trim();

    let unfenced = if let Some(inner) = trimmed
        .strip_prefix("```json")
        .and_then(|rest| rest.strip_suffix("```"))
    {
        inner.trim()
    } else if let Some(inner) = trimmed
        .strip_prefix("```")
        .and_then(|rest| rest.strip_suffix("```"))
    {
        inner.trim()
    } else {
        trimmed
    };

    let reply: GeneratedReply = match serde_json::from_str(unfenced) {
        Ok(reply) => reply,
        Err(first_err) => {
            let start = unfenced.find('{');
            let end = unfenced.rfind('}');
            match (start, end) {
                (Some(start), Some(end)) if start < end => {
                    serde_json::from_str(&unfenced[start..=end]).map_err(|e| {
                        BackendError::MalformedOutput(format!(
                            "brace-extracted JSON invalid: {e}"
                        ))
                    })?
                }
                _ => {
                    return Err(BackendError::MalformedOutput(format!(
                        "no JSON object found: {first_err}"
                    )));
                }
            }
        }
    };

    if reply.response.trim().is_empty() {
        return Err(BackendError::MalformedOutput(
            "reply carried an empty response field".to_string(),
        ));
    }

    Ok(reply)
}
