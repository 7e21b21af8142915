//! # Prompt Construction
//!
//! Builds the compact persona prompt fed to the generation backend. The
//! prompt carries the analysis outcome (primary emotion, intensity,
//! secondary labels), the recent conversation, and the JSON output contract
//! the reply parser expects.

use crate::analysis::AnalysisResult;

/// Build the generation prompt for one reply.
///
/// `context` is most-recent-first history, already limited by the caller.
pub fn build_prompt(analysis: &AnalysisResult, user_text: &str, context: &[String]) -> String {
    let context_line = if context.is_empty() {
        "No prior conversation.".to_string()
    } else {
        context.join(" ")
    };

    let secondary_line = if analysis.secondary().is_empty() {
        "none".to_string()
    } else {
        analysis
            .secondary()
            .iter()
            .map(|entry| format!("{} ({:.2})", entry.label, entry.score))
            .collect::<Vec<_>>()
            .join(", ")
    };

    format!(
        "**Role:** You are an experienced, empathetic therapist. Reply as a warm \
         human conversation partner, never as an assistant or a machine.\n\
         **User State:** Primary emotion: {primary} (intensity {intensity:.1}). \
         Secondary emotions: {secondary}.\n\
         **Context:** {context}\n\
         **Current Message:** {message}\n\
         **Instructions:**\n\
         - Answer in two to four conversational sentences, matching the user's emotional tone.\n\
         - If the message asks a question, answer it directly before anything else.\n\
         - For intensity above 5, classify the situation as Threat or Challenge and let that shape your tone.\n\
         - Suggest at most two concrete regulation strategies, and only for intensity above 5.\n\
         - Close with one open question that invites the user to keep talking.\n\
         - Output a single JSON object with fields: appraisal (\"Threat\" or \"Challenge\"), \
         regulation (array of strings, empty when intensity is low), response (string).",
        primary = analysis.primary(),
        intensity = analysis.intensity(),
        secondary = secondary_line,
        context = context_line,
        message = user_text,
    )
}
