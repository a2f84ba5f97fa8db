// Shared prompt fragments used by every structured call.
// Each feature that talks to the model keeps its own prompts.rs alongside it.

/// Appended to every system role that expects a JSON reply.
pub const JSON_ONLY_INSTRUCTION: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Appended to a prompt when the previous reply failed schema validation.
/// Replace `{error}` before sending.
pub const SCHEMA_CORRECTION_TEMPLATE: &str = "\n\nYOUR PREVIOUS REPLY WAS REJECTED: {error}. \
    Reply again with ONLY the JSON object described above, following the schema exactly.";

/// Combines a role description with the JSON-only instruction.
pub fn json_system(role: &str) -> String {
    format!("{role}\n\n{JSON_ONLY_INSTRUCTION}")
}

/// Re-states the prompt with a note about why the last reply was rejected.
pub fn with_schema_correction(prompt: &str, error: &str) -> String {
    format!(
        "{prompt}{}",
        SCHEMA_CORRECTION_TEMPLATE.replace("{error}", error)
    )
}
