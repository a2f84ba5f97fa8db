//! Response Parser: turns model completions into validated, typed replies.
//!
//! Order of attempts for every reply:
//! 1. strict JSON (after stripping code fences), then the first `{...}` span in the text
//! 2. fixed textual markers such as `Technical: 7/10`
//!
//! A reply that satisfies neither is rejected and the caller re-prompts.

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::warn;

use crate::errors::AppError;
use crate::llm_client::prompts::with_schema_correction;
use crate::llm_client::CompletionClient;

/// Extra attempts after the first reply fails validation.
pub const MAX_SCHEMA_RETRIES: u32 = 2;

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("reply is not valid JSON for the requested schema: {0}")]
    Json(String),

    #[error("`{field}` must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("expected at least {min} items in `{field}`, got {got}")]
    TooFew {
        field: &'static str,
        min: usize,
        got: usize,
    },

    #[error("`{0}` is not a recognised value")]
    UnknownValue(String),
}

/// A reply shape the model is asked to produce.
pub trait ReplySchema: DeserializeOwned + Sized {
    /// Checks ranges and normalises the parsed value.
    fn validated(self) -> Result<Self, ParseError>;

    /// Builds the reply from `Marker: value` lines when the model ignored the JSON instruction.
    fn from_markers(_text: &str) -> Option<Self> {
        None
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from model output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

/// The span from the first `{` to the last `}`, for replies wrapped in prose.
fn embedded_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Finds the first line that starts with `marker` (case-insensitive, ignoring list
/// bullets and emphasis) and returns the trimmed remainder.
pub fn marker_value<'a>(text: &'a str, marker: &str) -> Option<&'a str> {
    let marker = marker.to_lowercase();
    text.lines().find_map(|line| {
        let line = line.trim_start_matches(|c: char| c.is_whitespace() || matches!(c, '*' | '-' | '#'));
        let head = line.get(..marker.len())?;
        if head.to_lowercase() != marker {
            return None;
        }
        let rest = line[marker.len()..].trim_start_matches(|c: char| c == '*' || c.is_whitespace());
        Some(rest.trim())
    })
}

/// Reads the leading number after a marker: `Score: 7.5/10` → 7.5.
pub fn marker_number(text: &str, marker: &str) -> Option<f64> {
    let value = marker_value(text, marker)?;
    let number: String = value
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    number.trim_end_matches('.').parse().ok()
}

/// Parses a completion into `T`. Deterministic for a given input.
pub fn parse_reply<T: ReplySchema>(text: &str) -> Result<T, ParseError> {
    let body = strip_json_fences(text);
    let parsed = serde_json::from_str::<T>(body).or_else(|err| match embedded_json_object(body) {
        Some(object) => serde_json::from_str::<T>(object),
        None => Err(err),
    });

    match parsed {
        Ok(value) => value.validated(),
        Err(err) => match T::from_markers(text) {
            Some(value) => value.validated(),
            None => Err(ParseError::Json(err.to_string())),
        },
    }
}

/// Asks the model for a `T`, re-prompting with the rejection reason on schema failure.
pub async fn complete_structured<T: ReplySchema>(
    llm: &dyn CompletionClient,
    prompt: &str,
    system: &str,
) -> Result<T, AppError> {
    let mut current_prompt = prompt.to_string();
    let mut last_error: Option<ParseError> = None;

    for attempt in 0..=MAX_SCHEMA_RETRIES {
        let reply = llm.complete(&current_prompt, system).await?;
        match parse_reply::<T>(&reply) {
            Ok(value) => return Ok(value),
            Err(err) => {
                warn!(
                    "Structured reply attempt {}/{} rejected: {}",
                    attempt + 1,
                    MAX_SCHEMA_RETRIES + 1,
                    err
                );
                current_prompt = with_schema_correction(prompt, &err.to_string());
                last_error = Some(err);
            }
        }
    }

    Err(AppError::MalformedCompletion(format!(
        "model reply failed validation after {} attempts: {}",
        MAX_SCHEMA_RETRIES + 1,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    )))
}
