//! JSON recovery from raw model replies.
//!
//! A model that follows its instructions emits a bare JSON object, but two
//! deviations are common enough to absorb: wrapping the object in markdown
//! fences, and surrounding it with prose. Recovery is two-stage — strip
//! fence lines and parse directly, then fall back to the substring between
//! the first `{` and the last `}`. Anything beyond that fails the request;
//! the model is never re-asked.

use crate::error::ApiError;
use serde_json::Value;
use std::borrow::Cow;

/// Recover a parseable JSON value from a raw model reply.
pub fn recover_json(raw: &str) -> Result<Value, ApiError> {
    let cleaned = strip_fence_lines(raw.trim());

    if let Ok(value) = serde_json::from_str::<Value>(&cleaned) {
        return Ok(value);
    }

    if let (Some(start), Some(end)) = (cleaned.find('{'), cleaned.rfind('}')) {
        if end > start {
            if let Ok(value) = serde_json::from_str::<Value>(&cleaned[start..=end]) {
                return Ok(value);
            }
        }
    }

    Err(ApiError::Backend(
        "Failed to parse structured response from AI model".to_string(),
    ))
}

/// Drop every line that is a fence marker when the reply opens with one.
///
/// Replies that merely *contain* backtick fences deeper inside are left
/// alone; only an output wrapped in fences triggers the pass.
fn strip_fence_lines(trimmed: &str) -> Cow<'_, str> {
    if !trimmed.starts_with("```") {
        return Cow::Borrowed(trimmed);
    }
    let kept: Vec<&str> = trimmed
        .lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect();
    Cow::Owned(kept.join("\n"))
}
