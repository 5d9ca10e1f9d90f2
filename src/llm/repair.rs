//! Extraction of a JSON object from model output
//!
//! Models asked for "only JSON" still wrap it in prose or code fences now and
//! then. A strict parse is tried first; if that fails, the text between the
//! first `{` and the last `}` is parsed instead. The brace scan is a heuristic:
//! it can grab an unrelated pair or stop short of a nested one.

use serde_json::{Map, Value};
use tracing::debug;

use super::GenerationError;

/// Parse model output into a JSON object, repairing wrapped output
pub fn parse_model_json(content: &str) -> Result<Map<String, Value>, GenerationError> {
    if let Some(map) = parse_object(content) {
        return Ok(map);
    }

    debug!("Strict JSON parse failed, scanning for a brace-delimited object");

    let start = content.find('{');
    let end = content.rfind('}');
    match (start, end) {
        (Some(start), Some(end)) if end > start => {
            parse_object(&content[start..=end]).ok_or(GenerationError::NonJsonContent)
        }
        _ => Err(GenerationError::NonJsonContent),
    }
}

// Only objects count; a bare array or scalar goes through the brace scan.
fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}
