//! Study material produced from a transcript

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const SUMMARY_KEY: &str = "summary";
pub const NOTES_KEY: &str = "notes";
pub const STUDY_PLAN_KEY: &str = "studyPlan";

/// Summary, notes and study plan, each as markdown
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyMaterial {
    pub summary: String,
    pub notes: String,
    #[serde(rename = "studyPlan")]
    pub study_plan: String,
}

impl StudyMaterial {
    /// Build from a parsed model response.
    ///
    /// Missing keys become empty strings and unknown keys are ignored.
    pub fn from_fields(fields: &Map<String, Value>) -> Self {
        Self {
            summary: field_text(fields, SUMMARY_KEY),
            notes: field_text(fields, NOTES_KEY),
            study_plan: field_text(fields, STUDY_PLAN_KEY),
        }
    }
}

/// Render a field as markdown text.
///
/// Models occasionally answer with a list of bullets instead of one string;
/// lists of strings are joined line by line, anything else is kept as JSON text.
fn field_text(fields: &Map<String, Value>, key: &str) -> String {
    match fields.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Array(items)) if items.iter().all(Value::is_string) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join("\n"),
        Some(other) => other.to_string(),
    }
}

/// Response body returned to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyResponse {
    pub transcript: String,
    #[serde(flatten)]
    pub material: StudyMaterial,
}
