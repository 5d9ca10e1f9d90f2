use crate::material::{NOTES_KEY, STUDY_PLAN_KEY, SUMMARY_KEY};

/// System message sent with every generation request
pub const SYSTEM_INSTRUCTION: &str = "Return only valid JSON.";

/// Render the study material prompt for a transcript.
///
/// The transcript is appended verbatim after the instructions.
pub fn build_study_prompt(transcript: &str) -> String {
    format!(
        "You are an assistant that creates study materials from transcripts.\n\
         Given the transcript, produce a JSON object with keys: \n\
         - {SUMMARY_KEY}: a comprehensive summary (markdown)\n\
         - {NOTES_KEY}: detailed study notes as bullet points (markdown)\n\
         - {STUDY_PLAN_KEY}: a step-by-step plan with numbered steps (markdown)\n\n\
         Respond with ONLY valid JSON.\n\n\
         Transcript:\n{transcript}"
    )
}
