//! Rendering of the matching prompt.
//!
//! The prompt only ever embeds [`SanitizedItem`]s: raw item text never
//! reaches the model. Output is deterministic for a given input.

use serde_json::json;

use crate::sanitize::SanitizedItem;

/// Minimum confidence the model is asked to report.
pub const CONFIDENCE_THRESHOLD: f64 = 0.5;

/// Build the prompt comparing `target` against `candidates`.
///
/// Candidates are embedded as a JSON array of
/// `{id, title, description, category, location, date}` objects.
pub fn build_prompt(target: &SanitizedItem, candidates: &[SanitizedItem]) -> String {
    let candidate_json = json!(candidates
        .iter()
        .map(|c| json!({
            "id": c.id,
            "title": c.title,
            "description": c.description,
            "category": c.category,
            "location": c.location,
            "date": c.date,
        }))
        .collect::<Vec<_>>());

    let candidate_disposition = target.disposition.opposite();

    format!(
        "You are an intelligent Lost & Found matching agent.\n\
         \n\
         Target Item ({disposition}):\n\
         Title: {title}\n\
         Description: {description}\n\
         Category: {category}\n\
         Location: {location}\n\
         Date: {date}\n\
         \n\
         Candidate Items ({candidate_disposition}):\n\
         {candidate_json}\n\
         \n\
         Analyze the Target Item against the Candidate Items.\n\
         Look for semantic similarities (e.g., \"MacBook\" matches \"Apple Laptop\", \"Library\" matches \"Study Room\").\n\
         Return a JSON array of matches that have a confidence score > {threshold}.\n\
         Refer to each matched candidate by its \"id\" in the \"candidateId\" field.\n\
         \n\
         Output strictly valid JSON.\n",
        disposition = target.disposition,
        title = target.title,
        description = target.description,
        category = target.category,
        location = target.location,
        date = target.date,
        candidate_disposition = candidate_disposition,
        candidate_json = candidate_json,
        threshold = CONFIDENCE_THRESHOLD,
    )
}
