//! Maps raw model output onto domain suggestions and ranks them.

use std::cmp::Ordering;

use crate::models::{Disposition, Item, MatchSuggestion, RawMatch};

/// Bind raw matches to (lost, found) pairs and sort by confidence, highest first.
///
/// A LOST target fills `lost_item_id`; a FOUND target fills `found_item_id`;
/// the candidate id fills the other side. The sort is stable, so equal
/// confidences keep the model's order. Confidence is passed through as
/// reported, out-of-range values included (they are only logged).
pub fn normalize_matches(target: &Item, raw: Vec<RawMatch>) -> Vec<MatchSuggestion> {
    let mut suggestions: Vec<MatchSuggestion> = raw
        .into_iter()
        .map(|m| {
            if !(0.0..=1.0).contains(&m.confidence) {
                tracing::warn!(
                    candidate = %m.candidate_id,
                    confidence = m.confidence,
                    "model reported confidence outside [0, 1]"
                );
            }
            let (lost_item_id, found_item_id) = match target.disposition {
                Disposition::Lost => (target.id.clone(), m.candidate_id),
                Disposition::Found => (m.candidate_id, target.id.clone()),
            };
            MatchSuggestion {
                lost_item_id,
                found_item_id,
                confidence: m.confidence,
                reasoning: m.reasoning,
            }
        })
        .collect();

    suggestions.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });
    suggestions
}
