//! Core data models shared by the match pipeline, the item store, and the
//! HTTP boundary.
//!
//! Wire names follow the camelCase JSON used by the web front end
//! (`type`, `reporterId`, `matchedItemId`, ...).

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::MatchError;

/// Whether an item record represents something lost or something found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Disposition {
    Lost,
    Found,
}

impl Disposition {
    /// The disposition a match candidate must have for this target.
    pub fn opposite(self) -> Disposition {
        match self {
            Disposition::Lost => Disposition::Found,
            Disposition::Found => Disposition::Lost,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Disposition::Lost => "LOST",
            Disposition::Found => "FOUND",
        }
    }
}

impl std::fmt::Display for Disposition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Case lifecycle of a reported item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemStatus {
    /// Just submitted.
    #[default]
    Reported,
    /// An administrator is looking at it.
    UnderReview,
    /// Linked to a counterpart item.
    Matched,
    /// Returned to its owner. Terminal.
    Resolved,
}

impl ItemStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemStatus::Reported => "REPORTED",
            ItemStatus::UnderReview => "UNDER_REVIEW",
            ItemStatus::Matched => "MATCHED",
            ItemStatus::Resolved => "RESOLVED",
        }
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Category {
    Electronics,
    Clothing,
    Documents,
    Accessories,
    Keys,
    #[default]
    Other,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Electronics => "Electronics",
            Category::Clothing => "Clothing",
            Category::Documents => "Documents",
            Category::Accessories => "Accessories",
            Category::Keys => "Keys",
            Category::Other => "Other",
        }
    }
}

/// A lost or found item report.
///
/// Text fields are deserialized leniently: a non-string JSON value becomes
/// the empty string (or `None` for optional fields) and an unknown category
/// or status falls back to its default, so a single odd field never rejects
/// an otherwise usable record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: String,
    #[serde(rename = "type")]
    pub disposition: Disposition,
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub category: Category,
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub location: String,
    /// ISO date (`YYYY-MM-DD`).
    #[serde(default, deserialize_with = "lenient_text")]
    pub date: String,
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub status: ItemStatus,
    #[serde(default, deserialize_with = "lenient_text")]
    pub reporter_id: String,
    #[serde(
        default,
        deserialize_with = "lenient_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub image_url: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub matched_item_id: Option<String>,
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        _ => Ok(String::new()),
    }
}

fn lenient_opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(Some(s)),
        _ => Ok(None),
    }
}

fn lenient_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// A proposed (lost, found) pairing awaiting human confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSuggestion {
    pub lost_item_id: String,
    pub found_item_id: String,
    /// Model-reported likelihood, nominally in `[0, 1]`.
    pub confidence: f64,
    pub reasoning: String,
}

/// One entry of the model's structured output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMatch {
    pub candidate_id: String,
    pub confidence: f64,
    pub reasoning: String,
}

/// Body of `POST /api/match`.
#[derive(Debug, Clone)]
pub struct MatchRequest {
    pub target_item: Item,
    pub candidates: Vec<Item>,
}

impl MatchRequest {
    /// Validate and decode a JSON request body.
    ///
    /// `targetItem` must be present and carry a valid `type`; `candidates`
    /// must be a list. Candidate entries that are not decodable items are
    /// skipped, since they can never be of the opposite disposition.
    pub fn from_value(body: Value) -> Result<Self, MatchError> {
        let required = || {
            MatchError::InvalidRequest("targetItem and candidates are required".to_string())
        };

        let target = match body.get("targetItem") {
            Some(v) if !v.is_null() => v.clone(),
            _ => return Err(required()),
        };
        let raw_candidates = body
            .get("candidates")
            .and_then(|c| c.as_array())
            .ok_or_else(required)?;

        let target_item: Item = serde_json::from_value(target)
            .map_err(|e| MatchError::InvalidRequest(format!("targetItem is not a valid item: {e}")))?;

        let candidates: Vec<Item> = raw_candidates
            .iter()
            .filter_map(|c| match serde_json::from_value::<Item>(c.clone()) {
                Ok(item) => Some(item),
                Err(e) => {
                    tracing::debug!(error = %e, "skipping undecodable candidate");
                    None
                }
            })
            .collect();

        Ok(Self {
            target_item,
            candidates,
        })
    }
}

/// Counters shown on the administrator dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total: usize,
    pub total_lost: usize,
    pub total_found: usize,
    pub pending_cases: usize,
    pub resolved_cases: usize,
}
