//! Bounding and scrubbing of untrusted item text before it reaches a prompt.
//!
//! Every text field is trimmed, truncated to a per-field limit, stripped of
//! ASCII control characters and of the delimiters `{ } < > \``, and
//! whitespace-collapsed. The delimiters are the ones a user could use to
//! break out of the prompt structure or smuggle JSON/markup into it.

use serde::Serialize;

use crate::models::{Disposition, Item};

/// Default bound for any text field without a specific limit.
pub const MAX_TEXT_LENGTH: usize = 400;

const DELIMITERS: [char; 5] = ['{', '}', '<', '>', '`'];

/// Per-field length limits, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLimits {
    pub id: usize,
    pub title: usize,
    pub description: usize,
    pub category: usize,
    pub location: usize,
    pub date: usize,
}

impl Default for FieldLimits {
    fn default() -> Self {
        Self {
            id: 64,
            title: 160,
            description: MAX_TEXT_LENGTH,
            category: 80,
            location: 120,
            date: 40,
        }
    }
}

/// Scrub a text value and bound it to `max_len` characters.
///
/// Total: never fails, and applying it twice yields the same string.
pub fn sanitize_text(input: &str, max_len: usize) -> String {
    let mut out = String::with_capacity(input.len().min(max_len));
    let mut pending_space = false;

    for ch in input.trim().chars().take(max_len) {
        let ch = if is_ascii_control(ch) { ' ' } else { ch };
        if DELIMITERS.contains(&ch) {
            continue;
        }
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;
        out.push(ch);
    }

    out
}

fn is_ascii_control(ch: char) -> bool {
    matches!(ch, '\u{0000}'..='\u{001F}' | '\u{007F}')
}

/// Projection of an [`Item`] that is safe to interpolate into a prompt.
///
/// Lives for a single match request and is never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SanitizedItem {
    pub id: String,
    #[serde(skip)]
    pub disposition: Disposition,
    pub title: String,
    pub description: String,
    pub category: String,
    pub location: String,
    pub date: String,
}

impl SanitizedItem {
    pub fn from_item(item: &Item, limits: &FieldLimits) -> Self {
        Self {
            id: sanitize_text(&item.id, limits.id),
            disposition: item.disposition,
            title: sanitize_text(&item.title, limits.title),
            description: sanitize_text(&item.description, limits.description),
            category: sanitize_text(item.category.as_str(), limits.category),
            location: sanitize_text(&item.location, limits.location),
            date: sanitize_text(&item.date, limits.date),
        }
    }
}
