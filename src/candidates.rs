//! Restricts a match request to items of the opposite disposition.

use crate::config::MatchingConfig;
use crate::models::Item;

/// Options controlling candidate selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterOptions {
    /// Maximum number of candidates kept after filtering.
    pub max_candidates: usize,
    /// Drop any candidate whose id equals the target's.
    pub exclude_target_id: bool,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            max_candidates: 10,
            exclude_target_id: true,
        }
    }
}

impl From<&MatchingConfig> for FilterOptions {
    fn from(config: &MatchingConfig) -> Self {
        Self {
            max_candidates: config.max_candidates,
            exclude_target_id: config.exclude_target_id,
        }
    }
}

/// Keep the candidates a target can be matched against.
///
/// Only items whose disposition is the opposite of the target's survive.
/// Input order is preserved and the result is capped to
/// `opts.max_candidates`.
pub fn filter_candidates<'a>(
    target: &Item,
    candidates: &'a [Item],
    opts: &FilterOptions,
) -> Vec<&'a Item> {
    let wanted = target.disposition.opposite();

    candidates
        .iter()
        .filter(|c| c.disposition == wanted)
        .filter(|c| !(opts.exclude_target_id && c.id == target.id))
        .take(opts.max_candidates)
        .collect()
}
