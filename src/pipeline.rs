//! The match-suggestion pipeline.
//!
//! ```text
//! target + candidates
//!        │
//!        ▼
//!  filter_candidates ──(none left)──▶ []        no model call
//!        │
//!        ▼
//!  SanitizedItem::from_item
//!        │
//!        ▼
//!  build_prompt ──▶ MatchRequester ──(transport/status error)──▶ []  + warn
//!        │
//!        ▼
//!  normalize_matches ──▶ Vec<MatchSuggestion>, confidence descending
//! ```
//!
//! The pipeline holds no per-request state; one instance serves any number
//! of concurrent requests. The only suspension point is the model call.

use std::sync::Arc;

use crate::candidates::{filter_candidates, FilterOptions};
use crate::config::Config;
use crate::error::MatchError;
use crate::llm::{create_requester, Credential, MatchRequester};
use crate::models::{Item, MatchSuggestion};
use crate::prompt::build_prompt;
use crate::rank::normalize_matches;
use crate::sanitize::{FieldLimits, SanitizedItem};

pub struct MatchPipeline {
    requester: Arc<dyn MatchRequester>,
    filter: FilterOptions,
    limits: FieldLimits,
}

impl MatchPipeline {
    pub fn new(requester: Arc<dyn MatchRequester>, filter: FilterOptions) -> Self {
        Self {
            requester,
            filter,
            limits: FieldLimits::default(),
        }
    }

    /// Build a pipeline with the requester selected by `[llm]`.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let requester = create_requester(&config.llm)?;
        Ok(Self::new(requester, FilterOptions::from(&config.matching)))
    }

    pub fn with_limits(mut self, limits: FieldLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn model_name(&self) -> &str {
        self.requester.model_name()
    }

    /// Resolve the model credential for one request.
    pub fn credential(&self) -> Result<Credential, MatchError> {
        self.requester.credential()
    }

    /// Render the prompt a request would send, or `None` if no candidate
    /// survives filtering.
    pub fn prepare_prompt(&self, target: &Item, candidates: &[Item]) -> Option<String> {
        let relevant = filter_candidates(target, candidates, &self.filter);
        if relevant.is_empty() {
            return None;
        }

        let safe_target = SanitizedItem::from_item(target, &self.limits);
        let safe_candidates: Vec<SanitizedItem> = relevant
            .into_iter()
            .map(|c| SanitizedItem::from_item(c, &self.limits))
            .collect();

        Some(build_prompt(&safe_target, &safe_candidates))
    }

    /// Suggest matches for `target` among `candidates`.
    ///
    /// # Errors
    ///
    /// Only configuration errors (missing credential, disabled provider).
    /// Model service failures are logged and yield an empty list.
    pub async fn find_matches(
        &self,
        target: &Item,
        candidates: &[Item],
    ) -> Result<Vec<MatchSuggestion>, MatchError> {
        let credential = self.credential()?;
        self.find_matches_with(&credential, target, candidates).await
    }

    /// [`find_matches`](Self::find_matches) with a credential the caller
    /// already resolved for this request.
    pub async fn find_matches_with(
        &self,
        credential: &Credential,
        target: &Item,
        candidates: &[Item],
    ) -> Result<Vec<MatchSuggestion>, MatchError> {
        let Some(prompt) = self.prepare_prompt(target, candidates) else {
            tracing::debug!(target_id = %target.id, "no candidates of the opposite disposition");
            return Ok(Vec::new());
        };

        match self.requester.request_matches(credential, &prompt).await {
            Ok(raw) => Ok(normalize_matches(target, raw)),
            Err(e) if e.is_recoverable() => {
                tracing::warn!(
                    target_id = %target.id,
                    model = self.requester.model_name(),
                    error = %e,
                    "match request failed; returning no suggestions"
                );
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }
}
