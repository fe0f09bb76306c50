//! Client adapter for the match endpoint.
//!
//! [`MatchClient::find_smart_matches`] is the only operation a user
//! interface needs. It never fails: every transport or decoding problem is
//! logged and turned into an empty list.
//!
//! [`MatchSession`] binds match requests to ids for views that may fire
//! several requests or go away before a result arrives. Stale results and
//! results arriving after [`MatchSession::close`] are discarded. The HTTP
//! call itself is not interrupted.

use anyhow::{bail, Result};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::ClientConfig;
use crate::models::{Item, MatchSuggestion};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MatchRequestBody<'a> {
    target_item: &'a Item,
    candidates: &'a [Item],
}

pub struct MatchClient {
    http: reqwest::Client,
    endpoint: String,
}

impl MatchClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Ask the server for suggestions, degrading to `[]` on any failure.
    ///
    /// Returns immediately, without a network call, when `target` is
    /// absent or `candidates` is empty.
    pub async fn find_smart_matches(
        &self,
        target: Option<&Item>,
        candidates: &[Item],
    ) -> Vec<MatchSuggestion> {
        let Some(target) = target else {
            return Vec::new();
        };
        if candidates.is_empty() {
            return Vec::new();
        }

        match self.post_match(target, candidates).await {
            Ok(matches) => matches,
            Err(e) => {
                tracing::error!(endpoint = %self.endpoint, error = %e, "smart matching failed");
                Vec::new()
            }
        }
    }

    async fn post_match(&self, target: &Item, candidates: &[Item]) -> Result<Vec<MatchSuggestion>> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&MatchRequestBody {
                target_item: target,
                candidates,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("match endpoint returned {}: {}", status, body_text);
        }

        let json: serde_json::Value = response.json().await?;
        if !json.is_array() {
            bail!("match endpoint returned a non-array body");
        }
        Ok(serde_json::from_value(json)?)
    }
}

/// Identifier of a match request issued through a [`MatchSession`].
pub type RequestId = u64;

/// Tracks the match requests of one view.
///
/// Only the most recently issued request can deliver a result.
pub struct MatchSession {
    client: Arc<MatchClient>,
    next_id: RequestId,
    latest: Option<RequestId>,
    closed: bool,
    tx: mpsc::UnboundedSender<(RequestId, Vec<MatchSuggestion>)>,
    rx: mpsc::UnboundedReceiver<(RequestId, Vec<MatchSuggestion>)>,
}

impl MatchSession {
    pub fn new(client: Arc<MatchClient>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            client,
            next_id: 1,
            latest: None,
            closed: false,
            tx,
            rx,
        }
    }

    /// Spawn a match request, superseding any earlier one.
    ///
    /// Returns `None` without sending anything once the session is closed.
    pub fn begin(&mut self, target: Item, candidates: Vec<Item>) -> Option<RequestId> {
        if self.closed {
            tracing::debug!(target_id = %target.id, "match session closed; request not sent");
            return None;
        }

        let id = self.next_id;
        self.next_id += 1;
        self.latest = Some(id);

        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let matches = client.find_smart_matches(Some(&target), &candidates).await;
            // Receiver gone means the session was dropped; nothing to deliver.
            let _ = tx.send((id, matches));
        });

        Some(id)
    }

    /// Wait for the result of the latest request.
    ///
    /// Returns `None` when no request is pending or the session is closed.
    pub async fn next_result(&mut self) -> Option<(RequestId, Vec<MatchSuggestion>)> {
        loop {
            if self.closed {
                return None;
            }
            let latest = self.latest?;
            let (id, matches) = self.rx.recv().await?;
            if id == latest {
                self.latest = None;
                return Some((id, matches));
            }
            tracing::debug!(request = id, latest, "discarding superseded match result");
        }
    }

    /// Tear the session down. In-flight requests run to completion but
    /// their results are dropped.
    pub fn close(&mut self) {
        self.closed = true;
        self.latest = None;
        self.rx.close();
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}
