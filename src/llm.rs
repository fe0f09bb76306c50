//! Model service abstraction and the Gemini implementation.
//!
//! Defines the [`MatchRequester`] trait and concrete implementations:
//! - **[`GeminiRequester`]** — calls the Gemini `generateContent` endpoint
//!   with a strict JSON response schema.
//! - **[`DisabledRequester`]** — never calls out; reports that the provider
//!   is switched off.
//!
//! # Failure policy
//!
//! A request is made exactly once. There is no retry or backoff: match
//! suggestions are best-effort.
//! - Missing credential → [`MatchError::MissingCredential`] from
//!   [`MatchRequester::credential`], before any call is attempted
//! - Network error → [`MatchError::Transport`]
//! - Non-2xx → [`MatchError::Status`]
//! - Empty or unparsable model output → `Ok(vec![])`

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::MatchError;
use crate::models::RawMatch;

/// A model service credential, resolved once per match request.
#[derive(Clone)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// A generative model that turns a matching prompt into raw matches.
#[async_trait]
pub trait MatchRequester: Send + Sync {
    /// Returns the model identifier (e.g. `"gemini-2.5-flash"`).
    fn model_name(&self) -> &str;

    /// Resolve the credential for one request, without calling out.
    fn credential(&self) -> Result<Credential, MatchError>;

    /// Send `prompt` once with `credential` and return the parsed matches.
    async fn request_matches(
        &self,
        credential: &Credential,
        prompt: &str,
    ) -> Result<Vec<RawMatch>, MatchError>;
}

/// Build the requester selected by `config.provider`.
pub fn create_requester(config: &LlmConfig) -> anyhow::Result<Arc<dyn MatchRequester>> {
    match config.provider.as_str() {
        "gemini" => Ok(Arc::new(GeminiRequester::new(config)?)),
        "disabled" => Ok(Arc::new(DisabledRequester)),
        other => anyhow::bail!("Unknown llm provider: {}", other),
    }
}

/// Response schema constraining the model to `[{candidateId, confidence, reasoning}]`.
pub fn output_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "candidateId": { "type": "STRING" },
                "confidence": { "type": "NUMBER", "description": "Between 0 and 1" },
                "reasoning": { "type": "STRING" }
            },
            "required": ["candidateId", "confidence", "reasoning"]
        }
    })
}

/// Parse the model's textual output into raw matches.
///
/// Never fails: empty or unparsable text yields an empty list, and array
/// entries missing a required field are dropped individually. A Markdown
/// code fence around the payload is tolerated.
pub fn parse_raw_matches(text: &str) -> Vec<RawMatch> {
    let body = strip_code_fence(text.trim());
    if body.is_empty() {
        return Vec::new();
    }

    let value: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "model output is not valid JSON; treating as no matches");
            return Vec::new();
        }
    };

    let Some(entries) = value.as_array() else {
        tracing::warn!("model output is not a JSON array; treating as no matches");
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| match serde_json::from_value::<RawMatch>(entry.clone()) {
            Ok(m) => Some(m),
            Err(e) => {
                tracing::debug!(error = %e, "dropping malformed match entry");
                None
            }
        })
        .collect()
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

// ============ Disabled Requester ============

/// A requester that never calls out.
///
/// Used when `llm.provider = "disabled"`. Every request fails with
/// [`MatchError::ProviderDisabled`], which the server reports as a
/// configuration error rather than an empty result.
pub struct DisabledRequester;

#[async_trait]
impl MatchRequester for DisabledRequester {
    fn model_name(&self) -> &str {
        "disabled"
    }

    fn credential(&self) -> Result<Credential, MatchError> {
        Err(MatchError::ProviderDisabled)
    }

    async fn request_matches(
        &self,
        _credential: &Credential,
        _prompt: &str,
    ) -> Result<Vec<RawMatch>, MatchError> {
        Err(MatchError::ProviderDisabled)
    }
}

// ============ Gemini Requester ============

/// Requester backed by the Gemini API.
///
/// Calls `POST {base_url}/v1beta/models/{model}:generateContent` with
/// `responseMimeType = application/json` and the [`output_schema`].
/// The API key is read from the environment variable named by
/// `llm.api_key_env` once per request, unless a fixed key was supplied
/// with [`GeminiRequester::with_api_key`].
pub struct GeminiRequester {
    client: reqwest::Client,
    model: String,
    base_url: String,
    api_key_env: String,
    api_key: Option<Credential>,
}

impl GeminiRequester {
    pub fn new(config: &LlmConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key_env: config.api_key_env.clone(),
            api_key: None,
        })
    }

    /// A requester that uses `api_key` instead of reading the environment.
    pub fn with_api_key(config: &LlmConfig, api_key: impl Into<String>) -> anyhow::Result<Self> {
        let mut requester = Self::new(config)?;
        requester.api_key = Some(Credential::new(api_key));
        Ok(requester)
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[async_trait]
impl MatchRequester for GeminiRequester {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn credential(&self) -> Result<Credential, MatchError> {
        if let Some(key) = &self.api_key {
            return Ok(key.clone());
        }
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(Credential::new(key)),
            _ => Err(MatchError::MissingCredential {
                var: self.api_key_env.clone(),
            }),
        }
    }

    async fn request_matches(
        &self,
        credential: &Credential,
        prompt: &str,
    ) -> Result<Vec<RawMatch>, MatchError> {
        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }]
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": output_schema()
            }
        });

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", credential.secret())
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(MatchError::Status {
                status: status.as_u16(),
                body: body_text,
            });
        }

        let json: Value = match response.json().await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "model response body is not JSON");
                return Ok(Vec::new());
            }
        };

        Ok(parse_raw_matches(&response_text(&json)))
    }
}

/// Concatenate the text parts of the first candidate in a Gemini response.
fn response_text(json: &Value) -> String {
    json.get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
                .collect::<String>()
        })
        .unwrap_or_default()
}
