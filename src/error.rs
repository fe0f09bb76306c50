//! Error taxonomy for the match pipeline.
//!
//! Only configuration problems and malformed requests ever leave the
//! pipeline as errors. Failures of the model service itself are
//! recoverable: the pipeline logs them and answers with an empty
//! suggestion list so callers always have something to render.

use thiserror::Error;

/// Errors produced while serving a single match request.
#[derive(Debug, Error)]
pub enum MatchError {
    /// The model service credential is not configured.
    #[error("missing model service credential: {var} is not set")]
    MissingCredential { var: String },

    /// The model provider is switched off in the configuration.
    #[error("model provider is disabled (set llm.provider to \"gemini\")")]
    ProviderDisabled,

    /// The request body is malformed or lacks required fields.
    #[error("{0}")]
    InvalidRequest(String),

    /// The model service could not be reached.
    #[error("model service transport error: {0}")]
    Transport(String),

    /// The model service answered with a non-success status.
    #[error("model service returned {status}: {body}")]
    Status { status: u16, body: String },
}

impl MatchError {
    /// Whether the pipeline may degrade this error to an empty result.
    pub fn is_recoverable(&self) -> bool {
        match self {
            MatchError::Transport(_) | MatchError::Status { .. } => true,
            MatchError::MissingCredential { .. }
            | MatchError::ProviderDisabled
            | MatchError::InvalidRequest(_) => false,
        }
    }

    /// Whether this error stems from deployment configuration rather than the caller.
    pub fn is_configuration(&self) -> bool {
        match self {
            MatchError::MissingCredential { .. } | MatchError::ProviderDisabled => true,
            MatchError::InvalidRequest(_) | MatchError::Transport(_) | MatchError::Status { .. } => {
                false
            }
        }
    }
}

impl From<reqwest::Error> for MatchError {
    fn from(err: reqwest::Error) -> Self {
        MatchError::Transport(err.to_string())
    }
}
