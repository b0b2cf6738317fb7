//! Upstream provider seams.
//!
//! Providers report failures through [`ProviderError`] rather than panicking
//! or returning sentinel values, so callers can decide what is retryable.

use async_trait::async_trait;
use thiserror::Error;

// == Provider Error ==
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The request did not complete within the client timeout
    #[error("request to {provider} timed out")]
    Timeout { provider: &'static str },

    /// The provider answered with a non-success status
    #[error("{provider} returned HTTP {status}: {body}")]
    Http {
        provider: &'static str,
        status: u16,
        body: String,
    },

    /// The provider answered 2xx but the payload was not usable
    #[error("{provider} returned a malformed response: {reason}")]
    Malformed {
        provider: &'static str,
        reason: String,
    },

    /// Connection, DNS or TLS failure
    #[error("transport error talking to {provider}: {reason}")]
    Transport {
        provider: &'static str,
        reason: String,
    },

    #[error("{0} is not configured")]
    MissingApiKey(&'static str),
}

impl ProviderError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProviderError::Timeout { .. })
    }

    /// Maps a reqwest failure onto the tagged variants.
    pub(crate) fn from_reqwest(provider: &'static str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout { provider }
        } else if err.is_decode() {
            ProviderError::Malformed {
                provider,
                reason: err.to_string(),
            }
        } else if let Some(status) = err.status() {
            ProviderError::Http {
                provider,
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            ProviderError::Transport {
                provider,
                reason: err.to_string(),
            }
        }
    }
}

/// Parameters for a single text completion.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Text-generation backend.
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Returns the completion text for one prompt. Implementations do not retry.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError>;

    fn is_configured(&self) -> bool {
        true
    }
}

/// Image-generation backend returning encoded image bytes.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, ProviderError>;

    fn is_configured(&self) -> bool {
        true
    }
}
