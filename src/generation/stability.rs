//! Stability AI image client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::ACCEPT, multipart::Form, Client};
use tracing::{debug, error};

use crate::generation::provider::{ImageProvider, ProviderError};

const PROVIDER: &str = "Stability";

pub const DEFAULT_STABILITY_URL: &str = "https://api.stability.ai/v2beta/stable-image/generate/sd3";

#[derive(Clone)]
pub struct StabilityClient {
    http: Client,
    url: String,
    api_key: Option<String>,
}

impl std::fmt::Debug for StabilityClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StabilityClient")
            .field("url", &self.url)
            .field("configured", &self.api_key.is_some())
            .finish()
    }
}

impl StabilityClient {
    pub fn new(
        url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Transport {
                provider: PROVIDER,
                reason: e.to_string(),
            })?;

        Ok(Self {
            http,
            url: url.into(),
            api_key: api_key.filter(|k| !k.is_empty()),
        })
    }
}

#[async_trait]
impl ImageProvider for StabilityClient {
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingApiKey("STABILITY_API_KEY"))?;

        let form = Form::new()
            .text("prompt", prompt.to_string())
            .text("output_format", "jpeg");

        debug!(url = %self.url, "calling image provider");

        let response = self
            .http
            .post(&self.url)
            .bearer_auth(api_key)
            .header(ACCEPT, "image/*")
            .multipart(form)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(PROVIDER, e))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), "image provider returned an error");
            return Err(ProviderError::Http {
                provider: PROVIDER,
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProviderError::from_reqwest(PROVIDER, e))?;
        if bytes.is_empty() {
            return Err(ProviderError::Malformed {
                provider: PROVIDER,
                reason: "empty image body".to_string(),
            });
        }

        Ok(bytes.to_vec())
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_key_fails_fast() {
        let client =
            StabilityClient::new(DEFAULT_STABILITY_URL, Some(String::new()), Duration::from_secs(1))
                .unwrap();
        assert!(!client.is_configured());
        assert_eq!(
            client.generate("a calm lake").await,
            Err(ProviderError::MissingApiKey("STABILITY_API_KEY"))
        );
    }
}
