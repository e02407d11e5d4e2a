//! HTTP transport for OpenAI-compatible completion endpoints.

use crate::{Complete, Request, Response};
use anyhow::Result;
use reqwest::Client;

/// Default endpoint base when no override is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// A completion provider speaking the OpenAI-compatible HTTP protocol.
#[derive(Clone)]
pub struct HttpProvider {
    /// The reqwest client (connection pool shared across calls).
    client: Client,
    /// Endpoint base URL, without the `/chat/completions` suffix.
    base_url: String,
}

impl HttpProvider {
    /// Create a provider against the default endpoint.
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL)
    }

    /// Create a provider against a custom endpoint base.
    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { client, base_url }
    }

    /// The full completion endpoint URL.
    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

impl Complete for HttpProvider {
    async fn complete(&self, credential: &str, request: &Request) -> Result<Response> {
        tracing::debug!("request: {}", serde_json::to_string(request)?);
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(credential)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        tracing::debug!("response ({status}): {text}");

        if !status.is_success() {
            anyhow::bail!("completion endpoint returned {status}: {text}");
        }

        // Parse from text rather than `.json()` so a malformed body
        // surfaces alongside the raw payload in debug logs.
        serde_json::from_str(&text).map_err(Into::into)
    }
}
