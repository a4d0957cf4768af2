//! Shared fixed-timeout HTTP client

use crate::config::HttpSettings;
use crate::error::{PulseError, PulseResult};
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

/// One pooled client reused by every crawler.
///
/// Every request carries the configured timeout, user agent and extra
/// headers. Non-2xx responses become [`PulseError::Http`] with the status.
#[derive(Debug, Clone)]
pub struct ResilientClient {
    client: Client,
}

impl ResilientClient {
    pub fn new(settings: &HttpSettings) -> PulseResult<Self> {
        let mut headers = HeaderMap::new();
        for (key, value) in &settings.headers {
            match (
                HeaderName::from_bytes(key.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(val)) => {
                    headers.insert(name, val);
                }
                _ => warn!(header = %key, "Skipping invalid header"),
            }
        }

        let client = Client::builder()
            .timeout(settings.timeout())
            .user_agent(settings.user_agent.as_str())
            .default_headers(headers)
            .build()
            .map_err(|e| PulseError::http(format!("Failed to create HTTP client: {}", e)))?;

        debug!(timeout_secs = settings.timeout_secs, "Created crawler HTTP client");
        Ok(Self { client })
    }

    /// GET `url` and decode the body as JSON
    #[instrument(level = "debug", skip(self, query))]
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> PulseResult<T> {
        let response = self.send(url, query).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| PulseError::json(format!("Decoding response from {}: {}", url, e)))
    }

    /// GET `url` and return the body as text
    #[instrument(level = "debug", skip(self, query))]
    pub async fn get_text(&self, url: &str, query: &[(&str, &str)]) -> PulseResult<String> {
        let response = self.send(url, query).await?;
        Ok(response.text().await?)
    }

    async fn send(&self, url: &str, query: &[(&str, &str)]) -> PulseResult<reqwest::Response> {
        let mut request = self.client.get(url);
        if !query.is_empty() {
            request = request.query(query);
        }
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PulseError::http_status(url, status.as_u16()));
        }
        Ok(response)
    }
}
