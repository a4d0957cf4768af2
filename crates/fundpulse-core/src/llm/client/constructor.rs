//! LLM client construction, accessors and request preflight

use super::types::{LLM_BREAKER_NAME, LlmClient};
use crate::config::LlmSettings;
use crate::error::{PulseError, PulseResult};
use crate::llm::error_utils::status_error;
use crate::llm::messages::ChatMessage;
use crate::recovery::circuit_breaker::{CircuitBreakerRegistry, CircuitBreakerStats};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use std::sync::Arc;
use tracing::debug;

impl LlmClient {
    /// Create a client.
    ///
    /// Missing credentials are not an error here; they are reported by the
    /// first request, so a process without a key can still serve market
    /// data. The breaker is taken from `breakers` so its state is visible
    /// next to the crawler breakers.
    pub fn new(settings: LlmSettings, breakers: &CircuitBreakerRegistry) -> PulseResult<Self> {
        // No total timeout on the client: streams are bounded per read
        let http = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout())
            .build()
            .map_err(|e| {
                PulseError::llm_with_provider(
                    format!("Failed to create HTTP client: {}", e),
                    &settings.provider,
                )
            })?;

        debug!(
            provider = %settings.provider,
            base_url = %settings.base_url,
            connect_secs = settings.connect_timeout_secs,
            request_secs = settings.request_timeout_secs,
            "Created LLM client"
        );

        Ok(Self {
            breaker: breakers.get(LLM_BREAKER_NAME),
            settings: Arc::new(settings),
            http,
        })
    }

    pub fn settings(&self) -> &LlmSettings {
        &self.settings
    }

    pub fn breaker_stats(&self) -> CircuitBreakerStats {
        self.breaker.stats()
    }

    pub(super) fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.settings.base_url.trim_end_matches('/')
        )
    }

    /// Reject requests that cannot possibly succeed, before any I/O
    pub(super) fn preflight(&self, messages: &[ChatMessage]) -> PulseResult<()> {
        if messages.is_empty() {
            return Err(PulseError::invalid_input_field(
                "at least one message is required",
                "messages",
            ));
        }
        let missing = [
            ("llm.api_key", self.settings.api_key.trim().is_empty()),
            ("llm.base_url", self.settings.base_url.trim().is_empty()),
            ("llm.model", self.settings.model.trim().is_empty()),
        ]
        .into_iter()
        .find_map(|(field, empty)| empty.then_some(field));

        match missing {
            Some(field) => Err(PulseError::config_with_context(
                format!("{} is not set", field),
                format!("Preparing request for provider '{}'", self.settings.provider),
            )),
            None => Ok(()),
        }
    }

    /// Send a request body and fail on a non-2xx status
    pub(super) async fn post(
        &self,
        body: &serde_json::Value,
        stream: bool,
    ) -> PulseResult<reqwest::Response> {
        let mut request = self
            .http
            .post(self.endpoint())
            .header(AUTHORIZATION, format!("Bearer {}", self.settings.api_key))
            .header(CONTENT_TYPE, "application/json")
            .json(body);
        request = if stream {
            request.header(ACCEPT, "text/event-stream")
        } else {
            request
                .header(ACCEPT, "application/json")
                .timeout(self.settings.request_timeout())
        };

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() && !stream {
                PulseError::timeout(self.settings.request_timeout_secs)
            } else {
                PulseError::llm_with_provider(
                    format!("Request failed: {}", e),
                    &self.settings.provider,
                )
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        Err(status_error(&self.settings.provider, status.as_u16(), &text))
    }
}
