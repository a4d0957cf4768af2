//! LLM client type definitions

use crate::config::LlmSettings;
use crate::recovery::circuit_breaker::CircuitBreaker;
use std::sync::Arc;

/// Breaker name shared by every call to the model endpoint
pub const LLM_BREAKER_NAME: &str = "llm";

/// Client for an OpenAI-compatible chat completion endpoint.
///
/// Cheap to clone; clones share the HTTP connection pool and the breaker.
///
/// # Examples
///
/// ```no_run
/// use fundpulse_core::config::LlmSettings;
/// use fundpulse_core::llm::{ChatMessage, ChatModel, ChatOptions, LlmClient};
/// use fundpulse_core::recovery::circuit_breaker::CircuitBreakerRegistry;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let settings = LlmSettings {
///     api_key: "sk-...".to_string(),
///     model: "gpt-4o-mini".to_string(),
///     ..Default::default()
/// };
/// let client = LlmClient::new(settings, &CircuitBreakerRegistry::new())?;
///
/// let reply = client
///     .complete(
///         &[ChatMessage::user("Summarize today's gold price moves")],
///         &ChatOptions::default(),
///         &CancellationToken::new(),
///     )
///     .await?;
/// println!("{}", reply.content);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LlmClient {
    pub(super) settings: Arc<LlmSettings>,
    pub(super) http: reqwest::Client,
    pub(super) breaker: Arc<CircuitBreaker>,
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("provider", &self.settings.provider)
            .field("base_url", &self.settings.base_url)
            .field("model", &self.settings.model)
            .field("breaker", &self.breaker.state())
            .finish()
    }
}
