//! One-shot completions

use super::types::LlmClient;
use crate::error::{PulseError, PulseResult};
use crate::llm::messages::{ChatMessage, ChatOptions, ChatResponse, TokenUsage, ToolCall};
use crate::llm::request_builder::build_chat_request_body;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

#[derive(Debug, Deserialize)]
struct CompletionBody {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    choices: Vec<CompletionChoice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<WireToolCall>,
}

#[derive(Debug, Deserialize)]
struct WireToolCall {
    #[serde(default)]
    id: String,
    function: WireFunction,
}

#[derive(Debug, Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

impl LlmClient {
    /// Send a non-streaming completion request
    #[instrument(skip_all, fields(provider = %self.settings.provider, model = %self.settings.model))]
    pub(super) async fn complete_once(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
        cancel: &CancellationToken,
    ) -> PulseResult<ChatResponse> {
        self.preflight(messages)?;
        let body = build_chat_request_body(&self.settings, messages, options, false);

        let request = self.breaker.call(|| async {
            let response = self.post(&body, false).await?;
            let text = response.text().await.map_err(|e| {
                PulseError::llm_with_provider(
                    format!("Failed to read response: {}", e),
                    &self.settings.provider,
                )
            })?;
            parse_completion(&text)
        });

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PulseError::Cancelled),
            result = request => result?,
        };

        debug!(
            finish_reason = ?response.finish_reason,
            tool_calls = response.tool_calls.len(),
            "Completion received"
        );
        Ok(response)
    }
}

pub(super) fn parse_completion(text: &str) -> PulseResult<ChatResponse> {
    let body: CompletionBody = serde_json::from_str(text)
        .map_err(|e| PulseError::llm(format!("Malformed completion response: {}", e)))?;
    let choice = body
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| PulseError::llm("Completion response has no choices"))?;

    let tool_calls = choice
        .message
        .tool_calls
        .into_iter()
        .enumerate()
        .map(|(index, call)| ToolCall {
            id: if call.id.is_empty() {
                format!("call_{}", index)
            } else {
                call.id
            },
            name: call.function.name,
            arguments: call.function.arguments,
        })
        .collect();

    Ok(ChatResponse {
        id: body.id,
        content: choice.message.content.unwrap_or_default(),
        tool_calls,
        finish_reason: choice.finish_reason,
        usage: body.usage,
    })
}
