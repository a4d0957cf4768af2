//! OpenAI-compatible request bodies

use super::messages::{ChatMessage, ChatOptions, ToolDefinition};
use crate::config::LlmSettings;
use serde_json::{Value, json};

/// Build a chat completion request body.
///
/// Per-call options win over the client's configured defaults.
pub fn build_chat_request_body(
    settings: &LlmSettings,
    messages: &[ChatMessage],
    options: &ChatOptions,
    stream: bool,
) -> Value {
    let mut body = json!({
        "model": settings.model,
        "messages": messages.iter().map(message_to_wire).collect::<Vec<_>>(),
        "stream": stream,
    });

    if let Some(temperature) = options.temperature.or(settings.temperature) {
        body["temperature"] = json!(temperature);
    }
    if let Some(max_tokens) = options.max_tokens.or(settings.max_tokens) {
        body["max_tokens"] = json!(max_tokens);
    }
    if !options.tools.is_empty() {
        body["tools"] = json!(options.tools.iter().map(tool_to_wire).collect::<Vec<_>>());
        if let Some(choice) = &options.tool_choice {
            body["tool_choice"] = json!(choice);
        }
    }

    body
}

fn message_to_wire(message: &ChatMessage) -> Value {
    let mut msg = json!({
        "role": message.role.to_string(),
        "content": message.content,
    });

    if !message.tool_calls.is_empty() {
        msg["tool_calls"] = json!(
            message
                .tool_calls
                .iter()
                .map(|tc| json!({
                    "id": tc.id,
                    "type": "function",
                    "function": {
                        "name": tc.name,
                        "arguments": tc.arguments,
                    }
                }))
                .collect::<Vec<_>>()
        );
    }
    if let Some(tool_call_id) = &message.tool_call_id {
        msg["tool_call_id"] = json!(tool_call_id);
    }
    if let Some(name) = &message.name {
        msg["name"] = json!(name);
    }
    msg
}

fn tool_to_wire(tool: &ToolDefinition) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": tool.name,
            "description": tool.description,
            "parameters": tool.parameters,
        }
    })
}
