//! Tests for the LLM client against a canned endpoint

use super::LlmClient;
use crate::config::LlmSettings;
use crate::error::PulseError;
use crate::llm::messages::{ChatMessage, ChatOptions, ToolCall, ToolDefinition};
use crate::llm::streaming::{ChatModel, LlmEvent};
use crate::recovery::circuit_breaker::{
    CircuitBreakerConfig, CircuitBreakerRegistry, CircuitState,
};
use crate::test_support::{Canned, CannedServer};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn settings(base_url: &str) -> LlmSettings {
    LlmSettings {
        api_key: "sk-test-key-123456".to_string(),
        base_url: format!("{}/v1/", base_url),
        model: "test-model".to_string(),
        ..Default::default()
    }
}

fn client(base_url: &str) -> LlmClient {
    LlmClient::new(settings(base_url), &CircuitBreakerRegistry::new()).unwrap()
}

async fn collect(mut rx: tokio::sync::mpsc::Receiver<LlmEvent>) -> Vec<LlmEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn test_preflight_rejects_before_network() {
    let server = CannedServer::start(vec![Canned::json("{}")]).await;

    let no_key = LlmClient::new(
        LlmSettings {
            api_key: String::new(),
            ..settings(&server.base_url)
        },
        &CircuitBreakerRegistry::new(),
    )
    .unwrap();
    let err = no_key
        .complete(
            &[ChatMessage::user("hi")],
            &ChatOptions::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, PulseError::Config { .. }));
    assert!(err.to_string().contains("llm.api_key"));

    let err = no_key
        .stream(
            vec![ChatMessage::user("hi")],
            ChatOptions::default(),
            CancellationToken::new(),
        )
        .unwrap_err();
    assert!(matches!(err, PulseError::Config { .. }));

    let err = client(&server.base_url)
        .stream(Vec::new(), ChatOptions::default(), CancellationToken::new())
        .unwrap_err();
    assert!(matches!(err, PulseError::InvalidInput { .. }));

    assert_eq!(server.hits(), 0);
}

#[tokio::test]
async fn test_complete_parses_reply() {
    let server = CannedServer::start(vec![Canned::json(
        r#"{
            "id": "chatcmpl-1",
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_a",
                        "type": "function",
                        "function": {"name": "search_news", "arguments": "{\"query\":\"gold\"}"}
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
        }"#,
    )])
    .await;

    let options = ChatOptions::default().with_tools(vec![ToolDefinition {
        name: "search_news".to_string(),
        description: "Search news".to_string(),
        parameters: serde_json::json!({"type": "object"}),
    }]);
    let reply = client(&server.base_url)
        .complete(
            &[ChatMessage::user("gold?")],
            &options,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(reply.id.as_deref(), Some("chatcmpl-1"));
    assert_eq!(reply.content, "");
    assert_eq!(reply.finish_reason.as_deref(), Some("tool_calls"));
    assert_eq!(reply.usage.map(|u| u.total_tokens), Some(15));
    assert_eq!(
        reply.tool_calls,
        vec![ToolCall {
            id: "call_a".to_string(),
            name: "search_news".to_string(),
            arguments: "{\"query\":\"gold\"}".to_string(),
        }]
    );

    let request = server.requests().await.remove(0);
    let lower = request.to_lowercase();
    assert!(lower.starts_with("post /v1/chat/completions"));
    assert!(lower.contains("authorization: bearer sk-test-key-123456"));
    assert!(request.contains("\"model\":\"test-model\""));
    assert!(request.contains("\"stream\":false"));
}

#[tokio::test]
async fn test_status_errors_are_sanitized_and_trip_breaker() {
    let server = CannedServer::start(vec![Canned {
        status: "401 Unauthorized",
        content_type: "application/json",
        body: r#"{"error":{"message":"bad key sk-abcdefghijklmnop"}}"#.to_string(),
    }])
    .await;
    let registry = CircuitBreakerRegistry::with_config(CircuitBreakerConfig {
        failure_threshold: 2,
        open_duration: Duration::from_secs(60),
        half_open_success_threshold: 1,
    });
    let client = LlmClient::new(settings(&server.base_url), &registry).unwrap();
    let messages = [ChatMessage::user("hi")];
    let cancel = CancellationToken::new();

    for _ in 0..2 {
        let err = client
            .complete(&messages, &ChatOptions::default(), &cancel)
            .await
            .unwrap_err();
        let text = err.to_string();
        assert!(text.contains("401"));
        assert!(text.contains("bad key"));
        assert!(!text.contains("sk-abcdefghijklmnop"));
    }

    let err = client
        .complete(&messages, &ChatOptions::default(), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, PulseError::CircuitOpen { ref source_name } if source_name == "llm"));
    assert_eq!(server.hits(), 2);
    assert_eq!(registry.get("llm").state(), CircuitState::Open);
}

#[tokio::test]
async fn test_stream_delivers_content_and_tool_calls() {
    let server = CannedServer::start(vec![Canned::sse(concat!(
        "data: {\"choices\":[{\"delta\":{\"content\":\"Gold \"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"rose.\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"id\":\"call_1\",\"function\":{\"name\":\"fetch_webpage\",\"arguments\":\"{\\\"url\\\":\"}}]}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"function\":{\"arguments\":\"\\\"https://a.example\\\"}\"}}]}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"tool_calls\"}]}\n\n",
        "data: [DONE]\n\n",
    ))])
    .await;

    let rx = client(&server.base_url)
        .stream(
            vec![ChatMessage::user("gold?")],
            ChatOptions::default(),
            CancellationToken::new(),
        )
        .unwrap();
    let events = collect(rx).await;

    assert_eq!(
        events,
        vec![
            LlmEvent::Content("Gold ".to_string()),
            LlmEvent::Content("rose.".to_string()),
            LlmEvent::Finish("tool_calls".to_string()),
            LlmEvent::ToolCalls(vec![ToolCall {
                id: "call_1".to_string(),
                name: "fetch_webpage".to_string(),
                arguments: "{\"url\":\"https://a.example\"}".to_string(),
            }]),
            LlmEvent::Done,
        ]
    );

    let request = server.requests().await.remove(0);
    assert!(request.to_lowercase().contains("accept: text/event-stream"));
    assert!(request.contains("\"stream\":true"));
}

#[tokio::test]
async fn test_stream_open_failure_is_one_error_event() {
    let server = CannedServer::start(vec![Canned::status("500 Internal Server Error")]).await;

    let rx = client(&server.base_url)
        .stream(
            vec![ChatMessage::user("hi")],
            ChatOptions::default(),
            CancellationToken::new(),
        )
        .unwrap();
    let events = collect(rx).await;

    assert_eq!(events.len(), 1);
    assert!(
        matches!(&events[0], LlmEvent::Error { message, cancelled: false } if message.contains("500"))
    );
}

#[tokio::test]
async fn test_stream_cancelled_before_open() {
    let server = CannedServer::start(vec![Canned::sse("data: [DONE]\n\n")]).await;
    let cancel = CancellationToken::new();
    cancel.cancel();

    let rx = client(&server.base_url)
        .stream(vec![ChatMessage::user("hi")], ChatOptions::default(), cancel)
        .unwrap();

    assert_eq!(collect(rx).await, vec![LlmEvent::cancelled()]);
}
