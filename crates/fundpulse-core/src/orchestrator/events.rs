//! Outbound stream events

use crate::error::PulseResult;
use serde::{Deserialize, Serialize};

/// One event of an orchestrated stream, as sent to the transport layer.
///
/// Serialized as `{"type": "...", ...}`. `Done` and `Error` are terminal and
/// appear exactly once, last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    Status { message: String },
    Content { chunk: String },
    ToolCall { message: String, tools: Vec<String> },
    Done,
    Error { message: String },
}

impl StreamEvent {
    pub fn status(message: impl Into<String>) -> Self {
        Self::Status {
            message: message.into(),
        }
    }

    pub fn content(chunk: impl Into<String>) -> Self {
        Self::Content {
            chunk: chunk.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error { .. })
    }

    /// Encode as one SSE frame: `data: <json>\n\n`
    pub fn to_sse_frame(&self) -> PulseResult<String> {
        Ok(format!("data: {}\n\n", serde_json::to_string(self)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shape() {
        let frame = StreamEvent::ToolCall {
            message: "Calling search_news".to_string(),
            tools: vec!["search_news".to_string()],
        }
        .to_sse_frame()
        .unwrap();
        assert_eq!(
            frame,
            "data: {\"type\":\"tool_call\",\"message\":\"Calling search_news\",\"tools\":[\"search_news\"]}\n\n"
        );

        assert_eq!(
            StreamEvent::Done.to_sse_frame().unwrap(),
            "data: {\"type\":\"done\"}\n\n"
        );
        assert_eq!(
            serde_json::to_value(StreamEvent::content("hi")).unwrap(),
            serde_json::json!({"type": "content", "chunk": "hi"})
        );
    }

    #[test]
    fn test_terminal_events() {
        assert!(StreamEvent::Done.is_terminal());
        assert!(StreamEvent::error("x").is_terminal());
        assert!(!StreamEvent::status("x").is_terminal());
        assert!(!StreamEvent::content("x").is_terminal());
    }
}
