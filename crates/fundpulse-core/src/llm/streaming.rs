//! Streaming contract shared by model clients and their consumers

use super::messages::{ChatMessage, ChatOptions, ChatResponse, ToolCall};
use crate::error::PulseResult;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Capacity of the queue between the stream worker and its consumer
pub const STREAM_QUEUE_CAPACITY: usize = 100;

/// One item of a model stream. `Done` and `Error` are terminal.
#[derive(Debug, Clone, PartialEq)]
pub enum LlmEvent {
    /// Content delta, in generation order
    Content(String),
    /// All tool calls of the turn, complete, emitted once at stream end
    ToolCalls(Vec<ToolCall>),
    /// Finish reason reported by the provider; not terminal by itself
    Finish(String),
    Done,
    Error { message: String, cancelled: bool },
}

impl LlmEvent {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
            cancelled: false,
        }
    }

    pub fn cancelled() -> Self {
        Self::Error {
            message: crate::error::PulseError::Cancelled.to_string(),
            cancelled: true,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error { .. })
    }
}

/// A chat model reachable one-shot or as a stream
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Blocking completion
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
        cancel: &CancellationToken,
    ) -> PulseResult<ChatResponse>;

    /// Start a stream. Validation errors are returned here, before any
    /// network call; everything after that arrives on the receiver, which
    /// always ends with exactly one terminal event unless the receiver is
    /// dropped first.
    fn stream(
        &self,
        messages: Vec<ChatMessage>,
        options: ChatOptions,
        cancel: CancellationToken,
    ) -> PulseResult<mpsc::Receiver<LlmEvent>>;
}
