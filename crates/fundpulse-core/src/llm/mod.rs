//! LLM client, message types and stream plumbing

pub mod client;
pub mod error_utils;
pub mod messages;
pub mod openai_stream;
pub mod request_builder;
pub mod sse_decoder;
pub mod streaming;
pub mod tool_accumulator;

pub use client::LlmClient;
pub use messages::{
    ChatMessage, ChatOptions, ChatResponse, MessageRole, TokenUsage, ToolCall, ToolDefinition,
};
pub use sse_decoder::{SseDecoder, SseEvent};
pub use streaming::{ChatModel, LlmEvent, STREAM_QUEUE_CAPACITY};
pub use tool_accumulator::{ToolCallAccumulator, ToolCallFragment};
