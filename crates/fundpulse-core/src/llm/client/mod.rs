//! OpenAI-compatible LLM client
//!
//! One-shot completions and cancellable streams against any endpoint that
//! speaks the `/chat/completions` protocol, guarded by the `llm` circuit
//! breaker.

mod chat;
mod constructor;
mod streaming;
#[cfg(test)]
mod tests;
mod types;

pub use types::LlmClient;
