//! Fundpulse core library
//!
//! Resilience and streaming layer between unreliable market-data upstreams
//! and a latency-sensitive client: per-source circuit breakers, admission
//! control, a two-tier cache, an OpenAI-compatible streaming client and the
//! AI orchestrator that turns all of it into one ordered event stream.

pub mod admission;
pub mod cache;
pub mod config;
pub mod crawler;
pub mod error;
pub mod http;
pub mod llm;
pub mod orchestrator;
pub mod recovery;
pub mod utils;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use admission::{ConnectionLimiter, KeyedRateLimiter, RateLimitPolicy, SsePermit};
pub use cache::{CacheBackend, CacheService};
pub use config::{PulseConfig, load_config};
pub use crawler::{CrawlerSet, MarketData};
pub use error::{PulseError, PulseResult};
pub use http::ResilientClient;
pub use llm::{ChatMessage, ChatModel, LlmClient, LlmEvent};
pub use orchestrator::{AiOrchestrator, AnalysisMode, AnalysisRequest, EventStream, StreamEvent};
pub use recovery::{CircuitBreaker, CircuitBreakerRegistry, CircuitState};
