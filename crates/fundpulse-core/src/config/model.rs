//! Configuration model
//!
//! Every section defaults sensibly so an empty file (or no file) yields a
//! usable configuration apart from LLM credentials.

use super::logging_config::LoggingConfig;
use super::timeouts;
use crate::admission::RateLimitPolicy;
use crate::recovery::circuit_breaker::CircuitBreakerConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PulseConfig {
    pub llm: LlmSettings,
    pub http: HttpSettings,
    pub breaker: BreakerSettings,
    pub cache: CacheSettings,
    pub rate_limit: RateLimitSettings,
    pub sse: SseSettings,
    pub sources: SourceSettings,
    pub orchestrator: OrchestratorSettings,
    pub logging: LoggingConfig,
}

/// OpenAI-compatible provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Name used in logs and in the provider's breaker
    pub provider: String,
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub stream_idle_timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            api_key: String::new(),
            base_url: DEFAULT_LLM_BASE_URL.to_string(),
            model: String::new(),
            temperature: Some(0.7),
            max_tokens: None,
            connect_timeout_secs: timeouts::llm::CONNECTION_SECS,
            request_timeout_secs: timeouts::llm::REQUEST_SECS,
            stream_idle_timeout_secs: timeouts::llm::STREAM_IDLE_SECS,
        }
    }
}

/// Default OpenAI-compatible endpoint
pub(crate) const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";

impl LlmSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn stream_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.stream_idle_timeout_secs)
    }
}

/// Settings for the shared crawler HTTP client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Extra headers injected into every crawler request
    pub headers: HashMap<String, String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: timeouts::network::HTTP_REQUEST_SECS,
            user_agent: concat!("fundpulse/", env!("CARGO_PKG_VERSION")).to_string(),
            headers: HashMap::new(),
        }
    }
}

impl HttpSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Circuit breaker thresholds applied to every upstream source
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakerSettings {
    pub failure_threshold: u32,
    pub open_duration_secs: u64,
    pub half_open_success_threshold: u32,
}

impl Default for BreakerSettings {
    fn default() -> Self {
        let defaults = CircuitBreakerConfig::default();
        Self {
            failure_threshold: defaults.failure_threshold,
            open_duration_secs: defaults.open_duration.as_secs(),
            half_open_success_threshold: defaults.half_open_success_threshold,
        }
    }
}

impl BreakerSettings {
    pub fn to_breaker_config(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: self.failure_threshold,
            open_duration: Duration::from_secs(self.open_duration_secs),
            half_open_success_threshold: self.half_open_success_threshold,
        }
    }
}

/// Cache tier selection and TTLs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Shared tier address; when absent or unreachable at startup the
    /// process-local tier is used for the whole process lifetime
    pub redis_url: Option<String>,
    pub connect_timeout_ms: u64,
    pub key_prefix: String,
    /// Entry count past which the local tier purges expired entries on write
    pub max_local_entries: usize,
    pub market_ttl_secs: u64,
    pub news_ttl_secs: u64,
    pub fund_ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            redis_url: None,
            connect_timeout_ms: timeouts::cache::CONNECT_MILLIS,
            key_prefix: "fundpulse:".to_string(),
            max_local_entries: 10_000,
            market_ttl_secs: 60,
            news_ttl_secs: 300,
            fund_ttl_secs: 60,
        }
    }
}

impl CacheSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn market_ttl(&self) -> Duration {
        Duration::from_secs(self.market_ttl_secs)
    }

    pub fn news_ttl(&self) -> Duration {
        Duration::from_secs(self.news_ttl_secs)
    }

    pub fn fund_ttl(&self) -> Duration {
        Duration::from_secs(self.fund_ttl_secs)
    }
}

/// Inbound rate-limit policies
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    /// Policy for general traffic
    pub general: RateLimitPolicy,
    /// Policy for authentication and AI endpoints
    pub strict: RateLimitPolicy,
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            general: RateLimitPolicy::general(),
            strict: RateLimitPolicy::strict(),
            sweep_interval_secs: 60,
        }
    }
}

impl RateLimitSettings {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

/// Concurrent streaming session bound
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SseSettings {
    pub max_connections: usize,
}

impl Default for SseSettings {
    fn default() -> Self {
        Self {
            max_connections: 50,
        }
    }
}

/// Upstream endpoints. An empty URL disables that source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    pub indices_url: String,
    pub metals_url: String,
    pub news_url: String,
    pub news_search_url: String,
    pub sectors_url: String,
    pub funds_url: String,
    /// Characters of readable text kept from a fetched webpage
    pub webpage_max_chars: usize,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            indices_url: String::new(),
            metals_url: String::new(),
            news_url: String::new(),
            news_search_url: String::new(),
            sectors_url: String::new(),
            funds_url: String::new(),
            webpage_max_chars: 8_000,
        }
    }
}

/// Orchestrator limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorSettings {
    pub max_research_rounds: u32,
    pub queue_capacity: usize,
    pub send_grace_ms: u64,
    pub standard_news_limit: usize,
    pub fast_news_limit: usize,
    pub standard_sector_limit: usize,
    pub fast_sector_limit: usize,
    pub research_news_limit: usize,
    pub tool_result_max_chars: usize,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            max_research_rounds: 5,
            queue_capacity: 100,
            send_grace_ms: timeouts::stream::SEND_GRACE_MILLIS,
            standard_news_limit: 10,
            fast_news_limit: 3,
            standard_sector_limit: 10,
            fast_sector_limit: 5,
            research_news_limit: 5,
            tool_result_max_chars: 6_000,
        }
    }
}

impl OrchestratorSettings {
    pub fn send_grace(&self) -> Duration {
        Duration::from_millis(self.send_grace_ms)
    }
}
