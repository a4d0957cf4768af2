//! Streaming commands: wire the core together and print SSE frames

use crate::signal_handler::cancel_on_ctrl_c;
use anyhow::{Context, bail};
use fundpulse_core::admission::{ConnectionLimiter, KeyedRateLimiter};
use fundpulse_core::cache::CacheService;
use fundpulse_core::config::PulseConfig;
use fundpulse_core::crawler::CrawlerSet;
use fundpulse_core::http::ResilientClient;
use fundpulse_core::llm::{ChatMessage, LlmClient};
use fundpulse_core::orchestrator::{AiOrchestrator, AnalysisRequest, EventStream, StreamEvent};
use fundpulse_core::recovery::circuit_breaker::CircuitBreakerRegistry;
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub enum StreamRequest {
    Chat {
        history: Vec<ChatMessage>,
        message: String,
    },
    Analyze(AnalysisRequest),
    Research {
        topic: String,
    },
}

pub fn load_history(path: Option<&Path>) -> anyhow::Result<Vec<ChatMessage>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read history file {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Invalid history file {}", path.display()))
}

pub async fn run(config: &PulseConfig, client_key: &str, request: StreamRequest) -> anyhow::Result<()> {
    // A one-shot process starts with a full bucket, so this only denies when
    // the strict policy allows no request at all. No sweeper: the limiter
    // lives for a single request.
    let limiter = KeyedRateLimiter::new("ai", config.rate_limit.strict.clone());
    if !limiter.allow(client_key) {
        bail!("Rate limit exceeded for '{}'", client_key);
    }

    let slots = ConnectionLimiter::new(config.sse.max_connections);
    let Some(_permit) = slots.acquire() else {
        bail!("Too many concurrent streams");
    };

    let orchestrator = build_orchestrator(config).await?;
    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    let events = match request {
        StreamRequest::Chat { history, message } => orchestrator.chat(history, &message, &cancel)?,
        StreamRequest::Analyze(request) => orchestrator.analyze(request, &cancel),
        StreamRequest::Research { topic } => orchestrator.deep_research(&topic, &cancel)?,
    };

    let result = print_events(events).await;
    cancel.cancel();
    result
}

async fn build_orchestrator(config: &PulseConfig) -> anyhow::Result<AiOrchestrator> {
    let breakers = Arc::new(CircuitBreakerRegistry::with_config(
        config.breaker.to_breaker_config(),
    ));
    let http = ResilientClient::new(&config.http)?;
    let crawlers = Arc::new(CrawlerSet::new(http, breakers.clone(), config.sources.clone()));
    let cache = CacheService::connect(&config.cache).await;
    let llm = Arc::new(LlmClient::new(config.llm.clone(), &breakers)?);

    info!(cache = %cache.backend(), model = %config.llm.model, "Services ready");
    Ok(AiOrchestrator::new(config, llm, crawlers, cache))
}

/// Write every event as an SSE frame; a terminal error becomes the exit error
async fn print_events(mut events: EventStream) -> anyhow::Result<()> {
    let mut stdout = tokio::io::stdout();
    let mut failure = None;

    while let Some(event) = events.recv().await {
        stdout.write_all(event.to_sse_frame()?.as_bytes()).await?;
        stdout.flush().await?;
        if let StreamEvent::Error { message } = &event {
            failure = Some(message.clone());
        }
        if event.is_terminal() {
            break;
        }
    }

    match failure {
        Some(message) => bail!("Stream failed: {}", message),
        None => {
            debug!("Stream completed");
            Ok(())
        }
    }
}
