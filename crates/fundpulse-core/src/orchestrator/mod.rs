//! AI orchestrator
//!
//! Turns chat, analysis and deep-research requests into ordered
//! [`StreamEvent`] streams. Every request runs on its own task and talks to
//! its consumer through a bounded queue; see [`EventSink`] and
//! [`EventStream`].

mod context;
mod events;
mod prompts;
mod research;
mod sink;
mod stream;
mod tools;


pub use context::{AnalysisMode, AnalysisRequest, ContextSection, MarketContext};
pub use events::StreamEvent;
pub use sink::EventSink;
pub use stream::EventStream;
pub use tools::{FETCH_WEBPAGE, SEARCH_NEWS, ToolExecutor, research_tools};

use crate::cache::CacheService;
use crate::config::{CacheSettings, OrchestratorSettings, PulseConfig};
use crate::crawler::MarketData;
use crate::error::{PulseError, PulseResult};
use crate::llm::{ChatMessage, ChatModel, ChatOptions, MessageRole};
use context::ContextBuilder;
use research::{relay_turn, run_research};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, info_span};
use uuid::Uuid;

#[derive(Clone)]
pub struct AiOrchestrator {
    model: Arc<dyn ChatModel>,
    market: Arc<dyn MarketData>,
    cache: CacheService,
    settings: OrchestratorSettings,
    cache_settings: CacheSettings,
}

impl AiOrchestrator {
    pub fn new(
        config: &PulseConfig,
        model: Arc<dyn ChatModel>,
        market: Arc<dyn MarketData>,
        cache: CacheService,
    ) -> Self {
        Self {
            model,
            market,
            cache,
            settings: config.orchestrator.clone(),
            cache_settings: config.cache.clone(),
        }
    }

    /// Continue a conversation. `history` holds the prior turns, oldest first.
    pub fn chat(
        &self,
        history: Vec<ChatMessage>,
        message: &str,
        cancel: &CancellationToken,
    ) -> PulseResult<EventStream> {
        let message = require_text(message, "message")?;
        let (rx, mut sink) = self.open_stream(cancel);
        let this = self.clone();
        tokio::spawn(
            async move {
                let result = this.run_chat(history, message, &mut sink).await;
                sink.finish(result).await;
            }
            .instrument(info_span!("chat", request_id = %Uuid::new_v4())),
        );
        Ok(rx)
    }

    /// Market analysis over freshly gathered context
    pub fn analyze(
        &self,
        request: AnalysisRequest,
        cancel: &CancellationToken,
    ) -> EventStream {
        let (rx, mut sink) = self.open_stream(cancel);
        let this = self.clone();
        let span = info_span!(
            "analysis",
            request_id = %Uuid::new_v4(),
            mode = ?request.mode,
            funds = request.fund_codes.len()
        );
        tokio::spawn(
            async move {
                let result = this.run_analysis(request, &mut sink).await;
                sink.finish(result).await;
            }
            .instrument(span),
        );
        rx
    }

    /// Tool-using research on `topic`, bounded by the configured round cap
    pub fn deep_research(
        &self,
        topic: &str,
        cancel: &CancellationToken,
    ) -> PulseResult<EventStream> {
        let topic = require_text(topic, "topic")?;
        let (rx, mut sink) = self.open_stream(cancel);
        let this = self.clone();
        tokio::spawn(
            async move {
                let result = this.run_deep_research(topic, &mut sink).await;
                sink.finish(result).await;
            }
            .instrument(info_span!("research", request_id = %Uuid::new_v4())),
        );
        Ok(rx)
    }

    /// The worker gets a child token so a consumer hangup cancels only it
    fn open_stream(&self, cancel: &CancellationToken) -> (EventStream, EventSink) {
        let (tx, rx) = mpsc::channel(self.settings.queue_capacity);
        let token = cancel.child_token();
        let sink = EventSink::new(tx, self.settings.send_grace(), token.clone());
        (EventStream::new(rx, token), sink)
    }

    async fn run_chat(
        &self,
        history: Vec<ChatMessage>,
        message: String,
        sink: &mut EventSink,
    ) -> PulseResult<()> {
        let cancel = sink.cancel_token().clone();
        let mut messages = Vec::with_capacity(history.len() + 2);
        if history.first().map(|m| m.role) != Some(MessageRole::System) {
            messages.push(ChatMessage::system(prompts::CHAT_SYSTEM_PROMPT));
        }
        messages.extend(history);
        messages.push(ChatMessage::user(message));

        let rx = self.model.stream(messages, ChatOptions::default(), cancel)?;
        relay_turn(rx, sink).await.map(|_| ())
    }

    async fn run_analysis(&self, request: AnalysisRequest, sink: &mut EventSink) -> PulseResult<()> {
        let cancel = sink.cancel_token().clone();
        if !sink.send(StreamEvent::status("Gathering market data")).await {
            return Err(PulseError::Cancelled);
        }

        let builder = ContextBuilder {
            market: self.market.as_ref(),
            cache: &self.cache,
            limits: &self.settings,
            ttl: &self.cache_settings,
        };
        let context = builder.gather(&request, &cancel).await?;

        if !sink.send(StreamEvent::status("Generating analysis")).await {
            return Err(PulseError::Cancelled);
        }
        let messages = vec![
            ChatMessage::system(prompts::analysis_system_prompt(request.mode)),
            ChatMessage::user(prompts::analysis_user_prompt(
                &context.to_markdown(),
                request.question.as_deref(),
            )),
        ];
        let rx = self.model.stream(messages, ChatOptions::default(), cancel)?;
        relay_turn(rx, sink).await.map(|_| ())
    }

    async fn run_deep_research(&self, topic: String, sink: &mut EventSink) -> PulseResult<()> {
        let cancel = sink.cancel_token().clone();
        if !sink.send(StreamEvent::status("Starting research")).await {
            return Err(PulseError::Cancelled);
        }

        let tools = ToolExecutor::new(
            self.market.clone(),
            self.settings.research_news_limit,
            self.settings.tool_result_max_chars,
        );
        let options = ChatOptions {
            tools: research_tools(),
            tool_choice: Some("auto".to_string()),
            ..Default::default()
        };
        let messages = vec![
            ChatMessage::system(prompts::RESEARCH_SYSTEM_PROMPT),
            ChatMessage::user(prompts::research_user_prompt(&topic)),
        ];

        run_research(
            self.model.as_ref(),
            &tools,
            messages,
            &options,
            self.settings.max_research_rounds,
            sink,
            &cancel,
        )
        .await
    }
}

impl std::fmt::Debug for AiOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiOrchestrator")
            .field("cache", &self.cache)
            .field("settings", &self.settings)
            .finish()
    }
}

fn require_text(value: &str, field: &str) -> PulseResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PulseError::invalid_input_field(
            format!("{} must not be empty", field),
            field,
        ));
    }
    Ok(trimmed.to_string())
}
