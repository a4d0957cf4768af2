//! Streaming chat support

use super::types::LlmClient;
use crate::error::{PulseError, PulseResult};
use crate::llm::messages::{ChatMessage, ChatOptions, ChatResponse};
use crate::llm::openai_stream::pump_sse_stream;
use crate::llm::request_builder::build_chat_request_body;
use crate::llm::streaming::{ChatModel, LlmEvent, STREAM_QUEUE_CAPACITY};
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info_span, warn};

#[async_trait]
impl ChatModel for LlmClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
        cancel: &CancellationToken,
    ) -> PulseResult<ChatResponse> {
        self.complete_once(messages, options, cancel).await
    }

    /// Start a streaming completion.
    ///
    /// The breaker guards opening the stream (connect plus status check);
    /// failures after the first byte are reported on the channel only.
    fn stream(
        &self,
        messages: Vec<ChatMessage>,
        options: ChatOptions,
        cancel: CancellationToken,
    ) -> PulseResult<mpsc::Receiver<LlmEvent>> {
        self.preflight(&messages)?;
        let body = build_chat_request_body(&self.settings, &messages, &options, true);
        let (tx, rx) = mpsc::channel(STREAM_QUEUE_CAPACITY);

        let client = self.clone();
        let span = info_span!(
            "llm_stream",
            provider = %self.settings.provider,
            model = %self.settings.model
        );
        tokio::spawn(
            async move {
                let open = client.breaker.call(|| client.post(&body, true));
                let response = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        let _ = tx.send(LlmEvent::cancelled()).await;
                        return;
                    }
                    result = open => result,
                };

                let response = match response.map_err(PulseError::from) {
                    Ok(response) => response,
                    Err(e) => {
                        warn!(error = %e, "Failed to open LLM stream");
                        let _ = tx.send(LlmEvent::error(e.to_string())).await;
                        return;
                    }
                };

                debug!("LLM stream opened");
                pump_sse_stream(
                    response.bytes_stream(),
                    &tx,
                    &cancel,
                    client.settings.stream_idle_timeout(),
                )
                .await;
            }
            .instrument(span),
        );

        Ok(rx)
    }
}
