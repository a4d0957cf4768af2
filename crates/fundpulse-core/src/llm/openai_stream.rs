//! OpenAI-compatible stream parsing
//!
//! Turns a byte stream of `data: <json>` frames into [`LlmEvent`]s on a
//! bounded channel, accumulating tool-call fragments until `[DONE]`.

use super::error_utils::stream_error_message;
use super::sse_decoder::{SseDecoder, SseEvent};
use super::streaming::LlmEvent;
use super::tool_accumulator::{ToolCallAccumulator, ToolCallFragment};
use futures::{Stream, StreamExt};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Option<StreamDelta>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCallFragment>>,
}

/// Whether the pump should keep reading
enum Flow {
    Continue,
    Stop,
}

struct StreamPump<'a> {
    tx: &'a mpsc::Sender<LlmEvent>,
    cancel: &'a CancellationToken,
    tools: ToolCallAccumulator,
    saw_finish: bool,
}

impl StreamPump<'_> {
    /// Send one event. Stops when the consumer is gone or cancellation was
    /// requested, in which case nothing but the cancellation error is sent.
    async fn emit(&mut self, event: LlmEvent) -> Flow {
        if self.cancel.is_cancelled() {
            self.abort_cancelled().await;
            return Flow::Stop;
        }
        match self.tx.send(event).await {
            Ok(()) => Flow::Continue,
            Err(_) => {
                debug!("Stream consumer went away");
                Flow::Stop
            }
        }
    }

    async fn abort_cancelled(&mut self) {
        self.tools.discard();
        let _ = self.tx.send(LlmEvent::cancelled()).await;
    }

    async fn fail(&mut self, message: String) {
        self.tools.discard();
        let _ = self.tx.send(LlmEvent::error(message)).await;
    }

    /// `[DONE]`: flush accumulated tool calls then terminate
    async fn complete(&mut self) {
        let calls = self.tools.finish();
        if !calls.is_empty() {
            if let Flow::Stop = self.emit(LlmEvent::ToolCalls(calls)).await {
                return;
            }
        }
        let _ = self.emit(LlmEvent::Done).await;
    }

    async fn handle(&mut self, event: SseEvent) -> Flow {
        if event.is_done() {
            self.complete().await;
            return Flow::Stop;
        }

        let value: serde_json::Value = match serde_json::from_str(&event.data) {
            Ok(value) => value,
            Err(e) => {
                debug!(error = %e, "Skipping undecodable stream chunk");
                return Flow::Continue;
            }
        };
        if let Some(message) = stream_error_message(&value) {
            self.fail(format!("Provider stream error: {}", message)).await;
            return Flow::Stop;
        }
        let chunk: StreamChunk = match serde_json::from_value(value) {
            Ok(chunk) => chunk,
            Err(e) => {
                debug!(error = %e, "Skipping malformed stream chunk");
                return Flow::Continue;
            }
        };

        for choice in chunk.choices {
            let delta = choice.delta.unwrap_or_default();
            if let Some(content) = delta.content.filter(|c| !c.is_empty()) {
                if let Flow::Stop = self.emit(LlmEvent::Content(content)).await {
                    return Flow::Stop;
                }
            }
            for fragment in delta.tool_calls.unwrap_or_default() {
                self.tools.push(fragment);
            }
            if let Some(reason) = choice.finish_reason.filter(|r| !r.is_empty()) {
                self.saw_finish = true;
                if let Flow::Stop = self.emit(LlmEvent::Finish(reason)).await {
                    return Flow::Stop;
                }
            }
        }
        Flow::Continue
    }
}

/// Read `body` to completion, cancellation, error or idle timeout.
///
/// Cancellation is checked before every read; once observed, one
/// cancellation error is sent and no further reads happen.
pub async fn pump_sse_stream<S, B, E>(
    body: S,
    tx: &mpsc::Sender<LlmEvent>,
    cancel: &CancellationToken,
    idle_timeout: Duration,
) where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    let mut body = std::pin::pin!(body);
    let mut decoder = SseDecoder::new();
    let mut pump = StreamPump {
        tx,
        cancel,
        tools: ToolCallAccumulator::new(),
        saw_finish: false,
    };

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                pump.abort_cancelled().await;
                return;
            }
            next = tokio::time::timeout(idle_timeout, body.next()) => next,
        };

        let events = match next {
            Err(_) => {
                warn!(idle_secs = idle_timeout.as_secs(), "LLM stream went idle");
                pump.fail(format!(
                    "Stream idle for more than {} seconds",
                    idle_timeout.as_secs()
                ))
                .await;
                return;
            }
            Ok(Some(Ok(bytes))) => decoder.feed(bytes.as_ref()),
            Ok(Some(Err(e))) => {
                pump.fail(format!("Stream read failed: {}", e)).await;
                return;
            }
            Ok(None) => {
                let tail = decoder.finish();
                for event in tail {
                    if let Flow::Stop = pump.handle(event).await {
                        return;
                    }
                }
                // Ended without [DONE]: a finish reason means the turn was
                // complete and only the terminator is missing
                if pump.saw_finish {
                    pump.complete().await;
                } else {
                    pump.fail("Stream ended before completion".to_string()).await;
                }
                return;
            }
        };

        for event in events {
            if let Flow::Stop = pump.handle(event).await {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::messages::ToolCall;
    use futures::stream;

    async fn run(frames: Vec<&'static str>) -> Vec<LlmEvent> {
        let body = stream::iter(
            frames
                .into_iter()
                .map(|f| Ok::<_, std::io::Error>(f.as_bytes().to_vec())),
        );
        let (tx, mut rx) = mpsc::channel(100);
        pump_sse_stream(body, &tx, &CancellationToken::new(), Duration::from_secs(5)).await;
        drop(tx);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_content_then_done() {
        let events = run(vec![
            "data:{\"choices\":[{\"delta\":{\"content\":\"Hello\"}}]}\n\n",
            "data:{\"choices\":[{\"delta\":{\"content\":\"!\"}}]}\n\n",
            "data:[DONE]\n\n",
        ])
        .await;

        assert_eq!(
            events,
            vec![
                LlmEvent::Content("Hello".to_string()),
                LlmEvent::Content("!".to_string()),
                LlmEvent::Done,
            ]
        );
    }

    #[tokio::test]
    async fn test_tool_call_fragments_flush_at_done() {
        let events = run(vec![
            "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"id\":\"call_1\",\"function\":{\"name\":\"search_news\",\"arguments\":\"{\\\"query\\\":\"}}]}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"id\":\"\",\"function\":{\"arguments\":\"\\\"gold\\\"}\"}}]}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"tool_calls\"}]}\n\n",
            "data: [DONE]\n\n",
        ])
        .await;

        assert_eq!(
            events,
            vec![
                LlmEvent::Finish("tool_calls".to_string()),
                LlmEvent::ToolCalls(vec![ToolCall {
                    id: "call_1".to_string(),
                    name: "search_news".to_string(),
                    arguments: "{\"query\":\"gold\"}".to_string(),
                }]),
                LlmEvent::Done,
            ]
        );
    }

    #[tokio::test]
    async fn test_frames_split_across_chunks_and_noise_skipped() {
        let events = run(vec![
            ": ping\n\nevent: message\ndata: {\"choices\":[{\"delta\":{\"con",
            "tent\":\"a\"}}]}\n\ndata: not-json\n\ndata: {\"choices\":[{\"delta\":{\"content\":\"\"}}]}\n\n",
            "data: [DONE]",
        ])
        .await;

        assert_eq!(events, vec![LlmEvent::Content("a".to_string()), LlmEvent::Done]);
    }

    #[tokio::test]
    async fn test_read_error_ends_stream() {
        let body = stream::iter(vec![
            Ok(b"data: {\"choices\":[{\"delta\":{\"content\":\"x\"}}]}\n\n".to_vec()),
            Err("connection reset"),
        ]);
        let (tx, mut rx) = mpsc::channel(100);
        pump_sse_stream(body, &tx, &CancellationToken::new(), Duration::from_secs(5)).await;

        assert_eq!(rx.recv().await, Some(LlmEvent::Content("x".to_string())));
        match rx.recv().await {
            Some(LlmEvent::Error { message, cancelled }) => {
                assert!(message.contains("connection reset"));
                assert!(!cancelled);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_provider_error_chunk_ends_stream() {
        let events = run(vec![
            "data: {\"error\":{\"message\":\"rate limited\",\"api_key\":\"sk-abcdefghijkl\"}}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"late\"}}]}\n\n",
        ])
        .await;

        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], LlmEvent::Error { message, .. } if message.contains("rate limited")));
    }

    #[tokio::test]
    async fn test_eof_without_done() {
        let truncated = run(vec!["data: {\"choices\":[{\"delta\":{\"content\":\"par\"}}]}\n\n"]).await;
        assert!(matches!(truncated.last(), Some(LlmEvent::Error { cancelled: false, .. })));

        let finished = run(vec![
            "data: {\"choices\":[{\"delta\":{\"content\":\"ok\"},\"finish_reason\":\"stop\"}]}\n\n",
        ])
        .await;
        assert_eq!(finished.last(), Some(&LlmEvent::Done));
    }

    #[tokio::test]
    async fn test_cancel_mid_stream() {
        let (body_tx, body_rx) = mpsc::channel::<Result<Vec<u8>, std::io::Error>>(4);
        let body = tokio_stream_from(body_rx);
        let (tx, mut rx) = mpsc::channel(100);
        let cancel = CancellationToken::new();

        let worker_cancel = cancel.clone();
        let worker = tokio::spawn(async move {
            pump_sse_stream(body, &tx, &worker_cancel, Duration::from_secs(30)).await;
        });

        body_tx
            .send(Ok(b"data: {\"choices\":[{\"delta\":{\"content\":\"one\"}}]}\n\n".to_vec()))
            .await
            .unwrap();
        assert_eq!(rx.recv().await, Some(LlmEvent::Content("one".to_string())));

        cancel.cancel();
        worker.await.unwrap();
        // Anything the upstream sends afterwards is never read
        let _ = body_tx
            .send(Ok(b"data: {\"choices\":[{\"delta\":{\"content\":\"two\"}}]}\n\n".to_vec()))
            .await;

        assert_eq!(rx.recv().await, Some(LlmEvent::cancelled()));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_timeout_is_an_error() {
        let (_body_tx, body_rx) = mpsc::channel::<Result<Vec<u8>, std::io::Error>>(1);
        let (tx, mut rx) = mpsc::channel(100);

        pump_sse_stream(
            tokio_stream_from(body_rx),
            &tx,
            &CancellationToken::new(),
            Duration::from_secs(3),
        )
        .await;

        match rx.recv().await {
            Some(LlmEvent::Error { message, cancelled }) => {
                assert!(message.contains("idle"));
                assert!(!cancelled);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    fn tokio_stream_from<T>(mut rx: mpsc::Receiver<T>) -> impl Stream<Item = T> {
        futures::stream::poll_fn(move |cx| rx.poll_recv(cx))
    }
}
