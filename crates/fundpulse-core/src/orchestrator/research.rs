//! Model turns and the bounded research loop

use super::events::StreamEvent;
use super::sink::EventSink;
use super::tools::ToolExecutor;
use crate::error::{PulseError, PulseResult};
use crate::llm::{ChatMessage, ChatModel, ChatOptions, LlmEvent, ToolCall};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// What one streamed model turn produced
#[derive(Debug, Default)]
pub(super) struct Turn {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
}

/// Forward a model stream to the sink until its terminal event.
///
/// Content is relayed live. A model error ends the turn with an error;
/// cancellation stops reading at once, leaving unread deltas behind. What
/// was already relayed stays relayed.
pub(super) async fn relay_turn(
    mut rx: mpsc::Receiver<LlmEvent>,
    sink: &mut EventSink,
) -> PulseResult<Turn> {
    let cancel = sink.cancel_token().clone();
    let mut turn = Turn::default();
    loop {
        let event = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PulseError::Cancelled),
            event = rx.recv() => event,
        };
        let Some(event) = event else {
            break;
        };
        match event {
            LlmEvent::Content(chunk) => {
                turn.content.push_str(&chunk);
                if !sink.send(StreamEvent::content(chunk)).await {
                    return Err(PulseError::Cancelled);
                }
            }
            LlmEvent::ToolCalls(calls) => turn.tool_calls.extend(calls),
            LlmEvent::Finish(reason) => debug!(%reason, "Model turn finished"),
            LlmEvent::Done => return Ok(turn),
            LlmEvent::Error {
                cancelled: true, ..
            } => return Err(PulseError::Cancelled),
            LlmEvent::Error { message, .. } => return Err(PulseError::llm(message)),
        }
    }
    Err(PulseError::llm("Model stream ended unexpectedly"))
}

/// Bounded agent loop.
///
/// Each round streams one model turn. Tool calls are announced, executed in
/// order and appended as tool results before the next round. Ends when a
/// turn asks for no tools, on cancellation, or after `max_rounds` turns.
pub(super) async fn run_research(
    model: &dyn ChatModel,
    tools: &ToolExecutor,
    mut messages: Vec<ChatMessage>,
    options: &ChatOptions,
    max_rounds: u32,
    sink: &mut EventSink,
    cancel: &CancellationToken,
) -> PulseResult<()> {
    for round in 1..=max_rounds {
        if cancel.is_cancelled() {
            return Err(PulseError::Cancelled);
        }
        if round > 1 {
            let status = StreamEvent::status(format!("Continuing research (round {})", round));
            if !sink.send(status).await {
                return Err(PulseError::Cancelled);
            }
        }

        let rx = model.stream(messages.clone(), options.clone(), cancel.clone())?;
        let turn = relay_turn(rx, sink).await?;
        if turn.tool_calls.is_empty() {
            info!(round, "Research complete");
            return Ok(());
        }
        if round == max_rounds {
            break;
        }

        let names: Vec<String> = turn.tool_calls.iter().map(|c| c.name.clone()).collect();
        debug!(round, tools = ?names, "Executing tool calls");
        let announced = sink
            .send(StreamEvent::ToolCall {
                message: format!("Calling tools: {}", names.join(", ")),
                tools: names,
            })
            .await;
        if !announced {
            return Err(PulseError::Cancelled);
        }

        messages.push(ChatMessage::assistant_with_tools(
            turn.content,
            turn.tool_calls.clone(),
        ));
        for call in &turn.tool_calls {
            let result = tools.execute(call, cancel).await?;
            messages.push(ChatMessage::tool_result(call, result));
        }
    }

    warn!(max_rounds, "Research stopped at round cap");
    sink.send(StreamEvent::status(format!(
        "Research stopped after {} rounds; the answer may be incomplete",
        max_rounds
    )))
    .await;
    Err(PulseError::ResearchTruncated { rounds: max_rounds })
}
