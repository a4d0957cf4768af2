//! Bounded hand-off between an orchestrator worker and its consumer

use super::events::StreamEvent;
use crate::error::PulseResult;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Producer half of an orchestrated stream.
///
/// A slow consumer gets `grace` to make room for each event; after that the
/// event is dropped and counted rather than stalling the worker. One queue
/// slot is reserved up front for the terminal event, so it is never dropped.
/// A consumer that hung up cancels the worker, and nothing but the terminal
/// event is accepted after cancellation. Exactly one terminal event is sent,
/// by [`EventSink::finish`] or, failing that, on drop.
#[derive(Debug)]
pub struct EventSink {
    tx: mpsc::Sender<StreamEvent>,
    terminal: Option<mpsc::OwnedPermit<StreamEvent>>,
    grace: Duration,
    cancel: CancellationToken,
    dropped: u64,
    finished: bool,
}

impl EventSink {
    /// Takes one slot of `tx`'s capacity for the terminal event
    pub fn new(tx: mpsc::Sender<StreamEvent>, grace: Duration, cancel: CancellationToken) -> Self {
        let terminal = tx.clone().try_reserve_owned().ok();
        if terminal.is_none() {
            debug!("No free slot to reserve for the terminal event");
        }
        Self {
            tx,
            terminal,
            grace,
            cancel,
            dropped: 0,
            finished: false,
        }
    }

    /// Events dropped so far because the consumer did not keep up
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Deliver a non-terminal event. Returns false once the consumer is gone
    /// or the stream was cancelled.
    pub async fn send(&mut self, event: StreamEvent) -> bool {
        if self.finished || self.cancel.is_cancelled() {
            return false;
        }
        self.deliver(event).await
    }

    /// Send the terminal event for `result`
    pub async fn finish(&mut self, result: PulseResult<()>) {
        if self.finished {
            return;
        }
        let event = match result {
            Ok(()) => StreamEvent::Done,
            Err(e) => {
                if !e.is_cancelled() {
                    warn!(code = e.code(), error = %e, "Stream failed");
                }
                StreamEvent::error(e.to_string())
            }
        };
        self.deliver_terminal(event).await;
        self.finished = true;
        if self.dropped > 0 {
            warn!(dropped = self.dropped, "Stream finished with dropped events");
        }
    }

    async fn deliver_terminal(&mut self, event: StreamEvent) {
        match self.terminal.take() {
            Some(permit) => {
                permit.send(event);
            }
            None => {
                // Nothing reserved: wait for room, or for the consumer to leave
                if self.tx.send(event).await.is_err() {
                    debug!("Stream consumer hung up before the terminal event");
                }
            }
        }
    }

    async fn deliver(&mut self, event: StreamEvent) -> bool {
        match tokio::time::timeout(self.grace, self.tx.send(event)).await {
            Ok(Ok(())) => true,
            Ok(Err(_)) => {
                debug!("Stream consumer hung up, cancelling worker");
                self.cancel.cancel();
                self.finished = true;
                false
            }
            Err(_) => {
                self.dropped += 1;
                warn!(
                    grace_ms = self.grace.as_millis() as u64,
                    dropped = self.dropped,
                    "Stream consumer saturated, dropping event"
                );
                true
            }
        }
    }
}

impl Drop for EventSink {
    fn drop(&mut self) {
        if !self.finished {
            // Worker ended without a verdict (panic or early return)
            let event = StreamEvent::error("Stream ended unexpectedly");
            match self.terminal.take() {
                Some(permit) => {
                    permit.send(event);
                }
                None => {
                    let _ = self.tx.try_send(event);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_single_terminal_event() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut sink = EventSink::new(tx, Duration::from_secs(1), CancellationToken::new());

        assert!(sink.send(StreamEvent::status("working")).await);
        sink.finish(Ok(())).await;
        sink.finish(Err(crate::error::PulseError::Cancelled)).await;
        assert!(!sink.send(StreamEvent::content("late")).await);
        drop(sink);

        assert_eq!(rx.recv().await, Some(StreamEvent::status("working")));
        assert_eq!(rx.recv().await, Some(StreamEvent::Done));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_saturated_consumer_drops_after_grace() {
        let (tx, mut rx) = mpsc::channel(2);
        let mut sink = EventSink::new(tx, Duration::from_millis(500), CancellationToken::new());

        assert!(sink.send(StreamEvent::content("a")).await);
        // Queue full; waits out the grace period then drops
        assert!(sink.send(StreamEvent::content("b")).await);
        assert_eq!(sink.dropped(), 1);

        assert_eq!(rx.recv().await, Some(StreamEvent::content("a")));
        assert!(sink.send(StreamEvent::content("c")).await);
        assert_eq!(rx.recv().await, Some(StreamEvent::content("c")));
    }

    #[tokio::test]
    async fn test_hangup_cancels_worker() {
        let (tx, rx) = mpsc::channel(4);
        let cancel = CancellationToken::new();
        let mut sink = EventSink::new(tx, Duration::from_secs(1), cancel.clone());
        drop(rx);

        assert!(!sink.send(StreamEvent::content("x")).await);
        assert!(cancel.is_cancelled());
    }

    #[tokio::test]
    async fn test_drop_without_finish_reports_error() {
        let (tx, mut rx) = mpsc::channel(4);
        let sink = EventSink::new(tx, Duration::from_secs(1), CancellationToken::new());
        drop(sink);

        assert!(matches!(rx.recv().await, Some(StreamEvent::Error { .. })));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_event_survives_saturated_consumer() {
        let (tx, mut rx) = mpsc::channel(2);
        let mut sink = EventSink::new(tx, Duration::from_millis(500), CancellationToken::new());

        assert!(sink.send(StreamEvent::content("a")).await);
        assert!(sink.send(StreamEvent::content("b")).await);
        assert_eq!(sink.dropped(), 1);
        sink.finish(Ok(())).await;
        drop(sink);

        assert_eq!(rx.recv().await, Some(StreamEvent::content("a")));
        assert_eq!(rx.recv().await, Some(StreamEvent::Done));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_terminal_event_with_single_slot_queue() {
        let (tx, mut rx) = mpsc::channel(1);
        let mut sink = EventSink::new(tx, Duration::from_millis(10), CancellationToken::new());

        sink.finish(Err(crate::error::PulseError::llm("boom"))).await;
        drop(sink);

        assert!(matches!(rx.recv().await, Some(StreamEvent::Error { message }) if message.contains("boom")));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_send_refused_after_cancel() {
        let (tx, mut rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        let mut sink = EventSink::new(tx, Duration::from_secs(1), cancel.clone());

        assert!(sink.send(StreamEvent::content("before")).await);
        cancel.cancel();
        assert!(!sink.send(StreamEvent::content("after")).await);
        sink.finish(Err(crate::error::PulseError::Cancelled)).await;
        drop(sink);

        assert_eq!(rx.recv().await, Some(StreamEvent::content("before")));
        assert_eq!(
            rx.recv().await,
            Some(StreamEvent::error(crate::error::PulseError::Cancelled.to_string()))
        );
        assert_eq!(rx.recv().await, None);
    }
}
