//! Consumer half of an orchestrated stream

use super::events::StreamEvent;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Ordered events of one request, ending with exactly one terminal event.
///
/// Once the request is cancelled, status and content events still sitting in
/// the queue are discarded; only the terminal event is delivered. Dropping
/// the stream cancels the worker.
#[derive(Debug)]
pub struct EventStream {
    rx: mpsc::Receiver<StreamEvent>,
    cancel: CancellationToken,
    terminated: bool,
}

impl EventStream {
    pub fn new(rx: mpsc::Receiver<StreamEvent>, cancel: CancellationToken) -> Self {
        Self {
            rx,
            cancel,
            terminated: false,
        }
    }

    /// Token of the worker producing this stream
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Next event, or `None` after the terminal one
    pub async fn recv(&mut self) -> Option<StreamEvent> {
        if self.terminated {
            return None;
        }
        let mut discarded = 0usize;
        while let Some(event) = self.rx.recv().await {
            if event.is_terminal() {
                self.terminated = true;
                if discarded > 0 {
                    debug!(discarded, "Discarded events queued before cancellation");
                }
                return Some(event);
            }
            if self.cancel.is_cancelled() {
                discarded += 1;
                continue;
            }
            return Some(event);
        }
        self.terminated = true;
        None
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        if !self.terminated {
            self.cancel.cancel();
        }
    }
}
