//! Server-Sent Events decoder for OpenAI-compatible streams
//!
//! Line oriented: every `data:` line yields one event. Blank lines, comments
//! and unknown fields are skipped. Bytes are buffered until a full line is
//! available, so frames and multi-byte UTF-8 sequences split across network
//! chunks decode correctly.

mod event;

pub use event::SseEvent;

/// Buffered line decoder
#[derive(Debug, Default)]
pub struct SseDecoder {
    /// Bytes of the current, not yet terminated line
    buffer: Vec<u8>,
    /// `event:` field waiting for its data line
    pending_type: Option<String>,
    /// `id:` field waiting for its data line
    pending_id: Option<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes and return every event completed by them
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            if let Some(event) = self.process_line(&line[..newline]) {
                events.push(event);
            }
        }
        events
    }

    /// Flush a final line that arrived without a terminating newline
    pub fn finish(&mut self) -> Option<SseEvent> {
        if self.buffer.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.buffer);
        self.process_line(&line)
    }

    fn process_line(&mut self, raw: &[u8]) -> Option<SseEvent> {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        let line = match std::str::from_utf8(raw) {
            Ok(line) => std::borrow::Cow::Borrowed(line),
            Err(e) => {
                tracing::warn!(
                    valid_up_to = e.valid_up_to(),
                    "Invalid UTF-8 in SSE line, decoding lossily"
                );
                String::from_utf8_lossy(raw)
            }
        };

        if line.trim().is_empty() {
            self.pending_type = None;
            self.pending_id = None;
            return None;
        }
        if line.starts_with(':') {
            return None;
        }

        if let Some(value) = line.strip_prefix("data:") {
            return Some(SseEvent {
                event_type: self.pending_type.take(),
                data: value.strip_prefix(' ').unwrap_or(value).to_string(),
                id: self.pending_id.take(),
            });
        }
        if let Some(value) = line.strip_prefix("event:") {
            self.pending_type = Some(value.trim().to_string());
        } else if let Some(value) = line.strip_prefix("id:") {
            self.pending_id = Some(value.trim().to_string());
        }
        None
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.pending_type = None;
        self.pending_id = None;
    }

    /// True while a partial line is buffered
    pub fn has_remaining(&self) -> bool {
        !self.buffer.is_empty()
    }
}

#[cfg(test)]
mod tests;
