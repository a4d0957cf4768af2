//! SSE event type

/// One `data:` payload from the stream
#[derive(Debug, Clone, PartialEq)]
pub struct SseEvent {
    /// Preceding `event:` field, if any
    pub event_type: Option<String>,
    pub data: String,
    /// Preceding `id:` field, if any
    pub id: Option<String>,
}

impl SseEvent {
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            event_type: None,
            data: data.into(),
            id: None,
        }
    }

    /// Check if this is the `[DONE]` terminator
    pub fn is_done(&self) -> bool {
        self.data.trim() == "[DONE]"
    }
}
