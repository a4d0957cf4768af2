//! Tool-call fragment accumulation for streamed responses
//!
//! Streamed tool calls arrive as fragments. A fragment carrying a non-empty
//! id opens a new slot; a fragment with an empty id continues the most
//! recently opened slot. Arguments are appended strictly in arrival order.
//! A continuation that arrives before any slot exists opens an implicit
//! slot at its `index` (default 0) with an empty id.

use super::messages::ToolCall;
use serde::Deserialize;
use std::collections::BTreeMap;

/// One `tool_calls[]` element of a streamed delta
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ToolCallFragment {
    #[serde(default)]
    pub index: Option<usize>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub function: Option<FunctionFragment>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FunctionFragment {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arguments: Option<String>,
}

#[derive(Debug, Clone, Default)]
struct Slot {
    id: String,
    name: String,
    arguments: String,
}

/// Per-stream accumulator keyed by slot index
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    slots: BTreeMap<usize, Slot>,
    /// Most recently opened slot
    current: Option<usize>,
}

impl ToolCallAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Apply one fragment
    pub fn push(&mut self, fragment: ToolCallFragment) {
        let (name, arguments) = match fragment.function {
            Some(function) => (function.name, function.arguments),
            None => (None, None),
        };

        let index = match fragment.id.filter(|id| !id.is_empty()) {
            Some(id) => self.open(fragment.index, id),
            None => match self.current {
                Some(index) => index,
                None => self.open(fragment.index, String::new()),
            },
        };

        if let Some(slot) = self.slots.get_mut(&index) {
            if let Some(name) = name.filter(|n| !n.is_empty()) {
                if slot.name.is_empty() {
                    slot.name = name;
                }
            }
            if let Some(arguments) = arguments {
                slot.arguments.push_str(&arguments);
            }
        }
    }

    /// Open a slot for `id`, returning its index.
    ///
    /// A repeated id at the same index is treated as a continuation, since
    /// some providers resend the id on every fragment.
    fn open(&mut self, index: Option<usize>, id: String) -> usize {
        let requested = index.unwrap_or(self.next_free_index());
        let index = match self.slots.get(&requested) {
            None => requested,
            Some(slot) if !id.is_empty() && slot.id == id => {
                self.current = Some(requested);
                return requested;
            }
            Some(_) => self.next_free_index(),
        };

        self.slots.insert(
            index,
            Slot {
                id,
                ..Default::default()
            },
        );
        self.current = Some(index);
        index
    }

    fn next_free_index(&self) -> usize {
        self.slots.keys().next_back().map_or(0, |last| last + 1)
    }

    /// Drain the completed calls in slot order. Slots without an id get a
    /// synthesized one so tool results can still reference them.
    pub fn finish(&mut self) -> Vec<ToolCall> {
        self.current = None;
        std::mem::take(&mut self.slots)
            .into_iter()
            .map(|(index, slot)| ToolCall {
                id: if slot.id.is_empty() {
                    format!("call_{}", index)
                } else {
                    slot.id
                },
                name: slot.name,
                arguments: slot.arguments,
            })
            .collect()
    }

    /// Drop partial state without producing calls
    pub fn discard(&mut self) {
        self.slots.clear();
        self.current = None;
    }
}
