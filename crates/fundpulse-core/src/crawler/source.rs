//! Tolerant decoding of JSON list payloads

use crate::error::{PulseError, PulseResult};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

/// Keys under which list payloads are commonly wrapped
const WRAPPER_KEYS: [&str; 3] = ["data", "items", "list"];

/// Decode a list of records from `payload`.
///
/// Accepts a bare array or an object wrapping the array under one of the
/// usual keys (one level of nesting is followed, e.g. `{"data": {"list": []}}`).
/// Elements that fail to map are skipped; only a payload with no list at all
/// is an error.
pub fn parse_records<T: DeserializeOwned>(source: &str, payload: Value) -> PulseResult<Vec<T>> {
    let items = unwrap_list(payload, 2).ok_or_else(|| {
        PulseError::json(format!("{} payload does not contain a record list", source))
    })?;

    let total = items.len();
    let records: Vec<T> = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!(source, index, error = %e, "Skipping malformed record");
                None
            }
        })
        .collect();

    if records.len() < total {
        debug!(source, kept = records.len(), total, "Dropped malformed records");
    }
    Ok(records)
}

fn unwrap_list(payload: Value, depth: usize) -> Option<Vec<Value>> {
    match payload {
        Value::Array(items) => Some(items),
        Value::Object(mut map) if depth > 0 => WRAPPER_KEYS
            .iter()
            .find_map(|key| map.remove(*key))
            .and_then(|inner| unwrap_list(inner, depth - 1)),
        _ => None,
    }
}
