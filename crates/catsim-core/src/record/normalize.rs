//! Record normalization.
//!
//! `normalize` never fails. Each field that falls back to a default is
//! reported in [`Defaulted`] so callers can log or count it.

use catsim_types::chat::{MessageRecord, RecordInput};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::expiry::resolve_expiry;
use super::timestamp::parse_millis;

/// Which fields of a record were substituted with defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Defaulted {
    pub sequence_key: bool,
    pub payload: bool,
    pub expires_at: bool,
}

impl Defaulted {
    pub fn any(&self) -> bool {
        self.sequence_key || self.payload || self.expires_at
    }

    /// Number of defaulted fields.
    pub fn count(&self) -> u64 {
        [self.sequence_key, self.payload, self.expires_at]
            .into_iter()
            .filter(|d| *d)
            .count() as u64
    }
}

/// A normalized record and the defaults applied to build it.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub record: MessageRecord,
    pub defaulted: Defaulted,
}

/// Normalize `input` against the current time.
pub fn normalize(input: RecordInput) -> Normalized {
    normalize_at(input, Utc::now())
}

/// Normalize `input` as if the current time were `now`.
///
/// - `conversation_id` is copied verbatim.
/// - `sequence_key` is the parsed `timestamp`, or `now` in milliseconds.
/// - `payload` is `message` unless it is absent or falsy (`false`, `0`,
///   `""`), in which case it is an empty document.
/// - `expires_at` is the parsed `ttl`, or `now` + 24h in seconds.
pub fn normalize_at(input: RecordInput, now: DateTime<Utc>) -> Normalized {
    let mut defaulted = Defaulted::default();

    let sequence_key = match input.timestamp.as_ref().and_then(parse_millis) {
        Some(ts) => ts,
        None => {
            defaulted.sequence_key = true;
            now.timestamp_millis()
        }
    };

    let payload = match input.message {
        Some(message) if !is_falsy(&message) => message,
        _ => {
            defaulted.payload = true;
            Value::Object(Map::new())
        }
    };

    let (expires_at, ttl_defaulted) = resolve_expiry(input.ttl.as_ref(), now);
    defaulted.expires_at = ttl_defaulted;

    Normalized {
        record: MessageRecord {
            conversation_id: input.conversation_id,
            sequence_key,
            payload,
            expires_at,
        },
        defaulted,
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}
