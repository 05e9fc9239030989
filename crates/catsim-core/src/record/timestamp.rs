//! Lenient timestamp parsing.
//!
//! Accepted forms: JSON numbers (floats are truncated toward zero), strings
//! holding an integer, and RFC 3339 date-time strings. Values outside
//! +/- 8.64e15 milliseconds around the epoch are rejected.

use chrono::DateTime;
use serde_json::{Number, Value};

/// Largest representable instant, in milliseconds from the epoch.
pub const MAX_TIMESTAMP_MS: i64 = 8_640_000_000_000_000;

/// Parse a value as epoch milliseconds.
pub fn parse_millis(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => number_in_range(n),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(n) = s.parse::<i64>() {
                return in_range(n);
            }
            DateTime::parse_from_rfc3339(s)
                .ok()
                .and_then(|dt| in_range(dt.timestamp_millis()))
        }
        _ => None,
    }
}

/// Parse a value as an expiry timestamp in epoch seconds.
///
/// Numbers are taken as seconds and passed through unchanged; RFC 3339
/// strings are converted to seconds.
pub fn parse_expiry_secs(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => number_in_range(n),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(n) = s.parse::<i64>() {
                return in_range(n);
            }
            DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.timestamp())
        }
        _ => None,
    }
}

fn number_in_range(n: &Number) -> Option<i64> {
    if let Some(i) = n.as_i64() {
        return in_range(i);
    }
    let f = n.as_f64()?;
    if f.is_finite() && f.abs() <= MAX_TIMESTAMP_MS as f64 {
        Some(f.trunc() as i64)
    } else {
        None
    }
}

fn in_range(n: i64) -> Option<i64> {
    (-MAX_TIMESTAMP_MS..=MAX_TIMESTAMP_MS)
        .contains(&n)
        .then_some(n)
}
