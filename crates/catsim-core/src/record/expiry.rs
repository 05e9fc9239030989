//! Expiry policy: the default time-to-live and its validity check.

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::timestamp::parse_expiry_secs;

/// Default time-to-live for a record: 24 hours.
pub const DEFAULT_TTL_SECS: i64 = 24 * 60 * 60;

/// Expiry timestamp (epoch seconds) for a record normalized at `now`.
pub fn default_expiry(now: DateTime<Utc>) -> i64 {
    now.timestamp() + DEFAULT_TTL_SECS
}

/// Resolve a ttl hint into an expiry timestamp.
///
/// Returns the timestamp and whether the default was substituted.
pub fn resolve_expiry(ttl: Option<&Value>, now: DateTime<Utc>) -> (i64, bool) {
    match ttl.and_then(parse_expiry_secs) {
        Some(expires_at) => (expires_at, false),
        None => (default_expiry(now), true),
    }
}

/// Whether a record expiring at `expires_at` has elapsed at `now_secs`.
///
/// The boundary is inclusive: a record is gone at its expiry second. Table
/// adapters filtering in their own query language must use the same
/// comparison (`expires_at > now` to keep, `expires_at <= now` to purge).
pub fn is_expired(expires_at: i64, now_secs: i64) -> bool {
    expires_at <= now_secs
}
