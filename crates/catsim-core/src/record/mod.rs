//! Message record model.
//!
//! Turns loosely typed input into well-formed [`MessageRecord`]s. Invalid or
//! missing optional fields fall back to defaults instead of failing, so the
//! log store always stays writable.
//!
//! [`MessageRecord`]: catsim_types::chat::MessageRecord

pub mod expiry;
pub mod normalize;
pub mod timestamp;

pub use normalize::{Defaulted, Normalized, normalize, normalize_at};
