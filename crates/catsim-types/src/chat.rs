//! Chat record types.
//!
//! A conversation is an ordered log of [`MessageRecord`]s keyed by
//! `(conversation_id, sequence_key)`. Records are built from a loosely typed
//! [`RecordInput`], which is also the shape items come back in from storage.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// Re-export MessageRole from llm module (the role marker lives on payloads).
pub use crate::llm::MessageRole;

/// One persisted chat turn.
///
/// `sequence_key` is epoch milliseconds and orders the record within its
/// conversation. `expires_at` is epoch seconds; once it elapses the storage
/// engine may delete the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    pub conversation_id: String,
    pub sequence_key: i64,
    pub payload: Value,
    pub expires_at: i64,
}

impl MessageRecord {
    /// Role marker carried on the payload, if any.
    pub fn role(&self) -> Option<MessageRole> {
        payload_role(&self.payload)
    }
}

/// Loosely typed input to record normalization.
///
/// Every field except the conversation id is optional and unvalidated.
/// Accepts both the storage attribute names (`chatId`, `timestamp`,
/// `message`, `ttl`) and the record names (`conversationId`, `sequenceKey`,
/// `payload`, `expiresAt`). A JSON `null` is treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordInput {
    #[serde(alias = "chatId", default)]
    pub conversation_id: String,
    #[serde(alias = "sequenceKey", default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Value>,
    #[serde(alias = "payload", default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Value>,
    #[serde(alias = "expiresAt", default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<Value>,
}

impl RecordInput {
    pub fn new(conversation_id: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            ..Self::default()
        }
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<Value>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    pub fn with_message(mut self, message: Value) -> Self {
        self.message = Some(message);
        self
    }

    pub fn with_ttl(mut self, ttl: impl Into<Value>) -> Self {
        self.ttl = Some(ttl.into());
        self
    }
}

/// Acknowledgment returned by the storage engine for a successful put.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutAck {
    /// Table the item was written to.
    pub table: String,
    /// Rows touched by the write, as reported by the engine.
    pub rows_affected: u64,
}

/// A record together with the acknowledgment of the write that created it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppendedRecord {
    pub record: MessageRecord,
    pub ack: PutAck,
}

/// Read the `role` marker from a payload document.
///
/// Only string roles that parse as a [`MessageRole`] count; anything else
/// (missing, non-string, unknown) yields `None`.
pub fn payload_role(payload: &Value) -> Option<MessageRole> {
    payload.get("role")?.as_str()?.parse().ok()
}
