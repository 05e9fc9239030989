//! Chat service: the retrieval facade over the conversation log.
//!
//! `ChatService` exposes the request-level use cases. `append_turn` and
//! `export_conversation` are direct pass-throughs to the log store (no
//! retries, no caching). `converse` runs one full chat exchange: load the
//! history, store the user's turn, ask the model, store the reply.

use catsim_types::chat::{AppendedRecord, MessageRecord};
use catsim_types::error::{ChatError, StoreError};
use chrono::Utc;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::chat::repository::ConversationTable;
use crate::chat::store::ConversationLogStore;
use crate::llm::provider::ChatModel;

/// Both records stored by one chat exchange.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConverseOutcome {
    pub user: MessageRecord,
    pub reply: MessageRecord,
}

/// Request-facing chat operations.
///
/// Generic over `ConversationTable` and `ChatModel` to maintain clean
/// architecture (catsim-core never depends on catsim-infra).
pub struct ChatService<T: ConversationTable, M: ChatModel> {
    store: ConversationLogStore<T>,
    model: M,
    allow_empty_message: bool,
}

impl<T: ConversationTable, M: ChatModel> ChatService<T, M> {
    pub fn new(table: T, model: M) -> Self {
        Self {
            store: ConversationLogStore::new(table),
            model,
            allow_empty_message: false,
        }
    }

    /// Accept chat turns with empty text.
    pub fn with_allow_empty_message(mut self, allow: bool) -> Self {
        self.allow_empty_message = allow;
        self
    }

    /// Access the conversation log store.
    pub fn store(&self) -> &ConversationLogStore<T> {
        &self.store
    }

    /// Access the chat model.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Append one turn as given. Returns the stored record and the store's
    /// acknowledgment, or the store's failure unmodified.
    pub async fn append_turn(
        &self,
        conversation_id: &str,
        payload: Option<Value>,
        timestamp: Option<Value>,
        ttl: Option<Value>,
    ) -> Result<AppendedRecord, StoreError> {
        self.store
            .append(conversation_id, payload, timestamp, ttl)
            .await
    }

    /// The full history of a conversation, oldest first. Read-only.
    pub async fn export_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<MessageRecord>, StoreError> {
        self.store.list_by_conversation(conversation_id).await
    }

    /// Run one chat exchange.
    ///
    /// The user's turn and the reply share one nominal timestamp; the reply
    /// is bumped past it by the store. If the model fails, the user's turn
    /// stays stored and the error is returned.
    pub async fn converse(
        &self,
        conversation_id: &str,
        message: Value,
    ) -> Result<ConverseOutcome, ChatError> {
        if conversation_id.is_empty() {
            return Err(ChatError::Validation(
                "conversation id must not be empty".to_string(),
            ));
        }
        let turn = user_turn(message, self.allow_empty_message)?;

        let history = self.store.list_by_conversation(conversation_id).await?;
        let now_ms = exchange_timestamp(Utc::now().timestamp_millis(), &history);
        let user = self
            .store
            .append(conversation_id, Some(turn.clone()), Some(Value::from(now_ms)), None)
            .await?;

        let reply = match self.model.reply(&history, &turn).await {
            Ok(reply) => assistant_turn(reply),
            Err(e) => {
                warn!(
                    chat_id = %conversation_id,
                    model = %self.model.name(),
                    error = %e,
                    "Model failed to reply"
                );
                return Err(e.into());
            }
        };

        let reply = self
            .store
            .append(conversation_id, Some(reply), Some(Value::from(now_ms)), None)
            .await?;

        info!(
            chat_id = %conversation_id,
            model = %self.model.name(),
            history_len = history.len(),
            "Chat turn completed"
        );

        Ok(ConverseOutcome {
            user: user.record,
            reply: reply.record,
        })
    }
}

/// Nominal timestamp for a new exchange.
///
/// Never at or below the newest stored key, so a user turn cannot land on
/// the previous exchange's turn or reply when exchanges follow each other
/// within the same millisecond.
fn exchange_timestamp(now_ms: i64, history: &[MessageRecord]) -> i64 {
    match history.last() {
        Some(last) => now_ms.max(last.sequence_key.saturating_add(1)),
        None => now_ms,
    }
}

/// Build the stored payload for a human turn.
///
/// Plain text becomes `{role: "user", content: [{text}]}`; an object is kept
/// with its role forced to `user`.
fn user_turn(message: Value, allow_empty: bool) -> Result<Value, ChatError> {
    match message {
        Value::String(text) => {
            if text.trim().is_empty() && !allow_empty {
                return Err(ChatError::Validation("message must not be empty".to_string()));
            }
            Ok(json!({"role": "user", "content": [{"text": text}]}))
        }
        Value::Object(mut map) => {
            map.insert("role".to_string(), Value::from("user"));
            Ok(Value::Object(map))
        }
        _ => Err(ChatError::Validation(
            "message must be a string or an object".to_string(),
        )),
    }
}

/// Force the model's reply into an assistant payload.
fn assistant_turn(reply: Value) -> Value {
    match reply {
        Value::Object(mut map) => {
            map.insert("role".to_string(), Value::from("assistant"));
            Value::Object(map)
        }
        Value::String(text) => json!({"role": "assistant", "content": [{"text": text}]}),
        other => json!({"role": "assistant", "content": [{"json": other}]}),
    }
}
