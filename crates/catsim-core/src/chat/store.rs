//! Conversation log store.
//!
//! Append and read operations over a [`ConversationTable`]. Every record
//! passes through normalization on the way in and on the way out, so
//! callers always see complete, defaulted records.

use std::sync::atomic::{AtomicU64, Ordering};

use catsim_types::chat::{AppendedRecord, MessageRecord, RecordInput, payload_role};
use catsim_types::error::StoreError;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::chat::repository::ConversationTable;
use crate::record::normalize_at;
use crate::record::timestamp::parse_millis;

/// Point-in-time snapshot of the store's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Successful appends.
    pub appends: u64,
    /// Successful conversation listings.
    pub reads: u64,
    /// Record fields replaced by defaults, on append or read.
    pub defaulted_fields: u64,
    /// Stored items skipped while listing because they could not be coerced.
    pub skipped_items: u64,
    /// Items removed by expiry sweeps.
    pub purged_items: u64,
}

#[derive(Debug, Default)]
struct StoreCounters {
    appends: AtomicU64,
    reads: AtomicU64,
    defaulted_fields: AtomicU64,
    skipped_items: AtomicU64,
    purged_items: AtomicU64,
}

/// Ordered per-conversation log over a durable table.
///
/// Generic over `ConversationTable` so catsim-core never depends on
/// catsim-infra. Holds no per-request state; one instance is shared by all
/// handlers.
pub struct ConversationLogStore<T: ConversationTable> {
    table: T,
    counters: StoreCounters,
}

impl<T: ConversationTable> ConversationLogStore<T> {
    pub fn new(table: T) -> Self {
        Self {
            table,
            counters: StoreCounters::default(),
        }
    }

    /// Access the underlying table.
    pub fn table(&self) -> &T {
        &self.table
    }

    /// Append one turn to a conversation.
    ///
    /// A payload whose `role` is `assistant` has its timestamp hint advanced
    /// by one millisecond before normalization, so a reply sharing the
    /// nominal timestamp of the message it answers sorts strictly after it.
    /// Store failures are returned unmodified; nothing is retried.
    pub async fn append(
        &self,
        conversation_id: &str,
        payload: Option<Value>,
        timestamp_hint: Option<Value>,
        ttl_hint: Option<Value>,
    ) -> Result<AppendedRecord, StoreError> {
        let machine_turn = payload
            .as_ref()
            .and_then(payload_role)
            .is_some_and(|role| role.is_machine());

        let timestamp = if machine_turn {
            timestamp_hint
                .as_ref()
                .and_then(parse_millis)
                .map(|ts| Value::from(ts.saturating_add(1)))
        } else {
            timestamp_hint
        };

        let input = RecordInput {
            conversation_id: conversation_id.to_string(),
            timestamp,
            message: payload,
            ttl: ttl_hint,
        };
        let normalized = normalize_at(input, Utc::now());
        if normalized.defaulted.any() {
            debug!(
                chat_id = %conversation_id,
                defaulted = ?normalized.defaulted,
                "Defaults applied to appended record"
            );
            self.counters
                .defaulted_fields
                .fetch_add(normalized.defaulted.count(), Ordering::Relaxed);
        }

        let record = normalized.record;
        let ack = self.table.put_item(&record).await?;
        self.counters.appends.fetch_add(1, Ordering::Relaxed);

        info!(
            chat_id = %conversation_id,
            sequence_key = record.sequence_key,
            machine_turn,
            "Appended record"
        );

        Ok(AppendedRecord { record, ack })
    }

    /// All records of a conversation, oldest first.
    ///
    /// Returns an empty list for an unknown conversation. Items that cannot
    /// be coerced into a record are skipped so one bad item cannot hide the
    /// rest of the history. Fails only if the table itself fails.
    pub async fn list_by_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<MessageRecord>, StoreError> {
        let items = self.table.query_ascending(conversation_id).await?;
        let now = Utc::now();

        let mut records = Vec::with_capacity(items.len());
        for item in items {
            let input = match item {
                Ok(input) => input,
                Err(e) => {
                    warn!(chat_id = %conversation_id, error = %e, "Skipping undecodable item");
                    self.counters.skipped_items.fetch_add(1, Ordering::Relaxed);
                    continue;
                }
            };

            if input.conversation_id != conversation_id {
                warn!(
                    chat_id = %conversation_id,
                    item_chat_id = %input.conversation_id,
                    "Skipping item with corrupted conversation id"
                );
                self.counters.skipped_items.fetch_add(1, Ordering::Relaxed);
                continue;
            }

            let normalized = normalize_at(input, now);
            if normalized.defaulted.any() {
                debug!(
                    chat_id = %conversation_id,
                    sequence_key = normalized.record.sequence_key,
                    defaulted = ?normalized.defaulted,
                    "Defaults applied to stored record"
                );
                self.counters
                    .defaulted_fields
                    .fetch_add(normalized.defaulted.count(), Ordering::Relaxed);
            }
            records.push(normalized.record);
        }

        // Re-normalization can replace an unreadable sort key; keep the
        // ascending contract on what is actually returned.
        records.sort_by_key(|r| r.sequence_key);
        self.counters.reads.fetch_add(1, Ordering::Relaxed);

        debug!(chat_id = %conversation_id, count = records.len(), "Listed conversation");
        Ok(records)
    }

    /// Delete records whose expiry has elapsed. Returns the number removed.
    pub async fn purge_expired(&self) -> Result<u64, StoreError> {
        let removed = self.table.purge_expired(Utc::now().timestamp()).await?;
        self.counters
            .purged_items
            .fetch_add(removed, Ordering::Relaxed);
        if removed > 0 {
            info!(table = %self.table.table_name(), count = removed, "Purged expired records");
        }
        Ok(removed)
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            appends: self.counters.appends.load(Ordering::Relaxed),
            reads: self.counters.reads.load(Ordering::Relaxed),
            defaulted_fields: self.counters.defaulted_fields.load(Ordering::Relaxed),
            skipped_items: self.counters.skipped_items.load(Ordering::Relaxed),
            purged_items: self.counters.purged_items.load(Ordering::Relaxed),
        }
    }
}
