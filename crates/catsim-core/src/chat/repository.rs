//! ConversationTable trait definition.
//!
//! The storage boundary of the chat log: a durable table keyed by
//! `(conversation_id, sequence_key)` that supports a conditionless put and
//! an ascending query over one conversation. Follows the RPITIT pattern
//! (native async fn in traits, Rust 2024 edition).

use catsim_types::chat::{MessageRecord, PutAck, RecordInput};
use catsim_types::error::{RecordError, StoreError};

/// Durable, ordered key-value table holding conversation records.
///
/// Implementations live in catsim-infra (e.g., `SqliteConversationTable`).
/// Each put is atomic per key; there are no multi-item transactions.
pub trait ConversationTable: Send + Sync {
    /// Name of the underlying table.
    fn table_name(&self) -> &str;

    /// Write a record. An existing item with the same key is overwritten.
    fn put_item(
        &self,
        record: &MessageRecord,
    ) -> impl std::future::Future<Output = Result<PutAck, StoreError>> + Send;

    /// All unexpired items of a conversation, ascending by sequence key.
    ///
    /// Items come back loosely typed so they can be re-normalized. An item
    /// the table cannot decode at all is returned as `Err` in its slot
    /// rather than failing the whole query.
    fn query_ascending(
        &self,
        conversation_id: &str,
    ) -> impl std::future::Future<
        Output = Result<Vec<Result<RecordInput, RecordError>>, StoreError>,
    > + Send;

    /// Delete every item whose expiry (epoch seconds) is at or before `now_secs`.
    ///
    /// Returns the number of deleted items. Used only by the expiry sweeper.
    fn purge_expired(
        &self,
        now_secs: i64,
    ) -> impl std::future::Future<Output = Result<u64, StoreError>> + Send;
}
