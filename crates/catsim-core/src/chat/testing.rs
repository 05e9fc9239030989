//! In-memory tables for unit tests.

use std::collections::BTreeMap;
use std::sync::Mutex;

use catsim_types::chat::{MessageRecord, PutAck, RecordInput};
use catsim_types::error::{RecordError, StoreError};
use serde_json::Value;

use crate::chat::repository::ConversationTable;
use crate::record::expiry::is_expired;

type RawItem = (String, Result<RecordInput, String>);

/// `BTreeMap`-backed table keyed by `(conversation_id, sequence_key)`.
///
/// Raw items injected with [`InMemoryTable::insert_raw`] are returned after
/// the stored records of their partition, unsorted, to exercise the store's
/// handling of items it did not write itself.
#[derive(Default)]
pub struct InMemoryTable {
    items: Mutex<BTreeMap<(String, i64), MessageRecord>>,
    raw: Mutex<Vec<RawItem>>,
}

impl InMemoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_raw(&self, partition: &str, item: Result<RecordInput, String>) {
        self.raw.lock().unwrap().push((partition.to_string(), item));
    }
}

fn to_input(record: &MessageRecord) -> RecordInput {
    RecordInput {
        conversation_id: record.conversation_id.clone(),
        timestamp: Some(Value::from(record.sequence_key)),
        message: Some(record.payload.clone()),
        ttl: Some(Value::from(record.expires_at)),
    }
}

impl ConversationTable for InMemoryTable {
    fn table_name(&self) -> &str {
        "in-memory"
    }

    async fn put_item(&self, record: &MessageRecord) -> Result<PutAck, StoreError> {
        self.items.lock().unwrap().insert(
            (record.conversation_id.clone(), record.sequence_key),
            record.clone(),
        );
        Ok(PutAck {
            table: self.table_name().to_string(),
            rows_affected: 1,
        })
    }

    async fn query_ascending(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<Result<RecordInput, RecordError>>, StoreError> {
        let now = chrono::Utc::now().timestamp();
        let mut out: Vec<Result<RecordInput, RecordError>> = self
            .items
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.conversation_id == conversation_id && !is_expired(r.expires_at, now))
            .map(|r| Ok(to_input(r)))
            .collect();

        for (partition, item) in self.raw.lock().unwrap().iter() {
            if partition == conversation_id {
                out.push(item.clone().map_err(RecordError::Malformed));
            }
        }
        Ok(out)
    }

    async fn purge_expired(&self, now_secs: i64) -> Result<u64, StoreError> {
        let mut items = self.items.lock().unwrap();
        let before = items.len();
        items.retain(|_, r| !is_expired(r.expires_at, now_secs));
        Ok((before - items.len()) as u64)
    }
}

/// Table whose every call fails with a fixed error.
pub struct FailingTable {
    throttled: bool,
}

impl FailingTable {
    pub fn throttled() -> Self {
        Self { throttled: true }
    }

    pub fn unavailable() -> Self {
        Self { throttled: false }
    }

    fn error(&self) -> StoreError {
        if self.throttled {
            StoreError::Throttled("provisioned throughput exceeded".to_string())
        } else {
            StoreError::Unavailable("connection refused".to_string())
        }
    }
}

impl ConversationTable for FailingTable {
    fn table_name(&self) -> &str {
        "failing"
    }

    async fn put_item(&self, _record: &MessageRecord) -> Result<PutAck, StoreError> {
        Err(self.error())
    }

    async fn query_ascending(
        &self,
        _conversation_id: &str,
    ) -> Result<Vec<Result<RecordInput, RecordError>>, StoreError> {
        Err(self.error())
    }

    async fn purge_expired(&self, _now_secs: i64) -> Result<u64, StoreError> {
        Err(self.error())
    }
}
