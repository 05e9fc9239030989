//! SQLite conversation table.
//!
//! Implements `ConversationTable` from `catsim-core` using sqlx with split
//! read/write pools. The table layout mirrors the chat table's key schema:
//! `chatId` is the partition key, `timestamp` the sort key, `message` holds
//! the payload as JSON text and `ttl` the expiry in epoch seconds.

use catsim_core::chat::repository::ConversationTable;
use catsim_core::record::expiry::DEFAULT_TTL_SECS;
use catsim_types::chat::{MessageRecord, PutAck, RecordInput};
use catsim_types::config::validate_table_name;
use catsim_types::error::{ConfigError, RecordError, StoreError};
use chrono::Utc;
use serde_json::Value;
use sqlx::Row;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `ConversationTable`.
///
/// Cheap to clone: clones share the same pools.
#[derive(Clone)]
pub struct SqliteConversationTable {
    pool: DatabasePool,
    table_name: String,
    put_sql: String,
    query_sql: String,
    stamp_sql: String,
    purge_sql: String,
}

impl SqliteConversationTable {
    /// Bind a table name to a pool. The name is validated and quoted into
    /// the SQL once, here.
    pub fn new(pool: DatabasePool, table_name: &str) -> Result<Self, ConfigError> {
        validate_table_name(table_name)?;
        let quoted = format!("\"{table_name}\"");

        Ok(Self {
            pool,
            table_name: table_name.to_string(),
            put_sql: format!(
                "INSERT OR REPLACE INTO {quoted} (chatId, timestamp, message, ttl) VALUES (?, ?, ?, ?)"
            ),
            query_sql: format!(
                "SELECT chatId, timestamp, message, ttl FROM {quoted}
                 WHERE chatId = ? AND (ttl IS NULL OR ttl > ?)
                 ORDER BY timestamp ASC"
            ),
            stamp_sql: format!("UPDATE {quoted} SET ttl = ? WHERE typeof(ttl) <> 'integer'"),
            purge_sql: format!("DELETE FROM {quoted} WHERE ttl <= ?"),
        })
    }

    /// Create the table and its expiry index if they do not exist.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        let name = &self.table_name;
        sqlx::query(&format!(
            r#"CREATE TABLE IF NOT EXISTS "{name}" (
                   chatId    TEXT    NOT NULL,
                   timestamp INTEGER NOT NULL,
                   message   TEXT,
                   ttl       INTEGER,
                   PRIMARY KEY (chatId, timestamp)
               ) WITHOUT ROWID"#
        ))
        .execute(&self.pool.writer)
        .await
        .map_err(map_sqlx_error)?;

        sqlx::query(&format!(
            r#"CREATE INDEX IF NOT EXISTS "{name}_ttl" ON "{name}" (ttl)"#
        ))
        .execute(&self.pool.writer)
        .await
        .map_err(map_sqlx_error)?;

        tracing::debug!(table = %name, "Conversation table ready");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Private Row type for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

/// Internal row type. The key columns must decode; the payload and ttl are
/// handed on loosely so normalization can default them.
struct ConversationRow {
    chat_id: String,
    timestamp: i64,
    message: Option<String>,
    ttl: Option<i64>,
}

impl ConversationRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            chat_id: row.try_get("chatId")?,
            timestamp: row.try_get("timestamp")?,
            message: row.try_get("message").ok().flatten(),
            ttl: row.try_get("ttl").ok().flatten(),
        })
    }

    fn into_input(self) -> Result<RecordInput, RecordError> {
        if self.chat_id.is_empty() {
            return Err(RecordError::Malformed("empty chatId".to_string()));
        }
        let message = self
            .message
            .and_then(|text| serde_json::from_str::<Value>(&text).ok());

        Ok(RecordInput {
            conversation_id: self.chat_id,
            timestamp: Some(Value::from(self.timestamp)),
            message,
            ttl: self.ttl.map(Value::from),
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// SQLITE_BUSY and SQLITE_LOCKED (primary result codes).
const SQLITE_BUSY: i64 = 5;
const SQLITE_LOCKED: i64 = 6;

/// Classify a sqlx error as throttling or unavailability.
///
/// Lock contention and pool exhaustion are the engine refusing more work;
/// everything else means the table could not be reached.
fn map_sqlx_error(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::PoolTimedOut => StoreError::Throttled(e.to_string()),
        sqlx::Error::Database(db) => {
            let primary = db
                .code()
                .and_then(|code| code.parse::<i64>().ok())
                .map(|code| code & 0xff);
            match primary {
                Some(SQLITE_BUSY) | Some(SQLITE_LOCKED) => StoreError::Throttled(e.to_string()),
                _ => StoreError::Unavailable(e.to_string()),
            }
        }
        _ => StoreError::Unavailable(e.to_string()),
    }
}

// ---------------------------------------------------------------------------
// ConversationTable implementation
// ---------------------------------------------------------------------------

impl ConversationTable for SqliteConversationTable {
    fn table_name(&self) -> &str {
        &self.table_name
    }

    async fn put_item(&self, record: &MessageRecord) -> Result<PutAck, StoreError> {
        let result = sqlx::query(&self.put_sql)
            .bind(&record.conversation_id)
            .bind(record.sequence_key)
            .bind(record.payload.to_string())
            .bind(record.expires_at)
            .execute(&self.pool.writer)
            .await
            .map_err(map_sqlx_error)?;

        Ok(PutAck {
            table: self.table_name.clone(),
            rows_affected: result.rows_affected(),
        })
    }

    async fn query_ascending(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<Result<RecordInput, RecordError>>, StoreError> {
        let rows = sqlx::query(&self.query_sql)
            .bind(conversation_id)
            .bind(Utc::now().timestamp())
            .fetch_all(&self.pool.reader)
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows
            .iter()
            .map(|row| {
                ConversationRow::from_row(row)
                    .map_err(|e| RecordError::Malformed(e.to_string()))
                    .and_then(ConversationRow::into_input)
            })
            .collect())
    }

    /// Rows without a usable integer `ttl` (written by something other than
    /// this adapter) are first given the default expiry, so they age out
    /// like every other row and later reads see a stable `expiresAt`.
    async fn purge_expired(&self, now_secs: i64) -> Result<u64, StoreError> {
        let mut tx = self.pool.writer.begin().await.map_err(map_sqlx_error)?;

        let stamped = sqlx::query(&self.stamp_sql)
            .bind(now_secs.saturating_add(DEFAULT_TTL_SECS))
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
            .rows_affected();
        if stamped > 0 {
            tracing::debug!(table = %self.table_name, count = stamped, "Stamped default expiry on rows without ttl");
        }

        let result = sqlx::query(&self.purge_sql)
            .bind(now_secs)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::pool::{DatabasePool, default_database_url};
    use catsim_core::chat::store::ConversationLogStore;
    use serde_json::json;

    async fn test_pool() -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let url = default_database_url(dir.path());
        // Leak tempdir so it lives for the test
        std::mem::forget(dir);
        DatabasePool::new(&url).await.unwrap()
    }

    async fn test_table(pool: &DatabasePool) -> SqliteConversationTable {
        let table = SqliteConversationTable::new(pool.clone(), "catsim-chat").unwrap();
        table.ensure_schema().await.unwrap();
        table
    }

    fn record(chat_id: &str, key: i64, payload: Value, expires_at: i64) -> MessageRecord {
        MessageRecord {
            conversation_id: chat_id.to_string(),
            sequence_key: key,
            payload,
            expires_at,
        }
    }

    fn future_ttl() -> i64 {
        Utc::now().timestamp() + 3600
    }

    #[tokio::test]
    async fn test_rejects_invalid_table_name() {
        let pool = test_pool().await;
        assert!(SqliteConversationTable::new(pool, "x\"; DROP TABLE y; --").is_err());
    }

    #[tokio::test]
    async fn test_ensure_schema_is_idempotent() {
        let pool = test_pool().await;
        let table = test_table(&pool).await;
        table.ensure_schema().await.unwrap();
    }

    #[tokio::test]
    async fn test_put_and_query_roundtrip() {
        let pool = test_pool().await;
        let table = test_table(&pool).await;
        let ttl = future_ttl();

        let ack = table
            .put_item(&record("c1", 1_000_000, json!({"role": "user", "text": "hi"}), ttl))
            .await
            .unwrap();
        assert_eq!(ack.table, "catsim-chat");
        assert_eq!(ack.rows_affected, 1);

        let items = table.query_ascending("c1").await.unwrap();
        assert_eq!(items.len(), 1);
        let item = items[0].as_ref().unwrap();
        assert_eq!(item.conversation_id, "c1");
        assert_eq!(item.timestamp, Some(json!(1_000_000)));
        assert_eq!(item.message, Some(json!({"role": "user", "text": "hi"})));
        assert_eq!(item.ttl, Some(json!(ttl)));
    }

    #[tokio::test]
    async fn test_query_is_ascending_and_partitioned() {
        let pool = test_pool().await;
        let table = test_table(&pool).await;
        let ttl = future_ttl();

        for key in [30, 10, 20] {
            table
                .put_item(&record("c1", key, json!({"k": key}), ttl))
                .await
                .unwrap();
        }
        table
            .put_item(&record("c2", 15, json!({"k": 15}), ttl))
            .await
            .unwrap();

        let keys: Vec<Value> = table
            .query_ascending("c1")
            .await
            .unwrap()
            .into_iter()
            .map(|item| item.unwrap().timestamp.unwrap())
            .collect();
        assert_eq!(keys, vec![json!(10), json!(20), json!(30)]);
        assert!(table.query_ascending("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_put_overwrites_same_key() {
        let pool = test_pool().await;
        let table = test_table(&pool).await;
        let ttl = future_ttl();

        table.put_item(&record("c1", 5, json!({"n": 1}), ttl)).await.unwrap();
        table.put_item(&record("c1", 5, json!({"n": 2}), ttl)).await.unwrap();

        let items = table.query_ascending("c1").await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_ref().unwrap().message, Some(json!({"n": 2})));
    }

    #[tokio::test]
    async fn test_expired_items_are_hidden_and_purged() {
        let pool = test_pool().await;
        let table = test_table(&pool).await;
        let now = Utc::now().timestamp();

        table.put_item(&record("c1", 1, json!({}), now - 10)).await.unwrap();
        table.put_item(&record("c1", 2, json!({}), now + 3600)).await.unwrap();

        assert_eq!(table.query_ascending("c1").await.unwrap().len(), 1);
        assert_eq!(table.purge_expired(now).await.unwrap(), 1);
        assert_eq!(table.purge_expired(now).await.unwrap(), 0);

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM \"catsim-chat\"")
            .fetch_one(&pool.reader)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_loose_columns_are_left_for_defaulting() {
        let pool = test_pool().await;
        let table = test_table(&pool).await;

        sqlx::query(
            "INSERT INTO \"catsim-chat\" (chatId, timestamp, message, ttl) VALUES ('c1', 7, 'not json', NULL)",
        )
        .execute(&pool.writer)
        .await
        .unwrap();

        let items = table.query_ascending("c1").await.unwrap();
        let item = items[0].as_ref().unwrap();
        assert_eq!(item.timestamp, Some(json!(7)));
        assert!(item.message.is_none());
        assert!(item.ttl.is_none());
    }

    #[tokio::test]
    async fn test_purge_stamps_rows_without_ttl() {
        let pool = test_pool().await;
        let table = test_table(&pool).await;
        let now = Utc::now().timestamp();

        sqlx::query(
            "INSERT INTO \"catsim-chat\" (chatId, timestamp, message, ttl) VALUES ('c1', 1, '{}', NULL), ('c1', 2, '{}', 'soon')",
        )
        .execute(&pool.writer)
        .await
        .unwrap();

        assert_eq!(table.purge_expired(now).await.unwrap(), 0);

        let store = ConversationLogStore::new(table.clone());
        let first = store.list_by_conversation("c1").await.unwrap();
        let second = store.list_by_conversation("c1").await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
        assert!(first.iter().all(|r| r.expires_at == now + DEFAULT_TTL_SECS));

        // A day later the stamped rows age out like any other.
        assert_eq!(table.purge_expired(now + DEFAULT_TTL_SECS).await.unwrap(), 2);
        assert!(table.query_ascending("c1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_locked_database_maps_to_throttled() {
        use sqlx::Connection;

        let pool = test_pool().await;
        let table = test_table(&pool).await;
        let url: String = sqlx::query_scalar("SELECT file FROM pragma_database_list WHERE name = 'main'")
            .fetch_one(&pool.reader)
            .await
            .unwrap();

        // A second writer holds the write lock for the rest of the test.
        let mut holder = sqlx::SqliteConnection::connect(&format!("sqlite://{url}"))
            .await
            .unwrap();
        sqlx::query("BEGIN IMMEDIATE")
            .execute(&mut holder)
            .await
            .unwrap();

        let err = table
            .put_item(&record("c1", 1, json!({}), future_ttl()))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Throttled(_)), "got {err:?}");

        sqlx::query("ROLLBACK").execute(&mut holder).await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupted_sort_key_is_reported_per_item() {
        let pool = test_pool().await;
        let table = test_table(&pool).await;
        let ttl = future_ttl();

        table.put_item(&record("c1", 1, json!({"ok": true}), ttl)).await.unwrap();
        sqlx::query(
            "INSERT INTO \"catsim-chat\" (chatId, timestamp, message, ttl) VALUES ('c1', 'garbage', '{}', NULL)",
        )
        .execute(&pool.writer)
        .await
        .unwrap();

        let items = table.query_ascending("c1").await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items.iter().filter(|i| i.is_err()).count(), 1);
    }

    #[tokio::test]
    async fn test_store_over_sqlite_orders_assistant_reply() {
        let pool = test_pool().await;
        let store = ConversationLogStore::new(test_table(&pool).await);

        store
            .append(
                "c1",
                Some(json!({"role": "user", "text": "hi"})),
                Some(json!(1_000_000)),
                None,
            )
            .await
            .unwrap();
        store
            .append(
                "c1",
                Some(json!({"role": "assistant", "text": "meow"})),
                Some(json!(1_000_000)),
                None,
            )
            .await
            .unwrap();

        let records = store.list_by_conversation("c1").await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].sequence_key, 1_000_000);
        assert_eq!(records[0].payload["role"], "user");
        assert_eq!(records[1].sequence_key, 1_000_001);
        assert_eq!(records[1].payload["role"], "assistant");
        assert!(records.iter().all(|r| r.expires_at > Utc::now().timestamp()));
    }

    #[tokio::test]
    async fn test_unreachable_database_maps_to_unavailable() {
        let pool = test_pool().await;
        let table = test_table(&pool).await;
        pool.close().await;

        let err = table.query_ascending("c1").await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}
