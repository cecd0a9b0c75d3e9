//! SQLite-backed message store
//!
//! All queries execute against the pool reference, so each operation
//! acquires a pooled connection, uses it, and returns it on every path.
//! No connection is held across the Slack API round-trip.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, error, info};

use super::models::ThreadReply;

/// Upper bound on waiting for a pooled connection.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Message storage error type
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Store of ingested messages and the thread replies recorded against them
///
/// Lookup and insert failures are absorbed at this boundary: they are
/// logged and reported as a miss (`None`) or a failed insert (`false`),
/// never propagated to the webhook layer.
#[derive(Clone)]
pub struct MessageStore {
    pool: SqlitePool,
}

impl MessageStore {
    /// Open (or create) the database at `url` and initialize the schema
    pub async fn connect(url: &str) -> StorageResult<Self> {
        info!("Opening message store at {}", url);

        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_with(options)
            .await?;

        Self::from_pool(pool).await
    }

    /// Wrap an existing pool (tests use this with an in-memory database)
    pub async fn from_pool(pool: SqlitePool) -> StorageResult<Self> {
        let store = Self { pool };
        store.initialize_schema().await?;
        Ok(store)
    }

    /// The underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Initialize database schema
    async fn initialize_schema(&self) -> StorageResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY,
                content TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS replies (
                message_id INTEGER NOT NULL REFERENCES messages(id),
                reply_content TEXT NOT NULL,
                reply_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        debug!("Message store schema initialized");
        Ok(())
    }

    /// Greatest `messages.id` whose content equals `content`
    ///
    /// Returns `None` both when no row matches and when the query fails;
    /// failures are logged here so the caller treats them like an unknown
    /// token.
    pub async fn find_max_message_id(&self, content: &str) -> Option<i64> {
        let row: Result<(Option<i64>,), sqlx::Error> =
            sqlx::query_as("SELECT MAX(id) FROM messages WHERE content = ?1")
                .bind(content)
                .fetch_one(&self.pool)
                .await;

        match row {
            Ok((id,)) => id,
            Err(e) => {
                error!("Failed to look up message for token {:?}: {}", content, e);
                None
            }
        }
    }

    /// Insert one reply row, committing immediately
    ///
    /// Returns `false` on any database error. Replays are not deduplicated;
    /// the same reply inserted twice produces two rows.
    pub async fn insert_reply(&self, reply: &ThreadReply) -> bool {
        let result = sqlx::query(
            "INSERT INTO replies (message_id, reply_content, reply_at)
             VALUES (?1, ?2, ?3)",
        )
        .bind(reply.message_id)
        .bind(&reply.reply_content)
        .bind(&reply.reply_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                debug!("Recorded reply to message {}", reply.message_id);
                true
            }
            Err(e) => {
                error!("Failed to record reply to message {}: {}", reply.message_id, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn in_memory_store() -> MessageStore {
        // A multi-connection pool would open one empty database per
        // connection, so in-memory tests pin the pool to a single one.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        MessageStore::from_pool(pool).await.unwrap()
    }

    async fn seed_message(store: &MessageStore, id: i64, content: &str) {
        sqlx::query("INSERT INTO messages (id, content) VALUES (?1, ?2)")
            .bind(id)
            .bind(content)
            .execute(store.pool())
            .await
            .unwrap();
    }

    async fn count_replies(store: &MessageStore) -> i64 {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM replies")
            .fetch_one(store.pool())
            .await
            .unwrap();
        count
    }

    #[tokio::test]
    async fn test_store_creation() {
        let _store = in_memory_store().await;
    }

    #[tokio::test]
    async fn test_find_max_id_prefers_greatest() {
        let store = in_memory_store().await;
        seed_message(&store, 3, "abc123").await;
        seed_message(&store, 7, "abc123").await;
        seed_message(&store, 5, "other").await;

        assert_eq!(store.find_max_message_id("abc123").await, Some(7));
    }

    #[tokio::test]
    async fn test_find_max_id_miss_is_none() {
        let store = in_memory_store().await;
        seed_message(&store, 1, "abc123").await;

        assert_eq!(store.find_max_message_id("missing").await, None);
    }

    #[tokio::test]
    async fn test_insert_reply() {
        let store = in_memory_store().await;
        seed_message(&store, 10, "abc123").await;

        let reply = ThreadReply::new(10, "looks good".to_string());
        assert!(store.insert_reply(&reply).await);

        let (message_id, content): (i64, String) =
            sqlx::query_as("SELECT message_id, reply_content FROM replies")
                .fetch_one(store.pool())
                .await
                .unwrap();
        assert_eq!(message_id, 10);
        assert_eq!(content, "looks good");
    }

    #[tokio::test]
    async fn test_replayed_insert_is_not_deduplicated() {
        let store = in_memory_store().await;
        seed_message(&store, 10, "abc123").await;

        let reply = ThreadReply::new(10, "same reply".to_string());
        assert!(store.insert_reply(&reply).await);
        assert!(store.insert_reply(&reply).await);

        assert_eq!(count_replies(&store).await, 2);
    }
}
