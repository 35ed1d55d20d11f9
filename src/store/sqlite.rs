//! SQLite-backed key-value and content store.
//!
//! Raw SQL with rusqlite, no ORM. The connection is opened on first use and
//! memoised; concurrent first callers share one open.

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info};

use super::{ContentStore, KeyValueStore};
use crate::error::{MinutesError, MinutesResult};
use crate::recording::AudioPayload;

pub struct SqliteStore {
    path: Option<PathBuf>,
    conn: OnceCell<Mutex<Connection>>,
    opens: AtomicUsize,
}

impl SqliteStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            conn: OnceCell::new(),
            opens: AtomicUsize::new(0),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            path: None,
            conn: OnceCell::new(),
            opens: AtomicUsize::new(0),
        }
    }

    /// Number of times the underlying database has been opened.
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    async fn connection(&self) -> MinutesResult<&Mutex<Connection>> {
        self.conn.get_or_try_init(|| self.open()).await
    }

    async fn open(&self) -> MinutesResult<Mutex<Connection>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let path = self.path.clone();

        let conn = tokio::task::spawn_blocking(move || -> MinutesResult<Connection> {
            let conn = match &path {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    Connection::open(path)?
                }
                None => Connection::open_in_memory()?,
            };
            migrate(&conn)?;
            Ok(conn)
        })
        .await
        .map_err(|e| MinutesError::StorageUnavailable(format!("open task failed: {e}")))??;

        match &self.path {
            Some(path) => info!("Opened session database at {}", path.display()),
            None => info!("Opened in-memory session database"),
        }
        Ok(Mutex::new(conn))
    }
}

pub fn migrate(conn: &Connection) -> MinutesResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv_entries (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS audio_blobs (
            id TEXT PRIMARY KEY,
            mime TEXT NOT NULL,
            bytes BLOB NOT NULL,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    Ok(())
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get_value(&self, key: &str) -> MinutesResult<Option<String>> {
        let conn = self.connection().await?.lock().await;
        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    async fn put_value(&self, key: &str, value: &str) -> MinutesResult<()> {
        let conn = self.connection().await?.lock().await;
        conn.execute(
            "INSERT INTO kv_entries (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
            params![key, value],
        )?;
        Ok(())
    }

    async fn delete_value(&self, key: &str) -> MinutesResult<()> {
        let conn = self.connection().await?.lock().await;
        conn.execute("DELETE FROM kv_entries WHERE key = ?1", params![key])?;
        Ok(())
    }
}

#[async_trait]
impl ContentStore for SqliteStore {
    async fn get_audio(&self, id: &str) -> MinutesResult<Option<AudioPayload>> {
        let conn = self.connection().await?.lock().await;
        let payload = conn
            .query_row(
                "SELECT bytes, mime FROM audio_blobs WHERE id = ?1",
                params![id],
                |row| {
                    let bytes: Vec<u8> = row.get(0)?;
                    let mime: String = row.get(1)?;
                    Ok(AudioPayload::new(bytes, mime))
                },
            )
            .optional()?;
        Ok(payload)
    }

    async fn put_audio(&self, id: &str, payload: &AudioPayload) -> MinutesResult<()> {
        let conn = self.connection().await?.lock().await;
        conn.execute(
            "INSERT OR REPLACE INTO audio_blobs (id, mime, bytes) VALUES (?1, ?2, ?3)",
            params![id, payload.mime, payload.bytes],
        )?;
        debug!("Stored {} bytes of audio for {}", payload.len(), id);
        Ok(())
    }

    async fn delete_audio(&self, id: &str) -> MinutesResult<bool> {
        let conn = self.connection().await?.lock().await;
        let removed = conn.execute("DELETE FROM audio_blobs WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_migrate_creates_tables() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        migrate(&conn).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('kv_entries', 'audio_blobs')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_open_is_lazy() {
        let store = SqliteStore::in_memory();
        assert_eq!(store.open_count(), 0);
        store.put_value("k", "v").await.unwrap();
        store.get_value("k").await.unwrap();
        assert_eq!(store.open_count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_use_opens_once() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(SqliteStore::new(dir.path().join("db").join("seatlog.db")));

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.put_value(&format!("k{i}"), "v").await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.open_count(), 1);
        assert_eq!(store.get_value("k7").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_values_upsert_and_delete() {
        let store = SqliteStore::in_memory();
        store.put_value("history", "[]").await.unwrap();
        store.put_value("history", "[1]").await.unwrap();
        assert_eq!(store.get_value("history").await.unwrap().as_deref(), Some("[1]"));

        store.delete_value("history").await.unwrap();
        assert_eq!(store.get_value("history").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_audio_bytes_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("seatlog.db");
        let payload = AudioPayload::new(vec![0, 255, 7, 0], "audio/ogg;codecs=opus");

        SqliteStore::new(&path).put_audio("session-1", &payload).await.unwrap();

        let reopened = SqliteStore::new(&path);
        assert_eq!(reopened.get_audio("session-1").await.unwrap(), Some(payload));
        assert!(reopened.delete_audio("session-1").await.unwrap());
        assert!(!reopened.delete_audio("session-1").await.unwrap());
        assert_eq!(reopened.get_audio("session-1").await.unwrap(), None);
    }
}
