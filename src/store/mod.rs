//! Durable storage contracts.
//!
//! Structured session metadata lives in a string key-value store; audio lives
//! in a separate content store keyed by session id. The two are written
//! independently and never locked against each other.

pub mod memory;
pub mod session_store;
pub mod sqlite;

use async_trait::async_trait;

use crate::error::MinutesResult;
use crate::recording::AudioPayload;

pub use memory::MemoryStore;
pub use session_store::{DeleteReport, SaveReport, SessionDraft, SessionRecord, SessionStore, SpeakerLogRecord};
pub use sqlite::SqliteStore;

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get_value(&self, key: &str) -> MinutesResult<Option<String>>;

    async fn put_value(&self, key: &str, value: &str) -> MinutesResult<()>;

    async fn delete_value(&self, key: &str) -> MinutesResult<()>;
}

#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn get_audio(&self, id: &str) -> MinutesResult<Option<AudioPayload>>;

    async fn put_audio(&self, id: &str, payload: &AudioPayload) -> MinutesResult<()>;

    /// Returns whether a payload existed under `id`.
    async fn delete_audio(&self, id: &str) -> MinutesResult<bool>;
}
