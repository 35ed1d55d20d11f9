use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

use super::{ContentStore, KeyValueStore};
use crate::error::{MinutesError, MinutesResult};
use crate::recording::AudioPayload;

/// Process-local store for tests and hosts without durable storage.
///
/// Audio writes and deletes can be made to fail to exercise the partial-write
/// paths of [`SessionStore`](super::SessionStore).
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
    audio: Mutex<HashMap<String, AudioPayload>>,
    fail_audio_writes: AtomicBool,
    fail_audio_deletes: AtomicBool,
    fail_value_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_audio_writes(&self, fail: bool) {
        self.fail_audio_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_audio_deletes(&self, fail: bool) {
        self.fail_audio_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_value_writes(&self, fail: bool) {
        self.fail_value_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn audio_count(&self) -> usize {
        self.audio.lock().await.len()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get_value(&self, key: &str) -> MinutesResult<Option<String>> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn put_value(&self, key: &str, value: &str) -> MinutesResult<()> {
        if self.fail_value_writes.load(Ordering::SeqCst) {
            return Err(MinutesError::StorageUnavailable(format!(
                "write to {} rejected",
                key
            )));
        }
        self.values
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete_value(&self, key: &str) -> MinutesResult<()> {
        self.values.lock().await.remove(key);
        Ok(())
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn get_audio(&self, id: &str) -> MinutesResult<Option<AudioPayload>> {
        Ok(self.audio.lock().await.get(id).cloned())
    }

    async fn put_audio(&self, id: &str, payload: &AudioPayload) -> MinutesResult<()> {
        if self.fail_audio_writes.load(Ordering::SeqCst) {
            return Err(MinutesError::StorageUnavailable(format!(
                "audio write for {} rejected",
                id
            )));
        }
        self.audio
            .lock()
            .await
            .insert(id.to_string(), payload.clone());
        Ok(())
    }

    async fn delete_audio(&self, id: &str) -> MinutesResult<bool> {
        if self.fail_audio_deletes.load(Ordering::SeqCst) {
            return Err(MinutesError::StorageUnavailable(format!(
                "audio delete for {} rejected",
                id
            )));
        }
        Ok(self.audio.lock().await.remove(id).is_some())
    }
}
