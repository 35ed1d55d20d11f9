//! Session history persistence.
//!
//! All metadata records live as one JSON array under the configured history
//! key, newest first. Audio is written to the content store under the session
//! id. Metadata is authoritative for whether a session exists.

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{ContentStore, KeyValueStore};
use crate::error::{MinutesError, MinutesResult};
use crate::recording::AudioPayload;
use crate::timeline::{format_clock, parse_clock, SpeakerLogEntry, SpeakerTimeline};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeakerLogRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub alias: String,
    /// `MM:SS` offset from the recording start.
    pub time: String,
    /// Full-precision offset. Absent in records written at second resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
}

impl SpeakerLogRecord {
    pub fn from_entry(entry: &SpeakerLogEntry) -> Self {
        Self {
            id: entry.id.clone(),
            name: entry.speaker.clone(),
            alias: entry.alias.clone(),
            time: entry.clock(),
            elapsed_ms: Some(entry.elapsed_ms),
        }
    }

    pub fn to_entry(&self) -> SpeakerLogEntry {
        let elapsed_ms = self
            .elapsed_ms
            .or_else(|| parse_clock(&self.time))
            .unwrap_or_else(|| {
                warn!("Unreadable log time {:?} on {}, using 00:00", self.time, self.id);
                0
            });
        SpeakerLogEntry {
            id: self.id.clone(),
            speaker: self.name.clone(),
            alias: self.alias.clone(),
            elapsed_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: String,
    pub name: String,
    pub date: String,
    pub time: String,
    /// `MM:SS`.
    pub duration: String,
    pub has_audio: bool,
    #[serde(default)]
    pub speaker_log: Vec<SpeakerLogRecord>,
}

impl SessionRecord {
    /// Chronological timeline rebuilt from the stored log.
    pub fn timeline(&self) -> SpeakerTimeline {
        SpeakerTimeline::from_entries(self.speaker_log.iter().map(SpeakerLogRecord::to_entry).collect())
    }
}

/// What a finished recording hands to [`SessionStore::save`].
#[derive(Debug, Clone, Default)]
pub struct SessionDraft {
    pub name: String,
    pub duration_ms: u64,
    pub entries: Vec<SpeakerLogEntry>,
    pub audio: Option<AudioPayload>,
}

impl SessionDraft {
    /// A draft with neither audio nor speaker entries is not worth keeping.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.audio.as_ref().map_or(true, AudioPayload::is_empty)
    }
}

#[derive(Debug)]
pub struct SaveReport {
    pub record: SessionRecord,
    /// Set when audio was present but could not be written; the record then
    /// carries `has_audio = false`.
    pub audio_error: Option<MinutesError>,
}

#[derive(Debug)]
pub struct DeleteReport {
    pub id: String,
    pub metadata_removed: bool,
    /// Outcome of the audio delete: whether a payload existed, or why the
    /// delete failed.
    pub audio: MinutesResult<bool>,
}

pub struct SessionStore {
    values: Arc<dyn KeyValueStore>,
    content: Arc<dyn ContentStore>,
    history_key: String,
}

impl SessionStore {
    pub fn new(values: Arc<dyn KeyValueStore>, content: Arc<dyn ContentStore>, history_key: impl Into<String>) -> Self {
        Self {
            values,
            content,
            history_key: history_key.into(),
        }
    }

    /// Use one backend for both metadata and audio.
    pub fn with_backend<S>(backend: Arc<S>, history_key: impl Into<String>) -> Self
    where
        S: KeyValueStore + ContentStore + 'static,
    {
        Self::new(backend.clone(), backend, history_key)
    }

    /// Read the history, write audio, then metadata. The writes are not
    /// atomic: a failed audio write still saves the record with
    /// `has_audio = false`; a failed metadata write fails the save and drops
    /// the orphaned audio. An unreadable history fails before any audio is
    /// stored.
    pub async fn save(&self, draft: SessionDraft) -> MinutesResult<SaveReport> {
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(MinutesError::Validation("Please enter a session name.".to_string()));
        }
        if draft.is_empty() {
            return Err(MinutesError::Validation(
                "Nothing to save: no audio and no speaker log.".to_string(),
            ));
        }

        let mut history = self.read_history().await?;
        let id = format!("session-{}", Uuid::new_v4().simple());
        let now = Local::now();

        let mut has_audio = false;
        let mut audio_error = None;
        if let Some(payload) = draft.audio.as_ref().filter(|p| !p.is_empty()) {
            match self.content.put_audio(&id, payload).await {
                Ok(()) => has_audio = true,
                Err(e) => {
                    error!("Failed to store audio for {}: {}", id, e);
                    audio_error = Some(e);
                }
            }
        }

        let record = SessionRecord {
            id: id.clone(),
            name: name.to_string(),
            date: now.format("%Y-%m-%d").to_string(),
            time: now.format("%H:%M:%S").to_string(),
            duration: format_clock(draft.duration_ms),
            has_audio,
            speaker_log: draft.entries.iter().map(SpeakerLogRecord::from_entry).collect(),
        };

        history.insert(0, record.clone());
        if let Err(e) = self.write_history(&history).await {
            if has_audio {
                if let Err(cleanup) = self.content.delete_audio(&id).await {
                    warn!("Orphaned audio left for {}: {}", id, cleanup);
                }
            }
            return Err(e);
        }

        info!(
            "Saved session {} ({:?}, {} log entries, audio: {})",
            id,
            record.name,
            record.speaker_log.len(),
            has_audio
        );
        Ok(SaveReport { record, audio_error })
    }

    /// All session records, newest first. Audio is not fetched.
    pub async fn load(&self) -> MinutesResult<Vec<SessionRecord>> {
        self.read_history().await
    }

    pub async fn get(&self, id: &str) -> MinutesResult<SessionRecord> {
        self.read_history()
            .await?
            .into_iter()
            .find(|record| record.id == id)
            .ok_or_else(|| MinutesError::NotFound(format!("Session {} no longer exists.", id)))
    }

    /// Remove the record, then attempt the audio delete regardless. A failed
    /// audio delete is reported, never raised.
    pub async fn delete(&self, id: &str) -> MinutesResult<DeleteReport> {
        let mut history = self.read_history().await?;
        let before = history.len();
        history.retain(|record| record.id != id);
        let metadata_removed = history.len() != before;

        if metadata_removed {
            self.write_history(&history).await?;
        }

        let audio = self.content.delete_audio(id).await;
        if let Err(e) = &audio {
            warn!("Audio delete for {} failed: {}", id, e);
        }

        info!("Deleted session {} (metadata removed: {})", id, metadata_removed);
        Ok(DeleteReport {
            id: id.to_string(),
            metadata_removed,
            audio,
        })
    }

    pub async fn fetch_audio(&self, id: &str) -> MinutesResult<AudioPayload> {
        let record = self.get(id).await?;
        if !record.has_audio {
            return Err(MinutesError::NotFound(
                "No audio was recorded for this session.".to_string(),
            ));
        }

        match self.content.get_audio(id).await? {
            Some(payload) if !payload.is_empty() => Ok(payload),
            _ => Err(MinutesError::NotFound("Audio not found in storage.".to_string())),
        }
    }

    async fn read_history(&self) -> MinutesResult<Vec<SessionRecord>> {
        match self.values.get_value(&self.history_key).await? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    async fn write_history(&self, history: &[SessionRecord]) -> MinutesResult<()> {
        let json = serde_json::to_string(history)?;
        self.values.put_value(&self.history_key, &json).await
    }
}
