//! Export of a session as a metadata document plus an audio file.

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::MinutesResult;
use crate::recording::AudioPayload;
use crate::store::SessionRecord;
use crate::timeline::SpeakerLogEntry;

const DEFAULT_SESSION_NAME: &str = "Untitled Session";

pub fn extension_for_mime(mime: &str) -> &'static str {
    if mime.contains("mpeg") {
        "mp3"
    } else if mime.contains("ogg") {
        "ogg"
    } else {
        "webm"
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportLogLine {
    pub name: String,
    pub alias: String,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMetadata {
    pub session_name: String,
    pub date: String,
    pub log: Vec<ExportLogLine>,
}

impl ExportMetadata {
    /// Metadata for the live session. Log lines are chronological.
    pub fn from_entries(session_name: &str, entries: &[SpeakerLogEntry]) -> Self {
        let session_name = match session_name.trim() {
            "" => DEFAULT_SESSION_NAME.to_string(),
            name => name.to_string(),
        };
        Self {
            session_name,
            date: Local::now().to_rfc3339(),
            log: entries
                .iter()
                .map(|entry| ExportLogLine {
                    name: entry.speaker.clone(),
                    alias: entry.alias.clone(),
                    time: entry.clock(),
                })
                .collect(),
        }
    }

    pub fn from_record(record: &SessionRecord) -> Self {
        Self {
            session_name: record.name.clone(),
            date: format!("{} {}", record.date, record.time),
            log: record
                .timeline()
                .entries()
                .iter()
                .map(|entry| ExportLogLine {
                    name: entry.speaker.clone(),
                    alias: entry.alias.clone(),
                    time: entry.clock(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFiles {
    pub metadata: PathBuf,
    pub audio: Option<PathBuf>,
}

/// Write `minutes-<stamp>.json` and, when audio is present,
/// `audio-<stamp>.<ext>` into `dir`.
pub fn write_export(dir: &Path, metadata: &ExportMetadata, audio: Option<&AudioPayload>) -> MinutesResult<ExportedFiles> {
    fs::create_dir_all(dir)?;
    let stamp = Local::now().format("%Y%m%d-%H%M%S%3f");

    let metadata_path = dir.join(format!("minutes-{}.json", stamp));
    fs::write(&metadata_path, serde_json::to_string_pretty(metadata)?)?;

    let audio_path = match audio.filter(|payload| !payload.is_empty()) {
        Some(payload) => {
            let path = dir.join(format!("audio-{}.{}", stamp, extension_for_mime(&payload.mime)));
            fs::write(&path, &payload.bytes)?;
            Some(path)
        }
        None => None,
    };

    info!(
        "Exported {} ({} log lines) to {}",
        metadata.session_name,
        metadata.log.len(),
        dir.display()
    );
    Ok(ExportedFiles {
        metadata: metadata_path,
        audio: audio_path,
    })
}
