//! Time-indexed speaker log.
//!
//! Entries are kept in append (chronological) order with raw millisecond
//! offsets from the recording epoch; hosts display them newest-first.
//! Formatting to `MM:SS` happens only at the display/persistence edge.

pub mod playback;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{MinutesError, MinutesResult};

pub use playback::{PlaybackSynchronizer, SeekRequest, SyncUpdate};

/// One speaker change. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeakerLogEntry {
    pub id: String,
    pub speaker: String,
    pub alias: String,
    /// Milliseconds since the recording epoch.
    pub elapsed_ms: u64,
}

impl SpeakerLogEntry {
    pub fn new(speaker: impl Into<String>, alias: impl Into<String>, elapsed_ms: u64) -> Self {
        Self {
            id: format!("log-{}", Uuid::new_v4().simple()),
            speaker: speaker.into(),
            alias: alias.into(),
            elapsed_ms,
        }
    }

    pub fn clock(&self) -> String {
        format_clock(self.elapsed_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpeakerTimeline {
    epoch_start_ms: Option<u64>,
    entries: Vec<SpeakerLogEntry>,
}

impl SpeakerTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a timeline from stored entries. Out-of-order input is sorted
    /// stably, so equal times keep their stored relative order.
    pub fn from_entries(mut entries: Vec<SpeakerLogEntry>) -> Self {
        if entries.windows(2).any(|w| w[0].elapsed_ms > w[1].elapsed_ms) {
            warn!("Speaker log out of order, re-sorting {} entries", entries.len());
            entries.sort_by_key(|e| e.elapsed_ms);
        }
        Self {
            epoch_start_ms: None,
            entries,
        }
    }

    /// Anchor subsequent appends to `start_ms` (a reading of the recording
    /// clock).
    pub fn open_epoch(&mut self, start_ms: u64) {
        self.epoch_start_ms = Some(start_ms);
    }

    pub fn close_epoch(&mut self) {
        self.epoch_start_ms = None;
    }

    pub fn epoch_start(&self) -> Option<u64> {
        self.epoch_start_ms
    }

    pub fn is_live(&self) -> bool {
        self.epoch_start_ms.is_some()
    }

    /// Log `speaker` at `now_ms − epoch`. Elapsed times never decrease: a clock
    /// reading earlier than the previous entry is pinned to it.
    ///
    /// Two appends inside the same second stay distinct entries here, but
    /// collapse to the same `MM:SS` once persisted in second resolution; lookup
    /// then resolves the tie to the later insertion.
    pub fn append(&mut self, speaker: &str, alias: &str, now_ms: u64) -> MinutesResult<&SpeakerLogEntry> {
        let epoch = self.epoch_start_ms.ok_or_else(|| {
            MinutesError::InvalidState("No recording in progress.".to_string())
        })?;

        let mut elapsed_ms = now_ms.saturating_sub(epoch);
        if let Some(last) = self.entries.last() {
            elapsed_ms = elapsed_ms.max(last.elapsed_ms);
        }

        debug!("Speaker {} at {}", speaker, format_clock(elapsed_ms));
        self.entries.push(SpeakerLogEntry::new(speaker, alias, elapsed_ms));
        Ok(&self.entries[self.entries.len() - 1])
    }

    pub fn entries(&self) -> &[SpeakerLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.epoch_start_ms = None;
    }

    pub fn newest_first(&self) -> impl Iterator<Item = &SpeakerLogEntry> {
        self.entries.iter().rev()
    }

    /// Index of the most recent entry with `elapsed ≤ position_ms`.
    pub fn active_index_at(&self, position_ms: u64) -> Option<usize> {
        let count = self.entries.partition_point(|e| e.elapsed_ms <= position_ms);
        count.checked_sub(1)
    }

    pub fn active_at(&self, position_ms: u64) -> Option<&SpeakerLogEntry> {
        self.active_index_at(position_ms).map(|i| &self.entries[i])
    }

    /// Map a chronological index to its newest-first display row, and back.
    pub fn row_for_index(&self, index: usize) -> Option<usize> {
        (index < self.entries.len()).then(|| self.entries.len() - 1 - index)
    }

    pub fn index_for_row(&self, row: usize) -> Option<usize> {
        self.row_for_index(row)
    }
}

/// `MM:SS`, minutes zero-padded to at least two digits and unbounded above.
pub fn format_clock(ms: u64) -> String {
    let total_seconds = ms / 1000;
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// Parse `MM:SS` into milliseconds.
pub fn parse_clock(text: &str) -> Option<u64> {
    let (minutes, seconds) = text.trim().split_once(':')?;
    let minutes: u64 = minutes.parse().ok()?;
    let seconds: u64 = seconds.parse().ok()?;
    if seconds >= 60 {
        return None;
    }
    Some((minutes * 60 + seconds) * 1000)
}
