//! Synchronises the speaker highlight with an audio transport.
//!
//! Every transport change (progress tick, seek, row click) is routed through
//! [`PlaybackSynchronizer::on_progress`], so the highlight is always derived
//! from the same active-entry rule.

use tracing::debug;

use super::{SpeakerLogEntry, SpeakerTimeline};

/// Result of one synchronisation pass. Rows are newest-first display rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncUpdate {
    pub active_speaker: Option<String>,
    pub highlighted_row: Option<usize>,
    pub changed: bool,
    /// Set only when the highlight moved to a new row while playing.
    pub scroll_to_row: Option<usize>,
}

/// Transport request produced by clicking a log row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeekRequest {
    pub position_ms: u64,
    pub resume: bool,
    pub update: SyncUpdate,
}

#[derive(Debug, Clone, Default)]
pub struct PlaybackSynchronizer {
    timeline: SpeakerTimeline,
    highlighted: Option<usize>,
    position_ms: u64,
    playing: bool,
}

impl PlaybackSynchronizer {
    pub fn new(timeline: SpeakerTimeline) -> Self {
        Self {
            timeline,
            ..Self::default()
        }
    }

    pub fn timeline(&self) -> &SpeakerTimeline {
        &self.timeline
    }

    /// Swap in a newer snapshot of the log (live sessions keep growing).
    /// The highlight is recomputed on the next progress event.
    pub fn replace_timeline(&mut self, timeline: SpeakerTimeline) {
        self.timeline = timeline;
        self.highlighted = None;
    }

    pub fn rows(&self) -> Vec<&SpeakerLogEntry> {
        self.timeline.newest_first().collect()
    }

    pub fn position_ms(&self) -> u64 {
        self.position_ms
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn highlighted_row(&self) -> Option<usize> {
        self.highlighted.and_then(|i| self.timeline.row_for_index(i))
    }

    pub fn on_progress(&mut self, position_ms: u64, playing: bool) -> SyncUpdate {
        self.position_ms = position_ms;
        self.playing = playing;

        let active = self.timeline.active_index_at(position_ms);
        let changed = active != self.highlighted;
        self.highlighted = active;

        let highlighted_row = active.and_then(|i| self.timeline.row_for_index(i));
        let scroll_to_row = if changed && playing { highlighted_row } else { None };

        if changed {
            debug!("Active speaker row now {:?}", highlighted_row);
        }

        SyncUpdate {
            active_speaker: active.map(|i| self.timeline.entries()[i].speaker.clone()),
            highlighted_row,
            changed,
            scroll_to_row,
        }
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Seek to the entry shown at display `row` and resume playback. The seek
    /// is synchronised with the transport state as it was before resuming.
    pub fn seek_to_row(&mut self, row: usize) -> Option<SeekRequest> {
        let index = self.timeline.index_for_row(row)?;
        let position_ms = self.timeline.entries()[index].elapsed_ms;

        let update = self.on_progress(position_ms, self.playing);
        self.playing = true;

        Some(SeekRequest {
            position_ms,
            resume: true,
            update,
        })
    }
}
