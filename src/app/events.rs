use std::path::PathBuf;

use crate::error::Notice;
use crate::export::ExportedFiles;
use crate::placement::{BoardLayout, DragTarget, Hover, Person, Point, PointerInput, Stage, TableShape};
use crate::recording::AudioPayload;
use crate::store::SessionRecord;
use crate::timeline::SpeakerLogEntry;

/// Everything the host can tell the meeting core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Viewport bounds of the canvas and absent zone changed.
    Layout(BoardLayout),
    /// A freshly imported member list.
    LoadRoster(Vec<Person>),
    PointerDown { target: DragTarget, input: PointerInput },
    PointerMove(PointerInput),
    PointerUp(PointerInput),
    PointerCancel { pointer_id: i32 },
    AddTable(TableShape),
    DeleteTable(String),
    ClearTables,
    AddGuest(String),
    RemoveGuest(String),
    ConfirmSetup { session_name: String },
    SetSessionName(String),
    StartRecording,
    StopRecording,
    /// The 1s UI timer fired.
    TimerTick,
    /// The capture device delivered an encoded segment.
    CaptureSegment(Vec<u8>),
    /// Retry a save that was withheld.
    SaveSession,
    PlaybackProgress { position_ms: u64, playing: bool },
    TimelineRowClicked(usize),
    OpenReplay,
    OpenHistorySession(String),
    CloseReplay,
    RefreshHistory,
    DeleteSession(String),
    ExportSession { dir: PathBuf },
    NewSession,
}

/// What the host should render or do in response to an event.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    ShowProxy { pointer_id: i32, person_id: String, at: Point },
    MoveProxy { pointer_id: i32, at: Point },
    HideProxy { pointer_id: i32 },
    HoverZone { pointer_id: i32, hover: Hover },
    RosterChanged,
    TablesChanged,
    StageChanged(Stage),
    SpeakerChanged(Option<String>),
    LogAppended(SpeakerLogEntry),
    Timer(String),
    RecordingStarted { with_audio: bool },
    RecordingStopped { duration: String, has_audio: bool },
    SessionSaved(SessionRecord),
    History(Vec<SessionRecord>),
    LoadAudio(AudioPayload),
    /// Log rows for the replay view, newest first.
    ShowTimeline(Vec<SpeakerLogEntry>),
    Highlight { row: Option<usize>, speaker: Option<String> },
    ScrollTo(usize),
    Seek(u64),
    Play,
    Pause,
    Exported(ExportedFiles),
    Notice(Notice),
}
