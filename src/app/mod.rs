//! The meeting context: one owner per concern, one update function.
//!
//! [`MeetingApp::dispatch`] takes a typed [`AppEvent`], mutates the owning
//! component, and returns the [`Effect`]s the host should apply. Storage
//! completions are awaited inside dispatch, so every event is handled to
//! completion before the next one.

mod events;

pub use events::{AppEvent, Effect};

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{MinutesError, MinutesResult, Notice, Tone};
use crate::export::{write_export, ExportMetadata};
use crate::placement::{
    BoardLayout, DragTarget, DropOutcome, MoveOutcome, PlacementEngine, PointerInput, Stage, TableShape,
};
use crate::recording::{AudioCapture, AudioPayload, Clock, RecordingController, RecordingPhase, StartOutcome};
use crate::store::{SessionDraft, SessionRecord, SessionStore};
use crate::timeline::{format_clock, PlaybackSynchronizer, SpeakerTimeline, SyncUpdate};

pub struct MeetingApp {
    placement: PlacementEngine,
    recorder: RecordingController,
    timeline: SpeakerTimeline,
    sessions: SessionStore,
    playback: PlaybackSynchronizer,
    current_speaker: Option<String>,
    session_name: String,
    pending: Option<SessionDraft>,
}

impl MeetingApp {
    pub fn new(config: &Config, capture: Box<dyn AudioCapture>, clock: Arc<dyn Clock>, sessions: SessionStore) -> Self {
        Self {
            placement: PlacementEngine::new(config.board.clone()),
            recorder: RecordingController::new(capture, clock, config.recording.clone()),
            timeline: SpeakerTimeline::new(),
            sessions,
            playback: PlaybackSynchronizer::default(),
            current_speaker: None,
            session_name: String::new(),
            pending: None,
        }
    }

    pub fn placement(&self) -> &PlacementEngine {
        &self.placement
    }

    pub fn recorder(&self) -> &RecordingController {
        &self.recorder
    }

    pub fn timeline(&self) -> &SpeakerTimeline {
        &self.timeline
    }

    pub fn playback(&self) -> &PlaybackSynchronizer {
        &self.playback
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Id of the person currently marked as speaking.
    pub fn current_speaker(&self) -> Option<&str> {
        self.current_speaker.as_deref()
    }

    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    pub fn has_pending_save(&self) -> bool {
        self.pending.is_some()
    }

    pub async fn dispatch(&mut self, event: AppEvent) -> Vec<Effect> {
        debug!("dispatch {:?}", event);
        match event {
            AppEvent::Layout(layout) => self.set_layout(layout),
            AppEvent::LoadRoster(members) => {
                self.placement.roster_mut().replace_members(members);
                let mut effects = vec![Effect::RosterChanged];
                self.drop_missing_speaker(&mut effects);
                effects
            }
            AppEvent::PointerDown { target, input } => self.pointer_down(target, input),
            AppEvent::PointerMove(input) => self.pointer_move(input),
            AppEvent::PointerUp(input) => self.pointer_up(input),
            AppEvent::PointerCancel { pointer_id } => self.pointer_cancel(pointer_id),
            AppEvent::AddTable(shape) => self.add_table(shape),
            AppEvent::DeleteTable(table_id) => {
                if self.placement.delete_table(&table_id) {
                    vec![Effect::TablesChanged]
                } else {
                    vec![]
                }
            }
            AppEvent::ClearTables => {
                if self.placement.clear_tables() {
                    vec![Effect::TablesChanged, Effect::RosterChanged]
                } else {
                    vec![]
                }
            }
            AppEvent::AddGuest(name) => self.add_guest(&name),
            AppEvent::RemoveGuest(person_id) => self.remove_guest(&person_id),
            AppEvent::ConfirmSetup { session_name } => self.confirm_setup(&session_name),
            AppEvent::SetSessionName(name) => {
                self.session_name = name.trim().to_string();
                vec![]
            }
            AppEvent::StartRecording => self.start_recording(),
            AppEvent::StopRecording => self.stop_recording().await,
            AppEvent::TimerTick => self.recorder.tick().map(Effect::Timer).into_iter().collect(),
            AppEvent::CaptureSegment(bytes) => {
                self.recorder.push_segment(bytes);
                vec![]
            }
            AppEvent::SaveSession => self.save_pending().await,
            AppEvent::PlaybackProgress { position_ms, playing } => {
                let update = self.playback.on_progress(position_ms, playing);
                sync_effects(update)
            }
            AppEvent::TimelineRowClicked(row) => self.seek_to_row(row),
            AppEvent::OpenReplay => self.open_replay(),
            AppEvent::OpenHistorySession(id) => self.open_history_session(&id).await,
            AppEvent::CloseReplay => {
                self.playback.pause();
                vec![Effect::Pause, Effect::Seek(0)]
            }
            AppEvent::RefreshHistory => self.history_effects().await,
            AppEvent::DeleteSession(id) => self.delete_session(&id).await,
            AppEvent::ExportSession { dir } => self.export_session(&dir),
            AppEvent::NewSession => self.new_session().await,
        }
    }

    fn set_layout(&mut self, layout: BoardLayout) -> Vec<Effect> {
        self.placement.set_layout(layout);
        vec![]
    }

    fn pointer_down(&mut self, target: DragTarget, input: PointerInput) -> Vec<Effect> {
        let is_table = !matches!(target, DragTarget::Person(_));
        if self.placement.begin_drag(target, input) && is_table {
            // Table gestures select the table immediately.
            return vec![Effect::TablesChanged];
        }
        vec![]
    }

    fn pointer_move(&mut self, input: PointerInput) -> Vec<Effect> {
        let pointer_id = input.pointer_id;
        match self.placement.update_drag(input) {
            MoveOutcome::Ignored | MoveOutcome::Pending => vec![],
            MoveOutcome::ProxyStarted { person_id, at, hover } => vec![
                Effect::ShowProxy {
                    pointer_id,
                    person_id,
                    at,
                },
                Effect::HoverZone { pointer_id, hover },
            ],
            MoveOutcome::ProxyMoved {
                at,
                hover,
                hover_changed,
            } => {
                let mut effects = vec![Effect::MoveProxy { pointer_id, at }];
                if hover_changed {
                    effects.push(Effect::HoverZone { pointer_id, hover });
                }
                effects
            }
            MoveOutcome::TableMoved { .. } | MoveOutcome::TableResized { .. } => {
                vec![Effect::TablesChanged]
            }
        }
    }

    fn pointer_up(&mut self, input: PointerInput) -> Vec<Effect> {
        let pointer_id = input.pointer_id;
        let showed_proxy = self.shows_proxy(pointer_id);

        let mut effects = Vec::new();
        if showed_proxy {
            effects.push(Effect::HideProxy { pointer_id });
        }

        let outcome = self.placement.end_drag(input);
        if outcome.mutated_roster() {
            effects.push(Effect::RosterChanged);
        }
        match outcome {
            DropOutcome::Clicked { person_id } => effects.extend(self.select_speaker(&person_id)),
            DropOutcome::TableReleased { .. } => effects.push(Effect::TablesChanged),
            _ => {}
        }
        effects
    }

    fn pointer_cancel(&mut self, pointer_id: i32) -> Vec<Effect> {
        let showed_proxy = self.shows_proxy(pointer_id);
        match self.placement.cancel_drag(pointer_id) {
            Some(_) if showed_proxy => vec![Effect::HideProxy { pointer_id }],
            _ => vec![],
        }
    }

    fn shows_proxy(&self, pointer_id: i32) -> bool {
        self.placement.session(pointer_id).is_some_and(|s| s.shows_proxy())
    }

    /// Clicking a person during the meeting makes them the current speaker and,
    /// while recording, logs the change.
    fn select_speaker(&mut self, person_id: &str) -> Vec<Effect> {
        if self.placement.stage() != Stage::Live {
            return vec![];
        }
        let Some(person) = self.placement.roster().person(person_id) else {
            return vec![];
        };
        let (name, alias) = (person.name.clone(), person.alias.clone());

        self.current_speaker = Some(person_id.to_string());
        let mut effects = vec![Effect::SpeakerChanged(Some(name.clone()))];

        if self.recorder.is_recording() {
            let now = self.recorder.now_ms();
            match self.timeline.append(&name, &alias, now) {
                Ok(entry) => effects.push(Effect::LogAppended(entry.clone())),
                Err(e) => warn!("Speaker change not logged: {}", e),
            }
        }
        effects
    }

    fn drop_missing_speaker(&mut self, effects: &mut Vec<Effect>) {
        let missing = self
            .current_speaker
            .as_deref()
            .is_some_and(|id| self.placement.roster().person(id).is_none());
        if missing {
            self.current_speaker = None;
            effects.push(Effect::SpeakerChanged(None));
        }
    }

    fn add_table(&mut self, shape: TableShape) -> Vec<Effect> {
        match self.placement.add_table(shape) {
            Some(_) => vec![Effect::TablesChanged],
            None => vec![notice(&MinutesError::InvalidState(
                "Tables can only be edited during setup.".to_string(),
            ))],
        }
    }

    fn add_guest(&mut self, name: &str) -> Vec<Effect> {
        match self.placement.roster_mut().add_guest(name) {
            Ok(_) => vec![Effect::RosterChanged],
            Err(e) => vec![Effect::Notice(Notice::new(
                Tone::Warning,
                "Guest Not Added",
                e.to_string(),
            ))],
        }
    }

    fn remove_guest(&mut self, person_id: &str) -> Vec<Effect> {
        if !self.placement.roster_mut().remove_guest(person_id) {
            return vec![];
        }
        let mut effects = vec![Effect::RosterChanged];
        self.drop_missing_speaker(&mut effects);
        effects
    }

    fn confirm_setup(&mut self, session_name: &str) -> Vec<Effect> {
        let name = session_name.trim();
        if name.is_empty() {
            return vec![Effect::Notice(
                Notice::new(Tone::Warning, "Session Name Required", "Please enter a session name.").blocking(),
            )];
        }
        self.session_name = name.to_string();
        self.placement.set_stage(Stage::Live);
        info!("Setup confirmed for {:?}", self.session_name);
        vec![Effect::TablesChanged, Effect::StageChanged(Stage::Live)]
    }

    fn start_recording(&mut self) -> Vec<Effect> {
        if self.placement.stage() != Stage::Live {
            return vec![notice(&MinutesError::InvalidState(
                "Confirm the setup before recording.".to_string(),
            ))];
        }

        let outcome = match self.recorder.start() {
            Ok(outcome) => outcome,
            Err(e) => return vec![notice(&e)],
        };

        self.timeline.clear();
        if let Some(epoch) = self.recorder.epoch_start() {
            self.timeline.open_epoch(epoch);
        }

        let mut effects = Vec::new();
        let with_audio = match outcome {
            StartOutcome::Capturing { .. } => true,
            StartOutcome::TimelineOnly { reason } => {
                effects.push(notice(&MinutesError::PermissionDenied(reason)));
                false
            }
        };
        effects.push(Effect::RecordingStarted { with_audio });
        effects.push(Effect::Timer(format_clock(0)));
        effects
    }

    async fn stop_recording(&mut self) -> Vec<Effect> {
        let stopped = match self.recorder.stop() {
            Ok(stopped) => stopped,
            Err(e) => return vec![notice(&e)],
        };
        self.timeline.close_epoch();

        let mut effects = vec![
            Effect::Timer(format_clock(stopped.duration_ms)),
            Effect::RecordingStopped {
                duration: format_clock(stopped.duration_ms),
                has_audio: stopped.payload.is_some(),
            },
        ];

        let draft = SessionDraft {
            name: self.session_name.clone(),
            duration_ms: stopped.duration_ms,
            entries: self.timeline.entries().to_vec(),
            audio: stopped.payload,
        };
        effects.extend(self.persist(draft).await);
        effects
    }

    async fn save_pending(&mut self) -> Vec<Effect> {
        match self.pending.take() {
            Some(mut draft) => {
                draft.name = self.session_name.clone();
                self.persist(draft).await
            }
            None => vec![Effect::Notice(Notice::new(Tone::Info, "Nothing to Save", "There is no unsaved session."))],
        }
    }

    /// Save a finished draft. Drafts that cannot be saved yet (missing name,
    /// storage down) are kept for a later `SaveSession`.
    async fn persist(&mut self, draft: SessionDraft) -> Vec<Effect> {
        if draft.is_empty() {
            debug!("Nothing recorded, skipping save");
            return vec![];
        }
        if draft.name.trim().is_empty() {
            self.pending = Some(draft);
            return vec![notice(&MinutesError::Validation("Please enter a session name.".to_string()))];
        }

        match self.sessions.save(draft.clone()).await {
            Ok(report) => {
                let mut effects = vec![Effect::SessionSaved(report.record)];
                if let Some(e) = report.audio_error {
                    effects.push(Effect::Notice(Notice::new(
                        Tone::Error,
                        "Audio Not Saved",
                        format!("The session was saved without audio. {}", e),
                    )));
                }
                effects.extend(self.history_effects().await);
                effects
            }
            Err(e) => {
                warn!("Session save withheld: {}", e);
                self.pending = Some(draft);
                vec![notice(&e)]
            }
        }
    }

    fn seek_to_row(&mut self, row: usize) -> Vec<Effect> {
        let Some(request) = self.playback.seek_to_row(row) else {
            return vec![];
        };
        let mut effects = vec![Effect::Seek(request.position_ms)];
        effects.extend(sync_effects(request.update));
        if request.resume {
            effects.push(Effect::Play);
        }
        effects
    }

    fn open_replay(&mut self) -> Vec<Effect> {
        if self.recorder.phase() != RecordingPhase::Stopped {
            return vec![notice(&MinutesError::NotFound("Nothing to replay yet.".to_string()))];
        }
        let Some(payload) = self.recorder.payload().cloned() else {
            return vec![notice(&MinutesError::NotFound("Nothing to replay yet.".to_string()))];
        };
        self.playback.replace_timeline(self.timeline.clone());
        self.replay_effects(payload)
    }

    async fn open_history_session(&mut self, id: &str) -> Vec<Effect> {
        let record = match self.sessions.get(id).await {
            Ok(record) => record,
            Err(e) => return vec![notice(&e)],
        };
        let payload = match self.sessions.fetch_audio(id).await {
            Ok(payload) => payload,
            Err(e) => return vec![notice(&e)],
        };
        if record.speaker_log.is_empty() {
            return vec![notice(&MinutesError::NotFound("No speaker log for this session.".to_string()))];
        }

        info!("Replaying session {} ({:?})", record.id, record.name);
        self.playback.replace_timeline(record.timeline());
        self.replay_effects(payload)
    }

    fn replay_effects(&mut self, payload: AudioPayload) -> Vec<Effect> {
        let rows = self.playback.rows().into_iter().cloned().collect();
        let mut effects = vec![Effect::LoadAudio(payload), Effect::ShowTimeline(rows)];
        effects.extend(sync_effects(self.playback.on_progress(0, true)));
        effects.push(Effect::Play);
        effects
    }

    async fn history_effects(&self) -> Vec<Effect> {
        match self.sessions.load().await {
            Ok(records) => vec![Effect::History(records)],
            Err(e) => vec![notice(&e)],
        }
    }

    /// History records, newest first.
    pub async fn history(&self) -> MinutesResult<Vec<SessionRecord>> {
        self.sessions.load().await
    }

    async fn delete_session(&mut self, id: &str) -> Vec<Effect> {
        let report = match self.sessions.delete(id).await {
            Ok(report) => report,
            Err(e) => return vec![notice(&e)],
        };

        let mut effects = Vec::new();
        if !report.metadata_removed {
            effects.push(notice(&MinutesError::NotFound(format!(
                "Session {} no longer exists.",
                id
            ))));
        }
        if let Err(e) = report.audio {
            effects.push(Effect::Notice(Notice::new(
                Tone::Warning,
                "Audio Not Removed",
                format!("The session was deleted but its audio could not be removed. {}", e),
            )));
        }
        effects.extend(self.history_effects().await);
        effects
    }

    fn export_session(&mut self, dir: &Path) -> Vec<Effect> {
        if self.recorder.is_recording() {
            return vec![notice(&MinutesError::InvalidState(
                "Please stop recording first.".to_string(),
            ))];
        }
        let audio = self.recorder.payload();
        if audio.is_none() && self.timeline.is_empty() {
            return vec![notice(&MinutesError::NotFound("No audio recorded yet.".to_string()))];
        }

        let metadata = ExportMetadata::from_entries(&self.session_name, self.timeline.entries());
        match write_export(dir, &metadata, audio) {
            Ok(files) => vec![Effect::Exported(files)],
            Err(e) => vec![notice(&e)],
        }
    }

    /// Start over: refused while recording. An unsaved draft is saved first;
    /// if that still fails the reset is abandoned so nothing is lost.
    async fn new_session(&mut self) -> Vec<Effect> {
        if self.recorder.is_recording() {
            return vec![notice(&MinutesError::InvalidState(
                "Please stop recording first.".to_string(),
            ))];
        }

        let mut effects = Vec::new();
        if self.pending.is_some() {
            effects.extend(self.save_pending().await);
            if self.pending.is_some() {
                return effects;
            }
        }

        if let Err(e) = self.recorder.reset() {
            effects.push(notice(&e));
            return effects;
        }
        let cancelled = self.placement.cancel_all();
        if !cancelled.is_empty() {
            debug!("Cancelled {} drags for new session", cancelled.len());
        }
        effects.extend(
            cancelled
                .iter()
                .filter(|session| session.shows_proxy())
                .map(|session| Effect::HideProxy {
                    pointer_id: session.pointer_id,
                }),
        );
        self.placement.set_stage(Stage::Setup);
        self.placement.clear_tables();
        self.placement.roster_mut().reset_seats();
        self.timeline.clear();
        self.playback = PlaybackSynchronizer::default();
        self.current_speaker = None;
        self.session_name.clear();

        info!("New session started");
        effects.extend([
            Effect::Pause,
            Effect::SpeakerChanged(None),
            Effect::Timer(format_clock(0)),
            Effect::RosterChanged,
            Effect::TablesChanged,
            Effect::StageChanged(Stage::Setup),
        ]);
        effects
    }
}

fn notice(err: &MinutesError) -> Effect {
    Effect::Notice(Notice::from(err))
}

fn sync_effects(update: SyncUpdate) -> Vec<Effect> {
    let mut effects = Vec::new();
    if update.changed {
        effects.push(Effect::Highlight {
            row: update.highlighted_row,
            speaker: update.active_speaker,
        });
    }
    if let Some(row) = update.scroll_to_row {
        effects.push(Effect::ScrollTo(row));
    }
    effects
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::{Person, Rect};
    use crate::recording::{HostCapture, ManualClock};
    use crate::store::MemoryStore;

    fn app() -> (MeetingApp, ManualClock) {
        let clock = ManualClock::new(0);
        let backend = Arc::new(MemoryStore::new());
        let mut app = MeetingApp::new(
            &Config::default(),
            Box::new(HostCapture::new(vec!["audio/webm".to_string()])),
            Arc::new(clock.clone()),
            SessionStore::with_backend(backend, "minutesHistory"),
        );
        app.placement.set_layout(BoardLayout {
            canvas: Rect::new(0.0, 0.0, 600.0, 600.0),
            absent: Rect::new(700.0, 0.0, 200.0, 600.0),
        });
        app.placement
            .roster_mut()
            .replace_members(vec![Person::member("m1", "Alice", "Chair", None)]);
        (app, clock)
    }

    #[tokio::test]
    async fn test_confirm_setup_requires_name() {
        let (mut app, _) = app();
        let effects = app.dispatch(AppEvent::ConfirmSetup { session_name: " ".to_string() }).await;
        assert!(matches!(&effects[0], Effect::Notice(n) if n.blocking));
        assert_eq!(app.placement().stage(), Stage::Setup);
    }

    #[tokio::test]
    async fn test_click_in_setup_does_not_select_speaker() {
        let (mut app, _) = app();
        app.dispatch(AppEvent::PointerDown {
            target: DragTarget::Person("m1".to_string()),
            input: PointerInput::primary(1, 10.0, 10.0),
        })
        .await;
        let effects = app.dispatch(AppEvent::PointerUp(PointerInput::primary(1, 10.0, 10.0))).await;
        assert!(effects.is_empty());
        assert_eq!(app.current_speaker(), None);
    }

    #[tokio::test]
    async fn test_start_recording_requires_live_stage() {
        let (mut app, _) = app();
        let effects = app.dispatch(AppEvent::StartRecording).await;
        assert!(matches!(&effects[0], Effect::Notice(_)));
        assert!(!app.recorder().is_recording());
    }

    #[tokio::test]
    async fn test_timer_tick_only_while_recording() {
        let (mut app, clock) = app();
        assert!(app.dispatch(AppEvent::TimerTick).await.is_empty());

        app.dispatch(AppEvent::ConfirmSetup { session_name: "Board".to_string() }).await;
        app.dispatch(AppEvent::StartRecording).await;
        clock.advance(2_500);
        assert_eq!(app.dispatch(AppEvent::TimerTick).await, vec![Effect::Timer("00:02".to_string())]);
    }

    #[tokio::test]
    async fn test_add_table_locked_when_live() {
        let (mut app, _) = app();
        app.dispatch(AppEvent::ConfirmSetup { session_name: "Board".to_string() }).await;
        let effects = app.dispatch(AppEvent::AddTable(TableShape::Circle)).await;
        assert!(matches!(&effects[0], Effect::Notice(_)));
        assert!(app.placement().roster().tables().is_empty());
    }

    async fn start_proxy(app: &mut MeetingApp, pointer_id: i32) {
        app.dispatch(AppEvent::PointerDown {
            target: DragTarget::Person("m1".to_string()),
            input: PointerInput::primary(pointer_id, 10.0, 10.0),
        })
        .await;
        let effects = app
            .dispatch(AppEvent::PointerMove(PointerInput::primary(pointer_id, 200.0, 200.0)))
            .await;
        assert!(matches!(&effects[0], Effect::ShowProxy { .. }));
    }

    #[tokio::test]
    async fn test_clear_tables_mid_drag_still_hides_proxy() {
        let (mut app, _) = app();
        start_proxy(&mut app, 1).await;

        let effects = app.dispatch(AppEvent::ClearTables).await;
        assert_eq!(effects, vec![Effect::TablesChanged, Effect::RosterChanged]);

        let effects = app.dispatch(AppEvent::PointerUp(PointerInput::primary(1, 200.0, 200.0))).await;
        assert_eq!(effects, vec![Effect::HideProxy { pointer_id: 1 }, Effect::RosterChanged]);
        assert!(app.placement().roster().person("m1").unwrap().placement().is_some());
    }

    #[tokio::test]
    async fn test_new_session_hides_floating_proxies() {
        let (mut app, _) = app();
        start_proxy(&mut app, 4).await;

        let effects = app.dispatch(AppEvent::NewSession).await;
        assert_eq!(effects[0], Effect::HideProxy { pointer_id: 4 });
        assert_eq!(app.placement().active_sessions(), 0);
        assert!(app
            .dispatch(AppEvent::PointerUp(PointerInput::primary(4, 200.0, 200.0)))
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn test_drop_after_roster_reload_only_hides_proxy() {
        let (mut app, _) = app();
        start_proxy(&mut app, 1).await;
        app.dispatch(AppEvent::LoadRoster(vec![Person::member("m2", "Bob", "", None)]))
            .await;

        let effects = app.dispatch(AppEvent::PointerUp(PointerInput::primary(1, 200.0, 200.0))).await;
        assert_eq!(effects, vec![Effect::HideProxy { pointer_id: 1 }]);
    }
}
