use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use serde::{Deserialize, Serialize};

use super::capture::{AudioCapture, AudioPayload, Clock};
use crate::config::RecordingConfig;
use crate::error::{MinutesError, MinutesResult};
use crate::timeline::format_clock;

/// Idle → Recording | LogOnly → Stopped. Stopped is terminal until `reset`
/// starts a new session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordingPhase {
    Idle,
    /// Epoch open with the capture device held.
    Recording,
    /// Epoch open without audio: the device could not be acquired.
    LogOnly,
    Stopped,
}

impl RecordingPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordingPhase::Idle => "idle",
            RecordingPhase::Recording => "recording",
            RecordingPhase::LogOnly => "log_only",
            RecordingPhase::Stopped => "stopped",
        }
    }

    pub fn epoch_open(&self) -> bool {
        matches!(self, RecordingPhase::Recording | RecordingPhase::LogOnly)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Capturing { mime: String },
    /// The device could not be acquired; the epoch is open and the speaker
    /// log runs without audio.
    TimelineOnly { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoppedRecording {
    pub payload: Option<AudioPayload>,
    pub duration_ms: u64,
}

pub struct RecordingController {
    capture: Box<dyn AudioCapture>,
    clock: Arc<dyn Clock>,
    config: RecordingConfig,
    phase: RecordingPhase,
    epoch_start_ms: Option<u64>,
    mime: String,
    segments: Vec<Vec<u8>>,
    duration_ms: Option<u64>,
    payload: Option<AudioPayload>,
}

impl RecordingController {
    pub fn new(capture: Box<dyn AudioCapture>, clock: Arc<dyn Clock>, config: RecordingConfig) -> Self {
        Self {
            capture,
            clock,
            config,
            phase: RecordingPhase::Idle,
            epoch_start_ms: None,
            mime: String::new(),
            segments: Vec::new(),
            duration_ms: None,
            payload: None,
        }
    }

    pub fn phase(&self) -> RecordingPhase {
        self.phase
    }

    /// Whether an epoch is open, with or without audio.
    pub fn is_recording(&self) -> bool {
        self.phase.epoch_open()
    }

    pub fn is_capturing(&self) -> bool {
        self.phase == RecordingPhase::Recording
    }

    pub fn epoch_start(&self) -> Option<u64> {
        self.epoch_start_ms
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Milliseconds since the epoch; frozen at the final duration once stopped.
    pub fn elapsed_ms(&self) -> u64 {
        match (self.phase, self.epoch_start_ms) {
            (phase, Some(start)) if phase.epoch_open() => self.clock.now_ms().saturating_sub(start),
            (RecordingPhase::Stopped, _) => self.duration_ms.unwrap_or(0),
            _ => 0,
        }
    }

    /// The finalized payload of the stopped recording, if any audio was
    /// captured.
    pub fn payload(&self) -> Option<&AudioPayload> {
        self.payload.as_ref()
    }

    /// First preferred encoding the device supports.
    pub fn select_encoding(&self) -> Option<String> {
        self.config
            .preferred_encodings
            .iter()
            .find(|mime| self.capture.supports(mime))
            .cloned()
    }

    pub fn start(&mut self) -> MinutesResult<StartOutcome> {
        if self.phase != RecordingPhase::Idle {
            return Err(MinutesError::InvalidState(format!(
                "Cannot start recording while {}",
                self.phase.as_str()
            )));
        }

        let selected = self.select_encoding();
        let interval = Duration::from_millis(self.config.segment_interval_ms);
        self.segments.clear();
        self.payload = None;
        self.duration_ms = None;

        let (phase, outcome) = match self.capture.acquire(selected.as_deref(), interval) {
            Ok(reported) => {
                self.mime = if reported.is_empty() {
                    selected.unwrap_or_default()
                } else {
                    reported
                };
                info!("RecordingController: capturing as {:?}", self.mime);
                let outcome = StartOutcome::Capturing {
                    mime: self.mime.clone(),
                };
                (RecordingPhase::Recording, outcome)
            }
            Err(e) => {
                warn!("Capture unavailable, logging speakers without audio: {}", e);
                self.mime.clear();
                let outcome = StartOutcome::TimelineOnly {
                    reason: e.to_string(),
                };
                (RecordingPhase::LogOnly, outcome)
            }
        };

        self.epoch_start_ms = Some(self.clock.now_ms());
        self.phase = phase;
        Ok(outcome)
    }

    /// Buffer one encoded segment. Empty segments and segments arriving when
    /// no capture is running are dropped.
    pub fn push_segment(&mut self, bytes: Vec<u8>) -> bool {
        if !self.is_capturing() {
            debug!("Dropping {} byte segment outside capture", bytes.len());
            return false;
        }
        if bytes.is_empty() {
            return false;
        }
        self.segments.push(bytes);
        true
    }

    pub fn buffered_segments(&self) -> usize {
        self.segments.len()
    }

    /// Elapsed-timer display for the 1s UI tick.
    pub fn tick(&self) -> Option<String> {
        self.is_recording().then(|| format_clock(self.elapsed_ms()))
    }

    /// Release the device, then join buffered segments into one payload.
    pub fn stop(&mut self) -> MinutesResult<StoppedRecording> {
        if !self.is_recording() {
            return Err(MinutesError::InvalidState(format!(
                "No recording in progress (current phase: {})",
                self.phase.as_str()
            )));
        }

        if self.is_capturing() {
            if let Err(e) = self.capture.release() {
                error!("Failed to release capture device: {}", e);
            }
        }

        let duration_ms = self
            .epoch_start_ms
            .map(|start| self.clock.now_ms().saturating_sub(start))
            .unwrap_or(0);

        let payload = if self.segments.is_empty() {
            None
        } else {
            let bytes = self.segments.drain(..).flatten().collect::<Vec<u8>>();
            let mime = if self.mime.is_empty() {
                self.config.fallback_mime.clone()
            } else {
                self.mime.clone()
            };
            Some(AudioPayload::new(bytes, mime))
        };

        info!(
            "RecordingController: stopped after {} ({} bytes of audio)",
            format_clock(duration_ms),
            payload.as_ref().map(|p| p.len()).unwrap_or(0)
        );

        self.phase = RecordingPhase::Stopped;
        self.duration_ms = Some(duration_ms);
        self.payload = payload.clone();

        Ok(StoppedRecording {
            payload,
            duration_ms,
        })
    }

    /// Return to Idle for a new session.
    pub fn reset(&mut self) -> MinutesResult<()> {
        if self.is_recording() {
            return Err(MinutesError::InvalidState(
                "Please stop recording first.".to_string(),
            ));
        }
        self.phase = RecordingPhase::Idle;
        self.epoch_start_ms = None;
        self.mime.clear();
        self.segments.clear();
        self.duration_ms = None;
        self.payload = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::capture::{HostCapture, ManualClock};

    fn controller(capture: HostCapture) -> (RecordingController, ManualClock) {
        let clock = ManualClock::new(1_000);
        let controller = RecordingController::new(
            Box::new(capture),
            Arc::new(clock.clone()),
            RecordingConfig::default(),
        );
        (controller, clock)
    }

    #[test]
    fn test_phase_as_str() {
        assert_eq!(RecordingPhase::Idle.as_str(), "idle");
        assert_eq!(RecordingPhase::Recording.as_str(), "recording");
        assert_eq!(RecordingPhase::LogOnly.as_str(), "log_only");
        assert_eq!(RecordingPhase::Stopped.as_str(), "stopped");
    }

    #[test]
    fn test_encoding_probe_follows_priority() {
        let capture = HostCapture::new(vec![
            "audio/ogg;codecs=opus".to_string(),
            "audio/webm".to_string(),
        ]);
        let (controller, _) = controller(capture);
        assert_eq!(controller.select_encoding().as_deref(), Some("audio/webm"));

        let (controller, _) = self::controller(HostCapture::new(vec![]));
        assert_eq!(controller.select_encoding(), None);
    }

    #[test]
    fn test_lifecycle_joins_segments() {
        let (mut controller, clock) = controller(HostCapture::new(vec!["audio/webm".to_string()]));

        let outcome = controller.start().unwrap();
        assert_eq!(
            outcome,
            StartOutcome::Capturing {
                mime: "audio/webm".to_string()
            }
        );
        assert_eq!(controller.epoch_start(), Some(1_000));

        assert!(controller.push_segment(vec![1, 2]));
        assert!(!controller.push_segment(Vec::new()));
        clock.advance(1_000);
        assert_eq!(controller.tick().as_deref(), Some("00:01"));
        assert!(controller.push_segment(vec![3]));
        clock.advance(64_500);

        let stopped = controller.stop().unwrap();
        assert_eq!(stopped.duration_ms, 65_500);
        assert_eq!(stopped.payload, Some(AudioPayload::new(vec![1, 2, 3], "audio/webm")));
        assert_eq!(controller.phase(), RecordingPhase::Stopped);
        assert!(!controller.is_capturing());
        assert_eq!(controller.elapsed_ms(), 65_500);
    }

    #[test]
    fn test_denied_capture_runs_timeline_only() {
        let (mut controller, _) = controller(HostCapture::new(vec!["audio/webm".to_string()]).denied());

        let outcome = controller.start().unwrap();
        assert!(matches!(outcome, StartOutcome::TimelineOnly { .. }));
        assert_eq!(controller.phase(), RecordingPhase::LogOnly);
        assert!(controller.is_recording());
        assert!(!controller.is_capturing());
        assert!(!controller.push_segment(vec![9]));
        assert!(matches!(controller.reset(), Err(MinutesError::InvalidState(_))));

        let stopped = controller.stop().unwrap();
        assert_eq!(stopped.payload, None);
        assert_eq!(controller.phase(), RecordingPhase::Stopped);
    }

    #[test]
    fn test_fallback_mime_when_device_reports_none() {
        let (mut controller, _) = controller(HostCapture::new(vec![]));
        controller.start().unwrap();
        controller.push_segment(vec![7]);
        let stopped = controller.stop().unwrap();
        assert_eq!(stopped.payload.unwrap().mime, "audio/webm");
    }

    #[test]
    fn test_stopped_is_terminal_until_reset() {
        let (mut controller, _) = controller(HostCapture::new(vec![]));
        controller.start().unwrap();
        assert!(matches!(controller.start(), Err(MinutesError::InvalidState(_))));
        assert!(matches!(controller.reset(), Err(MinutesError::InvalidState(_))));

        controller.stop().unwrap();
        assert!(matches!(controller.stop(), Err(MinutesError::InvalidState(_))));
        assert!(matches!(controller.start(), Err(MinutesError::InvalidState(_))));

        controller.reset().unwrap();
        assert_eq!(controller.phase(), RecordingPhase::Idle);
        assert!(controller.start().is_ok());
    }

    #[test]
    fn test_segments_after_stop_are_dropped() {
        let (mut controller, _) = controller(HostCapture::new(vec![]));
        controller.start().unwrap();
        controller.stop().unwrap();
        assert!(!controller.push_segment(vec![1]));
        assert_eq!(controller.buffered_segments(), 0);
    }
}
