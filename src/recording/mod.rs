//! Audio capture lifecycle and the recording epoch.

pub mod capture;
pub mod recording_machine;

pub use capture::{AudioCapture, AudioPayload, Clock, HostCapture, ManualClock, SystemClock};
pub use recording_machine::{RecordingController, RecordingPhase, StartOutcome, StoppedRecording};
