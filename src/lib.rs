//! Meeting seating chart and speaker attribution.
//!
//! Facilitators place attendees on a floor plan, record the meeting, and tap
//! whoever is speaking. The result is a time-indexed speaker log persisted
//! alongside the audio and replayable with the active speaker highlighted.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod global;
pub mod placement;
pub mod recording;
pub mod store;
pub mod timeline;

pub use app::{AppEvent, Effect, MeetingApp};
pub use error::{MinutesError, MinutesResult, Notice, Tone};
