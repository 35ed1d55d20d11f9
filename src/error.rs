//! Error taxonomy for the meeting core and its user-facing notices.
//!
//! Storage and media failures are caught at the component boundary and turned
//! into a [`Notice`]; in-memory roster and table state is never rolled back
//! because of a later persistence failure.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MinutesError {
    /// Capture device unavailable or access refused. Recoverable: the session
    /// continues without audio.
    #[error("Microphone access denied or unavailable: {0}")]
    PermissionDenied(String),

    /// The durable store could not be opened, written, or deleted from.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// User input that must be corrected before the operation can proceed.
    #[error("{0}")]
    Validation(String),

    /// A session or audio payload that no longer exists.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A lifecycle transition that is not allowed from the current state.
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl From<rusqlite::Error> for MinutesError {
    fn from(err: rusqlite::Error) -> Self {
        Self::StorageUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for MinutesError {
    fn from(err: serde_json::Error) -> Self {
        Self::StorageUnavailable(format!("corrupt record: {err}"))
    }
}

impl From<std::io::Error> for MinutesError {
    fn from(err: std::io::Error) -> Self {
        Self::StorageUnavailable(err.to_string())
    }
}

pub type MinutesResult<T> = Result<T, MinutesError>;

/// Visual tone of a notice shown to the facilitator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Info,
    Success,
    Warning,
    Error,
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Info => "Info",
            Tone::Success => "Success",
            Tone::Warning => "Warning",
            Tone::Error => "Error",
        }
    }
}

/// A message for the host UI. `blocking` notices must be acknowledged and
/// correspond to withheld operations (validation failures).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub tone: Tone,
    pub title: String,
    pub messages: Vec<String>,
    pub blocking: bool,
}

impl Notice {
    pub fn new(tone: Tone, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            tone,
            title: title.into(),
            messages: vec![message.into()],
            blocking: false,
        }
    }

    pub fn blocking(mut self) -> Self {
        self.blocking = true;
        self
    }
}

impl From<&MinutesError> for Notice {
    fn from(err: &MinutesError) -> Self {
        match err {
            MinutesError::PermissionDenied(_) => Notice::new(
                Tone::Warning,
                "Recording Without Audio",
                "Microphone access denied or unavailable. Speaker changes are still logged.",
            ),
            MinutesError::StorageUnavailable(msg) => {
                Notice::new(Tone::Error, "Storage Problem", msg.clone())
            }
            MinutesError::Validation(msg) => {
                Notice::new(Tone::Warning, "Input Required", msg.clone()).blocking()
            }
            MinutesError::NotFound(msg) => Notice::new(Tone::Info, "Not Available", msg.clone()),
            MinutesError::InvalidState(msg) => Notice::new(Tone::Warning, "Not Now", msg.clone()),
        }
    }
}
