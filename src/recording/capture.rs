//! Capture device and clock abstractions for the recording lifecycle.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::error::{MinutesError, MinutesResult};

/// One contiguous encoded recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioPayload {
    pub bytes: Vec<u8>,
    pub mime: String,
}

impl AudioPayload {
    pub fn new(bytes: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            bytes,
            mime: mime.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }
}

/// An audio input that hands encoded segments to the host on a fixed cadence.
///
/// Segments themselves arrive through the controller's `push_segment`; the
/// device only owns acquisition and release.
pub trait AudioCapture: Send {
    /// Whether the device can encode `mime`.
    fn supports(&self, mime: &str) -> bool;

    /// Acquire the device and begin segment delivery. Returns the mime type the
    /// device reports encoding with, which may be empty.
    fn acquire(&mut self, mime: Option<&str>, segment_interval: Duration) -> MinutesResult<String>;

    /// Stop delivery and release the device.
    fn release(&mut self) -> MinutesResult<()>;

    fn is_active(&self) -> bool;
}

/// Capture handle for hosts that run the real media pipeline themselves and
/// forward segments (e.g. a browser shell). The host reports which encodings
/// exist and whether permission was granted.
#[derive(Debug, Clone)]
pub struct HostCapture {
    supported: Vec<String>,
    permission_granted: bool,
    active: bool,
    acquisitions: usize,
}

impl HostCapture {
    pub fn new(supported: Vec<String>) -> Self {
        Self {
            supported,
            permission_granted: true,
            active: false,
            acquisitions: 0,
        }
    }

    pub fn set_permission(&mut self, granted: bool) {
        self.permission_granted = granted;
    }

    pub fn denied(mut self) -> Self {
        self.permission_granted = false;
        self
    }

    /// Total successful acquisitions over the handle's lifetime.
    pub fn acquisitions(&self) -> usize {
        self.acquisitions
    }
}

impl AudioCapture for HostCapture {
    fn supports(&self, mime: &str) -> bool {
        self.supported.iter().any(|s| s == mime)
    }

    fn acquire(&mut self, mime: Option<&str>, segment_interval: Duration) -> MinutesResult<String> {
        if self.active {
            return Err(MinutesError::InvalidState(
                "Capture device already in use".to_string(),
            ));
        }
        if !self.permission_granted {
            return Err(MinutesError::PermissionDenied(
                "host reported no microphone permission".to_string(),
            ));
        }

        self.active = true;
        self.acquisitions += 1;
        info!(
            "Capture acquired ({}, {}ms segments)",
            mime.unwrap_or("device default"),
            segment_interval.as_millis()
        );
        Ok(mime.unwrap_or_default().to_string())
    }

    fn release(&mut self) -> MinutesResult<()> {
        if self.active {
            debug!("Capture released");
        }
        self.active = false;
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

/// Monotonic millisecond clock.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Hand-driven clock. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start_ms)),
        }
    }

    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}
