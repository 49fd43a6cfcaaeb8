//! Audio backend trait definition
//!
//! Defines the `AudioBackend` trait that every output implementation must
//! provide. A backend owns zero or more voices identified by `VoiceId`; the
//! `AudioChannel` above it enforces that only one is ever live.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use thiserror::Error;

/// Error type for audio operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AudioError {
    /// Clip does not exist
    #[error("clip not found: {0}")]
    NotFound(String),
    /// Clip exists but could not be decoded
    #[error("cannot decode {path}: {reason}")]
    Decode { path: String, reason: String },
    /// Output refused to start without a prior user gesture
    #[error("playback blocked until user interaction")]
    PlaybackBlocked,
    /// Clip never became ready
    #[error("clip did not load within {0:?}")]
    TimedOut(Duration),
    /// Output device or backend failure
    #[error("audio backend error: {0}")]
    Backend(String),
}

/// Handle to a voice owned by a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceId(pub u32);

impl fmt::Display for VoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "voice#{}", self.0)
    }
}

/// Lifecycle of a voice as seen by the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceStatus {
    /// Opened, not yet ready to produce sound
    Loading,
    Playing,
    Paused,
    /// Reached the end of the clip
    Ended,
    /// Load or playback failed
    Failed(AudioError),
    /// Unknown or already released
    Gone,
}

impl VoiceStatus {
    /// Whether the voice has produced its first sample (or is ready to)
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Playing | Self::Paused | Self::Ended)
    }
}

/// Audio output backend
///
/// All calls are non-blocking. Status changes are observed by polling
/// `status`; the channel does this once per `update`.
pub trait AudioBackend {
    /// Returns the backend name (e.g., "rodio", "null")
    fn name(&self) -> &'static str;

    /// Open a voice for the clip at `path` and start it as soon as it loads
    ///
    /// Errors returned here are synchronous failures (missing file,
    /// blocked output). Later failures surface as `VoiceStatus::Failed`.
    fn open(&mut self, path: &Path) -> Result<VoiceId, AudioError>;

    /// Current status of a voice
    fn status(&self, voice: VoiceId) -> VoiceStatus;

    fn pause(&mut self, voice: VoiceId);

    fn resume(&mut self, voice: VoiceId);

    /// Stop and release a voice. Unknown voices are ignored.
    fn stop(&mut self, voice: VoiceId);

    /// Set the output volume (0.0 - 1.0) for current and future voices
    fn set_volume(&mut self, volume: f32);

    /// Called after the first user gesture, for outputs that gate playback on it
    fn unlock(&mut self) {}

    /// Advance backend time, for backends that simulate playback
    fn advance(&mut self, _delta: Duration) {}
}
