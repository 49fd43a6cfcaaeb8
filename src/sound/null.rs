//! Null (silent) audio backend
//!
//! Plays nothing. Each voice is "heard" for a nominal clip length measured
//! in backend time, so timing-dependent behavior still works headless or
//! with `--sound none`.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use super::backend::{AudioBackend, AudioError, VoiceId, VoiceStatus};

struct SilentVoice {
    elapsed: Duration,
    paused: bool,
}

/// Backend that produces silence for a fixed duration per clip
pub struct NullBackend {
    /// Nominal length of every clip
    clip_length: Duration,
    voices: HashMap<u32, SilentVoice>,
    next_id: u32,
    volume: f32,
}

impl NullBackend {
    /// Create a backend whose clips end immediately
    pub fn new() -> Self {
        Self::with_clip_length(Duration::ZERO)
    }

    /// Create a backend whose clips last `length`
    pub fn with_clip_length(length: Duration) -> Self {
        Self {
            clip_length: length,
            voices: HashMap::new(),
            next_id: 1,
            volume: 1.0,
        }
    }

    pub fn clip_length(&self) -> Duration {
        self.clip_length
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Number of voices not yet stopped
    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }
}

impl Default for NullBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for NullBackend {
    fn name(&self) -> &'static str {
        "null"
    }

    fn open(&mut self, path: &Path) -> Result<VoiceId, AudioError> {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        self.voices.insert(
            id,
            SilentVoice {
                elapsed: Duration::ZERO,
                paused: false,
            },
        );
        log::debug!("null backend: open {} as {}", path.display(), VoiceId(id));
        Ok(VoiceId(id))
    }

    fn status(&self, voice: VoiceId) -> VoiceStatus {
        match self.voices.get(&voice.0) {
            None => VoiceStatus::Gone,
            Some(v) if v.elapsed >= self.clip_length => VoiceStatus::Ended,
            Some(v) if v.paused => VoiceStatus::Paused,
            Some(_) => VoiceStatus::Playing,
        }
    }

    fn pause(&mut self, voice: VoiceId) {
        if let Some(v) = self.voices.get_mut(&voice.0) {
            v.paused = true;
        }
    }

    fn resume(&mut self, voice: VoiceId) {
        if let Some(v) = self.voices.get_mut(&voice.0) {
            v.paused = false;
        }
    }

    fn stop(&mut self, voice: VoiceId) {
        self.voices.remove(&voice.0);
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    fn advance(&mut self, delta: Duration) {
        for voice in self.voices.values_mut().filter(|v| !v.paused) {
            voice.elapsed += delta;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_length_clip_ends_immediately() {
        let mut backend = NullBackend::new();
        let id = backend.open(Path::new("a.wav")).unwrap();
        assert_eq!(backend.status(id), VoiceStatus::Ended);
    }

    #[test]
    fn test_clip_plays_for_its_length() {
        let mut backend = NullBackend::with_clip_length(Duration::from_millis(500));
        let id = backend.open(Path::new("a.wav")).unwrap();
        assert_eq!(backend.status(id), VoiceStatus::Playing);

        backend.advance(Duration::from_millis(300));
        assert_eq!(backend.status(id), VoiceStatus::Playing);

        backend.advance(Duration::from_millis(200));
        assert_eq!(backend.status(id), VoiceStatus::Ended);
    }

    #[test]
    fn test_paused_clip_does_not_advance() {
        let mut backend = NullBackend::with_clip_length(Duration::from_millis(100));
        let id = backend.open(Path::new("a.wav")).unwrap();
        backend.pause(id);
        backend.advance(Duration::from_secs(1));
        assert_eq!(backend.status(id), VoiceStatus::Paused);

        backend.resume(id);
        backend.advance(Duration::from_millis(100));
        assert_eq!(backend.status(id), VoiceStatus::Ended);
    }

    #[test]
    fn test_stop_releases_voice() {
        let mut backend = NullBackend::with_clip_length(Duration::from_secs(1));
        let id = backend.open(Path::new("a.wav")).unwrap();
        backend.stop(id);
        assert_eq!(backend.status(id), VoiceStatus::Gone);
        assert_eq!(backend.voice_count(), 0);
        // Second stop is harmless
        backend.stop(id);
    }

    #[test]
    fn test_volume_clamped() {
        let mut backend = NullBackend::new();
        backend.set_volume(3.0);
        assert_eq!(backend.volume(), 1.0);
        backend.set_volume(-1.0);
        assert_eq!(backend.volume(), 0.0);
    }

    #[test]
    fn test_distinct_voice_ids() {
        let mut backend = NullBackend::new();
        let a = backend.open(Path::new("a.wav")).unwrap();
        let b = backend.open(Path::new("b.wav")).unwrap();
        assert_ne!(a, b);
    }
}
