//! Scripted audio backend
//!
//! A backend whose voices never change status on their own. Whoever holds
//! the paired `ScriptedControl` decides when the current voice loads,
//! finishes or fails. Used to drive the player through exact interleavings
//! of audio and typing events.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use super::backend::{AudioBackend, AudioError, VoiceId, VoiceStatus};

#[derive(Debug, Default)]
struct ScriptedState {
    voices: Vec<(VoiceId, PathBuf, VoiceStatus)>,
    opened: Vec<PathBuf>,
    stopped: Vec<VoiceId>,
    next_id: u32,
    blocked: bool,
    fail_open: Option<AudioError>,
    unlocks: usize,
    volume: f32,
}

impl ScriptedState {
    fn current_mut(&mut self) -> Option<&mut (VoiceId, PathBuf, VoiceStatus)> {
        self.voices.last_mut()
    }
}

/// Backend half, handed to the `AudioChannel`
pub struct ScriptedBackend {
    state: Arc<Mutex<ScriptedState>>,
}

/// Control half, kept by the test
#[derive(Clone)]
pub struct ScriptedControl {
    state: Arc<Mutex<ScriptedState>>,
}

impl ScriptedBackend {
    pub fn new() -> (Self, ScriptedControl) {
        let state = Arc::new(Mutex::new(ScriptedState {
            next_id: 1,
            volume: 1.0,
            ..Default::default()
        }));
        (
            Self {
                state: Arc::clone(&state),
            },
            ScriptedControl { state },
        )
    }
}

impl AudioBackend for ScriptedBackend {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn open(&mut self, path: &Path) -> Result<VoiceId, AudioError> {
        let mut state = self.state.lock();
        state.opened.push(path.to_path_buf());
        if state.blocked {
            return Err(AudioError::PlaybackBlocked);
        }
        if let Some(err) = state.fail_open.take() {
            return Err(err);
        }
        let id = VoiceId(state.next_id);
        state.next_id += 1;
        state
            .voices
            .push((id, path.to_path_buf(), VoiceStatus::Loading));
        Ok(id)
    }

    fn status(&self, voice: VoiceId) -> VoiceStatus {
        self.state
            .lock()
            .voices
            .iter()
            .find(|(id, _, _)| *id == voice)
            .map(|(_, _, status)| status.clone())
            .unwrap_or(VoiceStatus::Gone)
    }

    fn pause(&mut self, voice: VoiceId) {
        let mut state = self.state.lock();
        if let Some((_, _, status)) = state.voices.iter_mut().find(|(id, _, _)| *id == voice) {
            if *status == VoiceStatus::Playing {
                *status = VoiceStatus::Paused;
            }
        }
    }

    fn resume(&mut self, voice: VoiceId) {
        let mut state = self.state.lock();
        if let Some((_, _, status)) = state.voices.iter_mut().find(|(id, _, _)| *id == voice) {
            if *status == VoiceStatus::Paused {
                *status = VoiceStatus::Playing;
            }
        }
    }

    fn stop(&mut self, voice: VoiceId) {
        let mut state = self.state.lock();
        let before = state.voices.len();
        state.voices.retain(|(id, _, _)| *id != voice);
        if state.voices.len() != before {
            state.stopped.push(voice);
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.state.lock().volume = volume;
    }

    fn unlock(&mut self) {
        let mut state = self.state.lock();
        state.blocked = false;
        state.unlocks += 1;
    }
}

impl ScriptedControl {
    fn set_current(&self, status: VoiceStatus) -> bool {
        let mut state = self.state.lock();
        match state.current_mut() {
            Some((_, _, current)) => {
                *current = status;
                true
            }
            None => false,
        }
    }

    /// Mark the most recent voice as loaded and playing
    pub fn load_current(&self) -> bool {
        self.set_current(VoiceStatus::Playing)
    }

    /// Mark the most recent voice as ended naturally
    pub fn finish_current(&self) -> bool {
        self.set_current(VoiceStatus::Ended)
    }

    /// Mark the most recent voice as failed
    pub fn fail_current(&self, err: AudioError) -> bool {
        self.set_current(VoiceStatus::Failed(err))
    }

    /// Make every `open` fail with `PlaybackBlocked` until `unlock`
    pub fn set_blocked(&self, blocked: bool) {
        self.state.lock().blocked = blocked;
    }

    /// Make the next `open` fail with `err`
    pub fn fail_next_open(&self, err: AudioError) {
        self.state.lock().fail_open = Some(err);
    }

    /// Every path passed to `open`, in order, including rejected ones
    pub fn opened(&self) -> Vec<PathBuf> {
        self.state.lock().opened.clone()
    }

    pub fn stopped(&self) -> Vec<VoiceId> {
        self.state.lock().stopped.clone()
    }

    /// Voices opened and not yet stopped
    pub fn live_voices(&self) -> usize {
        self.state.lock().voices.len()
    }

    pub fn unlock_count(&self) -> usize {
        self.state.lock().unlocks
    }

    pub fn volume(&self) -> f32 {
        self.state.lock().volume
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_voice_is_loading() {
        let (mut backend, control) = ScriptedBackend::new();
        let id = backend.open(Path::new("a.wav")).unwrap();
        assert_eq!(backend.status(id), VoiceStatus::Loading);
        assert_eq!(control.live_voices(), 1);
    }

    #[test]
    fn test_control_drives_current_voice() {
        let (mut backend, control) = ScriptedBackend::new();
        let id = backend.open(Path::new("a.wav")).unwrap();

        assert!(control.load_current());
        assert_eq!(backend.status(id), VoiceStatus::Playing);

        assert!(control.finish_current());
        assert_eq!(backend.status(id), VoiceStatus::Ended);
    }

    #[test]
    fn test_control_without_voice() {
        let (_backend, control) = ScriptedBackend::new();
        assert!(!control.load_current());
    }

    #[test]
    fn test_blocked_until_unlock() {
        let (mut backend, control) = ScriptedBackend::new();
        control.set_blocked(true);
        assert_eq!(
            backend.open(Path::new("a.wav")),
            Err(AudioError::PlaybackBlocked)
        );

        backend.unlock();
        assert!(backend.open(Path::new("a.wav")).is_ok());
        assert_eq!(control.unlock_count(), 1);
        assert_eq!(control.opened().len(), 2);
    }

    #[test]
    fn test_fail_next_open_is_one_shot() {
        let (mut backend, control) = ScriptedBackend::new();
        control.fail_next_open(AudioError::NotFound("a.wav".into()));
        assert!(backend.open(Path::new("a.wav")).is_err());
        assert!(backend.open(Path::new("a.wav")).is_ok());
    }

    #[test]
    fn test_stop_records_voice() {
        let (mut backend, control) = ScriptedBackend::new();
        let id = backend.open(Path::new("a.wav")).unwrap();
        backend.stop(id);
        backend.stop(id);
        assert_eq!(control.stopped(), vec![id]);
        assert_eq!(backend.status(id), VoiceStatus::Gone);
    }

    #[test]
    fn test_pause_only_applies_to_playing() {
        let (mut backend, control) = ScriptedBackend::new();
        let id = backend.open(Path::new("a.wav")).unwrap();
        backend.pause(id);
        assert_eq!(backend.status(id), VoiceStatus::Loading);

        control.load_current();
        backend.pause(id);
        assert_eq!(backend.status(id), VoiceStatus::Paused);
        backend.resume(id);
        assert_eq!(backend.status(id), VoiceStatus::Playing);
    }
}
