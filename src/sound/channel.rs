//! Single-track audio channel
//!
//! Owns at most one live voice. Starting a clip stops the previous one
//! first, so clips supersede and never layer. Status changes are picked up
//! in `update`, which fires the clip's hooks and reports what it saw.

use std::fmt;
use std::time::Duration;

use crate::script::AssetResolver;

use super::backend::{AudioBackend, AudioError, VoiceId, VoiceStatus};

/// Default bound on how long a clip may stay in `Loading`
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(8);

type Hook = Box<dyn FnMut()>;
type ErrorHook = Box<dyn FnMut(&AudioError)>;

/// Optional callbacks attached to one clip
#[derive(Default)]
pub struct PlaybackHooks {
    on_loaded: Option<Hook>,
    on_ended: Option<Hook>,
    on_error: Option<ErrorHook>,
}

impl PlaybackHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires once the clip is ready, before or as it starts playing
    pub fn on_loaded(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_loaded = Some(Box::new(f));
        self
    }

    /// Fires when the clip reaches its natural end
    pub fn on_ended(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_ended = Some(Box::new(f));
        self
    }

    /// Fires on load or playback failure, including blocked output and timeouts
    pub fn on_error(mut self, f: impl FnMut(&AudioError) + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    fn loaded(&mut self) {
        if let Some(f) = self.on_loaded.as_mut() {
            f();
        }
    }

    fn ended(&mut self) {
        if let Some(f) = self.on_ended.as_mut() {
            f();
        }
    }

    fn error(&mut self, err: &AudioError) {
        if let Some(f) = self.on_error.as_mut() {
            f(err);
        }
    }
}

impl fmt::Debug for PlaybackHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackHooks")
            .field("on_loaded", &self.on_loaded.is_some())
            .field("on_ended", &self.on_ended.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

/// What `update` observed about the current clip
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioSignal {
    Loaded,
    Ended,
    /// Load or playback failure; watchdog expiry arrives as `AudioError::TimedOut`
    Failed(AudioError),
}

struct ActiveVoice {
    id: VoiceId,
    clip: String,
    loaded: bool,
    ended: bool,
    /// Time spent waiting for the clip to load
    waited: Duration,
    hooks: PlaybackHooks,
}

/// Channel that plays one clip at a time
pub struct AudioChannel {
    backend: Box<dyn AudioBackend>,
    resolver: Box<dyn AssetResolver>,
    active: Option<ActiveVoice>,
    load_timeout: Duration,
    volume: f32,
    /// Signals raised outside `update` (synchronous open failures)
    pending: Vec<AudioSignal>,
}

impl AudioChannel {
    pub fn new(backend: Box<dyn AudioBackend>, resolver: Box<dyn AssetResolver>) -> Self {
        Self {
            backend,
            resolver,
            active: None,
            load_timeout: DEFAULT_LOAD_TIMEOUT,
            volume: 1.0,
            pending: Vec::new(),
        }
    }

    pub fn with_load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = timeout;
        self
    }

    pub fn set_load_timeout(&mut self, timeout: Duration) {
        self.load_timeout = timeout;
    }

    pub fn load_timeout(&self) -> Duration {
        self.load_timeout
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Start `clip`, replacing whatever was playing.
    ///
    /// Failures never escape: they fire `on_error` and are reported by the
    /// next `update` as `AudioSignal::Failed`.
    pub fn play_audio(&mut self, clip: &str, mut hooks: PlaybackHooks) {
        self.stop_audio();

        let opened = self
            .resolver
            .resolve(clip)
            .map_err(|e| AudioError::NotFound(format!("{}: {}", clip, e)))
            .and_then(|path| self.backend.open(&path));

        match opened {
            Ok(id) => {
                log::debug!("audio: {} playing '{}'", id, clip);
                self.active = Some(ActiveVoice {
                    id,
                    clip: clip.to_string(),
                    loaded: false,
                    ended: false,
                    waited: Duration::ZERO,
                    hooks,
                });
            }
            Err(err) => {
                log::warn!("audio: cannot play '{}': {}", clip, err);
                hooks.error(&err);
                self.pending.push(AudioSignal::Failed(err));
            }
        }
    }

    /// Stop and release the current clip. Safe to call with nothing playing.
    ///
    /// Signals not yet reported for the released clip are dropped.
    pub fn stop_audio(&mut self) {
        self.pending.clear();
        if let Some(voice) = self.active.take() {
            log::debug!("audio: stopping {} '{}'", voice.id, voice.clip);
            self.backend.stop(voice.id);
        }
    }

    /// True while a clip is loading or playing; false when paused, ended or absent
    pub fn is_playing(&self) -> bool {
        match &self.active {
            Some(voice) if !voice.ended => matches!(
                self.backend.status(voice.id),
                VoiceStatus::Loading | VoiceStatus::Playing
            ),
            _ => false,
        }
    }

    pub fn has_voice(&self) -> bool {
        self.active.is_some()
    }

    pub fn current_clip(&self) -> Option<&str> {
        self.active.as_ref().map(|v| v.clip.as_str())
    }

    pub fn pause_audio(&mut self) {
        if let Some(voice) = &self.active {
            self.backend.pause(voice.id);
        }
    }

    pub fn resume_audio(&mut self) {
        if let Some(voice) = &self.active {
            self.backend.resume(voice.id);
        }
    }

    /// Set output volume, clamped to 0.0 - 1.0
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        self.backend.set_volume(self.volume);
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Tell the backend a user gesture happened
    pub fn unlock(&mut self) {
        self.backend.unlock();
    }

    /// Poll the backend, fire hooks and return what changed since the last call
    pub fn update(&mut self, delta: Duration) -> Vec<AudioSignal> {
        self.backend.advance(delta);
        let mut signals = std::mem::take(&mut self.pending);

        let Some(voice) = self.active.as_mut() else {
            return signals;
        };

        match self.backend.status(voice.id) {
            VoiceStatus::Loading => {
                voice.waited += delta;
                if voice.waited >= self.load_timeout {
                    let err = AudioError::TimedOut(self.load_timeout);
                    log::warn!("audio: '{}' {}", voice.clip, err);
                    self.fail_active(err, &mut signals);
                }
            }
            VoiceStatus::Playing | VoiceStatus::Paused => {
                if !voice.loaded {
                    voice.loaded = true;
                    voice.hooks.loaded();
                    signals.push(AudioSignal::Loaded);
                }
            }
            VoiceStatus::Ended | VoiceStatus::Gone => {
                if !voice.loaded {
                    voice.loaded = true;
                    voice.hooks.loaded();
                    signals.push(AudioSignal::Loaded);
                }
                if !voice.ended {
                    voice.ended = true;
                    log::debug!("audio: '{}' ended", voice.clip);
                    voice.hooks.ended();
                    signals.push(AudioSignal::Ended);
                }
            }
            VoiceStatus::Failed(err) => {
                log::warn!("audio: '{}' failed: {}", voice.clip, err);
                self.fail_active(err, &mut signals);
            }
        }

        signals
    }

    fn fail_active(&mut self, err: AudioError, signals: &mut Vec<AudioSignal>) {
        if let Some(mut voice) = self.active.take() {
            self.backend.stop(voice.id);
            voice.hooks.error(&err);
        }
        signals.push(AudioSignal::Failed(err));
    }
}

impl fmt::Debug for AudioChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioChannel")
            .field("backend", &self.backend.name())
            .field("clip", &self.current_clip())
            .field("load_timeout", &self.load_timeout)
            .field("volume", &self.volume)
            .finish()
    }
}
