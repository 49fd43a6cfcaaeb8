//! Core types for the sequence player

use std::time::Duration;

use crate::input::{KeyMap, SkipCommand};
use crate::sound::{AudioError, DEFAULT_LOAD_TIMEOUT};

/// Default delay between revealed characters
pub const DEFAULT_TYPING_INTERVAL: Duration = Duration::from_millis(150);

/// Default pause between stopping the old clip and starting the next step
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(10);

/// Default wait before auto-play moves on
pub const DEFAULT_AUTO_ADVANCE_DELAY: Duration = Duration::from_millis(1000);

/// Player tuning
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerConfig {
    pub typing_interval: Duration,
    pub settle_delay: Duration,
    /// Watchdog bound on clip loading
    pub load_timeout: Duration,
    pub auto_advance_delay: Duration,
    /// Advance on its own once a step is complete
    pub auto_play: bool,
    pub keys: KeyMap,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            typing_interval: DEFAULT_TYPING_INTERVAL,
            settle_delay: DEFAULT_SETTLE_DELAY,
            load_timeout: DEFAULT_LOAD_TIMEOUT,
            auto_advance_delay: DEFAULT_AUTO_ADVANCE_DELAY,
            auto_play: false,
            keys: KeyMap::default(),
        }
    }
}

/// Player lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerState {
    /// Not started
    #[default]
    Idle,
    /// Waiting for the previous clip to stop before starting step `index`
    Settling { index: usize, remaining: Duration },
    /// Step `index` is typing and/or speaking
    Playing { index: usize },
    /// Traversal complete; `index` is the last step shown
    Finished { index: usize },
}

impl PlayerState {
    /// Current step position, if one is shown
    pub fn index(&self) -> Option<usize> {
        match *self {
            PlayerState::Idle => None,
            PlayerState::Settling { index, .. }
            | PlayerState::Playing { index }
            | PlayerState::Finished { index } => Some(index),
        }
    }
}

/// Observable change in the player, drained with `SequencePlayer::drain_events`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    /// Position changed to `index`; typing and audio start after the settle delay
    StepEntered { index: usize },
    /// Reveal grew to `chars` characters
    Revealed { chars: usize },
    TypingFinished { index: usize },
    Skipped { index: usize, command: SkipCommand },
    AudioLoaded { index: usize },
    AudioEnded { index: usize },
    AudioFailed { index: usize, error: AudioError },
    /// Audio cut short by a second skip
    AudioStopped { index: usize },
    NavigationChanged { can_next: bool, can_prev: bool },
    AutoPlayChanged(bool),
    /// Completion callback fired
    Finished,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PlayerConfig::default();
        assert_eq!(config.typing_interval, Duration::from_millis(150));
        assert_eq!(config.settle_delay, Duration::from_millis(10));
        assert_eq!(config.load_timeout, Duration::from_secs(8));
        assert_eq!(config.auto_advance_delay, Duration::from_secs(1));
        assert!(!config.auto_play);
    }

    #[test]
    fn test_state_index() {
        assert_eq!(PlayerState::Idle.index(), None);
        assert_eq!(
            PlayerState::Settling {
                index: 2,
                remaining: Duration::ZERO
            }
            .index(),
            Some(2)
        );
        assert_eq!(PlayerState::Playing { index: 1 }.index(), Some(1));
        assert_eq!(PlayerState::Finished { index: 3 }.index(), Some(3));
    }
}
