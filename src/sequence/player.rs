//! Sequence controller
//!
//! Drives the position through a sequence and keeps the typing driver and
//! the audio channel on the same step. Everything happens in `update` and
//! the input methods; nothing runs in the background.

use std::fmt;
use std::time::Duration;

use crate::input::{Action, InputFocus, KeyBindings, SkipCommand, SkipListener, SkipStage};
use crate::script::{Sequence, Step};
use crate::sound::{AudioChannel, AudioError, AudioSignal, PlaybackHooks};

use super::types::{PlayerConfig, PlayerEvent, PlayerState};
use super::typing::TypingDriver;

type CompletionCallback = Box<dyn FnOnce()>;

/// Plays a sequence of narrated steps
pub struct SequencePlayer {
    sequence: Sequence,
    config: PlayerConfig,
    typing: TypingDriver,
    audio: AudioChannel,
    skip: SkipListener,
    bindings: KeyBindings,
    state: PlayerState,

    auto_play: bool,
    /// Time the current step has been complete under auto-play
    auto_wait: Duration,

    /// First clip was blocked; the next key press unlocks and replays it
    awaiting_unlock: bool,
    unlock_used: bool,
    /// Second skip arrived while settling; stop the clip once it opens
    stop_pending: bool,

    /// TypingFinished already emitted for this step
    typing_reported: bool,
    /// Last published (can_next, can_prev)
    nav: Option<(bool, bool)>,
    events: Vec<PlayerEvent>,
    on_complete: Option<CompletionCallback>,
}

impl SequencePlayer {
    pub fn new(sequence: Sequence, mut audio: AudioChannel, config: PlayerConfig) -> Self {
        audio.set_load_timeout(config.load_timeout);
        Self {
            typing: TypingDriver::new(config.typing_interval),
            skip: SkipListener::new(config.keys.skip),
            bindings: KeyBindings::from_keymap(&config.keys),
            auto_play: config.auto_play,
            sequence,
            config,
            audio,
            state: PlayerState::Idle,
            auto_wait: Duration::ZERO,
            awaiting_unlock: false,
            unlock_used: false,
            stop_pending: false,
            typing_reported: false,
            nav: None,
            events: Vec::new(),
            on_complete: None,
        }
    }

    /// Set the callback fired once when the sequence has been traversed
    pub fn on_complete(mut self, f: impl FnOnce() + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }

    pub fn set_on_complete(&mut self, f: impl FnOnce() + 'static) {
        self.on_complete = Some(Box::new(f));
    }

    /// Enter the first step
    pub fn start(&mut self) {
        log::info!(
            "starting sequence '{}' ({} steps)",
            self.sequence.title().unwrap_or("untitled"),
            self.sequence.len()
        );
        self.enter_step(0);
    }

    /// Move forward if the step is complete.
    ///
    /// On the last step this fires the completion callback instead. Returns
    /// whether anything happened.
    pub fn proceed_to_next(&mut self) -> bool {
        let PlayerState::Playing { index } = self.state else {
            return false;
        };
        if !self.is_complete() {
            log::debug!("next ignored: step {} not complete", index);
            return false;
        }

        if index == self.sequence.last_index() {
            self.finish(index);
        } else {
            self.enter_step(index + 1);
        }
        true
    }

    /// Move back one step. No-op on the first step.
    pub fn proceed_to_prev(&mut self) -> bool {
        match self.state {
            PlayerState::Playing { index } | PlayerState::Settling { index, .. } if index > 0 => {
                self.enter_step(index - 1);
                true
            }
            _ => false,
        }
    }

    /// Press the skip key programmatically. Returns the command it ran.
    pub fn skip(&mut self) -> Option<SkipCommand> {
        if !self.is_active() {
            return None;
        }
        let command = SkipCommand::for_stage(self.skip_stage());
        self.apply_skip(command);
        Some(command)
    }

    /// Handle a key press. Returns the action it triggered, if any.
    ///
    /// Any key counts as the user gesture that unlocks blocked audio. With
    /// a text field focused, bindings are suppressed.
    pub fn handle_key(&mut self, keycode: i32, focus: InputFocus) -> Option<Action> {
        if self.awaiting_unlock {
            self.resolve_unlock();
        }
        if focus == InputFocus::TextField {
            return None;
        }

        if self.is_active() {
            if let Some(command) = self.skip.dispatch(keycode, focus, self.typing.is_skipped()) {
                self.apply_skip(command);
                return Some(Action::Skip);
            }
        }

        let action = self.bindings.action_for(keycode)?;
        match action {
            Action::Skip => {
                self.skip()?;
            }
            Action::Next => {
                self.proceed_to_next();
            }
            Action::Prev => {
                self.proceed_to_prev();
            }
            Action::ToggleAutoPlay => self.toggle_auto_play(),
            // Left to the host
            Action::Quit => {}
        }
        Some(action)
    }

    /// Advance timers by `delta`
    pub fn update(&mut self, delta: Duration) {
        let mut delta = delta;
        if let PlayerState::Settling { index, remaining } = self.state {
            if delta < remaining {
                self.state = PlayerState::Settling {
                    index,
                    remaining: remaining - delta,
                };
                return;
            }
            delta -= remaining;
            self.begin_step(index);
        }

        let signals = self.audio.update(delta);
        let PlayerState::Playing { index } = self.state else {
            return;
        };

        if self.typing.update(delta) > 0 {
            self.events.push(PlayerEvent::Revealed {
                chars: self.typing.revealed_len(),
            });
        }
        self.check_typing_finished(index);

        for signal in signals {
            self.handle_signal(index, signal);
        }

        self.update_auto_play(index, delta);
        self.publish_navigation();
    }

    pub fn set_auto_play(&mut self, enabled: bool) {
        if self.auto_play == enabled {
            return;
        }
        self.auto_play = enabled;
        self.auto_wait = Duration::ZERO;
        log::debug!("auto-play {}", if enabled { "on" } else { "off" });
        self.events.push(PlayerEvent::AutoPlayChanged(enabled));
    }

    pub fn toggle_auto_play(&mut self) {
        self.set_auto_play(!self.auto_play);
    }

    pub fn auto_play(&self) -> bool {
        self.auto_play
    }

    /// Step is done: text fully shown and audio stopped, or text shown after a skip
    pub fn is_complete(&self) -> bool {
        match self.state {
            PlayerState::Playing { .. } => {
                if self.typing.is_skipped() {
                    self.typing.is_done()
                } else {
                    self.typing.is_done() && !self.audio.is_playing()
                }
            }
            _ => false,
        }
    }

    pub fn can_go_next(&self) -> bool {
        match self.state {
            PlayerState::Playing { index } => {
                self.is_complete() && index < self.sequence.last_index()
            }
            _ => false,
        }
    }

    pub fn can_go_prev(&self) -> bool {
        match self.state {
            PlayerState::Playing { index } | PlayerState::Settling { index, .. } => index > 0,
            _ => false,
        }
    }

    pub fn position(&self) -> Option<usize> {
        self.state.index()
    }

    pub fn current_step(&self) -> Option<&Step> {
        self.position().and_then(|i| self.sequence.get(i))
    }

    pub fn revealed_text(&self) -> &str {
        self.typing.revealed()
    }

    pub fn skip_stage(&self) -> SkipStage {
        SkipStage::from_flag(self.typing.is_skipped())
    }

    pub fn is_skipped(&self) -> bool {
        self.typing.is_skipped()
    }

    pub fn is_audio_playing(&self) -> bool {
        self.audio.is_playing()
    }

    pub fn is_awaiting_unlock(&self) -> bool {
        self.awaiting_unlock
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, PlayerState::Finished { .. })
    }

    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn bindings(&self) -> &KeyBindings {
        &self.bindings
    }

    pub fn audio(&self) -> &AudioChannel {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut AudioChannel {
        &mut self.audio
    }

    /// Take the events queued since the last call
    pub fn drain_events(&mut self) -> Vec<PlayerEvent> {
        std::mem::take(&mut self.events)
    }

    fn is_active(&self) -> bool {
        matches!(
            self.state,
            PlayerState::Playing { .. } | PlayerState::Settling { .. }
        )
    }

    fn enter_step(&mut self, index: usize) {
        self.audio.stop_audio();
        self.typing.reset_skip_state();
        self.typing.clear();
        self.typing_reported = false;
        self.stop_pending = false;
        self.auto_wait = Duration::ZERO;

        log::debug!("entering step {}", index);
        self.events.push(PlayerEvent::StepEntered { index });

        if self.config.settle_delay.is_zero() {
            self.begin_step(index);
        } else {
            self.state = PlayerState::Settling {
                index,
                remaining: self.config.settle_delay,
            };
        }
        self.publish_navigation();
    }

    fn begin_step(&mut self, index: usize) {
        self.state = PlayerState::Playing { index };
        let Some(step) = self.sequence.get(index) else {
            log::error!("step {} out of range", index);
            return;
        };

        self.audio.play_audio(step.audio_ref(), PlaybackHooks::new());
        if std::mem::take(&mut self.stop_pending) && self.audio.has_voice() {
            self.audio.stop_audio();
            self.events.push(PlayerEvent::AudioStopped { index });
        }
        if self.typing.start_typing(step.text()) && self.typing.revealed_len() > 0 {
            self.events.push(PlayerEvent::Revealed {
                chars: self.typing.revealed_len(),
            });
        }
        self.check_typing_finished(index);
        self.publish_navigation();
    }

    fn apply_skip(&mut self, command: SkipCommand) {
        let Some(index) = self.position() else {
            return;
        };
        log::debug!("{} on step {}", command, index);
        self.events.push(PlayerEvent::Skipped { index, command });

        match command {
            SkipCommand::FirstSkip => {
                let before = self.typing.revealed_len();
                self.typing.skip_typing();
                self.typing.reveal_all();
                if self.typing.revealed_len() != before {
                    self.events.push(PlayerEvent::Revealed {
                        chars: self.typing.revealed_len(),
                    });
                }
                if matches!(self.state, PlayerState::Playing { .. }) {
                    self.check_typing_finished(index);
                }
            }
            SkipCommand::SecondSkip => {
                if matches!(self.state, PlayerState::Settling { .. }) {
                    self.stop_pending = true;
                } else if self.audio.is_playing() {
                    self.audio.stop_audio();
                    self.events.push(PlayerEvent::AudioStopped { index });
                } else {
                    self.advance_from(index);
                    return;
                }
            }
        }
        self.publish_navigation();
    }

    /// Move past `index` without the completion gate
    fn advance_from(&mut self, index: usize) {
        if index >= self.sequence.last_index() {
            self.finish(index);
        } else {
            self.enter_step(index + 1);
        }
    }

    fn finish(&mut self, index: usize) {
        self.audio.stop_audio();
        self.state = PlayerState::Finished { index };
        log::info!("sequence finished");
        self.events.push(PlayerEvent::Finished);
        if let Some(callback) = self.on_complete.take() {
            callback();
        }
        self.publish_navigation();
    }

    fn check_typing_finished(&mut self, index: usize) {
        if !self.typing_reported && self.typing.is_done() {
            self.typing_reported = true;
            self.events.push(PlayerEvent::TypingFinished { index });
        }
    }

    fn handle_signal(&mut self, index: usize, signal: AudioSignal) {
        match signal {
            AudioSignal::Loaded => self.events.push(PlayerEvent::AudioLoaded { index }),
            AudioSignal::Ended => self.events.push(PlayerEvent::AudioEnded { index }),
            AudioSignal::Failed(error) => {
                if error == AudioError::PlaybackBlocked && index == 0 && !self.unlock_used {
                    log::info!("audio blocked; waiting for a key press");
                    self.awaiting_unlock = true;
                }
                self.events.push(PlayerEvent::AudioFailed { index, error });
            }
        }
    }

    fn resolve_unlock(&mut self) {
        self.awaiting_unlock = false;
        self.unlock_used = true;
        self.audio.unlock();

        if let PlayerState::Playing { index } = self.state {
            if let Some(step) = self.sequence.get(index) {
                log::debug!("replaying '{}' after unlock", step.audio_ref());
                self.audio.play_audio(step.audio_ref(), PlaybackHooks::new());
            }
        }
    }

    fn update_auto_play(&mut self, index: usize, delta: Duration) {
        let ready = self.auto_play
            && !self.awaiting_unlock
            && self.typing.is_done()
            && !self.audio.is_playing();
        if !ready {
            self.auto_wait = Duration::ZERO;
            return;
        }

        self.auto_wait += delta;
        if self.auto_wait >= self.config.auto_advance_delay {
            log::debug!("auto-play advancing from step {}", index);
            self.auto_wait = Duration::ZERO;
            self.advance_from(index);
        }
    }

    fn publish_navigation(&mut self) {
        let nav = (self.can_go_next(), self.can_go_prev());
        if self.nav != Some(nav) {
            self.nav = Some(nav);
            self.events.push(PlayerEvent::NavigationChanged {
                can_next: nav.0,
                can_prev: nav.1,
            });
        }
    }
}

impl fmt::Debug for SequencePlayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequencePlayer")
            .field("state", &self.state)
            .field("steps", &self.sequence.len())
            .field("revealed", &self.typing.revealed_len())
            .field("skipped", &self.typing.is_skipped())
            .field("audio", &self.audio)
            .field("auto_play", &self.auto_play)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::keys;
    use crate::script::DirResolver;
    use crate::sound::{ScriptedBackend, ScriptedControl};
    use std::cell::Cell;
    use std::rc::Rc;

    const TICK: Duration = Duration::from_millis(150);

    fn hi_bye() -> Sequence {
        Sequence::new(vec![Step::new("Hi", "a.mp3"), Step::new("Bye", "b.mp3")]).unwrap()
    }

    fn player_with(config: PlayerConfig) -> (SequencePlayer, ScriptedControl) {
        let (backend, control) = ScriptedBackend::new();
        let audio = AudioChannel::new(Box::new(backend), Box::new(DirResolver::new("/content")));
        (SequencePlayer::new(hi_bye(), audio, config), control)
    }

    fn player() -> (SequencePlayer, ScriptedControl) {
        player_with(PlayerConfig {
            settle_delay: Duration::ZERO,
            ..PlayerConfig::default()
        })
    }

    #[test]
    fn test_start_enters_first_step() {
        let (mut player, control) = player();
        assert_eq!(player.position(), None);
        player.start();
        assert_eq!(player.position(), Some(0));
        assert_eq!(player.revealed_text(), "");
        assert!(player.is_audio_playing());
        assert!(!player.is_complete());
        assert_eq!(control.opened().len(), 1);
    }

    #[test]
    fn test_settle_delay_defers_start() {
        let (mut player, control) = player_with(PlayerConfig::default());
        player.start();
        assert!(matches!(player.state(), PlayerState::Settling { index: 0, .. }));
        assert!(control.opened().is_empty());

        player.update(Duration::from_millis(5));
        assert!(control.opened().is_empty());

        // Leftover time after settling feeds the typing timer
        player.update(Duration::from_millis(5) + TICK);
        assert_eq!(control.opened().len(), 1);
        assert_eq!(player.revealed_text(), "H");
    }

    #[test]
    fn test_complete_after_typing_and_audio() {
        let (mut player, control) = player();
        player.start();
        control.load_current();
        player.update(TICK * 2);
        assert_eq!(player.revealed_text(), "Hi");
        assert!(!player.is_complete());
        assert!(!player.can_go_next());

        control.finish_current();
        player.update(Duration::ZERO);
        assert!(player.is_complete());
        assert!(player.can_go_next());
        assert!(!player.can_go_prev());
    }

    #[test]
    fn test_next_gated_until_complete() {
        let (mut player, _control) = player();
        player.start();
        assert!(!player.proceed_to_next());
        assert_eq!(player.position(), Some(0));
    }

    #[test]
    fn test_prev_at_zero_is_noop() {
        let (mut player, control) = player();
        player.start();
        player.update(TICK);
        player.drain_events();

        assert!(!player.proceed_to_prev());
        assert_eq!(player.position(), Some(0));
        assert_eq!(player.revealed_text(), "H");
        assert_eq!(control.opened().len(), 1);
        assert!(player.drain_events().is_empty());
    }

    #[test]
    fn test_first_skip_reveals_and_completes() {
        let (mut player, _control) = player();
        player.start();
        player.update(TICK);

        assert_eq!(player.skip(), Some(SkipCommand::FirstSkip));
        assert_eq!(player.revealed_text(), "Hi");
        assert!(player.is_skipped());
        assert!(player.is_audio_playing());
        assert!(player.is_complete());
    }

    #[test]
    fn test_second_skip_stops_audio() {
        let (mut player, control) = player();
        player.start();
        player.skip();
        assert_eq!(player.skip(), Some(SkipCommand::SecondSkip));
        assert!(!player.is_audio_playing());
        assert_eq!(control.live_voices(), 0);
        assert_eq!(player.position(), Some(0));
    }

    #[test]
    fn test_second_skip_without_audio_moves_on() {
        let (mut player, control) = player();
        control.fail_next_open(AudioError::NotFound("a.mp3".into()));
        player.start();
        player.skip();
        player.skip();
        assert_eq!(player.position(), Some(1));
        assert!(!player.is_skipped());
    }

    #[test]
    fn test_completion_fires_once() {
        let fired = Rc::new(Cell::new(0));
        let counter = Rc::clone(&fired);
        let (player, _control) = player();
        let mut player = player.on_complete(move || counter.set(counter.get() + 1));

        player.start();
        player.skip();
        assert!(player.proceed_to_next());
        player.skip();
        assert!(player.proceed_to_next());
        assert!(player.is_finished());
        assert!(!player.proceed_to_next());
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn test_handle_key_dispatches() {
        let (mut player, _control) = player();
        player.start();
        assert_eq!(player.handle_key(keys::SPACE, InputFocus::Page), Some(Action::Skip));
        assert!(player.is_skipped());
        assert_eq!(player.handle_key(keys::RIGHT, InputFocus::Page), Some(Action::Next));
        assert_eq!(player.position(), Some(1));
        assert_eq!(player.handle_key(keys::LEFT, InputFocus::Page), Some(Action::Prev));
        assert_eq!(player.position(), Some(0));
        assert_eq!(
            player.handle_key(keys::A, InputFocus::Page),
            Some(Action::ToggleAutoPlay)
        );
        assert!(player.auto_play());
        assert_eq!(player.handle_key(keys::ESCAPE, InputFocus::Page), None);
    }

    #[test]
    fn test_next_on_incomplete_last_step_is_ignored() {
        let (mut player, control) = player();
        player.start();
        player.skip();
        assert!(player.proceed_to_next());
        control.load_current();
        player.update(TICK);
        assert_eq!(player.revealed_text(), "B");

        assert_eq!(player.handle_key(keys::RIGHT, InputFocus::Page), Some(Action::Next));
        assert!(!player.is_finished());
        assert_eq!(player.position(), Some(1));
        assert!(player.is_audio_playing());
    }

    #[test]
    fn test_skip_key_after_finish_does_nothing() {
        let (mut player, _control) = player();
        assert_eq!(player.handle_key(keys::SPACE, InputFocus::Page), None);

        player.start();
        player.skip();
        player.proceed_to_next();
        player.skip();
        player.proceed_to_next();
        assert!(player.is_finished());
        assert_eq!(player.handle_key(keys::SPACE, InputFocus::Page), None);
    }

    #[test]
    fn test_text_field_suppresses_keys() {
        let (mut player, _control) = player();
        player.start();
        assert_eq!(player.handle_key(keys::SPACE, InputFocus::TextField), None);
        assert!(!player.is_skipped());
    }

    #[test]
    fn test_navigation_events_only_on_change() {
        let (mut player, _control) = player();
        player.start();
        let events = player.drain_events();
        assert_eq!(
            events,
            vec![
                PlayerEvent::StepEntered { index: 0 },
                PlayerEvent::NavigationChanged {
                    can_next: false,
                    can_prev: false
                },
            ]
        );

        player.update(TICK);
        assert_eq!(player.drain_events(), vec![PlayerEvent::Revealed { chars: 1 }]);
    }
}
