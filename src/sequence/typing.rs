//! Character-by-character text reveal
//!
//! One character appears per interval. The driver also owns the step's
//! skip flag, which the skip listener reads to pick the next skip stage.

use std::time::Duration;

use super::types::DEFAULT_TYPING_INTERVAL;

/// Reveals a string one character at a time
#[derive(Debug, Clone)]
pub struct TypingDriver {
    text: String,
    /// Total length in characters
    char_count: usize,
    /// Characters currently shown
    revealed: usize,
    interval: Duration,
    /// Time accumulated toward the next character
    elapsed: Duration,
    /// Reveal timer running
    active: bool,
    skipped: bool,
}

impl Default for TypingDriver {
    fn default() -> Self {
        Self::new(DEFAULT_TYPING_INTERVAL)
    }
}

impl TypingDriver {
    pub fn new(interval: Duration) -> Self {
        Self {
            text: String::new(),
            char_count: 0,
            revealed: 0,
            interval,
            elapsed: Duration::ZERO,
            active: false,
            skipped: false,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// Begin revealing `text`, cancelling any reveal in flight.
    ///
    /// Returns true when the reveal completed synchronously: the text is
    /// empty, or this step was already skipped.
    pub fn start_typing(&mut self, text: &str) -> bool {
        self.text = text.to_string();
        self.char_count = text.chars().count();
        self.revealed = 0;
        self.elapsed = Duration::ZERO;

        if self.skipped || self.char_count == 0 {
            self.reveal_all();
            return true;
        }
        self.active = true;
        false
    }

    /// Stop the reveal timer and mark the step skipped. The reveal is left
    /// where it is; pair with `reveal_all`.
    pub fn skip_typing(&mut self) {
        self.active = false;
        self.elapsed = Duration::ZERO;
        self.skipped = true;
    }

    /// Show the whole text and stop the timer
    pub fn reveal_all(&mut self) {
        self.revealed = self.char_count;
        self.active = false;
        self.elapsed = Duration::ZERO;
    }

    pub fn reset_skip_state(&mut self) {
        self.skipped = false;
    }

    /// Drop the text and stop the timer; skip state is untouched
    pub fn clear(&mut self) {
        self.text.clear();
        self.char_count = 0;
        self.revealed = 0;
        self.elapsed = Duration::ZERO;
        self.active = false;
    }

    /// Advance the reveal timer. Returns the number of characters revealed.
    pub fn update(&mut self, delta: Duration) -> usize {
        if !self.active {
            return 0;
        }

        let before = self.revealed;
        if self.interval.is_zero() {
            self.revealed = self.char_count;
        } else {
            self.elapsed += delta;
            while self.elapsed >= self.interval && self.revealed < self.char_count {
                self.elapsed -= self.interval;
                self.revealed += 1;
            }
        }

        if self.revealed >= self.char_count {
            self.active = false;
            self.elapsed = Duration::ZERO;
        }
        self.revealed - before
    }

    /// Currently visible prefix
    pub fn revealed(&self) -> &str {
        self.text
            .char_indices()
            .nth(self.revealed)
            .map(|(i, _)| &self.text[..i])
            .unwrap_or(&self.text)
    }

    /// Visible prefix length in characters
    pub fn revealed_len(&self) -> usize {
        self.revealed
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn char_count(&self) -> usize {
        self.char_count
    }

    /// Whole text is visible
    pub fn is_done(&self) -> bool {
        self.revealed == self.char_count
    }

    pub fn is_skipped(&self) -> bool {
        self.skipped
    }

    /// Reveal timer running
    pub fn is_typing(&self) -> bool {
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_millis(150);

    #[test]
    fn test_reveals_one_char_per_interval() {
        let mut typing = TypingDriver::new(TICK);
        assert!(!typing.start_typing("Hi"));
        assert_eq!(typing.revealed(), "");
        assert!(typing.is_typing());

        assert_eq!(typing.update(TICK), 1);
        assert_eq!(typing.revealed(), "H");
        assert!(!typing.is_done());

        assert_eq!(typing.update(TICK), 1);
        assert_eq!(typing.revealed(), "Hi");
        assert!(typing.is_done());
        assert!(!typing.is_typing());
    }

    #[test]
    fn test_partial_interval_carries_over() {
        let mut typing = TypingDriver::new(TICK);
        typing.start_typing("abc");
        assert_eq!(typing.update(Duration::from_millis(100)), 0);
        assert_eq!(typing.update(Duration::from_millis(100)), 1);
        assert_eq!(typing.update(Duration::from_millis(100)), 1);
        assert_eq!(typing.revealed(), "ab");
    }

    #[test]
    fn test_large_delta_reveals_several() {
        let mut typing = TypingDriver::new(TICK);
        typing.start_typing("hello");
        assert_eq!(typing.update(Duration::from_secs(10)), 5);
        assert!(typing.is_done());
        assert_eq!(typing.update(Duration::from_secs(10)), 0);
    }

    #[test]
    fn test_multibyte_text() {
        let mut typing = TypingDriver::new(TICK);
        typing.start_typing("héé!");
        typing.update(TICK * 2);
        assert_eq!(typing.revealed(), "hé");
        assert_eq!(typing.revealed_len(), 2);
        assert_eq!(typing.char_count(), 4);
    }

    #[test]
    fn test_empty_text_completes_immediately() {
        let mut typing = TypingDriver::new(TICK);
        assert!(typing.start_typing(""));
        assert!(typing.is_done());
        assert!(!typing.is_typing());
    }

    #[test]
    fn test_skip_then_reveal_all() {
        let mut typing = TypingDriver::new(TICK);
        typing.start_typing("Hello");
        typing.update(TICK);

        typing.skip_typing();
        assert!(typing.is_skipped());
        assert!(!typing.is_typing());
        assert_eq!(typing.revealed(), "H");

        typing.reveal_all();
        assert_eq!(typing.revealed(), "Hello");
        assert!(typing.is_done());

        // Timer is gone
        assert_eq!(typing.update(TICK), 0);
    }

    #[test]
    fn test_start_while_skipped_completes_synchronously() {
        let mut typing = TypingDriver::new(TICK);
        typing.skip_typing();
        assert!(typing.start_typing("Bye"));
        assert_eq!(typing.revealed(), "Bye");
    }

    #[test]
    fn test_restart_cancels_previous() {
        let mut typing = TypingDriver::new(TICK);
        typing.start_typing("first");
        typing.update(TICK * 3);
        typing.start_typing("second");
        assert_eq!(typing.revealed(), "");
        typing.update(TICK);
        assert_eq!(typing.revealed(), "s");
    }

    #[test]
    fn test_reset_skip_state() {
        let mut typing = TypingDriver::new(TICK);
        typing.skip_typing();
        typing.reset_skip_state();
        assert!(!typing.is_skipped());
        assert!(!typing.start_typing("x"));
    }

    #[test]
    fn test_zero_interval_reveals_on_first_update() {
        let mut typing = TypingDriver::new(Duration::ZERO);
        typing.start_typing("abc");
        assert_eq!(typing.update(Duration::ZERO), 3);
        assert!(typing.is_done());
    }

    #[test]
    fn test_clear_keeps_skip_flag() {
        let mut typing = TypingDriver::new(TICK);
        typing.start_typing("abc");
        typing.skip_typing();
        typing.clear();
        assert_eq!(typing.revealed(), "");
        assert!(typing.is_done());
        assert!(typing.is_skipped());
    }
}
