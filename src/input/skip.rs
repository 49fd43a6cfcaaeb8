//! Two-stage skip key
//!
//! The first press finishes the typing, the second stops the narration.
//! The listener keeps no state of its own; the stage is read from the
//! typing driver's skip flag, which resets on every step change.

use std::fmt;

use super::keynames::keys;

/// Where keyboard focus currently sits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputFocus {
    #[default]
    Page,
    /// A text input owns the keyboard; the skip key types a character instead
    TextField,
}

/// Skip stage for the current step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipStage {
    NotSkipped,
    Skipped,
}

impl SkipStage {
    pub fn from_flag(skipped: bool) -> Self {
        if skipped {
            Self::Skipped
        } else {
            Self::NotSkipped
        }
    }
}

/// Command produced by a skip press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipCommand {
    /// Finish the typing
    FirstSkip,
    /// Stop the audio and allow moving on
    SecondSkip,
}

impl SkipCommand {
    /// Command dispatched from a given stage
    pub fn for_stage(stage: SkipStage) -> Self {
        match stage {
            SkipStage::NotSkipped => Self::FirstSkip,
            SkipStage::Skipped => Self::SecondSkip,
        }
    }
}

impl fmt::Display for SkipCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipCommand::FirstSkip => f.write_str("first skip"),
            SkipCommand::SecondSkip => f.write_str("second skip"),
        }
    }
}

/// Interprets the trigger key as a skip command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkipListener {
    trigger: i32,
}

impl Default for SkipListener {
    fn default() -> Self {
        Self::new(keys::SPACE)
    }
}

impl SkipListener {
    pub fn new(trigger: i32) -> Self {
        Self { trigger }
    }

    pub fn trigger(&self) -> i32 {
        self.trigger
    }

    pub fn set_trigger(&mut self, keycode: i32) {
        self.trigger = keycode;
    }

    /// Map a key press to a skip command.
    ///
    /// Returns `None` for any other key, and for the trigger while a text
    /// field has focus.
    pub fn dispatch(&self, keycode: i32, focus: InputFocus, skipped: bool) -> Option<SkipCommand> {
        if keycode != self.trigger || focus == InputFocus::TextField {
            return None;
        }
        Some(SkipCommand::for_stage(SkipStage::from_flag(skipped)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_then_second() {
        let listener = SkipListener::default();
        assert_eq!(
            listener.dispatch(keys::SPACE, InputFocus::Page, false),
            Some(SkipCommand::FirstSkip)
        );
        assert_eq!(
            listener.dispatch(keys::SPACE, InputFocus::Page, true),
            Some(SkipCommand::SecondSkip)
        );
    }

    #[test]
    fn test_text_field_suppresses() {
        let listener = SkipListener::default();
        assert_eq!(listener.dispatch(keys::SPACE, InputFocus::TextField, false), None);
        assert_eq!(listener.dispatch(keys::SPACE, InputFocus::TextField, true), None);
    }

    #[test]
    fn test_other_keys_ignored() {
        let listener = SkipListener::default();
        assert_eq!(listener.dispatch(keys::RETURN, InputFocus::Page, false), None);
    }

    #[test]
    fn test_custom_trigger() {
        let mut listener = SkipListener::new(keys::RETURN);
        assert_eq!(
            listener.dispatch(keys::RETURN, InputFocus::Page, false),
            Some(SkipCommand::FirstSkip)
        );
        listener.set_trigger(keys::TAB);
        assert_eq!(listener.dispatch(keys::RETURN, InputFocus::Page, false), None);
        assert_eq!(listener.trigger(), keys::TAB);
    }
}
