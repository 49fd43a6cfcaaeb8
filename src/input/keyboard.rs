//! Keyboard binding management
//!
//! Binds keycodes to player actions.

use std::collections::HashMap;
use std::fmt;

use super::keynames::{key_name, keys};

/// What a key press asks the player to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Two-stage skip: finish typing, then stop audio
    Skip,
    Next,
    Prev,
    ToggleAutoPlay,
    Quit,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::Skip,
        Action::Next,
        Action::Prev,
        Action::ToggleAutoPlay,
        Action::Quit,
    ];
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Skip => "skip",
            Action::Next => "next",
            Action::Prev => "prev",
            Action::ToggleAutoPlay => "autoplay",
            Action::Quit => "quit",
        };
        f.write_str(name)
    }
}

/// One keycode per action, as configured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyMap {
    pub skip: i32,
    pub next: i32,
    pub prev: i32,
    pub auto_play: i32,
    pub quit: i32,
}

impl Default for KeyMap {
    fn default() -> Self {
        Self {
            skip: keys::SPACE,
            next: keys::RIGHT,
            prev: keys::LEFT,
            auto_play: keys::A,
            quit: keys::Q,
        }
    }
}

impl KeyMap {
    pub fn key_for(&self, action: Action) -> i32 {
        match action {
            Action::Skip => self.skip,
            Action::Next => self.next,
            Action::Prev => self.prev,
            Action::ToggleAutoPlay => self.auto_play,
            Action::Quit => self.quit,
        }
    }
}

/// Keycode to action table
#[derive(Debug, Clone, Default)]
pub struct KeyBindings {
    bindings: HashMap<i32, Action>,
}

impl KeyBindings {
    /// Create a new empty binding table
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the table for a key map. Later actions win if two share a key.
    pub fn from_keymap(map: &KeyMap) -> Self {
        let mut bindings = Self::new();
        for action in Action::ALL {
            if let Some(prev) = bindings.bind(map.key_for(action), action) {
                log::warn!(
                    "key {} bound to both {} and {}",
                    key_name(map.key_for(action)),
                    prev,
                    action
                );
            }
        }
        bindings
    }

    /// Bind a key, returning the action it was previously bound to
    pub fn bind(&mut self, keycode: i32, action: Action) -> Option<Action> {
        self.bindings.insert(keycode, action)
    }

    pub fn unbind(&mut self, keycode: i32) -> Option<Action> {
        self.bindings.remove(&keycode)
    }

    pub fn action_for(&self, keycode: i32) -> Option<Action> {
        self.bindings.get(&keycode).copied()
    }

    /// First key bound to `action`, lowest keycode first
    pub fn key_for(&self, action: Action) -> Option<i32> {
        self.bindings
            .iter()
            .filter(|(_, &a)| a == action)
            .map(|(&k, _)| k)
            .min()
    }

    pub fn clear(&mut self) {
        self.bindings.clear();
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
