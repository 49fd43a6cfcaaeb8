//! Keyboard input for the player
//!
//! - `keynames`: keycode <-> name table used by config and the console
//! - `keyboard`: key bindings to player actions
//! - `skip`: the two-stage skip key

pub mod keyboard;
pub mod keynames;
pub mod skip;

pub use keyboard::{Action, KeyBindings, KeyMap};
pub use keynames::{key_from_name, key_name, keys};
pub use skip::{InputFocus, SkipCommand, SkipListener, SkipStage};
