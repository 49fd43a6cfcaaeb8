//! Narrated sequence playback
//!
//! - `typing`: reveals step text one character at a time
//! - `player`: the controller tying typing, audio and input to a position
//! - `types`: config, state and events shared by both

pub mod player;
pub mod types;
pub mod typing;

pub use player::SequencePlayer;
pub use types::{
    PlayerConfig, PlayerEvent, PlayerState, DEFAULT_AUTO_ADVANCE_DELAY, DEFAULT_SETTLE_DELAY,
    DEFAULT_TYPING_INTERVAL,
};
pub use typing::TypingDriver;
