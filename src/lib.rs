// Narrator library
// Narrated sequence playback: typed text kept in step with speech clips

pub mod cli;
pub mod config;
pub mod console;
pub mod input;
pub mod logging;
pub mod script;
pub mod sequence;
pub mod sound;

pub use cli::Cli;
pub use config::Options;
pub use logging::LogLevel;
pub use script::{Sequence, Step};
pub use sequence::{PlayerConfig, PlayerEvent, PlayerState, SequencePlayer};
pub use sound::AudioChannel;
