//! Audio output for narrated steps
//!
//! # Architecture
//!
//! - `AudioBackend` trait defines the output interface
//! - `AudioChannel` enforces a single live clip and runs the load watchdog
//! - `rodio_backend` plays through the system output on its own thread
//! - `null` and `scripted` are silent backends for headless runs and tests

pub mod backend;
pub mod channel;
pub mod null;
pub mod rodio_backend;
pub mod scripted;

pub use backend::{AudioBackend, AudioError, VoiceId, VoiceStatus};
pub use channel::{AudioChannel, AudioSignal, PlaybackHooks, DEFAULT_LOAD_TIMEOUT};
pub use null::NullBackend;
pub use rodio_backend::RodioBackend;
pub use scripted::{ScriptedBackend, ScriptedControl};
