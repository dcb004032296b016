//! Slow-movie player for e-paper displays.
//!
//! Plays a folder of pre-rendered frames in name order, one frame every
//! few moments, and remembers how far it got so a restart resumes where
//! playback left off.

/// Configuration types and loading/validation.
pub mod config;
/// Display sink trait, the panel driver bridge and the capture sink.
pub mod display;
/// Error taxonomy shared across modules.
pub mod error;
/// Frame enumeration and decoding.
pub mod frames;
/// The playback engine.
pub mod player;
/// Durable playback-position storage.
pub mod position;
/// Cancellation token and signal handling.
pub mod shutdown;
/// Playback state machine states.
pub mod state;

pub use config::Config;
pub use display::{CaptureDisplay, DisplaySink, EpdProcess};
pub use error::Error;
pub use player::FramePlayer;
pub use position::PositionStore;
pub use shutdown::ShutdownFlag;
pub use state::PlaybackState;
