use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::display::DisplayError;
use crate::frames::FrameError;

/// Error type used across the player modules. Every variant is fatal:
/// nothing in the player is retried.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The display backend failed to come up.
    #[error("display initialization failed: {0}")]
    HardwareInit(#[source] DisplayError),

    /// The position file exists but does not hold a frame index. Not
    /// auto-repaired: defaulting to 0 would silently replay the movie.
    #[error("position file {path:?} is corrupt: {content:?} is not a frame index")]
    StateCorruption { path: PathBuf, content: String },

    /// A frame image could not be read or decoded.
    #[error("failed to load frame {index} from {path:?}")]
    FrameLoad {
        index: u64,
        path: PathBuf,
        #[source]
        source: FrameError,
    },

    /// The display sink rejected a frame.
    #[error("display rejected frame {index}")]
    Render {
        index: u64,
        #[source]
        source: DisplayError,
    },

    /// Reading or writing the position file failed.
    #[error("position file {path:?}: {source}")]
    Position {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
