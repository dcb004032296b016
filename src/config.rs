use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Runtime configuration, loaded once at startup and never re-read.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Directory holding the pre-rendered frame images.
    pub image_folder_path: PathBuf,
    /// File the playback position is persisted to.
    pub current_frame_file: PathBuf,
    /// Frame-index units skipped per iteration. Also the delay between
    /// iterations, in milliseconds.
    pub frame_rate: u32,
    /// Physical panel driver. Optional: capture-only runs leave it out.
    #[serde(default)]
    pub display: Option<DisplayConfig>,
}

/// Settings for the hardware display backend.
#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    /// Command that drives the panel, e.g. "python3 epd_driver.py".
    pub driver_command: String,
    pub width: u32,
    pub height: u32,
}

impl Config {
    /// Read and validate the configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    // A frame_rate of 0 would leave the loop rendering the same frame
    // forever, so it is rejected here rather than detected mid-playback.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_rate < 1 {
            return Err(ConfigError::FrameRate(self.frame_rate));
        }
        if let Some(display) = &self.display {
            if display.driver_command.trim().is_empty() {
                return Err(ConfigError::DriverCommand);
            }
        }
        Ok(())
    }

    /// Pacing delay between iterations.
    pub fn delay(&self) -> Duration {
        Duration::from_millis(u64::from(self.frame_rate))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse configuration file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("frame_rate must be at least 1, got {0}")]
    FrameRate(u32),

    #[error("display.driver_command must not be empty")]
    DriverCommand,

    #[error("failed to read image folder {path:?}: {source}")]
    ImageFolder {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
