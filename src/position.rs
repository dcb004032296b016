use std::fs;
use std::io;
use std::path::PathBuf;

use crate::error::Error;

/// Durable record of the next frame index to show. Plain text holding a
/// single decimal integer, fully overwritten on each save.
pub struct PositionStore {
    path: PathBuf,
}

impl PositionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the persisted position. A missing file is a first run and
    /// yields 0; anything unparsable propagates as corruption rather
    /// than silently restarting the movie.
    pub fn load(&self) -> Result<u64, Error> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(source) if source.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(source) => {
                return Err(Error::Position {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let trimmed = content.trim();
        trimmed.parse::<u64>().map_err(|_| Error::StateCorruption {
            path: self.path.clone(),
            content: trimmed.to_string(),
        })
    }

    /// Overwrite the stored position. Writes a sibling temp file and
    /// renames it over the target so a reader never observes a partial
    /// value, even if the process dies mid-save.
    pub fn save(&self, position: u64) -> Result<(), Error> {
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, position.to_string()).map_err(|source| Error::Position {
            path: self.path.clone(),
            source,
        })?;
        fs::rename(&tmp, &self.path).map_err(|source| Error::Position {
            path: self.path.clone(),
            source,
        })
    }
}
