use std::ffi::OsString;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use exif::{In, Tag, Value};
use image::DynamicImage;
use thiserror::Error;
use tracing::warn;

use crate::config::ConfigError;

/// Ordered view over the frame images of one movie.
///
/// The sequence is built once at startup and sorted by file name, so the
/// same directory contents always yield the same order and a persisted
/// index keeps addressing the same frame across restarts.
pub struct FrameStore {
    folder: PathBuf,
    files: Vec<OsString>,
}

impl FrameStore {
    /// List the regular files of `folder`, sorted by name ascending.
    /// Subdirectories are skipped. An unreadable folder is a
    /// configuration error, fatal at startup.
    pub fn scan(folder: &Path) -> Result<Self, ConfigError> {
        let entries = fs::read_dir(folder).map_err(|source| ConfigError::ImageFolder {
            path: folder.to_path_buf(),
            source,
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| ConfigError::ImageFolder {
                path: folder.to_path_buf(),
                source,
            })?;
            if entry.path().is_file() {
                files.push(entry.file_name());
            }
        }
        files.sort();

        Ok(Self {
            folder: folder.to_path_buf(),
            files,
        })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Full path of the frame at `index`.
    pub fn resolve(&self, index: usize) -> PathBuf {
        self.folder.join(&self.files[index])
    }
}

/// Decode one frame image, honouring the EXIF orientation tag.
pub fn load_frame(path: &Path) -> Result<DynamicImage, FrameError> {
    let bytes = fs::read(path)?;

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase();

    // Orientation lives in EXIF, which only JPEG input reliably carries.
    let mut orientation = 1;
    if extension == "jpg" || extension == "jpeg" {
        match exif::Reader::new().read_from_container(&mut Cursor::new(&bytes)) {
            Ok(exif) => {
                if let Some(field) = exif.get_field(Tag::Orientation, In::PRIMARY) {
                    if let Value::Short(values) = &field.value {
                        if let Some(&value) = values.first() {
                            orientation = value;
                        }
                    }
                }
            }
            Err(e) => {
                // Non-fatal: render the frame as stored.
                warn!("could not read EXIF data for {:?}: {}", path, e);
            }
        }
    }

    let image = image::load_from_memory(&bytes)?;

    // 1 = upright; 3/6/8 are the rotation-only orientations. Mirrored
    // variants are left as stored.
    Ok(match orientation {
        3 => image.rotate180(),
        6 => image.rotate90(),
        8 => image.rotate270(),
        _ => image,
    })
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("failed to read image file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn enumerates_in_lexicographic_order() {
        let dir = tempdir().unwrap();
        // Created out of order on purpose.
        touch(&dir.path().join("a.png"));
        touch(&dir.path().join("c.png"));
        touch(&dir.path().join("b.png"));

        let frames = FrameStore::scan(dir.path()).unwrap();

        assert_eq!(frames.len(), 3);
        assert_eq!(frames.resolve(0), dir.path().join("a.png"));
        assert_eq!(frames.resolve(1), dir.path().join("b.png"));
        assert_eq!(frames.resolve(2), dir.path().join("c.png"));
    }

    #[test]
    fn skips_subdirectories() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("frame.png"));
        fs::create_dir(dir.path().join("thumbnails")).unwrap();

        let frames = FrameStore::scan(dir.path()).unwrap();

        assert_eq!(frames.len(), 1);
        assert_eq!(frames.resolve(0), dir.path().join("frame.png"));
    }

    #[test]
    fn empty_folder_yields_an_empty_sequence() {
        let dir = tempdir().unwrap();

        let frames = FrameStore::scan(dir.path()).unwrap();

        assert!(frames.is_empty());
    }

    #[test]
    fn missing_folder_is_a_configuration_error() {
        let dir = tempdir().unwrap();

        let result = FrameStore::scan(&dir.path().join("no_such_folder"));

        assert!(matches!(result, Err(ConfigError::ImageFolder { .. })));
    }

    #[test]
    fn loads_a_png_frame() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("frame.png");
        image::RgbImage::from_pixel(3, 2, image::Rgb([10, 20, 30]))
            .save(&path)
            .unwrap();

        let frame = load_frame(&path).unwrap();

        assert_eq!(frame.to_rgb8().dimensions(), (3, 2));
    }

    #[test]
    fn undecodable_file_is_a_decode_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("frame.png");
        fs::write(&path, b"not an image").unwrap();

        assert!(matches!(load_frame(&path), Err(FrameError::Decode(_))));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempdir().unwrap();

        let result = load_frame(&dir.path().join("gone.png"));

        assert!(matches!(result, Err(FrameError::Read(_))));
    }
}
