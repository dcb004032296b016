use std::io::Write;
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command, Stdio};

use image::DynamicImage;
use thiserror::Error;
use tracing::debug;

/// Capability surface of a rendering target. One caller at a time; the
/// playback engine never issues overlapping calls.
pub trait DisplaySink {
    fn init(&mut self) -> Result<(), DisplayError>;
    fn render(&mut self, index: u64, frame: &DynamicImage) -> Result<(), DisplayError>;
    fn clear(&mut self) -> Result<(), DisplayError>;
}

#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("display driver is not running")]
    NotInitialized,

    #[error("failed to spawn display driver {command:?}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to push pixels to the display driver: {0}")]
    Transfer(#[from] std::io::Error),

    #[error("frame is {frame_width}x{frame_height} but the panel is {panel_width}x{panel_height}")]
    Geometry {
        frame_width: u32,
        frame_height: u32,
        panel_width: u32,
        panel_height: u32,
    },

    #[error("failed to write captured frame {path:?}: {source}")]
    Capture {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Bridge to the physical e-paper panel. The vendor driver runs as a
/// child process spawned with the panel geometry on its command line and
/// receives one width*height grayscale payload per frame on stdin.
pub struct EpdProcess {
    command: String,
    width: u32,
    height: u32,
    process: Option<Child>,
    stdin: Option<ChildStdin>,
}

impl EpdProcess {
    pub fn new(command: &str, width: u32, height: u32) -> Self {
        Self {
            command: command.to_string(),
            width,
            height,
            process: None,
            stdin: None,
        }
    }

    fn write_payload(&mut self, pixels: &[u8]) -> Result<(), DisplayError> {
        let stdin = self.stdin.as_mut().ok_or(DisplayError::NotInitialized)?;
        stdin.write_all(pixels)?;
        stdin.flush()?;
        Ok(())
    }
}

impl DisplaySink for EpdProcess {
    /// Spawn the driver process. Re-initializing a running driver is a
    /// no-op, so the shutdown path can call this best-effort.
    fn init(&mut self) -> Result<(), DisplayError> {
        if self.process.is_some() {
            return Ok(());
        }

        let mut parts = self.command.split_whitespace();
        let program = parts.next().unwrap_or_default(); // non-empty, checked at config load
        let mut process = Command::new(program)
            .args(parts)
            .args(["--width", &self.width.to_string()])
            .args(["--height", &self.height.to_string()])
            .stdin(Stdio::piped())
            .spawn()
            .map_err(|source| DisplayError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        self.stdin = process.stdin.take();
        self.process = Some(process);
        debug!("display driver {:?} started", self.command);
        Ok(())
    }

    fn render(&mut self, index: u64, frame: &DynamicImage) -> Result<(), DisplayError> {
        let gray = frame.to_luma8();
        let (frame_width, frame_height) = gray.dimensions();
        if (frame_width, frame_height) != (self.width, self.height) {
            return Err(DisplayError::Geometry {
                frame_width,
                frame_height,
                panel_width: self.width,
                panel_height: self.height,
            });
        }

        debug!("pushing frame {} to the panel", index);
        self.write_payload(gray.as_raw())
    }

    /// Blank the panel with an all-white payload.
    fn clear(&mut self) -> Result<(), DisplayError> {
        let blank = vec![0xff_u8; self.width as usize * self.height as usize];
        self.write_payload(&blank)
    }
}

impl Drop for EpdProcess {
    fn drop(&mut self) {
        // Close stdin so the driver sees EOF, then reap it.
        self.stdin = None;
        if let Some(mut process) = self.process.take() {
            let _ = process.wait();
        }
    }
}

/// Capture stand-in for offline runs and tests. Keeps the most recent
/// frame in memory and, when a capture directory is set, writes each
/// frame out as an index-named bitmap.
pub struct CaptureDisplay {
    output_dir: Option<PathBuf>,
    current: Option<DynamicImage>,
}

impl CaptureDisplay {
    pub fn new(output_dir: Option<PathBuf>) -> Self {
        Self {
            output_dir,
            current: None,
        }
    }

    /// Most recently rendered frame, if any.
    pub fn current_frame(&self) -> Option<&DynamicImage> {
        self.current.as_ref()
    }
}

impl DisplaySink for CaptureDisplay {
    fn init(&mut self) -> Result<(), DisplayError> {
        Ok(())
    }

    fn render(&mut self, index: u64, frame: &DynamicImage) -> Result<(), DisplayError> {
        if let Some(dir) = &self.output_dir {
            let path = dir.join(format!("frame_{index}.bmp"));
            frame
                .save(&path)
                .map_err(|source| DisplayError::Capture { path, source })?;
        }
        self.current = Some(frame.clone());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        self.current = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_frame(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageLuma8(image::GrayImage::from_pixel(width, height, image::Luma([128])))
    }

    #[test]
    fn capture_stores_the_most_recent_frame() {
        let mut display = CaptureDisplay::new(None);

        display.render(0, &test_frame(2, 2)).unwrap();
        assert!(display.current_frame().is_some());

        display.clear().unwrap();
        assert!(display.current_frame().is_none());
    }

    #[test]
    fn capture_writes_index_named_bitmaps() {
        let dir = tempdir().unwrap();
        let mut display = CaptureDisplay::new(Some(dir.path().to_path_buf()));

        display.render(7, &test_frame(2, 2)).unwrap();

        assert!(dir.path().join("frame_7.bmp").is_file());
    }

    #[test]
    fn capture_into_a_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let mut display = CaptureDisplay::new(Some(dir.path().join("gone")));

        let result = display.render(0, &test_frame(2, 2));

        assert!(matches!(result, Err(DisplayError::Capture { .. })));
    }

    #[test]
    fn epd_render_before_init_fails() {
        let mut display = EpdProcess::new("true", 2, 2);

        let result = display.render(0, &test_frame(2, 2));

        assert!(matches!(result, Err(DisplayError::NotInitialized)));
    }

    #[test]
    fn epd_rejects_mismatched_geometry() {
        let mut display = EpdProcess::new("true", 4, 4);

        let result = display.render(0, &test_frame(2, 2));

        assert!(matches!(result, Err(DisplayError::Geometry { .. })));
    }

    #[test]
    fn epd_spawn_failure_surfaces_the_command() {
        let mut display = EpdProcess::new("/no/such/driver", 2, 2);

        let result = display.init();

        assert!(
            matches!(result, Err(DisplayError::Spawn { command, .. }) if command == "/no/such/driver")
        );
    }

    #[test]
    fn epd_streams_frames_to_the_driver_process() {
        // A stand-in driver that consumes stdin until EOF; the geometry
        // arguments land in $0/$1/... and are ignored by the script.
        let mut display = EpdProcess::new("sh -c cat>/dev/null", 2, 2);

        display.init().unwrap();
        display.init().unwrap(); // idempotent
        display.render(0, &test_frame(2, 2)).unwrap();
        display.clear().unwrap();
    }
}
