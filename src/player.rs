use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::display::DisplaySink;
use crate::error::Error;
use crate::frames::{self, FrameStore};
use crate::position::PositionStore;
use crate::shutdown::ShutdownFlag;
use crate::state::PlaybackState;

/// The playback engine. Each iteration shows the frame at the current
/// position, advances by the configured step, persists the new position
/// and waits out the pacing delay.
pub struct FramePlayer {
    frames: FrameStore,
    position_store: PositionStore,
    display: Box<dyn DisplaySink>,
    step: u64,
    delay: Duration,
    shutdown: ShutdownFlag,
    position: u64,
    state: PlaybackState,
}

impl FramePlayer {
    /// Bring up the display, scan the frame sequence and load the
    /// persisted position. Every failure here is fatal; a half-working
    /// display or a corrupt position file is not recoverable.
    pub fn new(
        config: &Config,
        mut display: Box<dyn DisplaySink>,
        shutdown: ShutdownFlag,
    ) -> Result<Self, Error> {
        display.init().map_err(Error::HardwareInit)?;

        let frames = FrameStore::scan(&config.image_folder_path)?;
        if frames.is_empty() {
            warn!("no frames found in {:?}", config.image_folder_path);
        }

        let position_store = PositionStore::new(&config.current_frame_file);
        let position = position_store.load()?;

        info!(
            "{} frames in {:?}, resuming at index {}",
            frames.len(),
            config.image_folder_path,
            position
        );

        Ok(Self {
            frames,
            position_store,
            display,
            step: u64::from(config.frame_rate),
            delay: config.delay(),
            shutdown,
            position,
            state: PlaybackState::Running,
        })
    }

    /// Index of the next frame due for display.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Run the playback loop until the sequence is exhausted or a
    /// termination signal arrives.
    pub fn play(&mut self) -> Result<PlaybackState, Error> {
        let total = self.frames.len() as u64;

        while self.state == PlaybackState::Running {
            // A signal may have arrived during the previous pacing sleep.
            if self.shutdown.is_triggered() {
                self.interrupt()?;
                break;
            }

            if self.position >= total {
                self.position_store.save(self.position)?;
                self.state = PlaybackState::Completed;
                break;
            }

            self.show_current_frame(total)?;

            // A signal that landed mid-render must not advance the
            // position: only the in-flight frame is lost, and a restart
            // resumes from the last completed frame's resulting position.
            if self.shutdown.is_triggered() {
                self.interrupt()?;
                break;
            }

            self.position += self.step;
            self.position_store.save(self.position)?;

            thread::sleep(self.delay);
        }

        Ok(self.state)
    }

    fn show_current_frame(&mut self, total: u64) -> Result<(), Error> {
        let path = self.frames.resolve(self.position as usize);
        debug!(
            "Displaying frame {} of {} ({:.1}%)",
            self.position + 1,
            total,
            (self.position + 1) as f64 / total as f64 * 100.0
        );

        let frame = frames::load_frame(&path).map_err(|source| Error::FrameLoad {
            index: self.position,
            path,
            source,
        })?;
        self.display
            .render(self.position, &frame)
            .map_err(|source| Error::Render {
                index: self.position,
                source,
            })
    }

    /// Shutdown path: wake and blank the panel best-effort, then persist
    /// the position. A display that refuses to clear must never cost the
    /// saved position.
    fn interrupt(&mut self) -> Result<(), Error> {
        info!("shutting down at frame index {}", self.position);
        if let Err(e) = self.display.init() {
            warn!("could not re-initialize the display: {e}");
        }
        if let Err(e) = self.display.clear() {
            warn!("could not clear the display: {e}");
        }
        self.position_store.save(self.position)?;
        self.state = PlaybackState::Interrupted;
        Ok(())
    }
}
