use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::info;

/// Cooperative cancellation token shared between the signal handler and
/// the playback loop. The handler only sets the flag; the loop notices
/// it at the next iteration boundary, so the shutdown routine always
/// runs on the playback thread and exactly once.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Route SIGINT and SIGTERM to the shutdown flag.
pub fn install_signal_handler(flag: ShutdownFlag) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        info!("termination signal received");
        flag.trigger();
    })
}
