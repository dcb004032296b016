#[derive(Debug, PartialEq, Clone, Copy)]
pub enum PlaybackState {
    Running,     // Advancing through the frame sequence
    Completed,   // Ran off the end of the frame sequence
    Interrupted, // A termination signal ended playback early
}
