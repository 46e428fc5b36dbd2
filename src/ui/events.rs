//! Events emitted by controls and drained by the player between ticks.

/// Seek the video to `seconds` (index entries, digit keys).
#[derive(Clone, Debug, PartialEq)]
pub struct SeekRequested {
    pub seconds: f64,
}

/// Transport button / key action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackCommand {
    Play,
    Pause,
    Toggle,
    Stop,
}

/// Ask the host to show a file picker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpenRequested;

/// Ask the host to close the window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuitRequested;
