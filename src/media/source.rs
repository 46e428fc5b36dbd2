//! Video decode source abstraction.
//!
//! A source is a forward reader over frames with random-access seek. The
//! playback element pulls one frame per decode step and never touches the
//! underlying container or files.

use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};

/// Errors from opening, decoding or seeking media.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaError {
    Open { path: PathBuf, reason: String },
    Decode(String),
    Seek(String),
    Unsupported(String),
    NoFrames(PathBuf),
}

impl std::fmt::Display for MediaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaError::Open { path, reason } => write!(f, "Failed to open {}: {}", path.display(), reason),
            MediaError::Decode(e) => write!(f, "Decode error: {}", e),
            MediaError::Seek(e) => write!(f, "Seek error: {}", e),
            MediaError::Unsupported(e) => write!(f, "Unsupported media: {}", e),
            MediaError::NoFrames(p) => write!(f, "No frames found at {}", p.display()),
        }
    }
}

impl std::error::Error for MediaError {}

/// Stream properties fixed at open time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    /// Native frame rate
    pub fps: f64,
    pub frame_count: u64,
}

impl VideoInfo {
    /// `frame_count / fps`, 0 for a stream without a usable rate.
    pub fn duration(&self) -> f64 {
        if self.fps > 0.0 {
            self.frame_count as f64 / self.fps
        } else {
            0.0
        }
    }

    /// Index of the first frame at or after `seconds`, clamped to the stream.
    pub fn frame_at_or_after(&self, seconds: f64) -> u64 {
        if self.fps <= 0.0 || !seconds.is_finite() || seconds <= 0.0 {
            return 0;
        }
        // Tolerate float noise so exact frame times map to themselves
        let idx = (seconds * self.fps - 1e-6).ceil().max(0.0) as u64;
        idx.min(self.frame_count)
    }
}

/// Sequential frame reader with seek.
pub trait VideoSource {
    fn info(&self) -> &VideoInfo;

    /// Where the frames come from, if on disk.
    fn path(&self) -> Option<&Path> {
        None
    }

    /// Decode the frame at the read position and advance it.
    /// `Ok(None)` at end of stream.
    fn read_next(&mut self) -> Result<Option<RgbImage>, MediaError>;

    /// Move the read position to the first frame at or after `seconds`.
    fn seek(&mut self, seconds: f64) -> Result<(), MediaError>;

    /// Index of the frame the next `read_next` returns.
    fn position(&self) -> u64;
}

/// In-memory source producing flat-colored frames.
///
/// Frame `n` is filled with `(n % 256, 255 - n % 256, 0)`, so the displayed
/// index can be read back from any pixel. Counts decodes and can be told to
/// fail at a given frame.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    info: VideoInfo,
    position: u64,
    decoded: u64,
    fail_at: Option<u64>,
}

impl SyntheticSource {
    pub fn new(width: u32, height: u32, fps: f64, frame_count: u64) -> Self {
        Self {
            info: VideoInfo {
                width,
                height,
                fps,
                frame_count,
            },
            position: 0,
            decoded: 0,
            fail_at: None,
        }
    }

    /// Make `read_next` fail with a decode error at frame `index`.
    pub fn failing_at(mut self, index: u64) -> Self {
        self.fail_at = Some(index);
        self
    }

    /// Number of successful `read_next` calls so far.
    pub fn decoded(&self) -> u64 {
        self.decoded
    }

    /// Color used for frame `index`.
    pub fn frame_color(index: u64) -> Rgb<u8> {
        let v = (index % 256) as u8;
        Rgb([v, 255 - v, 0])
    }
}

impl VideoSource for SyntheticSource {
    fn info(&self) -> &VideoInfo {
        &self.info
    }

    fn read_next(&mut self) -> Result<Option<RgbImage>, MediaError> {
        if self.fail_at == Some(self.position) {
            return Err(MediaError::Decode(format!("synthetic failure at frame {}", self.position)));
        }
        if self.position >= self.info.frame_count {
            return Ok(None);
        }
        let img = RgbImage::from_pixel(self.info.width, self.info.height, Self::frame_color(self.position));
        self.position += 1;
        self.decoded += 1;
        Ok(Some(img))
    }

    fn seek(&mut self, seconds: f64) -> Result<(), MediaError> {
        self.position = self.info.frame_at_or_after(seconds);
        Ok(())
    }

    fn position(&self) -> u64 {
        self.position
    }
}
