//! Scene/shot boundary detection seam.
//!
//! The detector is a black box: given a video, a sensitivity threshold and
//! an optional time window it returns ordered `[start, end)` ranges in
//! absolute seconds. [`index`] turns repeated calls into the navigation
//! index; [`scenedetect`] drives the external PySceneDetect CLI.

pub mod index;
pub mod scenedetect;

use std::cell::RefCell;
use std::path::Path;

pub use index::{IndexEntry, IndexLayout, IndexLevel, IndexSettings, NavIndex};
pub use scenedetect::{DetectorKind, SceneDetectCli};

/// Half-open time window in seconds.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }

    fn approx_eq(&self, other: &TimeRange) -> bool {
        (self.start - other.start).abs() < 1e-6 && (self.end - other.end).abs() < 1e-6
    }
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:.3}s, {:.3}s)", self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetectError {
    /// Executable could not be started
    Spawn(String),
    /// Process ran but reported failure
    Status { code: Option<i32>, stderr: String },
    /// Output could not be understood
    Parse(String),
    Io(String),
}

impl std::fmt::Display for DetectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetectError::Spawn(e) => write!(f, "Failed to start detector: {}", e),
            DetectError::Status { code, stderr } => match code {
                Some(c) => write!(f, "Detector exited with status {}: {}", c, stderr.trim()),
                None => write!(f, "Detector terminated by signal: {}", stderr.trim()),
            },
            DetectError::Parse(e) => write!(f, "Failed to parse detector output: {}", e),
            DetectError::Io(e) => write!(f, "Detector I/O error: {}", e),
        }
    }
}

impl std::error::Error for DetectError {}

impl From<std::io::Error> for DetectError {
    fn from(e: std::io::Error) -> Self {
        DetectError::Io(e.to_string())
    }
}

pub trait BoundaryDetector {
    /// Ranges found in `range` (whole video when `None`), in order.
    fn detect(&self, video: &Path, threshold: f64, range: Option<TimeRange>) -> Result<Vec<TimeRange>, DetectError>;
}

/// Detector returning canned answers; records every call.
///
/// Whole-video calls get `scenes`; windowed calls get the answer registered
/// for that exact window, or nothing.
#[derive(Debug, Default)]
pub struct FixedDetector {
    scenes: Vec<TimeRange>,
    windows: Vec<(TimeRange, Vec<TimeRange>)>,
    failure: Option<DetectError>,
    calls: RefCell<Vec<(f64, Option<TimeRange>)>>,
}

impl FixedDetector {
    pub fn new(scenes: Vec<TimeRange>) -> Self {
        Self {
            scenes,
            ..Self::default()
        }
    }

    /// Every call fails with `error`.
    pub fn failing(error: DetectError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    pub fn with_window(mut self, window: TimeRange, found: Vec<TimeRange>) -> Self {
        self.windows.push((window, found));
        self
    }

    /// `(threshold, range)` of every call so far.
    pub fn calls(&self) -> Vec<(f64, Option<TimeRange>)> {
        self.calls.borrow().clone()
    }
}

impl BoundaryDetector for FixedDetector {
    fn detect(&self, _video: &Path, threshold: f64, range: Option<TimeRange>) -> Result<Vec<TimeRange>, DetectError> {
        self.calls.borrow_mut().push((threshold, range));
        if let Some(e) = &self.failure {
            return Err(e.clone());
        }
        Ok(match range {
            None => self.scenes.clone(),
            Some(r) => self
                .windows
                .iter()
                .find(|(w, _)| w.approx_eq(&r))
                .map(|(_, found)| found.clone())
                .unwrap_or_default(),
        })
    }
}
