//! Timecode parsing and formatting.
//!
//! Accepted forms: `HH:MM:SS.mmm`, `MM:SS.mmm`, `SS.mmm` (fraction optional).

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TIMECODE_RE: Regex =
        Regex::new(r"^(?:(?:(\d+):)?([0-5]?\d):)?(\d+)(?:\.(\d+))?$").expect("valid timecode regex");
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimecodeError {
    Empty,
    Malformed(String),
    /// Seconds field >= 60 when minutes are present
    OutOfRange(String),
}

impl std::fmt::Display for TimecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimecodeError::Empty => write!(f, "Empty timecode"),
            TimecodeError::Malformed(s) => write!(f, "Malformed timecode: '{}'", s),
            TimecodeError::OutOfRange(s) => write!(f, "Timecode field out of range: '{}'", s),
        }
    }
}

impl std::error::Error for TimecodeError {}

/// Parse a timecode into seconds.
pub fn parse_timecode(input: &str) -> Result<f64, TimecodeError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(TimecodeError::Empty);
    }
    let caps = TIMECODE_RE
        .captures(s)
        .ok_or_else(|| TimecodeError::Malformed(s.to_string()))?;

    let field = |i: usize| -> u64 { caps.get(i).and_then(|m| m.as_str().parse().ok()).unwrap_or(0) };
    let hours = field(1);
    let minutes = field(2);
    let seconds = field(3);
    if caps.get(2).is_some() && seconds >= 60 {
        return Err(TimecodeError::OutOfRange(s.to_string()));
    }

    let fraction = match caps.get(4) {
        Some(m) => format!("0.{}", m.as_str())
            .parse::<f64>()
            .map_err(|_| TimecodeError::Malformed(s.to_string()))?,
        None => 0.0,
    };

    Ok((hours * 3600 + minutes * 60 + seconds) as f64 + fraction)
}

/// Format seconds as `HH:MM:SS.mmm` (negative input clamps to zero).
pub fn format_timecode(seconds: f64) -> String {
    let total_ms = if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    };
    let ms = total_ms % 1000;
    let total_s = total_ms / 1000;
    format!(
        "{:02}:{:02}:{:02}.{:03}",
        total_s / 3600,
        (total_s / 60) % 60,
        total_s % 60,
        ms
    )
}
