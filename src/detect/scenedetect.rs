//! Adapter for the PySceneDetect command line tool.
//!
//! Runs `scenedetect` once per call, writing the scene list as CSV into a
//! per-call temp directory, and reads the `Start/End Time (seconds)`
//! columns back. Lists without the seconds columns are read from the
//! `Start/End Timecode` columns instead.
//!
//! ```text
//! scenedetect -i <video> -o <tmp> [time -s <start> -e <end>]
//!     detect-adaptive|detect-content -t <threshold>
//!     list-scenes -f scenes.csv -s
//! ```

use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::core::timecode::{format_timecode, parse_timecode};

use super::{BoundaryDetector, DetectError, TimeRange};

const CSV_NAME: &str = "scenes.csv";
const START_COLUMN: &str = "Start Time (seconds)";
const END_COLUMN: &str = "End Time (seconds)";
const START_TC_COLUMN: &str = "Start Timecode";
const END_TC_COLUMN: &str = "End Timecode";

/// Which PySceneDetect algorithm to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DetectorKind {
    #[default]
    Adaptive,
    Content,
}

impl DetectorKind {
    fn command(&self) -> &'static str {
        match self {
            DetectorKind::Adaptive => "detect-adaptive",
            DetectorKind::Content => "detect-content",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SceneDetectCli {
    executable: PathBuf,
    kind: DetectorKind,
}

impl SceneDetectCli {
    pub fn new(executable: impl Into<PathBuf>, kind: DetectorKind) -> Self {
        Self {
            executable: executable.into(),
            kind,
        }
    }

    /// Full argument list for one run (without the executable).
    pub fn args(&self, video: &Path, out_dir: &Path, threshold: f64, range: Option<TimeRange>) -> Vec<String> {
        let mut args = vec![
            "-i".to_string(),
            video.to_string_lossy().into_owned(),
            "-o".to_string(),
            out_dir.to_string_lossy().into_owned(),
        ];
        if let Some(r) = range {
            args.extend([
                "time".to_string(),
                "-s".to_string(),
                format_timecode(r.start),
                "-e".to_string(),
                format_timecode(r.end),
            ]);
        }
        args.extend([
            self.kind.command().to_string(),
            "-t".to_string(),
            format!("{}", threshold),
            "list-scenes".to_string(),
            "-f".to_string(),
            CSV_NAME.to_string(),
            "-s".to_string(),
        ]);
        args
    }
}

impl BoundaryDetector for SceneDetectCli {
    fn detect(&self, video: &Path, threshold: f64, range: Option<TimeRange>) -> Result<Vec<TimeRange>, DetectError> {
        let out_dir = std::env::temp_dir().join(format!("scene-review-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&out_dir)?;

        let args = self.args(video, &out_dir, threshold, range);
        debug!("Running {} {}", self.executable.display(), args.join(" "));

        let result = Command::new(&self.executable)
            .args(&args)
            .output()
            .map_err(|e| DetectError::Spawn(format!("{}: {}", self.executable.display(), e)))
            .and_then(|output| {
                if !output.status.success() {
                    return Err(DetectError::Status {
                        code: output.status.code(),
                        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                    });
                }
                let csv = std::fs::read_to_string(out_dir.join(CSV_NAME))?;
                parse_scene_csv(&csv)
            });

        if let Err(e) = std::fs::remove_dir_all(&out_dir) {
            debug!("Could not remove {}: {}", out_dir.display(), e);
        }

        let ranges = result?;
        info!(
            "{} t={} {}: {} ranges",
            self.kind.command(),
            threshold,
            range.map_or_else(|| "whole video".to_string(), |r| r.to_string()),
            ranges.len()
        );
        Ok(ranges)
    }
}

/// Parse a PySceneDetect scene list. A leading `Timecode List:` line is
/// skipped; columns are located by header name.
pub fn parse_scene_csv(csv: &str) -> Result<Vec<TimeRange>, DetectError> {
    let mut lines = csv.lines().map(str::trim).filter(|l| !l.is_empty());

    let header = lines
        .by_ref()
        .find(|l| l.contains(START_COLUMN) || l.contains(START_TC_COLUMN))
        .ok_or_else(|| DetectError::Parse(format!("missing '{}' column", START_COLUMN)))?;
    let columns: Vec<&str> = header.split(',').map(str::trim).collect();
    let col = |name: &str| columns.iter().position(|c| *c == name);

    let (start_idx, end_idx, timecodes) = match (col(START_COLUMN), col(END_COLUMN)) {
        (Some(s), Some(e)) => (s, e, false),
        _ => match (col(START_TC_COLUMN), col(END_TC_COLUMN)) {
            (Some(s), Some(e)) => (s, e, true),
            _ => return Err(DetectError::Parse(format!("missing '{}' column", END_COLUMN))),
        },
    };

    lines
        .enumerate()
        .map(|(row, line)| {
            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            let field = |idx: usize| -> Result<f64, DetectError> {
                let bad = || DetectError::Parse(format!("row {}: bad time value in '{}'", row + 1, line));
                let value = fields.get(idx).ok_or_else(bad)?;
                if timecodes {
                    parse_timecode(value).map_err(|e| DetectError::Parse(format!("row {}: {}", row + 1, e)))
                } else {
                    value.parse::<f64>().map_err(|_| bad())
                }
            };
            Ok(TimeRange::new(field(start_idx)?, field(end_idx)?))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Timecode List:,00:00:04.000,00:00:09.500
Scene Number,Start Frame,Start Timecode,Start Time (seconds),End Frame,End Timecode,End Time (seconds),Length (frames),Length (timecode),Length (seconds)
1,1,00:00:00.000,0.000,120,00:00:04.000,4.000,120,00:00:04.000,4.000
2,121,00:00:04.000,4.000,285,00:00:09.500,9.500,165,00:00:05.500,5.500
";

    #[test]
    fn test_parse_scene_csv() {
        let ranges = parse_scene_csv(SAMPLE).unwrap();
        assert_eq!(ranges, vec![TimeRange::new(0.0, 4.0), TimeRange::new(4.0, 9.5)]);
    }

    #[test]
    fn test_parse_header_only_is_empty() {
        let csv = "Scene Number,Start Time (seconds),End Time (seconds)\n";
        assert_eq!(parse_scene_csv(csv).unwrap(), vec![]);
    }

    #[test]
    fn test_parse_timecode_columns_when_seconds_missing() {
        let csv = "\
Scene Number,Start Frame,Start Timecode,End Frame,End Timecode
1,1,00:00:00.000,120,00:00:04.000
2,121,00:00:04.000,285,00:01:09.500
";
        let ranges = parse_scene_csv(csv).unwrap();
        assert_eq!(ranges, vec![TimeRange::new(0.0, 4.0), TimeRange::new(4.0, 69.5)]);

        let bad = "Start Timecode,End Timecode\n00:00:01.000,00:00:99\n";
        assert!(matches!(parse_scene_csv(bad), Err(DetectError::Parse(_))));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse_scene_csv("garbage"), Err(DetectError::Parse(_))));
        let csv = "Start Time (seconds),End Time (seconds)\n1.0,x\n";
        assert!(matches!(parse_scene_csv(csv), Err(DetectError::Parse(_))));
    }

    #[test]
    fn test_args_with_window() {
        let cli = SceneDetectCli::new("scenedetect", DetectorKind::Content);
        let args = cli.args(
            Path::new("in.mp4"),
            Path::new("/tmp/out"),
            27.0,
            Some(TimeRange::new(4.0, 9.5)),
        );
        assert_eq!(
            args,
            vec![
                "-i", "in.mp4", "-o", "/tmp/out", "time", "-s", "00:00:04.000", "-e", "00:00:09.500",
                "detect-content", "-t", "27", "list-scenes", "-f", "scenes.csv", "-s",
            ]
        );
    }

    #[test]
    fn test_missing_executable_is_spawn_error() {
        let cli = SceneDetectCli::new("/nonexistent/scenedetect", DetectorKind::Adaptive);
        let err = cli.detect(Path::new("in.mp4"), 3.0, None).unwrap_err();
        assert!(matches!(err, DetectError::Spawn(_)));
    }
}
