use clap::Parser;
use std::path::PathBuf;

use crate::config::Settings;
use crate::detect::DetectorKind;

#[cfg(feature = "ffmpeg")]
const VIDEO_BACKEND: &str = "playa-ffmpeg 8.0 (static)";
#[cfg(not(feature = "ffmpeg"))]
const VIDEO_BACKEND: &str = "image sequences only";

#[cfg(feature = "audio")]
const AUDIO_BACKEND: &str = "rodio";
#[cfg(not(feature = "audio"))]
const AUDIO_BACKEND: &str = "disabled";

// Build version with backend info
const VERSION_INFO: &str = const_format::concatcp!(
    env!("CARGO_PKG_VERSION"), "\n",
    "Video:  ", VIDEO_BACKEND, "\n",
    "Audio:  ", AUDIO_BACKEND, "\n",
    "Target: ", std::env::consts::ARCH, "-", std::env::consts::OS
);

/// Video review tool with a scene/shot navigation index
#[derive(Parser, Debug, Default)]
#[command(author, version = VERSION_INFO, about, long_about = None)]
pub struct Args {
    /// Video file, image sequence folder, glob or numbered frame
    #[arg(value_name = "VIDEO")]
    pub video: Option<PathBuf>,

    /// Audio track played in sync with the video
    #[arg(short = 'a', long = "audio", value_name = "FILE")]
    pub audio: Option<PathBuf>,

    /// Frame rate for image sequences
    #[arg(long = "fps", value_name = "FPS")]
    pub fps: Option<f64>,

    /// Scene detector threshold
    #[arg(long = "scene-threshold", value_name = "T")]
    pub scene_threshold: Option<f64>,

    /// Shot detector threshold
    #[arg(long = "shot-threshold", value_name = "T")]
    pub shot_threshold: Option<f64>,

    /// Subshot detector threshold
    #[arg(long = "subshot-threshold", value_name = "T")]
    pub subshot_threshold: Option<f64>,

    /// Detection algorithm
    #[arg(long = "detector", value_enum, value_name = "KIND")]
    pub detector: Option<DetectorKind>,

    /// Path to the scenedetect executable
    #[arg(long = "scenedetect", value_name = "EXE")]
    pub scenedetect: Option<PathBuf>,

    /// Host refresh rate in Hz
    #[arg(short = 'r', long = "refresh-rate", value_name = "HZ")]
    pub refresh_rate: Option<f64>,

    /// Skip scene detection; the index holds a single entry
    #[arg(long = "no-index")]
    pub no_index: bool,

    /// Start playing as soon as the video is loaded
    #[arg(long = "autoplay")]
    pub autoplay: bool,

    /// Enable debug logging to file (default: scene-review.log)
    #[arg(short = 'l', long = "log", value_name = "LOG_FILE")]
    pub log_file: Option<Option<PathBuf>>,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,

    /// Custom configuration directory (overrides default platform paths)
    #[arg(short = 'c', long = "config-dir", value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    /// Write the effective settings back to the config file
    #[arg(long = "save-config")]
    pub save_config: bool,
}

impl Args {
    /// Overlay the options given on the command line onto `settings`.
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(fps) = self.fps {
            settings.sequence_fps = fps;
        }
        if let Some(t) = self.scene_threshold {
            settings.scene_threshold = t;
        }
        if let Some(t) = self.shot_threshold {
            settings.shot_threshold = t;
        }
        if let Some(t) = self.subshot_threshold {
            settings.subshot_threshold = t;
        }
        if let Some(kind) = self.detector {
            settings.detector = kind;
        }
        if let Some(exe) = &self.scenedetect {
            settings.scenedetect_path = exe.clone();
        }
        if let Some(hz) = self.refresh_rate {
            settings.refresh_rate = hz;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_overrides() {
        let args = Args::try_parse_from([
            "scene-review",
            "clip.mp4",
            "--audio",
            "clip.wav",
            "--shot-threshold",
            "12.5",
            "--detector",
            "content",
            "-r",
            "120",
            "-vv",
            "--log",
        ])
        .unwrap();

        assert_eq!(args.video, Some(PathBuf::from("clip.mp4")));
        assert_eq!(args.audio, Some(PathBuf::from("clip.wav")));
        assert_eq!(args.verbosity, 2);
        assert_eq!(args.log_file, Some(None));

        let mut settings = Settings::default();
        args.apply_to(&mut settings);
        assert_eq!(settings.shot_threshold, 12.5);
        assert_eq!(settings.detector, DetectorKind::Content);
        assert_eq!(settings.refresh_rate, 120.0);
        assert_eq!(settings.scene_threshold, Settings::default().scene_threshold);
    }

    #[test]
    fn test_no_args() {
        let args = Args::try_parse_from(["scene-review"]).unwrap();
        assert!(args.video.is_none());
        assert!(!args.no_index);
        let mut settings = Settings::default();
        args.apply_to(&mut settings);
        assert_eq!(settings, Settings::default());
    }
}
