//! Decode sources and audio output.
//!
//! - [`source`] - `VideoSource` trait, stream info, errors, synthetic source
//! - [`sequence`] - numbered image frames on disk
//! - `ffmpeg` - container/codec decoding (feature `ffmpeg`)
//! - [`audio`] - `AudioSink` trait and the rodio backend (feature `audio`)

pub mod audio;
#[cfg(feature = "ffmpeg")]
pub mod ffmpeg;
pub mod sequence;
pub mod source;

pub use audio::AudioSink;
#[cfg(feature = "ffmpeg")]
pub use ffmpeg::FfmpegSource;
pub use sequence::ImageSequenceSource;
pub use source::{MediaError, SyntheticSource, VideoInfo, VideoSource};

use std::path::Path;

/// Open `path` with the best available backend: image sequences (a
/// directory, a glob pattern or one numbered frame) always, containers
/// through ffmpeg when that feature is enabled.
pub fn open_video(path: &Path, sequence_fps: f64) -> Result<Box<dyn VideoSource>, MediaError> {
    if sequence::looks_like_sequence(path) {
        return Ok(Box::new(ImageSequenceSource::open(path, sequence_fps)?));
    }
    #[cfg(feature = "ffmpeg")]
    {
        Ok(Box::new(FfmpegSource::open(path)?))
    }
    #[cfg(not(feature = "ffmpeg"))]
    {
        Err(MediaError::Unsupported(format!(
            "{} (built without the `ffmpeg` feature)",
            path.display()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_goes_to_decoder_backend() {
        let result = open_video(Path::new("/nonexistent/InputVideo.mp4"), 24.0);
        // Default build decodes containers; the error is the missing file
        #[cfg(feature = "ffmpeg")]
        assert!(matches!(result, Err(MediaError::Open { .. })));
        #[cfg(not(feature = "ffmpeg"))]
        assert!(matches!(result, Err(MediaError::Unsupported(_))));
    }

    #[test]
    fn test_numbered_frame_goes_to_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let frame = dir.path().join("shot.0001.png");
        image::RgbImage::new(2, 2).save(&frame).unwrap();
        let source = open_video(&frame, 12.0).unwrap();
        assert_eq!(source.info().frame_count, 1);
        assert_eq!(source.info().fps, 12.0);
    }
}
