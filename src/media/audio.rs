//! Audio output paired with the video frame.
//!
//! The playback element only issues transport commands; decoding and the
//! output clock live in the backend. `play_from` always restarts from an
//! absolute offset so audio realigns with the displayed frame after a seek.

use std::path::Path;
use std::sync::{Arc, Mutex};

use log::debug;

use super::source::MediaError;

pub trait AudioSink {
    /// (Re)start playback at `seconds` from the beginning of the track.
    fn play_from(&mut self, seconds: f64);
    fn pause(&mut self);
    fn resume(&mut self);
    /// Stop and rewind to the start.
    fn stop(&mut self);
}

/// Transport call recorded by [`RecordingAudio`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AudioCall {
    PlayFrom(f64),
    Pause,
    Resume,
    Stop,
}

/// Sink that only records the calls it receives. The log handle is shared,
/// so it stays readable after the sink is boxed and handed away.
#[derive(Debug, Clone, Default)]
pub struct RecordingAudio {
    calls: Arc<Mutex<Vec<AudioCall>>>,
}

impl RecordingAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<AudioCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn push(&self, call: AudioCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

impl AudioSink for RecordingAudio {
    fn play_from(&mut self, seconds: f64) {
        self.push(AudioCall::PlayFrom(seconds));
    }

    fn pause(&mut self) {
        self.push(AudioCall::Pause);
    }

    fn resume(&mut self) {
        self.push(AudioCall::Resume);
    }

    fn stop(&mut self) {
        self.push(AudioCall::Stop);
    }
}

#[cfg(feature = "audio")]
pub use rodio_backend::RodioAudio;

#[cfg(feature = "audio")]
mod rodio_backend {
    use std::fs::File;
    use std::io::BufReader;
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    use log::{debug, error};
    use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

    use super::{AudioSink, MediaError};

    /// rodio output for one audio file on the default device.
    pub struct RodioAudio {
        path: PathBuf,
        // Dropping the stream silences the device
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sink: Option<Sink>,
    }

    impl RodioAudio {
        pub fn open(path: &Path) -> Result<Self, MediaError> {
            // Probe the file once so a bad path fails at load time
            let file = File::open(path).map_err(|e| MediaError::Open {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
            Decoder::new(BufReader::new(file)).map_err(|e| MediaError::Open {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

            let (stream, handle) = OutputStream::try_default().map_err(|e| MediaError::Open {
                path: path.to_path_buf(),
                reason: format!("audio device: {}", e),
            })?;
            Ok(Self {
                path: path.to_path_buf(),
                _stream: stream,
                handle,
                sink: None,
            })
        }

        fn start_at(&self, seconds: f64) -> Result<Sink, String> {
            let file = File::open(&self.path).map_err(|e| e.to_string())?;
            let decoder = Decoder::new(BufReader::new(file)).map_err(|e| e.to_string())?;
            let sink = Sink::try_new(&self.handle).map_err(|e| e.to_string())?;
            sink.append(decoder.skip_duration(Duration::from_secs_f64(seconds.max(0.0))));
            Ok(sink)
        }
    }

    impl AudioSink for RodioAudio {
        fn play_from(&mut self, seconds: f64) {
            if let Some(old) = self.sink.take() {
                old.stop();
            }
            match self.start_at(seconds) {
                Ok(sink) => {
                    debug!("Audio restarted at {:.3}s", seconds);
                    self.sink = Some(sink);
                }
                Err(e) => error!("Audio restart failed for {}: {}", self.path.display(), e),
            }
        }

        fn pause(&mut self) {
            if let Some(sink) = &self.sink {
                sink.pause();
            }
        }

        fn resume(&mut self) {
            match &self.sink {
                Some(sink) => sink.play(),
                None => self.play_from(0.0),
            }
        }

        fn stop(&mut self) {
            if let Some(sink) = self.sink.take() {
                sink.stop();
            }
        }
    }
}

/// Open an audio track with the compiled-in backend.
pub fn open_audio(path: &Path) -> Result<Box<dyn AudioSink>, MediaError> {
    debug!("Opening audio {}", path.display());
    #[cfg(feature = "audio")]
    {
        Ok(Box::new(RodioAudio::open(path)?))
    }
    #[cfg(not(feature = "audio"))]
    {
        Err(MediaError::Unsupported(format!(
            "{} (built without the `audio` feature)",
            path.display()
        )))
    }
}
