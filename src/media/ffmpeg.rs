//! FFmpeg-backed video source (feature `ffmpeg`).
//!
//! Keeps one demuxer, decoder and RGB24 scaler open for the lifetime of the
//! source, so sequential reads cost one decode each. Seeking jumps to the
//! keyframe at or before the target and decodes forward to the first frame
//! whose timestamp reaches it; that frame is held back and returned by the
//! next `read_next`.

use std::path::{Path, PathBuf};
use std::sync::Once;

use image::RgbImage;
use log::{debug, info, warn};
use playa_ffmpeg as ffmpeg;

use super::source::{MediaError, VideoInfo, VideoSource};

static FFMPEG_LOG_INIT: Once = Once::new();

fn init_ffmpeg_logging() {
    FFMPEG_LOG_INIT.call_once(|| unsafe {
        ffmpeg::ffi::av_log_set_level(ffmpeg::ffi::AV_LOG_QUIET);
    });
}

fn open_err(path: &Path, what: &str, e: impl std::fmt::Display) -> MediaError {
    MediaError::Open {
        path: path.to_path_buf(),
        reason: format!("{}: {}", what, e),
    }
}

pub struct FfmpegSource {
    path: PathBuf,
    ictx: ffmpeg::format::context::Input,
    decoder: ffmpeg::decoder::Video,
    scaler: ffmpeg::software::scaling::Context,
    stream_idx: usize,
    /// Seconds per stream timestamp unit
    time_base: f64,
    info: VideoInfo,
    position: u64,
    /// Frame decoded while seeking, returned by the next read
    pending: Option<RgbImage>,
    eof_sent: bool,
}

impl FfmpegSource {
    pub fn open(path: &Path) -> Result<Self, MediaError> {
        init_ffmpeg_logging();

        let ictx = ffmpeg::format::input(&path).map_err(|e| open_err(path, "open", e))?;
        let stream = ictx
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or_else(|| open_err(path, "streams", "no video stream"))?;
        let stream_idx = stream.index();

        let tb = stream.time_base();
        let time_base = tb.numerator() as f64 / tb.denominator().max(1) as f64;
        let rate = stream.avg_frame_rate();
        let fps = if rate.denominator() > 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };
        let frame_count = if stream.frames() > 0 {
            stream.frames() as u64
        } else {
            (stream.duration().max(0) as f64 * time_base * fps).round() as u64
        };

        let mut decoder_ctx = ffmpeg::codec::context::Context::from_parameters(stream.parameters())
            .map_err(|e| open_err(path, "decoder context", e))?;
        unsafe {
            (*decoder_ctx.as_mut_ptr()).thread_type = ffmpeg::ffi::FF_THREAD_FRAME;
            (*decoder_ctx.as_mut_ptr()).thread_count = 0;
        }
        let decoder = decoder_ctx
            .decoder()
            .video()
            .map_err(|e| open_err(path, "video decoder", e))?;

        let (width, height) = (decoder.width(), decoder.height());
        let scaler = ffmpeg::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg::format::Pixel::RGB24,
            width,
            height,
            ffmpeg::software::scaling::Flags::BILINEAR,
        )
        .map_err(|e| open_err(path, "scaler", e))?;

        info!(
            "Opened video {} ({}x{}, {:.3} fps, {} frames)",
            path.display(),
            width,
            height,
            fps,
            frame_count
        );

        Ok(Self {
            path: path.to_path_buf(),
            ictx,
            decoder,
            scaler,
            stream_idx,
            time_base,
            info: VideoInfo {
                width,
                height,
                fps,
                frame_count,
            },
            position: 0,
            pending: None,
            eof_sent: false,
        })
    }

    /// Next decoded frame with its timestamp in seconds, or `None` once the
    /// decoder is drained.
    fn decode_next(&mut self) -> Result<Option<(ffmpeg::util::frame::video::Video, Option<f64>)>, MediaError> {
        loop {
            let mut decoded = ffmpeg::util::frame::video::Video::empty();
            if self.decoder.receive_frame(&mut decoded).is_ok() {
                let secs = decoded.timestamp().map(|ts| ts as f64 * self.time_base);
                return Ok(Some((decoded, secs)));
            }
            if self.eof_sent {
                return Ok(None);
            }

            let idx = self.stream_idx;
            let next = self
                .ictx
                .packets()
                .find(|(stream, _)| stream.index() == idx)
                .map(|(_, packet)| packet);
            match next {
                Some(packet) => self
                    .decoder
                    .send_packet(&packet)
                    .map_err(|e| MediaError::Decode(e.to_string()))?,
                None => {
                    self.decoder
                        .send_eof()
                        .map_err(|e| MediaError::Decode(e.to_string()))?;
                    self.eof_sent = true;
                }
            }
        }
    }

    fn to_rgb(&mut self, frame: &ffmpeg::util::frame::video::Video) -> Result<RgbImage, MediaError> {
        let mut rgb = ffmpeg::util::frame::video::Video::empty();
        self.scaler
            .run(frame, &mut rgb)
            .map_err(|e| MediaError::Decode(format!("scale: {}", e)))?;

        let (w, h) = (self.info.width as usize, self.info.height as usize);
        let stride = rgb.stride(0);
        let data = rgb.data(0);
        let row = w * 3;
        let mut out = Vec::with_capacity(row * h);
        for y in 0..h {
            out.extend_from_slice(&data[y * stride..y * stride + row]);
        }
        RgbImage::from_raw(w as u32, h as u32, out)
            .ok_or_else(|| MediaError::Decode("frame buffer size mismatch".into()))
    }
}

impl VideoSource for FfmpegSource {
    fn info(&self) -> &VideoInfo {
        &self.info
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }

    fn read_next(&mut self) -> Result<Option<RgbImage>, MediaError> {
        if let Some(img) = self.pending.take() {
            self.position += 1;
            return Ok(Some(img));
        }
        match self.decode_next()? {
            Some((frame, _)) => {
                let img = self.to_rgb(&frame)?;
                self.position += 1;
                Ok(Some(img))
            }
            None => Ok(None),
        }
    }

    fn seek(&mut self, seconds: f64) -> Result<(), MediaError> {
        if self.time_base <= 0.0 {
            return Err(MediaError::Seek("stream has no time base".into()));
        }
        let target_idx = self.info.frame_at_or_after(seconds);
        let fps = self.info.fps.max(f64::EPSILON);
        let target_secs = target_idx as f64 / fps;
        let target_ts = (target_secs / self.time_base).floor() as i64;

        let ret = unsafe {
            ffmpeg::ffi::av_seek_frame(
                self.ictx.as_mut_ptr(),
                self.stream_idx as i32,
                target_ts,
                ffmpeg::ffi::AVSEEK_FLAG_BACKWARD,
            )
        };
        if ret < 0 {
            return Err(MediaError::Seek(format!("av_seek_frame returned {}", ret)));
        }
        self.decoder.flush();
        self.eof_sent = false;
        self.pending = None;

        // Half a frame of slack for timestamp rounding
        let threshold = target_secs - 0.5 / fps;
        while let Some((frame, secs)) = self.decode_next()? {
            let secs = secs.unwrap_or(target_secs);
            if secs >= threshold {
                self.pending = Some(self.to_rgb(&frame)?);
                self.position = (secs * fps).round().max(0.0) as u64;
                debug!("Seek {:.3}s -> frame {} ({:.3}s)", seconds, self.position, secs);
                return Ok(());
            }
        }

        warn!("Seek {:.3}s ran past end of stream", seconds);
        self.position = self.info.frame_count;
        Ok(())
    }

    fn position(&self) -> u64 {
        self.position
    }
}
