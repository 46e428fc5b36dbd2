//! Video playback element.
//!
//! Owns the decode source, the playback clock and the optional audio sink.
//! The host ticks faster than most videos run. Each playing tick adds
//! `native / host` to a phase accumulator and a frame is decoded whenever the
//! phase reaches one, keeping the remainder, so the decode rate never exceeds
//! the native rate (24 fps on 60 Hz decodes on 2 of every 5 ticks). The rate
//! is capped at one decode per tick.
//!
//! Invariants:
//! - `0 <= current_time <= duration`
//! - `current_time` only moves on a successful decode or a seek
//! - end of stream and decode errors stop playback; they never reach the
//!   per-tick caller

use image::imageops::{self, FilterType};
use image::RgbImage;
use log::{debug, error, info, warn};

use crate::media::{AudioSink, VideoInfo, VideoSource};

use super::widget::{Base, ElementId, TreeRequest, UpdateCx, Widget};

pub struct VideoFrame {
    source: Option<Box<dyn VideoSource>>,
    audio: Option<Box<dyn AudioSink>>,
    fps: f64,
    duration: f64,
    current_time: f64,
    playing: bool,
    host_rate: Option<f64>,
    /// Frames per tick, in `(0, 1]`
    step: f64,
    phase: f64,
    /// Text element that mirrors the playback position
    readout: Option<ElementId>,
    frame: Option<RgbImage>,
    display_size: (u32, u32),
    decoded_frames: u64,
}

impl Default for VideoFrame {
    fn default() -> Self {
        Self::new()
    }
}

/// Largest size with the video's aspect ratio that fits `max_w x max_h`.
pub fn fit_size(info: &VideoInfo, max_w: i32, max_h: i32) -> (i32, i32) {
    if info.width == 0 || info.height == 0 || max_w <= 0 || max_h <= 0 {
        return (max_w.max(0), max_h.max(0));
    }
    let scale = (max_w as f64 / info.width as f64).min(max_h as f64 / info.height as f64);
    let w = (info.width as f64 * scale).floor().max(1.0) as i32;
    let h = (info.height as f64 * scale).floor().max(1.0) as i32;
    (w, h)
}

/// Playback position readout, `"{current:.2} / {duration:.2}"`.
pub fn time_label(current: f64, duration: f64) -> String {
    format!("{:.2} / {:.2}", current, duration)
}

impl VideoFrame {
    pub fn new() -> Self {
        Self {
            source: None,
            audio: None,
            fps: 0.0,
            duration: 0.0,
            current_time: 0.0,
            playing: false,
            host_rate: None,
            step: 1.0,
            phase: 0.0,
            readout: None,
            frame: None,
            display_size: (0, 0),
            decoded_frames: 0,
        }
    }

    pub fn has_media(&self) -> bool {
        self.source.is_some()
    }

    pub fn info(&self) -> Option<&VideoInfo> {
        self.source.as_ref().map(|s| s.info())
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Ticks per decoded frame, rounded up (2.5 for 24 fps on 60 Hz reads 3).
    pub fn update_interval(&self) -> u32 {
        (1.0 / self.step - 1e-9).ceil().max(1.0) as u32
    }

    /// Frames decoded per host tick.
    pub fn frames_per_tick(&self) -> f64 {
        self.step
    }

    /// Keep `text` showing `"{current} / {duration}"`; refreshed during the
    /// traversal right after each playback step.
    pub fn set_readout(&mut self, text: Option<ElementId>) {
        self.readout = text;
    }

    /// Last decoded image, already scaled to the display size.
    pub fn frame(&self) -> Option<&RgbImage> {
        self.frame.as_ref()
    }

    /// Successful decodes since the element was created.
    pub fn decoded_frames(&self) -> u64 {
        self.decoded_frames
    }

    /// Install a source, rewind to 0 and decode the first frame.
    pub fn load_video(&mut self, source: Box<dyn VideoSource>) {
        let info = *source.info();
        info!(
            "VideoFrame: loaded {}x{} @ {:.3} fps, {:.2}s",
            info.width,
            info.height,
            info.fps,
            info.duration()
        );
        if let Some(audio) = self.audio.as_mut() {
            audio.stop();
        }
        self.source = Some(source);
        self.fps = info.fps;
        self.duration = info.duration();
        self.current_time = 0.0;
        self.playing = false;
        self.phase = 0.0;
        self.frame = None;
        self.recompute_interval();
        if !self.decode_one() {
            warn!("VideoFrame: no first frame available");
        }
    }

    /// Pair with an audio sink, or unpair with `None`. A new sink is aligned
    /// to the current time and follows the playing state.
    pub fn set_audio(&mut self, audio: Option<Box<dyn AudioSink>>) {
        if let Some(old) = self.audio.as_mut() {
            old.stop();
        }
        self.audio = audio;
        let (t, playing) = (self.current_time, self.playing);
        if let Some(audio) = self.audio.as_mut() {
            audio.play_from(t);
            if !playing {
                audio.pause();
            }
        }
    }

    pub fn load_audio(&mut self, audio: Box<dyn AudioSink>) {
        self.set_audio(Some(audio));
    }

    pub fn play(&mut self) {
        if self.source.is_none() {
            warn!("VideoFrame: play without media");
            return;
        }
        if !self.playing {
            self.playing = true;
            if let Some(audio) = self.audio.as_mut() {
                audio.resume();
            }
        }
    }

    pub fn pause(&mut self) {
        if self.playing {
            self.playing = false;
            if let Some(audio) = self.audio.as_mut() {
                audio.pause();
            }
        }
    }

    pub fn toggle(&mut self) {
        if self.playing {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Pause, rewind to 0 and realign audio.
    pub fn stop(&mut self) {
        self.pause();
        if self.source.is_some() {
            self.jump_to(0.0);
        }
    }

    /// Host refresh rate in Hz; sets how many frames each tick advances.
    pub fn set_interval(&mut self, host_rate: f64) {
        self.host_rate = Some(host_rate);
        self.recompute_interval();
    }

    fn recompute_interval(&mut self) {
        self.step = match self.host_rate {
            Some(host) if self.fps > 0.0 && host > 0.0 => (self.fps / host).min(1.0),
            _ => 1.0,
        };
        self.phase = 0.0;
    }

    /// Pause and move `frames` frames from the current one (negative = back).
    pub fn step_frames(&mut self, frames: i64) {
        self.pause();
        if self.fps > 0.0 {
            self.jump_to(self.current_time + frames as f64 / self.fps);
        }
    }

    /// Start time of the final frame.
    pub fn last_frame_time(&self) -> f64 {
        match self.info() {
            Some(info) if self.fps > 0.0 && info.frame_count > 0 => {
                ((info.frame_count - 1) as f64 / self.fps).min(self.duration)
            }
            _ => 0.0,
        }
    }

    /// Seek to the first frame at or after `seconds` and show it.
    pub fn jump_to(&mut self, seconds: f64) {
        let Some(source) = self.source.as_mut() else {
            warn!("VideoFrame: seek to {:.3}s without media", seconds);
            return;
        };
        let target = seconds.clamp(0.0, self.duration);
        if let Err(e) = source.seek(target) {
            error!("VideoFrame: seek to {:.3}s failed: {}", target, e);
            return;
        }
        let landed = if self.fps > 0.0 {
            source.position() as f64 / self.fps
        } else {
            0.0
        };
        self.current_time = landed.clamp(0.0, self.duration);
        self.phase = 0.0;
        debug!("VideoFrame: seek {:.3}s -> {:.3}s", seconds, self.current_time);

        self.decode_one();

        let (t, playing) = (self.current_time, self.playing);
        if let Some(audio) = self.audio.as_mut() {
            audio.play_from(t);
            if !playing {
                audio.pause();
            }
        }
    }

    /// Decode the frame at the read position. Returns false on end of
    /// stream or error, leaving the previous image in place.
    fn decode_one(&mut self) -> bool {
        let Some(source) = self.source.as_mut() else {
            return false;
        };
        match source.read_next() {
            Ok(Some(img)) => {
                self.frame = Some(self.scale_to_display(img));
                self.decoded_frames += 1;
                true
            }
            Ok(None) => {
                debug!("VideoFrame: end of stream at {:.3}s", self.current_time);
                false
            }
            Err(e) => {
                warn!("VideoFrame: decode failed at {:.3}s: {}", self.current_time, e);
                false
            }
        }
    }

    fn scale_to_display(&self, img: RgbImage) -> RgbImage {
        let (w, h) = self.display_size;
        if w == 0 || h == 0 || img.dimensions() == (w, h) {
            img
        } else {
            imageops::resize(&img, w, h, FilterType::Triangle)
        }
    }

    /// One host tick of the playback clock.
    fn advance(&mut self) {
        if !self.playing || self.source.is_none() {
            return;
        }
        self.phase += self.step;
        // Tolerance keeps exact ratios (0.4 x 5) from slipping a tick
        if self.phase < 1.0 - 1e-9 {
            return;
        }
        self.phase = (self.phase - 1.0).max(0.0);

        if self.decode_one() {
            if self.fps > 0.0 {
                self.current_time = (self.current_time + 1.0 / self.fps).clamp(0.0, self.duration);
            }
        } else {
            self.playing = false;
            if let Some(audio) = self.audio.as_mut() {
                audio.pause();
            }
        }
    }
}

impl Widget for VideoFrame {
    fn kind_name(&self) -> &'static str {
        "VideoFrame"
    }

    fn on_update(&mut self, base: &mut Base, cx: &mut UpdateCx<'_>) {
        self.advance();
        if let Some(text) = self.readout {
            cx.request(TreeRequest::SetText {
                id: text,
                text: time_label(self.current_time, self.duration),
            });
        }
        if let Some(frame) = &self.frame {
            base.surface.blit_rgb(frame, 0, 0);
        }
    }

    fn on_resized(&mut self, base: &mut Base) {
        self.display_size = (base.width() as u32, base.height() as u32);
        if let Some(frame) = self.frame.take() {
            self.frame = Some(self.scale_to_display(frame));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::audio::{AudioCall, RecordingAudio};
    use crate::media::SyntheticSource;
    use crate::ui::glyphs::BlockGlyphs;
    use crate::ui::input::InputSnapshot;
    use crate::ui::surface::Surface;
    use crate::ui::text::Text;
    use crate::ui::tree::UiTree;

    fn setup(fps: f64, frames: u64, host: f64) -> (UiTree, ElementId) {
        let mut tree = UiTree::with_glyphs(Box::new(BlockGlyphs));
        let id = tree.create(0, 0, 8, 6, VideoFrame::new());
        let vf = video(&mut tree, id);
        vf.load_video(Box::new(SyntheticSource::new(16, 12, fps, frames)));
        vf.set_interval(host);
        (tree, id)
    }

    fn video(tree: &mut UiTree, id: ElementId) -> &mut VideoFrame {
        tree.kind_mut(id).and_then(|k| k.as_video_frame_mut()).unwrap()
    }

    fn tick(tree: &mut UiTree) {
        let mut target = Surface::new(8, 6);
        tree.update_all(&InputSnapshot::default(), &mut target);
    }

    #[test]
    fn test_interval_from_rates() {
        let (mut tree, id) = setup(30.0, 300, 60.0);
        assert_eq!(video(&mut tree, id).update_interval(), 2);
        video(&mut tree, id).set_interval(144.0);
        assert_eq!(video(&mut tree, id).update_interval(), 5);
        video(&mut tree, id).set_interval(24.0);
        assert_eq!(video(&mut tree, id).update_interval(), 1);
    }

    #[test]
    fn test_two_frames_in_four_ticks_at_half_rate() {
        let (mut tree, id) = setup(30.0, 300, 60.0);
        assert_eq!(video(&mut tree, id).decoded_frames(), 1);
        video(&mut tree, id).play();
        for _ in 0..4 {
            tick(&mut tree);
        }
        let vf = video(&mut tree, id);
        assert_eq!(vf.decoded_frames(), 3);
        assert!((vf.current_time() - 2.0 / 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_fractional_ratio_never_outruns_wall_clock() {
        for fps in [24.0, 25.0, 29.97] {
            let (mut tree, id) = setup(fps, 600, 60.0);
            video(&mut tree, id).play();
            // One wall-clock second of host ticks
            for _ in 0..60 {
                tick(&mut tree);
            }
            let vf = video(&mut tree, id);
            assert!(vf.current_time() <= 1.0 + 1e-9, "{} fps ran to {}", fps, vf.current_time());
            assert!(vf.current_time() >= 1.0 - 1.0 / fps - 1e-9, "{} fps fell to {}", fps, vf.current_time());
        }

        let (mut tree, id) = setup(24.0, 240, 60.0);
        assert_eq!(video(&mut tree, id).update_interval(), 3);
        video(&mut tree, id).play();
        for _ in 0..60 {
            tick(&mut tree);
        }
        assert_eq!(video(&mut tree, id).decoded_frames(), 1 + 24);
    }

    #[test]
    fn test_readout_tracks_position_in_same_tick() {
        let (mut tree, id) = setup(30.0, 300, 60.0);
        let text = tree.create(0, 0, 0, 0, Text::new(""));
        video(&mut tree, id).set_readout(Some(text));
        video(&mut tree, id).play();
        for _ in 0..4 {
            tick(&mut tree);
        }
        let shown = tree.kind(text).and_then(|k| k.as_text()).map(|t| t.text().to_string());
        assert_eq!(shown.as_deref(), Some("0.07 / 10.00"));
    }

    #[test]
    fn test_step_frames_and_last_frame() {
        let (mut tree, id) = setup(10.0, 20, 60.0);
        let vf = video(&mut tree, id);
        vf.play();
        vf.step_frames(3);
        assert!(!vf.is_playing());
        assert!((vf.current_time() - 0.3).abs() < 1e-9);
        vf.step_frames(-1);
        assert!((vf.current_time() - 0.2).abs() < 1e-9);
        vf.step_frames(-10);
        assert_eq!(vf.current_time(), 0.0);
        assert!((vf.last_frame_time() - 1.9).abs() < 1e-9);
    }

    #[test]
    fn test_time_label() {
        assert_eq!(time_label(1.0 / 3.0, 10.0), "0.33 / 10.00");
    }

    #[test]
    fn test_paused_frame_stays_on_screen() {
        let (mut tree, id) = setup(30.0, 300, 60.0);
        let mut target = Surface::new(8, 6);
        tree.update_all(&InputSnapshot::default(), &mut target);
        let expected = SyntheticSource::frame_color(0);
        let px = target.pixel(3, 3).unwrap();
        assert_eq!([px.r, px.g, px.b], expected.0);
        assert_eq!(video(&mut tree, id).frame().map(|f| f.dimensions()), Some((8, 6)));
    }

    #[test]
    fn test_plays_to_end_then_stops() {
        let (mut tree, id) = setup(10.0, 20, 10.0);
        video(&mut tree, id).jump_to(0.0);
        video(&mut tree, id).play();

        let mut last = 0.0;
        for _ in 0..40 {
            tick(&mut tree);
            let t = video(&mut tree, id).current_time();
            assert!(t >= last);
            last = t;
        }
        let vf = video(&mut tree, id);
        assert!(!vf.is_playing());
        assert!(vf.duration() - vf.current_time() <= 1.0 / vf.fps() + 1e-9);
        assert!(vf.current_time() <= vf.duration());
    }

    #[test]
    fn test_decode_error_stops_playback() {
        let mut tree = UiTree::with_glyphs(Box::new(BlockGlyphs));
        let id = tree.create(0, 0, 4, 4, VideoFrame::new());
        let vf = video(&mut tree, id);
        vf.load_video(Box::new(SyntheticSource::new(4, 4, 10.0, 50).failing_at(3)));
        vf.play();
        for _ in 0..5 {
            tick(&mut tree);
        }
        let vf = video(&mut tree, id);
        assert!(!vf.is_playing());
        assert!((vf.current_time() - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_jump_lands_on_frame_boundary() {
        let (mut tree, id) = setup(30.0, 300, 60.0);
        let vf = video(&mut tree, id);
        vf.jump_to(1.01);
        assert!((vf.current_time() - 31.0 / 30.0).abs() < 1e-9);
        vf.jump_to(500.0);
        assert!(vf.current_time() <= vf.duration());
        vf.jump_to(-4.0);
        assert_eq!(vf.current_time(), 0.0);
    }

    #[test]
    fn test_seek_without_media_is_noop() {
        let mut vf = VideoFrame::new();
        vf.jump_to(3.0);
        vf.play();
        assert_eq!(vf.current_time(), 0.0);
        assert!(!vf.is_playing());
    }

    #[test]
    fn test_audio_follows_transport() {
        let (mut tree, id) = setup(30.0, 300, 60.0);
        let rec = RecordingAudio::new();
        let vf = video(&mut tree, id);
        vf.load_audio(Box::new(rec.clone()));
        vf.play();
        vf.jump_to(2.0);
        vf.pause();
        vf.jump_to(1.0);
        vf.stop();

        assert_eq!(
            rec.calls(),
            vec![
                AudioCall::PlayFrom(0.0),
                AudioCall::Pause,
                AudioCall::Resume,
                AudioCall::PlayFrom(2.0),
                AudioCall::Pause,
                AudioCall::PlayFrom(1.0),
                AudioCall::Pause,
                AudioCall::PlayFrom(0.0),
                AudioCall::Pause,
            ]
        );
    }
}
