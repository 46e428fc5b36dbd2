//! Review session orchestrator.
//!
//! Owns the element tree and the display surface and wires them to media
//! loading, the boundary detector and keyboard input:
//!
//! ```text
//! +-------------------------------+  +--------------+
//! | video frame                   |  | index        |
//! |                               |  | (scroll view)|
//! +-------------------------------+  |              |
//! [Play] [Pause] [Stop]  12.00 / 60.00|              |
//! status                             +--------------+
//! ```
//!
//! Per tick: keys → traversal → drain control events. Every seek, transport
//! command and index rebuild happens outside the traversal. The time readout
//! is refreshed by the video element inside the traversal, so it always
//! matches the frame composited in the same tick.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, error, info, warn};

use crate::config::Settings;
use crate::core::event_bus::{Event, downcast_event};
use crate::detect::{BoundaryDetector, NavIndex};
use crate::media::{self, AudioSink, VideoSource};
use crate::ui::button::Button;
use crate::ui::color::Rgba;
use crate::ui::events::{OpenRequested, PlaybackCommand, QuitRequested, SeekRequested};
use crate::ui::geometry::Rect;
use crate::ui::glyphs::GlyphRenderer;
use crate::ui::input::{InputSnapshot, Key};
use crate::ui::panel::Panel;
use crate::ui::surface::Surface;
use crate::ui::text::Text;
use crate::ui::tree::UiTree;
use crate::ui::video_frame::{VideoFrame, fit_size, time_label};
use crate::ui::widget::{ElementId, ElementKind};

const MARGIN: i32 = 10;
const INDEX_WIDTH: i32 = 300;
const BUTTON_WIDTH: i32 = 80;
const CONTROLS_HEIGHT: i32 = 36;
const STATUS_HEIGHT: i32 = 20;
const TEXT_SIZE: f32 = 18.0;
const STATUS_SIZE: f32 = 14.0;
const STATUS_COLOR: Rgba = Rgba::WHITE;
const ERROR_COLOR: Rgba = Rgba::rgb(0xff, 0x6b, 0x6b);

/// Element rects derived from the window size.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Layout {
    video: Rect,
    controls_y: i32,
    index: Rect,
    status_y: i32,
}

impl Layout {
    fn new(width: i32, height: i32) -> Self {
        let index_w = INDEX_WIDTH.min(width / 3).max(1);
        let video_w = (width - index_w - 3 * MARGIN).max(1);
        let video_h = (height - CONTROLS_HEIGHT - STATUS_HEIGHT - 4 * MARGIN).max(1);
        let index_h = (height - STATUS_HEIGHT - 3 * MARGIN).max(1);
        Self {
            video: Rect::new(MARGIN, MARGIN, video_w, video_h),
            controls_y: 2 * MARGIN + video_h,
            index: Rect::new(width - index_w - MARGIN, MARGIN, index_w, index_h),
            status_y: height - MARGIN - STATUS_HEIGHT,
        }
    }
}

pub struct Player {
    tree: UiTree,
    target: Surface,
    settings: Settings,
    detector: Option<Box<dyn BoundaryDetector>>,
    layout: Layout,
    video: ElementId,
    time_text: ElementId,
    status_text: ElementId,
    index_view: ElementId,
    index: Option<NavIndex>,
    media_path: Option<PathBuf>,
    quit_requested: bool,
    open_requested: bool,
}

impl Player {
    /// Build the window tree. Without a detector the index always holds a
    /// single entry spanning the video.
    pub fn new(settings: Settings, glyphs: Box<dyn GlyphRenderer>, detector: Option<Box<dyn BoundaryDetector>>) -> Self {
        let (w, h) = (settings.window_width as i32, settings.window_height as i32);
        let layout = Layout::new(w, h);
        let mut tree = UiTree::with_glyphs(glyphs);

        let root = tree.create(0, 0, w, h, Panel);
        tree.set_background(root, Some(settings.background));

        let v = layout.video;
        let video = tree.create_child(root, v.x, v.y, v.w, v.h, VideoFrame::new());
        tree.set_background(video, Some(Rgba::BLACK));

        let transport = [
            ("Play", PlaybackCommand::Play),
            ("Pause", PlaybackCommand::Pause),
            ("Stop", PlaybackCommand::Stop),
        ];
        for (i, (label, command)) in transport.into_iter().enumerate() {
            let x = MARGIN + i as i32 * (BUTTON_WIDTH + MARGIN);
            tree.create_child(
                root,
                x,
                layout.controls_y,
                BUTTON_WIDTH,
                CONTROLS_HEIGHT,
                Button::new(label).emitting(command),
            );
        }

        let time_x = MARGIN + 3 * (BUTTON_WIDTH + MARGIN);
        let time_text = tree.create_child(
            root,
            time_x,
            layout.controls_y + (CONTROLS_HEIGHT - TEXT_SIZE as i32) / 2,
            0,
            0,
            Text::new(time_label(0.0, 0.0)).with_font_size(TEXT_SIZE),
        );
        if let Some(vf) = tree.kind_mut(video).and_then(ElementKind::as_video_frame_mut) {
            vf.set_readout(Some(time_text));
        }
        let status_text = tree.create_child(
            root,
            MARGIN,
            layout.status_y,
            0,
            0,
            Text::new("Open a video with O").with_font_size(STATUS_SIZE),
        );

        let ix = layout.index;
        let index_view = tree.create_scroll_view(ix.x, ix.y, ix.w, ix.h, settings.scroll_speed);
        tree.set_parent(index_view, Some(root));

        let target = Surface::filled(w.max(0) as usize, h.max(0) as usize, settings.background);
        info!("Player: {}x{} window, {} elements", w, h, tree.len());

        Self {
            tree,
            target,
            settings,
            detector,
            layout,
            video,
            time_text,
            status_text,
            index_view,
            index: None,
            media_path: None,
            quit_requested: false,
            open_requested: false,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn tree(&self) -> &UiTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut UiTree {
        &mut self.tree
    }

    /// Last composited frame.
    pub fn target(&self) -> &Surface {
        &self.target
    }

    pub fn video_id(&self) -> ElementId {
        self.video
    }

    pub fn index_view(&self) -> ElementId {
        self.index_view
    }

    pub fn video_frame(&self) -> Option<&VideoFrame> {
        self.tree.kind(self.video).and_then(ElementKind::as_video_frame)
    }

    fn with_video<R>(&mut self, f: impl FnOnce(&mut VideoFrame) -> R) -> Option<R> {
        self.tree
            .kind_mut(self.video)
            .and_then(ElementKind::as_video_frame_mut)
            .map(f)
    }

    pub fn index(&self) -> Option<&NavIndex> {
        self.index.as_ref()
    }

    pub fn media_path(&self) -> Option<&Path> {
        self.media_path.as_deref()
    }

    pub fn status(&self) -> &str {
        self.tree
            .kind(self.status_text)
            .and_then(ElementKind::as_text)
            .map_or("", |t| t.text())
    }

    /// Text of the `current / duration` readout.
    pub fn time_readout(&self) -> &str {
        self.tree
            .kind(self.time_text)
            .and_then(ElementKind::as_text)
            .map_or("", |t| t.text())
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.show_status(message.into(), STATUS_COLOR);
    }

    /// Status line in the error color.
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.show_status(message.into(), ERROR_COLOR);
    }

    fn show_status(&mut self, message: String, color: Rgba) {
        if let Some(text) = self.tree.kind_mut(self.status_text).and_then(ElementKind::as_text_mut) {
            text.set_text(message);
            text.set_color(color);
        }
    }

    /// Color the status line is drawn in.
    pub fn status_color(&self) -> Option<Rgba> {
        self.tree
            .kind(self.status_text)
            .and_then(ElementKind::as_text)
            .map(|t| t.color())
    }

    pub fn should_quit(&self) -> bool {
        self.quit_requested
    }

    /// True once per open request (key `O`); the host shows the picker.
    pub fn take_open_request(&mut self) -> bool {
        std::mem::take(&mut self.open_requested)
    }

    /// Open `video` (and `audio`) from disk and rebuild the index. On error
    /// the previous media stays loaded.
    pub fn load(&mut self, video: &Path, audio: Option<&Path>) -> Result<()> {
        let source = media::open_video(video, self.settings.sequence_fps)
            .with_context(|| format!("Failed to open video {}", video.display()))?;
        let sink = match audio {
            Some(path) => Some(
                media::audio::open_audio(path)
                    .with_context(|| format!("Failed to open audio {}", path.display()))?,
            ),
            None => None,
        };
        self.load_source(video, source, sink);
        Ok(())
    }

    /// Install an already opened source. `path` is what the detector reads.
    pub fn load_source(&mut self, path: &Path, source: Box<dyn VideoSource>, audio: Option<Box<dyn AudioSink>>) {
        let info = *source.info();
        let area = self.layout.video;
        let (w, h) = fit_size(&info, area.w, area.h);
        let (x, y) = (area.x + (area.w - w) / 2, area.y + (area.h - h) / 2);
        self.tree.set_position(self.video, x, y);
        self.tree.resize(self.video, w, h);

        let refresh = self.settings.refresh_rate;
        self.with_video(move |vf| {
            vf.set_audio(None);
            vf.load_video(source);
            vf.set_interval(refresh);
            if let Some(sink) = audio {
                vf.load_audio(sink);
            }
        });
        self.media_path = Some(path.to_path_buf());
        info!("Loaded {} ({}x{} shown at {}x{})", path.display(), info.width, info.height, w, h);

        self.rebuild_index();
    }

    /// Run the detector over the loaded video and repopulate the index view.
    pub fn rebuild_index(&mut self) {
        let Some(path) = self.media_path.clone() else {
            warn!("rebuild_index: no media loaded");
            return;
        };
        let duration = self.video_frame().map_or(0.0, VideoFrame::duration);

        let settings = self.settings.index_settings();
        let built = self
            .detector
            .as_ref()
            .map(|d| NavIndex::build(d.as_ref(), &path, duration, &settings));

        let index = match built {
            None => {
                self.set_status(format!("{} (index disabled)", file_label(&path)));
                NavIndex::fallback(duration)
            }
            Some(Ok(index)) => {
                let mut status = format!("{}: {} scenes", file_label(&path), index.scenes.len());
                if !index.warnings.is_empty() {
                    status.push_str(&format!(", {} detector warnings", index.warnings.len()));
                }
                self.set_status(status);
                index
            }
            Some(Err(e)) => {
                error!("Scene detection failed for {}: {}", path.display(), e);
                self.set_error(format!("Detection failed: {}", e));
                NavIndex::fallback(duration)
            }
        };

        let rows = index.populate(&mut self.tree, self.index_view, &self.settings.index_layout());
        debug!("Index populated with {} rows", rows.len());
        self.index = Some(index);
    }

    pub fn play(&mut self) {
        self.with_video(VideoFrame::play);
    }

    pub fn pause(&mut self) {
        self.with_video(VideoFrame::pause);
    }

    pub fn toggle(&mut self) {
        self.with_video(VideoFrame::toggle);
    }

    pub fn stop(&mut self) {
        self.with_video(VideoFrame::stop);
    }

    pub fn jump_to(&mut self, seconds: f64) {
        self.with_video(|vf| vf.jump_to(seconds));
    }

    /// Discrete keys, handled before the traversal.
    fn handle_keys(&mut self, keys: &[Key]) {
        for key in keys {
            match key {
                Key::Space => self.toggle(),
                Key::Escape => self.tree.events().emit(QuitRequested),
                Key::Digit(n) => {
                    let duration = self.video_frame().map_or(0.0, VideoFrame::duration);
                    let target = f64::from(*n) * duration / 10.0;
                    self.with_video(|vf| {
                        vf.pause();
                        vf.jump_to(target);
                    });
                }
                Key::ArrowLeft => {
                    self.with_video(|vf| vf.step_frames(-1));
                }
                Key::ArrowRight => {
                    self.with_video(|vf| vf.step_frames(1));
                }
                Key::Home => {
                    self.with_video(|vf| {
                        vf.pause();
                        vf.jump_to(0.0);
                    });
                }
                Key::End => {
                    self.with_video(|vf| {
                        let last = vf.last_frame_time();
                        vf.pause();
                        vf.jump_to(last);
                    });
                }
                Key::Letter('s') => self.stop(),
                Key::Letter('o') => self.tree.events().emit(OpenRequested),
                _ => {}
            }
        }
    }

    /// Apply everything controls emitted during the last traversal.
    fn drain_events(&mut self) {
        for event in self.tree.events().poll() {
            if let Some(seek) = downcast_event::<SeekRequested>(&event) {
                self.jump_to(seek.seconds);
            } else if let Some(command) = downcast_event::<PlaybackCommand>(&event) {
                match command {
                    PlaybackCommand::Play => self.play(),
                    PlaybackCommand::Pause => self.pause(),
                    PlaybackCommand::Toggle => self.toggle(),
                    PlaybackCommand::Stop => self.stop(),
                }
            } else if downcast_event::<OpenRequested>(&event).is_some() {
                self.open_requested = true;
            } else if downcast_event::<QuitRequested>(&event).is_some() {
                info!("Quit requested");
                self.quit_requested = true;
            } else {
                debug!("Unhandled event {}", (*event).type_name());
            }
        }
    }

    /// One host tick. Returns the composited display surface.
    pub fn tick(&mut self, input: &InputSnapshot) -> &Surface {
        self.handle_keys(&input.keys);
        self.tree.update_all(input, &mut self.target);
        self.drain_events();
        &self.target
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
