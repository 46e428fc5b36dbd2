//! eframe host: feeds window input to the [`Player`] at the fixed tick rate
//! and presents its display surface as a texture.
//!
//! The window repaints on its own schedule; keys and wheel movement are
//! accumulated between ticks so nothing is lost when a repaint does not
//! advance the tree. The surface is scaled to fit the window, and pointer
//! positions are mapped back into surface pixels.

use std::path::{Path, PathBuf};
use std::time::Instant;

use eframe::egui;
use log::{error, info};

use crate::core::clock::FrameClock;
use crate::player::Player;
use crate::ui::input::{InputSnapshot, Key};

/// Wheel distance (points) that counts as one notch
const POINTS_PER_NOTCH: f32 = 50.0;

const VIDEO_EXTS: &[&str] = &[
    "mp4", "mov", "mkv", "avi", "webm", "m4v", "png", "jpg", "jpeg", "tif", "tiff", "exr",
];

pub struct ReviewApp {
    player: Player,
    clock: FrameClock,
    texture: Option<egui::TextureHandle>,
    /// Keys and wheel collected since the last tick
    pending: InputSnapshot,
    audio: Option<PathBuf>,
}

impl ReviewApp {
    pub fn new(player: Player, audio: Option<PathBuf>) -> Self {
        let clock = FrameClock::new(player.settings().refresh_rate);
        Self {
            player,
            clock,
            texture: None,
            pending: InputSnapshot::default(),
            audio,
        }
    }

    fn load(&mut self, path: &Path) {
        // A picked file replaces the video; the CLI audio track only pairs
        // with the video it was given for
        let audio = self.audio.take();
        match self.player.load(path, audio.as_deref()) {
            Ok(()) => info!("Opened {}", path.display()),
            Err(e) => {
                error!("{:#}", e);
                self.player.set_error(format!("{:#}", e));
            }
        }
    }

    fn open_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Video", VIDEO_EXTS)
            .set_title("Open video")
            .pick_file()
        {
            self.load(&path);
        }
    }

    /// Accumulate this repaint's discrete input.
    fn collect(&mut self, ctx: &egui::Context) -> Vec<PathBuf> {
        ctx.input(|i| {
            for event in &i.events {
                if let egui::Event::Key {
                    key,
                    pressed: true,
                    repeat: false,
                    ..
                } = event
                {
                    if let Some(k) = map_key(*key) {
                        self.pending.keys.push(k);
                    }
                }
            }
            // egui reports wheel-up as positive y
            self.pending.wheel += -i.raw_scroll_delta.y / POINTS_PER_NOTCH;
            i.raw.dropped_files.iter().filter_map(|f| f.path.clone()).collect()
        })
    }

    /// Snapshot for one tick, pointer mapped from `draw` into surface pixels.
    fn take_snapshot(&mut self, ctx: &egui::Context, draw: egui::Rect, scale: f32) -> InputSnapshot {
        let (pos, down) = ctx.input(|i| (i.pointer.latest_pos(), i.pointer.primary_down()));
        let mut snapshot = std::mem::take(&mut self.pending);
        snapshot.primary_down = down;
        snapshot.pointer = pos.filter(|p| draw.contains(*p) && scale > 0.0).map(|p| {
            (
                ((p.x - draw.min.x) / scale).floor() as i32,
                ((p.y - draw.min.y) / scale).floor() as i32,
            )
        });
        snapshot
    }

    fn upload(&mut self, ctx: &egui::Context) {
        let surface = self.player.target();
        let image = egui::ColorImage::from_rgba_unmultiplied([surface.width(), surface.height()], surface.as_raw());
        match &mut self.texture {
            Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
            None => {
                self.texture = Some(ctx.load_texture("scene-review-frame", image, egui::TextureOptions::LINEAR));
            }
        }
    }
}

impl eframe::App for ReviewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let dropped = self.collect(ctx);
        if let Some(path) = dropped.first() {
            info!("File dropped: {}", path.display());
            self.load(path);
        }

        egui::CentralPanel::default().frame(egui::Frame::NONE).show(ctx, |ui| {
            let avail = ui.max_rect();
            let (sw, sh) = (self.player.target().width() as f32, self.player.target().height() as f32);
            let scale = if sw > 0.0 && sh > 0.0 {
                (avail.width() / sw).min(avail.height() / sh)
            } else {
                0.0
            };
            let draw = egui::Rect::from_center_size(avail.center(), egui::vec2(sw * scale, sh * scale));

            if self.clock.tick_due(Instant::now()) {
                let snapshot = self.take_snapshot(ctx, draw, scale);
                self.player.tick(&snapshot);
                self.upload(ctx);
            }

            if let Some(texture) = &self.texture {
                let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
                ui.painter().image(texture.id(), draw, uv, egui::Color32::WHITE);
            }
        });

        if self.player.take_open_request() {
            self.open_dialog();
        }
        if self.player.should_quit() {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
        ctx.request_repaint_after(self.clock.until_next(Instant::now()));
    }
}

/// Window key to player key; keys the player never reads map to `None`.
pub fn map_key(key: egui::Key) -> Option<Key> {
    use egui::Key as E;
    Some(match key {
        E::Space => Key::Space,
        E::Escape => Key::Escape,
        E::ArrowLeft => Key::ArrowLeft,
        E::ArrowRight => Key::ArrowRight,
        E::Home => Key::Home,
        E::End => Key::End,
        E::Num0 => Key::Digit(0),
        E::Num1 => Key::Digit(1),
        E::Num2 => Key::Digit(2),
        E::Num3 => Key::Digit(3),
        E::Num4 => Key::Digit(4),
        E::Num5 => Key::Digit(5),
        E::Num6 => Key::Digit(6),
        E::Num7 => Key::Digit(7),
        E::Num8 => Key::Digit(8),
        E::Num9 => Key::Digit(9),
        other => {
            let mut chars = other.name().chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii_alphabetic() => Key::Letter(c.to_ascii_lowercase()),
                _ => return None,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_key() {
        assert_eq!(map_key(egui::Key::Space), Some(Key::Space));
        assert_eq!(map_key(egui::Key::Num7), Some(Key::Digit(7)));
        assert_eq!(map_key(egui::Key::S), Some(Key::Letter('s')));
        assert_eq!(map_key(egui::Key::O), Some(Key::Letter('o')));
        assert_eq!(map_key(egui::Key::Home), Some(Key::Home));
        assert_eq!(map_key(egui::Key::ArrowLeft), Some(Key::ArrowLeft));
        assert_eq!(map_key(egui::Key::F1), None);
        assert_eq!(map_key(egui::Key::Enter), None);
    }
}
