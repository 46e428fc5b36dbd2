//! Text-to-pixels service used by buttons and text elements.
//!
//! [`CosmicTextRenderer`] shapes and rasterizes through cosmic-text with a
//! process-wide font system. [`BlockGlyphs`] draws one solid box per
//! character; it needs no fonts and gives deterministic sizes for headless
//! runs.

use std::sync::Mutex;

use cosmic_text::{Attrs, Buffer, Color, Family, FontSystem, Metrics, Shaping, SwashCache};

use super::color::Rgba;
use super::geometry::Rect;
use super::surface::Surface;

lazy_static::lazy_static! {
    static ref FONT_SYSTEM: Mutex<FontSystem> = Mutex::new(FontSystem::new());
    static ref SWASH_CACHE: Mutex<SwashCache> = Mutex::new(SwashCache::new());
}

/// Renders a single line of text into a tightly sized transparent surface.
pub trait GlyphRenderer {
    fn render(&self, text: &str, size: f32, color: Rgba) -> Surface;
}

/// cosmic-text backed renderer (system fonts, sans-serif).
#[derive(Debug, Clone, Copy, Default)]
pub struct CosmicTextRenderer;

impl GlyphRenderer for CosmicTextRenderer {
    fn render(&self, text: &str, size: f32, color: Rgba) -> Surface {
        if text.is_empty() || size <= 0.0 {
            return Surface::new(0, 0);
        }
        let mut font_system = FONT_SYSTEM.lock().unwrap_or_else(|e| e.into_inner());
        let mut swash_cache = SWASH_CACHE.lock().unwrap_or_else(|e| e.into_inner());

        let line_height = (size * 1.2).ceil();
        let mut buffer = Buffer::new(&mut font_system, Metrics::new(size, line_height));
        // Single line: wide layout box, trimmed after shaping
        buffer.set_size(&mut font_system, Some(8192.0), None);
        let attrs = Attrs::new().family(Family::SansSerif);
        buffer.set_text(&mut font_system, text, &attrs, Shaping::Advanced, None);
        buffer.shape_until_scroll(&mut font_system, false);

        let mut max_x = 0.0f32;
        let mut max_y = 0.0f32;
        for run in buffer.layout_runs() {
            for glyph in run.glyphs.iter() {
                max_x = max_x.max(glyph.x + glyph.w);
            }
            max_y = max_y.max(run.line_y + line_height - size);
        }
        let width = max_x.ceil().max(1.0) as usize;
        let height = max_y.ceil().max(line_height) as usize;

        let mut surface = Surface::new(width, height);
        let text_color = Color::rgba(color.r, color.g, color.b, color.a);
        buffer.draw(&mut font_system, &mut swash_cache, text_color, |x, y, w, h, c| {
            surface.blend_rect(
                Rect::new(x, y, w as i32, h as i32),
                Rgba::new(c.r(), c.g(), c.b(), c.a()),
            );
        });
        surface
    }
}

/// Font-free renderer: each non-space character is a solid box.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockGlyphs;

impl BlockGlyphs {
    /// Advance per character in pixels for a given font size.
    pub fn advance(size: f32) -> usize {
        ((size * 0.6).round() as usize).max(1)
    }
}

impl GlyphRenderer for BlockGlyphs {
    fn render(&self, text: &str, size: f32, color: Rgba) -> Surface {
        let advance = Self::advance(size);
        let height = (size.round() as usize).max(1);
        let count = text.chars().count();
        let mut surface = Surface::new(advance * count, height);
        for (i, ch) in text.chars().enumerate() {
            if ch.is_whitespace() {
                continue;
            }
            let x = (i * advance) as i32;
            surface.fill_rect(Rect::new(x + 1, 1, advance as i32 - 2, height as i32 - 2), color);
        }
        surface
    }
}
