//! Single-line text label that sizes itself to its rendered glyphs.

use super::color::Rgba;
use super::surface::Surface;
use super::widget::{Base, UpdateCx, Widget};

pub struct Text {
    text: String,
    color: Rgba,
    font_size: f32,
    rendered: Option<Surface>,
}

impl Text {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: Rgba::WHITE,
            font_size: 18.0,
            rendered: None,
        }
    }

    pub fn with_font_size(mut self, size: f32) -> Self {
        self.font_size = size;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn color(&self) -> Rgba {
        self.color
    }

    /// Replace the text; re-rendered on the next tick only if it changed.
    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text != self.text {
            self.text = text;
            self.rendered = None;
        }
    }

    pub fn set_color(&mut self, color: Rgba) {
        if color != self.color {
            self.color = color;
            self.rendered = None;
        }
    }
}

impl Widget for Text {
    fn kind_name(&self) -> &'static str {
        "Text"
    }

    fn on_update(&mut self, base: &mut Base, cx: &mut UpdateCx<'_>) {
        if self.rendered.is_none() {
            let surface = cx.glyphs.render(&self.text, self.font_size, self.color);
            let (w, h) = (surface.width() as i32, surface.height() as i32);
            if (w, h) != (base.width(), base.height()) {
                base.resize(w, h);
            }
            self.rendered = Some(surface);
        }
        if let Some(rendered) = &self.rendered {
            base.surface.blit(rendered, 0, 0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::glyphs::BlockGlyphs;
    use crate::ui::input::InputSnapshot;
    use crate::ui::tree::UiTree;

    #[test]
    fn test_text_resizes_to_rendered_glyphs() {
        let mut tree = UiTree::with_glyphs(Box::new(BlockGlyphs));
        let id = tree.create(0, 0, 0, 0, Text::new("abcd").with_font_size(10.0));
        let mut target = Surface::new(64, 64);
        tree.update_all(&InputSnapshot::default(), &mut target);

        let base = tree.base(id).unwrap();
        assert_eq!((base.width(), base.height()), (24, 10));
        assert_eq!(target.pixel(1, 1), Some(Rgba::WHITE));

        tree.kind_mut(id).and_then(|k| k.as_text_mut()).unwrap().set_text("a");
        tree.update_all(&InputSnapshot::default(), &mut target);
        assert_eq!(tree.base(id).unwrap().width(), 6);
    }

    #[test]
    fn test_set_same_text_keeps_render() {
        let mut text = Text::new("x");
        text.rendered = Some(Surface::new(1, 1));
        text.set_text("x");
        assert!(text.rendered.is_some());
        text.set_color(Rgba::BLACK);
        assert!(text.rendered.is_none());
    }
}
