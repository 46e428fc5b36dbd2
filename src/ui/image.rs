//! Picture element: a decoded image scaled to the element bounds.
//!
//! The source is kept at full resolution and rescaled whenever the element
//! is resized. An element without a source stays transparent.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::RgbaImage;
use log::debug;

use crate::media::MediaError;

use super::surface::Surface;
use super::tree::UiTree;
use super::widget::{Base, ElementId, UpdateCx, Widget};

#[derive(Default)]
pub struct Image {
    source: Option<RgbaImage>,
    scaled: Option<Surface>,
}

impl Image {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_rgba(img: RgbaImage) -> Self {
        Self {
            source: Some(img),
            scaled: None,
        }
    }

    /// Decode a picture from disk (any format the `image` crate reads).
    pub fn open(path: &Path) -> Result<Self, MediaError> {
        let img = image::open(path).map_err(|e| MediaError::Open {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        debug!("Image loaded: {} ({}x{})", path.display(), img.width(), img.height());
        Ok(Self::from_rgba(img.to_rgba8()))
    }

    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    /// Replace or drop the source and rescale to the current bounds.
    pub fn set_source(&mut self, img: Option<RgbaImage>, base: &Base) {
        self.source = img;
        self.rescale(base);
    }

    fn rescale(&mut self, base: &Base) {
        self.scaled = match &self.source {
            Some(src) if base.width() > 0 && base.height() > 0 => {
                let (w, h) = (base.width() as u32, base.height() as u32);
                let resized = if src.dimensions() == (w, h) {
                    src.clone()
                } else {
                    imageops::resize(src, w, h, FilterType::Triangle)
                };
                Some(Surface::from_rgba_image(&resized))
            }
            _ => None,
        };
    }
}

impl Widget for Image {
    fn kind_name(&self) -> &'static str {
        "Image"
    }

    fn on_update(&mut self, base: &mut Base, _cx: &mut UpdateCx<'_>) {
        if let Some(scaled) = &self.scaled {
            base.surface.blit(scaled, 0, 0);
        }
    }

    fn on_resized(&mut self, base: &mut Base) {
        self.rescale(base);
    }
}

impl UiTree {
    /// Swap the picture shown by an [`Image`] element.
    pub fn set_image(&mut self, id: ElementId, img: Option<RgbaImage>) {
        let Some(el) = self.element_mut(id) else {
            log::warn!("set_image: unknown element {}", id);
            return;
        };
        match el.kind.as_image_mut() {
            Some(image) => image.set_source(img, &el.base),
            None => log::warn!("set_image: {} is not an image", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::color::Rgba;
    use crate::ui::glyphs::BlockGlyphs;
    use crate::ui::input::InputSnapshot;

    #[test]
    fn test_image_scaled_to_bounds_and_rescaled() {
        let mut tree = UiTree::with_glyphs(Box::new(BlockGlyphs));
        let src = RgbaImage::from_pixel(2, 2, image::Rgba([9, 8, 7, 255]));
        let id = tree.create(0, 0, 6, 4, Image::from_rgba(src));

        let mut target = Surface::new(10, 10);
        tree.update_all(&InputSnapshot::default(), &mut target);
        assert_eq!(target.pixel(5, 3), Some(Rgba::rgb(9, 8, 7)));
        assert_eq!(target.pixel(6, 3), Some(Rgba::TRANSPARENT));

        tree.resize(id, 8, 8);
        let mut target = Surface::new(10, 10);
        tree.update_all(&InputSnapshot::default(), &mut target);
        assert_eq!(target.pixel(7, 7), Some(Rgba::rgb(9, 8, 7)));

        tree.set_image(id, None);
        let mut target = Surface::new(10, 10);
        tree.update_all(&InputSnapshot::default(), &mut target);
        assert_eq!(target.pixel(1, 1), Some(Rgba::TRANSPARENT));
    }

    #[test]
    fn test_empty_image_is_transparent() {
        let mut tree = UiTree::with_glyphs(Box::new(BlockGlyphs));
        tree.create(0, 0, 4, 4, Image::empty());
        let mut target = Surface::filled(4, 4, Rgba::BLACK);
        tree.update_all(&InputSnapshot::default(), &mut target);
        assert_eq!(target.pixel(2, 2), Some(Rgba::BLACK));
    }

    #[test]
    fn test_open_missing_file_errors() {
        assert!(Image::open(Path::new("/nonexistent/pic.png")).is_err());
    }
}
