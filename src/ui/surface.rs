//! Off-screen RGBA8 pixel buffer with clipped compositing.
//!
//! Every element owns one `Surface` sized to its bounds. The traversal
//! composites child surfaces into parent surfaces with [`Surface::blit`],
//! which clips to the destination extent and alpha-blends (source-over,
//! straight alpha).

use image::{RgbImage, RgbaImage};

use super::color::Rgba;
use super::geometry::Rect;

/// RGBA8 pixel buffer, row-major, 4 bytes per pixel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Surface {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Surface {
    /// Fully transparent surface.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0u8; width * height * 4],
        }
    }

    pub fn filled(width: usize, height: usize, color: Rgba) -> Self {
        let mut surface = Self::new(width, height);
        surface.fill(color);
        surface
    }

    pub fn from_rgba_image(img: &RgbaImage) -> Self {
        Self {
            width: img.width() as usize,
            height: img.height() as usize,
            pixels: img.as_raw().clone(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width as i32, self.height as i32)
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y * self.width + x) * 4;
        let p = &self.pixels[i..i + 4];
        Some(Rgba::new(p[0], p[1], p[2], p[3]))
    }

    pub fn fill(&mut self, color: Rgba) {
        let rgba = color.to_array();
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
    }

    /// Fill `rect` (local coordinates) clipped to the surface.
    pub fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        let area = rect.intersect(&self.bounds());
        if area.is_empty() {
            return;
        }
        let rgba = color.to_array();
        for y in area.y..area.bottom() {
            let row = y as usize * self.width;
            for x in area.x..area.right() {
                let i = (row + x as usize) * 4;
                self.pixels[i..i + 4].copy_from_slice(&rgba);
            }
        }
    }

    /// Source-over blend of a solid color into `rect`, clipped.
    pub fn blend_rect(&mut self, rect: Rect, color: Rgba) {
        let area = rect.intersect(&self.bounds());
        if area.is_empty() || color.a == 0 {
            return;
        }
        let rgba = color.to_array();
        for y in area.y..area.bottom() {
            let row = y as usize * self.width;
            for x in area.x..area.right() {
                let i = (row + x as usize) * 4;
                blend_row(&mut self.pixels[i..i + 4], &rgba);
            }
        }
    }

    /// Composite `src` with its top-left corner at `(x, y)`, clipped to
    /// this surface.
    pub fn blit(&mut self, src: &Surface, x: i32, y: i32) {
        let dst_area = Rect::new(x, y, src.width as i32, src.height as i32).intersect(&self.bounds());
        if dst_area.is_empty() {
            return;
        }
        let run = dst_area.w as usize * 4;
        for dy in dst_area.y..dst_area.bottom() {
            let sy = (dy - y) as usize;
            let sx = (dst_area.x - x) as usize;
            let s_off = (sy * src.width + sx) * 4;
            let d_off = (dy as usize * self.width + dst_area.x as usize) * 4;
            blend_row(
                &mut self.pixels[d_off..d_off + run],
                &src.pixels[s_off..s_off + run],
            );
        }
    }

    /// Copy an opaque RGB image with its top-left corner at `(x, y)`.
    pub fn blit_rgb(&mut self, img: &RgbImage, x: i32, y: i32) {
        let (iw, ih) = (img.width() as i32, img.height() as i32);
        let dst_area = Rect::new(x, y, iw, ih).intersect(&self.bounds());
        if dst_area.is_empty() {
            return;
        }
        let raw = img.as_raw();
        for dy in dst_area.y..dst_area.bottom() {
            let sy = (dy - y) as usize;
            for dx in dst_area.x..dst_area.right() {
                let sx = (dx - x) as usize;
                let s = (sy * iw as usize + sx) * 3;
                let d = (dy as usize * self.width + dx as usize) * 4;
                self.pixels[d..d + 3].copy_from_slice(&raw[s..s + 3]);
                self.pixels[d + 3] = 255;
            }
        }
    }
}

/// Source-over blend of one row of RGBA8 pixels.
fn blend_row(dst: &mut [u8], src: &[u8]) {
    debug_assert_eq!(dst.len(), src.len());
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let sa = s[3] as u32;
        match sa {
            0 => {}
            255 => d.copy_from_slice(s),
            _ => {
                let inv = 255 - sa;
                for c in 0..3 {
                    d[c] = ((s[c] as u32 * sa + d[c] as u32 * inv + 127) / 255) as u8;
                }
                d[3] = (sa + (d[3] as u32 * inv + 127) / 255).min(255) as u8;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba = Rgba::rgb(255, 0, 0);
    const BLUE: Rgba = Rgba::rgb(0, 0, 255);

    #[test]
    fn test_blit_clips_to_destination() {
        let mut dst = Surface::filled(4, 4, BLUE);
        let src = Surface::filled(3, 3, RED);
        dst.blit(&src, 2, -1);

        assert_eq!(dst.pixel(2, 0), Some(RED));
        assert_eq!(dst.pixel(3, 1), Some(RED));
        assert_eq!(dst.pixel(2, 2), Some(BLUE));
        assert_eq!(dst.pixel(1, 0), Some(BLUE));
    }

    #[test]
    fn test_blit_fully_outside_is_noop() {
        let mut dst = Surface::filled(4, 4, BLUE);
        let before = dst.clone();
        dst.blit(&Surface::filled(2, 2, RED), 10, 10);
        dst.blit(&Surface::filled(2, 2, RED), -2, 0);
        assert_eq!(dst, before);
    }

    #[test]
    fn test_transparent_source_keeps_destination() {
        let mut dst = Surface::filled(2, 2, BLUE);
        dst.blit(&Surface::new(2, 2), 0, 0);
        assert_eq!(dst.pixel(0, 0), Some(BLUE));
    }

    #[test]
    fn test_half_alpha_blend() {
        let mut dst = Surface::filled(1, 1, Rgba::BLACK);
        dst.blit(&Surface::filled(1, 1, Rgba::new(255, 255, 255, 128)), 0, 0);
        let p = dst.pixel(0, 0).unwrap();
        assert_eq!(p.r, 128);
        assert_eq!(p.a, 255);
    }

    #[test]
    fn test_blit_rgb_and_fill_rect() {
        let mut dst = Surface::new(3, 2);
        let img = RgbImage::from_pixel(2, 2, image::Rgb([1, 2, 3]));
        dst.blit_rgb(&img, 1, 1);
        assert_eq!(dst.pixel(1, 1), Some(Rgba::rgb(1, 2, 3)));
        assert_eq!(dst.pixel(0, 0), Some(Rgba::TRANSPARENT));

        dst.fill_rect(Rect::new(-1, 0, 2, 1), RED);
        assert_eq!(dst.pixel(0, 0), Some(RED));
        assert_eq!(dst.pixel(1, 0), Some(Rgba::TRANSPARENT));
    }
}
