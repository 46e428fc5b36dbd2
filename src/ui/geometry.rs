//! Integer pixel rectangles used for layout, clipping and hit-testing.

/// Axis-aligned rectangle in pixels. `w`/`h` are never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self {
            x,
            y,
            w: w.max(0),
            h: h.max(0),
        }
    }

    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// Same rect moved by `(dx, dy)`.
    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.w, self.h)
    }

    /// Half-open containment: right and bottom edges are outside.
    pub fn contains(&self, px: i32, py: i32) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }

    /// Overlap of two rects. Disjoint rects yield an empty rect anchored at
    /// the clamped corner, so the result always lies inside `self`.
    pub fn intersect(&self, other: &Rect) -> Rect {
        let x0 = self.x.max(other.x).min(self.right());
        let y0 = self.y.max(other.y).min(self.bottom());
        let x1 = self.right().min(other.right()).max(x0);
        let y1 = self.bottom().min(other.bottom()).max(y0);
        Rect::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// True when every pixel of `self` lies inside `other` (empty rects
    /// are contained anywhere within `other`'s closed bounds).
    pub fn is_within(&self, other: &Rect) -> bool {
        self.x >= other.x
            && self.y >= other.y
            && self.right() <= other.right()
            && self.bottom() <= other.bottom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_half_open() {
        let r = Rect::new(10, 10, 20, 5);
        assert!(r.contains(10, 10));
        assert!(r.contains(29, 14));
        assert!(!r.contains(30, 10));
        assert!(!r.contains(10, 15));
    }

    #[test]
    fn test_intersect_overlap() {
        let a = Rect::new(0, 0, 100, 100);
        let b = Rect::new(50, 80, 100, 100);
        assert_eq!(a.intersect(&b), Rect::new(50, 80, 50, 20));
        assert_eq!(b.intersect(&a), Rect::new(50, 80, 50, 20));
    }

    #[test]
    fn test_intersect_disjoint_stays_inside() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(50, 50, 10, 10);
        let c = a.intersect(&b);
        assert!(c.is_empty());
        assert!(c.is_within(&a));
    }

    #[test]
    fn test_negative_size_clamped() {
        let r = Rect::new(0, 0, -5, 3);
        assert_eq!(r.w, 0);
        assert!(r.is_empty());
    }
}
