//! Vertical scroll viewport: [`ScrollView`] owning a [`ContentView`] and a
//! [`ScrollBar`] thumb.
//!
//! Layout inside a view of `w x h`:
//! - thumb at `x = w - THUMB_WIDTH`, children order `[thumb, content]` so a
//!   drag applied during the thumb's hook moves content before it renders
//! - content at `(0, 0)`, `(w - THUMB_WIDTH) x h`
//!
//! Offsets are integer pixels. Content children keep view-space `y`; the
//! extent is tracked in content space (`y + offset + height`). Positive
//! steps scroll toward the end of the content (wheel down, thumb down).

use log::warn;

use super::button::ButtonColors;
use super::color::Rgba;
use super::geometry::Rect;
use super::tree::UiTree;
use super::widget::{Base, ElementId, ElementKind, TreeRequest, UpdateCx, Widget};

pub const THUMB_WIDTH: i32 = 10;
pub const MIN_THUMB_HEIGHT: i32 = 8;
pub const DEFAULT_SCROLL_SPEED: i32 = 10;

/// Scrolled container; children are the content entries.
#[derive(Debug, Default)]
pub struct ContentView {
    offset: i32,
    extent: i32,
}

impl ContentView {
    pub fn offset(&self) -> i32 {
        self.offset
    }

    /// Bottom of the lowest child ever added, in content space.
    pub fn extent(&self) -> i32 {
        self.extent
    }
}

impl Widget for ContentView {
    fn kind_name(&self) -> &'static str {
        "ContentView"
    }

    fn on_update(&mut self, _base: &mut Base, _cx: &mut UpdateCx<'_>) {}
}

/// Draggable thumb. Its parent is the owning [`ScrollView`].
#[derive(Debug, Default)]
pub struct ScrollBar {
    pub colors: ButtonColors,
    dragging: bool,
    last_y: i32,
    prev_down: bool,
}

impl Widget for ScrollBar {
    fn kind_name(&self) -> &'static str {
        "ScrollBar"
    }

    fn on_update(&mut self, base: &mut Base, cx: &mut UpdateCx<'_>) {
        let down = cx.input.primary_down;
        let pointer_y = cx.input.pointer.map(|(_, y)| y);

        let color = if self.dragging && down {
            if let Some(y) = pointer_y {
                let dy = y - self.last_y;
                self.last_y = y;
                if dy != 0 {
                    cx.request(TreeRequest::ThumbDrag { bar: cx.id, dy });
                }
            }
            self.colors.pressed
        } else {
            self.dragging = false;
            if cx.hovered() {
                // Drag only starts on a press that begins on the thumb
                if down && !self.prev_down {
                    self.dragging = true;
                    self.last_y = pointer_y.unwrap_or(0);
                    self.colors.pressed
                } else {
                    self.colors.hover
                }
            } else {
                self.colors.normal
            }
        };
        self.prev_down = down;
        base.surface.fill(color);
    }
}

/// Viewport owning one content view and one thumb.
#[derive(Debug)]
pub struct ScrollView {
    content: ElementId,
    bar: ElementId,
    /// Pixels per wheel notch
    pub speed: i32,
    /// Sub-pixel part of thumb drags not yet applied
    drag_remainder: f32,
}

impl ScrollView {
    pub fn content(&self) -> ElementId {
        self.content
    }

    pub fn bar(&self) -> ElementId {
        self.bar
    }
}

impl Widget for ScrollView {
    fn kind_name(&self) -> &'static str {
        "ScrollView"
    }

    fn on_update(&mut self, _base: &mut Base, cx: &mut UpdateCx<'_>) {
        if cx.input.wheel != 0.0 && cx.hovered() {
            cx.request(TreeRequest::Scroll {
                view: cx.id,
                steps: cx.input.wheel,
            });
        }
    }
}

impl UiTree {
    /// Build a scroll view with its content and thumb children.
    pub fn create_scroll_view(&mut self, x: i32, y: i32, width: i32, height: i32, speed: i32) -> ElementId {
        let bar_x = (width - THUMB_WIDTH).max(0);
        let bar = self.create(bar_x, 0, THUMB_WIDTH.min(width), height, ScrollBar::default());
        let content = self.create(0, 0, bar_x, height, ContentView::default());
        self.set_background(content, Some(Rgba::BLACK));

        let view = self.create(
            x,
            y,
            width,
            height,
            ScrollView {
                content,
                bar,
                speed,
                drag_remainder: 0.0,
            },
        );
        self.set_parent(bar, Some(view));
        self.set_parent(content, Some(view));
        self.refresh_thumb(view);
        view
    }

    /// `(content, bar)` of a scroll view.
    fn view_parts(&self, view: ElementId) -> Option<(ElementId, ElementId)> {
        self.kind(view)
            .and_then(ElementKind::as_scroll_view)
            .map(|v| (v.content, v.bar))
    }

    fn content_state(&self, content: ElementId) -> Option<(i32, i32)> {
        self.kind(content)
            .and_then(ElementKind::as_content)
            .map(|c| (c.offset, c.extent))
    }

    pub fn scroll_content(&self, view: ElementId) -> Option<ElementId> {
        self.view_parts(view).map(|(content, _)| content)
    }

    pub fn scroll_offset(&self, view: ElementId) -> Option<i32> {
        let (content, _) = self.view_parts(view)?;
        self.content_state(content).map(|(offset, _)| offset)
    }

    pub fn content_extent(&self, view: ElementId) -> Option<i32> {
        let (content, _) = self.view_parts(view)?;
        self.content_state(content).map(|(_, extent)| extent)
    }

    /// Thumb bounds local to the view.
    pub fn thumb_rect(&self, view: ElementId) -> Option<Rect> {
        let (_, bar) = self.view_parts(view)?;
        self.base(bar).map(Base::local_rect)
    }

    /// Attach `child` to the view's content. `child`'s `y` is read as a
    /// content-space position and shifted by the current offset.
    pub fn add_to_content(&mut self, view: ElementId, child: ElementId) {
        let Some((content, _)) = self.view_parts(view) else {
            warn!("add_to_content: {} is not a scroll view", view);
            return;
        };
        let offset = self.content_state(content).map_or(0, |(o, _)| o);
        if let Some(base) = self.base_mut(child) {
            base.y -= offset;
        }
        self.set_parent(child, Some(content));
    }

    /// ContentView `child_added` hook: grow extent, refresh the thumb.
    pub(crate) fn content_child_added(&mut self, content: ElementId, child: ElementId) {
        let Some((child_y, child_h)) = self.base(child).map(|b| (b.y, b.height())) else {
            return;
        };
        if let Some(cv) = self.kind_mut(content).and_then(ElementKind::as_content_mut) {
            cv.extent = cv.extent.max(child_y + cv.offset + child_h);
        }
        if let Some(view) = self.parent(content) {
            if self.view_parts(view).is_some() {
                self.refresh_thumb(view);
            }
        }
    }

    /// Scroll by wheel notches (`steps x speed` pixels). Returns the delta
    /// actually applied.
    pub fn scroll(&mut self, view: ElementId, steps: f32) -> i32 {
        let Some(speed) = self.kind(view).and_then(ElementKind::as_scroll_view).map(|v| v.speed) else {
            warn!("scroll: {} is not a scroll view", view);
            return 0;
        };
        let pixels = (steps * speed as f32).round() as i32;
        self.scroll_by(view, pixels)
    }

    /// Scroll by `pixels`, clamped to `[0, max(0, extent - viewport)]`.
    /// Content children shift by the applied delta only.
    pub fn scroll_by(&mut self, view: ElementId, pixels: i32) -> i32 {
        let Some((content, _)) = self.view_parts(view) else {
            warn!("scroll_by: {} is not a scroll view", view);
            return 0;
        };
        let viewport = self.base(view).map_or(0, Base::height);
        let Some((offset, extent)) = self.content_state(content) else {
            return 0;
        };

        let max_offset = (extent - viewport).max(0);
        let new_offset = offset.saturating_add(pixels).clamp(0, max_offset);
        let applied = new_offset - offset;
        if applied != 0 {
            if let Some(cv) = self.kind_mut(content).and_then(ElementKind::as_content_mut) {
                cv.offset = new_offset;
            }
            for child in self.children(content).to_vec() {
                if let Some(base) = self.base_mut(child) {
                    base.y -= applied;
                }
            }
        }
        self.refresh_thumb(view);
        applied
    }

    /// Thumb moved by `dy` pointer pixels: scale by `extent / viewport`.
    pub(crate) fn drag_thumb(&mut self, bar: ElementId, dy: i32) {
        let Some(view) = self.parent(bar) else {
            return;
        };
        let Some((content, _)) = self.view_parts(view) else {
            return;
        };
        let viewport = self.base(view).map_or(0, Base::height);
        let extent = self.content_state(content).map_or(0, |(_, e)| e);
        if viewport <= 0 || extent <= viewport {
            return;
        }

        let Some(sv) = self.kind_mut(view).and_then(ElementKind::as_scroll_view_mut) else {
            return;
        };
        let exact = dy as f32 * extent as f32 / viewport as f32 + sv.drag_remainder;
        let whole = exact.trunc();
        sv.drag_remainder = exact - whole;

        let applied = self.scroll_by(view, whole as i32);
        if applied != whole as i32 {
            // Hit an end; don't carry overshoot into the next drag tick
            if let Some(sv) = self.kind_mut(view).and_then(ElementKind::as_scroll_view_mut) {
                sv.drag_remainder = 0.0;
            }
        }
    }

    /// Dispose every content child and reset offset and extent.
    pub fn clear_content(&mut self, view: ElementId) {
        let Some((content, _)) = self.view_parts(view) else {
            warn!("clear_content: {} is not a scroll view", view);
            return;
        };
        for child in self.children(content).to_vec() {
            self.delete(child);
        }
        if let Some(cv) = self.kind_mut(content).and_then(ElementKind::as_content_mut) {
            cv.offset = 0;
            cv.extent = 0;
        }
        if let Some(sv) = self.kind_mut(view).and_then(ElementKind::as_scroll_view_mut) {
            sv.drag_remainder = 0.0;
        }
        self.refresh_thumb(view);
    }

    /// Recompute thumb height and position from offset and extent.
    fn refresh_thumb(&mut self, view: ElementId) {
        let Some((content, bar)) = self.view_parts(view) else {
            return;
        };
        let viewport = self.base(view).map_or(0, Base::height);
        let Some((offset, extent)) = self.content_state(content) else {
            return;
        };

        let thumb_h = if extent <= viewport || viewport <= 0 {
            viewport
        } else {
            let h = (viewport as i64 * viewport as i64 / extent as i64) as i32;
            h.max(MIN_THUMB_HEIGHT).min(viewport)
        };
        let max_offset = (extent - viewport).max(0);
        let travel = viewport - thumb_h;
        let thumb_y = if max_offset == 0 {
            0
        } else {
            (offset as f64 / max_offset as f64 * travel as f64).round() as i32
        };

        if let Some(base) = self.base_mut(bar) {
            if base.height() != thumb_h {
                let w = base.width();
                base.resize(w, thumb_h);
            }
            base.y = thumb_y;
        }
    }
}
