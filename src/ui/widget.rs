//! Widget capability trait and the tagged set of element kinds.
//!
//! Every element in a [`UiTree`](super::tree::UiTree) pairs a [`Base`]
//! (geometry, visibility, background, pixel buffer) with one
//! [`ElementKind`] variant. The traversal calls [`Widget::on_update`] on the
//! variant once per tick, after the background fill and before the
//! children are updated.
//!
//! Widgets never see the tree. Anything that reaches beyond the widget's
//! own base (moving scroll content, seeking video from a button) goes
//! through a [`TreeRequest`] applied by the tree right after the hook, or
//! through an event on the bus drained by the orchestrator between ticks.

use enum_dispatch::enum_dispatch;

use crate::core::event_bus::EventEmitter;

use super::button::Button;
use super::color::Rgba;
use super::geometry::Rect;
use super::glyphs::GlyphRenderer;
use super::image::Image;
use super::input::InputSnapshot;
use super::panel::Panel;
use super::scroll::{ContentView, ScrollBar, ScrollView};
use super::surface::Surface;
use super::text::Text;
use super::video_frame::VideoFrame;

/// Stable element handle. Ids are never reused within one tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub(crate) u64);

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Geometry and pixel buffer shared by every element kind.
#[derive(Debug, Clone)]
pub struct Base {
    /// Position in parent-local space
    pub x: i32,
    pub y: i32,
    width: i32,
    height: i32,
    pub visible: bool,
    pub background: Option<Rgba>,
    pub(crate) surface: Surface,
}

impl Base {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        let (width, height) = (width.max(0), height.max(0));
        Self {
            x,
            y,
            width,
            height,
            visible: true,
            background: None,
            surface: Surface::new(width as usize, height as usize),
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Bounds in parent-local space.
    pub fn local_rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut Surface {
        &mut self.surface
    }

    /// Reallocate the buffer; refilled with the background if one is set.
    pub fn resize(&mut self, width: i32, height: i32) {
        self.width = width.max(0);
        self.height = height.max(0);
        self.surface = Surface::new(self.width as usize, self.height as usize);
        if let Some(bg) = self.background {
            self.surface.fill(bg);
        }
    }
}

/// Cross-element work a widget asks the tree to perform after its hook.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeRequest {
    /// Scroll a [`ScrollView`] by wheel notches (positive = toward the end).
    Scroll { view: ElementId, steps: f32 },
    /// A scroll thumb was dragged by `dy` pointer pixels.
    ThumbDrag { bar: ElementId, dy: i32 },
    /// Replace the string shown by a [`Text`] element.
    SetText { id: ElementId, text: String },
}

/// Per-element context for one hook invocation.
pub struct UpdateCx<'a> {
    pub id: ElementId,
    pub input: &'a InputSnapshot,
    /// Own rect intersected with every ancestor's active area (world space).
    pub active_area: Rect,
    /// Element and all its ancestors are visible.
    pub visible: bool,
    pub emitter: &'a EventEmitter,
    pub glyphs: &'a dyn GlyphRenderer,
    pub requests: &'a mut Vec<TreeRequest>,
}

impl UpdateCx<'_> {
    /// Pointer inside the active area of a visible element.
    pub fn hovered(&self) -> bool {
        self.visible
            && self
                .input
                .pointer
                .is_some_and(|(x, y)| self.active_area.contains(x, y))
    }

    pub fn request(&mut self, request: TreeRequest) {
        self.requests.push(request);
    }
}

/// Per-kind behavior invoked by the traversal.
#[enum_dispatch]
pub trait Widget {
    /// Kind name for logging
    fn kind_name(&self) -> &'static str;

    /// Per-tick hook. The base surface has already been cleared to the
    /// background color; children are updated after this returns.
    fn on_update(&mut self, base: &mut Base, cx: &mut UpdateCx<'_>);

    /// Called once at creation and after every resize.
    fn on_resized(&mut self, _base: &mut Base) {}
}

/// All element kinds the tree knows about.
#[enum_dispatch(Widget)]
pub enum ElementKind {
    Panel,
    Button,
    Text,
    Image,
    ContentView,
    ScrollBar,
    ScrollView,
    VideoFrame,
}

impl ElementKind {
    pub fn as_button_mut(&mut self) -> Option<&mut Button> {
        match self {
            ElementKind::Button(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_button(&self) -> Option<&Button> {
        match self {
            ElementKind::Button(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self {
            ElementKind::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut Text> {
        match self {
            ElementKind::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_image_mut(&mut self) -> Option<&mut Image> {
        match self {
            ElementKind::Image(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_content(&self) -> Option<&ContentView> {
        match self {
            ElementKind::ContentView(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_content_mut(&mut self) -> Option<&mut ContentView> {
        match self {
            ElementKind::ContentView(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_scroll_view(&self) -> Option<&ScrollView> {
        match self {
            ElementKind::ScrollView(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_scroll_view_mut(&mut self) -> Option<&mut ScrollView> {
        match self {
            ElementKind::ScrollView(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_video_frame(&self) -> Option<&VideoFrame> {
        match self {
            ElementKind::VideoFrame(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_video_frame_mut(&mut self) -> Option<&mut VideoFrame> {
        match self {
            ElementKind::VideoFrame(v) => Some(v),
            _ => None,
        }
    }
}
