//! Retained-mode UI: element tree, controls and software compositing.
//!
//! Elements live in a [`UiTree`]; each tick the host hands
//! [`UiTree::update_all`] an [`InputSnapshot`] and a display [`Surface`].

pub mod button;
pub mod color;
pub mod events;
pub mod geometry;
pub mod glyphs;
pub mod image;
pub mod input;
pub mod panel;
pub mod scroll;
pub mod surface;
pub mod text;
pub mod tree;
pub mod video_frame;
pub mod widget;

pub use button::{Button, ButtonColors, ButtonState};
pub use color::{ColorError, Rgba};
pub use events::{OpenRequested, PlaybackCommand, QuitRequested, SeekRequested};
pub use geometry::Rect;
pub use glyphs::{BlockGlyphs, CosmicTextRenderer, GlyphRenderer};
pub use self::image::Image;
pub use input::{InputSnapshot, Key};
pub use panel::Panel;
pub use scroll::{ContentView, ScrollBar, ScrollView};
pub use surface::Surface;
pub use text::Text;
pub use tree::{Element, UiTree};
pub use video_frame::VideoFrame;
pub use widget::{Base, ElementId, ElementKind, TreeRequest, UpdateCx, Widget};
