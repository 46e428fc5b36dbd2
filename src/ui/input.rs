//! Per-tick input snapshot handed to the tree traversal.
//!
//! The host window system fills one [`InputSnapshot`] per tick. Controls
//! read pointer state from it lazily; discrete key presses are handled by
//! the orchestrator before the traversal runs.

/// Discrete key press
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Space,
    Escape,
    /// Step one frame back / forward
    ArrowLeft,
    ArrowRight,
    /// Seek to the first / last frame
    Home,
    End,
    /// `0`..=`9`
    Digit(u8),
    /// Lowercase ASCII letter
    Letter(char),
}

/// Raw input for one tick, in display-target pixel coordinates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSnapshot {
    /// Pointer position, `None` when the pointer is outside the window.
    pub pointer: Option<(i32, i32)>,
    /// Primary (left) button currently held.
    pub primary_down: bool,
    /// Wheel movement in notches; positive scrolls toward the end of content.
    pub wheel: f32,
    /// Keys pressed this tick, in order.
    pub keys: Vec<Key>,
}

impl InputSnapshot {
    /// Snapshot with the pointer at `(x, y)` and no buttons or keys.
    pub fn at(x: i32, y: i32) -> Self {
        Self {
            pointer: Some((x, y)),
            ..Self::default()
        }
    }

    pub fn pressed(mut self) -> Self {
        self.primary_down = true;
        self
    }

    pub fn with_wheel(mut self, notches: f32) -> Self {
        self.wheel = notches;
        self
    }

    pub fn with_key(mut self, key: Key) -> Self {
        self.keys.push(key);
        self
    }
}
