//! Clickable button with a hover/press state machine and a centered label.
//!
//! State is recomputed from the input snapshot every tick:
//! pointer inside the active area of a visible button = `Hover`, plus the
//! primary button held = `Pressed`. The click action runs once, on the tick
//! `Pressed` is first entered, and re-arms only after the primary button is
//! released (a press held while sliding off and back on does not repeat).

use crate::core::event_bus::{Event, EventEmitter};

use super::color::Rgba;
use super::surface::Surface;
use super::widget::{Base, UpdateCx, Widget};

/// Visual/interaction state for the current tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ButtonState {
    #[default]
    Idle,
    Hover,
    Pressed,
}

/// Background colors keyed by state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ButtonColors {
    pub normal: Rgba,
    pub hover: Rgba,
    pub pressed: Rgba,
}

impl Default for ButtonColors {
    fn default() -> Self {
        Self {
            normal: Rgba::rgb(0xff, 0xff, 0xff),
            hover: Rgba::rgb(0xda, 0xdd, 0xd8),
            pressed: Rgba::rgb(0x1c, 0x1c, 0x1c),
        }
    }
}

pub type ClickAction = Box<dyn Fn(&EventEmitter)>;

pub struct Button {
    label: String,
    font_size: f32,
    label_color: Rgba,
    pub colors: ButtonColors,
    on_click: Option<ClickAction>,
    state: ButtonState,
    /// Set when the action fired; cleared on primary release
    latched: bool,
    label_surface: Option<Surface>,
    clicks: u32,
}

impl Button {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            font_size: 16.0,
            label_color: Rgba::rgb(20, 20, 20),
            colors: ButtonColors::default(),
            on_click: None,
            state: ButtonState::Idle,
            latched: false,
            label_surface: None,
            clicks: 0,
        }
    }

    pub fn with_font_size(mut self, size: f32) -> Self {
        self.font_size = size;
        self.label_surface = None;
        self
    }

    pub fn on_click(mut self, action: impl Fn(&EventEmitter) + 'static) -> Self {
        self.on_click = Some(Box::new(action));
        self
    }

    /// Click emits a clone of `event`.
    pub fn emitting<E: Event + Clone>(self, event: E) -> Self {
        self.on_click(move |emitter| emitter.emit(event.clone()))
    }

    pub fn state(&self) -> ButtonState {
        self.state
    }

    /// Number of times the action fired.
    pub fn clicks(&self) -> u32 {
        self.clicks
    }
}

impl Widget for Button {
    fn kind_name(&self) -> &'static str {
        "Button"
    }

    fn on_update(&mut self, base: &mut Base, cx: &mut UpdateCx<'_>) {
        let primary = cx.input.primary_down;
        self.state = match (cx.hovered(), primary) {
            (true, true) => ButtonState::Pressed,
            (true, false) => ButtonState::Hover,
            (false, _) => ButtonState::Idle,
        };

        if self.state == ButtonState::Pressed && !self.latched {
            self.latched = true;
            self.clicks += 1;
            if let Some(action) = &self.on_click {
                action(cx.emitter);
            }
        }
        if !primary {
            self.latched = false;
        }

        let color = match self.state {
            ButtonState::Idle => self.colors.normal,
            ButtonState::Hover => self.colors.hover,
            ButtonState::Pressed => self.colors.pressed,
        };
        base.surface.fill(color);

        if self.label_surface.is_none() {
            self.label_surface = Some(cx.glyphs.render(&self.label, self.font_size, self.label_color));
        }
        if let Some(label) = &self.label_surface {
            let x = (base.width() - label.width() as i32) / 2;
            let y = (base.height() - label.height() as i32) / 2;
            base.surface.blit(label, x, y);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::events::SeekRequested;
    use crate::ui::glyphs::BlockGlyphs;
    use crate::ui::input::InputSnapshot;
    use crate::ui::tree::UiTree;
    use crate::ui::widget::ElementId;

    fn setup() -> (UiTree, ElementId) {
        let mut tree = UiTree::with_glyphs(Box::new(BlockGlyphs));
        let id = tree.create(10, 10, 40, 20, Button::new("go").emitting(SeekRequested { seconds: 2.0 }));
        (tree, id)
    }

    fn tick(tree: &mut UiTree, input: InputSnapshot) {
        let mut target = Surface::new(100, 100);
        tree.update_all(&input, &mut target);
    }

    fn button(tree: &UiTree, id: ElementId) -> &Button {
        tree.kind(id).and_then(|k| k.as_button()).unwrap()
    }

    #[test]
    fn test_state_transitions() {
        let (mut tree, id) = setup();
        tick(&mut tree, InputSnapshot::at(0, 0));
        assert_eq!(button(&tree, id).state(), ButtonState::Idle);
        tick(&mut tree, InputSnapshot::at(15, 15));
        assert_eq!(button(&tree, id).state(), ButtonState::Hover);
        tick(&mut tree, InputSnapshot::at(15, 15).pressed());
        assert_eq!(button(&tree, id).state(), ButtonState::Pressed);
        tick(&mut tree, InputSnapshot::at(15, 15));
        assert_eq!(button(&tree, id).state(), ButtonState::Hover);
    }

    #[test]
    fn test_click_fires_once_per_press() {
        let (mut tree, id) = setup();
        for _ in 0..5 {
            tick(&mut tree, InputSnapshot::at(15, 15).pressed());
        }
        assert_eq!(button(&tree, id).clicks(), 1);

        tick(&mut tree, InputSnapshot::at(15, 15));
        tick(&mut tree, InputSnapshot::at(15, 15).pressed());
        assert_eq!(button(&tree, id).clicks(), 2);

        let events = tree.events().poll();
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_held_press_sliding_back_does_not_refire() {
        let (mut tree, id) = setup();
        tick(&mut tree, InputSnapshot::at(15, 15).pressed());
        tick(&mut tree, InputSnapshot::at(90, 90).pressed());
        tick(&mut tree, InputSnapshot::at(15, 15).pressed());
        assert_eq!(button(&tree, id).clicks(), 1);
    }

    #[test]
    fn test_invisible_button_ignores_pointer() {
        let (mut tree, id) = setup();
        tree.set_visible(id, false);
        tick(&mut tree, InputSnapshot::at(15, 15).pressed());
        assert_eq!(button(&tree, id).clicks(), 0);
        assert_eq!(button(&tree, id).state(), ButtonState::Idle);
    }

    #[test]
    fn test_press_color_rendered() {
        let (mut tree, _) = setup();
        let mut target = Surface::new(100, 100);
        tree.update_all(&InputSnapshot::at(11, 11).pressed(), &mut target);
        assert_eq!(target.pixel(10, 10), Some(ButtonColors::default().pressed));
    }
}
