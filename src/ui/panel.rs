//! Plain container: a background fill and children, no behavior.

use super::widget::{Base, UpdateCx, Widget};

#[derive(Debug, Clone, Copy, Default)]
pub struct Panel;

impl Widget for Panel {
    fn kind_name(&self) -> &'static str {
        "Panel"
    }

    fn on_update(&mut self, _base: &mut Base, _cx: &mut UpdateCx<'_>) {}
}
