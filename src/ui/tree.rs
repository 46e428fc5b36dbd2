//! Element registry and the per-tick update/composite traversal.
//!
//! [`UiTree`] owns every element in an arena keyed by [`ElementId`],
//! iterated in construction order. Parent/child links are ids: a child
//! lists its parent, a parent lists its children in draw order.
//!
//! Traversal for each root (no parent), depth first:
//! 1. clear the buffer to the background color (transparent if unset)
//! 2. run the kind's [`Widget::on_update`] hook, then apply its
//!    [`TreeRequest`]s
//! 3. update children in order
//! 4. composite self into the parent's buffer, or into the display target
//!    for a root
//!
//! Children therefore composite into the parent after the parent's hook has
//! drawn, and later siblings draw over earlier ones.

use indexmap::IndexMap;
use log::{trace, warn};

use crate::core::event_bus::{EventBus, EventEmitter};

use super::color::Rgba;
use super::geometry::Rect;
use super::glyphs::{CosmicTextRenderer, GlyphRenderer};
use super::input::InputSnapshot;
use super::surface::Surface;
use super::widget::{Base, ElementId, ElementKind, TreeRequest, UpdateCx, Widget};

/// One node: shared base plus kind-specific state.
pub struct Element {
    pub(crate) base: Base,
    pub(crate) kind: ElementKind,
    pub(crate) parent: Option<ElementId>,
    pub(crate) children: Vec<ElementId>,
}

impl Element {
    pub fn base(&self) -> &Base {
        &self.base
    }

    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    pub fn children(&self) -> &[ElementId] {
        &self.children
    }
}

/// Owner of all elements, the control event bus and the glyph service.
pub struct UiTree {
    elements: IndexMap<ElementId, Element>,
    next_id: u64,
    events: EventBus,
    glyphs: Box<dyn GlyphRenderer>,
}

impl Default for UiTree {
    fn default() -> Self {
        Self::with_glyphs(Box::new(CosmicTextRenderer))
    }
}

impl UiTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_glyphs(glyphs: Box<dyn GlyphRenderer>) -> Self {
        Self {
            elements: IndexMap::new(),
            next_id: 1,
            events: EventBus::new(),
            glyphs,
        }
    }

    /// Bus that control actions emit into; drained by the orchestrator.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn glyphs(&self) -> &dyn GlyphRenderer {
        &*self.glyphs
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.contains_key(&id)
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    pub(crate) fn element_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.get_mut(&id)
    }

    pub fn base(&self, id: ElementId) -> Option<&Base> {
        self.elements.get(&id).map(|e| &e.base)
    }

    pub fn base_mut(&mut self, id: ElementId) -> Option<&mut Base> {
        self.elements.get_mut(&id).map(|e| &mut e.base)
    }

    pub fn kind(&self, id: ElementId) -> Option<&ElementKind> {
        self.elements.get(&id).map(|e| &e.kind)
    }

    pub fn kind_mut(&mut self, id: ElementId) -> Option<&mut ElementKind> {
        self.elements.get_mut(&id).map(|e| &mut e.kind)
    }

    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.elements.get(&id).and_then(|e| e.parent)
    }

    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.elements.get(&id).map(|e| e.children.as_slice()).unwrap_or(&[])
    }

    /// Parentless elements in construction order.
    pub fn roots(&self) -> Vec<ElementId> {
        self.elements
            .iter()
            .filter(|(_, e)| e.parent.is_none())
            .map(|(id, _)| *id)
            .collect()
    }

    /// Register a new root element. Runs `on_resized` once so kinds that
    /// derive content from their size start consistent.
    pub fn create(&mut self, x: i32, y: i32, width: i32, height: i32, kind: impl Into<ElementKind>) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;

        let mut base = Base::new(x, y, width, height);
        let mut kind = kind.into();
        kind.on_resized(&mut base);
        trace!("create {} {} at ({}, {}) {}x{}", kind.kind_name(), id, x, y, width, height);

        self.elements.insert(
            id,
            Element {
                base,
                kind,
                parent: None,
                children: Vec::new(),
            },
        );
        id
    }

    /// Create an element and attach it to `parent` in one step.
    pub fn create_child(
        &mut self,
        parent: ElementId,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        kind: impl Into<ElementKind>,
    ) -> ElementId {
        let id = self.create(x, y, width, height, kind);
        self.set_parent(id, Some(parent));
        id
    }

    pub fn set_position(&mut self, id: ElementId, x: i32, y: i32) {
        match self.elements.get_mut(&id) {
            Some(el) => {
                el.base.x = x;
                el.base.y = y;
            }
            None => warn!("set_position: unknown element {}", id),
        }
    }

    pub fn set_visible(&mut self, id: ElementId, visible: bool) {
        match self.elements.get_mut(&id) {
            Some(el) => el.base.visible = visible,
            None => warn!("set_visible: unknown element {}", id),
        }
    }

    pub fn set_background(&mut self, id: ElementId, color: Option<Rgba>) {
        match self.elements.get_mut(&id) {
            Some(el) => el.base.background = color,
            None => warn!("set_background: unknown element {}", id),
        }
    }

    /// True if `ancestor` is `id` or lies on its parent chain.
    fn is_ancestor_or_self(&self, ancestor: ElementId, id: ElementId) -> bool {
        let mut cur = Some(id);
        while let Some(c) = cur {
            if c == ancestor {
                return true;
            }
            cur = self.parent(c);
        }
        false
    }

    /// Move `id` under `parent` (appended last), or detach it to a root.
    pub fn set_parent(&mut self, id: ElementId, parent: Option<ElementId>) {
        if !self.contains(id) {
            warn!("set_parent: unknown element {}", id);
            return;
        }
        if let Some(p) = parent {
            if !self.contains(p) {
                warn!("set_parent: unknown parent {} for {}", p, id);
                return;
            }
            if self.is_ancestor_or_self(id, p) {
                warn!("set_parent: {} under {} would form a cycle", id, p);
                return;
            }
        }

        let old = self.parent(id);
        if let Some(old) = old {
            if let Some(old_el) = self.elements.get_mut(&old) {
                old_el.children.retain(|c| *c != id);
            }
        }
        if let Some(el) = self.elements.get_mut(&id) {
            el.parent = parent;
        }
        if let Some(p) = parent {
            if let Some(p_el) = self.elements.get_mut(&p) {
                p_el.children.push(id);
            }
            self.child_added(p, id);
        }
    }

    fn child_added(&mut self, parent: ElementId, child: ElementId) {
        let is_content = self.kind(parent).and_then(ElementKind::as_content).is_some();
        if is_content {
            self.content_child_added(parent, child);
        }
    }

    /// Dispose `id` and its whole subtree, children first.
    pub fn delete(&mut self, id: ElementId) {
        let Some(el) = self.elements.get(&id) else {
            warn!("delete: unknown element {}", id);
            return;
        };
        let children = el.children.clone();
        let parent = el.parent;

        for child in children {
            self.delete(child);
        }
        if let Some(p) = parent {
            if let Some(p_el) = self.elements.get_mut(&p) {
                p_el.children.retain(|c| *c != id);
            }
        }
        if let Some(el) = self.elements.shift_remove(&id) {
            trace!("delete {} {}", el.kind.kind_name(), id);
        }
    }

    /// Reallocate the buffer and run the `on_resized` hook.
    pub fn resize(&mut self, id: ElementId, width: i32, height: i32) {
        let Some(el) = self.elements.get_mut(&id) else {
            warn!("resize: unknown element {}", id);
            return;
        };
        el.base.resize(width, height);
        el.kind.on_resized(&mut el.base);
    }

    /// Absolute bounds: local rect offset by every ancestor's position.
    pub fn world_rect(&self, id: ElementId) -> Option<Rect> {
        let el = self.elements.get(&id)?;
        let mut rect = el.base.local_rect();
        let mut cur = el.parent;
        while let Some(p) = cur {
            let p_el = self.elements.get(&p)?;
            rect = rect.offset(p_el.base.x, p_el.base.y);
            cur = p_el.parent;
        }
        Some(rect)
    }

    /// World rect clipped by every ancestor's active area.
    pub fn active_area(&self, id: ElementId) -> Option<Rect> {
        let world = self.world_rect(id)?;
        match self.parent(id) {
            Some(p) => Some(world.intersect(&self.active_area(p)?)),
            None => Some(world),
        }
    }

    /// Element and every ancestor have `visible` set.
    pub fn is_effectively_visible(&self, id: ElementId) -> bool {
        let mut cur = Some(id);
        while let Some(c) = cur {
            match self.elements.get(&c) {
                Some(el) if el.base.visible => cur = el.parent,
                _ => return false,
            }
        }
        true
    }

    /// Run one tick over every root in construction order and composite the
    /// result into `target`.
    pub fn update_all(&mut self, input: &InputSnapshot, target: &mut Surface) {
        let emitter = self.events.emitter();
        for id in self.roots() {
            self.update_node(id, (0, 0), None, true, input, &emitter, target);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn update_node(
        &mut self,
        id: ElementId,
        origin: (i32, i32),
        clip: Option<Rect>,
        parent_visible: bool,
        input: &InputSnapshot,
        emitter: &EventEmitter,
        target: &mut Surface,
    ) {
        let mut requests = Vec::new();
        {
            let glyphs = &*self.glyphs;
            let Some(el) = self.elements.get_mut(&id) else {
                return;
            };
            let world = el.base.local_rect().offset(origin.0, origin.1);
            let active_area = clip.map_or(world, |c| world.intersect(&c));
            let visible = parent_visible && el.base.visible;

            let bg = el.base.background.unwrap_or(Rgba::TRANSPARENT);
            el.base.surface.fill(bg);

            let mut cx = UpdateCx {
                id,
                input,
                active_area,
                visible,
                emitter,
                glyphs,
                requests: &mut requests,
            };
            el.kind.on_update(&mut el.base, &mut cx);
        }
        for request in requests {
            self.apply_request(request);
        }

        // Hooks and requests may have moved this element
        let Some(el) = self.elements.get(&id) else {
            return;
        };
        let world = el.base.local_rect().offset(origin.0, origin.1);
        let active = clip.map_or(world, |c| world.intersect(&c));
        let visible = parent_visible && el.base.visible;
        let children = el.children.clone();

        for child in children {
            self.update_node(child, (world.x, world.y), Some(active), visible, input, emitter, target);
        }
        self.composite(id, target);
    }

    fn apply_request(&mut self, request: TreeRequest) {
        match request {
            TreeRequest::Scroll { view, steps } => {
                self.scroll(view, steps);
            }
            TreeRequest::ThumbDrag { bar, dy } => {
                self.drag_thumb(bar, dy);
            }
            TreeRequest::SetText { id, text } => match self.kind_mut(id).and_then(ElementKind::as_text_mut) {
                Some(t) => t.set_text(text),
                None => warn!("set_text: {} is not a text element", id),
            },
        }
    }

    fn composite(&mut self, id: ElementId, target: &mut Surface) {
        let Some(el) = self.elements.get_mut(&id) else {
            return;
        };
        if !el.base.visible {
            return;
        }
        let (x, y) = (el.base.x, el.base.y);
        match el.parent {
            None => target.blit(&el.base.surface, x, y),
            Some(parent) => {
                let surface = std::mem::take(&mut el.base.surface);
                if let Some(p_el) = self.elements.get_mut(&parent) {
                    p_el.base.surface.blit(&surface, x, y);
                }
                if let Some(el) = self.elements.get_mut(&id) {
                    el.base.surface = surface;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::glyphs::BlockGlyphs;
    use crate::ui::panel::Panel;

    const RED: Rgba = Rgba::rgb(255, 0, 0);
    const GREEN: Rgba = Rgba::rgb(0, 255, 0);
    const BLUE: Rgba = Rgba::rgb(0, 0, 255);

    fn tree() -> UiTree {
        UiTree::with_glyphs(Box::new(BlockGlyphs))
    }

    #[test]
    fn test_world_rect_sums_parent_chain() {
        let mut t = tree();
        let a = t.create(10, 20, 200, 200, Panel);
        let b = t.create_child(a, 5, 5, 100, 100, Panel);
        let c = t.create_child(b, 1, 2, 10, 10, Panel);

        assert_eq!(t.world_rect(a), Some(Rect::new(10, 20, 200, 200)));
        assert_eq!(t.world_rect(b), Some(Rect::new(15, 25, 100, 100)));
        assert_eq!(t.world_rect(c), Some(Rect::new(16, 27, 10, 10)));
    }

    #[test]
    fn test_active_area_clipped_by_ancestors() {
        let mut t = tree();
        let a = t.create(0, 0, 50, 50, Panel);
        let b = t.create_child(a, 40, 40, 30, 30, Panel);
        let c = t.create_child(b, -5, -5, 8, 8, Panel);

        assert_eq!(t.active_area(b), Some(Rect::new(40, 40, 10, 10)));
        assert_eq!(t.active_area(c), Some(Rect::new(40, 40, 3, 3)));
        assert!(t.active_area(c).unwrap().is_within(&t.world_rect(c).unwrap()));
    }

    #[test]
    fn test_reparent_updates_child_lists() {
        let mut t = tree();
        let a = t.create(0, 0, 10, 10, Panel);
        let b = t.create(0, 0, 10, 10, Panel);
        let c = t.create_child(a, 0, 0, 5, 5, Panel);
        assert_eq!(t.children(a), &[c]);
        assert_eq!(t.roots(), vec![a, b]);

        t.set_parent(c, Some(b));
        assert!(t.children(a).is_empty());
        assert_eq!(t.children(b), &[c]);
        assert_eq!(t.parent(c), Some(b));

        t.set_parent(c, None);
        assert!(t.children(b).is_empty());
        assert_eq!(t.roots(), vec![a, b, c]);
    }

    #[test]
    fn test_set_parent_rejects_cycle() {
        let mut t = tree();
        let a = t.create(0, 0, 10, 10, Panel);
        let b = t.create_child(a, 0, 0, 5, 5, Panel);
        t.set_parent(a, Some(b));
        assert_eq!(t.parent(a), None);
        t.set_parent(a, Some(a));
        assert_eq!(t.parent(a), None);
    }

    #[test]
    fn test_delete_is_recursive() {
        let mut t = tree();
        let a = t.create(0, 0, 10, 10, Panel);
        let b = t.create_child(a, 0, 0, 5, 5, Panel);
        let c = t.create_child(b, 0, 0, 2, 2, Panel);
        let other = t.create(0, 0, 10, 10, Panel);

        t.delete(b);
        assert!(!t.contains(b));
        assert!(!t.contains(c));
        assert!(t.children(a).is_empty());
        assert_eq!(t.len(), 2);

        // Unknown id is a logged no-op
        t.delete(c);
        assert_eq!(t.len(), 2);
        assert!(t.contains(other));
    }

    #[test]
    fn test_update_all_composites_children_over_parent() {
        let mut t = tree();
        let root = t.create(1, 1, 4, 4, Panel);
        t.set_background(root, Some(BLUE));
        let child = t.create_child(root, 2, 2, 4, 4, Panel);
        t.set_background(child, Some(RED));

        let mut target = Surface::filled(8, 8, GREEN);
        t.update_all(&InputSnapshot::default(), &mut target);

        assert_eq!(target.pixel(0, 0), Some(GREEN));
        assert_eq!(target.pixel(1, 1), Some(BLUE));
        assert_eq!(target.pixel(3, 3), Some(RED));
        // Child clipped to parent bounds: (5,5) is outside the 4x4 root
        assert_eq!(target.pixel(5, 5), Some(GREEN));
        assert_eq!(target.pixel(4, 4), Some(RED));
    }

    #[test]
    fn test_invisible_element_not_composited() {
        let mut t = tree();
        let root = t.create(0, 0, 2, 2, Panel);
        t.set_background(root, Some(RED));
        t.set_visible(root, false);

        let mut target = Surface::filled(2, 2, BLUE);
        t.update_all(&InputSnapshot::default(), &mut target);
        assert_eq!(target.pixel(0, 0), Some(BLUE));
        assert!(!t.is_effectively_visible(root));
    }

    #[test]
    fn test_later_siblings_draw_on_top() {
        let mut t = tree();
        let root = t.create(0, 0, 2, 2, Panel);
        let a = t.create_child(root, 0, 0, 2, 2, Panel);
        let b = t.create_child(root, 1, 0, 1, 2, Panel);
        t.set_background(a, Some(RED));
        t.set_background(b, Some(GREEN));

        let mut target = Surface::new(2, 2);
        t.update_all(&InputSnapshot::default(), &mut target);
        assert_eq!(target.pixel(0, 0), Some(RED));
        assert_eq!(target.pixel(1, 0), Some(GREEN));
    }

    #[test]
    fn test_resize_reallocates_buffer() {
        let mut t = tree();
        let a = t.create(0, 0, 2, 2, Panel);
        t.resize(a, 6, 3);
        let base = t.base(a).unwrap();
        assert_eq!((base.width(), base.height()), (6, 3));
        assert_eq!(base.surface().width(), 6);
        assert_eq!(base.surface().height(), 3);
    }
}
