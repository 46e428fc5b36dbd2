//! Property tests for tree geometry and scroll clamping.

use proptest::prelude::*;

use scene_review::ui::{BlockGlyphs, ElementId, InputSnapshot, Panel, Surface, UiTree};

fn tree() -> UiTree {
    UiTree::with_glyphs(Box::new(BlockGlyphs))
}

/// (x, y, w, h) in a range that includes negative offsets and overhang.
fn node() -> impl Strategy<Value = (i32, i32, i32, i32)> {
    (-50i32..150, -50i32..150, 0i32..120, 0i32..120)
}

#[derive(Debug, Clone)]
enum ScrollOp {
    Wheel(f32),
    Pixels(i32),
    Drag { from_y: i32, to_y: i32 },
    AddRow(i32),
    Clear,
}

fn scroll_op() -> impl Strategy<Value = ScrollOp> {
    prop_oneof![
        (-20.0f32..20.0).prop_map(ScrollOp::Wheel),
        (-2000i32..2000).prop_map(ScrollOp::Pixels),
        (0i32..200, -100i32..300).prop_map(|(from_y, to_y)| ScrollOp::Drag { from_y, to_y }),
        (1i32..60).prop_map(ScrollOp::AddRow),
        Just(ScrollOp::Clear),
    ]
}

fn tick(tree: &mut UiTree, input: InputSnapshot) {
    let mut target = Surface::new(160, 240);
    tree.update_all(&input, &mut target);
}

fn assert_offset_in_range(tree: &UiTree, view: ElementId, viewport: i32) {
    let offset = tree.scroll_offset(view).unwrap();
    let extent = tree.content_extent(view).unwrap();
    assert!(offset >= 0, "offset {} below zero", offset);
    assert!(
        offset <= (extent - viewport).max(0),
        "offset {} past end (extent {}, viewport {})",
        offset,
        extent,
        viewport
    );
}

proptest! {
    #[test]
    fn world_rect_is_parent_world_plus_local(chain in prop::collection::vec(node(), 1..6)) {
        let mut t = tree();
        let mut ids = Vec::new();
        for (i, (x, y, w, h)) in chain.iter().copied().enumerate() {
            let id = match i {
                0 => t.create(x, y, w, h, Panel),
                _ => t.create_child(ids[i - 1], x, y, w, h, Panel),
            };
            ids.push(id);
        }

        for i in 1..ids.len() {
            let parent = t.world_rect(ids[i - 1]).unwrap();
            let (x, y, w, h) = chain[i];
            let world = t.world_rect(ids[i]).unwrap();
            prop_assert_eq!((world.x, world.y), (parent.x + x, parent.y + y));
            prop_assert_eq!((world.w, world.h), (w, h));
        }
    }

    #[test]
    fn active_area_inside_world_rect(chain in prop::collection::vec(node(), 1..6)) {
        let mut t = tree();
        let mut ids: Vec<ElementId> = Vec::new();
        for (x, y, w, h) in chain.iter().copied() {
            let id = match ids.last() {
                None => t.create(x, y, w, h, Panel),
                Some(&parent) => t.create_child(parent, x, y, w, h, Panel),
            };
            ids.push(id);
        }

        for (i, id) in ids.iter().enumerate() {
            let active = t.active_area(*id).unwrap();
            let world = t.world_rect(*id).unwrap();
            prop_assert!(active.is_within(&world), "{:?} not within {:?}", active, world);
            if i > 0 {
                let parent_active = t.active_area(ids[i - 1]).unwrap();
                prop_assert_eq!(active, world.intersect(&parent_active));
            }
        }
    }

    #[test]
    fn scroll_offset_stays_clamped(
        rows in 0i32..80,
        viewport in 20i32..240,
        ops in prop::collection::vec(scroll_op(), 1..40),
    ) {
        let mut t = tree();
        let view = t.create_scroll_view(0, 0, 160, viewport, 10);
        for i in 0..rows {
            let row = t.create(0, i * 25, 140, 25, Panel);
            t.add_to_content(view, row);
        }
        assert_offset_in_range(&t, view, viewport);

        let mut next_row = rows;
        for op in ops {
            match op {
                ScrollOp::Wheel(steps) => {
                    t.scroll(view, steps);
                }
                ScrollOp::Pixels(px) => {
                    t.scroll_by(view, px);
                }
                ScrollOp::Drag { from_y, to_y } => {
                    tick(&mut t, InputSnapshot::at(155, from_y));
                    tick(&mut t, InputSnapshot::at(155, from_y).pressed());
                    tick(&mut t, InputSnapshot::at(155, to_y).pressed());
                    tick(&mut t, InputSnapshot::at(155, to_y));
                }
                ScrollOp::AddRow(h) => {
                    let row = t.create(0, next_row * 25, 140, h, Panel);
                    t.add_to_content(view, row);
                    next_row += 1;
                }
                ScrollOp::Clear => {
                    t.clear_content(view);
                    next_row = 0;
                }
            }
            assert_offset_in_range(&t, view, viewport);

            let thumb = t.thumb_rect(view).unwrap();
            prop_assert!(thumb.y >= 0 && thumb.bottom() <= viewport);
        }
    }

    #[test]
    fn clear_twice_equals_clear_once(rows in 0i32..50, scroll in 0i32..2000) {
        let mut t = tree();
        let view = t.create_scroll_view(0, 0, 100, 200, 10);
        for i in 0..rows {
            let row = t.create(0, i * 25, 80, 25, Panel);
            t.add_to_content(view, row);
        }
        t.scroll_by(view, scroll);

        t.clear_content(view);
        let once = (t.len(), t.scroll_offset(view), t.content_extent(view), t.thumb_rect(view));
        t.clear_content(view);
        let twice = (t.len(), t.scroll_offset(view), t.content_extent(view), t.thumb_rect(view));
        prop_assert_eq!(once, twice);
        prop_assert_eq!(once.1, Some(0));
        prop_assert_eq!(once.2, Some(0));
    }
}
