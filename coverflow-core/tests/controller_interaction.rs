mod common;

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use common::{Harness, TestSource};
use coverflow_core::prelude::*;

fn record_selections(harness: &mut Harness) -> Rc<RefCell<Vec<usize>>> {
    let selections = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&selections);
    harness
        .controller
        .set_selection_sink(move |index| sink.borrow_mut().push(index));
    selections
}

fn record_reorders(harness: &mut Harness) -> Rc<RefCell<Vec<(usize, usize)>>> {
    let reorders = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&reorders);
    harness
        .controller
        .set_reorder_sink(move |from, to| sink.borrow_mut().push((from, to)));
    reorders
}

/// Press on `index` and hold until the long-press timer fires.
async fn pick_up(harness: &mut Harness, index: usize) {
    let point = harness.tile_center(index);
    let now = harness.now();
    assert_eq!(
        harness.controller.pointer_down(point, now),
        PointerResult::Handled
    );
    harness.run_for(Duration::from_millis(300)).await;
    assert!(
        matches!(
            harness.controller.drag_state(),
            DragState::Dragging { source, .. } if *source == index
        ),
        "drag did not start: {:?}",
        harness.controller.drag_state()
    );
}

#[tokio::test]
async fn tap_selects_the_tile_under_the_pointer() {
    let mut harness = Harness::with_items(10);
    let selections = record_selections(&mut harness);

    let point = harness.tile_center(2);
    let now = harness.now();
    harness.controller.pointer_down(point, now);
    assert_eq!(
        harness.controller.pointer_up(point, now),
        PointerResult::Handled
    );

    assert_eq!(*selections.borrow(), vec![2]);
    assert_eq!(harness.controller.target_index(), Some(2));
    assert!(harness.drain_commands().contains(&RenderCommand::SetTarget(2.0)));

    harness.run_for(Duration::from_secs(3)).await;
    assert_eq!(harness.controller.current_index(), 2.0);
    // the long-press timer was cancelled with the tap
    assert!(harness.controller.drag_state() == &DragState::Idle);
}

#[tokio::test]
async fn step_clamps_to_the_strip() {
    let mut harness = Harness::with_items(10);
    let now = harness.now();
    harness.controller.step(3, now);
    assert_eq!(harness.controller.target_index(), Some(3));
    harness.controller.step(-10, now);
    assert_eq!(harness.controller.target_index(), Some(0));
    harness.controller.step(100, now);
    assert_eq!(harness.controller.target_index(), Some(9));
    harness.controller.set_focus(42, now);
    assert_eq!(harness.controller.target_index(), Some(9));
}

#[tokio::test]
async fn long_press_drag_reorders_source_and_slots_once() {
    let mut harness = Harness::with_items(10);
    harness.settle_loads().await;
    let reorders = record_reorders(&mut harness);

    pick_up(&mut harness, 1).await;
    let target = harness.tile_center(3);
    let now = harness.now();
    assert_eq!(
        harness.controller.pointer_move(target, now),
        PointerResult::Handled
    );
    assert_eq!(
        harness.controller.pointer_up(target, now),
        PointerResult::Released
    );

    assert_eq!(*reorders.borrow(), vec![(1, 3)]);
    assert_eq!(harness.controller.source().items[..5], [0, 2, 3, 1, 4]);
    assert_eq!(harness.controller.source().moves, vec![(1, 3)]);

    // the source echoing our own move back must not apply it twice
    let now = harness.now();
    harness
        .controller
        .on_items_changed(ItemChange::Moved { from: 1, to: 3 }, now);
    let keys: Vec<_> = harness
        .controller
        .slots()
        .iter()
        .map(|slot| slot.key)
        .collect();
    let expected: Vec<_> = harness
        .controller
        .source()
        .items
        .iter()
        .map(|id| Some(*id))
        .collect();
    assert_eq!(keys, expected);

    // the image travelled with its item
    let moved = harness.controller.slots().get(3).unwrap();
    assert_eq!(moved.image.as_ref().unwrap().pixels()[0], 1);

    let commands = harness.drain_commands();
    let moves = commands
        .iter()
        .filter(|c| matches!(c, RenderCommand::ItemsMoved { .. }))
        .count();
    assert_eq!(moves, 1);

    harness.run_for(Duration::from_secs(1)).await;
    assert!(harness.controller.drag_state() == &DragState::Idle);
    assert_eq!(harness.controller.target_index(), Some(3));
    assert_eq!(
        harness.drain_commands().last(),
        Some(&RenderCommand::DragVisual(None))
    );
}

#[tokio::test]
async fn foreign_moves_are_mirrored() {
    let mut harness = Harness::with_items(6);
    harness.controller.source_mut().move_item(0, 5);
    let now = harness.now();
    harness
        .controller
        .on_items_changed(ItemChange::Moved { from: 0, to: 5 }, now);

    assert_eq!(harness.controller.slots().get(5).unwrap().key, Some(0));
    assert_eq!(harness.controller.slots().get(0).unwrap().key, Some(1));
    assert!(
        harness
            .drain_commands()
            .contains(&RenderCommand::ItemsMoved { from: 0, to: 5 })
    );
}

#[tokio::test]
async fn capture_loss_drops_at_the_last_target() {
    let mut harness = Harness::with_items(10);
    let reorders = record_reorders(&mut harness);

    pick_up(&mut harness, 2).await;
    let target = harness.tile_center(4);
    let now = harness.now();
    harness.controller.pointer_move(target, now);
    assert_eq!(
        harness.controller.pointer_capture_lost(now),
        PointerResult::Released
    );
    assert_eq!(*reorders.borrow(), vec![(2, 4)]);
    assert!(matches!(
        harness.controller.drag_state(),
        DragState::Dropping { target: 4, .. }
    ));
}

#[tokio::test]
async fn long_press_needs_something_to_reorder() {
    let mut harness = Harness::with_items(1);
    let point = harness.tile_center(0);
    let now = harness.now();
    harness.controller.pointer_down(point, now);
    harness.run_for(Duration::from_millis(400)).await;
    assert!(!matches!(
        harness.controller.drag_state(),
        DragState::Dragging { .. }
    ));
}

#[tokio::test]
async fn pan_settles_and_reports_once_the_spring_rests() {
    let mut harness = Harness::with_items(10);
    let selections = record_selections(&mut harness);
    let now = harness.now();

    let start = Point::new(640.0, 360.0);
    harness.controller.pointer_down(start, now);
    assert_eq!(
        harness
            .controller
            .pointer_move(Point::new(340.0, 360.0), now),
        PointerResult::Captured
    );
    assert_eq!(harness.controller.target_index(), Some(1));
    harness
        .controller
        .pointer_move(Point::new(40.0, 360.0), now);
    assert_eq!(
        harness
            .controller
            .pointer_up(Point::new(40.0, 360.0), now),
        PointerResult::Released
    );
    assert!(selections.borrow().is_empty());

    harness.run_for(Duration::from_secs(3)).await;
    assert_eq!(*selections.borrow(), vec![2]);
    assert_eq!(harness.controller.current_index(), 2.0);
    // no drag was started by the long-press timer
    assert!(harness.controller.drag_state() == &DragState::Idle);
}

#[tokio::test]
async fn edge_auto_scroll_advances_the_focus() {
    let mut harness = Harness::with_items(50);
    let reorders = record_reorders(&mut harness);

    pick_up(&mut harness, 1).await;
    let edge = Point::new(1270.0, 360.0);
    let now = harness.now();
    harness.controller.pointer_move(edge, now);
    harness.run_for(Duration::from_millis(500)).await;

    let target = harness.controller.target_index().unwrap();
    assert!(target >= 4, "auto-scroll only reached {target}");

    let now = harness.now();
    harness.controller.pointer_up(edge, now);
    let reorders = reorders.borrow();
    assert_eq!(reorders.len(), 1);
    assert_eq!(reorders[0].0, 1);
    assert!(reorders[0].1 > 1);
}

#[tokio::test]
async fn desync_is_repaired_from_the_source() {
    let mut harness = Harness::with_items(10);
    harness.drain_commands();

    harness.controller.source_mut().items.extend([100, 101]);
    let now = harness.now();
    // the host under-reports the insertion
    harness
        .controller
        .on_items_changed(ItemChange::Inserted { index: 10, count: 1 }, now);

    assert_eq!(harness.controller.item_count(), 12);
    assert_eq!(harness.controller.slots().get(11).unwrap().key, Some(101));
    assert!(
        harness
            .drain_commands()
            .contains(&RenderCommand::ItemsReset { count: 12 })
    );
}

#[tokio::test]
async fn oversized_insert_count_is_repaired_without_panicking() {
    let mut harness = Harness::with_items(10);
    harness.drain_commands();

    let now = harness.now();
    harness.controller.on_items_changed(
        ItemChange::Inserted {
            index: 3,
            count: usize::MAX,
        },
        now,
    );

    assert_eq!(harness.controller.item_count(), 10);
    assert_eq!(harness.slot_keys(), harness.source_keys());
    assert!(
        harness
            .drain_commands()
            .contains(&RenderCommand::ItemsReset { count: 10 })
    );
}

#[tokio::test]
async fn window_upkeep_leaves_cache_stats_to_the_host() {
    let mut harness = Harness::with_items(10);
    harness.settle_loads().await;
    harness.run_until_idle(Duration::from_secs(1)).await;
    harness.settle_loads().await;
    assert!(!harness.indices_with_images().is_empty());

    let stats = harness.controller.cache().stats();
    assert_eq!((stats.hits, stats.misses), (0, 0));

    assert!(harness.controller.cache().get(&0).is_some());
    assert!(harness.controller.cache().get(&999).is_none());
    let stats = harness.controller.cache().stats();
    assert_eq!((stats.hits, stats.misses), (1, 1));
}

#[tokio::test]
async fn removing_items_releases_their_images() {
    let mut harness = Harness::with_items(10);
    harness.settle_loads().await;
    harness.drain_commands();

    harness.controller.source_mut().items.drain(0..2);
    let now = harness.now();
    harness
        .controller
        .on_items_changed(ItemChange::Removed { index: 0, count: 2 }, now);

    assert_eq!(harness.controller.item_count(), 8);
    assert_eq!(harness.controller.cache().status(&0), EntryStatus::Absent);
    assert_eq!(harness.controller.cache().status(&1), EntryStatus::Absent);

    let commands = harness.drain_commands();
    assert!(commands.contains(&RenderCommand::ItemsRemoved { index: 0, count: 2 }));
    let disposed = commands
        .iter()
        .filter(|c| matches!(c, RenderCommand::Dispose(_)))
        .count();
    assert_eq!(disposed, 2);
}

#[tokio::test]
async fn removing_everything_resets_focus() {
    let mut harness = Harness::with_items(5);
    let now = harness.now();
    harness.controller.set_focus(4, now);
    harness.controller.source_mut().items.clear();
    harness
        .controller
        .on_items_changed(ItemChange::Removed { index: 0, count: 5 }, now);

    assert_eq!(harness.controller.item_count(), 0);
    assert_eq!(harness.controller.target_index(), None);
    assert_eq!(harness.controller.visible_range(), None);
    assert_eq!(harness.controller.index_at(Point::new(640.0, 360.0)), None);
}

#[tokio::test]
async fn failed_image_keeps_placeholder_until_it_reenters() {
    let mut source = TestSource::with_items(50);
    source.failing.insert(1);
    let mut harness = Harness::new(source, RuntimeConfig::default());
    harness.settle_loads().await;

    assert_eq!(harness.controller.cache().status(&1), EntryStatus::Failed);
    let slot = harness.controller.slots().get(1).unwrap();
    assert!(!slot.has_image());
    assert!(!slot.is_loading);
    assert!(harness.controller.slots().get(2).unwrap().has_image());

    // leave the window, fix the source, come back
    let now = harness.now();
    harness.controller.set_focus(40, now);
    harness.run_for(Duration::from_secs(4)).await;
    harness.settle_loads().await;
    assert_eq!(harness.controller.cache().status(&1), EntryStatus::Absent);

    harness.controller.source_mut().failing.clear();
    let now = harness.now();
    harness.controller.set_focus(0, now);
    harness.run_for(Duration::from_secs(4)).await;
    harness.settle_loads().await;
    assert!(harness.controller.slots().get(1).unwrap().has_image());
}

#[tokio::test]
async fn items_without_images_stay_placeholders() {
    let mut source = TestSource::with_items(5);
    source.without_image.insert(2);
    let mut harness = Harness::new(source, RuntimeConfig::default());
    harness.settle_loads().await;

    assert_eq!(harness.indices_with_images(), vec![0, 1, 3, 4]);
    assert_eq!(harness.controller.slots().get(2).unwrap().key, None);
}

#[tokio::test]
async fn lowering_capacity_evicts_images() {
    let mut harness = Harness::with_items(30);
    harness.settle_loads().await;
    assert_eq!(harness.controller.cache().len(), 13);

    let config = RuntimeConfig {
        cache_capacity: Some(5),
        ..RuntimeConfig::default()
    };
    let now = harness.now();
    harness.controller.set_config(config, now);
    assert_eq!(harness.controller.cache().len(), 5);
    assert_eq!(harness.indices_with_images().len(), 5);

    harness.run_for(Duration::from_millis(100)).await;
    harness.settle_loads().await;
    assert!(harness.controller.cache().len() <= 5);
    assert!(harness.indices_with_images().len() <= 5);
}

#[tokio::test]
async fn detach_releases_everything_and_attach_reloads() {
    let mut harness = Harness::with_items(10);
    harness.settle_loads().await;
    harness.drain_commands();

    harness.controller.detach();
    assert!(harness.controller.cache().is_empty());
    assert!(harness.indices_with_images().is_empty());
    assert!(harness.clock.is_idle());

    let commands = harness.drain_commands();
    let disposed = commands
        .iter()
        .filter(|c| matches!(c, RenderCommand::Dispose(_)))
        .count();
    assert_eq!(disposed, 10);
    assert_eq!(commands.last(), Some(&RenderCommand::Detach));

    harness.controller.attach();
    harness.settle_loads().await;
    assert_eq!(harness.indices_with_images().len(), 10);
}

#[tokio::test]
async fn viewport_change_moves_hit_geometry() {
    let mut harness = Harness::with_items(10);
    let now = harness.now();
    harness.controller.set_focus(5, now);
    harness.run_for(Duration::from_secs(3)).await;

    assert_eq!(harness.controller.index_at(Point::new(640.0, 360.0)), Some(5));
    harness
        .controller
        .set_viewport(Size::new(800.0, 600.0), now);
    assert_eq!(harness.controller.index_at(Point::new(400.0, 300.0)), Some(5));
    assert!(
        harness
            .drain_commands()
            .contains(&RenderCommand::SetViewport(Size::new(800.0, 600.0)))
    );
}
