mod common;

use std::time::Duration;

use common::Harness;
use coverflow_core::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn assert_mirrors_source(harness: &Harness, step: usize) {
    assert_eq!(
        harness.slot_keys(),
        harness.source_keys(),
        "slots diverged from the source after step {step}"
    );
    for (index, slot) in harness.controller.slots().iter().enumerate() {
        assert_eq!(slot.index, index);
        if let Some(image) = &slot.image {
            // images follow their item
            assert_eq!(Some(u32::from(image.pixels()[0])), slot.key.map(|k| k & 0xff));
        }
    }
}

#[tokio::test]
async fn random_edits_keep_slots_and_source_in_lockstep() {
    let mut rng = StdRng::seed_from_u64(0x00c0_ffee);
    let mut harness = Harness::with_items(30);
    harness.settle_loads().await;
    let mut next_id = 1_000;
    let mut echoes = Vec::new();

    for step in 0..60 {
        let len = harness.controller.item_count();
        match rng.random_range(0..5) {
            // our own drag, near the focus so both tiles are on screen
            0 | 1 if len > 1 => {
                let center = harness.controller.target_index().unwrap_or(0);
                let lo = center.saturating_sub(2);
                let hi = (center + 2).min(len - 1);
                let from = rng.random_range(lo..=hi);
                let mut to = rng.random_range(lo..=hi);
                if to == from {
                    to = if from == hi { lo } else { hi };
                }
                let moves_before = harness.controller.source().moves.len();
                assert_eq!(harness.drag(from, to).await, PointerResult::Released);
                assert_eq!(harness.controller.source().moves.len(), moves_before + 1);
                // some hosts echo right away, some later, some never
                match rng.random_range(0..3) {
                    0 => {
                        let now = harness.now();
                        harness
                            .controller
                            .on_items_changed(ItemChange::Moved { from, to }, now);
                    }
                    1 => echoes.push((from, to)),
                    _ => {}
                }
            }
            2 if len > 1 => {
                let from = rng.random_range(0..len);
                let to = rng.random_range(0..len);
                harness.controller.source_mut().move_item(from, to);
                let now = harness.now();
                harness
                    .controller
                    .on_items_changed(ItemChange::Moved { from, to }, now);
            }
            3 => {
                let index = rng.random_range(0..=len);
                let count = rng.random_range(1..4);
                let ids: Vec<u32> = (0..count).map(|k| next_id + k).collect();
                next_id += count;
                harness
                    .controller
                    .source_mut()
                    .items
                    .splice(index..index, ids);
                let now = harness.now();
                harness.controller.on_items_changed(
                    ItemChange::Inserted {
                        index,
                        count: count as usize,
                    },
                    now,
                );
            }
            _ if len > 2 => {
                let index = rng.random_range(0..len);
                let count = rng.random_range(1..3).min(len - index);
                harness
                    .controller
                    .source_mut()
                    .items
                    .drain(index..index + count);
                let now = harness.now();
                harness
                    .controller
                    .on_items_changed(ItemChange::Removed { index, count }, now);
            }
            _ => {}
        }

        // long enough for the spring and the drop animation to rest
        harness.run_for(Duration::from_secs(4)).await;
        harness.settle_loads().await;
        assert_mirrors_source(&harness, step);

        // late echoes arrive after other edits; they must not corrupt order
        if let Some((from, to)) = echoes.pop() {
            let now = harness.now();
            let before = harness.slot_keys();
            harness
                .controller
                .on_items_changed(ItemChange::Moved { from, to }, now);
            if harness.slot_keys() != before {
                // treated as a foreign move: the source must have moved too
                harness.controller.source_mut().move_item(from, to);
            }
            assert_mirrors_source(&harness, step);
        }
    }
}

#[tokio::test]
async fn drop_onto_itself_is_not_a_reorder() {
    let mut harness = Harness::with_items(5);
    let press = harness.tile_center(1);
    let now = harness.now();
    harness.controller.pointer_down(press, now);
    harness.run_for(Duration::from_millis(300)).await;
    let now = harness.now();
    harness.controller.pointer_move(press, now);
    assert_eq!(
        harness.controller.pointer_up(press, now),
        PointerResult::Released
    );

    assert!(harness.controller.source().moves.is_empty());
    assert_eq!(harness.slot_keys(), harness.source_keys());
}
