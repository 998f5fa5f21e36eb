//! Test harness for driving a carousel controller on a virtual clock
//!
//! Integration tests build a [`Harness`] inside a tokio test: the controller
//! gets a [`ManualScheduler`], image loads run on the test runtime and the
//! render commands are collected for assertions.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use coverflow_core::prelude::*;
use futures::FutureExt;
use tokio::sync::mpsc;

/// Ordered list of item ids. The id doubles as the image key.
#[derive(Debug, Default)]
pub struct TestSource {
    pub items: Vec<u32>,
    pub failing: HashSet<u32>,
    pub without_image: HashSet<u32>,
    pub moves: Vec<(usize, usize)>,
}

impl TestSource {
    pub fn with_items(count: u32) -> Self {
        Self {
            items: (0..count).collect(),
            ..Self::default()
        }
    }
}

impl ItemSource for TestSource {
    type Key = u32;

    fn len(&self) -> usize {
        self.items.len()
    }

    fn image_key(&self, index: usize) -> Option<u32> {
        let id = *self.items.get(index)?;
        (!self.without_image.contains(&id)).then_some(id)
    }

    fn payload(&self, index: usize) -> Option<PayloadFuture> {
        let id = *self.items.get(index)?;
        if self.without_image.contains(&id) {
            return None;
        }
        let fails = self.failing.contains(&id);
        Some(
            async move {
                if fails {
                    Err(ImageError::Payload(format!("item {id} unavailable")))
                } else {
                    Ok(id.to_le_bytes().to_vec())
                }
            }
            .boxed(),
        )
    }

    fn move_item(&mut self, from: usize, to: usize) {
        let item = self.items.remove(from);
        self.items.insert(to, item);
        self.moves.push((from, to));
    }
}

/// 1x1 image whose red channel is the low byte of the item id.
pub fn test_decoder() -> Arc<dyn ImageDecoder> {
    Arc::new(|payload: &[u8]| {
        let Some(first) = payload.first() else {
            return Err(ImageError::Decode("empty payload".to_string()));
        };
        Ok(RasterImage::solid(1, 1, [*first, 0, 0, 255]))
    })
}

pub const VIEWPORT: Size = Size::new(1280.0, 720.0);

pub struct Harness {
    pub controller: CarouselController<TestSource>,
    pub commands: mpsc::UnboundedReceiver<RenderCommand>,
    pub clock: ManualScheduler,
}

impl Harness {
    /// Must be called from inside a tokio runtime.
    pub fn new(source: TestSource, config: RuntimeConfig) -> Self {
        let clock = ManualScheduler::new();
        let options = ControllerOptions {
            config,
            layout: LayoutParams::default(),
            viewport: VIEWPORT,
        };
        let (controller, commands) = CarouselController::new(
            source,
            options,
            test_decoder(),
            Box::new(clock.clone()),
            tokio::runtime::Handle::current(),
        );
        Self {
            controller,
            commands,
            clock,
        }
    }

    pub fn with_items(count: u32) -> Self {
        Self::new(TestSource::with_items(count), RuntimeConfig::default())
    }

    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    /// Fire every timer due within `duration`, letting background loads make
    /// progress between timers. `observe` runs after each timer.
    pub async fn run_for_observing(
        &mut self,
        duration: Duration,
        mut observe: impl FnMut(&CarouselController<TestSource>),
    ) {
        let horizon = self.clock.now() + duration;
        while let Some((timer, at)) = self.clock.pop_due(horizon) {
            self.controller.fire(timer, at);
            tokio::task::yield_now().await;
            self.controller.drain_cache_events();
            observe(&self.controller);
        }
        self.clock.advance_to(horizon);
    }

    pub async fn run_for(&mut self, duration: Duration) {
        self.run_for_observing(duration, |_| {}).await;
    }

    /// Run timers until nothing is pending (or `limit` passes).
    pub async fn run_until_idle(&mut self, limit: Duration) {
        let deadline = self.clock.now() + limit;
        while !self.clock.is_idle() && self.clock.now() < deadline {
            self.run_for(Duration::from_millis(16)).await;
        }
    }

    /// Wait for in-flight loads to finish and apply their events.
    pub async fn settle_loads(&mut self) {
        for _ in 0..5_000 {
            self.controller.drain_cache_events();
            if self.controller.cache().loading() == 0 {
                tokio::time::sleep(Duration::from_millis(2)).await;
                self.controller.drain_cache_events();
                return;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        panic!("background loads did not settle");
    }

    pub fn drain_commands(&mut self) -> Vec<RenderCommand> {
        let mut out = Vec::new();
        while let Ok(command) = self.commands.try_recv() {
            out.push(command);
        }
        out
    }

    /// Screen position of the tile at `index` for the current focus.
    pub fn tile_center(&self, index: usize) -> Point {
        project(
            index,
            self.controller.current_index(),
            self.controller.viewport(),
            self.controller.layout(),
        )
        .center()
    }

    /// Long-press `from`, drag onto `to` and release. Leaves the drop
    /// animation running.
    pub async fn drag(&mut self, from: usize, to: usize) -> PointerResult {
        let press = self.tile_center(from);
        let now = self.now();
        self.controller.pointer_down(press, now);
        self.run_for(Duration::from_millis(300)).await;

        let target = self.tile_center(to);
        let now = self.now();
        self.controller.pointer_move(target, now);
        self.controller.pointer_up(target, now)
    }

    /// Slot keys in order.
    pub fn slot_keys(&self) -> Vec<Option<u32>> {
        self.controller.slots().iter().map(|slot| slot.key).collect()
    }

    /// Source ids in order, as slot keys.
    pub fn source_keys(&self) -> Vec<Option<u32>> {
        let source = self.controller.source();
        (0..source.len()).map(|i| source.image_key(i)).collect()
    }

    /// Indices whose slot holds a real image.
    pub fn indices_with_images(&self) -> Vec<usize> {
        self.controller
            .slots()
            .iter()
            .filter(|slot| slot.has_image())
            .map(|slot| slot.index)
            .collect()
    }
}
