//! Scripted carousel session on a virtual clock.
//!
//! Timers come from a [`ManualScheduler`] so a multi-second fling runs in
//! milliseconds; image loads and decodes still run on the real runtime.

use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use coverflow_core::prelude::*;

use crate::library::PosterLibrary;
use crate::surface::TallySurface;

const SETTLE_POLLS: usize = 10_000;

/// Counters gathered while the script runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct SessionReport {
    pub peak_resident: usize,
    pub peak_loading: usize,
    pub reorders: usize,
}

#[derive(Debug)]
pub struct Session {
    controller: CarouselController<PosterLibrary>,
    render: RenderLoop<TallySurface>,
    clock: ManualScheduler,
    frame: Duration,
    report: SessionReport,
}

impl Session {
    /// Must be called from inside a tokio runtime.
    pub fn new(library: PosterLibrary, options: ControllerOptions) -> Self {
        let clock = ManualScheduler::new();
        let frame = options.config.frame_interval();
        let render_config = options.config.clone();
        let (mut controller, commands) = CarouselController::new(
            library,
            options,
            Arc::new(RasterDecoder),
            Box::new(clock.clone()),
            tokio::runtime::Handle::current(),
        );
        controller.set_reorder_sink(|from, to| log::info!("reordered {from} -> {to}"));
        controller.set_selection_sink(|index| log::info!("selected {index}"));

        let render = RenderLoop::new(TallySurface::default(), commands, &render_config);
        Self {
            controller,
            render,
            clock,
            frame,
            report: SessionReport::default(),
        }
    }

    pub fn controller(&self) -> &CarouselController<PosterLibrary> {
        &self.controller
    }

    pub fn surface(&self) -> &TallySurface {
        self.render.surface()
    }

    pub fn report(&self) -> SessionReport {
        self.report
    }

    /// Run timers and render frames for `span` of virtual time.
    pub async fn advance(&mut self, span: Duration) {
        let end = self.clock.now() + span;
        while self.clock.now() < end {
            let horizon = (self.clock.now() + self.frame).min(end);
            while let Some((timer, at)) = self.clock.pop_due(horizon) {
                self.controller.fire(timer, at);
            }
            self.clock.advance_to(horizon);
            tokio::task::yield_now().await;
            self.controller.drain_cache_events();
            self.observe();

            self.render.frame(self.frame);
            self.render.surface_mut().frames += 1;
        }
    }

    /// Keep running frames until the spring, the timers and the loads are
    /// all quiet.
    pub async fn settle(&mut self, limit: Duration) -> anyhow::Result<()> {
        let end = self.clock.now() + limit;
        while self.clock.now() < end {
            if self.clock.is_idle() && !self.render.is_animating() {
                return self.settle_loads().await;
            }
            self.advance(self.frame).await;
        }
        bail!("session did not settle within {:?}", limit)
    }

    async fn settle_loads(&mut self) -> anyhow::Result<()> {
        for _ in 0..SETTLE_POLLS {
            self.controller.drain_cache_events();
            if self.controller.cache().loading() == 0 {
                // one more frame so the render side applies the last images
                self.render.frame(self.frame);
                return Ok(());
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        bail!(
            "{} image loads still pending",
            self.controller.cache().loading()
        )
    }

    pub fn fling_to(&mut self, index: usize) {
        let now = self.clock.now();
        log::info!(
            "fling {:.0} -> {}",
            self.controller.current_index(),
            index
        );
        self.controller.set_focus(index, now);
    }

    /// Long-press the tile at `from`, drag it onto `to` and release.
    pub async fn reorder(&mut self, from: usize, to: usize) -> anyhow::Result<()> {
        let Some(press) = self.tile_center(from) else {
            bail!("tile {from} is not on screen");
        };
        let now = self.clock.now();
        self.controller.pointer_down(press, now);
        let hold = self.controller.config().long_press() + self.frame;
        self.advance(hold).await;
        if !matches!(self.controller.drag_state(), DragState::Dragging { .. }) {
            bail!("long press on {from} did not start a drag");
        }

        let Some(target) = self.tile_center(to) else {
            bail!("tile {to} is not on screen");
        };
        let now = self.clock.now();
        self.controller.pointer_move(target, now);
        self.advance(self.frame).await;
        let now = self.clock.now();
        self.controller.pointer_up(target, now);
        self.report.reorders += 1;
        Ok(())
    }

    fn tile_center(&self, index: usize) -> Option<Point> {
        let viewport = self.controller.viewport();
        let center = project(
            index,
            self.controller.current_index(),
            viewport,
            self.controller.layout(),
        )
        .center();
        let on_screen = (0.0..=viewport.width).contains(&center.x)
            && (0.0..=viewport.height).contains(&center.y);
        on_screen.then_some(center)
    }

    fn observe(&mut self) {
        let cache = self.controller.cache();
        self.report.peak_resident = self.report.peak_resident.max(cache.len());
        self.report.peak_loading = self.report.peak_loading.max(cache.loading());
    }

    /// Tear down the controller side, handing every image back.
    pub fn detach(&mut self) {
        self.controller.detach();
        self.render.pump();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(items: usize) -> Session {
        let options = ControllerOptions {
            viewport: Size::new(1280.0, 720.0),
            ..ControllerOptions::default()
        };
        Session::new(PosterLibrary::generate(items, 1), options)
    }

    #[tokio::test]
    async fn fling_then_reorder_settles_with_posters_drawn() {
        let mut session = session(120);
        session.settle(Duration::from_secs(10)).await.unwrap();

        session.fling_to(100);
        session.settle(Duration::from_secs(10)).await.unwrap();
        assert_eq!(session.controller().current_index(), 100.0);

        let before: Vec<u64> = session.controller().source().ids().collect();
        session.reorder(100, 102).await.unwrap();
        session.settle(Duration::from_secs(10)).await.unwrap();

        let after: Vec<u64> = session.controller().source().ids().collect();
        assert_eq!(after[102], before[100]);
        assert_eq!(after[100], before[101]);
        assert_eq!(session.report().reorders, 1);

        let drawn = session.surface().quads;
        let placeholders = session.surface().placeholders;
        assert!(drawn > 0);
        assert!(placeholders < drawn);
    }

    #[tokio::test]
    async fn offscreen_reorder_is_refused() {
        let mut session = session(200);
        session.settle(Duration::from_secs(10)).await.unwrap();
        assert!(session.reorder(150, 151).await.is_err());
        assert_eq!(session.report().reorders, 0);
    }
}
