//! Render-context half of the carousel
//!
//! Owns its own spring animator, a mirror of the per-index images and the
//! current drag visual. Everything arrives as [`RenderCommand`]s; nothing
//! here reads controller state.

use std::time::Duration;

use log::trace;
use tokio::sync::mpsc;

use crate::domains::carousel::animator::SpringAnimator;
use crate::domains::carousel::drag::DragVisual;
use crate::domains::carousel::host::RenderSurface;
use crate::domains::carousel::messages::RenderCommand;
use crate::domains::carousel::projection::{
    draw_order, project_at, visible_range, window_radius,
};
use crate::domains::carousel::types::{LayoutParams, Size};
use crate::domains::images::ImageHandle;
use crate::infra::constants::render;
use crate::infra::runtime_config::RuntimeConfig;

/// What one frame drew.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub quads_drawn: usize,
    /// Tiles drawn without an image.
    pub placeholders: usize,
    /// Another frame was requested.
    pub animating: bool,
}

pub struct RenderLoop<R: RenderSurface> {
    surface: R,
    commands: mpsc::UnboundedReceiver<RenderCommand>,
    animator: SpringAnimator,
    params: LayoutParams,
    viewport: Size,
    min_window_radius: usize,
    images: Vec<Option<ImageHandle>>,
    drag: Option<DragVisual>,
    closed: bool,
}

impl<R: RenderSurface> std::fmt::Debug for RenderLoop<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderLoop")
            .field("current_index", &self.animator.current())
            .field("items", &self.images.len())
            .field("viewport", &self.viewport)
            .field("dragging", &self.drag.is_some())
            .finish_non_exhaustive()
    }
}

impl<R: RenderSurface> RenderLoop<R> {
    pub fn new(
        surface: R,
        commands: mpsc::UnboundedReceiver<RenderCommand>,
        config: &RuntimeConfig,
    ) -> Self {
        Self {
            surface,
            commands,
            animator: SpringAnimator::new(config.spring_config()),
            params: LayoutParams::default(),
            viewport: Size::default(),
            min_window_radius: config.min_window_radius(),
            images: Vec::new(),
            drag: None,
            closed: false,
        }
    }

    pub fn surface(&self) -> &R {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut R {
        &mut self.surface
    }

    pub fn into_surface(self) -> R {
        self.surface
    }

    pub fn current_index(&self) -> f64 {
        self.animator.current()
    }

    pub fn item_count(&self) -> usize {
        self.images.len()
    }

    pub fn image_at(&self, index: usize) -> Option<&ImageHandle> {
        self.images.get(index).and_then(Option::as_ref)
    }

    /// Number of indices holding a real image.
    pub fn resident_images(&self) -> usize {
        self.images.iter().filter(|image| image.is_some()).count()
    }

    pub fn is_animating(&self) -> bool {
        self.animator.is_active() || self.drag.is_some()
    }

    /// The controller dropped its sender.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Apply every queued command. Returns how many were applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        loop {
            match self.commands.try_recv() {
                Ok(command) => {
                    self.apply(command);
                    applied += 1;
                }
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    self.closed = true;
                    break;
                }
            }
        }
        applied
    }

    pub fn apply(&mut self, command: RenderCommand) {
        match command {
            RenderCommand::SetTarget(target) => {
                self.animator.set_target(target);
            }
            RenderCommand::SnapTo(index) => self.animator.snap_to(index),
            RenderCommand::SetLayout(params) => self.params = params,
            RenderCommand::SetViewport(viewport) => self.viewport = viewport,
            RenderCommand::SetSpring(config) => self.animator.set_config(config),
            RenderCommand::SetMinWindowRadius(radius) => {
                self.min_window_radius = radius;
            }
            RenderCommand::ImageReady { index, handle } => {
                if let Some(slot) = self.images.get_mut(index) {
                    *slot = Some(handle);
                } else {
                    trace!("Image for {} arrived past the end of the strip", index);
                }
            }
            RenderCommand::ImageCleared { index } => {
                if let Some(slot) = self.images.get_mut(index) {
                    *slot = None;
                }
            }
            RenderCommand::Dispose(handle) => self.surface.release_image(&handle),
            RenderCommand::ItemsMoved { from, to } => {
                if from < self.images.len() && to < self.images.len() {
                    let image = self.images.remove(from);
                    self.images.insert(to, image);
                }
            }
            RenderCommand::ItemsInserted { index, count } => {
                let index = index.min(self.images.len());
                self.images
                    .splice(index..index, std::iter::repeat_n(None, count));
            }
            RenderCommand::ItemsRemoved { index, count } => {
                let start = index.min(self.images.len());
                let end = index.saturating_add(count).min(self.images.len());
                self.images.drain(start..end);
            }
            RenderCommand::ItemsReset { count } => {
                self.images = vec![None; count];
            }
            RenderCommand::DragVisual(visual) => self.drag = visual,
            RenderCommand::Detach => {
                self.images.iter_mut().for_each(|image| *image = None);
                self.drag = None;
                self.animator.reset();
            }
        }
    }

    /// Advance the animator by `dt` and draw one frame far-to-near, the
    /// dragged tile last.
    pub fn frame(&mut self, dt: Duration) -> FrameStats {
        self.pump();
        self.animator.tick(dt.as_secs_f64());

        let mut stats = FrameStats::default();
        let current = self.animator.current();
        let radius = window_radius(self.min_window_radius, self.viewport, &self.params);
        let Some(range) = visible_range(current, self.images.len(), radius) else {
            return stats;
        };
        if self.viewport.is_empty() {
            return stats;
        }

        let dragged = self.drag.map(|visual| visual.dragged_index());
        for index in draw_order(range, current) {
            if Some(index) == dragged {
                continue;
            }
            let position = self
                .drag
                .map_or(index as f64, |visual| visual.position_of(index));
            let quad = project_at(position, current, self.viewport, &self.params);
            let opacity = edge_fade(position, current, radius);
            if opacity <= 0.0 {
                continue;
            }
            let image = self.images.get(index).and_then(Option::as_ref);
            if image.is_none() {
                stats.placeholders += 1;
            }
            self.surface.draw_quad(&quad, image, opacity);
            stats.quads_drawn += 1;
        }

        if let Some(visual) = self.drag
            && let Some(index) = dragged
        {
            let quad = visual.dragged_quad(current, self.viewport, &self.params);
            let image = self.images.get(index).and_then(Option::as_ref);
            if image.is_none() {
                stats.placeholders += 1;
            }
            self.surface
                .draw_quad(&quad, image, render::DRAGGED_OPACITY);
            stats.quads_drawn += 1;
        }

        if self.is_animating() {
            self.surface.request_next_frame();
            stats.animating = true;
        }
        stats
    }

    /// Drive frames on a tokio interval until the controller drops its
    /// sender. Hands the surface back.
    pub async fn run(mut self, frame_interval: Duration) -> R {
        let mut ticker = tokio::time::interval(frame_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut last = tokio::time::Instant::now();
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.apply(command),
                    None => {
                        self.closed = true;
                        break;
                    }
                },
                now = ticker.tick() => {
                    let dt = now.saturating_duration_since(last);
                    last = now;
                    self.frame(dt);
                }
            }
        }
        self.surface
    }
}

/// Items in the outermost part of the window fade out.
fn edge_fade(position: f64, current: f64, radius: usize) -> f32 {
    let distance = (position - current).abs() as f32;
    let remaining = radius as f32 + 1.0 - distance;
    (remaining / render::EDGE_FADE_ITEMS).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::carousel::projection::ProjectedQuad;
    use crate::domains::images::RasterImage;

    #[derive(Default)]
    struct Recorder {
        draws: Vec<(ProjectedQuad, Option<u64>, f32)>,
        frame_requests: usize,
        released: Vec<u64>,
    }

    impl RenderSurface for Recorder {
        fn draw_quad(&mut self, quad: &ProjectedQuad, image: Option<&ImageHandle>, opacity: f32) {
            self.draws.push((*quad, image.map(ImageHandle::id), opacity));
        }

        fn request_next_frame(&mut self) {
            self.frame_requests += 1;
        }

        fn release_image(&mut self, image: &ImageHandle) {
            self.released.push(image.id());
        }
    }

    fn setup(count: usize) -> (RenderLoop<Recorder>, mpsc::UnboundedSender<RenderCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let render = RenderLoop::new(Recorder::default(), rx, &RuntimeConfig::default());
        tx.send(RenderCommand::SetViewport(Size::new(1280.0, 720.0)))
            .unwrap();
        tx.send(RenderCommand::ItemsReset { count }).unwrap();
        (render, tx)
    }

    #[test]
    fn draws_window_far_to_near_with_placeholders() {
        let (mut render, tx) = setup(5);
        let image = RasterImage::solid(2, 2, [255, 0, 0, 255]);
        tx.send(RenderCommand::ImageReady {
            index: 0,
            handle: image.clone(),
        })
        .unwrap();

        let stats = render.frame(Duration::from_millis(16));
        assert_eq!(stats.quads_drawn, 5);
        assert_eq!(stats.placeholders, 4);
        assert!(!stats.animating);

        // focus is 0: the farthest item paints first, the focused one last
        let draws = &render.surface().draws;
        assert_eq!(draws.last().unwrap().1, Some(image.id()));
        assert!(draws[0].0.depth < draws.last().unwrap().0.depth);
    }

    #[test]
    fn target_change_animates_and_requests_frames() {
        let (mut render, tx) = setup(10);
        tx.send(RenderCommand::SetTarget(4.0)).unwrap();
        let stats = render.frame(Duration::from_millis(16));
        assert!(stats.animating);
        assert!(render.current_index() > 0.0);

        for _ in 0..400 {
            render.frame(Duration::from_millis(16));
        }
        assert_eq!(render.current_index(), 4.0);
        let requests = render.surface().frame_requests;
        render.frame(Duration::from_millis(16));
        assert_eq!(render.surface().frame_requests, requests);
    }

    #[test]
    fn structural_commands_mirror_the_slots() {
        let (mut render, tx) = setup(4);
        let a = RasterImage::solid(1, 1, [1, 1, 1, 255]);
        let b = RasterImage::solid(1, 1, [2, 2, 2, 255]);
        tx.send(RenderCommand::ImageReady { index: 0, handle: a.clone() })
            .unwrap();
        tx.send(RenderCommand::ImageReady { index: 3, handle: b.clone() })
            .unwrap();
        tx.send(RenderCommand::ItemsMoved { from: 0, to: 2 }).unwrap();
        render.pump();
        assert_eq!(render.image_at(2), Some(&a));

        tx.send(RenderCommand::ItemsInserted { index: 1, count: 2 })
            .unwrap();
        tx.send(RenderCommand::ItemsRemoved { index: 0, count: 1 })
            .unwrap();
        render.pump();
        assert_eq!(render.item_count(), 5);
        assert_eq!(render.image_at(3), Some(&a));
        assert_eq!(render.image_at(4), Some(&b));

        tx.send(RenderCommand::ImageCleared { index: 4 }).unwrap();
        tx.send(RenderCommand::Dispose(b.clone())).unwrap();
        render.pump();
        assert_eq!(render.resident_images(), 1);
        assert_eq!(render.surface().released, vec![b.id()]);
    }

    #[test]
    fn detach_clears_images_and_drag() {
        let (mut render, tx) = setup(3);
        tx.send(RenderCommand::ImageReady {
            index: 1,
            handle: RasterImage::solid(1, 1, [0, 0, 0, 255]),
        })
        .unwrap();
        tx.send(RenderCommand::SetTarget(2.0)).unwrap();
        tx.send(RenderCommand::Detach).unwrap();
        render.pump();
        assert_eq!(render.resident_images(), 0);
        assert!(!render.is_animating());
        assert_eq!(render.current_index(), 0.0);

        drop(tx);
        render.pump();
        assert!(render.is_closed());
    }

    #[test]
    fn edge_items_fade() {
        assert_eq!(edge_fade(0.0, 0.0, 12), 1.0);
        assert_eq!(edge_fade(11.0, 0.0, 12), 1.0);
        assert_eq!(edge_fade(12.0, 0.0, 12), 0.5);
        assert_eq!(edge_fade(14.0, 0.0, 12), 0.0);
    }
}
