//! Carousel controller
//!
//! Lives on the interaction context and owns every piece of mutable carousel
//! state: the layout-query spring, slots, the image cache handle, the
//! virtualization window, hit-testing and the drag machine. It never sleeps;
//! timers go through the injected [`Scheduler`] and come back via
//! [`CarouselController::fire`]. The render loop is fed exclusively through
//! [`RenderCommand`]s.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, error, trace};
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use super::animator::SpringAnimator;
use super::drag::{DragMachine, DragOutcome, DragState};
use super::hit_test::HitTester;
use super::host::{ItemChange, ItemSource, ReorderSink, SelectionSink};
use super::messages::RenderCommand;
use super::projection::{center_index, visible_range, window_radius};
use super::slots::SlotTable;
use super::types::{LayoutParams, Point, Size, VisibleRange};
use super::window::WindowManager;
use crate::domains::images::{CacheEvent, EntryStatus, ImageCache, ImageDecoder, ImageHandle};
use crate::error::CarouselError;
use crate::infra::constants::hit_test;
use crate::infra::runtime_config::RuntimeConfig;
use crate::infra::scheduler::{Scheduler, TimerKind};

// Moves awaiting their echo; oldest dropped first.
const MAX_PENDING_ECHOES: usize = 32;

/// How the host should treat the pointer after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerResult {
    Ignored,
    Handled,
    /// Capture the pointer; a drag or pan is in progress.
    Captured,
    /// Release pointer capture.
    Released,
}

/// Construction-time settings.
#[derive(Debug, Clone, Default)]
pub struct ControllerOptions {
    pub config: RuntimeConfig,
    pub layout: LayoutParams,
    pub viewport: Size,
}

#[derive(Debug, Clone, Copy)]
struct PanState {
    origin: Point,
    origin_index: f64,
}

pub struct CarouselController<S: ItemSource> {
    source: S,
    config: RuntimeConfig,
    params: LayoutParams,
    viewport: Size,
    animator: SpringAnimator,
    slots: SlotTable<S::Key>,
    cache: ImageCache<S::Key>,
    cache_events: mpsc::UnboundedReceiver<CacheEvent<S::Key>>,
    window: WindowManager<S::Key>,
    hit_tester: HitTester,
    drag: DragMachine,
    pan: Option<PanState>,
    scheduler: Box<dyn Scheduler>,
    render_tx: mpsc::UnboundedSender<RenderCommand>,
    reorder_sink: Option<Box<dyn ReorderSink>>,
    selection_sink: Option<Box<dyn SelectionSink>>,
    // Moves we applied to the source ourselves; their notifications are echoes.
    pending_echoes: VecDeque<(usize, usize)>,
    settle_selection: Option<usize>,
    reported_center: Option<usize>,
    last_frame: Option<Instant>,
    frame_armed: bool,
    auto_scroll_armed: bool,
}

impl<S: ItemSource> std::fmt::Debug for CarouselController<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CarouselController")
            .field("items", &self.slots.len())
            .field("current_index", &self.animator.current())
            .field("target_index", &self.animator.target())
            .field("viewport", &self.viewport)
            .field("drag", self.drag.state())
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl<S: ItemSource> CarouselController<S> {
    /// Build a controller and the command stream for its render loop.
    pub fn new(
        source: S,
        options: ControllerOptions,
        decoder: Arc<dyn ImageDecoder>,
        scheduler: Box<dyn Scheduler>,
        runtime: Handle,
    ) -> (Self, mpsc::UnboundedReceiver<RenderCommand>) {
        let ControllerOptions {
            mut config,
            layout,
            viewport,
        } = options;
        config.take_dirty();

        let (render_tx, render_rx) = mpsc::unbounded_channel();
        let (cache, cache_events) = ImageCache::new(
            config.cache_capacity(),
            config.max_concurrent_loads(),
            decoder,
            runtime,
        );

        let mut controller = Self {
            animator: SpringAnimator::new(config.spring_config()),
            drag: DragMachine::new(config.drag_config()),
            window: WindowManager::new(config.debounce()),
            slots: SlotTable::new(),
            hit_tester: HitTester::new(),
            pan: None,
            scheduler,
            render_tx,
            reorder_sink: None,
            selection_sink: None,
            pending_echoes: VecDeque::new(),
            settle_selection: None,
            reported_center: None,
            last_frame: None,
            frame_armed: false,
            auto_scroll_armed: false,
            source,
            config,
            params: layout,
            viewport,
            cache,
            cache_events,
        };

        controller.send(RenderCommand::SetSpring(controller.config.spring_config()));
        controller.send(RenderCommand::SetMinWindowRadius(
            controller.config.min_window_radius(),
        ));
        controller.send(RenderCommand::SetLayout(controller.params));
        controller.send(RenderCommand::SetViewport(controller.viewport));
        controller.resync();
        (controller, render_rx)
    }

    pub fn set_reorder_sink(&mut self, sink: impl ReorderSink + 'static) {
        self.reorder_sink = Some(Box::new(sink));
    }

    pub fn set_selection_sink(&mut self, sink: impl SelectionSink + 'static) {
        self.selection_sink = Some(Box::new(sink));
    }

    // ========== ACCESSORS ==========

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Mutate the source directly; report the change through
    /// [`Self::on_items_changed`] afterwards.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn slots(&self) -> &SlotTable<S::Key> {
        &self.slots
    }

    pub fn cache(&self) -> &ImageCache<S::Key> {
        &self.cache
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn layout(&self) -> &LayoutParams {
        &self.params
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn drag_state(&self) -> &DragState {
        self.drag.state()
    }

    pub fn item_count(&self) -> usize {
        self.slots.len()
    }

    pub fn current_index(&self) -> f64 {
        self.animator.current()
    }

    /// Rounded selection the spring is heading to.
    pub fn target_index(&self) -> Option<usize> {
        center_index(self.animator.target(), self.slots.len())
    }

    pub fn is_animating(&self) -> bool {
        self.animator.is_active() || !self.drag.is_idle()
    }

    /// Effective residency radius for the current viewport and layout.
    pub fn window_radius(&self) -> usize {
        window_radius(self.config.min_window_radius(), self.viewport, &self.params)
    }

    pub fn visible_range(&self) -> Option<VisibleRange> {
        visible_range(self.animator.current(), self.slots.len(), self.window_radius())
    }

    /// Item under `point` for the geometry currently on screen.
    pub fn index_at(&mut self, point: Point) -> Option<usize> {
        let radius = self.window_radius();
        self.hit_tester.index_at(
            point,
            self.viewport,
            self.animator.current(),
            self.slots.len(),
            &self.params,
            radius,
        )
    }

    // ========== FOCUS ==========

    /// Animate toward `index` (clamped to the strip).
    pub fn set_focus(&mut self, index: usize, now: Instant) {
        let Some(last) = self.slots.len().checked_sub(1) else {
            return;
        };
        self.retarget(index.min(last) as f64, now);
    }

    /// Move the selection by `delta` items from the current target.
    pub fn step(&mut self, delta: isize, now: Instant) {
        let Some(target) = self.target_index() else {
            return;
        };
        let next = target.saturating_add_signed(delta);
        self.set_focus(next, now);
    }

    fn retarget(&mut self, target: f64, now: Instant) {
        let max = self.slots.len().saturating_sub(1) as f64;
        let target = target.clamp(0.0, max);
        if self.animator.set_target(target) {
            trace!("Selection animator woke toward {:.3}", target);
        }
        self.send(RenderCommand::SetTarget(target));
        if self.animator.is_active() {
            self.ensure_frames(now);
        }
    }

    // ========== LAYOUT ==========

    pub fn set_viewport(&mut self, viewport: Size, now: Instant) {
        if viewport == self.viewport {
            return;
        }
        self.viewport = viewport;
        self.hit_tester.invalidate();
        self.send(RenderCommand::SetViewport(viewport));
        self.window.mark_stale();
        self.report_focus(now);
    }

    pub fn set_layout(&mut self, params: LayoutParams, now: Instant) {
        if params == self.params {
            return;
        }
        self.params = params;
        self.hit_tester.invalidate();
        self.send(RenderCommand::SetLayout(params));
        self.window.mark_stale();
        self.report_focus(now);
    }

    /// Apply new runtime tuning. Both springs and the cache bound follow.
    pub fn set_config(&mut self, mut config: RuntimeConfig, now: Instant) {
        config.take_dirty();
        if config == self.config {
            return;
        }
        if config.max_concurrent_loads() != self.config.max_concurrent_loads() {
            debug!("max_concurrent_loads changes apply to new controllers only");
        }
        self.config = config;

        let spring = self.config.spring_config();
        self.animator.set_config(spring);
        self.send(RenderCommand::SetSpring(spring));
        self.send(RenderCommand::SetMinWindowRadius(
            self.config.min_window_radius(),
        ));
        self.drag.set_config(self.config.drag_config());
        self.window.set_debounce(self.config.debounce());

        let evicted = self.cache.set_capacity(self.config.cache_capacity());
        if evicted > 0 {
            debug!("Cache capacity lowered, evicted {} images", evicted);
        }
        self.drain_cache_events();
        self.window.mark_stale();
        self.report_focus(now);
    }

    // ========== ITEMS ==========

    /// Mirror a structural change the host already applied to the source.
    pub fn on_items_changed(&mut self, change: ItemChange, now: Instant) {
        match change {
            ItemChange::Moved { from, to } => {
                if self.take_echo(from, to) {
                    trace!("Ignoring echo of our own move {} -> {}", from, to);
                    return;
                }
                if let Err(err) = self.slots.move_item(from, to) {
                    error!("Move notification rejected: {}", err);
                    self.resync();
                    return;
                }
                self.send(RenderCommand::ItemsMoved { from, to });
            }
            ItemChange::Inserted { index, count } => {
                let index = index.min(self.slots.len());
                // Never read past the source; a bad count shows up as a
                // length mismatch below.
                let end = index
                    .saturating_add(count)
                    .min(self.source.len().max(index));
                let count = end - index;
                let keys: Vec<_> =
                    (index..end).map(|i| self.source.image_key(i)).collect();
                self.slots.insert(index, keys);
                self.send(RenderCommand::ItemsInserted { index, count });
            }
            ItemChange::Removed { index, count } => {
                let removed = self.slots.remove(index, count);
                if !removed.is_empty() {
                    self.send(RenderCommand::ItemsRemoved {
                        index,
                        count: removed.len(),
                    });
                }
                for slot in removed {
                    if let Some(key) = slot.key
                        && self.slots.indices_of(&key).is_empty()
                    {
                        self.cache.remove(&key);
                    }
                }
            }
            ItemChange::Reset => {
                self.resync();
                return;
            }
        }

        if !self.verify_sync() {
            return;
        }
        self.clamp_focus(now);
        self.drain_cache_events();
        self.refresh_window();
    }

    /// A move we committed ourselves, reported back by the source. Only
    /// counts when the slots already agree with the source over the moved
    /// span, so a host that never echoes cannot swallow a later real move.
    fn take_echo(&mut self, from: usize, to: usize) -> bool {
        let Some(position) = self.pending_echoes.iter().position(|m| *m == (from, to)) else {
            return false;
        };
        self.pending_echoes.remove(position);
        (from.min(to)..=from.max(to)).all(|index| {
            self.slots.get(index).map(|slot| slot.key.clone()) == Some(self.source.image_key(index))
        })
    }

    /// Slots and source must agree on length; on mismatch rebuild from the
    /// source.
    fn verify_sync(&mut self) -> bool {
        let source_len = self.source.len();
        if self.slots.len() == source_len {
            return true;
        }
        let err = CarouselError::IndexDesync {
            slots: self.slots.len(),
            source_len,
        };
        error!("{}; resyncing from source", err);
        self.resync();
        false
    }

    fn resync(&mut self) {
        let keys: Vec<_> = (0..self.source.len())
            .map(|i| self.source.image_key(i))
            .collect();
        self.slots.reset(keys);
        self.pending_echoes.clear();
        self.send(RenderCommand::ItemsReset {
            count: self.slots.len(),
        });

        match self.slots.len().checked_sub(1) {
            None => {
                self.animator.reset();
                self.send(RenderCommand::SnapTo(0.0));
            }
            Some(last) if self.animator.target() > last as f64 => {
                self.animator.snap_to(last as f64);
                self.send(RenderCommand::SnapTo(last as f64));
            }
            Some(_) => {}
        }

        self.drain_cache_events();
        self.window.mark_stale();
        self.refresh_window();
    }

    fn clamp_focus(&mut self, now: Instant) {
        match self.slots.len().checked_sub(1) {
            None => {
                self.animator.reset();
                self.send(RenderCommand::SnapTo(0.0));
            }
            Some(last) if self.animator.target() > last as f64 => {
                self.retarget(last as f64, now);
            }
            Some(_) => {}
        }
    }

    // ========== VIRTUALIZATION ==========

    /// Report the rounded current index to the window manager; arms the
    /// debounce timer when it moved.
    fn report_focus(&mut self, now: Instant) {
        let Some(center) = center_index(self.animator.current(), self.slots.len()) else {
            return;
        };
        self.reported_center = Some(center);
        if let Some(deadline) = self.window.on_focus_changed(center, now) {
            self.scheduler.schedule(
                TimerKind::VirtualizationDebounce,
                deadline.saturating_duration_since(now),
            );
        }
    }

    /// Recompute the window around the current focus immediately.
    fn refresh_window(&mut self) {
        self.window.flush();
        self.scheduler.cancel(TimerKind::VirtualizationDebounce);
        let center = center_index(self.animator.current(), self.slots.len()).unwrap_or(0);
        self.reported_center = Some(center);
        self.recompute_window(center);
    }

    fn recompute_window(&mut self, center: usize) {
        let radius = self.window_radius();
        let slots = &self.slots;
        let plan = self.window.plan(center, slots.len(), radius, |index| {
            slots.get(index).and_then(|slot| slot.key.clone())
        });
        let token = self.window.begin_generation();
        trace!(
            "Window around {} (radius {}): {} to load, {} to evict",
            center,
            radius,
            plan.load.len(),
            plan.evict.len()
        );

        for key in &plan.evict {
            for index in self.slots.indices_of(key) {
                self.slots.set_loading(index, false);
            }
            self.cache.remove(key);
        }

        for index in plan.load {
            let Some(key) = self.slots.get(index).and_then(|slot| slot.key.clone()) else {
                continue;
            };
            match self.cache.status(&key) {
                EntryStatus::Ready => {
                    self.cache.touch(&key);
                    if let Some(handle) = self.cache.peek(&key) {
                        self.install(index, handle);
                    }
                }
                // Stays on the placeholder until it leaves and re-enters.
                EntryStatus::Failed => {}
                EntryStatus::Absent | EntryStatus::Loading => {
                    let source = &self.source;
                    if self.cache.request(key, &token, || source.payload(index)) {
                        self.slots.set_loading(index, true);
                    }
                }
            }
        }

        // Evictions of the keys we dropped arrive as events; apply them now
        // so the render side releases the handles promptly.
        self.drain_cache_events();
    }

    fn install(&mut self, index: usize, handle: ImageHandle) {
        let unchanged = self
            .slots
            .get(index)
            .and_then(|slot| slot.image.as_ref())
            .is_some_and(|image| *image == handle);
        if unchanged {
            return;
        }
        if self.slots.set_image(index, handle.clone()) {
            self.send(RenderCommand::ImageReady { index, handle });
        }
    }

    /// Apply one cache notification to the slots and the render side.
    pub fn apply_cache_event(&mut self, event: CacheEvent<S::Key>) {
        match event {
            CacheEvent::Ready { key } => {
                let Some(handle) = self.cache.peek(&key) else {
                    trace!("{:?} evicted before its ready event was applied", key);
                    return;
                };
                for index in self.slots.indices_of(&key) {
                    self.install(index, handle.clone());
                }
            }
            CacheEvent::Failed { key, error } => {
                debug!("Keeping placeholder for {:?}: {}", key, error);
                for index in self.slots.indices_of(&key) {
                    self.slots.set_loading(index, false);
                }
            }
            CacheEvent::Evicted { key, handle } => {
                for index in self.slots.indices_of(&key) {
                    let holds = self
                        .slots
                        .get(index)
                        .and_then(|slot| slot.image.as_ref())
                        .is_some_and(|image| *image == handle);
                    if holds && self.slots.clear_image(index) {
                        self.send(RenderCommand::ImageCleared { index });
                    }
                }
                self.send(RenderCommand::Dispose(handle));
            }
        }
    }

    /// Apply every cache notification already queued. Returns how many.
    pub fn drain_cache_events(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.cache_events.try_recv() {
            self.apply_cache_event(event);
            applied += 1;
        }
        applied
    }

    /// Wait for the next cache notification. Pass it to
    /// [`Self::apply_cache_event`].
    pub async fn next_cache_event(&mut self) -> Option<CacheEvent<S::Key>> {
        self.cache_events.recv().await
    }

    // ========== POINTER ==========

    pub fn pointer_down(&mut self, point: Point, now: Instant) -> PointerResult {
        if self.slots.is_empty() {
            return PointerResult::Ignored;
        }
        let was_dropping = self.drag.is_dropping();
        match self.drag.pointer_down(point, now) {
            DragOutcome::ArmLongPress { after } => {
                self.scheduler.schedule(TimerKind::LongPress, after);
                if was_dropping {
                    self.send(RenderCommand::DragVisual(None));
                }
                PointerResult::Handled
            }
            _ => PointerResult::Ignored,
        }
    }

    pub fn pointer_move(&mut self, point: Point, now: Instant) -> PointerResult {
        if let Some(pan) = self.pan {
            self.apply_pan(pan, point, now);
            return PointerResult::Handled;
        }

        let current = self.animator.current();
        let item_count = self.slots.len();
        let radius = self.window_radius();
        let viewport = self.viewport;
        let params = self.params;
        let hit_tester = &mut self.hit_tester;
        let outcome = self.drag.pointer_move(point, now, |p| {
            hit_tester.index_at(p, viewport, current, item_count, &params, radius)
        });

        match outcome {
            DragOutcome::BeginPan { start } => {
                self.scheduler.cancel(TimerKind::LongPress);
                let pan = PanState {
                    origin: start,
                    origin_index: self.animator.target(),
                };
                debug!("Pan started at index {:.2}", pan.origin_index);
                self.pan = Some(pan);
                self.settle_selection = None;
                self.apply_pan(pan, point, now);
                PointerResult::Captured
            }
            DragOutcome::Updated => {
                self.send(RenderCommand::DragVisual(self.drag.visual()));
                self.ensure_frames(now);
                self.ensure_auto_scroll(point);
                PointerResult::Handled
            }
            _ if self.drag.is_idle() => PointerResult::Ignored,
            _ => PointerResult::Handled,
        }
    }

    fn apply_pan(&mut self, pan: PanState, point: Point, now: Instant) {
        let stride = self.params.scaled_item_width() * hit_test::FALLBACK_STRIDE_FACTOR;
        if stride <= 0.0 {
            return;
        }
        let dx = point.x - pan.origin.x;
        // Dragging right pulls earlier items into the center.
        let target = pan.origin_index - f64::from(dx / stride);
        self.retarget(target, now);
    }

    pub fn pointer_up(&mut self, point: Point, now: Instant) -> PointerResult {
        if self.pan.take().is_some() {
            self.settle_pan(now);
            return PointerResult::Released;
        }

        match self.drag.pointer_up(point, now) {
            DragOutcome::Tap { point } => {
                self.scheduler.cancel(TimerKind::LongPress);
                if let Some(index) = self.index_at(point) {
                    debug!("Tap selected item {}", index);
                    self.set_focus(index, now);
                    if let Some(sink) = self.selection_sink.as_mut() {
                        sink.selected(index);
                    }
                }
                PointerResult::Handled
            }
            DragOutcome::Released { source, target } => {
                self.finish_drag(source, target, now);
                PointerResult::Released
            }
            _ => PointerResult::Ignored,
        }
    }

    /// The platform revoked pointer capture.
    pub fn pointer_capture_lost(&mut self, now: Instant) -> PointerResult {
        if self.pan.take().is_some() {
            self.settle_pan(now);
            return PointerResult::Released;
        }

        match self.drag.capture_lost(now) {
            DragOutcome::Cancelled => {
                self.scheduler.cancel(TimerKind::LongPress);
                PointerResult::Handled
            }
            DragOutcome::Released { source, target } => {
                self.finish_drag(source, target, now);
                PointerResult::Released
            }
            _ => PointerResult::Ignored,
        }
    }

    fn settle_pan(&mut self, now: Instant) {
        let Some(index) = self.target_index() else {
            return;
        };
        debug!("Pan released, settling on {}", index);
        self.retarget(index as f64, now);
        if self.animator.is_active() {
            self.settle_selection = Some(index);
        } else if let Some(sink) = self.selection_sink.as_mut() {
            sink.selected(index);
        }
    }

    fn finish_drag(&mut self, source: usize, target: usize, now: Instant) {
        self.scheduler.cancel(TimerKind::AutoScroll);
        self.auto_scroll_armed = false;

        let item_count = self.slots.len();
        if source != target && item_count > 1 && source < item_count && target < item_count {
            self.commit_move(source, target);
        }
        if let Some(last) = self.slots.len().checked_sub(1) {
            self.retarget(target.min(last) as f64, now);
        }
        self.send(RenderCommand::DragVisual(self.drag.visual()));
        self.ensure_frames(now);
    }

    fn commit_move(&mut self, from: usize, to: usize) {
        debug!("Committing reorder {} -> {}", from, to);
        if self.pending_echoes.len() >= MAX_PENDING_ECHOES {
            self.pending_echoes.pop_front();
        }
        self.pending_echoes.push_back((from, to));
        self.source.move_item(from, to);

        if let Err(err) = self.slots.move_item(from, to) {
            error!("Reorder rejected by slots: {}", err);
            self.resync();
            return;
        }
        self.send(RenderCommand::ItemsMoved { from, to });
        if !self.verify_sync() {
            return;
        }
        if let Some(sink) = self.reorder_sink.as_mut() {
            sink.reordered(from, to);
        }
    }

    fn ensure_auto_scroll(&mut self, point: Point) {
        if self.auto_scroll_armed {
            return;
        }
        if self.drag.auto_scroll_velocity(point.x, self.viewport.width) != 0.0 {
            self.scheduler
                .schedule(TimerKind::AutoScroll, self.config.auto_scroll_interval());
            self.auto_scroll_armed = true;
        }
    }

    fn ensure_frames(&mut self, now: Instant) {
        if self.last_frame.is_none() {
            self.last_frame = Some(now);
        }
        if !self.frame_armed {
            self.scheduler
                .schedule(TimerKind::Frame, self.config.frame_interval());
            self.frame_armed = true;
        }
    }

    // ========== TIMERS ==========

    /// Deliver a fired timer.
    pub fn fire(&mut self, timer: TimerKind, now: Instant) -> PointerResult {
        match timer {
            TimerKind::VirtualizationDebounce => {
                if let Some(center) = self.window.take_due(now) {
                    self.drain_cache_events();
                    self.recompute_window(center);
                }
                PointerResult::Ignored
            }
            TimerKind::LongPress => self.on_long_press(now),
            TimerKind::AutoScroll => {
                self.on_auto_scroll(now);
                PointerResult::Ignored
            }
            TimerKind::Frame => {
                self.on_frame(now);
                PointerResult::Ignored
            }
        }
    }

    fn on_long_press(&mut self, now: Instant) -> PointerResult {
        let DragState::PressArmed { last, .. } = *self.drag.state() else {
            return PointerResult::Ignored;
        };
        let hit = self.index_at(last);
        match self.drag.long_press_elapsed(hit, self.slots.len(), now) {
            DragOutcome::BeginDrag { source } => {
                debug!("Long press picked up item {}", source);
                self.send(RenderCommand::DragVisual(self.drag.visual()));
                self.ensure_frames(now);
                PointerResult::Captured
            }
            _ => PointerResult::Ignored,
        }
    }

    fn on_auto_scroll(&mut self, now: Instant) {
        self.auto_scroll_armed = false;
        let Some(pointer) = self.drag.drag_pointer() else {
            return;
        };
        let velocity = self.drag.auto_scroll_velocity(pointer.x, self.viewport.width);
        if velocity == 0.0 {
            return;
        }

        let interval = self.config.auto_scroll_interval();
        let delta = f64::from(velocity) * interval.as_secs_f64();
        self.retarget(self.animator.target() + delta, now);

        let hit = self.index_at(pointer);
        self.drag.retarget(hit, now);
        self.send(RenderCommand::DragVisual(self.drag.visual()));

        self.scheduler.schedule(TimerKind::AutoScroll, interval);
        self.auto_scroll_armed = true;
    }

    fn on_frame(&mut self, now: Instant) {
        self.frame_armed = false;
        let dt = self
            .last_frame
            .map_or(Duration::ZERO, |last| now.saturating_duration_since(last));
        self.last_frame = Some(now);

        if self.animator.is_active() {
            self.animator.tick(dt.as_secs_f64());
            let center = center_index(self.animator.current(), self.slots.len());
            if center != self.reported_center {
                self.report_focus(now);
            }
            if !self.animator.is_active() {
                if let Some(index) = self.settle_selection.take() {
                    debug!("Settled on {}", index);
                    if let Some(sink) = self.selection_sink.as_mut() {
                        sink.selected(index);
                    }
                }
            }
        }

        let drag_needs_frames = match self.drag.tick(now) {
            DragOutcome::Finished => {
                self.send(RenderCommand::DragVisual(None));
                false
            }
            DragOutcome::Animating => {
                self.send(RenderCommand::DragVisual(self.drag.visual()));
                true
            }
            _ => false,
        };

        if self.animator.is_active() || drag_needs_frames {
            self.ensure_frames(now);
        } else {
            self.last_frame = None;
        }
    }

    // ========== LIFECYCLE ==========

    /// Detach from the host: cancel timers and loads, release images and
    /// reset selection and drag state.
    pub fn detach(&mut self) {
        for timer in [
            TimerKind::VirtualizationDebounce,
            TimerKind::LongPress,
            TimerKind::AutoScroll,
            TimerKind::Frame,
        ] {
            self.scheduler.cancel(timer);
        }
        self.frame_armed = false;
        self.auto_scroll_armed = false;
        self.last_frame = None;
        self.pan = None;
        self.settle_selection = None;
        self.reported_center = None;
        self.pending_echoes.clear();

        self.drag.reset();
        self.animator.reset();
        self.window.reset();
        self.cache.clear();
        self.drain_cache_events();
        for index in 0..self.slots.len() {
            self.slots.clear_image(index);
        }
        debug!("Carousel detached");
        self.send(RenderCommand::Detach);
    }

    /// Re-attach after [`Self::detach`]: rebuild slots and reload the window.
    pub fn attach(&mut self) {
        self.send(RenderCommand::SetSpring(self.config.spring_config()));
        self.send(RenderCommand::SetMinWindowRadius(
            self.config.min_window_radius(),
        ));
        self.send(RenderCommand::SetLayout(self.params));
        self.send(RenderCommand::SetViewport(self.viewport));
        self.resync();
    }

    fn send(&self, command: RenderCommand) {
        if self.render_tx.send(command).is_err() {
            trace!("Render loop gone, dropping command");
        }
    }
}
