//! Press → long-press → drag → drop
//!
//! `DragMachine` only tracks gesture state. It reports what happened through
//! [`DragOutcome`] and the controller performs the side effects (timers,
//! pointer capture, the actual move in the item source).

use std::time::{Duration, Instant};

use super::animator::EasingFunction;
use super::projection::{ProjectedQuad, project, project_at};
use super::types::{LayoutParams, Point, Size};
use crate::infra::constants::drag;

/// Drag tuning, see [`crate::RuntimeConfig::drag_config`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragConfig {
    pub long_press: Duration,
    pub move_threshold_px: f32,
    pub smoothing_tau_s: f32,
    pub drop_duration: Duration,
    pub edge_zone_px: f32,
    pub auto_scroll_max_items_per_s: f32,
    pub auto_scroll_interval: Duration,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            long_press: Duration::from_millis(drag::LONG_PRESS_MS),
            move_threshold_px: drag::MOVE_THRESHOLD_PX,
            smoothing_tau_s: drag::SMOOTHING_TAU_S,
            drop_duration: Duration::from_millis(drag::DROP_DURATION_MS),
            edge_zone_px: drag::EDGE_ZONE_PX,
            auto_scroll_max_items_per_s: drag::AUTO_SCROLL_MAX_ITEMS_PER_S,
            auto_scroll_interval: Duration::from_millis(drag::AUTO_SCROLL_INTERVAL_MS),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    PressArmed {
        start: Point,
        last: Point,
        pressed_at: Instant,
    },
    Dragging {
        source: usize,
        pointer: Point,
        drop_target: usize,
        smoothed_drop_target: f32,
        last_update: Instant,
    },
    /// The move (if any) is already committed; indices refer to the new
    /// ordering.
    Dropping {
        source: usize,
        target: usize,
        drop_alpha: f32,
        release_pointer: Point,
        release_smoothed: f32,
        started: Instant,
    },
}

/// What the controller has to act on after feeding an event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragOutcome {
    Ignored,
    /// Press recorded; arm the long-press timer.
    ArmLongPress { after: Duration },
    /// Press turned into a scroll gesture before the timer fired.
    BeginPan { start: Point },
    /// Press released before anything else happened.
    Tap { point: Point },
    /// Press abandoned without a tap (capture lost).
    Cancelled,
    /// Long press resolved to an item; capture the pointer.
    BeginDrag { source: usize },
    /// Drag state changed; redraw.
    Updated,
    /// Drag released; commit `source → target` when they differ.
    Released { source: usize, target: usize },
    /// Drop animation still running.
    Animating,
    /// Drop animation done, machine back to idle.
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DragPhase {
    Floating {
        pointer: Point,
        smoothed: f32,
    },
    Settling {
        target: usize,
        alpha: f32,
        release_pointer: Point,
        release_smoothed: f32,
    },
}

/// Snapshot of the drag for drawing: where neighbors sit while parting and
/// where the dragged tile floats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragVisual {
    source: usize,
    phase: DragPhase,
}

impl DragVisual {
    /// Index of the dragged tile in the slot ordering the renderer holds.
    pub fn dragged_index(&self) -> usize {
        match self.phase {
            DragPhase::Floating { .. } => self.source,
            DragPhase::Settling { target, .. } => target,
        }
    }

    pub fn is_settling(&self) -> bool {
        matches!(self.phase, DragPhase::Settling { .. })
    }

    /// Strip position of a non-dragged item.
    pub fn position_of(&self, index: usize) -> f64 {
        match self.phase {
            DragPhase::Floating { smoothed, .. } => {
                index as f64 + f64::from(parting_offset(index, self.source, smoothed))
            }
            DragPhase::Settling {
                target,
                alpha,
                release_smoothed,
                ..
            } => {
                let old = index_before_move(index, self.source, target);
                let parted =
                    old as f64 + f64::from(parting_offset(old, self.source, release_smoothed));
                parted + (index as f64 - parted) * f64::from(alpha)
            }
        }
    }

    /// Quad of the dragged tile.
    pub fn dragged_quad(
        &self,
        current_index: f64,
        viewport: Size,
        params: &LayoutParams,
    ) -> ProjectedQuad {
        match self.phase {
            DragPhase::Floating { pointer, smoothed } => {
                floating_quad(pointer, smoothed, current_index, viewport, params)
            }
            DragPhase::Settling {
                target,
                alpha,
                release_pointer,
                release_smoothed,
            } => {
                let from = floating_quad(
                    release_pointer,
                    release_smoothed,
                    current_index,
                    viewport,
                    params,
                );
                let to = project(target, current_index, viewport, params);
                from.lerp(&to, alpha)
            }
        }
    }
}

fn floating_quad(
    pointer: Point,
    smoothed: f32,
    current_index: f64,
    viewport: Size,
    params: &LayoutParams,
) -> ProjectedQuad {
    let quad = project_at(f64::from(smoothed), current_index, viewport, params);
    let center = quad.center();
    quad.translated(pointer.x - center.x, pointer.y - center.y)
}

/// Shift of item `index` while `source` hovers at `smoothed`.
///
/// Items between the source and the hover point slide one slot toward the
/// source, gradually as the smoothed target passes them.
pub fn parting_offset(index: usize, source: usize, smoothed: f32) -> f32 {
    let j = index as f32;
    if index > source {
        -(smoothed - (j - 1.0)).clamp(0.0, 1.0)
    } else if index < source {
        ((j + 1.0) - smoothed).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Position an item held before `source` was moved to `target`.
fn index_before_move(index: usize, source: usize, target: usize) -> usize {
    if source < target && index >= source && index < target {
        index + 1
    } else if target < source && index > target && index <= source {
        index - 1
    } else {
        index
    }
}

#[derive(Debug, Default)]
pub struct DragMachine {
    config: DragConfig,
    state: DragState,
}

impl DragMachine {
    pub fn new(config: DragConfig) -> Self {
        Self {
            config,
            state: DragState::Idle,
        }
    }

    pub fn config(&self) -> &DragConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: DragConfig) {
        self.config = config;
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, DragState::Idle)
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    pub fn is_dropping(&self) -> bool {
        matches!(self.state, DragState::Dropping { .. })
    }

    pub fn reset(&mut self) {
        self.state = DragState::Idle;
    }

    pub fn pointer_down(&mut self, point: Point, now: Instant) -> DragOutcome {
        match self.state {
            DragState::Idle | DragState::Dropping { .. } => {
                if self.is_dropping() {
                    log::trace!("Press during drop animation, settling immediately");
                }
                self.state = DragState::PressArmed {
                    start: point,
                    last: point,
                    pressed_at: now,
                };
                DragOutcome::ArmLongPress {
                    after: self.config.long_press,
                }
            }
            DragState::PressArmed { .. } | DragState::Dragging { .. } => DragOutcome::Ignored,
        }
    }

    /// `resolve` maps a pointer position to a drop target; it is only
    /// consulted while dragging.
    pub fn pointer_move(
        &mut self,
        point: Point,
        now: Instant,
        resolve: impl FnOnce(Point) -> Option<usize>,
    ) -> DragOutcome {
        match &mut self.state {
            DragState::PressArmed { start, last, .. } => {
                *last = point;
                if start.distance(point) > self.config.move_threshold_px {
                    let start = *start;
                    log::trace!("Press moved past threshold, treating as pan");
                    self.state = DragState::Idle;
                    DragOutcome::BeginPan { start }
                } else {
                    DragOutcome::Ignored
                }
            }
            DragState::Dragging { pointer, .. } => {
                *pointer = point;
                self.retarget(resolve(point), now);
                DragOutcome::Updated
            }
            DragState::Idle | DragState::Dropping { .. } => DragOutcome::Ignored,
        }
    }

    /// Update the discrete drop target (e.g. after auto-scroll moved the
    /// strip under a stationary pointer) and advance smoothing to `now`.
    pub fn retarget(&mut self, target: Option<usize>, now: Instant) {
        if let DragState::Dragging { drop_target, .. } = &mut self.state
            && let Some(target) = target
        {
            *drop_target = target;
        }
        self.advance_smoothing(now);
    }

    /// Long-press timer fired. Starts a drag when `hit` names an item and
    /// there is something to reorder.
    pub fn long_press_elapsed(
        &mut self,
        hit: Option<usize>,
        item_count: usize,
        now: Instant,
    ) -> DragOutcome {
        let DragState::PressArmed { last, .. } = self.state else {
            return DragOutcome::Ignored;
        };
        if item_count <= 1 {
            log::trace!("Long press ignored, nothing to reorder");
            return DragOutcome::Ignored;
        }
        let Some(source) = hit.filter(|index| *index < item_count) else {
            return DragOutcome::Ignored;
        };

        log::debug!("Drag started on item {}", source);
        self.state = DragState::Dragging {
            source,
            pointer: last,
            drop_target: source,
            smoothed_drop_target: source as f32,
            last_update: now,
        };
        DragOutcome::BeginDrag { source }
    }

    pub fn pointer_up(&mut self, point: Point, now: Instant) -> DragOutcome {
        match self.state {
            DragState::PressArmed { .. } => {
                self.state = DragState::Idle;
                DragOutcome::Tap { point }
            }
            DragState::Dragging { .. } => self.release(Some(point), now),
            DragState::Idle | DragState::Dropping { .. } => DragOutcome::Ignored,
        }
    }

    /// The platform revoked pointer capture. A drag drops at its last known
    /// target; a pending press is abandoned.
    pub fn capture_lost(&mut self, now: Instant) -> DragOutcome {
        match self.state {
            DragState::PressArmed { .. } => {
                self.state = DragState::Idle;
                DragOutcome::Cancelled
            }
            DragState::Dragging { .. } => {
                log::debug!("Pointer capture lost mid-drag, dropping at last target");
                self.release(None, now)
            }
            DragState::Idle | DragState::Dropping { .. } => DragOutcome::Ignored,
        }
    }

    fn release(&mut self, point: Option<Point>, now: Instant) -> DragOutcome {
        self.advance_smoothing(now);
        let DragState::Dragging {
            source,
            pointer,
            drop_target,
            smoothed_drop_target,
            ..
        } = self.state
        else {
            return DragOutcome::Ignored;
        };

        log::debug!("Drag released: {} -> {}", source, drop_target);
        self.state = DragState::Dropping {
            source,
            target: drop_target,
            drop_alpha: 0.0,
            release_pointer: point.unwrap_or(pointer),
            release_smoothed: smoothed_drop_target,
            started: now,
        };
        DragOutcome::Released {
            source,
            target: drop_target,
        }
    }

    /// Frame tick: advances drop-target smoothing and the drop animation.
    pub fn tick(&mut self, now: Instant) -> DragOutcome {
        match &mut self.state {
            DragState::Dragging {
                drop_target,
                smoothed_drop_target,
                ..
            } => {
                let settled = (*drop_target as f32 - *smoothed_drop_target).abs() < 1e-3;
                self.advance_smoothing(now);
                if settled {
                    DragOutcome::Ignored
                } else {
                    DragOutcome::Animating
                }
            }
            DragState::Dropping {
                drop_alpha,
                started,
                ..
            } => {
                let duration = self.config.drop_duration.as_secs_f32();
                let progress = if duration > 0.0 {
                    now.saturating_duration_since(*started).as_secs_f32() / duration
                } else {
                    1.0
                };
                if progress >= 1.0 {
                    self.state = DragState::Idle;
                    return DragOutcome::Finished;
                }
                *drop_alpha = EasingFunction::EaseOutCubic.apply(progress);
                DragOutcome::Animating
            }
            DragState::Idle | DragState::PressArmed { .. } => DragOutcome::Ignored,
        }
    }

    fn advance_smoothing(&mut self, now: Instant) {
        let tau = self.config.smoothing_tau_s;
        if let DragState::Dragging {
            drop_target,
            smoothed_drop_target,
            last_update,
            ..
        } = &mut self.state
        {
            let dt = now.saturating_duration_since(*last_update).as_secs_f32();
            *last_update = now;
            let alpha = if tau > 0.0 { 1.0 - (-dt / tau).exp() } else { 1.0 };
            *smoothed_drop_target += (*drop_target as f32 - *smoothed_drop_target) * alpha;
        }
    }

    /// Auto-scroll rate in items per second for a pointer at `pointer_x`:
    /// negative near the left edge, positive near the right, scaled by how
    /// deep the pointer sits in the edge zone.
    pub fn auto_scroll_velocity(&self, pointer_x: f32, viewport_width: f32) -> f32 {
        let zone = self.config.edge_zone_px;
        if zone <= 0.0 || viewport_width <= 0.0 {
            return 0.0;
        }
        let max = self.config.auto_scroll_max_items_per_s;
        if pointer_x < zone {
            -((zone - pointer_x) / zone).clamp(0.0, 1.0) * max
        } else if pointer_x > viewport_width - zone {
            ((pointer_x - (viewport_width - zone)) / zone).clamp(0.0, 1.0) * max
        } else {
            0.0
        }
    }

    /// Current pointer while dragging.
    pub fn drag_pointer(&self) -> Option<Point> {
        match self.state {
            DragState::Dragging { pointer, .. } => Some(pointer),
            _ => None,
        }
    }

    pub fn visual(&self) -> Option<DragVisual> {
        match self.state {
            DragState::Dragging {
                source,
                pointer,
                smoothed_drop_target,
                ..
            } => Some(DragVisual {
                source,
                phase: DragPhase::Floating {
                    pointer,
                    smoothed: smoothed_drop_target,
                },
            }),
            DragState::Dropping {
                source,
                target,
                drop_alpha,
                release_pointer,
                release_smoothed,
                ..
            } => Some(DragVisual {
                source,
                phase: DragPhase::Settling {
                    target,
                    alpha: drop_alpha,
                    release_pointer,
                    release_smoothed,
                },
            }),
            DragState::Idle | DragState::PressArmed { .. } => None,
        }
    }
}
