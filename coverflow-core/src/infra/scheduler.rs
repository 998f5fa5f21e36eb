//! Timer scheduling abstraction
//!
//! The controller never sleeps or spawns timers itself. It asks a
//! [`Scheduler`] to deliver a [`TimerKind`] after some delay and the host
//! feeds fired timers back through `CarouselController::fire`. Each kind has
//! at most one pending deadline; scheduling again replaces it.
//!
//! [`ManualScheduler`] is a virtual clock for tests and headless runs,
//! [`TokioScheduler`] delivers fired timers over a channel in real time.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Timers the carousel controller relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Coalesced virtualization recompute.
    VirtualizationDebounce,
    /// Press held long enough to start a drag.
    LongPress,
    /// Edge auto-scroll step while dragging.
    AutoScroll,
    /// Interaction-side animation frame (spring, drop commit).
    Frame,
}

/// "Schedule tick in Δt" and "cancel pending tick".
pub trait Scheduler {
    /// Arm `timer` to fire `after` from now, replacing any pending deadline.
    fn schedule(&mut self, timer: TimerKind, after: Duration);

    /// Drop the pending deadline of `timer`, if any.
    fn cancel(&mut self, timer: TimerKind);
}

#[derive(Debug)]
struct ManualInner {
    origin: Instant,
    elapsed: Duration,
    pending: HashMap<TimerKind, Duration>,
}

/// Virtual clock scheduler. Cloning yields another handle to the same clock,
/// so a test can keep one handle while the controller owns the other.
#[derive(Debug, Clone)]
pub struct ManualScheduler {
    inner: Arc<Mutex<ManualInner>>,
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(origin: Instant) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ManualInner {
                origin,
                elapsed: Duration::ZERO,
                pending: HashMap::new(),
            })),
        }
    }

    /// Current virtual time.
    pub fn now(&self) -> Instant {
        let inner = self.inner.lock();
        inner.origin + inner.elapsed
    }

    /// Deadline of a pending timer.
    pub fn pending(&self, timer: TimerKind) -> Option<Instant> {
        let inner = self.inner.lock();
        inner.pending.get(&timer).map(|due| inner.origin + *due)
    }

    pub fn is_idle(&self) -> bool {
        self.inner.lock().pending.is_empty()
    }

    /// Move the clock forward without firing anything.
    pub fn advance(&self, dt: Duration) -> Instant {
        let mut inner = self.inner.lock();
        inner.elapsed += dt;
        inner.origin + inner.elapsed
    }

    /// Move the clock to `at` (never backwards) without firing anything.
    pub fn advance_to(&self, at: Instant) {
        let mut inner = self.inner.lock();
        let target = at.saturating_duration_since(inner.origin);
        if target > inner.elapsed {
            inner.elapsed = target;
        }
    }

    /// Pop the earliest timer due at or before `horizon`, moving the clock to
    /// its deadline. Callers loop on this so timers re-armed while firing are
    /// delivered in order.
    pub fn pop_due(&self, horizon: Instant) -> Option<(TimerKind, Instant)> {
        let mut inner = self.inner.lock();
        let limit = horizon.saturating_duration_since(inner.origin);
        let (timer, due) = inner
            .pending
            .iter()
            .filter(|(_, due)| **due <= limit)
            .min_by_key(|(_, due)| **due)
            .map(|(timer, due)| (*timer, *due))?;
        inner.pending.remove(&timer);
        if due > inner.elapsed {
            inner.elapsed = due;
        }
        Some((timer, inner.origin + inner.elapsed))
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, timer: TimerKind, after: Duration) {
        let mut inner = self.inner.lock();
        let due = inner.elapsed + after;
        inner.pending.insert(timer, due);
    }

    fn cancel(&mut self, timer: TimerKind) {
        self.inner.lock().pending.remove(&timer);
    }
}

/// Wall-clock scheduler backed by tokio sleeps. Fired timers arrive on the
/// receiver returned by [`TokioScheduler::new`] together with the instant
/// they fired.
#[derive(Debug)]
pub struct TokioScheduler {
    runtime: tokio::runtime::Handle,
    fired: mpsc::UnboundedSender<(TimerKind, Instant)>,
    sleeps: HashMap<TimerKind, JoinHandle<()>>,
}

impl TokioScheduler {
    pub fn new(
        runtime: tokio::runtime::Handle,
    ) -> (Self, mpsc::UnboundedReceiver<(TimerKind, Instant)>) {
        let (fired, rx) = mpsc::unbounded_channel();
        (
            Self {
                runtime,
                fired,
                sleeps: HashMap::new(),
            },
            rx,
        )
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&mut self, timer: TimerKind, after: Duration) {
        self.cancel(timer);
        let fired = self.fired.clone();
        let handle = self.runtime.spawn(async move {
            tokio::time::sleep(after).await;
            if fired.send((timer, Instant::now())).is_err() {
                log::trace!("Timer {:?} fired after receiver closed", timer);
            }
        });
        self.sleeps.insert(timer, handle);
    }

    fn cancel(&mut self, timer: TimerKind) {
        if let Some(handle) = self.sleeps.remove(&timer) {
            handle.abort();
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, handle) in self.sleeps.drain() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pop_due_delivers_in_deadline_order() {
        let mut sched = ManualScheduler::new();
        let start = sched.now();
        sched.schedule(TimerKind::LongPress, Duration::from_millis(300));
        sched.schedule(TimerKind::Frame, Duration::from_millis(16));

        let horizon = start + Duration::from_millis(500);
        let (first, at) = sched.pop_due(horizon).unwrap();
        assert_eq!(first, TimerKind::Frame);
        assert_eq!(at, start + Duration::from_millis(16));

        let (second, at) = sched.pop_due(horizon).unwrap();
        assert_eq!(second, TimerKind::LongPress);
        assert_eq!(at, start + Duration::from_millis(300));
        assert!(sched.pop_due(horizon).is_none());
    }

    #[test]
    fn rescheduling_replaces_deadline_and_cancel_drops_it() {
        let mut sched = ManualScheduler::new();
        let start = sched.now();
        sched.schedule(
            TimerKind::VirtualizationDebounce,
            Duration::from_millis(32),
        );
        sched.advance(Duration::from_millis(20));
        sched.schedule(
            TimerKind::VirtualizationDebounce,
            Duration::from_millis(32),
        );
        assert_eq!(
            sched.pending(TimerKind::VirtualizationDebounce),
            Some(start + Duration::from_millis(52))
        );

        sched.cancel(TimerKind::VirtualizationDebounce);
        assert!(sched.is_idle());
    }

    #[test]
    fn nothing_fires_before_its_deadline() {
        let mut sched = ManualScheduler::new();
        sched.schedule(TimerKind::AutoScroll, Duration::from_millis(16));
        let early = sched.now() + Duration::from_millis(15);
        assert!(sched.pop_due(early).is_none());
    }

    #[tokio::test]
    async fn tokio_scheduler_delivers_fired_timer() {
        let (mut sched, mut rx) =
            TokioScheduler::new(tokio::runtime::Handle::current());
        sched.schedule(TimerKind::Frame, Duration::from_millis(1));
        let (timer, _) = rx.recv().await.unwrap();
        assert_eq!(timer, TimerKind::Frame);
    }
}
