//! Virtualization window
//!
//! Decides which image keys must be resident around the focus. Focus bursts
//! are debounced into a single recompute using the final center, and every
//! recompute runs under a fresh cancellation generation so loads issued for
//! an older window cannot land after a newer one.

use std::collections::HashSet;
use std::hash::Hash;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use super::projection::{outward_from, visible_range};
use super::types::VisibleRange;

/// Result of a window recompute.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowPlan<K> {
    pub range: Option<VisibleRange>,
    /// Previously required keys that fell out of the window.
    pub evict: Vec<K>,
    /// Required indices, closest to the center first (right side first on
    /// ties).
    pub load: Vec<usize>,
}

#[derive(Debug)]
pub struct WindowManager<K> {
    debounce: Duration,
    pending_center: Option<usize>,
    deadline: Option<Instant>,
    applied_center: Option<usize>,
    required: HashSet<K>,
    range: Option<VisibleRange>,
    generation: u64,
    token: CancellationToken,
}

impl<K: Clone + Eq + Hash> WindowManager<K> {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            pending_center: None,
            deadline: None,
            applied_center: None,
            required: HashSet::new(),
            range: None,
            generation: 0,
            token: CancellationToken::new(),
        }
    }

    pub fn set_debounce(&mut self, debounce: Duration) {
        self.debounce = debounce;
    }

    /// Record a new focus center. Returns the deadline the caller should
    /// schedule the debounce timer for, or `None` when nothing changed.
    pub fn on_focus_changed(&mut self, center: usize, now: Instant) -> Option<Instant> {
        if self.pending_center.is_none() && self.applied_center == Some(center) {
            return None;
        }
        self.pending_center = Some(center);
        let deadline = now + self.debounce;
        self.deadline = Some(deadline);
        Some(deadline)
    }

    /// The coalesced center once the debounce deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> Option<usize> {
        match self.deadline {
            Some(deadline) if deadline <= now => self.flush(),
            _ => None,
        }
    }

    /// The pending center, ignoring the deadline.
    pub fn flush(&mut self) -> Option<usize> {
        self.deadline = None;
        self.pending_center.take()
    }

    pub fn has_pending(&self) -> bool {
        self.pending_center.is_some()
    }

    /// Force the next focus report to recompute even if the center is
    /// unchanged (layout, viewport or item changes).
    pub fn mark_stale(&mut self) {
        self.applied_center = None;
    }

    /// Compute the required range around `center` and diff it against the
    /// previous one. `key_of` resolves an index to its image key.
    pub fn plan(
        &mut self,
        center: usize,
        item_count: usize,
        radius: usize,
        key_of: impl Fn(usize) -> Option<K>,
    ) -> WindowPlan<K> {
        let range = visible_range(center as f64, item_count, radius);
        let load: Vec<usize> = match range {
            Some(range) => outward_from(range.center, item_count, radius).collect(),
            None => Vec::new(),
        };

        let required: HashSet<K> = load.iter().filter_map(|index| key_of(*index)).collect();
        let evict = self
            .required
            .iter()
            .filter(|key| !required.contains(*key))
            .cloned()
            .collect();

        self.required = required;
        self.range = range;
        self.applied_center = range.map(|range| range.center);

        WindowPlan { range, evict, load }
    }

    /// Cancel the previous load batch and hand out the token for the next.
    pub fn begin_generation(&mut self) -> CancellationToken {
        self.token.cancel();
        self.token = CancellationToken::new();
        self.generation += 1;
        log::debug!("Virtualization generation {}", self.generation);
        self.token.clone()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn range(&self) -> Option<VisibleRange> {
        self.range
    }

    pub fn is_required(&self, key: &K) -> bool {
        self.required.contains(key)
    }

    pub fn required_len(&self) -> usize {
        self.required.len()
    }

    /// Cancel in-flight loads and forget the window.
    pub fn reset(&mut self) {
        self.token.cancel();
        self.token = CancellationToken::new();
        self.pending_center = None;
        self.deadline = None;
        self.applied_center = None;
        self.required.clear();
        self.range = None;
    }
}
