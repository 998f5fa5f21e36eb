//! Runtime configuration for user-adjustable constants
//!
//! This module provides a RuntimeConfig struct with Option<T> fields that override
//! the default constants. Accessor methods fall back to constants when None.

use std::time::Duration;

use crate::domains::carousel::animator::SpringConfig;
use crate::domains::carousel::drag::DragConfig;
use crate::infra::constants::{drag, motion, virtualization};

/// Runtime configuration with optional overrides for constants.
/// Fields are None by default, falling back to compiled constants.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuntimeConfig {
    /// Tracks if any actively-consumed setting was modified since last clear
    pub dirty: bool,

    // ========== SELECTION SPRING ==========
    /// Spring stiffness
    pub spring_stiffness: Option<f64>,
    /// Damping multiplier over critical damping
    pub spring_damping_ratio: Option<f64>,
    /// Frame cadence while animating (ms)
    pub frame_interval_ms: Option<u64>,

    // ========== VIRTUALIZATION ==========
    /// Minimum resident radius around the focus
    pub min_window_radius: Option<usize>,
    /// Focus debounce (ms)
    pub debounce_ms: Option<u64>,
    /// Decoded image capacity
    pub cache_capacity: Option<usize>,
    /// Concurrent background loads
    pub max_concurrent_loads: Option<usize>,

    // ========== DRAG & DROP ==========
    /// Long-press duration (ms)
    pub long_press_ms: Option<u64>,
    /// Press-to-pan threshold (px)
    pub move_threshold_px: Option<f32>,
    /// Drop target smoothing time constant (s)
    pub smoothing_tau_s: Option<f32>,
    /// Commit animation duration (ms)
    pub drop_duration_ms: Option<u64>,
    /// Auto-scroll edge zone (px)
    pub edge_zone_px: Option<f32>,
    /// Auto-scroll rate at full penetration (items/s)
    pub auto_scroll_max_items_per_s: Option<f32>,
    /// Auto-scroll cadence (ms)
    pub auto_scroll_interval_ms: Option<u64>,
}

impl RuntimeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark config as dirty (an in-use setting was changed)
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Clear dirty flag and return whether it was dirty
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    // ========== SELECTION SPRING ACCESSORS ==========

    pub fn spring_stiffness(&self) -> f64 {
        self.spring_stiffness.unwrap_or(motion::STIFFNESS)
    }

    pub fn spring_damping_ratio(&self) -> f64 {
        self.spring_damping_ratio.unwrap_or(motion::DAMPING_RATIO)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(
            self.frame_interval_ms
                .unwrap_or(motion::FRAME_INTERVAL_MS)
                .max(1),
        )
    }

    // ========== VIRTUALIZATION ACCESSORS ==========

    pub fn min_window_radius(&self) -> usize {
        self.min_window_radius
            .unwrap_or(virtualization::MIN_WINDOW_RADIUS)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(
            self.debounce_ms.unwrap_or(virtualization::DEBOUNCE_MS),
        )
    }

    pub fn cache_capacity(&self) -> usize {
        self.cache_capacity
            .unwrap_or(virtualization::CACHE_CAPACITY)
            .max(1)
    }

    pub fn max_concurrent_loads(&self) -> usize {
        self.max_concurrent_loads
            .unwrap_or(virtualization::MAX_CONCURRENT_LOADS)
            .max(1)
    }

    // ========== DRAG ACCESSORS ==========

    pub fn long_press(&self) -> Duration {
        Duration::from_millis(
            self.long_press_ms.unwrap_or(drag::LONG_PRESS_MS),
        )
    }

    pub fn move_threshold_px(&self) -> f32 {
        self.move_threshold_px.unwrap_or(drag::MOVE_THRESHOLD_PX)
    }

    pub fn smoothing_tau_s(&self) -> f32 {
        self.smoothing_tau_s.unwrap_or(drag::SMOOTHING_TAU_S)
    }

    pub fn drop_duration(&self) -> Duration {
        Duration::from_millis(
            self.drop_duration_ms.unwrap_or(drag::DROP_DURATION_MS),
        )
    }

    pub fn edge_zone_px(&self) -> f32 {
        self.edge_zone_px.unwrap_or(drag::EDGE_ZONE_PX)
    }

    pub fn auto_scroll_max_items_per_s(&self) -> f32 {
        self.auto_scroll_max_items_per_s
            .unwrap_or(drag::AUTO_SCROLL_MAX_ITEMS_PER_S)
    }

    pub fn auto_scroll_interval(&self) -> Duration {
        Duration::from_millis(
            self.auto_scroll_interval_ms
                .unwrap_or(drag::AUTO_SCROLL_INTERVAL_MS)
                .max(1),
        )
    }

    /// Bundle spring settings for the animators.
    /// Both the controller and the render loop build theirs from this so
    /// hit-testing matches what is drawn.
    pub fn spring_config(&self) -> SpringConfig {
        SpringConfig::new(self.spring_stiffness(), self.spring_damping_ratio())
    }

    /// Bundle drag settings for the drag state machine.
    pub fn drag_config(&self) -> DragConfig {
        DragConfig {
            long_press: self.long_press(),
            move_threshold_px: self.move_threshold_px(),
            smoothing_tau_s: self.smoothing_tau_s(),
            drop_duration: self.drop_duration(),
            edge_zone_px: self.edge_zone_px(),
            auto_scroll_max_items_per_s: self.auto_scroll_max_items_per_s(),
            auto_scroll_interval: self.auto_scroll_interval(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_fall_back_to_constants() {
        let rc = RuntimeConfig::new();
        assert_eq!(rc.min_window_radius(), virtualization::MIN_WINDOW_RADIUS);
        assert_eq!(rc.cache_capacity(), virtualization::CACHE_CAPACITY);
        assert_eq!(rc.long_press(), Duration::from_millis(drag::LONG_PRESS_MS));
        assert_eq!(rc.spring_stiffness(), motion::STIFFNESS);
    }

    #[test]
    fn overrides_win_and_degenerate_values_are_clamped() {
        let rc = RuntimeConfig {
            cache_capacity: Some(0),
            max_concurrent_loads: Some(0),
            min_window_radius: Some(4),
            ..RuntimeConfig::default()
        };
        assert_eq!(rc.cache_capacity(), 1);
        assert_eq!(rc.max_concurrent_loads(), 1);
        assert_eq!(rc.min_window_radius(), 4);
    }

    #[test]
    fn take_dirty_clears_flag() {
        let mut rc = RuntimeConfig::new();
        rc.mark_dirty();
        assert!(rc.take_dirty());
        assert!(!rc.take_dirty());
    }
}
