use thiserror::Error;

use crate::models::settings::{
    CarouselSettings, DragSettings, MotionSettings, VirtualizationSettings,
};
use coverflow_core::domains::carousel::types::LayoutParams;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigGuardRailError {
    #[error("{field} must be a positive finite number (got {value})")]
    NonPositive { field: &'static str, value: f64 },
    #[error("{field} must be a finite number (got {value})")]
    NotFinite { field: &'static str, value: f64 },
    #[error("{field} must be at least 1")]
    Zero { field: &'static str },
}

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(
        &mut self,
        message: S,
        hint: H,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

pub fn apply_guard_rails(
    settings: &CarouselSettings,
) -> Result<ConfigWarnings, ConfigGuardRailError> {
    let mut warnings = ConfigWarnings::default();

    check_motion(&settings.motion, &mut warnings)?;
    check_layout(&settings.layout)?;
    check_virtualization(&settings.virtualization, &mut warnings)?;
    check_drag(&settings.drag, &mut warnings)?;

    Ok(warnings)
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigGuardRailError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigGuardRailError::NonPositive { field, value })
    }
}

fn finite(field: &'static str, value: f64) -> Result<(), ConfigGuardRailError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigGuardRailError::NotFinite { field, value })
    }
}

fn check_motion(
    motion: &MotionSettings,
    warnings: &mut ConfigWarnings,
) -> Result<(), ConfigGuardRailError> {
    positive("motion.stiffness", motion.stiffness)?;
    positive("motion.damping_ratio", motion.damping_ratio)?;
    if motion.frame_interval_ms == 0 {
        return Err(ConfigGuardRailError::Zero {
            field: "motion.frame_interval_ms",
        });
    }

    if motion.damping_ratio < 1.0 {
        warnings.push_with_hint(
            format!(
                "motion.damping_ratio {} is under-damped; the focus will overshoot its target",
                motion.damping_ratio
            ),
            "Use 1.0 or higher for a settle without overshoot",
        );
    }
    Ok(())
}

fn check_layout(layout: &LayoutParams) -> Result<(), ConfigGuardRailError> {
    positive("layout.item_width", layout.item_width.into())?;
    positive("layout.item_height", layout.item_height.into())?;
    positive("layout.item_scale", layout.item_scale.into())?;
    positive("layout.item_spacing", layout.item_spacing.into())?;
    positive("layout.projection_distance", layout.projection_distance.into())?;
    finite("layout.side_translation", layout.side_translation.into())?;
    finite("layout.side_rotation_deg", layout.side_rotation_deg.into())?;
    finite("layout.stack_spacing", layout.stack_spacing.into())?;
    finite("layout.vertical_offset", layout.vertical_offset.into())?;
    Ok(())
}

fn check_virtualization(
    virtualization: &VirtualizationSettings,
    warnings: &mut ConfigWarnings,
) -> Result<(), ConfigGuardRailError> {
    if virtualization.cache_capacity == 0 {
        return Err(ConfigGuardRailError::Zero {
            field: "virtualization.cache_capacity",
        });
    }
    if virtualization.max_concurrent_loads == 0 {
        return Err(ConfigGuardRailError::Zero {
            field: "virtualization.max_concurrent_loads",
        });
    }

    let window = virtualization.min_window_radius * 2 + 1;
    if virtualization.cache_capacity < window {
        warnings.push_with_hint(
            format!(
                "virtualization.cache_capacity {} is smaller than the resident window ({} images)",
                virtualization.cache_capacity, window
            ),
            "Tiles at the window edges will be evicted and reloaded while browsing",
        );
    }

    if virtualization.debounce_ms == 0 {
        warnings.push(
            "virtualization.debounce_ms is 0; \
             every focus change during a fling recomputes the window",
        );
    }
    Ok(())
}

fn check_drag(
    drag: &DragSettings,
    warnings: &mut ConfigWarnings,
) -> Result<(), ConfigGuardRailError> {
    positive("drag.smoothing_tau_s", drag.smoothing_tau_s.into())?;
    finite("drag.move_threshold_px", drag.move_threshold_px.into())?;
    finite("drag.edge_zone_px", drag.edge_zone_px.into())?;
    finite(
        "drag.auto_scroll_max_items_per_s",
        drag.auto_scroll_max_items_per_s.into(),
    )?;
    if drag.auto_scroll_interval_ms == 0 {
        return Err(ConfigGuardRailError::Zero {
            field: "drag.auto_scroll_interval_ms",
        });
    }

    if drag.long_press_ms == 0 {
        warnings.push_with_hint(
            "drag.long_press_ms is 0; every press becomes a drag",
            "Taps and pans need a non-zero long-press delay",
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass_without_warnings() {
        let warnings = apply_guard_rails(&CarouselSettings::default()).unwrap();
        assert!(warnings.is_empty(), "{:?}", warnings.items);
    }

    #[test]
    fn zero_item_width_is_rejected() {
        let mut settings = CarouselSettings::default();
        settings.layout.item_width = 0.0;
        assert_eq!(
            apply_guard_rails(&settings).unwrap_err(),
            ConfigGuardRailError::NonPositive {
                field: "layout.item_width",
                value: 0.0
            }
        );
    }

    #[test]
    fn nan_stiffness_is_rejected() {
        let mut settings = CarouselSettings::default();
        settings.motion.stiffness = f64::NAN;
        assert!(matches!(
            apply_guard_rails(&settings),
            Err(ConfigGuardRailError::NonPositive {
                field: "motion.stiffness",
                ..
            })
        ));
    }

    #[test]
    fn small_cache_and_underdamping_warn() {
        let mut settings = CarouselSettings::default();
        settings.virtualization.cache_capacity = 10;
        settings.motion.damping_ratio = 0.6;
        let warnings = apply_guard_rails(&settings).unwrap();
        assert_eq!(warnings.items.len(), 2);
        assert!(warnings.items.iter().all(|w| w.hint.is_some()));
    }

    #[test]
    fn zero_capacity_is_an_error() {
        let mut settings = CarouselSettings::default();
        settings.virtualization.cache_capacity = 0;
        assert_eq!(
            apply_guard_rails(&settings).unwrap_err(),
            ConfigGuardRailError::Zero {
                field: "virtualization.cache_capacity"
            }
        );
    }
}
