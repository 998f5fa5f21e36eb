//! Selection spring animator
//!
//! Drives a continuous `current` index toward a discrete target with a
//! slightly overdamped spring. The controller and the render loop each own an
//! instance built from the same [`SpringConfig`], so geometry queried between
//! frames matches what is drawn.

use crate::infra::constants::motion;

/// Spring coefficients shared by every animator instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringConfig {
    pub stiffness: f64,
    pub damping: f64,
}

impl SpringConfig {
    /// Build from a stiffness and a multiplier over critical damping.
    pub fn new(stiffness: f64, damping_ratio: f64) -> Self {
        let stiffness = stiffness.max(f64::EPSILON);
        Self {
            stiffness,
            damping: 2.0 * stiffness.sqrt() * damping_ratio.max(0.0),
        }
    }
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self::new(motion::STIFFNESS, motion::DAMPING_RATIO)
    }
}

#[derive(Debug, Clone)]
pub struct SpringAnimator {
    config: SpringConfig,
    target: f64,
    current: f64,
    velocity: f64,
    active: bool,
}

impl Default for SpringAnimator {
    fn default() -> Self {
        Self::new(SpringConfig::default())
    }
}

impl SpringAnimator {
    pub fn new(config: SpringConfig) -> Self {
        Self {
            config,
            target: 0.0,
            current: 0.0,
            velocity: 0.0,
            active: false,
        }
    }

    pub fn config(&self) -> SpringConfig {
        self.config
    }

    pub fn set_config(&mut self, config: SpringConfig) {
        self.config = config;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    /// Retarget the spring. Returns true when this call woke an idle animator.
    ///
    /// A settled animator only wakes for a value that differs from where it
    /// snapped.
    pub fn set_target(&mut self, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }
        self.target = value;
        if self.active {
            return false;
        }
        if value == self.current {
            return false;
        }
        self.active = true;
        true
    }

    /// Integrate one step of `dt_seconds` and return the new current index.
    pub fn tick(&mut self, dt_seconds: f64) -> f64 {
        if !self.active {
            return self.current;
        }

        let dt = if dt_seconds.is_finite() {
            dt_seconds.clamp(0.0, motion::MAX_DT_S)
        } else {
            0.0
        };

        let acceleration = (self.target - self.current) * self.config.stiffness
            - self.velocity * self.config.damping;
        self.velocity += acceleration * dt;
        self.current += self.velocity * dt;

        if (self.target - self.current).abs() < motion::SNAP_DISTANCE
            && self.velocity.abs() < motion::SNAP_VELOCITY
        {
            self.current = self.target;
            self.velocity = 0.0;
            self.active = false;
        }

        self.current
    }

    /// Jump straight to `value` and go idle.
    pub fn snap_to(&mut self, value: f64) {
        self.target = value;
        self.current = value;
        self.velocity = 0.0;
        self.active = false;
    }

    pub fn reset(&mut self) {
        self.snap_to(0.0);
    }
}

/// Easing curves for fixed-duration transitions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EasingFunction {
    Linear,
    EaseOutCubic,
    EaseInOutCubic,
}

impl EasingFunction {
    /// Apply the easing function to a progress value (0.0 to 1.0)
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            EasingFunction::Linear => t,
            EasingFunction::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
            EasingFunction::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
        }
    }
}
