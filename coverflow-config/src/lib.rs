//! Carousel tuning for hosts that keep settings in files or the environment.
//!
//! [`CarouselSettings`] is the serde model; `load_from_env` resolves it from
//! `$COVERFLOW_CONFIG_PATH`, `$COVERFLOW_CONFIG_JSON` or a default file, and
//! `to_runtime_config` / `layout_params` hand it to `coverflow-core`.

#![allow(missing_docs)]

pub mod models;
pub mod validation;

pub use models::settings::{
    CarouselSettings, CarouselSettingsSource, DragSettings, MotionSettings,
    VirtualizationSettings,
};
pub use validation::{ConfigGuardRailError, ConfigWarning, ConfigWarnings};
