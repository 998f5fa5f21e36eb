use anyhow::{Context, anyhow};
use coverflow_core::RuntimeConfig;
use coverflow_core::domains::carousel::types::LayoutParams;
use coverflow_core::infra::constants::{drag, motion, virtualization};
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::validation::{self, ConfigGuardRailError, ConfigWarnings};

const PATH_VAR: &str = "COVERFLOW_CONFIG_PATH";
const JSON_VAR: &str = "COVERFLOW_CONFIG_JSON";

/// Source that produced the carousel settings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CarouselSettingsSource {
    #[default]
    Default,
    EnvPath(PathBuf),
    EnvInline,
    File(PathBuf),
}

/// Selection spring tuning.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MotionSettings {
    /// Spring stiffness. Higher settles faster.
    pub stiffness: f64,
    /// Multiplier over critical damping. Below 1.0 the focus overshoots.
    pub damping_ratio: f64,
    /// Frame cadence while animating (ms).
    pub frame_interval_ms: u64,
}

impl Default for MotionSettings {
    fn default() -> Self {
        Self {
            stiffness: motion::STIFFNESS,
            damping_ratio: motion::DAMPING_RATIO,
            frame_interval_ms: motion::FRAME_INTERVAL_MS,
        }
    }
}

/// Image residency tuning. The cache should hold at least one full window
/// (`2 * min_window_radius + 1` images) or tiles near the edge will thrash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct VirtualizationSettings {
    pub min_window_radius: usize,
    /// Focus changes within this window (ms) coalesce into one recompute.
    pub debounce_ms: u64,
    pub cache_capacity: usize,
    pub max_concurrent_loads: usize,
}

impl Default for VirtualizationSettings {
    fn default() -> Self {
        Self {
            min_window_radius: virtualization::MIN_WINDOW_RADIUS,
            debounce_ms: virtualization::DEBOUNCE_MS,
            cache_capacity: virtualization::CACHE_CAPACITY,
            max_concurrent_loads: virtualization::MAX_CONCURRENT_LOADS,
        }
    }
}

/// Press, drag and drop tuning.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DragSettings {
    pub long_press_ms: u64,
    pub move_threshold_px: f32,
    pub smoothing_tau_s: f32,
    pub drop_duration_ms: u64,
    pub edge_zone_px: f32,
    pub auto_scroll_max_items_per_s: f32,
    pub auto_scroll_interval_ms: u64,
}

impl Default for DragSettings {
    fn default() -> Self {
        Self {
            long_press_ms: drag::LONG_PRESS_MS,
            move_threshold_px: drag::MOVE_THRESHOLD_PX,
            smoothing_tau_s: drag::SMOOTHING_TAU_S,
            drop_duration_ms: drag::DROP_DURATION_MS,
            edge_zone_px: drag::EDGE_ZONE_PX,
            auto_scroll_max_items_per_s: drag::AUTO_SCROLL_MAX_ITEMS_PER_S,
            auto_scroll_interval_ms: drag::AUTO_SCROLL_INTERVAL_MS,
        }
    }
}

/// Complete carousel tuning. Every section and field is optional in files;
/// missing values take the compiled defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CarouselSettings {
    pub motion: MotionSettings,
    pub layout: LayoutParams,
    pub virtualization: VirtualizationSettings,
    pub drag: DragSettings,
}

impl CarouselSettings {
    /// Load carousel settings using environment variables.
    /// Evaluation order:
    /// 1) `$COVERFLOW_CONFIG_PATH` (TOML or JSON file),
    /// 2) `$COVERFLOW_CONFIG_JSON` (inline JSON),
    /// 3) `coverflow.toml`, `coverflow.json`, `config/coverflow.toml`,
    ///    `config/coverflow.json` in the working directory,
    /// 4) defaults.
    pub fn load_from_env() -> anyhow::Result<(Self, CarouselSettingsSource)> {
        Self::load_with(|name| env::var(name).ok(), Path::new("."))
    }

    /// Same as [`Self::load_from_env`] with an injected variable lookup and
    /// base directory for the default files.
    pub fn load_with(
        var: impl Fn(&str) -> Option<String>,
        base_dir: &Path,
    ) -> anyhow::Result<(Self, CarouselSettingsSource)> {
        if let Some(path_str) = var(PATH_VAR)
            && !path_str.trim().is_empty()
        {
            let path = PathBuf::from(path_str.trim());
            let settings = Self::load_from_file(&path)?;
            return Ok((settings, CarouselSettingsSource::EnvPath(path)));
        }

        if let Some(raw) = var(JSON_VAR)
            && !raw.trim().is_empty()
        {
            let parsed = Self::parse_json(&raw)
                .with_context(|| format!("failed to parse {JSON_VAR}"))?;
            return Ok((parsed, CarouselSettingsSource::EnvInline));
        }

        if let Some(path) = Self::find_default_file(base_dir) {
            let settings = Self::load_from_file(&path)?;
            log::info!("loaded carousel settings from {}", path.display());
            return Ok((settings, CarouselSettingsSource::File(path)));
        }

        Ok((Self::default(), CarouselSettingsSource::Default))
    }

    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path).with_context(|| {
            format!("failed to read carousel config from {}", path.display())
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::parse_json(&contents).with_context(|| {
                format!("invalid carousel config {}", path.display())
            }),
            Some("toml") => toml::from_str(&contents).map_err(|err| {
                anyhow!("invalid carousel config {}: {}", path.display(), err)
            }),
            _ => Self::parse_from_str(&contents, &path.display().to_string()),
        }
    }

    pub fn parse_from_str(contents: &str, origin: &str) -> anyhow::Result<Self> {
        // TOML first, then JSON.
        toml::from_str(contents).or_else(|toml_err| {
            serde_json::from_str(contents).map_err(|json_err| {
                anyhow!(
                    "failed to parse carousel config {}: toml error: {}; json error: {}",
                    origin,
                    toml_err,
                    json_err
                )
            })
        })
    }

    pub fn parse_json(raw: &str) -> anyhow::Result<Self> {
        serde_json::from_str(raw).map_err(|err| anyhow!("invalid carousel config json: {err}"))
    }

    fn find_default_file(base_dir: &Path) -> Option<PathBuf> {
        const CANDIDATES: &[&str] = &[
            "coverflow.toml",
            "coverflow.json",
            "config/coverflow.toml",
            "config/coverflow.json",
        ];

        CANDIDATES
            .iter()
            .map(|candidate| base_dir.join(candidate))
            .find(|path| path.exists())
    }

    /// Reject unusable values and collect soft warnings.
    pub fn validate(&self) -> Result<ConfigWarnings, ConfigGuardRailError> {
        validation::apply_guard_rails(self)
    }

    /// Overrides for the engine. Every field is set explicitly so the
    /// result does not depend on the core's compiled defaults changing.
    pub fn to_runtime_config(&self) -> RuntimeConfig {
        let mut config = RuntimeConfig {
            spring_stiffness: Some(self.motion.stiffness),
            spring_damping_ratio: Some(self.motion.damping_ratio),
            frame_interval_ms: Some(self.motion.frame_interval_ms),
            min_window_radius: Some(self.virtualization.min_window_radius),
            debounce_ms: Some(self.virtualization.debounce_ms),
            cache_capacity: Some(self.virtualization.cache_capacity),
            max_concurrent_loads: Some(self.virtualization.max_concurrent_loads),
            long_press_ms: Some(self.drag.long_press_ms),
            move_threshold_px: Some(self.drag.move_threshold_px),
            smoothing_tau_s: Some(self.drag.smoothing_tau_s),
            drop_duration_ms: Some(self.drag.drop_duration_ms),
            edge_zone_px: Some(self.drag.edge_zone_px),
            auto_scroll_max_items_per_s: Some(self.drag.auto_scroll_max_items_per_s),
            auto_scroll_interval_ms: Some(self.drag.auto_scroll_interval_ms),
            ..RuntimeConfig::default()
        };
        config.mark_dirty();
        config
    }

    pub fn layout_params(&self) -> LayoutParams {
        self.layout
    }
}
