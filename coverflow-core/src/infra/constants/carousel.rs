//! Carousel constants
//!
//! Shared defaults for the selection spring, the perspective layout, image
//! virtualization and drag-to-reorder. Tuning should happen here so the
//! interaction-side and render-side instances stay identical.

/// Spring integrator defaults for the selection animator.
pub mod motion {
    /// Spring stiffness (1/s²).
    pub const STIFFNESS: f64 = 45.0;
    /// Damping multiplier over critical damping. Slightly overdamped so the
    /// index never overshoots.
    pub const DAMPING_RATIO: f64 = 1.15;
    /// Snap once the remaining distance falls below this many items...
    pub const SNAP_DISTANCE: f64 = 1e-3;
    /// ...and the velocity below this many items per second.
    pub const SNAP_VELOCITY: f64 = 1e-2;
    /// Upper bound for a single integration step (seconds).
    pub const MAX_DT_S: f64 = 0.1;
    /// Frame cadence used while anything animates (ms).
    pub const FRAME_INTERVAL_MS: u64 = 16;
}

/// Perspective layout defaults.
pub mod projection {
    /// Tile width before scaling (px).
    pub const ITEM_WIDTH: f32 = 200.0;
    /// Tile height before scaling (px).
    pub const ITEM_HEIGHT: f32 = 300.0;
    /// Spacing multiplier applied to lateral and depth translation.
    pub const ITEM_SPACING: f32 = 1.0;
    /// Uniform tile scale.
    pub const ITEM_SCALE: f32 = 1.0;
    /// Lateral displacement of the first side item (px).
    pub const SIDE_TRANSLATION: f32 = 250.0;
    /// Maximum Y rotation of side items (degrees).
    pub const SIDE_ROTATION_DEG: f32 = 55.0;
    /// Extra spacing between stacked side items (px).
    pub const STACK_SPACING: f32 = 120.0;
    /// Vertical offset of the strip relative to the viewport center (px).
    pub const VERTICAL_OFFSET: f32 = 0.0;
    /// Camera distance used for the perspective divide (px).
    pub const PROJECTION_DISTANCE: f32 = 1000.0;

    /// Steepness of the lateral `tanh` easing.
    pub const EASE_STEEPNESS: f32 = 2.2;
    /// Distance from center after which items start stacking.
    pub const STACK_START: f32 = 0.45;
    /// Stacking exponent.
    pub const STACK_EXPONENT: f32 = 1.1;
    /// Depth exponent.
    pub const DEPTH_EXPONENT: f32 = 0.8;
    /// Depth per item (px, before spacing/scale).
    pub const DEPTH_PER_ITEM: f32 = 220.0;
    /// Extra scale of the centered tile.
    pub const POP_AMPLITUDE: f32 = 0.18;
    /// Falloff of the center pop.
    pub const POP_FALLOFF: f32 = 6.0;
    /// Linear shrink per item of distance.
    pub const SHRINK_PER_ITEM: f32 = 0.06;
    /// Lower bound for the pop scale so far tiles never invert.
    pub const MIN_POP_SCALE: f32 = 0.05;
    /// Perspective divide clamp.
    pub const MIN_PERSPECTIVE: f32 = 0.5;
    /// Perspective divide clamp.
    pub const MAX_PERSPECTIVE: f32 = 1.6;
    /// Quad caches drop their contents when the index moves more than this.
    pub const CACHE_INDEX_EPSILON: f64 = 1e-4;
}

/// Image residency defaults.
pub mod virtualization {
    /// Minimum number of items kept resident on each side of the focus.
    pub const MIN_WINDOW_RADIUS: usize = 12;
    /// Extra items added to the layout-derived radius.
    pub const WINDOW_MARGIN: usize = 2;
    /// Focus bursts within this interval coalesce into one recompute (ms).
    pub const DEBOUNCE_MS: u64 = 32;
    /// Maximum number of decoded images held in memory.
    pub const CACHE_CAPACITY: usize = 200;
    /// Loads allowed to run at the same time.
    pub const MAX_CONCURRENT_LOADS: usize = 8;
}

/// Hit-testing defaults.
pub mod hit_test {
    /// Denominator of the linear fallback, in tile widths.
    pub const FALLBACK_STRIDE_FACTOR: f32 = 1.5;
}

/// Press, drag and drop defaults.
pub mod drag {
    /// Hold duration before a press turns into a drag (ms).
    pub const LONG_PRESS_MS: u64 = 300;
    /// Pointer travel that turns a press into a pan instead (px).
    pub const MOVE_THRESHOLD_PX: f32 = 15.0;
    /// Time constant of the drop-target smoothing (s).
    pub const SMOOTHING_TAU_S: f32 = 0.25;
    /// Duration of the commit animation (ms).
    pub const DROP_DURATION_MS: u64 = 250;
    /// Width of the auto-scroll zone on either edge (px).
    pub const EDGE_ZONE_PX: f32 = 120.0;
    /// Auto-scroll rate at full edge penetration (items/s).
    pub const AUTO_SCROLL_MAX_ITEMS_PER_S: f32 = 10.0;
    /// Auto-scroll cadence (ms).
    pub const AUTO_SCROLL_INTERVAL_MS: u64 = 16;
}

/// Render loop defaults.
pub mod render {
    /// Opacity of the tile following the pointer.
    pub const DRAGGED_OPACITY: f32 = 0.92;
    /// Number of items at the window edge that fade out.
    pub const EDGE_FADE_ITEMS: f32 = 2.0;
}
