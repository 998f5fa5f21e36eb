//! Geometry and layout value types shared by the carousel modules

use serde::{Deserialize, Serialize};

use crate::infra::constants::projection;

/// Screen-space point in pixels, origin at the top-left of the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn lerp(self, other: Point, t: f32) -> Point {
        Point {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }
}

/// Viewport size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center(self) -> Point {
        Point::new(self.width * 0.5, self.height * 0.5)
    }

    pub fn is_empty(self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Tunable layout parameters. Any change invalidates projected geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutParams {
    pub item_width: f32,
    pub item_height: f32,
    pub item_spacing: f32,
    pub item_scale: f32,
    pub side_translation: f32,
    pub side_rotation_deg: f32,
    pub stack_spacing: f32,
    pub vertical_offset: f32,
    pub projection_distance: f32,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            item_width: projection::ITEM_WIDTH,
            item_height: projection::ITEM_HEIGHT,
            item_spacing: projection::ITEM_SPACING,
            item_scale: projection::ITEM_SCALE,
            side_translation: projection::SIDE_TRANSLATION,
            side_rotation_deg: projection::SIDE_ROTATION_DEG,
            stack_spacing: projection::STACK_SPACING,
            vertical_offset: projection::VERTICAL_OFFSET,
            projection_distance: projection::PROJECTION_DISTANCE,
        }
    }
}

impl LayoutParams {
    /// Width of one tile on screen before perspective.
    pub fn scaled_item_width(&self) -> f32 {
        self.item_width * self.item_scale
    }
}

/// Inclusive index range around a center item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VisibleRange {
    pub start: usize,
    pub end: usize,
    pub center: usize,
}

impl VisibleRange {
    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index <= self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> std::ops::RangeInclusive<usize> {
        self.start..=self.end
    }
}
