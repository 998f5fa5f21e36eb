//! Perspective projection of carousel tiles
//!
//! A pure mapping from (item position, current index, viewport, layout) to a
//! screen-space quad. The render loop and the hit-tester both go through
//! [`project_at`], so what is drawn and what is hit never disagree.

use std::collections::HashMap;

use super::types::{LayoutParams, Point, Size, VisibleRange};
use crate::infra::constants::{projection, virtualization};

/// Screen-space quad of one tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedQuad {
    /// Clockwise from top-left: TL, TR, BR, BL.
    pub corners: [Point; 4],
    /// Pop scale times the perspective factor at the tile's center.
    pub depth_scale: f32,
    /// Model-space Z of the tile center (0 at the focus, negative behind).
    pub depth: f32,
}

impl ProjectedQuad {
    /// Centroid of the four corners.
    pub fn center(&self) -> Point {
        let (sx, sy) = self
            .corners
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        Point::new(sx * 0.25, sy * 0.25)
    }

    /// Point-in-convex-quad test: all four edge cross products share a sign.
    /// Points exactly on an edge count as inside.
    pub fn contains(&self, point: Point) -> bool {
        let mut sign = 0.0_f32;
        for k in 0..4 {
            let a = self.corners[k];
            let b = self.corners[(k + 1) % 4];
            let cross = (b.x - a.x) * (point.y - a.y) - (b.y - a.y) * (point.x - a.x);
            if cross == 0.0 {
                continue;
            }
            if sign == 0.0 {
                sign = cross.signum();
            } else if cross.signum() != sign {
                return false;
            }
        }
        true
    }

    /// Corner-wise interpolation toward `other`.
    pub fn lerp(&self, other: &ProjectedQuad, t: f32) -> ProjectedQuad {
        let mut corners = self.corners;
        for (corner, target) in corners.iter_mut().zip(other.corners.iter()) {
            *corner = corner.lerp(*target, t);
        }
        ProjectedQuad {
            corners,
            depth_scale: self.depth_scale + (other.depth_scale - self.depth_scale) * t,
            depth: self.depth + (other.depth - self.depth) * t,
        }
    }

    /// Same quad moved by `(dx, dy)` pixels.
    pub fn translated(&self, dx: f32, dy: f32) -> ProjectedQuad {
        let mut corners = self.corners;
        for corner in corners.iter_mut() {
            corner.x += dx;
            corner.y += dy;
        }
        ProjectedQuad { corners, ..*self }
    }
}

/// Project item `index` for the given focus position.
pub fn project(
    index: usize,
    current_index: f64,
    viewport: Size,
    params: &LayoutParams,
) -> ProjectedQuad {
    project_at(index as f64, current_index, viewport, params)
}

/// Project a tile sitting at a fractional strip `position`.
pub fn project_at(
    position: f64,
    current_index: f64,
    viewport: Size,
    params: &LayoutParams,
) -> ProjectedQuad {
    let diff = (position - current_index) as f32;
    let abs_diff = diff.abs();

    let ease = (diff * projection::EASE_STEEPNESS).tanh();
    let rotation = (-ease * params.side_rotation_deg).to_radians();
    let stack_offset = diff.signum()
        * (abs_diff - projection::STACK_START)
            .max(0.0)
            .powf(projection::STACK_EXPONENT)
        * params.stack_spacing;
    let spread = params.item_spacing * params.item_scale;
    let translation_x = (ease * params.side_translation + stack_offset) * spread;
    let translation_z =
        -abs_diff.powf(projection::DEPTH_EXPONENT) * projection::DEPTH_PER_ITEM * spread;
    let bump = (-abs_diff * abs_diff * projection::POP_FALLOFF).exp();
    let pop = (1.0 + projection::POP_AMPLITUDE * bump
        - abs_diff * projection::SHRINK_PER_ITEM)
        .max(projection::MIN_POP_SCALE);

    let half_w = params.item_width * params.item_scale * 0.5;
    let half_h = params.item_height * params.item_scale * 0.5;
    let (sin_r, cos_r) = rotation.sin_cos();
    let origin = viewport.center();
    let distance = params.projection_distance;

    let corner = |x: f32, y: f32| {
        // scale, rotate about Y, translate
        let x = x * pop;
        let y = y * pop;
        let world_x = x * cos_r + translation_x;
        let world_y = y + params.vertical_offset;
        let world_z = -x * sin_r + translation_z;
        let s = perspective(distance, world_z);
        Point::new(origin.x + world_x * s, origin.y + world_y * s)
    };

    ProjectedQuad {
        corners: [
            corner(-half_w, -half_h),
            corner(half_w, -half_h),
            corner(half_w, half_h),
            corner(-half_w, half_h),
        ],
        depth_scale: pop * perspective(distance, translation_z),
        depth: translation_z,
    }
}

fn perspective(distance: f32, z: f32) -> f32 {
    let denom = distance - z;
    if denom <= f32::EPSILON {
        return projection::MAX_PERSPECTIVE;
    }
    (distance / denom).clamp(projection::MIN_PERSPECTIVE, projection::MAX_PERSPECTIVE)
}

/// Items needed on each side of the focus to cover half the viewport, plus a
/// margin.
pub fn derived_window_radius(viewport: Size, params: &LayoutParams) -> usize {
    let stride = params.item_width * params.item_scale * params.item_spacing;
    if stride <= 0.0 || viewport.width <= 0.0 {
        return virtualization::WINDOW_MARGIN;
    }
    let covered = (viewport.width * 0.5 / stride).ceil();
    covered as usize + virtualization::WINDOW_MARGIN
}

/// Effective residency radius: the configured minimum or the layout-derived
/// radius, whichever is larger.
pub fn window_radius(min_radius: usize, viewport: Size, params: &LayoutParams) -> usize {
    min_radius.max(derived_window_radius(viewport, params))
}

/// Rounded focus clamped into `[0, item_count)`. `None` for an empty strip.
pub fn center_index(current_index: f64, item_count: usize) -> Option<usize> {
    if item_count == 0 {
        return None;
    }
    let rounded = current_index.round();
    if !rounded.is_finite() || rounded <= 0.0 {
        return Some(0);
    }
    Some((rounded as usize).min(item_count - 1))
}

/// `[center - radius, center + radius]` clipped to the strip.
pub fn visible_range(current_index: f64, item_count: usize, radius: usize) -> Option<VisibleRange> {
    let center = center_index(current_index, item_count)?;
    Some(VisibleRange {
        start: center.saturating_sub(radius),
        end: center.saturating_add(radius).min(item_count - 1),
        center,
    })
}

/// `c, c+1, c-1, c+2, c-2, …` limited to the strip and `radius`.
pub fn outward_from(
    center: usize,
    item_count: usize,
    radius: usize,
) -> impl Iterator<Item = usize> {
    std::iter::once(center)
        .filter(move |c| *c < item_count)
        .chain((1..=radius).flat_map(move |k| {
            let right = center.checked_add(k).filter(|i| *i < item_count);
            let left = center.checked_sub(k).filter(|i| *i < item_count);
            right.into_iter().chain(left)
        }))
}

/// Far-to-near paint order for `range`. On equal distance the right-hand item
/// paints later, matching the hit-tester's right-first probing.
pub fn draw_order(range: VisibleRange, current_index: f64) -> Vec<usize> {
    let mut order: Vec<usize> = range.iter().collect();
    order.sort_by(|a, b| {
        let da = (*a as f64 - current_index).abs();
        let db = (*b as f64 - current_index).abs();
        db.total_cmp(&da).then(a.cmp(b))
    });
    order
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct CacheKey {
    viewport: Size,
    params: LayoutParams,
    current_index: f64,
}

/// Per-frame quad cache. Any viewport or layout change, or a focus move past
/// a small epsilon, drops every cached quad.
#[derive(Debug, Default)]
pub struct QuadCache {
    key: Option<CacheKey>,
    quads: HashMap<usize, ProjectedQuad>,
}

impl QuadCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop cached quads unless they were computed for these inputs.
    pub fn validate(&mut self, viewport: Size, params: &LayoutParams, current_index: f64) {
        let fresh = match &self.key {
            Some(key) => {
                key.viewport == viewport
                    && key.params == *params
                    && (key.current_index - current_index).abs() <= projection::CACHE_INDEX_EPSILON
            }
            None => false,
        };
        if !fresh {
            self.quads.clear();
            self.key = Some(CacheKey {
                viewport,
                params: *params,
                current_index,
            });
        }
    }

    /// Cached quad for `index`, projecting it on a miss.
    pub fn quad(
        &mut self,
        index: usize,
        current_index: f64,
        viewport: Size,
        params: &LayoutParams,
    ) -> ProjectedQuad {
        self.validate(viewport, params, current_index);
        // Quads stay keyed to the focus they were computed for.
        let anchor = self.key.map_or(current_index, |key| key.current_index);
        *self
            .quads
            .entry(index)
            .or_insert_with(|| project(index, anchor, viewport, params))
    }

    pub fn invalidate(&mut self) {
        self.key = None;
        self.quads.clear();
    }

    pub fn len(&self) -> usize {
        self.quads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }
}
