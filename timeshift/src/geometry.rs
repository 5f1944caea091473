//! Tile-space to world-space rectangle mapping.
//!
//! Tile space: origin at the map's top-left corner, Y grows downward.
//! World space: origin at the map center, Y grows upward.

use serde::{Deserialize, Serialize};

use crate::level_data::TileRect;
use crate::math::Vec2;

/// Axis-aligned rectangle in world space, stored as center plus half extents.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldRect {
    pub center: Vec2,
    pub half_extents: Vec2,
}

impl WorldRect {
    /// Build a rect from center and half extents. Negative extents are folded
    /// to their absolute value.
    pub fn new(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            center,
            half_extents: Vec2::new(half_extents.x.abs(), half_extents.y.abs()),
        }
    }

    /// Build a rect from two opposite corners, in any order.
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        let min = Vec2::new(a.x.min(b.x), a.y.min(b.y));
        let max = Vec2::new(a.x.max(b.x), a.y.max(b.y));
        Self {
            center: (min + max) * 0.5,
            half_extents: (max - min) * 0.5,
        }
    }

    pub fn min(&self) -> Vec2 {
        self.center - self.half_extents
    }

    pub fn max(&self) -> Vec2 {
        self.center + self.half_extents
    }

    pub fn width(&self) -> f32 {
        self.half_extents.x * 2.0
    }

    pub fn height(&self) -> f32 {
        self.half_extents.y * 2.0
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        let (min, max) = (self.min(), self.max());
        p.x >= min.x && p.x <= max.x && p.y >= min.y && p.y <= max.y
    }

    /// Open intersection: rects that only touch along an edge or corner do
    /// not intersect, and a degenerate rect never intersects anything.
    pub fn intersects(&self, other: &WorldRect) -> bool {
        let (a_min, a_max) = (self.min(), self.max());
        let (b_min, b_max) = (other.min(), other.max());
        let overlap_x = a_max.x.min(b_max.x) - a_min.x.max(b_min.x);
        let overlap_y = a_max.y.min(b_max.y) - a_min.y.max(b_min.y);
        overlap_x > 0.0 && overlap_y > 0.0
    }

    /// Shrink each side inward by `ratio` of the full width/height.
    ///
    /// Extents never go below zero, whatever the ratio.
    pub fn shrink_by_ratio(&self, ratio: f32) -> WorldRect {
        let ratio = ratio.max(0.0);
        let hx = (self.half_extents.x - self.width() * ratio).max(0.0);
        let hy = (self.half_extents.y - self.height() * ratio).max(0.0);
        WorldRect {
            center: self.center,
            half_extents: Vec2::new(hx, hy),
        }
    }
}

/// Map a tile-space rect into world space.
///
/// Returns `None` for zero-area or negative-size rects and for any
/// non-finite input or result; such objects are malformed and must be
/// skipped by the caller.
pub fn map_to_world(rect: &TileRect, map_width: f32, map_height: f32) -> Option<WorldRect> {
    // `!(w > 0)` also rejects NaN.
    if !(rect.width > 0.0) || !(rect.height > 0.0) {
        return None;
    }
    transform(rect, map_width, map_height)
}

/// Map a spawn marker into world space.
///
/// Like [`map_to_world`], but zero width or height is allowed so point and
/// line markers map to a degenerate rect at their position. Negative or
/// non-finite sizes are still rejected.
pub fn map_marker_to_world(rect: &TileRect, map_width: f32, map_height: f32) -> Option<WorldRect> {
    if !(rect.width >= 0.0) || !(rect.height >= 0.0) {
        return None;
    }
    transform(rect, map_width, map_height)
}

fn transform(rect: &TileRect, map_width: f32, map_height: f32) -> Option<WorldRect> {
    let center_x = -map_width / 2.0 + rect.x + rect.width / 2.0;
    let center_y = -map_height / 2.0 - rect.y - rect.height / 2.0;
    let half_w = rect.width / 2.0;
    let half_h = rect.height / 2.0;

    if ![center_x, center_y, half_w, half_h]
        .iter()
        .all(|v| v.is_finite())
    {
        return None;
    }

    Some(WorldRect {
        center: Vec2::new(center_x, center_y),
        half_extents: Vec2::new(half_w, half_h),
    })
}

/// Inverse of [`map_to_world`]. The result carries no name or properties.
pub fn map_to_tile(rect: &WorldRect, map_width: f32, map_height: f32) -> TileRect {
    let width = rect.width();
    let height = rect.height();
    let x = rect.center.x + map_width / 2.0 - width / 2.0;
    let y = -map_height / 2.0 - height / 2.0 - rect.center.y;
    TileRect::new(x, y, width, height)
}

/// World rect covered by the whole map, run through the same transform as
/// every authored object so that camera bounds and geometry agree.
pub fn map_bounds(map_width: f32, map_height: f32) -> Option<WorldRect> {
    map_to_world(
        &TileRect::new(0.0, 0.0, map_width, map_height),
        map_width,
        map_height,
    )
}
