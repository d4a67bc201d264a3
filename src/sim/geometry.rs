//! Geometry primitives for circular entities
//!
//! Pure functions: circle containment/intersection, closest points and
//! axis-aligned bounds. No state.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle (screen space, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Rectangle covering a tank of the given size
    pub fn from_size(size: Vec2) -> Self {
        Self::new(Vec2::ZERO, size)
    }

    /// Bounding box of an ellipse-ish element
    pub fn around(center: Vec2, radius_x: f32, radius_y: f32) -> Self {
        let half = Vec2::new(radius_x, radius_y);
        Self::new(center - half, center + half)
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// Distance between two points
#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    (a - b).length()
}

/// True if the circle (inner) lies entirely inside the circle (outer)
#[inline]
pub fn circle_within_circle(
    inner_center: Vec2,
    inner_radius: f32,
    outer_center: Vec2,
    outer_radius: f32,
) -> bool {
    distance(inner_center, outer_center) + inner_radius <= outer_radius
}

/// True if two circles overlap (touching edges count)
#[inline]
pub fn circles_intersect(a_center: Vec2, a_radius: f32, b_center: Vec2, b_radius: f32) -> bool {
    distance(a_center, b_center) <= a_radius + b_radius
}

/// Gap between two circle edges, floored at zero
#[inline]
pub fn edge_gap(a_center: Vec2, a_radius: f32, b_center: Vec2, b_radius: f32) -> f32 {
    (distance(a_center, b_center) - (a_radius + b_radius)).max(0.0)
}

/// Closest point to `p` on the segment `a`..`b`
pub fn closest_point_on_segment(p: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let line_vec = b - a;
    let line_len_sq = line_vec.length_squared();

    if line_len_sq < 0.0001 {
        return a; // Degenerate segment
    }

    let t = ((p - a).dot(line_vec) / line_len_sq).clamp(0.0, 1.0);
    a + line_vec * t
}

/// Distance from `p` to the segment `a`..`b`
#[inline]
pub fn distance_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    distance(p, closest_point_on_segment(p, a, b))
}
