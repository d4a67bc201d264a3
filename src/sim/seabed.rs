//! Sea-bed obstacle
//!
//! The sea-bed is a closed region along the tank floor: a surface polyline
//! from the left wall to the right wall, closed along the bottom edge. It is
//! built from straight and arc segments.
//!
//! Two independent containment tests are exposed:
//! - fill: the shape lies inside the solid bed
//! - stroke: the shape overlaps the collision skin along the surface
//!
//! A shape inside the fill but not touching the stroke is "embedded", which
//! the plankton update treats as a recovery case.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::geometry::{Rect, distance_to_segment};
use crate::settings::SeaBedSettings;

/// Points sampled along each arc segment
const ARC_SAMPLES: usize = 8;
/// Largest arc bulge as a fraction of its chord
const MAX_ARC_BULGE: f32 = 0.25;
/// Bulges smaller than this are drawn as lines
const MIN_ARC_BULGE: f32 = 0.5;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SeaBedError {
    #[error("Sea-bed needs line or arc segments enabled")]
    NoSegmentTypes,
    #[error("Sea-bed needs at least one segment")]
    TooFewSegments,
    #[error("Tank size {0:?} cannot hold a sea-bed")]
    DegenerateTank(Vec2),
    #[error("Sea-bed surface needs at least two points ordered left to right")]
    InvalidSurface,
}

/// Shape of one surface segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentKind {
    Line,
    Arc,
}

/// The sea-bed geometry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeaBed {
    /// Surface polyline, left to right
    surface: Vec<Vec2>,
    /// Tank floor (closes the region)
    bottom: f32,
    /// Width of the collision skin
    stroke_thickness: f32,
    bounds: Rect,
}

impl SeaBed {
    /// Build a sea-bed from an explicit surface polyline
    pub fn from_surface(
        surface: Vec<Vec2>,
        bottom: f32,
        stroke_thickness: f32,
    ) -> Result<Self, SeaBedError> {
        if surface.len() < 2 {
            return Err(SeaBedError::InvalidSurface);
        }
        let first = surface[0].x;
        let last = surface[surface.len() - 1].x;
        if !(last > first) || surface.iter().any(|p| !p.is_finite()) {
            return Err(SeaBedError::InvalidSurface);
        }

        let top = surface.iter().fold(bottom, |top, p| top.min(p.y));
        let bounds = Rect::new(Vec2::new(first, top), Vec2::new(last, bottom));

        Ok(Self {
            surface,
            bottom,
            stroke_thickness: stroke_thickness.max(0.0),
            bounds,
        })
    }

    /// A level sea-bed with its surface at `surface_y`
    pub fn flat(tank: Vec2, surface_y: f32, stroke_thickness: f32) -> Result<Self, SeaBedError> {
        Self::from_surface(
            vec![Vec2::new(0.0, surface_y), Vec2::new(tank.x, surface_y)],
            tank.y,
            stroke_thickness,
        )
    }

    /// Generate a random sea-bed spanning the tank floor
    pub fn generate(
        settings: &SeaBedSettings,
        tank: Vec2,
        rng: &mut impl Rng,
    ) -> Result<Self, SeaBedError> {
        if !settings.use_line_segments && !settings.use_arc_segments {
            return Err(SeaBedError::NoSegmentTypes);
        }
        if settings.segments == 0 {
            return Err(SeaBedError::TooFewSegments);
        }
        if !(tank.x > 0.0 && tank.y > 0.0) {
            return Err(SeaBedError::DegenerateTank(tank));
        }

        let low = settings.minimum_height.min(settings.maximum_height).clamp(0.0, 1.0);
        let high = settings.maximum_height.max(settings.minimum_height).clamp(0.0, 1.0);
        let segment_width = tank.x / settings.segments as f32;

        let stops: Vec<Vec2> = (0..=settings.segments)
            .map(|i| {
                let height = if high > low {
                    rng.random_range(low..=high)
                } else {
                    low
                };
                Vec2::new(i as f32 * segment_width, tank.y - height * tank.y)
            })
            .collect();

        let mut surface = vec![stops[0]];
        let mut lines = 0;
        let mut arcs = 0;
        for pair in stops.windows(2) {
            let kind = match (settings.use_line_segments, settings.use_arc_segments) {
                (true, true) => {
                    if rng.random_bool(0.5) {
                        SegmentKind::Line
                    } else {
                        SegmentKind::Arc
                    }
                }
                (true, false) => SegmentKind::Line,
                _ => SegmentKind::Arc,
            };

            match kind {
                SegmentKind::Line => {
                    lines += 1;
                    surface.push(pair[1]);
                }
                SegmentKind::Arc => {
                    arcs += 1;
                    let chord = (pair[1] - pair[0]).length();
                    let bulge = rng.random_range(-MAX_ARC_BULGE..=MAX_ARC_BULGE) * chord;
                    for p in sample_arc(pair[0], pair[1], bulge) {
                        surface.push(Vec2::new(p.x, p.y.min(tank.y)));
                    }
                }
            }
        }

        log::info!(
            "Generated sea-bed: {} line + {} arc segments over {}x{}",
            lines,
            arcs,
            tank.x,
            tank.y
        );

        Self::from_surface(surface, tank.y, settings.stroke_thickness)
    }

    /// The same bed stretched from one tank size to another
    pub fn rescaled(&self, from: Vec2, to: Vec2) -> Result<Self, SeaBedError> {
        for size in [from, to] {
            if !(size.is_finite() && size.x > 0.0 && size.y > 0.0) {
                return Err(SeaBedError::DegenerateTank(size));
            }
        }
        let scale = to / from;
        let surface = self.surface.iter().map(|p| *p * scale).collect();
        Self::from_surface(surface, self.bottom * scale.y, self.stroke_thickness)
    }

    #[inline]
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Highest point of the surface (smallest y)
    #[inline]
    pub fn top(&self) -> f32 {
        self.bounds.min.y
    }

    #[inline]
    pub fn stroke_thickness(&self) -> f32 {
        self.stroke_thickness
    }

    pub fn surface(&self) -> &[Vec2] {
        &self.surface
    }

    /// Closed outline for rendering: surface, then the floor corners
    pub fn outline(&self) -> Vec<Vec2> {
        let mut outline = self.surface.clone();
        outline.push(Vec2::new(self.bounds.max.x, self.bottom));
        outline.push(Vec2::new(self.bounds.min.x, self.bottom));
        outline
    }

    /// Height of the surface at `x` (the highest crossing if arcs overhang)
    pub fn surface_y(&self, x: f32) -> Option<f32> {
        let mut best: Option<f32> = None;
        for pair in self.surface.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let (lo, hi) = if a.x <= b.x { (a, b) } else { (b, a) };
            if x < lo.x || x > hi.x {
                continue;
            }
            let span = hi.x - lo.x;
            let y = if span < 1e-6 {
                lo.y.min(hi.y)
            } else {
                lo.y + (hi.y - lo.y) * ((x - lo.x) / span)
            };
            best = Some(best.map_or(y, |b| b.min(y)));
        }
        best
    }

    /// Is the point inside the solid bed
    pub fn fill_contains_point(&self, p: Vec2) -> bool {
        if p.y > self.bottom {
            return false;
        }
        self.surface_y(p.x).is_some_and(|surface| p.y >= surface)
    }

    /// Unsigned distance from `p` to the surface polyline
    pub fn distance_to_surface(&self, p: Vec2) -> f32 {
        self.surface
            .windows(2)
            .map(|pair| distance_to_segment(p, pair[0], pair[1]))
            .fold(f32::MAX, f32::min)
    }

    /// Signed distance to the bed: negative inside the fill
    pub fn signed_distance(&self, p: Vec2) -> f32 {
        let d = self.distance_to_surface(p);
        if self.fill_contains_point(p) { -d } else { d }
    }

    /// Does the circle's whole area lie inside the solid bed
    pub fn fill_contains_circle(&self, center: Vec2, radius: f32) -> bool {
        self.signed_distance(center) <= -radius
    }

    /// Does the circle overlap the surface skin
    pub fn stroke_contains_circle(&self, center: Vec2, radius: f32) -> bool {
        self.distance_to_surface(center) <= radius + self.stroke_thickness * 0.5
    }
}

/// Sample a circular arc from `a` to `b` whose apex sits `bulge` away from the
/// chord midpoint (positive bulges rise toward smaller y). Excludes `a`.
fn sample_arc(a: Vec2, b: Vec2, bulge: f32) -> Vec<Vec2> {
    let chord = b - a;
    let length = chord.length();
    if bulge.abs() < MIN_ARC_BULGE || length < 1e-3 {
        return vec![b];
    }

    let dir = chord / length;
    let normal = Vec2::new(dir.y, -dir.x);
    let mid = (a + b) * 0.5;

    // Signed radius: the center sits on the far side of the chord from the apex
    let radius = (length * length * 0.25 + bulge * bulge) / (2.0 * bulge);
    let center = mid + normal * (bulge - radius);

    let start = (a - center).y.atan2((a - center).x);
    let end = (b - center).y.atan2((b - center).x);
    let mut sweep = end - start;
    if sweep > std::f32::consts::PI {
        sweep -= std::f32::consts::TAU;
    } else if sweep < -std::f32::consts::PI {
        sweep += std::f32::consts::TAU;
    }

    let r = radius.abs();
    let mut points: Vec<Vec2> = (1..ARC_SAMPLES)
        .map(|i| {
            let theta = start + sweep * (i as f32 / ARC_SAMPLES as f32);
            center + Vec2::new(theta.cos(), theta.sin()) * r
        })
        .collect();
    points.push(b);
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn flat_bed() -> SeaBed {
        SeaBed::flat(Vec2::new(800.0, 600.0), 500.0, 4.0).unwrap()
    }

    #[test]
    fn test_fill_contains_point() {
        let bed = flat_bed();
        assert!(bed.fill_contains_point(Vec2::new(400.0, 550.0)));
        assert!(!bed.fill_contains_point(Vec2::new(400.0, 450.0)));
        assert!(!bed.fill_contains_point(Vec2::new(900.0, 550.0)));
    }

    #[test]
    fn test_embedded_versus_surface_contact() {
        let bed = flat_bed();

        // Deep inside: fill yes, stroke no
        let deep = Vec2::new(400.0, 560.0);
        assert!(bed.fill_contains_circle(deep, 10.0));
        assert!(!bed.stroke_contains_circle(deep, 10.0));

        // Resting on the surface: stroke yes
        let touching = Vec2::new(400.0, 495.0);
        assert!(bed.stroke_contains_circle(touching, 10.0));
        assert!(!bed.fill_contains_circle(touching, 10.0));

        // Clear of the bed: neither
        let clear = Vec2::new(400.0, 300.0);
        assert!(!bed.stroke_contains_circle(clear, 10.0));
        assert!(!bed.fill_contains_circle(clear, 10.0));
    }

    #[test]
    fn test_generate_rejects_no_segment_types() {
        let settings = SeaBedSettings {
            use_line_segments: false,
            use_arc_segments: false,
            ..Default::default()
        };
        let mut rng = Pcg32::seed_from_u64(1);
        let result = SeaBed::generate(&settings, Vec2::new(800.0, 600.0), &mut rng);
        assert_eq!(result.unwrap_err(), SeaBedError::NoSegmentTypes);
    }

    #[test]
    fn test_generate_rejects_degenerate_tank() {
        let mut rng = Pcg32::seed_from_u64(1);
        let result = SeaBed::generate(&SeaBedSettings::default(), Vec2::new(0.0, 600.0), &mut rng);
        assert!(matches!(result, Err(SeaBedError::DegenerateTank(_))));
    }

    #[test]
    fn test_generated_bed_spans_floor() {
        let tank = Vec2::new(800.0, 600.0);
        for (lines, arcs) in [(true, false), (false, true), (true, true)] {
            let settings = SeaBedSettings {
                use_line_segments: lines,
                use_arc_segments: arcs,
                ..Default::default()
            };
            let mut rng = Pcg32::seed_from_u64(42);
            let bed = SeaBed::generate(&settings, tank, &mut rng).unwrap();

            assert_eq!(bed.bounds().min.x, 0.0);
            assert!((bed.bounds().max.x - tank.x).abs() < 1e-3);
            for x in [0.0, 123.0, 400.0, 799.0] {
                let y = bed.surface_y(x).expect("surface covers the tank width");
                assert!(y <= tank.y && y > tank.y * 0.5, "y = {y}");
            }
            // The floor corners are always solid
            assert!(bed.fill_contains_point(Vec2::new(1.0, tank.y - 0.5)));
        }
    }

    #[test]
    fn test_arc_passes_through_endpoints() {
        let a = Vec2::new(0.0, 100.0);
        let b = Vec2::new(60.0, 100.0);
        let points = sample_arc(a, b, 10.0);
        assert_eq!(*points.last().unwrap(), b);
        // Positive bulge rises (smaller y) between the endpoints
        let apex = points[ARC_SAMPLES / 2 - 1];
        assert!(apex.y < 100.0);
        assert!((apex.x - 30.0).abs() < 1.0);
        assert!((apex.y - 90.0).abs() < 0.5);
    }

    #[test]
    fn test_rescaled_spans_new_tank() {
        let bed = flat_bed();
        let scaled = bed
            .rescaled(Vec2::new(800.0, 600.0), Vec2::new(1600.0, 300.0))
            .unwrap();
        assert_eq!(scaled.bounds().max, Vec2::new(1600.0, 300.0));
        assert_eq!(scaled.surface_y(1200.0), Some(250.0));
        assert_eq!(scaled.stroke_thickness(), bed.stroke_thickness());

        let result = bed.rescaled(Vec2::new(800.0, 600.0), Vec2::new(0.0, 300.0));
        assert!(matches!(result, Err(SeaBedError::DegenerateTank(_))));
    }

    #[test]
    fn test_outline_is_closed_along_floor() {
        let bed = flat_bed();
        let outline = bed.outline();
        assert_eq!(outline.len(), 4);
        assert_eq!(outline[2], Vec2::new(800.0, 600.0));
        assert_eq!(outline[3], Vec2::new(0.0, 600.0));
    }
}
