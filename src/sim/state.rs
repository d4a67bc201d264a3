//! Simulation state and core entity types
//!
//! Everything one tick reads and writes lives in [`SimState`].

use std::collections::VecDeque;
use std::f32::consts::PI;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::current::Current;
use super::geometry::Rect;
use super::seabed::SeaBed;
use crate::consts::*;
use crate::heading_to_step;
use crate::settings::Settings;

/// Plankton never generate smaller than this radius
pub const MIN_PLANKTON_RADIUS: f32 = 0.5;

/// Reduce `value` by a uniformly drawn percentage in [0, percentage]
pub fn reduce_by_random_percentage(rng: &mut impl Rng, value: f32, percentage: f32) -> f32 {
    let percentage = if percentage.is_finite() {
        percentage.clamp(0.0, 100.0)
    } else {
        0.0
    };
    let cut = rng.random_range(0.0..=percentage);
    value * (1.0 - cut / 100.0)
}

/// Shape shared by every drifting circular entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub center: Vec2,
    pub radius_x: f32,
    pub radius_y: f32,
    /// Displacement per tick
    pub velocity: Vec2,
}

impl Body {
    pub fn new(center: Vec2, radius: f32, velocity: Vec2) -> Self {
        let mut body = Self {
            center,
            radius_x: radius,
            radius_y: radius,
            velocity,
        };
        body.clamp_radii();
        body
    }

    /// Mean radius
    #[inline]
    pub fn radius(&self) -> f32 {
        (self.radius_x + self.radius_y) * 0.5
    }

    /// Bounding width
    #[inline]
    pub fn width(&self) -> f32 {
        self.radius_x * 2.0
    }

    #[inline]
    pub fn bounds(&self) -> Rect {
        Rect::around(self.center, self.radius_x, self.radius_y)
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    /// Visual "mass": mean radius x PI x density
    #[inline]
    pub fn mass(&self, density: f32) -> f32 {
        self.radius() * PI * density
    }

    /// Adjust both radii, never going below zero
    pub fn grow(&mut self, amount: f32) {
        self.radius_x += amount;
        self.radius_y += amount;
        self.clamp_radii();
    }

    pub fn clamp_radii(&mut self) {
        for r in [&mut self.radius_x, &mut self.radius_y] {
            if !r.is_finite() || *r < 0.0 {
                *r = 0.0;
            }
        }
    }

    /// Move the center only if the result is finite
    pub fn try_move_to(&mut self, center: Vec2) -> bool {
        if center.is_finite() {
            self.center = center;
            true
        } else {
            false
        }
    }

    /// `center += velocity`, rejecting non-finite results
    pub fn integrate(&mut self) -> bool {
        if !self.velocity.is_finite() {
            self.velocity = Vec2::ZERO;
            return false;
        }
        self.try_move_to(self.center + self.velocity)
    }

    /// Keep the whole body inside the tank
    pub fn clamp_inside(&mut self, tank: Vec2) {
        self.center.x = clamp_axis(self.center.x, self.radius_x, tank.x);
        self.center.y = clamp_axis(self.center.y, self.radius_y, tank.y);
    }
}

/// Clamp a coordinate so [value - radius, value + radius] stays in [0, extent]
fn clamp_axis(value: f32, radius: f32, extent: f32) -> f32 {
    if extent <= radius * 2.0 {
        extent * 0.5
    } else {
        value.clamp(radius, extent - radius)
    }
}

/// One member of the swarm
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plankton {
    pub id: u32,
    pub body: Body,
}

/// Main (pointer-bound) or child (spawned) bubble
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BubbleKind {
    Main,
    Child,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bubble {
    pub kind: BubbleKind,
    pub body: Body,
    /// Cleared when popped; popped bubbles are purged at the end of the tick
    pub alive: bool,
}

impl Bubble {
    pub fn main(center: Vec2, radius: f32) -> Self {
        Self {
            kind: BubbleKind::Main,
            body: Body::new(center, radius, Vec2::ZERO),
            alive: true,
        }
    }

    pub fn child(center: Vec2, radius: f32) -> Self {
        Self {
            kind: BubbleKind::Child,
            body: Body::new(center, radius, Vec2::ZERO),
            alive: true,
        }
    }

    #[inline]
    pub fn is_main(&self) -> bool {
        self.kind == BubbleKind::Main
    }

    pub fn pop(&mut self) {
        self.alive = false;
    }
}

/// Sliding window of per-tick main bubble collision counts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollisionHistory {
    window: VecDeque<u32>,
}

impl Default for CollisionHistory {
    fn default() -> Self {
        Self {
            window: VecDeque::with_capacity(COLLISION_HISTORY_LEN),
        }
    }
}

impl CollisionHistory {
    /// Record a tick, dropping the oldest once the window is full
    pub fn push(&mut self, collisions: u32) {
        if self.window.len() >= COLLISION_HISTORY_LEN {
            self.window.pop_front();
        }
        self.window.push_back(collisions);
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &u32> {
        self.window.iter()
    }

    /// Mean collisions per tick over the window (zero when empty)
    pub fn mean(&self) -> f32 {
        if self.window.is_empty() {
            return 0.0;
        }
        self.window.iter().sum::<u32>() as f32 / self.window.len() as f32
    }

    pub fn clear(&mut self) {
        self.window.clear();
    }
}

/// Complete simulation state for one tank
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimState {
    /// Tank size (width, height)
    pub tank: Vec2,
    /// The swarm, in stable iteration order
    pub plankton: Vec<Plankton>,
    pub main_bubble: Option<Bubble>,
    /// Child bubbles in spawn order
    pub child_bubbles: Vec<Bubble>,
    pub current: Current,
    /// Heading shown to the user (degrees)
    pub current_direction: f32,
    pub collision_history: CollisionHistory,
    pub sea_bed: Option<SeaBed>,
    /// Preview zoom factor driven by autopan
    pub zoom: f32,
    /// Plankton the preview followed last tick
    pub focused_plankton: Option<u32>,
    /// Pointer position last tick (for the main bubble's velocity)
    pub last_pointer: Option<Vec2>,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Next plankton ID
    next_id: u32,
}

impl SimState {
    /// An empty tank with an inactive current
    pub fn new(settings: &Settings, tank: Vec2, sea_bed: Option<SeaBed>) -> Self {
        Self {
            tank,
            plankton: Vec::new(),
            main_bubble: None,
            child_bubbles: Vec::new(),
            current: Current::new(&settings.current),
            current_direction: crate::normalize_degrees(settings.current.direction),
            collision_history: CollisionHistory::default(),
            sea_bed,
            zoom: settings.autopan.minimum_zoom,
            focused_plankton: None,
            last_pointer: None,
            time_ticks: 0,
            next_id: 1,
        }
    }

    /// Allocate a new plankton ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Add one plankton with the given shape
    pub fn add_plankton(&mut self, center: Vec2, radius: f32, velocity: Vec2) -> u32 {
        let id = self.next_entity_id();
        self.plankton.push(Plankton {
            id,
            body: Body::new(center, radius, velocity),
        });
        id
    }

    /// Fill the tank with a fresh randomized swarm
    pub fn populate(&mut self, settings: &Settings, rng: &mut impl Rng) {
        let cfg = &settings.plankton;
        self.plankton.clear();
        self.plankton.reserve(cfg.count);

        for _ in 0..cfg.count {
            let radius = reduce_by_random_percentage(rng, cfg.size * 0.5, cfg.size_variation)
                .max(MIN_PLANKTON_RADIUS);
            let center = self.random_open_position(radius, rng);
            let heading = rng.random_range(0.0..360.0);
            let speed = rng.random_range(0.0..=cfg.travel.max(0.0));
            self.add_plankton(center, radius, heading_to_step(heading, speed));
        }

        log::info!("Populated tank with {} plankton", self.plankton.len());
    }

    /// A random position for a circle that keeps it inside the tank and off the sea-bed
    fn random_open_position(&self, radius: f32, rng: &mut impl Rng) -> Vec2 {
        let mut candidate = self.tank * 0.5;
        for _ in 0..PLACEMENT_ATTEMPTS {
            candidate = Vec2::new(
                random_axis(rng, radius, self.tank.x),
                random_axis(rng, radius, self.tank.y),
            );
            let blocked = self.sea_bed.as_ref().is_some_and(|bed| {
                bed.fill_contains_point(candidate) || bed.stroke_contains_circle(candidate, radius)
            });
            if !blocked {
                return candidate;
            }
        }
        // Give up and park it along the top edge
        Vec2::new(candidate.x, radius.min(self.tank.y * 0.5))
    }

    /// Largest plankton mass the settings can produce
    pub fn max_plankton_mass(settings: &Settings) -> f32 {
        settings.plankton.size * 0.5 * PI * settings.plankton.density
    }

    pub fn find_plankton(&self, id: u32) -> Option<&Plankton> {
        self.plankton.iter().find(|p| p.id == id)
    }

    /// Live child bubbles (not yet popped)
    pub fn live_child_bubbles(&self) -> impl Iterator<Item = &Bubble> {
        self.child_bubbles.iter().filter(|b| b.alive)
    }
}

fn random_axis(rng: &mut impl Rng, radius: f32, extent: f32) -> f32 {
    if extent <= radius * 2.0 {
        extent * 0.5
    } else {
        rng.random_range(radius..=extent - radius)
    }
}
