//! Bubble lifecycle
//!
//! The main bubble mirrors the pointer. Child bubbles spawn under the pointer,
//! rise, swell with the current and pop when they leave the tank or hit the
//! sea-bed. Popping is two-phase: bubbles are marked dead during the tick and
//! purged at its end, so indices stay stable while the tick runs.

use glam::{Vec2, Vec3};
use rand::Rng;

use super::geometry::Rect;
use super::state::{Bubble, SimState, reduce_by_random_percentage};
use crate::consts::MIN_CHILD_BUBBLE_RADIUS;
use crate::settings::Settings;

/// Radius of the main bubble, and the largest a child bubble spawns at
#[inline]
pub fn nominal_bubble_radius(settings: &Settings) -> f32 {
    settings.bubbles.size * 0.5
}

/// Track the pointer with the main bubble; create or destroy it as the pointer
/// enters or leaves the tank
pub fn update_main_bubble(state: &mut SimState, settings: &Settings, pointer: Option<Vec2>) {
    let tank = Rect::from_size(state.tank);
    let pointer = pointer.filter(|p| p.is_finite() && tank.contains_point(*p));

    let Some(p) = pointer else {
        if state.main_bubble.take().is_some() {
            log::debug!("Main bubble removed");
        }
        state.last_pointer = None;
        return;
    };

    let velocity = state.last_pointer.map_or(Vec2::ZERO, |last| p - last);
    let radius = nominal_bubble_radius(settings);
    let bubble = state.main_bubble.get_or_insert_with(|| {
        log::debug!("Main bubble created at ({:.0}, {:.0})", p.x, p.y);
        Bubble::main(p, radius)
    });
    bubble.body.center = p;
    bubble.body.velocity = velocity;
    bubble.body.radius_x = radius;
    bubble.body.radius_y = radius;
    bubble.body.clamp_radii();

    state.last_pointer = Some(p);
}

/// Maybe spawn a child bubble at the pointer. Returns true if one spawned.
pub fn spawn_child_bubble(
    state: &mut SimState,
    settings: &Settings,
    pointer: Option<Vec2>,
    primary_button: bool,
    rng: &mut impl Rng,
) -> bool {
    let Some(p) = pointer.filter(|p| p.is_finite()) else {
        return false;
    };
    if !Rect::from_size(state.tank).contains_point(p) {
        return false;
    }
    if state
        .sea_bed
        .as_ref()
        .is_some_and(|bed| bed.fill_contains_point(p))
    {
        return false;
    }
    if state.child_bubbles.len() >= settings.bubbles.max_child_bubbles {
        return false;
    }

    let draw = rng.random_range(0.0..100.0);
    if !(draw < settings.bubbles.child_bubble_rate || primary_button) {
        return false;
    }

    let radius = reduce_by_random_percentage(
        rng,
        nominal_bubble_radius(settings),
        settings.bubbles.size_variation,
    )
    .max(MIN_CHILD_BUBBLE_RADIUS);
    state.child_bubbles.push(Bubble::child(p, radius));
    log::debug!(
        "Child bubble spawned (r = {:.1}, {} alive)",
        radius,
        state.child_bubbles.len()
    );
    true
}

/// Rise, drift and swell every live child bubble
pub fn update_child_bubbles(state: &mut SimState, settings: &Settings, current_step: Vec3) {
    let rise = settings.bubbles.child_bubble_buoyancy * settings.water.viscosity;
    let max_radius = nominal_bubble_radius(settings).max(f32::EPSILON);
    let use_current = settings.current.use_current && state.current.is_active();

    for bubble in state.child_bubbles.iter_mut().filter(|b| b.alive) {
        let mut velocity = Vec2::new(0.0, -rise);

        if use_current {
            // Smaller bubbles respond more
            let response = 2.0 - (bubble.body.radius() / max_radius).clamp(0.0, 1.0);
            bubble.body.grow(current_step.z * response);
            velocity += Vec2::new(current_step.x, current_step.y) * response;
        }

        bubble.body.velocity = velocity;
        if !bubble.body.integrate() {
            log::warn!("Child bubble produced a non-finite position; popping it");
            bubble.pop();
        }
    }
}

/// Mark bubbles that left the tank or hit the sea-bed. Returns how many popped.
pub fn pop_child_bubbles(state: &mut SimState) -> usize {
    let tank = state.tank;
    let sea_bed = state.sea_bed.as_ref();
    let mut popped = 0;

    for bubble in state.child_bubbles.iter_mut().filter(|b| b.alive) {
        let bounds = bubble.body.bounds();
        let vy = bubble.body.velocity.y;

        let escaped_top = vy <= 0.0 && bounds.max.y < 0.0;
        let escaped_bottom = vy >= 0.0 && bounds.min.y > tank.y;

        let hit_bed = sea_bed.is_some_and(|bed| {
            let touching = vy > 0.0 && bed.stroke_contains_circle(bubble.body.center, bubble.body.radius());
            let embedded = bed.fill_contains_point(bubble.body.center);
            touching || embedded
        });

        if escaped_top || escaped_bottom || hit_bed {
            bubble.pop();
            popped += 1;
        }
    }

    if popped > 0 {
        log::debug!("{} child bubble(s) popped", popped);
    }
    popped
}

/// Remove popped bubbles, keeping spawn order. Returns how many were removed.
pub fn purge_popped(state: &mut SimState) -> usize {
    let before = state.child_bubbles.len();
    state.child_bubbles.retain(|b| b.alive);
    before - state.child_bubbles.len()
}
