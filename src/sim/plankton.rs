//! Plankton update
//!
//! Runs once per particle per tick. The rules run in a fixed order and later
//! rules override earlier ones on the same axis:
//!
//! 1. current drag
//! 2. viscous decay
//! 3. bubble eviction / bounce / attraction
//! 4. collision history bookkeeping (once per tick, after the swarm)
//! 5. life-driven random walk
//! 6. gravity
//! 7. tank boundaries
//! 8. sea-bed collision
//! 9. integration

use glam::{Vec2, Vec3};
use rand::Rng;

use super::geometry::{circle_within_circle, circles_intersect, distance, edge_gap};
use super::seabed::SeaBed;
use super::state::{Body, Bubble, SimState};
use crate::consts::*;
use crate::settings::{AttractionSettings, Settings};
use crate::{heading_to_step, signum_or_zero};

/// Read-only inputs shared by every particle in a tick
struct SwarmContext<'a> {
    settings: &'a Settings,
    tank: Vec2,
    current_step: Vec3,
    current_active: bool,
    max_mass: f32,
    sea_bed: Option<&'a SeaBed>,
    /// Main bubble first, then live child bubbles in spawn order
    bubbles: Vec<&'a Bubble>,
}

/// Update every plankton and record this tick's main bubble collisions.
/// Returns the collision count.
pub fn update_swarm(
    state: &mut SimState,
    settings: &Settings,
    current_step: Vec3,
    rng: &mut impl Rng,
) -> u32 {
    let SimState {
        tank,
        plankton,
        main_bubble,
        child_bubbles,
        current,
        sea_bed,
        collision_history,
        ..
    } = state;

    let ctx = SwarmContext {
        settings,
        tank: *tank,
        current_step,
        current_active: settings.current.use_current && current.is_active(),
        max_mass: SimState::max_plankton_mass(settings),
        sea_bed: sea_bed.as_ref(),
        bubbles: main_bubble
            .iter()
            .chain(child_bubbles.iter().filter(|b| b.alive))
            .collect(),
    };

    let mut collisions = 0;
    for p in plankton.iter_mut() {
        collisions += update_plankton(&mut p.body, &ctx, rng);
    }

    collision_history.push(collisions);
    collisions
}

/// Run the full rule chain for one particle. Returns main bubble collisions.
fn update_plankton(body: &mut Body, ctx: &SwarmContext<'_>, rng: &mut impl Rng) -> u32 {
    let plankton = &ctx.settings.plankton;
    let travel = plankton.travel;
    let viscosity = ctx.settings.water.viscosity;
    let use_gravity = ctx.settings.water.use_gravity;

    let start_velocity = body.velocity;
    let mut velocity = body.velocity;
    let mass = body.mass(plankton.density);
    let mass_norm = normalized(mass, ctx.max_mass);

    // 1. Current drag: heavier plankton respond less
    let mut drift = Vec2::ZERO;
    let above_bed = ctx.sea_bed.is_none_or(|bed| {
        bed.surface_y(body.center.x)
            .is_none_or(|surface| body.center.y + body.radius_y < surface)
    });
    if ctx.current_active && above_bed {
        let response = 2.0 - mass_norm;
        body.grow(ctx.current_step.z * response);
        drift = Vec2::new(ctx.current_step.x, ctx.current_step.y) * response;
        body.try_move_to(body.center + drift);
        body.clamp_inside(ctx.tank);
    }

    // 2. Viscous decay toward the travel regime
    if velocity.x.abs() + velocity.y.abs() > travel {
        velocity *= viscosity;
    }

    // 3. Bubbles. Eviction from any bubble overrides everything else.
    let mut collisions = 0;
    let attraction = &ctx.settings.attraction;
    let (pr, center) = (body.radius(), body.center);

    let engulfed = ctx
        .bubbles
        .iter()
        .any(|b| circle_within_circle(center, pr, b.body.center, b.body.radius()));

    if engulfed {
        velocity = ejection_velocity(center, ctx.tank, travel * EJECTION_SPEED_FACTOR);
    } else {
        let mut bounced = false;
        let mut attractor: Option<(f32, &Bubble)> = None;

        for &bubble in &ctx.bubbles {
            let b = &bubble.body;
            let br = b.radius();

            if circles_intersect(center, pr, b.center, br) {
                velocity = bounce_off(center, velocity, b);
                if bubble.is_main() {
                    collisions += 1;
                }
                bounced = true;
                break;
            } else if attraction.use_attraction
                && (bubble.is_main() || attraction.attract_to_child_bubbles)
            {
                let d = distance(center, b.center);
                if d <= br * attraction.reach && attractor.is_none_or(|(best, _)| d < best) {
                    attractor = Some((d, bubble));
                }
            }
        }

        if !bounced {
            if let Some((_, bubble)) = attractor {
                velocity = attraction_velocity(body, &bubble.body, travel, attraction);
            }
        }
    }

    // 5. Life: plankton left alone by every force may strike out on their own
    let untouched = velocity.x.to_bits() == start_velocity.x.to_bits()
        && velocity.y.to_bits() == start_velocity.y.to_bits();
    if plankton.life > 0.0
        && untouched
        && rng.random_range(1..=100u32) as f32 <= plankton.life
        && velocity.length() <= travel
    {
        velocity = heading_to_step(rng.random_range(0.0..360.0), travel);
    }

    // 6. Gravity
    if use_gravity {
        velocity.y += mass / 1000.0 * viscosity;
    }

    // 7. Tank boundaries, X then Y
    velocity.x = bound_axis(
        &mut body.center.x,
        body.radius_x,
        velocity.x,
        drift.x,
        ctx.tank.x,
        false,
    );
    let resting = use_gravity && body.center.y > ctx.tank.y * 0.5;
    velocity.y = bound_axis(
        &mut body.center.y,
        body.radius_y,
        velocity.y,
        drift.y,
        ctx.tank.y,
        resting,
    );

    // 8. Sea-bed
    if let Some(bed) = ctx.sea_bed {
        if body.center.y + body.radius_y >= bed.top() {
            let r = body.radius();
            let fill = bed.fill_contains_circle(body.center, r);
            let stroke = bed.stroke_contains_circle(body.center, r);

            if fill && !stroke {
                log::warn!(
                    "Plankton embedded in sea-bed at ({:.1}, {:.1}); ejecting",
                    body.center.x,
                    body.center.y
                );
                if let Some(surface) = bed.surface_y(body.center.x) {
                    body.center.y = surface - body.radius_y;
                }
                velocity.x = 0.0;
                velocity.y = -velocity.y.abs().max(travel);
            } else if stroke {
                velocity.x = -velocity.x;
                velocity.y = if use_gravity {
                    // Heavier plankton bounce less
                    -velocity.y.abs() * (1.1 - mass_norm)
                } else {
                    -velocity.y.abs()
                };
            }
        }
    }

    // 9. Integrate
    body.velocity = velocity;
    if !body.integrate() {
        log::warn!("Rejected non-finite plankton step; velocity cleared");
        body.velocity = Vec2::ZERO;
    }

    collisions
}

/// `value / max`, clamped to [0, 1]
#[inline]
fn normalized(value: f32, max: f32) -> f32 {
    if max > 0.0 && value.is_finite() {
        (value / max).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Velocity that throws a particle away from the tank center
pub fn ejection_velocity(particle: Vec2, tank: Vec2, speed: f32) -> Vec2 {
    let from_center = particle - tank * 0.5;
    let heading = 90.0 + from_center.y.atan2(from_center.x).to_degrees();
    heading_to_step(heading, speed)
}

/// Reflect the axes on which the particle is moving into the bubble. A bubble
/// that is itself moving on an axis donates its velocity instead.
pub fn bounce_off(particle: Vec2, mut velocity: Vec2, bubble: &Body) -> Vec2 {
    let into_x = (particle.x < bubble.center.x && velocity.x > 0.0)
        || (particle.x > bubble.center.x && velocity.x < 0.0);
    if into_x {
        velocity.x = if bubble.velocity.x != 0.0 {
            bubble.velocity.x
        } else {
            -velocity.x
        };
    }

    let into_y = (particle.y < bubble.center.y && velocity.y > 0.0)
        || (particle.y > bubble.center.y && velocity.y < 0.0);
    if into_y {
        velocity.y = if bubble.velocity.y != 0.0 {
            bubble.velocity.y
        } else {
            -velocity.y
        };
    }

    velocity
}

/// Pull toward (or push from) a bubble; stalls once the edges touch
pub fn attraction_velocity(
    body: &Body,
    bubble: &Body,
    travel: f32,
    attraction: &AttractionSettings,
) -> Vec2 {
    let gap = edge_gap(body.center, body.radius(), bubble.center, bubble.radius());
    let magnitude = gap.abs().min(travel.max(attraction.strength));
    let toward = bubble.center - body.center;
    let sign = if attraction.invert { -1.0 } else { 1.0 };
    Vec2::new(
        magnitude * signum_or_zero(toward.x) * sign,
        magnitude * signum_or_zero(toward.y) * sign,
    )
}

/// Keep one axis in the tank. Returns the new velocity for that axis.
///
/// A body entirely past an edge is snapped back inside and pushed in at
/// `SNAP_BACK_SPEED` or faster. Otherwise a body about to cross an edge it is
/// moving toward bounces, or comes to rest on the far edge when `rest_on_far`.
fn bound_axis(
    center: &mut f32,
    radius: f32,
    velocity: f32,
    drift: f32,
    extent: f32,
    rest_on_far: bool,
) -> f32 {
    let near = *center - radius;
    let far = *center + radius;

    if far < 0.0 {
        log::warn!("Plankton fully off the near edge; snapping back");
        *center = radius;
        return velocity.abs().max(SNAP_BACK_SPEED);
    }
    if near > extent {
        log::warn!("Plankton fully off the far edge; snapping back");
        *center = extent - radius;
        return -velocity.abs().max(SNAP_BACK_SPEED);
    }

    let step = velocity + drift;
    if velocity < 0.0 && near + step < 0.0 {
        -velocity
    } else if velocity > 0.0 && far + step > extent {
        if rest_on_far { 0.0 } else { -velocity }
    } else {
        velocity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const TANK: Vec2 = Vec2::new(800.0, 600.0);

    /// Quiet settings: no current, no sea-bed, no gravity, no life
    fn quiet_settings() -> Settings {
        let mut settings = Settings::default();
        settings.current.use_current = false;
        settings.sea_bed.use_sea_bed = false;
        settings.water.use_gravity = false;
        settings.plankton.life = 0.0;
        settings.plankton.travel = 1.5;
        settings
    }

    fn state_with(settings: &Settings, center: Vec2, radius: f32, velocity: Vec2) -> SimState {
        let mut state = SimState::new(settings, TANK, None);
        state.add_plankton(center, radius, velocity);
        state
    }

    fn run(state: &mut SimState, settings: &Settings) -> u32 {
        let mut rng = Pcg32::seed_from_u64(1);
        update_swarm(state, settings, Vec3::ZERO, &mut rng)
    }

    #[test]
    fn test_idle_stability() {
        let settings = quiet_settings();
        let mut state = state_with(&settings, Vec2::new(400.0, 300.0), 5.0, Vec2::ZERO);
        run(&mut state, &settings);
        let body = state.plankton[0].body;
        assert_eq!(body.velocity, Vec2::ZERO);
        assert_eq!(body.center, Vec2::new(400.0, 300.0));
    }

    #[test]
    fn test_boundary_bounce() {
        let mut settings = quiet_settings();
        settings.plankton.travel = 5.0;
        let mut state = state_with(&settings, Vec2::new(10.0, 300.0), 10.0, Vec2::new(-5.0, 0.0));
        run(&mut state, &settings);
        let body = state.plankton[0].body;
        assert_eq!(body.velocity, Vec2::new(5.0, 0.0));
        assert_eq!(body.center, Vec2::new(15.0, 300.0));
    }

    #[test]
    fn test_viscous_decay() {
        let mut settings = quiet_settings();
        settings.water.viscosity = 0.5;
        let mut state = state_with(&settings, Vec2::new(400.0, 300.0), 5.0, Vec2::new(4.0, 0.0));
        run(&mut state, &settings);
        assert_eq!(state.plankton[0].body.velocity, Vec2::new(2.0, 0.0));
    }

    #[test]
    fn test_ejection_from_main_bubble() {
        let settings = quiet_settings();
        let center = Vec2::new(400.0, 300.0);
        let mut state = state_with(&settings, center, 5.0, Vec2::ZERO);
        state.main_bubble = Some(Bubble::main(center, 50.0));
        run(&mut state, &settings);

        let speed = state.plankton[0].body.velocity.length();
        assert!((speed - settings.plankton.travel * EJECTION_SPEED_FACTOR).abs() < 1e-3);
    }

    #[test]
    fn test_ejection_points_away_from_tank_center() {
        let settings = quiet_settings();
        for offset in [
            Vec2::new(20.0, 10.0),
            Vec2::new(-20.0, 10.0),
            Vec2::new(-20.0, -10.0),
            Vec2::new(20.0, -10.0),
        ] {
            let bubble_center = TANK * 0.5;
            let p = bubble_center + offset;
            let mut state = state_with(&settings, p, 5.0, Vec2::ZERO);
            state.main_bubble = Some(Bubble::main(bubble_center, 50.0));
            run(&mut state, &settings);
            let v = state.plankton[0].body.velocity;
            assert!(v.dot(p - TANK * 0.5) > 0.0, "offset {offset:?} gave {v:?}");
        }
    }

    #[test]
    fn test_eviction_wins_over_later_bounce() {
        let settings = quiet_settings();
        // Fully inside the main bubble, grazing a child bubble scanned after it
        let mut state = state_with(&settings, Vec2::new(470.0, 300.0), 5.0, Vec2::ZERO);
        state.main_bubble = Some(Bubble::main(Vec2::new(500.0, 300.0), 50.0));
        state.child_bubbles.push(Bubble::child(Vec2::new(490.0, 300.0), 20.0));
        run(&mut state, &settings);

        let v = state.plankton[0].body.velocity;
        assert!((v.x - settings.plankton.travel * EJECTION_SPEED_FACTOR).abs() < 1e-3, "{v:?}");
        assert!(v.y.abs() < 1e-3);
    }

    #[test]
    fn test_eviction_wins_over_earlier_bounce() {
        let settings = quiet_settings();
        // Grazing the main bubble, fully inside a child bubble scanned after it
        let mut state = state_with(&settings, Vec2::new(454.0, 300.0), 5.0, Vec2::ZERO);
        state.main_bubble = Some(Bubble::main(Vec2::new(500.0, 300.0), 50.0));
        state.child_bubbles.push(Bubble::child(Vec2::new(450.0, 300.0), 20.0));
        let collisions = run(&mut state, &settings);

        let v = state.plankton[0].body.velocity;
        assert!((v.x - settings.plankton.travel * EJECTION_SPEED_FACTOR).abs() < 1e-3, "{v:?}");
        assert!(v.y.abs() < 1e-3);
        assert_eq!(collisions, 0);
    }

    #[test]
    fn test_intersection_bounces_and_counts() {
        let settings = quiet_settings();
        // Plankton left of the bubble, moving right into it
        let mut state = state_with(&settings, Vec2::new(346.0, 300.0), 5.0, Vec2::new(1.0, 0.0));
        state.main_bubble = Some(Bubble::main(Vec2::new(400.0, 300.0), 50.0));
        let collisions = run(&mut state, &settings);
        assert_eq!(collisions, 1);
        assert_eq!(state.plankton[0].body.velocity, Vec2::new(-1.0, 0.0));
        assert_eq!(state.collision_history.iter().copied().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_moving_bubble_donates_velocity() {
        let settings = quiet_settings();
        let mut state = state_with(&settings, Vec2::new(346.0, 300.0), 5.0, Vec2::new(1.0, 0.0));
        let mut bubble = Bubble::main(Vec2::new(400.0, 300.0), 50.0);
        bubble.body.velocity = Vec2::new(-3.0, 0.0);
        state.main_bubble = Some(bubble);
        run(&mut state, &settings);
        assert_eq!(state.plankton[0].body.velocity, Vec2::new(-3.0, 0.0));
    }

    #[test]
    fn test_first_intersection_wins() {
        let settings = quiet_settings();
        let mut state = state_with(&settings, Vec2::new(346.0, 300.0), 5.0, Vec2::new(1.0, 0.0));
        state.main_bubble = Some(Bubble::main(Vec2::new(400.0, 300.0), 50.0));
        // A moving child bubble also touching the plankton, scanned second
        let mut child = Bubble::child(Vec2::new(336.0, 300.0), 6.0);
        child.body.velocity = Vec2::new(9.0, 9.0);
        state.child_bubbles.push(child);
        let collisions = run(&mut state, &settings);
        assert_eq!(collisions, 1);
        assert_eq!(state.plankton[0].body.velocity, Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn test_child_collisions_not_counted() {
        let settings = quiet_settings();
        let mut state = state_with(&settings, Vec2::new(346.0, 300.0), 5.0, Vec2::new(1.0, 0.0));
        state.child_bubbles.push(Bubble::child(Vec2::new(400.0, 300.0), 50.0));
        assert_eq!(run(&mut state, &settings), 0);
        assert_eq!(state.plankton[0].body.velocity, Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn test_popped_bubbles_ignored() {
        let settings = quiet_settings();
        let mut state = state_with(&settings, Vec2::new(400.0, 300.0), 5.0, Vec2::ZERO);
        let mut child = Bubble::child(Vec2::new(400.0, 300.0), 50.0);
        child.pop();
        state.child_bubbles.push(child);
        run(&mut state, &settings);
        assert_eq!(state.plankton[0].body.velocity, Vec2::ZERO);
    }

    #[test]
    fn test_attraction_pulls_then_stalls() {
        let mut settings = quiet_settings();
        settings.attraction.use_attraction = true;
        settings.attraction.reach = 3.0;
        settings.attraction.strength = 2.0;

        let mut state = state_with(&settings, Vec2::new(300.0, 250.0), 5.0, Vec2::ZERO);
        state.main_bubble = Some(Bubble::main(Vec2::new(400.0, 300.0), 50.0));
        run(&mut state, &settings);
        // Gap is large, so both axes move at the cap toward the bubble
        assert_eq!(state.plankton[0].body.velocity, Vec2::new(2.0, 2.0));

        // Close in: the pull never overshoots the gap
        let mut close = state_with(&settings, Vec2::new(345.0, 300.0), 5.0, Vec2::ZERO);
        close.main_bubble = Some(Bubble::main(Vec2::new(400.0, 300.0), 49.0));
        run(&mut close, &settings);
        assert_eq!(close.plankton[0].body.velocity, Vec2::new(1.0, 0.0));
        assert_eq!(close.plankton[0].body.center, Vec2::new(346.0, 300.0));
    }

    #[test]
    fn test_inverted_attraction_repels() {
        let mut settings = quiet_settings();
        settings.attraction.use_attraction = true;
        settings.attraction.invert = true;
        let mut state = state_with(&settings, Vec2::new(300.0, 300.0), 5.0, Vec2::ZERO);
        state.main_bubble = Some(Bubble::main(Vec2::new(400.0, 300.0), 50.0));
        run(&mut state, &settings);
        let v = state.plankton[0].body.velocity;
        assert!(v.x < 0.0);
        assert_eq!(v.y, 0.0);
    }

    #[test]
    fn test_child_attraction_needs_flag() {
        let mut settings = quiet_settings();
        settings.attraction.use_attraction = true;
        let mut state = state_with(&settings, Vec2::new(300.0, 300.0), 5.0, Vec2::ZERO);
        state.child_bubbles.push(Bubble::child(Vec2::new(400.0, 300.0), 50.0));
        run(&mut state, &settings);
        assert_eq!(state.plankton[0].body.velocity, Vec2::ZERO);

        settings.attraction.attract_to_child_bubbles = true;
        run(&mut state, &settings);
        assert!(state.plankton[0].body.velocity.x > 0.0);
    }

    #[test]
    fn test_life_walk() {
        let mut settings = quiet_settings();
        settings.plankton.life = 100.0;
        settings.plankton.travel = 2.0;
        let mut state = state_with(&settings, Vec2::new(400.0, 300.0), 5.0, Vec2::ZERO);
        run(&mut state, &settings);
        let speed = state.plankton[0].body.velocity.length();
        assert!((speed - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_life_walk_skips_disturbed_plankton() {
        let mut settings = quiet_settings();
        settings.plankton.life = 100.0;
        settings.water.viscosity = 0.5;
        // Fast enough to be damped by viscosity, so the walk must not fire
        let mut state = state_with(&settings, Vec2::new(400.0, 300.0), 5.0, Vec2::new(4.0, 0.0));
        run(&mut state, &settings);
        assert_eq!(state.plankton[0].body.velocity, Vec2::new(2.0, 0.0));
    }

    #[test]
    fn test_gravity() {
        let mut settings = quiet_settings();
        settings.water.use_gravity = true;
        let mut state = state_with(&settings, Vec2::new(400.0, 200.0), 5.0, Vec2::ZERO);
        run(&mut state, &settings);
        let mass = state.plankton[0].body.mass(settings.plankton.density);
        let expected = mass / 1000.0 * settings.water.viscosity;
        assert!((state.plankton[0].body.velocity.y - expected).abs() < 1e-6);
    }

    #[test]
    fn test_gravity_rests_on_floor() {
        let mut settings = quiet_settings();
        settings.water.use_gravity = true;
        let mut state = state_with(&settings, Vec2::new(400.0, 594.0), 5.0, Vec2::new(0.0, 1.0));
        run(&mut state, &settings);
        assert_eq!(state.plankton[0].body.velocity.y, 0.0);
        assert_eq!(state.plankton[0].body.center.y, 594.0);
    }

    #[test]
    fn test_off_screen_snap_back() {
        let settings = quiet_settings();
        let mut state = state_with(&settings, Vec2::new(-50.0, 300.0), 5.0, Vec2::new(-1.0, 0.0));
        run(&mut state, &settings);
        let body = state.plankton[0].body;
        assert_eq!(body.velocity.x, SNAP_BACK_SPEED);
        assert_eq!(body.center.x, 5.0 + SNAP_BACK_SPEED);

        let mut state = state_with(&settings, Vec2::new(400.0, 700.0), 5.0, Vec2::ZERO);
        run(&mut state, &settings);
        assert_eq!(state.plankton[0].body.velocity.y, -SNAP_BACK_SPEED);
    }

    #[test]
    fn test_embedded_in_sea_bed_is_ejected() {
        let settings = quiet_settings();
        let mut state = state_with(&settings, Vec2::new(400.0, 560.0), 5.0, Vec2::new(1.0, 0.0));
        state.sea_bed = Some(SeaBed::flat(TANK, 500.0, 4.0).unwrap());
        run(&mut state, &settings);
        let body = state.plankton[0].body;
        assert_eq!(body.velocity.x, 0.0);
        assert!(body.velocity.y <= -settings.plankton.travel);
        assert_eq!(body.center.y, 495.0 + body.velocity.y);
    }

    #[test]
    fn test_sea_bed_surface_bounce() {
        let settings = quiet_settings();
        let mut state = state_with(&settings, Vec2::new(400.0, 496.0), 5.0, Vec2::new(1.0, 0.5));
        state.sea_bed = Some(SeaBed::flat(TANK, 500.0, 4.0).unwrap());
        run(&mut state, &settings);
        assert_eq!(state.plankton[0].body.velocity, Vec2::new(-1.0, -0.5));
    }

    #[test]
    fn test_sea_bed_bounce_damped_by_mass_with_gravity() {
        let mut settings = quiet_settings();
        settings.water.use_gravity = true;
        // The biggest plankton possible: normalized mass 1
        let radius = settings.plankton.size * 0.5;
        let mut state = state_with(&settings, Vec2::new(400.0, 495.0), radius, Vec2::new(0.0, 1.0));
        state.sea_bed = Some(SeaBed::flat(TANK, 500.0, 4.0).unwrap());
        run(&mut state, &settings);
        let body = state.plankton[0].body;
        let mass = body.mass(settings.plankton.density);
        let falling = 1.0 + mass / 1000.0 * settings.water.viscosity;
        assert!((body.velocity.y + falling * 0.1).abs() < 1e-4, "{:?}", body.velocity);
    }

    #[test]
    fn test_current_drag() {
        let mut settings = quiet_settings();
        settings.current.use_current = true;
        settings.current.use_random_direction = false;
        settings.current.direction = 90.0;
        let mut state = state_with(&settings, Vec2::new(400.0, 300.0), 5.0, Vec2::ZERO);
        let mut rng = Pcg32::seed_from_u64(1);
        state.current.activate(&settings.current, 0.95, &mut rng);

        let step = Vec3::new(2.0, 0.0, 0.5);
        update_swarm(&mut state, &settings, step, &mut rng);
        let body = state.plankton[0].body;
        // Radius 5 of a possible 5 is the heaviest: response 1
        assert!((body.center.x - 402.0).abs() < 1e-4);
        assert!((body.radius_x - 5.5).abs() < 1e-4);
        // Drag moves the center, not the velocity
        assert_eq!(body.velocity, Vec2::ZERO);
    }

    #[test]
    fn test_current_drag_reaches_plankton_over_low_bed() {
        let mut settings = quiet_settings();
        settings.current.use_current = true;
        // High on the left, low on the right
        let bed = SeaBed::from_surface(
            vec![
                Vec2::new(0.0, 300.0),
                Vec2::new(400.0, 300.0),
                Vec2::new(400.0, 550.0),
                Vec2::new(800.0, 550.0),
            ],
            TANK.y,
            4.0,
        )
        .unwrap();
        // Below the bed's highest point but well clear of the local surface
        let mut state = state_with(&settings, Vec2::new(600.0, 400.0), 5.0, Vec2::ZERO);
        state.sea_bed = Some(bed);
        let mut rng = Pcg32::seed_from_u64(1);
        state.current.activate(&settings.current, 0.95, &mut rng);

        update_swarm(&mut state, &settings, Vec3::new(2.0, 0.0, 0.0), &mut rng);
        assert!((state.plankton[0].body.center.x - 602.0).abs() < 1e-4);
    }

    #[test]
    fn test_current_drag_ignored_when_disabled() {
        let settings = quiet_settings();
        let mut state = state_with(&settings, Vec2::new(400.0, 300.0), 5.0, Vec2::ZERO);
        let mut rng = Pcg32::seed_from_u64(1);
        state.current.activate(&settings.current, 0.95, &mut rng);
        update_swarm(&mut state, &settings, Vec3::new(2.0, 2.0, 0.5), &mut rng);
        assert_eq!(state.plankton[0].body.center, Vec2::new(400.0, 300.0));
        assert_eq!(state.plankton[0].body.radius_x, 5.0);
    }

    #[test]
    fn test_history_pushed_once_per_tick() {
        let settings = quiet_settings();
        let mut state = state_with(&settings, Vec2::new(400.0, 300.0), 5.0, Vec2::ZERO);
        for _ in 0..3 {
            state.add_plankton(Vec2::new(100.0, 100.0), 5.0, Vec2::ZERO);
        }
        for tick in 1..=12 {
            run(&mut state, &settings);
            assert_eq!(state.collision_history.len(), tick.min(COLLISION_HISTORY_LEN));
        }
    }

    proptest! {
        #[test]
        fn prop_plankton_stay_sane(
            seed in any::<u64>(),
            x in -20.0f32..820.0,
            y in -20.0f32..620.0,
            radius in 0.5f32..10.0,
            vx in -20.0f32..20.0,
            vy in -20.0f32..20.0,
            gravity in any::<bool>(),
            life in 0.0f32..100.0,
            with_bed in any::<bool>(),
        ) {
            let mut settings = quiet_settings();
            settings.water.use_gravity = gravity;
            settings.plankton.life = life;
            let mut state = state_with(&settings, Vec2::new(x, y), radius, Vec2::new(vx, vy));
            state.main_bubble = Some(Bubble::main(Vec2::new(400.0, 300.0), 40.0));
            if with_bed {
                state.sea_bed = Some(SeaBed::flat(TANK, 520.0, 4.0).unwrap());
            }
            let mut rng = Pcg32::seed_from_u64(seed);

            for _ in 0..30 {
                update_swarm(&mut state, &settings, Vec3::ZERO, &mut rng);
                let body = state.plankton[0].body;
                prop_assert!(body.radius_x >= 0.0 && body.radius_y >= 0.0);
                prop_assert!(body.center.is_finite());
                prop_assert!(body.center.x >= -BOUNDING_SLACK && body.center.x <= TANK.x + BOUNDING_SLACK);
                prop_assert!(body.center.y >= -BOUNDING_SLACK && body.center.y <= TANK.y + BOUNDING_SLACK);
            }
        }
    }
}
