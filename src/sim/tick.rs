//! Fixed-step simulation tick
//!
//! One call advances the tank by exactly one step, in a fixed order:
//! current, bubbles, plankton, then the preview (focus and autopan).
//! Random draws happen in that same order, so a seed replays exactly.

use glam::Vec2;
use rand::Rng;
use serde::Serialize;

use super::autopan::autopan;
use super::bubbles::{
    pop_child_bubbles, purge_popped, spawn_child_bubble, update_child_bubbles, update_main_bubble,
};
use super::focus::{Focus, select_focus, show_locater};
use super::plankton::update_swarm;
use super::state::SimState;
use crate::settings::Settings;

/// Shell inputs for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Tank size this tick; `None` keeps the previous size
    pub tank: Option<Vec2>,
    /// Pointer position in tank coordinates, `None` when outside
    pub pointer: Option<Vec2>,
    /// Primary button held: forces a child bubble spawn
    pub primary_button: bool,
}

/// What one tick produced, for display
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TickSummary {
    /// Main bubble collisions this tick
    pub collisions: u32,
    /// Live child bubbles after the tick
    pub child_bubbles: usize,
    pub spawned: bool,
    pub popped: usize,
    pub focus: Option<Focus>,
    pub show_locater: bool,
    pub zoom: f32,
    pub current_active: bool,
    /// Displayed current heading (degrees)
    pub current_direction: f32,
}

/// Advance the simulation by one step
pub fn tick(
    state: &mut SimState,
    settings: &Settings,
    input: &TickInput,
    rng: &mut impl Rng,
) -> TickSummary {
    if let Some(tank) = input.tank.filter(|t| t.is_finite() && t.x > 0.0 && t.y > 0.0) {
        if tank != state.tank {
            log::debug!("Tank resized to {:.0}x{:.0}", tank.x, tank.y);
            if let Some(bed) = state.sea_bed.take() {
                state.sea_bed = Some(match bed.rescaled(state.tank, tank) {
                    Ok(scaled) => scaled,
                    Err(e) => {
                        log::warn!("Sea-bed kept at its old size: {e}");
                        bed
                    }
                });
            }
            state.tank = tank;
        }
    }
    state.time_ticks += 1;

    // Current
    if settings.current.use_current {
        if state.current.is_active() {
            state.current.increment_to_next_step();
        } else {
            state
                .current
                .try_activate(&settings.current, settings.water.viscosity, rng);
        }
    } else if state.current.is_active() {
        state.current.stop();
        state.current_direction = crate::normalize_degrees(settings.current.direction);
    }
    if let Some(heading) = state.current.heading() {
        state.current_direction = heading;
    }
    let current_step = state.current.active_step();

    // Bubbles
    update_main_bubble(state, settings, input.pointer);
    let spawned = spawn_child_bubble(state, settings, input.pointer, input.primary_button, rng);
    update_child_bubbles(state, settings, current_step);
    let popped = pop_child_bubbles(state);

    // Plankton
    let collisions = update_swarm(state, settings, current_step, rng);

    // Popped bubbles have been skipped by everything above; drop them before
    // the preview indexes the survivors
    purge_popped(state);

    // Preview
    let focus = select_focus(state);
    state.focused_plankton = match focus {
        Some(Focus::Plankton(id)) => Some(id),
        _ => None,
    };
    let zoom = autopan(state, &settings.autopan);

    TickSummary {
        collisions,
        child_bubbles: state.child_bubbles.len(),
        spawned,
        popped,
        focus,
        show_locater: show_locater(settings.preview.locater_mode, focus),
        zoom,
        current_active: state.current.is_active(),
        current_direction: state.current_direction,
    }
}
