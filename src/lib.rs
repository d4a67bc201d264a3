//! Plankton Tank - an ambient particle simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (current, bubbles, plankton, sea-bed, focus)
//! - `settings`: The flat configuration record consumed by the simulation

pub mod settings;
pub mod sim;

pub use settings::{Settings, SettingsError, SwarmPreset};
pub use sim::{Simulation, SimulationError, TickInput, TickOutcome, TickReport};

use glam::Vec2;

/// Simulation constants
pub mod consts {
    /// Number of ticks kept in the collision history window
    pub const COLLISION_HISTORY_LEN: usize = 10;

    /// How far outside the tank a center may legally sit after a tick
    pub const BOUNDING_SLACK: f32 = 100.0;

    /// Evicted plankton leave a bubble at `travel * EJECTION_SPEED_FACTOR`
    pub const EJECTION_SPEED_FACTOR: f32 = 5.0;
    /// Minimum speed used to push an off-screen particle back into the tank
    pub const SNAP_BACK_SPEED: f32 = 5.0;

    /// Child bubbles never spawn smaller than this radius
    pub const MIN_CHILD_BUBBLE_RADIUS: f32 = 3.0;
    /// Smallest bubble width the preview camera will follow
    pub const MIN_FOCUS_BUBBLE_WIDTH: f32 = 3.0;
    /// Smallest plankton width the preview camera will follow
    pub const MIN_FOCUS_PLANKTON_WIDTH: f32 = 1.0;

    /// Current activation draw is uniform in [0, CURRENT_DRAW_RANGE)
    pub const CURRENT_DRAW_RANGE: f32 = 1000.0;
    /// Non axis-aligned current direction bands (degrees)
    pub const CURRENT_BAND_A: (f32, f32) = (20.0, 160.0);
    pub const CURRENT_BAND_B: (f32, f32) = (200.0, 340.0);
    /// An active current starts at this fraction of its peak strength
    pub const CURRENT_START_FRACTION: f32 = 0.05;
    /// A decaying current below this magnitude is considered spent
    pub const CURRENT_STOP_MAGNITUDE: f32 = 0.01;

    /// Consecutive over-budget ticks before the degrade signal fires
    pub const DEGRADE_STREAK: u32 = 10;

    /// Attempts to place a plankton outside the sea-bed before giving up
    pub const PLACEMENT_ATTEMPTS: u32 = 64;
}

/// Normalize an angle in degrees to [0, 360)
#[inline]
pub fn normalize_degrees(angle: f32) -> f32 {
    let a = angle.rem_euclid(360.0);
    if a >= 360.0 { 0.0 } else { a }
}

/// Convert a heading (degrees, 0 = north, clockwise) and magnitude into a
/// screen-space step (y grows downward)
#[inline]
pub fn heading_to_step(degrees: f32, magnitude: f32) -> Vec2 {
    let rad = degrees.to_radians();
    Vec2::new(rad.sin() * magnitude, -rad.cos() * magnitude)
}

/// Heading of a screen-space step under the north convention:
/// `90 + atan2(y, x) * 180 / PI`, normalized to [0, 360)
#[inline]
pub fn step_to_heading(step: Vec2) -> f32 {
    normalize_degrees(90.0 + step.y.atan2(step.x).to_degrees())
}

/// Sign of `value`, with zero mapping to zero
#[inline]
pub fn signum_or_zero(value: f32) -> f32 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}
