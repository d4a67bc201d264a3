//! Water current
//!
//! A tank-wide drift that comes and goes. While active it produces a step
//! vector each tick: X/Y horizontal drift plus a Z "swell" that grows
//! entities while the current builds and shrinks them back while it fades.
//!
//! Lifecycle: `Inactive -> Active(PreMainUp) -> Active(MainUp) -> Inactive`.

use glam::{Vec2, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::reduce_by_random_percentage;
use crate::consts::*;
use crate::settings::CurrentSettings;
use crate::{heading_to_step, step_to_heading};

/// Acceleration is kept above this so the ramp always reaches its peak
const MIN_ACCELERATION: f32 = 1.001;
/// Deceleration is kept below this so the ramp always decays
const MAX_DECELERATION: f32 = 0.999;

/// Sub-phase of an active current
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwellStage {
    /// Building toward peak strength
    PreMainUp,
    /// Past the peak, decaying
    MainUp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Current {
    /// Heading in degrees (0 = north, clockwise)
    pub direction: f32,
    /// Peak strength for this activation
    pub strength: f32,
    /// Multiplicative ramp-up factor per step
    pub acceleration: f32,
    /// Multiplicative decay factor per step
    pub deceleration: f32,
    pub z_adjustment_per_step: f32,
    pub maximum_z_adjustment: f32,
    pub minimum_z_adjustment: f32,
    is_active: bool,
    swell_stage: SwellStage,
    /// Current drift magnitude
    magnitude: f32,
    /// Accumulated swell, returned to zero while the current fades
    z_offset: f32,
    /// Z change produced by the last step
    z_step: f32,
    steps: u32,
}

impl Current {
    /// An inactive current configured from settings
    pub fn new(settings: &CurrentSettings) -> Self {
        Self {
            direction: crate::normalize_degrees(settings.direction),
            strength: settings.strength,
            acceleration: settings.acceleration,
            deceleration: settings.deceleration,
            z_adjustment_per_step: 0.0,
            maximum_z_adjustment: settings.maximum_z_adjustment,
            minimum_z_adjustment: settings.minimum_z_adjustment,
            is_active: false,
            swell_stage: SwellStage::PreMainUp,
            magnitude: 0.0,
            z_offset: 0.0,
            z_step: 0.0,
            steps: 0,
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    #[inline]
    pub fn swell_stage(&self) -> SwellStage {
        self.swell_stage
    }

    #[inline]
    pub fn magnitude(&self) -> f32 {
        self.magnitude
    }

    #[inline]
    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// Roll for activation. Returns true if the current started.
    pub fn try_activate(
        &mut self,
        settings: &CurrentSettings,
        viscosity: f32,
        rng: &mut impl Rng,
    ) -> bool {
        if self.is_active {
            return false;
        }
        let draw = rng.random_range(0.0..CURRENT_DRAW_RANGE);
        if draw < settings.rate {
            self.activate(settings, viscosity, rng);
            true
        } else {
            false
        }
    }

    /// Start a new current with randomized direction, strength and swell
    pub fn activate(&mut self, settings: &CurrentSettings, viscosity: f32, rng: &mut impl Rng) {
        self.direction = if settings.use_random_direction {
            let (lo, hi) = if rng.random_bool(0.5) {
                CURRENT_BAND_A
            } else {
                CURRENT_BAND_B
            };
            rng.random_range(lo..hi)
        } else {
            crate::normalize_degrees(settings.direction)
        };

        self.strength = reduce_by_random_percentage(rng, settings.strength, settings.variation);

        let (acceleration, deceleration) = if settings.use_independent_acceleration {
            (settings.acceleration, settings.deceleration)
        } else {
            (1.0 + (1.0 - viscosity), viscosity)
        };
        self.acceleration = acceleration.max(MIN_ACCELERATION);
        self.deceleration = deceleration.clamp(0.0, MAX_DECELERATION);

        self.minimum_z_adjustment = settings.minimum_z_adjustment;
        self.maximum_z_adjustment = settings.maximum_z_adjustment;
        self.z_adjustment_per_step = if settings.use_z_adjustment {
            generate_z_step(settings, rng)
        } else {
            0.0
        };

        self.is_active = true;
        self.swell_stage = SwellStage::PreMainUp;
        self.magnitude = self.strength * CURRENT_START_FRACTION;
        self.z_offset = 0.0;
        self.z_step = 0.0;
        self.steps = 0;

        log::info!(
            "Current started: heading {:.1}, strength {:.2}, z step {:.3}",
            self.direction,
            self.strength,
            self.z_adjustment_per_step
        );
    }

    /// Advance the ramp by one tick
    pub fn increment_to_next_step(&mut self) {
        if !self.is_active {
            return;
        }
        self.steps += 1;

        match self.swell_stage {
            SwellStage::PreMainUp => {
                self.magnitude *= self.acceleration;
                self.z_step = self.z_adjustment_per_step;
                self.z_offset += self.z_step;
                if self.magnitude >= self.strength {
                    self.magnitude = self.strength;
                    self.swell_stage = SwellStage::MainUp;
                }
            }
            SwellStage::MainUp => {
                self.magnitude *= self.deceleration;
                self.z_step = -self.z_adjustment_per_step.min(self.z_offset);
                self.z_offset += self.z_step;
                if self.magnitude < CURRENT_STOP_MAGNITUDE && self.z_offset <= 0.0 {
                    self.stop();
                }
            }
        }
    }

    /// The drift for this tick: (x, y) horizontal, z swell. Zero while inactive.
    pub fn active_step(&self) -> Vec3 {
        if !self.is_active {
            return Vec3::ZERO;
        }
        heading_to_step(self.direction, self.magnitude).extend(self.z_step)
    }

    /// Heading of the live drift, for display
    pub fn heading(&self) -> Option<f32> {
        let step = self.active_step();
        let horizontal = Vec2::new(step.x, step.y);
        (self.is_active && horizontal != Vec2::ZERO).then(|| step_to_heading(horizontal))
    }

    pub fn stop(&mut self) {
        if self.is_active {
            log::info!("Current stopped after {} steps", self.steps);
        }
        self.is_active = false;
        self.swell_stage = SwellStage::PreMainUp;
        self.magnitude = 0.0;
        self.z_offset = 0.0;
        self.z_step = 0.0;
    }
}

/// Pick a swell step between the configured bounds, reduced by the variation
pub fn generate_z_step(settings: &CurrentSettings, rng: &mut impl Rng) -> f32 {
    let lo = settings
        .minimum_z_adjustment
        .min(settings.maximum_z_adjustment);
    let hi = settings
        .minimum_z_adjustment
        .max(settings.maximum_z_adjustment);
    if !(lo.is_finite() && hi.is_finite()) {
        return 0.0;
    }
    let base = rng.random_range(lo..=hi);
    reduce_by_random_percentage(rng, base, settings.z_variation).clamp(lo, hi)
}
