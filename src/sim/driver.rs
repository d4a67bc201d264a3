//! Simulation driver
//!
//! Owns the seeded RNG and the state, applies settings, and guards the tick
//! so a slow step is dropped rather than overlapped.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::Serialize;
use thiserror::Error;

use super::focus::Focus;
use super::seabed::{SeaBed, SeaBedError};
use super::state::{Bubble, Plankton, SimState};
use super::tick::{TickInput, TickSummary, tick};
use crate::consts::DEGRADE_STREAK;
use crate::settings::{PerformanceSettings, Settings, SettingsError};

#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("Sea-bed generation failed: {0}")]
    SeaBed(#[from] SeaBedError),
    #[error("Settings rejected: {0}")]
    Settings(#[from] SettingsError),
    #[error("Tank size must be positive and finite, got {0}")]
    InvalidTank(Vec2),
}

/// Whether a step actually advanced the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TickOutcome {
    Ran,
    /// Paused, or another tick still held the gate
    Skipped,
}

/// Everything the shell needs after a step
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TickReport {
    pub outcome: TickOutcome,
    pub collisions: u32,
    pub child_bubbles: usize,
    pub popped: usize,
    pub focus: Option<Focus>,
    pub show_locater: bool,
    pub zoom: f32,
    pub current_active: bool,
    pub current_direction: f32,
    /// Sustained over-budget ticks; the shell may shed load
    pub degrade: bool,
}

/// Re-entrancy guard shared between the driver and its scheduler
#[derive(Debug, Default)]
pub struct TickGate {
    busy: AtomicBool,
}

impl TickGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the gate, or `None` if a tick is already running
    pub fn try_enter(&self) -> Option<TickPermit<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| TickPermit { gate: self })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Held for the duration of one tick; releases the gate on drop
#[derive(Debug)]
pub struct TickPermit<'a> {
    gate: &'a TickGate,
}

impl Drop for TickPermit<'_> {
    fn drop(&mut self) {
        self.gate.busy.store(false, Ordering::Release);
    }
}

/// Counts consecutive over-budget ticks
#[derive(Debug, Clone)]
pub struct DegradeMonitor {
    budget: Duration,
    streak: u32,
}

impl DegradeMonitor {
    pub fn new(budget: Duration) -> Self {
        Self { budget, streak: 0 }
    }

    pub fn from_settings(settings: &PerformanceSettings) -> Self {
        Self::new(budget_from_ms(settings.tick_budget_ms))
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    pub fn set_budget(&mut self, budget: Duration) {
        self.budget = budget;
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn is_degraded(&self) -> bool {
        self.streak >= DEGRADE_STREAK
    }

    /// Record one tick's wall-clock time. Returns the degrade signal.
    pub fn observe(&mut self, elapsed: Duration) -> bool {
        if elapsed > self.budget {
            self.streak = self.streak.saturating_add(1);
            if self.streak == DEGRADE_STREAK {
                log::warn!(
                    "{} consecutive ticks over the {:?} budget; degrading",
                    DEGRADE_STREAK,
                    self.budget
                );
            }
        } else {
            self.streak = 0;
        }
        self.is_degraded()
    }

    pub fn reset(&mut self) {
        self.streak = 0;
    }
}

fn budget_from_ms(ms: f32) -> Duration {
    Duration::try_from_secs_f32(ms / 1000.0).unwrap_or(Duration::MAX)
}

/// A running tank
#[derive(Debug)]
pub struct Simulation {
    settings: Settings,
    state: SimState,
    rng: Pcg32,
    gate: Arc<TickGate>,
    degrade: DegradeMonitor,
    paused: bool,
    focus: Option<Focus>,
    show_locater: bool,
}

impl Simulation {
    /// Build a tank: sea-bed (if enabled), current and swarm
    pub fn new(settings: Settings, tank: Vec2, seed: u64) -> Result<Self, SimulationError> {
        settings.validate()?;
        if !(tank.is_finite() && tank.x > 0.0 && tank.y > 0.0) {
            return Err(SimulationError::InvalidTank(tank));
        }

        let mut rng = Pcg32::seed_from_u64(seed);
        let state = build_state(&settings, tank, &mut rng)?;
        log::info!(
            "Simulation created: {:.0}x{:.0} tank, {} plankton, seed {}",
            tank.x,
            tank.y,
            state.plankton.len(),
            seed
        );

        Ok(Self {
            degrade: DegradeMonitor::from_settings(&settings.performance),
            settings,
            state,
            rng,
            gate: Arc::new(TickGate::new()),
            paused: false,
            focus: None,
            show_locater: false,
        })
    }

    /// Recreate the sea-bed, current and swarm. Bubbles and history are cleared.
    pub fn regenerate(&mut self) -> Result<(), SimulationError> {
        let mut state = build_state(&self.settings, self.state.tank, &mut self.rng)?;
        state.zoom = self.state.zoom;
        state.time_ticks = self.state.time_ticks;
        self.state = state;
        self.focus = None;
        self.show_locater = false;
        self.degrade.reset();
        log::info!("Tank regenerated with {} plankton", self.state.plankton.len());
        Ok(())
    }

    /// Swap in new settings. Sea-bed or swarm size changes regenerate the tank.
    pub fn apply_settings(&mut self, settings: Settings) -> Result<(), SimulationError> {
        settings.validate()?;

        let needs_regen = settings.sea_bed != self.settings.sea_bed
            || settings.plankton.count != self.settings.plankton.count;
        let current_switched_off = self.settings.current.use_current && !settings.current.use_current;

        self.degrade
            .set_budget(budget_from_ms(settings.performance.tick_budget_ms));
        self.settings = settings;

        if current_switched_off {
            self.state.current.stop();
            self.state.current_direction = crate::normalize_degrees(self.settings.current.direction);
        }
        if !self.state.current.is_active() {
            self.state.current = super::current::Current::new(&self.settings.current);
        }

        if needs_regen {
            self.regenerate()?;
        }
        Ok(())
    }

    /// Run one guarded, timed tick
    pub fn step(&mut self, input: &TickInput) -> TickReport {
        if self.paused {
            return self.skipped_report();
        }

        let gate = Arc::clone(&self.gate);
        let Some(_permit) = gate.try_enter() else {
            log::debug!("Tick skipped: previous tick still running");
            return self.skipped_report();
        };

        let started = Instant::now();
        let summary = tick(&mut self.state, &self.settings, input, &mut self.rng);
        let degrade = self.degrade.observe(started.elapsed());

        self.focus = summary.focus;
        self.show_locater = summary.show_locater;
        ran_report(&summary, degrade)
    }

    /// A paused simulation skips every step
    pub fn set_paused(&mut self, paused: bool) {
        if self.paused != paused {
            log::info!("Simulation {}", if paused { "paused" } else { "resumed" });
        }
        self.paused = paused;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// The re-entrancy gate, for schedulers that tick from elsewhere
    pub fn gate(&self) -> Arc<TickGate> {
        Arc::clone(&self.gate)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn state(&self) -> &SimState {
        &self.state
    }

    pub fn plankton(&self) -> &[Plankton] {
        &self.state.plankton
    }

    pub fn main_bubble(&self) -> Option<&Bubble> {
        self.state.main_bubble.as_ref()
    }

    pub fn child_bubbles(&self) -> &[Bubble] {
        &self.state.child_bubbles
    }

    pub fn sea_bed(&self) -> Option<&SeaBed> {
        self.state.sea_bed.as_ref()
    }

    pub fn zoom(&self) -> f32 {
        self.state.zoom
    }

    pub fn focus(&self) -> Option<Focus> {
        self.focus
    }

    pub fn current_direction(&self) -> f32 {
        self.state.current_direction
    }

    fn skipped_report(&self) -> TickReport {
        TickReport {
            outcome: TickOutcome::Skipped,
            collisions: 0,
            child_bubbles: self.state.child_bubbles.len(),
            popped: 0,
            focus: self.focus,
            show_locater: self.show_locater,
            zoom: self.state.zoom,
            current_active: self.state.current.is_active(),
            current_direction: self.state.current_direction,
            degrade: self.degrade.is_degraded(),
        }
    }
}

fn ran_report(summary: &TickSummary, degrade: bool) -> TickReport {
    TickReport {
        outcome: TickOutcome::Ran,
        collisions: summary.collisions,
        child_bubbles: summary.child_bubbles,
        popped: summary.popped,
        focus: summary.focus,
        show_locater: summary.show_locater,
        zoom: summary.zoom,
        current_active: summary.current_active,
        current_direction: summary.current_direction,
        degrade,
    }
}

fn build_state(
    settings: &Settings,
    tank: Vec2,
    rng: &mut Pcg32,
) -> Result<SimState, SimulationError> {
    let sea_bed = if settings.sea_bed.use_sea_bed {
        Some(SeaBed::generate(&settings.sea_bed, tank, rng)?)
    } else {
        None
    };
    let mut state = SimState::new(settings, tank, sea_bed);
    state.populate(settings, rng);
    Ok(state)
}
