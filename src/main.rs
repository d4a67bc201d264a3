//! Plankton Tank - headless runner
//!
//! Usage: `plankton-tank [settings.json] [ticks] [seed]`
//!
//! Drives a tank with a scripted pointer and logs what happens. Set
//! `RUST_LOG=info` (or `debug`) to see the simulation's own logging.

#[cfg(not(target_arch = "wasm32"))]
use glam::Vec2;
#[cfg(not(target_arch = "wasm32"))]
use plankton_tank::{Settings, Simulation, SimulationError, TickInput, TickOutcome};

#[cfg(not(target_arch = "wasm32"))]
const DEFAULT_TICKS: u32 = 2_000;
#[cfg(not(target_arch = "wasm32"))]
const DEFAULT_SEED: u64 = 12345;
#[cfg(not(target_arch = "wasm32"))]
const TANK: Vec2 = Vec2::new(800.0, 600.0);
/// The swarm is never shed below this many plankton
#[cfg(not(target_arch = "wasm32"))]
const MIN_SHED_COUNT: usize = 25;

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Plankton Tank (headless) starting...");

    if let Err(e) = run() {
        log::error!("{e}");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Browser shells drive `Simulation::step` themselves
}

#[cfg(not(target_arch = "wasm32"))]
fn run() -> Result<(), SimulationError> {
    let mut args = std::env::args().skip(1);
    let settings = match args.next() {
        Some(path) => Settings::load(&path)?,
        None => Settings::default(),
    };
    let ticks = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_TICKS);
    let seed = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_SEED);

    let mut sim = Simulation::new(settings, TANK, seed)?;

    let mut ran = 0u32;
    let mut total_collisions = 0u64;
    let mut total_popped = 0usize;
    let mut current_ticks = 0u32;

    for t in 0..ticks {
        let report = sim.step(&scripted_input(t));
        if report.outcome == TickOutcome::Skipped {
            continue;
        }
        ran += 1;
        total_collisions += u64::from(report.collisions);
        total_popped += report.popped;
        if report.current_active {
            current_ticks += 1;
        }

        if report.degrade {
            shed_plankton(&mut sim)?;
        }

        if t % 250 == 0 {
            log::info!(
                "tick {t}: {} collisions, {} bubbles, zoom {:.2}, current {} at {:.0} deg, focus {:?}",
                report.collisions,
                report.child_bubbles,
                report.zoom,
                if report.current_active { "on" } else { "off" },
                report.current_direction,
                report.focus,
            );
        }
    }

    println!(
        "{ran} ticks: {} plankton, {total_collisions} main bubble collisions, \
         {total_popped} bubbles popped, current active for {current_ticks} ticks, final zoom {:.2}",
        sim.plankton().len(),
        sim.zoom()
    );
    Ok(())
}

/// Halve the swarm in response to the degrade signal
#[cfg(not(target_arch = "wasm32"))]
fn shed_plankton(sim: &mut Simulation) -> Result<(), SimulationError> {
    let mut settings = sim.settings().clone();
    let count = settings.plankton.count / 2;
    if count < MIN_SHED_COUNT {
        return Ok(());
    }
    log::warn!(
        "Ticks running over budget; reducing swarm from {} to {}",
        settings.plankton.count,
        count
    );
    settings.plankton.count = count;
    sim.apply_settings(settings)
}

/// Pointer tracing a slow figure-eight, leaving the tank now and then, with
/// the button pressed in short bursts
#[cfg(not(target_arch = "wasm32"))]
fn scripted_input(t: u32) -> TickInput {
    let phase = t as f32 * 0.01;
    let pointer = TANK * 0.5 + Vec2::new(phase.sin() * 300.0, (phase * 2.0).sin() * 150.0);
    TickInput {
        tank: Some(TANK),
        pointer: (t % 600 < 450).then_some(pointer),
        primary_button: t % 120 < 5,
    }
}
