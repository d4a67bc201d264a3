//! Deterministic simulation module
//!
//! All tank behavior lives here. This module must be pure and deterministic:
//! - Fixed step only
//! - Seeded RNG only, threaded through every stochastic call
//! - Stable iteration order (swarm order, bubble spawn order)
//! - No rendering or platform dependencies

pub mod autopan;
pub mod bubbles;
pub mod current;
pub mod driver;
pub mod focus;
pub mod geometry;
pub mod plankton;
pub mod seabed;
pub mod state;
pub mod tick;

pub use current::{Current, SwellStage};
pub use driver::{
    DegradeMonitor, Simulation, SimulationError, TickGate, TickOutcome, TickPermit, TickReport,
};
pub use focus::{Focus, select_focus, show_locater};
pub use geometry::Rect;
pub use seabed::{SeaBed, SeaBedError, SegmentKind};
pub use state::{Body, Bubble, BubbleKind, CollisionHistory, Plankton, SimState};
pub use tick::{TickInput, TickSummary, tick};
