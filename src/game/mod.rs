//! Gameplay state machine
//!
//! Round lifecycle, scoring, goal placement and bump detection. Pure and
//! deterministic:
//! - Time is supplied by the caller, never read from a clock
//! - Goal placement uses a seeded RNG
//! - Reads poses and calibration, never mutates them

pub mod state;
pub mod tick;

pub use state::{GameEvent, GameState, RoundEndReason, RoundPhase};
pub use tick::{TickContext, start_round, tick};
