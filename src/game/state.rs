//! Round state and gameplay events

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::calibration::CalibrationResult;
use crate::config::Config;
use crate::goal::GoalPlacer;
use crate::tracker::BodyId;

/// Current phase of the round lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    /// Waiting for both reference bodies to be seen
    AwaitingCalibration,
    /// Calibrated, waiting for a start input
    Idle,
    /// Round running until the deadline
    Playing,
}

/// Why a round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundEndReason {
    /// Deadline reached
    TimeUp,
    /// A stationary body was bumped (only with `end_round_on_bump`)
    Bumped,
    /// Explicit recalibration
    Recalibrated,
}

/// Things that happened during a tick, in order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Calibration completed this frame
    Calibrated(CalibrationResult),
    /// A round started; goal placed and deadline set
    RoundStarted { goal: DVec3, deadline: f64 },
    /// The player reached the goal
    GoalReached { score: u32, next_goal: DVec3 },
    /// The round finished
    RoundEnded {
        score: u32,
        high_score: u32,
        new_high_score: bool,
        reason: RoundEndReason,
    },
    /// A stationary body is displaced beyond tolerance (emitted every tick it is)
    Bump { body: BodyId, displacement: f64 },
    /// Start input arrived outside the idle phase
    StartIgnored { phase: RoundPhase },
}

/// Gameplay state owned by the session
#[derive(Debug, Clone)]
pub struct GameState {
    pub phase: RoundPhase,
    /// Goals reached this round
    pub score: u32,
    /// Best score this session (never decreases)
    pub high_score: u32,
    /// Absolute time the running round ends
    pub round_deadline: Option<f64>,
    /// Current target while playing
    pub goal: Option<DVec3>,
    /// Stationary bodies displaced beyond tolerance as of the last tick
    pub bumped: Vec<BodyId>,
    /// Goal sampler (seeded)
    pub placer: GoalPlacer,
}

impl GameState {
    /// Fresh state awaiting calibration
    pub fn new(seed: u64, config: &Config) -> Self {
        Self {
            phase: RoundPhase::AwaitingCalibration,
            score: 0,
            high_score: 0,
            round_deadline: None,
            goal: None,
            bumped: Vec::new(),
            placer: GoalPlacer::new(seed, &config.goal),
        }
    }

    pub fn is_playing(&self) -> bool {
        self.phase == RoundPhase::Playing
    }

    /// Seconds left in the running round (0 when not playing)
    pub fn time_remaining(&self, now: f64) -> f64 {
        match (self.phase, self.round_deadline) {
            (RoundPhase::Playing, Some(deadline)) => (deadline - now).max(0.0),
            _ => 0.0,
        }
    }

    pub fn is_bumped(&self, id: BodyId) -> bool {
        self.bumped.contains(&id)
    }

    /// Finish the running round, crediting the high score
    pub(crate) fn end_round(&mut self, reason: RoundEndReason, next: RoundPhase) -> GameEvent {
        let new_high_score = self.score > self.high_score;
        if new_high_score {
            self.high_score = self.score;
        }
        self.phase = next;
        self.round_deadline = None;
        self.goal = None;
        log::info!(
            "Round over ({:?}): score {}, high score {}{}",
            reason,
            self.score,
            self.high_score,
            if new_high_score { " (new!)" } else { "" }
        );
        GameEvent::RoundEnded {
            score: self.score,
            high_score: self.high_score,
            new_high_score,
            reason,
        }
    }
}
