//! Single-writer game core
//!
//! `Session` owns the tracker, the calibration and the game state. The stream
//! adapter feeds it pose updates and frame boundaries; nothing else mutates
//! it. Other threads read `Snapshot`s.

use glam::{DQuat, DVec3};

use crate::calibration::Calibration;
use crate::config::Config;
use crate::error::Result;
use crate::game::{self, GameEvent, GameState, RoundEndReason, RoundPhase, TickContext};
use crate::snapshot::{BodyView, Snapshot};
use crate::tracker::{BodyId, Pose, PoseTracker};

/// The complete core state of one play session
#[derive(Debug, Clone)]
pub struct Session {
    config: Config,
    tracker: PoseTracker,
    calibration: Calibration,
    state: GameState,
    /// Frame ticks processed
    frame: u64,
}

impl Session {
    /// New session; `seed` drives goal placement
    pub fn new(config: Config, seed: u64) -> Result<Self> {
        config.validate()?;
        let tracker = PoseTracker::new(config.bodies.tracked);
        let state = GameState::new(seed, &config);
        log::info!(
            "Session created: {} bodies, player {}, alignment {}, seed {}",
            config.bodies.tracked,
            config.bodies.player,
            config.bodies.alignment,
            seed
        );
        Ok(Self {
            config,
            tracker,
            calibration: Calibration::new(),
            state,
            frame: 0,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn tracker(&self) -> &PoseTracker {
        &self.tracker
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> RoundPhase {
        self.state.phase
    }

    /// Apply one body's pose for the current frame
    pub fn on_pose_update(&mut self, id: BodyId, position: DVec3, orientation: DQuat) {
        self.tracker.on_pose_update(id, position, orientation);
    }

    /// Apply a pose in raw stream form, using the configured quaternion layout
    pub fn on_raw_pose_update(&mut self, id: BodyId, position: [f64; 3], orientation: [f64; 4]) {
        let q = self.config.quat_layout.to_quat(orientation);
        self.on_pose_update(id, DVec3::from_array(position), q);
    }

    /// Frame boundary: calibrate if possible, then run game logic
    pub fn on_frame_tick(&mut self, now: f64) -> Vec<GameEvent> {
        self.frame += 1;
        let mut events = Vec::new();
        if let Some(result) = self.calibration.try_calibrate(&self.tracker, &self.config) {
            events.push(GameEvent::Calibrated(result));
        }
        let ctx = TickContext {
            config: &self.config,
            tracker: &self.tracker,
            calibration: &self.calibration,
        };
        events.extend(game::tick(&mut self.state, &ctx, now));
        events
    }

    /// User start input
    pub fn start_round(&mut self, now: f64) -> GameEvent {
        let ctx = TickContext {
            config: &self.config,
            tracker: &self.tracker,
            calibration: &self.calibration,
        };
        game::start_round(&mut self.state, &ctx, now)
    }

    /// Drop the calibration and re-arm initial-pose capture
    ///
    /// Ends a running round first. The next frame that has both reference
    /// bodies observed again recalibrates.
    pub fn recalibrate(&mut self) -> Option<GameEvent> {
        let ended = self.state.is_playing().then(|| {
            self.state
                .end_round(RoundEndReason::Recalibrated, RoundPhase::AwaitingCalibration)
        });
        self.state.phase = RoundPhase::AwaitingCalibration;
        self.state.bumped.clear();
        self.calibration.reset();
        self.tracker.clear_initial_poses();
        log::info!("Recalibration requested");
        ended
    }

    fn raw_heading(&self, pose: Pose) -> f64 {
        let raw = pose.heading(self.config.heading_axis);
        // Axis pointing straight up or down has no heading
        if raw.is_nan() {
            0.0
        } else {
            raw
        }
    }

    /// Copy out everything the renderer needs
    pub fn snapshot(&self, now: f64) -> Snapshot {
        let room = self.calibration.room_frame_or_default(&self.config);
        let bodies = self
            .tracker
            .iter()
            .filter_map(|(id, body)| body.current.map(|pose| (id, pose, body.initial)))
            .map(|(id, pose, initial)| {
                let raw = self.raw_heading(pose);
                let initial_raw = initial.map_or(raw, |p| self.raw_heading(p));
                BodyView {
                    id,
                    position: pose.position,
                    room_position: room.normalize(pose.position),
                    heading: self.calibration.corrected_heading(raw, initial_raw),
                    bumped: self.state.is_bumped(id),
                }
            })
            .collect();

        Snapshot {
            frame: self.frame,
            phase: self.state.phase,
            score: self.state.score,
            high_score: self.state.high_score,
            time_remaining: self.state.time_remaining(now),
            goal: self.state.goal,
            calibrated: self.calibration.is_calibrated(),
            room,
            heading_offset: self.calibration.heading_offset().map(|o| o.radians()),
            bodies,
        }
    }
}
