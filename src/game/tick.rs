//! Per-frame game logic
//!
//! Runs once per stream frame, after every body's pose for that frame has
//! been applied. Order within a frame:
//! 1. Leave `AwaitingCalibration` once calibration exists
//! 2. While playing: goal capture, then the round deadline
//! 3. Bump detection on stationary bodies (in every phase)

use glam::DVec3;

use super::state::{GameEvent, GameState, RoundEndReason, RoundPhase};
use crate::calibration::{Calibration, RoomFrame};
use crate::config::Config;
use crate::tracker::PoseTracker;

/// Read-only inputs a tick needs
#[derive(Debug, Clone, Copy)]
pub struct TickContext<'a> {
    pub config: &'a Config,
    pub tracker: &'a PoseTracker,
    pub calibration: &'a Calibration,
}

impl TickContext<'_> {
    fn room(&self) -> RoomFrame {
        self.calibration.room_frame_or_default(self.config)
    }

    /// Player's current position, falling back to where it was first seen
    fn player_position(&self) -> Option<DVec3> {
        let id = self.config.bodies.player;
        self.tracker
            .current_pose(id)
            .or_else(|| self.tracker.initial_pose(id))
            .map(|pose| pose.position)
    }
}

/// Advance the game by one frame at absolute time `now` (seconds)
pub fn tick(state: &mut GameState, ctx: &TickContext<'_>, now: f64) -> Vec<GameEvent> {
    let mut events = Vec::new();

    if state.phase == RoundPhase::AwaitingCalibration && ctx.calibration.is_calibrated() {
        state.phase = RoundPhase::Idle;
        log::info!("Calibrated, waiting for start");
    }

    if state.phase == RoundPhase::Playing {
        check_goal(state, ctx, &mut events);
        if let Some(deadline) = state.round_deadline {
            if now >= deadline {
                events.push(state.end_round(RoundEndReason::TimeUp, RoundPhase::Idle));
            }
        }
    }

    detect_bumps(state, ctx, &mut events);

    events
}

/// Start a round if idle
pub fn start_round(state: &mut GameState, ctx: &TickContext<'_>, now: f64) -> GameEvent {
    if state.phase != RoundPhase::Idle {
        log::debug!("Start ignored in {:?}", state.phase);
        return GameEvent::StartIgnored { phase: state.phase };
    }

    let room = ctx.room();
    let player = ctx
        .player_position()
        .unwrap_or_else(|| room.center().extend(0.0));
    let goal = state
        .placer
        .place(&room, player, ctx.config.goal.min_distance);
    let deadline = now + ctx.config.round_duration_secs;

    state.phase = RoundPhase::Playing;
    state.score = 0;
    state.goal = Some(goal);
    state.round_deadline = Some(deadline);
    log::info!(
        "Round started, goal at ({:.3}, {:.3}), {:.0}s on the clock",
        goal.x,
        goal.y,
        ctx.config.round_duration_secs
    );
    GameEvent::RoundStarted { goal, deadline }
}

fn check_goal(state: &mut GameState, ctx: &TickContext<'_>, events: &mut Vec<GameEvent>) {
    let (Some(goal), Some(player)) = (state.goal, ctx.player_position()) else {
        return;
    };
    if player.distance(goal) >= ctx.config.goal.capture_tolerance {
        return;
    }

    state.score += 1;
    let next_goal = state
        .placer
        .place(&ctx.room(), player, ctx.config.goal.min_distance);
    state.goal = Some(next_goal);
    log::info!(
        "Goal reached! Score {}, next goal at ({:.3}, {:.3})",
        state.score,
        next_goal.x,
        next_goal.y
    );
    events.push(GameEvent::GoalReached {
        score: state.score,
        next_goal,
    });
}

fn detect_bumps(state: &mut GameState, ctx: &TickContext<'_>, events: &mut Vec<GameEvent>) {
    state.bumped.clear();
    for &body in &ctx.config.bodies.stationary {
        let Some(displacement) = ctx.tracker.displacement(body) else {
            continue;
        };
        if displacement > ctx.config.bump_tolerance {
            log::trace!("Body {} displaced {:.4}", body, displacement);
            state.bumped.push(body);
            events.push(GameEvent::Bump { body, displacement });
        }
    }

    if ctx.config.end_round_on_bump && state.is_playing() && !state.bumped.is_empty() {
        log::warn!("Bodies {:?} bumped, ending round", state.bumped);
        events.push(state.end_round(RoundEndReason::Bumped, RoundPhase::Idle));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DQuat;

    struct Fixture {
        config: Config,
        tracker: PoseTracker,
        calibration: Calibration,
        state: GameState,
    }

    impl Fixture {
        fn new(config: Config) -> Self {
            let tracker = PoseTracker::new(config.bodies.tracked);
            let state = GameState::new(12345, &config);
            Self {
                config,
                tracker,
                calibration: Calibration::new(),
                state,
            }
        }

        fn pose(&mut self, id: u32, x: f64, y: f64) {
            self.tracker
                .on_pose_update(id, DVec3::new(x, y, 0.0), DQuat::IDENTITY);
        }

        fn tick(&mut self, now: f64) -> Vec<GameEvent> {
            self.calibration.try_calibrate(&self.tracker, &self.config);
            let ctx = TickContext {
                config: &self.config,
                tracker: &self.tracker,
                calibration: &self.calibration,
            };
            tick(&mut self.state, &ctx, now)
        }

        fn start(&mut self, now: f64) -> GameEvent {
            let ctx = TickContext {
                config: &self.config,
                tracker: &self.tracker,
                calibration: &self.calibration,
            };
            start_round(&mut self.state, &ctx, now)
        }

        fn calibrated() -> Self {
            let mut f = Self::new(Config::default());
            f.pose(0, 0.0, 0.0);
            f.pose(1, 0.0, 0.5);
            f.tick(0.0);
            f
        }
    }

    #[test]
    fn test_awaiting_until_calibrated() {
        let mut f = Fixture::new(Config::default());
        f.pose(0, 0.0, 0.0);
        f.tick(0.0);
        assert_eq!(f.state.phase, RoundPhase::AwaitingCalibration);
        assert!(matches!(
            f.start(0.0),
            GameEvent::StartIgnored {
                phase: RoundPhase::AwaitingCalibration
            }
        ));

        f.pose(1, 0.0, 0.5);
        f.tick(0.1);
        assert_eq!(f.state.phase, RoundPhase::Idle);
    }

    #[test]
    fn test_start_round() {
        let mut f = Fixture::calibrated();
        f.state.score = 9;
        let event = f.start(10.0);

        assert_eq!(f.state.phase, RoundPhase::Playing);
        assert_eq!(f.state.score, 0);
        let GameEvent::RoundStarted { goal, deadline } = event else {
            panic!("expected RoundStarted, got {event:?}");
        };
        assert!(deadline > 10.0);
        assert_eq!(f.state.round_deadline, Some(deadline));
        assert!(goal.distance(DVec3::ZERO) >= f.config.goal.min_distance);

        // A second start while playing is ignored
        assert!(matches!(f.start(11.0), GameEvent::StartIgnored { .. }));
    }

    #[test]
    fn test_goal_capture_scores_and_moves_goal() {
        let mut f = Fixture::calibrated();
        f.start(0.0);
        let goal = f.state.goal.unwrap();

        // Park the player 0.09 from the goal
        f.pose(0, goal.x + 0.09, goal.y);
        let events = f.tick(1.0);

        assert_eq!(f.state.score, 1);
        let next = f.state.goal.unwrap();
        let player = DVec3::new(goal.x + 0.09, goal.y, 0.0);
        assert!(next.distance(player) >= f.config.goal.min_distance);
        assert!(events.contains(&GameEvent::GoalReached {
            score: 1,
            next_goal: next
        }));
    }

    #[test]
    fn test_goal_not_captured_outside_tolerance() {
        let mut f = Fixture::calibrated();
        f.start(0.0);
        let goal = f.state.goal.unwrap();
        f.pose(0, goal.x + 0.11, goal.y);
        f.tick(1.0);
        assert_eq!(f.state.score, 0);
        assert_eq!(f.state.goal, Some(goal));
    }

    #[test]
    fn test_deadline_ends_round_and_updates_high_score() {
        let mut f = Fixture::calibrated();
        f.start(0.0);
        f.state.score = 4;

        f.tick(119.9);
        assert_eq!(f.state.phase, RoundPhase::Playing);

        let events = f.tick(120.0);
        assert_eq!(f.state.phase, RoundPhase::Idle);
        assert_eq!(f.state.high_score, 4);
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::RoundEnded {
                reason: RoundEndReason::TimeUp,
                new_high_score: true,
                ..
            }
        )));

        // A worse round leaves the high score alone
        f.start(200.0);
        f.state.score = 2;
        f.tick(400.0);
        assert_eq!(f.state.high_score, 4);
    }

    #[test]
    fn test_bump_is_level_triggered() {
        let mut config = Config::default();
        config.bump_tolerance = 0.1;
        let mut f = Fixture::new(config);
        f.pose(0, 0.0, 0.0);
        f.pose(1, 1.0, 1.0);
        assert!(f.tick(0.0).is_empty());

        f.pose(1, 1.0, 1.2);
        for t in 1..4 {
            let events = f.tick(t as f64);
            let bumps: Vec<_> = events
                .iter()
                .filter(|e| matches!(e, GameEvent::Bump { body: 1, .. }))
                .collect();
            assert_eq!(bumps.len(), 1);
            assert!(f.state.is_bumped(1));
        }

        f.pose(1, 1.0, 1.05);
        assert!(f.tick(5.0).is_empty());
        assert!(!f.state.is_bumped(1));
    }

    #[test]
    fn test_bump_ends_round_when_configured() {
        let mut config = Config::default();
        config.end_round_on_bump = true;
        let mut f = Fixture::new(config);
        f.pose(0, 0.0, 0.0);
        f.pose(1, 0.0, 0.5);
        f.tick(0.0);
        f.start(0.0);

        f.pose(1, 0.0, 0.7);
        let events = f.tick(1.0);
        assert_eq!(f.state.phase, RoundPhase::Idle);
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::RoundEnded {
                reason: RoundEndReason::Bumped,
                ..
            }
        )));
    }

    #[test]
    fn test_bump_only_reported_by_default() {
        let mut f = Fixture::calibrated();
        f.start(0.0);
        f.pose(1, 0.0, 0.7);
        let events = f.tick(1.0);
        assert_eq!(f.state.phase, RoundPhase::Playing);
        assert!(events.iter().any(|e| matches!(e, GameEvent::Bump { .. })));
    }
}
