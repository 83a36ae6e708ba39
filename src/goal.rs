//! Goal placement
//!
//! Goals are drawn uniformly inside the room (inset from the walls) and
//! rejected while they land too close to the player. Sampling is capped at
//! `max_attempts`; after that the corner of the sampling area farthest from
//! the player is used, which always satisfies the distance constraint when
//! the sampling area is at least twice `min_distance` on each side.

use glam::{DVec2, DVec3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::calibration::RoomFrame;
use crate::config::GoalConfig;

/// Seeded rejection sampler for goal points
#[derive(Debug, Clone)]
pub struct GoalPlacer {
    rng: Pcg32,
    wall_margin: f64,
    max_attempts: u32,
}

impl GoalPlacer {
    pub fn new(seed: u64, config: &GoalConfig) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            wall_margin: config.wall_margin,
            max_attempts: config.max_attempts.max(1),
        }
    }

    /// Pick a goal inside `room` at least `min_distance` from `player`
    ///
    /// The goal shares the player's height.
    pub fn place(&mut self, room: &RoomFrame, player: DVec3, min_distance: f64) -> DVec3 {
        let area = room.inset(self.wall_margin);
        let lo = area.min();
        let hi = area.max();

        for attempt in 0..self.max_attempts {
            let candidate = DVec3::new(
                self.rng.random_range(lo.x..=hi.x),
                self.rng.random_range(lo.y..=hi.y),
                player.z,
            );
            if candidate.distance(player) >= min_distance {
                log::trace!("Goal placed after {} attempt(s)", attempt + 1);
                return candidate;
            }
        }

        let corner = farthest_corner(&area, player.truncate());
        log::warn!(
            "Goal placement gave up after {} attempts, using corner ({:.3}, {:.3})",
            self.max_attempts,
            corner.x,
            corner.y
        );
        corner.extend(player.z)
    }
}

/// Corner of `area` farthest from `from`
fn farthest_corner(area: &RoomFrame, from: DVec2) -> DVec2 {
    area.corners()
        .into_iter()
        .fold(area.min(), |best, corner| {
            if corner.distance_squared(from) > best.distance_squared(from) {
                corner
            } else {
                best
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn config(wall_margin: f64, max_attempts: u32) -> GoalConfig {
        GoalConfig {
            wall_margin,
            max_attempts,
            ..GoalConfig::default()
        }
    }

    #[test]
    fn test_place_respects_bounds_and_distance() {
        let room = RoomFrame::new(-0.5, -0.5, 1.0, 1.0);
        let mut placer = GoalPlacer::new(7, &config(0.1, 64));
        for _ in 0..200 {
            let goal = placer.place(&room, DVec3::ZERO, 0.3);
            assert!(room.inset(0.1).contains(goal));
            assert!(goal.distance(DVec3::ZERO) >= 0.3);
        }
    }

    #[test]
    fn test_same_seed_same_goals() {
        let room = RoomFrame::new(0.0, 0.0, 2.0, 2.0);
        let mut a = GoalPlacer::new(42, &config(0.0, 64));
        let mut b = GoalPlacer::new(42, &config(0.0, 64));
        for _ in 0..10 {
            let p = DVec3::new(1.0, 1.0, 0.0);
            assert_eq!(a.place(&room, p, 0.5), b.place(&room, p, 0.5));
        }
    }

    #[test]
    fn test_impossible_constraint_falls_back_to_corner() {
        let room = RoomFrame::new(0.0, 0.0, 1.0, 1.0);
        let mut placer = GoalPlacer::new(1, &config(0.0, 8));
        // Nothing in the room is 5 units away; the farthest corner is used
        let goal = placer.place(&room, DVec3::new(0.1, 0.2, 0.3), 5.0);
        assert_eq!(goal, DVec3::new(1.0, 1.0, 0.3));
    }

    #[test]
    fn test_goal_keeps_player_height() {
        let room = RoomFrame::new(0.0, 0.0, 1.0, 1.0);
        let mut placer = GoalPlacer::new(3, &config(0.0, 64));
        let goal = placer.place(&room, DVec3::new(0.5, 0.5, 0.04), 0.2);
        assert_eq!(goal.z, 0.04);
    }

    proptest! {
        #[test]
        fn prop_goal_in_room_and_far_enough(
            seed in any::<u64>(),
            x_lower in -3.0f64..3.0,
            y_lower in -3.0f64..3.0,
            min_distance in 0.05f64..0.5,
            extra_w in 0.0f64..2.0,
            extra_l in 0.0f64..2.0,
            px in 0.0f64..1.0,
            py in 0.0f64..1.0,
            max_attempts in 1u32..16,
        ) {
            let width = 2.0 * min_distance + extra_w;
            let length = 2.0 * min_distance + extra_l;
            let room = RoomFrame::new(x_lower, y_lower, width, length);
            let player = DVec3::new(x_lower + px * width, y_lower + py * length, 0.0);

            let mut placer = GoalPlacer::new(seed, &config(0.0, max_attempts));
            let goal = placer.place(&room, player, min_distance);
            prop_assert!(room.contains(goal));
            prop_assert!(goal.distance(player) >= min_distance - 1e-12);
        }
    }
}
