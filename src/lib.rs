//! Goal Chase - a motion-capture driven goal-chase game core
//!
//! Core modules:
//! - `math`: Vector and quaternion helpers (headings, planar directions)
//! - `tracker`: Per-body current and first-observed poses
//! - `calibration`: Room frame and heading offset derived from reference bodies
//! - `goal`: Seeded rejection-sampling goal placement
//! - `game`: Round lifecycle, scoring and bump detection
//! - `session`: The single-writer core that ties the above together
//! - `engine`: Dedicated processing thread with snapshot publication

pub mod calibration;
pub mod config;
pub mod engine;
pub mod error;
pub mod game;
pub mod goal;
pub mod math;
pub mod session;
pub mod snapshot;
pub mod tracker;

pub use calibration::{Calibration, HeadingOffset, RoomFrame};
pub use config::Config;
pub use engine::{Command, Engine, EngineHandle};
pub use error::{Error, Result};
pub use game::{GameEvent, GameState, RoundPhase};
pub use session::Session;
pub use snapshot::{BodyView, Snapshot};
pub use tracker::{BodyId, Pose, PoseTracker};

/// Default tunables (illustrative values, all overridable through `Config`)
pub mod consts {
    /// Default room lower X bound (metres)
    pub const ROOM_X_LOWER: f64 = -0.5;
    /// Default room lower Y bound (metres)
    pub const ROOM_Y_LOWER: f64 = -0.5;
    /// Default room width along X (metres)
    pub const ROOM_WIDTH: f64 = 1.0;
    /// Default room length along Y (metres)
    pub const ROOM_LENGTH: f64 = 1.0;

    /// Player counts as on the goal below this distance (~0.1 of a room dimension)
    pub const GOAL_CAPTURE_TOLERANCE: f64 = 0.1;
    /// New goals spawn at least this far from the player
    pub const GOAL_MIN_DISTANCE: f64 = 0.3;
    /// Goals never spawn closer than this to a wall
    pub const GOAL_WALL_MARGIN: f64 = 0.1;
    /// Rejection-sampling attempts before falling back to the farthest corner
    pub const GOAL_MAX_ATTEMPTS: u32 = 64;

    /// A stationary body displaced further than this has been bumped
    pub const BUMP_TOLERANCE: f64 = 0.05;

    /// Round length in seconds
    pub const ROUND_DURATION_SECS: f64 = 120.0;

    /// Player vehicle body id
    pub const PLAYER_BODY: u32 = 0;
    /// Alignment tool body id
    pub const ALIGNMENT_BODY: u32 = 1;
    /// Number of tracked body ids (0..TRACKED_BODIES)
    pub const TRACKED_BODIES: u32 = 2;

    /// Below this planar separation two reference points are coincident
    pub const DEGENERATE_DISTANCE: f64 = 1e-9;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f64) -> f64 {
    use std::f64::consts::PI;
    if !angle.is_finite() {
        return angle;
    }
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_normalize_angle_wraps() {
        assert!((normalize_angle(PI) + PI).abs() < 1e-12);
        assert!((normalize_angle(3.0 * PI / 2.0) + PI / 2.0).abs() < 1e-12);
        assert!((normalize_angle(-3.0 * PI / 2.0) - PI / 2.0).abs() < 1e-12);
        assert_eq!(normalize_angle(0.25), 0.25);
    }

    #[test]
    fn test_normalize_angle_passes_nan_through() {
        assert!(normalize_angle(f64::NAN).is_nan());
    }
}
