//! Session configuration
//!
//! Every tunable lives here: room defaults, tolerances, round length,
//! reference-body roles and the quaternion contract with the stream source.
//! Loaded from JSON; missing fields fall back to `crate::consts`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{Error, Result};
use crate::math::{HeadingAxis, QuatLayout};
use crate::tracker::BodyId;

/// Default play area used until calibration derives one
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    pub x_lower: f64,
    pub y_lower: f64,
    pub width: f64,
    pub length: f64,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            x_lower: ROOM_X_LOWER,
            y_lower: ROOM_Y_LOWER,
            width: ROOM_WIDTH,
            length: ROOM_LENGTH,
        }
    }
}

/// Goal placement parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoalConfig {
    /// Capture distance between player and goal
    pub capture_tolerance: f64,
    /// Minimum spawn distance from the player
    pub min_distance: f64,
    /// Inset from the walls
    pub wall_margin: f64,
    /// Rejection-sampling cap
    pub max_attempts: u32,
}

impl Default for GoalConfig {
    fn default() -> Self {
        Self {
            capture_tolerance: GOAL_CAPTURE_TOLERANCE,
            min_distance: GOAL_MIN_DISTANCE,
            wall_margin: GOAL_WALL_MARGIN,
            max_attempts: GOAL_MAX_ATTEMPTS,
        }
    }
}

/// Which tracked body plays which role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyRoles {
    /// Number of tracked ids (0..tracked)
    pub tracked: u32,
    /// The vehicle the player drives
    pub player: BodyId,
    /// Body placed in the known-forward direction from the player at startup
    pub alignment: BodyId,
    /// Bodies expected to stay put (bump-monitored)
    pub stationary: Vec<BodyId>,
}

impl Default for BodyRoles {
    fn default() -> Self {
        Self {
            tracked: TRACKED_BODIES,
            player: PLAYER_BODY,
            alignment: ALIGNMENT_BODY,
            stationary: vec![ALIGNMENT_BODY],
        }
    }
}

/// Complete session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub room: RoomConfig,
    pub goal: GoalConfig,
    pub bodies: BodyRoles,
    /// Displacement beyond which a stationary body counts as bumped
    pub bump_tolerance: f64,
    /// End the running round the first tick a bump is seen
    pub end_round_on_bump: bool,
    /// Round length in seconds
    pub round_duration_secs: f64,
    /// Component order of raw stream quaternions
    pub quat_layout: QuatLayout,
    /// Body axis used for headings
    pub heading_axis: HeadingAxis,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            room: RoomConfig::default(),
            goal: GoalConfig::default(),
            bodies: BodyRoles::default(),
            bump_tolerance: BUMP_TOLERANCE,
            end_round_on_bump: false,
            round_duration_secs: ROUND_DURATION_SECS,
            quat_layout: QuatLayout::default(),
            heading_axis: HeadingAxis::default(),
        }
    }
}

impl Config {
    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| Error::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the game cannot run with
    pub fn validate(&self) -> Result<()> {
        fn positive(name: &str, value: f64) -> Result<()> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(Error::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )))
            }
        }

        positive("room.width", self.room.width)?;
        positive("room.length", self.room.length)?;
        positive("goal.capture_tolerance", self.goal.capture_tolerance)?;
        positive("bump_tolerance", self.bump_tolerance)?;
        positive("round_duration_secs", self.round_duration_secs)?;
        if !self.room.x_lower.is_finite() || !self.room.y_lower.is_finite() {
            return Err(Error::InvalidConfig("room bounds must be finite".into()));
        }
        if !(self.goal.min_distance.is_finite() && self.goal.min_distance >= 0.0) {
            return Err(Error::InvalidConfig(
                "goal.min_distance must be non-negative".into(),
            ));
        }
        if !(self.goal.wall_margin.is_finite() && self.goal.wall_margin >= 0.0) {
            return Err(Error::InvalidConfig(
                "goal.wall_margin must be non-negative".into(),
            ));
        }
        if self.goal.max_attempts == 0 {
            return Err(Error::InvalidConfig(
                "goal.max_attempts must be at least 1".into(),
            ));
        }

        let usable_width = self.room.width - 2.0 * self.goal.wall_margin;
        let usable_length = self.room.length - 2.0 * self.goal.wall_margin;
        let needed = 2.0 * self.goal.min_distance;
        if usable_width < needed || usable_length < needed {
            return Err(Error::InvalidConfig(format!(
                "room inside the wall margin ({usable_width:.3} x {usable_length:.3}) \
                 must be at least twice goal.min_distance ({needed:.3})"
            )));
        }

        let roles = &self.bodies;
        for (name, id) in [("player", roles.player), ("alignment", roles.alignment)] {
            if id >= roles.tracked {
                return Err(Error::InvalidConfig(format!(
                    "{name} body {id} is outside the tracked set 0..{}",
                    roles.tracked
                )));
            }
        }
        if roles.player == roles.alignment {
            return Err(Error::InvalidConfig(
                "player and alignment bodies must differ".into(),
            ));
        }
        if let Some(id) = roles
            .stationary
            .iter()
            .find(|&&id| id >= roles.tracked || id == roles.player)
        {
            return Err(Error::InvalidConfig(format!(
                "stationary body {id} must be tracked and not the player"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = Config::from_json(
            r#"{ "bump_tolerance": 0.005, "room": { "width": 2.0 }, "quat_layout": "xyzw" }"#,
        )
        .unwrap();
        assert_eq!(config.bump_tolerance, 0.005);
        assert_eq!(config.room.width, 2.0);
        assert_eq!(config.room.length, ROOM_LENGTH);
        assert_eq!(config.quat_layout, QuatLayout::Xyzw);
        assert_eq!(config.heading_axis, HeadingAxis::Forward);
    }

    #[test]
    fn test_json_round_trip() {
        let config = Config::default();
        let back = Config::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn test_front_back_car_roles() {
        let config = Config::from_json(
            r#"{ "bodies": { "tracked": 3, "player": 2, "alignment": 0, "stationary": [0, 1] } }"#,
        )
        .unwrap();
        assert_eq!(config.bodies.stationary, vec![0, 1]);
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut config = Config::default();
        config.room.width = 0.0;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let mut config = Config::default();
        config.bodies.alignment = config.bodies.player;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.bodies.stationary = vec![5];
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.goal.min_distance = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            Config::from_json("{ not json"),
            Err(Error::ConfigParse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = Config::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, Error::ConfigIo { .. }));
    }
}
