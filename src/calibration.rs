//! Room frame and heading offset calibration
//!
//! The player's first observed position centres the play area, and the
//! direction from the player to the alignment body (placed in the known
//! forward direction before the session starts) fixes "forward". The vehicle's
//! onboard heading has an unknown but fixed mechanical offset relative to its
//! marker set; the alignment body measures it once.
//!
//! Both values are computed at most once per session. Only an explicit
//! `reset` clears them.

use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};

use crate::config::{Config, RoomConfig};
use crate::consts::DEGENERATE_DISTANCE;
use crate::math;
use crate::normalize_angle;
use crate::tracker::PoseTracker;

/// Rectangular play area in world coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoomFrame {
    pub x_lower: f64,
    pub y_lower: f64,
    /// Extent along X
    pub width: f64,
    /// Extent along Y
    pub length: f64,
}

impl From<RoomConfig> for RoomFrame {
    fn from(room: RoomConfig) -> Self {
        Self::new(room.x_lower, room.y_lower, room.width, room.length)
    }
}

impl RoomFrame {
    pub fn new(x_lower: f64, y_lower: f64, width: f64, length: f64) -> Self {
        Self {
            x_lower,
            y_lower,
            width,
            length,
        }
    }

    /// Room of the given size centred on `center`
    pub fn centered_on(center: DVec2, width: f64, length: f64) -> Self {
        Self::new(center.x - width / 2.0, center.y - length / 2.0, width, length)
    }

    #[inline]
    pub fn x_upper(&self) -> f64 {
        self.x_lower + self.width
    }

    #[inline]
    pub fn y_upper(&self) -> f64 {
        self.y_lower + self.length
    }

    pub fn min(&self) -> DVec2 {
        DVec2::new(self.x_lower, self.y_lower)
    }

    pub fn max(&self) -> DVec2 {
        DVec2::new(self.x_upper(), self.y_upper())
    }

    pub fn center(&self) -> DVec2 {
        (self.min() + self.max()) * 0.5
    }

    /// The four corners, counter-clockwise from the lower-left
    pub fn corners(&self) -> [DVec2; 4] {
        [
            DVec2::new(self.x_lower, self.y_lower),
            DVec2::new(self.x_upper(), self.y_lower),
            DVec2::new(self.x_upper(), self.y_upper()),
            DVec2::new(self.x_lower, self.y_upper()),
        ]
    }

    /// Whether a point's floor projection lies inside the room (edges included)
    pub fn contains(&self, point: DVec3) -> bool {
        point.x >= self.x_lower
            && point.x <= self.x_upper()
            && point.y >= self.y_lower
            && point.y <= self.y_upper()
    }

    /// Shrink every side by `margin`, never past the centre line
    pub fn inset(&self, margin: f64) -> Self {
        let mx = margin.clamp(0.0, self.width / 2.0);
        let my = margin.clamp(0.0, self.length / 2.0);
        Self::new(
            self.x_lower + mx,
            self.y_lower + my,
            self.width - 2.0 * mx,
            self.length - 2.0 * my,
        )
    }

    /// Room-relative coordinates in 0..1, y pointing up
    pub fn normalize(&self, point: DVec3) -> DVec2 {
        DVec2::new(
            (point.x - self.x_lower) / self.width,
            (point.y - self.y_lower) / self.length,
        )
    }

    /// Pixel coordinates on a `width_px` x `height_px` surface, y pointing down
    pub fn to_screen(&self, point: DVec3, width_px: u32, height_px: u32) -> DVec2 {
        let n = self.normalize(point);
        DVec2::new(n.x * width_px as f64, (1.0 - n.y) * height_px as f64)
    }
}

/// Correction added to raw headings so world forward matches screen forward
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeadingOffset(pub f64);

impl HeadingOffset {
    #[inline]
    pub fn radians(self) -> f64 {
        self.0
    }

    /// Apply to a raw heading, wrapped to [-π, π)
    pub fn apply(self, raw: f64) -> f64 {
        normalize_angle(raw + self.0)
    }
}

/// Values produced the frame calibration completes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationResult {
    pub room: RoomFrame,
    pub heading_offset: HeadingOffset,
}

/// Lazily computed, write-once calibration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Calibration {
    result: Option<CalibrationResult>,
    /// Set once a degenerate reference placement has been reported
    #[serde(skip)]
    degenerate_warned: bool,
}

impl Calibration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_calibrated(&self) -> bool {
        self.result.is_some()
    }

    pub fn result(&self) -> Option<CalibrationResult> {
        self.result
    }

    /// Room frame, or `None` while uncalibrated
    pub fn room_frame(&self) -> Option<RoomFrame> {
        self.result.map(|r| r.room)
    }

    /// Heading offset, or `None` while uncalibrated
    pub fn heading_offset(&self) -> Option<HeadingOffset> {
        self.result.map(|r| r.heading_offset)
    }

    /// Room frame, falling back to the configured default room
    pub fn room_frame_or_default(&self, config: &Config) -> RoomFrame {
        self.room_frame().unwrap_or_else(|| config.room.into())
    }

    /// Screen heading of a body whose initial raw heading was `initial_raw`
    ///
    /// Calibrated: the offset plus the turn made since the body was first
    /// seen, so a marker frame mounted at any fixed yaw cancels out.
    /// Uncalibrated: the raw heading.
    pub fn corrected_heading(&self, raw: f64, initial_raw: f64) -> f64 {
        match self.heading_offset() {
            Some(offset) => offset.apply(raw - initial_raw),
            None => normalize_angle(raw),
        }
    }

    /// Compute the calibration if it is missing and both reference poses exist
    ///
    /// Returns the result only on the call that completes calibration; every
    /// later call is a no-op returning `None`.
    pub fn try_calibrate(
        &mut self,
        tracker: &PoseTracker,
        config: &Config,
    ) -> Option<CalibrationResult> {
        if self.result.is_some() {
            return None;
        }
        let player = tracker.initial_pose(config.bodies.player)?;
        let alignment = tracker.initial_pose(config.bodies.alignment)?;

        let player_xy = player.position.truncate();
        let alignment_xy = alignment.position.truncate();
        let Some(forward) =
            math::try_direction_towards(player_xy, alignment_xy, DEGENERATE_DISTANCE)
        else {
            if !self.degenerate_warned {
                log::warn!(
                    "Player and alignment body coincide at ({:.3}, {:.3}); recalibrate after moving the alignment body",
                    player_xy.x,
                    player_xy.y
                );
                self.degenerate_warned = true;
            }
            return None;
        };

        let result = CalibrationResult {
            room: RoomFrame::centered_on(player_xy, config.room.width, config.room.length),
            heading_offset: HeadingOffset(math::heading(forward)),
        };
        log::info!(
            "Calibrated: room x={:.3} y={:.3} {:.3}x{:.3}, heading offset {:.4} rad",
            result.room.x_lower,
            result.room.y_lower,
            result.room.width,
            result.room.length,
            result.heading_offset.radians()
        );
        self.result = Some(result);
        Some(result)
    }

    /// Forget the calibration so the next reference poses recompute it
    pub fn reset(&mut self) {
        self.result = None;
        self.degenerate_warned = false;
    }
}
