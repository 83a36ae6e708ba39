//! Read-only view handed to rendering/UI
//!
//! A snapshot is a self-contained copy: readers on other threads never touch
//! the live session.

use glam::{DVec2, DVec3};
use serde::Serialize;

use crate::calibration::RoomFrame;
use crate::game::RoundPhase;
use crate::tracker::BodyId;

/// One tracked body as the renderer sees it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BodyView {
    pub id: BodyId,
    /// World position
    pub position: DVec3,
    /// Position inside the room, 0..1 on each axis (y up)
    pub room_position: DVec2,
    /// Offset-corrected heading (raw heading while uncalibrated)
    pub heading: f64,
    /// Stationary body displaced beyond tolerance
    pub bumped: bool,
}

/// Everything the rendering boundary reads
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    /// Frame ticks processed so far
    pub frame: u64,
    pub phase: RoundPhase,
    pub score: u32,
    pub high_score: u32,
    /// Seconds left in the running round
    pub time_remaining: f64,
    pub goal: Option<DVec3>,
    pub calibrated: bool,
    /// Calibrated room, or the configured default
    pub room: RoomFrame,
    /// `None` while uncalibrated
    pub heading_offset: Option<f64>,
    /// Bodies observed at least once, in id order
    pub bodies: Vec<BodyView>,
}

impl Snapshot {
    pub fn body(&self, id: BodyId) -> Option<&BodyView> {
        self.bodies.iter().find(|b| b.id == id)
    }

    /// Goal in room-relative 0..1 coordinates
    pub fn goal_room_position(&self) -> Option<DVec2> {
        self.goal.map(|g| self.room.normalize(g))
    }
}
