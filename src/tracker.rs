//! Per-body pose tracking
//!
//! Each tracked body keeps the most recent pose and a one-time latch of the
//! first pose ever observed. The latch drives calibration and bump detection.

use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};

use crate::math::{self, HeadingAxis};

/// Rigid body identifier assigned by the stream source
pub type BodyId = u32;

/// Position and orientation of a rigid body at one instant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: DVec3,
    /// Unit quaternion (normalized upstream)
    pub orientation: DQuat,
}

impl Pose {
    pub fn new(position: DVec3, orientation: DQuat) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Raw heading of the body, before any offset correction
    pub fn heading(&self, axis: HeadingAxis) -> f64 {
        math::quat_heading(self.orientation, axis)
    }
}

/// A single tracked body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackedBody {
    /// Latest pose (overwritten on every update)
    pub current: Option<Pose>,
    /// First pose ever observed (set once, never overwritten)
    pub initial: Option<Pose>,
}

impl TrackedBody {
    /// Record a pose, latching it as the initial pose if none exists yet
    ///
    /// Returns true when this update set the initial pose.
    pub fn observe(&mut self, pose: Pose) -> bool {
        self.current = Some(pose);
        if self.initial.is_none() {
            self.initial = Some(pose);
            return true;
        }
        false
    }

    /// Distance between current and initial positions
    pub fn displacement(&self) -> Option<f64> {
        match (self.current, self.initial) {
            (Some(current), Some(initial)) => {
                Some(math::distance(current.position, initial.position))
            }
            _ => None,
        }
    }
}

/// Owns every tracked body for the session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoseTracker {
    /// Indexed by body id
    bodies: Vec<TrackedBody>,
}

impl PoseTracker {
    /// Track ids `0..count`
    pub fn new(count: u32) -> Self {
        Self {
            bodies: vec![TrackedBody::default(); count as usize],
        }
    }

    /// Apply one pose update from the stream
    ///
    /// Ids outside the tracked set are ignored: the stream may report extra
    /// bodies we don't care about.
    pub fn on_pose_update(&mut self, id: BodyId, position: DVec3, orientation: DQuat) {
        let Some(body) = self.bodies.get_mut(id as usize) else {
            log::trace!("Ignoring pose for untracked body {}", id);
            return;
        };
        if body.observe(Pose::new(position, orientation)) {
            log::info!(
                "Body {} first observed at ({:.3}, {:.3}, {:.3})",
                id,
                position.x,
                position.y,
                position.z
            );
        }
    }

    pub fn body(&self, id: BodyId) -> Option<&TrackedBody> {
        self.bodies.get(id as usize)
    }

    pub fn current_pose(&self, id: BodyId) -> Option<Pose> {
        self.body(id).and_then(|b| b.current)
    }

    pub fn initial_pose(&self, id: BodyId) -> Option<Pose> {
        self.body(id).and_then(|b| b.initial)
    }

    /// Distance a body has moved from where it was first seen
    pub fn displacement(&self, id: BodyId) -> Option<f64> {
        self.body(id).and_then(TrackedBody::displacement)
    }

    /// Iterate `(id, body)` in id order
    pub fn iter(&self) -> impl Iterator<Item = (BodyId, &TrackedBody)> {
        self.bodies
            .iter()
            .enumerate()
            .map(|(i, body)| (i as BodyId, body))
    }

    /// Re-arm the initial-pose latch of every body (explicit recalibration only)
    pub fn clear_initial_poses(&mut self) {
        for body in &mut self.bodies {
            body.initial = None;
        }
    }
}
