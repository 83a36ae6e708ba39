//! Vector and quaternion helpers
//!
//! Plain arithmetic (add, sub, scale, dot, length) comes straight from glam's
//! `DVec2`/`DVec3`. This module adds the pieces the game needs on top:
//! directions between points, planar projection and headings.
//!
//! Normalizing a zero-length vector is NOT clamped here: `direction_towards`
//! and `planar_direction` return NaN components for degenerate input. Callers
//! that can see coincident points use the `try_` variants and decide.

use glam::{DQuat, DVec2, DVec3};
use serde::{Deserialize, Serialize};

/// Component order of raw orientation quaternions delivered by the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuatLayout {
    /// `[w, x, y, z]`
    #[default]
    Wxyz,
    /// `[x, y, z, w]`
    Xyzw,
}

impl QuatLayout {
    /// Build a quaternion from raw stream components
    pub fn to_quat(self, raw: [f64; 4]) -> DQuat {
        match self {
            QuatLayout::Wxyz => DQuat::from_xyzw(raw[1], raw[2], raw[3], raw[0]),
            QuatLayout::Xyzw => DQuat::from_xyzw(raw[0], raw[1], raw[2], raw[3]),
        }
    }
}

/// Which body axis defines a body's heading once projected on the floor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingAxis {
    /// Rotated +X (identity orientation faces heading 0)
    #[default]
    Forward,
    /// Rotated +Y (identity orientation faces heading π/2)
    Up,
}

/// Body +X axis rotated into world space
#[inline]
pub fn forward_vector(q: DQuat) -> DVec3 {
    q * DVec3::X
}

/// Body +Y axis rotated into world space
#[inline]
pub fn up_vector(q: DQuat) -> DVec3 {
    q * DVec3::Y
}

/// Axis vector selected by `axis`
#[inline]
pub fn axis_vector(q: DQuat, axis: HeadingAxis) -> DVec3 {
    match axis {
        HeadingAxis::Forward => forward_vector(q),
        HeadingAxis::Up => up_vector(q),
    }
}

/// Unit direction from `from` to `to` (NaN when the points coincide)
#[inline]
pub fn direction_towards(from: DVec2, to: DVec2) -> DVec2 {
    let delta = to - from;
    delta / delta.length()
}

/// Unit direction from `from` to `to`, or `None` when closer than `epsilon`
pub fn try_direction_towards(from: DVec2, to: DVec2, epsilon: f64) -> Option<DVec2> {
    let delta = to - from;
    let len = delta.length();
    (len.is_finite() && len > epsilon).then(|| delta / len)
}

/// Drop the z component and normalize (NaN for a vertical or zero vector)
#[inline]
pub fn planar_direction(v: DVec3) -> DVec2 {
    let flat = v.truncate();
    flat / flat.length()
}

/// Planar direction, or `None` for a vertical or zero vector
pub fn try_planar_direction(v: DVec3) -> Option<DVec2> {
    let flat = v.truncate();
    let len = flat.length();
    (len.is_finite() && len > 0.0).then(|| flat / len)
}

/// Heading angle of a 2D direction, `atan2(y, x)`
#[inline]
pub fn heading(dir: DVec2) -> f64 {
    dir.y.atan2(dir.x)
}

/// Heading of an orientation's chosen axis projected on the floor
///
/// Returns NaN when the axis points straight up or down.
pub fn quat_heading(q: DQuat, axis: HeadingAxis) -> f64 {
    heading(planar_direction(axis_vector(q, axis)))
}

/// Euclidean distance between two points
#[inline]
pub fn distance(a: DVec3, b: DVec3) -> f64 {
    a.distance(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    const EPS: f64 = 1e-9;

    #[test]
    fn test_identity_heading_forward_is_zero() {
        let q = QuatLayout::Wxyz.to_quat([1.0, 0.0, 0.0, 0.0]);
        assert!(quat_heading(q, HeadingAxis::Forward).abs() < EPS);
    }

    #[test]
    fn test_identity_heading_up_is_quarter_turn() {
        let q = DQuat::IDENTITY;
        assert!((quat_heading(q, HeadingAxis::Up) - FRAC_PI_2).abs() < EPS);
    }

    #[test]
    fn test_quat_layouts_agree() {
        let wxyz = QuatLayout::Wxyz.to_quat([0.5, 0.5, 0.5, 0.5]);
        let xyzw = QuatLayout::Xyzw.to_quat([0.5, 0.5, 0.5, 0.5]);
        assert_eq!(wxyz, xyzw);

        let yaw = DQuat::from_rotation_z(0.7);
        let raw_wxyz = [yaw.w, yaw.x, yaw.y, yaw.z];
        let raw_xyzw = [yaw.x, yaw.y, yaw.z, yaw.w];
        assert!(QuatLayout::Wxyz.to_quat(raw_wxyz).abs_diff_eq(yaw, EPS));
        assert!(QuatLayout::Xyzw.to_quat(raw_xyzw).abs_diff_eq(yaw, EPS));
    }

    #[test]
    fn test_yaw_rotation_heading() {
        let q = DQuat::from_rotation_z(FRAC_PI_2);
        assert!((quat_heading(q, HeadingAxis::Forward) - FRAC_PI_2).abs() < EPS);
        // Up axis is a further quarter turn ahead
        let up = quat_heading(q, HeadingAxis::Up);
        assert!((up.abs() - PI).abs() < EPS);
    }

    #[test]
    fn test_direction_towards() {
        let d = direction_towards(DVec2::ZERO, DVec2::new(0.0, 0.5));
        assert!((d - DVec2::Y).length() < EPS);
        assert!((heading(d) - FRAC_PI_2).abs() < EPS);
    }

    #[test]
    fn test_direction_towards_coincident_is_nan() {
        let p = DVec2::new(1.0, 2.0);
        let d = direction_towards(p, p);
        assert!(d.x.is_nan() && d.y.is_nan());
        assert_eq!(try_direction_towards(p, p, 1e-9), None);
    }

    #[test]
    fn test_planar_direction_projects_out_z() {
        let d = planar_direction(DVec3::new(3.0, 4.0, 100.0));
        assert!((d - DVec2::new(0.6, 0.8)).length() < EPS);
        assert!(planar_direction(DVec3::Z).x.is_nan());
        assert_eq!(try_planar_direction(DVec3::Z), None);
    }

    #[test]
    fn test_distance() {
        let a = DVec3::new(1.0, 1.0, 0.0);
        let b = DVec3::new(1.0, 1.2, 0.0);
        assert!((distance(a, b) - 0.2).abs() < EPS);
    }
}
