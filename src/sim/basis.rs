//! Portal coordinate frames
//!
//! A frame is three orthonormal world-space axes. Converting into the frame
//! is one dot product per axis; converting back is the weighted sum.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Orthonormal (east, north, out) axes of a portal
///
/// Orthonormality is assumed, not enforced. A skewed frame gives skewed
/// local coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BasisFrame {
    pub east: Vec3,
    pub north: Vec3,
    /// Plane normal; positive local z is in front of the portal
    pub out: Vec3,
}

impl BasisFrame {
    /// World axes: east = +X, north = +Y, out = +Z
    pub const IDENTITY: BasisFrame = BasisFrame {
        east: Vec3::X,
        north: Vec3::Y,
        out: Vec3::Z,
    };

    pub fn new(east: Vec3, north: Vec3, out: Vec3) -> Self {
        Self { east, north, out }
    }

    /// Upright frame facing `out` (projected onto the horizontal plane).
    /// Returns `None` for a vertical or zero direction.
    pub fn facing(out: Vec3) -> Option<Self> {
        let out = Vec3::new(out.x, 0.0, out.z).try_normalize()?;
        let north = Vec3::Y;
        let east = north.cross(out);
        Some(Self { east, north, out })
    }

    /// Components of a world-space vector along each axis
    #[inline]
    pub fn to_local(&self, v: Vec3) -> Vec3 {
        Vec3::new(v.dot(self.east), v.dot(self.north), v.dot(self.out))
    }

    #[inline]
    pub fn to_world(&self, local: Vec3) -> Vec3 {
        self.east * local.x + self.north * local.y + self.out * local.z
    }

    pub fn is_orthonormal(&self, eps: f32) -> bool {
        let unit = |v: Vec3| (v.length_squared() - 1.0).abs() <= eps;
        unit(self.east)
            && unit(self.north)
            && unit(self.out)
            && self.east.dot(self.north).abs() <= eps
            && self.east.dot(self.out).abs() <= eps
            && self.north.dot(self.out).abs() <= eps
    }
}

impl Default for BasisFrame {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn test_identity_is_passthrough() {
        let v = Vec3::new(1.0, -2.0, 3.5);
        assert_eq!(BasisFrame::IDENTITY.to_local(v), v);
    }

    #[test]
    fn test_rotated_frame_projection() {
        // Portal facing -X: its "out" is world -X
        let frame = BasisFrame::facing(-Vec3::X).unwrap();
        assert!(frame.is_orthonormal(1e-5));
        assert!(close(frame.out, -Vec3::X));

        // A point 2 units in front of it
        let local = frame.to_local(Vec3::new(-2.0, 1.0, 0.0));
        assert!((local.z - 2.0).abs() < 1e-5);
        assert!((local.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_local_world_inverse() {
        let frame = BasisFrame::facing(Vec3::new(1.0, 0.0, 1.0)).unwrap();
        let v = Vec3::new(0.3, 4.0, -7.0);
        assert!(close(frame.to_world(frame.to_local(v)), v));
    }

    #[test]
    fn test_facing_rejects_vertical() {
        assert!(BasisFrame::facing(Vec3::Y).is_none());
    }

    #[test]
    fn test_skewed_frame_detected() {
        let frame = BasisFrame::new(Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::Z);
        assert!(!frame.is_orthonormal(1e-3));
    }
}
