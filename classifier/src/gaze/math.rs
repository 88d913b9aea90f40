//! Minimal 3D math for gaze vectors: positions, directions and head/eye
//! rotations. No external math crate; only what the classifier needs.

use std::ops::{Add, Mul, Sub};

// ── Vec3 ────────────────────────────────────────────────────

/// 3D vector.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };
    /// Forward axis of an eye/head pose (left-handed, +Z forward).
    pub const FORWARD: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 1.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Self) -> Self {
        Self {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    pub fn distance(self, other: Self) -> f32 {
        (self - other).length()
    }

    pub fn normalize(self) -> Self {
        let len = self.length();
        if len < 1e-10 {
            return Self::ZERO;
        }
        Self {
            x: self.x / len,
            y: self.y / len,
            z: self.z / len,
        }
    }

    pub fn is_zero(self) -> bool {
        self == Self::ZERO
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Unsigned angle between two vectors in degrees.
    ///
    /// A zero-length operand has no direction; the angle is reported as 0.
    pub fn angle_deg(self, other: Self) -> f32 {
        let denom = (self.length_squared() * other.length_squared()).sqrt();
        if denom < 1e-15 {
            return 0.0;
        }
        let cos = (self.dot(other) / denom).clamp(-1.0, 1.0);
        cos.acos().to_degrees()
    }
}

impl Add for Vec3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

// ── Quat ────────────────────────────────────────────────────

/// Quaternion for head and eye rotations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quat {
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    pub fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Rotate a vector by this quaternion.
    pub fn rotate(&self, v: Vec3) -> Vec3 {
        // v + 2 * (w * (q x v) + q x (q x v))
        let qv = Vec3::new(self.x, self.y, self.z);
        let uv = qv.cross(v);
        let uuv = qv.cross(uv);
        v + (uv * self.w + uuv) * 2.0
    }

    /// Direction the pose is looking along.
    pub fn forward(&self) -> Vec3 {
        self.rotate(Vec3::FORWARD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_angle_between_axes() {
        let a = Vec3::new(1.0, 0.0, 0.0);
        let b = Vec3::new(0.0, 1.0, 0.0);
        assert!((a.angle_deg(b) - 90.0).abs() < 1e-4);
        assert!(a.angle_deg(a).abs() < 1e-3);
    }

    #[test]
    fn test_angle_with_zero_vector_is_zero() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(a.angle_deg(Vec3::ZERO), 0.0);
        assert_eq!(Vec3::ZERO.angle_deg(Vec3::ZERO), 0.0);
    }

    #[test]
    fn test_distance_and_length() {
        let a = Vec3::new(1.0, 0.0, 0.0);
        let b = Vec3::new(4.0, 4.0, 0.0);
        assert!((a.distance(b) - 5.0).abs() < 1e-6);
        assert!((Vec3::new(3.0, 4.0, 0.0).length() - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_zero_stays_zero() {
        assert_eq!(Vec3::ZERO.normalize(), Vec3::ZERO);
        let n = Vec3::new(0.0, 0.0, 5.0).normalize();
        assert!((n.z - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_quat_identity_forward() {
        let f = Quat::IDENTITY.forward();
        assert_eq!(f, Vec3::FORWARD);
    }

    #[test]
    fn test_quat_yaw_90_rotates_forward_to_x() {
        let half = (90.0f32).to_radians() * 0.5;
        let q = Quat::new(0.0, half.sin(), 0.0, half.cos());
        let f = q.forward();
        assert!((f.x - 1.0).abs() < 1e-5, "expected +X, got {:?}", f);
        assert!(f.z.abs() < 1e-5);
    }
}
