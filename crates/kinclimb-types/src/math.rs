//! Minimal 3-D math for the locomotion stack.
//!
//! World convention is Y-up with `+Z` forward and `+X` right, so that
//! `right = forward × up` for any yaw-only orientation.
//!
//! # Example
//!
//! ```rust
//! use kinclimb_types::math::{Quaternion, Transform3D, Vec3};
//!
//! let body = Transform3D::new(Vec3::new(1.0, 0.0, 0.0), Quaternion::identity());
//! let hand = body.apply(Vec3::new(0.0, 1.5, 0.3));
//! assert!((hand.x - 1.0).abs() < 1e-5);
//! assert!((hand.y - 1.5).abs() < 1e-5);
//! ```

use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Squared length below which a vector is treated as having no direction.
pub const DIRECTION_EPSILON_SQ: f32 = 1e-8;

// ────────────────────────────────────────────────────────────────────────────
// Vec3
// ────────────────────────────────────────────────────────────────────────────

/// A 3-D vector or point.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    pub const UP: Self = Self::new(0.0, 1.0, 0.0);
    pub const RIGHT: Self = Self::new(1.0, 0.0, 0.0);
    pub const FORWARD: Self = Self::new(0.0, 0.0, 1.0);

    /// Create a new vector.
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// The zero vector.
    pub fn zero() -> Self {
        Self::ZERO
    }

    pub fn dot(self, rhs: Self) -> f32 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    pub fn cross(self, rhs: Self) -> Self {
        Self::new(
            self.y * rhs.z - self.z * rhs.y,
            self.z * rhs.x - self.x * rhs.z,
            self.x * rhs.y - self.y * rhs.x,
        )
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

    /// Unit vector in the same direction, or `None` when the vector is too
    /// short to carry a direction.
    pub fn try_normalize(self) -> Option<Self> {
        let len_sq = self.length_squared();
        if len_sq <= DIRECTION_EPSILON_SQ || !len_sq.is_finite() {
            return None;
        }
        Some(self / len_sq.sqrt())
    }

    /// Projection onto the horizontal (XZ) plane.
    pub fn horizontal(self) -> Self {
        Self::new(self.x, 0.0, self.z)
    }

    /// Shorten the vector to at most `max` while keeping its direction.
    pub fn clamp_length(self, max: f32) -> Self {
        let len = self.length();
        if len > max && len > 0.0 {
            self * (max / len)
        } else {
            self
        }
    }

    /// Linear interpolation; `t = 0` yields `self`, `t = 1` yields `to`.
    pub fn lerp(self, to: Self, t: f32) -> Self {
        self + (to - self) * t
    }

    /// Spherical interpolation between two directions.
    ///
    /// Both inputs are normalised first.  Antiparallel inputs rotate about
    /// [`Vec3::UP`], which is the only axis the heading code ever turns
    /// around.  Returns `to` when either input has no direction.
    pub fn slerp(self, to: Self, t: f32) -> Self {
        let (Some(a), Some(b)) = (self.try_normalize(), to.try_normalize()) else {
            return to;
        };
        let t = t.clamp(0.0, 1.0);
        let cos = a.dot(b).clamp(-1.0, 1.0);
        if cos > 0.9995 {
            return a.lerp(b, t).try_normalize().unwrap_or(b);
        }
        if cos < -0.9995 {
            let angle = std::f32::consts::PI * t;
            return Quaternion::from_axis_angle(Self::UP, angle).rotate(a);
        }
        let theta = cos.acos();
        let sin = theta.sin();
        a * (((1.0 - t) * theta).sin() / sin) + b * ((t * theta).sin() / sin)
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl SubAssign for Vec3 {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Mul<f32> for Vec3 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Div<f32> for Vec3 {
    type Output = Self;
    fn div(self, rhs: f32) -> Self {
        Self::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Quaternion
// ────────────────────────────────────────────────────────────────────────────

/// A unit quaternion representing a 3-D rotation (w, x, y, z convention).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Quaternion {
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::identity()
    }
}

impl Quaternion {
    /// Create a quaternion.  The caller is responsible for providing a unit
    /// quaternion (|q| = 1).
    pub fn new(w: f32, x: f32, y: f32, z: f32) -> Self {
        Self { w, x, y, z }
    }

    /// The identity rotation (no rotation).
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0)
    }

    /// Rotation of `angle_rad` around `axis` (normalised internally).
    pub fn from_axis_angle(axis: Vec3, angle_rad: f32) -> Self {
        let Some(axis) = axis.try_normalize() else {
            return Self::identity();
        };
        let (s, c) = (angle_rad * 0.5).sin_cos();
        Self::new(c, axis.x * s, axis.y * s, axis.z * s)
    }

    /// Yaw-only rotation whose forward axis points along the horizontal
    /// projection of `forward`.  Returns `None` for vertical or zero input.
    pub fn look_rotation(forward: Vec3) -> Option<Self> {
        let f = forward.horizontal().try_normalize()?;
        Some(Self::from_axis_angle(Vec3::UP, f.x.atan2(f.z)))
    }

    /// Hamilton product: compose two rotations.
    pub fn mul(self, rhs: Self) -> Self {
        Self::new(
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
        )
    }

    /// Conjugate (== inverse for a unit quaternion).
    pub fn conjugate(self) -> Self {
        Self::new(self.w, -self.x, -self.y, -self.z)
    }

    pub fn dot(self, rhs: Self) -> f32 {
        self.w * rhs.w + self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    pub fn normalized(self) -> Self {
        let len = self.dot(self).sqrt();
        if len <= f32::EPSILON {
            return Self::identity();
        }
        Self::new(self.w / len, self.x / len, self.y / len, self.z / len)
    }

    /// Rotate a vector by this quaternion: p' = q * p * q*.
    pub fn rotate(self, v: Vec3) -> Vec3 {
        let p = Self::new(0.0, v.x, v.y, v.z);
        let rotated = self.mul(p).mul(self.conjugate());
        Vec3::new(rotated.x, rotated.y, rotated.z)
    }

    /// The body's forward axis (`+Z` rotated).
    pub fn forward(self) -> Vec3 {
        self.rotate(Vec3::FORWARD)
    }

    /// The body's right axis (`+X` rotated).
    pub fn right(self) -> Vec3 {
        self.rotate(Vec3::RIGHT)
    }

    /// Shortest-path spherical interpolation, `t` clamped to `[0, 1]`.
    pub fn slerp(self, to: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mut to = to;
        let mut cos = self.dot(to);
        if cos < 0.0 {
            to = Self::new(-to.w, -to.x, -to.y, -to.z);
            cos = -cos;
        }
        if cos > 0.9995 {
            return Self::new(
                self.w + (to.w - self.w) * t,
                self.x + (to.x - self.x) * t,
                self.y + (to.y - self.y) * t,
                self.z + (to.z - self.z) * t,
            )
            .normalized();
        }
        let theta = cos.acos();
        let sin = theta.sin();
        let a = ((1.0 - t) * theta).sin() / sin;
        let b = (t * theta).sin() / sin;
        Self::new(
            self.w * a + to.w * b,
            self.x * a + to.x * b,
            self.y * a + to.y * b,
            self.z * a + to.z * b,
        )
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Transform3D
// ────────────────────────────────────────────────────────────────────────────

/// A rigid-body 3-D transform: rotation followed by translation.
///
/// Maps a point expressed in a child frame (e.g. the sensor) into the parent
/// frame (e.g. the world).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Transform3D {
    pub translation: Vec3,
    pub rotation: Quaternion,
}

impl Transform3D {
    pub fn new(translation: Vec3, rotation: Quaternion) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    /// The identity transform (no translation, no rotation).
    pub fn identity() -> Self {
        Self::new(Vec3::zero(), Quaternion::identity())
    }

    /// Compose two transforms: if `self` = T_A_B and `other` = T_B_C, the
    /// result is T_A_C.
    pub fn compose(self, other: Self) -> Self {
        let translated = self.translation + self.rotation.rotate(other.translation);
        let rotated = self.rotation.mul(other.rotation);
        Self::new(translated, rotated)
    }

    /// Map a point from the child frame into the parent frame.
    pub fn apply(self, point: Vec3) -> Vec3 {
        self.translation + self.rotation.rotate(point)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn right_is_forward_cross_up() {
        assert!(approx(Vec3::FORWARD.cross(Vec3::UP), Vec3::RIGHT));
    }

    #[test]
    fn clamp_length_keeps_direction() {
        let v = Vec3::new(3.0, 0.0, 4.0).clamp_length(1.0);
        assert!((v.length() - 1.0).abs() < 1e-5);
        assert!(approx(v, Vec3::new(0.6, 0.0, 0.8)));

        let short = Vec3::new(0.1, 0.0, 0.0);
        assert_eq!(short.clamp_length(1.0), short);
    }

    #[test]
    fn try_normalize_rejects_zero() {
        assert!(Vec3::zero().try_normalize().is_none());
        let n = Vec3::new(0.0, 0.0, 2.0).try_normalize().unwrap();
        assert!(approx(n, Vec3::FORWARD));
    }

    #[test]
    fn yaw_rotation_turns_forward_to_right() {
        let q = Quaternion::from_axis_angle(Vec3::UP, FRAC_PI_2);
        assert!(approx(q.forward(), Vec3::RIGHT));
        assert!(approx(q.right(), Vec3::new(0.0, 0.0, -1.0)));
    }

    #[test]
    fn look_rotation_matches_direction() {
        let dir = Vec3::new(1.0, 0.5, 1.0);
        let q = Quaternion::look_rotation(dir).unwrap();
        let expected = dir.horizontal().try_normalize().unwrap();
        assert!(approx(q.forward(), expected));
        assert!(Quaternion::look_rotation(Vec3::UP).is_none());
    }

    #[test]
    fn vec_slerp_halfway_between_axes() {
        let mid = Vec3::FORWARD.slerp(Vec3::RIGHT, 0.5);
        let s = std::f32::consts::FRAC_1_SQRT_2;
        assert!(approx(mid, Vec3::new(s, 0.0, s)));
        assert!((mid.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn vec_slerp_antiparallel_turns_about_up() {
        let back = -Vec3::FORWARD;
        let mid = Vec3::FORWARD.slerp(back, 0.5);
        assert!(mid.y.abs() < 1e-5);
        assert!((mid.length() - 1.0).abs() < 1e-5);
        assert!(approx(Vec3::FORWARD.slerp(back, 1.0), back));
    }

    #[test]
    fn quaternion_slerp_endpoints() {
        let a = Quaternion::identity();
        let b = Quaternion::from_axis_angle(Vec3::UP, PI * 0.5);
        assert!(approx(a.slerp(b, 0.0).forward(), a.forward()));
        assert!(approx(a.slerp(b, 1.0).forward(), b.forward()));
        let half = a.slerp(b, 0.5).forward();
        let expected = Quaternion::from_axis_angle(Vec3::UP, PI * 0.25).forward();
        assert!(approx(half, expected));
    }

    #[test]
    fn transform_apply_rotates_then_translates() {
        let t = Transform3D::new(
            Vec3::new(0.0, 0.0, 5.0),
            Quaternion::from_axis_angle(Vec3::UP, FRAC_PI_2),
        );
        let p = t.apply(Vec3::FORWARD);
        assert!(approx(p, Vec3::new(1.0, 0.0, 5.0)));
    }

    #[test]
    fn transform_compose_translations_add() {
        let t1 = Transform3D::new(Vec3::new(1.0, 0.0, 0.0), Quaternion::identity());
        let t2 = Transform3D::new(Vec3::new(2.0, 0.0, 0.0), Quaternion::identity());
        assert!((t1.compose(t2).translation.x - 3.0).abs() < 1e-5);
    }
}
