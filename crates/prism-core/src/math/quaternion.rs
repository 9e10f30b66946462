// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Provides a Quaternion type for representing 3D rotations.

use serde::{Deserialize, Serialize};

use super::{Euler, EulerOrder, Mat3, Vec3, SLERP_EPSILON};
use std::ops::{Add, Mul, MulAssign, Neg};

/// A rotation stored as `(x, y, z, w)`, where `[x, y, z]` is the vector part and
/// `w` the scalar part.
///
/// Rotations are expected to be unit quaternions. `q` and `-q` encode the same
/// rotation.
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable, Serialize, Deserialize)]
#[repr(C)]
pub struct Quaternion {
    /// The x component of the vector part.
    pub x: f32,
    /// The y component of the vector part.
    pub y: f32,
    /// The z component of the vector part.
    pub z: f32,
    /// The scalar (real) part.
    pub w: f32,
}

impl Quaternion {
    /// The identity quaternion, representing no rotation.
    pub const IDENTITY: Quaternion = Quaternion::new(0.0, 0.0, 0.0, 1.0);

    /// Creates a new quaternion from its raw components.
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Creates a rotation of `angle_radians` around `axis`. The axis is normalized first.
    #[inline]
    pub fn from_axis_angle(axis: Vec3, angle_radians: f32) -> Self {
        let axis = axis.normalize();
        let (s, c) = (angle_radians * 0.5).sin_cos();
        Self::new(axis.x * s, axis.y * s, axis.z * s, c)
    }

    /// Extracts the rotation of a pure rotation matrix.
    ///
    /// Uses the trace when it is positive and otherwise the branch of the largest
    /// diagonal element, which keeps the square root well away from zero near
    /// half-turn rotations.
    pub fn from_rotation_matrix(m: &Mat3) -> Self {
        let [c0, c1, c2] = m.cols;
        let (m00, m10, m20) = (c0.x, c0.y, c0.z);
        let (m01, m11, m21) = (c1.x, c1.y, c1.z);
        let (m02, m12, m22) = (c2.x, c2.y, c2.z);

        let trace = m00 + m11 + m22;
        let q = if trace > 0.0 {
            let s = 0.5 / (trace + 1.0).sqrt();
            Self::new((m21 - m12) * s, (m02 - m20) * s, (m10 - m01) * s, 0.25 / s)
        } else if m00 > m11 && m00 > m22 {
            let s = 2.0 * (1.0 + m00 - m11 - m22).sqrt();
            Self::new(0.25 * s, (m01 + m10) / s, (m02 + m20) / s, (m21 - m12) / s)
        } else if m11 > m22 {
            let s = 2.0 * (1.0 + m11 - m00 - m22).sqrt();
            Self::new((m01 + m10) / s, 0.25 * s, (m12 + m21) / s, (m02 - m20) / s)
        } else {
            let s = 2.0 * (1.0 + m22 - m00 - m11).sqrt();
            Self::new((m02 + m20) / s, (m12 + m21) / s, 0.25 * s, (m10 - m01) / s)
        };
        q.normalize()
    }

    /// Creates a quaternion from Euler angles applied in the angle's [`EulerOrder`].
    pub fn from_euler(e: &Euler) -> Self {
        let (sx, cx) = (e.x * 0.5).sin_cos();
        let (sy, cy) = (e.y * 0.5).sin_cos();
        let (sz, cz) = (e.z * 0.5).sin_cos();

        // Each order flips the signs of the cross terms.
        let (px, py, pz, pw) = match e.order {
            EulerOrder::XYZ => (1.0, -1.0, 1.0, -1.0),
            EulerOrder::YXZ => (1.0, -1.0, -1.0, 1.0),
            EulerOrder::ZXY => (-1.0, 1.0, 1.0, -1.0),
            EulerOrder::ZYX => (-1.0, 1.0, -1.0, 1.0),
            EulerOrder::YZX => (1.0, 1.0, -1.0, -1.0),
            EulerOrder::XZY => (-1.0, -1.0, 1.0, 1.0),
        };

        Self::new(
            sx * cy * cz + px * cx * sy * sz,
            cx * sy * cz + py * sx * cy * sz,
            cx * cy * sz + pz * sx * sy * cz,
            cx * cy * cz + pw * sx * sy * sz,
        )
    }

    /// Calculates the squared length of the quaternion.
    #[inline]
    pub fn length_squared(&self) -> f32 {
        self.dot(*self)
    }

    /// Calculates the length of the quaternion.
    #[inline]
    pub fn length(&self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Returns a unit-length copy. A zero quaternion is returned unchanged.
    pub fn normalize(&self) -> Self {
        let len_sq = self.length_squared();
        if len_sq > 0.0 {
            *self * (1.0 / len_sq.sqrt())
        } else {
            *self
        }
    }

    /// Negates the vector part.
    #[inline]
    pub fn conjugate(&self) -> Self {
        Self::new(-self.x, -self.y, -self.z, self.w)
    }

    /// Computes the inverse, or `None` for a zero quaternion.
    #[inline]
    pub fn inverse(&self) -> Option<Self> {
        let len_sq = self.length_squared();
        if len_sq == 0.0 {
            return None;
        }
        Some(self.conjugate() * (1.0 / len_sq))
    }

    /// Computes the dot product of two quaternions.
    #[inline]
    pub fn dot(&self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w
    }

    /// Rotates a 3D vector by this (unit) quaternion.
    pub fn rotate_vec3(&self, v: Vec3) -> Vec3 {
        let u = Vec3::new(self.x, self.y, self.z);
        let s = self.w;
        2.0 * u.dot(v) * u + (s * s - u.dot(u)) * v + 2.0 * s * u.cross(v)
    }

    /// Spherical linear interpolation along the shortest arc.
    ///
    /// `end` is negated when the two rotations are more than 90 degrees apart in
    /// quaternion space. When the remaining angle is tiny the result is a
    /// normalized linear interpolation. `t` is clamped to `[0, 1]`.
    pub fn slerp(start: Self, end: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mut cos_theta = start.dot(end);
        let mut end = end;

        if cos_theta < 0.0 {
            cos_theta = -cos_theta;
            end = -end;
        }

        if 1.0 - cos_theta <= SLERP_EPSILON {
            return (start * (1.0 - t) + end * t).normalize();
        }

        let angle = cos_theta.acos();
        let inv_sin = 1.0 / angle.sin();
        let a = ((1.0 - t) * angle).sin() * inv_sin;
        let b = (t * angle).sin() * inv_sin;
        start * a + end * b
    }
}

// --- Operator Overloads ---

impl Default for Quaternion {
    /// Returns the identity quaternion.
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul<Quaternion> for Quaternion {
    type Output = Self;
    /// Hamilton product: `a * b` applies `b` first.
    #[inline]
    fn mul(self, rhs: Self) -> Self::Output {
        Self {
            x: self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            y: self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            z: self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
            w: self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
        }
    }
}

impl MulAssign<Quaternion> for Quaternion {
    #[inline]
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl Mul<Vec3> for Quaternion {
    type Output = Vec3;
    #[inline]
    fn mul(self, rhs: Vec3) -> Self::Output {
        self.rotate_vec3(rhs)
    }
}

impl Add<Quaternion> for Quaternion {
    type Output = Self;
    /// Component-wise sum. Not a rotation operation.
    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z, self.w + rhs.w)
    }
}

impl Mul<f32> for Quaternion {
    type Output = Self;
    #[inline]
    fn mul(self, scalar: f32) -> Self::Output {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar, self.w * scalar)
    }
}

impl Neg for Quaternion {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y, -self.z, -self.w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Mat4, FRAC_PI_2, PI};
    use approx::assert_relative_eq;

    fn same_rotation(a: Quaternion, b: Quaternion) -> bool {
        (a.dot(b).abs() - 1.0).abs() < 1e-5
    }

    #[test]
    fn test_from_rotation_matrix_identity() {
        let q = Quaternion::from_rotation_matrix(&Mat3::IDENTITY);
        assert!(same_rotation(q, Quaternion::IDENTITY));
    }

    #[test]
    fn test_from_rotation_matrix_every_branch() {
        // Trace positive, then a half turn about each axis to hit the three
        // diagonal branches.
        let cases = [
            (Vec3::new(1.0, 1.0, 0.0).normalize(), 0.5),
            (Vec3::X, PI),
            (Vec3::Y, PI),
            (Vec3::Z, PI),
            (Vec3::new(1.0, -2.0, 3.0).normalize(), 3.0),
        ];
        for (axis, angle) in cases {
            let expected = Quaternion::from_axis_angle(axis, angle);
            let m = Mat3::from_mat4(&Mat4::from_quat(expected));
            let q = Quaternion::from_rotation_matrix(&m);
            assert!(same_rotation(q, expected), "axis {:?} angle {}", axis, angle);
        }
    }

    #[test]
    fn test_from_euler_matches_matrix_product() {
        let e = Euler::new(0.3, -0.7, 1.2, EulerOrder::XYZ);
        let expected = Quaternion::from_axis_angle(Vec3::X, e.x)
            * Quaternion::from_axis_angle(Vec3::Y, e.y)
            * Quaternion::from_axis_angle(Vec3::Z, e.z);
        assert!(same_rotation(Quaternion::from_euler(&e), expected));

        let e = Euler::new(0.3, -0.7, 1.2, EulerOrder::ZYX);
        let expected = Quaternion::from_axis_angle(Vec3::Z, e.z)
            * Quaternion::from_axis_angle(Vec3::Y, e.y)
            * Quaternion::from_axis_angle(Vec3::X, e.x);
        assert!(same_rotation(Quaternion::from_euler(&e), expected));
    }

    #[test]
    fn test_rotate_vec3() {
        let q = Quaternion::from_axis_angle(Vec3::Y, FRAC_PI_2);
        assert!((q * Vec3::X).approx_eq(-Vec3::Z));
    }

    #[test]
    fn test_inverse() {
        let q = Quaternion::from_axis_angle(Vec3::new(1.0, 2.0, 3.0), 0.8);
        let i = q * q.inverse().expect("non-zero");
        assert!(same_rotation(i, Quaternion::IDENTITY));
        assert!(Quaternion::new(0.0, 0.0, 0.0, 0.0).inverse().is_none());
    }

    #[test]
    fn test_normalize_zero_leaves_input_unchanged() {
        let zero = Quaternion::new(0.0, 0.0, 0.0, 0.0);
        assert_eq!(zero.normalize(), zero);
    }

    #[test]
    fn test_slerp_same_input_is_identity_for_all_t() {
        let a = Quaternion::from_axis_angle(Vec3::new(0.2, 1.0, 0.0), 1.3);
        for i in 0..=10 {
            let r = Quaternion::slerp(a, a, i as f32 / 10.0);
            assert!(same_rotation(r, a));
        }
    }

    #[test]
    fn test_slerp_antipodal_is_unit_length() {
        let a = Quaternion::from_axis_angle(Vec3::Z, 0.9);
        let r = Quaternion::slerp(a, -a, 0.5);
        assert!(r.x.is_finite() && r.w.is_finite());
        assert_relative_eq!(r.length(), 1.0, epsilon = 1e-5);
        assert!(same_rotation(r, a));
    }

    #[test]
    fn test_slerp_midpoint() {
        let a = Quaternion::IDENTITY;
        let b = Quaternion::from_axis_angle(Vec3::Y, FRAC_PI_2);
        let mid = Quaternion::slerp(a, b, 0.5);
        assert!(same_rotation(mid, Quaternion::from_axis_angle(Vec3::Y, FRAC_PI_2 / 2.0)));
    }

    #[test]
    fn test_slerp_takes_short_path() {
        let a = Quaternion::from_axis_angle(Vec3::Y, 0.1);
        let b = -Quaternion::from_axis_angle(Vec3::Y, 0.3);
        let mid = Quaternion::slerp(a, b, 0.5);
        assert!(same_rotation(mid, Quaternion::from_axis_angle(Vec3::Y, 0.2)));
    }
}
