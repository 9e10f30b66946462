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

//! Defines the column-major `Mat3` and `Mat4` types and associated operations.
//!
//! Projections follow the OpenGL clip-space convention (right-handed, depth in `[-1, 1]`).

use serde::{Deserialize, Serialize};

use super::{Quaternion, Vec3, Vec4};
use std::ops::{Index, IndexMut, Mul};

// --- Mat3 ---

/// A 3x3 column-major matrix, used for normal matrices and pure rotations.
#[derive(
    Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable, Serialize, Deserialize,
)]
#[repr(C)]
pub struct Mat3 {
    /// The columns of the matrix. `cols[0]` is the first column, and so on.
    pub cols: [Vec3; 3],
}

impl Mat3 {
    /// The 3x3 identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [Vec3::X, Vec3::Y, Vec3::Z],
    };

    /// Creates a new matrix from three column vectors.
    #[inline]
    pub fn from_cols(c0: Vec3, c1: Vec3, c2: Vec3) -> Self {
        Self { cols: [c0, c1, c2] }
    }

    /// Extracts the upper-left 3x3 block of a `Mat4`.
    #[inline]
    pub fn from_mat4(m: &Mat4) -> Self {
        Self::from_cols(
            m.cols[0].truncate(),
            m.cols[1].truncate(),
            m.cols[2].truncate(),
        )
    }

    /// Creates a rotation matrix from a quaternion.
    #[inline]
    pub fn from_quat(q: Quaternion) -> Self {
        Self::from_mat4(&Mat4::from_quat(q))
    }

    /// Computes the determinant of the matrix.
    #[inline]
    pub fn determinant(&self) -> f32 {
        self.cols[0].dot(self.cols[1].cross(self.cols[2]))
    }

    /// Returns the transpose of the matrix.
    pub fn transpose(&self) -> Self {
        let [a, b, c] = self.cols;
        Self::from_cols(
            Vec3::new(a.x, b.x, c.x),
            Vec3::new(a.y, b.y, c.y),
            Vec3::new(a.z, b.z, c.z),
        )
    }

    /// Computes the inverse of the matrix, or `None` if its determinant is zero.
    pub fn inverse(&self) -> Option<Self> {
        let [a, b, c] = self.cols;
        let r0 = b.cross(c);
        let r1 = c.cross(a);
        let r2 = a.cross(b);
        let det = a.dot(r0);
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let inv_det = 1.0 / det;
        // The cross products are the rows of the adjugate.
        Some(Self::from_cols(r0 * inv_det, r1 * inv_det, r2 * inv_det).transpose())
    }

    /// Builds the matrix that transforms normals for `model`: the inverse-transpose
    /// of its upper-left 3x3 block. Returns `None` for singular matrices.
    pub fn normal_matrix(model: &Mat4) -> Option<Self> {
        Some(Self::from_mat4(model).inverse()?.transpose())
    }

    /// Returns the nine components in column-major order.
    #[inline]
    pub fn to_cols_array(&self) -> [f32; 9] {
        bytemuck::cast(*self)
    }
}

impl Default for Mat3 {
    /// Returns the 3x3 identity matrix.
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul<Mat3> for Mat3 {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Mat3) -> Self::Output {
        Self::from_cols(self * rhs.cols[0], self * rhs.cols[1], self * rhs.cols[2])
    }
}

impl Mul<Vec3> for Mat3 {
    type Output = Vec3;
    #[inline]
    fn mul(self, rhs: Vec3) -> Self::Output {
        self.cols[0] * rhs.x + self.cols[1] * rhs.y + self.cols[2] * rhs.z
    }
}

impl Index<usize> for Mat3 {
    type Output = Vec3;
    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.cols[index]
    }
}

impl IndexMut<usize> for Mat3 {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.cols[index]
    }
}

// --- Mat4 ---

/// A 4x4 column-major matrix, used for affine transforms and for camera view and
/// projection matrices.
///
/// The memory layout matches what `glUniformMatrix4fv` expects with
/// `transpose = false`, see [`Mat4::to_cols_array`].
#[derive(
    Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable, Serialize, Deserialize,
)]
#[repr(C)]
pub struct Mat4 {
    /// The columns of the matrix. `cols[0]` is the first column, and so on.
    pub cols: [Vec4; 4],
}

impl Mat4 {
    /// The 4x4 identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [Vec4::X, Vec4::Y, Vec4::Z, Vec4::W],
    };

    /// A 4x4 matrix with all elements set to 0.
    pub const ZERO: Self = Self {
        cols: [Vec4::ZERO; 4],
    };

    /// Creates a new matrix from four column vectors.
    #[inline]
    pub fn from_cols(c0: Vec4, c1: Vec4, c2: Vec4, c3: Vec4) -> Self {
        Self {
            cols: [c0, c1, c2, c3],
        }
    }

    /// Creates a matrix from sixteen column-major components.
    #[inline]
    pub fn from_cols_array(m: &[f32; 16]) -> Self {
        bytemuck::cast(*m)
    }

    /// Returns the sixteen components in column-major order.
    #[inline]
    pub fn to_cols_array(&self) -> [f32; 16] {
        bytemuck::cast(*self)
    }

    /// Returns a row of the matrix as a `Vec4`.
    #[inline]
    pub fn get_row(&self, index: usize) -> Vec4 {
        Vec4::new(
            self.cols[0][index],
            self.cols[1][index],
            self.cols[2][index],
            self.cols[3][index],
        )
    }

    /// Creates a translation matrix.
    #[inline]
    pub fn from_translation(v: Vec3) -> Self {
        let mut m = Self::IDENTITY;
        m.cols[3] = Vec4::from_vec3(v, 1.0);
        m
    }

    /// Creates a non-uniform scaling matrix.
    #[inline]
    pub fn from_scale(scale: Vec3) -> Self {
        Self::from_cols(
            Vec4::X * scale.x,
            Vec4::Y * scale.y,
            Vec4::Z * scale.z,
            Vec4::W,
        )
    }

    /// Creates a rotation of `angle` radians around `axis`, which must be a unit vector.
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        let t = 1.0 - c;
        let Vec3 { x, y, z } = axis;

        Self::from_cols(
            Vec4::new(t * x * x + c, t * x * y + s * z, t * x * z - s * y, 0.0),
            Vec4::new(t * x * y - s * z, t * y * y + c, t * y * z + s * x, 0.0),
            Vec4::new(t * x * z + s * y, t * y * z - s * x, t * z * z + c, 0.0),
            Vec4::W,
        )
    }

    /// Creates a rotation matrix from a unit quaternion.
    pub fn from_quat(q: Quaternion) -> Self {
        let (x2, y2, z2) = (q.x + q.x, q.y + q.y, q.z + q.z);
        let (xx, xy, xz) = (q.x * x2, q.x * y2, q.x * z2);
        let (yy, yz, zz) = (q.y * y2, q.y * z2, q.z * z2);
        let (wx, wy, wz) = (q.w * x2, q.w * y2, q.w * z2);

        Self::from_cols(
            Vec4::new(1.0 - (yy + zz), xy + wz, xz - wy, 0.0),
            Vec4::new(xy - wz, 1.0 - (xx + zz), yz + wx, 0.0),
            Vec4::new(xz + wy, yz - wx, 1.0 - (xx + yy), 0.0),
            Vec4::W,
        )
    }

    /// Composes a transform that scales, then rotates, then translates.
    pub fn from_scale_rotation_translation(
        scale: Vec3,
        rotation: Quaternion,
        translation: Vec3,
    ) -> Self {
        let r = Self::from_quat(rotation);
        Self::from_cols(
            r.cols[0] * scale.x,
            r.cols[1] * scale.y,
            r.cols[2] * scale.z,
            Vec4::from_vec3(translation, 1.0),
        )
    }

    /// Decomposes an affine matrix into `(scale, rotation, translation)`.
    ///
    /// Scale is taken from the column norms of the upper 3x3 block, so it is always
    /// non-negative: a mirrored matrix comes back with the sign folded into the
    /// rotation. Columns of zero length are left unscaled while extracting rotation.
    pub fn to_scale_rotation_translation(&self) -> (Vec3, Quaternion, Vec3) {
        let scale = self.get_scaling();
        let inv = |s: f32| if s == 0.0 { 1.0 } else { 1.0 / s };
        let rotation = Mat3::from_cols(
            self.cols[0].truncate() * inv(scale.x),
            self.cols[1].truncate() * inv(scale.y),
            self.cols[2].truncate() * inv(scale.z),
        );
        (
            scale,
            Quaternion::from_rotation_matrix(&rotation),
            self.get_translation(),
        )
    }

    /// Returns the translation part of the matrix.
    #[inline]
    pub fn get_translation(&self) -> Vec3 {
        self.cols[3].truncate()
    }

    /// Returns the length of each basis column of the upper 3x3 block.
    #[inline]
    pub fn get_scaling(&self) -> Vec3 {
        Vec3::new(
            self.cols[0].truncate().length(),
            self.cols[1].truncate().length(),
            self.cols[2].truncate().length(),
        )
    }

    /// Returns the largest scale factor applied along any axis.
    ///
    /// Used to grow bounding spheres when they are moved into world space.
    #[inline]
    pub fn max_scale_on_axis(&self) -> f32 {
        let sq = Vec3::new(
            self.cols[0].truncate().length_squared(),
            self.cols[1].truncate().length_squared(),
            self.cols[2].truncate().length_squared(),
        );
        sq.max_element().sqrt()
    }

    /// Creates a right-handed perspective projection with a `[-1, 1]` depth range.
    ///
    /// # Arguments
    ///
    /// * `fov_y_radians`: Vertical field of view in radians.
    /// * `aspect_ratio`: Width divided by height of the viewport.
    /// * `z_near`, `z_far`: Distances to the clipping planes, `0 < z_near < z_far`.
    pub fn perspective_rh_gl(fov_y_radians: f32, aspect_ratio: f32, z_near: f32, z_far: f32) -> Self {
        let f = 1.0 / (fov_y_radians * 0.5).tan();
        let nf = 1.0 / (z_near - z_far);

        Self::from_cols(
            Vec4::new(f / aspect_ratio, 0.0, 0.0, 0.0),
            Vec4::new(0.0, f, 0.0, 0.0),
            Vec4::new(0.0, 0.0, (z_far + z_near) * nf, -1.0),
            Vec4::new(0.0, 0.0, 2.0 * z_far * z_near * nf, 0.0),
        )
    }

    /// Creates a right-handed orthographic projection with a `[-1, 1]` depth range.
    pub fn orthographic_rh_gl(
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        z_near: f32,
        z_far: f32,
    ) -> Self {
        let lr = 1.0 / (left - right);
        let bt = 1.0 / (bottom - top);
        let nf = 1.0 / (z_near - z_far);

        Self::from_cols(
            Vec4::new(-2.0 * lr, 0.0, 0.0, 0.0),
            Vec4::new(0.0, -2.0 * bt, 0.0, 0.0),
            Vec4::new(0.0, 0.0, 2.0 * nf, 0.0),
            Vec4::new(
                (left + right) * lr,
                (top + bottom) * bt,
                (z_far + z_near) * nf,
                1.0,
            ),
        )
    }

    /// Creates a right-handed view matrix for a camera at `eye` looking at `target`.
    ///
    /// Returns `None` if `eye` and `target` coincide or `up` is parallel to the
    /// view direction.
    pub fn look_at_rh(eye: Vec3, target: Vec3, up: Vec3) -> Option<Self> {
        let forward = target - eye;
        if forward.length_squared() == 0.0 {
            return None;
        }
        let f = forward.normalize();
        let s = f.cross(up);
        if s.length_squared() == 0.0 {
            return None;
        }
        let s = s.normalize();
        let u = s.cross(f);

        Some(Self::from_cols(
            Vec4::new(s.x, u.x, -f.x, 0.0),
            Vec4::new(s.y, u.y, -f.y, 0.0),
            Vec4::new(s.z, u.z, -f.z, 0.0),
            Vec4::new(-eye.dot(s), -eye.dot(u), eye.dot(f), 1.0),
        ))
    }

    /// Builds an object-to-world orientation placed at `eye` whose +Z axis points
    /// away from `target`.
    ///
    /// No degenerate case is special-cased: when `up` is parallel to the view
    /// direction the cross product is zero and stays zero after normalization.
    pub fn target_to(eye: Vec3, target: Vec3, up: Vec3) -> Self {
        let z = (eye - target).normalize();
        let x = up.cross(z).normalize();
        let y = z.cross(x);

        Self::from_cols(
            Vec4::from_vec3(x, 0.0),
            Vec4::from_vec3(y, 0.0),
            Vec4::from_vec3(z, 0.0),
            Vec4::from_vec3(eye, 1.0),
        )
    }

    /// Returns the transpose of the matrix.
    pub fn transpose(&self) -> Self {
        Self::from_cols(
            self.get_row(0),
            self.get_row(1),
            self.get_row(2),
            self.get_row(3),
        )
    }

    /// The twelve 2x2 sub-determinants shared by [`Mat4::determinant`] and
    /// [`Mat4::inverse`].
    #[inline]
    fn minors(&self) -> [f32; 12] {
        let [a0, a1, a2, a3] = self.cols;
        [
            a0.x * a1.y - a0.y * a1.x,
            a0.x * a1.z - a0.z * a1.x,
            a0.x * a1.w - a0.w * a1.x,
            a0.y * a1.z - a0.z * a1.y,
            a0.y * a1.w - a0.w * a1.y,
            a0.z * a1.w - a0.w * a1.z,
            a2.x * a3.y - a2.y * a3.x,
            a2.x * a3.z - a2.z * a3.x,
            a2.x * a3.w - a2.w * a3.x,
            a2.y * a3.z - a2.z * a3.y,
            a2.y * a3.w - a2.w * a3.y,
            a2.z * a3.w - a2.w * a3.z,
        ]
    }

    /// Computes the determinant of the matrix.
    pub fn determinant(&self) -> f32 {
        let b = self.minors();
        b[0] * b[11] - b[1] * b[10] + b[2] * b[9] + b[3] * b[8] - b[4] * b[7] + b[5] * b[6]
    }

    /// Computes the inverse of the matrix.
    ///
    /// Returns `None` if the determinant is zero.
    pub fn inverse(&self) -> Option<Self> {
        let b = self.minors();
        let det =
            b[0] * b[11] - b[1] * b[10] + b[2] * b[9] + b[3] * b[8] - b[4] * b[7] + b[5] * b[6];
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let d = 1.0 / det;
        let [a0, a1, a2, a3] = self.cols;

        Some(Self::from_cols(
            Vec4::new(
                (a1.y * b[11] - a1.z * b[10] + a1.w * b[9]) * d,
                (a0.z * b[10] - a0.y * b[11] - a0.w * b[9]) * d,
                (a3.y * b[5] - a3.z * b[4] + a3.w * b[3]) * d,
                (a2.z * b[4] - a2.y * b[5] - a2.w * b[3]) * d,
            ),
            Vec4::new(
                (a1.z * b[8] - a1.x * b[11] - a1.w * b[7]) * d,
                (a0.x * b[11] - a0.z * b[8] + a0.w * b[7]) * d,
                (a3.z * b[2] - a3.x * b[5] - a3.w * b[1]) * d,
                (a2.x * b[5] - a2.z * b[2] + a2.w * b[1]) * d,
            ),
            Vec4::new(
                (a1.x * b[10] - a1.y * b[8] + a1.w * b[6]) * d,
                (a0.y * b[8] - a0.x * b[10] - a0.w * b[6]) * d,
                (a3.x * b[4] - a3.y * b[2] + a3.w * b[0]) * d,
                (a2.y * b[2] - a2.x * b[4] - a2.w * b[0]) * d,
            ),
            Vec4::new(
                (a1.y * b[7] - a1.x * b[9] - a1.z * b[6]) * d,
                (a0.x * b[9] - a0.y * b[7] + a0.z * b[6]) * d,
                (a3.y * b[1] - a3.x * b[3] - a3.z * b[0]) * d,
                (a2.x * b[3] - a2.y * b[1] + a2.z * b[0]) * d,
            ),
        ))
    }

    /// Inverts a matrix made only of translation, rotation and scale.
    ///
    /// Cheaper than [`Mat4::inverse`]. Returns `None` if the 3x3 block is singular.
    pub fn affine_inverse(&self) -> Option<Self> {
        let inv = Mat3::from_mat4(self).inverse()?;
        let t = -(inv * self.get_translation());
        Some(Self::from_cols(
            Vec4::from_vec3(inv.cols[0], 0.0),
            Vec4::from_vec3(inv.cols[1], 0.0),
            Vec4::from_vec3(inv.cols[2], 0.0),
            Vec4::from_vec3(t, 1.0),
        ))
    }

    /// Transforms a point, dividing by the resulting `w` (treated as 1 when zero).
    #[inline]
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        let v = *self * Vec4::from_vec3(p, 1.0);
        let w = if v.w == 0.0 { 1.0 } else { v.w };
        v.truncate() / w
    }

    /// Transforms a direction, ignoring translation.
    #[inline]
    pub fn transform_vector(&self, v: Vec3) -> Vec3 {
        (*self * Vec4::from_vec3(v, 0.0)).truncate()
    }
}

impl Default for Mat4 {
    /// Returns the 4x4 identity matrix.
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul<Mat4> for Mat4 {
    type Output = Self;
    /// Multiplies this matrix by another. `a * b` applies `b` first.
    #[inline]
    fn mul(self, rhs: Mat4) -> Self::Output {
        Self::from_cols(
            self * rhs.cols[0],
            self * rhs.cols[1],
            self * rhs.cols[2],
            self * rhs.cols[3],
        )
    }
}

impl Mul<Vec4> for Mat4 {
    type Output = Vec4;
    #[inline]
    fn mul(self, rhs: Vec4) -> Self::Output {
        self.cols[0] * rhs.x + self.cols[1] * rhs.y + self.cols[2] * rhs.z + self.cols[3] * rhs.w
    }
}

impl Index<usize> for Mat4 {
    type Output = Vec4;
    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.cols[index]
    }
}

impl IndexMut<usize> for Mat4 {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.cols[index]
    }
}

// --- Tests ---

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{approx_eq_eps, FRAC_PI_2, PI};
    use approx::assert_relative_eq;

    fn mat4_approx_eq(a: Mat4, b: Mat4) -> bool {
        a.to_cols_array()
            .iter()
            .zip(b.to_cols_array().iter())
            .all(|(x, y)| approx_eq_eps(*x, *y, 1e-4))
    }

    #[test]
    fn test_axis_angle_matches_quaternion() {
        let axis = Vec3::new(1.0, 2.0, -0.5).normalize();
        let angle = 1.1;
        let m = Mat4::from_axis_angle(axis, angle);
        let q = Mat4::from_quat(Quaternion::from_axis_angle(axis, angle));
        assert!(mat4_approx_eq(m, q));
    }

    #[test]
    fn test_rotation_z_turns_x_into_y() {
        let m = Mat4::from_axis_angle(Vec3::Z, FRAC_PI_2);
        assert!(m.transform_vector(Vec3::X).approx_eq(Vec3::Y));
    }

    #[test]
    fn test_inverse() {
        let m = Mat4::from_scale_rotation_translation(
            Vec3::new(2.0, 3.0, 0.5),
            Quaternion::from_axis_angle(Vec3::Y, 0.7),
            Vec3::new(1.0, -2.0, 5.0),
        );
        let inv = m.inverse().expect("invertible");
        assert!(mat4_approx_eq(m * inv, Mat4::IDENTITY));
        let affine = m.affine_inverse().expect("invertible");
        assert!(mat4_approx_eq(affine, inv));
        assert_relative_eq!(m.determinant(), 3.0, epsilon = 1e-4);
    }

    #[test]
    fn test_inverse_singular_returns_none() {
        assert!(Mat4::ZERO.inverse().is_none());
        assert!(Mat4::from_scale(Vec3::new(1.0, 0.0, 1.0)).inverse().is_none());
        assert!(Mat3::from_mat4(&Mat4::ZERO).inverse().is_none());
    }

    #[test]
    fn test_inverse_of_small_scale_is_not_rejected() {
        let m = Mat4::from_scale(Vec3::splat(0.01));
        assert!(m.inverse().is_some());
    }

    #[test]
    fn test_compose_decompose_round_trip() {
        let t = Vec3::new(3.0, -4.0, 12.5);
        let r = Quaternion::from_axis_angle(Vec3::new(0.3, 1.0, 0.2).normalize(), 2.4);
        let s = Vec3::new(0.5, 2.0, 7.0);
        let (s2, r2, t2) = Mat4::from_scale_rotation_translation(s, r, t).to_scale_rotation_translation();
        assert_eq!(t2, t);
        assert!(s2.approx_eq(s));
        // q and -q encode the same rotation.
        assert_relative_eq!(r.dot(r2).abs(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_decompose_negative_scale_folds_sign_into_rotation() {
        let m = Mat4::from_scale(Vec3::new(-1.0, 1.0, 1.0));
        let (s, _, _) = m.to_scale_rotation_translation();
        assert_eq!(s, Vec3::ONE);
    }

    #[test]
    fn test_max_scale_on_axis() {
        let m = Mat4::from_scale_rotation_translation(
            Vec3::new(1.0, 4.0, 2.0),
            Quaternion::from_axis_angle(Vec3::X, 0.3),
            Vec3::ZERO,
        );
        assert_relative_eq!(m.max_scale_on_axis(), 4.0, epsilon = 1e-5);
    }

    #[test]
    fn test_perspective_gl_depth_range() {
        let p = Mat4::perspective_rh_gl(PI / 2.0, 1.0, 1.0, 100.0);
        let near = p.transform_point(Vec3::new(0.0, 0.0, -1.0));
        let far = p.transform_point(Vec3::new(0.0, 0.0, -100.0));
        assert_relative_eq!(near.z, -1.0, epsilon = 1e-5);
        assert_relative_eq!(far.z, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_orthographic_gl_depth_range() {
        let o = Mat4::orthographic_rh_gl(-2.0, 2.0, -1.0, 1.0, 0.1, 10.0);
        let p = o.transform_point(Vec3::new(2.0, 1.0, -10.0));
        assert!(p.approx_eq(Vec3::new(1.0, 1.0, 1.0)));
    }

    #[test]
    fn test_target_to_points_z_away_from_target() {
        let m = Mat4::target_to(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
        assert!(m.cols[2].truncate().approx_eq(Vec3::Z));
        assert!(m.cols[0].truncate().approx_eq(Vec3::X));
        assert_eq!(m.get_translation(), Vec3::new(0.0, 0.0, 5.0));
    }

    #[test]
    fn test_target_to_parallel_up_zeroes_x_axis() {
        let m = Mat4::target_to(Vec3::new(0.0, 5.0, 0.0), Vec3::ZERO, Vec3::Y);
        assert_eq!(m.cols[0].truncate(), Vec3::ZERO);
        assert!(m.cols[0].x.is_finite());
    }

    #[test]
    fn test_look_at_rh_is_inverse_of_target_to() {
        let eye = Vec3::new(1.0, 2.0, 3.0);
        let view = Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y).expect("valid view");
        let world = Mat4::target_to(eye, Vec3::ZERO, Vec3::Y);
        assert!(mat4_approx_eq(view * world, Mat4::IDENTITY));
        assert!(Mat4::look_at_rh(eye, eye, Vec3::Y).is_none());
    }

    #[test]
    fn test_normal_matrix_of_uniform_scale() {
        let n = Mat3::normal_matrix(&Mat4::from_scale(Vec3::splat(2.0))).expect("invertible");
        assert_relative_eq!(n.cols[0].x, 0.5);
        assert!(Mat3::normal_matrix(&Mat4::ZERO).is_none());
    }

    #[test]
    fn test_transform_point_divides_by_w() {
        let mut m = Mat4::IDENTITY;
        m.cols[3].w = 2.0;
        assert_eq!(m.transform_point(Vec3::new(2.0, 4.0, 6.0)), Vec3::new(1.0, 2.0, 3.0));
    }
}
