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

//! Bounding volumes and the camera frustum used for visibility culling.

use serde::{Deserialize, Serialize};

use super::{Mat4, Vec3, Vec4};

/// An Axis-Aligned Bounding Box defined by its minimum and maximum corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(C)]
pub struct Aabb {
    /// The corner of the box with the smallest coordinates on all axes.
    pub min: Vec3,
    /// The corner of the box with the largest coordinates on all axes.
    pub max: Vec3,
}

impl Aabb {
    /// An empty box: merging any point into it yields that point.
    pub const INVALID: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    /// Creates a box from two corners given in any order.
    #[inline]
    pub fn from_min_max(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Computes the smallest box enclosing all `points`, or `None` if there are none.
    pub fn from_points<I: IntoIterator<Item = Vec3>>(points: I) -> Option<Self> {
        let aabb = points
            .into_iter()
            .fold(Self::INVALID, |acc, p| acc.merged_with_point(p));
        aabb.is_valid().then_some(aabb)
    }

    /// Returns a copy grown to include `point`.
    #[inline]
    pub fn merged_with_point(&self, point: Vec3) -> Self {
        Self {
            min: self.min.min(point),
            max: self.max.max(point),
        }
    }

    /// The center point of the box.
    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// The full extent of the box on each axis.
    #[inline]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// `true` if `min <= max` on every axis.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    /// `true` if `point` lies inside the box or on its surface.
    #[inline]
    pub fn contains_point(&self, point: Vec3) -> bool {
        (self.min.x..=self.max.x).contains(&point.x)
            && (self.min.y..=self.max.y).contains(&point.y)
            && (self.min.z..=self.max.z).contains(&point.z)
    }
}

impl Default for Aabb {
    /// Returns [`Aabb::INVALID`].
    #[inline]
    fn default() -> Self {
        Self::INVALID
    }
}

/// A bounding sphere.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sphere {
    /// Center of the sphere.
    pub center: Vec3,
    /// Radius of the sphere.
    pub radius: f32,
}

impl Sphere {
    /// Creates a new sphere.
    #[inline]
    pub const fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Builds the sphere centered on `center` that encloses every point.
    pub fn enclosing<I: IntoIterator<Item = Vec3>>(center: Vec3, points: I) -> Self {
        let max_sq = points
            .into_iter()
            .map(|p| center.distance_squared(p))
            .fold(0.0f32, f32::max);
        Self::new(center, max_sq.sqrt())
    }

    /// Moves the sphere into the space of `matrix`, growing the radius by the
    /// matrix's largest axis scale.
    #[inline]
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        Self::new(
            matrix.transform_point(self.center),
            self.radius * matrix.max_scale_on_axis(),
        )
    }
}

/// A plane `normal . p + constant = 0`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    /// Unit normal pointing into the half-space considered "inside".
    pub normal: Vec3,
    /// Signed offset along the normal.
    pub constant: f32,
}

impl Plane {
    /// Creates a plane from raw `(a, b, c, d)` coefficients and normalizes it so
    /// that [`Plane::distance_to_point`] is metric. A zero normal is kept as is.
    pub fn from_coefficients(v: Vec4) -> Self {
        let normal = v.truncate();
        let len = normal.length();
        if len > 0.0 {
            Self {
                normal: normal / len,
                constant: v.w / len,
            }
        } else {
            Self {
                normal,
                constant: v.w,
            }
        }
    }

    /// Signed distance from the plane, positive on the side the normal points to.
    #[inline]
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.constant
    }
}

/// The six planes bounding a camera's visible volume, normals pointing inward.
///
/// Plane order: left, right, bottom, top, near, far.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frustum {
    /// The bounding planes.
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Extracts the planes from a combined projection-view matrix by summing and
    /// subtracting its rows (Gribb-Hartmann).
    pub fn from_matrix(m: &Mat4) -> Self {
        let r0 = m.get_row(0);
        let r1 = m.get_row(1);
        let r2 = m.get_row(2);
        let r3 = m.get_row(3);

        Self {
            planes: [
                Plane::from_coefficients(r3 + r0),
                Plane::from_coefficients(r3 - r0),
                Plane::from_coefficients(r3 + r1),
                Plane::from_coefficients(r3 - r1),
                Plane::from_coefficients(r3 + r2),
                Plane::from_coefficients(r3 - r2),
            ],
        }
    }

    /// `false` only if the sphere lies entirely behind one of the planes.
    ///
    /// A sphere exactly touching a plane from outside (`distance == -radius`)
    /// still counts as intersecting.
    pub fn intersects_sphere(&self, sphere: &Sphere) -> bool {
        self.planes
            .iter()
            .all(|p| p.distance_to_point(sphere.center) >= -sphere.radius)
    }

    /// `true` if the point is inside or on every plane.
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.intersects_sphere(&Sphere::new(point, 0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::FRAC_PI_2;
    use approx::assert_relative_eq;

    fn test_frustum() -> Frustum {
        // Camera at the origin looking down -Z.
        Frustum::from_matrix(&Mat4::perspective_rh_gl(FRAC_PI_2, 1.0, 1.0, 100.0))
    }

    #[test]
    fn test_aabb_from_points() {
        let aabb = Aabb::from_points([
            Vec3::new(1.0, -2.0, 0.0),
            Vec3::new(-1.0, 3.0, 2.0),
            Vec3::new(0.0, 0.0, -4.0),
        ])
        .expect("non-empty");
        assert_eq!(aabb.min, Vec3::new(-1.0, -2.0, -4.0));
        assert_eq!(aabb.max, Vec3::new(1.0, 3.0, 2.0));
        assert_eq!(aabb.center(), Vec3::new(0.0, 0.5, -1.0));
        assert!(Aabb::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn test_sphere_enclosing_and_transform() {
        let s = Sphere::enclosing(Vec3::ZERO, [Vec3::X, Vec3::new(0.0, 2.0, 0.0)]);
        assert_relative_eq!(s.radius, 2.0);
        let m = Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0)) * Mat4::from_scale(Vec3::new(1.0, 3.0, 1.0));
        let t = s.transformed(&m);
        assert_eq!(t.center, Vec3::new(5.0, 0.0, 0.0));
        assert_relative_eq!(t.radius, 6.0);
    }

    #[test]
    fn test_planes_are_normalized() {
        for plane in test_frustum().planes {
            assert_relative_eq!(plane.normal.length(), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_near_plane_distance_is_metric() {
        let near = test_frustum().planes[4];
        assert_relative_eq!(near.distance_to_point(Vec3::new(0.0, 0.0, -3.0)), 2.0, epsilon = 1e-4);
    }

    #[test]
    fn test_sphere_inside_and_outside() {
        let f = test_frustum();
        assert!(f.intersects_sphere(&Sphere::new(Vec3::new(0.0, 0.0, -10.0), 1.0)));
        assert!(!f.intersects_sphere(&Sphere::new(Vec3::new(0.0, 0.0, 10.0), 1.0)));
        assert!(!f.intersects_sphere(&Sphere::new(Vec3::new(0.0, 0.0, -200.0), 1.0)));
        assert!(!f.intersects_sphere(&Sphere::new(Vec3::new(50.0, 0.0, -10.0), 1.0)));
    }

    #[test]
    fn test_sphere_touching_plane_is_kept() {
        // Near plane at z = -1 with exactly representable coefficients.
        let f = Frustum::from_matrix(&Mat4::orthographic_rh_gl(-1.0, 1.0, -1.0, 1.0, 1.0, 3.0));
        assert_eq!(f.planes[4].distance_to_point(Vec3::ZERO), -1.0);
        assert!(f.intersects_sphere(&Sphere::new(Vec3::ZERO, 1.0)));
        assert!(!f.intersects_sphere(&Sphere::new(Vec3::new(0.0, 0.0, 0.5), 1.0)));
    }
}
