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

//! Perspective and orthographic cameras.

use serde::{Deserialize, Serialize};

use super::{NodeId, Transform};
use crate::math::{Aabb, Frustum, Mat4, Sphere, Vec3};

/// How a [`Camera`] projects view space onto clip space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Projection {
    /// Perspective projection.
    Perspective {
        /// Vertical field of view in radians.
        fov_y_radians: f32,
        /// Viewport width divided by height.
        aspect: f32,
    },
    /// Orthographic projection. The box edges are divided by `zoom`.
    Orthographic {
        /// Left edge of the view volume.
        left: f32,
        /// Right edge of the view volume.
        right: f32,
        /// Bottom edge of the view volume.
        bottom: f32,
        /// Top edge of the view volume.
        top: f32,
        /// Magnification factor.
        zoom: f32,
    },
}

/// A viewpoint into the scene.
///
/// The camera carries its own [`Transform`]. When `parent` names a scene node,
/// the renderer composes the camera's world matrix with that node's before
/// rendering; otherwise the camera is positioned in world space directly.
///
/// The camera is not itself a node of the [`SceneGraph`](super::SceneGraph),
/// so nothing can be parented under it. Content that must follow the view
/// (a HUD, a held tool) hangs off a shared pivot node instead: attach the
/// camera to the pivot through `parent` and insert the content as the
/// pivot's children.
#[derive(Debug)]
pub struct Camera {
    /// Position and orientation. The camera looks down its local -Z axis.
    pub transform: Transform,
    /// Optional node the camera is attached to.
    pub parent: Option<NodeId>,
    /// Projection parameters.
    pub projection: Projection,
    /// Distance to the near clipping plane.
    pub near: f32,
    /// Distance to the far clipping plane.
    pub far: f32,
    /// View to clip space.
    pub projection_matrix: Mat4,
    /// World to view space: the inverse of the world matrix.
    pub view_matrix: Mat4,
    /// `projection_matrix * view_matrix`.
    pub projection_view_matrix: Mat4,
    /// Planes of the view volume in world space, refreshed by [`Camera::update_frustum`].
    pub frustum: Frustum,
}

impl Camera {
    /// Creates a perspective camera. `fov_y_degrees` is in degrees.
    pub fn perspective(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self::with_projection(
            Projection::Perspective {
                fov_y_radians: fov_y_degrees.to_radians(),
                aspect,
            },
            near,
            far,
        )
    }

    /// Creates an orthographic camera.
    pub fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Self {
        Self::with_projection(
            Projection::Orthographic {
                left,
                right,
                bottom,
                top,
                zoom: 1.0,
            },
            near,
            far,
        )
    }

    /// Creates a camera from explicit projection parameters.
    pub fn with_projection(projection: Projection, near: f32, far: f32) -> Self {
        let mut camera = Self {
            transform: Transform::new(),
            parent: None,
            projection,
            near,
            far,
            projection_matrix: Mat4::IDENTITY,
            view_matrix: Mat4::IDENTITY,
            projection_view_matrix: Mat4::IDENTITY,
            frustum: Frustum::default(),
        };
        camera.update_projection_matrix();
        camera
    }

    /// Recomputes the projection matrix from the projection parameters.
    /// Call this after editing `projection`, `near` or `far`.
    pub fn update_projection_matrix(&mut self) {
        self.projection_matrix = match self.projection {
            Projection::Perspective {
                fov_y_radians,
                aspect,
            } => Mat4::perspective_rh_gl(fov_y_radians, aspect, self.near, self.far),
            Projection::Orthographic {
                left,
                right,
                bottom,
                top,
                zoom,
            } => Mat4::orthographic_rh_gl(
                left / zoom,
                right / zoom,
                bottom / zoom,
                top / zoom,
                self.near,
                self.far,
            ),
        };
    }

    /// Updates the perspective aspect ratio. Has no effect on orthographic cameras.
    pub fn set_aspect(&mut self, new_aspect: f32) {
        if let Projection::Perspective { aspect, .. } = &mut self.projection {
            *aspect = new_aspect;
            self.update_projection_matrix();
        }
    }

    /// Refreshes the world, view and projection-view matrices.
    ///
    /// `parent_world` is the world matrix of the node named by `parent`, if any.
    pub fn update_matrix_world(&mut self, parent_world: Option<&Mat4>) {
        if self.transform.matrix_auto_update {
            self.transform.update_matrix();
        }
        self.transform.compute_world_matrix(parent_world);
        // A singular world matrix keeps the previous view.
        if let Some(view) = self.transform.world_matrix.inverse() {
            self.view_matrix = view;
        }
        self.projection_view_matrix = self.projection_matrix * self.view_matrix;
    }

    /// Turns the camera so its -Z axis faces `target`.
    pub fn look_at(&mut self, target: Vec3) {
        self.transform.look_at(target, true);
    }

    /// World-space camera position.
    pub fn world_position(&self) -> Vec3 {
        self.transform.world_position()
    }

    /// Maps a world-space point to normalized device coordinates.
    pub fn project(&self, world: Vec3) -> Vec3 {
        self.projection_view_matrix.transform_point(world)
    }

    /// Maps a point in normalized device coordinates back to world space.
    ///
    /// Returns the input unchanged if the projection is singular.
    pub fn unproject(&self, ndc: Vec3) -> Vec3 {
        match self.projection_matrix.inverse() {
            Some(inv_projection) => self
                .transform
                .world_matrix
                .transform_point(inv_projection.transform_point(ndc)),
            None => ndc,
        }
    }

    /// Re-extracts the six frustum planes from `projection_view_matrix`.
    pub fn update_frustum(&mut self) {
        self.frustum = Frustum::from_matrix(&self.projection_view_matrix);
    }

    /// Tests a local-space bounding sphere placed by `world` against the frustum.
    ///
    /// The sphere's center is moved by `world` and its radius grown by the largest
    /// axis scale of `world`. Boundary contact counts as visible.
    pub fn frustum_intersects_sphere(&self, local: &Sphere, world: &Mat4) -> bool {
        self.frustum.intersects_sphere(&local.transformed(world))
    }

    /// Tests a local-space bounding box placed by `world` against the frustum.
    ///
    /// The box is approximated by the sphere through its corners. Invalid boxes
    /// are never culled.
    pub fn frustum_intersects_bounds(&self, bounds: &Aabb, world: &Mat4) -> bool {
        if !bounds.is_valid() {
            return true;
        }
        let sphere = Sphere::new(bounds.center(), bounds.size().length() * 0.5);
        self.frustum_intersects_sphere(&sphere, world)
    }
}

impl Default for Camera {
    /// A 45 degree perspective camera with a square aspect, near 0.1 and far 100.
    fn default() -> Self {
        Self::perspective(45.0, 1.0, 0.1, 100.0)
    }
}
