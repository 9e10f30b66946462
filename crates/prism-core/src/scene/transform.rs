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

//! The local/world transform carried by every scene node.

use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

use super::Rotation;
use crate::math::{Mat3, Mat4, Quaternion, Vec3};

static NEXT_TRANSFORM_ID: AtomicU64 = AtomicU64::new(0);

/// Position, rotation and scale of a node relative to its parent, plus the
/// cached local and world matrices derived from them.
///
/// The world matrix is only valid after
/// [`SceneGraph::update_matrix_world`](super::SceneGraph::update_matrix_world)
/// has run from the node's root.
#[derive(Debug)]
pub struct Transform {
    /// Translation relative to the parent.
    pub position: Vec3,
    /// Orientation relative to the parent.
    pub rotation: Rotation,
    /// Scale relative to the parent.
    pub scale: Vec3,
    /// Up direction used by [`Transform::look_at`].
    pub up: Vec3,
    /// Local matrix, composed from position, rotation and scale.
    pub matrix: Mat4,
    /// Accumulated parent-world * local matrix.
    pub world_matrix: Mat4,
    /// When set, the local matrix is recomposed on every world update.
    pub matrix_auto_update: bool,
    /// Set when the local matrix changed and the world matrix is stale.
    pub world_matrix_needs_update: bool,
    /// Invisible nodes are skipped together with their descendants.
    pub visible: bool,
    id: u64,
    uuid: Uuid,
}

impl Transform {
    /// Creates an identity transform with a fresh id.
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Rotation::identity(),
            scale: Vec3::ONE,
            up: Vec3::Y,
            matrix: Mat4::IDENTITY,
            world_matrix: Mat4::IDENTITY,
            matrix_auto_update: true,
            world_matrix_needs_update: false,
            visible: true,
            id: NEXT_TRANSFORM_ID.fetch_add(1, Ordering::Relaxed),
            uuid: Uuid::new_v4(),
        }
    }

    /// Creates a transform placed at `position`.
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::new()
        }
    }

    /// Process-unique, monotonically increasing identifier. Later transforms have
    /// larger ids.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Globally unique identifier.
    #[inline]
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Shorthand for `self.rotation.quaternion()`.
    #[inline]
    pub fn quaternion(&self) -> Quaternion {
        self.rotation.quaternion()
    }

    /// Recomposes the local matrix and marks the world matrix stale.
    pub fn update_matrix(&mut self) {
        self.matrix = Mat4::from_scale_rotation_translation(
            self.scale,
            self.rotation.quaternion(),
            self.position,
        );
        self.world_matrix_needs_update = true;
    }

    /// Recomputes the world matrix from the parent's, or copies the local matrix
    /// for a root, and clears the dirty flag.
    pub fn compute_world_matrix(&mut self, parent_world: Option<&Mat4>) {
        self.world_matrix = match parent_world {
            Some(parent) => *parent * self.matrix,
            None => self.matrix,
        };
        self.world_matrix_needs_update = false;
    }

    /// Replaces the local matrix and pulls position, rotation and scale out of it.
    pub fn apply_matrix(&mut self, matrix: Mat4) {
        self.matrix = matrix;
        self.decompose();
        self.world_matrix_needs_update = true;
    }

    /// Derives position, rotation and scale from the local matrix.
    ///
    /// Negative scale is not recovered: it is folded into the rotation.
    pub fn decompose(&mut self) {
        let (scale, rotation, position) = self.matrix.to_scale_rotation_translation();
        self.position = position;
        self.scale = scale;
        self.rotation.set_quaternion(rotation);
    }

    /// Orients the transform towards `target`.
    ///
    /// Without `invert` the local +Z axis faces the target, which suits meshes.
    /// With `invert` the local -Z axis faces it, which is how cameras look.
    /// Looking at the current position leaves the rotation unchanged.
    pub fn look_at(&mut self, target: Vec3, invert: bool) {
        if target == self.position {
            return;
        }
        let m = if invert {
            Mat4::target_to(self.position, target, self.up)
        } else {
            Mat4::target_to(target, self.position, self.up)
        };
        self.rotation
            .set_quaternion(Quaternion::from_rotation_matrix(&Mat3::from_mat4(&m)));
    }

    /// World-space position, read from the world matrix.
    #[inline]
    pub fn world_position(&self) -> Vec3 {
        self.world_matrix.get_translation()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}
