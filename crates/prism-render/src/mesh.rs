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

//! The drawable payload of a scene node.

use crate::program::{UniformValue, Uniforms};
use crate::resources::{GeometryId, ProgramId};
use prism_core::renderer::DrawMode;

/// A geometry drawn with a program.
///
/// Stored as the payload of a [`SceneGraph`](prism_core::SceneGraph) node,
/// which supplies its world matrix and visibility.
#[derive(Debug, Clone)]
pub struct Mesh {
    /// Vertex data.
    pub geometry: GeometryId,
    /// Shader and render state.
    pub program: ProgramId,
    /// Primitive type.
    pub mode: DrawMode,
    /// Draw order override. Lower values draw first; non-zero values disable depth sorting.
    pub render_order: i32,
    /// Test this mesh against the camera frustum. `false` always draws it.
    pub frustum_culled: bool,
    /// Per-mesh uniform values, searched before the program's own.
    pub uniforms: Uniforms,
}

impl Mesh {
    /// A triangle mesh with default ordering.
    pub fn new(geometry: GeometryId, program: ProgramId) -> Self {
        Self {
            geometry,
            program,
            mode: DrawMode::Triangles,
            render_order: 0,
            frustum_culled: true,
            uniforms: Uniforms::new(),
        }
    }

    /// Sets the primitive type.
    pub fn with_mode(mut self, mode: DrawMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the draw order override.
    pub fn with_render_order(mut self, render_order: i32) -> Self {
        self.render_order = render_order;
        self
    }

    /// Adds a per-mesh uniform value.
    pub fn with_uniform(mut self, name: impl Into<String>, value: impl Into<UniformValue>) -> Self {
        self.uniforms.insert(name.into(), value.into());
        self
    }
}
