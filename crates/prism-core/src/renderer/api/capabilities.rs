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

use serde::{Deserialize, Serialize};

/// Optional features and limits reported by a graphics context.
///
/// Resources consult these to pick a fallback instead of failing when a
/// feature is missing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContextCapabilities {
    /// The context implements the WebGL 2 / GLES 3 feature set.
    pub webgl2: bool,
    /// Vertex array objects are available.
    pub vertex_array_objects: bool,
    /// Instanced draws and attribute divisors are available.
    pub instanced_arrays: bool,
    /// Mipmaps and repeat wrapping work on non-power-of-two textures.
    pub npot_mipmaps: bool,
    /// Depth textures can be rendered to.
    pub depth_textures: bool,
    /// Float textures can be sampled.
    pub float_textures: bool,
    /// The maximum anisotropy level, if anisotropic filtering is supported.
    pub max_anisotropy: Option<f32>,
    /// Number of combined texture image units.
    pub max_texture_units: u32,
    /// Largest texture dimension.
    pub max_texture_size: u32,
    /// Number of color attachments a framebuffer may draw to.
    pub max_draw_buffers: u32,
}

impl ContextCapabilities {
    /// A WebGL 1 context without extensions.
    pub const fn webgl1() -> Self {
        Self {
            webgl2: false,
            vertex_array_objects: false,
            instanced_arrays: false,
            npot_mipmaps: false,
            depth_textures: false,
            float_textures: false,
            max_anisotropy: None,
            max_texture_units: 8,
            max_texture_size: 4096,
            max_draw_buffers: 1,
        }
    }

    /// A WebGL 2 / GLES 3 context.
    pub const fn webgl2() -> Self {
        Self {
            webgl2: true,
            vertex_array_objects: true,
            instanced_arrays: true,
            npot_mipmaps: true,
            depth_textures: true,
            float_textures: true,
            max_anisotropy: Some(16.0),
            max_texture_units: 16,
            max_texture_size: 8192,
            max_draw_buffers: 8,
        }
    }
}

impl Default for ContextCapabilities {
    fn default() -> Self {
        Self::webgl2()
    }
}
