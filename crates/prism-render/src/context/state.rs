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

use prism_core::math::Color;
use prism_core::renderer::{
    BlendEquation, BlendFactor, BufferHandle, Capability, CompareFunction, Face,
    FramebufferHandle, FrontFace, ProgramHandle, TextureHandle, TextureTarget, VertexArrayHandle,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Source and destination factors for color and alpha blending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlendFunc {
    /// Source color factor.
    pub src: BlendFactor,
    /// Destination color factor.
    pub dst: BlendFactor,
    /// Source alpha factor.
    pub src_alpha: BlendFactor,
    /// Destination alpha factor.
    pub dst_alpha: BlendFactor,
}

impl BlendFunc {
    /// Uses the same factors for color and alpha.
    pub const fn new(src: BlendFactor, dst: BlendFactor) -> Self {
        Self {
            src,
            dst,
            src_alpha: src,
            dst_alpha: dst,
        }
    }

    /// Separate factors for color and alpha.
    pub const fn separate(
        src: BlendFactor,
        dst: BlendFactor,
        src_alpha: BlendFactor,
        dst_alpha: BlendFactor,
    ) -> Self {
        Self {
            src,
            dst,
            src_alpha,
            dst_alpha,
        }
    }
}

impl Default for BlendFunc {
    fn default() -> Self {
        Self::new(BlendFactor::One, BlendFactor::Zero)
    }
}

/// Color and alpha blend equations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlendEquationState {
    /// Equation for the color channels.
    pub rgb: BlendEquation,
    /// Equation for the alpha channel.
    pub alpha: BlendEquation,
}

impl BlendEquationState {
    /// Uses `equation` for both color and alpha.
    pub const fn new(equation: BlendEquation) -> Self {
        Self {
            rgb: equation,
            alpha: equation,
        }
    }
}

impl Default for BlendEquationState {
    fn default() -> Self {
        Self::new(BlendEquation::Add)
    }
}

/// Shadow copy of the global context state, initialised to the GL defaults.
///
/// Every setter on [`super::RenderContext`] compares against this copy before
/// touching the backend. It is only correct as long as nothing else mutates
/// the context behind the renderer's back.
#[derive(Debug, Clone, PartialEq)]
pub struct StateCache {
    /// Enabled capabilities.
    pub enabled: HashSet<Capability>,
    /// Current blend factors.
    pub blend_func: BlendFunc,
    /// Current blend equations.
    pub blend_equation: BlendEquationState,
    /// Culled face.
    pub cull_face: Face,
    /// Winding treated as front-facing.
    pub front_face: FrontFace,
    /// Depth write mask.
    pub depth_mask: bool,
    /// Depth comparison.
    pub depth_func: CompareFunction,
    /// `None` until the first viewport is set.
    pub viewport: Option<(i32, i32, u32, u32)>,
    /// `None` until the first clear color is set.
    pub clear_color: Option<Color>,
    /// Active texture unit.
    pub active_texture_unit: u32,
    /// Textures bound per `(unit, target)`.
    pub texture_units: HashMap<(u32, TextureTarget), TextureHandle>,
    /// Bound framebuffer, `None` for the default surface.
    pub framebuffer: Option<FramebufferHandle>,
    /// Bound `ARRAY_BUFFER`.
    pub array_buffer: Option<BufferHandle>,
    /// Current program.
    pub program: Option<ProgramHandle>,
    /// Bound vertex array.
    pub vertex_array: Option<VertexArrayHandle>,
    /// `UNPACK_FLIP_Y_WEBGL`.
    pub flip_y: bool,
    /// `UNPACK_PREMULTIPLY_ALPHA_WEBGL`.
    pub premultiply_alpha: bool,
    /// `UNPACK_ALIGNMENT`.
    pub unpack_alignment: u32,
}

impl Default for StateCache {
    fn default() -> Self {
        Self {
            enabled: HashSet::new(),
            blend_func: BlendFunc::default(),
            blend_equation: BlendEquationState::default(),
            cull_face: Face::Back,
            front_face: FrontFace::Ccw,
            depth_mask: true,
            depth_func: CompareFunction::Less,
            viewport: None,
            clear_color: None,
            active_texture_unit: 0,
            texture_units: HashMap::new(),
            framebuffer: None,
            array_buffer: None,
            program: None,
            vertex_array: None,
            flip_y: false,
            premultiply_alpha: false,
            unpack_alignment: 4,
        }
    }
}

impl StateCache {
    /// `true` if `capability` is enabled.
    pub fn is_enabled(&self, capability: Capability) -> bool {
        self.enabled.contains(&capability)
    }

    /// Texture bound to `target` on `unit`.
    pub fn bound_texture(&self, unit: u32, target: TextureTarget) -> Option<TextureHandle> {
        self.texture_units.get(&(unit, target)).copied()
    }
}
