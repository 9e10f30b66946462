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

//! The simulated context state and object tables of the headless backend.

use std::collections::{BTreeMap, HashMap, HashSet};

use prism_core::math::Color;
use prism_core::renderer::{
    Attachment, BlendEquation, BlendFactor, BufferHandle, Capability, CompareFunction, DataType,
    DrawMode, Face, FramebufferHandle, FrontFace, GlslType, InternalFormat, ProgramHandle,
    RenderbufferFormat, RenderbufferHandle, ShaderStage, TexImageTarget, TextureFilter,
    TextureHandle, TextureTarget, TextureWrap, UniformLocation, VertexArrayHandle,
    VertexAttribPointer,
};

use super::reflection::{ProgramInterface, StageReflection};

/// The global state of the simulated context, initialised to GL defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct GlState {
    /// Enabled capabilities.
    pub enabled: HashSet<Capability>,
    /// `(src_rgb, dst_rgb, src_alpha, dst_alpha)`.
    pub blend_func: (BlendFactor, BlendFactor, BlendFactor, BlendFactor),
    /// `(rgb, alpha)`.
    pub blend_equation: (BlendEquation, BlendEquation),
    /// The culled face.
    pub cull_face: Face,
    /// The front-face winding.
    pub front_face: FrontFace,
    /// Depth writes.
    pub depth_mask: bool,
    /// Depth comparison.
    pub depth_func: CompareFunction,
    /// `(x, y, width, height)`.
    pub viewport: (i32, i32, u32, u32),
    /// The clear color.
    pub clear_color: Color,
    /// The active texture unit.
    pub active_texture: u32,
    /// Textures bound per `(unit, target)`.
    pub texture_bindings: HashMap<(u32, TextureTarget), TextureHandle>,
    /// The bound framebuffer, `None` for the default surface.
    pub framebuffer: Option<FramebufferHandle>,
    /// The bound renderbuffer.
    pub renderbuffer: Option<RenderbufferHandle>,
    /// The bound array buffer.
    pub array_buffer: Option<BufferHandle>,
    /// The current program.
    pub program: Option<ProgramHandle>,
    /// The bound vertex array, `None` for the default one.
    pub vertex_array: Option<VertexArrayHandle>,
    /// `UNPACK_FLIP_Y_WEBGL`.
    pub unpack_flip_y: bool,
    /// `UNPACK_PREMULTIPLY_ALPHA_WEBGL`.
    pub unpack_premultiply_alpha: bool,
    /// `UNPACK_ALIGNMENT`.
    pub unpack_alignment: u32,
}

impl GlState {
    /// The state of a fresh context with a `width` x `height` surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            enabled: HashSet::new(),
            blend_func: (
                BlendFactor::One,
                BlendFactor::Zero,
                BlendFactor::One,
                BlendFactor::Zero,
            ),
            blend_equation: (BlendEquation::Add, BlendEquation::Add),
            cull_face: Face::Back,
            front_face: FrontFace::Ccw,
            depth_mask: true,
            depth_func: CompareFunction::Less,
            viewport: (0, 0, width, height),
            clear_color: Color::TRANSPARENT,
            active_texture: 0,
            texture_bindings: HashMap::new(),
            framebuffer: None,
            renderbuffer: None,
            array_buffer: None,
            program: None,
            vertex_array: None,
            unpack_flip_y: false,
            unpack_premultiply_alpha: false,
            unpack_alignment: 4,
        }
    }

    /// `true` if `capability` is enabled.
    pub fn is_enabled(&self, capability: Capability) -> bool {
        self.enabled.contains(&capability)
    }

    /// The texture bound to `target` on `unit`.
    pub fn bound_texture(&self, unit: u32, target: TextureTarget) -> Option<TextureHandle> {
        self.texture_bindings.get(&(unit, target)).copied()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ShaderObject {
    pub stage: ShaderStage,
    pub reflection: StageReflection,
}

/// A value last uploaded to a uniform.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformRecord {
    /// Float components.
    Floats(Vec<f32>),
    /// Integer components.
    Ints(Vec<i32>),
}

#[derive(Debug, Clone)]
pub(crate) struct ProgramObject {
    pub interface: ProgramInterface,
    pub values: HashMap<UniformLocation, (GlslType, UniformRecord)>,
}

/// Per-location state of a vertex array.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeBinding {
    /// Fetching is enabled.
    pub enabled: bool,
    /// The array buffer captured by `vertexAttribPointer`.
    pub buffer: Option<BufferHandle>,
    /// The layout given to `vertexAttribPointer`.
    pub pointer: Option<VertexAttribPointer>,
    /// The instancing divisor.
    pub divisor: u32,
}

/// The state captured by a vertex array object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexArrayState {
    /// Attribute bindings by location.
    pub attributes: BTreeMap<u32, AttributeBinding>,
    /// The bound element buffer.
    pub element_buffer: Option<BufferHandle>,
}

/// Size and format of one texture image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageInfo {
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// Storage format.
    pub internal_format: InternalFormat,
    /// Component type of the upload.
    pub data_type: DataType,
    /// `true` if pixels were supplied.
    pub has_data: bool,
    /// Flip-Y was active during the upload.
    pub flipped: bool,
}

/// A simulated texture object.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureObject {
    /// Set on first bind.
    pub target: Option<TextureTarget>,
    /// Images by `(slot, level)`.
    pub images: HashMap<(TexImageTarget, u32), ImageInfo>,
    /// Minification filter.
    pub min_filter: TextureFilter,
    /// Magnification filter.
    pub mag_filter: TextureFilter,
    /// Wrap along S.
    pub wrap_s: TextureWrap,
    /// Wrap along T.
    pub wrap_t: TextureWrap,
    /// Anisotropy level.
    pub anisotropy: f32,
    /// Number of `generateMipmap` calls.
    pub mipmap_generations: u32,
}

impl Default for TextureObject {
    fn default() -> Self {
        Self {
            target: None,
            images: HashMap::new(),
            min_filter: TextureFilter::NearestMipmapLinear,
            mag_filter: TextureFilter::Linear,
            wrap_s: TextureWrap::Repeat,
            wrap_t: TextureWrap::Repeat,
            anisotropy: 1.0,
            mipmap_generations: 0,
        }
    }
}

/// What a framebuffer attachment point refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentSource {
    /// A texture image.
    Texture {
        /// The texture.
        texture: TextureHandle,
        /// The image slot.
        target: TexImageTarget,
        /// The mip level.
        level: u32,
    },
    /// A renderbuffer.
    Renderbuffer(RenderbufferHandle),
}

/// A simulated framebuffer object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FramebufferObject {
    /// Attachments by attachment point.
    pub attachments: HashMap<Attachment, AttachmentSource>,
    /// The active draw buffers.
    pub draw_buffers: Vec<Attachment>,
}

/// A simulated renderbuffer object.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RenderbufferObject {
    /// `(format, width, height)` once storage is allocated.
    pub storage: Option<(RenderbufferFormat, u32, u32)>,
}

/// One recorded draw call.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    /// The primitive mode.
    pub mode: DrawMode,
    /// First vertex, or byte offset into the index buffer.
    pub first: u32,
    /// Vertex or index count.
    pub count: u32,
    /// Instance count, 1 for non-instanced draws.
    pub instances: u32,
    /// The index type of indexed draws.
    pub index_type: Option<DataType>,
    /// The program current at the time of the draw.
    pub program: Option<ProgramHandle>,
    /// The vertex array bound at the time of the draw.
    pub vertex_array: Option<VertexArrayHandle>,
    /// The framebuffer bound at the time of the draw.
    pub framebuffer: Option<FramebufferHandle>,
    /// The front-face winding at the time of the draw.
    pub front_face: FrontFace,
}
