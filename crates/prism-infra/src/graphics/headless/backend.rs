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

use std::any::Any;
use std::collections::HashMap;

use prism_core::math::Color;
use prism_core::renderer::{
    Attachment, BlendEquation, BlendFactor, BufferHandle, BufferTarget, BufferUsage, Capability,
    ClearFlags, CompareFunction, ContextCapabilities, DataType, DrawMode, Face,
    FramebufferHandle, FramebufferStatus, FrontFace, GlslType, GraphicsBackend, InternalFormat,
    PixelStore, ProgramHandle, RenderbufferFormat, RenderbufferHandle, ResourceError,
    ShaderError, ShaderHandle, ShaderStage, TexImage, TexImageTarget, TextureHandle,
    TextureParameter, TextureTarget, UniformData, UniformLocation, VertexArrayHandle,
    VertexAttribPointer, ActiveAttribute, ActiveUniform,
};

use super::reflection::{link_interface, reflect_stage};
use super::state::{
    AttachmentSource, DrawCall, FramebufferObject, GlState, ImageInfo, ProgramObject,
    RenderbufferObject, ShaderObject, TextureObject, UniformRecord, VertexArrayState,
};

/// An in-memory GL context.
///
/// `HeadlessBackend` keeps the full state a WebGL 2 context would hold and
/// records every call made to it, so rendering code can run without a GPU and
/// tests can compare what was requested against what the context ends up in.
///
/// Shaders are "compiled" by a small GLSL front end that recovers the active
/// uniforms and attributes a driver would report.
#[derive(Debug)]
pub struct HeadlessBackend {
    capabilities: ContextCapabilities,
    state: GlState,
    calls: HashMap<&'static str, usize>,
    draws: Vec<DrawCall>,
    next_handle: u32,
    next_uniform_location: u32,
    shaders: HashMap<ShaderHandle, ShaderObject>,
    programs: HashMap<ProgramHandle, ProgramObject>,
    buffers: HashMap<BufferHandle, Vec<u8>>,
    default_vertex_array: VertexArrayState,
    vertex_arrays: HashMap<VertexArrayHandle, VertexArrayState>,
    textures: HashMap<TextureHandle, TextureObject>,
    framebuffers: HashMap<FramebufferHandle, FramebufferObject>,
    renderbuffers: HashMap<RenderbufferHandle, RenderbufferObject>,
    clears: Vec<(Option<FramebufferHandle>, ClearFlags, Color)>,
}

impl HeadlessBackend {
    /// Creates a WebGL 2 class context with a `width` x `height` default surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_capabilities(width, height, ContextCapabilities::webgl2())
    }

    /// Creates a context reporting the given capabilities.
    pub fn with_capabilities(width: u32, height: u32, capabilities: ContextCapabilities) -> Self {
        log::debug!("HeadlessBackend: created {width}x{height} context ({capabilities:?})");
        Self {
            capabilities,
            state: GlState::new(width, height),
            calls: HashMap::new(),
            draws: Vec::new(),
            next_handle: 1,
            next_uniform_location: 0,
            shaders: HashMap::new(),
            programs: HashMap::new(),
            buffers: HashMap::new(),
            default_vertex_array: VertexArrayState::default(),
            vertex_arrays: HashMap::new(),
            textures: HashMap::new(),
            framebuffers: HashMap::new(),
            renderbuffers: HashMap::new(),
            clears: Vec::new(),
        }
    }

    // --- Inspection ---

    /// The current simulated context state.
    pub fn state(&self) -> &GlState {
        &self.state
    }

    /// How many times the entry point `name` (e.g. `"blend_func_separate"`) was called.
    pub fn calls(&self, name: &str) -> usize {
        self.calls.get(name).copied().unwrap_or(0)
    }

    /// Total number of calls across all entry points.
    pub fn total_calls(&self) -> usize {
        self.calls.values().sum()
    }

    /// Forgets the call counters, the draw log and the clear log.
    pub fn reset_counters(&mut self) {
        self.calls.clear();
        self.draws.clear();
        self.clears.clear();
    }

    /// Every draw call since the last reset, in submission order.
    pub fn draws(&self) -> &[DrawCall] {
        &self.draws
    }

    /// Every clear since the last reset, as `(framebuffer, flags, color)`.
    pub fn clears(&self) -> &[(Option<FramebufferHandle>, ClearFlags, Color)] {
        &self.clears
    }

    /// The value last uploaded to `location` of `program`.
    pub fn uniform_value(
        &self,
        program: ProgramHandle,
        location: UniformLocation,
    ) -> Option<&UniformRecord> {
        self.programs
            .get(&program)
            .and_then(|p| p.values.get(&location))
            .map(|(_, value)| value)
    }

    /// The contents of a buffer.
    pub fn buffer_contents(&self, buffer: BufferHandle) -> Option<&[u8]> {
        self.buffers.get(&buffer).map(Vec::as_slice)
    }

    /// Number of live buffer objects.
    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Number of live programs.
    pub fn program_count(&self) -> usize {
        self.programs.len()
    }

    /// Number of live vertex array objects.
    pub fn vertex_array_count(&self) -> usize {
        self.vertex_arrays.len()
    }

    /// The state captured by a vertex array, or the default one with `None`.
    pub fn vertex_array(&self, vao: Option<VertexArrayHandle>) -> Option<&VertexArrayState> {
        match vao {
            Some(handle) => self.vertex_arrays.get(&handle),
            None => Some(&self.default_vertex_array),
        }
    }

    /// A texture object.
    pub fn texture(&self, texture: TextureHandle) -> Option<&TextureObject> {
        self.textures.get(&texture)
    }

    /// Number of live textures.
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// A framebuffer object.
    pub fn framebuffer(&self, framebuffer: FramebufferHandle) -> Option<&FramebufferObject> {
        self.framebuffers.get(&framebuffer)
    }

    /// A renderbuffer object.
    pub fn renderbuffer(&self, renderbuffer: RenderbufferHandle) -> Option<&RenderbufferObject> {
        self.renderbuffers.get(&renderbuffer)
    }

    // --- Internals ---

    fn record(&mut self, name: &'static str) {
        *self.calls.entry(name).or_insert(0) += 1;
    }

    fn allocate(&mut self) -> u32 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    fn current_vertex_array(&mut self) -> &mut VertexArrayState {
        match self.state.vertex_array {
            Some(handle) => self
                .vertex_arrays
                .get_mut(&handle)
                .unwrap_or(&mut self.default_vertex_array),
            None => &mut self.default_vertex_array,
        }
    }

    fn bound_texture_mut(&mut self, target: TextureTarget) -> Option<&mut TextureObject> {
        let handle = self.state.bound_texture(self.state.active_texture, target)?;
        self.textures.get_mut(&handle)
    }

    fn record_draw(&mut self, mode: DrawMode, first: u32, count: u32, instances: u32, index_type: Option<DataType>) {
        if self.state.program.is_none() {
            log::warn!("HeadlessBackend: draw call without a current program");
        }
        if index_type.is_some() && self.current_vertex_array().element_buffer.is_none() {
            log::warn!("HeadlessBackend: indexed draw without an element buffer");
        }
        self.draws.push(DrawCall {
            mode,
            first,
            count,
            instances,
            index_type,
            program: self.state.program,
            vertex_array: self.state.vertex_array,
            framebuffer: self.state.framebuffer,
            front_face: self.state.front_face,
        });
    }

    fn attachment_size(&self, source: &AttachmentSource) -> Option<(u32, u32, Option<InternalFormat>)> {
        match source {
            AttachmentSource::Texture {
                texture,
                target,
                level,
            } => self
                .textures
                .get(texture)?
                .images
                .get(&(*target, *level))
                .map(|image| (image.width, image.height, Some(image.internal_format))),
            AttachmentSource::Renderbuffer(handle) => self
                .renderbuffers
                .get(handle)?
                .storage
                .map(|(_, width, height)| (width, height, None)),
        }
    }
}

fn is_depth_format(format: InternalFormat) -> bool {
    matches!(
        format,
        InternalFormat::DepthComponent
            | InternalFormat::DepthComponent16
            | InternalFormat::DepthComponent24
            | InternalFormat::DepthComponent32F
            | InternalFormat::DepthStencil
            | InternalFormat::Depth24Stencil8
    )
}

impl GraphicsBackend for HeadlessBackend {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn capabilities(&self) -> ContextCapabilities {
        self.capabilities
    }

    fn enable(&mut self, capability: Capability) {
        self.record("enable");
        self.state.enabled.insert(capability);
    }

    fn disable(&mut self, capability: Capability) {
        self.record("disable");
        self.state.enabled.remove(&capability);
    }

    fn blend_func_separate(
        &mut self,
        src_rgb: BlendFactor,
        dst_rgb: BlendFactor,
        src_alpha: BlendFactor,
        dst_alpha: BlendFactor,
    ) {
        self.record("blend_func_separate");
        self.state.blend_func = (src_rgb, dst_rgb, src_alpha, dst_alpha);
    }

    fn blend_equation_separate(&mut self, rgb: BlendEquation, alpha: BlendEquation) {
        self.record("blend_equation_separate");
        self.state.blend_equation = (rgb, alpha);
    }

    fn cull_face(&mut self, face: Face) {
        self.record("cull_face");
        self.state.cull_face = face;
    }

    fn front_face(&mut self, front_face: FrontFace) {
        self.record("front_face");
        self.state.front_face = front_face;
    }

    fn depth_mask(&mut self, write: bool) {
        self.record("depth_mask");
        self.state.depth_mask = write;
    }

    fn depth_func(&mut self, func: CompareFunction) {
        self.record("depth_func");
        self.state.depth_func = func;
    }

    fn viewport(&mut self, x: i32, y: i32, width: u32, height: u32) {
        self.record("viewport");
        self.state.viewport = (x, y, width, height);
    }

    fn clear_color(&mut self, color: Color) {
        self.record("clear_color");
        self.state.clear_color = color;
    }

    fn clear(&mut self, flags: ClearFlags) {
        self.record("clear");
        self.clears
            .push((self.state.framebuffer, flags, self.state.clear_color));
    }

    fn active_texture(&mut self, unit: u32) {
        self.record("active_texture");
        if unit >= self.capabilities.max_texture_units {
            log::warn!("HeadlessBackend: texture unit {unit} exceeds the unit count");
        }
        self.state.active_texture = unit;
    }

    fn pixel_store(&mut self, parameter: PixelStore) {
        self.record("pixel_store");
        match parameter {
            PixelStore::FlipY(flip) => self.state.unpack_flip_y = flip,
            PixelStore::PremultiplyAlpha(premultiply) => {
                self.state.unpack_premultiply_alpha = premultiply
            }
            PixelStore::UnpackAlignment(alignment) => self.state.unpack_alignment = alignment,
        }
    }

    fn compile_shader(
        &mut self,
        stage: ShaderStage,
        source: &str,
    ) -> Result<ShaderHandle, ShaderError> {
        self.record("compile_shader");
        let reflection = reflect_stage(stage, source)
            .map_err(|details| ShaderError::CompilationError { stage, details })?;
        let handle = ShaderHandle(self.allocate());
        self.shaders.insert(handle, ShaderObject { stage, reflection });
        Ok(handle)
    }

    fn delete_shader(&mut self, shader: ShaderHandle) {
        self.record("delete_shader");
        self.shaders.remove(&shader);
    }

    fn link_program(
        &mut self,
        vertex: ShaderHandle,
        fragment: ShaderHandle,
    ) -> Result<ProgramHandle, ShaderError> {
        self.record("link_program");
        let (Some(vs), Some(fs)) = (self.shaders.get(&vertex), self.shaders.get(&fragment)) else {
            return Err(ShaderError::LinkError {
                details: "attached shader was deleted or never compiled".to_string(),
            });
        };
        if vs.stage != ShaderStage::Vertex || fs.stage != ShaderStage::Fragment {
            return Err(ShaderError::LinkError {
                details: "a vertex and a fragment shader must be attached".to_string(),
            });
        }
        let interface = link_interface(&vs.reflection, &fs.reflection, self.next_uniform_location);
        self.next_uniform_location += interface
            .uniforms
            .iter()
            .map(|u| u.size)
            .sum::<u32>();
        let handle = ProgramHandle(self.allocate());
        self.programs.insert(
            handle,
            ProgramObject {
                interface,
                values: HashMap::new(),
            },
        );
        Ok(handle)
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        self.record("delete_program");
        self.programs.remove(&program);
        if self.state.program == Some(program) {
            self.state.program = None;
        }
    }

    fn use_program(&mut self, program: Option<ProgramHandle>) {
        self.record("use_program");
        self.state.program = program;
    }

    fn active_uniforms(&self, program: ProgramHandle) -> Vec<ActiveUniform> {
        self.programs
            .get(&program)
            .map(|p| p.interface.uniforms.clone())
            .unwrap_or_default()
    }

    fn active_attributes(&self, program: ProgramHandle) -> Vec<ActiveAttribute> {
        self.programs
            .get(&program)
            .map(|p| p.interface.attributes.clone())
            .unwrap_or_default()
    }

    fn uniform(&mut self, location: UniformLocation, ty: GlslType, data: UniformData<'_>) {
        self.record("uniform");
        let Some(program) = self.state.program.and_then(|p| self.programs.get_mut(&p)) else {
            log::warn!("HeadlessBackend: uniform upload without a current program");
            return;
        };
        let record = match data {
            UniformData::Floats(values) => UniformRecord::Floats(values.to_vec()),
            UniformData::Ints(values) => UniformRecord::Ints(values.to_vec()),
        };
        program.values.insert(location, (ty, record));
    }

    fn create_buffer(&mut self) -> Result<BufferHandle, ResourceError> {
        self.record("create_buffer");
        let handle = BufferHandle(self.allocate());
        self.buffers.insert(handle, Vec::new());
        Ok(handle)
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        self.record("delete_buffer");
        self.buffers.remove(&buffer);
        if self.state.array_buffer == Some(buffer) {
            self.state.array_buffer = None;
        }
        let vao = self.current_vertex_array();
        if vao.element_buffer == Some(buffer) {
            vao.element_buffer = None;
        }
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferHandle>) {
        self.record("bind_buffer");
        match target {
            BufferTarget::Array => self.state.array_buffer = buffer,
            BufferTarget::ElementArray => self.current_vertex_array().element_buffer = buffer,
        }
    }

    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], _usage: BufferUsage) {
        self.record("buffer_data");
        let bound = match target {
            BufferTarget::Array => self.state.array_buffer,
            BufferTarget::ElementArray => self.current_vertex_array().element_buffer,
        };
        match bound.and_then(|b| self.buffers.get_mut(&b)) {
            Some(contents) => *contents = data.to_vec(),
            None => log::warn!("HeadlessBackend: buffer_data with no buffer bound to {target:?}"),
        }
    }

    fn buffer_sub_data(&mut self, target: BufferTarget, offset: u32, data: &[u8]) {
        self.record("buffer_sub_data");
        let bound = match target {
            BufferTarget::Array => self.state.array_buffer,
            BufferTarget::ElementArray => self.current_vertex_array().element_buffer,
        };
        let Some(contents) = bound.and_then(|b| self.buffers.get_mut(&b)) else {
            log::warn!("HeadlessBackend: buffer_sub_data with no buffer bound to {target:?}");
            return;
        };
        let start = offset as usize;
        let end = start + data.len();
        if end > contents.len() {
            log::warn!("HeadlessBackend: buffer_sub_data writes past the end of the buffer");
            return;
        }
        contents[start..end].copy_from_slice(data);
    }

    fn create_vertex_array(&mut self) -> Result<VertexArrayHandle, ResourceError> {
        self.record("create_vertex_array");
        if !self.capabilities.vertex_array_objects {
            return Err(ResourceError::BackendError(
                "vertex array objects are not supported".to_string(),
            ));
        }
        let handle = VertexArrayHandle(self.allocate());
        self.vertex_arrays.insert(handle, VertexArrayState::default());
        Ok(handle)
    }

    fn delete_vertex_array(&mut self, vao: VertexArrayHandle) {
        self.record("delete_vertex_array");
        self.vertex_arrays.remove(&vao);
        if self.state.vertex_array == Some(vao) {
            self.state.vertex_array = None;
        }
    }

    fn bind_vertex_array(&mut self, vao: Option<VertexArrayHandle>) {
        self.record("bind_vertex_array");
        self.state.vertex_array = vao;
    }

    fn enable_vertex_attrib_array(&mut self, location: u32) {
        self.record("enable_vertex_attrib_array");
        self.current_vertex_array()
            .attributes
            .entry(location)
            .or_default()
            .enabled = true;
    }

    fn vertex_attrib_pointer(&mut self, pointer: &VertexAttribPointer) {
        self.record("vertex_attrib_pointer");
        let buffer = self.state.array_buffer;
        if buffer.is_none() {
            log::warn!("HeadlessBackend: vertex_attrib_pointer with no array buffer bound");
        }
        let binding = self
            .current_vertex_array()
            .attributes
            .entry(pointer.location)
            .or_default();
        binding.buffer = buffer;
        binding.pointer = Some(*pointer);
    }

    fn vertex_attrib_divisor(&mut self, location: u32, divisor: u32) {
        self.record("vertex_attrib_divisor");
        self.current_vertex_array()
            .attributes
            .entry(location)
            .or_default()
            .divisor = divisor;
    }

    fn draw_arrays(&mut self, mode: DrawMode, first: u32, count: u32) {
        self.record("draw_arrays");
        self.record_draw(mode, first, count, 1, None);
    }

    fn draw_elements(&mut self, mode: DrawMode, count: u32, index_type: DataType, offset: u32) {
        self.record("draw_elements");
        self.record_draw(mode, offset, count, 1, Some(index_type));
    }

    fn draw_arrays_instanced(&mut self, mode: DrawMode, first: u32, count: u32, instances: u32) {
        self.record("draw_arrays_instanced");
        self.record_draw(mode, first, count, instances, None);
    }

    fn draw_elements_instanced(
        &mut self,
        mode: DrawMode,
        count: u32,
        index_type: DataType,
        offset: u32,
        instances: u32,
    ) {
        self.record("draw_elements_instanced");
        self.record_draw(mode, offset, count, instances, Some(index_type));
    }

    fn create_texture(&mut self) -> Result<TextureHandle, ResourceError> {
        self.record("create_texture");
        let handle = TextureHandle(self.allocate());
        self.textures.insert(handle, TextureObject::default());
        Ok(handle)
    }

    fn delete_texture(&mut self, texture: TextureHandle) {
        self.record("delete_texture");
        self.textures.remove(&texture);
        self.state.texture_bindings.retain(|_, bound| *bound != texture);
    }

    fn bind_texture(&mut self, target: TextureTarget, texture: Option<TextureHandle>) {
        self.record("bind_texture");
        let key = (self.state.active_texture, target);
        match texture {
            Some(handle) => {
                if let Some(object) = self.textures.get_mut(&handle) {
                    match object.target {
                        None => object.target = Some(target),
                        Some(existing) if existing != target => log::warn!(
                            "HeadlessBackend: texture {handle:?} bound to {target} after {existing}"
                        ),
                        Some(_) => {}
                    }
                }
                self.state.texture_bindings.insert(key, handle);
            }
            None => {
                self.state.texture_bindings.remove(&key);
            }
        }
    }

    fn tex_image_2d(&mut self, image: &TexImage<'_>) {
        self.record("tex_image_2d");
        let target = match image.target {
            TexImageTarget::Texture2D => TextureTarget::Texture2D,
            TexImageTarget::CubeFace(_) => TextureTarget::CubeMap,
        };
        let flipped = self.state.unpack_flip_y;
        let Some(texture) = self.bound_texture_mut(target) else {
            log::warn!("HeadlessBackend: tex_image_2d with no texture bound to {target}");
            return;
        };
        texture.images.insert(
            (image.target, image.level),
            ImageInfo {
                width: image.width,
                height: image.height,
                internal_format: image.internal_format,
                data_type: image.data_type,
                has_data: image.pixels.is_some(),
                flipped,
            },
        );
    }

    fn tex_parameter(&mut self, target: TextureTarget, parameter: TextureParameter) {
        self.record("tex_parameter");
        let Some(texture) = self.bound_texture_mut(target) else {
            log::warn!("HeadlessBackend: tex_parameter with no texture bound to {target}");
            return;
        };
        match parameter {
            TextureParameter::MinFilter(filter) => texture.min_filter = filter,
            TextureParameter::MagFilter(filter) => texture.mag_filter = filter,
            TextureParameter::WrapS(wrap) => texture.wrap_s = wrap,
            TextureParameter::WrapT(wrap) => texture.wrap_t = wrap,
            TextureParameter::MaxAnisotropy(level) => texture.anisotropy = level,
        }
    }

    fn generate_mipmap(&mut self, target: TextureTarget) {
        self.record("generate_mipmap");
        if let Some(texture) = self.bound_texture_mut(target) {
            texture.mipmap_generations += 1;
        }
    }

    fn create_framebuffer(&mut self) -> Result<FramebufferHandle, ResourceError> {
        self.record("create_framebuffer");
        let handle = FramebufferHandle(self.allocate());
        self.framebuffers.insert(handle, FramebufferObject::default());
        Ok(handle)
    }

    fn delete_framebuffer(&mut self, framebuffer: FramebufferHandle) {
        self.record("delete_framebuffer");
        self.framebuffers.remove(&framebuffer);
        if self.state.framebuffer == Some(framebuffer) {
            self.state.framebuffer = None;
        }
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferHandle>) {
        self.record("bind_framebuffer");
        self.state.framebuffer = framebuffer;
    }

    fn framebuffer_texture_2d(
        &mut self,
        attachment: Attachment,
        target: TexImageTarget,
        texture: TextureHandle,
        level: u32,
    ) {
        self.record("framebuffer_texture_2d");
        let Some(framebuffer) = self.state.framebuffer.and_then(|f| self.framebuffers.get_mut(&f))
        else {
            log::warn!("HeadlessBackend: framebuffer_texture_2d on the default framebuffer");
            return;
        };
        framebuffer.attachments.insert(
            attachment,
            AttachmentSource::Texture {
                texture,
                target,
                level,
            },
        );
    }

    fn create_renderbuffer(&mut self) -> Result<RenderbufferHandle, ResourceError> {
        self.record("create_renderbuffer");
        let handle = RenderbufferHandle(self.allocate());
        self.renderbuffers.insert(handle, RenderbufferObject::default());
        Ok(handle)
    }

    fn delete_renderbuffer(&mut self, renderbuffer: RenderbufferHandle) {
        self.record("delete_renderbuffer");
        self.renderbuffers.remove(&renderbuffer);
        if self.state.renderbuffer == Some(renderbuffer) {
            self.state.renderbuffer = None;
        }
    }

    fn bind_renderbuffer(&mut self, renderbuffer: Option<RenderbufferHandle>) {
        self.record("bind_renderbuffer");
        self.state.renderbuffer = renderbuffer;
    }

    fn renderbuffer_storage(&mut self, format: RenderbufferFormat, width: u32, height: u32) {
        self.record("renderbuffer_storage");
        match self.state.renderbuffer.and_then(|r| self.renderbuffers.get_mut(&r)) {
            Some(renderbuffer) => renderbuffer.storage = Some((format, width, height)),
            None => log::warn!("HeadlessBackend: renderbuffer_storage with no renderbuffer bound"),
        }
    }

    fn framebuffer_renderbuffer(&mut self, attachment: Attachment, renderbuffer: RenderbufferHandle) {
        self.record("framebuffer_renderbuffer");
        match self.state.framebuffer.and_then(|f| self.framebuffers.get_mut(&f)) {
            Some(framebuffer) => {
                framebuffer
                    .attachments
                    .insert(attachment, AttachmentSource::Renderbuffer(renderbuffer));
            }
            None => log::warn!("HeadlessBackend: framebuffer_renderbuffer on the default framebuffer"),
        }
    }

    fn draw_buffers(&mut self, attachments: &[Attachment]) {
        self.record("draw_buffers");
        if let Some(framebuffer) = self.state.framebuffer.and_then(|f| self.framebuffers.get_mut(&f)) {
            framebuffer.draw_buffers = attachments.to_vec();
        }
    }

    fn check_framebuffer_status(&self) -> FramebufferStatus {
        let Some(handle) = self.state.framebuffer else {
            return FramebufferStatus::Complete;
        };
        let Some(framebuffer) = self.framebuffers.get(&handle) else {
            return FramebufferStatus::Other(0x0506);
        };
        if framebuffer.attachments.is_empty() {
            return FramebufferStatus::MissingAttachment;
        }
        if framebuffer.attachments.contains_key(&Attachment::DepthStencil)
            && (framebuffer.attachments.contains_key(&Attachment::Depth)
                || framebuffer.attachments.contains_key(&Attachment::Stencil))
        {
            return FramebufferStatus::Unsupported;
        }

        let mut size = None;
        for (attachment, source) in &framebuffer.attachments {
            let Some((width, height, format)) = self.attachment_size(source) else {
                return FramebufferStatus::IncompleteAttachment;
            };
            if let Some(format) = format {
                let depth_point = matches!(attachment, Attachment::Depth | Attachment::DepthStencil);
                if depth_point != is_depth_format(format) {
                    return FramebufferStatus::IncompleteAttachment;
                }
                if depth_point && !self.capabilities.depth_textures {
                    return FramebufferStatus::Unsupported;
                }
            }
            match size {
                None => size = Some((width, height)),
                Some(existing) if existing != (width, height) => {
                    return FramebufferStatus::IncompleteDimensions;
                }
                Some(_) => {}
            }
        }
        FramebufferStatus::Complete
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VS: &str = "attribute vec3 position;\nuniform mat4 mvp;\nvoid main() { gl_Position = mvp * vec4(position, 1.0); }";
    const FS: &str = "precision mediump float;\nuniform vec4 color;\nvoid main() { gl_FragColor = color; }";

    fn linked(backend: &mut HeadlessBackend) -> ProgramHandle {
        let vs = backend.compile_shader(ShaderStage::Vertex, VS).unwrap();
        let fs = backend.compile_shader(ShaderStage::Fragment, FS).unwrap();
        backend.link_program(vs, fs).unwrap()
    }

    #[test]
    fn starts_with_gl_defaults() {
        let backend = HeadlessBackend::new(640, 480);
        let state = backend.state();
        assert_eq!(state.viewport, (0, 0, 640, 480));
        assert_eq!(state.depth_func, CompareFunction::Less);
        assert!(state.depth_mask);
        assert!(!state.is_enabled(Capability::DepthTest));
        assert_eq!(backend.total_calls(), 0);
    }

    #[test]
    fn counts_calls_and_tracks_state() {
        let mut backend = HeadlessBackend::new(1, 1);
        backend.enable(Capability::Blend);
        backend.blend_func_separate(
            BlendFactor::SrcAlpha,
            BlendFactor::OneMinusSrcAlpha,
            BlendFactor::One,
            BlendFactor::OneMinusSrcAlpha,
        );
        assert_eq!(backend.calls("enable"), 1);
        assert_eq!(backend.calls("blend_func_separate"), 1);
        assert!(backend.state().is_enabled(Capability::Blend));
        assert_eq!(backend.state().blend_func.0, BlendFactor::SrcAlpha);
        backend.reset_counters();
        assert_eq!(backend.total_calls(), 0);
    }

    #[test]
    fn links_and_reflects_programs() {
        let mut backend = HeadlessBackend::new(1, 1);
        let program = linked(&mut backend);
        let uniforms = backend.active_uniforms(program);
        assert_eq!(uniforms.len(), 2);
        assert_eq!(backend.active_attributes(program)[0].name, "position");

        backend.use_program(Some(program));
        backend.uniform(uniforms[1].location, GlslType::Vec4, UniformData::Floats(&[1.0, 0.0, 0.0, 1.0]));
        assert_eq!(
            backend.uniform_value(program, uniforms[1].location),
            Some(&UniformRecord::Floats(vec![1.0, 0.0, 0.0, 1.0]))
        );
    }

    #[test]
    fn compile_errors_carry_the_log() {
        let mut backend = HeadlessBackend::new(1, 1);
        let err = backend
            .compile_shader(ShaderStage::Fragment, "uniform float a;")
            .unwrap_err();
        assert!(matches!(err, ShaderError::CompilationError { stage: ShaderStage::Fragment, .. }));
    }

    #[test]
    fn element_buffer_binding_belongs_to_the_vertex_array() {
        let mut backend = HeadlessBackend::new(1, 1);
        let vao = backend.create_vertex_array().unwrap();
        let index = backend.create_buffer().unwrap();
        backend.bind_vertex_array(Some(vao));
        backend.bind_buffer(BufferTarget::ElementArray, Some(index));
        backend.bind_vertex_array(None);
        assert_eq!(backend.vertex_array(None).unwrap().element_buffer, None);
        assert_eq!(backend.vertex_array(Some(vao)).unwrap().element_buffer, Some(index));
    }

    #[test]
    fn vertex_arrays_require_the_capability() {
        let mut backend = HeadlessBackend::with_capabilities(1, 1, ContextCapabilities::webgl1());
        assert!(backend.create_vertex_array().is_err());
    }

    #[test]
    fn framebuffer_completeness() {
        let mut backend = HeadlessBackend::new(1, 1);
        let fb = backend.create_framebuffer().unwrap();
        backend.bind_framebuffer(Some(fb));
        assert_eq!(backend.check_framebuffer_status(), FramebufferStatus::MissingAttachment);

        let color = backend.create_texture().unwrap();
        backend.bind_texture(TextureTarget::Texture2D, Some(color));
        backend.tex_image_2d(&TexImage {
            target: TexImageTarget::Texture2D,
            level: 0,
            internal_format: InternalFormat::Rgba,
            width: 64,
            height: 32,
            format: prism_core::renderer::PixelFormat::Rgba,
            data_type: DataType::UnsignedByte,
            pixels: None,
        });
        backend.framebuffer_texture_2d(Attachment::Color(0), TexImageTarget::Texture2D, color, 0);
        assert_eq!(backend.check_framebuffer_status(), FramebufferStatus::Complete);

        let depth = backend.create_renderbuffer().unwrap();
        backend.bind_renderbuffer(Some(depth));
        backend.renderbuffer_storage(RenderbufferFormat::DepthComponent16, 32, 32);
        backend.framebuffer_renderbuffer(Attachment::Depth, depth);
        assert_eq!(backend.check_framebuffer_status(), FramebufferStatus::IncompleteDimensions);
    }

    #[test]
    fn deleting_a_bound_texture_unbinds_it() {
        let mut backend = HeadlessBackend::new(1, 1);
        let texture = backend.create_texture().unwrap();
        backend.active_texture(2);
        backend.bind_texture(TextureTarget::Texture2D, Some(texture));
        assert_eq!(backend.state().bound_texture(2, TextureTarget::Texture2D), Some(texture));
        backend.delete_texture(texture);
        assert_eq!(backend.state().bound_texture(2, TextureTarget::Texture2D), None);
    }
}
