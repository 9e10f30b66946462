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
use std::fmt;

use glow::HasContext;
use prism_core::math::Color;
use prism_core::renderer::{
    ActiveAttribute, ActiveUniform, Attachment, BlendEquation, BlendFactor, BufferHandle,
    BufferTarget, BufferUsage, Capability, ClearFlags, CompareFunction, ContextCapabilities,
    DataType, DrawMode, Face, FramebufferHandle, FramebufferStatus, FrontFace, GlslType,
    GraphicsBackend, PixelFormat, PixelStore, ProgramHandle, RenderbufferFormat,
    RenderbufferHandle, ResourceError, ShaderError, ShaderHandle, ShaderStage, TexImage,
    TextureHandle, TextureParameter, TextureTarget, UniformData, UniformLocation,
    VertexArrayHandle, VertexAttribPointer,
};

use super::conversions::{
    framebuffer_status_from_gl, glsl_type_from_gl, renderbuffer_format, IntoGl,
};

/// Maps our `u32` handles onto the context's native object names.
#[derive(Debug)]
struct Registry<K, V> {
    objects: HashMap<K, V>,
}

impl<K: std::hash::Hash + Eq + Copy, V: Copy> Registry<K, V> {
    fn new() -> Self {
        Self {
            objects: HashMap::new(),
        }
    }

    fn get(&self, key: K) -> Option<V> {
        self.objects.get(&key).copied()
    }
}

#[derive(Debug, Clone)]
struct LinkedProgram {
    native: glow::Program,
    uniforms: Vec<ActiveUniform>,
    attributes: Vec<ActiveAttribute>,
}

/// An OpenGL (3.3 core / ES 3.0) or WebGL 2 backend built on `glow`.
///
/// The backend owns the `glow::Context`; the context must stay current on the
/// calling thread for as long as the backend is used.
pub struct GlowBackend {
    gl: glow::Context,
    capabilities: ContextCapabilities,
    next_id: u32,
    shaders: Registry<ShaderHandle, glow::Shader>,
    programs: HashMap<ProgramHandle, LinkedProgram>,
    uniform_locations: HashMap<UniformLocation, glow::UniformLocation>,
    buffers: Registry<BufferHandle, glow::Buffer>,
    vertex_arrays: Registry<VertexArrayHandle, glow::VertexArray>,
    textures: Registry<TextureHandle, glow::Texture>,
    framebuffers: Registry<FramebufferHandle, glow::Framebuffer>,
    renderbuffers: Registry<RenderbufferHandle, glow::Renderbuffer>,
    unpack_flip_y: bool,
    unpack_premultiply_alpha: bool,
}

impl fmt::Debug for GlowBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlowBackend")
            .field("capabilities", &self.capabilities)
            .field("programs", &self.programs.len())
            .field("buffers", &self.buffers.objects.len())
            .field("textures", &self.textures.objects.len())
            .finish()
    }
}

impl GlowBackend {
    /// Wraps a context and queries its capabilities.
    pub fn new(gl: glow::Context) -> Self {
        let capabilities = query_capabilities(&gl);
        log::info!("GlowBackend: {capabilities:?}");
        Self {
            gl,
            capabilities,
            next_id: 1,
            shaders: Registry::new(),
            programs: HashMap::new(),
            uniform_locations: HashMap::new(),
            buffers: Registry::new(),
            vertex_arrays: Registry::new(),
            textures: Registry::new(),
            framebuffers: Registry::new(),
            renderbuffers: Registry::new(),
            unpack_flip_y: false,
            unpack_premultiply_alpha: false,
        }
    }

    /// The wrapped context.
    pub fn context(&self) -> &glow::Context {
        &self.gl
    }

    fn allocate(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Applies the flip and premultiply unpack flags on the CPU, which works the
    /// same on desktop GL and WebGL.
    fn unpack<'a>(&self, image: &TexImage<'a>, pixels: &'a [u8]) -> std::borrow::Cow<'a, [u8]> {
        let rgba8 = image.format == PixelFormat::Rgba && image.data_type == DataType::UnsignedByte;
        if !rgba8 || !(self.unpack_flip_y || self.unpack_premultiply_alpha) {
            return std::borrow::Cow::Borrowed(pixels);
        }
        let row = image.width as usize * 4;
        let mut out = pixels.to_vec();
        if self.unpack_flip_y && row > 0 {
            let rows: Vec<&[u8]> = pixels.chunks(row).rev().collect();
            out = rows.concat();
        }
        if self.unpack_premultiply_alpha {
            for texel in out.chunks_exact_mut(4) {
                let alpha = u16::from(texel[3]);
                for channel in &mut texel[..3] {
                    *channel = ((u16::from(*channel) * alpha + 127) / 255) as u8;
                }
            }
        }
        std::borrow::Cow::Owned(out)
    }
}

fn query_capabilities(gl: &glow::Context) -> ContextCapabilities {
    let version = gl.version();
    let webgl2 = version.major >= 3;
    let extensions = gl.supported_extensions();
    let has = |name: &str| {
        extensions.contains(name) || extensions.contains(&format!("GL_{name}"))
    };
    // SAFETY: plain parameter queries on a current context.
    unsafe {
        let max_anisotropy = has("EXT_texture_filter_anisotropic")
            .then(|| gl.get_parameter_f32(glow::MAX_TEXTURE_MAX_ANISOTROPY_EXT));
        ContextCapabilities {
            webgl2,
            vertex_array_objects: webgl2,
            instanced_arrays: webgl2,
            npot_mipmaps: webgl2,
            depth_textures: webgl2 || has("WEBGL_depth_texture"),
            float_textures: webgl2 || has("OES_texture_float"),
            max_anisotropy,
            max_texture_units: gl.get_parameter_i32(glow::MAX_COMBINED_TEXTURE_IMAGE_UNITS).max(1)
                as u32,
            max_texture_size: gl.get_parameter_i32(glow::MAX_TEXTURE_SIZE).max(1) as u32,
            max_draw_buffers: if webgl2 {
                gl.get_parameter_i32(glow::MAX_DRAW_BUFFERS).max(1) as u32
            } else {
                1
            },
        }
    }
}

fn out_of_memory(details: String) -> ResourceError {
    ResourceError::BackendError(details)
}

// SAFETY (whole impl): every call goes to the context owned by `self`, which the
// caller keeps current. Native objects only ever come from our own registries.
impl GraphicsBackend for GlowBackend {
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
        unsafe { self.gl.enable(capability.into_gl()) }
    }

    fn disable(&mut self, capability: Capability) {
        unsafe { self.gl.disable(capability.into_gl()) }
    }

    fn blend_func_separate(
        &mut self,
        src_rgb: BlendFactor,
        dst_rgb: BlendFactor,
        src_alpha: BlendFactor,
        dst_alpha: BlendFactor,
    ) {
        unsafe {
            self.gl.blend_func_separate(
                src_rgb.into_gl(),
                dst_rgb.into_gl(),
                src_alpha.into_gl(),
                dst_alpha.into_gl(),
            )
        }
    }

    fn blend_equation_separate(&mut self, rgb: BlendEquation, alpha: BlendEquation) {
        unsafe { self.gl.blend_equation_separate(rgb.into_gl(), alpha.into_gl()) }
    }

    fn cull_face(&mut self, face: Face) {
        unsafe { self.gl.cull_face(face.into_gl()) }
    }

    fn front_face(&mut self, front_face: FrontFace) {
        unsafe { self.gl.front_face(front_face.into_gl()) }
    }

    fn depth_mask(&mut self, write: bool) {
        unsafe { self.gl.depth_mask(write) }
    }

    fn depth_func(&mut self, func: CompareFunction) {
        unsafe { self.gl.depth_func(func.into_gl()) }
    }

    fn viewport(&mut self, x: i32, y: i32, width: u32, height: u32) {
        unsafe { self.gl.viewport(x, y, width as i32, height as i32) }
    }

    fn clear_color(&mut self, color: Color) {
        unsafe { self.gl.clear_color(color.r, color.g, color.b, color.a) }
    }

    fn clear(&mut self, flags: ClearFlags) {
        let mut mask = 0;
        if flags.color {
            mask |= glow::COLOR_BUFFER_BIT;
        }
        if flags.depth {
            mask |= glow::DEPTH_BUFFER_BIT;
        }
        if flags.stencil {
            mask |= glow::STENCIL_BUFFER_BIT;
        }
        unsafe { self.gl.clear(mask) }
    }

    fn active_texture(&mut self, unit: u32) {
        unsafe { self.gl.active_texture(glow::TEXTURE0 + unit) }
    }

    fn pixel_store(&mut self, parameter: PixelStore) {
        match parameter {
            PixelStore::FlipY(flip) => self.unpack_flip_y = flip,
            PixelStore::PremultiplyAlpha(premultiply) => self.unpack_premultiply_alpha = premultiply,
            PixelStore::UnpackAlignment(alignment) => unsafe {
                self.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, alignment as i32)
            },
        }
    }

    fn compile_shader(
        &mut self,
        stage: ShaderStage,
        source: &str,
    ) -> Result<ShaderHandle, ShaderError> {
        let shader = unsafe { self.gl.create_shader(stage.into_gl()) }
            .map_err(|details| ShaderError::CompilationError { stage, details })?;
        unsafe {
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            if !self.gl.get_shader_compile_status(shader) {
                let details = self.gl.get_shader_info_log(shader);
                self.gl.delete_shader(shader);
                return Err(ShaderError::CompilationError { stage, details });
            }
        }
        let handle = ShaderHandle(self.allocate());
        self.shaders.objects.insert(handle, shader);
        Ok(handle)
    }

    fn delete_shader(&mut self, shader: ShaderHandle) {
        if let Some(native) = self.shaders.objects.remove(&shader) {
            unsafe { self.gl.delete_shader(native) }
        }
    }

    fn link_program(
        &mut self,
        vertex: ShaderHandle,
        fragment: ShaderHandle,
    ) -> Result<ProgramHandle, ShaderError> {
        let (Some(vs), Some(fs)) = (self.shaders.get(vertex), self.shaders.get(fragment)) else {
            return Err(ShaderError::LinkError {
                details: "attached shader was deleted or never compiled".to_string(),
            });
        };
        let native = unsafe { self.gl.create_program() }
            .map_err(|details| ShaderError::LinkError { details })?;

        let mut uniforms = Vec::new();
        let mut attributes = Vec::new();
        let mut locations = Vec::new();
        unsafe {
            self.gl.attach_shader(native, vs);
            self.gl.attach_shader(native, fs);
            self.gl.link_program(native);
            if !self.gl.get_program_link_status(native) {
                let details = self.gl.get_program_info_log(native);
                self.gl.delete_program(native);
                return Err(ShaderError::LinkError { details });
            }

            for index in 0..self.gl.get_active_uniforms(native) {
                let Some(active) = self.gl.get_active_uniform(native, index) else {
                    continue;
                };
                let (Some(ty), Some(location)) = (
                    glsl_type_from_gl(active.utype),
                    self.gl.get_uniform_location(native, &active.name),
                ) else {
                    log::debug!("GlowBackend: skipping uniform '{}'", active.name);
                    continue;
                };
                locations.push((active.name.clone(), ty, active.size.max(1) as u32, location));
            }

            for index in 0..self.gl.get_active_attributes(native) {
                let Some(active) = self.gl.get_active_attribute(native, index) else {
                    continue;
                };
                let (Some(ty), Some(location)) = (
                    glsl_type_from_gl(active.atype),
                    self.gl.get_attrib_location(native, &active.name),
                ) else {
                    continue;
                };
                attributes.push(ActiveAttribute {
                    name: active.name,
                    location,
                    ty,
                    size: active.size.max(1) as u32,
                });
            }
        }

        for (name, ty, size, native_location) in locations {
            let location = UniformLocation(self.allocate());
            self.uniform_locations.insert(location, native_location);
            uniforms.push(ActiveUniform {
                name,
                location,
                ty,
                size,
            });
        }

        let handle = ProgramHandle(self.allocate());
        self.programs.insert(
            handle,
            LinkedProgram {
                native,
                uniforms,
                attributes,
            },
        );
        Ok(handle)
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        if let Some(linked) = self.programs.remove(&program) {
            for uniform in &linked.uniforms {
                self.uniform_locations.remove(&uniform.location);
            }
            unsafe { self.gl.delete_program(linked.native) }
        }
    }

    fn use_program(&mut self, program: Option<ProgramHandle>) {
        let native = program.and_then(|p| self.programs.get(&p)).map(|p| p.native);
        unsafe { self.gl.use_program(native) }
    }

    fn active_uniforms(&self, program: ProgramHandle) -> Vec<ActiveUniform> {
        self.programs
            .get(&program)
            .map(|p| p.uniforms.clone())
            .unwrap_or_default()
    }

    fn active_attributes(&self, program: ProgramHandle) -> Vec<ActiveAttribute> {
        self.programs
            .get(&program)
            .map(|p| p.attributes.clone())
            .unwrap_or_default()
    }

    fn uniform(&mut self, location: UniformLocation, ty: GlslType, data: UniformData<'_>) {
        let Some(native) = self.uniform_locations.get(&location) else {
            return;
        };
        let native = Some(native);
        unsafe {
            match (ty, data) {
                (GlslType::Mat2, UniformData::Floats(v)) => {
                    self.gl.uniform_matrix_2_f32_slice(native, false, v)
                }
                (GlslType::Mat3, UniformData::Floats(v)) => {
                    self.gl.uniform_matrix_3_f32_slice(native, false, v)
                }
                (GlslType::Mat4, UniformData::Floats(v)) => {
                    self.gl.uniform_matrix_4_f32_slice(native, false, v)
                }
                (_, UniformData::Floats(v)) => match ty.components() {
                    1 => self.gl.uniform_1_f32_slice(native, v),
                    2 => self.gl.uniform_2_f32_slice(native, v),
                    3 => self.gl.uniform_3_f32_slice(native, v),
                    _ => self.gl.uniform_4_f32_slice(native, v),
                },
                (_, UniformData::Ints(v)) => match ty.components() {
                    1 => self.gl.uniform_1_i32_slice(native, v),
                    2 => self.gl.uniform_2_i32_slice(native, v),
                    3 => self.gl.uniform_3_i32_slice(native, v),
                    _ => self.gl.uniform_4_i32_slice(native, v),
                },
            }
        }
    }

    fn create_buffer(&mut self) -> Result<BufferHandle, ResourceError> {
        let native = unsafe { self.gl.create_buffer() }.map_err(out_of_memory)?;
        let handle = BufferHandle(self.allocate());
        self.buffers.objects.insert(handle, native);
        Ok(handle)
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        if let Some(native) = self.buffers.objects.remove(&buffer) {
            unsafe { self.gl.delete_buffer(native) }
        }
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferHandle>) {
        let native = buffer.and_then(|b| self.buffers.get(b));
        unsafe { self.gl.bind_buffer(target.into_gl(), native) }
    }

    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsage) {
        unsafe {
            self.gl
                .buffer_data_u8_slice(target.into_gl(), data, usage.into_gl())
        }
    }

    fn buffer_sub_data(&mut self, target: BufferTarget, offset: u32, data: &[u8]) {
        unsafe {
            self.gl
                .buffer_sub_data_u8_slice(target.into_gl(), offset as i32, data)
        }
    }

    fn create_vertex_array(&mut self) -> Result<VertexArrayHandle, ResourceError> {
        let native = unsafe { self.gl.create_vertex_array() }.map_err(out_of_memory)?;
        let handle = VertexArrayHandle(self.allocate());
        self.vertex_arrays.objects.insert(handle, native);
        Ok(handle)
    }

    fn delete_vertex_array(&mut self, vao: VertexArrayHandle) {
        if let Some(native) = self.vertex_arrays.objects.remove(&vao) {
            unsafe { self.gl.delete_vertex_array(native) }
        }
    }

    fn bind_vertex_array(&mut self, vao: Option<VertexArrayHandle>) {
        let native = vao.and_then(|v| self.vertex_arrays.get(v));
        unsafe { self.gl.bind_vertex_array(native) }
    }

    fn enable_vertex_attrib_array(&mut self, location: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(location) }
    }

    fn vertex_attrib_pointer(&mut self, pointer: &VertexAttribPointer) {
        unsafe {
            self.gl.vertex_attrib_pointer_f32(
                pointer.location,
                pointer.size as i32,
                pointer.data_type.into_gl(),
                pointer.normalized,
                pointer.stride as i32,
                pointer.offset as i32,
            )
        }
    }

    fn vertex_attrib_divisor(&mut self, location: u32, divisor: u32) {
        unsafe { self.gl.vertex_attrib_divisor(location, divisor) }
    }

    fn draw_arrays(&mut self, mode: DrawMode, first: u32, count: u32) {
        unsafe { self.gl.draw_arrays(mode.into_gl(), first as i32, count as i32) }
    }

    fn draw_elements(&mut self, mode: DrawMode, count: u32, index_type: DataType, offset: u32) {
        unsafe {
            self.gl
                .draw_elements(mode.into_gl(), count as i32, index_type.into_gl(), offset as i32)
        }
    }

    fn draw_arrays_instanced(&mut self, mode: DrawMode, first: u32, count: u32, instances: u32) {
        unsafe {
            self.gl.draw_arrays_instanced(
                mode.into_gl(),
                first as i32,
                count as i32,
                instances as i32,
            )
        }
    }

    fn draw_elements_instanced(
        &mut self,
        mode: DrawMode,
        count: u32,
        index_type: DataType,
        offset: u32,
        instances: u32,
    ) {
        unsafe {
            self.gl.draw_elements_instanced(
                mode.into_gl(),
                count as i32,
                index_type.into_gl(),
                offset as i32,
                instances as i32,
            )
        }
    }

    fn create_texture(&mut self) -> Result<TextureHandle, ResourceError> {
        let native = unsafe { self.gl.create_texture() }.map_err(out_of_memory)?;
        let handle = TextureHandle(self.allocate());
        self.textures.objects.insert(handle, native);
        Ok(handle)
    }

    fn delete_texture(&mut self, texture: TextureHandle) {
        if let Some(native) = self.textures.objects.remove(&texture) {
            unsafe { self.gl.delete_texture(native) }
        }
    }

    fn bind_texture(&mut self, target: TextureTarget, texture: Option<TextureHandle>) {
        let native = texture.and_then(|t| self.textures.get(t));
        unsafe { self.gl.bind_texture(target.into_gl(), native) }
    }

    fn tex_image_2d(&mut self, image: &TexImage<'_>) {
        let pixels = image.pixels.map(|pixels| self.unpack(image, pixels));
        unsafe {
            self.gl.tex_image_2d(
                image.target.into_gl(),
                image.level as i32,
                image.internal_format.into_gl() as i32,
                image.width as i32,
                image.height as i32,
                0,
                image.format.into_gl(),
                image.data_type.into_gl(),
                glow::PixelUnpackData::Slice(pixels.as_deref()),
            )
        }
    }

    fn tex_parameter(&mut self, target: TextureTarget, parameter: TextureParameter) {
        let target = target.into_gl();
        unsafe {
            match parameter {
                TextureParameter::MinFilter(filter) => {
                    self.gl
                        .tex_parameter_i32(target, glow::TEXTURE_MIN_FILTER, filter.into_gl() as i32)
                }
                TextureParameter::MagFilter(filter) => {
                    self.gl
                        .tex_parameter_i32(target, glow::TEXTURE_MAG_FILTER, filter.into_gl() as i32)
                }
                TextureParameter::WrapS(wrap) => {
                    self.gl
                        .tex_parameter_i32(target, glow::TEXTURE_WRAP_S, wrap.into_gl() as i32)
                }
                TextureParameter::WrapT(wrap) => {
                    self.gl
                        .tex_parameter_i32(target, glow::TEXTURE_WRAP_T, wrap.into_gl() as i32)
                }
                TextureParameter::MaxAnisotropy(level) => {
                    self.gl
                        .tex_parameter_f32(target, glow::TEXTURE_MAX_ANISOTROPY_EXT, level)
                }
            }
        }
    }

    fn generate_mipmap(&mut self, target: TextureTarget) {
        unsafe { self.gl.generate_mipmap(target.into_gl()) }
    }

    fn create_framebuffer(&mut self) -> Result<FramebufferHandle, ResourceError> {
        let native = unsafe { self.gl.create_framebuffer() }.map_err(out_of_memory)?;
        let handle = FramebufferHandle(self.allocate());
        self.framebuffers.objects.insert(handle, native);
        Ok(handle)
    }

    fn delete_framebuffer(&mut self, framebuffer: FramebufferHandle) {
        if let Some(native) = self.framebuffers.objects.remove(&framebuffer) {
            unsafe { self.gl.delete_framebuffer(native) }
        }
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferHandle>) {
        let native = framebuffer.and_then(|f| self.framebuffers.get(f));
        unsafe { self.gl.bind_framebuffer(glow::FRAMEBUFFER, native) }
    }

    fn framebuffer_texture_2d(
        &mut self,
        attachment: Attachment,
        target: prism_core::renderer::TexImageTarget,
        texture: TextureHandle,
        level: u32,
    ) {
        let native = self.textures.get(texture);
        unsafe {
            self.gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                attachment.into_gl(),
                target.into_gl(),
                native,
                level as i32,
            )
        }
    }

    fn create_renderbuffer(&mut self) -> Result<RenderbufferHandle, ResourceError> {
        let native = unsafe { self.gl.create_renderbuffer() }.map_err(out_of_memory)?;
        let handle = RenderbufferHandle(self.allocate());
        self.renderbuffers.objects.insert(handle, native);
        Ok(handle)
    }

    fn delete_renderbuffer(&mut self, renderbuffer: RenderbufferHandle) {
        if let Some(native) = self.renderbuffers.objects.remove(&renderbuffer) {
            unsafe { self.gl.delete_renderbuffer(native) }
        }
    }

    fn bind_renderbuffer(&mut self, renderbuffer: Option<RenderbufferHandle>) {
        let native = renderbuffer.and_then(|r| self.renderbuffers.get(r));
        unsafe { self.gl.bind_renderbuffer(glow::RENDERBUFFER, native) }
    }

    fn renderbuffer_storage(&mut self, format: RenderbufferFormat, width: u32, height: u32) {
        let format = renderbuffer_format(format, self.capabilities.webgl2);
        unsafe {
            self.gl
                .renderbuffer_storage(glow::RENDERBUFFER, format, width as i32, height as i32)
        }
    }

    fn framebuffer_renderbuffer(&mut self, attachment: Attachment, renderbuffer: RenderbufferHandle) {
        let native = self.renderbuffers.get(renderbuffer);
        unsafe {
            self.gl.framebuffer_renderbuffer(
                glow::FRAMEBUFFER,
                attachment.into_gl(),
                glow::RENDERBUFFER,
                native,
            )
        }
    }

    fn draw_buffers(&mut self, attachments: &[Attachment]) {
        let buffers: Vec<u32> = attachments.iter().map(|a| a.into_gl()).collect();
        unsafe { self.gl.draw_buffers(&buffers) }
    }

    fn check_framebuffer_status(&self) -> FramebufferStatus {
        framebuffer_status_from_gl(unsafe { self.gl.check_framebuffer_status(glow::FRAMEBUFFER) })
    }
}
