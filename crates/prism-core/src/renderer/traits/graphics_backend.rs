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

use crate::math::Color;
use crate::renderer::api::*;
use crate::renderer::error::{ResourceError, ShaderError};
use std::any::Any;
use std::fmt::Debug;

/// A stateful, immediate-mode GPU command interface in the style of WebGL 2.
///
/// Every method maps onto one GL entry point and has the same state semantics:
/// bind calls change the context's current object, and object calls act on the
/// currently bound one. The trait performs no redundancy elimination of its own;
/// callers are expected to route global state changes through a cache.
///
/// Failures of object allocation and of shader compilation or linking are
/// reported through `Result`. Everything else is fire-and-forget, like GL.
pub trait GraphicsBackend: Debug + 'static {
    /// Returns the backend as `&dyn Any`, so callers can downcast to the concrete type.
    fn as_any(&self) -> &dyn Any;

    /// Returns the backend as `&mut dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Returns the optional features and limits of this context.
    fn capabilities(&self) -> ContextCapabilities;

    // --- Global state ---

    /// Enables a capability.
    fn enable(&mut self, capability: Capability);

    /// Disables a capability.
    fn disable(&mut self, capability: Capability);

    /// Sets the RGB and alpha blend factors.
    fn blend_func_separate(
        &mut self,
        src_rgb: BlendFactor,
        dst_rgb: BlendFactor,
        src_alpha: BlendFactor,
        dst_alpha: BlendFactor,
    );

    /// Sets the RGB and alpha blend equations.
    fn blend_equation_separate(&mut self, rgb: BlendEquation, alpha: BlendEquation);

    /// Selects which faces are culled when culling is enabled.
    fn cull_face(&mut self, face: Face);

    /// Sets the winding of front-facing polygons.
    fn front_face(&mut self, front_face: FrontFace);

    /// Enables or disables writing to the depth buffer.
    fn depth_mask(&mut self, write: bool);

    /// Sets the depth comparison function.
    fn depth_func(&mut self, func: CompareFunction);

    /// Sets the viewport rectangle in pixels.
    fn viewport(&mut self, x: i32, y: i32, width: u32, height: u32);

    /// Sets the color used by [`clear`](Self::clear).
    fn clear_color(&mut self, color: Color);

    /// Clears the selected buffers of the bound framebuffer.
    fn clear(&mut self, flags: ClearFlags);

    /// Selects the texture unit affected by [`bind_texture`](Self::bind_texture).
    fn active_texture(&mut self, unit: u32);

    /// Sets a pixel unpacking parameter for subsequent uploads.
    fn pixel_store(&mut self, parameter: PixelStore);

    // --- Shaders and programs ---

    /// Compiles one shader stage.
    ///
    /// # Errors
    /// Returns [`ShaderError::CompilationError`] with the compiler log on failure.
    fn compile_shader(&mut self, stage: ShaderStage, source: &str)
        -> Result<ShaderHandle, ShaderError>;

    /// Deletes a shader stage.
    fn delete_shader(&mut self, shader: ShaderHandle);

    /// Links a vertex and a fragment stage into a program.
    ///
    /// # Errors
    /// Returns [`ShaderError::LinkError`] with the linker log on failure.
    fn link_program(
        &mut self,
        vertex: ShaderHandle,
        fragment: ShaderHandle,
    ) -> Result<ProgramHandle, ShaderError>;

    /// Deletes a program.
    fn delete_program(&mut self, program: ProgramHandle);

    /// Makes a program current, or unbinds with `None`.
    fn use_program(&mut self, program: Option<ProgramHandle>);

    /// Lists the active uniforms of a linked program.
    fn active_uniforms(&self, program: ProgramHandle) -> Vec<ActiveUniform>;

    /// Lists the active attributes of a linked program.
    fn active_attributes(&self, program: ProgramHandle) -> Vec<ActiveAttribute>;

    /// Uploads values to a uniform of the current program.
    fn uniform(&mut self, location: UniformLocation, ty: GlslType, data: UniformData<'_>);

    // --- Buffers and vertex arrays ---

    /// Allocates a buffer object.
    fn create_buffer(&mut self) -> Result<BufferHandle, ResourceError>;

    /// Deletes a buffer object.
    fn delete_buffer(&mut self, buffer: BufferHandle);

    /// Binds a buffer to a target, or unbinds with `None`.
    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferHandle>);

    /// Replaces the contents of the buffer bound to `target`.
    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsage);

    /// Overwrites part of the buffer bound to `target`.
    fn buffer_sub_data(&mut self, target: BufferTarget, offset: u32, data: &[u8]);

    /// Allocates a vertex array object.
    fn create_vertex_array(&mut self) -> Result<VertexArrayHandle, ResourceError>;

    /// Deletes a vertex array object.
    fn delete_vertex_array(&mut self, vao: VertexArrayHandle);

    /// Binds a vertex array object, or the default one with `None`.
    fn bind_vertex_array(&mut self, vao: Option<VertexArrayHandle>);

    /// Enables fetching of an attribute location from its buffer.
    fn enable_vertex_attrib_array(&mut self, location: u32);

    /// Describes where an attribute reads from the bound array buffer.
    fn vertex_attrib_pointer(&mut self, pointer: &VertexAttribPointer);

    /// Sets how many instances share one value of an attribute.
    fn vertex_attrib_divisor(&mut self, location: u32, divisor: u32);

    // --- Draws ---

    /// Draws non-indexed primitives.
    fn draw_arrays(&mut self, mode: DrawMode, first: u32, count: u32);

    /// Draws indexed primitives from the bound element buffer.
    fn draw_elements(&mut self, mode: DrawMode, count: u32, index_type: DataType, offset: u32);

    /// Draws several instances of non-indexed primitives.
    fn draw_arrays_instanced(&mut self, mode: DrawMode, first: u32, count: u32, instances: u32);

    /// Draws several instances of indexed primitives.
    fn draw_elements_instanced(
        &mut self,
        mode: DrawMode,
        count: u32,
        index_type: DataType,
        offset: u32,
        instances: u32,
    );

    // --- Textures ---

    /// Allocates a texture object.
    fn create_texture(&mut self) -> Result<TextureHandle, ResourceError>;

    /// Deletes a texture object.
    fn delete_texture(&mut self, texture: TextureHandle);

    /// Binds a texture to the active unit, or unbinds with `None`.
    fn bind_texture(&mut self, target: TextureTarget, texture: Option<TextureHandle>);

    /// Specifies one image of the texture bound to the active unit.
    fn tex_image_2d(&mut self, image: &TexImage<'_>);

    /// Sets a sampler parameter of the texture bound to the active unit.
    fn tex_parameter(&mut self, target: TextureTarget, parameter: TextureParameter);

    /// Generates the mip chain of the texture bound to the active unit.
    fn generate_mipmap(&mut self, target: TextureTarget);

    // --- Framebuffers ---

    /// Allocates a framebuffer object.
    fn create_framebuffer(&mut self) -> Result<FramebufferHandle, ResourceError>;

    /// Deletes a framebuffer object.
    fn delete_framebuffer(&mut self, framebuffer: FramebufferHandle);

    /// Binds a framebuffer, or the default surface with `None`.
    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferHandle>);

    /// Attaches a texture image to the bound framebuffer.
    fn framebuffer_texture_2d(
        &mut self,
        attachment: Attachment,
        target: TexImageTarget,
        texture: TextureHandle,
        level: u32,
    );

    /// Allocates a renderbuffer object.
    fn create_renderbuffer(&mut self) -> Result<RenderbufferHandle, ResourceError>;

    /// Deletes a renderbuffer object.
    fn delete_renderbuffer(&mut self, renderbuffer: RenderbufferHandle);

    /// Binds a renderbuffer, or unbinds with `None`.
    fn bind_renderbuffer(&mut self, renderbuffer: Option<RenderbufferHandle>);

    /// Allocates storage for the bound renderbuffer.
    fn renderbuffer_storage(&mut self, format: RenderbufferFormat, width: u32, height: u32);

    /// Attaches a renderbuffer to the bound framebuffer.
    fn framebuffer_renderbuffer(&mut self, attachment: Attachment, renderbuffer: RenderbufferHandle);

    /// Selects the color attachments fragment outputs are written to.
    fn draw_buffers(&mut self, attachments: &[Attachment]);

    /// Checks whether the bound framebuffer can be rendered to.
    fn check_framebuffer_status(&self) -> FramebufferStatus;
}
