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

//! The renderer's single entry point to the graphics backend.
//!
//! [`RenderContext`] owns the backend and shadows its global state in a
//! [`StateCache`]. Global state setters are only reachable through the
//! context, and each one is a compare-and-set: the backend is called only
//! when the requested value differs from the cached one.

mod state;
mod warnings;

pub use self::state::{BlendEquationState, BlendFunc, StateCache};
pub use self::warnings::{WarningLimiter, DEFAULT_WARNING_LIMIT};

use prism_core::math::Color;
use prism_core::renderer::{
    BlendEquation, BlendFactor, BufferHandle, BufferTarget, Capability, ClearFlags,
    CompareFunction, ContextCapabilities, Face, FramebufferHandle, FrontFace, GlslType,
    GraphicsBackend, PixelStore, ProgramHandle, TextureHandle, TextureTarget, UniformData,
    UniformLocation, VertexArrayHandle,
};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
enum CachedUniform {
    Floats(Vec<f32>),
    Ints(Vec<i32>),
}

/// Owns a [`GraphicsBackend`] and caches the state pushed into it.
pub struct RenderContext {
    backend: Box<dyn GraphicsBackend>,
    capabilities: ContextCapabilities,
    state: StateCache,
    uniforms: HashMap<(ProgramHandle, UniformLocation), CachedUniform>,
    int_scratch: HashMap<usize, Vec<i32>>,
    warnings: WarningLimiter,
    premultiplied_alpha: bool,
}

impl fmt::Debug for RenderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderContext")
            .field("backend", &self.backend)
            .field("capabilities", &self.capabilities)
            .field("state", &self.state)
            .field("cached_uniforms", &self.uniforms.len())
            .finish_non_exhaustive()
    }
}

impl RenderContext {
    /// Wraps `backend`. The cache starts from the GL defaults.
    pub fn new(backend: Box<dyn GraphicsBackend>) -> Self {
        let capabilities = backend.capabilities();
        log::info!("RenderContext: backend capabilities {capabilities:?}");
        Self {
            backend,
            capabilities,
            state: StateCache::default(),
            uniforms: HashMap::new(),
            int_scratch: HashMap::new(),
            warnings: WarningLimiter::default(),
            premultiplied_alpha: false,
        }
    }

    /// Capabilities reported by the backend at creation.
    pub fn capabilities(&self) -> &ContextCapabilities {
        &self.capabilities
    }

    /// The shadow state.
    pub fn state(&self) -> &StateCache {
        &self.state
    }

    /// Read-only access to the backend.
    pub fn backend(&self) -> &dyn GraphicsBackend {
        self.backend.as_ref()
    }

    /// Downcasts the backend to its concrete type.
    pub fn backend_as<T: GraphicsBackend>(&self) -> Option<&T> {
        self.backend.as_any().downcast_ref::<T>()
    }

    /// Mutable downcast, for test harnesses that inspect or reset the backend.
    pub fn backend_as_mut<T: GraphicsBackend>(&mut self) -> Option<&mut T> {
        self.backend.as_any_mut().downcast_mut::<T>()
    }

    /// Object-scoped calls (uploads, draws, attachments). Global state must go
    /// through the setters below instead.
    pub(crate) fn backend_mut(&mut self) -> &mut dyn GraphicsBackend {
        self.backend.as_mut()
    }

    /// Whether the drawing buffer holds premultiplied alpha.
    pub fn premultiplied_alpha(&self) -> bool {
        self.premultiplied_alpha
    }

    pub(crate) fn set_premultiplied_alpha(&mut self, premultiplied: bool) {
        self.premultiplied_alpha = premultiplied;
    }

    /// Logs a draw-time diagnostic through the rate limiter.
    pub fn warn(&mut self, message: fmt::Arguments<'_>) -> bool {
        self.warnings.warn(message)
    }

    /// The limiter behind [`RenderContext::warn`].
    pub fn warnings(&self) -> &WarningLimiter {
        &self.warnings
    }

    pub(crate) fn warnings_mut(&mut self) -> &mut WarningLimiter {
        &mut self.warnings
    }

    // --- Capabilities ---

    /// Enables `capability` unless already enabled.
    pub fn enable(&mut self, capability: Capability) {
        if self.state.enabled.insert(capability) {
            self.backend.enable(capability);
        }
    }

    /// Disables `capability` unless already disabled.
    pub fn disable(&mut self, capability: Capability) {
        if self.state.enabled.remove(&capability) {
            self.backend.disable(capability);
        }
    }

    // --- Fixed-function state ---

    /// Sets the blend factors. Alpha factors default to the color ones.
    pub fn set_blend_func(
        &mut self,
        src: BlendFactor,
        dst: BlendFactor,
        src_alpha: Option<BlendFactor>,
        dst_alpha: Option<BlendFactor>,
    ) {
        let func = BlendFunc::separate(src, dst, src_alpha.unwrap_or(src), dst_alpha.unwrap_or(dst));
        if self.state.blend_func == func {
            return;
        }
        self.state.blend_func = func;
        self.backend
            .blend_func_separate(func.src, func.dst, func.src_alpha, func.dst_alpha);
    }

    /// Sets the blend equations. The alpha equation defaults to the color one.
    pub fn set_blend_equation(&mut self, rgb: BlendEquation, alpha: Option<BlendEquation>) {
        let equation = BlendEquationState {
            rgb,
            alpha: alpha.unwrap_or(rgb),
        };
        if self.state.blend_equation == equation {
            return;
        }
        self.state.blend_equation = equation;
        self.backend.blend_equation_separate(equation.rgb, equation.alpha);
    }

    /// Sets the culled face.
    pub fn set_cull_face(&mut self, face: Face) {
        if self.state.cull_face != face {
            self.state.cull_face = face;
            self.backend.cull_face(face);
        }
    }

    /// Sets the front-facing winding.
    pub fn set_front_face(&mut self, front_face: FrontFace) {
        if self.state.front_face != front_face {
            self.state.front_face = front_face;
            self.backend.front_face(front_face);
        }
    }

    /// Enables or disables depth writes.
    pub fn set_depth_mask(&mut self, write: bool) {
        if self.state.depth_mask != write {
            self.state.depth_mask = write;
            self.backend.depth_mask(write);
        }
    }

    /// Sets the depth comparison.
    pub fn set_depth_func(&mut self, func: CompareFunction) {
        if self.state.depth_func != func {
            self.state.depth_func = func;
            self.backend.depth_func(func);
        }
    }

    /// Sets the viewport rectangle in device pixels.
    pub fn set_viewport(&mut self, x: i32, y: i32, width: u32, height: u32) {
        let viewport = Some((x, y, width, height));
        if self.state.viewport != viewport {
            self.state.viewport = viewport;
            self.backend.viewport(x, y, width, height);
        }
    }

    /// Sets the clear color.
    pub fn set_clear_color(&mut self, color: Color) {
        if self.state.clear_color != Some(color) {
            self.state.clear_color = Some(color);
            self.backend.clear_color(color);
        }
    }

    /// Clears the buffers named by `flags` of the bound framebuffer.
    pub fn clear(&mut self, flags: ClearFlags) {
        if !flags.is_empty() {
            self.backend.clear(flags);
        }
    }

    /// Sets a pixel-store parameter for subsequent texture uploads.
    pub fn pixel_store(&mut self, parameter: PixelStore) {
        let changed = match parameter {
            PixelStore::FlipY(flip) => std::mem::replace(&mut self.state.flip_y, flip) != flip,
            PixelStore::PremultiplyAlpha(premultiply) => {
                std::mem::replace(&mut self.state.premultiply_alpha, premultiply) != premultiply
            }
            PixelStore::UnpackAlignment(alignment) => {
                std::mem::replace(&mut self.state.unpack_alignment, alignment) != alignment
            }
        };
        if changed {
            self.backend.pixel_store(parameter);
        }
    }

    // --- Bindings ---

    /// Makes `unit` the active texture unit.
    pub fn active_texture(&mut self, unit: u32) {
        if self.state.active_texture_unit != unit {
            self.state.active_texture_unit = unit;
            self.backend.active_texture(unit);
        }
    }

    /// Binds `texture` to `target` on `unit`, activating the unit first if needed.
    pub fn bind_texture(&mut self, unit: u32, target: TextureTarget, texture: Option<TextureHandle>) {
        if self.state.bound_texture(unit, target) == texture {
            return;
        }
        self.active_texture(unit);
        match texture {
            Some(handle) => self.state.texture_units.insert((unit, target), handle),
            None => self.state.texture_units.remove(&(unit, target)),
        };
        self.backend.bind_texture(target, texture);
    }

    /// Binds a framebuffer, `None` for the default surface.
    pub fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferHandle>) {
        if self.state.framebuffer != framebuffer {
            self.state.framebuffer = framebuffer;
            self.backend.bind_framebuffer(framebuffer);
        }
    }

    /// Binds a buffer. `ELEMENT_ARRAY_BUFFER` bindings belong to the bound vertex
    /// array, so only `ARRAY_BUFFER` is cached.
    pub fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferHandle>) {
        match target {
            BufferTarget::Array => {
                if self.state.array_buffer != buffer {
                    self.state.array_buffer = buffer;
                    self.backend.bind_buffer(target, buffer);
                }
            }
            BufferTarget::ElementArray => self.backend.bind_buffer(target, buffer),
        }
    }

    /// Binds a vertex array, `None` for the default one.
    pub fn bind_vertex_array(&mut self, vao: Option<VertexArrayHandle>) {
        if self.state.vertex_array != vao {
            self.state.vertex_array = vao;
            self.backend.bind_vertex_array(vao);
        }
    }

    /// Makes `program` current. Returns `true` if this switched programs.
    pub fn use_program(&mut self, program: Option<ProgramHandle>) -> bool {
        if self.state.program == program {
            return false;
        }
        self.state.program = program;
        self.backend.use_program(program);
        true
    }

    // --- Uniforms ---

    /// Uploads `data` to `location` of the current program unless the same
    /// values were the last ones pushed there. Returns `true` on upload.
    pub fn set_uniform(
        &mut self,
        program: ProgramHandle,
        location: UniformLocation,
        ty: GlslType,
        data: UniformData<'_>,
    ) -> bool {
        let key = (program, location);
        let unchanged = match (self.uniforms.get(&key), data) {
            (Some(CachedUniform::Floats(previous)), UniformData::Floats(values)) => {
                previous.as_slice() == values
            }
            (Some(CachedUniform::Ints(previous)), UniformData::Ints(values)) => {
                previous.as_slice() == values
            }
            _ => false,
        };
        if unchanged {
            return false;
        }
        let slot = self
            .uniforms
            .entry(key)
            .or_insert_with(|| CachedUniform::Floats(Vec::new()));
        match (slot, data) {
            (CachedUniform::Floats(previous), UniformData::Floats(values)) => {
                previous.clear();
                previous.extend_from_slice(values);
            }
            (CachedUniform::Ints(previous), UniformData::Ints(values)) => {
                previous.clear();
                previous.extend_from_slice(values);
            }
            (slot, UniformData::Floats(values)) => *slot = CachedUniform::Floats(values.to_vec()),
            (slot, UniformData::Ints(values)) => *slot = CachedUniform::Ints(values.to_vec()),
        }
        self.backend.uniform(location, ty, data);
        true
    }

    /// Borrows a zeroed integer scratch buffer of exactly `len` elements.
    /// Hand it back with [`RenderContext::return_int_scratch`].
    pub(crate) fn take_int_scratch(&mut self, len: usize) -> Vec<i32> {
        let mut scratch = self.int_scratch.remove(&len).unwrap_or_default();
        scratch.clear();
        scratch.resize(len, 0);
        scratch
    }

    pub(crate) fn return_int_scratch(&mut self, scratch: Vec<i32>) {
        self.int_scratch.insert(scratch.len(), scratch);
    }

    // --- Deletion ---

    /// Deletes a program and drops its cached uniform values.
    pub fn delete_program(&mut self, program: ProgramHandle) {
        self.uniforms.retain(|(owner, _), _| *owner != program);
        if self.state.program == Some(program) {
            self.state.program = None;
        }
        self.backend.delete_program(program);
    }

    /// Deletes a buffer and forgets it if bound.
    pub fn delete_buffer(&mut self, buffer: BufferHandle) {
        if self.state.array_buffer == Some(buffer) {
            self.state.array_buffer = None;
        }
        self.backend.delete_buffer(buffer);
    }

    /// Deletes a vertex array and forgets it if bound.
    pub fn delete_vertex_array(&mut self, vao: VertexArrayHandle) {
        if self.state.vertex_array == Some(vao) {
            self.state.vertex_array = None;
        }
        self.backend.delete_vertex_array(vao);
    }

    /// Deletes a texture and clears every unit it was bound to.
    pub fn delete_texture(&mut self, texture: TextureHandle) {
        self.state.texture_units.retain(|_, bound| *bound != texture);
        self.backend.delete_texture(texture);
    }

    /// Deletes a framebuffer and falls back to the default surface if it was bound.
    pub fn delete_framebuffer(&mut self, framebuffer: FramebufferHandle) {
        if self.state.framebuffer == Some(framebuffer) {
            self.state.framebuffer = None;
        }
        self.backend.delete_framebuffer(framebuffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_infra::HeadlessBackend;

    fn context() -> RenderContext {
        RenderContext::new(Box::new(HeadlessBackend::new(64, 64)))
    }

    fn calls(ctx: &RenderContext, name: &str) -> usize {
        ctx.backend_as::<HeadlessBackend>()
            .map(|backend| backend.calls(name))
            .unwrap_or_default()
    }

    #[test]
    fn blend_func_reaches_the_backend_only_on_change() {
        let mut ctx = context();
        ctx.set_blend_func(BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha, None, None);
        ctx.set_blend_func(BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha, None, None);
        assert_eq!(calls(&ctx, "blend_func_separate"), 1);

        ctx.set_blend_func(BlendFactor::One, BlendFactor::One, None, None);
        assert_eq!(calls(&ctx, "blend_func_separate"), 2);
        assert_eq!(
            ctx.state().blend_func,
            BlendFunc::new(BlendFactor::One, BlendFactor::One)
        );
    }

    #[test]
    fn default_values_are_not_pushed() {
        let mut ctx = context();
        ctx.disable(Capability::Blend);
        ctx.set_depth_mask(true);
        ctx.set_front_face(FrontFace::Ccw);
        ctx.set_cull_face(Face::Back);
        ctx.set_depth_func(CompareFunction::Less);
        ctx.use_program(None);
        let backend = ctx.backend_as::<HeadlessBackend>();
        assert_eq!(backend.map(|b| b.total_calls()), Some(0));
    }

    #[test]
    fn toggles_follow_the_cache() {
        let mut ctx = context();
        ctx.enable(Capability::DepthTest);
        ctx.enable(Capability::DepthTest);
        ctx.disable(Capability::DepthTest);
        assert_eq!(calls(&ctx, "enable"), 1);
        assert_eq!(calls(&ctx, "disable"), 1);
        assert!(!ctx.state().is_enabled(Capability::DepthTest));
    }

    #[test]
    fn texture_binding_activates_the_unit_once() {
        let mut ctx = context();
        let handle = TextureHandle(7);
        ctx.bind_texture(2, TextureTarget::Texture2D, Some(handle));
        ctx.bind_texture(2, TextureTarget::Texture2D, Some(handle));
        assert_eq!(calls(&ctx, "active_texture"), 1);
        assert_eq!(calls(&ctx, "bind_texture"), 1);
        assert_eq!(ctx.state().bound_texture(2, TextureTarget::Texture2D), Some(handle));
    }

    #[test]
    fn element_buffer_bindings_are_not_cached() {
        let mut ctx = context();
        ctx.bind_buffer(BufferTarget::ElementArray, Some(BufferHandle(3)));
        ctx.bind_buffer(BufferTarget::ElementArray, Some(BufferHandle(3)));
        ctx.bind_buffer(BufferTarget::Array, Some(BufferHandle(4)));
        ctx.bind_buffer(BufferTarget::Array, Some(BufferHandle(4)));
        assert_eq!(calls(&ctx, "bind_buffer"), 3);
    }

    #[test]
    fn pixel_store_skips_unchanged_parameters() {
        let mut ctx = context();
        ctx.pixel_store(PixelStore::UnpackAlignment(4));
        ctx.pixel_store(PixelStore::FlipY(true));
        ctx.pixel_store(PixelStore::FlipY(true));
        assert_eq!(calls(&ctx, "pixel_store"), 1);
    }

    #[test]
    fn scratch_buffers_are_recycled_by_length() {
        let mut ctx = context();
        let mut scratch = ctx.take_int_scratch(3);
        scratch[0] = 5;
        ctx.return_int_scratch(scratch);
        let scratch = ctx.take_int_scratch(3);
        assert_eq!(scratch, vec![0, 0, 0]);
    }
}
