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

//! Linked shader programs.
//!
//! A [`Program`] is compiled and reflected once. Each active uniform becomes a
//! [`UniformDescriptor`] at link time, so drawing only walks a flat list and
//! looks values up by base name.

mod state;
mod uniforms;

pub use self::state::RenderState;
pub use self::uniforms::{UniformDescriptor, UniformKind, UniformValue, Uniforms};

use self::uniforms::Components;
use crate::context::RenderContext;
use crate::resources::{Store, TextureId};
use crate::texture::Texture;
use prism_core::renderer::{
    ActiveAttribute, GlslType, ProgramHandle, ResourceError, ShaderError, ShaderHandle,
    ShaderStage, UniformData,
};
use thiserror::Error;

/// Errors raised while building or feeding a [`Program`].
#[derive(Debug, Error)]
pub enum ProgramError {
    /// Compilation or linking failed.
    #[error(transparent)]
    Shader(#[from] ShaderError),
    /// A texture referenced by a sampler could not be prepared.
    #[error(transparent)]
    Resource(#[from] ResourceError),
    /// The supplied value does not fit the declared type.
    #[error("uniform '{name}' of type {ty:?} cannot take a {value} value")]
    UniformType {
        /// Reflected uniform name.
        name: String,
        /// Declared type.
        ty: GlslType,
        /// Kind of the supplied value.
        value: &'static str,
    },
}

/// Sources, initial uniform values and render state of a program.
#[derive(Debug, Clone, Default)]
pub struct ProgramDescriptor {
    /// Vertex shader source.
    pub vertex: String,
    /// Fragment shader source.
    pub fragment: String,
    /// Initial uniform values.
    pub uniforms: Uniforms,
    /// Fixed-function state.
    pub state: RenderState,
}

impl ProgramDescriptor {
    /// A descriptor with default state and no uniform values.
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
            ..Default::default()
        }
    }

    /// Adds an initial uniform value.
    pub fn with_uniform(mut self, name: impl Into<String>, value: impl Into<UniformValue>) -> Self {
        self.uniforms.insert(name.into(), value.into());
        self
    }

    /// Replaces the render state.
    pub fn with_state(mut self, state: RenderState) -> Self {
        self.state = state;
        self
    }
}

/// A linked vertex/fragment pair with its reflected interface.
#[derive(Debug)]
pub struct Program {
    handle: ProgramHandle,
    state: RenderState,
    /// Values looked up after per-draw overrides.
    pub uniforms: Uniforms,
    descriptors: Vec<UniformDescriptor>,
    attributes: Vec<ActiveAttribute>,
    attribute_order: String,
}

impl Program {
    /// Compiles, links and reflects a program.
    ///
    /// Failures are logged with the offending source, line-numbered, and returned.
    pub fn new(ctx: &mut RenderContext, descriptor: ProgramDescriptor) -> Result<Self, ProgramError> {
        let ProgramDescriptor {
            vertex,
            fragment,
            uniforms,
            mut state,
        } = descriptor;

        for (stage, source) in [(ShaderStage::Vertex, &vertex), (ShaderStage::Fragment, &fragment)] {
            if source.trim().is_empty() {
                let err = ShaderError::MissingSource { stage };
                log::error!("Program: {err}");
                return Err(err.into());
            }
        }

        let vertex_shader = compile(ctx, ShaderStage::Vertex, &vertex)?;
        let fragment_shader = match compile(ctx, ShaderStage::Fragment, &fragment) {
            Ok(shader) => shader,
            Err(err) => {
                ctx.backend_mut().delete_shader(vertex_shader);
                return Err(err);
            }
        };
        let linked = ctx.backend_mut().link_program(vertex_shader, fragment_shader);
        ctx.backend_mut().delete_shader(vertex_shader);
        ctx.backend_mut().delete_shader(fragment_shader);
        let handle = linked.map_err(|err| {
            log::error!("Program: {err}");
            ProgramError::from(err)
        })?;

        let descriptors: Vec<UniformDescriptor> = ctx
            .backend()
            .active_uniforms(handle)
            .iter()
            .map(UniformDescriptor::from_active)
            .collect();
        let mut attributes = ctx.backend().active_attributes(handle);
        attributes.sort_by(|a, b| a.location.cmp(&b.location).then_with(|| a.name.cmp(&b.name)));
        let attribute_order = attributes
            .iter()
            .map(|attribute| format!("{}:{}", attribute.name, attribute.location))
            .collect::<Vec<_>>()
            .join(",");

        state.resolve_blending(ctx.premultiplied_alpha());

        log::debug!(
            "Program: linked {:?} with {} uniforms, attributes [{}]",
            handle,
            descriptors.len(),
            attribute_order
        );

        Ok(Self {
            handle,
            state,
            uniforms,
            descriptors,
            attributes,
            attribute_order,
        })
    }

    /// The backend program.
    pub fn handle(&self) -> ProgramHandle {
        self.handle
    }

    /// The render state applied on every use.
    pub fn state(&self) -> &RenderState {
        &self.state
    }

    /// Sorted into the transparent or ui bucket.
    pub fn is_transparent(&self) -> bool {
        self.state.transparent
    }

    /// Depth testing enabled.
    pub fn depth_test(&self) -> bool {
        self.state.depth_test
    }

    /// Active uniforms in reflection order.
    pub fn uniform_descriptors(&self) -> &[UniformDescriptor] {
        &self.descriptors
    }

    /// The descriptor whose reflected name is `name`.
    pub fn uniform_descriptor(&self, name: &str) -> Option<&UniformDescriptor> {
        self.descriptors.iter().find(|d| d.name == name)
    }

    /// Active attributes sorted by location.
    pub fn attributes(&self) -> &[ActiveAttribute] {
        &self.attributes
    }

    /// Location of the attribute `name`.
    pub fn attribute_location(&self, name: &str) -> Option<u32> {
        self.attributes
            .iter()
            .find(|attribute| attribute.name == name)
            .map(|attribute| attribute.location)
    }

    /// `name:location` pairs of the active attributes. Programs with equal
    /// signatures can share vertex arrays.
    pub fn attribute_order(&self) -> &str {
        &self.attribute_order
    }

    /// Sets an initial uniform value.
    pub fn set_uniform(&mut self, name: impl Into<String>, value: impl Into<UniformValue>) {
        self.uniforms.insert(name.into(), value.into());
    }

    /// Makes the program current, pushes its uniforms and applies its state.
    ///
    /// `overrides` are searched before the program's own values. Texture
    /// uniforms are uploaded if needed and bound to consecutive units from 0.
    /// Returns `true` if the current program changed.
    pub fn use_program(
        &self,
        ctx: &mut RenderContext,
        textures: &mut Store<TextureId, Texture>,
        overrides: &[&Uniforms],
        flip_faces: bool,
    ) -> bool {
        let switched = ctx.use_program(Some(self.handle));
        let mut next_unit = 0;

        for descriptor in &self.descriptors {
            let sources = overrides.iter().copied().chain(std::iter::once(&self.uniforms));
            let Some(value) = descriptor.resolve(sources) else {
                ctx.warn(format_args!(
                    "Program: active uniform {} has not been supplied",
                    descriptor.name
                ));
                continue;
            };
            if let Err(err) = self.upload(ctx, textures, descriptor, value, &mut next_unit) {
                ctx.warn(format_args!("Program: {err}"));
            }
        }

        self.state.apply(ctx, flip_faces);
        switched
    }

    fn upload(
        &self,
        ctx: &mut RenderContext,
        textures: &mut Store<TextureId, Texture>,
        descriptor: &UniformDescriptor,
        value: &UniformValue,
        next_unit: &mut u32,
    ) -> Result<(), ProgramError> {
        let mismatch = || ProgramError::UniformType {
            name: descriptor.name.clone(),
            ty: descriptor.ty,
            value: value.kind_name(),
        };

        if descriptor.ty.is_sampler() {
            let ids = match value {
                UniformValue::Texture(id) => std::slice::from_ref(id),
                UniformValue::Textures(ids) => ids.as_slice(),
                _ => return Err(mismatch()),
            };
            let ids = &ids[..ids.len().min(descriptor.size as usize)];
            let mut units = ctx.take_int_scratch(ids.len());
            let mut result = Ok(());
            for (slot, id) in units.iter_mut().zip(ids) {
                let unit = *next_unit;
                *next_unit += 1;
                *slot = unit as i32;
                match textures.get_mut(*id) {
                    Some(texture) => {
                        if let Err(err) = texture.update(ctx, unit) {
                            result = Err(err.into());
                        }
                    }
                    None => {
                        ctx.warn(format_args!(
                            "Program: uniform {} references missing texture {:?}",
                            descriptor.name, id
                        ));
                    }
                }
            }
            ctx.set_uniform(self.handle, descriptor.location, descriptor.ty, UniformData::Ints(&units));
            ctx.return_int_scratch(units);
            return result;
        }

        let components = descriptor.ty.components() as usize;
        let size = descriptor.size as usize;
        let data = match (value.components(), descriptor.ty.is_integer()) {
            (Some(Components::Floats(values)), false) => {
                UniformData::Floats(fit(values, components, size).ok_or_else(mismatch)?)
            }
            (Some(Components::Ints(values)), true) => {
                UniformData::Ints(fit(values, components, size).ok_or_else(mismatch)?)
            }
            (Some(Components::Int(value)), true) if components == 1 => {
                ctx.set_uniform(
                    self.handle,
                    descriptor.location,
                    descriptor.ty,
                    UniformData::Ints(&[value]),
                );
                return Ok(());
            }
            _ => return Err(mismatch()),
        };
        ctx.set_uniform(self.handle, descriptor.location, descriptor.ty, data);
        Ok(())
    }

    /// Deletes the GPU program.
    pub fn remove(self, ctx: &mut RenderContext) {
        log::debug!("Program: deleting {:?}", self.handle);
        ctx.delete_program(self.handle);
    }
}

/// Trims `values` to whole elements of `components`, at most `size` of them.
/// `None` if not even one element is present.
fn fit<T>(values: &[T], components: usize, size: usize) -> Option<&[T]> {
    if components == 0 || values.len() < components {
        return None;
    }
    let usable = values.len().min(components * size);
    Some(&values[..usable - usable % components])
}

fn compile(ctx: &mut RenderContext, stage: ShaderStage, source: &str) -> Result<ShaderHandle, ProgramError> {
    ctx.backend_mut()
        .compile_shader(stage, source)
        .map_err(|err| {
            let err = match err {
                ShaderError::CompilationError { stage, details } => ShaderError::CompilationError {
                    stage,
                    details: format!("{details}\n{}", number_lines(source)),
                },
                other => other,
            };
            log::error!("Program: {err}");
            err.into()
        })
}

/// Prefixes every line with its 1-based number, as compile logs refer to them.
pub fn number_lines(source: &str) -> String {
    source
        .lines()
        .enumerate()
        .map(|(index, line)| format!("{}: {line}", index + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_core::math::{Color, Vec3};
    use prism_core::renderer::{Capability, FrontFace};
    use prism_infra::graphics::headless::UniformRecord;
    use prism_infra::HeadlessBackend;

    const VERTEX: &str = "
        attribute vec3 position;
        attribute vec2 uv;
        uniform mat4 modelViewMatrix;
        uniform mat4 projectionMatrix;
        void main() {
            gl_Position = projectionMatrix * modelViewMatrix * vec4(position, 1.0);
        }
    ";

    const FRAGMENT: &str = "
        precision highp float;
        struct Light { vec3 color; float intensity; };
        uniform Light lights[2];
        uniform vec3 tint;
        uniform bool enabled;
        void main() { gl_FragColor = vec4(tint, 1.0); }
    ";

    fn context() -> RenderContext {
        RenderContext::new(Box::new(HeadlessBackend::new(32, 32)))
    }

    fn headless(ctx: &RenderContext) -> &HeadlessBackend {
        ctx.backend_as::<HeadlessBackend>().unwrap()
    }

    fn light(color: Vec3, intensity: f32) -> Uniforms {
        let mut fields = Uniforms::new();
        fields.insert("color".into(), color.into());
        fields.insert("intensity".into(), intensity.into());
        fields
    }

    #[test]
    fn reflects_struct_arrays_and_attribute_order() {
        let mut ctx = context();
        let program = Program::new(&mut ctx, ProgramDescriptor::new(VERTEX, FRAGMENT)).unwrap();
        assert!(program.uniform_descriptor("lights[1].intensity").is_some());
        assert_eq!(program.attribute_order(), "position:0,uv:1");
        assert_eq!(program.attribute_location("uv"), Some(1));
    }

    #[test]
    fn missing_source_is_rejected() {
        let mut ctx = context();
        let err = Program::new(&mut ctx, ProgramDescriptor::new(VERTEX, "  ")).unwrap_err();
        assert!(matches!(
            err,
            ProgramError::Shader(ShaderError::MissingSource {
                stage: ShaderStage::Fragment
            })
        ));
    }

    #[test]
    fn compile_errors_carry_numbered_source() {
        let mut ctx = context();
        let err = Program::new(&mut ctx, ProgramDescriptor::new("uniform float a;", FRAGMENT))
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("1: uniform float a;"), "{message}");
        assert_eq!(headless(&ctx).program_count(), 0);
    }

    #[test]
    fn uploads_only_changed_values() {
        let mut ctx = context();
        let mut textures = Store::new();
        let descriptor = ProgramDescriptor::new(VERTEX, FRAGMENT)
            .with_uniform("tint", Color::rgb(1.0, 0.5, 0.25))
            .with_uniform("enabled", true)
            .with_uniform("modelViewMatrix", prism_core::math::Mat4::IDENTITY)
            .with_uniform("projectionMatrix", prism_core::math::Mat4::IDENTITY)
            .with_uniform(
                "lights",
                UniformValue::StructArray(vec![light(Vec3::X, 1.0), light(Vec3::Y, 0.5)]),
            );
        let mut program = Program::new(&mut ctx, descriptor).unwrap();

        assert!(program.use_program(&mut ctx, &mut textures, &[], false));
        let first = headless(&ctx).calls("uniform");
        assert_eq!(first, program.uniform_descriptors().len());

        assert!(!program.use_program(&mut ctx, &mut textures, &[], false));
        assert_eq!(headless(&ctx).calls("uniform"), first);

        program.set_uniform("tint", Vec3::ONE);
        program.use_program(&mut ctx, &mut textures, &[], false);
        assert_eq!(headless(&ctx).calls("uniform"), first + 1);

        let tint = program.uniform_descriptor("tint").unwrap().location;
        assert_eq!(
            headless(&ctx).uniform_value(program.handle(), tint),
            Some(&UniformRecord::Floats(vec![1.0, 1.0, 1.0]))
        );
        let intensity = program.uniform_descriptor("lights[1].intensity").unwrap().location;
        assert_eq!(
            headless(&ctx).uniform_value(program.handle(), intensity),
            Some(&UniformRecord::Floats(vec![0.5]))
        );
    }

    #[test]
    fn unsupplied_uniforms_are_reported_and_skipped() {
        let mut ctx = context();
        let mut textures = Store::new();
        let program = Program::new(&mut ctx, ProgramDescriptor::new(VERTEX, FRAGMENT)).unwrap();
        program.use_program(&mut ctx, &mut textures, &[], false);
        assert_eq!(headless(&ctx).calls("uniform"), 0);
        assert_eq!(ctx.warnings().emitted(), program.uniform_descriptors().len());
    }

    #[test]
    fn overrides_win_and_mismatches_are_skipped() {
        let mut ctx = context();
        let mut textures = Store::new();
        let program = Program::new(
            &mut ctx,
            ProgramDescriptor::new(VERTEX, FRAGMENT).with_uniform("tint", Vec3::ZERO),
        )
        .unwrap();
        let mut overrides = Uniforms::new();
        overrides.insert("tint".into(), Vec3::Y.into());
        overrides.insert("enabled".into(), 1.0f32.into());
        program.use_program(&mut ctx, &mut textures, &[&overrides], false);

        let tint = program.uniform_descriptor("tint").unwrap().location;
        let enabled = program.uniform_descriptor("enabled").unwrap().location;
        let backend = headless(&ctx);
        assert_eq!(
            backend.uniform_value(program.handle(), tint),
            Some(&UniformRecord::Floats(vec![0.0, 1.0, 0.0]))
        );
        assert_eq!(backend.uniform_value(program.handle(), enabled), None);
    }

    #[test]
    fn flipped_faces_invert_the_winding() {
        let mut ctx = context();
        let mut textures = Store::new();
        let program = Program::new(&mut ctx, ProgramDescriptor::new(VERTEX, FRAGMENT)).unwrap();
        program.use_program(&mut ctx, &mut textures, &[], true);
        assert_eq!(headless(&ctx).state().front_face, FrontFace::Cw);
        assert!(headless(&ctx).state().is_enabled(Capability::CullFace));
        program.use_program(&mut ctx, &mut textures, &[], false);
        assert_eq!(headless(&ctx).state().front_face, FrontFace::Ccw);
    }

    #[test]
    fn fit_trims_to_whole_elements() {
        assert_eq!(fit(&[1.0, 2.0, 3.0, 4.0], 3, 1), Some(&[1.0, 2.0, 3.0][..]));
        assert_eq!(fit(&[1.0, 2.0], 3, 1), None);
        assert_eq!(fit(&[1, 2, 3, 4, 5], 2, 4), Some(&[1, 2, 3, 4][..]));
    }
}
