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

//! The frame driver: binds the target, clears, builds the draw list and
//! submits every draw through the state cache.

use crate::context::RenderContext;
use crate::mesh::Mesh;
use crate::program::{UniformValue, Uniforms};
use crate::render_list::{RenderList, RenderListOptions};
use crate::resources::{RenderTargetId, Resources};
use crate::settings::{RendererSettings, SettingsError};
use prism_core::math::{Mat3, Mat4};
use prism_core::renderer::{Capability, ClearFlags, GraphicsBackend, RenderError, ResourceError};
use prism_core::scene::{Camera, SceneGraph};

/// Per-call switches of [`Renderer::render`].
///
/// `None` fields fall back to the renderer's [`RendererSettings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Offscreen target, `None` for the default surface.
    pub target: Option<RenderTargetId>,
    /// Recompute world matrices before drawing.
    pub update: bool,
    /// Bucket and sort the draw list.
    pub sort: Option<bool>,
    /// Drop draws outside the camera frustum.
    pub frustum_cull: Option<bool>,
    /// Clear the target first.
    pub clear: Option<bool>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            target: None,
            update: true,
            sort: None,
            frustum_cull: None,
            clear: None,
        }
    }
}

impl RenderOptions {
    /// Renders into `target` instead of the default surface.
    pub fn with_target(target: RenderTargetId) -> Self {
        Self {
            target: Some(target),
            ..Default::default()
        }
    }
}

/// Counters of one [`Renderer::render`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Draw calls submitted.
    pub draw_calls: usize,
    /// Times the current program changed.
    pub program_switches: usize,
    /// Nodes rejected by the frustum test.
    pub culled: usize,
    /// Nodes in the draw list.
    pub visible: usize,
}

/// Uniform names the renderer fills in for every draw.
pub mod builtins {
    /// Node world matrix.
    pub const MODEL_MATRIX: &str = "modelMatrix";
    /// Camera view matrix.
    pub const VIEW_MATRIX: &str = "viewMatrix";
    /// View * model.
    pub const MODEL_VIEW_MATRIX: &str = "modelViewMatrix";
    /// Inverse-transpose of the model-view 3x3 block.
    pub const NORMAL_MATRIX: &str = "normalMatrix";
    /// Camera projection matrix.
    pub const PROJECTION_MATRIX: &str = "projectionMatrix";
    /// Camera world position.
    pub const CAMERA_POSITION: &str = "cameraPosition";
}

/// Draws scene graphs of [`Mesh`]es.
#[derive(Debug)]
pub struct Renderer {
    context: RenderContext,
    settings: RendererSettings,
    builtins: Uniforms,
}

impl Renderer {
    /// Wraps a backend and sizes the default surface.
    pub fn new(backend: Box<dyn GraphicsBackend>, settings: RendererSettings) -> Result<Self, SettingsError> {
        settings.validate()?;
        let mut context = RenderContext::new(backend);
        context.set_premultiplied_alpha(settings.premultiplied_alpha);
        let (width, height) = settings.drawing_buffer_size();
        context.set_viewport(0, 0, width, height);
        log::info!(
            "Renderer: {}x{} surface at {}x, webgl2 = {}",
            settings.width,
            settings.height,
            settings.dpr,
            context.capabilities().webgl2
        );
        Ok(Self {
            context,
            settings,
            builtins: Uniforms::new(),
        })
    }

    /// The state cache and backend.
    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    /// Mutable access to the state cache, for resource creation.
    pub fn context_mut(&mut self) -> &mut RenderContext {
        &mut self.context
    }

    /// The construction settings, with the current size.
    pub fn settings(&self) -> &RendererSettings {
        &self.settings
    }

    /// Resizes the default surface, in logical pixels.
    pub fn set_size(&mut self, width: u32, height: u32) {
        self.settings.width = width;
        self.settings.height = height;
        let (width, height) = self.settings.drawing_buffer_size();
        self.context.set_viewport(0, 0, width, height);
    }

    /// Sets the viewport directly, in device pixels.
    ///
    /// [`Renderer::render`] resets it to the full target.
    pub fn set_viewport(&mut self, width: u32, height: u32, x: i32, y: i32) {
        self.context.set_viewport(x, y, width, height);
    }

    /// Binds a render target, or the default surface for `None`.
    pub fn bind_framebuffer(
        &mut self,
        target: Option<RenderTargetId>,
        resources: &Resources,
    ) -> Result<(), RenderError> {
        match target {
            None => self.context.bind_framebuffer(None),
            Some(id) => resources
                .render_targets
                .get(id)
                .ok_or(ResourceError::NotFound)?
                .bind(&mut self.context),
        }
        Ok(())
    }

    /// Clears the bound target with the configured color and buffers.
    ///
    /// Depth writes are re-enabled first, otherwise the depth buffer would
    /// keep the last program's contents. Without [`RendererSettings::alpha`]
    /// the default surface is cleared opaque.
    pub fn clear(&mut self) {
        let flags = ClearFlags {
            color: true,
            depth: self.settings.depth,
            stencil: self.settings.stencil,
        };
        if flags.depth {
            self.context.enable(Capability::DepthTest);
            self.context.set_depth_mask(true);
        }
        let mut color = self.settings.clear_color;
        if !self.settings.alpha && self.context.state().framebuffer.is_none() {
            color.a = 1.0;
        }
        self.context.set_clear_color(color);
        self.context.clear(flags);
    }

    /// Builds the draw list for `scene`, refreshing the camera frustum when culling.
    pub fn get_render_list(
        &mut self,
        scene: &SceneGraph<Mesh>,
        camera: Option<&mut Camera>,
        resources: &Resources,
        options: RenderListOptions,
    ) -> RenderList {
        let camera = camera.map(|camera| {
            if options.frustum_cull {
                camera.update_frustum();
            }
            &*camera
        });
        RenderList::build(scene, camera, resources, options, self.context.warnings_mut())
    }

    /// Draws `scene` as seen by `camera`.
    ///
    /// Without a camera only `modelMatrix` is supplied, nothing is culled and
    /// draws are not depth sorted.
    pub fn render(
        &mut self,
        scene: &mut SceneGraph<Mesh>,
        mut camera: Option<&mut Camera>,
        resources: &mut Resources,
        options: RenderOptions,
    ) -> Result<FrameStats, RenderError> {
        match options.target {
            None => {
                self.context.bind_framebuffer(None);
                let (width, height) = self.settings.drawing_buffer_size();
                self.context.set_viewport(0, 0, width, height);
            }
            Some(id) => {
                let target = resources
                    .render_targets
                    .get(id)
                    .ok_or(ResourceError::NotFound)?;
                target.bind(&mut self.context);
                self.context.set_viewport(0, 0, target.width(), target.height());
            }
        }

        if options.clear.unwrap_or(self.settings.auto_clear) {
            self.clear();
        }

        if options.update {
            scene.update_all(false);
        }
        if let Some(camera) = camera.as_deref_mut() {
            let parent_world = camera
                .parent
                .and_then(|parent| scene.get(parent))
                .map(|node| node.transform.world_matrix);
            camera.update_matrix_world(parent_world.as_ref());
        }

        let list = self.get_render_list(
            scene,
            camera.as_deref_mut(),
            resources,
            RenderListOptions {
                frustum_cull: options.frustum_cull.unwrap_or(self.settings.frustum_cull),
                sort: options.sort.unwrap_or(self.settings.sort),
            },
        );
        let camera = camera.as_deref();

        let mut stats = FrameStats {
            culled: list.culled,
            visible: list.len(),
            ..Default::default()
        };
        let Resources {
            programs,
            geometries,
            textures,
            ..
        } = resources;

        for item in list.iter() {
            let Some(node) = scene.get(item.node) else { continue };
            let Some(mesh) = node.payload.as_ref() else { continue };
            let (Some(program), Some(geometry)) =
                (programs.get(mesh.program), geometries.get_mut(mesh.geometry))
            else {
                continue;
            };

            let world = node.transform.world_matrix;
            fill_builtins(&mut self.builtins, &world, camera);

            let flip_faces = program.state().cull_face.is_some() && world.determinant() < 0.0;
            if program.use_program(&mut self.context, textures, &[&self.builtins, &mesh.uniforms], flip_faces) {
                stats.program_switches += 1;
            }
            geometry.draw(&mut self.context, program, mesh.mode)?;
            stats.draw_calls += 1;
        }

        log::debug!(
            "Renderer: {} draws, {} program switches, {} culled",
            stats.draw_calls,
            stats.program_switches,
            stats.culled
        );
        Ok(stats)
    }
}

fn fill_builtins(values: &mut Uniforms, world: &Mat4, camera: Option<&Camera>) {
    set_builtin(values, builtins::MODEL_MATRIX, UniformValue::Mat4(*world));
    let Some(camera) = camera else { return };

    let model_view = camera.view_matrix * *world;
    let normal = Mat3::normal_matrix(&model_view).unwrap_or(Mat3::IDENTITY);
    set_builtin(values, builtins::VIEW_MATRIX, UniformValue::Mat4(camera.view_matrix));
    set_builtin(values, builtins::MODEL_VIEW_MATRIX, UniformValue::Mat4(model_view));
    set_builtin(values, builtins::NORMAL_MATRIX, UniformValue::Mat3(normal));
    set_builtin(
        values,
        builtins::PROJECTION_MATRIX,
        UniformValue::Mat4(camera.projection_matrix),
    );
    set_builtin(
        values,
        builtins::CAMERA_POSITION,
        UniformValue::Vec3(camera.world_position()),
    );
}

// Keys are allocated on first use, later frames overwrite in place.
fn set_builtin(values: &mut Uniforms, name: &str, value: UniformValue) {
    match values.get_mut(name) {
        Some(slot) => *slot = value,
        None => {
            values.insert(name.to_string(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Attribute, GeometryDescriptor, POSITION_ATTRIBUTE};
    use crate::program::ProgramDescriptor;
    use crate::render_target::RenderTargetDescriptor;
    use crate::resources::{GeometryId, ProgramId};
    use prism_core::math::{Color, Vec3};
    use prism_core::renderer::FrontFace;
    use prism_core::Transform;
    use prism_infra::graphics::headless::UniformRecord;
    use prism_infra::HeadlessBackend;

    const VERTEX: &str = "
        attribute vec3 position;
        uniform mat4 modelMatrix;
        uniform mat4 viewMatrix;
        uniform mat4 modelViewMatrix;
        uniform mat3 normalMatrix;
        uniform mat4 projectionMatrix;
        uniform vec3 cameraPosition;
        void main() { gl_Position = projectionMatrix * modelViewMatrix * vec4(position, 1.0); }
    ";
    const FRAGMENT: &str = "void main() { gl_FragColor = vec4(1.0); }";

    fn setup(settings: RendererSettings) -> (Renderer, Resources, ProgramId, GeometryId) {
        let mut renderer = Renderer::new(Box::new(HeadlessBackend::new(1, 1)), settings).unwrap();
        let mut resources = Resources::new();
        let ctx = renderer.context_mut();
        let program = resources
            .create_program(ctx, ProgramDescriptor::new(VERTEX, FRAGMENT))
            .unwrap();
        let geometry = resources
            .create_geometry(
                ctx,
                GeometryDescriptor::new().attribute(
                    POSITION_ATTRIBUTE,
                    Attribute::new(vec![-1.0f32, -1.0, 0.0, 1.0, -1.0, 0.0, 0.0, 1.0, 0.0], 3),
                ),
            )
            .unwrap();
        (renderer, resources, program, geometry)
    }

    fn camera() -> Camera {
        let mut camera = Camera::perspective(45.0, 1.0, 0.1, 100.0);
        camera.transform.position = Vec3::new(0.0, 0.0, 5.0);
        camera
    }

    fn headless(renderer: &Renderer) -> &HeadlessBackend {
        renderer.context().backend_as::<HeadlessBackend>().unwrap()
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let settings = RendererSettings {
            dpr: 0.0,
            ..Default::default()
        };
        assert!(Renderer::new(Box::new(HeadlessBackend::new(1, 1)), settings).is_err());
    }

    #[test]
    fn viewport_uses_device_pixels() {
        let settings = RendererSettings {
            width: 100,
            height: 50,
            dpr: 2.0,
            ..Default::default()
        };
        let (mut renderer, mut resources, _, _) = setup(settings);
        let mut scene = SceneGraph::new();
        renderer
            .render(&mut scene, None, &mut resources, RenderOptions::default())
            .unwrap();
        assert_eq!(headless(&renderer).state().viewport, (0, 0, 200, 100));

        renderer.set_size(10, 10);
        assert_eq!(headless(&renderer).state().viewport, (0, 0, 20, 20));
    }

    #[test]
    fn builtins_are_uploaded_per_draw() {
        let (mut renderer, mut resources, program, geometry) = setup(RendererSettings::default());
        let mut scene = SceneGraph::new();
        scene.insert(
            Transform::from_position(Vec3::new(1.0, 2.0, 0.0)),
            Some(Mesh::new(geometry, program)),
        );
        let mut camera = camera();
        let stats = renderer
            .render(&mut scene, Some(&mut camera), &mut resources, RenderOptions::default())
            .unwrap();
        assert_eq!(stats.draw_calls, 1);
        assert_eq!(stats.program_switches, 1);

        let program = resources.programs.get(program).unwrap();
        let backend = headless(&renderer);
        let location = program.uniform_descriptor("cameraPosition").unwrap().location;
        assert_eq!(
            backend.uniform_value(program.handle(), location),
            Some(&UniformRecord::Floats(vec![0.0, 0.0, 5.0]))
        );
        let location = program.uniform_descriptor("modelMatrix").unwrap().location;
        match backend.uniform_value(program.handle(), location) {
            Some(UniformRecord::Floats(values)) => assert_eq!(&values[12..15], &[1.0, 2.0, 0.0]),
            other => panic!("unexpected modelMatrix upload: {other:?}"),
        }
    }

    #[test]
    fn mirrored_nodes_flip_the_front_face() {
        let (mut renderer, mut resources, program, geometry) = setup(RendererSettings::default());
        let mut scene = SceneGraph::new();
        let mut mirrored = Transform::new();
        mirrored.scale = Vec3::new(-1.0, 1.0, 1.0);
        scene.insert(mirrored, Some(Mesh::new(geometry, program)));
        let mut camera = camera();
        renderer
            .render(&mut scene, Some(&mut camera), &mut resources, RenderOptions::default())
            .unwrap();
        assert_eq!(headless(&renderer).draws()[0].front_face, FrontFace::Cw);
    }

    #[test]
    fn auto_clear_follows_settings_and_options() {
        let settings = RendererSettings {
            clear_color: Color::new(1.0, 0.0, 0.0, 1.0),
            ..Default::default()
        };
        let (mut renderer, mut resources, _, _) = setup(settings);
        let mut scene = SceneGraph::new();
        renderer
            .render(&mut scene, None, &mut resources, RenderOptions::default())
            .unwrap();
        let no_clear = RenderOptions {
            clear: Some(false),
            ..Default::default()
        };
        renderer.render(&mut scene, None, &mut resources, no_clear).unwrap();

        let backend = headless(&renderer);
        assert_eq!(backend.clears().len(), 1);
        let (_, flags, color) = backend.clears()[0];
        assert!(flags.color && flags.depth && !flags.stencil);
        assert_eq!(color, Color::new(1.0, 0.0, 0.0, 1.0));
        assert!(backend.state().depth_mask);
    }

    #[test]
    fn surface_without_alpha_is_cleared_opaque() {
        let clear_color = Color::new(0.0, 0.0, 1.0, 0.25);
        let opaque = RendererSettings {
            clear_color,
            ..Default::default()
        };
        let (mut renderer, mut resources, _, _) = setup(opaque);
        let target = resources
            .create_render_target(renderer.context_mut(), RenderTargetDescriptor::new(8, 8))
            .unwrap();
        let mut scene = SceneGraph::new();
        renderer
            .render(&mut scene, None, &mut resources, RenderOptions::default())
            .unwrap();
        renderer
            .render(&mut scene, None, &mut resources, RenderOptions::with_target(target))
            .unwrap();
        let clears = headless(&renderer).clears();
        assert_eq!(clears[0].2, Color::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(clears[1].2, clear_color);

        let translucent = RendererSettings {
            alpha: true,
            clear_color,
            ..Default::default()
        };
        let (mut renderer, mut resources, _, _) = setup(translucent);
        renderer
            .render(&mut scene, None, &mut resources, RenderOptions::default())
            .unwrap();
        assert_eq!(headless(&renderer).clears()[0].2, clear_color);
    }

    #[test]
    fn render_targets_set_their_own_viewport() {
        let (mut renderer, mut resources, program, geometry) = setup(RendererSettings::default());
        let target = resources
            .create_render_target(renderer.context_mut(), RenderTargetDescriptor::new(64, 32))
            .unwrap();
        let mut scene = SceneGraph::new();
        scene.insert(Transform::new(), Some(Mesh::new(geometry, program)));
        let mut camera = camera();
        renderer
            .render(&mut scene, Some(&mut camera), &mut resources, RenderOptions::with_target(target))
            .unwrap();

        let framebuffer = resources.render_targets.get(target).unwrap().framebuffer();
        let backend = headless(&renderer);
        assert_eq!(backend.state().viewport, (0, 0, 64, 32));
        assert_eq!(backend.draws()[0].framebuffer, Some(framebuffer));
    }

    #[test]
    fn unknown_targets_are_errors() {
        let (mut renderer, mut resources, _, _) = setup(RendererSettings::default());
        let target = resources
            .create_render_target(renderer.context_mut(), RenderTargetDescriptor::new(4, 4))
            .unwrap();
        resources.remove_render_target(renderer.context_mut(), target);
        let mut scene = SceneGraph::new();
        let result = renderer.render(&mut scene, None, &mut resources, RenderOptions::with_target(target));
        assert_eq!(result, Err(RenderError::ResourceError(ResourceError::NotFound)));
    }
}
