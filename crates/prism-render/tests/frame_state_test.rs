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

//! Integration tests for the state cache across whole frames.
//!
//! Frames are rendered on the headless backend, whose call counters and
//! simulated GL state are compared with what the renderer believes.

use prism_core::math::Vec3;
use prism_core::renderer::BlendFactor;
use prism_core::{Camera, SceneGraph, Transform};
use prism_infra::HeadlessBackend;
use prism_render::{
    Attribute, GeometryDescriptor, GeometryId, Mesh, ProgramDescriptor, ProgramId, RenderOptions,
    RenderState, Renderer, RendererSettings, Resources,
};

const VERTEX: &str = "
    attribute vec3 position;
    uniform mat4 modelViewMatrix;
    uniform mat4 projectionMatrix;
    void main() { gl_Position = projectionMatrix * modelViewMatrix * vec4(position, 1.0); }
";
const FRAGMENT: &str = "
    precision mediump float;
    uniform vec3 tint;
    void main() { gl_FragColor = vec4(tint, 1.0); }
";

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

struct Frame {
    renderer: Renderer,
    resources: Resources,
    scene: SceneGraph<Mesh>,
    camera: Camera,
    geometry: GeometryId,
}

impl Frame {
    fn new() -> Self {
        init_logging();
        let mut renderer =
            Renderer::new(Box::new(HeadlessBackend::new(1, 1)), RendererSettings::default()).unwrap();
        let mut resources = Resources::new();
        let geometry = resources
            .create_geometry(
                renderer.context_mut(),
                GeometryDescriptor::new().attribute(
                    "position",
                    Attribute::new(vec![-1.0f32, -1.0, 0.0, 1.0, -1.0, 0.0, 0.0, 1.0, 0.0], 3),
                ),
            )
            .unwrap();
        let mut camera = Camera::perspective(45.0, 2.0, 0.1, 100.0);
        camera.transform.position = Vec3::new(0.0, 0.0, 10.0);
        Self {
            renderer,
            resources,
            scene: SceneGraph::new(),
            camera,
            geometry,
        }
    }

    fn program(&mut self, state: RenderState) -> ProgramId {
        self.resources
            .create_program(
                self.renderer.context_mut(),
                ProgramDescriptor::new(VERTEX, FRAGMENT)
                    .with_uniform("tint", Vec3::new(1.0, 0.5, 0.0))
                    .with_state(state),
            )
            .unwrap()
    }

    fn add(&mut self, program: ProgramId, x: f32) {
        self.scene.insert(
            Transform::from_position(Vec3::new(x, 0.0, 0.0)),
            Some(Mesh::new(self.geometry, program)),
        );
    }

    fn render(&mut self) -> prism_render::FrameStats {
        self.renderer
            .render(
                &mut self.scene,
                Some(&mut self.camera),
                &mut self.resources,
                RenderOptions::default(),
            )
            .unwrap()
    }

    fn backend(&self) -> &HeadlessBackend {
        self.renderer.context().backend_as::<HeadlessBackend>().unwrap()
    }

    fn reset_counters(&mut self) {
        self.renderer
            .context_mut()
            .backend_as_mut::<HeadlessBackend>()
            .unwrap()
            .reset_counters();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Redundant state elimination
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_identical_frame_issues_no_state_changes() {
    let mut frame = Frame::new();
    let program = frame.program(RenderState::default());
    frame.add(program, 0.0);
    frame.render();
    frame.reset_counters();

    let stats = frame.render();
    let backend = frame.backend();
    assert_eq!(stats.draw_calls, 1);
    assert_eq!(stats.program_switches, 0, "program should still be current");
    for entry_point in [
        "use_program",
        "enable",
        "disable",
        "blend_func_separate",
        "cull_face",
        "front_face",
        "depth_func",
        "depth_mask",
        "viewport",
        "clear_color",
        "bind_framebuffer",
        "bind_vertex_array",
        "uniform",
    ] {
        assert_eq!(backend.calls(entry_point), 0, "{entry_point} was called again");
    }
    assert_eq!(backend.calls("clear"), 1);
    assert_eq!(backend.draws().len(), 1);
}

#[test]
fn test_only_changed_uniforms_are_uploaded() {
    let mut frame = Frame::new();
    let program = frame.program(RenderState::default());
    frame.add(program, 0.0);
    frame.render();
    frame.reset_counters();

    frame.camera.transform.position = Vec3::new(0.0, 0.0, 12.0);
    frame.render();
    // modelViewMatrix changed, projectionMatrix and tint did not.
    assert_eq!(frame.backend().calls("uniform"), 1);
}

#[test]
fn test_cache_matches_backend_state_after_mixed_frame() {
    let mut frame = Frame::new();
    let opaque = frame.program(RenderState::default());
    let blended = frame.program(RenderState {
        transparent: true,
        depth_write: false,
        cull_face: None,
        ..Default::default()
    });
    frame.add(opaque, -1.0);
    frame.add(blended, 0.0);
    frame.add(opaque, 1.0);
    frame.render();

    let cache = frame.renderer.context().state();
    let actual = frame.backend().state();
    assert_eq!(cache.enabled, actual.enabled);
    assert_eq!(
        (
            cache.blend_func.src,
            cache.blend_func.dst,
            cache.blend_func.src_alpha,
            cache.blend_func.dst_alpha
        ),
        actual.blend_func
    );
    assert_eq!(actual.blend_func.0, BlendFactor::SrcAlpha);
    assert_eq!(cache.cull_face, actual.cull_face);
    assert_eq!(cache.front_face, actual.front_face);
    assert_eq!(cache.depth_mask, actual.depth_mask);
    assert!(!actual.depth_mask, "transparent pass disables depth writes");
    assert_eq!(cache.depth_func, actual.depth_func);
    assert_eq!(cache.viewport, Some(actual.viewport));
    assert_eq!(cache.program, actual.program);
    assert_eq!(cache.vertex_array, actual.vertex_array);
    assert_eq!(cache.framebuffer, actual.framebuffer);
}

#[test]
fn test_sorting_groups_draws_by_program() {
    let mut frame = Frame::new();
    let a = frame.program(RenderState::default());
    let b = frame.program(RenderState::default());
    for (index, program) in [a, b, a, b].into_iter().enumerate() {
        frame.add(program, index as f32 - 1.5);
    }

    let stats = frame.render();
    assert_eq!(stats.draw_calls, 4);
    assert_eq!(stats.program_switches, 2);

    frame.reset_counters();
    let unsorted = RenderOptions {
        sort: Some(false),
        ..Default::default()
    };
    let stats = frame
        .renderer
        .render(&mut frame.scene, Some(&mut frame.camera), &mut frame.resources, unsorted)
        .unwrap();
    assert_eq!(stats.program_switches, 4);
}

#[test]
fn test_unsupplied_uniform_warnings_are_rate_limited() {
    let mut frame = Frame::new();
    let program = frame
        .resources
        .create_program(
            frame.renderer.context_mut(),
            ProgramDescriptor::new(VERTEX, FRAGMENT),
        )
        .unwrap();
    frame.add(program, 0.0);
    for _ in 0..150 {
        frame.render();
    }
    let warnings = frame.renderer.context().warnings();
    assert!(warnings.is_exhausted());
    assert_eq!(warnings.emitted(), prism_render::context::DEFAULT_WARNING_LIMIT);
}
