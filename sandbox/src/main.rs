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

// Prism Sandbox
// Renders an orbiting scene offscreen and composites it on the default surface,
// all on the headless backend.

use anyhow::{Context, Result};
use prism_core::math::{Quaternion, Vec3, DEG_TO_RAD};
use prism_core::{Camera, SceneGraph, Transform};
use prism_infra::HeadlessBackend;
use prism_render::{
    Attribute, GeometryDescriptor, Mesh, ProgramDescriptor, RenderOptions, RenderState,
    RenderTargetDescriptor, Renderer, RendererSettings, Resources, UniformValue,
};

const FRAMES: u32 = 120;

const LIT_VERTEX: &str = "
    attribute vec3 position;
    attribute vec3 normal;
    attribute vec3 offset;
    uniform mat4 modelViewMatrix;
    uniform mat4 projectionMatrix;
    uniform mat3 normalMatrix;
    varying vec3 vNormal;
    void main() {
        vNormal = normalize(normalMatrix * normal);
        gl_Position = projectionMatrix * modelViewMatrix * vec4(position + offset, 1.0);
    }
";

const LIT_FRAGMENT: &str = "
    precision highp float;
    uniform vec3 uColor;
    varying vec3 vNormal;
    void main() {
        float light = dot(vNormal, normalize(vec3(0.3, 1.0, 0.5))) * 0.5 + 0.5;
        gl_FragColor = vec4(uColor * light, 1.0);
    }
";

const QUAD_VERTEX: &str = "
    attribute vec2 position;
    attribute vec2 uv;
    varying vec2 vUv;
    void main() {
        vUv = uv;
        gl_Position = vec4(position, 0.0, 1.0);
    }
";

const QUAD_FRAGMENT: &str = "
    precision highp float;
    uniform sampler2D tMap;
    uniform float uOpacity;
    varying vec2 vUv;
    void main() {
        gl_FragColor = vec4(texture2D(tMap, vUv).rgb, uOpacity);
    }
";

/// Positions, normals and indices of a unit cube, four vertices per face.
fn cube() -> GeometryDescriptor {
    let faces: [(Vec3, Vec3, Vec3); 6] = [
        (Vec3::X, Vec3::Y, Vec3::Z),
        (-Vec3::X, Vec3::Y, -Vec3::Z),
        (Vec3::Y, Vec3::Z, Vec3::X),
        (-Vec3::Y, Vec3::Z, -Vec3::X),
        (Vec3::Z, Vec3::Y, -Vec3::X),
        (-Vec3::Z, Vec3::Y, Vec3::X),
    ];
    let mut positions = Vec::with_capacity(72);
    let mut normals = Vec::with_capacity(72);
    let mut indices = Vec::with_capacity(36);
    for (face, (normal, up, right)) in faces.into_iter().enumerate() {
        for (u, v) in [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)] {
            let corner = normal * 0.5 + right * u + up * v;
            positions.extend_from_slice(corner.as_array());
            normals.extend_from_slice(normal.as_array());
        }
        let base = face as u16 * 4;
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    GeometryDescriptor::new()
        .attribute("position", Attribute::new(positions, 3))
        .attribute("normal", Attribute::new(normals, 3))
        .index(Attribute::new(indices, 1))
}

/// Instance offsets of a `side` x `side` grid on the XZ plane.
fn grid_offsets(side: u32, spacing: f32) -> Vec<f32> {
    let half = (side as f32 - 1.0) * spacing * 0.5;
    (0..side * side)
        .flat_map(|i| {
            let x = (i % side) as f32 * spacing - half;
            let z = (i / side) as f32 * spacing - half;
            [x, 0.0, z]
        })
        .collect()
}

fn fullscreen_quad() -> GeometryDescriptor {
    GeometryDescriptor::new()
        .attribute(
            "position",
            Attribute::new(vec![-1.0f32, -1.0, 3.0, -1.0, -1.0, 3.0], 2),
        )
        .attribute("uv", Attribute::new(vec![0.0f32, 0.0, 2.0, 0.0, 0.0, 2.0], 2))
}

fn load_settings() -> Result<RendererSettings> {
    match std::env::args().nth(1) {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read renderer settings from {path}"))?;
            RendererSettings::from_ron(&text).context("Failed to parse renderer settings")
        }
        None => RendererSettings::from_ron(include_str!("../renderer.ron"))
            .context("Failed to parse built-in renderer settings"),
    }
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let settings = load_settings()?;
    let (width, height) = settings.drawing_buffer_size();
    let mut renderer = Renderer::new(Box::new(HeadlessBackend::new(width, height)), settings)
        .context("Failed to create renderer")?;
    let mut resources = Resources::new();

    let ctx = renderer.context_mut();
    let target = resources.create_render_target(ctx, RenderTargetDescriptor::new(width, height))?;
    let offscreen = resources
        .render_targets
        .get(target)
        .and_then(|target| target.texture())
        .context("Render target has no color attachment")?;

    let lit = resources.create_program(
        ctx,
        ProgramDescriptor::new(LIT_VERTEX, LIT_FRAGMENT).with_uniform("uColor", Vec3::new(0.9, 0.6, 0.2)),
    )?;
    let composite = resources.create_program(
        ctx,
        ProgramDescriptor::new(QUAD_VERTEX, QUAD_FRAGMENT)
            .with_uniform("tMap", UniformValue::Texture(offscreen))
            .with_uniform("uOpacity", 1.0f32)
            .with_state(RenderState {
                depth_test: false,
                cull_face: None,
                ..Default::default()
            }),
    )?;

    let cubes = resources.create_geometry(
        ctx,
        cube().attribute("offset", Attribute::new(grid_offsets(8, 2.0), 3).instanced(1)),
    )?;
    let quad = resources.create_geometry(ctx, fullscreen_quad())?;

    let mut scene = SceneGraph::new();
    let spinner = scene.insert(Transform::new(), Some(Mesh::new(cubes, lit)));
    let mut overlay = SceneGraph::new();
    let mut screen = Mesh::new(quad, composite);
    screen.frustum_culled = false;
    overlay.insert(Transform::new(), Some(screen));

    let mut camera = Camera::perspective(45.0, width as f32 / height as f32, 0.1, 100.0);
    let mut totals = prism_render::FrameStats::default();

    for frame in 0..FRAMES {
        let angle = frame as f32 * 3.0 * DEG_TO_RAD;
        camera.transform.position = Vec3::new(angle.sin() * 20.0, 12.0, angle.cos() * 20.0);
        camera.look_at(Vec3::ZERO);
        if let Some(transform) = scene.transform_mut(spinner) {
            transform
                .rotation
                .set_quaternion(Quaternion::from_axis_angle(Vec3::Y, angle * 0.5));
        }

        let pass = renderer.render(
            &mut scene,
            Some(&mut camera),
            &mut resources,
            RenderOptions::with_target(target),
        )?;
        let present = renderer.render(&mut overlay, None, &mut resources, RenderOptions::default())?;

        totals.draw_calls += pass.draw_calls + present.draw_calls;
        totals.program_switches += pass.program_switches + present.program_switches;
        totals.culled += pass.culled + present.culled;
        log::debug!("Sandbox: frame {frame} drew {} + {}", pass.draw_calls, present.draw_calls);
    }

    let backend = renderer
        .context()
        .backend_as::<HeadlessBackend>()
        .context("Renderer is not running on the headless backend")?;
    log::info!(
        "Sandbox: {FRAMES} frames, {} draws, {} program switches, {} culled",
        totals.draw_calls,
        totals.program_switches,
        totals.culled
    );
    log::info!(
        "Sandbox: {} backend calls, {} uniform uploads, {} buffers, {} textures",
        backend.total_calls(),
        backend.calls("uniform"),
        backend.buffer_count(),
        backend.texture_count()
    );
    Ok(())
}
