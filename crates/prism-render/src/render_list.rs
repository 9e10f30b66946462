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

//! Draw-list construction: visibility, frustum culling, bucketing and sorting.
//!
//! Opaque draws are grouped by program and ordered front to back, transparent
//! draws back to front, and draws without depth testing (UI) by program only.
//! The three buckets are always emitted in that order.

use crate::context::WarningLimiter;
use crate::mesh::Mesh;
use crate::resources::{ProgramId, Resources};
use prism_core::scene::{Camera, NodeId, SceneGraph, Traverse};
use std::cmp::Ordering;

/// The pass a draw belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Bucket {
    /// Not transparent.
    Opaque,
    /// Transparent and depth tested.
    Transparent,
    /// Transparent without depth testing.
    Ui,
}

/// One node that survived visibility and culling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderItem {
    /// The scene node.
    pub node: NodeId,
    /// The node's process-unique transform id, used as the last sort key.
    pub id: u64,
    /// The program the node is drawn with.
    pub program: ProgramId,
    /// The mesh's render order.
    pub render_order: i32,
    /// Clip-space depth of the node origin, when it takes part in depth sorting.
    pub z_depth: Option<f32>,
    /// The pass the node belongs to.
    pub bucket: Bucket,
}

impl RenderItem {
    fn z(&self) -> f32 {
        self.z_depth.unwrap_or(0.0)
    }
}

/// Switches for [`RenderList::build`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderListOptions {
    /// Drop nodes whose bounding sphere lies outside the camera frustum.
    pub frustum_cull: bool,
    /// Bucket and sort the surviving nodes.
    pub sort: bool,
}

impl Default for RenderListOptions {
    fn default() -> Self {
        Self {
            frustum_cull: true,
            sort: true,
        }
    }
}

/// The ordered draws of one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderList {
    /// Draws in submission order.
    pub items: Vec<RenderItem>,
    /// Nodes rejected by the frustum test.
    pub culled: usize,
}

impl RenderList {
    /// Collects the drawable nodes of `scene`.
    ///
    /// World matrices must be current. When culling, the camera frustum must
    /// have been refreshed with [`Camera::update_frustum`]; without a camera
    /// nothing is culled and no depth keys are computed.
    pub fn build(
        scene: &SceneGraph<Mesh>,
        camera: Option<&Camera>,
        resources: &Resources,
        options: RenderListOptions,
        warnings: &mut WarningLimiter,
    ) -> Self {
        let mut list = Self::default();

        for root in scene.roots() {
            scene.traverse(root, |node_id, node| {
                if !node.transform.visible {
                    return Traverse::SkipChildren;
                }
                let Some(mesh) = node.payload.as_ref() else {
                    return Traverse::Continue;
                };
                let Some(program) = resources.programs.get(mesh.program) else {
                    warnings.warn(format_args!(
                        "RenderList: mesh references missing program {:?}",
                        mesh.program
                    ));
                    return Traverse::Continue;
                };
                let Some(geometry) = resources.geometries.get(mesh.geometry) else {
                    warnings.warn(format_args!(
                        "RenderList: mesh references missing geometry {:?}",
                        mesh.geometry
                    ));
                    return Traverse::Continue;
                };

                let world = &node.transform.world_matrix;
                if let (true, true, Some(camera)) = (options.frustum_cull, mesh.frustum_culled, camera) {
                    let visible = geometry
                        .bounds()
                        .map_or(true, |bounds| camera.frustum_intersects_sphere(&bounds.sphere, world));
                    if !visible {
                        list.culled += 1;
                        return Traverse::Continue;
                    }
                }

                let bucket = match (program.is_transparent(), program.depth_test()) {
                    (false, _) => Bucket::Opaque,
                    (true, true) => Bucket::Transparent,
                    (true, false) => Bucket::Ui,
                };
                let z_depth = match camera {
                    Some(camera) if options.sort && mesh.render_order == 0 && program.depth_test() => {
                        Some(camera.project(world.get_translation()).z)
                    }
                    _ => None,
                };

                list.items.push(RenderItem {
                    node: node_id,
                    id: node.transform.id(),
                    program: mesh.program,
                    render_order: mesh.render_order,
                    z_depth,
                    bucket,
                });
                Traverse::Continue
            });
        }

        if options.sort {
            list.sort();
        }
        list
    }

    /// Orders the items by bucket, then by each bucket's keys.
    pub fn sort(&mut self) {
        self.items.sort_by(|a, b| {
            a.bucket.cmp(&b.bucket).then_with(|| match a.bucket {
                Bucket::Opaque => sort_opaque(a, b),
                Bucket::Transparent => sort_transparent(a, b),
                Bucket::Ui => sort_ui(a, b),
            })
        });
    }

    /// Number of draws.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// `true` if nothing will be drawn.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The draws in submission order.
    pub fn iter(&self) -> impl Iterator<Item = &RenderItem> {
        self.items.iter()
    }

    /// The nodes in submission order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.items.iter().map(|item| item.node)
    }
}

fn sort_opaque(a: &RenderItem, b: &RenderItem) -> Ordering {
    a.render_order
        .cmp(&b.render_order)
        .then_with(|| a.program.cmp(&b.program))
        .then_with(|| a.z().total_cmp(&b.z()))
        .then_with(|| b.id.cmp(&a.id))
}

fn sort_transparent(a: &RenderItem, b: &RenderItem) -> Ordering {
    a.render_order
        .cmp(&b.render_order)
        .then_with(|| b.z().total_cmp(&a.z()))
        .then_with(|| b.id.cmp(&a.id))
}

fn sort_ui(a: &RenderItem, b: &RenderItem) -> Ordering {
    a.render_order
        .cmp(&b.render_order)
        .then_with(|| a.program.cmp(&b.program))
        .then_with(|| b.id.cmp(&a.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RenderContext;
    use crate::geometry::{Attribute, GeometryDescriptor, POSITION_ATTRIBUTE};
    use crate::program::{ProgramDescriptor, RenderState};
    use crate::resources::GeometryId;
    use prism_core::math::Vec3;
    use prism_core::Transform;
    use prism_infra::HeadlessBackend;

    const VERTEX: &str = "attribute vec3 position;\nvoid main() { gl_Position = vec4(position, 1.0); }";
    const FRAGMENT: &str = "void main() { gl_FragColor = vec4(1.0); }";

    struct Fixture {
        ctx: RenderContext,
        resources: Resources,
        geometry: GeometryId,
        camera: Camera,
    }

    impl Fixture {
        fn new() -> Self {
            let mut ctx = RenderContext::new(Box::new(HeadlessBackend::new(16, 16)));
            let mut resources = Resources::new();
            let geometry = resources
                .create_geometry(
                    &mut ctx,
                    GeometryDescriptor::new().attribute(
                        POSITION_ATTRIBUTE,
                        Attribute::new(vec![-1.0f32, -1.0, 0.0, 1.0, -1.0, 0.0, 0.0, 1.0, 0.0], 3),
                    ),
                )
                .unwrap();
            let mut camera = Camera::perspective(45.0, 1.0, 0.1, 100.0);
            camera.transform.position = Vec3::new(0.0, 0.0, 10.0);
            camera.update_matrix_world(None);
            camera.update_frustum();
            Self {
                ctx,
                resources,
                geometry,
                camera,
            }
        }

        fn program(&mut self, state: RenderState) -> ProgramId {
            self.resources
                .create_program(&mut self.ctx, ProgramDescriptor::new(VERTEX, FRAGMENT).with_state(state))
                .unwrap()
        }

        fn build(&self, scene: &SceneGraph<Mesh>, options: RenderListOptions) -> RenderList {
            RenderList::build(
                scene,
                Some(&self.camera),
                &self.resources,
                options,
                &mut WarningLimiter::default(),
            )
        }
    }

    fn transparent() -> RenderState {
        RenderState {
            transparent: true,
            ..Default::default()
        }
    }

    fn ui() -> RenderState {
        RenderState {
            transparent: true,
            depth_test: false,
            ..Default::default()
        }
    }

    fn at(z: f32) -> Transform {
        Transform::from_position(Vec3::new(0.0, 0.0, z))
    }

    #[test]
    fn buckets_are_emitted_in_fixed_order() {
        let mut fixture = Fixture::new();
        let opaque = fixture.program(RenderState::default());
        let blended = fixture.program(transparent());
        let overlay = fixture.program(ui());

        let mut scene = SceneGraph::new();
        let u = scene.insert(at(0.0), Some(Mesh::new(fixture.geometry, overlay)));
        let t = scene.insert(at(0.0), Some(Mesh::new(fixture.geometry, blended)));
        let o = scene.insert(at(0.0), Some(Mesh::new(fixture.geometry, opaque)));
        scene.update_all(true);

        let list = fixture.build(&scene, RenderListOptions::default());
        assert_eq!(list.nodes().collect::<Vec<_>>(), vec![o, t, u]);
        assert_eq!(
            list.iter().map(|item| item.bucket).collect::<Vec<_>>(),
            vec![Bucket::Opaque, Bucket::Transparent, Bucket::Ui]
        );
    }

    #[test]
    fn opaque_front_to_back_and_transparent_back_to_front() {
        let mut fixture = Fixture::new();
        let opaque = fixture.program(RenderState::default());
        let blended = fixture.program(transparent());

        let mut scene = SceneGraph::new();
        let far_opaque = scene.insert(at(-5.0), Some(Mesh::new(fixture.geometry, opaque)));
        let near_opaque = scene.insert(at(2.0), Some(Mesh::new(fixture.geometry, opaque)));
        let near_blend = scene.insert(at(2.0), Some(Mesh::new(fixture.geometry, blended)));
        let far_blend = scene.insert(at(-5.0), Some(Mesh::new(fixture.geometry, blended)));
        scene.update_all(true);

        let list = fixture.build(&scene, RenderListOptions::default());
        assert_eq!(
            list.nodes().collect::<Vec<_>>(),
            vec![near_opaque, far_opaque, far_blend, near_blend]
        );
    }

    #[test]
    fn render_order_and_program_precede_depth() {
        let mut fixture = Fixture::new();
        let first = fixture.program(RenderState::default());
        let second = fixture.program(RenderState::default());

        let mut scene = SceneGraph::new();
        let late = scene.insert(
            at(5.0),
            Some(Mesh::new(fixture.geometry, first).with_render_order(1)),
        );
        let b = scene.insert(at(5.0), Some(Mesh::new(fixture.geometry, second)));
        let a = scene.insert(at(-5.0), Some(Mesh::new(fixture.geometry, first)));
        scene.update_all(true);

        let list = fixture.build(&scene, RenderListOptions::default());
        assert_eq!(list.nodes().collect::<Vec<_>>(), vec![a, b, late]);
        assert_eq!(list.items[2].z_depth, None);
    }

    #[test]
    fn equal_keys_fall_back_to_newest_node_first() {
        let mut fixture = Fixture::new();
        let program = fixture.program(RenderState::default());

        let mut scene = SceneGraph::new();
        let older = scene.insert(at(0.0), Some(Mesh::new(fixture.geometry, program)));
        let newer = scene.insert(at(0.0), Some(Mesh::new(fixture.geometry, program)));
        scene.update_all(true);

        let list = fixture.build(&scene, RenderListOptions::default());
        assert_eq!(list.nodes().collect::<Vec<_>>(), vec![newer, older]);
    }

    #[test]
    fn invisible_subtrees_and_culled_nodes_are_dropped() {
        let mut fixture = Fixture::new();
        let program = fixture.program(RenderState::default());

        let mut scene = SceneGraph::new();
        let mut hidden = Transform::new();
        hidden.visible = false;
        let parent = scene.insert(hidden, None);
        scene.insert_child(parent, Transform::new(), Some(Mesh::new(fixture.geometry, program)));
        let behind = scene.insert(at(50.0), Some(Mesh::new(fixture.geometry, program)));
        let mut always = Mesh::new(fixture.geometry, program);
        always.frustum_culled = false;
        let forced = scene.insert(at(50.0), Some(always));
        let visible = scene.insert(at(0.0), Some(Mesh::new(fixture.geometry, program)));
        scene.update_all(true);

        let list = fixture.build(&scene, RenderListOptions::default());
        let nodes: Vec<_> = list.nodes().collect();
        assert_eq!(nodes.len(), 2);
        assert!(nodes.contains(&visible));
        assert!(nodes.contains(&forced));
        assert!(!nodes.contains(&behind));
        assert_eq!(list.culled, 1);

        let unculled = fixture.build(
            &scene,
            RenderListOptions {
                frustum_cull: false,
                sort: true,
            },
        );
        assert_eq!(unculled.len(), 3);
    }

    #[test]
    fn unsorted_lists_keep_traversal_order() {
        let mut fixture = Fixture::new();
        let opaque = fixture.program(RenderState::default());
        let blended = fixture.program(transparent());

        let mut scene = SceneGraph::new();
        let root = scene.insert(at(0.0), Some(Mesh::new(fixture.geometry, blended)));
        let child = scene.insert_child(root, at(-1.0), Some(Mesh::new(fixture.geometry, opaque)));
        scene.update_all(true);

        let list = fixture.build(
            &scene,
            RenderListOptions {
                frustum_cull: true,
                sort: false,
            },
        );
        assert_eq!(list.nodes().collect::<Vec<_>>(), vec![root, child]);
        assert!(list.iter().all(|item| item.z_depth.is_none()));
    }
}
