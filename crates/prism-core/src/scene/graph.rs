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

//! The scene graph: an arena of nodes linked by stable handles.

use log::warn;

use super::Transform;
use crate::math::Mat4;

/// A handle to a node in a [`SceneGraph`].
///
/// It combines a slot index with a generation count. When a node is removed its
/// slot can be recycled, but the generation is incremented so stale handles stop
/// resolving instead of pointing at the new occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    /// Slot index in the arena.
    pub index: u32,
    /// Generation of the slot when this handle was issued.
    pub generation: u32,
}

/// A node: its transform, an optional payload and its links.
#[derive(Debug)]
pub struct SceneNode<T> {
    /// Local and world transform.
    pub transform: Transform,
    /// What the node carries, e.g. something drawable. `None` for pure groups.
    pub payload: Option<T>,
    /// Optional debug name.
    pub name: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl<T> SceneNode<T> {
    /// The parent handle, `None` for a root.
    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// The ordered child handles.
    #[inline]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// What a [`SceneGraph::traverse`] visitor wants to happen next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Traverse {
    /// Visit the node's children, then carry on.
    Continue,
    /// Do not descend into this node's children.
    SkipChildren,
    /// End the traversal immediately.
    Stop,
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    node: Option<SceneNode<T>>,
}

/// A hierarchy of [`SceneNode`]s stored in a generational arena.
///
/// Parent and child links are plain [`NodeId`]s and every mutation updates both
/// sides in the same call, so `a.children` contains `b` exactly when
/// `b.parent == Some(a)`.
#[derive(Debug)]
pub struct SceneGraph<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> Default for SceneGraph<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SceneGraph<T> {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// `true` if the graph holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Adds a root node and returns its handle.
    pub fn insert(&mut self, transform: Transform, payload: Option<T>) -> NodeId {
        let node = SceneNode {
            transform,
            payload,
            name: None,
            parent: None,
            children: Vec::new(),
        };
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation += 1;
            slot.node = Some(node);
            NodeId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            NodeId {
                index,
                generation: 0,
            }
        }
    }

    /// Adds a node directly under `parent`. Falls back to a root if `parent` is stale.
    pub fn insert_child(&mut self, parent: NodeId, transform: Transform, payload: Option<T>) -> NodeId {
        let id = self.insert(transform, payload);
        self.set_parent(id, Some(parent));
        id
    }

    /// `true` if `id` refers to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Returns the node behind `id`, if it is still alive.
    pub fn get(&self, id: NodeId) -> Option<&SceneNode<T>> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    /// Returns the node behind `id` mutably, if it is still alive.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode<T>> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    /// Shorthand for the node's transform.
    pub fn transform(&self, id: NodeId) -> Option<&Transform> {
        self.get(id).map(|n| &n.transform)
    }

    /// Shorthand for the node's transform, mutably.
    pub fn transform_mut(&mut self, id: NodeId) -> Option<&mut Transform> {
        self.get_mut(id).map(|n| &mut n.transform)
    }

    /// The node's parent.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// The node's children, empty for stale handles.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Every live node without a parent, in slot order.
    pub fn roots(&self) -> Vec<NodeId> {
        self.iter()
            .filter(|(_, node)| node.parent.is_none())
            .map(|(id, _)| id)
            .collect()
    }

    /// Iterates over every live node in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SceneNode<T>)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.node.as_ref().map(|node| {
                (
                    NodeId {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    node,
                )
            })
        })
    }

    /// `true` if `ancestor` is `node` itself or lies on its parent chain.
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Detaches `child` from its current parent and attaches it to `parent`
    /// (or makes it a root for `None`), appending it to the new child list.
    ///
    /// Returns `false` and leaves the graph untouched if a handle is stale or the
    /// move would create a cycle.
    pub fn set_parent(&mut self, child: NodeId, parent: Option<NodeId>) -> bool {
        if !self.contains(child) {
            return false;
        }
        if let Some(p) = parent {
            if !self.contains(p) {
                warn!("SceneGraph: set_parent called with a stale parent handle {:?}", p);
                return false;
            }
            if self.is_ancestor(child, p) {
                warn!(
                    "SceneGraph: refusing to parent {:?} under its own descendant {:?}",
                    child, p
                );
                return false;
            }
        }

        let old = self.parent(child);
        if old == parent {
            return true;
        }
        if let Some(old) = old.and_then(|old| self.get_mut(old)) {
            old.children.retain(|c| *c != child);
        }
        if let Some(new) = parent.and_then(|p| self.get_mut(p)) {
            new.children.push(child);
        }
        if let Some(node) = self.get_mut(child) {
            node.parent = parent;
            // The world matrix now depends on a different parent.
            node.transform.world_matrix_needs_update = true;
        }
        true
    }

    /// Makes `child` the last child of `parent`.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        self.set_parent(child, Some(parent))
    }

    /// Detaches `child` from `parent`, turning it into a root. Does nothing if
    /// `child` is not a child of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if self.parent(child) != Some(parent) {
            return false;
        }
        self.set_parent(child, None)
    }

    /// Removes `id` and its whole subtree, returning the removed node.
    pub fn remove(&mut self, id: NodeId) -> Option<SceneNode<T>> {
        if !self.contains(id) {
            return None;
        }
        self.set_parent(id, None);

        let mut stack = vec![id];
        let mut removed_root = None;
        while let Some(current) = stack.pop() {
            let Some(slot) = self.slots.get_mut(current.index as usize) else {
                continue;
            };
            if let Some(node) = slot.node.take() {
                stack.extend(node.children.iter().copied());
                self.free.push(current.index);
                self.len -= 1;
                if current == id {
                    removed_root = Some(node);
                }
            }
        }
        removed_root
    }

    /// Pre-order, depth-first walk of the subtree at `root`, children in order.
    ///
    /// The visitor decides whether to descend, skip the node's children or stop.
    pub fn traverse<F>(&self, root: NodeId, mut visitor: F)
    where
        F: FnMut(NodeId, &SceneNode<T>) -> Traverse,
    {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.get(id) else { continue };
            match visitor(id, node) {
                Traverse::Stop => return,
                Traverse::SkipChildren => {}
                Traverse::Continue => stack.extend(node.children.iter().rev().copied()),
            }
        }
    }

    /// Recomputes world matrices for the subtree at `root`, parents before children.
    ///
    /// Nodes with `matrix_auto_update` recompose their local matrix first. A node
    /// recomputes its world matrix when it is dirty or when `force` is set, and
    /// an update is always forced on every descendant of an updated node.
    pub fn update_matrix_world(&mut self, root: NodeId, force: bool) {
        let mut stack = vec![(root, force)];
        while let Some((id, force)) = stack.pop() {
            let parent_world: Option<Mat4> = self
                .parent(id)
                .and_then(|p| self.get(p))
                .map(|p| p.transform.world_matrix);
            let Some(node) = self.get_mut(id) else { continue };
            let transform = &mut node.transform;

            if transform.matrix_auto_update {
                transform.update_matrix();
            }
            let force = force || transform.world_matrix_needs_update;
            if force {
                transform.compute_world_matrix(parent_world.as_ref());
            }
            stack.extend(node.children.iter().rev().map(|c| (*c, force)));
        }
    }

    /// Runs [`SceneGraph::update_matrix_world`] from every root.
    pub fn update_all(&mut self, force: bool) {
        for root in self.roots() {
            self.update_matrix_world(root, force);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Quaternion, Vec3, EPSILON};

    fn assert_matrix_approx_eq(a: Mat4, b: Mat4) {
        for i in 0..4 {
            for j in 0..4 {
                assert!(
                    (a.cols[i][j] - b.cols[i][j]).abs() < EPSILON,
                    "Matrix mismatch at col {}, row {}: {} != {}",
                    i,
                    j,
                    a.cols[i][j],
                    b.cols[i][j]
                );
            }
        }
    }

    fn at(x: f32, y: f32, z: f32) -> Transform {
        Transform::from_position(Vec3::new(x, y, z))
    }

    #[test]
    fn test_links_stay_bidirectional() {
        let mut graph: SceneGraph<()> = SceneGraph::new();
        let a = graph.insert(Transform::new(), None);
        let b = graph.insert(Transform::new(), None);
        let c = graph.insert_child(a, Transform::new(), None);

        assert_eq!(graph.children(a), &[c]);
        assert!(graph.set_parent(c, Some(b)));
        assert!(graph.children(a).is_empty());
        assert_eq!(graph.children(b), &[c]);
        assert_eq!(graph.parent(c), Some(b));

        assert!(graph.remove_child(b, c));
        assert_eq!(graph.parent(c), None);
        assert_eq!(graph.roots(), vec![a, b, c]);
    }

    #[test]
    fn test_cycles_are_refused() {
        let mut graph: SceneGraph<()> = SceneGraph::new();
        let a = graph.insert(Transform::new(), None);
        let b = graph.insert_child(a, Transform::new(), None);
        let c = graph.insert_child(b, Transform::new(), None);
        assert!(!graph.set_parent(a, Some(c)));
        assert!(!graph.add_child(a, a));
        assert_eq!(graph.parent(a), None);
    }

    #[test]
    fn test_remove_drops_subtree_and_invalidates_handles() {
        let mut graph = SceneGraph::new();
        let root = graph.insert(Transform::new(), Some("root"));
        let a = graph.insert_child(root, Transform::new(), Some("a"));
        let b = graph.insert_child(a, Transform::new(), Some("b"));

        let removed = graph.remove(a).expect("a is alive");
        assert_eq!(removed.payload, Some("a"));
        assert!(!graph.contains(b));
        assert!(graph.children(root).is_empty());
        assert_eq!(graph.len(), 1);

        // The recycled slot must not answer to the old handle.
        let fresh = graph.insert(Transform::new(), Some("fresh"));
        assert!(fresh.index == a.index || fresh.index == b.index);
        assert!(graph.get(a).is_none() && graph.get(b).is_none());
    }

    #[test]
    fn test_traverse_order_and_control() {
        let mut graph = SceneGraph::new();
        let root = graph.insert(Transform::new(), Some(0));
        let a = graph.insert_child(root, Transform::new(), Some(1));
        graph.insert_child(a, Transform::new(), Some(2));
        let b = graph.insert_child(root, Transform::new(), Some(3));
        graph.insert_child(b, Transform::new(), Some(4));

        let mut seen = Vec::new();
        graph.traverse(root, |_, node| {
            seen.push(node.payload.unwrap_or(-1));
            Traverse::Continue
        });
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);

        seen.clear();
        graph.traverse(root, |id, node| {
            seen.push(node.payload.unwrap_or(-1));
            if id == a {
                Traverse::SkipChildren
            } else {
                Traverse::Continue
            }
        });
        assert_eq!(seen, vec![0, 1, 3, 4]);

        seen.clear();
        graph.traverse(root, |id, node| {
            seen.push(node.payload.unwrap_or(-1));
            if id == a {
                Traverse::Stop
            } else {
                Traverse::Continue
            }
        });
        assert_eq!(seen, vec![0, 1]);
    }

    #[test]
    fn test_world_matrix_accumulates_down_a_chain() {
        let mut graph: SceneGraph<()> = SceneGraph::new();
        let root = graph.insert(at(10.0, 0.0, 0.0), None);
        let a = graph.insert_child(root, at(0.0, 2.0, 0.0), None);
        let b = graph.insert_child(a, at(0.0, 0.0, 3.0), None);
        let c = graph.insert_child(b, Transform::new(), None);
        if let Some(t) = graph.transform_mut(a) {
            t.rotation
                .set_quaternion(Quaternion::from_axis_angle(Vec3::Y, std::f32::consts::FRAC_PI_2));
        }

        graph.update_matrix_world(root, false);

        let expected = Mat4::from_translation(Vec3::new(10.0, 2.0, 0.0))
            * Mat4::from_quat(Quaternion::from_axis_angle(Vec3::Y, std::f32::consts::FRAC_PI_2))
            * Mat4::from_translation(Vec3::new(0.0, 0.0, 3.0));
        assert_matrix_approx_eq(graph.transform(c).map(|t| t.world_matrix).unwrap_or(Mat4::ZERO), expected);

        // Moving the root and updating once reaches the deepest node.
        if let Some(t) = graph.transform_mut(root) {
            t.position = Vec3::ZERO;
        }
        graph.update_matrix_world(root, false);
        let world = graph.transform(c).map(|t| t.world_matrix).unwrap_or(Mat4::ZERO);
        assert_matrix_approx_eq(world, Mat4::from_translation(Vec3::new(-10.0, 0.0, 0.0)) * expected);
    }

    #[test]
    fn test_dirty_node_forces_descendants_only() {
        let mut graph: SceneGraph<()> = SceneGraph::new();
        let root = graph.insert(Transform::new(), None);
        let a = graph.insert_child(root, Transform::new(), None);
        let b = graph.insert_child(a, Transform::new(), None);
        let c = graph.insert_child(b, at(0.0, 0.0, 1.0), None);
        let sibling = graph.insert_child(a, at(5.0, 0.0, 0.0), None);
        graph.update_matrix_world(root, false);

        for id in [root, a, b, c, sibling] {
            if let Some(t) = graph.transform_mut(id) {
                t.matrix_auto_update = false;
            }
        }
        let sentinel = Mat4::from_scale(Vec3::splat(42.0));
        if let Some(t) = graph.transform_mut(sibling) {
            t.world_matrix = sentinel;
        }
        if let Some(t) = graph.transform_mut(c) {
            t.world_matrix = sentinel;
        }
        if let Some(t) = graph.transform_mut(b) {
            t.matrix = Mat4::from_translation(Vec3::new(0.0, 7.0, 0.0));
            t.world_matrix_needs_update = true;
        }

        graph.update_matrix_world(root, false);

        let world_c = graph.transform(c).map(|t| t.world_matrix).unwrap_or(Mat4::ZERO);
        assert_matrix_approx_eq(world_c, Mat4::from_translation(Vec3::new(0.0, 7.0, 1.0)));
        let world_sibling = graph.transform(sibling).map(|t| t.world_matrix).unwrap_or(Mat4::ZERO);
        assert_eq!(world_sibling, sentinel);
    }

    #[test]
    fn test_reparenting_marks_world_dirty() {
        let mut graph: SceneGraph<()> = SceneGraph::new();
        let a = graph.insert(at(1.0, 0.0, 0.0), None);
        let b = graph.insert(Transform::new(), None);
        graph.update_all(false);
        if let Some(t) = graph.transform_mut(b) {
            t.matrix_auto_update = false;
        }
        graph.add_child(a, b);
        graph.update_all(false);
        let world = graph.transform(b).map(|t| t.world_matrix).unwrap_or(Mat4::ZERO);
        assert_eq!(world.get_translation(), Vec3::new(1.0, 0.0, 0.0));
    }
}
