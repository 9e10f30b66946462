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

//! The transform hierarchy and cameras.
//!
//! A [`SceneGraph`] stores nodes in an arena and links them with [`NodeId`]
//! handles. Each node owns a [`Transform`]; world matrices are propagated
//! top-down by [`SceneGraph::update_matrix_world`].

mod camera;
mod graph;
mod rotation;
mod transform;

pub use self::camera::{Camera, Projection};
pub use self::graph::{NodeId, SceneGraph, SceneNode, Traverse};
pub use self::rotation::Rotation;
pub use self::transform::Transform;
