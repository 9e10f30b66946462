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

//! # Prism Core
//!
//! Foundational crate containing the math kernels, the scene graph and the
//! interface contracts that the rendering crates build on.
//!
//! - [`math`]: vectors, matrices, quaternions, Euler angles and culling volumes.
//! - [`scene`]: the transform hierarchy and cameras.
//! - [`renderer`]: the backend-agnostic GPU command contract ([`renderer::GraphicsBackend`]),
//!   handle types, descriptors and error types.

#![warn(missing_docs)]

pub mod math;
pub mod renderer;
pub mod scene;

pub use scene::{Camera, NodeId, SceneGraph, Transform};
