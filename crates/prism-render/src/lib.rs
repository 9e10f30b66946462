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

//! # Prism Render
//!
//! Retained-mode GPU resources and the frame driver built on the
//! [`GraphicsBackend`](prism_core::renderer::GraphicsBackend) contract.
//!
//! - [`context`]: the [`RenderContext`] state cache. Every global GL state
//!   change goes through it and is skipped when the cached value matches.
//! - [`program`], [`geometry`], [`texture`], [`render_target`]: resource
//!   objects that shadow their GPU-side state and upload only what changed.
//! - [`render_list`]: visibility, frustum culling and the bucketed multi-key sort.
//! - [`renderer`]: [`Renderer::render`], which ties them together.

#![warn(missing_docs)]

pub mod context;
pub mod geometry;
pub mod mesh;
pub mod program;
pub mod render_list;
pub mod render_target;
pub mod renderer;
pub mod resources;
pub mod settings;
pub mod texture;

pub use context::RenderContext;
pub use geometry::{Attribute, AttributeData, Geometry, GeometryDescriptor};
pub use mesh::Mesh;
pub use program::{Program, ProgramDescriptor, ProgramError, RenderState, UniformValue, Uniforms};
pub use render_list::{Bucket, RenderItem, RenderList, RenderListOptions};
pub use render_target::{RenderTarget, RenderTargetDescriptor, RenderTargetError};
pub use renderer::{FrameStats, RenderOptions, Renderer};
pub use resources::{GeometryId, ProgramId, RenderTargetId, Resources, Store, TextureId};
pub use settings::{RendererSettings, SettingsError};
pub use texture::{Texture, TextureDescriptor, TextureImage, TextureSource};
