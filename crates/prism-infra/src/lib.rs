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

//! # Prism Infra
//!
//! Concrete [`GraphicsBackend`](prism_core::renderer::GraphicsBackend) implementations:
//!
//! - [`HeadlessBackend`]: an in-memory GL context that records every call. Used
//!   by tests and by tools that need to run the renderer without a GPU.
//! - `GlowBackend` (feature `glow`): OpenGL 3.3 / ES 3.0 / WebGL 2 through `glow`.

#![warn(missing_docs)]

pub mod graphics;

pub use graphics::HeadlessBackend;
#[cfg(feature = "glow")]
pub use graphics::GlowBackend;
