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

//! Opaque handles for objects living inside a [`GraphicsBackend`](crate::renderer::GraphicsBackend).
//!
//! Handles are allocated by the backend and are only meaningful to the backend
//! that issued them. Zero is never a valid handle, mirroring GL object names.

macro_rules! backend_handle {
    ($($(#[$meta:meta])* $name:ident),+ $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
            pub struct $name(pub u32);
        )+
    };
}

backend_handle! {
    /// A compiled shader stage.
    ShaderHandle,
    /// A linked shader program.
    ProgramHandle,
    /// A vertex or index buffer.
    BufferHandle,
    /// A vertex array object.
    VertexArrayHandle,
    /// A texture object.
    TextureHandle,
    /// A framebuffer object.
    FramebufferHandle,
    /// A renderbuffer object.
    RenderbufferHandle,
}

/// The location of an active uniform inside a linked program.
///
/// Locations are scoped to their program; the renderer keys its uniform value
/// cache by `(program, location)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UniformLocation(pub u32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_compare_by_value() {
        assert_eq!(BufferHandle(3), BufferHandle(3));
        assert_ne!(TextureHandle(1), TextureHandle(2));
        assert!(UniformLocation(0) < UniformLocation(1));
    }
}
