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

//! Plain data passed across the backend boundary.

use super::enums::{DataType, GlslType, InternalFormat, PixelFormat, TexImageTarget};
use super::handles::UniformLocation;

/// An active uniform reported by program reflection.
///
/// Arrays are reported once, with the name of their first element (`"weights[0]"`)
/// and `size` set to the array length. Struct members are reported one by one
/// with their full path (`"lights[1].color"`).
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveUniform {
    /// The reflected name.
    pub name: String,
    /// The location values are uploaded to.
    pub location: UniformLocation,
    /// The GLSL type of one element.
    pub ty: GlslType,
    /// The number of array elements, 1 for non-arrays.
    pub size: u32,
}

/// An active vertex attribute reported by program reflection.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveAttribute {
    /// The attribute name.
    pub name: String,
    /// The first attribute location.
    pub location: u32,
    /// The GLSL type of the attribute.
    pub ty: GlslType,
    /// The number of array elements, 1 for non-arrays.
    pub size: u32,
}

/// Values uploaded to a uniform location.
///
/// The backend selects the `uniform*fv`, `uniform*iv` or `uniformMatrix*fv`
/// entry point from the uniform's [`GlslType`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformData<'a> {
    /// Float components, column-major for matrices.
    Floats(&'a [f32]),
    /// Integer components, also used for booleans and sampler units.
    Ints(&'a [i32]),
}

impl UniformData<'_> {
    /// Number of scalar components.
    pub fn len(&self) -> usize {
        match self {
            UniformData::Floats(v) => v.len(),
            UniformData::Ints(v) => v.len(),
        }
    }

    /// `true` if there are no components.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Layout of one attribute inside the currently bound array buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribPointer {
    /// The attribute location.
    pub location: u32,
    /// Components per vertex, 1 to 4.
    pub size: u32,
    /// Component type.
    pub data_type: DataType,
    /// Map integer data to `[0, 1]` or `[-1, 1]`.
    pub normalized: bool,
    /// Byte distance between consecutive vertices, 0 for tightly packed.
    pub stride: u32,
    /// Byte offset of the first component.
    pub offset: u32,
}

/// Arguments of a `texImage2D` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TexImage<'a> {
    /// The image slot being written.
    pub target: TexImageTarget,
    /// The mip level.
    pub level: u32,
    /// GPU storage format.
    pub internal_format: InternalFormat,
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// Client pixel layout.
    pub format: PixelFormat,
    /// Client component type.
    pub data_type: DataType,
    /// Pixel data, or `None` to allocate uninitialised storage.
    pub pixels: Option<&'a [u8]>,
}
