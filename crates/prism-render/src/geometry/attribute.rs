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

use prism_core::renderer::{BufferHandle, BufferUsage, DataType};

/// Typed CPU-side vertex or index data.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeData {
    /// `FLOAT` components.
    F32(Vec<f32>),
    /// `UNSIGNED_BYTE` components.
    U8(Vec<u8>),
    /// `UNSIGNED_SHORT` components.
    U16(Vec<u16>),
    /// `UNSIGNED_INT` components.
    U32(Vec<u32>),
    /// `BYTE` components.
    I8(Vec<i8>),
    /// `SHORT` components.
    I16(Vec<i16>),
}

impl AttributeData {
    /// The GL component type.
    pub fn data_type(&self) -> DataType {
        match self {
            AttributeData::F32(_) => DataType::Float,
            AttributeData::U8(_) => DataType::UnsignedByte,
            AttributeData::U16(_) => DataType::UnsignedShort,
            AttributeData::U32(_) => DataType::UnsignedInt,
            AttributeData::I8(_) => DataType::Byte,
            AttributeData::I16(_) => DataType::Short,
        }
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        match self {
            AttributeData::F32(v) => v.len(),
            AttributeData::U8(v) => v.len(),
            AttributeData::U16(v) => v.len(),
            AttributeData::U32(v) => v.len(),
            AttributeData::I8(v) => v.len(),
            AttributeData::I16(v) => v.len(),
        }
    }

    /// `true` if there are no components.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The raw bytes uploaded to the buffer.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            AttributeData::F32(v) => bytemuck::cast_slice(v),
            AttributeData::U8(v) => v,
            AttributeData::U16(v) => bytemuck::cast_slice(v),
            AttributeData::U32(v) => bytemuck::cast_slice(v),
            AttributeData::I8(v) => bytemuck::cast_slice(v),
            AttributeData::I16(v) => bytemuck::cast_slice(v),
        }
    }

    /// The float components, if this is `F32` data.
    pub fn as_f32(&self) -> Option<&[f32]> {
        match self {
            AttributeData::F32(v) => Some(v),
            _ => None,
        }
    }
}

macro_rules! impl_from_data {
    ($($ty:ty => $variant:ident),*) => {
        $(
            impl From<Vec<$ty>> for AttributeData {
                fn from(data: Vec<$ty>) -> Self {
                    AttributeData::$variant(data)
                }
            }
        )*
    };
}

impl_from_data!(f32 => F32, u8 => U8, u16 => U16, u32 => U32, i8 => I8, i16 => I16);

/// One named vertex stream, or the index stream, of a geometry.
#[derive(Debug, Clone)]
pub struct Attribute {
    /// CPU copy of the data.
    pub(crate) data: AttributeData,
    /// Components per vertex (or per instance).
    pub size: u32,
    /// Instancing divisor, 0 for per-vertex data.
    pub instanced: u32,
    /// Normalize integer components to `[0, 1]` / `[-1, 1]`.
    pub normalized: bool,
    /// Byte stride between consecutive elements, 0 for tightly packed.
    pub stride: u32,
    /// Byte offset of the first element.
    pub offset: u32,
    /// Buffer usage hint.
    pub usage: BufferUsage,
    pub(crate) count: u32,
    pub(crate) buffer: Option<BufferHandle>,
    pub(crate) uploaded_len: usize,
    pub(crate) needs_update: bool,
}

impl Attribute {
    /// Tightly packed per-vertex data with `size` components per element.
    pub fn new(data: impl Into<AttributeData>, size: u32) -> Self {
        let mut attribute = Self {
            data: data.into(),
            size: size.max(1),
            instanced: 0,
            normalized: false,
            stride: 0,
            offset: 0,
            usage: BufferUsage::StaticDraw,
            count: 0,
            buffer: None,
            uploaded_len: 0,
            needs_update: false,
        };
        attribute.recount();
        attribute
    }

    /// Advances once every `divisor` instances instead of once per vertex.
    pub fn instanced(mut self, divisor: u32) -> Self {
        self.instanced = divisor;
        self
    }

    /// Normalizes integer components.
    pub fn normalized(mut self, normalized: bool) -> Self {
        self.normalized = normalized;
        self
    }

    /// Interleaved layout.
    pub fn interleaved(mut self, stride: u32, offset: u32) -> Self {
        self.stride = stride;
        self.offset = offset;
        self.recount();
        self
    }

    /// Buffer usage hint.
    pub fn with_usage(mut self, usage: BufferUsage) -> Self {
        self.usage = usage;
        self
    }

    /// The CPU data.
    pub fn data(&self) -> &AttributeData {
        &self.data
    }

    /// Replaces the data and schedules a re-upload on next draw.
    pub fn set_data(&mut self, data: impl Into<AttributeData>) {
        self.data = data.into();
        self.recount();
        self.needs_update = true;
    }

    /// Schedules a re-upload of the current data on next draw.
    pub fn mark_needs_update(&mut self) {
        self.needs_update = true;
    }

    /// `true` if the data changed since the last upload.
    pub fn needs_update(&self) -> bool {
        self.needs_update
    }

    /// Number of elements.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// The GPU buffer, once uploaded.
    pub fn buffer(&self) -> Option<BufferHandle> {
        self.buffer
    }

    fn recount(&mut self) {
        self.count = if self.stride > 0 {
            (self.data.as_bytes().len() / self.stride as usize) as u32
        } else {
            (self.data.len() / self.size as usize) as u32
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_elements() {
        let packed = Attribute::new(vec![0.0f32; 9], 3);
        assert_eq!(packed.count(), 3);
        let interleaved = Attribute::new(vec![0.0f32; 10], 3).interleaved(20, 0);
        assert_eq!(interleaved.count(), 2);
        let bytes = AttributeData::from(vec![1u16, 2, 3]);
        assert_eq!(bytes.as_bytes().len(), 6);
        assert_eq!(bytes.data_type(), DataType::UnsignedShort);
    }

    #[test]
    fn replacing_data_marks_for_upload() {
        let mut attribute = Attribute::new(vec![0.0f32; 6], 2);
        assert!(!attribute.needs_update());
        attribute.set_data(vec![0.0f32; 8]);
        assert!(attribute.needs_update());
        assert_eq!(attribute.count(), 4);
    }
}
