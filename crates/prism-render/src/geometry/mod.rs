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

//! Vertex and index buffers with a per-geometry vertex array cache.

mod attribute;

pub use self::attribute::{Attribute, AttributeData};

use crate::context::RenderContext;
use crate::program::Program;
use prism_core::math::{Aabb, Sphere, Vec3};
use prism_core::renderer::{
    BufferTarget, DataType, DrawMode, ResourceError, VertexArrayHandle, VertexAttribPointer,
};
use std::cell::OnceCell;
use std::collections::{BTreeMap, HashMap};

/// Name under which a descriptor entry is treated as the index stream.
pub const INDEX_ATTRIBUTE: &str = "index";

/// Name of the attribute bounds are computed from.
pub const POSITION_ATTRIBUTE: &str = "position";

/// Attributes to upload when creating a [`Geometry`].
#[derive(Debug, Clone, Default)]
pub struct GeometryDescriptor {
    /// Named vertex streams.
    pub attributes: Vec<(String, Attribute)>,
    /// Optional index stream.
    pub index: Option<Attribute>,
}

impl GeometryDescriptor {
    /// An empty descriptor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a vertex stream. The name `"index"` sets the index stream instead.
    pub fn attribute(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        let name = name.into();
        if name == INDEX_ATTRIBUTE {
            self.index = Some(attribute);
        } else {
            self.attributes.push((name, attribute));
        }
        self
    }

    /// Sets the index stream.
    pub fn index(mut self, index: Attribute) -> Self {
        self.index = Some(index);
        self
    }
}

/// The range of vertices (or indices) drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrawRange {
    /// First vertex or index.
    pub start: u32,
    /// Number of vertices or indices.
    pub count: u32,
}

/// Local-space extent of a geometry's positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Axis-aligned box.
    pub aabb: Aabb,
    /// Sphere centred on the box, through the furthest position.
    pub sphere: Sphere,
}

/// A set of vertex streams, an optional index stream and their vertex arrays.
///
/// Vertex arrays are cached by the consuming program's attribute signature, so
/// two programs with the same attribute layout share one.
#[derive(Debug)]
pub struct Geometry {
    attributes: BTreeMap<String, Attribute>,
    index: Option<Attribute>,
    draw_range: DrawRange,
    instanced_count: u32,
    is_instanced: bool,
    vaos: HashMap<String, VertexArrayHandle>,
    bounds: OnceCell<Option<Bounds>>,
}

impl Geometry {
    /// Uploads every stream of `descriptor`.
    pub fn new(ctx: &mut RenderContext, descriptor: GeometryDescriptor) -> Result<Self, ResourceError> {
        let mut geometry = Self {
            attributes: BTreeMap::new(),
            index: None,
            draw_range: DrawRange::default(),
            instanced_count: 0,
            is_instanced: false,
            vaos: HashMap::new(),
            bounds: OnceCell::new(),
        };
        if let Some(index) = descriptor.index {
            geometry.set_index(ctx, index)?;
        }
        for (name, attribute) in descriptor.attributes {
            geometry.add_attribute(ctx, name, attribute)?;
        }
        Ok(geometry)
    }

    /// Adds or replaces a vertex stream and uploads it.
    pub fn add_attribute(
        &mut self,
        ctx: &mut RenderContext,
        name: impl Into<String>,
        mut attribute: Attribute,
    ) -> Result<(), ResourceError> {
        let name = name.into();
        if name == INDEX_ATTRIBUTE {
            return self.set_index(ctx, attribute);
        }

        if attribute.instanced > 0 {
            self.is_instanced = true;
            let instances = attribute.count * attribute.instanced;
            if self.instanced_count != 0 && self.instanced_count != instances {
                log::warn!(
                    "Geometry: instanced attribute '{name}' covers {instances} instances, others cover {}",
                    self.instanced_count
                );
                self.instanced_count = self.instanced_count.min(instances);
            } else {
                self.instanced_count = instances;
            }
        } else if self.index.is_none() {
            self.draw_range.count = self.draw_range.count.max(attribute.count);
        }

        upload(ctx, BufferTarget::Array, &mut attribute)?;
        if name == POSITION_ATTRIBUTE {
            self.bounds = OnceCell::new();
        }
        if let Some(buffer) = self.attributes.insert(name, attribute).and_then(|p| p.buffer) {
            ctx.delete_buffer(buffer);
        }
        // Cached vertex arrays capture the stream set.
        self.clear_vertex_arrays(ctx);
        Ok(())
    }

    /// Sets the index stream. Indices must be unsigned integers.
    pub fn set_index(&mut self, ctx: &mut RenderContext, mut index: Attribute) -> Result<(), ResourceError> {
        if !matches!(
            index.data.data_type(),
            DataType::UnsignedByte | DataType::UnsignedShort | DataType::UnsignedInt
        ) {
            let message = format!("index data must be unsigned, got {}", index.data.data_type());
            log::error!("Geometry: {message}");
            return Err(ResourceError::BackendError(message));
        }
        index.size = 1;
        index.stride = 0;
        index.count = index.data.len() as u32;
        self.draw_range.count = index.count;

        upload(ctx, BufferTarget::ElementArray, &mut index)?;
        if let Some(buffer) = self.index.replace(index).and_then(|p| p.buffer) {
            ctx.delete_buffer(buffer);
        }
        self.clear_vertex_arrays(ctx);
        Ok(())
    }

    /// Replaces the data of a vertex stream; it is re-uploaded on next draw.
    /// Returns `false` if there is no such stream.
    pub fn update_attribute(&mut self, name: &str, data: impl Into<AttributeData>) -> bool {
        let Some(attribute) = self.attributes.get_mut(name) else {
            return false;
        };
        attribute.set_data(data);
        let count = attribute.count;
        let instanced = attribute.instanced;
        if instanced > 0 {
            self.instanced_count = count * instanced;
        } else if self.index.is_none() {
            self.draw_range.count = self
                .attributes
                .values()
                .filter(|a| a.instanced == 0)
                .map(|a| a.count)
                .max()
                .unwrap_or(0);
        }
        if name == POSITION_ATTRIBUTE {
            self.bounds = OnceCell::new();
        }
        true
    }

    /// Mutable access to a vertex stream, e.g. to call [`Attribute::mark_needs_update`].
    pub fn attribute_mut(&mut self, name: &str) -> Option<&mut Attribute> {
        if name == POSITION_ATTRIBUTE {
            self.bounds = OnceCell::new();
        }
        self.attributes.get_mut(name)
    }

    /// A vertex stream.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// The index stream.
    pub fn index(&self) -> Option<&Attribute> {
        self.index.as_ref()
    }

    /// Restricts drawing to `count` vertices or indices from `start`.
    pub fn set_draw_range(&mut self, start: u32, count: u32) {
        self.draw_range = DrawRange { start, count };
    }

    /// The current draw range.
    pub fn draw_range(&self) -> DrawRange {
        self.draw_range
    }

    /// Overrides the number of instances drawn.
    pub fn set_instanced_count(&mut self, count: u32) {
        self.instanced_count = count;
    }

    /// Number of instances drawn when instanced.
    pub fn instanced_count(&self) -> u32 {
        self.instanced_count
    }

    /// `true` once an instanced stream was added.
    pub fn is_instanced(&self) -> bool {
        self.is_instanced
    }

    /// Number of cached vertex arrays.
    pub fn vertex_array_count(&self) -> usize {
        self.vaos.len()
    }

    /// Binds the vertex array matching `program` (creating it on first use),
    /// re-uploads dirty streams and issues the draw call.
    pub fn draw(&mut self, ctx: &mut RenderContext, program: &Program, mode: DrawMode) -> Result<(), ResourceError> {
        for attribute in self.attributes.values_mut().filter(|a| a.needs_update) {
            upload(ctx, BufferTarget::Array, attribute)?;
        }
        if let Some(index) = self.index.as_mut().filter(|i| i.needs_update) {
            upload(ctx, BufferTarget::ElementArray, index)?;
        }

        if ctx.capabilities().vertex_array_objects {
            let vao = match self.vaos.get(program.attribute_order()) {
                Some(vao) => *vao,
                None => self.create_vertex_array(ctx, program)?,
            };
            ctx.bind_vertex_array(Some(vao));
        } else {
            ctx.bind_vertex_array(None);
            self.bind_attributes(ctx, program);
        }

        let mut instanced = self.is_instanced && self.instanced_count > 0;
        if instanced && !ctx.capabilities().instanced_arrays {
            ctx.warn(format_args!(
                "Geometry: instanced arrays are unavailable, drawing a single instance"
            ));
            instanced = false;
        }

        let DrawRange { start, count } = self.draw_range;
        let instances = self.instanced_count;
        let backend = ctx.backend_mut();
        match (&self.index, instanced) {
            (Some(index), true) => {
                let index_type = index.data.data_type();
                let offset = start * index_type.size_in_bytes();
                backend.draw_elements_instanced(mode, count, index_type, offset, instances);
            }
            (Some(index), false) => {
                let index_type = index.data.data_type();
                let offset = start * index_type.size_in_bytes();
                backend.draw_elements(mode, count, index_type, offset);
            }
            (None, true) => backend.draw_arrays_instanced(mode, start, count, instances),
            (None, false) => backend.draw_arrays(mode, start, count),
        }
        Ok(())
    }

    fn create_vertex_array(
        &mut self,
        ctx: &mut RenderContext,
        program: &Program,
    ) -> Result<VertexArrayHandle, ResourceError> {
        let vao = ctx.backend_mut().create_vertex_array()?;
        ctx.bind_vertex_array(Some(vao));
        self.bind_attributes(ctx, program);
        self.vaos.insert(program.attribute_order().to_string(), vao);
        log::debug!(
            "Geometry: created {vao:?} for layout [{}]",
            program.attribute_order()
        );
        Ok(vao)
    }

    /// Points every active attribute of `program` at its stream in the bound vertex array.
    fn bind_attributes(&self, ctx: &mut RenderContext, program: &Program) {
        let divisors = ctx.capabilities().instanced_arrays;
        for active in program.attributes() {
            let Some(attribute) = self.attributes.get(&active.name) else {
                ctx.warn(format_args!(
                    "Geometry: active attribute {} not being supplied",
                    active.name
                ));
                continue;
            };
            let Some(buffer) = attribute.buffer else { continue };
            ctx.bind_buffer(BufferTarget::Array, Some(buffer));

            // Matrices take one location per column.
            let columns = active.ty.attribute_locations();
            let (stride, offset) = if columns == 1 {
                (0, 0)
            } else {
                (columns * columns * 4, columns * 4)
            };
            let backend = ctx.backend_mut();
            for column in 0..columns {
                let location = active.location + column;
                backend.vertex_attrib_pointer(&VertexAttribPointer {
                    location,
                    size: attribute.size / columns,
                    data_type: attribute.data.data_type(),
                    normalized: attribute.normalized,
                    stride: attribute.stride + stride,
                    offset: attribute.offset + column * offset,
                });
                backend.enable_vertex_attrib_array(location);
                if divisors {
                    backend.vertex_attrib_divisor(location, attribute.instanced);
                }
            }
        }
        if let Some(buffer) = self.index.as_ref().and_then(|index| index.buffer) {
            ctx.bind_buffer(BufferTarget::ElementArray, Some(buffer));
        }
    }

    fn clear_vertex_arrays(&mut self, ctx: &mut RenderContext) {
        for (_, vao) in self.vaos.drain() {
            ctx.delete_vertex_array(vao);
        }
    }

    /// Box around the `position` stream, `None` without float positions.
    pub fn compute_bounding_box(&self) -> Option<Aabb> {
        Aabb::from_points(self.positions()?)
    }

    /// Sphere centred on the bounding box, through the furthest position.
    pub fn compute_bounding_sphere(&self) -> Option<Sphere> {
        let aabb = self.compute_bounding_box()?;
        Some(Sphere::enclosing(aabb.center(), self.positions()?))
    }

    /// Cached bounds, computed on first request.
    pub fn bounds(&self) -> Option<&Bounds> {
        self.bounds
            .get_or_init(|| {
                let aabb = self.compute_bounding_box()?;
                let sphere = Sphere::enclosing(aabb.center(), self.positions()?);
                Some(Bounds { aabb, sphere })
            })
            .as_ref()
    }

    fn positions(&self) -> Option<impl Iterator<Item = Vec3> + '_> {
        let attribute = self.attributes.get(POSITION_ATTRIBUTE)?;
        let data = attribute.data.as_f32()?;
        let size = attribute.size as usize;
        if !(2..=4).contains(&size) {
            return None;
        }
        let step = if attribute.stride > 0 {
            attribute.stride as usize / 4
        } else {
            size
        };
        let first = attribute.offset as usize / 4;
        let data = data.get(first..)?;
        Some(
            data.chunks(step.max(1))
                .filter(move |chunk| chunk.len() >= size)
                .map(move |chunk| Vec3::new(chunk[0], chunk[1], if size > 2 { chunk[2] } else { 0.0 })),
        )
    }

    /// Deletes the buffers and vertex arrays.
    pub fn remove(mut self, ctx: &mut RenderContext) {
        self.clear_vertex_arrays(ctx);
        let buffers = self
            .attributes
            .values()
            .chain(self.index.as_ref())
            .filter_map(|attribute| attribute.buffer);
        for buffer in buffers.collect::<Vec<_>>() {
            ctx.delete_buffer(buffer);
        }
    }
}

/// Creates the buffer on first upload; re-specifies storage when the size changed.
fn upload(ctx: &mut RenderContext, target: BufferTarget, attribute: &mut Attribute) -> Result<(), ResourceError> {
    let buffer = match attribute.buffer {
        Some(buffer) => buffer,
        None => {
            let buffer = ctx.backend_mut().create_buffer()?;
            attribute.buffer = Some(buffer);
            buffer
        }
    };
    if target == BufferTarget::ElementArray {
        // The element binding is vertex array state; keep other arrays untouched.
        ctx.bind_vertex_array(None);
    }
    ctx.bind_buffer(target, Some(buffer));
    let bytes = attribute.data.as_bytes();
    let backend = ctx.backend_mut();
    if attribute.uploaded_len == bytes.len() && !bytes.is_empty() {
        backend.buffer_sub_data(target, 0, bytes);
    } else {
        backend.buffer_data(target, bytes, attribute.usage);
    }
    attribute.uploaded_len = bytes.len();
    attribute.needs_update = false;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::ProgramDescriptor;
    use prism_core::renderer::ContextCapabilities;
    use prism_infra::HeadlessBackend;

    const VERTEX: &str = "
        attribute vec3 position;
        attribute vec3 offset;
        void main() { gl_Position = vec4(position + offset, 1.0); }
    ";
    const FRAGMENT: &str = "void main() { gl_FragColor = vec4(1.0); }";

    fn context(capabilities: ContextCapabilities) -> RenderContext {
        RenderContext::new(Box::new(HeadlessBackend::with_capabilities(8, 8, capabilities)))
    }

    fn headless(ctx: &RenderContext) -> &HeadlessBackend {
        ctx.backend_as::<HeadlessBackend>().unwrap()
    }

    fn triangle() -> GeometryDescriptor {
        GeometryDescriptor::new().attribute(
            POSITION_ATTRIBUTE,
            Attribute::new(vec![0.0f32, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 2.0, 0.0], 3),
        )
    }

    #[test]
    fn draw_range_follows_vertex_or_index_count() {
        let mut ctx = context(ContextCapabilities::webgl2());
        let plain = Geometry::new(&mut ctx, triangle()).unwrap();
        assert_eq!(plain.draw_range(), DrawRange { start: 0, count: 3 });

        let indexed = Geometry::new(
            &mut ctx,
            triangle().index(Attribute::new(vec![0u16, 1, 2, 2, 1, 0], 1)),
        )
        .unwrap();
        assert_eq!(indexed.draw_range().count, 6);
    }

    #[test]
    fn signed_indices_are_rejected() {
        let mut ctx = context(ContextCapabilities::webgl2());
        let result = Geometry::new(&mut ctx, triangle().index(Attribute::new(vec![0i16, 1, 2], 1)));
        assert!(matches!(result, Err(ResourceError::BackendError(_))));
    }

    #[test]
    fn mismatched_instance_counts_keep_the_smallest() {
        let mut ctx = context(ContextCapabilities::webgl2());
        let descriptor = triangle()
            .attribute("offset", Attribute::new(vec![0.0f32; 12], 3).instanced(1))
            .attribute("scale", Attribute::new(vec![1.0f32; 2], 1).instanced(1));
        let geometry = Geometry::new(&mut ctx, descriptor).unwrap();
        assert!(geometry.is_instanced());
        assert_eq!(geometry.instanced_count(), 2);
    }

    #[test]
    fn bounds_are_computed_from_positions() {
        let mut ctx = context(ContextCapabilities::webgl2());
        let geometry = Geometry::new(&mut ctx, triangle()).unwrap();
        let bounds = geometry.bounds().copied().unwrap();
        assert_eq!(bounds.aabb.min, Vec3::ZERO);
        assert_eq!(bounds.aabb.max, Vec3::new(2.0, 2.0, 0.0));
        assert_eq!(bounds.sphere.center, Vec3::new(1.0, 1.0, 0.0));
        assert!((bounds.sphere.radius - 2.0f32.sqrt()).abs() < 1e-5);
    }

    #[test]
    fn updating_positions_refreshes_bounds_and_reuploads() {
        let mut ctx = context(ContextCapabilities::webgl2());
        let program = Program::new(&mut ctx, ProgramDescriptor::new(VERTEX, FRAGMENT)).unwrap();
        let mut geometry = Geometry::new(&mut ctx, triangle()).unwrap();
        assert_eq!(geometry.bounds().map(|b| b.aabb.max.x), Some(2.0));

        assert!(geometry.update_attribute(POSITION_ATTRIBUTE, vec![0.0f32, 0.0, 0.0, 4.0, 0.0, 0.0]));
        assert_eq!(geometry.bounds().map(|b| b.aabb.max.x), Some(4.0));
        assert_eq!(geometry.draw_range().count, 2);

        geometry.draw(&mut ctx, &program, DrawMode::Lines).unwrap();
        let buffer = geometry.attribute(POSITION_ATTRIBUTE).and_then(|a| a.buffer()).unwrap();
        assert_eq!(headless(&ctx).buffer_contents(buffer).map(|b| b.len()), Some(24));
        assert!(!geometry.attribute(POSITION_ATTRIBUTE).unwrap().needs_update());
    }

    #[test]
    fn draws_without_vertex_arrays_or_instancing() {
        let mut ctx = context(ContextCapabilities::webgl1());
        let program = Program::new(&mut ctx, ProgramDescriptor::new(VERTEX, FRAGMENT)).unwrap();
        let descriptor =
            triangle().attribute("offset", Attribute::new(vec![0.0f32; 6], 3).instanced(1));
        let mut geometry = Geometry::new(&mut ctx, descriptor).unwrap();

        geometry.draw(&mut ctx, &program, DrawMode::Triangles).unwrap();
        geometry.draw(&mut ctx, &program, DrawMode::Triangles).unwrap();

        assert_eq!(geometry.vertex_array_count(), 0);
        let backend = headless(&ctx);
        assert_eq!(backend.calls("draw_arrays"), 2);
        assert_eq!(backend.calls("draw_arrays_instanced"), 0);
        assert_eq!(backend.calls("vertex_attrib_divisor"), 0);
        assert_eq!(backend.calls("vertex_attrib_pointer"), 4);
    }

    #[test]
    fn instanced_indexed_draw_uses_byte_offsets() {
        let mut ctx = context(ContextCapabilities::webgl2());
        let program = Program::new(&mut ctx, ProgramDescriptor::new(VERTEX, FRAGMENT)).unwrap();
        let descriptor = triangle()
            .index(Attribute::new(vec![0u32, 1, 2, 0, 2, 1], 1))
            .attribute("offset", Attribute::new(vec![0.0f32; 15], 3).instanced(1));
        let mut geometry = Geometry::new(&mut ctx, descriptor).unwrap();
        geometry.set_draw_range(3, 3);
        geometry.draw(&mut ctx, &program, DrawMode::Triangles).unwrap();

        let draw = headless(&ctx).draws().last().cloned().unwrap();
        assert_eq!(draw.instances, 5);
        assert_eq!(draw.count, 3);
        assert_eq!(draw.first, 12);
        assert_eq!(draw.index_type, Some(DataType::UnsignedInt));
    }

    #[test]
    fn streams_added_after_a_draw_reach_the_next_vertex_array() {
        let mut ctx = context(ContextCapabilities::webgl2());
        let program = Program::new(&mut ctx, ProgramDescriptor::new(VERTEX, FRAGMENT)).unwrap();
        let mut geometry = Geometry::new(&mut ctx, triangle()).unwrap();
        geometry.draw(&mut ctx, &program, DrawMode::Triangles).unwrap();
        let first = headless(&ctx).draws().last().and_then(|d| d.vertex_array).unwrap();

        geometry
            .add_attribute(&mut ctx, "offset", Attribute::new(vec![0.0f32; 12], 3).instanced(1))
            .unwrap();
        geometry
            .set_index(&mut ctx, Attribute::new(vec![0u16, 1, 2], 1))
            .unwrap();
        geometry.draw(&mut ctx, &program, DrawMode::Triangles).unwrap();

        let draw = headless(&ctx).draws().last().cloned().unwrap();
        assert_eq!(draw.instances, 4);
        assert_eq!(draw.index_type, Some(DataType::UnsignedShort));
        assert_ne!(draw.vertex_array, Some(first));
        assert_eq!(geometry.vertex_array_count(), 1);

        let vao = headless(&ctx).vertex_array(draw.vertex_array).unwrap();
        assert_eq!(vao.attributes.len(), 2);
        assert_eq!(vao.element_buffer, geometry.index().and_then(|i| i.buffer()));
        assert!(headless(&ctx).vertex_array(Some(first)).is_none());
    }

    #[test]
    fn remove_deletes_gpu_objects() {
        let mut ctx = context(ContextCapabilities::webgl2());
        let program = Program::new(&mut ctx, ProgramDescriptor::new(VERTEX, FRAGMENT)).unwrap();
        let mut geometry = Geometry::new(
            &mut ctx,
            triangle().index(Attribute::new(vec![0u8, 1, 2], 1)),
        )
        .unwrap();
        geometry.draw(&mut ctx, &program, DrawMode::Triangles).unwrap();
        assert_eq!(headless(&ctx).buffer_count(), 2);
        assert_eq!(headless(&ctx).vertex_array_count(), 1);

        geometry.remove(&mut ctx);
        assert_eq!(headless(&ctx).buffer_count(), 0);
        assert_eq!(headless(&ctx).vertex_array_count(), 0);
    }
}
