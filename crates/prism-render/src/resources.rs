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

//! Id-keyed storage for GPU resource objects.
//!
//! Meshes, uniforms and render passes refer to resources through small `Copy`
//! ids instead of references, so the scene graph never borrows the stores.

use crate::context::RenderContext;
use crate::geometry::{Geometry, GeometryDescriptor};
use crate::program::{Program, ProgramDescriptor, ProgramError};
use crate::render_target::{RenderTarget, RenderTargetDescriptor, RenderTargetError};
use crate::texture::{Texture, TextureDescriptor};
use prism_core::renderer::ResourceError;
use std::collections::HashMap;
use std::hash::Hash;

/// An id issued by a [`Store`].
pub trait ResourceId: Copy + Eq + Hash {
    /// Builds the id from its raw index.
    fn from_index(index: u32) -> Self;
    /// The raw index. Ids are issued in creation order, starting at 1.
    fn index(self) -> u32;
}

macro_rules! resource_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl ResourceId for $name {
            #[inline]
            fn from_index(index: u32) -> Self {
                Self(index)
            }

            #[inline]
            fn index(self) -> u32 {
                self.0
            }
        }
    };
}

resource_id!(
    /// Identifies a [`Program`]. Ordering follows creation order and is used to group draws.
    ProgramId
);
resource_id!(
    /// Identifies a [`Geometry`].
    GeometryId
);
resource_id!(
    /// Identifies a [`Texture`].
    TextureId
);
resource_id!(
    /// Identifies a [`RenderTarget`].
    RenderTargetId
);

/// A map from monotonically issued ids to values. Ids are never reused.
#[derive(Debug)]
pub struct Store<I, T> {
    items: HashMap<I, T>,
    next: u32,
}

impl<I, T> Default for Store<I, T> {
    fn default() -> Self {
        Self {
            items: HashMap::new(),
            next: 1,
        }
    }
}

impl<I: ResourceId, T> Store<I, T> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `item` under a fresh id.
    pub fn insert(&mut self, item: T) -> I {
        let id = I::from_index(self.next);
        self.next += 1;
        self.items.insert(id, item);
        id
    }

    /// Looks up an item.
    pub fn get(&self, id: I) -> Option<&T> {
        self.items.get(&id)
    }

    /// Looks up an item mutably.
    pub fn get_mut(&mut self, id: I) -> Option<&mut T> {
        self.items.get_mut(&id)
    }

    /// Takes an item out of the store.
    pub fn remove(&mut self, id: I) -> Option<T> {
        self.items.remove(&id)
    }

    /// `true` if `id` is live.
    pub fn contains(&self, id: I) -> bool {
        self.items.contains_key(&id)
    }

    /// Number of live items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates over live items in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> {
        self.items.iter().map(|(id, item)| (*id, item))
    }
}

/// Every GPU resource object created for one [`RenderContext`].
#[derive(Debug, Default)]
pub struct Resources {
    /// Linked programs.
    pub programs: Store<ProgramId, Program>,
    /// Vertex data.
    pub geometries: Store<GeometryId, Geometry>,
    /// Textures, including render target attachments.
    pub textures: Store<TextureId, Texture>,
    /// Offscreen framebuffers.
    pub render_targets: Store<RenderTargetId, RenderTarget>,
}

impl Resources {
    /// Creates empty stores.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles and links a program.
    pub fn create_program(
        &mut self,
        ctx: &mut RenderContext,
        descriptor: ProgramDescriptor,
    ) -> Result<ProgramId, ProgramError> {
        let program = Program::new(ctx, descriptor)?;
        Ok(self.programs.insert(program))
    }

    /// Uploads a geometry.
    pub fn create_geometry(
        &mut self,
        ctx: &mut RenderContext,
        descriptor: GeometryDescriptor,
    ) -> Result<GeometryId, ResourceError> {
        let geometry = Geometry::new(ctx, descriptor)?;
        Ok(self.geometries.insert(geometry))
    }

    /// Registers a texture. Its GPU object is created on first use.
    pub fn create_texture(&mut self, descriptor: TextureDescriptor) -> TextureId {
        self.textures.insert(Texture::new(descriptor))
    }

    /// Builds a framebuffer and registers its attachments as textures.
    pub fn create_render_target(
        &mut self,
        ctx: &mut RenderContext,
        descriptor: RenderTargetDescriptor,
    ) -> Result<RenderTargetId, RenderTargetError> {
        let target = RenderTarget::new(ctx, &mut self.textures, descriptor)?;
        Ok(self.render_targets.insert(target))
    }

    /// Deletes a program and its GPU object.
    pub fn remove_program(&mut self, ctx: &mut RenderContext, id: ProgramId) -> bool {
        self.programs
            .remove(id)
            .map(|program| program.remove(ctx))
            .is_some()
    }

    /// Deletes a geometry with its buffers and vertex arrays.
    pub fn remove_geometry(&mut self, ctx: &mut RenderContext, id: GeometryId) -> bool {
        self.geometries
            .remove(id)
            .map(|geometry| geometry.remove(ctx))
            .is_some()
    }

    /// Deletes a texture.
    pub fn remove_texture(&mut self, ctx: &mut RenderContext, id: TextureId) -> bool {
        self.textures
            .remove(id)
            .map(|texture| texture.remove(ctx))
            .is_some()
    }

    /// Deletes a render target together with its attachments.
    pub fn remove_render_target(&mut self, ctx: &mut RenderContext, id: RenderTargetId) -> bool {
        self.render_targets
            .remove(id)
            .map(|target| target.remove(ctx, &mut self.textures))
            .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_issued_in_order_and_never_reused() {
        let mut store: Store<GeometryId, &str> = Store::new();
        let a = store.insert("a");
        let b = store.insert("b");
        assert!(a < b);
        assert_eq!(store.remove(a), Some("a"));
        let c = store.insert("c");
        assert_ne!(a, c);
        assert_eq!(c.index(), 3);
        assert_eq!(store.len(), 2);
        assert!(!store.contains(a));
    }
}
