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

//! Offscreen framebuffers with texture and renderbuffer attachments.

use crate::context::RenderContext;
use crate::resources::{Store, TextureId};
use crate::texture::{Texture, TextureDescriptor, TextureSource};
use prism_core::renderer::{
    Attachment, DataType, FramebufferHandle, FramebufferStatus, InternalFormat, PixelFormat,
    RenderbufferFormat, RenderbufferHandle, ResourceError, TexImageTarget, TextureFilter,
    TextureTarget, TextureWrap,
};
use thiserror::Error;

/// Errors raised while building a [`RenderTarget`].
#[derive(Debug, Error)]
pub enum RenderTargetError {
    /// The framebuffer failed its completeness check.
    #[error("render target is incomplete: {0}")]
    Incomplete(FramebufferStatus),
    /// More color attachments were requested than the context can draw to.
    #[error("{requested} color attachments requested, the context supports {supported}")]
    TooManyAttachments {
        /// Requested count.
        requested: u32,
        /// Reported `max_draw_buffers`.
        supported: u32,
    },
    /// A GPU object could not be created.
    #[error(transparent)]
    Resource(#[from] ResourceError),
}

/// Options of a [`RenderTarget`].
#[derive(Debug, Clone, PartialEq)]
pub struct RenderTargetDescriptor {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Number of color textures.
    pub color: u32,
    /// Attach depth storage.
    pub depth: bool,
    /// Attach stencil storage.
    pub stencil: bool,
    /// Store depth in a sampleable texture instead of a renderbuffer.
    pub depth_texture: bool,
    /// Make the depth texture a cube map, e.g. for point-light shadows.
    pub depth_cube: bool,
    /// Color texture minification filter.
    pub min_filter: TextureFilter,
    /// Color texture magnification filter.
    pub mag_filter: TextureFilter,
    /// Color texture wrap along S.
    pub wrap_s: TextureWrap,
    /// Color texture wrap along T.
    pub wrap_t: TextureWrap,
    /// Color texture pixel format.
    pub format: PixelFormat,
    /// Color texture storage format.
    pub internal_format: InternalFormat,
    /// Color texture component type.
    pub data_type: DataType,
}

impl Default for RenderTargetDescriptor {
    fn default() -> Self {
        Self {
            width: 300,
            height: 150,
            color: 1,
            depth: true,
            stencil: false,
            depth_texture: false,
            depth_cube: false,
            min_filter: TextureFilter::Linear,
            mag_filter: TextureFilter::Linear,
            wrap_s: TextureWrap::ClampToEdge,
            wrap_t: TextureWrap::ClampToEdge,
            format: PixelFormat::Rgba,
            internal_format: InternalFormat::Rgba,
            data_type: DataType::UnsignedByte,
        }
    }
}

impl RenderTargetDescriptor {
    /// A target of the given size with the default attachments.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    fn color_texture(&self) -> TextureDescriptor {
        TextureDescriptor {
            source: TextureSource::Empty {
                width: self.width,
                height: self.height,
            },
            format: self.format,
            internal_format: self.internal_format,
            data_type: self.data_type,
            wrap_s: self.wrap_s,
            wrap_t: self.wrap_t,
            generate_mipmaps: false,
            min_filter: Some(self.min_filter),
            mag_filter: self.mag_filter,
            flip_y: Some(false),
            ..Default::default()
        }
    }

    fn depth_texture(&self, webgl2: bool) -> TextureDescriptor {
        TextureDescriptor {
            target: if self.depth_cube {
                TextureTarget::CubeMap
            } else {
                TextureTarget::Texture2D
            },
            source: TextureSource::Empty {
                width: self.width,
                height: self.height,
            },
            format: PixelFormat::DepthComponent,
            internal_format: if webgl2 {
                InternalFormat::DepthComponent16
            } else {
                InternalFormat::DepthComponent
            },
            data_type: DataType::UnsignedInt,
            generate_mipmaps: false,
            min_filter: Some(TextureFilter::Nearest),
            mag_filter: TextureFilter::Nearest,
            flip_y: Some(false),
            ..Default::default()
        }
    }
}

/// A renderbuffer and the attachment point it occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RenderbufferAttachment {
    handle: RenderbufferHandle,
    attachment: Attachment,
    format: RenderbufferFormat,
}

/// A framebuffer with its attachments.
///
/// Attachment textures live in the shared texture store so they can be bound
/// as uniform values like any other texture.
#[derive(Debug)]
pub struct RenderTarget {
    framebuffer: FramebufferHandle,
    width: u32,
    height: u32,
    textures: Vec<TextureId>,
    depth_texture: Option<TextureId>,
    renderbuffer: Option<RenderbufferAttachment>,
}

impl RenderTarget {
    /// Allocates the framebuffer and attachments, then checks completeness.
    ///
    /// The previously bound framebuffer is restored before returning.
    pub fn new(
        ctx: &mut RenderContext,
        textures: &mut Store<TextureId, Texture>,
        descriptor: RenderTargetDescriptor,
    ) -> Result<Self, RenderTargetError> {
        let capabilities = *ctx.capabilities();
        if descriptor.color > capabilities.max_draw_buffers.max(1) {
            log::error!(
                "RenderTarget: {} color attachments requested, max is {}",
                descriptor.color,
                capabilities.max_draw_buffers
            );
            return Err(RenderTargetError::TooManyAttachments {
                requested: descriptor.color,
                supported: capabilities.max_draw_buffers,
            });
        }

        let previous = ctx.state().framebuffer;
        let framebuffer = ctx.backend_mut().create_framebuffer()?;
        ctx.bind_framebuffer(Some(framebuffer));

        let mut target = Self {
            framebuffer,
            width: descriptor.width,
            height: descriptor.height,
            textures: Vec::with_capacity(descriptor.color as usize),
            depth_texture: None,
            renderbuffer: None,
        };

        let result = target.attach(ctx, textures, &descriptor);
        let result = result.and_then(|()| match ctx.backend().check_framebuffer_status() {
            FramebufferStatus::Complete => Ok(()),
            status => {
                log::error!("RenderTarget: framebuffer incomplete ({status})");
                Err(RenderTargetError::Incomplete(status))
            }
        });
        ctx.bind_framebuffer(previous);

        match result {
            Ok(()) => {
                log::debug!(
                    "RenderTarget: created {framebuffer:?} {}x{} with {} color attachment(s)",
                    target.width,
                    target.height,
                    target.textures.len()
                );
                Ok(target)
            }
            Err(err) => {
                target.remove(ctx, textures);
                Err(err)
            }
        }
    }

    fn attach(
        &mut self,
        ctx: &mut RenderContext,
        textures: &mut Store<TextureId, Texture>,
        descriptor: &RenderTargetDescriptor,
    ) -> Result<(), RenderTargetError> {
        let capabilities = *ctx.capabilities();

        let mut draw_buffers = Vec::with_capacity(descriptor.color as usize);
        for index in 0..descriptor.color {
            let mut texture = Texture::new(descriptor.color_texture());
            let handle = texture.update(ctx, 0)?;
            ctx.backend_mut().framebuffer_texture_2d(
                Attachment::Color(index),
                TexImageTarget::Texture2D,
                handle,
                0,
            );
            self.textures.push(textures.insert(texture));
            draw_buffers.push(Attachment::Color(index));
        }
        if draw_buffers.len() > 1 {
            ctx.backend_mut().draw_buffers(&draw_buffers);
        }

        let mut use_depth_renderbuffer = descriptor.depth;
        if descriptor.depth_texture {
            if capabilities.depth_textures {
                let mut texture = Texture::new(descriptor.depth_texture(capabilities.webgl2));
                let handle = texture.update(ctx, 0)?;
                let image = match texture.target() {
                    TextureTarget::CubeMap => TexImageTarget::CubeFace(0),
                    TextureTarget::Texture2D => TexImageTarget::Texture2D,
                };
                ctx.backend_mut()
                    .framebuffer_texture_2d(Attachment::Depth, image, handle, 0);
                self.depth_texture = Some(textures.insert(texture));
                use_depth_renderbuffer = false;
            } else {
                log::warn!("RenderTarget: depth textures are not supported, using a depth renderbuffer");
                use_depth_renderbuffer = true;
            }
        }

        let renderbuffer = match (use_depth_renderbuffer, descriptor.stencil) {
            (true, false) => Some((RenderbufferFormat::DepthComponent16, Attachment::Depth)),
            (false, true) if self.depth_texture.is_none() => {
                Some((RenderbufferFormat::StencilIndex8, Attachment::Stencil))
            }
            (true, true) => Some((RenderbufferFormat::DepthStencil, Attachment::DepthStencil)),
            _ => None,
        };
        if let Some((format, attachment)) = renderbuffer {
            let backend = ctx.backend_mut();
            let handle = backend.create_renderbuffer()?;
            backend.bind_renderbuffer(Some(handle));
            backend.renderbuffer_storage(format, self.width, self.height);
            backend.framebuffer_renderbuffer(attachment, handle);
            self.renderbuffer = Some(RenderbufferAttachment {
                handle,
                attachment,
                format,
            });
        }
        Ok(())
    }

    /// The framebuffer object.
    pub fn framebuffer(&self) -> FramebufferHandle {
        self.framebuffer
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Color attachments in attachment order.
    pub fn textures(&self) -> &[TextureId] {
        &self.textures
    }

    /// The first color attachment.
    pub fn texture(&self) -> Option<TextureId> {
        self.textures.first().copied()
    }

    /// The depth texture, if depth is stored in one.
    pub fn depth_texture(&self) -> Option<TextureId> {
        self.depth_texture
    }

    /// Binds the framebuffer through the state cache.
    pub fn bind(&self, ctx: &mut RenderContext) {
        ctx.bind_framebuffer(Some(self.framebuffer));
    }

    /// Attaches one face of a cube depth texture, leaving this framebuffer bound.
    ///
    /// Returns `false` when the target has no cube depth texture.
    pub fn set_cube_face(
        &self,
        ctx: &mut RenderContext,
        textures: &Store<TextureId, Texture>,
        face: u8,
    ) -> bool {
        let Some(texture) = self.depth_texture.and_then(|id| textures.get(id)) else {
            return false;
        };
        let (TextureTarget::CubeMap, Some(handle)) = (texture.target(), texture.handle()) else {
            return false;
        };
        if face >= 6 {
            log::warn!("RenderTarget: cube face {face} out of range");
            return false;
        }
        self.bind(ctx);
        ctx.backend_mut().framebuffer_texture_2d(
            Attachment::Depth,
            TexImageTarget::CubeFace(face),
            handle,
            0,
        );
        true
    }

    /// Reallocates every attachment at a new size.
    pub fn resize(
        &mut self,
        ctx: &mut RenderContext,
        textures: &mut Store<TextureId, Texture>,
        width: u32,
        height: u32,
    ) -> Result<(), ResourceError> {
        if (self.width, self.height) == (width, height) {
            return Ok(());
        }
        self.width = width;
        self.height = height;

        for id in self.textures.iter().chain(self.depth_texture.iter()) {
            if let Some(texture) = textures.get_mut(*id) {
                texture.resize(width, height);
                texture.update(ctx, 0)?;
            }
        }
        if let Some(renderbuffer) = self.renderbuffer {
            let backend = ctx.backend_mut();
            backend.bind_renderbuffer(Some(renderbuffer.handle));
            backend.renderbuffer_storage(renderbuffer.format, width, height);
        }
        log::debug!("RenderTarget: resized {:?} to {width}x{height}", self.framebuffer);
        Ok(())
    }

    /// Deletes the framebuffer, its renderbuffer and its attachment textures.
    pub fn remove(self, ctx: &mut RenderContext, textures: &mut Store<TextureId, Texture>) {
        for id in self.textures.into_iter().chain(self.depth_texture) {
            if let Some(texture) = textures.remove(id) {
                texture.remove(ctx);
            }
        }
        if let Some(renderbuffer) = self.renderbuffer {
            ctx.backend_mut().delete_renderbuffer(renderbuffer.handle);
        }
        ctx.delete_framebuffer(self.framebuffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_core::renderer::ContextCapabilities;
    use prism_infra::graphics::headless::AttachmentSource;
    use prism_infra::HeadlessBackend;

    fn context(capabilities: ContextCapabilities) -> RenderContext {
        RenderContext::new(Box::new(HeadlessBackend::with_capabilities(8, 8, capabilities)))
    }

    fn attachments(ctx: &RenderContext, target: &RenderTarget) -> Vec<Attachment> {
        let backend = ctx.backend_as::<HeadlessBackend>().unwrap();
        let mut points: Vec<_> = backend
            .framebuffer(target.framebuffer())
            .unwrap()
            .attachments
            .keys()
            .copied()
            .collect();
        points.sort_by_key(|point| format!("{point:?}"));
        points
    }

    #[test]
    fn default_target_has_color_and_depth_renderbuffer() {
        let mut ctx = context(ContextCapabilities::webgl2());
        let mut textures = Store::new();
        let target = RenderTarget::new(&mut ctx, &mut textures, RenderTargetDescriptor::new(64, 32)).unwrap();

        assert_eq!(attachments(&ctx, &target), vec![Attachment::Color(0), Attachment::Depth]);
        assert_eq!(textures.len(), 1);
        assert_eq!(ctx.state().framebuffer, None);
        let backend = ctx.backend_as::<HeadlessBackend>().unwrap();
        assert_eq!(backend.state().framebuffer, None);
    }

    #[test]
    fn depth_and_stencil_share_one_renderbuffer() {
        let mut ctx = context(ContextCapabilities::webgl2());
        let mut textures = Store::new();
        let descriptor = RenderTargetDescriptor {
            stencil: true,
            ..RenderTargetDescriptor::new(16, 16)
        };
        let target = RenderTarget::new(&mut ctx, &mut textures, descriptor).unwrap();
        assert_eq!(
            attachments(&ctx, &target),
            vec![Attachment::Color(0), Attachment::DepthStencil]
        );
    }

    #[test]
    fn stencil_only_target() {
        let mut ctx = context(ContextCapabilities::webgl2());
        let mut textures = Store::new();
        let descriptor = RenderTargetDescriptor {
            depth: false,
            stencil: true,
            ..RenderTargetDescriptor::new(16, 16)
        };
        let target = RenderTarget::new(&mut ctx, &mut textures, descriptor).unwrap();
        assert_eq!(attachments(&ctx, &target), vec![Attachment::Color(0), Attachment::Stencil]);
    }

    #[test]
    fn multiple_color_attachments_set_draw_buffers() {
        let mut ctx = context(ContextCapabilities::webgl2());
        let mut textures = Store::new();
        let descriptor = RenderTargetDescriptor {
            color: 3,
            depth: false,
            ..RenderTargetDescriptor::new(16, 16)
        };
        let target = RenderTarget::new(&mut ctx, &mut textures, descriptor).unwrap();
        assert_eq!(target.textures().len(), 3);
        let backend = ctx.backend_as::<HeadlessBackend>().unwrap();
        assert_eq!(
            backend.framebuffer(target.framebuffer()).unwrap().draw_buffers,
            vec![Attachment::Color(0), Attachment::Color(1), Attachment::Color(2)]
        );
    }

    #[test]
    fn too_many_color_attachments_are_refused() {
        let mut ctx = context(ContextCapabilities::webgl1());
        let mut textures = Store::new();
        let descriptor = RenderTargetDescriptor {
            color: 2,
            ..RenderTargetDescriptor::new(16, 16)
        };
        let err = RenderTarget::new(&mut ctx, &mut textures, descriptor).unwrap_err();
        assert!(matches!(err, RenderTargetError::TooManyAttachments { requested: 2, .. }));
    }

    #[test]
    fn depth_texture_falls_back_without_support() {
        let mut ctx = context(ContextCapabilities::webgl1());
        let mut textures = Store::new();
        let descriptor = RenderTargetDescriptor {
            depth_texture: true,
            ..RenderTargetDescriptor::new(16, 16)
        };
        let target = RenderTarget::new(&mut ctx, &mut textures, descriptor).unwrap();
        assert_eq!(target.depth_texture(), None);
        assert_eq!(attachments(&ctx, &target), vec![Attachment::Color(0), Attachment::Depth]);
    }

    #[test]
    fn cube_depth_texture_faces_can_be_switched() {
        let mut ctx = context(ContextCapabilities::webgl2());
        let mut textures = Store::new();
        let descriptor = RenderTargetDescriptor {
            depth_texture: true,
            depth_cube: true,
            ..RenderTargetDescriptor::new(16, 16)
        };
        let target = RenderTarget::new(&mut ctx, &mut textures, descriptor).unwrap();
        assert!(target.set_cube_face(&mut ctx, &textures, 3));
        assert!(!target.set_cube_face(&mut ctx, &textures, 6));

        let backend = ctx.backend_as::<HeadlessBackend>().unwrap();
        let source = backend.framebuffer(target.framebuffer()).unwrap().attachments[&Attachment::Depth];
        assert!(matches!(
            source,
            AttachmentSource::Texture {
                target: TexImageTarget::CubeFace(3),
                ..
            }
        ));
        assert_eq!(ctx.state().framebuffer, Some(target.framebuffer()));
    }

    #[test]
    fn incomplete_targets_are_reported_and_cleaned_up() {
        let mut ctx = context(ContextCapabilities::webgl2());
        let mut textures = Store::new();
        let descriptor = RenderTargetDescriptor {
            color: 0,
            depth: false,
            ..RenderTargetDescriptor::new(16, 16)
        };
        let err = RenderTarget::new(&mut ctx, &mut textures, descriptor).unwrap_err();
        assert!(matches!(
            err,
            RenderTargetError::Incomplete(FramebufferStatus::MissingAttachment)
        ));
        assert_eq!(ctx.backend_as::<HeadlessBackend>().unwrap().calls("delete_framebuffer"), 1);
    }

    #[test]
    fn resize_reallocates_attachments() {
        let mut ctx = context(ContextCapabilities::webgl2());
        let mut textures = Store::new();
        let mut target = RenderTarget::new(&mut ctx, &mut textures, RenderTargetDescriptor::new(8, 8)).unwrap();
        target.resize(&mut ctx, &mut textures, 32, 16).unwrap();

        let handle = textures.get(target.texture().unwrap()).unwrap().handle().unwrap();
        let backend = ctx.backend_as::<HeadlessBackend>().unwrap();
        let image = backend.texture(handle).unwrap().images[&(TexImageTarget::Texture2D, 0)];
        assert_eq!((image.width, image.height), (32, 16));
        assert_eq!(target.width(), 32);
    }
}
