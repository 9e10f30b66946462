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

//! 2D and cube textures with lazily created GPU objects.
//!
//! A [`Texture`] keeps two copies of its sampler parameters: the requested
//! ones and the ones last sent to the GPU. Parameters are only pushed when
//! the two differ, and pixels only when the texture is marked for upload.

mod source;

pub use self::source::TextureImage;

use crate::context::RenderContext;
use prism_core::math::is_power_of_two;
use prism_core::renderer::{
    DataType, InternalFormat, PixelFormat, PixelStore, ResourceError, TexImage, TexImageTarget,
    TextureFilter, TextureHandle, TextureParameter, TextureTarget, TextureWrap,
};

/// Where a texture's pixels come from.
#[derive(Debug, Clone, PartialEq)]
pub enum TextureSource {
    /// Storage without data, e.g. a render target attachment.
    Empty {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },
    /// One 2D image.
    Image(TextureImage),
    /// Six cube faces in `+X, -X, +Y, -Y, +Z, -Z` order.
    Cube(Vec<TextureImage>),
}

impl TextureSource {
    /// Size of the (first) image.
    pub fn size(&self) -> (u32, u32) {
        match self {
            TextureSource::Empty { width, height } => (*width, *height),
            TextureSource::Image(image) => (image.width, image.height),
            TextureSource::Cube(faces) => faces
                .first()
                .map(|face| (face.width, face.height))
                .unwrap_or((0, 0)),
        }
    }

    fn has_pixels(&self) -> bool {
        !matches!(self, TextureSource::Empty { .. })
    }
}

/// Options of a [`Texture`].
#[derive(Debug, Clone, PartialEq)]
pub struct TextureDescriptor {
    /// 2D or cube.
    pub target: TextureTarget,
    /// Pixel source.
    pub source: TextureSource,
    /// Layout of the supplied pixels.
    pub format: PixelFormat,
    /// GPU storage format.
    pub internal_format: InternalFormat,
    /// Component type of the supplied pixels.
    pub data_type: DataType,
    /// Wrap along S.
    pub wrap_s: TextureWrap,
    /// Wrap along T.
    pub wrap_t: TextureWrap,
    /// Build mipmaps after each upload.
    pub generate_mipmaps: bool,
    /// Minification filter, `None` picks one matching `generate_mipmaps`.
    pub min_filter: Option<TextureFilter>,
    /// Magnification filter.
    pub mag_filter: TextureFilter,
    /// Flip rows on upload, `None` flips 2D textures only.
    pub flip_y: Option<bool>,
    /// Premultiply alpha on upload.
    pub premultiply_alpha: bool,
    /// Row alignment of the supplied pixels.
    pub unpack_alignment: u32,
    /// Anisotropic filtering level, 0 to leave it off.
    pub anisotropy: f32,
    /// Mip level written by uploads.
    pub level: u32,
}

impl Default for TextureDescriptor {
    fn default() -> Self {
        Self {
            target: TextureTarget::Texture2D,
            source: TextureSource::Empty {
                width: 0,
                height: 0,
            },
            format: PixelFormat::Rgba,
            internal_format: InternalFormat::Rgba,
            data_type: DataType::UnsignedByte,
            wrap_s: TextureWrap::ClampToEdge,
            wrap_t: TextureWrap::ClampToEdge,
            generate_mipmaps: true,
            min_filter: None,
            mag_filter: TextureFilter::Linear,
            flip_y: None,
            premultiply_alpha: false,
            unpack_alignment: 4,
            anisotropy: 0.0,
            level: 0,
        }
    }
}

impl TextureDescriptor {
    /// A 2D texture from one image.
    pub fn from_image(image: TextureImage) -> Self {
        Self {
            source: TextureSource::Image(image),
            ..Default::default()
        }
    }

    /// A cube texture from six faces.
    pub fn cube(faces: Vec<TextureImage>) -> Self {
        Self {
            target: TextureTarget::CubeMap,
            source: TextureSource::Cube(faces),
            ..Default::default()
        }
    }

    /// Storage without pixels, e.g. for a render target.
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            source: TextureSource::Empty { width, height },
            generate_mipmaps: false,
            ..Default::default()
        }
    }
}

/// Sampler parameters as known to the GPU.
#[derive(Debug, Clone, Copy, PartialEq)]
struct SamplerState {
    min_filter: TextureFilter,
    mag_filter: TextureFilter,
    wrap_s: TextureWrap,
    wrap_t: TextureWrap,
    anisotropy: f32,
}

impl Default for SamplerState {
    fn default() -> Self {
        Self {
            min_filter: TextureFilter::NearestMipmapLinear,
            mag_filter: TextureFilter::Linear,
            wrap_s: TextureWrap::Repeat,
            wrap_t: TextureWrap::Repeat,
            anisotropy: 0.0,
        }
    }
}

/// A texture and the shadow of its GPU-side parameters.
#[derive(Debug)]
pub struct Texture {
    handle: Option<TextureHandle>,
    target: TextureTarget,
    source: TextureSource,
    format: PixelFormat,
    internal_format: InternalFormat,
    data_type: DataType,
    generate_mipmaps: bool,
    flip_y: bool,
    premultiply_alpha: bool,
    unpack_alignment: u32,
    level: u32,
    requested: SamplerState,
    applied: SamplerState,
    needs_update: bool,
}

impl Texture {
    /// Creates the CPU side. The GPU object is created on the first [`Texture::update`].
    pub fn new(descriptor: TextureDescriptor) -> Self {
        let min_filter = descriptor.min_filter.unwrap_or(if descriptor.generate_mipmaps {
            TextureFilter::NearestMipmapLinear
        } else {
            TextureFilter::Linear
        });
        Self {
            handle: None,
            target: descriptor.target,
            flip_y: descriptor
                .flip_y
                .unwrap_or(descriptor.target == TextureTarget::Texture2D),
            source: descriptor.source,
            format: descriptor.format,
            internal_format: descriptor.internal_format,
            data_type: descriptor.data_type,
            generate_mipmaps: descriptor.generate_mipmaps,
            premultiply_alpha: descriptor.premultiply_alpha,
            unpack_alignment: descriptor.unpack_alignment,
            level: descriptor.level,
            requested: SamplerState {
                min_filter,
                mag_filter: descriptor.mag_filter,
                wrap_s: descriptor.wrap_s,
                wrap_t: descriptor.wrap_t,
                anisotropy: descriptor.anisotropy,
            },
            applied: SamplerState::default(),
            needs_update: true,
        }
    }

    /// The GPU object, once created.
    pub fn handle(&self) -> Option<TextureHandle> {
        self.handle
    }

    /// 2D or cube.
    pub fn target(&self) -> TextureTarget {
        self.target
    }

    /// Size of the source in pixels.
    pub fn size(&self) -> (u32, u32) {
        self.source.size()
    }

    /// The pixel source.
    pub fn source(&self) -> &TextureSource {
        &self.source
    }

    /// `true` if the pixels will be uploaded on next update.
    pub fn needs_update(&self) -> bool {
        self.needs_update
    }

    /// Whether mipmaps are generated after uploads.
    pub fn generates_mipmaps(&self) -> bool {
        self.generate_mipmaps
    }

    /// Replaces the 2D image.
    pub fn set_image(&mut self, image: TextureImage) {
        self.source = TextureSource::Image(image);
        self.needs_update = true;
    }

    /// Replaces the cube faces.
    pub fn set_cube_images(&mut self, faces: Vec<TextureImage>) {
        self.source = TextureSource::Cube(faces);
        self.needs_update = true;
    }

    /// Reallocates pixel-less storage at a new size.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.source = TextureSource::Empty { width, height };
        self.needs_update = true;
    }

    /// Re-uploads the current source on next update, e.g. after editing pixels in place.
    pub fn mark_needs_update(&mut self) {
        self.needs_update = true;
    }

    /// Mutable access to the 2D pixels. Call [`Texture::mark_needs_update`] afterwards.
    pub fn image_mut(&mut self) -> Option<&mut TextureImage> {
        match &mut self.source {
            TextureSource::Image(image) => Some(image),
            _ => None,
        }
    }

    /// Sets the filters; pushed on next update.
    pub fn set_filters(&mut self, min_filter: TextureFilter, mag_filter: TextureFilter) {
        self.requested.min_filter = min_filter;
        self.requested.mag_filter = mag_filter;
    }

    /// Sets the wrap modes; pushed on next update.
    pub fn set_wrap(&mut self, wrap_s: TextureWrap, wrap_t: TextureWrap) {
        self.requested.wrap_s = wrap_s;
        self.requested.wrap_t = wrap_t;
    }

    /// Sets the anisotropy level; pushed on next update when supported.
    pub fn set_anisotropy(&mut self, anisotropy: f32) {
        self.requested.anisotropy = anisotropy;
    }

    /// Creates the GPU object if needed and binds it to `unit`, uploading
    /// pixels and sampler parameters that changed.
    pub fn update(&mut self, ctx: &mut RenderContext, unit: u32) -> Result<TextureHandle, ResourceError> {
        let handle = match self.handle {
            Some(handle) => handle,
            None => {
                let handle = ctx.backend_mut().create_texture()?;
                log::debug!("Texture: created {handle:?} ({:?})", self.target);
                self.handle = Some(handle);
                handle
            }
        };

        let sampler_dirty = self.requested != self.applied;
        if !self.needs_update && !sampler_dirty {
            ctx.bind_texture(unit, self.target, Some(handle));
            return Ok(handle);
        }

        // Uploads and parameters act on the active unit.
        ctx.active_texture(unit);
        ctx.bind_texture(unit, self.target, Some(handle));

        if self.needs_update {
            self.needs_update = false;
            self.apply_npot_fallback(ctx);
            self.upload(ctx);
        }
        self.apply_sampler(ctx);
        Ok(handle)
    }

    fn apply_npot_fallback(&mut self, ctx: &RenderContext) {
        if !self.generate_mipmaps || ctx.capabilities().npot_mipmaps {
            return;
        }
        let (width, height) = self.source.size();
        if is_power_of_two(width) && is_power_of_two(height) {
            return;
        }
        log::debug!("Texture: {width}x{height} source cannot be mipmapped, using clamp-to-edge and linear filtering");
        self.generate_mipmaps = false;
        self.requested.wrap_s = TextureWrap::ClampToEdge;
        self.requested.wrap_t = TextureWrap::ClampToEdge;
        self.requested.min_filter = TextureFilter::Linear;
    }

    fn upload(&self, ctx: &mut RenderContext) {
        ctx.pixel_store(PixelStore::FlipY(self.flip_y));
        ctx.pixel_store(PixelStore::PremultiplyAlpha(self.premultiply_alpha));
        ctx.pixel_store(PixelStore::UnpackAlignment(self.unpack_alignment));

        let backend = ctx.backend_mut();
        match (&self.source, self.target) {
            (TextureSource::Image(source), TextureTarget::Texture2D) => {
                backend.tex_image_2d(&self.tex_image(
                    TexImageTarget::Texture2D,
                    source.width,
                    source.height,
                    Some(source.pixels.as_slice()),
                ));
            }
            (TextureSource::Cube(faces), TextureTarget::CubeMap) => {
                if faces.len() != 6 {
                    log::warn!("Texture: cube map has {} faces instead of 6", faces.len());
                }
                for (face, source) in faces.iter().take(6).enumerate() {
                    backend.tex_image_2d(&self.tex_image(
                        TexImageTarget::CubeFace(face as u8),
                        source.width,
                        source.height,
                        Some(source.pixels.as_slice()),
                    ));
                }
            }
            (TextureSource::Empty { width, height }, TextureTarget::Texture2D) => {
                backend.tex_image_2d(&self.tex_image(TexImageTarget::Texture2D, *width, *height, None));
            }
            (TextureSource::Empty { width, height }, TextureTarget::CubeMap) => {
                for face in 0..6 {
                    backend.tex_image_2d(&self.tex_image(TexImageTarget::CubeFace(face), *width, *height, None));
                }
            }
            (source, target) => {
                log::error!(
                    "Texture: cannot upload a {} source to a {target} texture",
                    match source {
                        TextureSource::Image(_) => "2D",
                        _ => "cube",
                    }
                );
                return;
            }
        }

        if self.generate_mipmaps && self.source.has_pixels() {
            backend.generate_mipmap(self.target);
        }
    }

    fn tex_image<'a>(
        &self,
        target: TexImageTarget,
        width: u32,
        height: u32,
        pixels: Option<&'a [u8]>,
    ) -> TexImage<'a> {
        TexImage {
            target,
            level: self.level,
            internal_format: self.internal_format,
            width,
            height,
            format: self.format,
            data_type: self.data_type,
            pixels,
        }
    }

    fn apply_sampler(&mut self, ctx: &mut RenderContext) {
        let requested = self.requested;
        let target = self.target;
        let max_anisotropy = ctx.capabilities().max_anisotropy;
        let backend = ctx.backend_mut();

        if requested.min_filter != self.applied.min_filter {
            backend.tex_parameter(target, TextureParameter::MinFilter(requested.min_filter));
        }
        if requested.mag_filter != self.applied.mag_filter {
            backend.tex_parameter(target, TextureParameter::MagFilter(requested.mag_filter));
        }
        if requested.wrap_s != self.applied.wrap_s {
            backend.tex_parameter(target, TextureParameter::WrapS(requested.wrap_s));
        }
        if requested.wrap_t != self.applied.wrap_t {
            backend.tex_parameter(target, TextureParameter::WrapT(requested.wrap_t));
        }
        if requested.anisotropy > 0.0 && requested.anisotropy != self.applied.anisotropy {
            if let Some(max) = max_anisotropy {
                backend.tex_parameter(
                    target,
                    TextureParameter::MaxAnisotropy(requested.anisotropy.min(max)),
                );
            }
        }
        self.applied = requested;
    }

    /// Deletes the GPU object.
    pub fn remove(self, ctx: &mut RenderContext) {
        if let Some(handle) = self.handle {
            ctx.delete_texture(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_core::renderer::ContextCapabilities;
    use prism_infra::HeadlessBackend;

    fn context(capabilities: ContextCapabilities) -> RenderContext {
        RenderContext::new(Box::new(HeadlessBackend::with_capabilities(8, 8, capabilities)))
    }

    fn headless(ctx: &RenderContext) -> &HeadlessBackend {
        ctx.backend_as::<HeadlessBackend>().unwrap()
    }

    #[test]
    fn gpu_object_is_created_on_first_update() {
        let mut ctx = context(ContextCapabilities::webgl2());
        let mut texture = Texture::new(TextureDescriptor::from_image(TextureImage::solid(4, 4, [255; 4])));
        assert_eq!(texture.handle(), None);
        let handle = texture.update(&mut ctx, 0).unwrap();
        assert_eq!(texture.handle(), Some(handle));

        let backend = headless(&ctx);
        let object = backend.texture(handle).unwrap();
        assert_eq!(object.mipmap_generations, 1);
        assert_eq!(object.wrap_s, TextureWrap::ClampToEdge);
        assert!(backend.state().unpack_flip_y);
    }

    #[test]
    fn clean_textures_only_rebind() {
        let mut ctx = context(ContextCapabilities::webgl2());
        let mut texture = Texture::new(TextureDescriptor::from_image(TextureImage::solid(2, 2, [0; 4])));
        texture.update(&mut ctx, 0).unwrap();
        texture.update(&mut ctx, 0).unwrap();
        texture.update(&mut ctx, 3).unwrap();

        let backend = headless(&ctx);
        assert_eq!(backend.calls("tex_image_2d"), 1);
        assert_eq!(backend.calls("bind_texture"), 2);
        assert_eq!(backend.state().bound_texture(3, TextureTarget::Texture2D), texture.handle());
    }

    #[test]
    fn npot_sources_fall_back_without_mipmaps() {
        let mut ctx = context(ContextCapabilities::webgl1());
        let mut descriptor = TextureDescriptor::from_image(TextureImage::solid(3, 5, [0; 4]));
        descriptor.wrap_s = TextureWrap::Repeat;
        let mut texture = Texture::new(descriptor);
        let handle = texture.update(&mut ctx, 0).unwrap();

        assert!(!texture.generates_mipmaps());
        let object = headless(&ctx).texture(handle).unwrap();
        assert_eq!(object.mipmap_generations, 0);
        assert_eq!(object.min_filter, TextureFilter::Linear);
        assert_eq!(object.wrap_s, TextureWrap::ClampToEdge);
    }

    #[test]
    fn cube_maps_upload_six_faces() {
        let mut ctx = context(ContextCapabilities::webgl2());
        let faces = (0..6).map(|_| TextureImage::solid(2, 2, [9; 4])).collect();
        let mut texture = Texture::new(TextureDescriptor::cube(faces));
        let handle = texture.update(&mut ctx, 1).unwrap();

        let backend = headless(&ctx);
        assert_eq!(backend.calls("tex_image_2d"), 6);
        assert_eq!(backend.texture(handle).map(|t| t.images.len()), Some(6));
        assert!(!backend.state().unpack_flip_y);
    }

    #[test]
    fn sampler_changes_are_pushed_without_reupload() {
        let mut ctx = context(ContextCapabilities::webgl2());
        let mut texture = Texture::new(TextureDescriptor::from_image(TextureImage::solid(2, 2, [0; 4])));
        let handle = texture.update(&mut ctx, 0).unwrap();
        texture.set_filters(TextureFilter::Nearest, TextureFilter::Nearest);
        texture.set_anisotropy(32.0);
        texture.update(&mut ctx, 0).unwrap();

        let backend = headless(&ctx);
        assert_eq!(backend.calls("tex_image_2d"), 1);
        let object = backend.texture(handle).unwrap();
        assert_eq!(object.mag_filter, TextureFilter::Nearest);
        assert_eq!(object.anisotropy, 16.0);
    }

    #[test]
    fn set_image_schedules_an_upload() {
        let mut ctx = context(ContextCapabilities::webgl2());
        let mut texture = Texture::new(TextureDescriptor::from_image(TextureImage::solid(2, 2, [0; 4])));
        texture.update(&mut ctx, 0).unwrap();
        texture.set_image(TextureImage::solid(4, 4, [1; 4]));
        assert!(texture.needs_update());
        let handle = texture.update(&mut ctx, 0).unwrap();
        let info = headless(&ctx).texture(handle).unwrap().images[&(TexImageTarget::Texture2D, 0)];
        assert_eq!((info.width, info.height), (4, 4));
    }
}
