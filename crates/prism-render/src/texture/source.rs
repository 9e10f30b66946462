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

use anyhow::{Context, Result};
use image::DynamicImage;

/// CPU-side pixels of one 2D image or cube face.
///
/// The byte layout must match the owning texture's format and type; decoded
/// images are always tightly packed RGBA8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Raw pixel bytes, rows bottom-to-top as uploaded.
    pub pixels: Vec<u8>,
}

impl TextureImage {
    /// Wraps raw pixels.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }

    /// A single-color RGBA8 image.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = rgba
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self::new(width, height, pixels)
    }

    /// Decodes an encoded image (PNG, ...) into RGBA8.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let decoded = image::load_from_memory(bytes).context("Failed to decode texture image")?;
        Ok(Self::from_dynamic(&decoded))
    }

    /// Converts an already decoded image to RGBA8.
    pub fn from_dynamic(image: &DynamicImage) -> Self {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::new(width, height, rgba.into_raw())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    #[test]
    fn decodes_png_to_rgba8() {
        let source = RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 255]));
        let mut encoded = Cursor::new(Vec::new());
        source.write_to(&mut encoded, ImageFormat::Png).unwrap();

        let image = TextureImage::decode(encoded.get_ref()).unwrap();
        assert_eq!((image.width, image.height), (3, 2));
        assert_eq!(image.pixels.len(), 24);
        assert_eq!(&image.pixels[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn garbage_is_reported_with_context() {
        let err = TextureImage::decode(b"not an image").unwrap_err();
        assert!(err.to_string().contains("Failed to decode texture image"));
    }

    #[test]
    fn solid_fills_every_pixel() {
        let image = TextureImage::solid(2, 2, [1, 2, 3, 4]);
        assert_eq!(image.pixels, [1, 2, 3, 4].repeat(4));
    }
}
