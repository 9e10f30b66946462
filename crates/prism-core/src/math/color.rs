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

//! Defines the RGBA [`Color`] used for clear colors and uniform inputs.

use crate::math::vector::{Vec3, Vec4};
use serde::{Deserialize, Serialize};
use std::ops::Mul;

/// An RGBA color with `f32` components in the `[0, 1]` range.
///
/// Values are passed to the context untouched, so no color-space conversion
/// happens here. `#[repr(C)]` keeps the layout of `vec4` uniforms.
#[derive(
    Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable, Serialize, Deserialize,
)]
#[repr(C)]
pub struct Color {
    /// The red component.
    pub r: f32,
    /// The green component.
    pub g: f32,
    /// The blue component.
    pub b: f32,
    /// The alpha (opacity) component.
    pub a: f32,
}

impl Color {
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    /// Fully transparent black. This is the context's initial clear color.
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Creates a new `Color` with explicit RGBA values.
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Creates a new opaque `Color` (alpha = 1.0).
    #[inline]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Parses a `#RRGGBB` or `#RRGGBBAA` hex string.
    ///
    /// Returns `None` if the string is malformed.
    ///
    /// ```
    /// use prism_core::math::Color;
    /// assert_eq!(Color::from_hex("#ff0000"), Some(Color::rgb(1.0, 0.0, 0.0)));
    /// assert_eq!(Color::from_hex("red"), None);
    /// ```
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if !digits.is_ascii() || !(digits.len() == 6 || digits.len() == 8) {
            return None;
        }
        let channel = |i: usize| -> Option<f32> {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .ok()
                .map(|v| v as f32 / 255.0)
        };
        let a = if digits.len() == 8 { channel(6)? } else { 1.0 };
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?, a))
    }

    /// Returns a copy with the RGB channels multiplied by alpha.
    #[inline]
    pub fn premultiplied(&self) -> Self {
        Self::new(self.r * self.a, self.g * self.a, self.b * self.a, self.a)
    }

    /// Returns a copy of this color with a different alpha value.
    #[inline]
    pub fn with_alpha(&self, a: f32) -> Self {
        Self { a, ..*self }
    }

    /// Converts this color to a [`Vec4`].
    #[inline]
    pub fn to_vec4(&self) -> Vec4 {
        Vec4::new(self.r, self.g, self.b, self.a)
    }

    /// Returns the RGB channels as a [`Vec3`].
    #[inline]
    pub fn to_vec3(&self) -> Vec3 {
        Vec3::new(self.r, self.g, self.b)
    }
}

impl From<Vec4> for Color {
    #[inline]
    fn from(v: Vec4) -> Self {
        Self::new(v.x, v.y, v.z, v.w)
    }
}

impl From<[f32; 4]> for Color {
    #[inline]
    fn from(v: [f32; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl Default for Color {
    /// Returns [`Color::TRANSPARENT`].
    fn default() -> Self {
        Self::TRANSPARENT
    }
}

impl Mul<f32> for Color {
    type Output = Self;
    /// Scales all four channels.
    #[inline]
    fn mul(self, scalar: f32) -> Self::Output {
        Self::new(self.r * scalar, self.g * scalar, self.b * scalar, self.a * scalar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn hex_parsing_accepts_optional_alpha() {
        let c = Color::from_hex("#00ff0080").expect("valid hex");
        assert_eq!(c.g, 1.0);
        assert_relative_eq!(c.a, 128.0 / 255.0);
        assert_eq!(Color::from_hex("00f"), None);
        assert_eq!(Color::from_hex("#gg0000"), None);
    }

    #[test]
    fn premultiply_scales_rgb_only() {
        let c = Color::new(1.0, 0.5, 0.25, 0.5).premultiplied();
        assert_eq!(c, Color::new(0.5, 0.25, 0.125, 0.5));
    }

    #[test]
    fn default_is_transparent() {
        assert_eq!(Color::default(), Color::TRANSPARENT);
        assert_eq!(Color::from([0.0, 0.0, 0.0, 1.0]), Color::BLACK);
    }
}
