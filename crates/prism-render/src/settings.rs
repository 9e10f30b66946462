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

//! Renderer configuration.

use prism_core::math::Color;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading [`RendererSettings`].
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The RON text could not be parsed.
    #[error("invalid renderer settings: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// A field holds a value the renderer cannot use.
    #[error("invalid renderer setting '{field}': {reason}")]
    Invalid {
        /// Offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// Construction-time options of a [`crate::Renderer`].
///
/// Every field has a default, so a RON document only needs the fields it changes:
///
/// ```
/// use prism_render::RendererSettings;
///
/// let settings = RendererSettings::from_ron("(width: 640, height: 480, dpr: 2.0)").unwrap();
/// assert_eq!(settings.drawing_buffer_size(), (1280, 960));
/// assert!(settings.depth);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererSettings {
    /// Logical width of the default surface.
    pub width: u32,
    /// Logical height of the default surface.
    pub height: u32,
    /// Device pixel ratio applied to the default surface viewport.
    pub dpr: f32,
    /// Whether the drawing buffer has an alpha channel.
    pub alpha: bool,
    /// Whether the default surface has a depth buffer.
    pub depth: bool,
    /// Whether the default surface has a stencil buffer.
    pub stencil: bool,
    /// Whether the drawing buffer holds premultiplied alpha.
    pub premultiplied_alpha: bool,
    /// Clear the target at the start of every render.
    pub auto_clear: bool,
    /// Color the surface is cleared to.
    pub clear_color: Color,
    /// Default for [`crate::RenderOptions::frustum_cull`].
    pub frustum_cull: bool,
    /// Default for [`crate::RenderOptions::sort`].
    pub sort: bool,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            width: 300,
            height: 150,
            dpr: 1.0,
            alpha: false,
            depth: true,
            stencil: false,
            premultiplied_alpha: false,
            auto_clear: true,
            clear_color: Color::TRANSPARENT,
            frustum_cull: true,
            sort: true,
        }
    }
}

impl RendererSettings {
    /// Parses settings from RON and validates them.
    pub fn from_ron(text: &str) -> Result<Self, SettingsError> {
        let settings: Self = ron::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Serializes the settings to pretty RON.
    pub fn to_ron(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }

    /// Checks the values that cannot be expressed by the types alone.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(self.dpr.is_finite() && self.dpr > 0.0) {
            return Err(SettingsError::Invalid {
                field: "dpr",
                reason: format!("{} is not a positive ratio", self.dpr),
            });
        }
        if self.width == 0 || self.height == 0 {
            return Err(SettingsError::Invalid {
                field: "width/height",
                reason: format!("{}x{} surface", self.width, self.height),
            });
        }
        Ok(())
    }

    /// Size of the default surface in device pixels.
    pub fn drawing_buffer_size(&self) -> (u32, u32) {
        (
            (self.width as f32 * self.dpr).round() as u32,
            (self.height as f32 * self.dpr).round() as u32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_documents_keep_defaults() {
        let settings = RendererSettings::from_ron("(stencil: true, auto_clear: false)").unwrap();
        assert!(settings.stencil);
        assert!(!settings.auto_clear);
        assert_eq!(settings.width, 300);
        assert_eq!(settings.clear_color, Color::TRANSPARENT);
    }

    #[test]
    fn ron_round_trip() {
        let settings = RendererSettings {
            clear_color: Color::rgb(0.1, 0.2, 0.3),
            ..Default::default()
        };
        let text = settings.to_ron().unwrap();
        assert_eq!(RendererSettings::from_ron(&text).unwrap(), settings);
    }

    #[test]
    fn rejects_non_positive_dpr() {
        let err = RendererSettings::from_ron("(dpr: 0.0)").unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { field: "dpr", .. }));
    }

    #[test]
    fn reports_syntax_errors() {
        let err = RendererSettings::from_ron("(width: \"wide\")").unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }
}
