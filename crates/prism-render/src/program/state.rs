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

use crate::context::{BlendEquationState, BlendFunc, RenderContext};
use crate::settings::SettingsError;
use prism_core::renderer::{BlendFactor, Capability, CompareFunction, Face, FrontFace};
use serde::{Deserialize, Serialize};

/// Fixed-function state a program draws with.
///
/// Blend factors, equations and compare functions are written with their GL
/// names when serialized:
///
/// ```
/// use prism_render::program::RenderState;
///
/// let state = RenderState::from_ron(
///     r#"(transparent: true, depth_write: false,
///         blend_func: Some((src: "SRC_ALPHA", dst: "ONE", src_alpha: "ONE", dst_alpha: "ONE")))"#,
/// )
/// .unwrap();
/// assert!(state.transparent);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderState {
    /// Sorted into the transparent or ui bucket, and blended by default.
    pub transparent: bool,
    /// Culled face, `None` disables culling.
    pub cull_face: Option<Face>,
    /// Front-facing winding.
    pub front_face: FrontFace,
    /// Depth testing.
    pub depth_test: bool,
    /// Depth writes.
    pub depth_write: bool,
    /// Depth comparison.
    pub depth_func: CompareFunction,
    /// Blending, `None` disables it unless the program is transparent.
    pub blend_func: Option<BlendFunc>,
    /// Blend equations.
    pub blend_equation: BlendEquationState,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            transparent: false,
            cull_face: Some(Face::Back),
            front_face: FrontFace::Ccw,
            depth_test: true,
            depth_write: true,
            depth_func: CompareFunction::LessEqual,
            blend_func: None,
            blend_equation: BlendEquationState::default(),
        }
    }
}

impl RenderState {
    /// Parses a state description from RON.
    pub fn from_ron(text: &str) -> Result<Self, SettingsError> {
        Ok(ron::from_str(text)?)
    }

    /// Fills in the blend function of a transparent state that has none.
    pub(crate) fn resolve_blending(&mut self, premultiplied_alpha: bool) {
        if self.transparent && self.blend_func.is_none() {
            let src = if premultiplied_alpha {
                BlendFactor::One
            } else {
                BlendFactor::SrcAlpha
            };
            self.blend_func = Some(BlendFunc::new(src, BlendFactor::OneMinusSrcAlpha));
        }
    }

    /// Pushes the state through the cache. `flip_faces` inverts the winding
    /// for mirrored objects.
    pub fn apply(&self, ctx: &mut RenderContext, flip_faces: bool) {
        toggle(ctx, Capability::DepthTest, self.depth_test);
        toggle(ctx, Capability::CullFace, self.cull_face.is_some());
        toggle(ctx, Capability::Blend, self.blend_func.is_some());

        if let Some(face) = self.cull_face {
            ctx.set_cull_face(face);
        }
        let front_face = if flip_faces {
            self.front_face.inverted()
        } else {
            self.front_face
        };
        ctx.set_front_face(front_face);
        ctx.set_depth_mask(self.depth_write);
        ctx.set_depth_func(self.depth_func);
        if let Some(blend) = self.blend_func {
            ctx.set_blend_func(blend.src, blend.dst, Some(blend.src_alpha), Some(blend.dst_alpha));
        }
        ctx.set_blend_equation(self.blend_equation.rgb, Some(self.blend_equation.alpha));
    }
}

fn toggle(ctx: &mut RenderContext, capability: Capability, on: bool) {
    if on {
        ctx.enable(capability);
    } else {
        ctx.disable(capability);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_core::renderer::BlendEquation;

    #[test]
    fn transparent_states_blend_by_default() {
        let mut state = RenderState {
            transparent: true,
            ..Default::default()
        };
        state.resolve_blending(false);
        assert_eq!(
            state.blend_func,
            Some(BlendFunc::new(BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha))
        );

        let mut premultiplied = RenderState {
            transparent: true,
            ..Default::default()
        };
        premultiplied.resolve_blending(true);
        assert_eq!(premultiplied.blend_func.map(|b| b.src), Some(BlendFactor::One));
    }

    #[test]
    fn parses_gl_names() {
        let state = RenderState::from_ron(
            r#"(cull_face: None, depth_func: "GREATER", blend_equation: (rgb: "FUNC_ADD", alpha: "MAX"))"#,
        )
        .unwrap();
        assert_eq!(state.cull_face, None);
        assert_eq!(state.depth_func, CompareFunction::Greater);
        assert_eq!(state.blend_equation.alpha, BlendEquation::Max);
        assert!(state.depth_test);
    }

    #[test]
    fn rejects_unknown_blend_names() {
        let err = RenderState::from_ron(r#"(depth_func: "SOMETIMES")"#).unwrap_err();
        assert!(err.to_string().contains("SOMETIMES"), "{err}");
    }
}
