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

use crate::resources::TextureId;
use prism_core::math::{Color, Mat3, Mat4, Vec2, Vec3, Vec4};
use prism_core::renderer::{ActiveUniform, GlslType, UniformLocation};
use std::collections::HashMap;

/// Uniform values keyed by the base name used in the shader.
///
/// A program owns one map; meshes and the renderer supply further maps that
/// take precedence over it. Values can be replaced between frames without
/// re-registering anything.
pub type Uniforms = HashMap<String, UniformValue>;

/// A value supplied for a uniform.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    /// `float`.
    Float(f32),
    /// `int`.
    Int(i32),
    /// `bool`.
    Bool(bool),
    /// `vec2`.
    Vec2(Vec2),
    /// `vec3`.
    Vec3(Vec3),
    /// `vec4`.
    Vec4(Vec4),
    /// `vec4`, or `vec3` using the color channels only.
    Color(Color),
    /// `mat3`.
    Mat3(Mat3),
    /// `mat4`.
    Mat4(Mat4),
    /// A sampler bound to this texture.
    Texture(TextureId),
    /// Flat float components, for any float array or vector type.
    Floats(Vec<f32>),
    /// Flat integer components, for any int/bool array or vector type.
    Ints(Vec<i32>),
    /// `vec2[]`.
    Vec2Array(Vec<Vec2>),
    /// `vec3[]`.
    Vec3Array(Vec<Vec3>),
    /// `vec4[]`.
    Vec4Array(Vec<Vec4>),
    /// `mat4[]`.
    Mat4Array(Vec<Mat4>),
    /// A sampler array, one unit per texture.
    Textures(Vec<TextureId>),
    /// A struct uniform, by field name.
    Struct(Uniforms),
    /// An array of structs.
    StructArray(Vec<Uniforms>),
}

/// Flat components of a non-texture value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Components<'a> {
    Floats(&'a [f32]),
    Ints(&'a [i32]),
    Int(i32),
}

impl UniformValue {
    /// Short name of the variant for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            UniformValue::Float(_) => "float",
            UniformValue::Int(_) => "int",
            UniformValue::Bool(_) => "bool",
            UniformValue::Vec2(_) => "vec2",
            UniformValue::Vec3(_) => "vec3",
            UniformValue::Vec4(_) => "vec4",
            UniformValue::Color(_) => "color",
            UniformValue::Mat3(_) => "mat3",
            UniformValue::Mat4(_) => "mat4",
            UniformValue::Texture(_) => "texture",
            UniformValue::Floats(_) => "float array",
            UniformValue::Ints(_) => "int array",
            UniformValue::Vec2Array(_) => "vec2 array",
            UniformValue::Vec3Array(_) => "vec3 array",
            UniformValue::Vec4Array(_) => "vec4 array",
            UniformValue::Mat4Array(_) => "mat4 array",
            UniformValue::Textures(_) => "texture array",
            UniformValue::Struct(_) => "struct",
            UniformValue::StructArray(_) => "struct array",
        }
    }

    /// Borrows the flat components, `None` for textures and structs.
    pub(crate) fn components(&self) -> Option<Components<'_>> {
        fn floats(values: &[f32]) -> Option<Components<'_>> {
            Some(Components::Floats(values))
        }
        match self {
            UniformValue::Float(v) => floats(std::slice::from_ref(v)),
            UniformValue::Int(v) => Some(Components::Ints(std::slice::from_ref(v))),
            UniformValue::Bool(v) => Some(Components::Int(i32::from(*v))),
            UniformValue::Vec2(v) => floats(v.as_array().as_slice()),
            UniformValue::Vec3(v) => floats(v.as_array().as_slice()),
            UniformValue::Vec4(v) => floats(v.as_array().as_slice()),
            UniformValue::Color(c) => floats(bytemuck::cast_slice(std::slice::from_ref(c))),
            UniformValue::Mat3(m) => floats(bytemuck::cast_slice(std::slice::from_ref(m))),
            UniformValue::Mat4(m) => floats(bytemuck::cast_slice(std::slice::from_ref(m))),
            UniformValue::Floats(v) => floats(v),
            UniformValue::Ints(v) => Some(Components::Ints(v)),
            UniformValue::Vec2Array(v) => floats(bytemuck::cast_slice(v)),
            UniformValue::Vec3Array(v) => floats(bytemuck::cast_slice(v)),
            UniformValue::Vec4Array(v) => floats(bytemuck::cast_slice(v)),
            UniformValue::Mat4Array(v) => floats(bytemuck::cast_slice(v)),
            UniformValue::Texture(_)
            | UniformValue::Textures(_)
            | UniformValue::Struct(_)
            | UniformValue::StructArray(_) => None,
        }
    }
}

macro_rules! impl_from_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for UniformValue {
                fn from(value: $ty) -> Self {
                    UniformValue::$variant(value)
                }
            }
        )*
    };
}

impl_from_value!(
    f32 => Float,
    i32 => Int,
    bool => Bool,
    Vec2 => Vec2,
    Vec3 => Vec3,
    Vec4 => Vec4,
    Color => Color,
    Mat3 => Mat3,
    Mat4 => Mat4,
    TextureId => Texture,
    Vec<f32> => Floats,
    Vec<i32> => Ints,
    Vec<Vec2> => Vec2Array,
    Vec<Vec3> => Vec3Array,
    Vec<Vec4> => Vec4Array,
    Vec<Mat4> => Mat4Array,
    Vec<TextureId> => Textures,
    Uniforms => Struct,
    Vec<Uniforms> => StructArray,
);

/// How a reflected uniform maps onto a [`Uniforms`] entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UniformKind {
    /// `uniform float time;`, value under `time`.
    Scalar,
    /// `uniform float weights[4];`, reported as `weights[0]`.
    Array {
        /// Declared element count.
        length: u32,
    },
    /// A member of a struct uniform, e.g. `light.color`; `field` may be a dotted path.
    StructField {
        /// Path inside the struct value.
        field: String,
    },
    /// A member of one element of a struct array, e.g. `lights[1].color`.
    StructArrayElement {
        /// Element index.
        index: usize,
        /// Path inside the element.
        field: String,
    },
}

/// An active uniform resolved once at link time.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformDescriptor {
    /// The name reported by the driver.
    pub name: String,
    /// Key looked up in [`Uniforms`].
    pub base: String,
    /// How the value is found under `base`.
    pub kind: UniformKind,
    /// Location in the linked program.
    pub location: UniformLocation,
    /// Declared type.
    pub ty: GlslType,
    /// Array length, 1 for non-arrays.
    pub size: u32,
}

impl UniformDescriptor {
    /// Splits a reflected name into base, index and field.
    pub fn from_active(active: &ActiveUniform) -> Self {
        let (name, is_array) = match active.name.strip_suffix("[0]") {
            Some(stripped) => (stripped, true),
            None => (active.name.as_str(), active.size > 1),
        };
        let (base, kind) = match name.split_once('.') {
            None if is_array => (name, UniformKind::Array { length: active.size }),
            None => (name, UniformKind::Scalar),
            Some((head, field)) => match split_index(head) {
                Some((base, index)) => (
                    base,
                    UniformKind::StructArrayElement {
                        index,
                        field: field.to_string(),
                    },
                ),
                None => (
                    head,
                    UniformKind::StructField {
                        field: field.to_string(),
                    },
                ),
            },
        };
        Self {
            name: active.name.clone(),
            base: base.to_string(),
            kind,
            location: active.location,
            ty: active.ty,
            size: active.size.max(1),
        }
    }

    /// Finds the value in the first map that has the base name.
    pub fn resolve<'a, I>(&self, sources: I) -> Option<&'a UniformValue>
    where
        I: IntoIterator<Item = &'a Uniforms>,
    {
        let root = sources.into_iter().find_map(|map| map.get(&self.base))?;
        match &self.kind {
            UniformKind::Scalar | UniformKind::Array { .. } => Some(root),
            UniformKind::StructField { field } => match root {
                UniformValue::Struct(fields) => lookup(fields, field),
                _ => None,
            },
            UniformKind::StructArrayElement { index, field } => match root {
                UniformValue::StructArray(elements) => lookup(elements.get(*index)?, field),
                _ => None,
            },
        }
    }
}

/// `"lights[2]"` to `("lights", 2)`.
fn split_index(segment: &str) -> Option<(&str, usize)> {
    let (base, index) = segment.strip_suffix(']')?.split_once('[')?;
    Some((base, index.parse().ok()?))
}

/// Walks a dotted path such as `shadow.cascades[1].bias` through nested struct values.
fn lookup<'a>(fields: &'a Uniforms, path: &str) -> Option<&'a UniformValue> {
    let mut current = fields;
    let mut segments = path.split('.').peekable();
    while let Some(segment) = segments.next() {
        let value = match split_index(segment) {
            Some((name, index)) => match current.get(name)? {
                UniformValue::StructArray(elements) if segments.peek().is_some() => {
                    current = elements.get(index)?;
                    continue;
                }
                _ => return None,
            },
            None => current.get(segment)?,
        };
        if segments.peek().is_none() {
            return Some(value);
        }
        match value {
            UniformValue::Struct(inner) => current = inner,
            _ => return None,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active(name: &str, ty: GlslType, size: u32) -> ActiveUniform {
        ActiveUniform {
            name: name.to_string(),
            location: UniformLocation(0),
            ty,
            size,
        }
    }

    fn map(entries: Vec<(&str, UniformValue)>) -> Uniforms {
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn classifies_reflected_names() {
        let scalar = UniformDescriptor::from_active(&active("time", GlslType::Float, 1));
        assert_eq!(scalar.kind, UniformKind::Scalar);

        let array = UniformDescriptor::from_active(&active("weights[0]", GlslType::Float, 4));
        assert_eq!(array.base, "weights");
        assert_eq!(array.kind, UniformKind::Array { length: 4 });

        let field = UniformDescriptor::from_active(&active("light.color", GlslType::Vec3, 1));
        assert_eq!(field.base, "light");
        assert_eq!(
            field.kind,
            UniformKind::StructField {
                field: "color".into()
            }
        );

        let element =
            UniformDescriptor::from_active(&active("lights[1].color", GlslType::Vec3, 1));
        assert_eq!(element.base, "lights");
        assert_eq!(
            element.kind,
            UniformKind::StructArrayElement {
                index: 1,
                field: "color".into()
            }
        );
    }

    #[test]
    fn resolves_struct_array_members() {
        let lights = UniformValue::StructArray(vec![
            map(vec![("color", Vec3::X.into())]),
            map(vec![("color", Vec3::Y.into())]),
        ]);
        let uniforms = map(vec![("lights", lights)]);
        let descriptor =
            UniformDescriptor::from_active(&active("lights[1].color", GlslType::Vec3, 1));
        assert_eq!(
            descriptor.resolve([&uniforms]),
            Some(&UniformValue::Vec3(Vec3::Y))
        );

        let out_of_range =
            UniformDescriptor::from_active(&active("lights[2].color", GlslType::Vec3, 1));
        assert_eq!(out_of_range.resolve([&uniforms]), None);
    }

    #[test]
    fn resolves_nested_paths() {
        let cascade = map(vec![("bias", 0.5f32.into())]);
        let shadow = map(vec![(
            "cascades",
            UniformValue::StructArray(vec![Uniforms::new(), cascade]),
        )]);
        let uniforms = map(vec![("shadow", UniformValue::Struct(shadow))]);
        let descriptor = UniformDescriptor::from_active(&active(
            "shadow.cascades[1].bias",
            GlslType::Float,
            1,
        ));
        assert_eq!(
            descriptor.resolve([&uniforms]),
            Some(&UniformValue::Float(0.5))
        );
    }

    #[test]
    fn earlier_sources_take_precedence() {
        let overrides = map(vec![("time", 2.0f32.into())]);
        let defaults = map(vec![("time", 1.0f32.into())]);
        let descriptor = UniformDescriptor::from_active(&active("time", GlslType::Float, 1));
        assert_eq!(
            descriptor.resolve([&overrides, &defaults]),
            Some(&UniformValue::Float(2.0))
        );
    }

    #[test]
    fn flattens_without_copying() {
        let value = UniformValue::Vec3Array(vec![Vec3::X, Vec3::Y]);
        assert_eq!(
            value.components(),
            Some(Components::Floats(&[1.0, 0.0, 0.0, 0.0, 1.0, 0.0]))
        );
        assert_eq!(UniformValue::Bool(true).components(), Some(Components::Int(1)));
        assert_eq!(UniformValue::Mat4(Mat4::IDENTITY).components().map(|c| match c {
            Components::Floats(f) => f.len(),
            _ => 0,
        }), Some(16));
    }
}
