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

//! GL-style state enums shared by the backend contract and the resources.
//!
//! Most enums can be parsed from, and serialize to, their OpenGL constant names
//! (`"SRC_ALPHA"`, `"FUNC_ADD"`, `"LEQUAL"`...), which is how render state is
//! written in configuration files.

use std::fmt;
use std::str::FromStr;

use crate::renderer::error::ParseEnumError;

/// Declares an enum whose variants map one-to-one onto GL constant names.
macro_rules! gl_named_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $gl:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The GL constant name of this value.
            pub const fn gl_name(self) -> &'static str {
                match self {
                    $($name::$variant => $gl),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.gl_name())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let name = s.trim();
                let name = name.strip_prefix("GL_").unwrap_or(name);
                match name {
                    $($gl => Ok($name::$variant),)+
                    _ => Err(ParseEnumError {
                        kind: stringify!($name),
                        value: s.to_string(),
                    }),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = ParseEnumError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.gl_name().to_string()
            }
        }
    };
}

gl_named_enum! {
    /// A server-side capability toggled with `enable`/`disable`.
    pub enum Capability {
        /// Color blending.
        Blend => "BLEND",
        /// Face culling.
        CullFace => "CULL_FACE",
        /// Depth testing.
        DepthTest => "DEPTH_TEST",
        /// Stencil testing.
        StencilTest => "STENCIL_TEST",
        /// Scissor testing.
        ScissorTest => "SCISSOR_TEST",
        /// Polygon offset for filled primitives.
        PolygonOffsetFill => "POLYGON_OFFSET_FILL",
    }
}

gl_named_enum! {
    /// A blend factor for `blendFuncSeparate`.
    pub enum BlendFactor {
        /// `0`
        Zero => "ZERO",
        /// `1`
        One => "ONE",
        /// Source color.
        SrcColor => "SRC_COLOR",
        /// `1 - source color`.
        OneMinusSrcColor => "ONE_MINUS_SRC_COLOR",
        /// Destination color.
        DstColor => "DST_COLOR",
        /// `1 - destination color`.
        OneMinusDstColor => "ONE_MINUS_DST_COLOR",
        /// Source alpha.
        SrcAlpha => "SRC_ALPHA",
        /// `1 - source alpha`.
        OneMinusSrcAlpha => "ONE_MINUS_SRC_ALPHA",
        /// Destination alpha.
        DstAlpha => "DST_ALPHA",
        /// `1 - destination alpha`.
        OneMinusDstAlpha => "ONE_MINUS_DST_ALPHA",
        /// The constant blend color.
        ConstantColor => "CONSTANT_COLOR",
        /// `1 - constant color`.
        OneMinusConstantColor => "ONE_MINUS_CONSTANT_COLOR",
        /// The constant blend alpha.
        ConstantAlpha => "CONSTANT_ALPHA",
        /// `1 - constant alpha`.
        OneMinusConstantAlpha => "ONE_MINUS_CONSTANT_ALPHA",
        /// `min(source alpha, 1 - destination alpha)`.
        SrcAlphaSaturate => "SRC_ALPHA_SATURATE",
    }
}

gl_named_enum! {
    /// How blended source and destination terms are combined.
    pub enum BlendEquation {
        /// `src + dst`
        Add => "FUNC_ADD",
        /// `src - dst`
        Subtract => "FUNC_SUBTRACT",
        /// `dst - src`
        ReverseSubtract => "FUNC_REVERSE_SUBTRACT",
        /// Component-wise minimum.
        Min => "MIN",
        /// Component-wise maximum.
        Max => "MAX",
    }
}

gl_named_enum! {
    /// Which polygon faces are culled.
    pub enum Face {
        /// Front faces.
        Front => "FRONT",
        /// Back faces.
        Back => "BACK",
        /// Both faces.
        FrontAndBack => "FRONT_AND_BACK",
    }
}

gl_named_enum! {
    /// The winding order of front-facing polygons.
    pub enum FrontFace {
        /// Counter-clockwise.
        Ccw => "CCW",
        /// Clockwise.
        Cw => "CW",
    }
}

impl FrontFace {
    /// The opposite winding, used to draw mirrored objects.
    pub const fn inverted(self) -> Self {
        match self {
            FrontFace::Ccw => FrontFace::Cw,
            FrontFace::Cw => FrontFace::Ccw,
        }
    }
}

gl_named_enum! {
    /// A depth comparison function.
    pub enum CompareFunction {
        /// Never passes.
        Never => "NEVER",
        /// Passes if the incoming value is less.
        Less => "LESS",
        /// Passes if the values are equal.
        Equal => "EQUAL",
        /// Passes if the incoming value is less or equal.
        LessEqual => "LEQUAL",
        /// Passes if the incoming value is greater.
        Greater => "GREATER",
        /// Passes if the values differ.
        NotEqual => "NOTEQUAL",
        /// Passes if the incoming value is greater or equal.
        GreaterEqual => "GEQUAL",
        /// Always passes.
        Always => "ALWAYS",
    }
}

gl_named_enum! {
    /// The primitive assembled from vertices.
    pub enum DrawMode {
        /// Individual points.
        Points => "POINTS",
        /// Independent line segments.
        Lines => "LINES",
        /// A closed polyline.
        LineLoop => "LINE_LOOP",
        /// An open polyline.
        LineStrip => "LINE_STRIP",
        /// Independent triangles.
        Triangles => "TRIANGLES",
        /// A strip of connected triangles.
        TriangleStrip => "TRIANGLE_STRIP",
        /// A fan of triangles around the first vertex.
        TriangleFan => "TRIANGLE_FAN",
    }
}

/// A buffer binding point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// Vertex attribute data.
    Array,
    /// Index data.
    ElementArray,
}

/// A hint about how often buffer contents change.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// Written once, drawn many times.
    #[default]
    StaticDraw,
    /// Rewritten repeatedly.
    DynamicDraw,
    /// Written once, drawn a few times.
    StreamDraw,
}

gl_named_enum! {
    /// The component type of vertex, index or pixel data.
    pub enum DataType {
        /// `i8`
        Byte => "BYTE",
        /// `u8`
        UnsignedByte => "UNSIGNED_BYTE",
        /// `i16`
        Short => "SHORT",
        /// `u16`
        UnsignedShort => "UNSIGNED_SHORT",
        /// `i32`
        Int => "INT",
        /// `u32`
        UnsignedInt => "UNSIGNED_INT",
        /// `f32`
        Float => "FLOAT",
        /// `f16`
        HalfFloat => "HALF_FLOAT",
        /// Packed 24-bit depth and 8-bit stencil.
        UnsignedInt248 => "UNSIGNED_INT_24_8",
    }
}

impl DataType {
    /// Size in bytes of one component.
    pub const fn size_in_bytes(self) -> u32 {
        match self {
            DataType::Byte | DataType::UnsignedByte => 1,
            DataType::Short | DataType::UnsignedShort | DataType::HalfFloat => 2,
            DataType::Int | DataType::UnsignedInt | DataType::Float | DataType::UnsignedInt248 => 4,
        }
    }
}

gl_named_enum! {
    /// The kind of texture object.
    pub enum TextureTarget {
        /// A single 2D image.
        Texture2D => "TEXTURE_2D",
        /// Six square faces.
        CubeMap => "TEXTURE_CUBE_MAP",
    }
}

/// The image slot written by `texImage2D` or attached to a framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TexImageTarget {
    /// The image of a 2D texture.
    Texture2D,
    /// One face of a cube map: `+X, -X, +Y, -Y, +Z, -Z` for `0..6`.
    CubeFace(u8),
}

gl_named_enum! {
    /// The layout of pixel data supplied to or read from a texture.
    pub enum PixelFormat {
        /// Alpha only.
        Alpha => "ALPHA",
        /// Luminance only.
        Luminance => "LUMINANCE",
        /// Luminance and alpha.
        LuminanceAlpha => "LUMINANCE_ALPHA",
        /// Red only.
        Red => "RED",
        /// Red and green.
        Rg => "RG",
        /// Red, green and blue.
        Rgb => "RGB",
        /// Red, green, blue and alpha.
        Rgba => "RGBA",
        /// Depth values.
        DepthComponent => "DEPTH_COMPONENT",
        /// Packed depth and stencil values.
        DepthStencil => "DEPTH_STENCIL",
    }
}

impl PixelFormat {
    /// Number of components per pixel.
    pub const fn components(self) -> u32 {
        match self {
            PixelFormat::Alpha
            | PixelFormat::Luminance
            | PixelFormat::Red
            | PixelFormat::DepthComponent
            | PixelFormat::DepthStencil => 1,
            PixelFormat::LuminanceAlpha | PixelFormat::Rg => 2,
            PixelFormat::Rgb => 3,
            PixelFormat::Rgba => 4,
        }
    }
}

gl_named_enum! {
    /// How the GPU stores a texture's texels.
    ///
    /// The unsized variants share their names with [`PixelFormat`], as in WebGL 1.
    pub enum InternalFormat {
        /// Unsized alpha.
        Alpha => "ALPHA",
        /// Unsized luminance.
        Luminance => "LUMINANCE",
        /// Unsized luminance and alpha.
        LuminanceAlpha => "LUMINANCE_ALPHA",
        /// Unsized RGB.
        Rgb => "RGB",
        /// Unsized RGBA.
        Rgba => "RGBA",
        /// 8-bit red.
        R8 => "R8",
        /// 8-bit red and green.
        Rg8 => "RG8",
        /// 8-bit RGB.
        Rgb8 => "RGB8",
        /// 8-bit RGBA.
        Rgba8 => "RGBA8",
        /// Half-float RGBA.
        Rgba16F => "RGBA16F",
        /// Float RGBA.
        Rgba32F => "RGBA32F",
        /// Unsized depth.
        DepthComponent => "DEPTH_COMPONENT",
        /// 16-bit depth.
        DepthComponent16 => "DEPTH_COMPONENT16",
        /// 24-bit depth.
        DepthComponent24 => "DEPTH_COMPONENT24",
        /// Float depth.
        DepthComponent32F => "DEPTH_COMPONENT32F",
        /// Unsized depth and stencil.
        DepthStencil => "DEPTH_STENCIL",
        /// 24-bit depth and 8-bit stencil.
        Depth24Stencil8 => "DEPTH24_STENCIL8",
    }
}

gl_named_enum! {
    /// A texture minification or magnification filter.
    pub enum TextureFilter {
        /// Nearest texel.
        Nearest => "NEAREST",
        /// Bilinear.
        Linear => "LINEAR",
        /// Nearest texel of the nearest mip level.
        NearestMipmapNearest => "NEAREST_MIPMAP_NEAREST",
        /// Bilinear within the nearest mip level.
        LinearMipmapNearest => "LINEAR_MIPMAP_NEAREST",
        /// Nearest texel, blended between mip levels.
        NearestMipmapLinear => "NEAREST_MIPMAP_LINEAR",
        /// Trilinear.
        LinearMipmapLinear => "LINEAR_MIPMAP_LINEAR",
    }
}

impl TextureFilter {
    /// `true` if sampling with this filter reads mip levels.
    pub const fn uses_mipmaps(self) -> bool {
        !matches!(self, TextureFilter::Nearest | TextureFilter::Linear)
    }
}

gl_named_enum! {
    /// How texture coordinates outside `[0, 1]` are resolved.
    pub enum TextureWrap {
        /// Clamp to the edge texel.
        ClampToEdge => "CLAMP_TO_EDGE",
        /// Tile.
        Repeat => "REPEAT",
        /// Tile, mirroring every other repeat.
        MirroredRepeat => "MIRRORED_REPEAT",
    }
}

/// A sampler parameter set with `texParameter`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TextureParameter {
    /// Minification filter.
    MinFilter(TextureFilter),
    /// Magnification filter.
    MagFilter(TextureFilter),
    /// Wrap mode along S.
    WrapS(TextureWrap),
    /// Wrap mode along T.
    WrapT(TextureWrap),
    /// Anisotropic filtering level.
    MaxAnisotropy(f32),
}

/// A pixel unpacking parameter set with `pixelStorei`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelStore {
    /// Flip images vertically on upload.
    FlipY(bool),
    /// Multiply color by alpha on upload.
    PremultiplyAlpha(bool),
    /// Row alignment of client pixel data: 1, 2, 4 or 8.
    UnpackAlignment(u32),
}

/// Which buffers `clear` resets.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClearFlags {
    /// Clear the color buffer.
    pub color: bool,
    /// Clear the depth buffer.
    pub depth: bool,
    /// Clear the stencil buffer.
    pub stencil: bool,
}

impl ClearFlags {
    /// Clears nothing.
    pub const NONE: Self = Self {
        color: false,
        depth: false,
        stencil: false,
    };
    /// Clears color, depth and stencil.
    pub const ALL: Self = Self {
        color: true,
        depth: true,
        stencil: true,
    };

    /// `true` if no buffer is selected.
    pub const fn is_empty(self) -> bool {
        !(self.color || self.depth || self.stencil)
    }
}

/// A framebuffer attachment point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attachment {
    /// `COLOR_ATTACHMENTi`.
    Color(u32),
    /// The depth attachment.
    Depth,
    /// The stencil attachment.
    Stencil,
    /// The combined depth-stencil attachment.
    DepthStencil,
}

/// Storage formats for renderbuffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderbufferFormat {
    /// 16-bit depth.
    DepthComponent16,
    /// 8-bit stencil.
    StencilIndex8,
    /// Packed depth and stencil.
    DepthStencil,
}

/// The result of a framebuffer completeness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FramebufferStatus {
    /// The framebuffer can be rendered to.
    Complete,
    /// An attachment is not renderable.
    IncompleteAttachment,
    /// Nothing is attached.
    MissingAttachment,
    /// Attachments differ in size.
    IncompleteDimensions,
    /// The combination of formats is not supported.
    Unsupported,
    /// A backend-specific status code.
    Other(u32),
}

impl fmt::Display for FramebufferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FramebufferStatus::Complete => f.write_str("FRAMEBUFFER_COMPLETE"),
            FramebufferStatus::IncompleteAttachment => {
                f.write_str("FRAMEBUFFER_INCOMPLETE_ATTACHMENT")
            }
            FramebufferStatus::MissingAttachment => {
                f.write_str("FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT")
            }
            FramebufferStatus::IncompleteDimensions => {
                f.write_str("FRAMEBUFFER_INCOMPLETE_DIMENSIONS")
            }
            FramebufferStatus::Unsupported => f.write_str("FRAMEBUFFER_UNSUPPORTED"),
            FramebufferStatus::Other(code) => write!(f, "framebuffer status {code:#x}"),
        }
    }
}

/// A shader stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// The vertex stage.
    Vertex,
    /// The fragment stage.
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// The GLSL type of an active uniform or attribute.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlslType {
    Float,
    Vec2,
    Vec3,
    Vec4,
    Int,
    IVec2,
    IVec3,
    IVec4,
    Bool,
    BVec2,
    BVec3,
    BVec4,
    Mat2,
    Mat3,
    Mat4,
    Sampler2D,
    SamplerCube,
}

impl GlslType {
    /// Parses a GLSL type keyword.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "float" => GlslType::Float,
            "vec2" => GlslType::Vec2,
            "vec3" => GlslType::Vec3,
            "vec4" => GlslType::Vec4,
            "int" => GlslType::Int,
            "ivec2" => GlslType::IVec2,
            "ivec3" => GlslType::IVec3,
            "ivec4" => GlslType::IVec4,
            "bool" => GlslType::Bool,
            "bvec2" => GlslType::BVec2,
            "bvec3" => GlslType::BVec3,
            "bvec4" => GlslType::BVec4,
            "mat2" => GlslType::Mat2,
            "mat3" => GlslType::Mat3,
            "mat4" => GlslType::Mat4,
            "sampler2D" => GlslType::Sampler2D,
            "samplerCube" => GlslType::SamplerCube,
            _ => return None,
        })
    }

    /// Number of scalar components in one value.
    pub const fn components(self) -> u32 {
        match self {
            GlslType::Float
            | GlslType::Int
            | GlslType::Bool
            | GlslType::Sampler2D
            | GlslType::SamplerCube => 1,
            GlslType::Vec2 | GlslType::IVec2 | GlslType::BVec2 => 2,
            GlslType::Vec3 | GlslType::IVec3 | GlslType::BVec3 => 3,
            GlslType::Vec4 | GlslType::IVec4 | GlslType::BVec4 | GlslType::Mat2 => 4,
            GlslType::Mat3 => 9,
            GlslType::Mat4 => 16,
        }
    }

    /// Number of consecutive attribute locations a value occupies.
    pub const fn attribute_locations(self) -> u32 {
        match self {
            GlslType::Mat2 => 2,
            GlslType::Mat3 => 3,
            GlslType::Mat4 => 4,
            _ => 1,
        }
    }

    /// `true` for sampler types, whose uniform value is a texture unit.
    pub const fn is_sampler(self) -> bool {
        matches!(self, GlslType::Sampler2D | GlslType::SamplerCube)
    }

    /// `true` if values are uploaded through the integer uniform entry points.
    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            GlslType::Int
                | GlslType::IVec2
                | GlslType::IVec3
                | GlslType::IVec4
                | GlslType::Bool
                | GlslType::BVec2
                | GlslType::BVec3
                | GlslType::BVec4
                | GlslType::Sampler2D
                | GlslType::SamplerCube
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_gl_names_with_optional_prefix() {
        assert_eq!("SRC_ALPHA".parse::<BlendFactor>(), Ok(BlendFactor::SrcAlpha));
        assert_eq!("GL_LEQUAL".parse::<CompareFunction>(), Ok(CompareFunction::LessEqual));
        assert_eq!(" FUNC_ADD ".parse::<BlendEquation>(), Ok(BlendEquation::Add));
    }

    #[test]
    fn rejects_unknown_names() {
        let err = "SOURCE_ALPHA".parse::<BlendFactor>().unwrap_err();
        assert_eq!(err.kind, "BlendFactor");
        assert_eq!(err.value, "SOURCE_ALPHA");
    }

    #[test]
    fn every_variant_round_trips_through_its_name() {
        for factor in BlendFactor::ALL {
            assert_eq!(factor.gl_name().parse::<BlendFactor>(), Ok(*factor));
        }
        for mode in DrawMode::ALL {
            assert_eq!(mode.to_string().parse::<DrawMode>(), Ok(*mode));
        }
    }

    #[test]
    fn glsl_type_properties() {
        assert_eq!(GlslType::from_keyword("mat4"), Some(GlslType::Mat4));
        assert_eq!(GlslType::Mat4.attribute_locations(), 4);
        assert_eq!(GlslType::Mat3.components(), 9);
        assert!(GlslType::SamplerCube.is_sampler());
        assert!(GlslType::Bool.is_integer());
        assert_eq!(GlslType::from_keyword("dvec2"), None);
    }

    #[test]
    fn filter_mipmap_usage() {
        assert!(TextureFilter::LinearMipmapLinear.uses_mipmaps());
        assert!(!TextureFilter::Linear.uses_mipmaps());
        assert_eq!(FrontFace::Ccw.inverted(), FrontFace::Cw);
    }
}
