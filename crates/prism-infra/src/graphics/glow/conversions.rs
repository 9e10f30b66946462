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

use prism_core::renderer::{
    Attachment, BlendEquation, BlendFactor, BufferTarget, BufferUsage, Capability,
    CompareFunction, DataType, DrawMode, Face, FramebufferStatus, FrontFace, InternalFormat,
    PixelFormat, RenderbufferFormat, ShaderStage, TexImageTarget, TextureFilter, TextureTarget,
    TextureWrap,
};

// Legacy unsized formats of GLES 2 / WebGL 1.
const ALPHA: u32 = 0x1906;
const LUMINANCE: u32 = 0x1909;
const LUMINANCE_ALPHA: u32 = 0x190A;

/// A local extension trait to convert our engine's types into GL enum values.
/// This avoids Rust's orphan rules while keeping an idiomatic `.into_gl()` syntax.
pub trait IntoGl {
    /// Consumes self and converts it into the matching GL constant.
    fn into_gl(self) -> u32;
}

impl IntoGl for Capability {
    fn into_gl(self) -> u32 {
        match self {
            Capability::Blend => glow::BLEND,
            Capability::CullFace => glow::CULL_FACE,
            Capability::DepthTest => glow::DEPTH_TEST,
            Capability::StencilTest => glow::STENCIL_TEST,
            Capability::ScissorTest => glow::SCISSOR_TEST,
            Capability::PolygonOffsetFill => glow::POLYGON_OFFSET_FILL,
        }
    }
}

impl IntoGl for BlendFactor {
    fn into_gl(self) -> u32 {
        match self {
            BlendFactor::Zero => glow::ZERO,
            BlendFactor::One => glow::ONE,
            BlendFactor::SrcColor => glow::SRC_COLOR,
            BlendFactor::OneMinusSrcColor => glow::ONE_MINUS_SRC_COLOR,
            BlendFactor::DstColor => glow::DST_COLOR,
            BlendFactor::OneMinusDstColor => glow::ONE_MINUS_DST_COLOR,
            BlendFactor::SrcAlpha => glow::SRC_ALPHA,
            BlendFactor::OneMinusSrcAlpha => glow::ONE_MINUS_SRC_ALPHA,
            BlendFactor::DstAlpha => glow::DST_ALPHA,
            BlendFactor::OneMinusDstAlpha => glow::ONE_MINUS_DST_ALPHA,
            BlendFactor::ConstantColor => glow::CONSTANT_COLOR,
            BlendFactor::OneMinusConstantColor => glow::ONE_MINUS_CONSTANT_COLOR,
            BlendFactor::ConstantAlpha => glow::CONSTANT_ALPHA,
            BlendFactor::OneMinusConstantAlpha => glow::ONE_MINUS_CONSTANT_ALPHA,
            BlendFactor::SrcAlphaSaturate => glow::SRC_ALPHA_SATURATE,
        }
    }
}

impl IntoGl for BlendEquation {
    fn into_gl(self) -> u32 {
        match self {
            BlendEquation::Add => glow::FUNC_ADD,
            BlendEquation::Subtract => glow::FUNC_SUBTRACT,
            BlendEquation::ReverseSubtract => glow::FUNC_REVERSE_SUBTRACT,
            BlendEquation::Min => glow::MIN,
            BlendEquation::Max => glow::MAX,
        }
    }
}

impl IntoGl for Face {
    fn into_gl(self) -> u32 {
        match self {
            Face::Front => glow::FRONT,
            Face::Back => glow::BACK,
            Face::FrontAndBack => glow::FRONT_AND_BACK,
        }
    }
}

impl IntoGl for FrontFace {
    fn into_gl(self) -> u32 {
        match self {
            FrontFace::Ccw => glow::CCW,
            FrontFace::Cw => glow::CW,
        }
    }
}

impl IntoGl for CompareFunction {
    fn into_gl(self) -> u32 {
        match self {
            CompareFunction::Never => glow::NEVER,
            CompareFunction::Less => glow::LESS,
            CompareFunction::Equal => glow::EQUAL,
            CompareFunction::LessEqual => glow::LEQUAL,
            CompareFunction::Greater => glow::GREATER,
            CompareFunction::NotEqual => glow::NOTEQUAL,
            CompareFunction::GreaterEqual => glow::GEQUAL,
            CompareFunction::Always => glow::ALWAYS,
        }
    }
}

impl IntoGl for DrawMode {
    fn into_gl(self) -> u32 {
        match self {
            DrawMode::Points => glow::POINTS,
            DrawMode::Lines => glow::LINES,
            DrawMode::LineLoop => glow::LINE_LOOP,
            DrawMode::LineStrip => glow::LINE_STRIP,
            DrawMode::Triangles => glow::TRIANGLES,
            DrawMode::TriangleStrip => glow::TRIANGLE_STRIP,
            DrawMode::TriangleFan => glow::TRIANGLE_FAN,
        }
    }
}

impl IntoGl for BufferTarget {
    fn into_gl(self) -> u32 {
        match self {
            BufferTarget::Array => glow::ARRAY_BUFFER,
            BufferTarget::ElementArray => glow::ELEMENT_ARRAY_BUFFER,
        }
    }
}

impl IntoGl for BufferUsage {
    fn into_gl(self) -> u32 {
        match self {
            BufferUsage::StaticDraw => glow::STATIC_DRAW,
            BufferUsage::DynamicDraw => glow::DYNAMIC_DRAW,
            BufferUsage::StreamDraw => glow::STREAM_DRAW,
        }
    }
}

impl IntoGl for DataType {
    fn into_gl(self) -> u32 {
        match self {
            DataType::Byte => glow::BYTE,
            DataType::UnsignedByte => glow::UNSIGNED_BYTE,
            DataType::Short => glow::SHORT,
            DataType::UnsignedShort => glow::UNSIGNED_SHORT,
            DataType::Int => glow::INT,
            DataType::UnsignedInt => glow::UNSIGNED_INT,
            DataType::Float => glow::FLOAT,
            DataType::HalfFloat => glow::HALF_FLOAT,
            DataType::UnsignedInt248 => glow::UNSIGNED_INT_24_8,
        }
    }
}

impl IntoGl for TextureTarget {
    fn into_gl(self) -> u32 {
        match self {
            TextureTarget::Texture2D => glow::TEXTURE_2D,
            TextureTarget::CubeMap => glow::TEXTURE_CUBE_MAP,
        }
    }
}

impl IntoGl for TexImageTarget {
    fn into_gl(self) -> u32 {
        match self {
            TexImageTarget::Texture2D => glow::TEXTURE_2D,
            TexImageTarget::CubeFace(face) => glow::TEXTURE_CUBE_MAP_POSITIVE_X + u32::from(face.min(5)),
        }
    }
}

impl IntoGl for PixelFormat {
    fn into_gl(self) -> u32 {
        match self {
            PixelFormat::Alpha => ALPHA,
            PixelFormat::Luminance => LUMINANCE,
            PixelFormat::LuminanceAlpha => LUMINANCE_ALPHA,
            PixelFormat::Red => glow::RED,
            PixelFormat::Rg => glow::RG,
            PixelFormat::Rgb => glow::RGB,
            PixelFormat::Rgba => glow::RGBA,
            PixelFormat::DepthComponent => glow::DEPTH_COMPONENT,
            PixelFormat::DepthStencil => glow::DEPTH_STENCIL,
        }
    }
}

impl IntoGl for InternalFormat {
    fn into_gl(self) -> u32 {
        match self {
            InternalFormat::Alpha => ALPHA,
            InternalFormat::Luminance => LUMINANCE,
            InternalFormat::LuminanceAlpha => LUMINANCE_ALPHA,
            InternalFormat::Rgb => glow::RGB,
            InternalFormat::Rgba => glow::RGBA,
            InternalFormat::R8 => glow::R8,
            InternalFormat::Rg8 => glow::RG8,
            InternalFormat::Rgb8 => glow::RGB8,
            InternalFormat::Rgba8 => glow::RGBA8,
            InternalFormat::Rgba16F => glow::RGBA16F,
            InternalFormat::Rgba32F => glow::RGBA32F,
            InternalFormat::DepthComponent => glow::DEPTH_COMPONENT,
            InternalFormat::DepthComponent16 => glow::DEPTH_COMPONENT16,
            InternalFormat::DepthComponent24 => glow::DEPTH_COMPONENT24,
            InternalFormat::DepthComponent32F => glow::DEPTH_COMPONENT32F,
            InternalFormat::DepthStencil => glow::DEPTH_STENCIL,
            InternalFormat::Depth24Stencil8 => glow::DEPTH24_STENCIL8,
        }
    }
}

impl IntoGl for TextureFilter {
    fn into_gl(self) -> u32 {
        match self {
            TextureFilter::Nearest => glow::NEAREST,
            TextureFilter::Linear => glow::LINEAR,
            TextureFilter::NearestMipmapNearest => glow::NEAREST_MIPMAP_NEAREST,
            TextureFilter::LinearMipmapNearest => glow::LINEAR_MIPMAP_NEAREST,
            TextureFilter::NearestMipmapLinear => glow::NEAREST_MIPMAP_LINEAR,
            TextureFilter::LinearMipmapLinear => glow::LINEAR_MIPMAP_LINEAR,
        }
    }
}

impl IntoGl for TextureWrap {
    fn into_gl(self) -> u32 {
        match self {
            TextureWrap::ClampToEdge => glow::CLAMP_TO_EDGE,
            TextureWrap::Repeat => glow::REPEAT,
            TextureWrap::MirroredRepeat => glow::MIRRORED_REPEAT,
        }
    }
}

impl IntoGl for Attachment {
    fn into_gl(self) -> u32 {
        match self {
            Attachment::Color(index) => glow::COLOR_ATTACHMENT0 + index,
            Attachment::Depth => glow::DEPTH_ATTACHMENT,
            Attachment::Stencil => glow::STENCIL_ATTACHMENT,
            Attachment::DepthStencil => glow::DEPTH_STENCIL_ATTACHMENT,
        }
    }
}

impl IntoGl for ShaderStage {
    fn into_gl(self) -> u32 {
        match self {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        }
    }
}

/// Converts a renderbuffer format, picking the sized depth-stencil format on GL 3 class contexts.
pub fn renderbuffer_format(format: RenderbufferFormat, webgl2: bool) -> u32 {
    match format {
        RenderbufferFormat::DepthComponent16 => glow::DEPTH_COMPONENT16,
        RenderbufferFormat::StencilIndex8 => glow::STENCIL_INDEX8,
        RenderbufferFormat::DepthStencil if webgl2 => glow::DEPTH24_STENCIL8,
        RenderbufferFormat::DepthStencil => glow::DEPTH_STENCIL,
    }
}

/// Converts the result of `glCheckFramebufferStatus`.
pub fn framebuffer_status_from_gl(status: u32) -> FramebufferStatus {
    match status {
        glow::FRAMEBUFFER_COMPLETE => FramebufferStatus::Complete,
        glow::FRAMEBUFFER_INCOMPLETE_ATTACHMENT => FramebufferStatus::IncompleteAttachment,
        glow::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT => FramebufferStatus::MissingAttachment,
        0x8CD9 => FramebufferStatus::IncompleteDimensions,
        glow::FRAMEBUFFER_UNSUPPORTED => FramebufferStatus::Unsupported,
        other => FramebufferStatus::Other(other),
    }
}

/// Converts an active uniform or attribute type reported by the driver.
pub fn glsl_type_from_gl(ty: u32) -> Option<prism_core::renderer::GlslType> {
    use prism_core::renderer::GlslType;
    Some(match ty {
        glow::FLOAT => GlslType::Float,
        glow::FLOAT_VEC2 => GlslType::Vec2,
        glow::FLOAT_VEC3 => GlslType::Vec3,
        glow::FLOAT_VEC4 => GlslType::Vec4,
        glow::INT => GlslType::Int,
        glow::INT_VEC2 => GlslType::IVec2,
        glow::INT_VEC3 => GlslType::IVec3,
        glow::INT_VEC4 => GlslType::IVec4,
        glow::BOOL => GlslType::Bool,
        glow::BOOL_VEC2 => GlslType::BVec2,
        glow::BOOL_VEC3 => GlslType::BVec3,
        glow::BOOL_VEC4 => GlslType::BVec4,
        glow::FLOAT_MAT2 => GlslType::Mat2,
        glow::FLOAT_MAT3 => GlslType::Mat3,
        glow::FLOAT_MAT4 => GlslType::Mat4,
        glow::SAMPLER_2D => GlslType::Sampler2D,
        glow::SAMPLER_CUBE => GlslType::SamplerCube,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_faces_follow_the_gl_order() {
        assert_eq!(TexImageTarget::CubeFace(0).into_gl(), glow::TEXTURE_CUBE_MAP_POSITIVE_X);
        assert_eq!(TexImageTarget::CubeFace(5).into_gl(), glow::TEXTURE_CUBE_MAP_NEGATIVE_Z);
    }

    #[test]
    fn framebuffer_status_round_trip() {
        assert_eq!(framebuffer_status_from_gl(glow::FRAMEBUFFER_COMPLETE), FramebufferStatus::Complete);
        assert_eq!(framebuffer_status_from_gl(0x1234), FramebufferStatus::Other(0x1234));
    }
}
