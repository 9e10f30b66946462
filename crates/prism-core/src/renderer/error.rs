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

//! Defines the hierarchy of error types for the rendering subsystem.

use crate::renderer::api::{FramebufferStatus, ShaderStage};
use std::fmt;

/// An error related to compiling or linking a shader program.
#[derive(Debug, Clone, PartialEq)]
pub enum ShaderError {
    /// A required shader stage was given no source.
    MissingSource {
        /// The stage without source.
        stage: ShaderStage,
    },
    /// A shader stage failed to compile.
    CompilationError {
        /// The stage that failed.
        stage: ShaderStage,
        /// The compiler log, followed by the line-numbered source.
        details: String,
    },
    /// The compiled stages failed to link.
    LinkError {
        /// The linker log.
        details: String,
    },
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderError::MissingSource { stage } => {
                write!(f, "Missing {stage} shader source")
            }
            ShaderError::CompilationError { stage, details } => {
                write!(f, "Shader compilation failed for {stage} stage: {details}")
            }
            ShaderError::LinkError { details } => {
                write!(f, "Program link failed: {details}")
            }
        }
    }
}

impl std::error::Error for ShaderError {}

/// An error related to the creation or use of a GPU resource.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceError {
    /// A shader-specific error occurred.
    Shader(ShaderError),
    /// A resource id did not resolve to a live resource.
    NotFound,
    /// The handle passed to the backend is invalid or was deleted.
    InvalidHandle,
    /// The backend could not allocate the object.
    OutOfMemory,
    /// An error originating from the specific graphics backend implementation.
    BackendError(String),
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::Shader(err) => write!(f, "Shader resource error: {err}"),
            ResourceError::NotFound => write!(f, "Resource not found with ID."),
            ResourceError::InvalidHandle => write!(f, "Invalid resource handle or ID."),
            ResourceError::OutOfMemory => write!(f, "The backend is out of memory."),
            ResourceError::BackendError(msg) => {
                write!(f, "Backend-specific resource error: {msg}")
            }
        }
    }
}

impl std::error::Error for ResourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResourceError::Shader(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ShaderError> for ResourceError {
    fn from(err: ShaderError) -> Self {
        ResourceError::Shader(err)
    }
}

/// A high-level error raised while rendering a frame.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    /// An error occurred while managing a GPU resource.
    ResourceError(ResourceError),
    /// A framebuffer was not complete after its attachments were set up.
    FramebufferIncomplete {
        /// The status reported by the backend.
        status: FramebufferStatus,
    },
    /// An unexpected or internal error occurred.
    Internal(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::ResourceError(err) => {
                write!(f, "Graphics resource operation failed: {err}")
            }
            RenderError::FramebufferIncomplete { status } => {
                write!(f, "Framebuffer is incomplete: {status}")
            }
            RenderError::Internal(msg) => {
                write!(f, "An internal or unexpected error occurred: {msg}")
            }
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::ResourceError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ResourceError> for RenderError {
    fn from(err: ResourceError) -> Self {
        RenderError::ResourceError(err)
    }
}

impl From<ShaderError> for RenderError {
    fn from(err: ShaderError) -> Self {
        RenderError::ResourceError(ResourceError::Shader(err))
    }
}

/// A GL constant name did not match any variant of the requested enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    /// The name of the enum being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown {} name '{}'", self.kind, self.value)
    }
}

impl std::error::Error for ParseEnumError {}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;

    #[test]
    fn shader_error_display() {
        let err = ShaderError::CompilationError {
            stage: ShaderStage::Fragment,
            details: "ERROR: 0:5: syntax error".to_string(),
        };
        assert_eq!(
            format!("{err}"),
            "Shader compilation failed for fragment stage: ERROR: 0:5: syntax error"
        );
        assert_eq!(
            ShaderError::MissingSource {
                stage: ShaderStage::Vertex
            }
            .to_string(),
            "Missing vertex shader source"
        );
    }

    #[test]
    fn render_error_chains_to_shader_error() {
        let render_err: RenderError = ShaderError::LinkError {
            details: "varying mismatch".to_string(),
        }
        .into();
        assert_eq!(
            format!("{render_err}"),
            "Graphics resource operation failed: Shader resource error: Program link failed: varying mismatch"
        );
        assert!(render_err.source().is_some());
        assert!(render_err.source().unwrap().source().is_some());
    }

    #[test]
    fn framebuffer_status_in_message() {
        let err = RenderError::FramebufferIncomplete {
            status: FramebufferStatus::MissingAttachment,
        };
        assert_eq!(
            err.to_string(),
            "Framebuffer is incomplete: FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT"
        );
        assert!(err.source().is_none());
    }

    #[test]
    fn parse_enum_error_display() {
        let err = ParseEnumError {
            kind: "BlendFactor",
            value: "SRC".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown BlendFactor name 'SRC'");
    }
}
