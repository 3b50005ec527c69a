//! Shader program error types.

use std::path::PathBuf;

use thiserror::Error;

use super::source::ShaderStage;
use super::uniforms::UniformKind;

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("failed to read shader source {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{stage} shader failed to compile:\n{diagnostic}")]
    Compile { stage: ShaderStage, diagnostic: String },

    #[error("{stage} shaders are not supported by the wgpu pipeline")]
    UnsupportedStage { stage: ShaderStage },

    #[error("shader program has no {stage} stage")]
    MissingStage { stage: ShaderStage },

    #[error("shader program failed to link: {0}")]
    Link(String),

    #[error("`{name}` is not an active uniform of shader program `{program}`")]
    UniformNotFound { name: String, program: String },

    #[error("uniform `{name}` of shader program `{program}` is {actual}, not {expected}")]
    UniformTypeMismatch {
        name: String,
        program: String,
        expected: &'static str,
        actual: UniformKind,
    },

    #[error("uniform handle was resolved by a different program than `{program}`")]
    ForeignHandle { program: String },
}
