//! Shader programs built from annotated GLSL files.
//!
//! Pipeline: [`ShaderSources`] splits a file into stages, [`CompiledProgram`]
//! compiles, validates and links them on the CPU, and [`ShaderProgram`]
//! creates the GPU pipeline and owns the uniform buffers.

mod compile;
mod error;
#[allow(clippy::module_inception)]
mod program;
mod source;
mod uniforms;

pub use compile::{CompiledProgram, PASS_THROUGH_VERTEX};
pub use error::ShaderError;
pub use program::ShaderProgram;
pub use source::{ShaderSources, ShaderStage, DIRECTIVE_MARKER};
pub use uniforms::{
    DoubleHandle, Mat4Handle, Precision, UniformBlock, UniformKind, UniformLayout, UniformMember,
    Uniforms, Vec4Handle,
};
