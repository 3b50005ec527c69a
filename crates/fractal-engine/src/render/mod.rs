//! GPU rendering subsystem.
//!
//! Convention:
//! - Geometry is a single full-screen quad in NDC.
//! - Fragment shaders derive world coordinates from the interpolated position
//!   and their own uniforms.

pub mod program;
mod screen_quad;

pub use program::{ShaderError, ShaderProgram};
pub use screen_quad::ScreenQuad;
