//! Coordinate types shared by the runtime and the fractal views.
//!
//! Screen space:
//! - Logical pixels (DPI-aware)
//! - Origin top-left
//! - +X right, +Y down
//!
//! World space is the complex plane; cameras map between the two.

mod vec2;
mod viewport;

pub use vec2::Vec2;
pub use viewport::Viewport;
