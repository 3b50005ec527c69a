//! Fractal engine crate.
//!
//! Platform, GPU and shader-program plumbing for full-screen fragment-shader
//! viewers. The viewer binary lives in `fractal-viewer`.

pub mod device;
pub mod window;
pub mod input;
pub mod time;
pub mod core;

pub mod logging;
pub mod coords;
pub mod render;
