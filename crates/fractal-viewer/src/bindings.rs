//! Default input bindings.

use fractal_engine::input::{Key, MouseButton};

pub const PAN_LEFT: Key = Key::A;
pub const PAN_RIGHT: Key = Key::D;
/// Up on screen, i.e. toward negative world `y`.
pub const PAN_UP: Key = Key::W;
pub const PAN_DOWN: Key = Key::S;

pub const ZOOM_IN: Key = Key::E;
pub const ZOOM_OUT: Key = Key::Q;

pub const CR_UP: Key = Key::ArrowRight;
pub const CR_DOWN: Key = Key::ArrowLeft;
pub const CI_UP: Key = Key::ArrowUp;
pub const CI_DOWN: Key = Key::ArrowDown;

/// Held in Julia: back to Mandelbrot. Pressed in Mandelbrot: quit.
pub const CANCEL: Key = Key::Escape;

/// Held in Mandelbrot: open the Julia set for the point under the cursor.
pub const SELECT: MouseButton = MouseButton::Left;
