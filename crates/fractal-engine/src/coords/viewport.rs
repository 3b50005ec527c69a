use super::Vec2;

/// Window drawable size in logical pixels.
///
/// Pointer positions reported by the input subsystem share this basis, so a
/// pointer position divided by the viewport size is a fraction of the screen.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    #[inline]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }

    /// Height over width.
    #[inline]
    pub fn aspect(self) -> f64 {
        self.height / self.width
    }

    #[inline]
    pub fn size(self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }
}
