use fractal_engine::coords::{Vec2, Viewport};

/// Center and half-extent of a camera's visible rectangle.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewMetrics {
    pub center: Vec2,
    pub half_extent: Vec2,
}

impl ViewMetrics {
    /// Maps a logical pixel position (origin top-left) to world coordinates.
    ///
    /// World `y` grows downward, matching the screen.
    pub fn screen_to_world(&self, pos: Vec2, screen: Viewport) -> Vec2 {
        let unit = (pos * 2.0).div_elem(screen.size()) - Vec2::new(1.0, 1.0);
        unit.mul_elem(self.half_extent) + self.center
    }
}

/// Axis-aligned view rectangle in the complex plane.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Camera {
    top_left: Vec2,
    bottom_right: Vec2,
}

impl Camera {
    pub fn new(center: impl Into<Vec2>, half_extent: impl Into<Vec2>) -> Self {
        let (center, half_extent) = (center.into(), half_extent.into());
        Self {
            top_left: center - half_extent,
            bottom_right: center + half_extent,
        }
    }

    /// Scales the extent around the current center. `factor < 1` zooms in.
    pub fn zoom(&mut self, factor: f64) {
        let ViewMetrics { center, half_extent } = self.metrics();
        *self = Self::new(center, half_extent * factor);
    }

    /// Moves the view by a fraction of its half-extent per axis.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        let offset = Vec2::new(dx, dy).mul_elem(self.metrics().half_extent);
        self.top_left += offset;
        self.bottom_right += offset;
    }

    pub fn metrics(&self) -> ViewMetrics {
        ViewMetrics {
            center: (self.bottom_right + self.top_left) / 2.0,
            half_extent: (self.bottom_right - self.top_left) / 2.0,
        }
    }

    pub fn top_left(&self) -> Vec2 {
        self.top_left
    }

    pub fn bottom_right(&self) -> Vec2 {
        self.bottom_right
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn close(a: Vec2, b: Vec2) -> bool {
        (a.x - b.x).abs() < EPS && (a.y - b.y).abs() < EPS
    }

    #[test]
    fn construct_sets_corners() {
        let cam = Camera::new([1.0, -1.0], [2.0, 0.5]);
        assert_eq!(cam.top_left(), Vec2::new(-1.0, -1.5));
        assert_eq!(cam.bottom_right(), Vec2::new(3.0, -0.5));
    }

    #[test]
    fn pan_moves_by_half_extent_fraction() {
        let mut cam = Camera::new([0.0, 0.0], [2.0, 2.0]);
        cam.pan(1.0, 0.0);
        assert_eq!(cam.top_left(), Vec2::new(0.0, -2.0));
        assert_eq!(cam.bottom_right(), Vec2::new(4.0, 2.0));
    }

    #[test]
    fn zoom_half_shrinks_around_center() {
        let mut cam = Camera::new([0.0, 0.0], [2.0, 2.0]);
        cam.zoom(0.5);
        assert_eq!(cam.top_left(), Vec2::new(-1.0, -1.0));
        assert_eq!(cam.bottom_right(), Vec2::new(1.0, 1.0));
    }

    #[test]
    fn zoom_one_is_identity() {
        let mut cam = Camera::new([0.3, -0.7], [1.5, 0.9]);
        let before = cam;
        cam.zoom(1.0);
        assert!(close(cam.top_left(), before.top_left()));
        assert!(close(cam.bottom_right(), before.bottom_right()));
    }

    #[test]
    fn zooms_compose_multiplicatively() {
        let mut a = Camera::new([0.25, 0.5], [2.0, 1.25]);
        let mut b = a;
        a.zoom(0.95);
        a.zoom(1.3);
        b.zoom(0.95 * 1.3);
        assert!(close(a.top_left(), b.top_left()));
        assert!(close(a.bottom_right(), b.bottom_right()));
    }

    #[test]
    fn opposite_pans_restore_corners() {
        let mut cam = Camera::new([0.1, 0.2], [2.0, 1.25]);
        let before = cam;
        cam.pan(0.4, 0.0);
        cam.pan(-0.4, 0.0);
        assert!(close(cam.top_left(), before.top_left()));
        assert!(close(cam.bottom_right(), before.bottom_right()));
    }

    #[test]
    fn stays_non_degenerate_under_navigation() {
        let mut cam = Camera::new([0.0, 0.0], [2.0, 1.25]);
        for i in 0..500 {
            match i % 4 {
                0 => cam.zoom(0.95),
                1 => cam.pan(0.025, -0.05),
                2 => cam.zoom(1.0 / 0.95 * 0.99),
                _ => cam.pan(-0.01, 0.02),
            }
            let m = cam.metrics();
            assert!(m.half_extent.x > 0.0 && m.half_extent.y > 0.0);
            assert!(m.center.is_finite());
            assert!(cam.top_left().x < cam.bottom_right().x);
            assert!(cam.top_left().y < cam.bottom_right().y);
        }
    }

    #[test]
    fn metrics_round_trip_construction() {
        let m = Camera::new([0.5, -0.25], [3.0, 1.0]).metrics();
        assert!(close(m.center, Vec2::new(0.5, -0.25)));
        assert!(close(m.half_extent, Vec2::new(3.0, 1.0)));
    }

    #[test]
    fn screen_to_world_maps_corners_and_center() {
        let m = Camera::new([0.0, 0.0], [2.0, 1.25]).metrics();
        let screen = Viewport::new(1920.0, 1200.0);

        assert!(close(m.screen_to_world(Vec2::new(0.0, 0.0), screen), Vec2::new(-2.0, -1.25)));
        assert!(close(m.screen_to_world(Vec2::new(960.0, 600.0), screen), Vec2::zero()));
        assert!(close(m.screen_to_world(Vec2::new(1440.0, 600.0), screen), Vec2::new(1.0, 0.0)));
        assert!(close(m.screen_to_world(Vec2::new(1920.0, 1200.0), screen), Vec2::new(2.0, 1.25)));
    }
}
