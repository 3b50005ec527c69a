//! Navigation state shared by both fractal views.
//!
//! The explorer owns one camera per fractal, the Julia constant and the
//! current mode. It turns one frame of input into camera and mode changes;
//! it never touches the GPU.

use std::ops::{Index, IndexMut};

use fractal_engine::coords::{Vec2, Viewport};
use fractal_engine::core::AppControl;
use fractal_engine::input::{InputFrame, InputState};

use crate::bindings;
use crate::camera::{Camera, ViewMetrics};
use crate::config::ControlSettings;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Fractal {
    Mandelbrot,
    Julia,
}

/// One value per fractal, indexed by [`Fractal`].
#[derive(Debug, Clone, PartialEq)]
pub struct PerFractal<T> {
    pub mandelbrot: T,
    pub julia: T,
}

impl<T> PerFractal<T> {
    pub fn both(value: T) -> Self
    where
        T: Clone,
    {
        Self {
            mandelbrot: value.clone(),
            julia: value,
        }
    }
}

impl<T> Index<Fractal> for PerFractal<T> {
    type Output = T;

    fn index(&self, fractal: Fractal) -> &T {
        match fractal {
            Fractal::Mandelbrot => &self.mandelbrot,
            Fractal::Julia => &self.julia,
        }
    }
}

impl<T> IndexMut<Fractal> for PerFractal<T> {
    fn index_mut(&mut self, fractal: Fractal) -> &mut T {
        match fractal {
            Fractal::Mandelbrot => &mut self.mandelbrot,
            Fractal::Julia => &mut self.julia,
        }
    }
}

pub struct Explorer {
    mode: Fractal,
    cameras: PerFractal<Camera>,
    julia_c: Vec2,
    default_camera: Camera,
    screen: Viewport,
    controls: ControlSettings,
}

impl Explorer {
    /// Starts in Mandelbrot mode with both cameras at the default extent for
    /// a screen of the given shape.
    pub fn new(controls: ControlSettings, screen: Viewport) -> Self {
        let half_width = controls.default_half_width;
        let default_camera = Camera::new([0.0, 0.0], [half_width, half_width * screen.aspect()]);

        Self {
            mode: Fractal::Mandelbrot,
            cameras: PerFractal::both(default_camera),
            julia_c: Vec2::zero(),
            default_camera,
            screen,
            controls,
        }
    }

    pub fn mode(&self) -> Fractal {
        self.mode
    }

    /// `(cr, ci)`.
    pub fn julia_c(&self) -> Vec2 {
        self.julia_c
    }

    pub fn camera(&self, fractal: Fractal) -> &Camera {
        &self.cameras[fractal]
    }

    pub fn metrics(&self, fractal: Fractal) -> ViewMetrics {
        self.cameras[fractal].metrics()
    }

    /// Applies one frame of input.
    ///
    /// `dtime` is the previous frame's duration in normalized units and
    /// scales panning only. Returns `Exit` when cancel is pressed in
    /// Mandelbrot mode.
    pub fn update(
        &mut self,
        input: &InputState,
        frame: &InputFrame,
        screen: Viewport,
        dtime: f64,
    ) -> AppControl {
        if screen.is_valid() && screen != self.screen {
            self.fit(screen);
        }

        if self.mode == Fractal::Mandelbrot && frame.key_pressed(bindings::CANCEL) {
            return AppControl::Exit;
        }

        self.navigate(input, dtime);
        self.nudge_julia_c(input);

        if self.mode == Fractal::Mandelbrot && input.button_down(bindings::SELECT) {
            if let Some(pos) = input.pointer_pos.filter(|_| screen.is_valid()) {
                self.enter_julia(pos, screen);
            }
        }

        if self.mode == Fractal::Julia && input.key_down(bindings::CANCEL) {
            log::info!("back to mandelbrot");
            self.mode = Fractal::Mandelbrot;
        }

        AppControl::Continue
    }

    /// Keeps every camera's horizontal extent and center, and derives the
    /// vertical extent from the new screen shape.
    fn fit(&mut self, screen: Viewport) {
        let refit = |camera: &Camera| {
            let ViewMetrics { center, half_extent } = camera.metrics();
            Camera::new(center, [half_extent.x, half_extent.x * screen.aspect()])
        };

        self.cameras.mandelbrot = refit(&self.cameras.mandelbrot);
        self.cameras.julia = refit(&self.cameras.julia);
        self.default_camera = refit(&self.default_camera);
        self.screen = screen;

        log::debug!("viewport now {}x{}", screen.width, screen.height);
    }

    fn navigate(&mut self, input: &InputState, dtime: f64) {
        let step = self.controls.pan_rate * dtime;
        let zoom_step = self.controls.zoom_step;
        let camera = &mut self.cameras[self.mode];

        if input.key_down(bindings::PAN_RIGHT) {
            camera.pan(step, 0.0);
        }
        if input.key_down(bindings::PAN_LEFT) {
            camera.pan(-step, 0.0);
        }
        if input.key_down(bindings::PAN_UP) {
            camera.pan(0.0, -step);
        }
        if input.key_down(bindings::PAN_DOWN) {
            camera.pan(0.0, step);
        }

        // Once per frame, not time-scaled.
        if input.key_down(bindings::ZOOM_IN) {
            camera.zoom(zoom_step);
        }
        if input.key_down(bindings::ZOOM_OUT) {
            camera.zoom(1.0 / zoom_step);
        }
    }

    fn nudge_julia_c(&mut self, input: &InputState) {
        let step = self.controls.nudge_step;

        if input.key_down(bindings::CR_UP) {
            self.julia_c.x += step;
        }
        if input.key_down(bindings::CR_DOWN) {
            self.julia_c.x -= step;
        }
        if input.key_down(bindings::CI_UP) {
            self.julia_c.y += step;
        }
        if input.key_down(bindings::CI_DOWN) {
            self.julia_c.y -= step;
        }
    }

    fn enter_julia(&mut self, pos: Vec2, screen: Viewport) {
        self.julia_c = self.metrics(Fractal::Mandelbrot).screen_to_world(pos, screen);
        self.cameras.julia = self.default_camera;
        self.mode = Fractal::Julia;

        log::info!("julia set for c = {} {:+}i", self.julia_c.x, self.julia_c.y);
    }
}

#[cfg(test)]
mod tests {
    use fractal_engine::input::{InputEvent, Key, KeyState, MouseButton, MouseButtonState, PointerButtonEvent};

    use super::*;

    const SCREEN: Viewport = Viewport::new(1920.0, 1200.0);

    struct Harness {
        explorer: Explorer,
        input: InputState,
        frame: InputFrame,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                explorer: Explorer::new(ControlSettings::default(), SCREEN),
                input: InputState::default(),
                frame: InputFrame::default(),
            }
        }

        fn send(&mut self, ev: InputEvent) {
            self.input.apply_event(&mut self.frame, ev);
        }

        fn key(&mut self, key: Key, state: KeyState) {
            self.send(InputEvent::Key { key, state, repeat: false });
        }

        fn click(&mut self, x: f64, y: f64) {
            self.send(InputEvent::PointerButton(PointerButtonEvent {
                button: MouseButton::Left,
                state: MouseButtonState::Pressed,
                pos: Some(Vec2::new(x, y)),
            }));
        }

        fn step(&mut self, dtime: f64) -> AppControl {
            self.step_on(SCREEN, dtime)
        }

        fn step_on(&mut self, screen: Viewport, dtime: f64) -> AppControl {
            let control = self.explorer.update(&self.input, &self.frame, screen, dtime);
            self.frame.clear();
            control
        }
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn starts_in_mandelbrot_with_aspect_corrected_cameras() {
        let h = Harness::new();
        assert_eq!(h.explorer.mode(), Fractal::Mandelbrot);
        assert_eq!(h.explorer.julia_c(), Vec2::zero());

        let m = h.explorer.metrics(Fractal::Mandelbrot);
        assert_eq!(m.center, Vec2::zero());
        assert_eq!(m.half_extent, Vec2::new(2.0, 1.25));
        assert_eq!(h.explorer.metrics(Fractal::Julia), m);
    }

    #[test]
    fn click_selects_julia_constant_under_cursor() {
        let mut h = Harness::new();
        h.click(0.75 * 1920.0, 0.5 * 1200.0);
        assert_eq!(h.step(0.0), AppControl::Continue);

        assert_eq!(h.explorer.mode(), Fractal::Julia);
        assert_close(h.explorer.julia_c().x, 1.0);
        assert_close(h.explorer.julia_c().y, 0.0);
        assert_eq!(*h.explorer.camera(Fractal::Julia), Camera::new([0.0, 0.0], [2.0, 1.25]));
    }

    #[test]
    fn entering_julia_resets_its_camera() {
        let mut h = Harness::new();
        h.click(960.0, 600.0);
        h.step(0.0);

        h.key(Key::E, KeyState::Pressed);
        h.step(0.0);
        h.step(0.0);
        assert_ne!(*h.explorer.camera(Fractal::Julia), Camera::new([0.0, 0.0], [2.0, 1.25]));

        // Release everything, go back, select again.
        h.send(InputEvent::Focused(false));
        h.key(Key::Escape, KeyState::Pressed);
        h.step(0.0);
        assert_eq!(h.explorer.mode(), Fractal::Mandelbrot);
        h.key(Key::Escape, KeyState::Released);

        h.click(960.0, 600.0);
        h.step(0.0);
        assert_eq!(*h.explorer.camera(Fractal::Julia), Camera::new([0.0, 0.0], [2.0, 1.25]));
    }

    #[test]
    fn escape_in_mandelbrot_exits() {
        let mut h = Harness::new();
        h.key(Key::Escape, KeyState::Pressed);
        assert_eq!(h.step(1.0), AppControl::Exit);
    }

    #[test]
    fn escape_in_julia_returns_without_exiting() {
        let mut h = Harness::new();
        h.click(100.0, 100.0);
        h.step(0.0);
        h.send(InputEvent::PointerButton(PointerButtonEvent {
            button: MouseButton::Left,
            state: MouseButtonState::Released,
            pos: Some(Vec2::new(100.0, 100.0)),
        }));

        h.key(Key::Escape, KeyState::Pressed);
        assert_eq!(h.step(1.0), AppControl::Continue);
        assert_eq!(h.explorer.mode(), Fractal::Mandelbrot);

        // Still held, but no longer a fresh press.
        assert_eq!(h.step(1.0), AppControl::Continue);
    }

    #[test]
    fn nudges_apply_in_both_modes() {
        let mut h = Harness::new();
        h.key(Key::ArrowRight, KeyState::Pressed);
        h.key(Key::ArrowUp, KeyState::Pressed);
        h.step(1.0);
        h.step(1.0);
        assert_close(h.explorer.julia_c().x, 0.002);
        assert_close(h.explorer.julia_c().y, 0.002);

        h.key(Key::ArrowRight, KeyState::Released);
        h.key(Key::ArrowUp, KeyState::Released);
        h.click(960.0, 600.0);
        h.step(1.0);
        assert_eq!(h.explorer.mode(), Fractal::Julia);

        h.key(Key::ArrowLeft, KeyState::Pressed);
        h.key(Key::ArrowDown, KeyState::Pressed);
        h.step(1.0);
        let c = h.explorer.julia_c();
        // The button is still down; in Julia mode it does not reselect.
        assert_close(c.x, -0.001);
        assert_close(c.y, -0.001);
    }

    #[test]
    fn pan_and_zoom_touch_only_active_camera() {
        let mut h = Harness::new();
        h.key(Key::D, KeyState::Pressed);
        h.step(2.0);

        let m = h.explorer.metrics(Fractal::Mandelbrot);
        assert_close(m.center.x, 0.025 * 2.0 * 2.0);
        assert_eq!(h.explorer.metrics(Fractal::Julia).center, Vec2::zero());

        h.key(Key::D, KeyState::Released);
        h.key(Key::Q, KeyState::Pressed);
        h.step(0.0);
        let m = h.explorer.metrics(Fractal::Mandelbrot);
        assert_close(m.half_extent.x, 2.0 / 0.95);
        assert_eq!(h.explorer.metrics(Fractal::Julia).half_extent, Vec2::new(2.0, 1.25));
    }

    #[test]
    fn w_pans_toward_negative_y() {
        let mut h = Harness::new();
        h.key(Key::W, KeyState::Pressed);
        h.step(1.0);
        assert!(h.explorer.metrics(Fractal::Mandelbrot).center.y < 0.0);
    }

    #[test]
    fn zero_dtime_freezes_panning() {
        let mut h = Harness::new();
        h.key(Key::A, KeyState::Pressed);
        h.key(Key::S, KeyState::Pressed);
        h.step(0.0);
        assert_eq!(h.explorer.metrics(Fractal::Mandelbrot).center, Vec2::zero());
    }

    #[test]
    fn held_button_without_pointer_is_ignored() {
        let mut h = Harness::new();
        h.click(10.0, 10.0);
        h.send(InputEvent::PointerLeft);
        h.step(0.0);
        assert_eq!(h.explorer.mode(), Fractal::Mandelbrot);
    }

    #[test]
    fn press_before_pointer_motion_waits_for_position() {
        let mut h = Harness::new();
        h.send(InputEvent::PointerButton(PointerButtonEvent {
            button: MouseButton::Left,
            state: MouseButtonState::Pressed,
            pos: None,
        }));
        h.step(0.0);
        assert_eq!(h.explorer.mode(), Fractal::Mandelbrot);
        assert_eq!(h.explorer.julia_c(), Vec2::zero());

        // Still held; the first motion reveals where the cursor is.
        h.send(InputEvent::PointerMoved(Vec2::new(1440.0, 600.0)));
        h.step(0.0);
        assert_eq!(h.explorer.mode(), Fractal::Julia);
        assert_close(h.explorer.julia_c().x, 1.0);
    }

    #[test]
    fn resize_refits_cameras_to_new_aspect() {
        let mut h = Harness::new();
        h.key(Key::D, KeyState::Pressed);
        h.step(1.0);
        h.key(Key::D, KeyState::Released);
        let before = h.explorer.metrics(Fractal::Mandelbrot);

        let square = Viewport::new(1000.0, 1000.0);
        h.step_on(square, 0.0);

        let after = h.explorer.metrics(Fractal::Mandelbrot);
        assert_close(after.center.x, before.center.x);
        assert_close(after.center.y, before.center.y);
        assert_close(after.half_extent.x, before.half_extent.x);
        assert_close(after.half_extent.y, before.half_extent.x);
        assert_eq!(h.explorer.metrics(Fractal::Julia).half_extent, Vec2::new(2.0, 2.0));

        // Clicking now maps through the new size, and the Julia reset uses
        // the refitted default.
        h.click(750.0, 500.0);
        h.step_on(square, 0.0);
        assert_close(h.explorer.julia_c().x, after.center.x + 0.5 * after.half_extent.x);
        assert_eq!(*h.explorer.camera(Fractal::Julia), Camera::new([0.0, 0.0], [2.0, 2.0]));
    }

    #[test]
    fn zero_sized_viewport_keeps_cameras() {
        let mut h = Harness::new();
        h.step_on(Viewport::new(0.0, 0.0), 0.0);
        assert_eq!(h.explorer.metrics(Fractal::Mandelbrot).half_extent, Vec2::new(2.0, 1.25));
    }

    #[test]
    fn per_fractal_indexing() {
        let mut pair = PerFractal { mandelbrot: 1, julia: 2 };
        pair[Fractal::Julia] += 10;
        assert_eq!(pair[Fractal::Mandelbrot], 1);
        assert_eq!(pair[Fractal::Julia], 12);
    }
}
