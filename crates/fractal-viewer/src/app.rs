use std::path::Path;

use anyhow::{Context, Result};
use fractal_engine::coords::{Vec2, Viewport};
use fractal_engine::core::{App, AppControl, FrameCtx, StartCtx};
use fractal_engine::render::program::{DoubleHandle, ShaderError};
use fractal_engine::render::{ScreenQuad, ShaderProgram};

use crate::camera::ViewMetrics;
use crate::config::ViewerConfig;
use crate::explorer::{Explorer, Fractal, PerFractal};

const CLEAR: wgpu::Color = wgpu::Color::BLACK;

/// Handles for the view uniforms every fractal shader declares.
struct ViewHandles {
    centerx: DoubleHandle,
    centery: DoubleHandle,
    whx:     DoubleHandle,
    why:     DoubleHandle,
}

/// A fractal shader plus its resolved uniforms.
struct FractalProgram {
    program:  ShaderProgram,
    view:     ViewHandles,
    /// `(cr, ci)`; Julia only.
    constant: Option<(DoubleHandle, DoubleHandle)>,
}

impl FractalProgram {
    fn load(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        path: &Path,
        with_constant: bool,
    ) -> Result<Self> {
        let program = ShaderProgram::from_file(device, format, path)
            .with_context(|| format!("failed to build shader program {}", path.display()))?;
        let handles = Self::resolve(&program, with_constant)
            .with_context(|| format!("shader {} is missing a required uniform", path.display()))?;

        Ok(Self {
            program,
            view: handles.0,
            constant: handles.1,
        })
    }

    fn resolve(
        program: &ShaderProgram,
        with_constant: bool,
    ) -> Result<(ViewHandles, Option<(DoubleHandle, DoubleHandle)>), ShaderError> {
        let u = program.uniforms();
        let view = ViewHandles {
            centerx: u.double_handle("centerx")?,
            centery: u.double_handle("centery")?,
            whx:     u.double_handle("whx")?,
            why:     u.double_handle("why")?,
        };
        let constant = if with_constant {
            Some((u.double_handle("cr")?, u.double_handle("ci")?))
        } else {
            None
        };
        Ok((view, constant))
    }

    fn write_view(&mut self, m: ViewMetrics) -> Result<(), ShaderError> {
        let h = &self.view;
        let (cx, cy, wx, wy) = (h.centerx, h.centery, h.whx, h.why);
        self.program.write_double(cx, m.center.x)?;
        self.program.write_double(cy, m.center.y)?;
        self.program.write_double(wx, m.half_extent.x)?;
        self.program.write_double(wy, m.half_extent.y)
    }

    fn write_constant(&mut self, c: Vec2) -> Result<(), ShaderError> {
        if let Some((cr, ci)) = self.constant {
            self.program.write_double(cr, c.x)?;
            self.program.write_double(ci, c.y)?;
        }
        Ok(())
    }
}

/// GPU objects created in `on_start`.
struct Scene {
    programs: PerFractal<FractalProgram>,
    quad:     ScreenQuad,
    explorer: Explorer,
}

impl Scene {
    fn write_uniforms(&mut self) -> Result<(), ShaderError> {
        for fractal in [Fractal::Mandelbrot, Fractal::Julia] {
            let metrics = self.explorer.metrics(fractal);
            self.programs[fractal].write_view(metrics)?;
        }
        self.programs.julia.write_constant(self.explorer.julia_c())
    }
}

/// The viewer: Mandelbrot/Julia explorer on a single window.
pub struct FractalApp {
    config: ViewerConfig,
    scene:  Option<Scene>,
}

impl FractalApp {
    pub fn new(config: ViewerConfig) -> Self {
        Self { config, scene: None }
    }
}

impl App for FractalApp {
    fn on_start(&mut self, ctx: &mut StartCtx<'_, '_>) -> Result<()> {
        let device = ctx.gpu.device();
        let format = ctx.gpu.surface_format();

        let programs = PerFractal {
            mandelbrot: FractalProgram::load(device, format, &self.config.mandelbrot_shader(), false)?,
            julia:      FractalProgram::load(device, format, &self.config.julia_shader(), true)?,
        };
        let quad = ScreenQuad::new(device);

        let mut screen = ctx.window.viewport();
        if !screen.is_valid() {
            screen = Viewport::new(self.config.window.width, self.config.window.height);
        }
        let explorer = Explorer::new(self.config.controls.clone(), screen);

        log::info!("viewer ready at {}x{}", screen.width, screen.height);
        self.scene = Some(Scene { programs, quad, explorer });
        Ok(())
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let Some(scene) = self.scene.as_mut() else {
            return AppControl::Exit;
        };

        // ── Input ─────────────────────────────────────────────────────────
        let dtime = ctx.time.elapsed_ms() / self.config.controls.time_normalization_ms;
        let screen = ctx.window.viewport();

        if scene.explorer.update(ctx.input, ctx.input_frame, screen, dtime) == AppControl::Exit {
            return AppControl::Exit;
        }

        // ── Uniforms ──────────────────────────────────────────────────────
        if let Err(e) = scene.write_uniforms() {
            log::error!("failed to update uniforms: {e}");
            return AppControl::Exit;
        }

        let queue = ctx.gpu.queue();
        scene.programs.mandelbrot.program.flush(queue);
        scene.programs.julia.program.flush(queue);

        // ── Render ────────────────────────────────────────────────────────
        let program = &scene.programs[scene.explorer.mode()].program;
        let quad    = &scene.quad;

        ctx.render(CLEAR, |pass| {
            program.activate(pass);
            quad.draw(pass);
        })
    }
}
