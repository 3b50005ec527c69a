//! Interactive Mandelbrot / Julia set viewer.
//!
//! Usage: `fractal-viewer [config.json]`. See `config.rs` for the file format.

mod app;
mod bindings;
mod camera;
mod config;
mod explorer;

use anyhow::Result;
use fractal_engine::device::GpuInit;
use fractal_engine::logging::{init_logging, LoggingConfig};
use fractal_engine::window::{LogicalSize, Runtime, RuntimeConfig, WindowMode};

use crate::app::FractalApp;
use crate::config::ViewerConfig;

fn main() -> Result<()> {
    let config = ViewerConfig::load()?;

    init_logging(LoggingConfig {
        env_filter: config.log_filter.clone(),
        ..LoggingConfig::default()
    });

    let window = &config.window;
    let runtime_config = RuntimeConfig {
        title:        window.title.clone(),
        initial_size: LogicalSize::new(window.width, window.height),
        mode:         if window.fullscreen { WindowMode::Fullscreen } else { WindowMode::Windowed },
    };
    let gpu_init = GpuInit {
        present_mode: if window.vsync {
            wgpu::PresentMode::Fifo
        } else {
            wgpu::PresentMode::AutoNoVsync
        },
        ..GpuInit::default()
    };

    Runtime::run(runtime_config, gpu_init, FractalApp::new(config))
}
