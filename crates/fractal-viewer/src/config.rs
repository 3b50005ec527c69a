//! Viewer configuration, loaded from an optional JSON file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable naming a config file when no CLI argument is given.
pub const CONFIG_ENV: &str = "FRACTAL_VIEWER_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub title: String,
    pub width: f64,
    pub height: f64,
    pub fullscreen: bool,
    pub vsync: bool,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "Fractal Viewer".to_string(),
            width: 1920.0,
            height: 1200.0,
            fullscreen: true,
            vsync: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderPaths {
    pub mandelbrot: PathBuf,
    pub julia: PathBuf,
}

impl Default for ShaderPaths {
    fn default() -> Self {
        Self {
            mandelbrot: PathBuf::from("mandelbrot.glsl"),
            julia: PathBuf::from("julia.glsl"),
        }
    }
}

/// Navigation constants. Rates are per frame; `pan_rate` is additionally
/// scaled by the normalized frame time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlSettings {
    /// Half-width of a freshly reset camera; the height follows the window aspect.
    pub default_half_width: f64,
    pub zoom_step: f64,
    pub pan_rate: f64,
    pub nudge_step: f64,
    /// Milliseconds that count as one unit of `dtime`.
    pub time_normalization_ms: f64,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            default_half_width: 2.0,
            zoom_step: 0.95,
            pan_rate: 0.025,
            nudge_step: 0.001,
            time_normalization_ms: 50.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub window: WindowSettings,
    pub shaders: ShaderPaths,
    pub controls: ControlSettings,
    /// Overrides `RUST_LOG` when set.
    pub log_filter: Option<String>,

    /// Directory relative shader paths resolve against.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

impl ViewerConfig {
    /// Loads the config named by the first CLI argument or [`CONFIG_ENV`],
    /// falling back to defaults when neither is set.
    pub fn load() -> Result<Self> {
        let path = std::env::args_os()
            .nth(1)
            .map(PathBuf::from)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

        match path {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let mut config = Self::from_json(&text)
            .with_context(|| format!("invalid config {}", path.display()))?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn mandelbrot_shader(&self) -> PathBuf {
        self.resolve(&self.shaders.mandelbrot)
    }

    pub fn julia_shader(&self) -> PathBuf {
        self.resolve(&self.shaders.julia)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }
        match &self.base_dir {
            Some(dir) => dir.join(path),
            None => Path::new(env!("CARGO_MANIFEST_DIR")).join("shaders").join(path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let config = ViewerConfig::from_json("{}").unwrap();
        assert_eq!(config, ViewerConfig::default());
        assert_eq!(config.controls.zoom_step, 0.95);
        assert_eq!(config.controls.pan_rate, 0.025);
        assert_eq!(config.controls.nudge_step, 0.001);
        assert_eq!(config.controls.time_normalization_ms, 50.0);
        assert!(config.window.vsync);
        assert!(config.window.fullscreen);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = ViewerConfig::from_json(
            r#"{ "window": { "fullscreen": false }, "controls": { "zoom_step": 0.9 }, "log_filter": "debug" }"#,
        )
        .unwrap();

        assert!(!config.window.fullscreen);
        assert_eq!(config.window.width, 1920.0);
        assert_eq!(config.controls.zoom_step, 0.9);
        assert_eq!(config.controls.default_half_width, 2.0);
        assert_eq!(config.log_filter.as_deref(), Some("debug"));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(ViewerConfig::from_json("{ window: ").is_err());
    }

    #[test]
    fn relative_shaders_resolve_against_config_dir() {
        let config = ViewerConfig {
            base_dir: Some(PathBuf::from("/etc/fractals")),
            ..ViewerConfig::default()
        };
        assert_eq!(config.julia_shader(), PathBuf::from("/etc/fractals/julia.glsl"));
    }

    #[test]
    fn default_shaders_live_in_crate() {
        let config = ViewerConfig::default();
        let path = config.mandelbrot_shader();
        assert!(path.ends_with("shaders/mandelbrot.glsl"));
        assert!(path.exists(), "missing bundled shader {}", path.display());
    }

    #[test]
    fn absolute_paths_are_kept() {
        let mut config = ViewerConfig::default();
        config.base_dir = Some(PathBuf::from("/ignored"));
        config.shaders.julia = PathBuf::from("/abs/j.glsl");
        assert_eq!(config.julia_shader(), PathBuf::from("/abs/j.glsl"));
    }
}
