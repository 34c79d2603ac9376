//! # Shell Settings
//!
//! User-level configuration read from a JSON file. Every field has a
//! default, so an empty object (or no file at all) is a valid configuration.
//!
//! The file is located by, in order:
//!
//! 1. an explicit path (`--config` on the command line)
//! 2. the `LISPCANVAS_CONFIG` environment variable
//!
//! and otherwise the built-in defaults are used.
//!
//! ```json
//! {
//!   "default_module": "bridge",
//!   "retention": "retain_across_switch",
//!   "canvas": { "width": 800, "height": 600, "margin": 20 },
//!   "report": { "engineer": "A. Engineer", "organisation": "PWD", "job_id": "24-017" },
//!   "dxf": { "text_height_scale": 1.0 }
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{CanvasError, CanvasResult};
use crate::registry::ModuleKind;

/// Environment variable naming the settings file
pub const CONFIG_ENV_VAR: &str = "LISPCANVAS_CONFIG";

/// What happens to a module's parameters when the user navigates away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetentionPolicy {
    /// Keep every visited module's session alive for the life of the shell
    #[default]
    RetainAcrossSwitch,
    /// Unmount the previous module on navigation; returning starts empty
    DiscardOnSwitch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellSettings {
    /// Module selected when the shell starts
    pub default_module: ModuleKind,
    pub retention: RetentionPolicy,
    pub canvas: CanvasSettings,
    pub report: ReportSettings,
    pub dxf: DxfSettings,
}

impl Default for ShellSettings {
    fn default() -> Self {
        ShellSettings {
            default_module: ModuleKind::Bridge,
            retention: RetentionPolicy::default(),
            canvas: CanvasSettings::default(),
            report: ReportSettings::default(),
            dxf: DxfSettings::default(),
        }
    }
}

/// Drawing surface size in logical pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasSettings {
    pub width: f32,
    pub height: f32,
    /// Blank border kept around the fitted drawing
    pub margin: f32,
}

impl Default for CanvasSettings {
    fn default() -> Self {
        CanvasSettings {
            width: 800.0,
            height: 600.0,
            margin: 20.0,
        }
    }
}

/// Title-block fields printed on PDF reports
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    pub engineer: String,
    pub organisation: String,
    pub job_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DxfSettings {
    /// Multiplier applied to every text height written to DXF
    pub text_height_scale: f64,
}

impl Default for DxfSettings {
    fn default() -> Self {
        DxfSettings { text_height_scale: 1.0 }
    }
}

impl ShellSettings {
    /// Read and validate a settings file.
    pub fn load(path: &Path) -> CanvasResult<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| CanvasError::file_error("read settings", path.display().to_string(), e.to_string()))?;
        let settings: ShellSettings = serde_json::from_str(&contents).map_err(|e| CanvasError::SerializationError {
            reason: format!("Invalid settings in {}: {}", path.display(), e),
        })?;
        settings.validate()?;
        debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Load from `path`, falling back to `LISPCANVAS_CONFIG` and then to
    /// the defaults. A named file that does not exist is an error; an
    /// unset variable is not.
    pub fn load_or_default(path: Option<&Path>) -> CanvasResult<Self> {
        let from_env = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);
        match path.map(Path::to_path_buf).or(from_env) {
            Some(p) => Self::load(&p),
            None => {
                debug!("no settings file, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn validate(&self) -> CanvasResult<()> {
        let canvas = &self.canvas;
        if !(canvas.width > 0.0 && canvas.height > 0.0) {
            return Err(CanvasError::SerializationError {
                reason: format!("canvas size must be positive, got {}x{}", canvas.width, canvas.height),
            });
        }
        if canvas.margin < 0.0 || 2.0 * canvas.margin >= canvas.width.min(canvas.height) {
            return Err(CanvasError::SerializationError {
                reason: format!("canvas margin {} does not fit the canvas", canvas.margin),
            });
        }
        if !(self.dxf.text_height_scale > 0.0) {
            return Err(CanvasError::SerializationError {
                reason: "dxf.text_height_scale must be positive".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = ShellSettings::default();
        assert_eq!(settings.default_module, ModuleKind::Bridge);
        assert_eq!(settings.retention, RetentionPolicy::RetainAcrossSwitch);
        assert_eq!(settings.canvas.width, 800.0);
        assert_eq!(settings.canvas.height, 600.0);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let settings: ShellSettings =
            serde_json::from_str(r#"{ "retention": "discard_on_switch", "canvas": { "margin": 10 } }"#).unwrap();
        assert_eq!(settings.retention, RetentionPolicy::DiscardOnSwitch);
        assert_eq!(settings.canvas.margin, 10.0);
        assert_eq!(settings.canvas.width, 800.0);
        assert_eq!(settings.default_module, ModuleKind::Bridge);
    }

    #[test]
    fn test_unknown_default_module_rejected() {
        let result: Result<ShellSettings, _> = serde_json::from_str(r#"{ "default_module": "skyscraper" }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "default_module": "staircase", "report": {{ "engineer": "R. Rao" }} }}"#).unwrap();

        let settings = ShellSettings::load_or_default(Some(file.path())).unwrap();
        assert_eq!(settings.default_module, ModuleKind::Staircase);
        assert_eq!(settings.report.engineer, "R. Rao");
    }

    #[test]
    fn test_missing_named_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ShellSettings::load_or_default(Some(&dir.path().join("absent.json"))).unwrap_err();
        assert_eq!(err.error_code(), "FILE_ERROR");
    }

    #[test]
    fn test_margin_must_fit() {
        let mut settings = ShellSettings::default();
        settings.canvas.margin = 400.0;
        assert!(settings.validate().is_err());
    }
}
