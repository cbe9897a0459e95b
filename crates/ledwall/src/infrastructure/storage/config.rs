//! TOML configuration file for the LED wall.
//!
//! The file describes the hardware (`[matrix]`) and, optionally, how the
//! runtime behaves (`[runtime]`) and which helper process to supervise
//! (`[helper]`):
//!
//! ```toml
//! [matrix]
//! mapping = """
//! ., ., 1, .
//! 2, 3, 4, .
//! 5, 6, 7, 8
//! """
//! led-rows = 64
//! led-cols = 64
//! parallel = 2
//!
//! [runtime]
//! fps = 15
//! scene = "screen-test"
//! ```
//!
//! # Serde default values
//!
//! Fields annotated with `#[serde(default = "some_fn")]` use the return value
//! of `some_fn()` when the field is absent from the TOML file, so a file with
//! only a `[matrix]` section is complete.
//!
//! # Validation order
//!
//! [`load_config`] reports the first problem it finds: I/O, then TOML syntax,
//! then out-of-range runtime values, then the panel layout itself.  Every one
//! of them is fatal at startup.

use std::path::{Path, PathBuf};

use ledwall_core::{parse_panel_layout, LayoutError, PanelLayout, PixelOrder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::scenes::SceneKind;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("I/O error reading config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The `[matrix]` section does not describe a valid panel layout.
    #[error("invalid panel mapping: {0}")]
    Layout(#[from] LayoutError),

    /// A value is syntactically fine but out of range.
    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WallConfig {
    pub matrix: MatrixConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
    /// Helper process; when present the wait screen runs until it is ready.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub helper: Option<HelperConfig>,
}

/// Panel arrangement and panel geometry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct MatrixConfig {
    /// Rows of comma-separated cells, `.` for an empty cell.
    pub mapping: String,
    /// LEDs per panel column; must equal `led_cols`.
    pub led_rows: u32,
    /// LEDs per panel row.
    pub led_cols: u32,
    /// Number of parallel chains.
    #[serde(default = "default_parallel")]
    pub parallel: u32,
}

/// Frame loop and environment settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct RuntimeConfig {
    /// Target frame rate; a soft cap.
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Host names allowed to drive the physical panels.
    #[serde(default = "default_allowed_hosts")]
    pub allowed_hosts: Vec<String>,
    /// `tracing` filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub scene: SceneKind,
    /// Byte order the panel driver expects on the raw frame stream.
    #[serde(default)]
    pub pixel_order: PixelOrder,
}

/// External helper process whose stdout announces readiness.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct HelperConfig {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Literal text that marks the helper as ready when seen in a line.
    #[serde(default = "default_ready_marker")]
    pub ready_marker: String,
    /// Recent output lines kept for diagnostics.
    #[serde(default = "default_ring_capacity")]
    pub ring_capacity: usize,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_parallel() -> u32 {
    1
}
fn default_fps() -> u32 {
    15
}
fn default_allowed_hosts() -> Vec<String> {
    vec!["rpi-murapix".to_string(), "raspberrypi".to_string()]
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_ready_marker() -> String {
    "info: Listening on 5000".to_string()
}
fn default_ring_capacity() -> usize {
    30
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            allowed_hosts: default_allowed_hosts(),
            log_level: default_log_level(),
            scene: SceneKind::default(),
            pixel_order: PixelOrder::default(),
        }
    }
}

impl WallConfig {
    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// See [`load_config`].
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: WallConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks runtime values and the panel layout.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for out-of-range values and
    /// [`ConfigError::Layout`] for an invalid mapping.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.runtime.fps == 0 {
            return Err(ConfigError::Invalid {
                field: "runtime.fps",
                reason: "must be greater than zero".to_string(),
            });
        }
        if let Some(helper) = &self.helper {
            if helper.command.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    field: "helper.command",
                    reason: "must not be empty".to_string(),
                });
            }
            if helper.ring_capacity == 0 {
                return Err(ConfigError::Invalid {
                    field: "helper.ring-capacity",
                    reason: "must be greater than zero".to_string(),
                });
            }
        }
        self.layout().map(drop)
    }

    /// Builds the validated panel layout from the `[matrix]` section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Layout`] naming the violated rule.
    pub fn layout(&self) -> Result<PanelLayout, ConfigError> {
        let matrix = &self.matrix;
        Ok(parse_panel_layout(
            &matrix.mapping,
            matrix.led_rows,
            matrix.led_cols,
            matrix.parallel,
        )?)
    }
}

/// Loads and validates the configuration file at `path`.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read,
/// [`ConfigError::Parse`] if the TOML is malformed, and
/// [`ConfigError::Invalid`] or [`ConfigError::Layout`] if it is well-formed
/// but describes an unusable wall.
pub fn load_config(path: &Path) -> Result<WallConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    WallConfig::from_toml_str(&content)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
