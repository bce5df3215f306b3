//! Configuration module for SpikeViz-RS
//!
//! This module handles application configuration including:
//! - Tunables for rendering, camera, generation and log playback (`config.toml`)
//! - Persisted UI preferences (`app_state.json`)
//! - Runtime view state during execution
//!
//! # Locations
//!
//! - **Config**: `<config dir>/dev.spikeviz.spikeviz-rs/config.toml`
//! - **App state**: `<data dir>/dev.spikeviz.spikeviz-rs/app_state.json`
//!
//! where the config and data dirs are the platform directories reported by
//! `dirs-next` (`~/.config` and `~/.local/share` on Linux).
//!
//! # Example
//!
//! ```ignore
//! use spikeviz_rs::config::{AppConfig, AppState};
//!
//! let config = AppConfig::load_or_default();
//! let mut state = AppState::load_or_default();
//! state.orthographic = config.camera.start_orthographic;
//! state.save()?;
//! ```

pub mod settings;

pub use settings::*;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ResultExt, SpikeVizError};

/// Application identifier for config and data directories
pub const APP_ID: &str = "dev.spikeviz.spikeviz-rs";

/// Config filename
pub const CONFIG_FILE: &str = "config.toml";

/// App state filename
pub const APP_STATE_FILE: &str = "app_state.json";

/// Default minimum interval between two rendered frames
pub const DEFAULT_MIN_REPAINT_MS: u64 = 5;

/// Default detail quality, the exponent in the level-of-detail rule
pub const DEFAULT_DETAIL_QUALITY: u32 = 5;

// ==================== Directories ====================

/// Get the application data directory path
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

/// Get the application config directory path
pub fn app_config_dir() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID))
}

fn ensure_dir(dir: Option<PathBuf>, what: &str) -> Result<PathBuf> {
    let dir = dir.ok_or_else(|| SpikeVizError::Config(format!("Could not determine {} directory", what)))?;
    if !dir.exists() {
        std::fs::create_dir_all(&dir)
            .map_err(|e| SpikeVizError::Config(format!("Failed to create {} directory: {}", what, e)))?;
    }
    Ok(dir)
}

/// Ensure the app data directory exists
pub fn ensure_app_data_dir() -> Result<PathBuf> {
    ensure_dir(app_data_dir(), "app data")
}

/// Get the path to the app state file
pub fn app_state_path() -> Option<PathBuf> {
    app_data_dir().map(|p| p.join(APP_STATE_FILE))
}

// ==================== App Config ====================

/// Application tunables, stored as TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub camera: CameraConfig,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub logs: LogConfig,
}

impl AppConfig {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        app_config_dir().map(|p| p.join(CONFIG_FILE))
    }

    /// Load a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(SpikeVizError::from)
            .with_context(|| format!("Failed to read config {:?}", path))?;
        toml::from_str(&content)
            .map_err(|e| SpikeVizError::Config(format!("Failed to parse config {:?}: {}", path, e)))
    }

    /// Load from the default location, returning defaults on any error
    pub fn load_or_default() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        Self::load(&path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save as TOML, creating the parent directory
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| SpikeVizError::Config(format!("Failed to create config directory: {}", e)))?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| SpikeVizError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)
            .map_err(|e| SpikeVizError::Config(format!("Failed to write config {:?}: {}", path, e)))
    }

    /// Save to the default location
    pub fn save_default(&self) -> Result<PathBuf> {
        let dir = ensure_dir(app_config_dir(), "config")?;
        let path = dir.join(CONFIG_FILE);
        self.save(&path)?;
        Ok(path)
    }
}

/// Scene renderer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Redraw requests closer together than this are coalesced
    #[serde(default = "default_min_repaint_ms")]
    pub min_repaint_interval_ms: u64,

    /// Level-of-detail quality exponent
    #[serde(default = "default_detail_quality")]
    pub detail_quality: u32,

    #[serde(default = "default_export_width")]
    pub export_width: u32,

    #[serde(default = "default_export_height")]
    pub export_height: u32,
}

fn default_min_repaint_ms() -> u64 {
    DEFAULT_MIN_REPAINT_MS
}

fn default_detail_quality() -> u32 {
    DEFAULT_DETAIL_QUALITY
}

fn default_export_width() -> u32 {
    1920
}

fn default_export_height() -> u32 {
    1080
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            min_repaint_interval_ms: DEFAULT_MIN_REPAINT_MS,
            detail_quality: DEFAULT_DETAIL_QUALITY,
            export_width: default_export_width(),
            export_height: default_export_height(),
        }
    }
}

impl RenderConfig {
    pub fn min_repaint_interval(&self) -> Duration {
        Duration::from_millis(self.min_repaint_interval_ms)
    }
}

/// 3D camera settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    #[serde(default = "default_fov")]
    pub fov_degrees: f32,

    #[serde(default = "default_near")]
    pub near: f32,

    #[serde(default = "default_far")]
    pub far: f32,

    /// Wheel delta that doubles the zoom factor
    #[serde(default = "default_wheel_divisor")]
    pub wheel_divisor: f32,

    /// Pan distance per pixel at zoom 1
    #[serde(default = "default_pan_speed")]
    pub pan_speed: f32,

    /// Orbit degrees per pixel
    #[serde(default = "default_orbit_speed")]
    pub orbit_speed: f32,

    #[serde(default)]
    pub start_orthographic: bool,
}

fn default_fov() -> f32 {
    60.0
}

fn default_near() -> f32 {
    1.0
}

fn default_far() -> f32 {
    100_000.0
}

fn default_wheel_divisor() -> f32 {
    320.0
}

fn default_pan_speed() -> f32 {
    0.01
}

fn default_orbit_speed() -> f32 {
    0.5
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: default_fov(),
            near: default_near(),
            far: default_far(),
            wheel_divisor: default_wheel_divisor(),
            pan_speed: default_pan_speed(),
            orbit_speed: default_orbit_speed(),
            start_orthographic: false,
        }
    }
}

/// Background connection generation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Capacity of the job queue feeding the generation worker
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Ask before regenerating a stale connection list on the UI thread
    #[serde(default = "default_true")]
    pub confirm_regeneration: bool,
}

fn default_channel_capacity() -> usize {
    64
}

fn default_true() -> bool {
    true
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
            confirm_regeneration: true,
        }
    }
}

/// Log overlay playback settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// How often the log time cursor is advanced during playback
    #[serde(default = "default_log_poll_ms")]
    pub poll_interval_ms: u64,
}

fn default_log_poll_ms() -> u64 {
    50
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_log_poll_ms(),
        }
    }
}

impl LogConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// ==================== App State ====================

/// UI preferences persisted across sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    /// Version for future migration support
    #[serde(default = "default_app_state_version")]
    pub version: u32,

    #[serde(default = "default_true")]
    pub dark_mode: bool,

    #[serde(default)]
    pub show_population_indices: bool,

    /// Last projection mode of the 3D viewport
    #[serde(default)]
    pub orthographic: bool,
}

fn default_app_state_version() -> u32 {
    1
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            version: 1,
            dark_mode: true,
            show_population_indices: false,
            orthographic: false,
        }
    }
}

impl AppState {
    /// Load app state from `path`, defaults when the file does not exist
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| SpikeVizError::Config(format!("Failed to read app state: {}", e)))?;
        serde_json::from_str(&content)
            .map_err(|e| SpikeVizError::Config(format!("Failed to parse app state: {}", e)))
    }

    /// Load app state from the default location
    pub fn load() -> Result<Self> {
        let path = app_state_path()
            .ok_or_else(|| SpikeVizError::Config("Could not determine app state path".to_string()))?;
        Self::load_from(path)
    }

    /// Load app state, returning defaults on any error
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!("Failed to load app state, using defaults: {}", e);
            Self::default()
        })
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| SpikeVizError::Config(format!("Failed to serialize app state: {}", e)))?;
        std::fs::write(path, content)
            .map_err(|e| SpikeVizError::Config(format!("Failed to write app state: {}", e)))
    }

    /// Save app state to the default location
    pub fn save(&self) -> Result<()> {
        let dir = ensure_app_data_dir()?;
        self.save_to(dir.join(APP_STATE_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = AppConfig::default();
        assert_eq!(config.render.min_repaint_interval(), Duration::from_millis(5));
        assert_eq!(config.render.detail_quality, 5);
        assert_eq!(config.camera.fov_degrees, 60.0);
        assert_eq!(config.camera.wheel_divisor, 320.0);
        assert_eq!(config.logs.poll_interval(), Duration::from_millis(50));
        assert!(config.generation.confirm_regeneration);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [render]
            detail_quality = 3

            [camera]
            start_orthographic = true
            "#,
        )
        .unwrap();
        assert_eq!(config.render.detail_quality, 3);
        assert_eq!(config.render.min_repaint_interval_ms, 5);
        assert!(config.camera.start_orthographic);
        assert_eq!(config.camera.far, 100_000.0);
        assert_eq!(config.generation, GenerationConfig::default());
    }

    #[test]
    fn test_config_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);
        let mut config = AppConfig::default();
        config.render.export_width = 4000;
        config.logs.poll_interval_ms = 20;
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(AppConfig::load(&missing).is_err());

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "render = 5").unwrap();
        assert!(matches!(AppConfig::load(&bad), Err(SpikeVizError::Config(_))));
    }

    #[test]
    fn test_app_state_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(APP_STATE_FILE);
        assert_eq!(AppState::load_from(&path).unwrap(), AppState::default());

        let state = AppState {
            dark_mode: false,
            orthographic: true,
            show_population_indices: true,
            ..AppState::default()
        };
        state.save_to(&path).unwrap();
        assert_eq!(AppState::load_from(&path).unwrap(), state);
    }
}
