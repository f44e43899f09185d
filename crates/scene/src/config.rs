//! YAML scene configuration.
//!
//! Every section is optional; missing sections and fields take their
//! defaults. A loaded config must pass [`SceneConfig::validate`] before use.
//!
//! ```yaml
//! grid:
//!   width: 1024
//!   height: 1024
//!   highlight_count: 50000
//! camera:
//!   min_zoom: 0.05
//!   max_zoom: 64.0
//! frame:
//!   target_fps: 60
//! cull:
//!   margin: 2.0
//! feed:
//!   seed: 42
//! ```

use gridview_common::{GridConfig, GridError};
use gridview_render::{GridLod, Palette};
use gridview_stream::{CullSettings, FrameSettings};
use gridview_viewport::CameraSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Errors from loading or validating a [`SceneConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Startup highlight feed parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedSettings {
    pub seed: u64,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self { seed: 42 }
    }
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub highlights: Option<usize>,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub grid: GridConfig,
    pub camera: CameraSettings,
    pub frame: FrameSettings,
    pub cull: CullSettings,
    pub lod: GridLod,
    pub palette: Palette,
    pub feed: FeedSettings,
}

impl SceneConfig {
    /// Read, parse and validate a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&text)?;
        tracing::info!(path = %path.display(), "loaded scene config");
        Ok(config)
    }

    /// Parse and validate YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: SceneConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given, else defaults, then apply `overrides` and
    /// validate the result.
    pub fn resolve(
        path: Option<&Path>,
        overrides: ConfigOverrides,
    ) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply(overrides)?;
        Ok(config)
    }

    pub fn apply(&mut self, overrides: ConfigOverrides) -> Result<(), ConfigError> {
        self.grid = GridConfig::new(
            overrides.width.unwrap_or(self.grid.width()),
            overrides.height.unwrap_or(self.grid.height()),
            overrides
                .highlights
                .unwrap_or(self.grid.highlight_count()),
        )?;
        if let Some(seed) = overrides.seed {
            self.feed.seed = seed;
        }
        self.validate()
    }

    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.grid.validate()?;

        let camera = &self.camera;
        if camera.min_zoom.is_nan() || camera.min_zoom <= 0.0 {
            return Err(ConfigError::invalid(
                "camera.min_zoom",
                format!("must be positive, got {}", camera.min_zoom),
            ));
        }
        if camera.max_zoom.is_nan() || camera.max_zoom < camera.min_zoom {
            return Err(ConfigError::invalid(
                "camera.max_zoom",
                format!(
                    "must be at least min_zoom {}, got {}",
                    camera.min_zoom, camera.max_zoom
                ),
            ));
        }
        if !camera.zoom_base.is_finite() || camera.zoom_base <= 0.0 {
            return Err(ConfigError::invalid(
                "camera.zoom_base",
                format!("must be positive and finite, got {}", camera.zoom_base),
            ));
        }
        if self.frame.target_fps == 0 {
            return Err(ConfigError::invalid("frame.target_fps", "must be positive"));
        }
        if self.cull.margin.is_nan() || self.cull.margin < 0.0 {
            return Err(ConfigError::invalid(
                "cull.margin",
                format!("must be non-negative, got {}", self.cull.margin),
            ));
        }
        if self.lod.fade_low.is_nan()
            || self.lod.fade_high.is_nan()
            || self.lod.fade_high <= self.lod.fade_low
        {
            return Err(ConfigError::invalid(
                "lod.fade_high",
                format!(
                    "must exceed fade_low {}, got {}",
                    self.lod.fade_low, self.lod.fade_high
                ),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = SceneConfig::default();
        config.validate().unwrap();
        assert_eq!(config.grid.width(), 1024);
        assert_eq!(config.frame.target_fps, 60);
        assert_eq!(config.cull.margin, 2.0);
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let config = SceneConfig::from_yaml_str("grid:\n  width: 64\nframe:\n  target_fps: 30\n")
            .unwrap();
        assert_eq!(config.grid.width(), 64);
        assert_eq!(config.grid.height(), 1024);
        assert_eq!(config.frame.target_fps, 30);
        assert_eq!(config.camera, CameraSettings::default());
    }

    #[test]
    fn empty_document_is_default() {
        let config = SceneConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, SceneConfig::default());
    }

    #[test]
    fn zero_width_rejected() {
        let err = SceneConfig::from_yaml_str("grid:\n  width: 0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Grid(GridError::InvalidDimensions { width: 0, .. })
        ));
    }

    #[test]
    fn zero_fps_rejected() {
        let err = SceneConfig::from_yaml_str("frame:\n  target_fps: 0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "frame.target_fps",
                ..
            }
        ));
    }

    #[test]
    fn inverted_zoom_range_rejected() {
        let err =
            SceneConfig::from_yaml_str("camera:\n  min_zoom: 4.0\n  max_zoom: 2.0\n").unwrap_err();
        assert!(err.to_string().contains("camera.max_zoom"));
    }

    #[test]
    fn negative_margin_rejected() {
        let mut config = SceneConfig::default();
        config.cull.margin = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn inverted_fade_rejected() {
        let mut config = SceneConfig::default();
        config.lod.fade_low = 0.9;
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_yaml_is_yaml_error() {
        let err = SceneConfig::from_yaml_str("grid: [1, 2").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "grid:\n  width: 32\n  height: 16\nfeed:\n  seed: 7").unwrap();
        let config = SceneConfig::load(file.path()).unwrap();
        assert_eq!(config.grid.width(), 32);
        assert_eq!(config.grid.height(), 16);
        assert_eq!(config.feed.seed, 7);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SceneConfig::load(dir.path().join("missing.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn overrides_replace_file_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "grid:\n  width: 32\n  height: 16\n  highlight_count: 3").unwrap();
        let overrides = ConfigOverrides {
            height: Some(64),
            seed: Some(5),
            ..ConfigOverrides::default()
        };
        let config = SceneConfig::resolve(Some(file.path()), overrides).unwrap();
        assert_eq!(config.grid.width(), 32);
        assert_eq!(config.grid.height(), 64);
        assert_eq!(config.grid.highlight_count(), 3);
        assert_eq!(config.feed.seed, 5);
    }

    #[test]
    fn zero_override_rejected() {
        let overrides = ConfigOverrides {
            width: Some(0),
            ..ConfigOverrides::default()
        };
        assert!(matches!(
            SceneConfig::resolve(None, overrides),
            Err(ConfigError::Grid(_))
        ));
    }

    #[test]
    fn yaml_roundtrip_preserves_config() {
        let mut config = SceneConfig::default();
        config.grid = GridConfig::new(10, 20, 5).unwrap();
        config.feed.seed = 99;
        let text = config.to_yaml_string().unwrap();
        assert_eq!(SceneConfig::from_yaml_str(&text).unwrap(), config);
    }
}
