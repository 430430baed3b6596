//! Viewer configuration loading.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::camera::Camera;
use crate::catalog::{ArtifactDescriptor, Catalog, CatalogError};
use crate::controls::OrbitControls;
use crate::hotspot::MarkerStyle;
use crate::normalize::{DESIRED_SIZE, Normalizer};
use crate::picking::Viewport;
use crate::scene::Color;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid catalog: {0}")]
    Catalog(#[from] CatalogError),
    #[error("invalid value {value} for '{field}'")]
    Invalid { field: &'static str, value: f32 },
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewerConfig {
    #[serde(default)]
    pub viewport: ViewportConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub controls: ControlsConfig,
    #[serde(default)]
    pub markers: MarkerConfig,
    #[serde(default)]
    pub normalizer: NormalizerConfig,
    /// Directory asset paths are resolved against.
    #[serde(default)]
    pub asset_root: PathBuf,
    /// Catalog entries. Absent means the built-in catalog.
    #[serde(default, rename = "artifact", skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<Vec<ArtifactDescriptor>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewportConfig {
    #[serde(default = "default_width")]
    pub width: f32,
    #[serde(default = "default_height")]
    pub height: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
        }
    }
}

fn default_width() -> f32 {
    1280.0
}

fn default_height() -> f32 {
    720.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    #[serde(default = "default_fov")]
    pub fov: f32,
    #[serde(default = "default_near")]
    pub near: f32,
    #[serde(default = "default_far")]
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: default_fov(),
            near: default_near(),
            far: default_far(),
        }
    }
}

fn default_fov() -> f32 {
    75.0
}

fn default_near() -> f32 {
    0.1
}

fn default_far() -> f32 {
    1000.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlsConfig {
    /// Share of pending motion applied per frame; 0 disables damping
    #[serde(default = "default_damping")]
    pub damping: f32,
    #[serde(default = "default_min_distance")]
    pub min_distance: f32,
    #[serde(default = "default_max_distance")]
    pub max_distance: f32,
    #[serde(default = "default_rotate_sensitivity")]
    pub rotate_sensitivity: f32,
    #[serde(default = "default_zoom_sensitivity")]
    pub zoom_sensitivity: f32,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            damping: default_damping(),
            min_distance: default_min_distance(),
            max_distance: default_max_distance(),
            rotate_sensitivity: default_rotate_sensitivity(),
            zoom_sensitivity: default_zoom_sensitivity(),
        }
    }
}

fn default_damping() -> f32 {
    0.05
}

fn default_min_distance() -> f32 {
    1.0
}

fn default_max_distance() -> f32 {
    20.0
}

fn default_rotate_sensitivity() -> f32 {
    0.005
}

fn default_zoom_sensitivity() -> f32 {
    0.05
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerConfig {
    #[serde(default = "default_marker_radius")]
    pub radius: f32,
    /// RGB in [0, 1]
    #[serde(default = "default_marker_color")]
    pub color: [f32; 3],
    #[serde(default = "default_marker_opacity")]
    pub opacity: f32,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            radius: default_marker_radius(),
            color: default_marker_color(),
            opacity: default_marker_opacity(),
        }
    }
}

fn default_marker_radius() -> f32 {
    0.1
}

fn default_marker_color() -> [f32; 3] {
    [1.0, 0.0, 0.0]
}

fn default_marker_opacity() -> f32 {
    0.8
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizerConfig {
    /// Largest dimension of an auto-scaled model
    #[serde(default = "default_desired_size")]
    pub desired_size: f32,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            desired_size: default_desired_size(),
        }
    }
}

fn default_desired_size() -> f32 {
    DESIRED_SIZE
}

impl ViewerConfig {
    /// Parse a config from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every numeric setting is usable. Reports the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |v: f32| v.is_finite() && v > 0.0;
        let unit = |v: f32| v.is_finite() && (0.0..=1.0).contains(&v);

        let [r, g, b] = self.markers.color;
        let checks = [
            ("viewport.width", self.viewport.width, positive(self.viewport.width)),
            ("viewport.height", self.viewport.height, positive(self.viewport.height)),
            (
                "camera.fov",
                self.camera.fov,
                positive(self.camera.fov) && self.camera.fov < 180.0,
            ),
            ("camera.near", self.camera.near, positive(self.camera.near)),
            (
                "camera.far",
                self.camera.far,
                self.camera.far.is_finite() && self.camera.far > self.camera.near,
            ),
            ("controls.damping", self.controls.damping, unit(self.controls.damping)),
            (
                "controls.min_distance",
                self.controls.min_distance,
                positive(self.controls.min_distance),
            ),
            (
                "controls.max_distance",
                self.controls.max_distance,
                self.controls.max_distance.is_finite()
                    && self.controls.max_distance >= self.controls.min_distance,
            ),
            (
                "controls.rotate_sensitivity",
                self.controls.rotate_sensitivity,
                self.controls.rotate_sensitivity.is_finite(),
            ),
            (
                "controls.zoom_sensitivity",
                self.controls.zoom_sensitivity,
                self.controls.zoom_sensitivity.is_finite(),
            ),
            ("markers.radius", self.markers.radius, positive(self.markers.radius)),
            ("markers.color", r, unit(r)),
            ("markers.color", g, unit(g)),
            ("markers.color", b, unit(b)),
            ("markers.opacity", self.markers.opacity, unit(self.markers.opacity)),
            (
                "normalizer.desired_size",
                self.normalizer.desired_size,
                positive(self.normalizer.desired_size),
            ),
        ];

        match checks.into_iter().find(|&(_, _, ok)| !ok) {
            Some((field, value, _)) => Err(ConfigError::Invalid { field, value }),
            None => Ok(()),
        }
    }

    /// Validated catalog: the configured artifacts, or the built-in set.
    pub fn catalog(&self) -> Result<Catalog, CatalogError> {
        match &self.artifacts {
            Some(artifacts) => Catalog::new(artifacts.clone()),
            None => Ok(Catalog::builtin()),
        }
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.viewport.width, self.viewport.height)
    }

    pub fn build_camera(&self) -> Camera {
        Camera::new()
            .with_fov(self.camera.fov)
            .with_clip(self.camera.near, self.camera.far)
            .with_aspect(self.viewport().aspect())
    }

    pub fn build_controls(&self) -> OrbitControls {
        OrbitControls::new()
            .damping(self.controls.damping)
            .distance_limits(self.controls.min_distance, self.controls.max_distance)
            .sensitivity(self.controls.rotate_sensitivity, self.controls.zoom_sensitivity)
    }

    pub fn marker_style(&self) -> MarkerStyle {
        let [r, g, b] = self.markers.color;
        MarkerStyle {
            radius: self.markers.radius,
            color: Color::rgba(r, g, b, self.markers.opacity),
            ..MarkerStyle::default()
        }
    }

    pub fn normalizer(&self) -> Normalizer {
        Normalizer::new(self.normalizer.desired_size)
    }
}

/// Load configuration from file, falling back to defaults when it is missing.
pub fn load_config(path: &Path) -> Result<ViewerConfig, ConfigError> {
    if path.exists() {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = ViewerConfig::from_toml(&content)?;
        config.validate()?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(ViewerConfig::default())
    }
}
