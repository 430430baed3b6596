//! # Vitrine
//!
//! **An interactive viewer for 3D museum artifacts with clickable hotspots.**
//!
//! Pick an artifact from a catalog, and Vitrine loads its model in the
//! background, fits it into view, pins its hotspot markers to it, and frames
//! the camera. Clicking a marker opens its description; resetting the view
//! returns the camera to where the artifact was first framed.
//!
//! ## Quick Start
//!
//! ```
//! use vitrine::*;
//!
//! let catalog = Catalog::new(vec![
//!     ArtifactDescriptor::new("vase", "Vase", "vase.stl")
//!         .hotspot(Vec3::new(0.0, 0.8, 0.0), "Rim", "Hand-painted rim"),
//! ])
//! .unwrap();
//! let loader = MemoryLoader::new()
//!     .with("vase.stl", RawGeometry::cuboid(Vec3::new(1.0, 2.0, 1.0), Vec3::ZERO));
//!
//! let mut viewer = Viewer::new(&ViewerConfig::default(), catalog, loader, ConsoleUi::new());
//! viewer.start().unwrap();
//!
//! let mut renderer = DrawList::new();
//! viewer.tick(&mut renderer);
//!
//! let active = viewer.active().unwrap();
//! assert_eq!(active.markers.len(), 1);
//! assert_eq!(viewer.camera().position, Vec3::new(0.0, 1.0, 5.0));
//! ```
//!
//! ## Model placement
//!
//! Each model is centered on its bounding box and scaled so its largest side
//! is 2 units, then the artifact's own scale and offset are applied on a
//! parent group. Hotspots are authored in the 2-unit space and live in that
//! same group, so they stay pinned however the artifact is scaled.

mod camera;
mod catalog;
mod config;
mod controls;
mod geometry;
mod hotspot;
mod loader;
mod mesh;
mod normalize;
mod picking;
pub mod scene;
mod ui;
mod viewer;

pub use camera::Camera;
pub use catalog::{ArtifactCard, ArtifactDescriptor, Catalog, CatalogError, HotspotDescriptor};
pub use config::{
    CameraConfig, ConfigError, ControlsConfig, MarkerConfig, NormalizerConfig, ViewerConfig,
    ViewportConfig, load_config,
};
pub use controls::OrbitControls;
pub use geometry::{Aabb, GeometryError, GeometryFormat, RawGeometry};
pub use hotspot::{HotspotAnchor, HotspotMarker, MarkerStyle};
pub use loader::{
    AssetLoader, FileLoader, LoadError, LoadEvent, LoadEventKind, LoadRequest, LoadSender,
    MemoryLoader,
};
pub use mesh::{Transform, Vertex3d};
pub use normalize::{AppliedTransform, DESIRED_SIZE, ModelGroup, Normalization, Normalizer};
pub use picking::{Collider, PointerEvent, Ray, RayHit, Viewport, hit_test, raycast};
pub use scene::{Color, DrawList, Renderer};
pub use ui::{ConsoleUi, InfoPanel, LoadingStatus, ViewerUi};
pub use viewer::{ActiveArtifact, ArtifactState, CameraResetState, Viewer, ViewerError};

// Re-export glam math types for convenience
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

pub use hecs::Entity;
