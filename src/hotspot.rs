//! Hotspot markers anchored to a normalized model.
//!
//! Markers are children of the model group, next to the asset node. Their
//! local position is the authored hotspot position, so the group's manual
//! scale and offset move them rigidly with the model. Markers are
//! [`FixedSize`]: the group's scale moves them but does not grow them, so a
//! 12x building and a 1x vase get markers of the same size.

use std::sync::Arc;

use hecs::{Entity, NoSuchEntity};
use tracing::info;

use crate::catalog::HotspotDescriptor;
use crate::geometry::RawGeometry;
use crate::mesh::Transform;
use crate::picking::Collider;
use crate::scene::{Color, FixedSize, GroupHandle, RenderMesh, SceneGraph};

/// Marker component carrying the hotspot a node was created from.
#[derive(Clone, Debug, PartialEq)]
pub struct HotspotMarker {
    /// Position of the hotspot in the artifact's hotspot list.
    pub index: usize,
    pub title: String,
    pub content: String,
}

/// Look of every marker, independent of the model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarkerStyle {
    pub radius: f32,
    pub color: Color,
    pub segments: u32,
    pub rings: u32,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            radius: 0.1,
            color: Color::RED.with_alpha(0.8),
            segments: 16,
            rings: 16,
        }
    }
}

/// Creates hotspot markers; all markers share one sphere geometry.
pub struct HotspotAnchor {
    style: MarkerStyle,
    geometry: Arc<RawGeometry>,
}

impl HotspotAnchor {
    pub fn new(style: MarkerStyle) -> Self {
        let geometry = Arc::new(RawGeometry::sphere(style.radius, style.segments, style.rings));
        Self { style, geometry }
    }

    /// Shared marker geometry; its strong count tracks live markers.
    pub fn geometry(&self) -> &Arc<RawGeometry> {
        &self.geometry
    }

    /// Spawn one marker per hotspot under `group`, in input order.
    ///
    /// Fails only when `group` is no longer in the scene.
    pub fn anchor(
        &self,
        scene: &mut SceneGraph,
        group: &GroupHandle,
        hotspots: &[HotspotDescriptor],
    ) -> Result<Vec<Entity>, NoSuchEntity> {
        let mut markers = Vec::with_capacity(hotspots.len());
        for (index, hotspot) in hotspots.iter().enumerate() {
            let marker = scene.spawn_child(
                group.entity(),
                Transform::from_position(hotspot.position),
                (
                    HotspotMarker {
                        index,
                        title: hotspot.title.clone(),
                        content: hotspot.content.clone(),
                    },
                    RenderMesh::new(self.geometry.clone(), self.style.color),
                    Collider::sphere(self.style.radius),
                    FixedSize,
                ),
            )?;
            markers.push(marker);
        }

        info!(count = markers.len(), "created hotspots");
        Ok(markers)
    }
}

impl Default for HotspotAnchor {
    fn default() -> Self {
        Self::new(MarkerStyle::default())
    }
}
