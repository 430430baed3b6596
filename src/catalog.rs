//! The artifact catalog: every object the viewer can show.
//!
//! Descriptors are deserialized (or built in code), then validated exactly
//! once by [`Catalog::new`]. After that they are shared immutably through
//! `Arc`, so a loaded artifact and its markers can refer back to the same
//! descriptor the card list was built from.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

/// Validation failures detected while building a [`Catalog`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CatalogError {
    #[error("artifact at position {0} has an empty id")]
    EmptyId(usize),
    #[error("duplicate artifact id '{0}'")]
    DuplicateId(String),
    #[error("artifact '{0}' has an empty asset path")]
    EmptyAssetPath(String),
    #[error("artifact '{id}' has invalid manual scale {scale} (must be finite and positive)")]
    InvalidScale { id: String, scale: f32 },
    #[error("artifact '{id}' has a non-finite {field}")]
    NonFinite { id: String, field: String },
}

/// A clickable point of interest on an artifact.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HotspotDescriptor {
    /// Position in the auto-centered, auto-scaled model space, before the
    /// artifact's manual scale and offset.
    pub position: Vec3,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

impl HotspotDescriptor {
    pub fn new(position: Vec3, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            position,
            title: title.into(),
            content: content.into(),
        }
    }
}

/// One entry of the gallery.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArtifactDescriptor {
    pub id: String,
    pub name: String,
    #[serde(alias = "path")]
    pub asset_path: String,
    /// Multiplies the auto-scale. Defaults to 1.0.
    #[serde(default = "default_manual_scale")]
    pub manual_scale: f32,
    /// Added to the model position after all scaling, in scaled units.
    #[serde(default)]
    pub center_offset: Vec3,
    #[serde(default, rename = "hotspot")]
    pub hotspots: Vec<HotspotDescriptor>,
}

fn default_manual_scale() -> f32 {
    1.0
}

impl ArtifactDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>, asset_path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            asset_path: asset_path.into(),
            manual_scale: default_manual_scale(),
            center_offset: Vec3::ZERO,
            hotspots: Vec::new(),
        }
    }

    pub fn manual_scale(mut self, scale: f32) -> Self {
        self.manual_scale = scale;
        self
    }

    pub fn center_offset(mut self, offset: Vec3) -> Self {
        self.center_offset = offset;
        self
    }

    pub fn hotspot(mut self, position: Vec3, title: &str, content: &str) -> Self {
        self.hotspots.push(HotspotDescriptor::new(position, title, content));
        self
    }

    fn validate(&self, index: usize) -> Result<(), CatalogError> {
        if self.id.trim().is_empty() {
            return Err(CatalogError::EmptyId(index));
        }
        if self.asset_path.trim().is_empty() {
            return Err(CatalogError::EmptyAssetPath(self.id.clone()));
        }
        if !self.manual_scale.is_finite() || self.manual_scale <= 0.0 {
            return Err(CatalogError::InvalidScale {
                id: self.id.clone(),
                scale: self.manual_scale,
            });
        }
        if !self.center_offset.is_finite() {
            return Err(CatalogError::NonFinite {
                id: self.id.clone(),
                field: "center_offset".to_string(),
            });
        }
        if let Some(i) = self.hotspots.iter().position(|h| !h.position.is_finite()) {
            return Err(CatalogError::NonFinite {
                id: self.id.clone(),
                field: format!("hotspot[{}].position", i),
            });
        }
        Ok(())
    }
}

/// What the card list needs to show for one artifact.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactCard {
    pub id: String,
    pub name: String,
}

/// Validated, ordered registry of artifacts.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    artifacts: Vec<Arc<ArtifactDescriptor>>,
}

impl Catalog {
    /// Validates the descriptors and freezes them.
    pub fn new(artifacts: Vec<ArtifactDescriptor>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for (index, artifact) in artifacts.iter().enumerate() {
            artifact.validate(index)?;
            if !seen.insert(artifact.id.as_str()) {
                return Err(CatalogError::DuplicateId(artifact.id.clone()));
            }
        }

        Ok(Self {
            artifacts: artifacts.into_iter().map(Arc::new).collect(),
        })
    }

    /// The gallery the viewer ships with.
    ///
    /// Several entries share hotspot coordinates even though the models
    /// differ greatly in size; they are kept as authored.
    pub fn builtin() -> Self {
        let artifacts = vec![
            ArtifactDescriptor::new("artifact1", "Vase", "3d/object1/scene.stl")
                .hotspot(Vec3::new(0.0, 1.2, 0.0), "Feature 1", "Description for feature 1 of object 1.")
                .hotspot(Vec3::new(0.8, 0.0, 0.8), "Feature 2", "Description for feature 2 of object 1.")
                .hotspot(Vec3::new(0.0, -1.0, 0.0), "Feature 3", "Description for feature 3 of object 1."),
            ArtifactDescriptor::new("artifact2", "Globus", "3d/object2/scene.stl")
                .center_offset(Vec3::new(0.0, -1.0, 0.0))
                .manual_scale(1.2)
                .hotspot(Vec3::new(0.0, 1.5, 0.1), "Detail A", "Description for detail A of object 2.")
                .hotspot(Vec3::new(0.8, 0.8, 0.3), "Detail B", "Description for detail B of object 2.")
                .hotspot(Vec3::new(0.0, -1.2, 0.0), "Detail C", "Description for detail C of object 2."),
            ArtifactDescriptor::new("artifact3", "Bygning", "3d/object3/scene.stl")
                .center_offset(Vec3::new(0.0, -7.0, 3.0))
                .manual_scale(8.0)
                .hotspot(Vec3::new(0.0, 1.5, 0.1), "Detail A", "Description for detail A of object 2.")
                .hotspot(Vec3::new(0.5, 0.2, 0.3), "Detail B", "Description for detail B of object 2.")
                .hotspot(Vec3::new(0.0, -1.2, 0.0), "Detail C", "Description for detail C of object 2."),
            ArtifactDescriptor::new("artifact4", "Væg", "3d/object4/scene.stl")
                .center_offset(Vec3::new(0.0, 3.0, 6.0))
                .manual_scale(12.0)
                .hotspot(Vec3::new(-0.4, 2.5, 3.0), "Elefanthoved", "Description for detail A of object 2.")
                .hotspot(Vec3::new(8.0, 3.0, 2.0), "Detail B", "Description for detail B of object 2.")
                .hotspot(Vec3::new(-8.0, 2.5, 2.0), "Detail C", "Description for detail C of object 2."),
        ];

        // The built-in entries are known to be valid.
        Self {
            artifacts: artifacts.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Arc<ArtifactDescriptor>> {
        self.artifacts.iter().find(|a| a.id == id)
    }

    pub fn first(&self) -> Option<&Arc<ArtifactDescriptor>> {
        self.artifacts.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ArtifactDescriptor>> {
        self.artifacts.iter()
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    pub fn cards(&self) -> Vec<ArtifactCard> {
        self.artifacts
            .iter()
            .map(|a| ArtifactCard {
                id: a.id.clone(),
                name: a.name.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_passes_validation() {
        let builtin = Catalog::builtin();
        let descriptors = builtin.iter().map(|a| (**a).clone()).collect();

        let validated = Catalog::new(descriptors).unwrap();
        assert_eq!(validated.len(), 4);
        assert_eq!(validated.get("artifact3").unwrap().manual_scale, 8.0);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = Catalog::new(vec![
            ArtifactDescriptor::new("a", "A", "a.stl"),
            ArtifactDescriptor::new("a", "Again", "b.stl"),
        ])
        .unwrap_err();

        assert_eq!(err, CatalogError::DuplicateId("a".to_string()));
    }

    #[test]
    fn non_positive_scale_is_rejected() {
        for scale in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let err = Catalog::new(vec![ArtifactDescriptor::new("a", "A", "a.stl").manual_scale(scale)])
                .unwrap_err();
            assert!(matches!(err, CatalogError::InvalidScale { .. }));
        }
    }

    #[test]
    fn non_finite_hotspot_is_rejected() {
        let err = Catalog::new(vec![
            ArtifactDescriptor::new("a", "A", "a.stl").hotspot(Vec3::new(f32::NAN, 0.0, 0.0), "x", "y"),
        ])
        .unwrap_err();

        assert_eq!(
            err,
            CatalogError::NonFinite {
                id: "a".to_string(),
                field: "hotspot[0].position".to_string()
            }
        );
    }

    #[test]
    fn empty_fields_are_rejected() {
        assert_eq!(
            Catalog::new(vec![ArtifactDescriptor::new(" ", "A", "a.stl")]).unwrap_err(),
            CatalogError::EmptyId(0)
        );
        assert_eq!(
            Catalog::new(vec![ArtifactDescriptor::new("a", "A", "")]).unwrap_err(),
            CatalogError::EmptyAssetPath("a".to_string())
        );
    }

    #[test]
    fn optional_fields_default_when_deserialized() {
        let descriptor: ArtifactDescriptor = toml::from_str(
            r#"
            id = "vase"
            name = "Vase"
            path = "vase.stl"

            [[hotspot]]
            position = [0.0, 1.2, 0.0]
            title = "Rim"
            "#,
        )
        .unwrap();

        assert_eq!(descriptor.manual_scale, 1.0);
        assert_eq!(descriptor.center_offset, Vec3::ZERO);
        assert_eq!(descriptor.hotspots.len(), 1);
        assert_eq!(descriptor.hotspots[0].content, "");
    }

    #[test]
    fn cards_preserve_catalog_order() {
        let ids: Vec<_> = Catalog::builtin().cards().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, ["artifact1", "artifact2", "artifact3", "artifact4"]);
    }
}
