//! Fitting an arbitrarily-authored asset into the view.
//!
//! The transform chain is fixed and order-dependent:
//!
//! 1. translate by `-C`, the center of the raw bounding box;
//! 2. scale uniformly by `auto_scale = desired_size / max_dim`, where
//!    `max_dim` is measured on the raw (unscaled) box;
//! 3. multiply the scale by the artifact's `manual_scale`;
//! 4. add the artifact's `center_offset`, in already-scaled units.
//!
//! Steps 1–2 live on the asset node, steps 3–4 on the group that also holds
//! the hotspot markers. Composed, a raw point `v` lands at
//! `manual * auto * (v - C) + offset`, and hotspots authored in the
//! auto-normalized space follow the model through steps 3–4.

use std::sync::Arc;

use glam::Vec3;
use hecs::{Entity, NoSuchEntity};
use tracing::{debug, info};

use crate::catalog::ArtifactDescriptor;
use crate::geometry::{Aabb, RawGeometry};
use crate::mesh::Transform;
use crate::scene::{Color, GroupHandle, RenderMesh, SceneGraph};

/// Target largest dimension of an auto-scaled model, in world units.
pub const DESIRED_SIZE: f32 = 2.0;

/// The scale and placement applied to a model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AppliedTransform {
    pub auto_scale: f32,
    pub manual_scale: f32,
    /// Where the center of the model's bounding box ends up.
    pub final_position: Vec3,
}

impl AppliedTransform {
    /// Scale applied to raw asset coordinates.
    pub fn final_scale(&self) -> f32 {
        self.auto_scale * self.manual_scale
    }
}

/// Result of [`Normalizer::normalize`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Normalization {
    /// Raw bounding box; `None` for geometry with no vertices.
    pub raw_bounds: Option<Aabb>,
    /// Auto-center and auto-scale (steps 1–2).
    pub asset: Transform,
    /// Manual scale and offset (steps 3–4).
    pub group: Transform,
    pub applied: AppliedTransform,
    /// Largest dimension of the model as displayed.
    pub effective_size: f32,
}

impl Normalization {
    /// Bounding box of the model after the whole chain.
    pub fn transformed_bounds(&self) -> Option<Aabb> {
        let matrix = self.group.matrix() * self.asset.matrix();
        self.raw_bounds.map(|b| b.transformed(&matrix))
    }
}

/// A normalized model spawned into the scene, not yet attached.
#[derive(Debug)]
pub struct ModelGroup {
    pub group: GroupHandle,
    pub asset: Entity,
}

/// Computes and applies the normalization chain.
#[derive(Clone, Copy, Debug)]
pub struct Normalizer {
    pub desired_size: f32,
    pub model_color: Color,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            desired_size: DESIRED_SIZE,
            model_color: Color::WHITE,
        }
    }
}

impl Normalizer {
    pub fn new(desired_size: f32) -> Self {
        Self {
            desired_size,
            ..Default::default()
        }
    }

    /// Compute the transform chain for an asset with the given raw bounds.
    ///
    /// A zero-size (or empty) box falls back to `auto_scale = 1`.
    pub fn normalize(&self, raw_bounds: Option<Aabb>, descriptor: &ArtifactDescriptor) -> Normalization {
        let center = raw_bounds.map(|b| b.center()).unwrap_or(Vec3::ZERO);
        let max_dim = raw_bounds.map(|b| b.max_dimension()).unwrap_or(0.0);

        let auto_scale = if max_dim > 0.0 {
            self.desired_size / max_dim
        } else {
            debug!(artifact = %descriptor.id, "degenerate bounding box, keeping unit scale");
            1.0
        };
        info!(artifact = %descriptor.name, auto_scale, "applied auto-scale");

        let manual_scale = descriptor.manual_scale;
        if manual_scale != 1.0 {
            info!(artifact = %descriptor.name, manual_scale, "applied manual scale factor");
        } else {
            debug!(artifact = %descriptor.name, "no manual scale factor");
        }

        let offset = descriptor.center_offset;
        if offset != Vec3::ZERO {
            info!(
                artifact = %descriptor.name,
                x = offset.x,
                y = offset.y,
                z = offset.z,
                "applied manual offset (post-scale)"
            );
        }

        let asset = Transform::new()
            .position(-center * auto_scale)
            .uniform_scale(auto_scale);
        let group = Transform::new().position(offset).uniform_scale(manual_scale);

        Normalization {
            raw_bounds,
            asset,
            group,
            applied: AppliedTransform {
                auto_scale,
                manual_scale,
                final_position: offset,
            },
            effective_size: self.desired_size * manual_scale,
        }
    }

    /// Normalize `geometry` and spawn it as a detached model group.
    pub fn spawn(
        &self,
        scene: &mut SceneGraph,
        geometry: RawGeometry,
        descriptor: &ArtifactDescriptor,
    ) -> Result<(Normalization, ModelGroup), NoSuchEntity> {
        let normalization = self.normalize(geometry.bounds(), descriptor);

        let group = scene.spawn_group(normalization.group);
        let mesh = RenderMesh::new(Arc::new(geometry), self.model_color);
        let asset = match scene.spawn_child(group.entity(), normalization.asset, (mesh,)) {
            Ok(asset) => asset,
            Err(e) => {
                scene.dispose(group);
                return Err(e);
            }
        };

        debug!(
            artifact = %descriptor.id,
            scale = normalization.applied.final_scale(),
            "model group spawned"
        );
        Ok((normalization, ModelGroup { group, asset }))
    }
}
