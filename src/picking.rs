//! Mapping pointer events to hotspot markers.
//!
//! - [`PointerEvent`] / [`Viewport`]: a click in window pixels and the rect the scene is drawn into
//! - [`Ray`]: a world-space ray built from a click through the camera
//! - [`Collider`]: pickable shape attached to marker nodes
//! - [`raycast`]: intersect a ray against an explicit candidate set, nearest first
//!
//! Picking never walks the whole world: callers pass the marker entities of
//! the artifact that is currently installed, so nodes of a disposed artifact
//! can never be hit.

use glam::{Mat4, Vec2, Vec3, Vec4};
use hecs::Entity;

use crate::camera::Camera;
use crate::scene::SceneGraph;

/// A pointer press in window pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    pub client_x: f32,
    pub client_y: f32,
}

impl PointerEvent {
    pub fn new(client_x: f32, client_y: f32) -> Self {
        Self { client_x, client_y }
    }
}

/// The rectangle of the window the scene is drawn into, in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width,
            height,
        }
    }

    pub fn aspect(&self) -> f32 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }

    /// Normalized device coordinates of a pointer event: `[-1, 1]` on both
    /// axes, Y pointing up.
    pub fn to_ndc(&self, event: PointerEvent) -> Vec2 {
        Vec2::new(
            ((event.client_x - self.x) / self.width) * 2.0 - 1.0,
            -((event.client_y - self.y) / self.height) * 2.0 + 1.0,
        )
    }
}

/// A ray in 3D space, used for picking.
#[derive(Clone, Copy, Debug)]
pub struct Ray {
    /// The starting point of the ray.
    pub origin: Vec3,
    /// The normalized direction of the ray.
    pub direction: Vec3,
}

impl Ray {
    /// Create a new ray; the direction is normalized.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Ray through a point given in normalized device coordinates.
    pub fn from_ndc(ndc: Vec2, view_matrix: Mat4, projection_matrix: Mat4) -> Self {
        // Clip-space points on the near and far planes
        let near_clip = Vec4::new(ndc.x, ndc.y, 0.0, 1.0);
        let far_clip = Vec4::new(ndc.x, ndc.y, 1.0, 1.0);

        let inv_view_proj = (projection_matrix * view_matrix).inverse();
        let near_world = inv_view_proj * near_clip;
        let far_world = inv_view_proj * far_clip;

        // Perspective divide
        let near_point = near_world.truncate() / near_world.w;
        let far_point = far_world.truncate() / far_world.w;

        Self {
            origin: near_point,
            direction: (far_point - near_point).normalize_or_zero(),
        }
    }

    /// Ray from the camera through a pointer event.
    pub fn from_pointer(event: PointerEvent, viewport: &Viewport, camera: &Camera) -> Self {
        Self::from_ndc(
            viewport.to_ndc(event),
            camera.view_matrix(),
            camera.projection_matrix(),
        )
    }

    /// Get a point along the ray at the given distance from the origin.
    #[inline]
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Distance to the nearest intersection with a sphere in front of the
    /// origin, or `None`.
    pub fn intersect_sphere(&self, center: Vec3, radius: f32) -> Option<f32> {
        let oc = self.origin - center;
        let a = self.direction.dot(self.direction);
        if a <= 0.0 {
            return None;
        }
        let b = 2.0 * oc.dot(self.direction);
        let c = oc.dot(oc) - radius * radius;
        let discriminant = b * b - 4.0 * a * c;

        if discriminant < 0.0 {
            return None;
        }

        let sqrt_disc = discriminant.sqrt();
        let t1 = (-b - sqrt_disc) / (2.0 * a);
        let t2 = (-b + sqrt_disc) / (2.0 * a);

        if t1 > 0.0 {
            Some(t1)
        } else if t2 > 0.0 {
            Some(t2)
        } else {
            None
        }
    }
}

/// Pickable sphere attached to a node, centered on the node's origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Collider {
    pub radius: f32,
}

impl Collider {
    pub fn sphere(radius: f32) -> Self {
        Self { radius }
    }
}

/// A ray-collider intersection.
#[derive(Clone, Copy, Debug)]
pub struct RayHit {
    /// The node that was hit.
    pub entity: Entity,
    /// Distance from ray origin to the hit point.
    pub distance: f32,
    /// World-space position of the hit point.
    pub point: Vec3,
}

/// Cast a ray against `candidates` and return all hits, closest first.
///
/// Candidates without a [`Collider`] or no longer in the scene are skipped.
/// Collider radii scale with inherited scale unless the node is
/// [`FixedSize`](crate::scene::FixedSize).
pub fn raycast(scene: &SceneGraph, ray: &Ray, candidates: &[Entity]) -> Vec<RayHit> {
    let mut hits: Vec<RayHit> = candidates
        .iter()
        .filter_map(|&entity| {
            let collider = *scene.world().get::<&Collider>(entity).ok()?;
            let matrix = scene.world_matrix(entity)?;
            let (scale, _, center) = matrix.to_scale_rotation_translation();
            let radius = if scene.is_fixed_size(entity) {
                collider.radius
            } else {
                collider.radius * (scale.x + scale.y + scale.z) / 3.0
            };
            let distance = ray.intersect_sphere(center, radius)?;
            Some(RayHit {
                entity,
                distance,
                point: ray.point_at(distance),
            })
        })
        .collect();

    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    hits
}

/// The nearest hit among `candidates` for a pointer event.
pub fn hit_test(
    event: PointerEvent,
    viewport: &Viewport,
    camera: &Camera,
    scene: &SceneGraph,
    candidates: &[Entity],
) -> Option<RayHit> {
    if candidates.is_empty() {
        return None;
    }
    let ray = Ray::from_pointer(event, viewport, camera);
    raycast(scene, &ray, candidates).into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Transform;
    use approx::assert_relative_eq;

    fn camera() -> Camera {
        Camera::new()
            .at(Vec3::new(0.0, 0.0, 10.0))
            .looking_at(Vec3::ZERO)
            .with_aspect(1.0)
    }

    #[test]
    fn ndc_flips_y_and_honours_viewport_offset() {
        let viewport = Viewport {
            x: 100.0,
            y: 50.0,
            width: 200.0,
            height: 100.0,
        };

        assert_eq!(viewport.to_ndc(PointerEvent::new(100.0, 50.0)), Vec2::new(-1.0, 1.0));
        assert_eq!(viewport.to_ndc(PointerEvent::new(300.0, 150.0)), Vec2::new(1.0, -1.0));
        assert_eq!(viewport.to_ndc(PointerEvent::new(200.0, 100.0)), Vec2::ZERO);
    }

    #[test]
    fn center_ray_points_along_camera_forward() {
        let ray = Ray::from_pointer(PointerEvent::new(50.0, 50.0), &Viewport::new(100.0, 100.0), &camera());

        assert_relative_eq!(ray.direction.z, -1.0, epsilon = 1e-4);
        assert_relative_eq!(ray.origin.x, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn sphere_hit_distance_is_to_near_surface() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z);
        assert_relative_eq!(ray.intersect_sphere(Vec3::ZERO, 1.0).unwrap(), 9.0, epsilon = 1e-5);
        assert!(ray.intersect_sphere(Vec3::new(5.0, 0.0, 0.0), 1.0).is_none());
    }

    #[test]
    fn raycast_orders_hits_and_ignores_non_candidates() {
        let mut scene = SceneGraph::new();
        let group = scene.spawn_group(Transform::new());
        let far = scene
            .spawn_child(group.entity(), Transform::from_position(Vec3::new(0.0, 0.0, -2.0)), (Collider::sphere(0.5),))
            .unwrap();
        let near = scene
            .spawn_child(group.entity(), Transform::from_position(Vec3::new(0.0, 0.0, 2.0)), (Collider::sphere(0.5),))
            .unwrap();
        let ignored = scene
            .spawn_child(group.entity(), Transform::from_position(Vec3::new(0.0, 0.0, 5.0)), (Collider::sphere(0.5),))
            .unwrap();

        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z);
        let hits = raycast(&scene, &ray, &[far, near]);

        let order: Vec<_> = hits.iter().map(|h| h.entity).collect();
        assert_eq!(order, vec![near, far]);
        assert!(!order.contains(&ignored));
        let _ = scene.dispose(group);
    }

    #[test]
    fn hit_test_with_no_candidates_is_none() {
        let scene = SceneGraph::new();
        let hit = hit_test(
            PointerEvent::new(50.0, 50.0),
            &Viewport::new(100.0, 100.0),
            &camera(),
            &scene,
            &[],
        );
        assert!(hit.is_none());
    }
}
