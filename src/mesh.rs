//! Vertex data and spatial transforms for scene nodes.
//!
//! - [`Vertex3d`]: position, normal and UV for one vertex of loaded geometry
//! - [`Transform`]: position, rotation and scale of a node relative to its parent
//!
//! # Transforms
//!
//! [`Transform`] uses a builder pattern:
//!
//! ```
//! use vitrine::{Transform, Vec3};
//!
//! let pivot = Transform::new()
//!     .position(Vec3::new(0.0, -7.0, 3.0))
//!     .uniform_scale(8.0);
//!
//! // Points are scaled first, then moved.
//! let p = pivot.transform_point(Vec3::new(0.0, 1.0, 0.0));
//! assert_eq!(p, Vec3::new(0.0, 1.0, 3.0));
//! ```

use glam::{Mat4, Quat, Vec3};

/// A vertex of loaded geometry.
///
/// Geometry stays on the CPU; the layout matches what a GPU vertex buffer
/// would expect (position, normal, uv) so a renderer can upload it as-is.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Vertex3d {
    /// Position in the asset's own (raw) coordinate space.
    pub position: [f32; 3],
    /// Surface normal.
    pub normal: [f32; 3],
    /// Texture coordinates.
    pub uv: [f32; 2],
}

impl Vertex3d {
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// Position, rotation and scale of a scene node relative to its parent.
///
/// The matrix applies Scale, then Rotation, then Translation. A model
/// centered by translating by `-C` and then scaled by `s` is therefore
/// expressed as `position = -C * s`, `scale = s`.
///
/// # Default Values
///
/// - `position`: `(0, 0, 0)`
/// - `rotation`: identity
/// - `scale`: `(1, 1, 1)`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    /// Translation relative to the parent node.
    pub position: Vec3,
    /// Rotation as a unit quaternion.
    pub rotation: Quat,
    /// Scale factors for each axis.
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Creates an identity transform.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transform positioned at the given location.
    ///
    /// ```
    /// use vitrine::{Transform, Vec3};
    ///
    /// let transform = Transform::from_position(Vec3::new(1.0, 2.0, 3.0));
    /// assert_eq!(transform.position, Vec3::new(1.0, 2.0, 3.0));
    /// ```
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Sets the position (translation) component.
    pub fn position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Sets uniform scale on all axes.
    ///
    /// ```
    /// use vitrine::{Transform, Vec3};
    ///
    /// let transform = Transform::new().uniform_scale(2.0);
    /// assert_eq!(transform.scale, Vec3::splat(2.0));
    /// ```
    pub fn uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::splat(scale);
        self
    }

    /// Converts this transform to a 4×4 matrix (SRT order).
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Maps a point from this node's local space into its parent's space.
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.rotation * (point * self.scale) + self.position
    }
}
