use glam::{Vec2, Vec3};

use crate::camera::Camera;

/// Remaining motion below this is dropped so damping settles exactly.
const SETTLE_EPSILON: f32 = 1e-6;

/// Orbit navigation around a target point, with damped motion.
///
/// User input (`rotate`, `zoom`, `pan`) accumulates pending motion; each
/// [`update`](Self::update) applies a damped share of it to the camera and
/// decays the rest. Writes to [`target`](Self::target) and the camera position
/// followed by [`stop`](Self::stop) are reproduced exactly by the next update.
///
/// # Example
/// ```
/// use vitrine::{Camera, OrbitControls, Vec3};
///
/// let mut camera = Camera::new();
/// let mut controls = OrbitControls::new();
///
/// controls.target = Vec3::ZERO;
/// camera.position = Vec3::new(0.0, 1.0, 5.0);
/// controls.update(&mut camera);
/// assert_eq!(camera.position, Vec3::new(0.0, 1.0, 5.0));
/// ```
#[derive(Clone, Debug)]
pub struct OrbitControls {
    /// Point the camera orbits around.
    pub target: Vec3,
    pub enable_damping: bool,
    /// Share of the pending motion applied per update.
    pub damping_factor: f32,
    /// Radians per pixel of drag.
    pub rotate_sensitivity: f32,
    /// Fractional distance change per scroll step.
    pub zoom_sensitivity: f32,
    /// Minimum distance from target, enforced when zooming.
    pub min_distance: f32,
    /// Maximum distance from target, enforced when zooming.
    pub max_distance: f32,
    pending_azimuth: f32,
    pending_elevation: f32,
    pending_zoom: f32,
    pending_pan: Vec3,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            enable_damping: true,
            damping_factor: 0.05,
            rotate_sensitivity: 0.005,
            zoom_sensitivity: 0.05,
            min_distance: 1.0,
            max_distance: 20.0,
            pending_azimuth: 0.0,
            pending_elevation: 0.0,
            pending_zoom: 1.0,
            pending_pan: Vec3::ZERO,
        }
    }
}

impl OrbitControls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the damping factor; `0` disables damping.
    pub fn damping(mut self, factor: f32) -> Self {
        self.enable_damping = factor > 0.0;
        self.damping_factor = factor.clamp(0.0, 1.0);
        self
    }

    /// Set distance limits.
    pub fn distance_limits(mut self, min: f32, max: f32) -> Self {
        self.min_distance = min;
        self.max_distance = max.max(min);
        self
    }

    pub fn sensitivity(mut self, rotate: f32, zoom: f32) -> Self {
        self.rotate_sensitivity = rotate;
        self.zoom_sensitivity = zoom;
        self
    }

    /// Queue an orbit from a pointer drag in pixels.
    pub fn rotate(&mut self, drag: Vec2) {
        self.pending_azimuth -= drag.x * self.rotate_sensitivity;
        self.pending_elevation += drag.y * self.rotate_sensitivity;
    }

    /// Queue a dolly from scroll steps; positive moves closer.
    pub fn zoom(&mut self, steps: f32) {
        self.pending_zoom *= (1.0 - self.zoom_sensitivity).powf(steps);
    }

    /// Queue a screen-space pan of the target, in world units.
    pub fn pan(&mut self, camera: &Camera, delta: Vec2) {
        self.pending_pan += camera.right() * -delta.x + camera.orthogonal_up() * delta.y;
    }

    /// Drop all pending motion.
    pub fn stop(&mut self) {
        self.pending_azimuth = 0.0;
        self.pending_elevation = 0.0;
        self.pending_zoom = 1.0;
        self.pending_pan = Vec3::ZERO;
    }

    /// Whether any queued motion remains.
    pub fn is_moving(&self) -> bool {
        self.pending_azimuth != 0.0
            || self.pending_elevation != 0.0
            || self.pending_zoom != 1.0
            || self.pending_pan != Vec3::ZERO
    }

    /// Apply pending motion to the camera and aim it at the target.
    ///
    /// Returns `true` if the camera position changed.
    pub fn update(&mut self, camera: &mut Camera) -> bool {
        if !self.is_moving() {
            camera.look_at(self.target);
            return false;
        }

        let share = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };

        let offset = camera.position - self.target;
        let mut distance = offset.length();
        let mut azimuth = offset.x.atan2(offset.z);
        let mut elevation = if distance > 0.0 {
            (offset.y / distance).clamp(-1.0, 1.0).asin()
        } else {
            0.0
        };

        azimuth += self.pending_azimuth * share;
        elevation += self.pending_elevation * share;
        // Clamp elevation to avoid gimbal lock
        elevation = elevation.clamp(
            -std::f32::consts::FRAC_PI_2 + 0.01,
            std::f32::consts::FRAC_PI_2 - 0.01,
        );

        if self.pending_zoom != 1.0 {
            distance *= self.pending_zoom;
            distance = distance.clamp(self.min_distance, self.max_distance);
            self.pending_zoom = 1.0;
        }

        self.target += self.pending_pan * share;

        // Spherical to Cartesian conversion
        let offset = Vec3::new(
            distance * elevation.cos() * azimuth.sin(),
            distance * elevation.sin(),
            distance * elevation.cos() * azimuth.cos(),
        );
        camera.position = self.target + offset;
        camera.look_at(self.target);

        if self.enable_damping {
            let decay = 1.0 - self.damping_factor;
            self.pending_azimuth *= decay;
            self.pending_elevation *= decay;
            self.pending_pan *= decay;
            self.settle();
        } else {
            self.stop();
        }

        true
    }

    fn settle(&mut self) {
        if self.pending_azimuth.abs() < SETTLE_EPSILON {
            self.pending_azimuth = 0.0;
        }
        if self.pending_elevation.abs() < SETTLE_EPSILON {
            self.pending_elevation = 0.0;
        }
        if self.pending_pan.length_squared() < SETTLE_EPSILON * SETTLE_EPSILON {
            self.pending_pan = Vec3::ZERO;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn update_without_input_keeps_position_exact() {
        let mut camera = Camera::new().at(Vec3::new(0.0, 8.0, 40.0));
        let mut controls = OrbitControls::new();

        assert!(!controls.update(&mut camera));
        assert_eq!(camera.position, Vec3::new(0.0, 8.0, 40.0));
        assert_relative_eq!(camera.forward.length(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn damped_rotation_keeps_distance_and_settles() {
        let mut camera = Camera::new().at(Vec3::new(0.0, 0.0, 5.0));
        let mut controls = OrbitControls::new();
        controls.rotate(Vec2::new(100.0, 0.0));

        let mut frames = 0;
        while controls.update(&mut camera) {
            frames += 1;
            assert!(frames < 10_000, "damping never settled");
        }

        assert_relative_eq!(camera.position.length(), 5.0, epsilon = 1e-3);
        assert!(camera.position.x.abs() > 0.1);
    }

    #[test]
    fn zoom_is_clamped_to_limits() {
        let mut camera = Camera::new().at(Vec3::new(0.0, 0.0, 5.0));
        let mut controls = OrbitControls::new().damping(0.0).distance_limits(1.0, 20.0);

        controls.zoom(-200.0);
        controls.update(&mut camera);
        assert_relative_eq!(camera.position.length(), 20.0, epsilon = 1e-3);

        controls.zoom(200.0);
        controls.update(&mut camera);
        assert_relative_eq!(camera.position.length(), 1.0, epsilon = 1e-3);
    }

    #[test]
    fn stop_discards_pending_motion() {
        let mut camera = Camera::new().at(Vec3::new(0.0, 0.0, 5.0));
        let mut controls = OrbitControls::new();
        controls.rotate(Vec2::new(50.0, 20.0));
        controls.stop();

        assert!(!controls.update(&mut camera));
        assert_eq!(camera.position, Vec3::new(0.0, 0.0, 5.0));
    }
}
