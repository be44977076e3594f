use glam::{Mat4, Quat, Vec3};
use vitrine_common::{Viewport, look_rotation};

/// Perspective camera. Looks down its local -Z axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveCamera {
    pub position: Vec3,
    pub rotation: Quat,
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self::new(50.0, 1.0, 0.1, 2000.0)
    }
}

impl PerspectiveCamera {
    pub fn new(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            up: Vec3::Y,
            fov_degrees,
            aspect,
            near,
            far,
        }
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Turn to face `target`. No-op when `target` is the camera position.
    pub fn look_at(&mut self, target: Vec3) {
        if let Some(rotation) = look_rotation(self.position - target, self.up) {
            self.rotation = rotation;
        }
    }

    /// Recompute the aspect ratio for a new viewport size.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.aspect = viewport.aspect();
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    pub fn up_direction(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position).inverse()
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_camera_matrix_is_finite() {
        let cam = PerspectiveCamera::default().with_position(Vec3::new(0.0, 0.0, 5.0));
        let vp = cam.view_projection();
        assert!(vp.is_finite());
    }

    #[test]
    fn look_at_faces_target() {
        let mut cam = PerspectiveCamera::new(75.0, 1.0, 0.1, 1000.0)
            .with_position(Vec3::new(3.0, 3.0, 3.0));
        cam.look_at(Vec3::ZERO);
        let expected = -Vec3::new(3.0, 3.0, 3.0).normalize();
        assert!((cam.forward() - expected).length() < 1e-5);
        // target projects to the center of the screen
        let ndc = cam.view_projection().project_point3(Vec3::ZERO);
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
    }

    #[test]
    fn viewport_sets_aspect() {
        let mut cam = PerspectiveCamera::default();
        cam.set_viewport(Viewport::new(1920, 1080));
        assert!((cam.aspect - 1920.0 / 1080.0).abs() < 1e-6);
    }
}
