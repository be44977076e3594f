use crate::camera::PerspectiveCamera;
use glam::{Quat, Vec3};
use std::f32::consts::{PI, TAU};
use vitrine_common::Viewport;
use vitrine_input::OrbitAction;

const EPS: f32 = 0.000_001;

/// Orbits a camera around a target point, Y up.
///
/// Input accumulates as a spherical delta, a pan offset and a zoom scale.
/// `update` applies them; with damping only a `damping_factor` share is
/// applied per tick and the rest decays geometrically, so the camera keeps
/// easing after input stops.
#[derive(Debug, Clone)]
pub struct OrbitController {
    pub target: Vec3,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    pub auto_rotate: bool,
    /// Full turns per minute at 60 ticks per second, times two.
    pub auto_rotate_speed: f32,
    delta_theta: f32,
    delta_phi: f32,
    pan_offset: Vec3,
    scale: f32,
    interacted: bool,
    last_position: Vec3,
    last_rotation: Quat,
}

impl Default for OrbitController {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            enable_damping: false,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            auto_rotate: false,
            auto_rotate_speed: 2.0,
            delta_theta: 0.0,
            delta_phi: 0.0,
            pan_offset: Vec3::ZERO,
            scale: 1.0,
            interacted: false,
            last_position: Vec3::ZERO,
            last_rotation: Quat::IDENTITY,
        }
    }
}

impl OrbitController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Damped controller with the usual 0.05 factor.
    pub fn damped() -> Self {
        Self {
            enable_damping: true,
            ..Self::default()
        }
    }

    pub fn with_target(mut self, target: Vec3) -> Self {
        self.target = target;
        self
    }

    pub fn with_distance_limits(mut self, min: f32, max: f32) -> Self {
        self.min_distance = min;
        self.max_distance = max;
        self
    }

    pub fn with_polar_limits(mut self, min: f32, max: f32) -> Self {
        self.min_polar_angle = min;
        self.max_polar_angle = max;
        self
    }

    /// Feed one accumulated action. `viewport` converts pixels to angles.
    pub fn apply(&mut self, action: OrbitAction, camera: &PerspectiveCamera, viewport: Viewport) {
        let height = viewport.height as f32;
        self.interacted = true;
        match action {
            OrbitAction::Rotate(delta) => {
                let d = delta * self.rotate_speed;
                self.delta_theta -= TAU * d.x / height;
                self.delta_phi -= TAU * d.y / height;
            }
            OrbitAction::Pan(delta) => {
                let d = delta * self.pan_speed;
                let offset = camera.position - self.target;
                let target_distance =
                    offset.length() * (camera.fov_degrees.to_radians() * 0.5).tan();
                let left = 2.0 * d.x * target_distance / height;
                let up = 2.0 * d.y * target_distance / height;
                self.pan_offset += camera.right() * -left;
                self.pan_offset += camera.up_direction() * up;
            }
            OrbitAction::Dolly(steps) => {
                let zoom_scale = 0.95_f32.powf(self.zoom_speed);
                self.scale *= zoom_scale.powf(-steps);
            }
        }
    }

    /// Move the camera toward the accumulated goal. Returns whether it moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let offset = camera.position - self.target;
        let mut radius = offset.length();
        let (mut theta, mut phi) = if radius > 0.0 {
            (
                offset.x.atan2(offset.z),
                (offset.y / radius).clamp(-1.0, 1.0).acos(),
            )
        } else {
            (0.0, 0.0)
        };

        if self.auto_rotate && !self.interacted {
            self.delta_theta -= TAU / 60.0 / 60.0 * self.auto_rotate_speed;
        }
        self.interacted = false;

        let share = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };
        theta += self.delta_theta * share;
        phi += self.delta_phi * share;
        phi = phi
            .clamp(self.min_polar_angle, self.max_polar_angle)
            .clamp(EPS, PI - EPS);

        self.target += self.pan_offset * share;

        radius = (radius * self.scale).clamp(self.min_distance, self.max_distance);

        let sin_phi_r = phi.sin() * radius;
        let offset = Vec3::new(
            sin_phi_r * theta.sin(),
            phi.cos() * radius,
            sin_phi_r * theta.cos(),
        );
        camera.position = self.target + offset;
        camera.look_at(self.target);

        if self.enable_damping {
            let keep = 1.0 - self.damping_factor;
            self.delta_theta *= keep;
            self.delta_phi *= keep;
            self.pan_offset *= keep;
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
            self.pan_offset = Vec3::ZERO;
        }
        self.scale = 1.0;

        let moved = (camera.position - self.last_position).length_squared() > EPS
            || 8.0 * (1.0 - self.last_rotation.dot(camera.rotation)) > EPS;
        self.last_position = camera.position;
        self.last_rotation = camera.rotation;
        moved
    }

    /// Spherical motion still owed to the camera.
    pub fn pending_rotation(&self) -> f32 {
        self.delta_theta.abs() + self.delta_phi.abs()
    }
}
