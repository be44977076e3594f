//! Debug line geometry: axes, light gizmos.

use crate::geometry::Geometry;
use glam::{Quat, Vec3};
use std::f32::consts::TAU;
use vitrine_common::{Color, look_rotation};

/// Three colored segments from the origin: X red, Y green, Z blue.
pub fn axes(size: f32) -> Geometry {
    let positions = vec![
        [0.0, 0.0, 0.0],
        [size, 0.0, 0.0],
        [0.0, 0.0, 0.0],
        [0.0, size, 0.0],
        [0.0, 0.0, 0.0],
        [0.0, 0.0, size],
    ];
    let colors = vec![
        [1.0, 0.0, 0.0],
        [1.0, 0.6, 0.0],
        [0.0, 1.0, 0.0],
        [0.6, 1.0, 0.0],
        [0.0, 0.0, 1.0],
        [0.0, 0.6, 1.0],
    ];
    Geometry::lines(positions, colors)
}

/// Cone outline from `origin` toward `target` with half-angle `angle`,
/// in world space. `length == 0` uses the origin-target distance.
pub fn spot_cone(origin: Vec3, target: Vec3, angle: f32, length: f32, color: Color) -> Geometry {
    let axis = target - origin;
    let length = if length > 0.0 { length } else { axis.length() };
    let rotation = look_rotation(axis, Vec3::Y).unwrap_or(Quat::IDENTITY);
    let radius = length * angle.tan();
    let c = color.to_array();

    let mut positions = Vec::new();
    let ring = |i: u32| {
        let t = i as f32 / 32.0 * TAU;
        origin + rotation * Vec3::new(radius * t.cos(), radius * t.sin(), length)
    };
    // four spokes, then the rim
    for i in (0..32).step_by(8) {
        positions.push(origin.to_array());
        positions.push(ring(i).to_array());
    }
    for i in 0..32 {
        positions.push(ring(i).to_array());
        positions.push(ring(i + 1).to_array());
    }
    let colors = vec![c; positions.len()];
    Geometry::lines(positions, colors)
}

/// Square plane of side `size` at `origin` facing `target`, plus the line to it.
pub fn directional_gizmo(origin: Vec3, target: Vec3, size: f32, color: Color) -> Geometry {
    let rotation = look_rotation(target - origin, Vec3::Y).unwrap_or(Quat::IDENTITY);
    let h = size * 0.5;
    let corners = [
        Vec3::new(-h, h, 0.0),
        Vec3::new(h, h, 0.0),
        Vec3::new(h, -h, 0.0),
        Vec3::new(-h, -h, 0.0),
    ]
    .map(|p| origin + rotation * p);
    let mut positions = Vec::new();
    for i in 0..4 {
        positions.push(corners[i].to_array());
        positions.push(corners[(i + 1) % 4].to_array());
    }
    positions.push(origin.to_array());
    positions.push(target.to_array());
    let colors = vec![color.to_array(); positions.len()];
    Geometry::lines(positions, colors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GeometryShape;

    #[test]
    fn axes_are_three_segments() {
        let g = axes(10.0);
        assert_eq!(g.shape, GeometryShape::Lines);
        assert_eq!(g.data.positions.len(), 6);
        assert_eq!(g.data.positions[1], [10.0, 0.0, 0.0]);
    }

    #[test]
    fn spot_cone_rim_sits_at_length() {
        let origin = Vec3::new(2.5, 5.0, 2.5);
        let target = Vec3::ZERO;
        let g = spot_cone(origin, target, std::f32::consts::FRAC_PI_6, 0.0, Color::WHITE);
        assert_eq!(g.data.positions.len() % 2, 0);
        let axis = (target - origin).normalize();
        let dist = (target - origin).length();
        let rim = Vec3::from_array(*g.data.positions.last().unwrap());
        let along = (rim - origin).dot(axis);
        assert!((along - dist).abs() < 1e-3);
    }

    #[test]
    fn directional_gizmo_has_square_and_ray() {
        let g = directional_gizmo(Vec3::new(10.0, 14.0, 5.0), Vec3::ZERO, 5.0, Color::WHITE);
        assert_eq!(g.data.positions.len(), 10);
        assert_eq!(g.data.positions[9], [0.0, 0.0, 0.0]);
    }
}
