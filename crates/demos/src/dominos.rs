use glam::{Quat, Vec3};
use vitrine_common::{Color, Transform};
use vitrine_physics::{BodyKind, PhysicsWorld};
use vitrine_render::{OrbitController, PerspectiveCamera};
use vitrine_runtime::{Demo, DemoContext, DemoError, DemoSetup};
use vitrine_scene::{Geometry, Light, Material, Node, NodeId, Scene};
use vitrine_tools::ControlPanel;

const FLOOR_TEXTURE: &str = "textures/wood/floor-parquet-pattern-172292.jpg";
const DOMINO_COLORS: [u32; 2] = [0xf8fafc, 0x475569];
const SPIRAL_RADIUS: f64 = 2.8;
/// Domino centers sit this high so their 0.5 tall boxes clear the floor.
const DOMINO_HEIGHT: f32 = 0.35;
const FIRST_TIP: f32 = 0.2;

/// Ground points of the domino spiral: the radius shrinks linearly with the
/// angle (in degrees) and the spacing widens as the spiral winds inward.
pub fn domino_spiral() -> Vec<Vec3> {
    let mut points = Vec::new();
    let mut deg = 0.0f64;
    while deg < 1200.0 {
        let spacing = 1.5 * (deg / 360.0);
        let r = SPIRAL_RADIUS / 1440.0 * (1440.0 - deg);
        let a = deg.to_radians();
        points.push(Vec3::new((r * a.cos()) as f32, 0.0, (r * a.sin()) as f32));
        deg += 6.0 + spacing;
    }
    points
}

/// A spiral of rigid-body dominos in a wooden arena; the first one is tipped
/// so the chain falls. Gravity is adjustable.
pub struct DominosDemo;

impl DominosDemo {
    fn arena(scene: &mut Scene, floor: Material) -> Result<Vec<NodeId>, DemoError> {
        let group = scene.add(Node::group("arena"));
        let parts = [
            ("ground", [6.0, 0.2, 6.0], Vec3::ZERO),
            ("borderLeft", [6.0, 0.6, 0.2], Vec3::new(0.0, 0.2, 3.1)),
            ("borderRight", [6.0, 0.6, 0.2], Vec3::new(0.0, 0.2, -3.1)),
            ("borderBottom", [0.2, 0.6, 6.4], Vec3::new(3.1, 0.2, 0.0)),
            ("borderTop", [0.2, 0.6, 6.4], Vec3::new(-3.1, 0.2, 0.0)),
        ];
        let mut ids = Vec::with_capacity(parts.len());
        for (name, [w, h, d], position) in parts {
            let geometry = scene.add_geometry(Geometry::cuboid(w, h, d));
            let id = scene.add_child(
                group,
                Node::mesh(name, geometry, floor.clone())
                    .with_position(position)
                    .with_shadows(true, true),
            )?;
            ids.push(id);
        }
        Ok(ids)
    }

    fn dominos(scene: &mut Scene) -> Result<Vec<NodeId>, DemoError> {
        let group = scene.add(Node::group("dominos"));
        let geometry = scene.add_geometry(Geometry::cuboid(0.05, 0.5, 0.2));
        let mut ids = Vec::new();
        for (index, point) in domino_spiral().into_iter().enumerate() {
            let mut transform = Transform::from_position(point);
            transform.look_at(Vec3::ZERO, Vec3::Y);
            transform.position.y = DOMINO_HEIGHT;
            if index == 0 {
                transform.rotation = Quat::from_rotation_x(FIRST_TIP) * transform.rotation;
            }
            let color = DOMINO_COLORS[index % DOMINO_COLORS.len()];
            let id = scene.add_child(
                group,
                Node::mesh(format!("domino{index}"), geometry, Material::standard(color))
                    .with_transform(transform)
                    .with_shadows(true, true),
            )?;
            ids.push(id);
        }
        Ok(ids)
    }
}

impl Demo for DominosDemo {
    fn name(&self) -> &'static str {
        "dominos"
    }

    fn title(&self) -> &'static str {
        "Dominos (rapier)"
    }

    fn build(&self, ctx: &mut DemoContext) -> Result<DemoSetup, DemoError> {
        let gravity = Vec3::new(0.0, -9.8, 0.0);
        let mut controls = ControlPanel::new();
        for (key, value) in [("x", gravity.x), ("y", gravity.y), ("z", gravity.z)] {
            controls.add_number(key, value, -15.0, 15.0, 1.0).in_folder("gravity");
        }

        let mut scene = Scene::new();
        scene.background = Color::from_hex(0xe2e8f0);
        let floor_texture = ctx.loader.load_texture(&mut scene, FLOOR_TEXTURE);
        let floor = Material::standard(Color::WHITE).with_map(floor_texture);

        let mut physics = PhysicsWorld::new(gravity);
        for id in Self::arena(&mut scene, floor)? {
            physics.attach_box(&scene, id, BodyKind::Fixed)?;
        }
        let dominos = Self::dominos(&mut scene)?;
        for &id in &dominos {
            physics.attach_box(&scene, id, BodyKind::Dynamic)?;
        }
        tracing::debug!(dominos = dominos.len(), bodies = physics.body_count(), "built domino arena");

        scene.add(Node::light("ambient", Light::ambient(Color::WHITE, 1.0)));
        let mut sun = Light::directional(Color::WHITE, 1.5);
        if let Some(shadow) = sun.shadow_mut() {
            shadow.cast = true;
        }
        scene.add(Node::light("directional", sun).with_position(Vec3::new(0.0, 6.0, 4.0)));

        let camera = PerspectiveCamera::new(75.0, ctx.viewport.aspect(), 0.1, 1000.0)
            .with_position(Vec3::new(3.0, 3.0, 3.0));

        Ok(DemoSetup::new(scene, camera)
            .with_controller(OrbitController::damped())
            .with_physics(physics)
            .with_controls(controls)
            .with_animation(|ctx| {
                if !(ctx.changed("x") || ctx.changed("y") || ctx.changed("z")) {
                    return;
                }
                let axis = |key: &str| ctx.controls.number(key).unwrap_or(0.0);
                let gravity = Vec3::new(axis("x"), axis("y"), axis("z"));
                if let Some(physics) = ctx.physics.as_deref_mut() {
                    physics.set_gravity(gravity);
                    tracing::debug!(?gravity, "gravity changed");
                }
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::run;
    use vitrine_render::DebugTextRenderer;

    #[test]
    fn spiral_shape() {
        let points = domino_spiral();
        assert_eq!(points.len(), 146);
        assert!((points[0] - Vec3::new(2.8, 0.0, 0.0)).length() < 1e-6);
        // strictly inside the arena and winding inward
        assert!(points.iter().all(|p| p.x.abs() < 3.0 && p.z.abs() < 3.0));
        assert!(points.last().unwrap().length() < points[0].length());
    }

    #[test]
    fn dominos_face_the_center() {
        let mut scene = Scene::new();
        let ids = DominosDemo::dominos(&mut scene).unwrap();
        let t = scene.get(ids[1]).unwrap().transform;
        let facing = t.rotation * Vec3::Z;
        let inward = (-t.position).with_y(0.0).normalize();
        assert!(facing.dot(inward) > 0.999);
        assert_eq!(t.position.y, DOMINO_HEIGHT);
        // the first one leans
        let first = scene.get(ids[0]).unwrap().transform;
        assert!((first.rotation * Vec3::Y).dot(Vec3::Y) < 0.99);
    }

    #[test]
    fn every_domino_mirrors_its_body_each_frame() {
        let mut stage = run(&DominosDemo, 0);
        let mut renderer = DebugTextRenderer::new();
        for i in 0..30 {
            stage.on_refresh(i as f64 * 16.0, &mut renderer);
            let frame_loop = stage.frame_loop().unwrap();
            let physics = frame_loop.physics.as_ref().unwrap();
            for link in physics.links() {
                let (position, rotation) = physics.body_pose(link.body).unwrap();
                let t = frame_loop.scene.get(link.node).unwrap().transform;
                assert_eq!(t.position, position);
                assert_eq!(t.rotation, rotation);
            }
        }
        let physics = stage.frame_loop().unwrap().physics.as_ref().unwrap();
        assert_eq!(physics.links().len(), 146);
        assert_eq!(physics.body_count(), 146 + 5);
    }

    #[test]
    fn gravity_sliders_reach_the_world() {
        let mut stage = run(&DominosDemo, 1);
        let frame_loop = stage.frame_loop_mut().unwrap();
        frame_loop.controls.set_number("y", 9.0).unwrap();
        frame_loop.controls.set_number("x", 2.0).unwrap();
        frame_loop.tick(100.0, &mut DebugTextRenderer::new());
        let gravity = frame_loop.physics.as_ref().unwrap().gravity();
        assert_eq!(gravity, Vec3::new(2.0, 9.0, 0.0));
    }
}
