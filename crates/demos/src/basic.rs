use glam::Vec3;
use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};
use vitrine_common::{Color, Transform};
use vitrine_render::{OrbitController, PerspectiveCamera};
use vitrine_runtime::{Demo, DemoContext, DemoError, DemoSetup};
use vitrine_scene::{Fog, Geometry, Light, Material, Node, Scene, Side};
use vitrine_tools::ControlPanel;

/// Fogged cube and torus knot over a white ground, with speed and light
/// intensity sliders.
pub struct BasicDemo;

impl Demo for BasicDemo {
    fn name(&self) -> &'static str {
        "basic"
    }

    fn title(&self) -> &'static str {
        "Basic scene"
    }

    fn build(&self, ctx: &mut DemoContext) -> Result<DemoSetup, DemoError> {
        let mut controls = ControlPanel::new();
        controls.add_number("speed", 0.01, -0.1, 0.1, 0.01);
        controls.add_number("ambientIntensity", 0.9, 0.0, 2.0, 0.1);
        controls.add_number("directionalIntensity", 1.1, 0.0, 2.0, 0.1);

        let mut scene = Scene::new();
        scene.background = Color::WHITE;
        scene.fog = Some(Fog {
            color: Color::WHITE,
            near: 0.0025,
            far: 90.0,
        });

        let box_geometry = scene.add_geometry(Geometry::cuboid(1.0, 1.0, 1.0));
        let cube = scene.add(
            Node::mesh("cube", box_geometry, Material::phong(0x0000ffu32))
                .with_position(Vec3::new(-2.0, 0.0, 0.0))
                .with_shadows(true, false),
        );

        let knot_geometry = scene.add_geometry(Geometry::torus_knot(0.5, 0.2, 100, 100, 2, 3));
        let knot = scene.add(
            Node::mesh(
                "torusKnot",
                knot_geometry,
                Material::standard(0x00ff88u32).with_roughness(0.1),
            )
            .with_position(Vec3::new(2.0, 0.0, 0.0))
            .with_shadows(true, false),
        );

        let ground_geometry = scene.add_geometry(Geometry::plane(10000.0, 10000.0));
        let mut ground = Transform::from_position(Vec3::new(0.0, -2.0, 0.0));
        ground.set_euler(Vec3::new(-FRAC_PI_2, 0.0, 0.0));
        scene.add(
            Node::mesh(
                "ground",
                ground_geometry,
                Material::lambert(Color::WHITE).with_side(Side::Double),
            )
            .with_transform(ground)
            .with_shadows(false, true),
        );

        let ambient = scene.add(Node::light("ambient", Light::ambient(Color::WHITE, 0.9)));

        let mut sun = Light::directional(Color::WHITE, 1.1);
        if let Some(shadow) = sun.shadow_mut() {
            shadow.cast = true;
            shadow.near = 0.1;
            shadow.far = 200.0;
            shadow.extent = [-10.0, 10.0, 10.0, -10.0];
            shadow.map_size = 512;
            shadow.radius = 4.0;
            shadow.bias = -0.0005;
        }
        let directional =
            scene.add(Node::light("directional", sun).with_position(Vec3::new(5.0, 12.0, 8.0)));

        let camera = PerspectiveCamera::new(75.0, ctx.viewport.aspect(), 0.1, 1000.0)
            .with_position(Vec3::new(-3.0, 2.0, 8.0));
        let controller = OrbitController::damped()
            .with_distance_limits(3.0, 10.0)
            .with_polar_limits(FRAC_PI_4, FRAC_PI_2);

        let mut spin = Vec3::ZERO;
        Ok(DemoSetup::new(scene, camera)
            .with_controller(controller)
            .with_controls(controls)
            .with_animation(move |ctx| {
                let speed = ctx.controls.number("speed").unwrap_or(0.0);
                spin += Vec3::new(speed, speed, 0.0);
                for id in [cube, knot] {
                    if let Some(node) = ctx.scene.get_mut(id) {
                        node.transform.set_euler(spin);
                    }
                }
                for (id, key) in [(ambient, "ambientIntensity"), (directional, "directionalIntensity")] {
                    let intensity = ctx.controls.number(key);
                    if let (Some(light), Some(intensity)) =
                        (ctx.scene.get_mut(id).and_then(|n| n.as_light_mut()), intensity)
                    {
                        light.intensity = intensity;
                    }
                }
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::run;
    use vitrine_tools::SceneInspector;

    #[test]
    fn scene_contents() {
        let stage = run(&BasicDemo, 1);
        let summary = SceneInspector::summary(&stage.frame_loop().unwrap().scene);
        assert_eq!(summary.meshes, 3);
        assert_eq!(summary.lights, 2);
    }

    #[test]
    fn sliders_drive_lights_and_spin() {
        let mut stage = run(&BasicDemo, 0);
        let frame_loop = stage.frame_loop_mut().unwrap();
        frame_loop.controls.set_number("directionalIntensity", 2.0).unwrap();
        frame_loop.controls.set_number("speed", 0.0).unwrap();
        let mut renderer = vitrine_render::DebugTextRenderer::new();
        frame_loop.tick(0.0, &mut renderer);

        let scene = &frame_loop.scene;
        let sun = scene.find_by_name("directional").unwrap();
        assert_eq!(scene.get(sun).unwrap().as_light().unwrap().intensity, 2.0);
        let cube = scene.find_by_name("cube").unwrap();
        assert_eq!(scene.get(cube).unwrap().transform.euler(), Vec3::ZERO);
    }

    #[test]
    fn camera_stays_inside_orbit_limits() {
        let stage = run(&BasicDemo, 30);
        let camera = stage.frame_loop().unwrap().camera;
        let distance = camera.position.length();
        assert!((3.0..=10.0).contains(&distance), "distance {distance}");
        // polar angle from +Y never goes below the horizon
        assert!(camera.position.y >= -1e-4);
    }
}
