use crate::ambient_light::WATERFALL;
use glam::Vec3;
use std::f32::consts::FRAC_PI_2;
use vitrine_common::Color;
use vitrine_render::{OrbitController, PerspectiveCamera};
use vitrine_runtime::{Demo, DemoContext, DemoError, DemoSetup};
use vitrine_scene::{Light, Node, Scene, ToneMapping, helpers};
use vitrine_tools::ControlPanel;

const SUN_POSITION: Vec3 = Vec3::new(10.0, 14.0, 5.0);

/// The waterfall model turned a quarter and lit by a shadow-casting sun.
pub struct DirectionalLightDemo;

impl Demo for DirectionalLightDemo {
    fn name(&self) -> &'static str {
        "directional-light"
    }

    fn title(&self) -> &'static str {
        "Directional light"
    }

    fn build(&self, ctx: &mut DemoContext) -> Result<DemoSetup, DemoError> {
        let mut controls = ControlPanel::new();
        controls.add_toggle("axesHelper", false).in_folder("helpers");
        controls.add_toggle("lightHelper", false).in_folder("helpers");

        let mut scene = Scene::new();
        scene.tone_mapping = ToneMapping::Aces { exposure: 1.0 };

        let axes = scene.add_geometry(helpers::axes(10.0));
        let axes = scene.add(Node::lines("axesHelper", axes).hidden());

        scene.add(Node::light(
            "hemisphere",
            Light::hemisphere(Color::WHITE, 0x8d8d8du32, 0.5),
        ));

        let mut sun = Light::directional(Color::WHITE, 1.5);
        if let Some(shadow) = sun.shadow_mut() {
            shadow.cast = true;
            shadow.near = 1.0;
            shadow.far = 25.0;
            shadow.extent = [-10.0, 10.0, 10.0, -10.0];
            shadow.map_size = 1024;
            shadow.bias = -0.03;
        }
        scene.add(Node::light("directional", sun).with_position(SUN_POSITION));
        let gizmo = scene.add_geometry(helpers::directional_gizmo(
            SUN_POSITION,
            Vec3::ZERO,
            5.0,
            Color::WHITE,
        ));
        let gizmo = scene.add(Node::lines("lightHelper", gizmo).hidden());

        ctx.loader.load_gltf(WATERFALL, |scene, imported| {
            let root = scene.root();
            let group = match imported.instantiate(scene, root) {
                Ok(group) => group,
                Err(e) => {
                    tracing::warn!(error = %e, "could not add waterfall");
                    return;
                }
            };
            if let Some(node) = scene.get_mut(group) {
                node.transform.set_euler(Vec3::new(0.0, FRAC_PI_2, 0.0));
            }
            for mesh in scene.leaf_meshes(group) {
                if let Some(node) = scene.get_mut(mesh) {
                    node.set_shadows(true, true);
                }
            }
        });

        let camera = PerspectiveCamera::new(70.0, ctx.viewport.aspect(), 0.1, 100.0)
            .with_position(Vec3::new(8.0, 10.0, -4.0));
        let controller = OrbitController::new()
            .with_distance_limits(5.0, 30.0)
            .with_polar_limits(0.0, FRAC_PI_2);

        Ok(DemoSetup::new(scene, camera)
            .with_controller(controller)
            .with_controls(controls)
            .with_animation(move |ctx| {
                for (key, id) in [("axesHelper", axes), ("lightHelper", gizmo)] {
                    if !ctx.changed(key) {
                        continue;
                    }
                    let show = ctx.controls.toggle(key).unwrap_or(false);
                    if let Some(node) = ctx.scene.get_mut(id) {
                        node.visible = show;
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
    fn sun_casts_and_helpers_start_hidden() {
        let stage = run(&DirectionalLightDemo, 1);
        let scene = &stage.frame_loop().unwrap().scene;
        let lights = scene.lights();
        assert_eq!(lights.len(), 2);
        assert!(lights.iter().any(|l| l.light.casts_shadow()));
        let helper = scene.find_by_name("lightHelper").unwrap();
        assert!(!scene.get(helper).unwrap().visible);
        assert_eq!(SceneInspector::summary(scene).lines, 2);
    }

    #[test]
    fn orbit_limits() {
        let stage = run(&DirectionalLightDemo, 5);
        let frame_loop = stage.frame_loop().unwrap();
        let controller = frame_loop.controller.as_ref().unwrap();
        assert_eq!((controller.min_distance, controller.max_distance), (5.0, 30.0));
        let d = frame_loop.camera.position.length();
        assert!((5.0..=30.0).contains(&d));
    }
}
