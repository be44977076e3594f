use glam::Vec3;
use vitrine_common::Color;
use vitrine_render::{OrbitController, PerspectiveCamera};
use vitrine_runtime::{Demo, DemoContext, DemoError, DemoSetup};
use vitrine_scene::{Light, Node, Scene, helpers};
use vitrine_tools::ControlPanel;

pub(crate) const WATERFALL: &str = "gltf/waterfall/scene.gltf";

/// The waterfall model under a single ambient light.
pub struct AmbientLightDemo;

impl Demo for AmbientLightDemo {
    fn name(&self) -> &'static str {
        "ambient-light"
    }

    fn title(&self) -> &'static str {
        "Ambient light"
    }

    fn build(&self, ctx: &mut DemoContext) -> Result<DemoSetup, DemoError> {
        let mut controls = ControlPanel::new();
        controls.add_toggle("axesHelper", false).in_folder("helpers");
        controls.add_toggle("ambientLight", true).in_folder("ambientLight");
        controls
            .add_number("intensity", 10.0, 0.0, 50.0, 0.1)
            .in_folder("ambientLight");
        controls.add_color("color", 0x8f8f8fu32).in_folder("ambientLight");

        let mut scene = Scene::new();
        scene.background = Color::from_hex(0xe2e8f0);

        let axes = scene.add_geometry(helpers::axes(10.0));
        let axes = scene.add(Node::lines("axesHelper", axes).hidden());
        let ambient = scene.add(Node::light(
            "ambientLight",
            Light::ambient(0x8f8f8fu32, 10.0),
        ));

        ctx.loader.load_gltf(WATERFALL, |scene, imported| {
            let root = scene.root();
            if let Err(e) = imported.instantiate(scene, root) {
                tracing::warn!(error = %e, "could not add waterfall");
            }
        });

        let camera = PerspectiveCamera::new(75.0, ctx.viewport.aspect(), 0.1, 1000.0)
            .with_position(Vec3::new(8.0, 8.0, 8.0));

        Ok(DemoSetup::new(scene, camera)
            .with_controller(OrbitController::damped())
            .with_controls(controls)
            .with_animation(move |ctx| {
                if ctx.changed("axesHelper") {
                    let show = ctx.controls.toggle("axesHelper").unwrap_or(false);
                    if let Some(node) = ctx.scene.get_mut(axes) {
                        node.visible = show;
                    }
                }
                let toggled = ctx.changed("ambientLight");
                let dimmed = ctx.changed("intensity");
                let recolored = ctx.changed("color");
                let controls = ctx.controls;
                let Some(node) = ctx.scene.get_mut(ambient) else {
                    return;
                };
                if toggled {
                    node.visible = controls.toggle("ambientLight").unwrap_or(true);
                }
                let Some(light) = node.as_light_mut() else {
                    return;
                };
                if dimmed {
                    light.intensity = controls.number("intensity").unwrap_or(light.intensity);
                }
                if recolored {
                    light.color = controls.color("color").unwrap_or(light.color);
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
    fn controls_toggle_and_recolor() {
        let mut stage = run(&AmbientLightDemo, 1);
        let frame_loop = stage.frame_loop_mut().unwrap();
        let controls = &mut frame_loop.controls;
        controls.set_toggle("axesHelper", true).unwrap();
        controls.set_toggle("ambientLight", false).unwrap();
        controls.set_number("intensity", 2.5).unwrap();
        controls.set_color("color", 0xff0000u32).unwrap();
        frame_loop.tick(16.0, &mut DebugTextRenderer::new());

        let scene = &frame_loop.scene;
        let axes = scene.find_by_name("axesHelper").unwrap();
        assert!(scene.get(axes).unwrap().visible);
        let ambient = scene.get(scene.find_by_name("ambientLight").unwrap()).unwrap();
        assert!(!ambient.visible);
        let light = ambient.as_light().unwrap();
        assert_eq!(light.intensity, 2.5);
        assert_eq!(light.color.to_hex(), 0xff0000);
        assert_eq!(scene.lights().len(), 0);
    }

    #[test]
    fn folders() {
        let stage = run(&AmbientLightDemo, 0);
        let controls = &stage.frame_loop().unwrap().controls;
        assert_eq!(controls.folders(), vec!["helpers", "ambientLight"]);
    }
}
