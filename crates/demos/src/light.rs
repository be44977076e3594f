use glam::Vec3;
use vitrine_common::Color;
use vitrine_render::{OrbitController, PerspectiveCamera};
use vitrine_runtime::{Demo, DemoContext, DemoError, DemoSetup};
use vitrine_scene::Scene;

/// Empty lighting study: a camera orbiting nothing over a slate background.
pub struct LightDemo;

impl Demo for LightDemo {
    fn name(&self) -> &'static str {
        "light"
    }

    fn title(&self) -> &'static str {
        "Light (empty stage)"
    }

    fn build(&self, ctx: &mut DemoContext) -> Result<DemoSetup, DemoError> {
        let mut scene = Scene::new();
        scene.background = Color::from_hex(0xe2e8f0);
        let camera = PerspectiveCamera::new(75.0, ctx.viewport.aspect(), 0.1, 1000.0)
            .with_position(Vec3::new(3.0, 3.0, 3.0));
        Ok(DemoSetup::new(scene, camera).with_controller(OrbitController::damped()))
    }
}
