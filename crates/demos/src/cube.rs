use glam::Vec3;
use vitrine_render::PerspectiveCamera;
use vitrine_runtime::{Demo, DemoContext, DemoError, DemoSetup};
use vitrine_scene::{Geometry, Material, Node, Scene};

/// Green unlit cube spinning on X and Y.
pub struct CubeDemo;

const SPIN_PER_TICK: f32 = 0.01;

impl Demo for CubeDemo {
    fn name(&self) -> &'static str {
        "cube"
    }

    fn title(&self) -> &'static str {
        "Spinning cube"
    }

    fn build(&self, ctx: &mut DemoContext) -> Result<DemoSetup, DemoError> {
        let mut scene = Scene::new();
        let geometry = scene.add_geometry(Geometry::cuboid(1.0, 1.0, 1.0));
        let cube = scene.add(Node::mesh("cube", geometry, Material::basic(0x00ff00u32)));

        let camera = PerspectiveCamera::new(75.0, ctx.viewport.aspect(), 0.1, 1000.0)
            .with_position(Vec3::new(0.0, 0.0, 5.0));

        let mut angles = Vec3::ZERO;
        Ok(DemoSetup::new(scene, camera).with_animation(move |ctx| {
            angles += Vec3::new(SPIN_PER_TICK, SPIN_PER_TICK, 0.0);
            if let Some(node) = ctx.scene.get_mut(cube) {
                node.transform.set_euler(angles);
            }
        }))
    }
}
