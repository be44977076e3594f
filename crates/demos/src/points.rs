use glam::Vec3;
use rand::Rng;
use vitrine_common::Color;
use vitrine_render::{OrbitController, PerspectiveCamera};
use vitrine_runtime::{Demo, DemoContext, DemoError, DemoSetup};
use vitrine_scene::{Geometry, Material, Node, Scene, ToneMapping, helpers};

/// 30 x 20 grid in the XY plane at quarter-unit spacing, each point a
/// random color. Colors are linear.
pub(crate) fn point_grid(rng: &mut impl Rng) -> Geometry {
    let mut positions = Vec::with_capacity(600);
    for x in -15..15 {
        for y in -10..10 {
            positions.push([x as f32 / 4.0, y as f32 / 4.0, 0.0]);
        }
    }
    let colors = positions
        .iter()
        .map(|_| Color::from_hex(rng.gen_range(0..0xffffff)).to_linear())
        .collect();
    Geometry::points(positions, Some(colors))
}

/// A colored point cloud with an axes helper.
pub struct PointsDemo;

impl Demo for PointsDemo {
    fn name(&self) -> &'static str {
        "points"
    }

    fn title(&self) -> &'static str {
        "Points"
    }

    fn build(&self, ctx: &mut DemoContext) -> Result<DemoSetup, DemoError> {
        let mut scene = Scene::new();
        scene.tone_mapping = ToneMapping::Aces { exposure: 1.0 };

        let axes = scene.add_geometry(helpers::axes(10.0));
        scene.add(Node::lines("axesHelper", axes));

        let grid = scene.add_geometry(point_grid(&mut rand::thread_rng()));
        scene.add(Node::points(
            "points",
            grid,
            Material::points(0.1).with_vertex_colors(),
        ));

        let camera = PerspectiveCamera::new(70.0, ctx.viewport.aspect(), 0.1, 1000.0)
            .with_position(Vec3::new(8.0, 10.0, -4.0));
        Ok(DemoSetup::new(scene, camera).with_controller(OrbitController::new()))
    }
}
