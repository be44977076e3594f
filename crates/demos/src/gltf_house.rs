use glam::Vec3;
use vitrine_common::Color;
use vitrine_render::{OrbitController, PerspectiveCamera};
use vitrine_runtime::{Demo, DemoContext, DemoError, DemoSetup};
use vitrine_scene::{NodeId, Scene};

const MODEL: &str = "models/sea_house/scene.gltf";
const MODEL_SCALE: f32 = 0.2;

/// Scale an imported model and force depth writes on every mesh under it.
fn prepare_model(scene: &mut Scene, group: NodeId) {
    if let Some(node) = scene.get_mut(group) {
        node.transform.scale = Vec3::splat(MODEL_SCALE);
    }
    for mesh in scene.leaf_meshes(group) {
        if let Some(material) = scene.get_mut(mesh).and_then(|n| n.material_mut()) {
            material.depth_write = true;
        }
    }
}

/// The sea house model on a white background.
pub struct GltfDemo;

impl Demo for GltfDemo {
    fn name(&self) -> &'static str {
        "gltf"
    }

    fn title(&self) -> &'static str {
        "glTF model"
    }

    fn build(&self, ctx: &mut DemoContext) -> Result<DemoSetup, DemoError> {
        let mut scene = Scene::new();
        scene.background = Color::WHITE;

        ctx.loader.load_gltf(MODEL, |scene, imported| {
            let root = scene.root();
            match imported.instantiate(scene, root) {
                Ok(group) => prepare_model(scene, group),
                Err(e) => tracing::warn!(error = %e, "could not add sea house"),
            }
        });

        let camera = PerspectiveCamera::new(75.0, ctx.viewport.aspect(), 0.1, 1000.0)
            .with_position(Vec3::new(-60.0, 40.0, -20.0));
        Ok(DemoSetup::new(scene, camera).with_controller(OrbitController::damped()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitrine_scene::{Geometry, Material, Node};

    #[test]
    fn model_is_scaled_and_writes_depth() {
        let mut scene = Scene::new();
        let cube = scene.add_geometry(Geometry::cuboid(1.0, 1.0, 1.0));
        let group = scene.add(Node::group("sea_house"));
        let inner = scene.add_child(group, Node::group("roof")).unwrap();
        let mut glass = Material::standard(Color::WHITE);
        glass.depth_write = false;
        let mesh = scene.add_child(inner, Node::mesh("glass", cube, glass)).unwrap();

        prepare_model(&mut scene, group);
        assert_eq!(scene.get(group).unwrap().transform.scale, Vec3::splat(0.2));
        assert!(scene.get(mesh).unwrap().material().unwrap().depth_write);
    }
}
