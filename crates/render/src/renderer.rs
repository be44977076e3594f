use crate::camera::PerspectiveCamera;
use std::fmt::Write;
use vitrine_common::Viewport;
use vitrine_scene::Scene;

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// The renderer reads scene state and a camera, then produces output.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Adopt a new drawing-surface size.
    fn resize(&mut self, viewport: Viewport);

    /// Render one frame from the given scene and camera.
    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> Self::Output;
}

/// Produces a human-readable dump of what a frame would draw.
///
/// Used by the CLI and by tests that count frames.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    viewport: Viewport,
    frames: u64,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn resize(&mut self, viewport: Viewport) {
        tracing::debug!(width = viewport.width, height = viewport.height, "debug renderer resized");
        self.viewport = viewport;
    }

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> String {
        self.frames += 1;
        let draws = scene.draw_list();
        let lights = scene.lights();
        let p = camera.position;
        let f = camera.forward();

        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== Frame {} ({}x{}) ===",
            self.frames, self.viewport.width, self.viewport.height
        );
        let _ = writeln!(
            out,
            "Nodes: {}  Draws: {}  Lights: {}",
            scene.node_count(),
            draws.len(),
            lights.len()
        );
        let _ = writeln!(
            out,
            "Camera: pos=({:.2}, {:.2}, {:.2}) dir=({:.2}, {:.2}, {:.2}) fov={:.0}",
            p.x, p.y, p.z, f.x, f.y, f.z, camera.fov_degrees
        );
        for item in &draws {
            let name = scene.get(item.node).map(|n| n.name.as_str()).unwrap_or("?");
            let w = item.world.w_axis;
            let _ = writeln!(out, "  {name} pos=({:.2}, {:.2}, {:.2})", w.x, w.y, w.z);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use vitrine_scene::{Geometry, Material, Node};

    #[test]
    fn debug_renderer_empty_scene() {
        let scene = Scene::new();
        let mut renderer = DebugTextRenderer::new();
        let output = renderer.render(&scene, &PerspectiveCamera::default());

        assert!(output.contains("Frame 1"));
        assert!(output.contains("Draws: 0"));
        assert_eq!(renderer.frames(), 1);
    }

    #[test]
    fn debug_renderer_lists_meshes() {
        let mut scene = Scene::new();
        let geometry = scene.add_geometry(Geometry::cuboid(1.0, 1.0, 1.0));
        let root = scene.root();
        scene
            .add_child(
                root,
                Node::mesh("cube", geometry, Material::basic(0x00ff00u32))
                    .with_position(Vec3::new(1.0, 2.0, 3.0)),
            )
            .unwrap();

        let mut renderer = DebugTextRenderer::new();
        renderer.resize(Viewport::new(640, 480));
        let output = renderer.render(&scene, &PerspectiveCamera::default());

        assert!(output.contains("640x480"));
        assert!(output.contains("Draws: 1"));
        assert!(output.contains("cube pos=(1.00, 2.00, 3.00)"));
    }
}
