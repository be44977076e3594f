//! The gallery. Each page is a [`Demo`] that builds its own scene, camera,
//! controls and per-frame behavior; pages share nothing at runtime.

mod ambient_light;
mod basic;
mod cube;
mod directional_light;
mod dominos;
mod gltf_house;
mod light;
mod points;
mod spot_light;
mod text;

pub use ambient_light::AmbientLightDemo;
pub use basic::BasicDemo;
pub use cube::CubeDemo;
pub use directional_light::DirectionalLightDemo;
pub use dominos::{DominosDemo, domino_spiral};
pub use gltf_house::GltfDemo;
pub use light::LightDemo;
pub use points::PointsDemo;
pub use spot_light::SpotLightDemo;
pub use text::TextDemo;

use vitrine_runtime::{Demo, DemoError};

/// Every page, in gallery order.
pub fn all() -> Vec<Box<dyn Demo>> {
    vec![
        Box::new(CubeDemo),
        Box::new(BasicDemo),
        Box::new(DominosDemo),
        Box::new(TextDemo),
        Box::new(AmbientLightDemo),
        Box::new(DirectionalLightDemo),
        Box::new(SpotLightDemo),
        Box::new(PointsDemo),
        Box::new(GltfDemo),
        Box::new(LightDemo),
    ]
}

pub fn names() -> Vec<&'static str> {
    all().iter().map(|d| d.name()).collect()
}

pub fn find(name: &str) -> Result<Box<dyn Demo>, DemoError> {
    all()
        .into_iter()
        .find(|d| d.name() == name)
        .ok_or_else(|| DemoError::Unknown(name.to_string()))
}

#[cfg(test)]
pub(crate) mod testing {
    use vitrine_common::Viewport;
    use vitrine_render::DebugTextRenderer;
    use vitrine_runtime::{Demo, Stage};

    /// Mount `demo` against an empty assets directory and run a few frames.
    pub(crate) fn run(demo: &dyn Demo, frames: u32) -> Stage {
        let dir = tempfile::tempdir().unwrap();
        let mut stage = Stage::new(dir.path(), Viewport::new(800, 600));
        stage.mount(demo).unwrap();
        stage.finish_loads();
        let mut renderer = DebugTextRenderer::new();
        for i in 0..frames {
            stage.on_refresh(i as f64 * 16.0, &mut renderer);
        }
        stage
    }
}
