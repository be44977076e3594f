//! Asset pipeline: parse files off the loop thread, splice results in on it.
//!
//! Parsers are plain functions from bytes or paths to owned data; nothing
//! here touches a [`Scene`](vitrine_scene::Scene) except the completion
//! callbacks the [`AssetLoader`] runs from `poll`.

mod font;
mod gltf_scene;
mod loader;
mod ply;
mod text;
mod texture;

pub use font::{Font, Glyph, Shape, Typeface};
pub use gltf_scene::{ImportedScene, import_gltf};
pub use loader::AssetLoader;
pub use ply::{parse_ply, read_ply};
pub use text::{TextOptions, extrude_shapes, text_geometry};
pub use texture::{decode_texture, read_texture};

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image decode error: {0}")]
    Image(#[from] image::ImageError),
    #[error("glTF error: {0}")]
    Gltf(#[from] gltf::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("PLY error: {0}")]
    Ply(String),
    #[error("invalid mesh: {0}")]
    Mesh(String),
    #[error("font error: {0}")]
    Font(String),
    #[error("triangulation failed: {0}")]
    Triangulation(String),
    #[error("loader worker panicked: {0}")]
    Panicked(String),
}
