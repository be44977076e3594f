//! Scene graph: node arena, geometry and texture arenas, materials, lights.
//!
//! # Invariants
//! - Every node except the root has exactly one parent.
//! - Children are kept in insertion order.
//! - Geometries and textures are shared by handle; detaching nodes never frees them.

mod geometry;
mod graph;
pub mod helpers;
mod light;
mod material;

pub use geometry::{Geometry, GeometryShape, MeshData};
pub use graph::{
    DrawItem, GeometryId, LightItem, Node, NodeId, NodePayload, Scene, SceneError, TextureId,
};
pub use light::{Fog, Light, LightKind, Shadow, ToneMapping};
pub use material::{Material, Shading, Side, Texture, TextureImage};
