//! wgpu render backend for vitrine scenes.
//!
//! Draws lit and unlit meshes, line helpers and point clouds with fog and
//! tone mapping. Shadows and projected spot textures are not rasterized.
//!
//! # Invariants
//! - Rendering never mutates the scene.
//! - GPU copies follow geometry and texture revisions; stale handles are evicted.
//! - A lost or outdated surface skips the frame and reconfigures.

mod gpu;
mod shaders;
mod surface;
mod uniforms;

pub use gpu::WgpuRenderer;
pub use surface::{RenderError, SurfaceFrame, SurfaceRenderer};
pub use uniforms::MAX_LIGHTS;
