//! Rendering Adapter: renderer-agnostic interface.
//!
//! # Invariants
//! - A renderer reads the scene and camera; it never mutates either.
//! - One `render` call draws exactly one frame.
//! - `resize` is the only way a renderer learns about the viewport.

mod camera;
mod orbit;
mod renderer;

pub use camera::PerspectiveCamera;
pub use orbit::OrbitController;
pub use renderer::{DebugTextRenderer, Renderer};
