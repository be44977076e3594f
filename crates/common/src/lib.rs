//! Shared value types: transforms, colors, viewport sizes.

mod color;
mod types;

pub use color::{Color, ColorParseError};
pub use types::{Transform, Viewport, look_rotation};
