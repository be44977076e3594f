//! Developer Tooling: frame stats, debug controls, scene inspector.
//!
//! # Invariants
//! - Tools only read the scene; demos apply control changes themselves.

mod controls;
mod inspector;
mod stats;

pub use controls::{Control, ControlError, ControlKind, ControlPanel, ControlValue};
pub use inspector::{NodeInfo, SceneInspector, SceneSummary};
pub use stats::FrameStats;
