//! Runtime: the per-frame loop that keeps physics, animation and rendering
//! in step, and the stage that mounts one demo at a time.
//!
//! # Invariants
//! - Each tick draws exactly once, after physics has been synced.
//! - Nothing is drawn once [`Stage::teardown`] has returned.
//! - Load completions only ever reach the scene of the demo that queued them.

mod demo;
mod frame_loop;
mod stage;

pub use demo::{AnimateCtx, AnimateFn, Demo, DemoContext, DemoError, DemoSetup};
pub use frame_loop::FrameLoop;
pub use stage::Stage;
