//! Pointer input: raw events in, orbit actions out.
//!
//! # Invariants
//! - Actions accumulate between ticks and are drained exactly once per tick.
//! - The camera controller consumes actions, never raw events.

pub mod action;
pub mod pointer;

pub use action::OrbitAction;
pub use pointer::{PointerButton, PointerEvent, PointerInput};
