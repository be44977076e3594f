//! Physics: a rapier world whose dynamic bodies drive scene nodes.
//!
//! # Invariants
//! - Body/node pairs live in one list owned by the world; no back-pointers.
//! - After `sync`, every tracked node's transform equals its body's pose.
//! - Colliders are sized once, at attach time.

mod world;

pub use world::{BodyHandle, BodyKind, BodyLink, PhysicsError, PhysicsWorld};
