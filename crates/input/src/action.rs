use glam::Vec2;

/// A camera action produced from pointer input.
///
/// Deltas are in physical pixels; the controller scales them by the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrbitAction {
    /// Orbit around the target by a drag delta.
    Rotate(Vec2),
    /// Slide the target in the view plane by a drag delta.
    Pan(Vec2),
    /// Move toward (negative) or away from (positive) the target, in wheel steps.
    Dolly(f32),
}

impl OrbitAction {
    /// Merge two actions of the same kind. Returns `None` for mismatched kinds.
    pub fn merge(self, other: OrbitAction) -> Option<OrbitAction> {
        match (self, other) {
            (Self::Rotate(a), Self::Rotate(b)) => Some(Self::Rotate(a + b)),
            (Self::Pan(a), Self::Pan(b)) => Some(Self::Pan(a + b)),
            (Self::Dolly(a), Self::Dolly(b)) => Some(Self::Dolly(a + b)),
            _ => None,
        }
    }
}
