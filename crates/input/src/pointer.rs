use crate::action::OrbitAction;
use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// A raw pointer event from the host window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(PointerButton),
    Up(PointerButton),
    /// Absolute cursor position in physical pixels.
    Moved(Vec2),
    /// Wheel delta in lines; positive scrolls toward the user.
    Wheel(f32),
}

/// Accumulates pointer events into orbit actions between ticks.
///
/// Primary drag rotates, secondary drag pans, middle drag and the wheel dolly.
#[derive(Debug, Default)]
pub struct PointerInput {
    cursor: Option<Vec2>,
    dragging: Option<PointerButton>,
    rotate: Vec2,
    pan: Vec2,
    dolly: f32,
}

/// Pixels of vertical middle-drag that count as one wheel step.
const DOLLY_PIXELS_PER_STEP: f32 = 20.0;

impl PointerInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Down(button) => {
                if self.dragging.is_none() {
                    self.dragging = Some(button);
                }
            }
            PointerEvent::Up(button) => {
                if self.dragging == Some(button) {
                    self.dragging = None;
                }
            }
            PointerEvent::Moved(pos) => {
                if let (Some(button), Some(prev)) = (self.dragging, self.cursor) {
                    let delta = pos - prev;
                    match button {
                        PointerButton::Primary => self.rotate += delta,
                        PointerButton::Secondary => self.pan += delta,
                        PointerButton::Middle => self.dolly += delta.y / DOLLY_PIXELS_PER_STEP,
                    }
                }
                self.cursor = Some(pos);
            }
            PointerEvent::Wheel(lines) => self.dolly += lines,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging.is_some()
    }

    /// Everything accumulated since the last drain, then reset.
    pub fn drain(&mut self) -> Vec<OrbitAction> {
        let mut out = Vec::new();
        if self.rotate != Vec2::ZERO {
            out.push(OrbitAction::Rotate(std::mem::take(&mut self.rotate)));
        }
        if self.pan != Vec2::ZERO {
            out.push(OrbitAction::Pan(std::mem::take(&mut self.pan)));
        }
        if self.dolly != 0.0 {
            out.push(OrbitAction::Dolly(std::mem::take(&mut self.dolly)));
        }
        if !out.is_empty() {
            tracing::trace!(actions = out.len(), "drained pointer input");
        }
        out
    }
}
