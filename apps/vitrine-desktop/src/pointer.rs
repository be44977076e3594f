use glam::Vec2;
use vitrine_input::{PointerButton, PointerEvent};
use winit::event::{ElementState, MouseButton, MouseScrollDelta};

/// Trackpad pixels that count as one wheel line.
const PIXELS_PER_LINE: f32 = 40.0;

pub fn button(state: ElementState, button: MouseButton) -> Option<PointerEvent> {
    let button = match button {
        MouseButton::Left => PointerButton::Primary,
        MouseButton::Right => PointerButton::Secondary,
        MouseButton::Middle => PointerButton::Middle,
        _ => return None,
    };
    Some(match state {
        ElementState::Pressed => PointerEvent::Down(button),
        ElementState::Released => PointerEvent::Up(button),
    })
}

pub fn moved(x: f64, y: f64) -> PointerEvent {
    PointerEvent::Moved(Vec2::new(x as f32, y as f32))
}

/// winit reports scrolling away from the user as positive.
pub fn wheel(delta: MouseScrollDelta) -> PointerEvent {
    let lines = match delta {
        MouseScrollDelta::LineDelta(_, y) => y,
        MouseScrollDelta::PixelDelta(p) => p.y as f32 / PIXELS_PER_LINE,
    };
    PointerEvent::Wheel(-lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;

    #[test]
    fn buttons_map_to_orbit_buttons() {
        assert_eq!(
            button(ElementState::Pressed, MouseButton::Left),
            Some(PointerEvent::Down(PointerButton::Primary))
        );
        assert_eq!(
            button(ElementState::Released, MouseButton::Right),
            Some(PointerEvent::Up(PointerButton::Secondary))
        );
        assert_eq!(button(ElementState::Pressed, MouseButton::Back), None);
    }

    #[test]
    fn wheel_is_flipped() {
        assert_eq!(
            wheel(MouseScrollDelta::LineDelta(0.0, 1.0)),
            PointerEvent::Wheel(-1.0)
        );
        assert_eq!(
            wheel(MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, -80.0))),
            PointerEvent::Wheel(2.0)
        );
    }
}
