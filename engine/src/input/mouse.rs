//! Pointer Input Module
//!
//! Mouse buttons, pointer positions and the event types the viewer feeds into
//! the [`InputRouter`](super::router::InputRouter). Positions are physical
//! pixels with the origin at the top-left of the render surface.

/// Mouse button identifiers, independent of windowing system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    /// Additional mouse buttons (button 4, 5, etc.)
    Other(u16),
}

/// State of the three tracked mouse buttons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonState {
    pub left: bool,
    pub middle: bool,
    pub right: bool,
}

impl ButtonState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, button: MouseButton, pressed: bool) {
        match button {
            MouseButton::Left => self.left = pressed,
            MouseButton::Middle => self.middle = pressed,
            MouseButton::Right => self.right = pressed,
            MouseButton::Other(_) => {}
        }
    }

    pub fn is_pressed(&self, button: MouseButton) -> bool {
        match button {
            MouseButton::Left => self.left,
            MouseButton::Middle => self.middle,
            MouseButton::Right => self.right,
            MouseButton::Other(_) => false,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Surface pixel position.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Scroll wheel delta, can be line-based or pixel-based.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScrollDelta {
    /// Horizontal scroll (positive = right)
    pub x: f32,
    /// Vertical scroll (positive = up/forward)
    pub y: f32,
}

impl ScrollDelta {
    /// Create from line delta (common for mouse wheels).
    pub fn from_lines(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Create from pixel delta (common for trackpads).
    /// Normalizes by dividing by 100 to get approximate line equivalents.
    pub fn from_pixels(x: f64, y: f64) -> Self {
        Self {
            x: (x / 100.0) as f32,
            y: (y / 100.0) as f32,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

/// One pointer event on the render surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Moved(Position),
    Pressed { button: MouseButton, at: Position },
    Released { button: MouseButton, at: Position },
    Scrolled(ScrollDelta),
    /// Raw device motion, used for first-person look while the cursor is grabbed
    Motion { dx: f32, dy: f32 },
}

/// What had keyboard focus when a key event fired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyTarget {
    /// The 3D surface or a non-editable UI element
    #[default]
    Surface,
    /// A text-input-like element; the event belongs to it
    TextInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: super::KeyCode,
    pub pressed: bool,
    /// Auto-repeat of a held key
    pub repeat: bool,
    pub target: KeyTarget,
}

impl KeyEvent {
    pub fn press(key: super::KeyCode) -> Self {
        Self {
            key,
            pressed: true,
            repeat: false,
            target: KeyTarget::Surface,
        }
    }

    pub fn release(key: super::KeyCode) -> Self {
        Self {
            pressed: false,
            ..Self::press(key)
        }
    }

    pub fn in_text_input(mut self) -> Self {
        self.target = KeyTarget::TextInput;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extra_buttons_not_tracked() {
        let mut buttons = ButtonState::new();
        buttons.set(MouseButton::Right, true);
        buttons.set(MouseButton::Other(4), true);
        assert!(buttons.is_pressed(MouseButton::Right));
        assert!(!buttons.is_pressed(MouseButton::Other(4)));
        buttons.reset();
        assert_eq!(buttons, ButtonState::default());
    }

    #[test]
    fn test_scroll_delta() {
        let scroll = ScrollDelta::from_lines(0.0, 2.0);
        assert!(!scroll.is_zero());
        let scroll_px = ScrollDelta::from_pixels(0.0, 200.0);
        assert_eq!(scroll_px.y, 2.0);
    }

    #[test]
    fn test_key_event_builders() {
        let e = KeyEvent::release(super::super::KeyCode::E).in_text_input();
        assert!(!e.pressed);
        assert_eq!(e.target, KeyTarget::TextInput);
    }
}
