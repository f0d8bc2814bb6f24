//! Keyboard Input Module
//!
//! Window-system independent key codes and the held-key state used by the
//! first-person walker. The viewer converts winit key codes into [`KeyCode`].

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Generic key codes, independent of the windowing system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum KeyCode {
    // Movement keys
    W,
    A,
    S,
    D,
    Space,
    ShiftLeft,
    ShiftRight,

    // Arrow keys
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,

    // Letter keys used by bindings
    B,
    C,
    E,
    F,
    G,
    H,
    L,
    M,
    O,
    P,
    Q,
    R,
    T,
    V,
    X,

    // Function keys
    F1,
    F2,
    F3,
    F4,
    F5,
    F11,

    // Number keys
    Digit1,
    Digit2,
    Digit3,
    Digit4,

    // Control keys
    Escape,
    Enter,
    Tab,
    Backspace,
    Delete,

    /// Catch-all for unhandled keys
    Unknown,
}

/// Held walking keys, sampled once per tick by the first-person walker.
/// Arrow keys mirror WASD.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MovementKeys {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    /// Jump
    pub up: bool,
    pub sprint: bool,
}

impl MovementKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a press or release. False when `key` is not a walking key.
    pub fn handle_key(&mut self, key: KeyCode, pressed: bool) -> bool {
        let slot = match key {
            KeyCode::W | KeyCode::ArrowUp => &mut self.forward,
            KeyCode::S | KeyCode::ArrowDown => &mut self.backward,
            KeyCode::A | KeyCode::ArrowLeft => &mut self.left,
            KeyCode::D | KeyCode::ArrowRight => &mut self.right,
            KeyCode::Space => &mut self.up,
            KeyCode::ShiftLeft | KeyCode::ShiftRight => &mut self.sprint,
            _ => return false,
        };
        *slot = pressed;
        true
    }

    /// Any key that moves the walker (sprint alone does not).
    pub fn any_pressed(&self) -> bool {
        self.forward || self.backward || self.left || self.right || self.up
    }

    /// Walk intent in view space: `x` strafes right, `y` goes forward.
    /// Opposing keys cancel. Not normalized.
    pub fn direction(&self) -> Vec2 {
        let axis = |pos: bool, neg: bool| f32::from(u8::from(pos)) - f32::from(u8::from(neg));
        Vec2::new(axis(self.right, self.left), axis(self.forward, self.backward))
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
