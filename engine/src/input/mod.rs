//! Input Module
//!
//! Window-system independent input handling. The viewer translates winit
//! events into [`PointerEvent`] and [`KeyEvent`]; the [`InputRouter`] turns
//! them into [`Command`]s for the scene.
//!
//! # Example
//!
//! ```rust,ignore
//! use yard_engine::input::{InputBindings, InputRouter, KeyCode, KeyEvent, RouteContext};
//!
//! let mut router = InputRouter::new(InputBindings::default());
//! let commands = router.route_key(KeyEvent::press(KeyCode::B), RouteContext::default());
//! ```

pub mod bindings;
pub mod keyboard;
pub mod mouse;
pub mod regions;
pub mod router;

pub use bindings::{InputAction, InputBindings};
pub use keyboard::{KeyCode, MovementKeys};
pub use mouse::{
    ButtonState, KeyEvent, KeyTarget, MouseButton, PointerEvent, Position, ScrollDelta,
};
pub use regions::{RegionProbe, RegionSet, ScreenRect, UiRegion};
pub use router::{Aim, Command, InputRouter, RouteContext};
