//! Camera Module
//!
//! Orbit, auto-orbit and first-person cameras plus the mode controller that
//! composes them with build mode. This module is window-system agnostic - it
//! only deals with camera state and math.

pub mod auto_orbit;
pub mod controller;
pub mod first_person;
pub mod orbit;
pub mod raycast;

pub use auto_orbit::{AutoOrbit, AutoOrbitConfig};
pub use controller::{CameraConfig, CameraMode, CameraModeController};
pub use first_person::{FirstPersonWalker, WalkConfig};
pub use orbit::{OrbitCamera, OrbitConfig, OrbitDrag};
pub use raycast::{Ray, Viewport, screen_to_ray};
