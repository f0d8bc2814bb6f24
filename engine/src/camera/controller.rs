//! Camera Mode Controller
//!
//! State machine over the three camera modes and their composition with
//! build mode:
//!
//! - **Orbit**: user drags/zooms around a target (default)
//! - **OrbitAuto**: system-driven constant-rate fly-around
//! - **FirstPerson**: walking camera with gravity and step limits
//!
//! Orbit input is gated by a single rule, re-evaluated on every transition:
//! `orbit.enabled = !first_person && !build_active`. Build never touches the
//! walker, so walking while building is a valid combined state.
//!
//! Mode-enable calls made before the render surface exists are ignored.
//! This is window-system agnostic - it only manages camera state and math.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use super::auto_orbit::{AutoOrbit, AutoOrbitConfig};
use super::first_person::{FirstPersonWalker, WalkConfig};
use super::orbit::{OrbitCamera, OrbitConfig, OrbitDrag};
use super::raycast::{Ray, Viewport, screen_to_ray};
use crate::input::MovementKeys;
use crate::physics::GroundProbe;
use crate::world::YardBounds;

/// Active camera mode.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum CameraMode {
    #[default]
    Orbit,
    OrbitAuto,
    FirstPerson,
}

/// All camera tuning in one place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub orbit: OrbitConfig,
    pub auto_orbit: AutoOrbitConfig,
    pub walk: WalkConfig,
    /// Vertical field of view in degrees
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    /// Lowest allowed orbit eye height above ground
    pub min_eye_height: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            orbit: OrbitConfig::default(),
            auto_orbit: AutoOrbitConfig::default(),
            walk: WalkConfig::default(),
            fov: 55.0,
            near: 0.1,
            far: 2000.0,
            min_eye_height: 2.0,
        }
    }
}

/// Owns all camera state. Other subsystems only see it through methods.
#[derive(Debug, Clone)]
pub struct CameraModeController {
    config: CameraConfig,
    bounds: YardBounds,
    viewport: Viewport,
    surface_ready: bool,
    mode: CameraMode,
    build_active: bool,
    orbit: OrbitCamera,
    auto: AutoOrbit,
    walker: FirstPersonWalker,
    // Pose resolved at the last update, after clamping
    eye: Vec3,
    look_at: Vec3,
}

impl CameraModeController {
    pub fn new(config: CameraConfig, bounds: YardBounds, viewport: Viewport) -> Self {
        let target = bounds.center().with_y(0.0);
        let orbit = OrbitCamera::new(config.orbit.clone(), target);
        let auto = AutoOrbit::new(config.auto_orbit.clone());
        let walker = FirstPersonWalker::new(config.walk.clone());
        let mut controller = Self {
            config,
            bounds,
            viewport,
            surface_ready: false,
            mode: CameraMode::Orbit,
            build_active: false,
            orbit,
            auto,
            walker,
            eye: Vec3::ZERO,
            look_at: Vec3::ZERO,
        };
        controller.resolve_pose();
        controller
    }

    // ========================================================================
    // SURFACE LIFECYCLE
    // ========================================================================

    pub fn mark_surface_ready(&mut self) {
        self.surface_ready = true;
    }

    /// Surface gone (teardown); later mode calls become no-ops again.
    pub fn mark_surface_lost(&mut self) {
        self.surface_ready = false;
        self.orbit.cancel_drag();
    }

    pub fn is_surface_ready(&self) -> bool {
        self.surface_ready
    }

    // ========================================================================
    // MODE TRANSITIONS
    // ========================================================================

    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    pub fn is_first_person(&self) -> bool {
        self.mode == CameraMode::FirstPerson
    }

    pub fn is_auto_orbit(&self) -> bool {
        self.mode == CameraMode::OrbitAuto
    }

    pub fn orbit_enabled(&self) -> bool {
        self.orbit.enabled
    }

    pub fn build_active(&self) -> bool {
        self.build_active
    }

    fn sync_orbit_enabled(&mut self) {
        let enabled = !self.is_first_person() && !self.build_active;
        if !enabled {
            self.orbit.cancel_drag();
        }
        self.orbit.enabled = enabled;
    }

    /// Enter or leave first-person mode. Returns false when ignored.
    pub fn set_first_person(&mut self, active: bool) -> bool {
        if !self.surface_ready {
            log::debug!("Camera: first-person toggle before surface ready ignored");
            return false;
        }
        if active == self.is_first_person() {
            return true;
        }

        if active {
            // Start walking on the ground under the current look target
            let start = self.bounds.clamp_xz(self.look_at).with_y(0.0);
            self.walker.place(start, self.look_at - self.eye);
            self.mode = CameraMode::FirstPerson;
        } else {
            // Pull back and up behind where the walker was looking
            let distance = self.config.orbit.distance;
            let eye = self.walker.position - self.walker.flat_forward() * distance * 0.7
                + Vec3::Y * distance * 0.6;
            self.orbit.focus(self.bounds.clamp(self.walker.position));
            self.orbit.set_eye(eye);
            self.mode = CameraMode::Orbit;
        }
        self.sync_orbit_enabled();
        log::info!("Camera mode: {:?}", self.mode);
        true
    }

    pub fn toggle_first_person(&mut self) -> bool {
        let next = !self.is_first_person();
        self.set_first_person(next)
    }

    /// Enter or leave auto-orbit. Entering forces first-person off.
    pub fn set_auto_orbit(&mut self, active: bool) -> bool {
        if !self.surface_ready {
            log::debug!("Camera: auto-orbit toggle before surface ready ignored");
            return false;
        }
        if active == self.is_auto_orbit() {
            return true;
        }

        if active {
            if self.is_first_person() {
                self.set_first_person(false);
            }
            self.auto.start(self.orbit.target, self.orbit.azimuth);
            self.mode = CameraMode::OrbitAuto;
        } else {
            // Hand the current pose back to the user-driven orbit
            self.orbit.focus(self.auto.target);
            self.orbit.set_eye(self.eye);
            self.mode = CameraMode::Orbit;
        }
        self.sync_orbit_enabled();
        log::info!("Camera mode: {:?}", self.mode);
        true
    }

    pub fn toggle_auto_orbit(&mut self) -> bool {
        let next = !self.is_auto_orbit();
        self.set_auto_orbit(next)
    }

    /// Mirror of the build bridge's active flag. Only gates orbit input.
    pub fn set_build_active(&mut self, active: bool) {
        self.build_active = active;
        self.sync_orbit_enabled();
    }

    /// Any explicit user camera action ends auto-orbit.
    fn user_camera_action(&mut self) {
        if self.is_auto_orbit() {
            self.set_auto_orbit(false);
        }
    }

    // ========================================================================
    // USER INPUT
    // ========================================================================

    /// Press or release an orbit drag button. Returns true when consumed.
    pub fn drag(&mut self, drag: OrbitDrag, pressed: bool) -> bool {
        if pressed {
            self.user_camera_action();
        }
        if self.is_first_person() {
            return false;
        }
        self.orbit.handle_mouse_drag(drag, pressed)
    }

    /// Pointer moved to `(x, y)`. Returns true when the camera moved.
    pub fn pointer_moved(&mut self, x: f32, y: f32, dt_hint: f32) -> bool {
        self.orbit.handle_mouse_move(x, y, dt_hint)
    }

    /// Raw mouse delta for first-person look.
    pub fn look(&mut self, dx: f32, dy: f32) -> bool {
        if !self.is_first_person() {
            return false;
        }
        self.walker.apply_mouse_delta(dx, dy);
        true
    }

    pub fn zoom(&mut self, delta: f32) -> bool {
        self.user_camera_action();
        if self.is_first_person() {
            return false;
        }
        self.orbit.handle_scroll(delta)
    }

    /// Point the orbit camera at a world position (e.g. a selected container).
    pub fn focus(&mut self, target: Vec3) {
        self.user_camera_action();
        if !self.is_first_person() {
            self.orbit.focus(self.bounds.clamp(target));
        }
    }

    // ========================================================================
    // PER-FRAME
    // ========================================================================

    /// Advance the active mode and clamp the result into the yard bounds.
    pub fn update(&mut self, dt: f32, keys: &MovementKeys, ground: &dyn GroundProbe) {
        match self.mode {
            CameraMode::Orbit => {
                self.orbit
                    .update(dt, &self.bounds, self.config.min_eye_height);
            }
            CameraMode::OrbitAuto => {
                self.auto.update(dt);
                self.auto.target = self.bounds.clamp(self.auto.target);
            }
            CameraMode::FirstPerson => {
                self.walker.update(dt, keys, ground, &self.bounds);
            }
        }
        self.resolve_pose();
    }

    fn resolve_pose(&mut self) {
        let (eye, look_at) = match self.mode {
            CameraMode::Orbit => (self.clamp_eye(self.orbit.eye_position()), self.orbit.target),
            CameraMode::OrbitAuto => (self.clamp_eye(self.auto.eye_position()), self.auto.target),
            CameraMode::FirstPerson => {
                let eye = self.walker.eye();
                (eye, eye + self.walker.forward())
            }
        };
        self.eye = eye;
        self.look_at = look_at;
    }

    fn clamp_eye(&self, eye: Vec3) -> Vec3 {
        let mut eye = self.bounds.clamp(eye);
        eye.y = eye.y.max(self.bounds.min.y + self.config.min_eye_height);
        eye
    }

    /// Projection and surface size; no other side effects.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.viewport = Viewport::new(width, height);
        }
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    pub fn eye(&self) -> Vec3 {
        self.eye
    }

    pub fn look_at(&self) -> Vec3 {
        self.look_at
    }

    pub fn forward(&self) -> Vec3 {
        (self.look_at - self.eye).try_normalize().unwrap_or(Vec3::NEG_Z)
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn bounds(&self) -> &YardBounds {
        &self.bounds
    }

    /// New bounds (layout change). Position is re-clamped on the next update.
    pub fn set_bounds(&mut self, bounds: YardBounds) {
        self.bounds = bounds;
    }

    pub fn orbit(&self) -> &OrbitCamera {
        &self.orbit
    }

    pub fn walker(&self) -> &FirstPersonWalker {
        &self.walker
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    pub fn view_matrix(&self) -> Mat4 {
        let up = if self.forward().y.abs() > 0.999 { Vec3::Z } else { Vec3::Y };
        Mat4::look_at_rh(self.eye, self.look_at, up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.config.fov.to_radians(),
            self.viewport.aspect(),
            self.config.near,
            self.config.far,
        )
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Ray from the eye through a pointer position (orbit picking).
    pub fn pointer_ray(&self, x: f32, y: f32) -> Ray {
        screen_to_ray(
            x,
            y,
            self.viewport,
            self.eye,
            self.forward(),
            self.config.fov.to_radians(),
        )
    }

    /// Ray along the view direction (first-person crosshair).
    pub fn crosshair_ray(&self) -> Ray {
        Ray::new(self.eye, self.forward())
    }
}
