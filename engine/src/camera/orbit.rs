//! Orbit Camera
//!
//! A spherical-coordinate orbit camera around a target point on the yard.
//! Drag input adds angular momentum that decays with damping, so the camera
//! keeps moving for a moment after release. Because of that the controller
//! clamps eye and target into the yard bounds every frame, not only on input.
//!
//! Controls:
//! - Right mouse drag: Orbit (rotate around target)
//! - Middle mouse drag: Pan (translate target point on the ground plane)
//! - Scroll wheel: Zoom (change distance from target)

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::world::YardBounds;

// ============================================================================
// CONFIG
// ============================================================================

/// Orbit camera tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitConfig {
    /// Initial horizontal angle in degrees
    pub azimuth: f32,
    /// Initial vertical angle in degrees
    pub elevation: f32,
    /// Initial distance from target
    pub distance: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Lowest elevation in degrees; keeps the camera looking down at the yard
    pub min_elevation: f32,
    pub max_elevation: f32,
    /// Degrees per pixel of drag
    pub rotate_sensitivity: f32,
    /// Pan distance per pixel, scaled by orbit distance
    pub pan_sensitivity: f32,
    /// Fractional distance change per scroll tick
    pub zoom_factor: f32,
    /// Fraction of angular velocity lost per second after release
    pub damping: f32,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            azimuth: 35.0,
            elevation: 40.0,
            distance: 120.0,
            min_distance: 8.0,
            max_distance: 320.0,
            min_elevation: 5.0,
            max_elevation: 89.0,
            rotate_sensitivity: 0.3,
            pan_sensitivity: 0.0015,
            zoom_factor: 0.1,
            damping: 6.0,
        }
    }
}

/// What a held mouse button does to the orbit camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrbitDrag {
    Rotate,
    Pan,
}

// ============================================================================
// ORBIT CAMERA
// ============================================================================

/// Spherical-coordinate orbit camera.
///
/// # Coordinate System
/// - Azimuth: horizontal angle in degrees (wraps 0-360)
/// - Elevation: vertical angle in degrees
/// - Distance: zoom distance from target
/// - Y is up
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    pub azimuth: f32,
    pub elevation: f32,
    pub distance: f32,
    pub target: Vec3,
    /// Input gate; when false drags and scrolls are ignored
    pub enabled: bool,
    config: OrbitConfig,

    // Angular momentum in degrees per second
    azimuth_velocity: f32,
    elevation_velocity: f32,

    is_rotating: bool,
    is_panning: bool,
    last_mouse: Option<[f32; 2]>,
}

impl OrbitCamera {
    pub fn new(config: OrbitConfig, target: Vec3) -> Self {
        Self {
            azimuth: config.azimuth,
            elevation: config.elevation,
            distance: config.distance,
            target,
            enabled: true,
            config,
            azimuth_velocity: 0.0,
            elevation_velocity: 0.0,
            is_rotating: false,
            is_panning: false,
            last_mouse: None,
        }
    }

    pub fn config(&self) -> &OrbitConfig {
        &self.config
    }

    /// Eye position from the spherical coordinates.
    pub fn eye_position(&self) -> Vec3 {
        self.target + Self::offset(self.azimuth, self.elevation, self.distance)
    }

    fn offset(azimuth: f32, elevation: f32, distance: f32) -> Vec3 {
        let azim_rad = azimuth.to_radians();
        let elev_rad = elevation.to_radians();
        let cos_elev = elev_rad.cos();
        Vec3::new(
            distance * cos_elev * azim_rad.sin(),
            distance * elev_rad.sin(),
            distance * cos_elev * azim_rad.cos(),
        )
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye_position(), self.target, Vec3::Y)
    }

    /// Forward direction (eye toward target).
    pub fn forward(&self) -> Vec3 {
        (self.target - self.eye_position())
            .try_normalize()
            .unwrap_or(Vec3::NEG_Z)
    }

    // ========================================================================
    // INPUT HANDLING
    // ========================================================================

    /// Start or stop a drag. Returns false when input is disabled.
    pub fn handle_mouse_drag(&mut self, drag: OrbitDrag, pressed: bool) -> bool {
        if pressed && !self.enabled {
            return false;
        }
        match drag {
            OrbitDrag::Rotate => self.is_rotating = pressed,
            OrbitDrag::Pan => self.is_panning = pressed,
        }
        if pressed {
            // Grabbing the camera kills leftover momentum
            self.azimuth_velocity = 0.0;
            self.elevation_velocity = 0.0;
        }
        true
    }

    /// Pointer movement. Rotates or pans while a drag is held.
    ///
    /// Returns true when the camera moved.
    pub fn handle_mouse_move(&mut self, x: f32, y: f32, dt_hint: f32) -> bool {
        let Some([lx, ly]) = self.last_mouse.replace([x, y]) else {
            return false;
        };
        if !self.enabled || !self.is_active() {
            return false;
        }
        let dx = x - lx;
        let dy = y - ly;

        if self.is_rotating {
            let d_azim = -dx * self.config.rotate_sensitivity;
            let d_elev = dy * self.config.rotate_sensitivity;
            self.azimuth = (self.azimuth + d_azim).rem_euclid(360.0);
            self.elevation = (self.elevation + d_elev)
                .clamp(self.config.min_elevation, self.config.max_elevation);
            if dt_hint > 0.0 {
                self.azimuth_velocity = d_azim / dt_hint;
                self.elevation_velocity = d_elev / dt_hint;
            }
        }

        if self.is_panning {
            let scale = self.config.pan_sensitivity * self.distance;
            self.pan(-dx * scale, dy * scale);
        }
        true
    }

    /// Scroll wheel zoom. Positive delta zooms in.
    pub fn handle_scroll(&mut self, delta: f32) -> bool {
        if !self.enabled {
            return false;
        }
        self.distance *= 1.0 - delta * self.config.zoom_factor;
        self.distance = self
            .distance
            .clamp(self.config.min_distance, self.config.max_distance);
        true
    }

    /// Move the target on the ground plane in camera-relative right/forward.
    fn pan(&mut self, dx: f32, dz: f32) {
        let azim_rad = self.azimuth.to_radians();
        // Horizontal forward (target away from eye) and right
        let forward = Vec3::new(-azim_rad.sin(), 0.0, -azim_rad.cos());
        let right = forward.cross(Vec3::Y).normalize();
        self.target += right * dx + forward * dz;
    }

    /// Release every drag, e.g. when input is disabled mid-drag.
    pub fn cancel_drag(&mut self) {
        self.is_rotating = false;
        self.is_panning = false;
    }

    pub fn is_active(&self) -> bool {
        self.is_rotating || self.is_panning
    }

    pub fn has_momentum(&self) -> bool {
        self.azimuth_velocity.abs() > 1e-3 || self.elevation_velocity.abs() > 1e-3
    }

    /// Look at a new target from the current direction.
    pub fn focus(&mut self, target: Vec3) {
        self.target = target;
    }

    /// Re-derive angles and distance from an eye position.
    pub fn set_eye(&mut self, eye: Vec3) {
        let offset = eye - self.target;
        let distance = offset.length();
        if distance < 1e-4 {
            return;
        }
        self.distance = distance.clamp(self.config.min_distance, self.config.max_distance);
        self.elevation = (offset.y / distance)
            .clamp(-1.0, 1.0)
            .asin()
            .to_degrees()
            .clamp(self.config.min_elevation, self.config.max_elevation);
        self.azimuth = offset.x.atan2(offset.z).to_degrees().rem_euclid(360.0);
    }

    // ========================================================================
    // PER-FRAME
    // ========================================================================

    /// Apply momentum, then clamp target and eye into the yard bounds.
    ///
    /// The eye is kept at least `min_eye_height` above ground. When the eye
    /// had to be moved, the spherical coordinates are re-derived from the
    /// clamped position so the next frame starts inside the bounds.
    pub fn update(&mut self, dt: f32, bounds: &YardBounds, min_eye_height: f32) {
        let dt = dt.clamp(0.0, 0.1);

        if !self.is_rotating && self.has_momentum() {
            self.azimuth = (self.azimuth + self.azimuth_velocity * dt).rem_euclid(360.0);
            self.elevation = (self.elevation + self.elevation_velocity * dt)
                .clamp(self.config.min_elevation, self.config.max_elevation);
            let decay = (1.0 - self.config.damping * dt).max(0.0);
            self.azimuth_velocity *= decay;
            self.elevation_velocity *= decay;
        } else if !self.is_rotating {
            self.azimuth_velocity = 0.0;
            self.elevation_velocity = 0.0;
        }

        self.target = bounds.clamp(self.target);

        let eye = self.eye_position();
        let mut clamped = bounds.clamp(eye);
        clamped.y = clamped.y.max(bounds.min.y + min_eye_height);
        if clamped.distance_squared(eye) > 1e-8 {
            self.set_eye(clamped);
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
