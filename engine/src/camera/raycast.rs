//! Raycast Module
//!
//! Screen-to-world rays for pointer picking, and the camera-forward
//! crosshair ray used in first-person mode.

use glam::Vec3;

/// A ray with normalized direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Create a ray; `direction` is normalized (zero falls back to -Z).
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        let direction = direction.try_normalize().unwrap_or(Vec3::NEG_Z);
        Self { origin, direction }
    }

    /// Point at distance `t` along the ray.
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Intersection with the horizontal plane `y = height`, if in front.
    pub fn intersect_plane_y(&self, height: f32) -> Option<Vec3> {
        if self.direction.y.abs() < 0.0001 {
            return None;
        }
        let t = (height - self.origin.y) / self.direction.y;
        if t < 0.0 {
            return None;
        }
        Some(self.at(t))
    }
}

/// Render surface size in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1) as f32,
            height: height.max(1) as f32,
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.width * 0.5, self.height * 0.5)
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= 0.0 && y >= 0.0 && x <= self.width && y <= self.height
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

/// Convert screen coordinates to a world-space ray
///
/// # Arguments
/// * `screen_x`, `screen_y` - Pointer position in pixels, origin top-left
/// * `viewport` - Surface size
/// * `camera_position` - Camera eye in world space
/// * `camera_forward` - Camera forward direction (normalized)
/// * `fov_y` - Vertical field of view in radians
pub fn screen_to_ray(
    screen_x: f32,
    screen_y: f32,
    viewport: Viewport,
    camera_position: Vec3,
    camera_forward: Vec3,
    fov_y: f32,
) -> Ray {
    // Convert to normalized device coordinates (-1 to 1)
    let ndc_x = (2.0 * screen_x / viewport.width) - 1.0;
    let ndc_y = 1.0 - (2.0 * screen_y / viewport.height); // Flip Y

    // Looking straight up/down: use world X as the reference right vector
    let right = camera_forward
        .cross(Vec3::Y)
        .try_normalize()
        .unwrap_or(Vec3::X);
    let up = right.cross(camera_forward).normalize();

    let half_fov_tan = (fov_y * 0.5).tan();
    let dir = camera_forward
        + right * ndc_x * half_fov_tan * viewport.aspect()
        + up * ndc_y * half_fov_tan;

    Ray::new(camera_position, dir)
}
