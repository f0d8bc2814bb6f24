//! Collision detection module
//!
//! Axis-aligned boxes and ray intersection for container hit-testing.
//! Containers only ever sit at yaw 0 or 90°, so an AABB is an exact fit for
//! every placed box.
//!
//! # Ray-AABB Intersection
//!
//! The slab method is used for ray-AABB intersection, which finds the
//! intersection points by computing entry and exit times for each axis.
//!
//! # Example
//!
//! ```ignore
//! use yard_engine::physics::collision::{ray_aabb_intersect, Aabb};
//! use glam::Vec3;
//!
//! let origin = Vec3::new(0.0, 0.0, -5.0);
//! let direction = Vec3::new(0.0, 0.0, 1.0);
//! let aabb = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
//!
//! if let Some(t) = ray_aabb_intersect(origin, direction, aabb.min, aabb.max) {
//!     let hit_point = origin + direction * t;
//!     log::debug!("Hit at distance {}: {:?}", t, hit_point);
//! }
//! ```

use glam::Vec3;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    /// Box from its center and full size.
    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        let half = size.abs() * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Box of a container-local size (length on X) placed at `center` with a
    /// quarter-turn yaw. Any yaw other than 0/90°/180°/270° is treated as the
    /// nearest quarter turn.
    pub fn from_yawed(center: Vec3, local_size: Vec3, yaw: f32) -> Self {
        let quarter = (yaw / std::f32::consts::FRAC_PI_2).round() as i32;
        let size = if quarter.rem_euclid(2) == 1 {
            Vec3::new(local_size.z, local_size.y, local_size.x)
        } else {
            local_size
        };
        Self::from_center_size(center, size)
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// True when the XZ footprint contains the point.
    pub fn contains_xz(&self, x: f32, z: f32) -> bool {
        x >= self.min.x && x <= self.max.x && z >= self.min.z && z <= self.max.z
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.cmple(other.max).all() && self.max.cmpge(other.min).all()
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn ray_intersect(&self, origin: Vec3, dir: Vec3) -> Option<f32> {
        ray_aabb_intersect(origin, dir, self.min, self.max)
    }
}

/// Entry and exit distances of a ray through an AABB.
///
/// # Returns
///
/// * `Some((t_enter, t_exit))` - `t_enter` is clamped to 0 when the origin is inside
/// * `None` - The ray misses or the box is entirely behind the origin
pub fn ray_aabb_span(
    ray_origin: Vec3,
    ray_dir: Vec3,
    aabb_min: Vec3,
    aabb_max: Vec3,
) -> Option<(f32, f32)> {
    // Compute inverse direction for efficient division
    // Handle near-zero directions by using large values
    let inv = |d: f32| {
        if d.abs() > 1e-10 {
            1.0 / d
        } else if d.is_sign_negative() {
            f32::MIN
        } else {
            f32::MAX
        }
    };
    let inv_dir = Vec3::new(inv(ray_dir.x), inv(ray_dir.y), inv(ray_dir.z));

    let t1 = (aabb_min - ray_origin) * inv_dir;
    let t2 = (aabb_max - ray_origin) * inv_dir;

    let t_min = t1.min(t2).max_element();
    let t_max = t1.max(t2).min_element();

    if t_max >= t_min && t_max >= 0.0 {
        Some((t_min.max(0.0), t_max))
    } else {
        None
    }
}

/// Performs ray-AABB (Axis-Aligned Bounding Box) intersection test using the slab method.
///
/// The slab method works by finding the intersection of the ray with each pair of
/// axis-aligned planes that make up the AABB. If the ray enters and exits the AABB
/// at valid times (t_enter < t_exit and t_exit > 0), there is an intersection.
///
/// # Arguments
///
/// * `ray_origin` - Starting point of the ray
/// * `ray_dir` - Direction of the ray (must be normalized)
/// * `aabb_min` - Minimum corner of the AABB
/// * `aabb_max` - Maximum corner of the AABB
///
/// # Returns
///
/// * `Some(t)` - Distance along the ray to the intersection point (t >= 0)
/// * `None` - No intersection or intersection is behind the ray origin
pub fn ray_aabb_intersect(
    ray_origin: Vec3,
    ray_dir: Vec3,
    aabb_min: Vec3,
    aabb_max: Vec3,
) -> Option<f32> {
    ray_aabb_span(ray_origin, ray_dir, aabb_min, aabb_max).map(|(t_enter, _)| t_enter)
}

/// Computes the outward surface normal for a point on an AABB surface.
///
/// Picks the face whose plane the point is closest to in unit-cube space.
pub fn aabb_surface_normal(point: Vec3, aabb_min: Vec3, aabb_max: Vec3) -> Vec3 {
    let center = (aabb_min + aabb_max) * 0.5;
    let half_extents = ((aabb_max - aabb_min) * 0.5).max(Vec3::splat(1e-6));
    let normalized = (point - center) / half_extents;
    let abs_normalized = normalized.abs();

    if abs_normalized.x >= abs_normalized.y && abs_normalized.x >= abs_normalized.z {
        Vec3::new(normalized.x.signum(), 0.0, 0.0)
    } else if abs_normalized.y >= abs_normalized.z {
        Vec3::new(0.0, normalized.y.signum(), 0.0)
    } else {
        Vec3::new(0.0, 0.0, normalized.z.signum())
    }
}
