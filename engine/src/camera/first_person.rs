//! First-Person Walker
//!
//! Walking camera for the yard: camera-relative WASD movement with smooth
//! acceleration, gravity with jumping, and step/slope limits against a
//! [`GroundProbe`]. Container roofs are walkable once reached; container sides
//! taller than the step height block movement.
//!
//! # Physics Model
//!
//! - Walk speed: 4.0 m/s, sprint 8.0 m/s
//! - Acceleration: 30.0 m/s^2, deceleration 25.0 m/s^2
//! - Gravity: 20.0 m/s^2

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::input::MovementKeys;
use crate::physics::GroundProbe;
use crate::world::YardBounds;

/// Pitch limit: +-89 degrees in radians
const PITCH_LIMIT: f32 = 89.0 * std::f32::consts::PI / 180.0;

/// Walker tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkConfig {
    pub walk_speed: f32,
    pub sprint_speed: f32,
    pub acceleration: f32,
    pub deceleration: f32,
    pub gravity: f32,
    pub jump_velocity: f32,
    /// Eye height above the feet
    pub eye_height: f32,
    /// Highest ledge climbed without jumping
    pub step_height: f32,
    /// Steepest walkable slope in degrees
    pub max_slope: f32,
    /// Mouse look in radians per pixel
    pub look_sensitivity: f32,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            walk_speed: 4.0,
            sprint_speed: 8.0,
            acceleration: 30.0,
            deceleration: 25.0,
            gravity: 20.0,
            jump_velocity: 6.0,
            eye_height: 1.7,
            step_height: 0.5,
            max_slope: 45.0,
            look_sensitivity: 0.002,
        }
    }
}

/// First-person walking state.
///
/// Yaw 0 looks toward -Z; positive yaw turns toward +X.
#[derive(Debug, Clone)]
pub struct FirstPersonWalker {
    pub config: WalkConfig,
    /// Feet position
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    /// Horizontal velocity (m/s)
    velocity: Vec3,
    vertical_velocity: f32,
    grounded: bool,
}

impl FirstPersonWalker {
    pub fn new(config: WalkConfig) -> Self {
        Self {
            config,
            position: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            velocity: Vec3::ZERO,
            vertical_velocity: 0.0,
            grounded: true,
        }
    }

    /// Drop the walker at `position` looking along `forward` (pitch ignored).
    pub fn place(&mut self, position: Vec3, forward: Vec3) {
        self.position = position;
        let flat = forward.with_y(0.0);
        if flat.length_squared() > 1e-6 {
            self.yaw = flat.x.atan2(-flat.z);
        }
        self.pitch = 0.0;
        self.velocity = Vec3::ZERO;
        self.vertical_velocity = 0.0;
        self.grounded = false;
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity + Vec3::Y * self.vertical_velocity
    }

    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    pub fn eye(&self) -> Vec3 {
        self.position + Vec3::Y * self.config.eye_height
    }

    /// Look direction including pitch.
    pub fn forward(&self) -> Vec3 {
        Vec3::new(
            self.pitch.cos() * self.yaw.sin(),
            self.pitch.sin(),
            -self.pitch.cos() * self.yaw.cos(),
        )
    }

    /// Horizontal look direction.
    pub fn flat_forward(&self) -> Vec3 {
        Vec3::new(self.yaw.sin(), 0.0, -self.yaw.cos())
    }

    pub fn right(&self) -> Vec3 {
        Vec3::new(self.yaw.cos(), 0.0, self.yaw.sin())
    }

    /// Raw mouse delta in pixels.
    pub fn apply_mouse_delta(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * self.config.look_sensitivity;
        self.pitch = (self.pitch - dy * self.config.look_sensitivity).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Advance one frame.
    pub fn update(&mut self, dt: f32, input: &MovementKeys, ground: &dyn GroundProbe, bounds: &YardBounds) {
        // Clamp delta time to prevent physics explosions
        let dt = dt.clamp(0.0001, 0.1);

        self.update_horizontal_velocity(dt, input);

        if input.up && self.grounded {
            self.vertical_velocity = self.config.jump_velocity;
            self.grounded = false;
        }

        let step = self.velocity * dt;
        if step.length_squared() > 0.0 {
            self.move_horizontal(step, ground, bounds);
        }

        self.apply_vertical(dt, ground);

        let clamped = bounds.clamp_xz(self.position);
        self.position.x = clamped.x;
        self.position.z = clamped.z;
        let ceiling = bounds.max.y - self.config.eye_height;
        if self.position.y > ceiling {
            self.position.y = ceiling;
            self.vertical_velocity = self.vertical_velocity.min(0.0);
        }
    }

    fn update_horizontal_velocity(&mut self, dt: f32, input: &MovementKeys) {
        let intent = input.direction();
        let input_dir = (self.flat_forward() * intent.y + self.right() * intent.x).normalize_or_zero();
        let target_speed = if input.sprint {
            self.config.sprint_speed
        } else {
            self.config.walk_speed
        };

        if input_dir.length_squared() > 0.001 {
            let velocity_diff = input_dir * target_speed - self.velocity;
            let accel_this_frame = self.config.acceleration * dt;
            if velocity_diff.length() <= accel_this_frame {
                self.velocity = input_dir * target_speed;
            } else {
                self.velocity += velocity_diff.normalize() * accel_this_frame;
            }
        } else {
            let current_speed = self.velocity.length();
            let decel_this_frame = self.config.deceleration * dt;
            if current_speed <= decel_this_frame {
                self.velocity = Vec3::ZERO;
            } else {
                self.velocity *= (current_speed - decel_this_frame) / current_speed;
            }
        }
    }

    /// Try the full step, then each axis alone so the walker slides along walls.
    fn move_horizontal(&mut self, step: Vec3, ground: &dyn GroundProbe, bounds: &YardBounds) {
        let candidates = [step, Vec3::new(step.x, 0.0, 0.0), Vec3::new(0.0, 0.0, step.z)];
        for candidate in candidates {
            if candidate.length_squared() == 0.0 {
                continue;
            }
            let next = bounds.clamp_xz(self.position + candidate);
            if let Some(floor) = self.walkable(next, ground) {
                self.position.x = next.x;
                self.position.z = next.z;
                if self.grounded && floor > self.position.y {
                    self.position.y = floor;
                }
                return;
            }
            // Blocked: kill velocity along that axis
            if candidate.x != 0.0 && candidate.z == 0.0 {
                self.velocity.x = 0.0;
            } else if candidate.z != 0.0 && candidate.x == 0.0 {
                self.velocity.z = 0.0;
            }
        }
    }

    /// Floor height at `next` if the walker may stand there.
    fn walkable(&self, next: Vec3, ground: &dyn GroundProbe) -> Option<f32> {
        let feet = self.position.y;
        let head = feet + self.config.eye_height;
        let step_top = feet + self.config.step_height;

        if ground.obstructed(next.x, next.z, step_top, head) {
            return None;
        }

        let floor = ground.surface_below(next.x, next.z, step_top);
        let rise = floor - feet;
        if rise > self.config.step_height {
            let run = (next - self.position).with_y(0.0).length();
            let slope = rise.atan2(run).to_degrees();
            if slope > self.config.max_slope {
                return None;
            }
        }
        Some(floor)
    }

    fn apply_vertical(&mut self, dt: f32, ground: &dyn GroundProbe) {
        let floor = ground.surface_below(
            self.position.x,
            self.position.z,
            self.position.y + self.config.step_height,
        );

        // Walking down a step snaps instead of falling
        if self.grounded && self.vertical_velocity <= 0.0 {
            let drop = self.position.y - floor;
            if drop <= self.config.step_height {
                self.position.y = floor;
                return;
            }
            self.grounded = false;
        }

        // Midpoint integration of gravity
        let prev = self.vertical_velocity;
        self.vertical_velocity -= self.config.gravity * dt;
        self.position.y += (prev + self.vertical_velocity) * 0.5 * dt;

        if self.position.y <= floor {
            self.position.y = floor;
            self.vertical_velocity = 0.0;
            self.grounded = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{Aabb, FlatGround, SpatialIndex};

    const EPSILON: f32 = 1e-4;

    fn bounds() -> YardBounds {
        YardBounds::new(Vec3::new(-50.0, 0.0, -50.0), Vec3::new(50.0, 40.0, 50.0))
    }

    fn walk(walker: &mut FirstPersonWalker, keys: &MovementKeys, ground: &dyn GroundProbe, frames: usize) {
        for _ in 0..frames {
            walker.update(1.0 / 60.0, keys, ground, &bounds());
        }
    }

    #[test]
    fn test_accelerates_to_walk_speed() {
        let mut walker = FirstPersonWalker::new(WalkConfig::default());
        walker.grounded = true;
        let keys = MovementKeys {
            forward: true,
            ..Default::default()
        };
        walk(&mut walker, &keys, &FlatGround, 60);
        assert!((walker.velocity().length() - 4.0).abs() < EPSILON);
        assert!(walker.position.z < -1.0);
    }

    #[test]
    fn test_decelerates_to_stop() {
        let mut walker = FirstPersonWalker::new(WalkConfig::default());
        walker.velocity = Vec3::new(4.0, 0.0, 0.0);
        walk(&mut walker, &MovementKeys::default(), &FlatGround, 30);
        assert_eq!(walker.velocity().with_y(0.0), Vec3::ZERO);
    }

    #[test]
    fn test_falls_to_ground() {
        let mut walker = FirstPersonWalker::new(WalkConfig::default());
        walker.place(Vec3::new(0.0, 10.0, 0.0), Vec3::NEG_Z);
        walk(&mut walker, &MovementKeys::default(), &FlatGround, 120);
        assert!(walker.is_grounded());
        assert!(walker.position.y.abs() < EPSILON);
    }

    #[test]
    fn test_container_side_blocks() {
        let mut index = SpatialIndex::new(4.0);
        index.insert(
            Aabb::new(Vec3::new(-5.0, 0.0, -6.0), Vec3::new(5.0, 2.6, -3.0)),
            0u32,
        );
        let mut walker = FirstPersonWalker::new(WalkConfig::default());
        let keys = MovementKeys {
            forward: true,
            ..Default::default()
        };
        walk(&mut walker, &keys, &index, 180);
        assert!(walker.position.z > -3.0);
        assert!(walker.position.y.abs() < EPSILON);
    }

    #[test]
    fn test_steps_onto_low_ledge() {
        let mut index = SpatialIndex::new(4.0);
        index.insert(
            Aabb::new(Vec3::new(-5.0, 0.0, -20.0), Vec3::new(5.0, 0.3, -3.0)),
            0u32,
        );
        let mut walker = FirstPersonWalker::new(WalkConfig::default());
        let keys = MovementKeys {
            forward: true,
            ..Default::default()
        };
        walk(&mut walker, &keys, &index, 90);
        assert!(walker.position.z < -3.0);
        assert!((walker.position.y - 0.3).abs() < EPSILON);
    }

    #[test]
    fn test_clamped_to_bounds() {
        let mut walker = FirstPersonWalker::new(WalkConfig::default());
        walker.position = Vec3::new(49.9, 0.0, 0.0);
        walker.yaw = std::f32::consts::FRAC_PI_2;
        let keys = MovementKeys {
            forward: true,
            sprint: true,
            ..Default::default()
        };
        walk(&mut walker, &keys, &FlatGround, 120);
        assert!(walker.position.x <= 50.0 + EPSILON);
    }

    #[test]
    fn test_pitch_clamped() {
        let mut walker = FirstPersonWalker::new(WalkConfig::default());
        walker.apply_mouse_delta(0.0, -100_000.0);
        assert!(walker.pitch <= PITCH_LIMIT);
        assert!(walker.forward().y > 0.99);
    }
}
