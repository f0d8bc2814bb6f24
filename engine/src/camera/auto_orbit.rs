//! Auto-orbit: constant-rate fly-around of a fixed target.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Auto-orbit tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoOrbitConfig {
    /// Angular speed in degrees per second
    pub speed: f32,
    /// Horizontal distance from the target
    pub radius: f32,
    /// Eye height above the target
    pub height: f32,
    pub clockwise: bool,
}

impl Default for AutoOrbitConfig {
    fn default() -> Self {
        Self {
            speed: 8.0,
            radius: 110.0,
            height: 55.0,
            clockwise: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AutoOrbit {
    pub config: AutoOrbitConfig,
    pub target: Vec3,
    /// Current angle in degrees, same convention as orbit azimuth
    pub angle: f32,
}

impl AutoOrbit {
    pub fn new(config: AutoOrbitConfig) -> Self {
        Self {
            config,
            target: Vec3::ZERO,
            angle: 0.0,
        }
    }

    /// Start circling `target` from `angle` degrees.
    pub fn start(&mut self, target: Vec3, angle: f32) {
        self.target = target;
        self.angle = angle.rem_euclid(360.0);
    }

    pub fn update(&mut self, dt: f32) {
        let dir = if self.config.clockwise { -1.0 } else { 1.0 };
        self.angle = (self.angle + dir * self.config.speed * dt.max(0.0)).rem_euclid(360.0);
    }

    pub fn eye_position(&self) -> Vec3 {
        let a = self.angle.to_radians();
        self.target
            + Vec3::new(
                self.config.radius * a.sin(),
                self.config.height,
                self.config.radius * a.cos(),
            )
    }
}
