//! Selection marker: a flat ring at the selected container's footprint and a
//! point light above it. The ring pulses in scale and opacity while visible.

use std::f32::consts::TAU;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::physics::Aabb;
use crate::render::MarkerView;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    /// Pulses per second
    pub frequency: f32,
    /// Peak ring scale deviation from 1.0
    pub scale_amplitude: f32,
    pub min_opacity: f32,
    pub max_opacity: f32,
    /// Extra ring radius around the footprint
    pub padding: f32,
    /// Light height above the container roof
    pub light_height: f32,
    pub light_color: [f32; 3],
    pub light_intensity: f32,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            frequency: 1.2,
            scale_amplitude: 0.08,
            min_opacity: 0.35,
            max_opacity: 0.9,
            padding: 0.75,
            light_height: 4.0,
            light_color: [1.0, 0.92, 0.6],
            light_intensity: 3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Placement {
    center: Vec3,
    radius: f32,
    light: Vec3,
}

#[derive(Debug, Clone, Default)]
pub struct SelectionMarker {
    config: MarkerConfig,
    placement: Option<Placement>,
    time: f32,
}

impl SelectionMarker {
    pub fn new(config: MarkerConfig) -> Self {
        Self {
            config,
            placement: None,
            time: 0.0,
        }
    }

    /// Put the marker under `aabb` and restart the pulse.
    pub fn show(&mut self, aabb: &Aabb) {
        let center = aabb.center();
        let footprint = aabb.size();
        let half_diagonal = 0.5 * (footprint.x * footprint.x + footprint.z * footprint.z).sqrt();
        self.placement = Some(Placement {
            // Lifted a little off the floor to avoid z-fighting
            center: Vec3::new(center.x, aabb.min.y + 0.05, center.z),
            radius: half_diagonal + self.config.padding,
            light: Vec3::new(center.x, aabb.max.y + self.config.light_height, center.z),
        });
        self.time = 0.0;
    }

    pub fn hide(&mut self) {
        self.placement = None;
    }

    pub fn is_visible(&self) -> bool {
        self.placement.is_some()
    }

    pub fn update(&mut self, dt: f32) {
        if self.placement.is_some() {
            self.time += dt;
        }
    }

    /// Current pulse phase in 0..1 (0.5 + 0.5 sin).
    fn wave(&self) -> f32 {
        0.5 + 0.5 * (TAU * self.config.frequency * self.time).sin()
    }

    pub fn view(&self) -> Option<MarkerView> {
        let p = self.placement?;
        let wave = self.wave();
        let scale = 1.0 + self.config.scale_amplitude * (2.0 * wave - 1.0);
        let opacity = self.config.min_opacity + (self.config.max_opacity - self.config.min_opacity) * wave;
        Some(MarkerView {
            center: p.center,
            radius: p.radius * scale,
            opacity,
            light_position: p.light,
            light_color: self.config.light_color,
            light_intensity: self.config.light_intensity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn box_at_origin() -> Aabb {
        Aabb::from_center_size(Vec3::new(0.0, 1.3, 0.0), Vec3::new(12.0, 2.6, 2.4))
    }

    #[test]
    fn test_hidden_by_default() {
        let marker = SelectionMarker::default();
        assert!(marker.view().is_none());
    }

    #[test]
    fn test_ring_at_footprint_light_above() {
        let mut marker = SelectionMarker::new(MarkerConfig::default());
        marker.show(&box_at_origin());
        let view = marker.view().unwrap();
        assert!(view.center.y < 0.1);
        assert!(view.light_position.y > 2.6);
        assert!(view.radius > 6.0);
    }

    #[test]
    fn test_pulse_stays_in_range() {
        let config = MarkerConfig::default();
        let mut marker = SelectionMarker::new(config);
        marker.show(&box_at_origin());
        let base = marker.view().unwrap().radius;
        for _ in 0..100 {
            marker.update(0.037);
            let view = marker.view().unwrap();
            assert!(view.opacity >= config.min_opacity - 1e-5);
            assert!(view.opacity <= config.max_opacity + 1e-5);
            let ratio = view.radius / base;
            assert!(ratio > 1.0 - 2.0 * config.scale_amplitude - 1e-4);
            assert!(ratio < 1.0 + 2.0 * config.scale_amplitude + 1e-4);
        }
    }

    #[test]
    fn test_hide() {
        let mut marker = SelectionMarker::default();
        marker.show(&box_at_origin());
        marker.hide();
        assert!(!marker.is_visible());
        assert!(marker.view().is_none());
    }
}
