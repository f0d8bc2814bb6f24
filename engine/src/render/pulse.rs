//! Sinusoidal pulse animation for pending containers and the selection ring.

use std::f32::consts::TAU;

use serde::{Deserialize, Serialize};

use super::palette::stable_hash;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PulseConfig {
    /// Oscillations per second
    pub frequency: f32,
    /// Peak scale deviation from 1.0
    pub amplitude: f32,
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            frequency: 0.8,
            amplitude: 0.04,
        }
    }
}

impl PulseConfig {
    /// Scale factor at `time` for a member with the given phase (radians).
    pub fn scale_at(&self, time: f32, phase: f32) -> f32 {
        1.0 + self.amplitude * (TAU * self.frequency * time + phase).sin()
    }
}

/// Per-member phase offset so a group does not pulse in lockstep.
pub fn member_phase(id: &str) -> f32 {
    (stable_hash(id) % 10_000) as f32 / 10_000.0 * TAU
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_stays_within_amplitude() {
        let pulse = PulseConfig::default();
        for i in 0..200 {
            let s = pulse.scale_at(i as f32 * 0.05, 1.3);
            assert!(s >= 1.0 - pulse.amplitude - 1e-6);
            assert!(s <= 1.0 + pulse.amplitude + 1e-6);
        }
    }

    #[test]
    fn test_members_get_distinct_phases() {
        assert_ne!(member_phase("MSKU1234565"), member_phase("MSKU1234566"));
        assert_eq!(member_phase("X"), member_phase("X"));
    }
}
