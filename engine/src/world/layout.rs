//! Yard Layout Configuration
//!
//! Immutable layout constants for the yard: where the two lane banks sit,
//! slot and lane spacing, tier height, and per-size-class container
//! dimensions. The layout also derives the yard bounds every camera mode is
//! clamped to.
//!
//! ## Units
//! 1 unit = 1 meter, Y is up.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::records::SizeClass;
use super::slot::{Lane, LaneGroup};

/// Outer dimensions of one container size class (meters).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContainerDims {
    pub length: f32,
    pub height: f32,
    pub width: f32,
}

impl ContainerDims {
    pub const fn new(length: f32, height: f32, width: f32) -> Self {
        Self {
            length,
            height,
            width,
        }
    }

    /// Size as a vector in container-local space (length along X).
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.length, self.height, self.width)
    }
}

/// Dimensions for every size class.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DimensionTable {
    pub twenty: ContainerDims,
    pub forty: ContainerDims,
    pub forty_high_cube: ContainerDims,
    pub forty_five: ContainerDims,
}

impl Default for DimensionTable {
    fn default() -> Self {
        Self {
            twenty: ContainerDims::new(6.06, 2.59, 2.44),
            forty: ContainerDims::new(12.19, 2.59, 2.44),
            forty_high_cube: ContainerDims::new(12.19, 2.90, 2.44),
            forty_five: ContainerDims::new(13.72, 2.90, 2.44),
        }
    }
}

impl DimensionTable {
    pub fn get(&self, size: SizeClass) -> ContainerDims {
        match size {
            SizeClass::Twenty => self.twenty,
            SizeClass::Forty => self.forty,
            SizeClass::FortyHighCube => self.forty_high_cube,
            SizeClass::FortyFive => self.forty_five,
        }
    }
}

/// Axis-aligned yard bounds. Cameras and walkers are clamped into this box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct YardBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl YardBounds {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Clamp a position into the bounds on all three axes.
    pub fn clamp(&self, pos: Vec3) -> Vec3 {
        pos.clamp(self.min, self.max)
    }

    /// Clamp X and Z only; Y is preserved.
    pub fn clamp_xz(&self, pos: Vec3) -> Vec3 {
        Vec3::new(
            pos.x.clamp(self.min.x, self.max.x),
            pos.y,
            pos.z.clamp(self.min.z, self.max.z),
        )
    }

    pub fn contains(&self, pos: Vec3) -> bool {
        pos.cmpge(self.min).all() && pos.cmple(self.max).all()
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

/// Layout constants for the yard.
///
/// The front bank (lanes A-C) runs its slot index along +X with lanes stacked
/// along +Z. The rear bank (lanes D-F) is physically perpendicular: slot index
/// along +Z, lanes stacked along +X.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct YardLayoutConfig {
    /// World XZ of front lane A, slot 1 (slot center)
    pub front_origin: Vec2,
    /// World XZ of rear lane D, slot 1 (slot center)
    pub rear_origin: Vec2,
    /// Center-to-center distance between neighbouring lanes
    pub lane_spacing: f32,
    /// Center-to-center distance between neighbouring slots of one lane
    pub slot_pitch: f32,
    /// Vertical distance between tier floors
    pub tier_height: f32,
    /// Number of stacking tiers allowed (tier 'A' .. tier 'A' + max_tiers - 1)
    pub max_tiers: u8,
    /// Front bank numbering grows toward -X instead of +X
    pub front_reversed: bool,
    /// Rear bank numbering grows toward -Z instead of +Z
    pub rear_reversed: bool,
    /// Free space kept around the lanes inside the yard bounds
    pub margin: f32,
    /// Extra head room above the highest tier for the orbit camera
    pub ceiling: f32,
    pub dimensions: DimensionTable,
}

impl Default for YardLayoutConfig {
    fn default() -> Self {
        Self {
            front_origin: Vec2::new(0.0, 0.0),
            rear_origin: Vec2::new(140.0, -20.0),
            lane_spacing: 3.5,
            slot_pitch: 14.0,
            tier_height: 2.9,
            max_tiers: 5,
            front_reversed: false,
            rear_reversed: false,
            margin: 15.0,
            ceiling: 60.0,
            dimensions: DimensionTable::default(),
        }
    }
}

impl YardLayoutConfig {
    /// Vertical offset of a tier floor. Tier 0 ('A') is ground level.
    pub fn tier_offset(&self, tier_index: u8) -> f32 {
        self.tier_height * tier_index as f32
    }

    /// Slot position along the bank axis for a 1-based slot index.
    ///
    /// With reversed numbering, slot 1 sits at the far end of the bank so the
    /// physical numbering runs against the world axis.
    pub fn slot_offset(&self, group: LaneGroup, index: u32) -> f32 {
        let max = group.max_index();
        let reversed = match group {
            LaneGroup::Front => self.front_reversed,
            LaneGroup::Rear => self.rear_reversed,
        };
        let step = if reversed {
            max.saturating_sub(index)
        } else {
            index.saturating_sub(1)
        };
        step as f32 * self.slot_pitch
    }

    /// Offset of a lane inside its bank, perpendicular to the slot axis.
    pub fn lane_offset(&self, lane: Lane) -> f32 {
        lane.ordinal_in_group() as f32 * self.lane_spacing
    }

    /// Derive the yard bounds from the lane layout.
    pub fn bounds(&self) -> YardBounds {
        let half_slot = self.slot_pitch * 0.5;
        let half_lane = self.lane_spacing * 0.5;

        let front_len = (LaneGroup::Front.max_index() - 1) as f32 * self.slot_pitch;
        let front_wide = (Lane::FRONT.len() - 1) as f32 * self.lane_spacing;
        let rear_len = (LaneGroup::Rear.max_index() - 1) as f32 * self.slot_pitch;
        let rear_wide = (Lane::REAR.len() - 1) as f32 * self.lane_spacing;

        let front_min = Vec2::new(self.front_origin.x - half_slot, self.front_origin.y - half_lane);
        let front_max = Vec2::new(
            self.front_origin.x + front_len + half_slot,
            self.front_origin.y + front_wide + half_lane,
        );
        let rear_min = Vec2::new(self.rear_origin.x - half_lane, self.rear_origin.y - half_slot);
        let rear_max = Vec2::new(
            self.rear_origin.x + rear_wide + half_lane,
            self.rear_origin.y + rear_len + half_slot,
        );

        let min = front_min.min(rear_min) - Vec2::splat(self.margin);
        let max = front_max.max(rear_max) + Vec2::splat(self.margin);
        let top = self.tier_offset(self.max_tiers) + self.ceiling;

        YardBounds::new(Vec3::new(min.x, 0.0, min.y), Vec3::new(max.x, top, max.y))
    }

    /// Check the layout for values that would produce degenerate geometry.
    pub fn validate(&self) -> Result<(), String> {
        if self.lane_spacing <= 0.0 || self.slot_pitch <= 0.0 || self.tier_height <= 0.0 {
            return Err("lane_spacing, slot_pitch and tier_height must be positive".into());
        }
        if self.max_tiers == 0 || self.max_tiers > 26 {
            return Err(format!("max_tiers must be 1..=26, got {}", self.max_tiers));
        }
        for size in SizeClass::ALL {
            let dims = self.dimensions.get(size);
            if dims.length <= 0.0 || dims.height <= 0.0 || dims.width <= 0.0 {
                return Err(format!("dimensions for {} must be positive", size));
            }
            if dims.height > self.tier_height {
                return Err(format!("{} is taller than one tier", size));
            }
            if dims.length > self.slot_pitch {
                return Err(format!("{} is longer than slot_pitch {}", size, self.slot_pitch));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_is_valid() {
        assert!(YardLayoutConfig::default().validate().is_ok());
    }

    #[test]
    fn test_tier_offset_ground_level() {
        let layout = YardLayoutConfig::default();
        assert_eq!(layout.tier_offset(0), 0.0);
        assert!((layout.tier_offset(2) - 5.8).abs() < 1e-5);
    }

    #[test]
    fn test_reversed_numbering_flips_slot_axis() {
        let mut layout = YardLayoutConfig::default();
        let forward = layout.slot_offset(LaneGroup::Front, 1);
        layout.front_reversed = true;
        let reversed = layout.slot_offset(LaneGroup::Front, 1);
        assert_eq!(forward, 0.0);
        assert!((reversed - 9.0 * layout.slot_pitch).abs() < 1e-4);
        assert_eq!(layout.slot_offset(LaneGroup::Front, 10), 0.0);
    }

    #[test]
    fn test_bounds_cover_both_banks() {
        let layout = YardLayoutConfig::default();
        let bounds = layout.bounds();
        let front_far = Vec3::new(layout.front_origin.x + 9.0 * layout.slot_pitch, 1.0, 0.0);
        let rear_far = Vec3::new(layout.rear_origin.x, 1.0, layout.rear_origin.y + 6.0 * layout.slot_pitch);
        assert!(bounds.contains(front_far));
        assert!(bounds.contains(rear_far));
        assert_eq!(bounds.min.y, 0.0);
    }

    #[test]
    fn test_bounds_clamp() {
        let bounds = YardBounds::new(Vec3::ZERO, Vec3::splat(10.0));
        assert_eq!(bounds.clamp(Vec3::new(-5.0, 20.0, 5.0)), Vec3::new(0.0, 10.0, 5.0));
        assert_eq!(bounds.clamp_xz(Vec3::new(-5.0, 20.0, 5.0)), Vec3::new(0.0, 20.0, 5.0));
    }

    #[test]
    fn test_validate_rejects_tall_container() {
        let mut layout = YardLayoutConfig::default();
        layout.dimensions.forty_five.height = 4.0;
        assert!(layout.validate().is_err());
    }

    #[test]
    fn test_longest_container_fits_its_slot() {
        let layout = YardLayoutConfig::default();
        assert!(layout.dimensions.get(SizeClass::FortyFive).length <= layout.slot_pitch);

        let mut tight = layout.clone();
        tight.slot_pitch = 13.0;
        assert!(tight.validate().is_err());
    }
}
