//! Build object types
//!
//! Objects placed directly in the yard by the build tool. They are not part of
//! any render group: each is drawn from the direct instance list and picked
//! through its own registry node.

use std::f32::consts::FRAC_PI_2;
use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::physics::Aabb;
use crate::render::{ContainerInstance, status_color};
use crate::world::{ContainerStatus, RecordRef, SizeClass, SlotAddress, YardLayoutConfig};

const BARRIER_SIZE: Vec3 = Vec3::new(3.0, 0.9, 0.6);
const MAST_POLE_SIZE: Vec3 = Vec3::new(0.4, 12.0, 0.4);
const MAST_HEAD_SIZE: Vec3 = Vec3::new(1.6, 0.5, 0.8);

const BARRIER_COLOR: u32 = 0xC8C8C0FF;
const MAST_COLOR: u32 = 0x70757AFF;
const LAMP_COLOR: u32 = 0xFFF2B0FF;

/// What the build tool places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildObjectKind {
    Container(SizeClass),
    Barrier,
    LightMast,
}

impl BuildObjectKind {
    /// Order used when cycling with the palette key.
    pub const CYCLE: [BuildObjectKind; 6] = [
        BuildObjectKind::Container(SizeClass::Twenty),
        BuildObjectKind::Container(SizeClass::Forty),
        BuildObjectKind::Container(SizeClass::FortyHighCube),
        BuildObjectKind::Container(SizeClass::FortyFive),
        BuildObjectKind::Barrier,
        BuildObjectKind::LightMast,
    ];

    pub fn next(self) -> Self {
        let i = Self::CYCLE.iter().position(|k| *k == self).unwrap_or(0);
        Self::CYCLE[(i + 1) % Self::CYCLE.len()]
    }

    /// Container kinds snap to slots; everything else to the ground grid.
    pub fn snaps_to_slot(self) -> bool {
        matches!(self, BuildObjectKind::Container(_))
    }
}

impl fmt::Display for BuildObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildObjectKind::Container(size) => write!(f, "container {}", size),
            BuildObjectKind::Barrier => write!(f, "barrier"),
            BuildObjectKind::LightMast => write!(f, "light mast"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlacementMode {
    #[default]
    Place,
    Remove,
}

impl PlacementMode {
    pub fn toggled(self) -> Self {
        match self {
            PlacementMode::Place => PlacementMode::Remove,
            PlacementMode::Remove => PlacementMode::Place,
        }
    }
}

/// Identity of a directly placed object, unique for the lifetime of a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A directly placed object.
///
/// `position` is the footprint center on the floor it stands on. Container
/// kinds carry the locally created pending record and its slot.
#[derive(Debug, Clone, PartialEq)]
pub struct YardObject {
    pub id: ObjectId,
    pub kind: BuildObjectKind,
    pub position: Vec3,
    pub yaw: f32,
    pub record: Option<RecordRef>,
    pub slot: Option<SlotAddress>,
}

/// One drawable/pickable box of an object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectPart {
    /// Box center
    pub center: Vec3,
    /// Container-local size (length, height, width)
    pub size: Vec3,
    pub color: u32,
}

/// Parts of `kind` standing at `position` (floor center).
pub fn object_parts(kind: BuildObjectKind, position: Vec3, yaw: f32, layout: &YardLayoutConfig) -> Vec<ObjectPart> {
    match kind {
        BuildObjectKind::Container(size) => {
            let dims = layout.dimensions.get(size).to_vec3();
            vec![ObjectPart {
                center: position + Vec3::Y * dims.y * 0.5,
                size: dims,
                color: status_color("LOCAL", ContainerStatus::Pending),
            }]
        }
        BuildObjectKind::Barrier => vec![ObjectPart {
            center: position + Vec3::Y * BARRIER_SIZE.y * 0.5,
            size: BARRIER_SIZE,
            color: BARRIER_COLOR,
        }],
        BuildObjectKind::LightMast => {
            // Lamp head hangs off the pole along the object's local +X
            let (sin, cos) = yaw.sin_cos();
            let arm = Vec3::new(cos, 0.0, -sin) * (MAST_HEAD_SIZE.x * 0.5 - MAST_POLE_SIZE.x * 0.5);
            vec![
                ObjectPart {
                    center: position + Vec3::Y * MAST_POLE_SIZE.y * 0.5,
                    size: MAST_POLE_SIZE,
                    color: MAST_COLOR,
                },
                ObjectPart {
                    center: position + arm + Vec3::Y * (MAST_POLE_SIZE.y + MAST_HEAD_SIZE.y * 0.5),
                    size: MAST_HEAD_SIZE,
                    color: LAMP_COLOR,
                },
            ]
        }
    }
}

impl YardObject {
    pub fn parts(&self, layout: &YardLayoutConfig) -> Vec<ObjectPart> {
        object_parts(self.kind, self.position, self.yaw, layout)
    }

    pub fn part_boxes(&self, layout: &YardLayoutConfig) -> Vec<Aabb> {
        self.parts(layout)
            .iter()
            .map(|p| Aabb::from_yawed(p.center, p.size, self.yaw))
            .collect()
    }

    pub fn instances(&self, layout: &YardLayoutConfig) -> Vec<ContainerInstance> {
        self.parts(layout)
            .iter()
            .map(|p| ContainerInstance::new(p.center.to_array(), self.yaw, p.size.to_array(), p.color))
            .collect()
    }
}

/// Something the data store should hear about.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildEvent {
    /// A pending container was created locally at `slot`
    ContainerPlaced { record: RecordRef, slot: SlotAddress },
    /// An auxiliary object was placed
    ObjectPlaced { object: YardObject },
    /// A directly placed object was removed locally
    ObjectRemoved { object: YardObject },
    /// Removal of a batched (store-owned) container was requested
    RemovalRequested { record: RecordRef },
}

/// Rotation step of auxiliary objects.
pub const ROTATION_STEP: f32 = FRAC_PI_2;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_wraps() {
        let mut kind = BuildObjectKind::CYCLE[0];
        for _ in 0..BuildObjectKind::CYCLE.len() {
            kind = kind.next();
        }
        assert_eq!(kind, BuildObjectKind::CYCLE[0]);
        assert_eq!(BuildObjectKind::Barrier.next(), BuildObjectKind::LightMast);
    }

    #[test]
    fn test_container_part_sits_on_floor() {
        let layout = YardLayoutConfig::default();
        let parts = object_parts(
            BuildObjectKind::Container(SizeClass::Forty),
            Vec3::new(5.0, 2.9, 0.0),
            0.0,
            &layout,
        );
        assert_eq!(parts.len(), 1);
        let bottom = parts[0].center.y - parts[0].size.y * 0.5;
        assert!((bottom - 2.9).abs() < 1e-5);
    }

    #[test]
    fn test_light_mast_has_two_parts() {
        let layout = YardLayoutConfig::default();
        let parts = object_parts(BuildObjectKind::LightMast, Vec3::ZERO, 0.0, &layout);
        assert_eq!(parts.len(), 2);
        assert!(parts[1].center.y > parts[0].center.y);
    }

    #[test]
    fn test_placement_toggle() {
        assert_eq!(PlacementMode::Place.toggled(), PlacementMode::Remove);
        assert_eq!(PlacementMode::Remove.toggled(), PlacementMode::Place);
    }
}
