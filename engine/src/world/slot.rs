//! Slot Addressing
//!
//! Maps logical stacking-slot addresses (`A1A`, `D7C`, ...) to world
//! transforms. The mapping is a pure function of the address and the
//! [`YardLayoutConfig`]; transforms are never stored independently of the
//! address they came from.
//!
//! ## Lane groups
//! The six lanes form two perpendicular banks:
//! - Front bank, lanes A-C: slot index 1..=10, containers lie along X (yaw 0)
//! - Rear bank, lanes D-F: slot index 1..=7, containers lie along Z (yaw 90°)

use glam::{Quat, Vec3};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::layout::YardLayoutConfig;

/// Highest slot index in a front-bank lane.
pub const FRONT_MAX_INDEX: u32 = 10;
/// Highest slot index in a rear-bank lane.
pub const REAR_MAX_INDEX: u32 = 7;

/// Why a slot address was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidSlotError {
    #[error("empty slot address")]
    Empty,
    #[error("unknown lane '{0}' (expected A-F)")]
    UnknownLane(char),
    #[error("missing slot index in '{0}'")]
    MissingIndex(String),
    #[error("slot index {index} out of range for lane {lane} (1..={max})")]
    IndexOutOfRange { lane: char, index: u32, max: u32 },
    #[error("invalid tier '{0}'")]
    InvalidTier(char),
    #[error("tier '{tier}' is above the top tier '{top}'")]
    TierOutOfRange { tier: char, top: char },
    #[error("unexpected trailing characters '{0}'")]
    Trailing(String),
}

/// Which physical bank a lane belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LaneGroup {
    Front,
    Rear,
}

impl LaneGroup {
    /// Highest valid slot index in this group's lanes.
    pub fn max_index(self) -> u32 {
        match self {
            LaneGroup::Front => FRONT_MAX_INDEX,
            LaneGroup::Rear => REAR_MAX_INDEX,
        }
    }

    pub fn orientation(self) -> Orientation {
        match self {
            LaneGroup::Front => Orientation::AlongX,
            LaneGroup::Rear => Orientation::AlongZ,
        }
    }
}

/// Direction a container's long axis points in world space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Orientation {
    /// Long axis on X (front bank)
    AlongX,
    /// Long axis on Z (rear bank), 90° yaw relative to the front bank
    AlongZ,
}

impl Orientation {
    /// Yaw in radians around +Y.
    pub fn yaw(self) -> f32 {
        match self {
            Orientation::AlongX => 0.0,
            Orientation::AlongZ => std::f32::consts::FRAC_PI_2,
        }
    }

    /// Rotate a container-local size (length on X) into world axes.
    pub fn world_extent(self, local: Vec3) -> Vec3 {
        match self {
            Orientation::AlongX => local,
            Orientation::AlongZ => Vec3::new(local.z, local.y, local.x),
        }
    }
}

/// One of the six yard lanes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Lane {
    A,
    B,
    C,
    D,
    E,
    F,
}

impl Lane {
    pub const FRONT: [Lane; 3] = [Lane::A, Lane::B, Lane::C];
    pub const REAR: [Lane; 3] = [Lane::D, Lane::E, Lane::F];

    pub fn from_letter(c: char) -> Option<Lane> {
        match c.to_ascii_uppercase() {
            'A' => Some(Lane::A),
            'B' => Some(Lane::B),
            'C' => Some(Lane::C),
            'D' => Some(Lane::D),
            'E' => Some(Lane::E),
            'F' => Some(Lane::F),
            _ => None,
        }
    }

    pub fn letter(self) -> char {
        match self {
            Lane::A => 'A',
            Lane::B => 'B',
            Lane::C => 'C',
            Lane::D => 'D',
            Lane::E => 'E',
            Lane::F => 'F',
        }
    }

    pub fn group(self) -> LaneGroup {
        match self {
            Lane::A | Lane::B | Lane::C => LaneGroup::Front,
            Lane::D | Lane::E | Lane::F => LaneGroup::Rear,
        }
    }

    /// Position of the lane inside its bank (0, 1 or 2).
    pub fn ordinal_in_group(self) -> u32 {
        match self {
            Lane::A | Lane::D => 0,
            Lane::B | Lane::E => 1,
            Lane::C | Lane::F => 2,
        }
    }
}

/// Logical stacking position: lane, 1-based slot index, tier letter.
///
/// Parsing only checks the grammar. Range checks against the lane group and
/// the configured tier count happen in [`map_slot`], so an address such as
/// `D8A` parses but never maps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotAddress {
    pub lane: Lane,
    pub index: u32,
    /// Uppercase tier letter, 'A' = ground level
    pub tier: char,
}

impl SlotAddress {
    pub fn new(lane: Lane, index: u32, tier: char) -> Self {
        Self {
            lane,
            index,
            tier: tier.to_ascii_uppercase(),
        }
    }

    /// Ground-level address.
    pub fn ground(lane: Lane, index: u32) -> Self {
        Self::new(lane, index, 'A')
    }

    /// Alphabetic position of the tier ('A' = 0).
    pub fn tier_index(&self) -> Option<u8> {
        if self.tier.is_ascii_uppercase() {
            Some(self.tier as u8 - b'A')
        } else {
            None
        }
    }

    /// The same lane and index one tier up.
    pub fn above(&self) -> Option<SlotAddress> {
        let next = self.tier_index()? + 1;
        if next >= 26 {
            return None;
        }
        Some(Self::new(self.lane, self.index, (b'A' + next) as char))
    }

    /// Range-check the address against its lane group and the tier limit.
    pub fn validate(&self, config: &YardLayoutConfig) -> Result<u8, InvalidSlotError> {
        let max = self.lane.group().max_index();
        if self.index == 0 || self.index > max {
            return Err(InvalidSlotError::IndexOutOfRange {
                lane: self.lane.letter(),
                index: self.index,
                max,
            });
        }

        let tier = self
            .tier_index()
            .ok_or(InvalidSlotError::InvalidTier(self.tier))?;
        if tier >= config.max_tiers {
            let top = (b'A' + config.max_tiers.saturating_sub(1)) as char;
            return Err(InvalidSlotError::TierOutOfRange {
                tier: self.tier,
                top,
            });
        }
        Ok(tier)
    }
}

impl FromStr for SlotAddress {
    type Err = InvalidSlotError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let s = raw.trim();
        let mut chars = s.chars().peekable();

        let lane_char = chars.next().ok_or(InvalidSlotError::Empty)?;
        let lane = Lane::from_letter(lane_char).ok_or(InvalidSlotError::UnknownLane(lane_char))?;

        let mut digits = String::new();
        while let Some(c) = chars.peek().copied() {
            if !c.is_ascii_digit() {
                break;
            }
            digits.push(c);
            chars.next();
        }
        if digits.is_empty() {
            return Err(InvalidSlotError::MissingIndex(s.to_string()));
        }
        // Too many digits to fit is still just an out-of-range index
        let index = digits.parse::<u32>().unwrap_or(u32::MAX);

        let tier = match chars.peek().copied() {
            Some(c) if c.is_ascii_alphabetic() => {
                chars.next();
                c.to_ascii_uppercase()
            }
            _ => 'A',
        };

        let rest: String = chars.collect();
        if !rest.is_empty() {
            return Err(InvalidSlotError::Trailing(rest));
        }

        Ok(SlotAddress::new(lane, index, tier))
    }
}

impl fmt::Display for SlotAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.lane.letter(), self.index, self.tier)
    }
}

/// World placement of a slot: floor-center position of the tier plus yaw.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldTransform {
    pub position: Vec3,
    /// Radians around +Y
    pub yaw: f32,
}

impl WorldTransform {
    pub fn rotation(&self) -> Quat {
        Quat::from_rotation_y(self.yaw)
    }
}

/// Map a slot address to its world transform.
///
/// Fails with [`InvalidSlotError`] when the index is outside its lane group's
/// range or the tier is above the configured top tier. Identical input always
/// yields a bit-identical transform.
pub fn map_slot(
    address: &SlotAddress,
    config: &YardLayoutConfig,
) -> Result<WorldTransform, InvalidSlotError> {
    let tier = address.validate(config)?;
    let group = address.lane.group();

    let along = config.slot_offset(group, address.index);
    let across = config.lane_offset(address.lane);
    let y = config.tier_offset(tier);

    let position = match group {
        LaneGroup::Front => Vec3::new(
            config.front_origin.x + along,
            y,
            config.front_origin.y + across,
        ),
        LaneGroup::Rear => Vec3::new(
            config.rear_origin.x + across,
            y,
            config.rear_origin.y + along,
        ),
    };

    Ok(WorldTransform {
        position,
        yaw: group.orientation().yaw(),
    })
}

/// Parse and map a raw slot string in one step.
pub fn map_raw_slot(
    raw: &str,
    config: &YardLayoutConfig,
) -> Result<(SlotAddress, WorldTransform), InvalidSlotError> {
    let address: SlotAddress = raw.parse()?;
    let transform = map_slot(&address, config)?;
    Ok((address, transform))
}

/// Find the nearest valid ground slot to a world XZ position.
///
/// Returns `None` when the point is further than one slot pitch from every
/// slot center. Used by build previews to snap onto the lane grid.
pub fn nearest_slot(point: Vec3, config: &YardLayoutConfig) -> Option<(SlotAddress, WorldTransform)> {
    let mut best: Option<(SlotAddress, WorldTransform, f32)> = None;

    for lane in Lane::FRONT.iter().chain(Lane::REAR.iter()) {
        for index in 1..=lane.group().max_index() {
            let address = SlotAddress::ground(*lane, index);
            let Ok(transform) = map_slot(&address, config) else {
                continue;
            };
            let d = (transform.position - point).with_y(0.0).length();
            if best.as_ref().is_none_or(|(_, _, bd)| d < *bd) {
                best = Some((address, transform, d));
            }
        }
    }

    best.filter(|(_, _, d)| *d <= config.slot_pitch)
        .map(|(address, transform, _)| (address, transform))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_and_without_tier() {
        let a: SlotAddress = "A1A".parse().unwrap();
        assert_eq!(a, SlotAddress::new(Lane::A, 1, 'A'));

        let b: SlotAddress = " c10 ".parse().unwrap();
        assert_eq!(b, SlotAddress::new(Lane::C, 10, 'A'));

        let c: SlotAddress = "e3c".parse().unwrap();
        assert_eq!(c.tier, 'C');
        assert_eq!(c.tier_index(), Some(2));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<SlotAddress>(), Err(InvalidSlotError::Empty));
        assert_eq!("G1".parse::<SlotAddress>(), Err(InvalidSlotError::UnknownLane('G')));
        assert!(matches!("AA".parse::<SlotAddress>(), Err(InvalidSlotError::MissingIndex(_))));
        assert!(matches!("A1A9".parse::<SlotAddress>(), Err(InvalidSlotError::Trailing(_))));
    }

    #[test]
    fn test_display_is_canonical() {
        let a: SlotAddress = "d7b".parse().unwrap();
        assert_eq!(a.to_string(), "D7B");
    }

    #[test]
    fn test_group_ranges() {
        let config = YardLayoutConfig::default();
        assert!(map_slot(&SlotAddress::ground(Lane::A, 10), &config).is_ok());
        assert!(map_slot(&SlotAddress::ground(Lane::D, 7), &config).is_ok());
        assert!(map_slot(&SlotAddress::ground(Lane::A, 11), &config).is_err());
        assert!(map_slot(&SlotAddress::ground(Lane::F, 8), &config).is_err());
        assert!(map_slot(&SlotAddress::ground(Lane::B, 0), &config).is_err());
    }

    #[test]
    fn test_rear_bank_is_rotated() {
        let config = YardLayoutConfig::default();
        let front = map_slot(&SlotAddress::ground(Lane::A, 1), &config).unwrap();
        let rear = map_slot(&SlotAddress::ground(Lane::D, 1), &config).unwrap();
        assert_eq!(front.yaw, 0.0);
        assert!((rear.yaw - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_front_index_runs_along_x() {
        let config = YardLayoutConfig::default();
        let s1 = map_slot(&SlotAddress::ground(Lane::B, 1), &config).unwrap();
        let s2 = map_slot(&SlotAddress::ground(Lane::B, 2), &config).unwrap();
        assert!((s2.position.x - s1.position.x - config.slot_pitch).abs() < 1e-4);
        assert_eq!(s1.position.z, s2.position.z);
    }

    #[test]
    fn test_rear_index_runs_along_z() {
        let config = YardLayoutConfig::default();
        let s1 = map_slot(&SlotAddress::ground(Lane::E, 1), &config).unwrap();
        let s2 = map_slot(&SlotAddress::ground(Lane::E, 2), &config).unwrap();
        assert!((s2.position.z - s1.position.z - config.slot_pitch).abs() < 1e-4);
        assert_eq!(s1.position.x, s2.position.x);
    }

    #[test]
    fn test_tier_height() {
        let config = YardLayoutConfig::default();
        let t = map_slot(&SlotAddress::new(Lane::A, 1, 'C'), &config).unwrap();
        assert!((t.position.y - 2.0 * config.tier_height).abs() < 1e-5);
    }

    #[test]
    fn test_tier_limit() {
        let config = YardLayoutConfig::default();
        let too_high = SlotAddress::new(Lane::A, 1, 'F');
        assert!(matches!(
            map_slot(&too_high, &config),
            Err(InvalidSlotError::TierOutOfRange { .. })
        ));
    }

    #[test]
    fn test_above() {
        let a = SlotAddress::new(Lane::A, 3, 'A');
        assert_eq!(a.above(), Some(SlotAddress::new(Lane::A, 3, 'B')));
    }

    #[test]
    fn test_nearest_slot_snaps() {
        let config = YardLayoutConfig::default();
        let target = map_slot(&SlotAddress::ground(Lane::B, 4), &config).unwrap();
        let (addr, _) = nearest_slot(target.position + Vec3::new(1.0, 0.0, 0.4), &config).unwrap();
        assert_eq!(addr, SlotAddress::ground(Lane::B, 4));
        assert!(nearest_slot(Vec3::new(-500.0, 0.0, -500.0), &config).is_none());
    }
}
