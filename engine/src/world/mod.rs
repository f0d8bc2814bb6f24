//! World Module
//!
//! Yard-space data: container records, the layout constants, and the slot
//! address mapping that turns a logical stacking position into a world
//! transform.
//!
//! ## Yard Layout
//! Two perpendicular lane banks. The front bank (A-C) runs along +X, the rear
//! bank (D-F) along +Z. Tier 'A' is ground level (Y = 0).

pub mod layout;
pub mod records;
pub mod slot;

pub use layout::{ContainerDims, DimensionTable, YardBounds, YardLayoutConfig};
pub use records::{ContainerRecord, ContainerStatus, RecordRef, SizeClass};
pub use slot::{
    InvalidSlotError, Lane, LaneGroup, Orientation, SlotAddress, WorldTransform, map_raw_slot,
    map_slot, nearest_slot,
};
