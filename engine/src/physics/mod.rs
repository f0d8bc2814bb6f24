//! Physics module
//!
//! Geometry queries for the yard: ray/box intersection, the per-layer
//! collision index, and ground probing for the walking camera. There is no
//! rigid-body simulation; containers are static boxes.
//!
//! # Unit System
//!
//! **1 unit = 1 meter**, Y is up.
//!
//! # Submodules
//!
//! - [`collision`] - `Aabb` and slab-method ray intersection
//! - [`ground`] - `GroundProbe` trait used by the first-person walker
//! - [`spatial_index`] - Uniform-grid index over a built layer

pub mod collision;
pub mod ground;
pub mod spatial_index;

pub use collision::{Aabb, aabb_surface_normal, ray_aabb_intersect, ray_aabb_span};
pub use ground::{FlatGround, GroundProbe};
pub use spatial_index::{DEFAULT_CELL_SIZE, IndexHit, SpatialIndex};
