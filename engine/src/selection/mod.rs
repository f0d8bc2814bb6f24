//! Selection
//!
//! Ray hit-testing over batched and directly placed objects, single-highlight
//! bookkeeping, and the pulsing marker under the selected container.

pub mod engine;
pub mod marker;
pub mod pick;

pub use engine::{Highlight, SelectionCallback, SelectionConfig, SelectionEngine};
pub use marker::{MarkerConfig, SelectionMarker};
pub use pick::{DirectRef, NodeId, PickHit, PickOwner, PickRegistry, PickTarget};
