//! Build tool: placeable object kinds and the place/remove bridge.

pub mod bridge;
pub mod objects;

pub use bridge::{BuildBridge, BuildCallback, BuildConfig, LOCAL_CARRIER, Preview, PreviewTarget};
pub use objects::{
    BuildEvent, BuildObjectKind, ObjectId, ObjectPart, PlacementMode, ROTATION_STEP, YardObject,
    object_parts,
};
