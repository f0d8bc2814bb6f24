//! Scene
//!
//! Owns the scene context and drives it: refresh from a record source on a
//! background worker, input routing, the per-frame tick and the draw.

pub mod context;
pub mod deferred;
pub mod refresh;
pub mod source;
pub mod yard_scene;

pub use context::SceneContext;
pub use deferred::{Deferred, Poll, Resolver, deferred};
pub use refresh::{RefreshCommand, RefreshEvent, RefreshWorker};
pub use source::{JsonFileSource, RecordSource, SourceError, StaticSource, decode_records};
pub use yard_scene::{SceneConfig, YardScene};
