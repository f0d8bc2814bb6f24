//! Yard Engine Library
//!
//! Spatial engine for a container yard viewer: slot addresses mapped to
//! world transforms, instanced container layers rebuilt from an external
//! record set, orbit/first-person cameras, ray selection and an in-scene
//! build tool. Everything except `render::gpu_context` and
//! `render::yard_pass` is window-system agnostic state and math.
//!
//! # Modules
//!
//! - [`world`] - Records, yard layout and slot address mapping
//! - [`physics`] - Boxes, ray intersection, collision index, ground probing
//! - [`camera`] - Orbit, auto-orbit and first-person cameras plus the mode controller
//! - [`render`] - Layer builder, instance data, frame description and the wgpu renderer
//! - [`selection`] - Pick registry, single-highlight selection and marker
//! - [`build`] - Place/remove preview and commit
//! - [`input`] - Generic key/pointer events, bindings and the input router
//! - [`scene`] - Scene context, background refresh and the per-frame driver
//! - [`config`] - JSON viewer configuration
//!
//! # Example
//!
//! ```ignore
//! use yard_engine::camera::Viewport;
//! use yard_engine::config::ViewerConfig;
//! use yard_engine::render::HeadlessRenderer;
//! use yard_engine::scene::{StaticSource, YardScene};
//!
//! let config = ViewerConfig::default();
//! let mut scene = YardScene::new(&config, Viewport::new(1280, 720));
//! scene.attach_source(Box::new(StaticSource::new(records)))?;
//! scene.request_refresh();
//!
//! let mut renderer = HeadlessRenderer::default();
//! loop {
//!     scene.tick(1.0 / 60.0);
//!     scene.render(&mut renderer)?;
//! }
//! ```

pub mod build;
pub mod camera;
pub mod config;
pub mod input;
pub mod physics;
pub mod render;
pub mod scene;
pub mod selection;
pub mod world;

pub use config::ViewerConfig;
pub use scene::YardScene;
pub use world::{ContainerRecord, ContainerStatus, RecordRef, SizeClass, SlotAddress, map_slot};
