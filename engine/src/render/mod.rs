//! Render Module
//!
//! Container batching and the wgpu pass that draws it. Layer building and
//! instance data are plain CPU code; only [`gpu_context`] and [`yard_pass`]
//! talk to the GPU.

pub mod frame;
pub mod gpu_context;
pub mod instancing;
pub mod layer;
pub mod palette;
pub mod pulse;
pub mod yard_pass;

pub use frame::{FrameView, HeadlessRenderer, MarkerView, RenderError, SceneRenderer};
pub use gpu_context::{DEPTH_FORMAT, GpuBackend, GpuContext, GpuContextConfig};
pub use instancing::{
    ContainerInstance, FLAG_HIGHLIGHT, FLAG_PENDING, FLAG_PREVIEW, create_instance_buffer_init,
    instance_buffer_layout, pack_rgba, unpack_rgba, update_instance_buffer,
};
pub use layer::{
    BatchRef, GroupKey, InstanceRef, LayerBuilder, RenderGroup, SkippedRecord, SlotCollision,
    YardLayer, index_from_entries,
};
pub use palette::{ALARM_COLOR, HIGHLIGHT_COLOR, carrier_color, status_color};
pub use pulse::PulseConfig;
pub use yard_pass::{YardRenderer, YardUniforms};
