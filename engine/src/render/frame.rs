//! Frame description handed from the scene loop to a renderer.
//!
//! The scene never touches GPU objects directly. Each tick it fills a
//! [`FrameView`] and passes it to whatever [`SceneRenderer`] is installed:
//! the wgpu [`YardRenderer`](super::yard_pass::YardRenderer) in the viewer, or
//! [`HeadlessRenderer`] in tests.

use glam::{Mat4, Vec3};
use thiserror::Error;

use super::instancing::ContainerInstance;
use super::layer::YardLayer;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to create surface: {0}")]
    Surface(String),
    #[error("no compatible GPU adapter found")]
    NoAdapter,
    #[error("failed to create GPU device: {0}")]
    Device(String),
    #[error("surface texture unavailable: {0}")]
    Frame(String),
}

/// Selection marker: flat ring at the container footprint plus a point light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerView {
    /// Ring center (on top of the ground/tier floor)
    pub center: Vec3,
    /// Ring outer radius after pulse scaling
    pub radius: f32,
    pub opacity: f32,
    pub light_position: Vec3,
    /// Linear RGB
    pub light_color: [f32; 3],
    pub light_intensity: f32,
}

/// Everything a renderer needs for one frame.
pub struct FrameView<'a> {
    pub view_proj: Mat4,
    pub eye: Vec3,
    /// Scene clock in seconds
    pub time: f32,
    /// Batched containers; the renderer re-uploads groups reporting dirty
    pub layer: &'a mut YardLayer,
    /// Directly placed objects and the build preview, drawn as one extra batch
    pub direct: &'a [ContainerInstance],
    pub marker: Option<MarkerView>,
    /// Draw the first-person crosshair
    pub crosshair: bool,
}

impl FrameView<'_> {
    /// Draw calls this frame: one per group, one for direct objects, one ring.
    pub fn draw_calls(&self) -> usize {
        self.layer.draw_call_count()
            + usize::from(!self.direct.is_empty())
            + usize::from(self.marker.is_some())
    }
}

/// Something that can present a frame.
pub trait SceneRenderer {
    fn draw(&mut self, frame: FrameView<'_>) -> Result<(), RenderError>;

    /// Surface size changed. Must not touch anything but size-dependent state.
    fn resize(&mut self, width: u32, height: u32);

    /// Drop every GPU resource. Safe to call more than once.
    fn release(&mut self);
}

/// Renderer that records what it was asked to draw. Used in tests and when
/// the viewer runs without a surface.
#[derive(Debug, Default, Clone)]
pub struct HeadlessRenderer {
    pub frames: u64,
    pub last_draw_calls: usize,
    pub last_instances: usize,
    pub last_generation: u64,
    pub last_marker: Option<MarkerView>,
    pub size: (u32, u32),
    pub released: bool,
}

impl SceneRenderer for HeadlessRenderer {
    fn draw(&mut self, frame: FrameView<'_>) -> Result<(), RenderError> {
        self.frames += 1;
        self.last_draw_calls = frame.draw_calls();
        self.last_instances = frame.layer.instance_count() + frame.direct.len();
        self.last_generation = frame.layer.generation();
        self.last_marker = frame.marker;
        for group in frame.layer.groups_mut() {
            group.take_dirty();
        }
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn release(&mut self) {
        self.released = true;
    }
}
