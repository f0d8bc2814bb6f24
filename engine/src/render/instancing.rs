//! GPU Instance Buffer System for Container Rendering
//!
//! GPU-compatible instance records for drawing containers as instanced unit
//! cubes. One instance buffer per render group; the draw call count is the
//! number of groups, not the number of containers.

use wgpu::util::DeviceExt;

/// Instance flag: this instance is the selection highlight.
pub const FLAG_HIGHLIGHT: u32 = 1 << 0;
/// Instance flag: pending status, drawn slightly translucent.
pub const FLAG_PENDING: u32 = 1 << 1;
/// Instance flag: build preview ghost.
pub const FLAG_PREVIEW: u32 = 1 << 2;

/// GPU instance data for a single container box.
///
/// Layout (48 bytes total, 16-byte aligned for GPU compatibility):
/// - position:   vec3<f32> (12 bytes) - Box center in world space
/// - yaw:        f32 (4 bytes) - Rotation around +Y in radians
/// - size:       vec3<f32> (12 bytes) - Length, height, width (container-local)
/// - scale:      f32 (4 bytes) - Uniform scale (pulse animation)
/// - tint_color: u32 (4 bytes) - Packed RGBA color (8 bits per channel)
/// - flags:      u32 (4 bytes) - `FLAG_*` bits
/// - _pad:       2 x u32 (8 bytes)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ContainerInstance {
    pub position: [f32; 3],
    pub yaw: f32,
    pub size: [f32; 3],
    pub scale: f32,
    /// Packed RGBA tint color (0xRRGGBBAA format)
    pub tint_color: u32,
    pub flags: u32,
    pub _pad: [u32; 2],
}

// Compile-time assertion to verify struct size is exactly 48 bytes
const _: () = {
    assert!(
        std::mem::size_of::<ContainerInstance>() == 48,
        "ContainerInstance must be exactly 48 bytes for GPU instancing"
    );
};

impl Default for ContainerInstance {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            yaw: 0.0,
            size: [1.0; 3],
            scale: 1.0,
            tint_color: 0xFFFFFFFF,
            flags: 0,
            _pad: [0; 2],
        }
    }
}

impl ContainerInstance {
    pub fn new(position: [f32; 3], yaw: f32, size: [f32; 3], tint_color: u32) -> Self {
        Self {
            position,
            yaw,
            size,
            tint_color,
            ..Default::default()
        }
    }

    /// Set flags and return self for chaining.
    pub fn with_flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    pub fn has_flag(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }

    pub fn set_flag(&mut self, flag: u32, on: bool) {
        if on {
            self.flags |= flag;
        } else {
            self.flags &= !flag;
        }
    }
}

/// Pack RGBA color components into a single u32 value.
/// Format: 0xRRGGBBAA
#[inline]
pub fn pack_rgba(r: u8, g: u8, b: u8, a: u8) -> u32 {
    ((r as u32) << 24) | ((g as u32) << 16) | ((b as u32) << 8) | (a as u32)
}

/// Unpack a u32 color value into RGBA components.
#[inline]
pub fn unpack_rgba(packed: u32) -> (u8, u8, u8, u8) {
    let r = ((packed >> 24) & 0xFF) as u8;
    let g = ((packed >> 16) & 0xFF) as u8;
    let b = ((packed >> 8) & 0xFF) as u8;
    let a = (packed & 0xFF) as u8;
    (r, g, b, a)
}

/// Create a GPU instance buffer initialized with the given instances.
///
/// Empty groups still get a one-instance buffer so the handle is always valid.
pub fn create_instance_buffer_init(
    device: &wgpu::Device,
    instances: &[ContainerInstance],
    label: Option<&str>,
) -> wgpu::Buffer {
    let fallback = [ContainerInstance::default()];
    let contents: &[ContainerInstance] = if instances.is_empty() { &fallback } else { instances };
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label,
        contents: bytemuck::cast_slice(contents),
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
    })
}

/// Overwrite an instance buffer from `offset_instances` on.
pub fn update_instance_buffer(
    queue: &wgpu::Queue,
    buffer: &wgpu::Buffer,
    instances: &[ContainerInstance],
    offset_instances: usize,
) {
    let offset_bytes = (offset_instances * std::mem::size_of::<ContainerInstance>()) as u64;
    queue.write_buffer(buffer, offset_bytes, bytemuck::cast_slice(instances));
}

/// Vertex buffer layout for ContainerInstance (slot 1, after the cube mesh).
pub fn instance_buffer_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<ContainerInstance>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &[
            // position + yaw: vec4<f32> at offset 0
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x4,
                offset: 0,
                shader_location: 2,
            },
            // size + scale: vec4<f32> at offset 16
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x4,
                offset: 16,
                shader_location: 3,
            },
            // tint_color: u32 at offset 32
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Uint32,
                offset: 32,
                shader_location: 4,
            },
            // flags: u32 at offset 36
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Uint32,
                offset: 36,
                shader_location: 5,
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_instance_size() {
        assert_eq!(std::mem::size_of::<ContainerInstance>(), 48);
    }

    #[test]
    fn test_default_instance() {
        let instance = ContainerInstance::default();
        assert_eq!(instance.scale, 1.0);
        assert_eq!(instance.tint_color, 0xFFFFFFFF);
        assert_eq!(instance.flags, 0);
    }

    #[test]
    fn test_pack_rgba_layout() {
        assert_eq!(pack_rgba(0x12, 0x34, 0x56, 0x78), 0x12345678);
        assert_eq!(unpack_rgba(0xFF8040C8), (255, 128, 64, 200));
    }

    #[test]
    fn test_flags() {
        let mut instance = ContainerInstance::default().with_flags(FLAG_PENDING);
        instance.set_flag(FLAG_HIGHLIGHT, true);
        assert!(instance.has_flag(FLAG_PENDING));
        assert!(instance.has_flag(FLAG_HIGHLIGHT));
        instance.set_flag(FLAG_HIGHLIGHT, false);
        assert!(!instance.has_flag(FLAG_HIGHLIGHT));
    }

    #[test]
    fn test_layout_stride() {
        let layout = instance_buffer_layout();
        assert_eq!(layout.array_stride, 48);
        assert_eq!(layout.step_mode, wgpu::VertexStepMode::Instance);
    }
}
