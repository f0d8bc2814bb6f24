//! Yard Render Pass
//!
//! wgpu renderer for the yard: instanced container boxes (one draw call per
//! render group plus one for directly placed objects), the selection ring and
//! the first-person crosshair.
//!
//! Instance buffers are owned per layer generation. When a new layer arrives
//! every group buffer is recreated; within a generation only groups that
//! report dirty are re-uploaded.

use std::sync::Arc;

use glam::{Mat4, Vec3};
use winit::window::Window;

use super::frame::{FrameView, MarkerView, RenderError, SceneRenderer};
use super::gpu_context::{DEPTH_FORMAT, GpuContext, GpuContextConfig};
use super::instancing::{
    ContainerInstance, create_instance_buffer_init, instance_buffer_layout, update_instance_buffer,
};

const SHADER_SOURCE: &str = include_str!("../../../shaders/yard.wgsl");

const RING_SEGMENTS: usize = 48;
const RING_INNER: f32 = 0.75;

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.55,
    g: 0.68,
    b: 0.80,
    a: 1.0,
};

/// Cube vertex (unit cube centered at the origin)
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BoxVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// Uniforms shared by every pipeline in the pass
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct YardUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 3],
    pub time: f32,
    pub sun_dir: [f32; 3],
    pub ambient: f32,
    pub light_pos: [f32; 3],
    pub light_intensity: f32,
    pub light_color: [f32; 3],
    pub aspect: f32,
    pub ring_center: [f32; 3],
    pub ring_radius: f32,
    pub ring_color: [f32; 4],
}

static_assertions::assert_eq_size!(YardUniforms, [u8; 160]);

impl Default for YardUniforms {
    fn default() -> Self {
        Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            camera_pos: [0.0; 3],
            time: 0.0,
            sun_dir: [0.4, 0.85, 0.35],
            ambient: 0.35,
            light_pos: [0.0; 3],
            light_intensity: 0.0,
            light_color: [1.0; 3],
            aspect: 16.0 / 9.0,
            ring_center: [0.0; 3],
            ring_radius: 0.0,
            ring_color: [1.0, 0.88, 0.25, 0.0],
        }
    }
}

impl YardUniforms {
    fn apply_marker(&mut self, marker: Option<&MarkerView>) {
        match marker {
            Some(m) => {
                self.light_pos = m.light_position.to_array();
                self.light_color = m.light_color;
                self.light_intensity = m.light_intensity;
                self.ring_center = m.center.to_array();
                self.ring_radius = m.radius;
                self.ring_color[3] = m.opacity;
            }
            None => {
                self.light_intensity = 0.0;
                self.ring_radius = 0.0;
                self.ring_color[3] = 0.0;
            }
        }
    }
}

/// Unit cube: 24 vertices (flat normals per face), 36 indices.
pub fn box_geometry() -> (Vec<BoxVertex>, Vec<u16>) {
    // (normal, u, v) with u x v = normal so each face winds counter-clockwise
    let faces = [
        (Vec3::X, Vec3::Y, Vec3::Z),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::Z, Vec3::X),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::Y, Vec3::X),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, u, v) in faces {
        let base = vertices.len() as u16;
        for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let p = (normal + u * su + v * sv) * 0.5;
            vertices.push(BoxVertex {
                position: p.to_array(),
                normal: normal.to_array(),
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    (vertices, indices)
}

/// Flat annulus in XZ with outer radius 1, as a triangle list.
pub fn ring_geometry() -> Vec<[f32; 2]> {
    let mut vertices = Vec::with_capacity(RING_SEGMENTS * 6);
    for i in 0..RING_SEGMENTS {
        let a0 = i as f32 / RING_SEGMENTS as f32 * std::f32::consts::TAU;
        let a1 = (i + 1) as f32 / RING_SEGMENTS as f32 * std::f32::consts::TAU;
        let (s0, c0) = a0.sin_cos();
        let (s1, c1) = a1.sin_cos();
        let outer0 = [c0, s0];
        let outer1 = [c1, s1];
        let inner0 = [c0 * RING_INNER, s0 * RING_INNER];
        let inner1 = [c1 * RING_INNER, s1 * RING_INNER];
        vertices.extend_from_slice(&[inner0, outer0, outer1, inner0, outer1, inner1]);
    }
    vertices
}

struct GroupBuffer {
    buffer: wgpu::Buffer,
    count: u32,
}

struct GpuState {
    ctx: GpuContext,
    box_pipeline: wgpu::RenderPipeline,
    ring_pipeline: wgpu::RenderPipeline,
    crosshair_pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    uniform_buffer: wgpu::Buffer,
    box_vertices: wgpu::Buffer,
    box_indices: wgpu::Buffer,
    box_index_count: u32,
    ring_vertices: wgpu::Buffer,
    ring_vertex_count: u32,
    groups: Vec<GroupBuffer>,
    groups_generation: Option<u64>,
    direct: wgpu::Buffer,
    direct_capacity: usize,
    uniforms: YardUniforms,
}

/// The viewer's renderer. All GPU objects live in one optional state block so
/// `release` can drop them in one step.
pub struct YardRenderer {
    state: Option<GpuState>,
}

impl YardRenderer {
    pub fn new(window: Arc<Window>, config: GpuContextConfig) -> Result<Self, RenderError> {
        let ctx = GpuContext::new(window, config)?;
        Ok(Self {
            state: Some(GpuState::new(ctx)),
        })
    }

    pub fn is_released(&self) -> bool {
        self.state.is_none()
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.state.as_ref().map(|s| s.ctx.dimensions())
    }
}

impl SceneRenderer for YardRenderer {
    fn draw(&mut self, frame: FrameView<'_>) -> Result<(), RenderError> {
        match self.state.as_mut() {
            Some(state) => state.draw(frame),
            None => Ok(()),
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        if let Some(state) = self.state.as_mut() {
            state.ctx.resize(width, height);
        }
    }

    fn release(&mut self) {
        if self.state.take().is_some() {
            log::info!("Yard renderer released");
        }
    }
}

impl GpuState {
    fn new(ctx: GpuContext) -> Self {
        let device = &ctx.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Yard Shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER_SOURCE.into()),
        });

        let uniforms = YardUniforms::default();
        let uniform_buffer = ctx.buffer_init(
            "Yard Uniform Buffer",
            std::slice::from_ref(&uniforms),
            wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        );

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Yard Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Yard Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Yard Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let format = ctx.format();

        let box_layout = wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<BoxVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x3,
                    offset: 0,
                    shader_location: 0,
                },
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x3,
                    offset: 12,
                    shader_location: 1,
                },
            ],
        };

        let box_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Yard Box Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_box"),
                buffers: &[box_layout, instance_buffer_layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_box"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(depth_state(true, wgpu::CompareFunction::Less)),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let ring_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Yard Ring Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_ring"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<[f32; 2]>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &[wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32x2,
                        offset: 0,
                        shader_location: 0,
                    }],
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_ring"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(depth_state(false, wgpu::CompareFunction::Less)),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let crosshair_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Yard Crosshair Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_crosshair"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_crosshair"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(depth_state(false, wgpu::CompareFunction::Always)),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let (box_verts, box_idx) = box_geometry();
        let box_vertices = ctx.buffer_init("Yard Box Vertices", &box_verts, wgpu::BufferUsages::VERTEX);
        let box_indices = ctx.buffer_init("Yard Box Indices", &box_idx, wgpu::BufferUsages::INDEX);
        let ring = ring_geometry();
        let ring_vertices = ctx.buffer_init("Yard Ring Vertices", &ring, wgpu::BufferUsages::VERTEX);

        let direct_capacity = 64;
        let direct = create_direct_buffer(&ctx.device, direct_capacity);

        log::info!("Yard renderer initialized ({:?})", format);

        Self {
            box_pipeline,
            ring_pipeline,
            crosshair_pipeline,
            bind_group,
            uniform_buffer,
            box_vertices,
            box_indices,
            box_index_count: box_idx.len() as u32,
            ring_vertices,
            ring_vertex_count: ring.len() as u32,
            groups: Vec::new(),
            groups_generation: None,
            direct,
            direct_capacity,
            uniforms,
            ctx,
        }
    }

    /// Bring group buffers in line with the layer: rebuild on a new generation,
    /// otherwise re-upload only dirty groups.
    fn sync_groups(&mut self, frame: &mut FrameView<'_>) {
        let generation = frame.layer.generation();
        if self.groups_generation != Some(generation) {
            self.groups = frame
                .layer
                .groups_mut()
                .iter_mut()
                .map(|group| {
                    group.take_dirty();
                    GroupBuffer {
                        buffer: create_instance_buffer_init(
                            &self.ctx.device,
                            group.instances(),
                            Some("Yard Group Instances"),
                        ),
                        count: group.len() as u32,
                    }
                })
                .collect();
            self.groups_generation = Some(generation);
            log::debug!(
                "Uploaded layer {} ({} groups)",
                generation,
                self.groups.len()
            );
            return;
        }

        for (group, gpu) in frame.layer.groups_mut().iter_mut().zip(&self.groups) {
            if group.take_dirty() {
                update_instance_buffer(&self.ctx.queue, &gpu.buffer, group.instances(), 0);
            }
        }
    }

    fn sync_direct(&mut self, direct: &[ContainerInstance]) {
        if direct.len() > self.direct_capacity {
            self.direct_capacity = direct.len().next_power_of_two();
            self.direct = create_direct_buffer(&self.ctx.device, self.direct_capacity);
        }
        if !direct.is_empty() {
            update_instance_buffer(&self.ctx.queue, &self.direct, direct, 0);
        }
    }

    fn draw(&mut self, mut frame: FrameView<'_>) -> Result<(), RenderError> {
        let Some(output) = self.ctx.acquire()? else {
            return Ok(());
        };

        self.sync_groups(&mut frame);
        self.sync_direct(frame.direct);

        let (width, height) = self.ctx.dimensions();
        self.uniforms.view_proj = frame.view_proj.to_cols_array_2d();
        self.uniforms.camera_pos = frame.eye.to_array();
        self.uniforms.time = frame.time;
        self.uniforms.aspect = width as f32 / height.max(1) as f32;
        self.uniforms.apply_marker(frame.marker.as_ref());
        self.ctx
            .queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&self.uniforms));

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Yard Render Encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Yard Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.ctx.depth_view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_bind_group(0, &self.bind_group, &[]);

            pass.set_pipeline(&self.box_pipeline);
            pass.set_vertex_buffer(0, self.box_vertices.slice(..));
            pass.set_index_buffer(self.box_indices.slice(..), wgpu::IndexFormat::Uint16);
            for group in self.groups.iter().filter(|g| g.count > 0) {
                pass.set_vertex_buffer(1, group.buffer.slice(..));
                pass.draw_indexed(0..self.box_index_count, 0, 0..group.count);
            }
            if !frame.direct.is_empty() {
                pass.set_vertex_buffer(1, self.direct.slice(..));
                pass.draw_indexed(0..self.box_index_count, 0, 0..frame.direct.len() as u32);
            }

            if frame.marker.is_some() {
                pass.set_pipeline(&self.ring_pipeline);
                pass.set_vertex_buffer(0, self.ring_vertices.slice(..));
                pass.draw(0..self.ring_vertex_count, 0..1);
            }

            if frame.crosshair {
                pass.set_pipeline(&self.crosshair_pipeline);
                pass.draw(0..12, 0..1);
            }
        }

        self.ctx.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

fn depth_state(write: bool, compare: wgpu::CompareFunction) -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: write,
        depth_compare: compare,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

fn create_direct_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Yard Direct Instances"),
        size: (capacity * std::mem::size_of::<ContainerInstance>()) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}
