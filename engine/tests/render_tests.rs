//! Render Tests - Shader Validation and GPU Layouts
//!
//! The WGSL source is parsed and validated with naga so a broken shader fails
//! here instead of at pipeline creation. Struct layouts on the Rust side are
//! checked against the shader's view of them.

use naga::valid::{Capabilities, ValidationFlags, Validator};
use naga::{Expression, Literal, Module, ShaderStage, TypeInner};

use yard_engine::render::{
    ContainerInstance, FLAG_HIGHLIGHT, FLAG_PENDING, FLAG_PREVIEW, YardUniforms,
    instance_buffer_layout, pack_rgba, unpack_rgba,
};

const YARD_WGSL: &str = include_str!("../../shaders/yard.wgsl");

fn parse_yard() -> Module {
    match naga::front::wgsl::parse_str(YARD_WGSL) {
        Ok(module) => module,
        Err(e) => panic!("yard.wgsl failed to parse:\n{}", e.emit_to_string(YARD_WGSL)),
    }
}

fn struct_span(module: &Module, name: &str) -> u32 {
    module
        .types
        .iter()
        .find_map(|(_, ty)| match (&ty.name, &ty.inner) {
            (Some(n), TypeInner::Struct { span, .. }) if n == name => Some(*span),
            _ => None,
        })
        .unwrap_or_else(|| panic!("struct {} not found", name))
}

fn u32_constant(module: &Module, name: &str) -> u32 {
    let constant = module
        .constants
        .iter()
        .find_map(|(_, c)| (c.name.as_deref() == Some(name)).then_some(c))
        .unwrap_or_else(|| panic!("constant {} not found", name));
    match module.global_expressions[constant.init] {
        Expression::Literal(Literal::U32(v)) => v,
        ref other => panic!("constant {} is not a u32 literal: {:?}", name, other),
    }
}

// ============================================================================
// Shader
// ============================================================================

#[test]
fn test_yard_shader_validates() {
    let module = parse_yard();
    let mut validator = Validator::new(ValidationFlags::all(), Capabilities::empty());
    if let Err(e) = validator.validate(&module) {
        panic!("yard.wgsl failed validation: {:?}", e);
    }
}

#[test]
fn test_yard_shader_entry_points() {
    let module = parse_yard();
    let expected = [
        ("vs_box", ShaderStage::Vertex),
        ("fs_box", ShaderStage::Fragment),
        ("vs_ring", ShaderStage::Vertex),
        ("fs_ring", ShaderStage::Fragment),
        ("vs_crosshair", ShaderStage::Vertex),
        ("fs_crosshair", ShaderStage::Fragment),
    ];
    for (name, stage) in expected {
        assert!(
            module
                .entry_points
                .iter()
                .any(|ep| ep.name == name && ep.stage == stage),
            "missing entry point {}",
            name
        );
    }
}

#[test]
fn test_uniform_layout_matches_shader() {
    let module = parse_yard();
    assert_eq!(struct_span(&module, "Uniforms") as usize, std::mem::size_of::<YardUniforms>());
}

#[test]
fn test_instance_flags_match_shader() {
    let module = parse_yard();
    assert_eq!(u32_constant(&module, "FLAG_HIGHLIGHT"), FLAG_HIGHLIGHT);
    assert_eq!(u32_constant(&module, "FLAG_PENDING"), FLAG_PENDING);
    assert_eq!(u32_constant(&module, "FLAG_PREVIEW"), FLAG_PREVIEW);
}

// ============================================================================
// Instance data
// ============================================================================

#[test]
fn test_struct_sizes() {
    assert_eq!(std::mem::size_of::<ContainerInstance>(), 48);
    assert_eq!(std::mem::size_of::<YardUniforms>(), 160);
}

#[test]
fn test_instance_layout_covers_shader_locations() {
    let layout = instance_buffer_layout();
    assert_eq!(layout.array_stride, 48);
    assert_eq!(layout.step_mode, wgpu::VertexStepMode::Instance);

    let locations: Vec<u32> = layout.attributes.iter().map(|a| a.shader_location).collect();
    assert_eq!(locations, vec![2, 3, 4, 5]);
    assert!(layout.attributes.iter().all(|a| a.offset < 48));
}

#[test]
fn test_instance_bytes() {
    let instance =
        ContainerInstance::new([1.0, 2.0, 3.0], 0.5, [12.19, 2.59, 2.44], pack_rgba(10, 20, 30, 255))
            .with_flags(FLAG_PENDING);
    let bytes: &[u8] = bytemuck::bytes_of(&instance);
    assert_eq!(bytes.len(), 48);

    let tint = u32::from_ne_bytes([bytes[32], bytes[33], bytes[34], bytes[35]]);
    let flags = u32::from_ne_bytes([bytes[36], bytes[37], bytes[38], bytes[39]]);
    assert_eq!(unpack_rgba(tint), (10, 20, 30, 255));
    assert_eq!(flags, FLAG_PENDING);
}
