//! Unit tests for the engine-to-Vulkan enum translations

use crate::vulkan_mappings::*;
use ash::vk;
use nova_render_engine::nova::render::{
    CompareFunction, CullMode, FilterOptions, PolygonMode, PrimitiveKind, SceneBlendFactor,
    SceneBlendOperation, ShaderStage, StencilOperation, TextureAddressingMode,
};

#[test]
fn test_blend_factor_mapping() {
    assert_eq!(blend_factor(SceneBlendFactor::One), vk::BlendFactor::ONE);
    assert_eq!(blend_factor(SceneBlendFactor::Zero), vk::BlendFactor::ZERO);
    assert_eq!(
        blend_factor(SceneBlendFactor::SourceAlpha),
        vk::BlendFactor::SRC_ALPHA
    );
    assert_eq!(
        blend_factor(SceneBlendFactor::OneMinusSourceAlpha),
        vk::BlendFactor::ONE_MINUS_SRC_ALPHA
    );
    assert_eq!(
        blend_factor(SceneBlendFactor::OneMinusDestColor),
        vk::BlendFactor::ONE_MINUS_DST_COLOR
    );
}

#[test]
fn test_blend_op_mapping() {
    assert_eq!(blend_op(SceneBlendOperation::Add), vk::BlendOp::ADD);
    assert_eq!(
        blend_op(SceneBlendOperation::ReverseSubtract),
        vk::BlendOp::REVERSE_SUBTRACT
    );
    assert_eq!(blend_op(SceneBlendOperation::Min), vk::BlendOp::MIN);
}

#[test]
fn test_compare_op_mapping() {
    assert_eq!(compare_op(CompareFunction::AlwaysFail), vk::CompareOp::NEVER);
    assert_eq!(
        compare_op(CompareFunction::AlwaysPass),
        vk::CompareOp::ALWAYS
    );
    assert_eq!(
        compare_op(CompareFunction::LessEqual),
        vk::CompareOp::LESS_OR_EQUAL
    );
    assert_eq!(
        compare_op(CompareFunction::GreaterEqual),
        vk::CompareOp::GREATER_OR_EQUAL
    );
}

#[test]
fn test_stencil_op_mapping() {
    assert_eq!(
        stencil_op(StencilOperation::Increment),
        vk::StencilOp::INCREMENT_AND_CLAMP
    );
    assert_eq!(
        stencil_op(StencilOperation::DecrementWrap),
        vk::StencilOp::DECREMENT_AND_WRAP
    );
    assert_eq!(stencil_op(StencilOperation::Invert), vk::StencilOp::INVERT);
}

#[test]
fn test_rasterizer_mappings() {
    assert_eq!(cull_mode(CullMode::None), vk::CullModeFlags::NONE);
    assert_eq!(cull_mode(CullMode::Front), vk::CullModeFlags::FRONT);
    assert_eq!(cull_mode(CullMode::Back), vk::CullModeFlags::BACK);

    assert_eq!(polygon_mode(PolygonMode::Solid), vk::PolygonMode::FILL);
    assert_eq!(polygon_mode(PolygonMode::Wireframe), vk::PolygonMode::LINE);
    assert_eq!(polygon_mode(PolygonMode::Points), vk::PolygonMode::POINT);
}

#[test]
fn test_sampler_mappings() {
    assert_eq!(
        address_mode(TextureAddressingMode::Wrap),
        vk::SamplerAddressMode::REPEAT
    );
    assert_eq!(
        address_mode(TextureAddressingMode::Border),
        vk::SamplerAddressMode::CLAMP_TO_BORDER
    );

    assert_eq!(filter(FilterOptions::Point), vk::Filter::NEAREST);
    assert_eq!(filter(FilterOptions::Linear), vk::Filter::LINEAR);
    assert_eq!(filter(FilterOptions::Anisotropic), vk::Filter::LINEAR);
    assert_eq!(
        mipmap_mode(FilterOptions::None),
        vk::SamplerMipmapMode::NEAREST
    );
}

#[test]
fn test_primitive_topology_mapping() {
    assert_eq!(
        primitive_topology(PrimitiveKind::TriangleList),
        vk::PrimitiveTopology::TRIANGLE_LIST
    );
    assert_eq!(
        primitive_topology(PrimitiveKind::TriangleStripAdjacency),
        vk::PrimitiveTopology::TRIANGLE_STRIP_WITH_ADJACENCY
    );
    assert_eq!(
        primitive_topology(PrimitiveKind::LineListAdjacency),
        vk::PrimitiveTopology::LINE_LIST_WITH_ADJACENCY
    );
    // Both patch kinds share the Vulkan patch-list topology; the
    // control-point count is dynamic state
    assert_eq!(
        primitive_topology(PrimitiveKind::PatchList2ControlPoint),
        vk::PrimitiveTopology::PATCH_LIST
    );
    assert_eq!(
        primitive_topology(PrimitiveKind::PatchList3ControlPoint),
        vk::PrimitiveTopology::PATCH_LIST
    );
}

#[test]
fn test_shader_stage_mapping() {
    assert_eq!(shader_stage(ShaderStage::Vertex), vk::ShaderStageFlags::VERTEX);
    assert_eq!(
        shader_stage(ShaderStage::Hull),
        vk::ShaderStageFlags::TESSELLATION_CONTROL
    );
    assert_eq!(
        shader_stage(ShaderStage::Domain),
        vk::ShaderStageFlags::TESSELLATION_EVALUATION
    );
    assert_eq!(
        shader_stage(ShaderStage::Compute),
        vk::ShaderStageFlags::COMPUTE
    );
}
