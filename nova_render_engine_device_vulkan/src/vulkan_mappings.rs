/// Enum translations between the engine's descriptors and Vulkan
///
/// Pure functions; everything stateful lives in the device.
use ash::vk;
use nova_render_engine::nova::render::{
    CompareFunction, CullMode, FilterOptions, PolygonMode, PrimitiveKind, SceneBlendFactor,
    SceneBlendOperation, StencilOperation, TextureAddressingMode,
};

pub(crate) fn blend_factor(factor: SceneBlendFactor) -> vk::BlendFactor {
    match factor {
        SceneBlendFactor::One => vk::BlendFactor::ONE,
        SceneBlendFactor::Zero => vk::BlendFactor::ZERO,
        SceneBlendFactor::DestColor => vk::BlendFactor::DST_COLOR,
        SceneBlendFactor::SourceColor => vk::BlendFactor::SRC_COLOR,
        SceneBlendFactor::OneMinusDestColor => vk::BlendFactor::ONE_MINUS_DST_COLOR,
        SceneBlendFactor::OneMinusSourceColor => vk::BlendFactor::ONE_MINUS_SRC_COLOR,
        SceneBlendFactor::DestAlpha => vk::BlendFactor::DST_ALPHA,
        SceneBlendFactor::SourceAlpha => vk::BlendFactor::SRC_ALPHA,
        SceneBlendFactor::OneMinusDestAlpha => vk::BlendFactor::ONE_MINUS_DST_ALPHA,
        SceneBlendFactor::OneMinusSourceAlpha => vk::BlendFactor::ONE_MINUS_SRC_ALPHA,
    }
}

pub(crate) fn blend_op(op: SceneBlendOperation) -> vk::BlendOp {
    match op {
        SceneBlendOperation::Add => vk::BlendOp::ADD,
        SceneBlendOperation::Subtract => vk::BlendOp::SUBTRACT,
        SceneBlendOperation::ReverseSubtract => vk::BlendOp::REVERSE_SUBTRACT,
        SceneBlendOperation::Min => vk::BlendOp::MIN,
        SceneBlendOperation::Max => vk::BlendOp::MAX,
    }
}

pub(crate) fn compare_op(function: CompareFunction) -> vk::CompareOp {
    match function {
        CompareFunction::AlwaysFail => vk::CompareOp::NEVER,
        CompareFunction::AlwaysPass => vk::CompareOp::ALWAYS,
        CompareFunction::Less => vk::CompareOp::LESS,
        CompareFunction::LessEqual => vk::CompareOp::LESS_OR_EQUAL,
        CompareFunction::Equal => vk::CompareOp::EQUAL,
        CompareFunction::NotEqual => vk::CompareOp::NOT_EQUAL,
        CompareFunction::GreaterEqual => vk::CompareOp::GREATER_OR_EQUAL,
        CompareFunction::Greater => vk::CompareOp::GREATER,
    }
}

pub(crate) fn stencil_op(op: StencilOperation) -> vk::StencilOp {
    match op {
        StencilOperation::Keep => vk::StencilOp::KEEP,
        StencilOperation::Zero => vk::StencilOp::ZERO,
        StencilOperation::Replace => vk::StencilOp::REPLACE,
        StencilOperation::Increment => vk::StencilOp::INCREMENT_AND_CLAMP,
        StencilOperation::Decrement => vk::StencilOp::DECREMENT_AND_CLAMP,
        StencilOperation::IncrementWrap => vk::StencilOp::INCREMENT_AND_WRAP,
        StencilOperation::DecrementWrap => vk::StencilOp::DECREMENT_AND_WRAP,
        StencilOperation::Invert => vk::StencilOp::INVERT,
    }
}

pub(crate) fn cull_mode(mode: CullMode) -> vk::CullModeFlags {
    match mode {
        CullMode::None => vk::CullModeFlags::NONE,
        CullMode::Front => vk::CullModeFlags::FRONT,
        CullMode::Back => vk::CullModeFlags::BACK,
    }
}

pub(crate) fn polygon_mode(mode: PolygonMode) -> vk::PolygonMode {
    match mode {
        PolygonMode::Points => vk::PolygonMode::POINT,
        PolygonMode::Wireframe => vk::PolygonMode::LINE,
        PolygonMode::Solid => vk::PolygonMode::FILL,
    }
}

pub(crate) fn address_mode(mode: TextureAddressingMode) -> vk::SamplerAddressMode {
    match mode {
        TextureAddressingMode::Wrap => vk::SamplerAddressMode::REPEAT,
        TextureAddressingMode::Mirror => vk::SamplerAddressMode::MIRRORED_REPEAT,
        TextureAddressingMode::Clamp => vk::SamplerAddressMode::CLAMP_TO_EDGE,
        TextureAddressingMode::Border => vk::SamplerAddressMode::CLAMP_TO_BORDER,
    }
}

pub(crate) fn filter(options: FilterOptions) -> vk::Filter {
    match options {
        FilterOptions::None | FilterOptions::Point => vk::Filter::NEAREST,
        FilterOptions::Linear | FilterOptions::Anisotropic => vk::Filter::LINEAR,
    }
}

pub(crate) fn mipmap_mode(options: FilterOptions) -> vk::SamplerMipmapMode {
    match options {
        FilterOptions::None | FilterOptions::Point => vk::SamplerMipmapMode::NEAREST,
        FilterOptions::Linear | FilterOptions::Anisotropic => vk::SamplerMipmapMode::LINEAR,
    }
}

/// Map a primitive kind to the Vulkan topology
///
/// Patch lists share one Vulkan topology; the control-point count is set
/// through the patch-control-points dynamic state.
pub(crate) fn primitive_topology(kind: PrimitiveKind) -> vk::PrimitiveTopology {
    match kind {
        PrimitiveKind::PointList => vk::PrimitiveTopology::POINT_LIST,
        PrimitiveKind::LineList => vk::PrimitiveTopology::LINE_LIST,
        PrimitiveKind::LineStrip => vk::PrimitiveTopology::LINE_STRIP,
        PrimitiveKind::TriangleList => vk::PrimitiveTopology::TRIANGLE_LIST,
        PrimitiveKind::TriangleStrip => vk::PrimitiveTopology::TRIANGLE_STRIP,
        PrimitiveKind::LineListAdjacency => vk::PrimitiveTopology::LINE_LIST_WITH_ADJACENCY,
        PrimitiveKind::LineStripAdjacency => vk::PrimitiveTopology::LINE_STRIP_WITH_ADJACENCY,
        PrimitiveKind::TriangleListAdjacency => {
            vk::PrimitiveTopology::TRIANGLE_LIST_WITH_ADJACENCY
        }
        PrimitiveKind::TriangleStripAdjacency => {
            vk::PrimitiveTopology::TRIANGLE_STRIP_WITH_ADJACENCY
        }
        PrimitiveKind::PatchList2ControlPoint | PrimitiveKind::PatchList3ControlPoint => {
            vk::PrimitiveTopology::PATCH_LIST
        }
    }
}

pub(crate) fn shader_stage(
    stage: nova_render_engine::nova::render::ShaderStage,
) -> vk::ShaderStageFlags {
    use nova_render_engine::nova::render::ShaderStage;
    match stage {
        ShaderStage::Vertex => vk::ShaderStageFlags::VERTEX,
        ShaderStage::Fragment => vk::ShaderStageFlags::FRAGMENT,
        ShaderStage::Geometry => vk::ShaderStageFlags::GEOMETRY,
        ShaderStage::Hull => vk::ShaderStageFlags::TESSELLATION_CONTROL,
        ShaderStage::Domain => vk::ShaderStageFlags::TESSELLATION_EVALUATION,
        ShaderStage::Compute => vk::ShaderStageFlags::COMPUTE,
    }
}

#[cfg(test)]
#[path = "vulkan_mappings_tests.rs"]
mod tests;
