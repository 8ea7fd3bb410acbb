/// Blend state descriptor - engine-level description of color blending
use bitflags::bitflags;

/// Blend factor for the blending equation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneBlendFactor {
    One,
    Zero,
    DestColor,
    SourceColor,
    OneMinusDestColor,
    OneMinusSourceColor,
    DestAlpha,
    SourceAlpha,
    OneMinusDestAlpha,
    OneMinusSourceAlpha,
}

impl SceneBlendFactor {
    /// The alpha-channel equivalent of a color factor
    ///
    /// Native alpha blend slots reject color factors, so `SourceColor`
    /// becomes `SourceAlpha` (and so on) when a combined blend setting is
    /// split into color and alpha halves.
    pub fn to_alpha(self) -> SceneBlendFactor {
        match self {
            SceneBlendFactor::DestColor => SceneBlendFactor::DestAlpha,
            SceneBlendFactor::SourceColor => SceneBlendFactor::SourceAlpha,
            SceneBlendFactor::OneMinusDestColor => SceneBlendFactor::OneMinusDestAlpha,
            SceneBlendFactor::OneMinusSourceColor => SceneBlendFactor::OneMinusSourceAlpha,
            other => other,
        }
    }
}

/// Blend operation combining the weighted source and destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneBlendOperation {
    /// result = src * srcFactor + dst * dstFactor
    Add,
    /// result = src * srcFactor - dst * dstFactor
    Subtract,
    /// result = dst * dstFactor - src * srcFactor
    ReverseSubtract,
    /// result = min(src, dst)
    Min,
    /// result = max(src, dst)
    Max,
}

bitflags! {
    /// Color channel write mask
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ColorWriteMask: u8 {
        const RED = 1 << 0;
        const GREEN = 1 << 1;
        const BLUE = 1 << 2;
        const ALPHA = 1 << 3;
    }
}

impl ColorWriteMask {
    /// All channels enabled
    pub const ALL: ColorWriteMask = ColorWriteMask::all();
}

impl Default for ColorWriteMask {
    fn default() -> Self {
        ColorWriteMask::ALL
    }
}

/// Per-render-target blend settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTargetBlendDesc {
    /// Enable blending for this target
    pub blend_enable: bool,
    /// Source color blend factor
    pub src_blend: SceneBlendFactor,
    /// Destination color blend factor
    pub dst_blend: SceneBlendFactor,
    /// Color blend operation
    pub blend_op: SceneBlendOperation,
    /// Source alpha blend factor
    pub src_blend_alpha: SceneBlendFactor,
    /// Destination alpha blend factor
    pub dst_blend_alpha: SceneBlendFactor,
    /// Alpha blend operation
    pub blend_op_alpha: SceneBlendOperation,
    /// Channel write mask
    pub write_mask: ColorWriteMask,
}

impl Default for RenderTargetBlendDesc {
    fn default() -> Self {
        Self {
            blend_enable: false,
            src_blend: SceneBlendFactor::One,
            dst_blend: SceneBlendFactor::Zero,
            blend_op: SceneBlendOperation::Add,
            src_blend_alpha: SceneBlendFactor::One,
            dst_blend_alpha: SceneBlendFactor::Zero,
            blend_op_alpha: SceneBlendOperation::Add,
            write_mask: ColorWriteMask::ALL,
        }
    }
}

/// Engine-level blend state descriptor
///
/// Plain value struct; carries no native objects. One per pipeline context,
/// mutated for the lifetime of the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlendStateDesc {
    /// Enable alpha-to-coverage (requires the mid feature tier)
    pub alpha_to_coverage: bool,
    /// Per-render-target settings
    pub targets: [RenderTargetBlendDesc; crate::device::MAX_RENDER_TARGET_VIEWS],
}
