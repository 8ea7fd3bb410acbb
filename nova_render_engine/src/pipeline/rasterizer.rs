/// Rasterizer state descriptor - culling, fill mode, bias and scissor

/// Engine-level face culling mode
///
/// Expressed in winding order; the translation to a native front/back cull
/// depends on whether the active render target flips vertex winding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullingMode {
    /// No culling
    None,
    /// Cull faces wound clockwise
    Clockwise,
    /// Cull faces wound anticlockwise
    Anticlockwise,
}

impl CullingMode {
    /// Translate to a native cull mode, flipping when the target inverts
    /// vertex winding
    pub fn to_native(self, flip: bool) -> CullMode {
        match self {
            CullingMode::None => CullMode::None,
            CullingMode::Clockwise => {
                if flip {
                    CullMode::Front
                } else {
                    CullMode::Back
                }
            }
            CullingMode::Anticlockwise => {
                if flip {
                    CullMode::Back
                } else {
                    CullMode::Front
                }
            }
        }
    }
}

/// Native-facing cull mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullMode {
    None,
    Front,
    Back,
}

/// Polygon rendering mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolygonMode {
    /// Draw vertices only
    Points,
    /// Draw edges only
    Wireframe,
    /// Fill polygons
    Solid,
}

/// Scissor rectangle in target pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScissorRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

/// Engine-level rasterizer state descriptor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterizerStateDesc {
    /// Fill mode
    pub polygon_mode: PolygonMode,
    /// Native cull mode (already winding-resolved)
    pub cull_mode: CullMode,
    /// Counter-clockwise front faces
    pub front_counter_clockwise: bool,
    /// Constant depth bias in device units
    pub depth_bias: i32,
    /// Slope-scaled depth bias
    pub slope_scaled_depth_bias: f32,
    /// Maximum depth bias clamp
    pub depth_bias_clamp: f32,
    /// Clip primitives against the near/far planes
    pub depth_clip_enable: bool,
    /// Enable the scissor rectangle
    pub scissor_enable: bool,
    /// Rasterize with the target's multisample pattern
    pub multisample_enable: bool,
}

impl Default for RasterizerStateDesc {
    fn default() -> Self {
        Self {
            polygon_mode: PolygonMode::Solid,
            cull_mode: CullMode::Back,
            front_counter_clockwise: true,
            depth_bias: 0,
            slope_scaled_depth_bias: 0.0,
            depth_bias_clamp: 0.0,
            depth_clip_enable: true,
            scissor_enable: false,
            multisample_enable: true,
        }
    }
}
