/// Depth/stencil state descriptor

/// Comparison function for depth, stencil and sampler compare operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareFunction {
    /// Never pass
    AlwaysFail,
    /// Always pass
    AlwaysPass,
    /// Pass if value < reference
    Less,
    /// Pass if value <= reference
    LessEqual,
    /// Pass if value == reference
    Equal,
    /// Pass if value != reference
    NotEqual,
    /// Pass if value >= reference
    GreaterEqual,
    /// Pass if value > reference
    Greater,
}

/// Stencil operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StencilOperation {
    /// Keep current value
    Keep,
    /// Set to zero
    Zero,
    /// Replace with reference value
    Replace,
    /// Increment and clamp to max
    Increment,
    /// Decrement and clamp to zero
    Decrement,
    /// Increment and wrap around
    IncrementWrap,
    /// Decrement and wrap around
    DecrementWrap,
    /// Bitwise invert
    Invert,
}

impl StencilOperation {
    /// Swap increments and decrements
    ///
    /// Used for the back face when a two-sided operation renders into a
    /// target that inverts vertex winding.
    pub fn flipped(self) -> StencilOperation {
        match self {
            StencilOperation::Increment => StencilOperation::Decrement,
            StencilOperation::Decrement => StencilOperation::Increment,
            StencilOperation::IncrementWrap => StencilOperation::DecrementWrap,
            StencilOperation::DecrementWrap => StencilOperation::IncrementWrap,
            other => other,
        }
    }

    /// `flipped()` when `flip` is set, identity otherwise
    pub fn maybe_flipped(self, flip: bool) -> StencilOperation {
        if flip {
            self.flipped()
        } else {
            self
        }
    }
}

/// Stencil operations for one face
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StencilFaceDesc {
    /// Action on stencil test fail
    pub fail_op: StencilOperation,
    /// Action on stencil pass + depth fail
    pub depth_fail_op: StencilOperation,
    /// Action on stencil pass + depth pass
    pub pass_op: StencilOperation,
    /// Comparison function
    pub compare: CompareFunction,
}

impl Default for StencilFaceDesc {
    fn default() -> Self {
        Self {
            fail_op: StencilOperation::Keep,
            depth_fail_op: StencilOperation::Keep,
            pass_op: StencilOperation::Keep,
            compare: CompareFunction::AlwaysPass,
        }
    }
}

/// Engine-level depth/stencil state descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthStencilStateDesc {
    /// Enable the depth test
    pub depth_check: bool,
    /// Enable writes to the depth buffer
    pub depth_write: bool,
    /// Depth comparison function
    pub depth_function: CompareFunction,
    /// Enable the stencil test
    pub stencil_check: bool,
    /// Bits of the stencil buffer read for compare
    pub stencil_read_mask: u8,
    /// Bits of the stencil buffer written
    pub stencil_write_mask: u8,
    /// Front face operations
    pub front: StencilFaceDesc,
    /// Back face operations
    pub back: StencilFaceDesc,
}

impl Default for DepthStencilStateDesc {
    fn default() -> Self {
        Self {
            depth_check: true,
            depth_write: true,
            depth_function: CompareFunction::LessEqual,
            stencil_check: false,
            stencil_read_mask: 0xFF,
            stencil_write_mask: 0xFF,
            front: StencilFaceDesc::default(),
            back: StencilFaceDesc::default(),
        }
    }
}
