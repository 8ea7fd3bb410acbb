/// Render target surface - the contract render targets expose to this core
use crate::device::RenderTargetViewHandle;
use crate::target::{DepthBufferAttachment, DepthPoolId};
use bitflags::bitflags;

/// Viewport rectangle in target pixels, depth in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// Full-target viewport
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }

    /// Convert a top-left origin rect to bottom-left for targets that flip
    pub fn flipped_for(&self, target_height: u32) -> Viewport {
        let mut vp = *self;
        vp.top = target_height as f32 - self.height - self.top;
        vp
    }
}

bitflags! {
    /// Which buffers a clear touches
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClearFlags: u32 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
        const STENCIL = 1 << 2;
    }
}

/// Contract between this core and a render target
///
/// Render targets (windows, texture targets, multi-render-targets) are
/// owned by their managers; this core only queries views and manages the
/// on-demand depth-buffer attachment.
pub trait RenderTarget: Send {
    /// Target name (unique among attached targets)
    fn name(&self) -> &str;

    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Multisample count of the target surface
    fn sample_count(&self) -> u32 {
        1
    }

    /// Multisample quality of the target surface
    fn sample_quality(&self) -> u32 {
        0
    }

    /// Render target views to bind, one per simultaneous surface
    fn render_target_views(&self) -> Vec<RenderTargetViewHandle>;

    /// Depth-buffer pool this target draws its depth buffer from
    fn depth_buffer_pool(&self) -> DepthPoolId;

    /// Currently attached depth buffer
    fn depth_buffer(&self) -> Option<DepthBufferAttachment>;

    /// Attach a pool-managed depth buffer
    fn attach_depth_buffer(&mut self, buffer: DepthBufferAttachment);

    /// Detach the depth buffer (device loss)
    fn detach_depth_buffer(&mut self);

    /// True when rendering into this target inverts vertex winding
    fn requires_texture_flipping(&self) -> bool;
}
