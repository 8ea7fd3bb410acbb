/// Pipeline context - the mutable engine-level bound state
///
/// Owns the blend/rasterizer/depth-stencil descriptors and their dirty bits.
/// Every mutator sets the dirty bit of its category; the state cache clears
/// it once the native object has been rebuilt. Sampler descriptors live in
/// the stage binding table, but their dirty bit is tracked here so the four
/// categories resolve through one place.
use crate::pipeline::{
    BlendStateDesc, ColorWriteMask, CompareFunction, CullingMode, DepthStencilStateDesc,
    PolygonMode, RasterizerStateDesc, SceneBlendFactor, SceneBlendOperation, ScissorRect,
    StencilFaceDesc, StencilOperation,
};

/// Explicit bound-state object shared by the state cache and the render
/// system
///
/// No free-floating static state: several device contexts could coexist,
/// each with its own context.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    /// Blend descriptor
    pub blend: BlendStateDesc,
    /// Rasterizer descriptor
    pub rasterizer: RasterizerStateDesc,
    /// Depth/stencil descriptor
    pub depth_stencil: DepthStencilStateDesc,
    /// Stencil reference value bound alongside the depth/stencil state
    pub stencil_ref: u32,
    /// Scissor rectangle pushed on scissor changes
    pub scissor: ScissorRect,

    // Engine-level inputs remembered so later mutations can recompute
    // derived native fields
    culling_mode: CullingMode,
    alpha_to_coverage: bool,

    blend_dirty: bool,
    rasterizer_dirty: bool,
    depth_stencil_dirty: bool,
    samplers_dirty: bool,
}

impl Default for PipelineContext {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineContext {
    /// Create a context with default descriptors; every category starts
    /// dirty so the first draw builds all native objects
    pub fn new() -> Self {
        Self {
            blend: BlendStateDesc::default(),
            rasterizer: RasterizerStateDesc::default(),
            depth_stencil: DepthStencilStateDesc::default(),
            stencil_ref: 0,
            scissor: ScissorRect::default(),
            culling_mode: CullingMode::Clockwise,
            alpha_to_coverage: false,
            blend_dirty: true,
            rasterizer_dirty: true,
            depth_stencil_dirty: true,
            samplers_dirty: true,
        }
    }

    // ===== BLEND MUTATORS =====

    /// Set combined color+alpha blending
    ///
    /// The `One`/`Zero` factor pair disables blending outright instead of
    /// building a degenerate blend state. `alpha_to_coverage_supported`
    /// reflects the capability tier; below the mid tier the flag is forced
    /// off.
    pub fn set_scene_blending(
        &mut self,
        source: SceneBlendFactor,
        dest: SceneBlendFactor,
        op: SceneBlendOperation,
        alpha_to_coverage_supported: bool,
    ) {
        let target = &mut self.blend.targets[0];
        if source == SceneBlendFactor::One && dest == SceneBlendFactor::Zero {
            target.blend_enable = false;
        } else {
            target.blend_enable = true;
            target.src_blend = source;
            target.dst_blend = dest;
            target.src_blend_alpha = source.to_alpha();
            target.dst_blend_alpha = dest.to_alpha();
            target.blend_op = op;
            target.blend_op_alpha = op;
            target.write_mask = ColorWriteMask::ALL;
            self.blend.alpha_to_coverage = self.alpha_to_coverage && alpha_to_coverage_supported;
        }
        self.blend_dirty = true;
    }

    /// Set separate color and alpha blending
    pub fn set_separate_scene_blending(
        &mut self,
        source: SceneBlendFactor,
        dest: SceneBlendFactor,
        source_alpha: SceneBlendFactor,
        dest_alpha: SceneBlendFactor,
        op: SceneBlendOperation,
        alpha_op: SceneBlendOperation,
    ) {
        let target = &mut self.blend.targets[0];
        if source == SceneBlendFactor::One && dest == SceneBlendFactor::Zero {
            target.blend_enable = false;
        } else {
            target.blend_enable = true;
            target.src_blend = source;
            target.dst_blend = dest;
            target.blend_op = op;
            target.src_blend_alpha = source_alpha.to_alpha();
            target.dst_blend_alpha = dest_alpha.to_alpha();
            target.blend_op_alpha = alpha_op;
            target.write_mask = ColorWriteMask::ALL;
            self.blend.alpha_to_coverage = false;
        }
        self.blend_dirty = true;
    }

    /// Set alpha rejection; alpha-to-coverage rides on the blend state
    pub fn set_alpha_reject_settings(&mut self, alpha_to_coverage: bool) {
        self.alpha_to_coverage = alpha_to_coverage;
        self.blend.alpha_to_coverage = alpha_to_coverage;
        self.blend_dirty = true;
    }

    /// Set the color channel write mask of the first render target
    pub fn set_color_write_enabled(&mut self, red: bool, green: bool, blue: bool, alpha: bool) {
        let mut mask = ColorWriteMask::empty();
        if red {
            mask |= ColorWriteMask::RED;
        }
        if green {
            mask |= ColorWriteMask::GREEN;
        }
        if blue {
            mask |= ColorWriteMask::BLUE;
        }
        if alpha {
            mask |= ColorWriteMask::ALPHA;
        }
        self.blend.targets[0].write_mask = mask;
        self.blend_dirty = true;
    }

    // ===== RASTERIZER MUTATORS =====

    /// Set the culling mode; `flip` is true when the active target inverts
    /// vertex winding
    pub fn set_culling_mode(&mut self, mode: CullingMode, flip: bool) {
        self.culling_mode = mode;
        self.rasterizer.cull_mode = mode.to_native(flip);
        self.rasterizer_dirty = true;
    }

    /// Engine-level culling mode as last set
    pub fn culling_mode(&self) -> CullingMode {
        self.culling_mode
    }

    /// Set the polygon fill mode; only marks dirty on an actual change
    pub fn set_polygon_mode(&mut self, mode: PolygonMode) {
        if self.rasterizer.polygon_mode != mode {
            self.rasterizer.polygon_mode = mode;
            self.rasterizer_dirty = true;
        }
    }

    /// Set the depth bias
    ///
    /// The constant bias is scaled by the near/far factor the original
    /// backend uses and negated; the slope bias is negated.
    pub fn set_depth_bias(&mut self, constant_bias: f32, slope_scale_bias: f32) {
        const NEAR_FAR_FACTOR: f32 = 10.0;
        self.rasterizer.depth_bias = (-constant_bias * NEAR_FAR_FACTOR) as i32;
        self.rasterizer.slope_scaled_depth_bias = -slope_scale_bias;
        self.rasterizer_dirty = true;
    }

    /// Enable/disable the scissor test and record the rectangle
    pub fn set_scissor_test(&mut self, enabled: bool, rect: ScissorRect) {
        self.rasterizer.scissor_enable = enabled;
        self.scissor = rect;
        self.rasterizer_dirty = true;
    }

    // ===== DEPTH/STENCIL MUTATORS =====

    /// Set check, write and function at once
    pub fn set_depth_buffer_params(
        &mut self,
        depth_test: bool,
        depth_write: bool,
        depth_function: CompareFunction,
    ) {
        self.set_depth_check_enabled(depth_test);
        self.set_depth_write_enabled(depth_write);
        self.set_depth_function(depth_function);
    }

    pub fn set_depth_check_enabled(&mut self, enabled: bool) {
        self.depth_stencil.depth_check = enabled;
        self.depth_stencil_dirty = true;
    }

    pub fn set_depth_write_enabled(&mut self, enabled: bool) {
        self.depth_stencil.depth_write = enabled;
        self.depth_stencil_dirty = true;
    }

    pub fn set_depth_function(&mut self, function: CompareFunction) {
        self.depth_stencil.depth_function = function;
        self.depth_stencil_dirty = true;
    }

    pub fn set_stencil_check_enabled(&mut self, enabled: bool) {
        self.depth_stencil.stencil_check = enabled;
        self.depth_stencil_dirty = true;
    }

    /// Set the full stencil state
    ///
    /// One-sided operations honor the caller's intent verbatim; two-sided
    /// operations flip increments/decrements on the face whose winding the
    /// target inverts.
    #[allow(clippy::too_many_arguments)]
    pub fn set_stencil_state(
        &mut self,
        function: CompareFunction,
        ref_value: u32,
        compare_mask: u8,
        write_mask: u8,
        stencil_fail_op: StencilOperation,
        depth_fail_op: StencilOperation,
        pass_op: StencilOperation,
        two_sided: bool,
        flip_winding: bool,
    ) {
        let flip_front = two_sided && flip_winding;
        let flip_back = two_sided && !flip_front;

        self.stencil_ref = ref_value;
        self.depth_stencil.stencil_read_mask = compare_mask;
        self.depth_stencil.stencil_write_mask = write_mask;

        self.depth_stencil.front = StencilFaceDesc {
            fail_op: stencil_fail_op.maybe_flipped(flip_front),
            depth_fail_op: depth_fail_op.maybe_flipped(flip_front),
            pass_op: pass_op.maybe_flipped(flip_front),
            compare: function,
        };
        self.depth_stencil.back = StencilFaceDesc {
            fail_op: stencil_fail_op.maybe_flipped(flip_back),
            depth_fail_op: depth_fail_op.maybe_flipped(flip_back),
            pass_op: pass_op.maybe_flipped(flip_back),
            compare: function,
        };

        self.depth_stencil_dirty = true;
    }

    // ===== DIRTY TRACKING =====

    pub fn is_blend_dirty(&self) -> bool {
        self.blend_dirty
    }

    pub fn is_rasterizer_dirty(&self) -> bool {
        self.rasterizer_dirty
    }

    pub fn is_depth_stencil_dirty(&self) -> bool {
        self.depth_stencil_dirty
    }

    pub fn are_samplers_dirty(&self) -> bool {
        self.samplers_dirty
    }

    /// Mark the sampler category dirty (called by texture/sampler mutators
    /// which live on the binding table)
    pub fn mark_samplers_dirty(&mut self) {
        self.samplers_dirty = true;
    }

    pub(crate) fn clear_blend_dirty(&mut self) {
        self.blend_dirty = false;
    }

    pub(crate) fn clear_rasterizer_dirty(&mut self) {
        self.rasterizer_dirty = false;
    }

    pub(crate) fn clear_depth_stencil_dirty(&mut self) {
        self.depth_stencil_dirty = false;
    }

    pub(crate) fn clear_samplers_dirty(&mut self) {
        self.samplers_dirty = false;
    }

    /// Mark every category dirty
    ///
    /// Called when the device handle is replaced: descriptors survive the
    /// loss and become the source of truth for the rebuild.
    pub fn mark_all_dirty(&mut self) {
        self.blend_dirty = true;
        self.rasterizer_dirty = true;
        self.depth_stencil_dirty = true;
        self.samplers_dirty = true;
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
