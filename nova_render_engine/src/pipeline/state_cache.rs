/// Pipeline state cache - dedup of native state objects by descriptor value
///
/// Each of the four descriptor categories rebuilds its native object only on
/// a dirty transition; the cached handle is reused across draws until the
/// descriptor changes again. Rebuild failure is fatal to the current draw
/// and carries the native error code plus the attempted operation name.
use crate::binding::{ShaderStage, StageBindingTable};
use crate::device::{
    BlendStateHandle, DepthStencilStateHandle, NativeDevice, RasterizerStateHandle,
    SamplerStateHandle,
};
use crate::error::Result;
use crate::pipeline::PipelineContext;

/// Cache of native state objects keyed by "last built descriptor value"
///
/// Handles are weak references into the device's arenas; when the device is
/// replaced they are invalidated wholesale, never freed one by one.
#[derive(Debug, Default)]
pub struct PipelineStateCache {
    bound_blend: Option<BlendStateHandle>,
    bound_rasterizer: Option<RasterizerStateHandle>,
    bound_depth_stencil: Option<DepthStencilStateHandle>,
    stage_samplers: [Vec<Option<SamplerStateHandle>>; ShaderStage::COUNT],
}

impl PipelineStateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve and bind the blend state
    ///
    /// Rebuilds only when the descriptor is dirty; a reused handle is not
    /// re-bound.
    pub fn resolve_blend(
        &mut self,
        device: &mut dyn NativeDevice,
        ctx: &mut PipelineContext,
    ) -> Result<BlendStateHandle> {
        if !ctx.is_blend_dirty() {
            if let Some(handle) = self.bound_blend {
                return Ok(handle);
            }
        }
        let handle = device
            .create_blend_state(&ctx.blend)
            .map_err(|e| e.into_error("create blend state"))?;
        device
            .bind_blend_state(handle)
            .map_err(|e| e.into_error("set blend state"))?;
        ctx.clear_blend_dirty();
        self.bound_blend = Some(handle);
        Ok(handle)
    }

    /// Resolve and bind the rasterizer state
    pub fn resolve_rasterizer(
        &mut self,
        device: &mut dyn NativeDevice,
        ctx: &mut PipelineContext,
    ) -> Result<RasterizerStateHandle> {
        if !ctx.is_rasterizer_dirty() {
            if let Some(handle) = self.bound_rasterizer {
                return Ok(handle);
            }
        }
        let handle = device
            .create_rasterizer_state(&ctx.rasterizer)
            .map_err(|e| e.into_error("create rasterizer state"))?;
        device
            .bind_rasterizer_state(handle)
            .map_err(|e| e.into_error("set rasterizer state"))?;
        ctx.clear_rasterizer_dirty();
        self.bound_rasterizer = Some(handle);
        Ok(handle)
    }

    /// Resolve and bind the depth/stencil state with the current stencil
    /// reference
    pub fn resolve_depth_stencil(
        &mut self,
        device: &mut dyn NativeDevice,
        ctx: &mut PipelineContext,
    ) -> Result<DepthStencilStateHandle> {
        if !ctx.is_depth_stencil_dirty() {
            if let Some(handle) = self.bound_depth_stencil {
                return Ok(handle);
            }
        }
        let handle = device
            .create_depth_stencil_state(&ctx.depth_stencil)
            .map_err(|e| e.into_error("create depth stencil state"))?;
        device
            .bind_depth_stencil_state(handle, ctx.stencil_ref)
            .map_err(|e| e.into_error("set depth stencil state"))?;
        ctx.clear_depth_stencil_dirty();
        self.bound_depth_stencil = Some(handle);
        Ok(handle)
    }

    /// Resolve all three fixed-function states in one pass
    pub fn apply_graphics_states(
        &mut self,
        device: &mut dyn NativeDevice,
        ctx: &mut PipelineContext,
    ) -> Result<()> {
        self.resolve_blend(device, ctx)?;
        self.resolve_rasterizer(device, ctx)?;
        self.resolve_depth_stencil(device, ctx)?;
        Ok(())
    }

    /// Rebuild the per-stage sampler arrays when the sampler category is
    /// dirty
    ///
    /// Sampler resolution depends on the number of currently used texture
    /// units of each stage; units beyond that count are not built or bound.
    /// Returns true when a rebuild happened (and the stage resources must be
    /// re-pushed).
    pub fn resolve_samplers(
        &mut self,
        device: &mut dyn NativeDevice,
        ctx: &mut PipelineContext,
        table: &StageBindingTable,
    ) -> Result<bool> {
        if !ctx.are_samplers_dirty() {
            return Ok(false);
        }

        for stage in ShaderStage::ALL {
            let bindings = table.stage(stage);
            let count = bindings.used_units();
            let samplers = &mut self.stage_samplers[stage.index()];
            samplers.clear();
            for n in 0..count {
                let slot = bindings.unit(n);
                if slot.used {
                    let handle = device
                        .create_sampler_state(&slot.sampler.resolved())
                        .map_err(|e| e.into_error("create sampler state"))?;
                    samplers.push(Some(handle));
                } else {
                    samplers.push(None);
                }
            }
        }

        ctx.clear_samplers_dirty();
        Ok(true)
    }

    /// Resolved sampler handles of one stage
    pub fn stage_samplers(&self, stage: ShaderStage) -> &[Option<SamplerStateHandle>] {
        &self.stage_samplers[stage.index()]
    }

    /// Drop every cached handle
    ///
    /// Called when the device handle is replaced; the native objects die
    /// with the old device, the descriptors stay and rebuild lazily.
    pub fn invalidate(&mut self) {
        self.bound_blend = None;
        self.bound_rasterizer = None;
        self.bound_depth_stencil = None;
        for samplers in &mut self.stage_samplers {
            samplers.clear();
        }
    }
}

#[cfg(test)]
#[path = "state_cache_tests.rs"]
mod tests;
