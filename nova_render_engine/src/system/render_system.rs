/// Render system - the facade consumed by the generic renderer
///
/// Owns the device handle, the pipeline context and state cache, the
/// binding translator, the depth-buffer pool and the recovery coordinator,
/// and exposes the small set of verbs the renderer needs: resolve state,
/// bind, draw, recover.
use crate::binding::{BindingTranslator, ProgramBinding, ShaderStage};
use crate::device::{
    CapabilitySet, ClassInstanceHandle, DepthViewHandle, DeviceConfig, DeviceHandle,
    DeviceProvider, DriverVersion, FeatureTier, TextureViewHandle,
};
use crate::draw::{DrawOutcome, DrawTranslator, RenderOperation};
use crate::error::{Error, Result};
use crate::fsaa::{DefaultFsaaPolicy, FsaaPolicy, SampleDescription};
use crate::pipeline::{
    CompareFunction, CullingMode, FilterOptions, PipelineContext, PipelineStateCache, PolygonMode,
    SceneBlendFactor, SceneBlendOperation, ScissorRect, StencilOperation, UvwAddressingMode,
};
use crate::recovery::{DeviceResourceListener, DeviceState, RecoveryCoordinator, SceneManager};
use crate::target::{
    ClearFlags, DepthBufferAttachment, DepthBufferPool, RenderTarget, Viewport,
};
use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex};

/// Type-erased value returned by the custom-attribute surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomAttribute {
    /// Raw pointer-sized value of the native device
    NativeDevice(usize),
    /// Driver version quad of the active adapter
    DriverVersion(DriverVersion),
}

/// GPU device abstraction and pipeline-state management core
///
/// Single-threaded submission model: all state mutation and draw submission
/// happen on the thread that owns the device context; callers serialize
/// externally (usually through the engine singleton's Mutex).
pub struct RenderSystem {
    provider: Box<dyn DeviceProvider>,
    config: Option<DeviceConfig>,
    device: Option<DeviceHandle>,
    capabilities: Option<CapabilitySet>,

    context: PipelineContext,
    state_cache: PipelineStateCache,
    bindings: BindingTranslator,
    depth_pool: DepthBufferPool,
    recovery: RecoveryCoordinator,

    fsaa_policy: Box<dyn FsaaPolicy>,
    instance_map: FxHashMap<String, ClassInstanceHandle>,

    active_target: Option<Arc<Mutex<dyn RenderTarget>>>,
    active_viewport: Option<Viewport>,
    invert_vertex_winding: bool,

    global_instancing: Option<u32>,
    pass_iteration_hook: Option<Box<dyn FnMut() -> bool + Send>>,
}

impl std::fmt::Debug for RenderSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderSystem")
            .field("config", &self.config)
            .field("device", &self.device)
            .field("capabilities", &self.capabilities)
            .field("active_viewport", &self.active_viewport)
            .field("invert_vertex_winding", &self.invert_vertex_winding)
            .field("global_instancing", &self.global_instancing)
            .finish_non_exhaustive()
    }
}

impl RenderSystem {
    /// Create a render system over a device provider
    ///
    /// No device exists yet; call [`RenderSystem::initialize`] before
    /// anything else.
    pub fn new(provider: Box<dyn DeviceProvider>) -> Self {
        Self {
            provider,
            config: None,
            device: None,
            capabilities: None,
            context: PipelineContext::new(),
            state_cache: PipelineStateCache::new(),
            bindings: BindingTranslator::new(),
            depth_pool: DepthBufferPool::new(),
            recovery: RecoveryCoordinator::new(),
            fsaa_policy: Box::new(DefaultFsaaPolicy),
            instance_map: FxHashMap::default(),
            active_target: None,
            active_viewport: None,
            invert_vertex_winding: false,
            global_instancing: None,
            pass_iteration_hook: None,
        }
    }

    fn not_initialized() -> Error {
        Error::InitializationFailed(
            "RenderSystem not initialized. Call initialize() first.".to_string(),
        )
    }

    /// Create the device and derive its capabilities
    ///
    /// The config is retained so device-loss recovery can re-create the
    /// device with the previously selected adapter, driver kind and tier
    /// range.
    pub fn initialize(&mut self, config: DeviceConfig) -> Result<()> {
        crate::engine_info!("nova::RenderSystem", "Subsystem initialising");

        let handle = DeviceHandle::create(self.provider.as_mut(), &config)?;
        self.capabilities = Some(CapabilitySet::derive(
            handle.feature_tier(),
            handle.adapter().vendor_id,
            config.driver_kind,
            handle.driver_version(),
            &handle.adapter().name,
        ));
        self.device = Some(handle);
        self.config = Some(config);

        crate::engine_info!("nova::RenderSystem", "Subsystem initialised OK");
        Ok(())
    }

    /// True once `initialize` succeeded
    pub fn is_initialized(&self) -> bool {
        self.device.is_some()
    }

    /// Release every cache and the device
    pub fn shutdown(&mut self) {
        // Set all texture units to nothing to release texture references
        self.bindings.clear();
        self.state_cache.invalidate();
        self.depth_pool.clear();
        self.instance_map.clear();
        self.active_target = None;
        self.active_viewport = None;
        if let Some(mut device) = self.device.take() {
            device.release_all();
        }
        self.capabilities = None;
        self.config = None;
        crate::engine_info!("nova::RenderSystem", "Shutting down cleanly.");
    }

    /// Capability set of the current device
    pub fn capabilities(&self) -> Result<&CapabilitySet> {
        self.capabilities.as_ref().ok_or_else(Self::not_initialized)
    }

    /// Achieved feature tier of the current device
    pub fn feature_tier(&self) -> Result<FeatureTier> {
        self.device
            .as_ref()
            .map(DeviceHandle::feature_tier)
            .ok_or_else(Self::not_initialized)
    }

    /// Current device validity state
    pub fn device_state(&self) -> DeviceState {
        self.recovery.state()
    }

    /// Pipeline context (descriptors and dirty bits)
    pub fn context(&self) -> &PipelineContext {
        &self.context
    }

    /// Stage binding translator
    pub fn bindings(&self) -> &BindingTranslator {
        &self.bindings
    }

    /// Depth-buffer pool
    pub fn depth_pool(&self) -> &DepthBufferPool {
        &self.depth_pool
    }

    // ===== RECOVERY REGISTRATION =====

    /// Register a dependent subsystem for device loss/restore notifications
    pub fn register_device_listener(&mut self, listener: Arc<Mutex<dyn DeviceResourceListener>>) {
        self.recovery.register_listener(listener);
    }

    /// Register a scene manager for manual-resource release/restore
    pub fn register_scene_manager(&mut self, manager: Arc<Mutex<dyn SceneManager>>) {
        self.recovery.register_scene_manager(manager);
    }

    // ===== PIPELINE STATE MUTATORS =====

    /// Set combined color+alpha scene blending
    pub fn set_scene_blending(
        &mut self,
        source: SceneBlendFactor,
        dest: SceneBlendFactor,
        op: SceneBlendOperation,
    ) {
        // alpha to coverage needs the mid feature tier
        let a2c_supported = self
            .capabilities
            .as_ref()
            .map(|c| c.tier >= FeatureTier::L10_0)
            .unwrap_or(false);
        self.context
            .set_scene_blending(source, dest, op, a2c_supported);
    }

    /// Set separate color and alpha scene blending
    pub fn set_separate_scene_blending(
        &mut self,
        source: SceneBlendFactor,
        dest: SceneBlendFactor,
        source_alpha: SceneBlendFactor,
        dest_alpha: SceneBlendFactor,
        op: SceneBlendOperation,
        alpha_op: SceneBlendOperation,
    ) {
        self.context
            .set_separate_scene_blending(source, dest, source_alpha, dest_alpha, op, alpha_op);
    }

    /// Set alpha-to-coverage for alpha rejection
    pub fn set_alpha_reject_settings(&mut self, alpha_to_coverage: bool) {
        self.context.set_alpha_reject_settings(alpha_to_coverage);
    }

    /// Set the color channel write mask
    pub fn set_color_write_enabled(&mut self, red: bool, green: bool, blue: bool, alpha: bool) {
        self.context
            .set_color_write_enabled(red, green, blue, alpha);
    }

    /// Set the culling mode, resolved against the active target's winding
    pub fn set_culling_mode(&mut self, mode: CullingMode) {
        let flip = self.winding_flip();
        self.context.set_culling_mode(mode, flip);
    }

    /// Invert the winding convention (mirrored rendering); re-resolves the
    /// culling mode
    pub fn set_invert_vertex_winding(&mut self, invert: bool) {
        self.invert_vertex_winding = invert;
        let mode = self.context.culling_mode();
        self.set_culling_mode(mode);
    }

    pub fn set_polygon_mode(&mut self, mode: PolygonMode) {
        self.context.set_polygon_mode(mode);
    }

    pub fn set_depth_buffer_params(
        &mut self,
        depth_test: bool,
        depth_write: bool,
        depth_function: CompareFunction,
    ) {
        self.context
            .set_depth_buffer_params(depth_test, depth_write, depth_function);
    }

    pub fn set_depth_check_enabled(&mut self, enabled: bool) {
        self.context.set_depth_check_enabled(enabled);
    }

    pub fn set_depth_write_enabled(&mut self, enabled: bool) {
        self.context.set_depth_write_enabled(enabled);
    }

    pub fn set_depth_function(&mut self, function: CompareFunction) {
        self.context.set_depth_function(function);
    }

    pub fn set_depth_bias(&mut self, constant_bias: f32, slope_scale_bias: f32) {
        self.context.set_depth_bias(constant_bias, slope_scale_bias);
    }

    pub fn set_stencil_check_enabled(&mut self, enabled: bool) {
        self.context.set_stencil_check_enabled(enabled);
    }

    /// Set the full stencil state, resolved against the active target's
    /// winding for two-sided operations
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
    ) {
        let flip = self.winding_flip();
        self.context.set_stencil_state(
            function,
            ref_value,
            compare_mask,
            write_mask,
            stencil_fail_op,
            depth_fail_op,
            pass_op,
            two_sided,
            flip,
        );
    }

    /// Enable/disable the scissor test; the rectangle is pushed immediately
    pub fn set_scissor_test(&mut self, enabled: bool, rect: ScissorRect) -> Result<()> {
        self.context.set_scissor_test(enabled, rect);
        let device = self.device.as_mut().ok_or_else(Self::not_initialized)?;
        device
            .native_mut()
            .set_scissor_rect(&rect)
            .map_err(|e| e.into_error("set scissor rect"))
    }

    // ===== TEXTURE AND SAMPLER BINDING =====

    /// Assign or clear (`None`) the texture of a stage unit
    pub fn set_texture(
        &mut self,
        stage: ShaderStage,
        unit: usize,
        view: Option<TextureViewHandle>,
    ) -> Result<()> {
        self.bindings.bind_texture(stage, unit, view)?;
        self.context.mark_samplers_dirty();
        Ok(())
    }

    /// Assign a texture and its full sampler descriptor in one call
    pub fn set_texture_with_sampler(
        &mut self,
        stage: ShaderStage,
        unit: usize,
        view: TextureViewHandle,
        sampler: crate::pipeline::SamplerStateDesc,
    ) -> Result<()> {
        self.bindings
            .bind_texture_with_sampler(stage, unit, view, sampler)?;
        self.context.mark_samplers_dirty();
        Ok(())
    }

    /// Set the filters of a stage unit's sampler
    pub fn set_texture_filtering(
        &mut self,
        stage: ShaderStage,
        unit: usize,
        min_filter: FilterOptions,
        mag_filter: FilterOptions,
        mip_filter: FilterOptions,
    ) -> Result<()> {
        let sampler = self.bindings.sampler_mut(stage, unit)?;
        sampler.min_filter = min_filter;
        sampler.mag_filter = mag_filter;
        sampler.mip_filter = mip_filter;
        self.context.mark_samplers_dirty();
        Ok(())
    }

    pub fn set_texture_addressing_mode(
        &mut self,
        stage: ShaderStage,
        unit: usize,
        addressing: UvwAddressingMode,
    ) -> Result<()> {
        self.bindings.sampler_mut(stage, unit)?.addressing = addressing;
        self.context.mark_samplers_dirty();
        Ok(())
    }

    pub fn set_texture_border_color(
        &mut self,
        stage: ShaderStage,
        unit: usize,
        color: [f32; 4],
    ) -> Result<()> {
        self.bindings.sampler_mut(stage, unit)?.border_color = color;
        self.context.mark_samplers_dirty();
        Ok(())
    }

    pub fn set_texture_mipmap_bias(
        &mut self,
        stage: ShaderStage,
        unit: usize,
        bias: f32,
    ) -> Result<()> {
        self.bindings.sampler_mut(stage, unit)?.mip_lod_bias = bias;
        self.context.mark_samplers_dirty();
        Ok(())
    }

    pub fn set_texture_anisotropy(
        &mut self,
        stage: ShaderStage,
        unit: usize,
        max_anisotropy: u32,
    ) -> Result<()> {
        self.bindings.sampler_mut(stage, unit)?.max_anisotropy = max_anisotropy;
        self.context.mark_samplers_dirty();
        Ok(())
    }

    pub fn set_texture_compare(
        &mut self,
        stage: ShaderStage,
        unit: usize,
        enabled: bool,
        function: CompareFunction,
    ) -> Result<()> {
        let sampler = self.bindings.sampler_mut(stage, unit)?;
        sampler.compare_enabled = enabled;
        sampler.compare_function = function;
        self.context.mark_samplers_dirty();
        Ok(())
    }

    // ===== PROGRAM BINDING =====

    /// Bind a program to a stage
    ///
    /// # Errors
    ///
    /// `Error::Precondition` when the compute/graphics exclusivity rule
    /// would be violated.
    pub fn bind_program(&mut self, stage: ShaderStage, program: ProgramBinding) -> Result<()> {
        self.bindings.bind_stage(stage, Some(program))
    }

    /// Unbind the program of a stage, both in the table and on the device
    pub fn unbind_program(&mut self, stage: ShaderStage) -> Result<()> {
        self.bindings.bind_stage(stage, None)?;
        let device = self.device.as_mut().ok_or_else(Self::not_initialized)?;
        device
            .native_mut()
            .bind_program(stage, None)
            .map_err(|e| e.into_error(&format!("unbind {} program", stage)))
    }

    /// Select a shader subroutine for a dynamic-linkage slot
    ///
    /// Instances are looked up in the class linkage first and created on
    /// demand; resolved instances are cached by name.
    ///
    /// # Errors
    ///
    /// - `Error::Precondition` when the device lacks dynamic shader linkage.
    /// - `Error::RenderingApi` when the subroutine name does not exist and
    ///   cannot be created.
    pub fn set_subroutine(
        &mut self,
        stage: ShaderStage,
        slot: u32,
        subroutine_name: &str,
    ) -> Result<()> {
        let caps = self.capabilities.as_ref().ok_or_else(Self::not_initialized)?;
        if !caps.dynamic_shader_linkage {
            return Err(Error::Precondition(
                "shader subroutines require dynamic shader linkage (top feature tier)".to_string(),
            ));
        }

        let device = self
            .device
            .as_mut()
            .ok_or_else(Self::not_initialized)?
            .native_mut();

        let instance = match self.instance_map.get(subroutine_name) {
            Some(instance) => *instance,
            None => {
                // Try an instance the linkage already created (it must have
                // at least one field); otherwise create a fresh one
                let instance = match device.class_instance(subroutine_name) {
                    Some(instance) => instance,
                    None => device.create_class_instance(subroutine_name).map_err(|e| {
                        e.into_error(&format!(
                            "shader subroutine with name '{}' doesn't exist",
                            subroutine_name
                        ))
                    })?,
                };
                self.instance_map
                    .insert(subroutine_name.to_string(), instance);
                instance
            }
        };

        device
            .bind_class_instance(stage, slot, instance)
            .map_err(|e| e.into_error("set class instance"))
    }

    // ===== RENDER TARGETS, VIEWPORT, CLEARS =====

    /// Switch rendering to a target, attaching a pool-managed depth buffer
    /// on demand
    pub fn set_render_target(&mut self, target: Arc<Mutex<dyn RenderTarget>>) -> Result<()> {
        let flipping;
        {
            let mut t = target
                .lock()
                .map_err(|_| Error::InvalidParams("render target lock poisoned".to_string()))?;
            let device = self.device.as_mut().ok_or_else(Self::not_initialized)?;

            // Depth is automatically managed: attach a pool buffer when the
            // target's pool demands one and none is attached yet
            self.depth_pool
                .attach_depth_buffer(device.native_mut(), &mut *t)?;

            let views = t.render_target_views();
            let depth = t.depth_buffer().map(|b| b.view);
            device
                .native_mut()
                .set_render_targets(&views, depth)
                .map_err(|e| e.into_error("set render target"))?;

            flipping = t.requires_texture_flipping();
        }

        self.active_target = Some(target);

        // The culling mode depends on the target's winding; re-resolve it
        let mode = self.context.culling_mode();
        let flip = self.invert_vertex_winding != flipping;
        self.context.set_culling_mode(mode, flip);
        Ok(())
    }

    /// Apply a viewport; no-op when unchanged since the last application
    pub fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        if self.active_viewport == Some(viewport) {
            return Ok(());
        }

        let mut applied = viewport;
        if let Some(target) = &self.active_target {
            if let Ok(t) = target.lock() {
                if t.requires_texture_flipping() {
                    applied = viewport.flipped_for(t.height());
                }
            }
        }

        let device = self.device.as_mut().ok_or_else(Self::not_initialized)?;
        device
            .native_mut()
            .set_viewport(&applied)
            .map_err(|e| e.into_error("set viewport"))?;
        self.active_viewport = Some(viewport);
        Ok(())
    }

    /// Active viewport, if one was applied since the last reset
    pub fn active_viewport(&self) -> Option<Viewport> {
        self.active_viewport
    }

    /// Clear the active target's buffers
    pub fn clear_frame_buffer(
        &mut self,
        buffers: ClearFlags,
        color: [f32; 4],
        depth: f32,
        stencil: u8,
    ) -> Result<()> {
        let Some(target) = self.active_target.clone() else {
            return Ok(());
        };
        let t = target
            .lock()
            .map_err(|_| Error::InvalidParams("render target lock poisoned".to_string()))?;
        let device = self.device.as_mut().ok_or_else(Self::not_initialized)?;

        if buffers.contains(ClearFlags::COLOR) {
            for view in t.render_target_views() {
                device
                    .native_mut()
                    .clear_render_target_view(view, color)
                    .map_err(|e| e.into_error("clear render target view"))?;
            }
        }

        if buffers.intersects(ClearFlags::DEPTH | ClearFlags::STENCIL) {
            if let Some(depth_buffer) = t.depth_buffer() {
                device
                    .native_mut()
                    .clear_depth_stencil_view(
                        depth_buffer.view,
                        buffers.contains(ClearFlags::DEPTH),
                        buffers.contains(ClearFlags::STENCIL),
                        depth,
                        stencil,
                    )
                    .map_err(|e| e.into_error("clear depth stencil view"))?;
            }
        }
        Ok(())
    }

    /// Register an externally created depth buffer in the default pool
    pub fn add_manual_depth_buffer(
        &mut self,
        view: DepthViewHandle,
        width: u32,
        height: u32,
        samples: u32,
        sample_quality: u32,
    ) -> DepthBufferAttachment {
        self.depth_pool
            .add_manual(view, width, height, samples, sample_quality)
    }

    /// Remove a manual depth buffer by view identity
    pub fn remove_manual_depth_buffer(&mut self, view: DepthViewHandle) {
        self.depth_pool.remove_manual(view);
    }

    // ===== INSTANCING, PASS ITERATION, FSAA =====

    /// Instance multiplier of the global instancing buffer, when available
    pub fn set_global_instancing(&mut self, instances: Option<u32>) {
        self.global_instancing = instances;
    }

    /// Inject the pass-iteration predicate; the draw repeats while it
    /// returns true
    pub fn set_pass_iteration_hook(&mut self, hook: Option<Box<dyn FnMut() -> bool + Send>>) {
        self.pass_iteration_hook = hook;
    }

    /// Replace the FSAA negotiation policy
    pub fn set_fsaa_policy(&mut self, policy: Box<dyn FsaaPolicy>) {
        self.fsaa_policy = policy;
    }

    /// Negotiate a supported multisample mode for a requested FSAA level
    pub fn determine_fsaa_settings(&self, requested: u32, hint: &str) -> Result<SampleDescription> {
        let device = self.device.as_ref().ok_or_else(Self::not_initialized)?;
        let native = device.native();
        let levels = |count: u32| native.multisample_quality_levels(count);
        Ok(self.fsaa_policy.choose(requested, hint, &levels))
    }

    // ===== DRAW SUBMISSION =====

    /// Submit one render operation
    ///
    /// With a compute program bound, the dispatch path is taken exclusively
    /// and all graphics state resolution is skipped. Otherwise the dirty
    /// pipeline states are lazily rebuilt and bound, sampler bindings are
    /// re-pushed when the sampler category changed, and the draw translator
    /// issues the native draw.
    ///
    /// # Errors
    ///
    /// `Error::Precondition` when called during recovery or when the
    /// operation violates the stage-binding rules; `Error::RenderingApi`
    /// when a native call fails.
    pub fn render(&mut self, op: &RenderOperation) -> Result<DrawOutcome> {
        if !self.recovery.accepts_rendering() {
            return Err(Error::Precondition(
                "rendering call issued while device recovery is in progress".to_string(),
            ));
        }

        let device = self.device.as_mut().ok_or_else(Self::not_initialized)?;
        let caps = self.capabilities.as_ref().ok_or_else(Self::not_initialized)?;

        // A bound compute program takes the dispatch path exclusively
        if self.bindings.table().compute_program_bound() {
            let mut no_iterations = || false;
            return DrawTranslator::submit(
                device.native_mut(),
                self.bindings.table(),
                op,
                self.global_instancing,
                &mut no_iterations,
            );
        }

        self.state_cache
            .apply_graphics_states(device.native_mut(), &mut self.context)?;

        let samplers_rebuilt = self.state_cache.resolve_samplers(
            device.native_mut(),
            &mut self.context,
            self.bindings.table(),
        )?;
        if samplers_rebuilt {
            self.bindings
                .push_stage_resources(device.native_mut(), caps, &self.state_cache)?;
        }

        let mut no_iterations = || false;
        let pass_hook: &mut (dyn FnMut() -> bool) = match self.pass_iteration_hook.as_mut() {
            Some(hook) => hook.as_mut(),
            None => &mut no_iterations,
        };

        DrawTranslator::submit(
            device.native_mut(),
            self.bindings.table(),
            op,
            self.global_instancing,
            pass_hook,
        )
    }

    // ===== DEVICE VALIDATION AND RECOVERY =====

    /// Run one frame's worth of rendering, intercepting device loss
    ///
    /// Errors carrying the device-loss signature are routed to the recovery
    /// coordinator instead of propagating; the frame's output is dropped
    /// and `Ok(None)` is returned. Every other error propagates unchanged.
    pub fn run_frame<T>(
        &mut self,
        frame: impl FnOnce(&mut RenderSystem) -> Result<T>,
    ) -> Result<Option<T>> {
        match frame(self) {
            Ok(value) => Ok(Some(value)),
            Err(error) if error.is_device_loss() => {
                crate::engine_info!("nova::RenderSystem", "Device was lost while rendering.");
                if let Some(device) = self.device.as_mut() {
                    device.mark_lost();
                }
                self.handle_device_lost()?;
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }

    /// Check device validity, optionally re-electing the adapter
    ///
    /// The device is no longer valid if the elected adapter changed or the
    /// device reported a removal/reset condition; either triggers recovery.
    pub fn validate_device(&mut self, force_election: bool) -> Result<()> {
        let Some(device) = self.device.as_ref() else {
            return Ok(());
        };

        let mut another_elected = false;
        if force_election {
            let selector = self
                .config
                .as_ref()
                .map(|c| c.adapter.clone())
                .unwrap_or(crate::device::AdapterSelector::Default);
            let adapters = self.provider.enumerate_adapters(true);
            if let Some(elected) = adapters.iter().find(|a| selector.matches(a)) {
                another_elected = elected.unique_id != device.adapter().unique_id;
            }
        }

        if another_elected || !device.is_valid() {
            self.handle_device_lost()?;
        }
        Ok(())
    }

    /// Run the device-loss recovery protocol
    ///
    /// 1. Device-lost notification to every dependent subsystem.
    /// 2. Release of the core-owned device-dependent caches; engine-level
    ///    descriptors stay and remain the source of truth for the rebuild.
    /// 3. Device re-creation with the previously selected parameters.
    /// 4. Device-restored notification; dependents rebuild.
    /// 5. Capability re-derivation and viewport invalidation.
    ///
    /// # Errors
    ///
    /// A failure in steps 3-5 is fatal and surfaces as
    /// `Error::InitializationFailed`; there is no automatic retry.
    pub fn handle_device_lost(&mut self) -> Result<()> {
        if self.device.is_none() {
            return Ok(());
        }
        let config = self.config.clone().ok_or_else(Self::not_initialized)?;

        crate::engine_info!("nova::RenderSystem", "Device was lost, recreating.");

        // 1. release device-dependent resources held by dependents
        self.recovery.notify_lost();

        // 2. release device-dependent caches owned by this core
        self.state_cache.invalidate();
        self.context.mark_all_dirty();
        self.depth_pool.clear();
        self.instance_map.clear();
        if let Some(target) = &self.active_target {
            if let Ok(mut target) = target.lock() {
                target.detach_depth_buffer();
            }
        }
        if let Some(device) = self.device.as_mut() {
            device.release_all();
        }

        // 3. recreate the device
        self.recovery.begin_recreate();
        let handle = DeviceHandle::create(self.provider.as_mut(), &config).map_err(|error| {
            crate::engine_error!(
                "nova::RenderSystem",
                "Device re-creation failed during recovery: {}",
                error
            );
            Error::InitializationFailed(format!("device recovery failed: {}", error))
        })?;
        self.device = Some(handle);

        // 4. recreate device-dependent resources held by dependents
        if let Some(device) = self.device.as_mut() {
            self.recovery.notify_restored(device.native_mut());
        }

        // 5. re-derive capabilities and invalidate the active viewport
        if let Some(device) = self.device.as_ref() {
            self.capabilities = Some(CapabilitySet::derive(
                device.feature_tier(),
                device.adapter().vendor_id,
                config.driver_kind,
                device.driver_version(),
                &device.adapter().name,
            ));
        }
        self.active_viewport = None;

        crate::engine_info!("nova::RenderSystem", "Device was restored.");
        Ok(())
    }

    // ===== CUSTOM ATTRIBUTES =====

    /// String-keyed, type-erased attribute surface for window/render-target
    /// collaborators
    ///
    /// # Errors
    ///
    /// `Error::InvalidParams` for unknown attribute names.
    pub fn custom_attribute(&self, name: &str) -> Result<CustomAttribute> {
        let device = self.device.as_ref().ok_or_else(Self::not_initialized)?;
        match name {
            "NATIVE_DEVICE" => Ok(CustomAttribute::NativeDevice(device.native().raw_handle())),
            "DRIVER_VERSION" => Ok(CustomAttribute::DriverVersion(device.driver_version())),
            _ => Err(Error::InvalidParams(format!(
                "Attribute not found: {}",
                name
            ))),
        }
    }

    fn winding_flip(&self) -> bool {
        let target_flips = self
            .active_target
            .as_ref()
            .and_then(|t| t.lock().ok().map(|t| t.requires_texture_flipping()))
            .unwrap_or(false);
        self.invert_vertex_winding != target_flips
    }
}

#[cfg(test)]
#[path = "render_system_tests.rs"]
mod tests;
