/// Mock native device for unit tests (no GPU required)
///
/// Records every native call, counts state-object creations, and can inject
/// failures and device-loss signatures. The recording state is shared
/// through an Arc so tests keep visibility after the device moves into the
/// render system.
use crate::binding::ShaderStage;
use crate::device::{
    AdapterInfo, AdapterSelector, BlendStateHandle, ClassInstanceHandle, CreatedDevice,
    DepthStencilStateHandle, DepthViewHandle, DeviceCreationFlags, DeviceProvider, DriverKind,
    DriverVersion, FeatureTier, IndexBufferHandle, NativeCallError, NativeDevice, NativeResult,
    ProgramHandle, RasterizerStateHandle, RenderTargetViewHandle, SamplerStateHandle,
    TextureViewHandle,
};
use crate::draw::{IndexType, PrimitiveKind};
use crate::error::{Error, Result};
use crate::pipeline::{
    BlendStateDesc, DepthStencilStateDesc, RasterizerStateDesc, SamplerStateDesc, ScissorRect,
};
use crate::target::Viewport;
use rustc_hash::FxHashMap;
use slotmap::SlotMap;
use std::sync::{Arc, Mutex};

// ============================================================================
// Shared recording state
// ============================================================================

/// Observable state of a mock device
#[derive(Debug, Default)]
pub struct MockDeviceState {
    /// Every native call, in order, as "name(args)" strings
    pub calls: Vec<String>,

    pub blend_states_created: u32,
    pub rasterizer_states_created: u32,
    pub depth_stencil_states_created: u32,
    pub sampler_states_created: u32,
    pub depth_buffers_created: u32,

    /// Topology-based draw calls issued
    pub draws: u32,
    /// Compute dispatches issued
    pub dispatches: u32,

    /// Error injected into the next state-object creation
    pub fail_next_create: Option<NativeCallError>,
    /// Device reports the removal/reset condition
    pub lost: bool,
    /// A stream-output target is bound
    pub stream_output: bool,
    /// Sample count -> driver quality levels
    pub quality_levels: FxHashMap<u32, u32>,
    /// Subroutine names the class linkage can create instances for
    pub creatable_subroutines: Vec<String>,
    /// release_all() was called
    pub released: bool,
}

impl MockDeviceState {
    /// Count of recorded calls whose name starts with `prefix`
    pub fn calls_matching(&self, prefix: &str) -> usize {
        self.calls.iter().filter(|c| c.starts_with(prefix)).count()
    }
}

// ============================================================================
// Handle helpers for tests
// ============================================================================

/// Make a standalone program handle
pub fn make_program_handle() -> ProgramHandle {
    let mut arena: SlotMap<ProgramHandle, ()> = SlotMap::with_key();
    arena.insert(())
}

/// Make a standalone texture view handle
pub fn make_texture_view_handle() -> TextureViewHandle {
    let mut arena: SlotMap<TextureViewHandle, ()> = SlotMap::with_key();
    arena.insert(())
}

/// Make a standalone render target view handle
pub fn make_render_target_view_handle() -> RenderTargetViewHandle {
    let mut arena: SlotMap<RenderTargetViewHandle, ()> = SlotMap::with_key();
    arena.insert(())
}

/// Make a standalone depth view handle
pub fn make_depth_view_handle() -> DepthViewHandle {
    let mut arena: SlotMap<DepthViewHandle, ()> = SlotMap::with_key();
    arena.insert(())
}

/// Make a standalone index buffer handle
pub fn make_index_buffer_handle() -> IndexBufferHandle {
    let mut arena: SlotMap<IndexBufferHandle, ()> = SlotMap::with_key();
    arena.insert(())
}

// ============================================================================
// Mock device
// ============================================================================

/// Recording fake of the native device
pub struct MockDevice {
    pub state: Arc<Mutex<MockDeviceState>>,
    blend_states: SlotMap<BlendStateHandle, BlendStateDesc>,
    rasterizer_states: SlotMap<RasterizerStateHandle, RasterizerStateDesc>,
    depth_stencil_states: SlotMap<DepthStencilStateHandle, DepthStencilStateDesc>,
    sampler_states: SlotMap<SamplerStateHandle, SamplerStateDesc>,
    depth_views: SlotMap<DepthViewHandle, (u32, u32)>,
    class_instances: SlotMap<ClassInstanceHandle, String>,
    instances_by_name: FxHashMap<String, ClassInstanceHandle>,
}

impl MockDevice {
    pub fn new(state: Arc<Mutex<MockDeviceState>>) -> Self {
        Self {
            state,
            blend_states: SlotMap::with_key(),
            rasterizer_states: SlotMap::with_key(),
            depth_stencil_states: SlotMap::with_key(),
            sampler_states: SlotMap::with_key(),
            depth_views: SlotMap::with_key(),
            class_instances: SlotMap::with_key(),
            instances_by_name: FxHashMap::default(),
        }
    }

    fn record(&self, call: impl Into<String>) {
        self.state.lock().unwrap().calls.push(call.into());
    }

    fn take_injected_failure(&self) -> Option<NativeCallError> {
        self.state.lock().unwrap().fail_next_create.take()
    }
}

impl NativeDevice for MockDevice {
    fn create_blend_state(&mut self, desc: &BlendStateDesc) -> NativeResult<BlendStateHandle> {
        if let Some(err) = self.take_injected_failure() {
            return Err(err);
        }
        self.record("create_blend_state");
        let mut state = self.state.lock().unwrap();
        state.blend_states_created += 1;
        drop(state);
        Ok(self.blend_states.insert(*desc))
    }

    fn create_rasterizer_state(
        &mut self,
        desc: &RasterizerStateDesc,
    ) -> NativeResult<RasterizerStateHandle> {
        if let Some(err) = self.take_injected_failure() {
            return Err(err);
        }
        self.record("create_rasterizer_state");
        self.state.lock().unwrap().rasterizer_states_created += 1;
        Ok(self.rasterizer_states.insert(*desc))
    }

    fn create_depth_stencil_state(
        &mut self,
        desc: &DepthStencilStateDesc,
    ) -> NativeResult<DepthStencilStateHandle> {
        if let Some(err) = self.take_injected_failure() {
            return Err(err);
        }
        self.record("create_depth_stencil_state");
        self.state.lock().unwrap().depth_stencil_states_created += 1;
        Ok(self.depth_stencil_states.insert(*desc))
    }

    fn create_sampler_state(
        &mut self,
        desc: &SamplerStateDesc,
    ) -> NativeResult<SamplerStateHandle> {
        if let Some(err) = self.take_injected_failure() {
            return Err(err);
        }
        self.record("create_sampler_state");
        self.state.lock().unwrap().sampler_states_created += 1;
        Ok(self.sampler_states.insert(*desc))
    }

    fn bind_blend_state(&mut self, _state: BlendStateHandle) -> NativeResult<()> {
        self.record("bind_blend_state");
        Ok(())
    }

    fn bind_rasterizer_state(&mut self, _state: RasterizerStateHandle) -> NativeResult<()> {
        self.record("bind_rasterizer_state");
        Ok(())
    }

    fn bind_depth_stencil_state(
        &mut self,
        _state: DepthStencilStateHandle,
        stencil_ref: u32,
    ) -> NativeResult<()> {
        self.record(format!("bind_depth_stencil_state({})", stencil_ref));
        Ok(())
    }

    fn bind_program(
        &mut self,
        stage: ShaderStage,
        program: Option<ProgramHandle>,
    ) -> NativeResult<()> {
        self.record(format!(
            "bind_program({}, {})",
            stage,
            if program.is_some() { "some" } else { "none" }
        ));
        Ok(())
    }

    fn bind_stage_resources(
        &mut self,
        stage: ShaderStage,
        samplers: &[Option<SamplerStateHandle>],
        textures: &[Option<TextureViewHandle>],
    ) -> NativeResult<()> {
        self.record(format!(
            "bind_stage_resources({}, {}, {})",
            stage,
            samplers.len(),
            textures.len()
        ));
        Ok(())
    }

    fn unbind_compute_resources(&mut self) -> NativeResult<()> {
        self.record("unbind_compute_resources");
        Ok(())
    }

    fn bind_class_instance(
        &mut self,
        stage: ShaderStage,
        slot: u32,
        _instance: ClassInstanceHandle,
    ) -> NativeResult<()> {
        self.record(format!("bind_class_instance({}, {})", stage, slot));
        Ok(())
    }

    fn set_render_targets(
        &mut self,
        views: &[RenderTargetViewHandle],
        depth: Option<DepthViewHandle>,
    ) -> NativeResult<()> {
        self.record(format!(
            "set_render_targets({}, depth: {})",
            views.len(),
            depth.is_some()
        ));
        Ok(())
    }

    fn set_viewport(&mut self, viewport: &Viewport) -> NativeResult<()> {
        self.record(format!(
            "set_viewport({}, {}, {}, {})",
            viewport.left, viewport.top, viewport.width, viewport.height
        ));
        Ok(())
    }

    fn set_scissor_rect(&mut self, rect: &ScissorRect) -> NativeResult<()> {
        self.record(format!(
            "set_scissor_rect({}, {}, {}, {})",
            rect.left, rect.top, rect.right, rect.bottom
        ));
        Ok(())
    }

    fn clear_render_target_view(
        &mut self,
        _view: RenderTargetViewHandle,
        _color: [f32; 4],
    ) -> NativeResult<()> {
        self.record("clear_render_target_view");
        Ok(())
    }

    fn clear_depth_stencil_view(
        &mut self,
        _view: DepthViewHandle,
        clear_depth: bool,
        clear_stencil: bool,
        _depth: f32,
        _stencil: u8,
    ) -> NativeResult<()> {
        self.record(format!(
            "clear_depth_stencil_view(depth: {}, stencil: {})",
            clear_depth, clear_stencil
        ));
        Ok(())
    }

    fn create_depth_buffer(
        &mut self,
        width: u32,
        height: u32,
        _samples: u32,
        _sample_quality: u32,
    ) -> NativeResult<DepthViewHandle> {
        if let Some(err) = self.take_injected_failure() {
            return Err(err);
        }
        self.record(format!("create_depth_buffer({}x{})", width, height));
        self.state.lock().unwrap().depth_buffers_created += 1;
        Ok(self.depth_views.insert((width, height)))
    }

    fn set_primitive_topology(&mut self, primitive: PrimitiveKind) -> NativeResult<()> {
        self.record(format!("set_primitive_topology({:?})", primitive));
        Ok(())
    }

    fn bind_index_buffer(
        &mut self,
        _buffer: IndexBufferHandle,
        format: IndexType,
        offset: u32,
    ) -> NativeResult<()> {
        self.record(format!("bind_index_buffer({:?}, {})", format, offset));
        Ok(())
    }

    fn draw(&mut self, vertex_count: u32, vertex_start: u32) -> NativeResult<()> {
        self.record(format!("draw({}, {})", vertex_count, vertex_start));
        self.state.lock().unwrap().draws += 1;
        Ok(())
    }

    fn draw_indexed(
        &mut self,
        index_count: u32,
        index_start: u32,
        base_vertex: i32,
    ) -> NativeResult<()> {
        self.record(format!(
            "draw_indexed({}, {}, {})",
            index_count, index_start, base_vertex
        ));
        self.state.lock().unwrap().draws += 1;
        Ok(())
    }

    fn draw_instanced(
        &mut self,
        vertex_count: u32,
        instance_count: u32,
        vertex_start: u32,
    ) -> NativeResult<()> {
        self.record(format!(
            "draw_instanced({}, {}, {})",
            vertex_count, instance_count, vertex_start
        ));
        self.state.lock().unwrap().draws += 1;
        Ok(())
    }

    fn draw_indexed_instanced(
        &mut self,
        index_count: u32,
        instance_count: u32,
        index_start: u32,
        base_vertex: i32,
    ) -> NativeResult<()> {
        self.record(format!(
            "draw_indexed_instanced({}, {}, {}, {})",
            index_count, instance_count, index_start, base_vertex
        ));
        self.state.lock().unwrap().draws += 1;
        Ok(())
    }

    fn draw_auto(&mut self) -> NativeResult<()> {
        self.record("draw_auto");
        self.state.lock().unwrap().draws += 1;
        Ok(())
    }

    fn dispatch(&mut self, x: u32, y: u32, z: u32) -> NativeResult<()> {
        self.record(format!("dispatch({}, {}, {})", x, y, z));
        self.state.lock().unwrap().dispatches += 1;
        Ok(())
    }

    fn stream_output_bound(&self) -> bool {
        self.state.lock().unwrap().stream_output
    }

    fn multisample_quality_levels(&self, sample_count: u32) -> u32 {
        self.state
            .lock()
            .unwrap()
            .quality_levels
            .get(&sample_count)
            .copied()
            .unwrap_or(0)
    }

    fn is_lost(&self) -> bool {
        self.state.lock().unwrap().lost
    }

    fn driver_version(&self) -> DriverVersion {
        DriverVersion {
            major: 1,
            minor: 2,
            release: 3,
            build: 4,
        }
    }

    fn raw_handle(&self) -> usize {
        0xD3D
    }

    fn class_instance(&mut self, name: &str) -> Option<ClassInstanceHandle> {
        self.instances_by_name.get(name).copied()
    }

    fn create_class_instance(&mut self, name: &str) -> NativeResult<ClassInstanceHandle> {
        let creatable = self
            .state
            .lock()
            .unwrap()
            .creatable_subroutines
            .iter()
            .any(|n| n == name);
        if !creatable {
            return Err(NativeCallError::new(
                0x57,
                format!("class instance '{}' not found in linkage", name),
            ));
        }
        let handle = self.class_instances.insert(name.to_string());
        self.instances_by_name.insert(name.to_string(), handle);
        Ok(handle)
    }

    fn release_all(&mut self) {
        self.record("release_all");
        self.state.lock().unwrap().released = true;
        self.blend_states.clear();
        self.rasterizer_states.clear();
        self.depth_stencil_states.clear();
        self.sampler_states.clear();
        self.depth_views.clear();
        self.class_instances.clear();
        self.instances_by_name.clear();
    }
}

// ============================================================================
// Mock provider
// ============================================================================

/// Observable state of a mock provider
#[derive(Debug, Default)]
pub struct MockProviderState {
    /// Adapters visible to the provider; mutable so tests can simulate an
    /// adapter re-election
    pub adapters: Vec<AdapterInfo>,
    /// Flags of every create attempt, in order
    pub create_attempts: Vec<DeviceCreationFlags>,
    /// Remaining create calls to fail before succeeding
    pub fail_creates_remaining: u32,
    /// Devices created so far
    pub devices_created: u32,
    /// Adapter enumerations performed
    pub enumerations: u32,
    /// Recording state of the most recently created device
    pub last_device: Option<Arc<Mutex<MockDeviceState>>>,
}

/// Provider handing out mock devices
pub struct MockProvider {
    pub tier: FeatureTier,
    shared: Arc<Mutex<MockProviderState>>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    pub fn new() -> Self {
        Self::with_tier(FeatureTier::L11_0)
    }

    pub fn with_tier(tier: FeatureTier) -> Self {
        let state = MockProviderState {
            adapters: vec![AdapterInfo {
                name: "Mock Adapter".to_string(),
                vendor_id: 0x10DE,
                device_id: 0x1234,
                unique_id: 1,
            }],
            ..MockProviderState::default()
        };
        Self {
            tier,
            shared: Arc::new(Mutex::new(state)),
        }
    }

    /// Shared observable state, kept by tests after the provider moves into
    /// the render system
    pub fn shared(&self) -> Arc<Mutex<MockProviderState>> {
        self.shared.clone()
    }
}

impl DeviceProvider for MockProvider {
    fn enumerate_adapters(&mut self, _refresh: bool) -> Vec<AdapterInfo> {
        let mut shared = self.shared.lock().unwrap();
        shared.enumerations += 1;
        shared.adapters.clone()
    }

    fn create_device(
        &mut self,
        selector: &AdapterSelector,
        _kind: DriverKind,
        min_tier: FeatureTier,
        max_tier: FeatureTier,
        flags: DeviceCreationFlags,
    ) -> Result<CreatedDevice> {
        let mut shared = self.shared.lock().unwrap();
        shared.create_attempts.push(flags);

        if shared.fail_creates_remaining > 0 {
            shared.fail_creates_remaining -= 1;
            return Err(Error::InitializationFailed(
                "mock device creation failure".to_string(),
            ));
        }

        let adapter = shared
            .adapters
            .iter()
            .find(|a| selector.matches(a))
            .or_else(|| shared.adapters.first())
            .cloned()
            .ok_or_else(|| Error::InitializationFailed("no adapters available".to_string()))?;

        let achieved = self.tier.min(max_tier);
        if achieved < min_tier {
            return Err(Error::InitializationFailed(format!(
                "adapter cannot reach the requested min feature tier {}",
                min_tier
            )));
        }

        let mut device_state = MockDeviceState::default();
        // Sensible defaults: common MSAA counts supported with one quality
        // level each
        for count in [1u32, 2, 4, 8] {
            device_state.quality_levels.insert(count, 1);
        }
        let device_state = Arc::new(Mutex::new(device_state));

        shared.devices_created += 1;
        shared.last_device = Some(device_state.clone());

        Ok(CreatedDevice {
            device: Box::new(MockDevice::new(device_state)),
            tier: achieved,
            adapter,
        })
    }
}
