/// Native device contracts - the narrow boundary between the core and a
/// driver backend
///
/// The core never talks to a graphics driver directly. Backend plugins
/// implement [`DeviceProvider`] (adapter enumeration + device creation) and
/// [`NativeDevice`] (immediate-style state/draw submission). Everything the
/// core hands across this boundary is either a plain descriptor struct or a
/// slotmap-keyed handle; native objects never cross it by value.
use crate::binding::ShaderStage;
use crate::draw::{IndexType, PrimitiveKind};
use crate::error::{Error, Result};
use crate::pipeline::{
    BlendStateDesc, DepthStencilStateDesc, RasterizerStateDesc, SamplerStateDesc, ScissorRect,
};
use crate::target::Viewport;
use bitflags::bitflags;
use slotmap::new_key_type;

/// Maximum number of texture units a single stage can bind
pub const MAX_TEXTURE_UNITS: usize = 16;

/// Maximum number of simultaneously bound render target views
pub const MAX_RENDER_TARGET_VIEWS: usize = 8;

// ===== HANDLES =====
//
// All native objects are referenced through generational arena keys. A
// backend invalidates every key wholesale when its device is replaced;
// nothing is freed key-by-key during recovery.

new_key_type! {
    /// Handle to a native blend state object
    pub struct BlendStateHandle;
    /// Handle to a native rasterizer state object
    pub struct RasterizerStateHandle;
    /// Handle to a native depth/stencil state object
    pub struct DepthStencilStateHandle;
    /// Handle to a native sampler state object
    pub struct SamplerStateHandle;
    /// Handle to a compiled shader program owned by the program manager
    pub struct ProgramHandle;
    /// Handle to a shader-resource texture view owned by the texture manager
    pub struct TextureViewHandle;
    /// Handle to a render target view
    pub struct RenderTargetViewHandle;
    /// Handle to a depth/stencil view
    pub struct DepthViewHandle;
    /// Handle to an index buffer owned by the buffer manager
    pub struct IndexBufferHandle;
    /// Handle to a shader class instance (dynamic linkage)
    pub struct ClassInstanceHandle;
}

// ===== NATIVE CALL ERRORS =====

/// Error reported by a single native device call
///
/// Backends fill in the driver error code and whether that code is a
/// device-removal/reset signature. The core attaches the attempted operation
/// name when converting into an engine [`Error`].
#[derive(Debug, Clone)]
pub struct NativeCallError {
    /// Native error code as reported by the driver
    pub code: i32,
    /// Human-readable description from the backend
    pub description: String,
    /// True when the code is a device-removal/reset signature
    pub device_lost: bool,
}

impl NativeCallError {
    /// A plain native failure
    pub fn new(code: i32, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
            device_lost: false,
        }
    }

    /// A failure carrying the device-loss signature
    pub fn lost(code: i32, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
            device_lost: true,
        }
    }

    /// Convert into an engine error, naming the attempted operation
    pub fn into_error(self, operation: &str) -> Error {
        Error::RenderingApi {
            code: self.code,
            description: format!("{}: {}", operation, self.description),
            device_lost: self.device_lost,
        }
    }
}

/// Result type for native device calls
pub type NativeResult<T> = std::result::Result<T, NativeCallError>;

// ===== ADAPTERS AND DRIVERS =====

/// Identity of a physical adapter as reported by the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterInfo {
    /// Driver-reported adapter description
    pub name: String,
    /// PCI vendor id (0x10DE, 0x1002, ...)
    pub vendor_id: u32,
    /// PCI device id
    pub device_id: u32,
    /// Stable unique id of this adapter (LUID analog); recovery compares it
    /// to detect that another adapter was elected
    pub unique_id: u64,
}

/// Which adapter the device should be created on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterSelector {
    /// Let the backend pick its default adapter
    Default,
    /// Select the adapter whose description matches exactly
    Named(String),
}

impl AdapterSelector {
    /// True if `info` satisfies this selector
    pub fn matches(&self, info: &AdapterInfo) -> bool {
        match self {
            AdapterSelector::Default => true,
            AdapterSelector::Named(name) => info.name == *name,
        }
    }
}

/// Requested driver kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverKind {
    /// Real GPU driver
    Hardware,
    /// Reference software rasterizer
    Software,
    /// Fast software rasterizer (WARP analog)
    Warp,
}

bitflags! {
    /// Device creation flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DeviceCreationFlags: u32 {
        /// Enable driver debug/validation layer
        const DEBUG_VALIDATION = 1 << 0;
        /// Tell the driver it will only ever be called from one thread
        const SINGLE_THREADED = 1 << 1;
    }
}

/// Result of a successful device creation
pub struct CreatedDevice {
    /// The native device, exclusively owned by the caller
    pub device: Box<dyn NativeDevice>,
    /// Feature tier the driver actually achieved
    pub tier: crate::device::FeatureTier,
    /// Adapter the device was created on
    pub adapter: AdapterInfo,
}

/// Backend factory for native devices
///
/// Implemented by device plugins. `enumerate_adapters` backs both adapter
/// selection and the re-election check during device validation.
pub trait DeviceProvider: Send {
    /// List the adapters currently visible to the backend
    ///
    /// # Arguments
    ///
    /// * `refresh` - force a re-enumeration instead of returning a cached list
    fn enumerate_adapters(&mut self, refresh: bool) -> Vec<AdapterInfo>;

    /// Create a native device on the selected adapter
    ///
    /// The backend clamps the achieved feature tier into `[min_tier,
    /// max_tier]` and fails if the adapter cannot reach `min_tier`. The
    /// debug-validation retry policy is NOT the backend's job; the device
    /// handle strips the flag and retries once itself.
    fn create_device(
        &mut self,
        selector: &AdapterSelector,
        kind: DriverKind,
        min_tier: crate::device::FeatureTier,
        max_tier: crate::device::FeatureTier,
        flags: DeviceCreationFlags,
    ) -> Result<CreatedDevice>;
}

// ===== NATIVE DEVICE =====

/// Immediate-style native device interface
///
/// One instance is live per rendering system; it is replaced wholesale on
/// device loss. All calls are synchronous against the driver. Submission is
/// serialized by design (see the concurrency model), so implementations do
/// not need internal locking.
pub trait NativeDevice: Send {
    // ----- state objects -----

    /// Build an immutable native blend state from a descriptor
    fn create_blend_state(&mut self, desc: &BlendStateDesc) -> NativeResult<BlendStateHandle>;

    /// Build an immutable native rasterizer state from a descriptor
    fn create_rasterizer_state(
        &mut self,
        desc: &RasterizerStateDesc,
    ) -> NativeResult<RasterizerStateHandle>;

    /// Build an immutable native depth/stencil state from a descriptor
    fn create_depth_stencil_state(
        &mut self,
        desc: &DepthStencilStateDesc,
    ) -> NativeResult<DepthStencilStateHandle>;

    /// Build an immutable native sampler state from a descriptor
    fn create_sampler_state(&mut self, desc: &SamplerStateDesc)
        -> NativeResult<SamplerStateHandle>;

    // ----- state binding -----

    fn bind_blend_state(&mut self, state: BlendStateHandle) -> NativeResult<()>;

    fn bind_rasterizer_state(&mut self, state: RasterizerStateHandle) -> NativeResult<()>;

    fn bind_depth_stencil_state(
        &mut self,
        state: DepthStencilStateHandle,
        stencil_ref: u32,
    ) -> NativeResult<()>;

    /// Bind or unbind (`None`) the program of a pipeline stage
    fn bind_program(&mut self, stage: ShaderStage, program: Option<ProgramHandle>)
        -> NativeResult<()>;

    /// Push sampler/texture unit bindings for one stage, starting at unit 0
    fn bind_stage_resources(
        &mut self,
        stage: ShaderStage,
        samplers: &[Option<SamplerStateHandle>],
        textures: &[Option<TextureViewHandle>],
    ) -> NativeResult<()>;

    /// Unbind the resources feeding the compute stage (views + UAVs)
    fn unbind_compute_resources(&mut self) -> NativeResult<()>;

    /// Bind a class instance into a dynamic-linkage slot of a stage
    fn bind_class_instance(
        &mut self,
        stage: ShaderStage,
        slot: u32,
        instance: ClassInstanceHandle,
    ) -> NativeResult<()>;

    // ----- render targets, viewport, clears -----

    fn set_render_targets(
        &mut self,
        views: &[RenderTargetViewHandle],
        depth: Option<DepthViewHandle>,
    ) -> NativeResult<()>;

    fn set_viewport(&mut self, viewport: &Viewport) -> NativeResult<()>;

    fn set_scissor_rect(&mut self, rect: &ScissorRect) -> NativeResult<()>;

    fn clear_render_target_view(
        &mut self,
        view: RenderTargetViewHandle,
        color: [f32; 4],
    ) -> NativeResult<()>;

    fn clear_depth_stencil_view(
        &mut self,
        view: DepthViewHandle,
        clear_depth: bool,
        clear_stencil: bool,
        depth: f32,
        stencil: u8,
    ) -> NativeResult<()>;

    /// Create a depth/stencil buffer sized for a render target
    fn create_depth_buffer(
        &mut self,
        width: u32,
        height: u32,
        samples: u32,
        sample_quality: u32,
    ) -> NativeResult<DepthViewHandle>;

    // ----- draw path -----

    fn set_primitive_topology(&mut self, primitive: PrimitiveKind) -> NativeResult<()>;

    fn bind_index_buffer(
        &mut self,
        buffer: IndexBufferHandle,
        format: IndexType,
        offset: u32,
    ) -> NativeResult<()>;

    fn draw(&mut self, vertex_count: u32, vertex_start: u32) -> NativeResult<()>;

    fn draw_indexed(
        &mut self,
        index_count: u32,
        index_start: u32,
        base_vertex: i32,
    ) -> NativeResult<()>;

    fn draw_instanced(
        &mut self,
        vertex_count: u32,
        instance_count: u32,
        vertex_start: u32,
    ) -> NativeResult<()>;

    fn draw_indexed_instanced(
        &mut self,
        index_count: u32,
        instance_count: u32,
        index_start: u32,
        base_vertex: i32,
    ) -> NativeResult<()>;

    /// Draw from the currently bound stream-output buffer, letting the
    /// driver derive the vertex count
    fn draw_auto(&mut self) -> NativeResult<()>;

    fn dispatch(&mut self, x: u32, y: u32, z: u32) -> NativeResult<()>;

    // ----- queries -----

    /// True when a stream-output target is currently bound
    fn stream_output_bound(&self) -> bool;

    /// Number of driver quality levels for a multisample count (0 when the
    /// count is unsupported)
    fn multisample_quality_levels(&self, sample_count: u32) -> u32;

    /// True when the last native call reported a removal/reset condition
    fn is_lost(&self) -> bool;

    /// Driver version quad reported by the adapter
    fn driver_version(&self) -> crate::device::DriverVersion;

    /// Raw pointer-sized value of the native device, for the custom
    /// attribute surface
    fn raw_handle(&self) -> usize;

    // ----- dynamic linkage -----

    /// Look up an already-created class instance
    fn class_instance(&mut self, name: &str) -> Option<ClassInstanceHandle>;

    /// Create a class instance for a subroutine name; fails when the name
    /// does not exist in the bound class linkage
    fn create_class_instance(&mut self, name: &str) -> NativeResult<ClassInstanceHandle>;

    // ----- lifecycle -----

    /// Drop every reference the device tracks. Called at shutdown and
    /// immediately before the handle is replaced during recovery.
    fn release_all(&mut self);
}
