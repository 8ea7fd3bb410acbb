/// VulkanDeviceProvider / VulkanNativeDevice - Vulkan implementation of the
/// engine's native device contracts
///
/// The engine binds immutable state objects one at a time; this backend
/// keeps the translated Vulkan values in slotmap arenas and applies them
/// with Vulkan 1.3 dynamic state (extended by VK_EXT_extended_dynamic_state3
/// and VK_EXT_shader_object), so no pipeline permutations are ever built.
use ash::vk;
use ash::vk::Handle;
use gpu_allocator::vulkan::{
    Allocation, AllocationCreateDesc, AllocationScheme, Allocator, AllocatorCreateDesc,
};
use gpu_allocator::MemoryLocation;
use nova_render_engine::nova::device::{
    AdapterInfo, AdapterSelector, BlendStateHandle, ClassInstanceHandle, CreatedDevice,
    DepthStencilStateHandle, DepthViewHandle, DeviceCreationFlags, DeviceProvider, DriverKind,
    DriverVersion, FeatureTier, IndexBufferHandle, NativeCallError, NativeDevice, NativeResult,
    ProgramHandle, RasterizerStateHandle, RenderTargetViewHandle, SamplerStateHandle,
    TextureViewHandle, MAX_RENDER_TARGET_VIEWS, MAX_TEXTURE_UNITS,
};
use nova_render_engine::nova::render::{
    BlendStateDesc, ColorWriteMask, DepthStencilStateDesc, FilterOptions, IndexType,
    PrimitiveKind, RasterizerStateDesc, SamplerStateDesc, ScissorRect, ShaderStage, Viewport,
};
use nova_render_engine::nova::{Error, Result};
use nova_render_engine::{engine_error, engine_info, engine_warn};
use slotmap::SlotMap;
use std::cell::Cell;
use std::ffi::CStr;
use std::mem::ManuallyDrop;
use std::sync::{Arc, Mutex};

use crate::vulkan_context::GpuContext;
use crate::vulkan_mappings;

/// Depth format used for pool-managed depth buffers
const DEPTH_FORMAT: vk::Format = vk::Format::D32_SFLOAT_S8_UINT;

// ============================================================================
// Provider
// ============================================================================

/// Vulkan implementation of the engine's device factory
pub struct VulkanDeviceProvider {
    entry: ash::Entry,
    /// Lightweight instance kept alive for adapter enumeration
    enumeration_instance: Option<ash::Instance>,
    cached_adapters: Vec<AdapterInfo>,
}

impl VulkanDeviceProvider {
    /// Load the Vulkan library
    pub fn new() -> Result<Self> {
        let entry = unsafe {
            ash::Entry::load().map_err(|e| {
                engine_error!("nova::vulkan", "Failed to load Vulkan library: {:?}", e);
                Error::InitializationFailed(format!("Failed to load Vulkan library: {:?}", e))
            })?
        };
        Ok(Self {
            entry,
            enumeration_instance: None,
            cached_adapters: Vec::new(),
        })
    }

    fn adapter_info(
        instance: &ash::Instance,
        index: usize,
        physical_device: vk::PhysicalDevice,
    ) -> AdapterInfo {
        let properties = unsafe { instance.get_physical_device_properties(physical_device) };
        let name = unsafe { CStr::from_ptr(properties.device_name.as_ptr()) }
            .to_string_lossy()
            .into_owned();
        AdapterInfo {
            name,
            vendor_id: properties.vendor_id,
            device_id: properties.device_id,
            unique_id: ((index as u64) << 48)
                | ((properties.vendor_id as u64) << 32)
                | properties.device_id as u64,
        }
    }

    fn ensure_enumeration_instance(&mut self) -> Result<&ash::Instance> {
        if self.enumeration_instance.is_none() {
            let app_info = vk::ApplicationInfo::default()
                .application_name(c"Nova Application")
                .engine_name(c"Nova")
                .api_version(vk::API_VERSION_1_3);
            let create_info = vk::InstanceCreateInfo::default().application_info(&app_info);
            let instance = unsafe {
                self.entry.create_instance(&create_info, None).map_err(|e| {
                    engine_error!(
                        "nova::vulkan",
                        "Failed to create enumeration instance: {:?}",
                        e
                    );
                    Error::InitializationFailed(format!("Failed to create instance: {:?}", e))
                })?
            };
            self.enumeration_instance = Some(instance);
        }
        Ok(self.enumeration_instance.as_ref().unwrap())
    }
}

impl Drop for VulkanDeviceProvider {
    fn drop(&mut self) {
        if let Some(instance) = self.enumeration_instance.take() {
            unsafe { instance.destroy_instance(None) };
        }
    }
}

impl DeviceProvider for VulkanDeviceProvider {
    fn enumerate_adapters(&mut self, refresh: bool) -> Vec<AdapterInfo> {
        if !refresh && !self.cached_adapters.is_empty() {
            return self.cached_adapters.clone();
        }

        let instance = match self.ensure_enumeration_instance() {
            Ok(instance) => instance,
            Err(_) => return Vec::new(),
        };

        let physical_devices = match unsafe { instance.enumerate_physical_devices() } {
            Ok(devices) => devices,
            Err(e) => {
                engine_warn!(
                    "nova::vulkan",
                    "Failed to enumerate physical devices: {:?}",
                    e
                );
                return Vec::new();
            }
        };

        self.cached_adapters = physical_devices
            .iter()
            .enumerate()
            .map(|(index, pd)| Self::adapter_info(instance, index, *pd))
            .collect();
        self.cached_adapters.clone()
    }

    fn create_device(
        &mut self,
        selector: &AdapterSelector,
        kind: DriverKind,
        min_tier: FeatureTier,
        max_tier: FeatureTier,
        flags: DeviceCreationFlags,
    ) -> Result<CreatedDevice> {
        let validation = flags.contains(DeviceCreationFlags::DEBUG_VALIDATION);

        unsafe {
            // ----- instance -----
            let app_info = vk::ApplicationInfo::default()
                .application_name(c"Nova Application")
                .application_version(vk::make_api_version(0, 1, 0, 0))
                .engine_name(c"Nova")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_3);

            let mut extension_names: Vec<*const std::os::raw::c_char> = Vec::new();
            if validation {
                extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
            }
            let layer_names = if validation {
                vec![c"VK_LAYER_KHRONOS_validation".as_ptr()]
            } else {
                vec![]
            };

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);

            let instance = self.entry.create_instance(&create_info, None).map_err(|e| {
                engine_error!("nova::vulkan", "Failed to create Vulkan instance: {:?}", e);
                Error::InitializationFailed(format!("Failed to create instance: {:?}", e))
            })?;

            // ----- debug messenger -----
            let (debug_utils_loader, debug_messenger) = if validation {
                let debug_utils = ash::ext::debug_utils::Instance::new(&self.entry, &instance);
                let debug_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
                    .message_severity(
                        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                            | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING,
                    )
                    .message_type(
                        vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                            | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                            | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
                    )
                    .pfn_user_callback(Some(crate::debug::vulkan_debug_callback));
                let messenger = debug_utils
                    .create_debug_utils_messenger(&debug_info, None)
                    .map_err(|e| {
                        engine_error!(
                            "nova::vulkan",
                            "Failed to create debug messenger: {:?}",
                            e
                        );
                        Error::InitializationFailed(format!(
                            "Failed to create debug messenger: {:?}",
                            e
                        ))
                    })?;
                (Some(debug_utils), Some(messenger))
            } else {
                (None, None)
            };

            // ----- physical device election -----
            let physical_devices = instance.enumerate_physical_devices().map_err(|e| {
                engine_error!(
                    "nova::vulkan",
                    "Failed to enumerate physical devices: {:?}",
                    e
                );
                Error::InitializationFailed(format!(
                    "Failed to enumerate physical devices: {:?}",
                    e
                ))
            })?;

            let mut elected: Option<(usize, vk::PhysicalDevice)> = None;
            for (index, pd) in physical_devices.iter().enumerate() {
                let info = Self::adapter_info(&instance, index, *pd);
                if !selector.matches(&info) {
                    continue;
                }
                let properties = instance.get_physical_device_properties(*pd);
                let wants_software = matches!(kind, DriverKind::Software | DriverKind::Warp);
                let is_software = properties.device_type == vk::PhysicalDeviceType::CPU;
                if wants_software != is_software {
                    continue;
                }
                // Prefer discrete GPUs for hardware devices
                let better = match elected {
                    None => true,
                    Some((_, current)) => {
                        let current_type =
                            instance.get_physical_device_properties(current).device_type;
                        properties.device_type == vk::PhysicalDeviceType::DISCRETE_GPU
                            && current_type != vk::PhysicalDeviceType::DISCRETE_GPU
                    }
                };
                if better {
                    elected = Some((index, *pd));
                }
            }

            let (adapter_index, physical_device) = elected.ok_or_else(|| {
                engine_error!("nova::vulkan", "No Vulkan adapter matched the selection");
                Error::InitializationFailed("No Vulkan adapter matched the selection".to_string())
            })?;
            let adapter = Self::adapter_info(&instance, adapter_index, physical_device);
            let properties = instance.get_physical_device_properties(physical_device);

            // ----- feature tier negotiation -----
            let features = instance.get_physical_device_features(physical_device);
            let achieved = tier_for_features(&features).min(max_tier);
            if achieved < min_tier {
                return Err(Error::InitializationFailed(format!(
                    "adapter \"{}\" reaches feature tier {} but {} was requested as minimum",
                    adapter.name, achieved, min_tier
                )));
            }

            // ----- queue family -----
            let queue_families =
                instance.get_physical_device_queue_family_properties(physical_device);
            let queue_family = queue_families
                .iter()
                .enumerate()
                .find(|(_, qf)| {
                    qf.queue_flags
                        .contains(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE)
                })
                .map(|(i, _)| i as u32)
                .ok_or_else(|| {
                    engine_error!("nova::vulkan", "No graphics+compute queue family found");
                    Error::InitializationFailed(
                        "No graphics+compute queue family found".to_string(),
                    )
                })?;

            // ----- device extensions -----
            let available_extensions = instance
                .enumerate_device_extension_properties(physical_device)
                .map_err(|e| {
                    Error::InitializationFailed(format!(
                        "Failed to enumerate device extensions: {:?}",
                        e
                    ))
                })?;
            let has_extension = |name: &CStr| {
                available_extensions.iter().any(|ext| {
                    CStr::from_ptr(ext.extension_name.as_ptr()) == name
                })
            };

            for required in [
                ash::ext::shader_object::NAME,
                ash::ext::extended_dynamic_state3::NAME,
                ash::ext::extended_dynamic_state2::NAME,
            ] {
                if !has_extension(required) {
                    return Err(Error::InitializationFailed(format!(
                        "adapter \"{}\" lacks the required extension {}",
                        adapter.name,
                        required.to_string_lossy()
                    )));
                }
            }
            let transform_feedback_supported = has_extension(ash::ext::transform_feedback::NAME);

            let mut device_extension_names = vec![
                ash::ext::shader_object::NAME.as_ptr(),
                ash::ext::extended_dynamic_state3::NAME.as_ptr(),
                ash::ext::extended_dynamic_state2::NAME.as_ptr(),
            ];
            if transform_feedback_supported {
                device_extension_names.push(ash::ext::transform_feedback::NAME.as_ptr());
            }

            // ----- logical device -----
            let queue_priorities = [1.0];
            let queue_create_infos = [vk::DeviceQueueCreateInfo::default()
                .queue_family_index(queue_family)
                .queue_priorities(&queue_priorities)];

            let device_features = vk::PhysicalDeviceFeatures::default()
                .sampler_anisotropy(features.sampler_anisotropy == vk::TRUE)
                .geometry_shader(features.geometry_shader == vk::TRUE)
                .tessellation_shader(features.tessellation_shader == vk::TRUE)
                .fill_mode_non_solid(features.fill_mode_non_solid == vk::TRUE);

            let mut features13 = vk::PhysicalDeviceVulkan13Features::default()
                .dynamic_rendering(true)
                .synchronization2(true);
            let mut shader_object_features =
                vk::PhysicalDeviceShaderObjectFeaturesEXT::default().shader_object(true);
            let mut eds3_features = vk::PhysicalDeviceExtendedDynamicState3FeaturesEXT::default()
                .extended_dynamic_state3_polygon_mode(true)
                .extended_dynamic_state3_alpha_to_coverage_enable(true)
                .extended_dynamic_state3_color_blend_enable(true)
                .extended_dynamic_state3_color_blend_equation(true)
                .extended_dynamic_state3_color_write_mask(true);
            let mut eds2_features = vk::PhysicalDeviceExtendedDynamicState2FeaturesEXT::default()
                .extended_dynamic_state2_patch_control_points(true);
            let mut transform_feedback_features =
                vk::PhysicalDeviceTransformFeedbackFeaturesEXT::default().transform_feedback(true);

            let mut device_create_info = vk::DeviceCreateInfo::default()
                .queue_create_infos(&queue_create_infos)
                .enabled_extension_names(&device_extension_names)
                .enabled_features(&device_features)
                .push_next(&mut features13)
                .push_next(&mut shader_object_features)
                .push_next(&mut eds3_features)
                .push_next(&mut eds2_features);
            if transform_feedback_supported {
                device_create_info = device_create_info.push_next(&mut transform_feedback_features);
            }

            let device = instance
                .create_device(physical_device, &device_create_info, None)
                .map_err(|e| {
                    engine_error!("nova::vulkan", "Failed to create logical device: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create device: {:?}", e))
                })?;

            let queue = device.get_device_queue(queue_family, 0);

            // ----- allocator -----
            let allocator = Allocator::new(&AllocatorCreateDesc {
                instance: instance.clone(),
                device: device.clone(),
                physical_device,
                debug_settings: Default::default(),
                buffer_device_address: false,
                allocation_sizes: Default::default(),
            })
            .map_err(|e| {
                engine_error!("nova::vulkan", "Failed to create GPU allocator: {:?}", e);
                Error::InitializationFailed(format!("Failed to create allocator: {:?}", e))
            })?;

            // ----- command pool + submit fence -----
            let pool_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(queue_family)
                .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);
            let command_pool = device.create_command_pool(&pool_info, None).map_err(|e| {
                Error::InitializationFailed(format!("Failed to create command pool: {:?}", e))
            })?;

            let fence_info = vk::FenceCreateInfo::default();
            let submit_fence = device.create_fence(&fence_info, None).map_err(|e| {
                Error::InitializationFailed(format!("Failed to create submit fence: {:?}", e))
            })?;

            let ctx = Arc::new(GpuContext::new(
                device,
                Arc::new(Mutex::new(allocator)),
                queue,
                queue_family,
                command_pool,
                instance,
                debug_utils_loader,
                debug_messenger,
            ));

            let driver_version = DriverVersion {
                major: vk::api_version_major(properties.driver_version) as u16,
                minor: vk::api_version_minor(properties.driver_version) as u16,
                release: vk::api_version_patch(properties.driver_version) as u16,
                build: 0,
            };

            engine_info!(
                "nova::vulkan",
                "Created device on \"{}\" (tier {}, driver {})",
                adapter.name,
                achieved,
                driver_version
            );

            let native = VulkanNativeDevice::new(
                ctx,
                properties,
                driver_version,
                submit_fence,
                transform_feedback_supported,
            )?;

            Ok(CreatedDevice {
                device: Box::new(native),
                tier: achieved,
                adapter,
            })
        }
    }
}

/// Feature tier of a physical device, derived from its feature set
///
/// Any device this backend accepts is at least mid-tier (Vulkan 1.3 with
/// the shader-object extension); tessellation raises it to the top tier.
fn tier_for_features(features: &vk::PhysicalDeviceFeatures) -> FeatureTier {
    if features.tessellation_shader == vk::TRUE && features.geometry_shader == vk::TRUE {
        FeatureTier::L11_1
    } else if features.geometry_shader == vk::TRUE {
        FeatureTier::L10_1
    } else {
        FeatureTier::L10_0
    }
}

// ============================================================================
// Baked state objects
// ============================================================================

struct BakedBlendState {
    alpha_to_coverage: bool,
    enables: [vk::Bool32; MAX_RENDER_TARGET_VIEWS],
    equations: [vk::ColorBlendEquationEXT; MAX_RENDER_TARGET_VIEWS],
    write_masks: [vk::ColorComponentFlags; MAX_RENDER_TARGET_VIEWS],
}

struct BakedRasterizerState {
    polygon_mode: vk::PolygonMode,
    cull_mode: vk::CullModeFlags,
    front_face: vk::FrontFace,
    depth_bias_constant: f32,
    depth_bias_clamp: f32,
    depth_bias_slope: f32,
}

struct BakedDepthStencilState {
    depth_test: bool,
    depth_write: bool,
    depth_compare: vk::CompareOp,
    stencil_test: bool,
    front: vk::StencilOpState,
    back: vk::StencilOpState,
    read_mask: u32,
    write_mask: u32,
}

struct DepthBufferObject {
    image: vk::Image,
    view: vk::ImageView,
    allocation: Option<Allocation>,
}

struct BoundTargetView {
    view: vk::ImageView,
    width: u32,
    height: u32,
}

/// Stream-output binding registered by the buffer manager
pub struct StreamOutputBinding {
    pub counter_buffer: vk::Buffer,
    pub counter_offset: u64,
    pub vertex_stride: u32,
}

// ============================================================================
// Native device
// ============================================================================

/// Vulkan implementation of the engine's native device
pub struct VulkanNativeDevice {
    ctx: Arc<GpuContext>,
    properties: vk::PhysicalDeviceProperties,
    driver_version: DriverVersion,

    shader_object: ash::ext::shader_object::Device,
    eds2: ash::ext::extended_dynamic_state2::Device,
    eds3: ash::ext::extended_dynamic_state3::Device,
    transform_feedback: Option<ash::ext::transform_feedback::Device>,

    // Per-stage combined-image-sampler descriptor sets
    descriptor_set_layout: vk::DescriptorSetLayout,
    pipeline_layout: vk::PipelineLayout,
    descriptor_pool: vk::DescriptorPool,
    stage_descriptor_sets: [vk::DescriptorSet; ShaderStage::COUNT],

    submit_fence: vk::Fence,
    command_buffer: Option<vk::CommandBuffer>,
    rendering_active: bool,
    bound_color_targets: Vec<RenderTargetViewHandle>,
    bound_depth_target: Option<DepthViewHandle>,
    lost: Cell<bool>,

    // Arenas: state objects and depth buffers are owned; programs, texture
    // views, target views and index buffers are weak registrations owned by
    // their managers
    blend_states: SlotMap<BlendStateHandle, BakedBlendState>,
    rasterizer_states: SlotMap<RasterizerStateHandle, BakedRasterizerState>,
    depth_stencil_states: SlotMap<DepthStencilStateHandle, BakedDepthStencilState>,
    samplers: SlotMap<SamplerStateHandle, vk::Sampler>,
    depth_buffers: SlotMap<DepthViewHandle, DepthBufferObject>,
    programs: SlotMap<ProgramHandle, vk::ShaderEXT>,
    texture_views: SlotMap<TextureViewHandle, vk::ImageView>,
    render_target_views: SlotMap<RenderTargetViewHandle, BoundTargetView>,
    index_buffers: SlotMap<IndexBufferHandle, vk::Buffer>,

    stream_output: Option<StreamOutputBinding>,
}

impl VulkanNativeDevice {
    fn new(
        ctx: Arc<GpuContext>,
        properties: vk::PhysicalDeviceProperties,
        driver_version: DriverVersion,
        submit_fence: vk::Fence,
        transform_feedback_supported: bool,
    ) -> Result<Self> {
        let shader_object = ash::ext::shader_object::Device::new(&ctx.instance, &ctx.device);
        let eds2 = ash::ext::extended_dynamic_state2::Device::new(&ctx.instance, &ctx.device);
        let eds3 = ash::ext::extended_dynamic_state3::Device::new(&ctx.instance, &ctx.device);
        let transform_feedback = transform_feedback_supported
            .then(|| ash::ext::transform_feedback::Device::new(&ctx.instance, &ctx.device));

        unsafe {
            // One combined-image-sampler set layout shared by every stage
            let bindings: Vec<vk::DescriptorSetLayoutBinding> = (0..MAX_TEXTURE_UNITS)
                .map(|unit| {
                    vk::DescriptorSetLayoutBinding::default()
                        .binding(unit as u32)
                        .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                        .descriptor_count(1)
                        .stage_flags(vk::ShaderStageFlags::ALL)
                })
                .collect();
            let layout_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&bindings);
            let descriptor_set_layout = ctx
                .device
                .create_descriptor_set_layout(&layout_info, None)
                .map_err(|e| {
                    Error::InitializationFailed(format!(
                        "Failed to create descriptor set layout: {:?}",
                        e
                    ))
                })?;

            let set_layouts = [descriptor_set_layout; ShaderStage::COUNT];
            let pipeline_layout_info =
                vk::PipelineLayoutCreateInfo::default().set_layouts(&set_layouts);
            let pipeline_layout = ctx
                .device
                .create_pipeline_layout(&pipeline_layout_info, None)
                .map_err(|e| {
                    Error::InitializationFailed(format!(
                        "Failed to create pipeline layout: {:?}",
                        e
                    ))
                })?;

            let pool_sizes = [vk::DescriptorPoolSize {
                ty: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                descriptor_count: (MAX_TEXTURE_UNITS * ShaderStage::COUNT) as u32,
            }];
            let pool_info = vk::DescriptorPoolCreateInfo::default()
                .pool_sizes(&pool_sizes)
                .max_sets(ShaderStage::COUNT as u32);
            let descriptor_pool = ctx
                .device
                .create_descriptor_pool(&pool_info, None)
                .map_err(|e| {
                    Error::InitializationFailed(format!(
                        "Failed to create descriptor pool: {:?}",
                        e
                    ))
                })?;

            let alloc_info = vk::DescriptorSetAllocateInfo::default()
                .descriptor_pool(descriptor_pool)
                .set_layouts(&set_layouts);
            let sets = ctx
                .device
                .allocate_descriptor_sets(&alloc_info)
                .map_err(|e| {
                    Error::InitializationFailed(format!(
                        "Failed to allocate stage descriptor sets: {:?}",
                        e
                    ))
                })?;
            let mut stage_descriptor_sets = [vk::DescriptorSet::null(); ShaderStage::COUNT];
            stage_descriptor_sets.copy_from_slice(&sets);

            Ok(Self {
                ctx,
                properties,
                driver_version,
                shader_object,
                eds2,
                eds3,
                transform_feedback,
                descriptor_set_layout,
                pipeline_layout,
                descriptor_pool,
                stage_descriptor_sets,
                submit_fence,
                command_buffer: None,
                rendering_active: false,
                bound_color_targets: Vec::new(),
                bound_depth_target: None,
                lost: Cell::new(false),
                blend_states: SlotMap::with_key(),
                rasterizer_states: SlotMap::with_key(),
                depth_stencil_states: SlotMap::with_key(),
                samplers: SlotMap::with_key(),
                depth_buffers: SlotMap::with_key(),
                programs: SlotMap::with_key(),
                texture_views: SlotMap::with_key(),
                render_target_views: SlotMap::with_key(),
                index_buffers: SlotMap::with_key(),
                stream_output: None,
            })
        }
    }

    /// Wrap a vk error into a native call error, latching device loss
    fn vk_error(&self, result: vk::Result, what: &str) -> NativeCallError {
        if result == vk::Result::ERROR_DEVICE_LOST {
            self.lost.set(true);
            NativeCallError::lost(result.as_raw(), format!("{}: {:?}", what, result))
        } else {
            NativeCallError::new(result.as_raw(), format!("{}: {:?}", what, result))
        }
    }

    fn stale_handle(&self, what: &str) -> NativeCallError {
        NativeCallError::new(
            vk::Result::ERROR_UNKNOWN.as_raw(),
            format!("{} refers to a released object", what),
        )
    }

    /// Command buffer currently recording, lazily begun
    fn current(&mut self) -> NativeResult<vk::CommandBuffer> {
        if let Some(cb) = self.command_buffer {
            return Ok(cb);
        }
        unsafe {
            let alloc_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(self.ctx.command_pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);
            let buffers = self
                .ctx
                .device
                .allocate_command_buffers(&alloc_info)
                .map_err(|e| self.vk_error(e, "allocate command buffer"))?;
            let cb = buffers[0];

            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
            self.ctx
                .device
                .begin_command_buffer(cb, &begin_info)
                .map_err(|e| self.vk_error(e, "begin command buffer"))?;

            self.command_buffer = Some(cb);
            Ok(cb)
        }
    }

    fn end_rendering_if_active(&mut self, cb: vk::CommandBuffer) {
        if self.rendering_active {
            unsafe { self.ctx.device.cmd_end_rendering(cb) };
            self.rendering_active = false;
        }
    }

    /// Submit the recorded commands and wait for completion
    ///
    /// Called by the presentation layer at the end of a frame; the engine
    /// core never submits directly.
    pub fn flush(&mut self) -> Result<()> {
        let Some(cb) = self.command_buffer.take() else {
            return Ok(());
        };
        unsafe {
            self.end_rendering_if_active(cb);
            self.ctx
                .device
                .end_command_buffer(cb)
                .map_err(|e| self.vk_error(e, "end command buffer").into_error("flush"))?;

            let command_buffers = [cb];
            let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);
            self.ctx
                .device
                .queue_submit(self.ctx.queue, &[submit_info], self.submit_fence)
                .map_err(|e| self.vk_error(e, "submit commands").into_error("flush"))?;

            self.ctx
                .device
                .wait_for_fences(&[self.submit_fence], true, u64::MAX)
                .map_err(|e| self.vk_error(e, "wait for submit fence").into_error("flush"))?;
            self.ctx
                .device
                .reset_fences(&[self.submit_fence])
                .map_err(|e| self.vk_error(e, "reset submit fence").into_error("flush"))?;

            self.ctx
                .device
                .free_command_buffers(self.ctx.command_pool, &command_buffers);
        }
        Ok(())
    }

    // ----- weak registrations for external managers -----

    /// Register a shader object compiled by the program manager
    pub fn register_program(&mut self, shader: vk::ShaderEXT) -> ProgramHandle {
        self.programs.insert(shader)
    }

    /// Register a sampled-image view owned by the texture manager
    pub fn register_texture_view(&mut self, view: vk::ImageView) -> TextureViewHandle {
        self.texture_views.insert(view)
    }

    /// Register a color attachment view owned by a render target
    pub fn register_render_target_view(
        &mut self,
        view: vk::ImageView,
        width: u32,
        height: u32,
    ) -> RenderTargetViewHandle {
        self.render_target_views.insert(BoundTargetView {
            view,
            width,
            height,
        })
    }

    /// Register an index buffer owned by the buffer manager
    pub fn register_index_buffer(&mut self, buffer: vk::Buffer) -> IndexBufferHandle {
        self.index_buffers.insert(buffer)
    }

    /// Bind or clear the stream-output counter used by auto draws
    pub fn set_stream_output(&mut self, binding: Option<StreamOutputBinding>) {
        self.stream_output = binding;
    }

    fn destroy_owned_objects(&mut self) {
        unsafe {
            // GPU work may still reference these
            let _ = self.ctx.device.device_wait_idle();

            for (_, sampler) in self.samplers.drain() {
                self.ctx.device.destroy_sampler(sampler, None);
            }
            let mut allocator = self.ctx.allocator.lock().unwrap();
            for (_, depth) in self.depth_buffers.drain() {
                self.ctx.device.destroy_image_view(depth.view, None);
                self.ctx.device.destroy_image(depth.image, None);
                if let Some(allocation) = depth.allocation {
                    let _ = allocator.free(allocation);
                }
            }
        }
        self.blend_states.clear();
        self.rasterizer_states.clear();
        self.depth_stencil_states.clear();
        self.programs.clear();
        self.texture_views.clear();
        self.render_target_views.clear();
        self.index_buffers.clear();
        self.stream_output = None;
        self.bound_color_targets.clear();
        self.bound_depth_target = None;
    }
}

impl NativeDevice for VulkanNativeDevice {
    fn create_blend_state(&mut self, desc: &BlendStateDesc) -> NativeResult<BlendStateHandle> {
        let mut enables = [vk::FALSE; MAX_RENDER_TARGET_VIEWS];
        let mut equations = [vk::ColorBlendEquationEXT::default(); MAX_RENDER_TARGET_VIEWS];
        let mut write_masks = [vk::ColorComponentFlags::RGBA; MAX_RENDER_TARGET_VIEWS];

        for (i, target) in desc.targets.iter().enumerate() {
            enables[i] = if target.blend_enable {
                vk::TRUE
            } else {
                vk::FALSE
            };
            equations[i] = vk::ColorBlendEquationEXT::default()
                .src_color_blend_factor(vulkan_mappings::blend_factor(target.src_blend))
                .dst_color_blend_factor(vulkan_mappings::blend_factor(target.dst_blend))
                .color_blend_op(vulkan_mappings::blend_op(target.blend_op))
                .src_alpha_blend_factor(vulkan_mappings::blend_factor(target.src_blend_alpha))
                .dst_alpha_blend_factor(vulkan_mappings::blend_factor(target.dst_blend_alpha))
                .alpha_blend_op(vulkan_mappings::blend_op(target.blend_op_alpha));

            let mut mask = vk::ColorComponentFlags::empty();
            if target.write_mask.contains(ColorWriteMask::RED) {
                mask |= vk::ColorComponentFlags::R;
            }
            if target.write_mask.contains(ColorWriteMask::GREEN) {
                mask |= vk::ColorComponentFlags::G;
            }
            if target.write_mask.contains(ColorWriteMask::BLUE) {
                mask |= vk::ColorComponentFlags::B;
            }
            if target.write_mask.contains(ColorWriteMask::ALPHA) {
                mask |= vk::ColorComponentFlags::A;
            }
            write_masks[i] = mask;
        }

        Ok(self.blend_states.insert(BakedBlendState {
            alpha_to_coverage: desc.alpha_to_coverage,
            enables,
            equations,
            write_masks,
        }))
    }

    fn create_rasterizer_state(
        &mut self,
        desc: &RasterizerStateDesc,
    ) -> NativeResult<RasterizerStateHandle> {
        Ok(self.rasterizer_states.insert(BakedRasterizerState {
            polygon_mode: vulkan_mappings::polygon_mode(desc.polygon_mode),
            cull_mode: vulkan_mappings::cull_mode(desc.cull_mode),
            front_face: if desc.front_counter_clockwise {
                vk::FrontFace::COUNTER_CLOCKWISE
            } else {
                vk::FrontFace::CLOCKWISE
            },
            depth_bias_constant: desc.depth_bias as f32,
            depth_bias_clamp: desc.depth_bias_clamp,
            depth_bias_slope: desc.slope_scaled_depth_bias,
        }))
    }

    fn create_depth_stencil_state(
        &mut self,
        desc: &DepthStencilStateDesc,
    ) -> NativeResult<DepthStencilStateHandle> {
        let face = |face: &nova_render_engine::nova::render::StencilFaceDesc| {
            vk::StencilOpState {
                fail_op: vulkan_mappings::stencil_op(face.fail_op),
                pass_op: vulkan_mappings::stencil_op(face.pass_op),
                depth_fail_op: vulkan_mappings::stencil_op(face.depth_fail_op),
                compare_op: vulkan_mappings::compare_op(face.compare),
                compare_mask: desc.stencil_read_mask as u32,
                write_mask: desc.stencil_write_mask as u32,
                reference: 0,
            }
        };
        Ok(self.depth_stencil_states.insert(BakedDepthStencilState {
            depth_test: desc.depth_check,
            depth_write: desc.depth_write,
            depth_compare: vulkan_mappings::compare_op(desc.depth_function),
            stencil_test: desc.stencil_check,
            front: face(&desc.front),
            back: face(&desc.back),
            read_mask: desc.stencil_read_mask as u32,
            write_mask: desc.stencil_write_mask as u32,
        }))
    }

    fn create_sampler_state(
        &mut self,
        desc: &SamplerStateDesc,
    ) -> NativeResult<SamplerStateHandle> {
        let anisotropic = desc.min_filter == FilterOptions::Anisotropic
            || desc.mag_filter == FilterOptions::Anisotropic;

        // Pick the border color preset closest to the requested value
        let border = if desc.border_color[0] >= 0.5 {
            vk::BorderColor::FLOAT_OPAQUE_WHITE
        } else if desc.border_color[3] >= 0.5 {
            vk::BorderColor::FLOAT_OPAQUE_BLACK
        } else {
            vk::BorderColor::FLOAT_TRANSPARENT_BLACK
        };

        let mut create_info = vk::SamplerCreateInfo::default()
            .mag_filter(vulkan_mappings::filter(desc.mag_filter))
            .min_filter(vulkan_mappings::filter(desc.min_filter))
            .mipmap_mode(vulkan_mappings::mipmap_mode(desc.mip_filter))
            .address_mode_u(vulkan_mappings::address_mode(desc.addressing.u))
            .address_mode_v(vulkan_mappings::address_mode(desc.addressing.v))
            .address_mode_w(vulkan_mappings::address_mode(desc.addressing.w))
            .mip_lod_bias(desc.mip_lod_bias)
            .min_lod(0.0)
            .max_lod(vk::LOD_CLAMP_NONE)
            .border_color(border)
            .unnormalized_coordinates(false);

        if desc.compare_enabled {
            create_info = create_info
                .compare_enable(true)
                .compare_op(vulkan_mappings::compare_op(desc.compare_function));
        } else {
            create_info = create_info
                .compare_enable(false)
                .compare_op(vk::CompareOp::ALWAYS);
        }

        if anisotropic && desc.max_anisotropy > 1 {
            create_info = create_info
                .anisotropy_enable(true)
                .max_anisotropy(desc.max_anisotropy as f32);
        } else {
            create_info = create_info.anisotropy_enable(false).max_anisotropy(1.0);
        }

        let sampler = unsafe {
            self.ctx
                .device
                .create_sampler(&create_info, None)
                .map_err(|e| self.vk_error(e, "vkCreateSampler"))?
        };
        Ok(self.samplers.insert(sampler))
    }

    fn bind_blend_state(&mut self, state: BlendStateHandle) -> NativeResult<()> {
        let cb = self.current()?;
        let baked = self
            .blend_states
            .get(state)
            .ok_or_else(|| self.stale_handle("blend state"))?;
        unsafe {
            self.eds3.cmd_set_color_blend_enable(cb, 0, &baked.enables);
            self.eds3
                .cmd_set_color_blend_equation(cb, 0, &baked.equations);
            self.eds3.cmd_set_color_write_mask(cb, 0, &baked.write_masks);
            self.eds3
                .cmd_set_alpha_to_coverage_enable(cb, baked.alpha_to_coverage);
        }
        Ok(())
    }

    fn bind_rasterizer_state(&mut self, state: RasterizerStateHandle) -> NativeResult<()> {
        let cb = self.current()?;
        let baked = self
            .rasterizer_states
            .get(state)
            .ok_or_else(|| self.stale_handle("rasterizer state"))?;
        unsafe {
            self.eds3.cmd_set_polygon_mode(cb, baked.polygon_mode);
            self.ctx.device.cmd_set_cull_mode(cb, baked.cull_mode);
            self.ctx.device.cmd_set_front_face(cb, baked.front_face);
            self.ctx.device.cmd_set_depth_bias(
                cb,
                baked.depth_bias_constant,
                baked.depth_bias_clamp,
                baked.depth_bias_slope,
            );
        }
        Ok(())
    }

    fn bind_depth_stencil_state(
        &mut self,
        state: DepthStencilStateHandle,
        stencil_ref: u32,
    ) -> NativeResult<()> {
        let cb = self.current()?;
        let baked = self
            .depth_stencil_states
            .get(state)
            .ok_or_else(|| self.stale_handle("depth stencil state"))?;
        unsafe {
            let device = &self.ctx.device;
            device.cmd_set_depth_test_enable(cb, baked.depth_test);
            device.cmd_set_depth_write_enable(cb, baked.depth_write);
            device.cmd_set_depth_compare_op(cb, baked.depth_compare);
            device.cmd_set_stencil_test_enable(cb, baked.stencil_test);
            device.cmd_set_stencil_op(
                cb,
                vk::StencilFaceFlags::FRONT,
                baked.front.fail_op,
                baked.front.pass_op,
                baked.front.depth_fail_op,
                baked.front.compare_op,
            );
            device.cmd_set_stencil_op(
                cb,
                vk::StencilFaceFlags::BACK,
                baked.back.fail_op,
                baked.back.pass_op,
                baked.back.depth_fail_op,
                baked.back.compare_op,
            );
            device.cmd_set_stencil_compare_mask(
                cb,
                vk::StencilFaceFlags::FRONT_AND_BACK,
                baked.read_mask,
            );
            device.cmd_set_stencil_write_mask(
                cb,
                vk::StencilFaceFlags::FRONT_AND_BACK,
                baked.write_mask,
            );
            device.cmd_set_stencil_reference(
                cb,
                vk::StencilFaceFlags::FRONT_AND_BACK,
                stencil_ref,
            );
        }
        Ok(())
    }

    fn bind_program(
        &mut self,
        stage: ShaderStage,
        program: Option<ProgramHandle>,
    ) -> NativeResult<()> {
        let cb = self.current()?;
        let shader = match program {
            Some(handle) => *self
                .programs
                .get(handle)
                .ok_or_else(|| self.stale_handle("shader program"))?,
            None => vk::ShaderEXT::null(),
        };
        let stages = [vulkan_mappings::shader_stage(stage)];
        let shaders = [shader];
        unsafe {
            self.shader_object.cmd_bind_shaders(cb, &stages, &shaders);
        }
        Ok(())
    }

    fn bind_stage_resources(
        &mut self,
        stage: ShaderStage,
        samplers: &[Option<SamplerStateHandle>],
        textures: &[Option<TextureViewHandle>],
    ) -> NativeResult<()> {
        let cb = self.current()?;
        let set = self.stage_descriptor_sets[stage.index()];

        let mut image_infos: Vec<[vk::DescriptorImageInfo; 1]> = Vec::new();
        let mut units: Vec<u32> = Vec::new();
        for (unit, (sampler, texture)) in samplers.iter().zip(textures.iter()).enumerate() {
            let (Some(sampler), Some(texture)) = (sampler, texture) else {
                continue;
            };
            let sampler = *self
                .samplers
                .get(*sampler)
                .ok_or_else(|| self.stale_handle("sampler state"))?;
            let view = *self
                .texture_views
                .get(*texture)
                .ok_or_else(|| self.stale_handle("texture view"))?;
            image_infos.push([vk::DescriptorImageInfo {
                sampler,
                image_view: view,
                image_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            }]);
            units.push(unit as u32);
        }

        if image_infos.is_empty() {
            return Ok(());
        }

        let writes: Vec<vk::WriteDescriptorSet> = image_infos
            .iter()
            .zip(units.iter())
            .map(|(info, unit)| {
                vk::WriteDescriptorSet::default()
                    .dst_set(set)
                    .dst_binding(*unit)
                    .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                    .image_info(info)
            })
            .collect();

        unsafe {
            self.ctx.device.update_descriptor_sets(&writes, &[]);

            let bind_point = if stage == ShaderStage::Compute {
                vk::PipelineBindPoint::COMPUTE
            } else {
                vk::PipelineBindPoint::GRAPHICS
            };
            self.ctx.device.cmd_bind_descriptor_sets(
                cb,
                bind_point,
                self.pipeline_layout,
                stage.index() as u32,
                &[set],
                &[],
            );
        }
        Ok(())
    }

    fn unbind_compute_resources(&mut self) -> NativeResult<()> {
        // Descriptor bindings are overwritten by the next dispatch; there is
        // nothing to null out between submissions
        Ok(())
    }

    fn bind_class_instance(
        &mut self,
        _stage: ShaderStage,
        _slot: u32,
        _instance: ClassInstanceHandle,
    ) -> NativeResult<()> {
        Err(NativeCallError::new(
            vk::Result::ERROR_FEATURE_NOT_PRESENT.as_raw(),
            "shader subroutines are not supported by the Vulkan device plugin",
        ))
    }

    fn set_render_targets(
        &mut self,
        views: &[RenderTargetViewHandle],
        depth: Option<DepthViewHandle>,
    ) -> NativeResult<()> {
        let cb = self.current()?;
        self.end_rendering_if_active(cb);

        let mut color_attachments = Vec::with_capacity(views.len());
        let mut extent = vk::Extent2D {
            width: 0,
            height: 0,
        };
        for handle in views {
            let target = self
                .render_target_views
                .get(*handle)
                .ok_or_else(|| self.stale_handle("render target view"))?;
            extent.width = extent.width.max(target.width);
            extent.height = extent.height.max(target.height);
            color_attachments.push(
                vk::RenderingAttachmentInfo::default()
                    .image_view(target.view)
                    .image_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
                    .load_op(vk::AttachmentLoadOp::LOAD)
                    .store_op(vk::AttachmentStoreOp::STORE),
            );
        }

        let depth_attachment = match depth {
            Some(handle) => {
                let buffer = self
                    .depth_buffers
                    .get(handle)
                    .ok_or_else(|| self.stale_handle("depth buffer view"))?;
                Some(
                    vk::RenderingAttachmentInfo::default()
                        .image_view(buffer.view)
                        .image_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL)
                        .load_op(vk::AttachmentLoadOp::LOAD)
                        .store_op(vk::AttachmentStoreOp::STORE),
                )
            }
            None => None,
        };

        let mut rendering_info = vk::RenderingInfo::default()
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent,
            })
            .layer_count(1)
            .color_attachments(&color_attachments);
        if let Some(depth_attachment) = &depth_attachment {
            rendering_info = rendering_info.depth_attachment(depth_attachment);
        }

        unsafe { self.ctx.device.cmd_begin_rendering(cb, &rendering_info) };
        self.rendering_active = true;
        self.bound_color_targets = views.to_vec();
        self.bound_depth_target = depth;
        Ok(())
    }

    fn set_viewport(&mut self, viewport: &Viewport) -> NativeResult<()> {
        let cb = self.current()?;
        let vk_viewport = vk::Viewport {
            x: viewport.left,
            y: viewport.top,
            width: viewport.width,
            height: viewport.height,
            min_depth: viewport.min_depth,
            max_depth: viewport.max_depth,
        };
        unsafe { self.ctx.device.cmd_set_viewport(cb, 0, &[vk_viewport]) };
        Ok(())
    }

    fn set_scissor_rect(&mut self, rect: &ScissorRect) -> NativeResult<()> {
        let cb = self.current()?;
        let scissor = vk::Rect2D {
            offset: vk::Offset2D {
                x: rect.left,
                y: rect.top,
            },
            extent: vk::Extent2D {
                width: (rect.right - rect.left).max(0) as u32,
                height: (rect.bottom - rect.top).max(0) as u32,
            },
        };
        unsafe { self.ctx.device.cmd_set_scissor(cb, 0, &[scissor]) };
        Ok(())
    }

    fn clear_render_target_view(
        &mut self,
        view: RenderTargetViewHandle,
        color: [f32; 4],
    ) -> NativeResult<()> {
        let cb = self.current()?;
        if !self.rendering_active {
            return Err(NativeCallError::new(
                vk::Result::ERROR_UNKNOWN.as_raw(),
                "clear requires a bound render target",
            ));
        }
        let index = self
            .bound_color_targets
            .iter()
            .position(|v| *v == view)
            .ok_or_else(|| {
                NativeCallError::new(
                    vk::Result::ERROR_UNKNOWN.as_raw(),
                    "cleared view is not bound as a render target",
                )
            })?;
        let target = self
            .render_target_views
            .get(view)
            .ok_or_else(|| self.stale_handle("render target view"))?;

        let attachment = vk::ClearAttachment {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            color_attachment: index as u32,
            clear_value: vk::ClearValue {
                color: vk::ClearColorValue { float32: color },
            },
        };
        let rect = vk::ClearRect {
            rect: vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: vk::Extent2D {
                    width: target.width,
                    height: target.height,
                },
            },
            base_array_layer: 0,
            layer_count: 1,
        };
        unsafe {
            self.ctx
                .device
                .cmd_clear_attachments(cb, &[attachment], &[rect])
        };
        Ok(())
    }

    fn clear_depth_stencil_view(
        &mut self,
        view: DepthViewHandle,
        clear_depth: bool,
        clear_stencil: bool,
        depth: f32,
        stencil: u8,
    ) -> NativeResult<()> {
        let cb = self.current()?;
        if !self.rendering_active || self.bound_depth_target != Some(view) {
            return Err(NativeCallError::new(
                vk::Result::ERROR_UNKNOWN.as_raw(),
                "cleared depth view is not bound",
            ));
        }

        let mut aspect = vk::ImageAspectFlags::empty();
        if clear_depth {
            aspect |= vk::ImageAspectFlags::DEPTH;
        }
        if clear_stencil {
            aspect |= vk::ImageAspectFlags::STENCIL;
        }
        if aspect.is_empty() {
            return Ok(());
        }

        // Reuse the color-target extent; the pool sizes depth buffers to
        // match the target
        let extent = self
            .bound_color_targets
            .first()
            .and_then(|v| self.render_target_views.get(*v))
            .map(|t| vk::Extent2D {
                width: t.width,
                height: t.height,
            })
            .unwrap_or(vk::Extent2D {
                width: u32::MAX,
                height: u32::MAX,
            });

        let attachment = vk::ClearAttachment {
            aspect_mask: aspect,
            color_attachment: 0,
            clear_value: vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue {
                    depth,
                    stencil: stencil as u32,
                },
            },
        };
        let rect = vk::ClearRect {
            rect: vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent,
            },
            base_array_layer: 0,
            layer_count: 1,
        };
        unsafe {
            self.ctx
                .device
                .cmd_clear_attachments(cb, &[attachment], &[rect])
        };
        Ok(())
    }

    fn create_depth_buffer(
        &mut self,
        width: u32,
        height: u32,
        samples: u32,
        _sample_quality: u32,
    ) -> NativeResult<DepthViewHandle> {
        let sample_flags = match samples {
            2 => vk::SampleCountFlags::TYPE_2,
            4 => vk::SampleCountFlags::TYPE_4,
            8 => vk::SampleCountFlags::TYPE_8,
            16 => vk::SampleCountFlags::TYPE_16,
            _ => vk::SampleCountFlags::TYPE_1,
        };

        unsafe {
            let image_create_info = vk::ImageCreateInfo::default()
                .image_type(vk::ImageType::TYPE_2D)
                .format(DEPTH_FORMAT)
                .extent(vk::Extent3D {
                    width,
                    height,
                    depth: 1,
                })
                .mip_levels(1)
                .array_layers(1)
                .samples(sample_flags)
                .tiling(vk::ImageTiling::OPTIMAL)
                .usage(vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT)
                .sharing_mode(vk::SharingMode::EXCLUSIVE)
                .initial_layout(vk::ImageLayout::UNDEFINED);

            let image = self
                .ctx
                .device
                .create_image(&image_create_info, None)
                .map_err(|e| self.vk_error(e, "vkCreateImage (depth buffer)"))?;

            let requirements = self.ctx.device.get_image_memory_requirements(image);
            let allocation = self
                .ctx
                .allocator
                .lock()
                .unwrap()
                .allocate(&AllocationCreateDesc {
                    name: "depth buffer",
                    requirements,
                    location: MemoryLocation::GpuOnly,
                    linear: false,
                    allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                })
                .map_err(|e| {
                    NativeCallError::new(
                        vk::Result::ERROR_OUT_OF_DEVICE_MEMORY.as_raw(),
                        format!("depth buffer allocation failed: {:?}", e),
                    )
                })?;

            self.ctx
                .device
                .bind_image_memory(image, allocation.memory(), allocation.offset())
                .map_err(|e| self.vk_error(e, "vkBindImageMemory (depth buffer)"))?;

            let view_create_info = vk::ImageViewCreateInfo::default()
                .image(image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(DEPTH_FORMAT)
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask: vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL,
                    base_mip_level: 0,
                    level_count: 1,
                    base_array_layer: 0,
                    layer_count: 1,
                });

            let view = self
                .ctx
                .device
                .create_image_view(&view_create_info, None)
                .map_err(|e| self.vk_error(e, "vkCreateImageView (depth buffer)"))?;

            Ok(self.depth_buffers.insert(DepthBufferObject {
                image,
                view,
                allocation: Some(allocation),
            }))
        }
    }

    fn set_primitive_topology(&mut self, primitive: PrimitiveKind) -> NativeResult<()> {
        let cb = self.current()?;
        unsafe {
            self.ctx
                .device
                .cmd_set_primitive_topology(cb, vulkan_mappings::primitive_topology(primitive));
            if let Some(control_points) = primitive.control_points() {
                self.eds2.cmd_set_patch_control_points(cb, control_points);
            }
        }
        Ok(())
    }

    fn bind_index_buffer(
        &mut self,
        buffer: IndexBufferHandle,
        format: IndexType,
        offset: u32,
    ) -> NativeResult<()> {
        let cb = self.current()?;
        let vk_buffer = *self
            .index_buffers
            .get(buffer)
            .ok_or_else(|| self.stale_handle("index buffer"))?;
        let index_type = match format {
            IndexType::U16 => vk::IndexType::UINT16,
            IndexType::U32 => vk::IndexType::UINT32,
        };
        unsafe {
            self.ctx
                .device
                .cmd_bind_index_buffer(cb, vk_buffer, offset as u64, index_type)
        };
        Ok(())
    }

    fn draw(&mut self, vertex_count: u32, vertex_start: u32) -> NativeResult<()> {
        let cb = self.current()?;
        unsafe { self.ctx.device.cmd_draw(cb, vertex_count, 1, vertex_start, 0) };
        Ok(())
    }

    fn draw_indexed(
        &mut self,
        index_count: u32,
        index_start: u32,
        base_vertex: i32,
    ) -> NativeResult<()> {
        let cb = self.current()?;
        unsafe {
            self.ctx
                .device
                .cmd_draw_indexed(cb, index_count, 1, index_start, base_vertex, 0)
        };
        Ok(())
    }

    fn draw_instanced(
        &mut self,
        vertex_count: u32,
        instance_count: u32,
        vertex_start: u32,
    ) -> NativeResult<()> {
        let cb = self.current()?;
        unsafe {
            self.ctx
                .device
                .cmd_draw(cb, vertex_count, instance_count, vertex_start, 0)
        };
        Ok(())
    }

    fn draw_indexed_instanced(
        &mut self,
        index_count: u32,
        instance_count: u32,
        index_start: u32,
        base_vertex: i32,
    ) -> NativeResult<()> {
        let cb = self.current()?;
        unsafe {
            self.ctx.device.cmd_draw_indexed(
                cb,
                index_count,
                instance_count,
                index_start,
                base_vertex,
                0,
            )
        };
        Ok(())
    }

    fn draw_auto(&mut self) -> NativeResult<()> {
        let cb = self.current()?;
        let Some(transform_feedback) = &self.transform_feedback else {
            return Err(NativeCallError::new(
                vk::Result::ERROR_FEATURE_NOT_PRESENT.as_raw(),
                "auto draw requires the transform feedback extension",
            ));
        };
        let Some(stream) = &self.stream_output else {
            return Err(NativeCallError::new(
                vk::Result::ERROR_UNKNOWN.as_raw(),
                "auto draw issued without a stream-output binding",
            ));
        };
        unsafe {
            (transform_feedback.fp().cmd_draw_indirect_byte_count_ext)(
                cb,
                1,
                0,
                stream.counter_buffer,
                stream.counter_offset,
                0,
                stream.vertex_stride,
            );
        }
        Ok(())
    }

    fn dispatch(&mut self, x: u32, y: u32, z: u32) -> NativeResult<()> {
        let cb = self.current()?;
        // Dispatches are illegal inside dynamic rendering
        self.end_rendering_if_active(cb);
        unsafe { self.ctx.device.cmd_dispatch(cb, x, y, z) };
        Ok(())
    }

    fn stream_output_bound(&self) -> bool {
        self.stream_output.is_some()
    }

    fn multisample_quality_levels(&self, sample_count: u32) -> u32 {
        let flags = match sample_count {
            1 => vk::SampleCountFlags::TYPE_1,
            2 => vk::SampleCountFlags::TYPE_2,
            4 => vk::SampleCountFlags::TYPE_4,
            8 => vk::SampleCountFlags::TYPE_8,
            16 => vk::SampleCountFlags::TYPE_16,
            _ => return 0,
        };
        // Vulkan has no quality-level concept; report one level per
        // supported count
        if self
            .properties
            .limits
            .framebuffer_color_sample_counts
            .contains(flags)
        {
            1
        } else {
            0
        }
    }

    fn is_lost(&self) -> bool {
        self.lost.get()
    }

    fn driver_version(&self) -> DriverVersion {
        self.driver_version
    }

    fn raw_handle(&self) -> usize {
        self.ctx.device.handle().as_raw() as usize
    }

    fn class_instance(&mut self, _name: &str) -> Option<ClassInstanceHandle> {
        None
    }

    fn create_class_instance(&mut self, name: &str) -> NativeResult<ClassInstanceHandle> {
        Err(NativeCallError::new(
            vk::Result::ERROR_FEATURE_NOT_PRESENT.as_raw(),
            format!(
                "shader subroutine '{}' cannot be created: dynamic linkage is not supported",
                name
            ),
        ))
    }

    fn release_all(&mut self) {
        if let Some(cb) = self.command_buffer.take() {
            unsafe {
                self.end_rendering_if_active(cb);
                let _ = self.ctx.device.end_command_buffer(cb);
                self.ctx
                    .device
                    .free_command_buffers(self.ctx.command_pool, &[cb]);
            }
        }
        self.destroy_owned_objects();
    }
}

impl Drop for VulkanNativeDevice {
    fn drop(&mut self) {
        self.release_all();
        unsafe {
            let device = self.ctx.device.clone();
            device.destroy_fence(self.submit_fence, None);
            device.destroy_descriptor_pool(self.descriptor_pool, None);
            device.destroy_pipeline_layout(self.pipeline_layout, None);
            device.destroy_descriptor_set_layout(self.descriptor_set_layout, None);
            device.destroy_command_pool(self.ctx.command_pool, None);

            // The allocator must drop before the device is destroyed
            if let Some(ctx) = Arc::get_mut(&mut self.ctx) {
                ManuallyDrop::drop(&mut ctx.allocator);
            }
            device.destroy_device(None);

            if let (Some(loader), Some(messenger)) = (
                self.ctx.debug_utils_loader.as_ref(),
                self.ctx.debug_messenger,
            ) {
                loader.destroy_debug_utils_messenger(messenger, None);
            }
            self.ctx.instance.destroy_instance(None);
        }
    }
}
