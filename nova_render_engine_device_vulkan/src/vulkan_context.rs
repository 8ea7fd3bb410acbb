/// GpuContext - shared Vulkan resources for the device plugin
///
/// Owns the instance, logical device, allocator, queue and command pool.
/// Destruction order matters: the allocator must drop before the device,
/// the device before the instance; `VulkanNativeDevice::drop` drives this
/// explicitly.
use ash::vk;
use gpu_allocator::vulkan::Allocator;
use std::mem::ManuallyDrop;
use std::sync::{Arc, Mutex};

/// Shared GPU context for all Vulkan objects created by the device plugin
pub struct GpuContext {
    /// Vulkan logical device
    pub device: ash::Device,

    /// GPU memory allocator (wrapped in ManuallyDrop so it is dropped
    /// before the device is destroyed)
    pub allocator: ManuallyDrop<Arc<Mutex<Allocator>>>,

    /// Graphics+compute queue for command submission
    pub queue: vk::Queue,

    /// Queue family index of `queue`
    pub queue_family: u32,

    /// Command pool the immediate command buffers are allocated from
    pub command_pool: vk::CommandPool,

    /// Vulkan instance (destroyed by VulkanNativeDevice::drop)
    pub instance: ash::Instance,

    /// Debug utils loader (validation builds)
    pub(crate) debug_utils_loader: Option<ash::ext::debug_utils::Instance>,

    /// Debug messenger handle
    pub(crate) debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
}

impl GpuContext {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        device: ash::Device,
        allocator: Arc<Mutex<Allocator>>,
        queue: vk::Queue,
        queue_family: u32,
        command_pool: vk::CommandPool,
        instance: ash::Instance,
        debug_utils_loader: Option<ash::ext::debug_utils::Instance>,
        debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
    ) -> Self {
        Self {
            device,
            allocator: ManuallyDrop::new(allocator),
            queue,
            queue_family,
            command_pool,
            instance,
            debug_utils_loader,
            debug_messenger,
        }
    }
}
