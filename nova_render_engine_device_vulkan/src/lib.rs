/*!
# Nova Render Engine - Vulkan Device Plugin

Implements the engine's native-device contracts (`DeviceProvider` /
`NativeDevice`) over Vulkan 1.3.

The engine core speaks in immutable state objects bound one at a time, the
way a Direct3D-generation device works. This backend expresses that model
with:

- `VK_EXT_shader_object` for per-stage program binding without pipeline
  objects;
- Vulkan 1.3 core dynamic state plus `VK_EXT_extended_dynamic_state3` for
  rasterizer/depth-stencil/blend state applied from retained, translated
  descriptors;
- real `VkSampler` objects for the sampler state category;
- dynamic rendering (`vkCmdBeginRendering`) for render-target binding;
- `VK_EXT_transform_feedback` (optional) for stream output and the
  driver-counted auto draw.

Window/swapchain management stays outside this crate; collaborators reach
the raw handles they need through the engine's custom-attribute surface and
the registration methods on [`VulkanNativeDevice`].
*/

mod debug;
mod vulkan_context;
mod vulkan_device;
mod vulkan_mappings;

pub use vulkan_context::GpuContext;
pub use vulkan_device::{StreamOutputBinding, VulkanDeviceProvider, VulkanNativeDevice};
