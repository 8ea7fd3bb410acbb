/// Vulkan debug messenger - validation layer messages with colored output
use ash::vk;
use colored::*;
use std::ffi::CStr;

/// Debug messenger callback for the validation layers
///
/// # Safety
///
/// Called by the Vulkan loader with valid callback data; must not call
/// back into Vulkan.
pub(crate) unsafe extern "system" fn vulkan_debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    _user_data: *mut std::os::raw::c_void,
) -> vk::Bool32 {
    if p_callback_data.is_null() {
        return vk::FALSE;
    }

    let callback_data = *p_callback_data;
    let message = if callback_data.p_message.is_null() {
        String::from("<empty validation message>")
    } else {
        CStr::from_ptr(callback_data.p_message)
            .to_string_lossy()
            .into_owned()
    };

    let type_str = match message_type {
        vk::DebugUtilsMessageTypeFlagsEXT::GENERAL => "general",
        vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION => "validation",
        vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE => "performance",
        _ => "unknown",
    };

    match message_severity {
        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR => {
            eprintln!(
                "{} [{}] {}",
                "[vulkan error]".red().bold(),
                type_str,
                message
            );
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::WARNING => {
            eprintln!("{} [{}] {}", "[vulkan warn]".yellow(), type_str, message);
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::INFO => {
            eprintln!("{} [{}] {}", "[vulkan info]".cyan(), type_str, message);
        }
        _ => {
            eprintln!(
                "{} [{}] {}",
                "[vulkan verbose]".bright_black(),
                type_str,
                message
            );
        }
    }

    // Returning FALSE tells the loader not to abort the triggering call
    vk::FALSE
}
