//! Debug messenger routing validation output into `tracing`.

use crate::error::Result;
use ash::vk;
use std::ffi::{c_void, CStr};

/// Create a debug messenger that forwards validation messages to `tracing`.
///
/// # Safety
/// The instance must be valid and created with `VK_EXT_debug_utils` enabled.
pub unsafe fn create_debug_messenger(
    debug_utils: &ash::ext::debug_utils::Instance,
) -> Result<vk::DebugUtilsMessengerEXT> {
    let create_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
        .message_severity(
            vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                | vk::DebugUtilsMessageSeverityFlagsEXT::INFO,
        )
        .message_type(
            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        )
        .pfn_user_callback(Some(debug_callback));

    let messenger = debug_utils.create_debug_utils_messenger(&create_info, None)?;
    Ok(messenger)
}

unsafe extern "system" fn debug_callback(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    _types: vk::DebugUtilsMessageTypeFlagsEXT,
    data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user_data: *mut c_void,
) -> vk::Bool32 {
    if data.is_null() || (*data).p_message.is_null() {
        return vk::FALSE;
    }
    let message = CStr::from_ptr((*data).p_message).to_string_lossy();

    if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        tracing::error!(target: "vulkan", "{message}");
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        tracing::warn!(target: "vulkan", "{message}");
    } else {
        tracing::debug!(target: "vulkan", "{message}");
    }

    vk::FALSE
}
