//! Vulkan instance creation.

use crate::error::{GpuError, Result};
use crate::MIN_API_VERSION;
use ash::vk;
use raw_window_handle::RawDisplayHandle;
use std::ffi::{c_char, CStr, CString};
use voxen_core::constants::ENGINE_NAME;

/// Validation layer requested when validation is enabled.
pub const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

/// A created instance together with what was actually enabled on it.
pub struct CreatedInstance {
    pub instance: ash::Instance,
    /// Whether `VK_EXT_debug_utils` was enabled, so a messenger can be created.
    pub debug_utils_enabled: bool,
}

/// Instance extensions needed to present to a window on this display.
pub fn required_instance_extensions(display: RawDisplayHandle) -> Result<Vec<*const c_char>> {
    let extensions = ash_window::enumerate_required_extensions(display)
        .map_err(|e| GpuError::SurfaceCreation(format!("No surface extensions: {e}")))?;
    Ok(extensions.to_vec())
}

/// Whether `api_version` is at least [`MIN_API_VERSION`].
pub fn meets_min_version(api_version: u32) -> bool {
    let (min_major, min_minor) = MIN_API_VERSION;
    let major = vk::api_version_major(api_version);
    let minor = vk::api_version_minor(api_version);
    major > min_major || (major == min_major && minor >= min_minor)
}

/// Create a Vulkan instance.
///
/// Validation is best effort: a missing layer or a missing
/// `VK_EXT_debug_utils` is logged and skipped rather than failing bring-up.
///
/// # Safety
/// The entry must be a valid Vulkan entry point.
pub unsafe fn create_instance(
    entry: &ash::Entry,
    app_name: &str,
    display: RawDisplayHandle,
    enable_validation: bool,
) -> Result<CreatedInstance> {
    let app_name = CString::new(app_name)
        .map_err(|e| GpuError::Other(format!("Invalid application name: {e}")))?;
    let engine_name = CString::new(ENGINE_NAME)
        .map_err(|e| GpuError::Other(format!("Invalid engine name: {e}")))?;

    let (min_major, min_minor) = MIN_API_VERSION;
    let app_info = vk::ApplicationInfo::default()
        .application_name(&app_name)
        .application_version(vk::make_api_version(0, 0, 1, 0))
        .engine_name(&engine_name)
        .engine_version(vk::make_api_version(0, 0, 1, 0))
        .api_version(vk::make_api_version(0, min_major, min_minor, 0));

    let mut extension_names = required_instance_extensions(display)?;

    let mut layer_names: Vec<*const c_char> = Vec::new();
    let mut debug_utils_enabled = false;

    if enable_validation {
        let available_layers = entry.enumerate_instance_layer_properties()?;
        let has_layer = available_layers
            .iter()
            .any(|props| CStr::from_ptr(props.layer_name.as_ptr()) == VALIDATION_LAYER);
        if has_layer {
            layer_names.push(VALIDATION_LAYER.as_ptr());
        } else {
            tracing::warn!(
                "Validation layer {} not available",
                VALIDATION_LAYER.to_string_lossy()
            );
        }

        let available_extensions = entry.enumerate_instance_extension_properties(None)?;
        debug_utils_enabled = available_extensions
            .iter()
            .any(|props| CStr::from_ptr(props.extension_name.as_ptr()) == ash::ext::debug_utils::NAME);
        if debug_utils_enabled {
            extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
        } else {
            tracing::warn!("VK_EXT_debug_utils not available, validation output disabled");
        }
    }

    // Required for MoltenVK on macOS
    #[cfg(target_os = "macos")]
    let create_flags = {
        extension_names.push(ash::khr::portability_enumeration::NAME.as_ptr());
        vk::InstanceCreateFlags::ENUMERATE_PORTABILITY_KHR
    };
    #[cfg(not(target_os = "macos"))]
    let create_flags = vk::InstanceCreateFlags::empty();

    let create_info = vk::InstanceCreateInfo::default()
        .application_info(&app_info)
        .enabled_extension_names(&extension_names)
        .enabled_layer_names(&layer_names)
        .flags(create_flags);

    let instance = entry.create_instance(&create_info, None)?;

    Ok(CreatedInstance {
        instance,
        debug_utils_enabled,
    })
}
