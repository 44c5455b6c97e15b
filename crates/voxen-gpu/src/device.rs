//! Physical device selection and logical device creation.

use crate::capabilities::GpuCapabilities;
use crate::error::{GpuError, Result};
use ash::vk;

/// A physical device that can render to and present on the window surface.
pub struct SelectedDevice {
    pub physical_device: vk::PhysicalDevice,
    /// Queue family supporting both graphics and presentation.
    pub graphics_queue_family: u32,
    pub capabilities: GpuCapabilities,
}

/// Logical device and its graphics queue.
///
/// Not destroyed on drop; the owner releases the device explicitly.
pub struct DeviceContext {
    pub device: ash::Device,
    pub graphics_queue: vk::Queue,
    pub graphics_queue_family: u32,
}

/// Select the best physical device for presenting to `surface`.
///
/// # Safety
/// The instance and surface must be valid.
pub unsafe fn select_physical_device(
    instance: &ash::Instance,
    surface_loader: &ash::khr::surface::Instance,
    surface: vk::SurfaceKHR,
) -> Result<SelectedDevice> {
    let devices = instance.enumerate_physical_devices()?;

    if devices.is_empty() {
        return Err(GpuError::NoSuitableDevice);
    }

    let mut best: Option<(i32, SelectedDevice)> = None;

    for device in devices {
        let capabilities = GpuCapabilities::query(instance, device);
        if !capabilities.meets_requirements() {
            tracing::debug!("Rejected GPU: {}", capabilities.summary());
            continue;
        }

        let Some(graphics_queue_family) =
            find_graphics_present_family(instance, surface_loader, surface, device)?
        else {
            tracing::debug!("Rejected GPU (cannot present): {}", capabilities.device_name);
            continue;
        };

        let score = device_type_score(capabilities.device_type)
            + i32::try_from(capabilities.device_local_memory_mb / 1024).unwrap_or(i32::MAX / 2);

        if best.as_ref().map_or(true, |(best_score, _)| score > *best_score) {
            best = Some((
                score,
                SelectedDevice {
                    physical_device: device,
                    graphics_queue_family,
                    capabilities,
                },
            ));
        }
    }

    best.map(|(_, selected)| selected)
        .ok_or(GpuError::NoSuitableDevice)
}

/// Preference of a device type; discrete GPUs win.
pub const fn device_type_score(device_type: vk::PhysicalDeviceType) -> i32 {
    match device_type {
        vk::PhysicalDeviceType::DISCRETE_GPU => 1000,
        vk::PhysicalDeviceType::INTEGRATED_GPU => 100,
        vk::PhysicalDeviceType::VIRTUAL_GPU => 50,
        _ => 0,
    }
}

/// Find a queue family with graphics support that can present to `surface`.
///
/// # Safety
/// The instance, surface and physical device must be valid.
unsafe fn find_graphics_present_family(
    instance: &ash::Instance,
    surface_loader: &ash::khr::surface::Instance,
    surface: vk::SurfaceKHR,
    physical_device: vk::PhysicalDevice,
) -> Result<Option<u32>> {
    let queue_families = instance.get_physical_device_queue_family_properties(physical_device);

    for (index, family) in queue_families.iter().enumerate() {
        let index = u32::try_from(index)
            .map_err(|_| GpuError::Other("Queue family index out of range".to_string()))?;

        if !family.queue_flags.contains(vk::QueueFlags::GRAPHICS) {
            continue;
        }

        if surface_loader.get_physical_device_surface_support(physical_device, index, surface)? {
            return Ok(Some(index));
        }
    }

    Ok(None)
}

/// Create the logical device with the swapchain extension and fetch the
/// graphics queue.
///
/// # Safety
/// The instance and physical device must be valid.
pub unsafe fn create_device(
    instance: &ash::Instance,
    selected: &SelectedDevice,
) -> Result<DeviceContext> {
    let queue_priority = 1.0_f32;
    let queue_create_infos = [vk::DeviceQueueCreateInfo::default()
        .queue_family_index(selected.graphics_queue_family)
        .queue_priorities(std::slice::from_ref(&queue_priority))];

    let extension_names = [ash::khr::swapchain::NAME.as_ptr()];

    let device_create_info = vk::DeviceCreateInfo::default()
        .queue_create_infos(&queue_create_infos)
        .enabled_extension_names(&extension_names);

    let device = instance.create_device(selected.physical_device, &device_create_info, None)?;
    let graphics_queue = device.get_device_queue(selected.graphics_queue_family, 0);

    Ok(DeviceContext {
        device,
        graphics_queue,
        graphics_queue_family: selected.graphics_queue_family,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discrete_gpus_are_preferred() {
        assert!(
            device_type_score(vk::PhysicalDeviceType::DISCRETE_GPU)
                > device_type_score(vk::PhysicalDeviceType::INTEGRATED_GPU)
        );
        assert!(
            device_type_score(vk::PhysicalDeviceType::INTEGRATED_GPU)
                > device_type_score(vk::PhysicalDeviceType::VIRTUAL_GPU)
        );
        assert_eq!(device_type_score(vk::PhysicalDeviceType::CPU), 0);
    }
}
