//! GPU capability detection.

use crate::instance::meets_min_version;
use ash::vk;
use std::collections::HashSet;
use std::ffi::CStr;

/// GPU vendor identification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GpuVendor {
    Nvidia,
    Amd,
    Intel,
    Apple,
    Other(u32),
}

impl GpuVendor {
    /// Identify vendor from PCI vendor ID.
    pub const fn from_vendor_id(id: u32) -> Self {
        match id {
            0x10DE => Self::Nvidia,
            0x1002 => Self::Amd,
            0x8086 => Self::Intel,
            0x106B => Self::Apple,
            other => Self::Other(other),
        }
    }
}

/// Detected GPU capabilities.
#[derive(Debug, Clone)]
pub struct GpuCapabilities {
    /// GPU vendor
    pub vendor: GpuVendor,
    /// Device name
    pub device_name: String,
    /// Device type (discrete, integrated, ...)
    pub device_type: vk::PhysicalDeviceType,
    /// Vulkan API version
    pub api_version: u32,
    /// Driver version
    pub driver_version: u32,
    /// Device-local memory in MB
    pub device_local_memory_mb: u64,
    /// Names of the supported device extensions
    pub available_extensions: HashSet<String>,
}

impl GpuCapabilities {
    /// Query capabilities from a physical device.
    ///
    /// # Safety
    /// The instance and physical device must be valid.
    pub unsafe fn query(instance: &ash::Instance, physical_device: vk::PhysicalDevice) -> Self {
        let properties = instance.get_physical_device_properties(physical_device);
        let memory_properties = instance.get_physical_device_memory_properties(physical_device);

        let extensions = instance
            .enumerate_device_extension_properties(physical_device)
            .unwrap_or_default();

        let available_extensions: HashSet<String> = extensions
            .iter()
            .filter_map(|ext| {
                CStr::from_ptr(ext.extension_name.as_ptr())
                    .to_str()
                    .ok()
                    .map(String::from)
            })
            .collect();

        let device_name = CStr::from_ptr(properties.device_name.as_ptr())
            .to_string_lossy()
            .into_owned();

        let device_local_memory_mb: u64 = memory_properties
            .memory_heaps
            .iter()
            .take(memory_properties.memory_heap_count as usize)
            .filter(|heap| heap.flags.contains(vk::MemoryHeapFlags::DEVICE_LOCAL))
            .map(|heap| heap.size / (1024 * 1024))
            .sum();

        Self {
            vendor: GpuVendor::from_vendor_id(properties.vendor_id),
            device_name,
            device_type: properties.device_type,
            api_version: properties.api_version,
            driver_version: properties.driver_version,
            device_local_memory_mb,
            available_extensions,
        }
    }

    /// Whether the device can present through a swapchain.
    pub fn supports_swapchain(&self) -> bool {
        ash::khr::swapchain::NAME
            .to_str()
            .is_ok_and(|name| self.available_extensions.contains(name))
    }

    /// Check if the GPU meets minimum requirements for the engine.
    pub fn meets_requirements(&self) -> bool {
        meets_min_version(self.api_version) && self.supports_swapchain()
    }

    /// Get a human-readable summary of capabilities.
    pub fn summary(&self) -> String {
        format!(
            "{} ({:?}) - Vulkan {}.{}.{} - driver {:#x} - {} MB VRAM",
            self.device_name,
            self.vendor,
            vk::api_version_major(self.api_version),
            vk::api_version_minor(self.api_version),
            vk::api_version_patch(self.api_version),
            self.driver_version,
            self.device_local_memory_mb,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(api_version: u32, extensions: &[&str]) -> GpuCapabilities {
        GpuCapabilities {
            vendor: GpuVendor::Other(0),
            device_name: "Test GPU".to_string(),
            device_type: vk::PhysicalDeviceType::DISCRETE_GPU,
            api_version,
            driver_version: 0x1f2,
            device_local_memory_mb: 4096,
            available_extensions: extensions.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    #[test]
    fn vendor_identification() {
        assert_eq!(GpuVendor::from_vendor_id(0x10DE), GpuVendor::Nvidia);
        assert_eq!(GpuVendor::from_vendor_id(0x1002), GpuVendor::Amd);
        assert_eq!(GpuVendor::from_vendor_id(0x8086), GpuVendor::Intel);
        assert_eq!(GpuVendor::from_vendor_id(0x1234), GpuVendor::Other(0x1234));
    }

    #[test]
    fn requirements_need_swapchain_and_version() {
        assert!(caps(vk::API_VERSION_1_1, &["VK_KHR_swapchain"]).meets_requirements());
        assert!(!caps(vk::API_VERSION_1_1, &[]).meets_requirements());
        assert!(!caps(vk::API_VERSION_1_0, &["VK_KHR_swapchain"]).meets_requirements());
    }

    #[test]
    fn summary_contains_name_and_version() {
        let summary = caps(vk::API_VERSION_1_2, &[]).summary();
        assert!(summary.starts_with("Test GPU"));
        assert!(summary.contains("Vulkan 1.2.0"));
        assert!(summary.contains("driver 0x1f2"));
        assert!(summary.contains("4096 MB VRAM"));
    }
}
