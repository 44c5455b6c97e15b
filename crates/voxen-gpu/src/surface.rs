//! Surface management for windowed rendering.
//!
//! Hides the raw-window-handle plumbing from the renderer.

use crate::error::{GpuError, Result};
use crate::swapchain::{select_present_mode, select_surface_format};
use ash::vk;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

/// Create a Vulkan surface bound to a window.
///
/// # Safety
/// The instance must be valid and outlive the returned surface. The window
/// must outlive the surface as well.
pub unsafe fn create_surface<W>(
    entry: &ash::Entry,
    instance: &ash::Instance,
    window: &W,
) -> Result<vk::SurfaceKHR>
where
    W: HasDisplayHandle + HasWindowHandle + ?Sized,
{
    let display = window
        .display_handle()
        .map_err(|e| GpuError::SurfaceCreation(format!("Failed to get display handle: {e}")))?;
    let window_handle = window
        .window_handle()
        .map_err(|e| GpuError::SurfaceCreation(format!("Failed to get window handle: {e}")))?;

    ash_window::create_surface(
        entry,
        instance,
        display.as_raw(),
        window_handle.as_raw(),
        None,
    )
    .map_err(|e| GpuError::SurfaceCreation(e.to_string()))
}

/// Surface capabilities query result.
pub struct SurfaceCapabilities {
    /// Raw surface capabilities.
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    /// Supported surface formats.
    pub formats: Vec<vk::SurfaceFormatKHR>,
    /// Supported present modes.
    pub present_modes: Vec<vk::PresentModeKHR>,
}

impl SurfaceCapabilities {
    /// Query surface capabilities for a physical device.
    ///
    /// # Safety
    /// The physical device and surface must be valid.
    pub unsafe fn query(
        surface_loader: &ash::khr::surface::Instance,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> Result<Self> {
        let capabilities =
            surface_loader.get_physical_device_surface_capabilities(physical_device, surface)?;
        let formats = surface_loader.get_physical_device_surface_formats(physical_device, surface)?;
        let present_modes =
            surface_loader.get_physical_device_surface_present_modes(physical_device, surface)?;

        Ok(Self {
            capabilities,
            formats,
            present_modes,
        })
    }

    /// Get the recommended surface format.
    pub fn recommended_format(&self) -> Option<vk::SurfaceFormatKHR> {
        select_surface_format(&self.formats)
    }

    /// Get the recommended present mode.
    pub fn recommended_present_mode(&self, vsync: bool) -> vk::PresentModeKHR {
        select_present_mode(&self.present_modes, vsync)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(
        formats: Vec<vk::Format>,
        present_modes: Vec<vk::PresentModeKHR>,
    ) -> SurfaceCapabilities {
        SurfaceCapabilities {
            capabilities: vk::SurfaceCapabilitiesKHR::default(),
            formats: formats
                .into_iter()
                .map(|format| vk::SurfaceFormatKHR {
                    format,
                    color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
                })
                .collect(),
            present_modes,
        }
    }

    #[test]
    fn recommends_srgb_and_vsync_mode() {
        let surface = caps(
            vec![vk::Format::B8G8R8A8_UNORM, vk::Format::B8G8R8A8_SRGB],
            vec![vk::PresentModeKHR::IMMEDIATE, vk::PresentModeKHR::FIFO],
        );
        assert_eq!(
            surface.recommended_format().map(|f| f.format),
            Some(vk::Format::B8G8R8A8_SRGB)
        );
        assert_eq!(surface.recommended_present_mode(true), vk::PresentModeKHR::FIFO);
        assert_eq!(surface.recommended_present_mode(false), vk::PresentModeKHR::IMMEDIATE);
    }

    #[test]
    fn no_formats_means_no_recommendation() {
        let surface = caps(Vec::new(), vec![vk::PresentModeKHR::FIFO]);
        assert!(surface.recommended_format().is_none());
    }
}
