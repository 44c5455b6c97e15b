//! Swapchain management.

use crate::error::{GpuError, Result};
use crate::surface::SurfaceCapabilities;
use ash::vk;

/// Swapchain handle and the images it owns.
///
/// Image views are created separately so the owner can track each one.
pub struct Swapchain {
    pub swapchain: vk::SwapchainKHR,
    pub images: Vec<vk::Image>,
    pub format: vk::Format,
    pub extent: vk::Extent2D,
}

impl Swapchain {
    /// Create a new swapchain for `surface`.
    ///
    /// The present mode follows `vsync`; the extent follows the desired size
    /// unless the surface dictates its own.
    ///
    /// # Safety
    /// All handles must be valid.
    pub unsafe fn new(
        swapchain_loader: &ash::khr::swapchain::Device,
        surface: vk::SurfaceKHR,
        surface_caps: &SurfaceCapabilities,
        desired_extent: vk::Extent2D,
        vsync: bool,
    ) -> Result<Self> {
        let surface_format = surface_caps.recommended_format().ok_or_else(|| {
            GpuError::SwapchainCreation("Surface reports no formats".to_string())
        })?;
        let present_mode = surface_caps.recommended_present_mode(vsync);
        let extent = calculate_extent(
            &surface_caps.capabilities,
            desired_extent.width,
            desired_extent.height,
        );
        let image_count = choose_image_count(&surface_caps.capabilities);

        tracing::debug!(
            "Swapchain: {:?} {:?} {:?} {}x{} ({} images requested)",
            surface_format.format,
            surface_format.color_space,
            present_mode,
            extent.width,
            extent.height,
            image_count
        );

        let create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(surface)
            .min_image_count(image_count)
            .image_format(surface_format.format)
            .image_color_space(surface_format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .pre_transform(surface_caps.capabilities.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode)
            .clipped(true);

        let swapchain = swapchain_loader
            .create_swapchain(&create_info, None)
            .map_err(|e| GpuError::SwapchainCreation(e.to_string()))?;

        let images = match swapchain_loader.get_swapchain_images(swapchain) {
            Ok(images) => images,
            Err(e) => {
                swapchain_loader.destroy_swapchain(swapchain, None);
                return Err(GpuError::from(e));
            }
        };

        Ok(Self {
            swapchain,
            images,
            format: surface_format.format,
            extent,
        })
    }

    /// Acquire the next image, signalling `semaphore` once it is ready.
    ///
    /// # Safety
    /// All handles must be valid.
    pub unsafe fn acquire_next_image(
        &self,
        swapchain_loader: &ash::khr::swapchain::Device,
        semaphore: vk::Semaphore,
        timeout_ns: u64,
    ) -> Result<u32> {
        match swapchain_loader.acquire_next_image(
            self.swapchain,
            timeout_ns,
            semaphore,
            vk::Fence::null(),
        ) {
            Ok((index, suboptimal)) => {
                if suboptimal {
                    tracing::trace!("Acquired suboptimal swapchain image {index}");
                }
                Ok(index)
            }
            Err(e) => Err(GpuError::from_wait(e, "swapchain image")),
        }
    }

    /// Present an image. Returns `true` when the swapchain no longer matches
    /// the surface exactly.
    ///
    /// # Safety
    /// All handles must be valid.
    pub unsafe fn present(
        &self,
        swapchain_loader: &ash::khr::swapchain::Device,
        queue: vk::Queue,
        image_index: u32,
        wait_semaphores: &[vk::Semaphore],
    ) -> Result<bool> {
        let swapchains = [self.swapchain];
        let image_indices = [image_index];

        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        present_result(swapchain_loader.queue_present(queue, &present_info))
    }
}

/// Map the result of `vkQueuePresentKHR`.
///
/// `SUBOPTIMAL_KHR` is a success code and yields `Ok(true)`. Every error
/// code, `ERROR_OUT_OF_DATE_KHR` included, is returned as an error.
pub fn present_result(result: ash::prelude::VkResult<bool>) -> Result<bool> {
    result.map_err(GpuError::Vulkan)
}

/// Create a colour view of a swapchain image.
///
/// # Safety
/// The device and image must be valid.
pub unsafe fn create_image_view(
    device: &ash::Device,
    image: vk::Image,
    format: vk::Format,
) -> Result<vk::ImageView> {
    let view_info = vk::ImageViewCreateInfo::default()
        .image(image)
        .view_type(vk::ImageViewType::TYPE_2D)
        .format(format)
        .components(vk::ComponentMapping::default())
        .subresource_range(
            vk::ImageSubresourceRange::default()
                .aspect_mask(vk::ImageAspectFlags::COLOR)
                .base_mip_level(0)
                .level_count(1)
                .base_array_layer(0)
                .layer_count(1),
        );

    Ok(device.create_image_view(&view_info, None)?)
}

/// Select the best surface format: sRGB BGRA when offered, otherwise the
/// first format the surface reports.
pub fn select_surface_format(available: &[vk::SurfaceFormatKHR]) -> Option<vk::SurfaceFormatKHR> {
    available
        .iter()
        .find(|format| {
            format.format == vk::Format::B8G8R8A8_SRGB
                && format.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
        })
        .or_else(|| available.first())
        .copied()
}

/// Select the present mode: FIFO with vsync, IMMEDIATE without it.
///
/// FIFO is always supported, so it is the fallback when IMMEDIATE is not.
pub fn select_present_mode(available: &[vk::PresentModeKHR], vsync: bool) -> vk::PresentModeKHR {
    if !vsync && available.contains(&vk::PresentModeKHR::IMMEDIATE) {
        return vk::PresentModeKHR::IMMEDIATE;
    }
    vk::PresentModeKHR::FIFO
}

/// Calculate swapchain extent.
pub fn calculate_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    desired_width: u32,
    desired_height: u32,
) -> vk::Extent2D {
    if capabilities.current_extent.width == u32::MAX {
        vk::Extent2D {
            width: desired_width.clamp(
                capabilities.min_image_extent.width,
                capabilities.max_image_extent.width,
            ),
            height: desired_height.clamp(
                capabilities.min_image_extent.height,
                capabilities.max_image_extent.height,
            ),
        }
    } else {
        capabilities.current_extent
    }
}

/// One more image than the minimum, capped by the maximum when there is one.
pub const fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let image_count = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 && image_count > capabilities.max_image_count {
        capabilities.max_image_count
    } else {
        image_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(format: vk::Format, color_space: vk::ColorSpaceKHR) -> vk::SurfaceFormatKHR {
        vk::SurfaceFormatKHR {
            format,
            color_space,
        }
    }

    #[test]
    fn present_suboptimal_is_success() {
        assert!(!present_result(Ok(false)).unwrap());
        assert!(present_result(Ok(true)).unwrap());
    }

    #[test]
    fn present_out_of_date_is_error() {
        let err = present_result(Err(vk::Result::ERROR_OUT_OF_DATE_KHR)).unwrap_err();
        assert!(matches!(
            err,
            GpuError::Vulkan(vk::Result::ERROR_OUT_OF_DATE_KHR)
        ));
        assert!(!err.is_timeout());
    }

    #[test]
    fn present_device_lost_is_error() {
        assert!(present_result(Err(vk::Result::ERROR_DEVICE_LOST)).is_err());
    }

    #[test]
    fn prefers_srgb_format() {
        let available = [
            format(vk::Format::R8G8B8A8_UNORM, vk::ColorSpaceKHR::SRGB_NONLINEAR),
            format(vk::Format::B8G8R8A8_SRGB, vk::ColorSpaceKHR::SRGB_NONLINEAR),
        ];
        let selected = select_surface_format(&available).unwrap();
        assert_eq!(selected.format, vk::Format::B8G8R8A8_SRGB);
    }

    #[test]
    fn falls_back_to_first_format() {
        let available = [format(vk::Format::R8G8B8A8_UNORM, vk::ColorSpaceKHR::SRGB_NONLINEAR)];
        let selected = select_surface_format(&available).unwrap();
        assert_eq!(selected.format, vk::Format::R8G8B8A8_UNORM);
        assert!(select_surface_format(&[]).is_none());
    }

    #[test]
    fn present_mode_follows_vsync() {
        let all = [
            vk::PresentModeKHR::MAILBOX,
            vk::PresentModeKHR::IMMEDIATE,
            vk::PresentModeKHR::FIFO,
        ];
        assert_eq!(select_present_mode(&all, true), vk::PresentModeKHR::FIFO);
        assert_eq!(select_present_mode(&all, false), vk::PresentModeKHR::IMMEDIATE);

        let fifo_only = [vk::PresentModeKHR::FIFO];
        assert_eq!(select_present_mode(&fifo_only, false), vk::PresentModeKHR::FIFO);
    }

    #[test]
    fn extent_uses_current_when_fixed() {
        let caps = vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D {
                width: 800,
                height: 600,
            },
            ..Default::default()
        };
        let extent = calculate_extent(&caps, 500, 500);
        assert_eq!((extent.width, extent.height), (800, 600));
    }

    #[test]
    fn extent_clamps_desired_size() {
        let caps = vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D {
                width: u32::MAX,
                height: u32::MAX,
            },
            min_image_extent: vk::Extent2D {
                width: 1,
                height: 1,
            },
            max_image_extent: vk::Extent2D {
                width: 400,
                height: 4096,
            },
            ..Default::default()
        };
        let extent = calculate_extent(&caps, 500, 500);
        assert_eq!((extent.width, extent.height), (400, 500));
    }

    #[test]
    fn image_count_respects_maximum() {
        let mut caps = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 0,
            ..Default::default()
        };
        assert_eq!(choose_image_count(&caps), 3);

        caps.max_image_count = 2;
        assert_eq!(choose_image_count(&caps), 2);
    }
}
