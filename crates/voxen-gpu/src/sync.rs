//! Synchronization primitives.

use crate::error::{GpuError, Result};
use ash::vk;

/// Create a semaphore.
///
/// # Safety
/// The device must be valid.
pub unsafe fn create_semaphore(device: &ash::Device) -> Result<vk::Semaphore> {
    let create_info = vk::SemaphoreCreateInfo::default();
    let semaphore = device.create_semaphore(&create_info, None)?;
    Ok(semaphore)
}

/// Create a fence.
///
/// # Safety
/// The device must be valid.
pub unsafe fn create_fence(device: &ash::Device, signaled: bool) -> Result<vk::Fence> {
    let flags = if signaled {
        vk::FenceCreateFlags::SIGNALED
    } else {
        vk::FenceCreateFlags::empty()
    };

    let create_info = vk::FenceCreateInfo::default().flags(flags);
    let fence = device.create_fence(&create_info, None)?;
    Ok(fence)
}

/// Wait for a fence to be signaled. Expiry maps to [`GpuError::Timeout`].
///
/// # Safety
/// The device and fence must be valid.
pub unsafe fn wait_for_fence(device: &ash::Device, fence: vk::Fence, timeout_ns: u64) -> Result<()> {
    device
        .wait_for_fences(&[fence], true, timeout_ns)
        .map_err(|e| GpuError::from_wait(e, "render fence"))
}

/// Reset a fence to unsignaled state.
///
/// # Safety
/// The device and fence must be valid.
pub unsafe fn reset_fence(device: &ash::Device, fence: vk::Fence) -> Result<()> {
    device.reset_fences(&[fence])?;
    Ok(())
}

/// Synchronization for the single frame in flight.
#[derive(Debug, Clone, Copy)]
pub struct FrameSync {
    /// Signaled when the acquired swapchain image is ready to be drawn to.
    pub image_available: vk::Semaphore,
    /// Signaled when rendering is complete and the image can be presented.
    pub render_finished: vk::Semaphore,
    /// Signaled when the frame's command buffer has retired. Created signaled
    /// so the first wait returns immediately.
    pub render_fence: vk::Fence,
}

impl FrameSync {
    /// Wait until the previous frame's commands have retired.
    ///
    /// # Safety
    /// The device must be valid.
    pub unsafe fn wait(&self, device: &ash::Device, timeout_ns: u64) -> Result<()> {
        wait_for_fence(device, self.render_fence, timeout_ns)
    }

    /// Reset the fence for the next submission.
    ///
    /// # Safety
    /// The device must be valid and the fence must not be pending.
    pub unsafe fn reset(&self, device: &ash::Device) -> Result<()> {
        reset_fence(device, self.render_fence)
    }
}
