//! The seam between the renderer and a graphics API.

use std::fmt;

use glam::Vec4;
use voxen_gpu::Result;

use crate::teardown::ResourceStack;

/// One stage of renderer bring-up, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BringUpStep {
    /// Instance, plus the debug messenger when validation is on.
    Instance,
    /// Surface bound to the window.
    Surface,
    /// GPU selection. Acquires nothing.
    PhysicalDevice,
    /// Logical device and graphics queue.
    Device,
    /// Swapchain and one image view per image.
    Swapchain,
    /// Command pool and the primary command buffer.
    Commands,
    /// Single-subpass colour render pass.
    RenderPass,
    /// One framebuffer per swapchain image.
    Framebuffers,
    /// Render fence (signaled) and the acquire and render semaphores.
    SyncObjects,
}

impl BringUpStep {
    /// Every step, in bring-up order.
    pub const ORDER: [Self; 9] = [
        Self::Instance,
        Self::Surface,
        Self::PhysicalDevice,
        Self::Device,
        Self::Swapchain,
        Self::Commands,
        Self::RenderPass,
        Self::Framebuffers,
        Self::SyncObjects,
    ];
}

impl fmt::Display for BringUpStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Instance => "instance",
            Self::Surface => "surface",
            Self::PhysicalDevice => "physical device",
            Self::Device => "device",
            Self::Swapchain => "swapchain",
            Self::Commands => "commands",
            Self::RenderPass => "render pass",
            Self::Framebuffers => "framebuffers",
            Self::SyncObjects => "sync objects",
        };
        f.write_str(name)
    }
}

/// Graphics operations the [`Renderer`](crate::Renderer) sequences.
///
/// Each method performs one operation and nothing else. Ordering is the
/// renderer's job.
pub trait RenderBackend {
    /// An owned graphics object that must be released at teardown.
    type Resource;

    /// Run one bring-up step, pushing every object onto `acquired` as soon
    /// as it is created.
    fn acquire(
        &mut self,
        step: BringUpStep,
        acquired: &mut ResourceStack<Self::Resource>,
    ) -> Result<()>;

    /// Destroy one object previously pushed by [`acquire`](Self::acquire).
    fn release(&mut self, resource: Self::Resource);

    /// Whether the presentation target currently has no visible area.
    fn is_minimized(&self) -> bool;

    /// Block until the device has finished all submitted work.
    fn wait_idle(&mut self) -> Result<()>;

    /// Wait for the render fence, failing with a timeout after `timeout_ns`.
    fn wait_for_render_fence(&mut self, timeout_ns: u64) -> Result<()>;

    /// Return the render fence to the unsignaled state.
    fn reset_render_fence(&mut self) -> Result<()>;

    /// Reset the primary command buffer.
    fn reset_command_buffer(&mut self) -> Result<()>;

    /// Acquire the next swapchain image, signalling the acquire semaphore.
    fn acquire_next_image(&mut self, timeout_ns: u64) -> Result<u32>;

    /// Begin recording the primary command buffer.
    fn begin_commands(&mut self) -> Result<()>;

    /// Begin the render pass on the framebuffer of `image_index`.
    fn begin_render_pass(&mut self, image_index: u32, clear: Vec4) -> Result<()>;

    /// End the render pass.
    fn end_render_pass(&mut self) -> Result<()>;

    /// Finish recording the primary command buffer.
    fn end_commands(&mut self) -> Result<()>;

    /// Submit the command buffer: wait on the acquire semaphore at colour
    /// output, signal the render semaphore and the render fence.
    fn submit(&mut self) -> Result<()>;

    /// Present `image_index` once the render semaphore is signaled.
    fn present(&mut self, image_index: u32) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_starts_with_instance_and_ends_with_sync() {
        assert_eq!(BringUpStep::ORDER.first(), Some(&BringUpStep::Instance));
        assert_eq!(BringUpStep::ORDER.last(), Some(&BringUpStep::SyncObjects));
    }

    #[test]
    fn swapchain_precedes_render_pass_and_framebuffers() {
        let position = |step| BringUpStep::ORDER.iter().position(|s| *s == step);
        assert!(position(BringUpStep::Swapchain) < position(BringUpStep::RenderPass));
        assert!(position(BringUpStep::RenderPass) < position(BringUpStep::Framebuffers));
        assert!(position(BringUpStep::Surface) < position(BringUpStep::PhysicalDevice));
    }
}
