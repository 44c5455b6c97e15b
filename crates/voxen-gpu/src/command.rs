//! Command buffer management.

use crate::error::{GpuError, Result};
use ash::vk;

/// Create a command pool whose buffers can be reset individually.
///
/// # Safety
/// The device must be valid and the queue family must exist.
pub unsafe fn create_command_pool(device: &ash::Device, queue_family: u32) -> Result<vk::CommandPool> {
    let create_info = vk::CommandPoolCreateInfo::default()
        .queue_family_index(queue_family)
        .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

    Ok(device.create_command_pool(&create_info, None)?)
}

/// Allocate a single primary command buffer.
///
/// # Safety
/// The device and pool must be valid.
pub unsafe fn allocate_primary_command_buffer(
    device: &ash::Device,
    pool: vk::CommandPool,
) -> Result<vk::CommandBuffer> {
    let alloc_info = vk::CommandBufferAllocateInfo::default()
        .command_pool(pool)
        .level(vk::CommandBufferLevel::PRIMARY)
        .command_buffer_count(1);

    let buffers = device.allocate_command_buffers(&alloc_info)?;
    buffers
        .into_iter()
        .next()
        .ok_or(GpuError::Vulkan(vk::Result::ERROR_OUT_OF_HOST_MEMORY))
}

/// Begin recording a command buffer.
///
/// # Safety
/// The device and command buffer must be valid.
pub unsafe fn begin_command_buffer(
    device: &ash::Device,
    cmd: vk::CommandBuffer,
    flags: vk::CommandBufferUsageFlags,
) -> Result<()> {
    let begin_info = vk::CommandBufferBeginInfo::default().flags(flags);
    device.begin_command_buffer(cmd, &begin_info)?;
    Ok(())
}

/// End recording a command buffer.
///
/// # Safety
/// The device and command buffer must be valid.
pub unsafe fn end_command_buffer(device: &ash::Device, cmd: vk::CommandBuffer) -> Result<()> {
    device.end_command_buffer(cmd)?;
    Ok(())
}

/// Begin `render_pass` on `framebuffer`, clearing the whole extent to `clear`.
///
/// # Safety
/// All handles must be valid and `cmd` must be recording.
pub unsafe fn begin_clear_pass(
    device: &ash::Device,
    cmd: vk::CommandBuffer,
    render_pass: vk::RenderPass,
    framebuffer: vk::Framebuffer,
    extent: vk::Extent2D,
    clear: [f32; 4],
) {
    let clear_values = [vk::ClearValue {
        color: vk::ClearColorValue { float32: clear },
    }];

    let begin_info = vk::RenderPassBeginInfo::default()
        .render_pass(render_pass)
        .framebuffer(framebuffer)
        .render_area(vk::Rect2D {
            offset: vk::Offset2D::default(),
            extent,
        })
        .clear_values(&clear_values);

    device.cmd_begin_render_pass(cmd, &begin_info, vk::SubpassContents::INLINE);
}

/// Submit command buffers to a queue.
///
/// # Safety
/// All handles must be valid.
pub unsafe fn submit_command_buffers(
    device: &ash::Device,
    queue: vk::Queue,
    command_buffers: &[vk::CommandBuffer],
    wait_semaphores: &[vk::Semaphore],
    wait_stages: &[vk::PipelineStageFlags],
    signal_semaphores: &[vk::Semaphore],
    fence: vk::Fence,
) -> Result<()> {
    let submit_info = vk::SubmitInfo::default()
        .command_buffers(command_buffers)
        .wait_semaphores(wait_semaphores)
        .wait_dst_stage_mask(wait_stages)
        .signal_semaphores(signal_semaphores);

    device.queue_submit(queue, &[submit_info], fence)?;
    Ok(())
}
