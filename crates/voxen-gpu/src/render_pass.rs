//! Render pass and framebuffer creation.

use crate::error::Result;
use ash::vk;

/// The single colour attachment: cleared on load, stored, and left in the
/// present layout when the pass ends.
pub fn color_attachment(format: vk::Format) -> vk::AttachmentDescription {
    vk::AttachmentDescription::default()
        .format(format)
        .samples(vk::SampleCountFlags::TYPE_1)
        .load_op(vk::AttachmentLoadOp::CLEAR)
        .store_op(vk::AttachmentStoreOp::STORE)
        .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
        .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
        .initial_layout(vk::ImageLayout::UNDEFINED)
        .final_layout(vk::ImageLayout::PRESENT_SRC_KHR)
}

/// External → subpass 0 dependency gating colour-attachment writes on the
/// acquire semaphore wait stage.
pub fn external_dependency() -> vk::SubpassDependency {
    vk::SubpassDependency::default()
        .src_subpass(vk::SUBPASS_EXTERNAL)
        .dst_subpass(0)
        .src_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
        .src_access_mask(vk::AccessFlags::empty())
        .dst_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
        .dst_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE)
}

/// Create a single-subpass render pass with one colour attachment.
///
/// # Safety
/// The device must be valid.
pub unsafe fn create_render_pass(device: &ash::Device, format: vk::Format) -> Result<vk::RenderPass> {
    let attachments = [color_attachment(format)];

    let color_refs = [vk::AttachmentReference::default()
        .attachment(0)
        .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)];

    let subpasses = [vk::SubpassDescription::default()
        .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
        .color_attachments(&color_refs)];

    let dependencies = [external_dependency()];

    let create_info = vk::RenderPassCreateInfo::default()
        .attachments(&attachments)
        .subpasses(&subpasses)
        .dependencies(&dependencies);

    Ok(device.create_render_pass(&create_info, None)?)
}

/// Create a framebuffer binding one image view to `render_pass`.
///
/// # Safety
/// All handles must be valid.
pub unsafe fn create_framebuffer(
    device: &ash::Device,
    render_pass: vk::RenderPass,
    view: vk::ImageView,
    extent: vk::Extent2D,
) -> Result<vk::Framebuffer> {
    let attachments = [view];
    let create_info = vk::FramebufferCreateInfo::default()
        .render_pass(render_pass)
        .attachments(&attachments)
        .width(extent.width)
        .height(extent.height)
        .layers(1);

    Ok(device.create_framebuffer(&create_info, None)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attachment_clears_and_presents() {
        let attachment = color_attachment(vk::Format::B8G8R8A8_SRGB);
        assert_eq!(attachment.format, vk::Format::B8G8R8A8_SRGB);
        assert_eq!(attachment.load_op, vk::AttachmentLoadOp::CLEAR);
        assert_eq!(attachment.store_op, vk::AttachmentStoreOp::STORE);
        assert_eq!(attachment.initial_layout, vk::ImageLayout::UNDEFINED);
        assert_eq!(attachment.final_layout, vk::ImageLayout::PRESENT_SRC_KHR);
    }

    #[test]
    fn dependency_gates_color_writes() {
        let dependency = external_dependency();
        assert_eq!(dependency.src_subpass, vk::SUBPASS_EXTERNAL);
        assert_eq!(dependency.dst_subpass, 0);
        assert_eq!(
            dependency.dst_stage_mask,
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
        );
        assert_eq!(
            dependency.dst_access_mask,
            vk::AccessFlags::COLOR_ATTACHMENT_WRITE
        );
    }
}
