//! Vulkan implementation of [`RenderBackend`].

use std::sync::Arc;

use ash::vk;
use glam::Vec4;
use raw_window_handle::HasDisplayHandle;
use tracing::{debug, info, warn};
use voxen_core::RenderSettings;
use voxen_gpu::command::{
    allocate_primary_command_buffer, begin_clear_pass, begin_command_buffer, create_command_pool,
    end_command_buffer, submit_command_buffers,
};
use voxen_gpu::debug::create_debug_messenger;
use voxen_gpu::device::{create_device, select_physical_device};
use voxen_gpu::instance::create_instance;
use voxen_gpu::render_pass::{create_framebuffer, create_render_pass};
use voxen_gpu::surface::create_surface;
use voxen_gpu::swapchain::create_image_view;
use voxen_gpu::sync::{create_fence, create_semaphore};
use voxen_gpu::{
    DeviceContext, FrameSync, GpuError, Result, SelectedDevice, SurfaceCapabilities, Swapchain,
};
use winit::window::Window;

use crate::backend::{BringUpStep, RenderBackend};
use crate::teardown::ResourceStack;

/// A Vulkan object owned by the [`VulkanBackend`].
///
/// Instance and device are unique per backend, so they carry no handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpuResource {
    /// The Vulkan instance.
    Instance,
    /// Validation message sink, present only with debug utils.
    DebugMessenger(vk::DebugUtilsMessengerEXT),
    /// Window surface.
    Surface(vk::SurfaceKHR),
    /// Logical device.
    Device,
    /// Swapchain; its images are owned by it.
    Swapchain(vk::SwapchainKHR),
    /// View of one swapchain image.
    ImageView(vk::ImageView),
    /// Command pool; frees its command buffer on destruction.
    CommandPool(vk::CommandPool),
    /// Clear-and-present render pass.
    RenderPass(vk::RenderPass),
    /// Framebuffer for one swapchain image.
    Framebuffer(vk::Framebuffer),
    /// Render fence.
    Fence(vk::Fence),
    /// Image-available or render-finished semaphore.
    Semaphore(vk::Semaphore),
}

/// Renders into a winit window through Vulkan.
pub struct VulkanBackend {
    window: Arc<Window>,
    settings: RenderSettings,
    entry: ash::Entry,

    instance: Option<ash::Instance>,
    debug_utils: Option<ash::ext::debug_utils::Instance>,
    surface_loader: Option<ash::khr::surface::Instance>,
    surface: vk::SurfaceKHR,

    selected: Option<SelectedDevice>,
    device: Option<DeviceContext>,
    swapchain_loader: Option<ash::khr::swapchain::Device>,

    swapchain: Option<Swapchain>,
    image_views: Vec<vk::ImageView>,
    command_pool: vk::CommandPool,
    command_buffer: vk::CommandBuffer,
    render_pass: vk::RenderPass,
    framebuffers: Vec<vk::Framebuffer>,
    sync: Option<FrameSync>,

    reported_suboptimal: bool,
}

impl VulkanBackend {
    /// Load the Vulkan loader. No Vulkan objects are created yet.
    pub fn new(window: Arc<Window>, settings: RenderSettings) -> Result<Self> {
        // SAFETY: the entry is kept alive for as long as the backend
        let entry =
            unsafe { ash::Entry::load() }.map_err(|e| GpuError::Loading(e.to_string()))?;

        Ok(Self {
            window,
            settings,
            entry,
            instance: None,
            debug_utils: None,
            surface_loader: None,
            surface: vk::SurfaceKHR::null(),
            selected: None,
            device: None,
            swapchain_loader: None,
            swapchain: None,
            image_views: Vec::new(),
            command_pool: vk::CommandPool::null(),
            command_buffer: vk::CommandBuffer::null(),
            render_pass: vk::RenderPass::null(),
            framebuffers: Vec::new(),
            sync: None,
            reported_suboptimal: false,
        })
    }

    /// Summary of the selected GPU, once one has been selected.
    pub fn gpu_summary(&self) -> Option<String> {
        self.selected
            .as_ref()
            .map(|selected| selected.capabilities.summary())
    }

    fn instance(&self) -> Result<&ash::Instance> {
        self.instance.as_ref().ok_or_else(|| missing("instance"))
    }

    fn surface_loader(&self) -> Result<&ash::khr::surface::Instance> {
        self.surface_loader
            .as_ref()
            .ok_or_else(|| missing("surface loader"))
    }

    fn selected(&self) -> Result<&SelectedDevice> {
        self.selected
            .as_ref()
            .ok_or_else(|| missing("physical device"))
    }

    fn device(&self) -> Result<&DeviceContext> {
        self.device.as_ref().ok_or_else(|| missing("device"))
    }

    fn swapchain(&self) -> Result<(&ash::khr::swapchain::Device, &Swapchain)> {
        let loader = self
            .swapchain_loader
            .as_ref()
            .ok_or_else(|| missing("swapchain loader"))?;
        let swapchain = self.swapchain.as_ref().ok_or_else(|| missing("swapchain"))?;
        Ok((loader, swapchain))
    }

    fn sync(&self) -> Result<FrameSync> {
        self.sync.ok_or_else(|| missing("sync objects"))
    }

    fn acquire_instance(&mut self, acquired: &mut ResourceStack<GpuResource>) -> Result<()> {
        let display = self
            .window
            .display_handle()
            .map_err(|e| GpuError::SurfaceCreation(format!("Failed to get display handle: {e}")))?
            .as_raw();

        // SAFETY: the entry is valid
        let created = unsafe {
            create_instance(
                &self.entry,
                &self.settings.app_name,
                display,
                self.settings.validation,
            )?
        };
        acquired.push(GpuResource::Instance);

        self.surface_loader = Some(ash::khr::surface::Instance::new(
            &self.entry,
            &created.instance,
        ));
        let debug_utils = created
            .debug_utils_enabled
            .then(|| ash::ext::debug_utils::Instance::new(&self.entry, &created.instance));
        self.instance = Some(created.instance);

        if let Some(debug_utils) = debug_utils {
            // SAFETY: the instance was created with VK_EXT_debug_utils
            let messenger = unsafe { create_debug_messenger(&debug_utils)? };
            acquired.push(GpuResource::DebugMessenger(messenger));
            self.debug_utils = Some(debug_utils);
        }

        Ok(())
    }

    fn acquire_swapchain(&mut self, acquired: &mut ResourceStack<GpuResource>) -> Result<()> {
        let surface_loader = self.surface_loader()?;
        let physical_device = self.selected()?.physical_device;
        let (swapchain_loader, device) = (
            self.swapchain_loader
                .as_ref()
                .ok_or_else(|| missing("swapchain loader"))?,
            &self.device()?.device,
        );

        let desired = vk::Extent2D {
            width: self.settings.width,
            height: self.settings.height,
        };

        // SAFETY: surface, physical device and device are valid
        let swapchain = unsafe {
            let caps = SurfaceCapabilities::query(surface_loader, physical_device, self.surface)?;
            Swapchain::new(
                swapchain_loader,
                self.surface,
                &caps,
                desired,
                self.settings.vsync,
            )?
        };
        acquired.push(GpuResource::Swapchain(swapchain.swapchain));

        info!(
            "Swapchain created: {}x{} ({} images)",
            swapchain.extent.width,
            swapchain.extent.height,
            swapchain.images.len()
        );

        let mut image_views = Vec::with_capacity(swapchain.images.len());
        for &image in &swapchain.images {
            // SAFETY: the image belongs to a live swapchain
            let view = unsafe { create_image_view(device, image, swapchain.format)? };
            acquired.push(GpuResource::ImageView(view));
            image_views.push(view);
        }

        self.swapchain = Some(swapchain);
        self.image_views = image_views;
        Ok(())
    }
}

fn missing(what: &str) -> GpuError {
    GpuError::InvalidState(format!("{what} has not been created"))
}

impl RenderBackend for VulkanBackend {
    type Resource = GpuResource;

    fn acquire(
        &mut self,
        step: BringUpStep,
        acquired: &mut ResourceStack<GpuResource>,
    ) -> Result<()> {
        match step {
            BringUpStep::Instance => self.acquire_instance(acquired)?,
            BringUpStep::Surface => {
                // SAFETY: the window outlives the backend, which owns an Arc to it
                let surface =
                    unsafe { create_surface(&self.entry, self.instance()?, self.window.as_ref())? };
                acquired.push(GpuResource::Surface(surface));
                self.surface = surface;
            }
            BringUpStep::PhysicalDevice => {
                // SAFETY: instance and surface are valid
                let selected = unsafe {
                    select_physical_device(self.instance()?, self.surface_loader()?, self.surface)?
                };
                info!("Selected GPU: {}", selected.capabilities.summary());
                self.selected = Some(selected);
            }
            BringUpStep::Device => {
                let instance = self.instance()?;
                // SAFETY: the physical device was enumerated from this instance
                let ctx = unsafe { create_device(instance, self.selected()?)? };
                acquired.push(GpuResource::Device);
                let swapchain_loader = ash::khr::swapchain::Device::new(instance, &ctx.device);
                self.swapchain_loader = Some(swapchain_loader);
                self.device = Some(ctx);
            }
            BringUpStep::Swapchain => self.acquire_swapchain(acquired)?,
            BringUpStep::Commands => {
                let ctx = self.device()?;
                // SAFETY: the device is valid
                let (pool, cmd) = unsafe {
                    let pool = create_command_pool(&ctx.device, ctx.graphics_queue_family)?;
                    acquired.push(GpuResource::CommandPool(pool));
                    (pool, allocate_primary_command_buffer(&ctx.device, pool)?)
                };
                self.command_pool = pool;
                self.command_buffer = cmd;
            }
            BringUpStep::RenderPass => {
                let (_, swapchain) = self.swapchain()?;
                // SAFETY: the device is valid
                let render_pass =
                    unsafe { create_render_pass(&self.device()?.device, swapchain.format)? };
                acquired.push(GpuResource::RenderPass(render_pass));
                self.render_pass = render_pass;
            }
            BringUpStep::Framebuffers => {
                let (_, swapchain) = self.swapchain()?;
                let device = &self.device()?.device;
                let mut framebuffers = Vec::with_capacity(self.image_views.len());
                for &view in &self.image_views {
                    // SAFETY: render pass and view are valid
                    let framebuffer = unsafe {
                        create_framebuffer(device, self.render_pass, view, swapchain.extent)?
                    };
                    acquired.push(GpuResource::Framebuffer(framebuffer));
                    framebuffers.push(framebuffer);
                }
                self.framebuffers = framebuffers;
            }
            BringUpStep::SyncObjects => {
                let device = &self.device()?.device;
                // SAFETY: the device is valid
                let sync = unsafe {
                    // Signaled, so the first frame's wait does not block
                    let render_fence = create_fence(device, true)?;
                    acquired.push(GpuResource::Fence(render_fence));
                    let image_available = create_semaphore(device)?;
                    acquired.push(GpuResource::Semaphore(image_available));
                    let render_finished = create_semaphore(device)?;
                    acquired.push(GpuResource::Semaphore(render_finished));
                    FrameSync {
                        image_available,
                        render_finished,
                        render_fence,
                    }
                };
                self.sync = Some(sync);
            }
        }
        Ok(())
    }

    fn release(&mut self, resource: GpuResource) {
        debug!("Releasing {resource:?}");

        let device = self.device.as_ref().map(|ctx| &ctx.device);
        // SAFETY: the renderer releases in reverse creation order after the
        // device is idle, so nothing is in use and every parent is alive
        let released = unsafe {
            match resource {
                GpuResource::Semaphore(semaphore) => device
                    .map(|d| d.destroy_semaphore(semaphore, None))
                    .is_some(),
                GpuResource::Fence(fence) => {
                    self.sync = None;
                    device.map(|d| d.destroy_fence(fence, None)).is_some()
                }
                GpuResource::Framebuffer(framebuffer) => device
                    .map(|d| d.destroy_framebuffer(framebuffer, None))
                    .is_some(),
                GpuResource::RenderPass(render_pass) => device
                    .map(|d| d.destroy_render_pass(render_pass, None))
                    .is_some(),
                GpuResource::CommandPool(pool) => device
                    .map(|d| d.destroy_command_pool(pool, None))
                    .is_some(),
                GpuResource::ImageView(view) => device
                    .map(|d| d.destroy_image_view(view, None))
                    .is_some(),
                GpuResource::Swapchain(swapchain) => {
                    self.swapchain = None;
                    self.swapchain_loader
                        .as_ref()
                        .map(|loader| loader.destroy_swapchain(swapchain, None))
                        .is_some()
                }
                GpuResource::Device => {
                    self.swapchain_loader = None;
                    self.device
                        .take()
                        .map(|ctx| ctx.device.destroy_device(None))
                        .is_some()
                }
                GpuResource::Surface(surface) => self
                    .surface_loader
                    .as_ref()
                    .map(|loader| loader.destroy_surface(surface, None))
                    .is_some(),
                GpuResource::DebugMessenger(messenger) => self
                    .debug_utils
                    .take()
                    .map(|debug_utils| debug_utils.destroy_debug_utils_messenger(messenger, None))
                    .is_some(),
                GpuResource::Instance => {
                    self.surface_loader = None;
                    self.instance
                        .take()
                        .map(|instance| instance.destroy_instance(None))
                        .is_some()
                }
            }
        };

        if !released {
            warn!("Leaked {resource:?}: its parent was already gone");
        }
    }

    fn is_minimized(&self) -> bool {
        let size = self.window.inner_size();
        self.window.is_minimized().unwrap_or(false) || size.width == 0 || size.height == 0
    }

    fn wait_idle(&mut self) -> Result<()> {
        if let Some(ctx) = &self.device {
            // SAFETY: the device is valid
            unsafe { ctx.device.device_wait_idle()? };
        }
        Ok(())
    }

    fn wait_for_render_fence(&mut self, timeout_ns: u64) -> Result<()> {
        let sync = self.sync()?;
        // SAFETY: the fence belongs to this device
        unsafe { sync.wait(&self.device()?.device, timeout_ns) }
    }

    fn reset_render_fence(&mut self) -> Result<()> {
        let sync = self.sync()?;
        // SAFETY: the fence is signaled, so not pending
        unsafe { sync.reset(&self.device()?.device) }
    }

    fn reset_command_buffer(&mut self) -> Result<()> {
        let device = &self.device()?.device;
        // SAFETY: the fence wait guarantees the buffer has retired
        unsafe {
            device.reset_command_buffer(self.command_buffer, vk::CommandBufferResetFlags::empty())?;
        }
        Ok(())
    }

    fn acquire_next_image(&mut self, timeout_ns: u64) -> Result<u32> {
        let sync = self.sync()?;
        let (loader, swapchain) = self.swapchain()?;
        // SAFETY: swapchain and semaphore are valid
        unsafe { swapchain.acquire_next_image(loader, sync.image_available, timeout_ns) }
    }

    fn begin_commands(&mut self) -> Result<()> {
        // SAFETY: the command buffer was reset
        unsafe {
            begin_command_buffer(
                &self.device()?.device,
                self.command_buffer,
                vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT,
            )
        }
    }

    fn begin_render_pass(&mut self, image_index: u32, clear: Vec4) -> Result<()> {
        let framebuffer = self
            .framebuffers
            .get(image_index as usize)
            .copied()
            .ok_or_else(|| {
                GpuError::InvalidState(format!("No framebuffer for image {image_index}"))
            })?;
        let (_, swapchain) = self.swapchain()?;
        // SAFETY: the command buffer is recording
        unsafe {
            begin_clear_pass(
                &self.device()?.device,
                self.command_buffer,
                self.render_pass,
                framebuffer,
                swapchain.extent,
                clear.to_array(),
            );
        }
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        // SAFETY: a render pass is active on the command buffer
        unsafe { self.device()?.device.cmd_end_render_pass(self.command_buffer) };
        Ok(())
    }

    fn end_commands(&mut self) -> Result<()> {
        // SAFETY: the command buffer is recording
        unsafe { end_command_buffer(&self.device()?.device, self.command_buffer) }
    }

    fn submit(&mut self) -> Result<()> {
        let sync = self.sync()?;
        let ctx = self.device()?;
        // SAFETY: the command buffer has finished recording
        unsafe {
            submit_command_buffers(
                &ctx.device,
                ctx.graphics_queue,
                &[self.command_buffer],
                &[sync.image_available],
                &[vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT],
                &[sync.render_finished],
                sync.render_fence,
            )
        }
    }

    fn present(&mut self, image_index: u32) -> Result<()> {
        let sync = self.sync()?;
        let queue = self.device()?.graphics_queue;
        let (loader, swapchain) = self.swapchain()?;
        // SAFETY: the image was acquired and rendering was submitted
        let suboptimal =
            unsafe { swapchain.present(loader, queue, image_index, &[sync.render_finished])? };

        if suboptimal && !self.reported_suboptimal {
            warn!("Swapchain no longer matches the window surface");
            self.reported_suboptimal = true;
        }
        Ok(())
    }
}
