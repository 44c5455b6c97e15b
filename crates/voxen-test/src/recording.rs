//! Instrumented fake graphics backend.

use std::cell::RefCell;
use std::rc::Rc;

use ash::vk;
use glam::Vec4;
use voxen_gpu::{GpuError, Result};
use voxen_render::{BringUpStep, RenderBackend, ResourceStack};

/// A graphics object created by the fake backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FakeResource {
    Instance,
    DebugMessenger,
    Surface,
    Device,
    Swapchain,
    ImageView(u32),
    CommandPool,
    RenderPass,
    Framebuffer(u32),
    RenderFence,
    AcquireSemaphore,
    RenderSemaphore,
}

/// A per-frame operation, used to inject failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameOp {
    WaitFence,
    ResetFence,
    ResetCommandBuffer,
    AcquireImage,
    BeginCommands,
    BeginRenderPass,
    EndRenderPass,
    EndCommands,
    Submit,
    Present,
}

/// One recorded backend call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Acquire(BringUpStep),
    Create(FakeResource),
    Release(FakeResource),
    WaitIdle,
    Frame(FrameOp),
}

#[derive(Debug)]
struct Recording {
    calls: Vec<Call>,
    clear_colors: Vec<Vec4>,
    image_count: u32,
    next_image: u32,
    minimized: bool,
    fence_presignaled: bool,
    fence_signaled: bool,
    fail_step: Option<(BringUpStep, usize)>,
    fail_frame_op: Option<FrameOp>,
}

/// Fake [`RenderBackend`] recording every call.
///
/// The GPU is modelled as finishing submitted work instantly: a submit
/// signals the render fence, a fence reset clears it.
pub struct RecordingBackend {
    state: Rc<RefCell<Recording>>,
}

/// Shared view of a [`RecordingBackend`] that stays usable after the
/// backend has been moved into a renderer.
#[derive(Clone)]
pub struct RecordingHandle {
    state: Rc<RefCell<Recording>>,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingBackend {
    /// A backend with three swapchain images and a pre-signaled fence.
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(Recording {
                calls: Vec::new(),
                clear_colors: Vec::new(),
                image_count: 3,
                next_image: 0,
                minimized: false,
                fence_presignaled: true,
                fence_signaled: false,
                fail_step: None,
                fail_frame_op: None,
            })),
        }
    }

    /// Set the number of swapchain images.
    #[must_use]
    pub fn with_image_count(self, count: u32) -> Self {
        self.state.borrow_mut().image_count = count;
        self
    }

    /// Create the render fence unsignaled, as a broken backend would.
    #[must_use]
    pub fn with_unsignaled_fence(self) -> Self {
        self.state.borrow_mut().fence_presignaled = false;
        self
    }

    /// Fail `step` before it creates anything.
    #[must_use]
    pub fn failing_at(self, step: BringUpStep) -> Self {
        self.failing_after(step, 0)
    }

    /// Fail `step` after it has created `created` objects.
    #[must_use]
    pub fn failing_after(self, step: BringUpStep, created: usize) -> Self {
        self.state.borrow_mut().fail_step = Some((step, created));
        self
    }

    /// Get a handle for inspecting and steering this backend.
    pub fn handle(&self) -> RecordingHandle {
        RecordingHandle {
            state: Rc::clone(&self.state),
        }
    }

    fn frame_op(&self, op: FrameOp) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::Frame(op));
        if state.fail_frame_op == Some(op) {
            return Err(match op {
                FrameOp::WaitFence => GpuError::Timeout("render fence"),
                FrameOp::AcquireImage => GpuError::Timeout("swapchain image"),
                _ => GpuError::Vulkan(vk::Result::ERROR_DEVICE_LOST),
            });
        }
        Ok(())
    }

    fn objects_for(&self, step: BringUpStep) -> Vec<FakeResource> {
        let image_count = self.state.borrow().image_count;
        match step {
            BringUpStep::Instance => vec![FakeResource::Instance, FakeResource::DebugMessenger],
            BringUpStep::Surface => vec![FakeResource::Surface],
            BringUpStep::PhysicalDevice => Vec::new(),
            BringUpStep::Device => vec![FakeResource::Device],
            BringUpStep::Swapchain => std::iter::once(FakeResource::Swapchain)
                .chain((0..image_count).map(FakeResource::ImageView))
                .collect(),
            BringUpStep::Commands => vec![FakeResource::CommandPool],
            BringUpStep::RenderPass => vec![FakeResource::RenderPass],
            BringUpStep::Framebuffers => (0..image_count).map(FakeResource::Framebuffer).collect(),
            BringUpStep::SyncObjects => vec![
                FakeResource::RenderFence,
                FakeResource::AcquireSemaphore,
                FakeResource::RenderSemaphore,
            ],
        }
    }
}

impl RenderBackend for RecordingBackend {
    type Resource = FakeResource;

    fn acquire(
        &mut self,
        step: BringUpStep,
        acquired: &mut ResourceStack<FakeResource>,
    ) -> Result<()> {
        self.state.borrow_mut().calls.push(Call::Acquire(step));

        let fail_after = self
            .state
            .borrow()
            .fail_step
            .and_then(|(failing, created)| (failing == step).then_some(created));

        for (created, resource) in self.objects_for(step).into_iter().enumerate() {
            if fail_after == Some(created) {
                break;
            }
            let mut state = self.state.borrow_mut();
            state.calls.push(Call::Create(resource));
            if resource == FakeResource::RenderFence {
                state.fence_signaled = state.fence_presignaled;
            }
            acquired.push(resource);
        }

        if fail_after.is_some() {
            return Err(GpuError::Vulkan(vk::Result::ERROR_INITIALIZATION_FAILED));
        }
        Ok(())
    }

    fn release(&mut self, resource: FakeResource) {
        self.state.borrow_mut().calls.push(Call::Release(resource));
    }

    fn is_minimized(&self) -> bool {
        self.state.borrow().minimized
    }

    fn wait_idle(&mut self) -> Result<()> {
        self.state.borrow_mut().calls.push(Call::WaitIdle);
        Ok(())
    }

    fn wait_for_render_fence(&mut self, _timeout_ns: u64) -> Result<()> {
        self.frame_op(FrameOp::WaitFence)?;
        if self.state.borrow().fence_signaled {
            Ok(())
        } else {
            Err(GpuError::Timeout("render fence"))
        }
    }

    fn reset_render_fence(&mut self) -> Result<()> {
        self.frame_op(FrameOp::ResetFence)?;
        self.state.borrow_mut().fence_signaled = false;
        Ok(())
    }

    fn reset_command_buffer(&mut self) -> Result<()> {
        self.frame_op(FrameOp::ResetCommandBuffer)
    }

    fn acquire_next_image(&mut self, _timeout_ns: u64) -> Result<u32> {
        self.frame_op(FrameOp::AcquireImage)?;
        let mut state = self.state.borrow_mut();
        let index = state.next_image;
        state.next_image = (index + 1) % state.image_count.max(1);
        Ok(index)
    }

    fn begin_commands(&mut self) -> Result<()> {
        self.frame_op(FrameOp::BeginCommands)
    }

    fn begin_render_pass(&mut self, _image_index: u32, clear: Vec4) -> Result<()> {
        self.frame_op(FrameOp::BeginRenderPass)?;
        self.state.borrow_mut().clear_colors.push(clear);
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        self.frame_op(FrameOp::EndRenderPass)
    }

    fn end_commands(&mut self) -> Result<()> {
        self.frame_op(FrameOp::EndCommands)
    }

    fn submit(&mut self) -> Result<()> {
        self.frame_op(FrameOp::Submit)?;
        self.state.borrow_mut().fence_signaled = true;
        Ok(())
    }

    fn present(&mut self, _image_index: u32) -> Result<()> {
        self.frame_op(FrameOp::Present)
    }
}

impl RecordingHandle {
    /// Every call so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    /// Objects in the order they were created.
    pub fn created(&self) -> Vec<FakeResource> {
        self.filter_calls(|call| match call {
            Call::Create(resource) => Some(resource),
            _ => None,
        })
    }

    /// Objects in the order they were released.
    pub fn released(&self) -> Vec<FakeResource> {
        self.filter_calls(|call| match call {
            Call::Release(resource) => Some(resource),
            _ => None,
        })
    }

    /// Per-frame operations in the order they ran.
    pub fn frame_ops(&self) -> Vec<FrameOp> {
        self.filter_calls(|call| match call {
            Call::Frame(op) => Some(op),
            _ => None,
        })
    }

    /// Clear colours passed to each render pass.
    pub fn clear_colors(&self) -> Vec<Vec4> {
        self.state.borrow().clear_colors.clone()
    }

    /// Whether the render fence is currently signaled.
    pub fn fence_signaled(&self) -> bool {
        self.state.borrow().fence_signaled
    }

    /// Mark the window as minimised or visible.
    pub fn set_minimized(&self, minimized: bool) {
        self.state.borrow_mut().minimized = minimized;
    }

    /// Fail `op` on every frame from now on; `None` clears the failure.
    pub fn fail_frame_op(&self, op: Option<FrameOp>) {
        self.state.borrow_mut().fail_frame_op = op;
    }

    /// Forget the calls recorded so far.
    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    fn filter_calls<T>(&self, f: impl Fn(Call) -> Option<T>) -> Vec<T> {
        self.state.borrow().calls.iter().copied().filter_map(f).collect()
    }
}
