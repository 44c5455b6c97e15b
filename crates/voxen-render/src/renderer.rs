//! Renderer lifecycle and frame protocol.

use tracing::{debug, error, info};
use voxen_core::constants::ONE_SECOND_NS;
use voxen_gpu::{GpuError, Result};

use crate::backend::{BringUpStep, RenderBackend};
use crate::clear::clear_color;
use crate::teardown::ResourceStack;

/// Bound on the render fence wait and the swapchain image acquire.
pub const FRAME_TIMEOUT_NS: u64 = ONE_SECOND_NS;

/// Why a draw did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// [`Renderer::initialize`] has not completed.
    NotReady,
    /// The window has no visible area.
    Minimized,
}

/// Result of a successful [`Renderer::draw`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawOutcome {
    /// A frame was recorded, submitted and presented.
    Presented { image_index: u32 },
    /// Nothing was touched.
    Skipped(SkipReason),
}

/// Stands up the graphics objects and draws one frame per tick.
///
/// Every object the backend creates is recorded in a [`ResourceStack`], so
/// both a failed [`initialize`](Self::initialize) and
/// [`shutdown`](Self::shutdown) release exactly what was acquired, newest
/// first.
pub struct Renderer<B: RenderBackend> {
    backend: B,
    resources: ResourceStack<B::Resource>,
    ready: bool,
    frame_number: u64,
}

impl<B: RenderBackend> Renderer<B> {
    /// Create a renderer. Nothing is acquired until [`initialize`](Self::initialize).
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            resources: ResourceStack::new(),
            ready: false,
            frame_number: 0,
        }
    }

    /// Run every bring-up step in order.
    ///
    /// On failure everything acquired so far is released in reverse order
    /// and the error of the failing step is returned.
    pub fn initialize(&mut self) -> Result<()> {
        if self.ready || !self.resources.is_empty() {
            return Err(GpuError::InvalidState(
                "renderer is already initialized".to_string(),
            ));
        }

        for step in BringUpStep::ORDER {
            debug!("Bring-up: {step}");
            if let Err(e) = self.backend.acquire(step, &mut self.resources) {
                error!("Bring-up failed at {step}: {e}");
                self.release_resources();
                return Err(e);
            }
        }

        self.ready = true;
        info!(
            "Renderer ready ({} graphics objects)",
            self.resources.len()
        );
        Ok(())
    }

    /// Draw one frame.
    ///
    /// Skips without touching the backend when not ready or minimised. Any
    /// failure during the frame is returned as is; nothing is retried.
    pub fn draw(&mut self) -> Result<DrawOutcome> {
        if !self.ready {
            return Ok(DrawOutcome::Skipped(SkipReason::NotReady));
        }

        if self.backend.is_minimized() {
            return Ok(DrawOutcome::Skipped(SkipReason::Minimized));
        }

        self.backend.wait_for_render_fence(FRAME_TIMEOUT_NS)?;
        self.backend.reset_render_fence()?;
        self.backend.reset_command_buffer()?;

        let image_index = self.backend.acquire_next_image(FRAME_TIMEOUT_NS)?;

        self.backend.begin_commands()?;
        self.backend
            .begin_render_pass(image_index, clear_color(self.frame_number))?;
        self.backend.end_render_pass()?;
        self.backend.end_commands()?;

        self.backend.submit()?;
        self.backend.present(image_index)?;

        self.frame_number += 1;
        Ok(DrawOutcome::Presented { image_index })
    }

    /// Wait for the device to go idle, then release every object in
    /// reverse creation order. Further calls do nothing.
    pub fn shutdown(&mut self) {
        if self.resources.is_empty() {
            return;
        }

        self.ready = false;
        if let Err(e) = self.backend.wait_idle() {
            error!("Failed to wait for device idle: {e}");
        }
        self.release_resources();
        info!("Renderer shut down after {} frames", self.frame_number);
    }

    /// Whether bring-up has completed.
    pub const fn is_ready(&self) -> bool {
        self.ready
    }

    /// Number of frames presented.
    pub const fn frame_number(&self) -> u64 {
        self.frame_number
    }

    /// Number of graphics objects currently held.
    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    /// Get the backend.
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    fn release_resources(&mut self) {
        let backend = &mut self.backend;
        self.resources.release_all(|resource| backend.release(resource));
    }
}

impl<B: RenderBackend> Drop for Renderer<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
