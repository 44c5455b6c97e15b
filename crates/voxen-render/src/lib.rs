//! Renderer for the Voxen engine.
//!
//! The [`Renderer`] owns the ordering of everything it does: the bring-up
//! step order, the per-frame protocol and the teardown order. A
//! [`RenderBackend`] only performs individual graphics operations, which
//! lets the protocol be exercised against a recording fake as well as
//! against Vulkan.

pub mod backend;
pub mod clear;
pub mod renderer;
pub mod teardown;
pub mod vulkan;

pub use backend::{BringUpStep, RenderBackend};
pub use clear::{clear_color, FLASH_PERIOD_FRAMES};
pub use renderer::{DrawOutcome, Renderer, SkipReason, FRAME_TIMEOUT_NS};
pub use teardown::ResourceStack;
pub use vulkan::{GpuResource, VulkanBackend};
