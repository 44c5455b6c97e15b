//! Vulkan bring-up helpers for the Voxen engine.
//!
//! This crate provides:
//! - Vulkan instance creation with validation and a debug messenger
//! - Window surface creation
//! - Physical device selection and logical device creation
//! - Swapchain, render pass and framebuffer creation
//! - Command buffer and synchronization helpers
//!
//! Everything here is a thin `unsafe` wrapper around a single family of
//! Vulkan calls. Ownership and teardown ordering live in `voxen-render`.

pub mod capabilities;
pub mod command;
pub mod debug;
pub mod device;
pub mod error;
pub mod instance;
pub mod render_pass;
pub mod surface;
pub mod swapchain;
pub mod sync;

pub use capabilities::{GpuCapabilities, GpuVendor};
pub use device::{DeviceContext, SelectedDevice};
pub use error::{GpuError, Result};
pub use surface::SurfaceCapabilities;
pub use swapchain::Swapchain;
pub use sync::FrameSync;

/// Minimum Vulkan version the engine runs on.
pub const MIN_API_VERSION: (u32, u32) = (1, 1);
