//! Core settings shared across the Voxen engine.
//!
//! This crate holds the compile-time application settings and the
//! render settings value handed from the application shell to the
//! renderer backend.

pub mod settings;

pub use settings::{AppSettings, RenderSettings};

/// Engine-wide constants
pub mod constants {
    /// Name reported to the graphics driver as the engine name.
    pub const ENGINE_NAME: &str = "Voxen";
    /// Title of the main window, also used as the application name.
    pub const APP_NAME: &str = "Voxel Engine";
    /// One second expressed in nanoseconds, the unit of Vulkan timeouts.
    pub const ONE_SECOND_NS: u64 = 1_000_000_000;
}
