//! GPU error types.

use ash::vk;
use thiserror::Error;

/// GPU-related errors.
#[derive(Error, Debug)]
pub enum GpuError {
    /// Vulkan error.
    #[error("Vulkan error: {0}")]
    Vulkan(#[from] vk::Result),

    /// The Vulkan loader could not be found or loaded.
    #[error("Failed to load Vulkan: {0}")]
    Loading(String),

    /// No suitable GPU found.
    #[error("No suitable GPU found")]
    NoSuitableDevice,

    /// Surface creation failed.
    #[error("Surface creation failed: {0}")]
    SurfaceCreation(String),

    /// Swapchain creation failed.
    #[error("Swapchain creation failed: {0}")]
    SwapchainCreation(String),

    /// A bounded wait expired.
    #[error("Timed out waiting for {0}")]
    Timeout(&'static str),

    /// Invalid state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl GpuError {
    /// Map a Vulkan result from a bounded wait, turning expiry codes into
    /// [`GpuError::Timeout`].
    pub fn from_wait(result: vk::Result, what: &'static str) -> Self {
        match result {
            vk::Result::TIMEOUT | vk::Result::NOT_READY => Self::Timeout(what),
            other => Self::Vulkan(other),
        }
    }

    /// Whether this error is an expired bounded wait.
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, GpuError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_results_map_to_timeout() {
        assert!(GpuError::from_wait(vk::Result::TIMEOUT, "fence").is_timeout());
        assert!(GpuError::from_wait(vk::Result::NOT_READY, "image").is_timeout());
        assert!(matches!(
            GpuError::from_wait(vk::Result::ERROR_DEVICE_LOST, "fence"),
            GpuError::Vulkan(vk::Result::ERROR_DEVICE_LOST)
        ));
    }

    #[test]
    fn timeout_message_names_the_wait() {
        let err = GpuError::Timeout("render fence");
        assert_eq!(err.to_string(), "Timed out waiting for render fence");
    }
}
