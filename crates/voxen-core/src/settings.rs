//! Compile-time application settings.

use crate::constants::APP_NAME;

/// Compile-time application settings.
///
/// There is no file or environment configuration; change these and rebuild.
pub struct AppSettings;

impl AppSettings {
    /// Initial window width in pixels.
    pub const WINDOW_WIDTH: u32 = 500;
    /// Initial window height in pixels.
    pub const WINDOW_HEIGHT: u32 = 500;
    /// Present with FIFO when true, IMMEDIATE (tearing allowed) when false.
    pub const VSYNC: bool = true;
    /// Request the Khronos validation layer and a debug messenger.
    pub const VALIDATION: bool = true;
}

/// Settings the renderer needs to bring up the swapchain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSettings {
    /// Application name reported to the driver.
    pub app_name: String,
    /// Desired swapchain width.
    pub width: u32,
    /// Desired swapchain height.
    pub height: u32,
    /// Enable vsync.
    pub vsync: bool,
    /// Enable validation layers and the debug messenger.
    pub validation: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            width: AppSettings::WINDOW_WIDTH,
            height: AppSettings::WINDOW_HEIGHT,
            vsync: AppSettings::VSYNC,
            validation: AppSettings::VALIDATION,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_settings_follow_app_settings() {
        let settings = RenderSettings::default();
        assert_eq!(settings.width, 500);
        assert_eq!(settings.height, 500);
        assert_eq!(settings.vsync, AppSettings::VSYNC);
        assert_eq!(settings.app_name, "Voxel Engine");
    }
}
