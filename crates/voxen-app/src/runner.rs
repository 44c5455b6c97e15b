//! Application runner and event loop.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use voxen_core::constants::APP_NAME;
use voxen_core::{AppSettings, RenderSettings};
use voxen_render::{DrawOutcome, SkipReason, VulkanBackend};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::app::{AppExit, Application, WindowSignal};
use crate::error::AppError;
use crate::state::AppState;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Window title, also reported to the driver as the application name.
    pub title: String,
    /// Initial window width.
    pub width: u32,
    /// Initial window height.
    pub height: u32,
    /// Enable vsync.
    pub vsync: bool,
    /// Enable Vulkan validation layers.
    pub validation: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: APP_NAME.to_string(),
            width: AppSettings::WINDOW_WIDTH,
            height: AppSettings::WINDOW_HEIGHT,
            vsync: AppSettings::VSYNC,
            validation: AppSettings::VALIDATION,
        }
    }
}

impl AppConfig {
    /// Create a new config with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Set the window dimensions.
    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Enable or disable vsync.
    #[must_use]
    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    /// Enable or disable validation layers.
    #[must_use]
    pub fn with_validation(mut self, validation: bool) -> Self {
        self.validation = validation;
        self
    }

    /// Settings handed to the renderer.
    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            app_name: self.title.clone(),
            width: self.width,
            height: self.height,
            vsync: self.vsync,
            validation: self.validation,
        }
    }
}

/// How long the loop sleeps between checks while the window is minimised.
const MINIMIZED_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Control flow after a tick: poll while drawing, sleep while minimised.
fn control_flow_after(outcome: Option<DrawOutcome>, now: Instant) -> ControlFlow {
    match outcome {
        Some(DrawOutcome::Skipped(SkipReason::Minimized)) => {
            ControlFlow::WaitUntil(now + MINIMIZED_POLL_INTERVAL)
        }
        _ => ControlFlow::Poll,
    }
}

/// Run the engine in a window until it is closed or fails.
///
/// Initializes logging, opens the window, brings the renderer up and ticks
/// it once per loop iteration. The renderer is always shut down before the
/// window is destroyed.
pub fn run_app(config: AppConfig) -> AppExit {
    // Ignore the error if a subscriber is already installed
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();

    info!("{} starting...", config.title);

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            error!("{}", AppError::EventLoop(e.to_string()));
            return AppExit::Failure;
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut runner = AppRunner {
        config,
        app: Application::new(),
        window: None,
    };

    if let Err(e) = event_loop.run_app(&mut runner) {
        error!("{}", AppError::EventLoop(e.to_string()));
        runner.app.fail();
    }

    runner.finish()
}

/// Internal application runner that implements winit's ApplicationHandler.
struct AppRunner {
    config: AppConfig,
    app: Application<VulkanBackend>,
    window: Option<Arc<Window>>,
}

impl ApplicationHandler for AppRunner {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.app.state() != AppState::None {
            return;
        }

        info!("Creating application state...");

        if let Err(e) = self.start(event_loop) {
            error!("Failed to initialize application: {e:#}");
            self.app.fail();
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                self.app.handle_signal(WindowSignal::CloseRequested);
                event_loop.exit();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let outcome = self.app.tick();
        if self.app.state() == AppState::Exiting {
            event_loop.exit();
        } else {
            event_loop.set_control_flow(control_flow_after(outcome, Instant::now()));
        }
    }
}

impl AppRunner {
    fn start(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let window_attrs = Window::default_attributes()
            .with_title(&self.config.title)
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height))
            .with_resizable(true);

        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .context("Failed to create window")?,
        );
        self.window = Some(Arc::clone(&window));

        let settings = self.config.render_settings();
        self.app
            .start(|| VulkanBackend::new(window, settings))
            .context("Failed to initialize engine")?;

        if let Some(summary) = self
            .app
            .engine()
            .renderer()
            .and_then(|renderer| renderer.backend().gpu_summary())
        {
            info!("GPU: {summary}");
        }
        info!("Application ready!");
        Ok(())
    }

    /// Shut the application down, then destroy the window.
    fn finish(mut self) -> AppExit {
        self.app.shutdown();
        self.window = None;
        self.app.exit()
    }
}
