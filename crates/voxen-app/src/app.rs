//! Platform-independent application logic.

use std::process::ExitCode;

use tracing::info;
use voxen_render::{DrawOutcome, RenderBackend};

use crate::engine::Engine;
use crate::error::Result;
use crate::state::{AppState, Lifecycle};

/// A request coming from the window system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowSignal {
    /// The user closed the window, or the window was destroyed.
    CloseRequested,
}

/// How the process should end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppExit {
    /// Clean exit, status 0.
    #[default]
    Success,
    /// Bring-up or a frame failed, status 1.
    Failure,
}

impl AppExit {
    /// Process exit status.
    pub const fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
        }
    }
}

impl From<AppExit> for ExitCode {
    fn from(exit: AppExit) -> Self {
        Self::from(exit.code())
    }
}

/// Owns the engine and drives it through the application lifecycle.
pub struct Application<B: RenderBackend> {
    lifecycle: Lifecycle,
    engine: Engine<B>,
    exit: AppExit,
    shut_down: bool,
}

impl<B: RenderBackend> Default for Application<B> {
    fn default() -> Self {
        Self {
            lifecycle: Lifecycle::new(),
            engine: Engine::new(),
            exit: AppExit::Success,
            shut_down: false,
        }
    }
}

impl<B: RenderBackend> Application<B> {
    /// Create an application in [`AppState::None`] with no renderer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the backend and initialize the engine on it.
    ///
    /// Moves to `Running` on success. On failure the application moves
    /// straight to `Exiting` with [`AppExit::Failure`] and the error is
    /// returned.
    pub fn start<F>(&mut self, make_backend: F) -> Result<()>
    where
        F: FnOnce() -> voxen_gpu::Result<B>,
    {
        self.lifecycle.advance(AppState::Starting)?;

        let started = make_backend().and_then(|backend| self.engine.initialize(backend));
        if let Err(e) = started {
            self.fail();
            return Err(e.into());
        }

        self.lifecycle.advance(AppState::Running)?;
        info!("Application running");
        Ok(())
    }

    /// React to a window-system signal.
    pub fn handle_signal(&mut self, signal: WindowSignal) {
        match signal {
            WindowSignal::CloseRequested => {
                if self.lifecycle.state() != AppState::Exiting {
                    info!("Close requested");
                    self.lifecycle.exit();
                }
            }
        }
    }

    /// Run one iteration of the main loop. Only ticks while `Running`.
    ///
    /// Returns what the renderer did, or `None` if nothing was drawn. A
    /// failed frame ends the session with [`AppExit::Failure`].
    pub fn tick(&mut self) -> Option<DrawOutcome> {
        if self.lifecycle.state() != AppState::Running {
            return None;
        }

        match self.engine.tick() {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Frame failed: {e}");
                self.fail();
                None
            }
        }
    }

    /// Mark the session as failed and stop the loop.
    pub fn fail(&mut self) {
        self.exit = AppExit::Failure;
        self.lifecycle.exit();
    }

    /// Tear the engine down. Only the first call does anything.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.lifecycle.exit();
        self.engine.shutdown();
        info!("Application shut down ({:?})", self.exit);
    }

    /// Current lifecycle state.
    pub const fn state(&self) -> AppState {
        self.lifecycle.state()
    }

    /// How the process should end.
    pub const fn exit(&self) -> AppExit {
        self.exit
    }

    /// Get the engine.
    pub const fn engine(&self) -> &Engine<B> {
        &self.engine
    }
}
