//! Application shell for the Voxen engine.
//!
//! This crate provides:
//! - The application lifecycle state machine
//! - The [`Engine`], which owns the renderer and forwards ticks to it
//! - The [`Application`], which owns the engine and reacts to window signals
//! - [`run_app`], the winit event loop driving all of the above
//!
//! # Example
//!
//! ```no_run
//! use voxen_app::{run_app, AppConfig};
//!
//! fn main() -> std::process::ExitCode {
//!     run_app(AppConfig::default()).into()
//! }
//! ```

mod app;
mod engine;
mod error;
mod runner;
mod state;

pub use app::{AppExit, Application, WindowSignal};
pub use engine::Engine;
pub use error::{AppError, Result};
pub use runner::{run_app, AppConfig};
pub use state::{AppState, Lifecycle};
