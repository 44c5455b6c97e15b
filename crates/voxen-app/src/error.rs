//! Application error types.

use thiserror::Error;
use voxen_gpu::GpuError;

use crate::state::AppState;

/// Application-level errors.
#[derive(Error, Debug)]
pub enum AppError {
    /// The lifecycle was asked to move backwards or skip a state.
    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition { from: AppState, to: AppState },

    /// Graphics bring-up or a frame failed.
    #[error(transparent)]
    Gpu(#[from] GpuError),

    /// The event loop could not be created or failed while running.
    #[error("Event loop error: {0}")]
    EventLoop(String),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, AppError>;
