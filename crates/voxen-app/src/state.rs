//! Application lifecycle state machine.

use crate::error::{AppError, Result};

/// Where the application is in its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum AppState {
    /// Nothing has happened yet.
    #[default]
    None,
    /// The window and engine are being created.
    Starting,
    /// The main loop is ticking the engine.
    Running,
    /// The loop is done; shutdown follows. Terminal.
    Exiting,
}

/// Forward-only lifecycle: `None → Starting → Running → Exiting`.
///
/// `Exiting` may be entered from any earlier state, so a failed start never
/// passes through `Running`.
#[derive(Debug, Default)]
pub struct Lifecycle {
    state: AppState,
}

impl Lifecycle {
    /// Start in [`AppState::None`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub const fn state(&self) -> AppState {
        self.state
    }

    /// Whether `from → to` is a legal transition.
    pub const fn can_advance(from: AppState, to: AppState) -> bool {
        matches!(
            (from, to),
            (AppState::None, AppState::Starting)
                | (AppState::Starting, AppState::Running)
                | (
                    AppState::None | AppState::Starting | AppState::Running,
                    AppState::Exiting
                )
        )
    }

    /// Move to `to`, rejecting anything that is not a forward transition.
    pub fn advance(&mut self, to: AppState) -> Result<()> {
        if !Self::can_advance(self.state, to) {
            return Err(AppError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        tracing::debug!("App state: {:?} -> {:?}", self.state, to);
        self.state = to;
        Ok(())
    }

    /// Move to [`AppState::Exiting`] unless already there.
    pub fn exit(&mut self) {
        if self.state != AppState::Exiting {
            tracing::debug!("App state: {:?} -> Exiting", self.state);
            self.state = AppState::Exiting;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [AppState; 4] = [
        AppState::None,
        AppState::Starting,
        AppState::Running,
        AppState::Exiting,
    ];

    #[test]
    fn happy_path_moves_forward() {
        let mut lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.state(), AppState::None);
        lifecycle.advance(AppState::Starting).unwrap();
        lifecycle.advance(AppState::Running).unwrap();
        lifecycle.advance(AppState::Exiting).unwrap();
        assert_eq!(lifecycle.state(), AppState::Exiting);
    }

    #[test]
    fn transitions_never_go_backwards() {
        for from in ALL {
            for to in ALL {
                if Lifecycle::can_advance(from, to) {
                    assert!(to > from, "{from:?} -> {to:?} should not be allowed");
                }
            }
        }
    }

    #[test]
    fn exiting_is_terminal() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.exit();
        for to in ALL {
            assert!(lifecycle.advance(to).is_err());
            assert_eq!(lifecycle.state(), AppState::Exiting);
        }
        lifecycle.exit();
        assert_eq!(lifecycle.state(), AppState::Exiting);
    }

    #[test]
    fn running_requires_starting() {
        let mut lifecycle = Lifecycle::new();
        let err = lifecycle.advance(AppState::Running).unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidTransition {
                from: AppState::None,
                to: AppState::Running
            }
        ));
    }
}
