//! Shared application state for axum handlers.

use std::sync::Arc;

use zonehub_app::ports::ControlService;

/// Application state shared across all axum handlers.
///
/// Generic over the control service to avoid dynamic dispatch. `Clone` is
/// implemented manually so the service itself does not need to be `Clone` —
/// only the `Arc` wrapper is cloned.
pub struct AppState<CS> {
    /// The per-entry control operations and status surface.
    pub control: Arc<CS>,
}

impl<CS> Clone for AppState<CS> {
    fn clone(&self) -> Self {
        Self {
            control: Arc::clone(&self.control),
        }
    }
}

impl<CS> AppState<CS>
where
    CS: ControlService + Send + Sync + 'static,
{
    /// Create application state from a control service instance.
    pub fn new(control: CS) -> Self {
        Self {
            control: Arc::new(control),
        }
    }

    /// Create application state from a pre-wrapped `Arc` service.
    pub fn from_arc(control: Arc<CS>) -> Self {
        Self { control }
    }
}
