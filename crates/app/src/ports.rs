//! Ports — traits the host platform adapters implement.

mod host;
mod service;
mod store;

pub use host::{ClimateCommands, Notifier, StateProvider, VentCommands};
pub use service::ControlService;
pub use store::StateStore;
