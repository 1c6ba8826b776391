//! # zonehub-app
//!
//! Application core for the zonehub control loop.
//!
//! ## Responsibilities
//! - Define **ports** (traits) for everything the host platform provides:
//!   state reads, actuator commands, notifications, persistence
//! - The **timer arena**: every delayed action as a cancelable deadline
//! - The **contact monitor**: the pause/resume state machine
//! - The **occupancy tracker**: occupied → active with grace periods
//! - The **classifier**: satiation and critical-temperature judgement
//! - The **inclusion policy**: the eco × TSR × FTCR rule pipeline
//! - The **decision engine**: run/idle with cycle protection
//! - The **vent selector**: desired-open sets, delays, debounce, and the
//!   minimum-vents-open floor
//! - The **coordinator**: one per configuration entry, serialising all
//!   events and owning every piece of state above
//! - The **runtime**: the per-entry task, command channel, and registry
//!   the daemon and HTTP surface talk to
//!
//! ## Dependency rule
//! This crate depends only on `zonehub-domain`. Adapters implement the port
//! traits; the binary crate wires them together.

pub mod ports;

pub mod classify;
pub mod contact;
pub mod coordinator;
pub mod engine;
pub mod inclusion;
pub mod occupancy;
pub mod runtime;
pub mod status;
pub mod timers;
pub mod vents;
