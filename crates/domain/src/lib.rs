//! # zonehub-domain
//!
//! Pure domain model for the zonehub zoned HVAC control system.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Rooms** (occupancy sensors, temperature sensors, vents)
//! - Define **Contact sensors** and the pause state they drive
//! - Define **Policies** (eco critical tracking, selected-room tracking)
//! - Define **Entry configuration** (one thermostat + its rooms and settings)
//! - Define **Evaluations** (the per-cycle room classification record)
//! - Define host-facing **Snapshots** and **State changes**
//! - Contain all invariant enforcement and configuration validation
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod contact;
pub mod entry;
pub mod evaluation;
pub mod mode;
pub mod notify;
pub mod occupancy;
pub mod persistence;
pub mod policy;
pub mod room;
pub mod settings;
pub mod snapshot;
