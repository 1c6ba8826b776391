//! # zonehub-adapter-http-axum
//!
//! HTTP surface for the control loop: the `pause`/`resume`/`recalculate`
//! operations and read-only status projections, served over a REST API.

pub mod api;
pub mod router;
pub mod state;
