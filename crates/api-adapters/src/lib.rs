//! # api-adapters
//!
//! The HTTP surface of Inkwell. [`AppState`] wires the services over a set of
//! ports; the axum router (feature `web-axum`) maps JSON requests onto them.

pub mod metrics;
pub mod state;
#[cfg(feature = "web-axum")]
pub mod web;

pub use metrics::Metrics;
pub use state::{AppState, PageLimits, Ports};
#[cfg(feature = "web-axum")]
pub use web::{build_router, ApiError};
