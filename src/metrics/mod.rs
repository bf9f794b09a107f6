//! Metrics registry wiring and HTTP exposition.
//!
//! The certificate collector is handed to an explicit [`prometheus::Registry`]
//! (no process-wide default registry is involved) and the registry is served
//! in the Prometheus text format by [`MetricsServer`].
//!
//! # Submodules
//!
//! - `prom` - registry construction and text encoding
//! - `server` - axum HTTP server exposing `/metrics`

pub mod prom;
pub mod server;

pub use prom::{build_registry, encode};
pub use server::MetricsServer;
