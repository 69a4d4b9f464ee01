//! # Observability
//!
//! Prometheus metrics and log setup.
//!
//! - `metrics`: Prometheus metrics collection
//! - `logging`: `tracing` subscriber initialization

pub mod logging;
pub mod metrics;
