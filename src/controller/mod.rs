//! # Controller
//!
//! Core controller modules for the xDS snapshot controller.
//!
//! - `backoff`: Fibonacci backoff mechanism for retries
//! - `reconciler`: Core reconciliation logic
//! - `server`: HTTP server for metrics, health checks and snapshot inspection

pub mod backoff;
pub mod reconciler;
pub mod server;
