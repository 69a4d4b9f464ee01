//! # Runtime
//!
//! Controller runtime: startup wiring, the watch loop and the error policy.

pub mod error_policy;
pub mod initialization;
pub mod watch_loop;
