//! # Constants
//!
//! Shared constants used throughout the controller.
//!
//! These values represent reasonable defaults and can be overridden via
//! environment variables where applicable.

/// Default HTTP server port for metrics, health probes and snapshot summaries
pub const DEFAULT_METRICS_PORT: u16 = 5000;

/// Default HTTP server startup timeout (how long to wait for server to be ready)
pub const DEFAULT_SERVER_STARTUP_TIMEOUT_SECS: u64 = 10;

/// Default HTTP server readiness poll interval
pub const DEFAULT_SERVER_POLL_INTERVAL_MS: u64 = 50;

/// Default Fibonacci backoff starting value for transient failures (milliseconds)
pub const DEFAULT_BACKOFF_START_MS: u64 = 1000;

/// Default Fibonacci backoff maximum value for transient failures (milliseconds)
pub const DEFAULT_BACKOFF_MAX_MS: u64 = 300_000;

/// Default delay before restarting watch stream after unknown errors (seconds)
pub const DEFAULT_WATCH_RESTART_DELAY_SECS: u64 = 5;

/// Default delay before restarting watch stream after it ends (seconds)
pub const DEFAULT_WATCH_RESTART_DELAY_AFTER_END_SECS: u64 = 1;

/// Default number of NodeConfigCache objects reconciled at the same time
pub const DEFAULT_MAX_CONCURRENT_RECONCILIATIONS: u16 = 10;

/// Field manager name used for status patches
pub const FIELD_MANAGER: &str = "xds-snapshot-controller";

/// Secret types that carry TLS material
pub const TLS_SECRET_TYPES: &[&str] = &["kubernetes.io/tls", "tls"];

/// Secret data keys holding the certificate chain, in lookup order
pub const TLS_CERTIFICATE_KEYS: &[&str] = &["tls.crt", "certificate"];

/// Secret data keys holding the private key, in lookup order
pub const TLS_PRIVATE_KEY_KEYS: &[&str] = &["tls.key", "privateKey"];
