//! # Controller Configuration
//!
//! Process-wide knobs for the snapshot controller. Every field has a default
//! and an environment variable override; the deployment feeds them from a
//! ConfigMap through `envFrom`.

use crate::snapshot::PublishPolicy;
use std::time::Duration;

/// Output format of controller logs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Json,
    Text,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "text" | "plain" => Ok(LogFormat::Text),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

/// Runtime settings shared by the watch loop, reconciler and HTTP server
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// HTTP port for metrics, probes and snapshot summaries
    pub metrics_port: u16,
    /// Namespace to watch; all namespaces when unset
    pub watch_namespace: Option<String>,
    /// Fibonacci backoff starting value for transient failures (milliseconds)
    pub backoff_start_ms: u64,
    /// Fibonacci backoff maximum value (milliseconds)
    pub backoff_max_ms: u64,
    /// Pause before restarting a watch that failed with an unclassified error (seconds)
    pub watch_restart_delay_secs: u64,
    /// Pause before restarting a watch whose stream ended cleanly (seconds)
    pub watch_restart_delay_after_end_secs: u64,
    /// Upper bound on reconciliations running at once across all nodes
    pub max_concurrent_reconciliations: u16,
    /// Global log level filter, used when `RUST_LOG` is unset
    pub log_level: String,
    pub log_format: LogFormat,
    /// Republish when only the spec version changed
    /// Off by default: publication follows resource content
    pub publish_on_version_change: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        use crate::constants::*;
        Self {
            metrics_port: DEFAULT_METRICS_PORT,
            watch_namespace: None,
            backoff_start_ms: DEFAULT_BACKOFF_START_MS,
            backoff_max_ms: DEFAULT_BACKOFF_MAX_MS,
            watch_restart_delay_secs: DEFAULT_WATCH_RESTART_DELAY_SECS,
            watch_restart_delay_after_end_secs: DEFAULT_WATCH_RESTART_DELAY_AFTER_END_SECS,
            max_concurrent_reconciliations: DEFAULT_MAX_CONCURRENT_RECONCILIATIONS,
            log_level: "info".to_string(),
            log_format: LogFormat::Json,
            publish_on_version_change: false,
        }
    }
}

impl ControllerConfig {
    /// Read overrides from the process environment; unparsable values keep the default
    pub fn from_env() -> Self {
        use crate::constants::*;
        Self {
            metrics_port: env_var_or_default("METRICS_PORT", DEFAULT_METRICS_PORT),
            watch_namespace: std::env::var("WATCH_NAMESPACE")
                .ok()
                .filter(|ns| !ns.trim().is_empty()),
            backoff_start_ms: env_var_or_default("BACKOFF_START_MS", DEFAULT_BACKOFF_START_MS),
            backoff_max_ms: env_var_or_default("BACKOFF_MAX_MS", DEFAULT_BACKOFF_MAX_MS),
            watch_restart_delay_secs: env_var_or_default(
                "WATCH_RESTART_DELAY_SECS",
                DEFAULT_WATCH_RESTART_DELAY_SECS,
            ),
            watch_restart_delay_after_end_secs: env_var_or_default(
                "WATCH_RESTART_DELAY_AFTER_END_SECS",
                DEFAULT_WATCH_RESTART_DELAY_AFTER_END_SECS,
            ),
            max_concurrent_reconciliations: env_var_or_default(
                "MAX_CONCURRENT_RECONCILIATIONS",
                DEFAULT_MAX_CONCURRENT_RECONCILIATIONS,
            ),
            log_level: env_var_or_default_str("LOG_LEVEL", "info"),
            log_format: env_var_or_default("LOG_FORMAT", LogFormat::Json),
            publish_on_version_change: env_var_or_default_bool("PUBLISH_ON_VERSION_CHANGE", false),
        }
    }

    pub fn backoff_start_duration(&self) -> Duration {
        Duration::from_millis(self.backoff_start_ms)
    }

    pub fn backoff_max_duration(&self) -> Duration {
        Duration::from_millis(self.backoff_max_ms)
    }

    /// Delay applied after a watch error that is neither throttling nor a missing CRD
    pub fn watch_restart_delay_duration(&self) -> Duration {
        Duration::from_secs(self.watch_restart_delay_secs)
    }

    pub fn watch_restart_delay_after_end_duration(&self) -> Duration {
        Duration::from_secs(self.watch_restart_delay_after_end_secs)
    }

    pub fn publish_policy(&self) -> PublishPolicy {
        if self.publish_on_version_change {
            PublishPolicy::ContentOrVersionChange
        } else {
            PublishPolicy::ContentChange
        }
    }
}

/// Parsed value of `key`, or `default` when unset or malformed
fn env_var_or_default<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_var_or_default_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|v| parse_bool(&v))
        .unwrap_or(default)
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

fn env_var_or_default_str(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_publish_on_content_only() {
        let config = ControllerConfig::default();
        assert_eq!(config.publish_policy(), PublishPolicy::ContentChange);
        assert_eq!(config.backoff_start_duration(), Duration::from_secs(1));
    }

    #[test]
    fn test_version_change_switch() {
        let config = ControllerConfig {
            publish_on_version_change: true,
            ..ControllerConfig::default()
        };
        assert_eq!(config.publish_policy(), PublishPolicy::ContentOrVersionChange);
    }

    #[test]
    fn test_parse_bool_variants() {
        for value in ["true", "TRUE", "1", "yes", "on"] {
            assert!(parse_bool(value), "{value}");
        }
        for value in ["false", "0", "no", ""] {
            assert!(!parse_bool(value), "{value}");
        }
    }

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("text".parse::<LogFormat>(), Ok(LogFormat::Text));
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
