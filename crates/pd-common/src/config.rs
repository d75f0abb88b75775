//! Configuration for the PD core
//!
//! Settings are read from an optional file and `PD_`-prefixed environment
//! variables (e.g. `PD_LOG_LEVEL=debug`), environment taking precedence.

use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::Result;

/// Hard timeout applied to every KV get, status, and transaction.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Operations slower than this are logged, they do not fail.
pub const SLOW_REQUEST_TIME: Duration = Duration::from_secs(1);

pub const DEFAULT_READINESS_MAX_ATTEMPTS: u32 = 100;
pub const DEFAULT_READINESS_DELAY: Duration = Duration::from_millis(100);
pub const DEFAULT_RPC_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Timeout budget shared by every bounded KV operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestTimeouts {
    /// Operation fails with `TimeoutExceeded` past this
    pub request_timeout: Duration,
    /// Operation is logged as slow past this
    pub slow_request_time: Duration,
}

impl Default for RequestTimeouts {
    fn default() -> Self {
        Self {
            request_timeout: REQUEST_TIMEOUT,
            slow_request_time: SLOW_REQUEST_TIME,
        }
    }
}

/// Process configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PdConfig {
    /// Log level name (trace, debug, info, warn, error)
    pub log_level: String,
    /// Log file path; stderr when absent
    pub log_file: Option<String>,
    /// Client endpoints of the embedded KV store
    pub kv_endpoints: String,
    pub request_timeout_ms: u64,
    pub slow_request_ms: u64,
    pub readiness_max_attempts: u32,
    pub readiness_delay_ms: u64,
    pub rpc_connect_timeout_ms: u64,
}

impl Default for PdConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_file: None,
            kv_endpoints: "http://127.0.0.1:2379".to_string(),
            request_timeout_ms: REQUEST_TIMEOUT.as_millis() as u64,
            slow_request_ms: SLOW_REQUEST_TIME.as_millis() as u64,
            readiness_max_attempts: DEFAULT_READINESS_MAX_ATTEMPTS,
            readiness_delay_ms: DEFAULT_READINESS_DELAY.as_millis() as u64,
            rpc_connect_timeout_ms: DEFAULT_RPC_CONNECT_TIMEOUT.as_millis() as u64,
        }
    }
}

impl PdConfig {
    /// Load configuration from an optional file plus the environment.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path));
        }
        let settings = builder
            .add_source(Environment::with_prefix("PD").try_parsing(true))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn request_timeouts(&self) -> RequestTimeouts {
        RequestTimeouts {
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            slow_request_time: Duration::from_millis(self.slow_request_ms),
        }
    }

    pub fn readiness_delay(&self) -> Duration {
        Duration::from_millis(self.readiness_delay_ms)
    }

    pub fn rpc_connect_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_connect_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = PdConfig::default();
        assert_eq!(config.log_level, "info");
        assert!(config.log_file.is_none());
        assert_eq!(config.request_timeouts(), RequestTimeouts::default());
        assert_eq!(config.readiness_max_attempts, 100);
        assert_eq!(config.readiness_delay(), Duration::from_millis(100));
        assert_eq!(config.rpc_connect_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_default_timeouts() {
        let timeouts = RequestTimeouts::default();
        assert_eq!(timeouts.request_timeout, Duration::from_secs(10));
        assert_eq!(timeouts.slow_request_time, Duration::from_secs(1));
        assert!(timeouts.slow_request_time < timeouts.request_timeout);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "log_level = \"debug\"\nlog_file = \"/tmp/pd.log\"\nslow_request_ms = 250"
        )
        .unwrap();

        let config = PdConfig::load(file.path().to_str()).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_file.as_deref(), Some("/tmp/pd.log"));
        assert_eq!(
            config.request_timeouts().slow_request_time,
            Duration::from_millis(250)
        );
        // Unset keys keep their defaults
        assert_eq!(config.request_timeout_ms, 10_000);
    }

    #[test]
    fn test_load_missing_file_fails() {
        assert!(PdConfig::load(Some("/nonexistent/pd-config")).is_err());
    }
}
