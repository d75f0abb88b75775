//! Startup readiness probing
//!
//! The embedded store may still be starting when PD comes up, so startup
//! polls its status at a fixed delay with a fixed attempt cap.

use std::time::Duration;

use pd_common::config::{DEFAULT_READINESS_DELAY, DEFAULT_READINESS_MAX_ATTEMPTS};
use pd_common::{PdConfig, PdError, Result};
use tracing::{debug, info};

use crate::accessor::KvAccessor;

/// Fixed-delay, fixed-count status polling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReadinessProbe {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for ReadinessProbe {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_READINESS_MAX_ATTEMPTS,
            delay: DEFAULT_READINESS_DELAY,
        }
    }
}

impl ReadinessProbe {
    pub fn from_config(config: &PdConfig) -> Self {
        Self {
            max_attempts: config.readiness_max_attempts,
            delay: config.readiness_delay(),
        }
    }

    /// Poll until the store answers a status request for `endpoint`.
    ///
    /// Fails with `NotReady`, carrying the last error, once every attempt
    /// has failed. There is no sleep after the final attempt.
    pub async fn wait_until_ready(&self, accessor: &KvAccessor, endpoint: &str) -> Result<()> {
        let max_attempts = self.max_attempts.max(1);

        let mut attempt = 1;
        loop {
            match accessor.endpoint_status(endpoint).await {
                Ok(status) => {
                    info!(
                        endpoint = %endpoint,
                        attempt,
                        version = %status.version,
                        "KV store is ready"
                    );
                    return Ok(());
                }
                Err(e) if attempt >= max_attempts => {
                    return Err(PdError::NotReady {
                        endpoint: endpoint.to_string(),
                        attempts: max_attempts,
                        source: Box::new(e),
                    });
                }
                Err(e) => {
                    debug!(endpoint = %endpoint, attempt, error = %e, "KV store not ready yet");
                }
            }

            tokio::time::sleep(self.delay).await;
            attempt += 1;
        }
    }
}

/// Wait for the store with the default probe (100 attempts, 100ms apart).
pub async fn wait_until_ready(accessor: &KvAccessor, endpoint: &str) -> Result<()> {
    ReadinessProbe::default()
        .wait_until_ready(accessor, endpoint)
        .await
}
