//! Timed access to the metadata KV store
//!
//! Every call runs under the request timeout budget and is logged when it
//! crosses the slow-request threshold, whether it succeeded or not.

use std::future::Future;
use std::sync::Arc;

use pd_common::{PdError, RequestTimeouts, Result, bytes_to_u64};
use prost::Message;
use tokio::time::Instant;
use tracing::warn;

use crate::client::{GetOptions, GetResponse, KvClient, StatusResponse};
use crate::metrics::{NoopMetrics, TxnMetricsSink};
use crate::txn::SlowLogTxn;

/// Accessor over a shared KV client.
///
/// Cloning is cheap; clones share the client and the metrics sink.
#[derive(Clone)]
pub struct KvAccessor {
    client: Arc<dyn KvClient>,
    timeouts: RequestTimeouts,
    metrics: Arc<dyn TxnMetricsSink>,
}

impl KvAccessor {
    pub fn new(client: Arc<dyn KvClient>) -> Self {
        Self {
            client,
            timeouts: RequestTimeouts::default(),
            metrics: Arc::new(NoopMetrics),
        }
    }

    pub fn with_timeouts(mut self, timeouts: RequestTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn TxnMetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn client(&self) -> &Arc<dyn KvClient> {
        &self.client
    }

    pub fn timeouts(&self) -> RequestTimeouts {
        self.timeouts
    }

    /// Raw get under the timeout budget.
    pub async fn kv_get(&self, key: &str, options: GetOptions) -> Result<GetResponse> {
        let start = Instant::now();
        let deadline = start + self.timeouts.request_timeout;
        let result = bounded(
            "get",
            key,
            deadline,
            self.timeouts,
            self.client.get(key.as_bytes(), options),
        )
        .await;

        let cost = start.elapsed();
        if cost > self.timeouts.slow_request_time {
            warn!(
                key = %key,
                resp = ?result.as_ref().ok(),
                error = ?result.as_ref().err(),
                cost = ?cost,
                "kv gets too slow"
            );
        }

        result
    }

    /// Value stored at `key`, `None` when the key is absent.
    pub async fn get_value(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.get_value_with(key, GetOptions::default()).await
    }

    /// Like [`get_value`](Self::get_value) with explicit options. More than
    /// one match is a data-integrity error, not a not-found.
    pub async fn get_value_with(&self, key: &str, options: GetOptions) -> Result<Option<Vec<u8>>> {
        let resp = self.kv_get(key, options).await?;

        match resp.kvs.len() {
            0 => Ok(None),
            1 => Ok(resp.kvs.into_iter().next().map(|kv| kv.value)),
            count => Err(PdError::MultipleMatches {
                key: key.to_string(),
                count,
            }),
        }
    }

    /// Decode the message stored at `key`, `None` when the key is absent.
    pub async fn get_proto_msg<M: Message + Default>(&self, key: &str) -> Result<Option<M>> {
        let Some(value) = self.get_value(key).await? else {
            return Ok(None);
        };

        M::decode(value.as_slice())
            .map(Some)
            .map_err(|source| PdError::Decode {
                key: key.to_string(),
                source,
            })
    }

    /// Read an 8-byte big-endian counter, `None` when the key is absent.
    pub async fn get_u64(&self, key: &str) -> Result<Option<u64>> {
        self.get_value(key)
            .await?
            .map(|value| bytes_to_u64(&value))
            .transpose()
    }

    /// Status of the store member serving `endpoint`.
    pub async fn endpoint_status(&self, endpoint: &str) -> Result<StatusResponse> {
        let start = Instant::now();
        let deadline = start + self.timeouts.request_timeout;
        let result = bounded(
            "status",
            endpoint,
            deadline,
            self.timeouts,
            self.client.status(endpoint),
        )
        .await;

        let cost = start.elapsed();
        if cost > self.timeouts.slow_request_time {
            warn!(
                endpoint = %endpoint,
                resp = ?result.as_ref().ok(),
                error = ?result.as_ref().err(),
                cost = ?cost,
                "check kv store status too slow"
            );
        }

        result
    }

    /// Start a transaction. Its timeout budget starts now.
    pub fn txn(&self) -> SlowLogTxn {
        SlowLogTxn::new(self.client.clone(), self.timeouts, self.metrics.clone())
    }
}

/// Run a store call until `deadline`, wrapping failures with their context.
pub(crate) async fn bounded<T, F>(
    operation: &'static str,
    target: &str,
    deadline: Instant,
    timeouts: RequestTimeouts,
    call: F,
) -> Result<T>
where
    F: Future<Output = anyhow::Result<T>>,
{
    match tokio::time::timeout_at(deadline, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(source)) => Err(PdError::Kv {
            operation,
            target: target.to_string(),
            source,
        }),
        Err(_) => Err(PdError::TimeoutExceeded {
            operation: format!("kv {} '{}'", operation, target),
            timeout: timeouts.request_timeout,
        }),
    }
}
