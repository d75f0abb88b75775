//! Process bootstrap
//!
//! Brings up the KV accessor with its metrics and blocks until the embedded
//! store answers a status request.

use std::sync::Arc;

use anyhow::Context;
use pd_common::{PdConfig, print_pd_info};
use pd_kv::{KvAccessor, KvClient, ReadinessProbe, TxnMetrics};
use pd_rpc::{RpcClient, RpcClientConfig, parse_urls};
use prometheus::Registry;
use tracing::info;

/// Everything the rest of the process needs from startup.
pub struct PdCore {
    pub accessor: KvAccessor,
    pub rpc: RpcClient,
    pub metrics: TxnMetrics,
    pub registry: Registry,
}

impl PdCore {
    /// Prometheus text exposition of every registered metric.
    pub fn metrics_text(&self) -> Result<String, prometheus::Error> {
        pd_kv::metrics::gather(&self.registry)
    }
}

/// The configured KV client endpoints, in order.
///
/// Every item must be a valid endpoint address; the list may not be empty.
pub fn kv_endpoints(config: &PdConfig) -> anyhow::Result<Vec<String>> {
    parse_urls(&config.kv_endpoints).context("invalid kv_endpoints")?;

    Ok(config
        .kv_endpoints
        .split(',')
        .map(|e| e.trim().to_string())
        .collect())
}

/// The endpoint readiness is probed against: the first configured one.
pub fn probe_endpoint(config: &PdConfig) -> anyhow::Result<String> {
    kv_endpoints(config)?
        .into_iter()
        .next()
        .context("no KV endpoint configured")
}

/// Print the version banner, wire the accessor, and wait for the store.
pub async fn bootstrap(config: &PdConfig, kv: Arc<dyn KvClient>) -> anyhow::Result<PdCore> {
    print_pd_info();

    let registry = Registry::new();
    let metrics = TxnMetrics::new(&registry).context("failed to register txn metrics")?;

    let accessor = KvAccessor::new(kv)
        .with_timeouts(config.request_timeouts())
        .with_metrics(Arc::new(metrics.clone()));

    let endpoint = probe_endpoint(config)?;
    ReadinessProbe::from_config(config)
        .wait_until_ready(&accessor, &endpoint)
        .await
        .with_context(|| format!("KV store at {} did not become ready", endpoint))?;

    info!(endpoint = %endpoint, "PD core started");

    Ok(PdCore {
        accessor,
        rpc: RpcClient::new(RpcClientConfig::from_config(config)),
        metrics,
        registry,
    })
}
