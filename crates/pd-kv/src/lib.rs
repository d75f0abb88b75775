//! PD KV - disciplined access to the replicated metadata store
//!
//! This crate provides:
//! - `KvClient`, the interface of the replicated store, and an in-process
//!   implementation
//! - `KvAccessor` for timed gets, typed decoding, and status checks
//! - `SlowLogTxn` for conditional transactions with outcome metrics
//! - `ReadinessProbe` for waiting on the store at startup

pub mod accessor;
pub mod client;
pub mod memory;
pub mod metrics;
pub mod readiness;
pub mod txn;

pub use accessor::KvAccessor;
pub use client::{
    Compare, CompareOp, CompareTarget, GetOptions, GetResponse, KeyValue, KvClient, Op,
    OpResponse, StatusResponse, TxnRequest, TxnResponse,
};
pub use memory::MemoryKvClient;
pub use metrics::{NoopMetrics, TxnMetrics, TxnMetricsSink};
pub use readiness::{ReadinessProbe, wait_until_ready};
pub use txn::SlowLogTxn;
