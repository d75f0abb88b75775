//! Error types for the PD core
//!
//! Every variant carries the operation, key, or endpoint it failed on so a
//! caller can reconstruct where a failure came from without a backtrace.

use std::time::Duration;

/// Error taxonomy shared by the RPC client and the KV accessor.
#[derive(Debug, thiserror::Error)]
pub enum PdError {
    #[error("invalid address '{addr}': {reason}")]
    InvalidAddress { addr: String, reason: String },

    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    #[error("stream closed before a full frame arrived")]
    StreamClosed,

    #[error("connect to {addr} failed: {last_error}")]
    AllEndpointsUnreachable { addr: String, last_error: String },

    #[error("rpc to {endpoint} failed: {reason}")]
    Rpc { endpoint: String, reason: String },

    #[error("invalid get value resp for key '{key}': {count} entries, must only one")]
    MultipleMatches { key: String, count: usize },

    #[error("decode value of key '{key}' failed: {source}")]
    Decode {
        key: String,
        #[source]
        source: prost::DecodeError,
    },

    #[error("kv store at {endpoint} not ready after {attempts} attempts: {source}")]
    NotReady {
        endpoint: String,
        attempts: u32,
        #[source]
        source: Box<PdError>,
    },

    #[error("{operation} exceeded timeout of {timeout:?}")]
    TimeoutExceeded {
        operation: String,
        timeout: Duration,
    },

    #[error("kv {operation} '{target}' failed: {source}")]
    Kv {
        operation: &'static str,
        target: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("invalid data, must 8 bytes, but {0}")]
    InvalidU64(usize),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl PdError {
    /// Build an `Rpc` error for the given endpoint.
    pub fn rpc(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        PdError::Rpc {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error came from an elapsed timeout budget.
    pub fn is_timeout(&self) -> bool {
        matches!(self, PdError::TimeoutExceeded { .. })
    }
}

pub type Result<T> = std::result::Result<T, PdError>;
