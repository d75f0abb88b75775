//! PD Server - process startup around the metadata and RPC core
//!
//! This crate provides:
//! - Log sink initialization (stderr or a rolling file)
//! - The bridge that routes the embedded KV component's logs into the sink
//! - Bootstrap: version banner, accessor wiring, and KV readiness

pub mod startup;

pub use startup::{
    ComponentLevel, ComponentOutput, LogBridge, LogConfig, LoggingGuard, PdCore, bootstrap,
    init_logger,
};
