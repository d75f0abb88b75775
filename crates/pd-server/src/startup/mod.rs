//! Startup: log sink, embedded component log bridge, and bootstrap

pub mod bootstrap;
pub mod log_bridge;
pub mod logging;

pub use bootstrap::{PdCore, bootstrap, kv_endpoints};
pub use log_bridge::{ComponentLevel, ComponentOutput, LogBridge, is_fatal, sink_level};
pub use logging::{LogConfig, LogRotation, LoggingGuard, init_logger};
