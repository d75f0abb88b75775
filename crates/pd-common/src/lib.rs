//! PD Common - shared types for the PD metadata and RPC core
//!
//! This crate provides:
//! - `PdError`, the error taxonomy used by every component
//! - `PdConfig` and the request timeout budget
//! - Counter encoding and naming helpers
//! - The version banner

pub mod config;
pub mod error;
pub mod utils;
pub mod version;

// Re-exports for convenience
pub use config::{PdConfig, REQUEST_TIMEOUT, RequestTimeouts, SLOW_REQUEST_TIME};
pub use error::{PdError, Result};
pub use utils::{bytes_to_u64, convert_name, u64_to_bytes};
pub use version::print_pd_info;
