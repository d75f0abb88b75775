//! PD RPC - request/response client for peer control ports
//!
//! This crate provides:
//! - Endpoint resolution from comma-separated address specifications
//! - Length-delimited framing with a correlation id per message
//! - A client that falls back across candidates until one is reachable

pub mod client;
pub mod codec;
pub mod endpoint;

pub use client::{PD_RPC_PREFIX, RpcClient, RpcClientConfig, RpcStream, rpc_request};
pub use codec::{decode_frame, encode_frame, read_message, write_message};
pub use endpoint::{Endpoint, Scheme, Transport, parse_urls};
