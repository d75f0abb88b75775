//! PD Proto - wire and storage messages
//!
//! Messages are declared with `prost` derives so the envelope, the PD
//! request/response union, and the stored metadata share one encoding.
//! - `msgpb`: the envelope carried by every RPC frame
//! - `pdpb`: PD commands and their responses
//! - `metapb`: cluster metadata persisted in the KV store

pub mod metapb;
pub mod msgpb;
pub mod pdpb;
