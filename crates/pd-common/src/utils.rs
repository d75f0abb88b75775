//! Utility functions for the PD core

use crate::error::{PdError, Result};

/// Decode an 8-byte big-endian counter as stored in the KV store.
///
/// # Examples
///
/// ```
/// use pd_common::bytes_to_u64;
///
/// assert_eq!(bytes_to_u64(&[0, 0, 0, 0, 0, 0, 1, 0]).unwrap(), 256);
/// assert!(bytes_to_u64(&[1, 2, 3]).is_err());
/// ```
pub fn bytes_to_u64(b: &[u8]) -> Result<u64> {
    let bytes: [u8; 8] = b.try_into().map_err(|_| PdError::InvalidU64(b.len()))?;
    Ok(u64::from_be_bytes(bytes))
}

/// Encode a counter as 8 big-endian bytes.
pub fn u64_to_bytes(v: u64) -> Vec<u8> {
    v.to_be_bytes().to_vec()
}

/// Convert a camel-case name to a snake-case one.
///
/// # Examples
///
/// ```
/// use pd_common::convert_name;
///
/// assert_eq!(convert_name("AbcDef"), "abc_def");
/// assert_eq!(convert_name("maxPeerCount"), "max_peer_count");
/// ```
pub fn convert_name(s: &str) -> String {
    let mut name = String::with_capacity(s.len() + 8);
    for (i, c) in s.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                name.push('_');
            }
            name.push(c.to_ascii_lowercase());
        } else {
            name.push(c);
        }
    }
    name
}
