//! Endpoint resolution
//!
//! Turns an address specification such as
//! `tcp://10.0.0.1:2379,unix:///var/run/pd.sock` into an ordered list of
//! candidate endpoints. Order is the client's fallback priority.

use std::fmt;

use pd_common::{PdError, Result};
use url::Url;

/// Separator between endpoints in one address specification.
pub const ENDPOINT_SEPARATOR: char = ',';

/// Transport an endpoint is reached over.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transport {
    Tcp,
    Unix,
}

/// Address scheme. The `s`-suffixed forms use the same transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scheme {
    Tcp,
    Tcps,
    Http,
    Https,
    Unix,
    Unixs,
}

impl Scheme {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Some(Scheme::Tcp),
            "tcps" => Some(Scheme::Tcps),
            "http" => Some(Scheme::Http),
            "https" => Some(Scheme::Https),
            "unix" => Some(Scheme::Unix),
            "unixs" => Some(Scheme::Unixs),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Tcp => "tcp",
            Scheme::Tcps => "tcps",
            Scheme::Http => "http",
            Scheme::Https => "https",
            Scheme::Unix => "unix",
            Scheme::Unixs => "unixs",
        }
    }

    pub fn transport(self) -> Transport {
        match self {
            Scheme::Unix | Scheme::Unixs => Transport::Unix,
            _ => Transport::Tcp,
        }
    }
}

/// One candidate the client may connect to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    pub scheme: Scheme,
    /// `host:port` for network transports, a filesystem path for unix ones
    pub address: String,
}

impl Endpoint {
    pub fn transport(&self) -> Transport {
        self.scheme.transport()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme.as_str(), self.address)
    }
}

/// Parse an address specification into its endpoints, in input order.
pub fn parse_urls(addrs: &str) -> Result<Vec<Endpoint>> {
    if addrs.trim().is_empty() {
        return Err(invalid(addrs, "empty address"));
    }

    addrs.split(ENDPOINT_SEPARATOR)
        .map(|item| parse_endpoint(item.trim()).map_err(|reason| invalid(addrs, &reason)))
        .collect()
}

fn parse_endpoint(item: &str) -> std::result::Result<Endpoint, String> {
    if item.is_empty() {
        return Err("empty endpoint".to_string());
    }

    let (scheme, rest) = item
        .split_once("://")
        .ok_or_else(|| format!("missing scheme in '{}'", item))?;
    let scheme =
        Scheme::parse(scheme).ok_or_else(|| format!("unsupported scheme '{}'", scheme))?;

    match scheme.transport() {
        Transport::Unix => {
            if rest.is_empty() {
                return Err(format!("missing socket path in '{}'", item));
            }
            Ok(Endpoint {
                scheme,
                address: rest.to_string(),
            })
        }
        Transport::Tcp => {
            let url = Url::parse(item).map_err(|e| format!("'{}': {}", item, e))?;
            let host = url
                .host_str()
                .filter(|h| !h.is_empty())
                .ok_or_else(|| format!("missing host in '{}'", item))?;
            let port = url
                .port_or_known_default()
                .ok_or_else(|| format!("missing port in '{}'", item))?;
            if !matches!(url.path(), "" | "/") {
                return Err(format!("unexpected path in '{}'", item));
            }
            Ok(Endpoint {
                scheme,
                address: format!("{}:{}", host, port),
            })
        }
    }
}

fn invalid(addrs: &str, reason: &str) -> PdError {
    PdError::InvalidAddress {
        addr: addrs.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_tcp() {
        let endpoints = parse_urls("tcp://127.0.0.1:2379").unwrap();
        assert_eq!(
            endpoints,
            vec![Endpoint {
                scheme: Scheme::Tcp,
                address: "127.0.0.1:2379".to_string(),
            }]
        );
        assert_eq!(endpoints[0].transport(), Transport::Tcp);
        assert_eq!(endpoints[0].to_string(), "tcp://127.0.0.1:2379");
    }

    #[test]
    fn test_parse_keeps_order_and_duplicates() {
        let addrs = "unix:///tmp/pd.sock, tcp://10.0.0.1:2379,tcps://10.0.0.2:2379,tcp://10.0.0.1:2379";
        let endpoints = parse_urls(addrs).unwrap();
        let addrs: Vec<_> = endpoints.iter().map(|e| e.address.as_str()).collect();
        assert_eq!(
            addrs,
            vec!["/tmp/pd.sock", "10.0.0.1:2379", "10.0.0.2:2379", "10.0.0.1:2379"]
        );
        assert_eq!(endpoints[0].transport(), Transport::Unix);
        assert_eq!(endpoints[2].scheme, Scheme::Tcps);
        assert_eq!(endpoints[2].transport(), Transport::Tcp);
    }

    #[test]
    fn test_parse_unix_variants() {
        let endpoints = parse_urls("unix://localhost:1234,unixs://pd.sock").unwrap();
        assert_eq!(endpoints[0].address, "localhost:1234");
        assert_eq!(endpoints[1].scheme, Scheme::Unixs);
        assert_eq!(endpoints[1].transport(), Transport::Unix);
    }

    #[test]
    fn test_parse_http_and_ipv6() {
        let endpoints = parse_urls("http://[::1]:2379,HTTPS://pd-0.pd:2380/").unwrap();
        assert_eq!(endpoints[0].address, "[::1]:2379");
        assert_eq!(endpoints[1].scheme, Scheme::Https);
        assert_eq!(endpoints[1].address, "pd-0.pd:2380");
    }

    #[test]
    fn test_parse_invalid() {
        for addrs in [
            "",
            "   ",
            "127.0.0.1:2379",
            "ftp://127.0.0.1:21",
            "tcp://127.0.0.1",
            "tcp://:2379",
            "tcp://127.0.0.1:99999",
            "tcp://127.0.0.1:2379/pd",
            "unix://",
            "tcp://127.0.0.1:2379,",
            "tcp://127.0.0.1:2379,,tcp://127.0.0.1:2380",
        ] {
            let err = parse_urls(addrs).unwrap_err();
            assert!(
                matches!(err, PdError::InvalidAddress { .. }),
                "expected InvalidAddress for {:?}, got {:?}",
                addrs,
                err
            );
        }
    }
}
