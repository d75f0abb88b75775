//! RPC client for PD peer control ports
//!
//! One call owns one connection. Candidates are tried in order: connect,
//! send the preflight that routes the connection to the RPC handler, then
//! send the request frame. A candidate failing any of these steps is dropped
//! and the next one is tried. The first candidate that takes the request is
//! the only one read from.

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use pd_common::{PdConfig, PdError, Result, config::DEFAULT_RPC_CONNECT_TIMEOUT, REQUEST_TIMEOUT};
use pd_proto::msgpb::{self, MessageType};
use pd_proto::pdpb;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpStream, UnixStream};
use tracing::{debug, warn};

use crate::codec::{encode_frame, read_message};
use crate::endpoint::{Endpoint, Transport, parse_urls};

/// Path the server routes to its RPC handler.
pub const PD_RPC_PREFIX: &str = "/pd/rpc";

/// A byte stream a call can run over.
pub trait RpcStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> RpcStream for T {}

/// Configuration for the RPC client.
#[derive(Clone, Debug)]
pub struct RpcClientConfig {
    /// Bound on connecting plus sending the preflight, per candidate
    pub connect_timeout: Duration,
    /// Bound on sending the request, and separately on receiving its response
    pub io_timeout: Duration,
}

impl Default for RpcClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_RPC_CONNECT_TIMEOUT,
            io_timeout: REQUEST_TIMEOUT,
        }
    }
}

impl RpcClientConfig {
    pub fn from_config(config: &PdConfig) -> Self {
        Self {
            connect_timeout: config.rpc_connect_timeout(),
            io_timeout: config.request_timeouts().request_timeout,
        }
    }
}

/// Request/response client with fallback across candidate endpoints.
#[derive(Clone, Debug, Default)]
pub struct RpcClient {
    config: RpcClientConfig,
}

impl RpcClient {
    pub fn new(config: RpcClientConfig) -> Self {
        Self { config }
    }

    /// Send `request` to the first endpoint of `addr` that takes it, and
    /// wait for the response carrying the same id.
    ///
    /// Connect, preflight and send failures move on to the next endpoint.
    /// Once the request is sent there is no fallback: a receive failure, a
    /// receive timeout or an unexpected response is an `Rpc` error.
    pub async fn call(
        &self,
        addr: &str,
        req_id: u64,
        request: pdpb::Request,
    ) -> Result<pdpb::Response> {
        self.call_with(addr, req_id, request, |endpoint| async move {
            dial(&endpoint).await
        })
        .await
    }

    async fn call_with<D, F>(
        &self,
        addr: &str,
        req_id: u64,
        request: pdpb::Request,
        dial: D,
    ) -> Result<pdpb::Response>
    where
        D: Fn(Endpoint) -> F,
        F: Future<Output = std::io::Result<Box<dyn RpcStream>>>,
    {
        let endpoints = parse_urls(addr)?;
        let frame = encode_frame(req_id, &msgpb::Message::pd_request(request))?;

        let mut last_error = String::new();
        for endpoint in endpoints {
            match self.send(&endpoint, &dial, req_id, &frame).await {
                Ok(stream) => {
                    debug!(endpoint = %endpoint, req_id, "Sent rpc request");
                    return self.receive(&endpoint, stream, req_id).await;
                }
                Err(reason) => {
                    debug!(endpoint = %endpoint, error = %reason, "Endpoint failed, trying next");
                    last_error = format!("{}: {}", endpoint, reason);
                }
            }
        }

        warn!(addr = %addr, error = %last_error, "No rpc endpoint reachable");
        Err(PdError::AllEndpointsUnreachable {
            addr: addr.to_string(),
            last_error,
        })
    }

    /// Route one candidate and hand it the request frame. The stream is
    /// dropped, and so closed, on any failure.
    async fn send<D, F>(
        &self,
        endpoint: &Endpoint,
        dial: &D,
        req_id: u64,
        frame: &Bytes,
    ) -> std::result::Result<Box<dyn RpcStream>, String>
    where
        D: Fn(Endpoint) -> F,
        F: Future<Output = std::io::Result<Box<dyn RpcStream>>>,
    {
        let connect_timeout = self.config.connect_timeout;
        let routed = tokio::time::timeout(connect_timeout, async {
            let mut stream = dial(endpoint.clone()).await?;
            stream.write_all(preflight(endpoint).as_bytes()).await?;
            stream.flush().await?;
            Ok::<_, std::io::Error>(stream)
        })
        .await;
        let mut stream = match routed {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(e.to_string()),
            Err(_) => return Err(format!("connect timed out after {:?}", connect_timeout)),
        };

        let io_timeout = self.config.io_timeout;
        let sent = tokio::time::timeout(io_timeout, async {
            stream.write_all(frame).await?;
            stream.flush().await
        })
        .await;
        match sent {
            Ok(Ok(())) => Ok(stream),
            Ok(Err(e)) => Err(format!("send request {}: {}", req_id, e)),
            Err(_) => Err(format!(
                "send request {} timed out after {:?}",
                req_id, io_timeout
            )),
        }
    }

    async fn receive(
        &self,
        endpoint: &Endpoint,
        mut stream: Box<dyn RpcStream>,
        req_id: u64,
    ) -> Result<pdpb::Response> {
        let io_timeout = self.config.io_timeout;
        let received = tokio::time::timeout(io_timeout, read_message(&mut stream)).await;
        let (resp_id, resp): (u64, msgpb::Message) = match received {
            Ok(Ok(message)) => message,
            Ok(Err(e)) => {
                return Err(PdError::rpc(
                    endpoint.to_string(),
                    format!("receive response {}: {}", req_id, e),
                ));
            }
            Err(_) => {
                return Err(PdError::rpc(
                    endpoint.to_string(),
                    format!("receive response {} timed out after {:?}", req_id, io_timeout),
                ));
            }
        };

        if resp_id != req_id {
            return Err(PdError::rpc(
                endpoint.to_string(),
                format!("message id mismatch: reqID {} respID {}", req_id, resp_id),
            ));
        }
        if resp.msg_type() != MessageType::PdResp {
            return Err(PdError::rpc(
                endpoint.to_string(),
                format!("unexpected message type {:?}", resp.msg_type()),
            ));
        }

        resp.pd_resp
            .ok_or_else(|| PdError::rpc(endpoint.to_string(), "response carries no pd response"))
    }
}

/// Send a request to `addr` and wait for its response, with default settings.
pub async fn rpc_request(addr: &str, req_id: u64, request: pdpb::Request) -> Result<pdpb::Response> {
    RpcClient::default().call(addr, req_id, request).await
}

async fn dial(endpoint: &Endpoint) -> std::io::Result<Box<dyn RpcStream>> {
    let stream: Box<dyn RpcStream> = match endpoint.transport() {
        Transport::Tcp => Box::new(TcpStream::connect(endpoint.address.as_str()).await?),
        Transport::Unix => Box::new(UnixStream::connect(&endpoint.address).await?),
    };
    Ok(stream)
}

fn preflight(endpoint: &Endpoint) -> String {
    format!(
        "GET {} HTTP/1.1\r\nHost: {}\r\nUser-Agent: pd-rpc\r\n\r\n",
        PD_RPC_PREFIX, endpoint.address
    )
}
