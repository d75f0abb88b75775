//! RPC client tests against in-process peers
//!
//! Each peer speaks the server side of the protocol: read the preflight,
//! read one framed request, answer with one framed response.

use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use pd_common::PdError;
use pd_proto::msgpb;
use pd_proto::pdpb::{self, CommandType};
use pd_rpc::{RpcClient, RpcClientConfig, read_message, rpc_request, write_message};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, BufReader};
use tokio::net::{TcpListener, UnixListener};

/// How a fake peer answers a request.
#[derive(Clone, Copy)]
enum Reply {
    /// Echo the id back with an AllocId response
    Echo,
    /// Answer with a different correlation id
    WrongId,
    /// Close the connection after reading the request
    Hangup,
    /// Never answer
    Silent,
}

struct Peer {
    addr: String,
    accepted: Arc<AtomicUsize>,
    preflights: Arc<Mutex<Vec<String>>>,
}

async fn serve_one<S>(stream: S, reply: Reply, lines: Arc<Mutex<Vec<String>>>)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut reader = BufReader::new(stream);

    // Preflight: an HTTP request line plus headers, terminated by a blank line
    let mut request_line = String::new();
    reader.read_line(&mut request_line).await.unwrap();
    lines.lock().unwrap().push(request_line.trim_end().to_string());
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
        if line == "\r\n" || line.is_empty() {
            break;
        }
    }

    let (id, msg): (u64, msgpb::Message) = read_message(&mut reader).await.unwrap();
    let req = msg.pd_req.unwrap();
    let resp = pdpb::Response {
        cmd_type: req.cmd_type,
        alloc_id: Some(pdpb::AllocIdResponse { id: 1000 + id }),
        ..Default::default()
    };

    match reply {
        Reply::Echo => {
            write_message(reader.get_mut(), id, &msgpb::Message::pd_response(resp))
                .await
                .unwrap();
        }
        Reply::WrongId => {
            write_message(reader.get_mut(), id + 1, &msgpb::Message::pd_response(resp))
                .await
                .unwrap();
        }
        Reply::Hangup => {}
        Reply::Silent => tokio::time::sleep(Duration::from_secs(30)).await,
    }
}

async fn spawn_tcp_peer(reply: Reply) -> Peer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = format!("tcp://{}", listener.local_addr().unwrap());
    let accepted = Arc::new(AtomicUsize::new(0));
    let preflights = Arc::new(Mutex::new(Vec::new()));

    let (count, lines) = (accepted.clone(), preflights.clone());
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            count.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(serve_one(stream, reply, lines.clone()));
        }
    });

    Peer {
        addr,
        accepted,
        preflights,
    }
}

async fn spawn_unix_peer(dir: &tempfile::TempDir, reply: Reply) -> Peer {
    let path = dir.path().join("pd.sock");
    let listener = UnixListener::bind(&path).unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));
    let preflights = Arc::new(Mutex::new(Vec::new()));

    let (count, lines) = (accepted.clone(), preflights.clone());
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            count.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(serve_one(stream, reply, lines.clone()));
        }
    });

    Peer {
        addr: format!("unix://{}", path.display()),
        accepted,
        preflights,
    }
}

/// An address nothing listens on.
async fn closed_tcp_addr() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("tcp://{}", addr)
}

#[tokio::test]
async fn test_call_single_endpoint() {
    let peer = spawn_tcp_peer(Reply::Echo).await;

    let resp = rpc_request(&peer.addr, 7, pdpb::Request::alloc_id(1))
        .await
        .unwrap();

    assert_eq!(resp.cmd_type(), CommandType::AllocId);
    assert_eq!(resp.alloc_id.unwrap().id, 1007);
    assert_eq!(peer.accepted.load(Ordering::SeqCst), 1);
    assert_eq!(*peer.preflights.lock().unwrap(), vec!["GET /pd/rpc HTTP/1.1".to_string()]);
}

#[tokio::test]
async fn test_call_over_unix_socket() {
    let dir = tempfile::tempdir().unwrap();
    let peer = spawn_unix_peer(&dir, Reply::Echo).await;

    let resp = rpc_request(&peer.addr, 3, pdpb::Request::alloc_id(1))
        .await
        .unwrap();
    assert_eq!(resp.alloc_id.unwrap().id, 1003);
}

#[tokio::test]
async fn test_fallback_skips_unreachable_endpoints() {
    let dir = tempfile::tempdir().unwrap();
    let missing_socket = format!("unix://{}", dir.path().join("missing.sock").display());
    let refused = closed_tcp_addr().await;
    let peer = spawn_tcp_peer(Reply::Echo).await;
    let spare = spawn_tcp_peer(Reply::Echo).await;

    let addr = format!("{},{},{},{}", missing_socket, refused, peer.addr, spare.addr);
    let resp = rpc_request(&addr, 11, pdpb::Request::alloc_id(1))
        .await
        .unwrap();

    assert_eq!(resp.alloc_id.unwrap().id, 1011);
    assert_eq!(peer.accepted.load(Ordering::SeqCst), 1);
    assert_eq!(spare.accepted.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_all_endpoints_unreachable() {
    let dir = tempfile::tempdir().unwrap();
    let addr = format!(
        "{},unix://{}",
        closed_tcp_addr().await,
        dir.path().join("missing.sock").display()
    );

    let err = rpc_request(&addr, 1, pdpb::Request::alloc_id(1))
        .await
        .unwrap_err();
    match err {
        PdError::AllEndpointsUnreachable { addr: failed, last_error } => {
            assert_eq!(failed, addr);
            assert!(last_error.contains("missing.sock"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_id_mismatch_is_rpc_error() {
    let peer = spawn_tcp_peer(Reply::WrongId).await;

    let err = rpc_request(&peer.addr, 5, pdpb::Request::alloc_id(1))
        .await
        .unwrap_err();
    match err {
        PdError::Rpc { reason, .. } => assert!(reason.contains("message id mismatch")),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_receive_failure_does_not_fall_back() {
    let first = spawn_tcp_peer(Reply::Hangup).await;
    let second = spawn_tcp_peer(Reply::Echo).await;

    let addr = format!("{},{}", first.addr, second.addr);
    let err = rpc_request(&addr, 9, pdpb::Request::alloc_id(1))
        .await
        .unwrap_err();

    assert!(matches!(err, PdError::Rpc { .. }), "unexpected error: {:?}", err);
    assert_eq!(first.accepted.load(Ordering::SeqCst), 1);
    assert_eq!(second.accepted.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_silent_peer_is_rpc_error_without_fallback() {
    let peer = spawn_tcp_peer(Reply::Silent).await;
    let spare = spawn_tcp_peer(Reply::Echo).await;
    let client = RpcClient::new(RpcClientConfig {
        connect_timeout: Duration::from_secs(1),
        io_timeout: Duration::from_millis(200),
    });

    let addr = format!("{},{}", peer.addr, spare.addr);
    let err = client
        .call(&addr, 1, pdpb::Request::alloc_id(1))
        .await
        .unwrap_err();
    match err {
        PdError::Rpc { endpoint, reason } => {
            assert_eq!(endpoint, peer.addr);
            assert!(reason.contains("timed out"), "reason: {}", reason);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(spare.accepted.load(Ordering::SeqCst), 0);
}
