//! Message framing
//!
//! Every frame is a fixed 16-byte big-endian header followed by a
//! protobuf-encoded body:
//!
//! ```text
//! +---------+---------+-------------+----------------+----------+
//! | magic   | version | body length | correlation id | body     |
//! | u16     | u16     | u32         | u64            | n bytes  |
//! +---------+---------+-------------+----------------+----------+
//! ```

use bytes::{Buf, BufMut, Bytes, BytesMut};
use pd_common::{PdError, Result};
use prost::Message;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub const MSG_MAGIC: u16 = 0xdaf4;
pub const MSG_VERSION_V1: u16 = 1;
pub const MSG_HEADER_SIZE: usize = 16;
/// Upper bound on a frame body, to reject corrupt length fields early
pub const MAX_BODY_SIZE: usize = 64 * 1024 * 1024;

/// Parsed frame header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct FrameHeader {
    body_len: usize,
    msg_id: u64,
}

/// Encode a message into one complete frame.
///
/// A body over [`MAX_BODY_SIZE`] is rejected before anything is encoded.
pub fn encode_frame<M: Message>(msg_id: u64, msg: &M) -> Result<Bytes> {
    let body_len = msg.encoded_len();
    let len_field = body_len_field(body_len)?;
    let mut buf = BytesMut::with_capacity(MSG_HEADER_SIZE + body_len);
    buf.put_u16(MSG_MAGIC);
    buf.put_u16(MSG_VERSION_V1);
    buf.put_u32(len_field);
    buf.put_u64(msg_id);
    // BytesMut grows on demand, so encoding cannot run out of capacity
    msg.encode_raw(&mut buf);
    Ok(buf.freeze())
}

/// Decode one complete frame held in memory.
///
/// Truncated input is malformed here; use [`read_message`] for streams.
pub fn decode_frame<M: Message + Default>(frame: &[u8]) -> Result<(u64, M)> {
    if frame.len() < MSG_HEADER_SIZE {
        return Err(PdError::MalformedFrame(format!(
            "truncated header: {} of {} bytes",
            frame.len(),
            MSG_HEADER_SIZE
        )));
    }
    let header = parse_header(&frame[..MSG_HEADER_SIZE])?;
    let body = &frame[MSG_HEADER_SIZE..];
    if body.len() != header.body_len {
        return Err(PdError::MalformedFrame(format!(
            "body length {} does not match header length {}",
            body.len(),
            header.body_len
        )));
    }

    Ok((header.msg_id, decode_body(body)?))
}

/// Write one frame to a stream.
pub async fn write_message<W, M>(writer: &mut W, msg_id: u64, msg: &M) -> Result<()>
where
    W: AsyncWrite + Unpin,
    M: Message,
{
    let frame = encode_frame(msg_id, msg)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

/// Read exactly one frame from a stream.
pub async fn read_message<R, M>(reader: &mut R) -> Result<(u64, M)>
where
    R: AsyncRead + Unpin,
    M: Message + Default,
{
    let mut header = [0u8; MSG_HEADER_SIZE];
    read_full(reader, &mut header).await?;
    let header = parse_header(&header)?;

    let mut body = vec![0u8; header.body_len];
    read_full(reader, &mut body).await?;

    Ok((header.msg_id, decode_body(&body)?))
}

async fn read_full<R: AsyncRead + Unpin>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    match reader.read_exact(buf).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Err(PdError::StreamClosed),
        Err(e) => Err(PdError::Io(e)),
    }
}

fn body_len_field(body_len: usize) -> Result<u32> {
    if body_len > MAX_BODY_SIZE {
        return Err(PdError::MalformedFrame(format!(
            "body length {} exceeds limit {}",
            body_len, MAX_BODY_SIZE
        )));
    }
    // MAX_BODY_SIZE fits in the u32 length field
    Ok(body_len as u32)
}

fn parse_header(mut header: &[u8]) -> Result<FrameHeader> {
    let magic = header.get_u16();
    if magic != MSG_MAGIC {
        return Err(PdError::MalformedFrame(format!(
            "invalid magic {:#06x}, want {:#06x}",
            magic, MSG_MAGIC
        )));
    }
    let version = header.get_u16();
    if version != MSG_VERSION_V1 {
        return Err(PdError::MalformedFrame(format!(
            "unsupported version {}",
            version
        )));
    }
    let body_len = header.get_u32() as usize;
    if body_len > MAX_BODY_SIZE {
        return Err(PdError::MalformedFrame(format!(
            "body length {} exceeds limit {}",
            body_len, MAX_BODY_SIZE
        )));
    }
    let msg_id = header.get_u64();

    Ok(FrameHeader { body_len, msg_id })
}

fn decode_body<M: Message + Default>(body: &[u8]) -> Result<M> {
    M::decode(body).map_err(|e| PdError::MalformedFrame(format!("decode body: {}", e)))
}

#[cfg(test)]
mod tests {
    use pd_proto::msgpb::{self, MessageType};
    use pd_proto::pdpb::{self, CommandType};

    use super::*;

    fn get_store_message() -> msgpb::Message {
        msgpb::Message::pd_request(pdpb::Request::get_store(1, 42))
    }

    #[test]
    fn test_frame_header_layout() {
        let frame = encode_frame(0x0102_0304_0506_0708, &get_store_message()).unwrap();
        assert_eq!(&frame[0..2], &[0xda, 0xf4]);
        assert_eq!(&frame[2..4], &[0x00, 0x01]);
        let body_len = u32::from_be_bytes(frame[4..8].try_into().unwrap()) as usize;
        assert_eq!(body_len, frame.len() - MSG_HEADER_SIZE);
        assert_eq!(&frame[8..16], &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_decode_preserves_sub_types() {
        let frame = encode_frame(9, &get_store_message()).unwrap();
        let (id, msg): (u64, msgpb::Message) = decode_frame(&frame).unwrap();
        assert_eq!(id, 9);
        assert_eq!(msg.msg_type(), MessageType::PdReq);
        let req = msg.pd_req.unwrap();
        assert_eq!(req.cmd_type(), CommandType::GetStore);
        assert_eq!(req.get_store.unwrap().store_id, 42);
    }

    #[test]
    fn test_decode_truncated() {
        let frame = encode_frame(1, &get_store_message()).unwrap();
        for len in [0, 5, MSG_HEADER_SIZE, frame.len() - 1] {
            let err = decode_frame::<msgpb::Message>(&frame[..len]).unwrap_err();
            assert!(matches!(err, PdError::MalformedFrame(_)), "len {}", len);
        }
    }

    #[test]
    fn test_decode_bad_magic_and_version() {
        let mut frame = encode_frame(1, &get_store_message()).unwrap().to_vec();
        frame[0] = 0x00;
        assert!(matches!(
            decode_frame::<msgpb::Message>(&frame),
            Err(PdError::MalformedFrame(_))
        ));

        let mut frame = encode_frame(1, &get_store_message()).unwrap().to_vec();
        frame[3] = 0x02;
        assert!(matches!(
            decode_frame::<msgpb::Message>(&frame),
            Err(PdError::MalformedFrame(_))
        ));
    }

    #[test]
    fn test_decode_garbage_body() {
        let mut frame = BytesMut::new();
        frame.put_u16(MSG_MAGIC);
        frame.put_u16(MSG_VERSION_V1);
        frame.put_u32(3);
        frame.put_u64(1);
        frame.put_slice(&[0xff, 0xff, 0xff]);
        assert!(matches!(
            decode_frame::<msgpb::Message>(&frame),
            Err(PdError::MalformedFrame(_))
        ));
    }

    #[tokio::test]
    async fn test_stream_read_write() {
        let (mut client, mut server) = tokio::io::duplex(1024);
        write_message(&mut client, 77, &get_store_message())
            .await
            .unwrap();
        write_message(&mut client, 78, &msgpb::Message::pd_response(pdpb::Response::default()))
            .await
            .unwrap();

        let (id, msg): (u64, msgpb::Message) = read_message(&mut server).await.unwrap();
        assert_eq!(id, 77);
        assert_eq!(msg, get_store_message());

        let (id, msg): (u64, msgpb::Message) = read_message(&mut server).await.unwrap();
        assert_eq!(id, 78);
        assert_eq!(msg.msg_type(), MessageType::PdResp);
    }

    #[tokio::test]
    async fn test_stream_closed_mid_frame() {
        let frame = encode_frame(5, &get_store_message()).unwrap();
        let (mut client, mut server) = tokio::io::duplex(1024);
        client.write_all(&frame[..frame.len() - 2]).await.unwrap();
        drop(client);

        let err = read_message::<_, msgpb::Message>(&mut server)
            .await
            .unwrap_err();
        assert!(matches!(err, PdError::StreamClosed));
    }

    #[tokio::test]
    async fn test_stream_closed_before_header() {
        let (client, mut server) = tokio::io::duplex(64);
        drop(client);
        let err = read_message::<_, msgpb::Message>(&mut server)
            .await
            .unwrap_err();
        assert!(matches!(err, PdError::StreamClosed));
    }

    #[test]
    fn test_body_len_limit() {
        assert_eq!(body_len_field(0).unwrap(), 0);
        assert_eq!(body_len_field(MAX_BODY_SIZE).unwrap(), MAX_BODY_SIZE as u32);
        for len in [MAX_BODY_SIZE + 1, u32::MAX as usize + 1] {
            assert!(matches!(body_len_field(len), Err(PdError::MalformedFrame(_))));
        }
    }

    #[tokio::test]
    async fn test_oversize_message_is_not_written() {
        let resp = pdpb::Response {
            header: Some(pdpb::ResponseHeader {
                error: Some(pdpb::Error {
                    message: "x".repeat(MAX_BODY_SIZE),
                }),
                ..Default::default()
            }),
            ..Default::default()
        };
        let (mut client, mut server) = tokio::io::duplex(1024);

        let err = write_message(&mut client, 3, &msgpb::Message::pd_response(resp))
            .await
            .unwrap_err();
        assert!(matches!(err, PdError::MalformedFrame(_)));

        drop(client);
        let mut sent = Vec::new();
        server.read_to_end(&mut sent).await.unwrap();
        assert!(sent.is_empty());
    }

    #[tokio::test]
    async fn test_stream_oversize_length() {
        let mut frame = BytesMut::new();
        frame.put_u16(MSG_MAGIC);
        frame.put_u16(MSG_VERSION_V1);
        frame.put_u32(u32::MAX);
        frame.put_u64(1);
        let (mut client, mut server) = tokio::io::duplex(64);
        client.write_all(&frame).await.unwrap();

        let err = read_message::<_, msgpb::Message>(&mut server)
            .await
            .unwrap_err();
        assert!(matches!(err, PdError::MalformedFrame(_)));
    }
}
