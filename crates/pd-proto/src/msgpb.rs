//! Envelope carried by every RPC frame

use crate::pdpb;

/// Discriminates the payload of a [`Message`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum MessageType {
    Unknown = 0,
    PdReq = 6,
    PdResp = 7,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Message {
    #[prost(enumeration = "MessageType", tag = "1")]
    pub msg_type: i32,
    #[prost(message, optional, tag = "6")]
    pub pd_req: ::core::option::Option<pdpb::Request>,
    #[prost(message, optional, tag = "7")]
    pub pd_resp: ::core::option::Option<pdpb::Response>,
}

impl Message {
    /// Wrap a PD request.
    pub fn pd_request(request: pdpb::Request) -> Self {
        Self {
            msg_type: MessageType::PdReq as i32,
            pd_req: Some(request),
            pd_resp: None,
        }
    }

    /// Wrap a PD response.
    pub fn pd_response(response: pdpb::Response) -> Self {
        Self {
            msg_type: MessageType::PdResp as i32,
            pd_req: None,
            pd_resp: Some(response),
        }
    }
}
