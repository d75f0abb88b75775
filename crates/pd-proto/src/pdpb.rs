//! PD commands and responses

use crate::metapb;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum CommandType {
    Invalid = 0,
    Tso = 1,
    AllocId = 2,
    Bootstrap = 3,
    IsBootstrapped = 4,
    GetStore = 5,
    PutStore = 6,
    AskSplit = 7,
    GetRegion = 8,
    RegionHeartbeat = 9,
    GetClusterConfig = 10,
    PutClusterConfig = 11,
    StoreHeartbeat = 12,
    ReportSplit = 13,
    GetRegionById = 14,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RequestHeader {
    #[prost(bytes = "vec", tag = "1")]
    pub uuid: ::prost::alloc::vec::Vec<u8>,
    #[prost(uint64, tag = "2")]
    pub cluster_id: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Error {
    #[prost(string, tag = "1")]
    pub message: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ResponseHeader {
    #[prost(bytes = "vec", tag = "1")]
    pub uuid: ::prost::alloc::vec::Vec<u8>,
    #[prost(uint64, tag = "2")]
    pub cluster_id: u64,
    #[prost(message, optional, tag = "3")]
    pub error: ::core::option::Option<Error>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TsoRequest {
    #[prost(uint32, tag = "1")]
    pub count: u32,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct Timestamp {
    #[prost(int64, tag = "1")]
    pub physical: i64,
    #[prost(int64, tag = "2")]
    pub logical: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TsoResponse {
    #[prost(message, repeated, tag = "1")]
    pub timestamps: ::prost::alloc::vec::Vec<Timestamp>,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct AllocIdRequest {}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct AllocIdResponse {
    #[prost(uint64, tag = "1")]
    pub id: u64,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct IsBootstrappedRequest {}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct IsBootstrappedResponse {
    #[prost(bool, tag = "1")]
    pub bootstrapped: bool,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct GetStoreRequest {
    #[prost(uint64, tag = "1")]
    pub store_id: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetStoreResponse {
    #[prost(message, optional, tag = "1")]
    pub store: ::core::option::Option<metapb::Store>,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct GetClusterConfigRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetClusterConfigResponse {
    #[prost(message, optional, tag = "1")]
    pub cluster: ::core::option::Option<metapb::Cluster>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Request {
    #[prost(message, optional, tag = "1")]
    pub header: ::core::option::Option<RequestHeader>,
    #[prost(enumeration = "CommandType", tag = "2")]
    pub cmd_type: i32,
    #[prost(message, optional, tag = "3")]
    pub tso: ::core::option::Option<TsoRequest>,
    #[prost(message, optional, tag = "4")]
    pub alloc_id: ::core::option::Option<AllocIdRequest>,
    #[prost(message, optional, tag = "6")]
    pub is_bootstrapped: ::core::option::Option<IsBootstrappedRequest>,
    #[prost(message, optional, tag = "7")]
    pub get_store: ::core::option::Option<GetStoreRequest>,
    #[prost(message, optional, tag = "12")]
    pub get_cluster_config: ::core::option::Option<GetClusterConfigRequest>,
}

impl Request {
    /// Start a request of the given command for a cluster.
    pub fn new(cluster_id: u64, cmd_type: CommandType) -> Self {
        Self {
            header: Some(RequestHeader {
                uuid: Vec::new(),
                cluster_id,
            }),
            cmd_type: cmd_type as i32,
            ..Default::default()
        }
    }

    pub fn alloc_id(cluster_id: u64) -> Self {
        Self {
            alloc_id: Some(AllocIdRequest {}),
            ..Self::new(cluster_id, CommandType::AllocId)
        }
    }

    pub fn get_store(cluster_id: u64, store_id: u64) -> Self {
        Self {
            get_store: Some(GetStoreRequest { store_id }),
            ..Self::new(cluster_id, CommandType::GetStore)
        }
    }

    pub fn is_bootstrapped(cluster_id: u64) -> Self {
        Self {
            is_bootstrapped: Some(IsBootstrappedRequest {}),
            ..Self::new(cluster_id, CommandType::IsBootstrapped)
        }
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Response {
    #[prost(message, optional, tag = "1")]
    pub header: ::core::option::Option<ResponseHeader>,
    #[prost(enumeration = "CommandType", tag = "2")]
    pub cmd_type: i32,
    #[prost(message, optional, tag = "3")]
    pub tso: ::core::option::Option<TsoResponse>,
    #[prost(message, optional, tag = "4")]
    pub alloc_id: ::core::option::Option<AllocIdResponse>,
    #[prost(message, optional, tag = "6")]
    pub is_bootstrapped: ::core::option::Option<IsBootstrappedResponse>,
    #[prost(message, optional, tag = "7")]
    pub get_store: ::core::option::Option<GetStoreResponse>,
    #[prost(message, optional, tag = "12")]
    pub get_cluster_config: ::core::option::Option<GetClusterConfigResponse>,
}

impl Response {
    /// Error reported by the peer in the response header, if any.
    pub fn error(&self) -> Option<&Error> {
        self.header.as_ref().and_then(|h| h.error.as_ref())
    }
}
