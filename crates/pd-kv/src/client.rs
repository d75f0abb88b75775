//! KV store client interface
//!
//! The replicated store is an external collaborator. The accessor only needs
//! point and prefix gets, conditional transactions, and a status probe, so
//! that is the whole surface here. Implementations must be safe to share
//! across concurrent callers.

use async_trait::async_trait;

/// A stored entry with its revision bookkeeping.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyValue {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
    /// Store revision at which the key was created
    pub create_revision: i64,
    /// Store revision of the last modification
    pub mod_revision: i64,
    /// Number of modifications since creation
    pub version: i64,
}

/// Options narrowing a get.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GetOptions {
    /// Match every key starting with the given key
    pub prefix: bool,
    /// Maximum entries to return, 0 for no limit
    pub limit: usize,
}

impl GetOptions {
    pub fn prefix() -> Self {
        Self {
            prefix: true,
            limit: 0,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GetResponse {
    /// Store revision the read was served at
    pub revision: i64,
    pub kvs: Vec<KeyValue>,
    /// Total matches before any limit was applied
    pub count: usize,
}

/// What a compare inspects.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompareTarget {
    Value(Vec<u8>),
    Version(i64),
    CreateRevision(i64),
    ModRevision(i64),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    Equal,
    NotEqual,
    Greater,
    Less,
}

/// One condition of a transaction.
///
/// A missing key has empty value and zero version and revisions, so
/// `Compare::create_revision(key, CompareOp::Equal, 0)` means "key absent".
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Compare {
    pub key: Vec<u8>,
    pub op: CompareOp,
    pub target: CompareTarget,
}

impl Compare {
    pub fn value(key: impl Into<Vec<u8>>, op: CompareOp, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            op,
            target: CompareTarget::Value(value.into()),
        }
    }

    pub fn version(key: impl Into<Vec<u8>>, op: CompareOp, version: i64) -> Self {
        Self {
            key: key.into(),
            op,
            target: CompareTarget::Version(version),
        }
    }

    pub fn create_revision(key: impl Into<Vec<u8>>, op: CompareOp, revision: i64) -> Self {
        Self {
            key: key.into(),
            op,
            target: CompareTarget::CreateRevision(revision),
        }
    }

    pub fn mod_revision(key: impl Into<Vec<u8>>, op: CompareOp, revision: i64) -> Self {
        Self {
            key: key.into(),
            op,
            target: CompareTarget::ModRevision(revision),
        }
    }
}

/// One effect of a transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Op {
    Put { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8>, options: GetOptions },
    Get { key: Vec<u8>, options: GetOptions },
}

impl Op {
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Op::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn delete(key: impl Into<Vec<u8>>) -> Self {
        Op::Delete {
            key: key.into(),
            options: GetOptions::default(),
        }
    }

    pub fn get(key: impl Into<Vec<u8>>) -> Self {
        Op::Get {
            key: key.into(),
            options: GetOptions::default(),
        }
    }
}

/// A conditional transaction: if every compare holds, apply `success`,
/// otherwise apply `failure`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TxnRequest {
    pub compare: Vec<Compare>,
    pub success: Vec<Op>,
    pub failure: Vec<Op>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OpResponse {
    Put { prev_revision: i64 },
    Delete { deleted: usize },
    Get(GetResponse),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TxnResponse {
    /// Whether the compares held and `success` ran
    pub succeeded: bool,
    pub revision: i64,
    pub responses: Vec<OpResponse>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatusResponse {
    pub version: String,
    pub leader: u64,
    pub member_id: u64,
    pub revision: i64,
    pub db_size: u64,
}

/// Client of the replicated KV store.
#[async_trait]
pub trait KvClient: Send + Sync {
    async fn get(&self, key: &[u8], options: GetOptions) -> anyhow::Result<GetResponse>;

    async fn txn(&self, request: TxnRequest) -> anyhow::Result<TxnResponse>;

    /// Status of the store member serving `endpoint`.
    async fn status(&self, endpoint: &str) -> anyhow::Result<StatusResponse>;
}
