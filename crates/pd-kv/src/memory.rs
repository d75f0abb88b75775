//! In-process KV store
//!
//! A single-member, revisioned store implementing [`KvClient`] with the same
//! compare and range semantics as the replicated store. Used for standalone
//! runs and tests.

use std::collections::BTreeMap;

use anyhow::bail;
use async_trait::async_trait;
use parking_lot::RwLock;

use crate::client::{
    Compare, CompareOp, CompareTarget, GetOptions, GetResponse, KeyValue, KvClient, Op,
    OpResponse, StatusResponse, TxnRequest, TxnResponse,
};

#[derive(Default)]
struct State {
    revision: i64,
    data: BTreeMap<Vec<u8>, KeyValue>,
}

impl State {
    fn range(&self, key: &[u8], options: GetOptions) -> Vec<&KeyValue> {
        if options.prefix {
            self.data
                .range(key.to_vec()..)
                .take_while(|(k, _)| k.starts_with(key))
                .map(|(_, kv)| kv)
                .collect()
        } else {
            self.data.get(key).into_iter().collect()
        }
    }

    fn get(&self, key: &[u8], options: GetOptions) -> GetResponse {
        let matched = self.range(key, options);
        let count = matched.len();
        let take = if options.limit == 0 {
            count
        } else {
            options.limit.min(count)
        };

        GetResponse {
            revision: self.revision,
            kvs: matched.into_iter().take(take).cloned().collect(),
            count,
        }
    }

    fn evaluate(&self, compare: &Compare) -> bool {
        let kv = self.data.get(&compare.key);
        let ordering = match &compare.target {
            CompareTarget::Value(value) => {
                // A compare on the value of a missing key never holds
                let Some(kv) = kv else {
                    return false;
                };
                kv.value.as_slice().cmp(value.as_slice())
            }
            CompareTarget::Version(v) => kv.map_or(0, |kv| kv.version).cmp(v),
            CompareTarget::CreateRevision(r) => kv.map_or(0, |kv| kv.create_revision).cmp(r),
            CompareTarget::ModRevision(r) => kv.map_or(0, |kv| kv.mod_revision).cmp(r),
        };

        match compare.op {
            CompareOp::Equal => ordering.is_eq(),
            CompareOp::NotEqual => ordering.is_ne(),
            CompareOp::Greater => ordering.is_gt(),
            CompareOp::Less => ordering.is_lt(),
        }
    }

    fn apply(&mut self, ops: &[Op]) -> Vec<OpResponse> {
        let mut responses = Vec::with_capacity(ops.len());
        let mut bumped = false;

        for op in ops {
            let response = match op {
                Op::Put { key, value } => {
                    if !bumped {
                        self.revision += 1;
                        bumped = true;
                    }
                    let revision = self.revision;
                    let entry = self.data.entry(key.clone()).or_insert_with(|| KeyValue {
                        key: key.clone(),
                        create_revision: revision,
                        ..Default::default()
                    });
                    let prev_revision = entry.mod_revision;
                    entry.value = value.clone();
                    entry.mod_revision = revision;
                    entry.version += 1;
                    OpResponse::Put { prev_revision }
                }
                Op::Delete { key, options } => {
                    let keys: Vec<Vec<u8>> = self
                        .range(key, *options)
                        .into_iter()
                        .map(|kv| kv.key.clone())
                        .collect();
                    if !keys.is_empty() && !bumped {
                        self.revision += 1;
                        bumped = true;
                    }
                    for key in &keys {
                        self.data.remove(key);
                    }
                    OpResponse::Delete {
                        deleted: keys.len(),
                    }
                }
                Op::Get { key, options } => OpResponse::Get(self.get(key, *options)),
            };
            responses.push(response);
        }

        responses
    }
}

/// In-process, single-member KV store.
#[derive(Default)]
pub struct MemoryKvClient {
    state: RwLock<State>,
    /// Endpoints this member answers status for; empty answers any
    members: Vec<String>,
}

impl MemoryKvClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only answer status probes for the given endpoints.
    pub fn with_members<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            state: RwLock::new(State::default()),
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    /// Current store revision.
    pub fn revision(&self) -> i64 {
        self.state.read().revision
    }
}

#[async_trait]
impl KvClient for MemoryKvClient {
    async fn get(&self, key: &[u8], options: GetOptions) -> anyhow::Result<GetResponse> {
        Ok(self.state.read().get(key, options))
    }

    async fn txn(&self, request: TxnRequest) -> anyhow::Result<TxnResponse> {
        let mut state = self.state.write();
        let succeeded = request.compare.iter().all(|c| state.evaluate(c));
        let ops = if succeeded {
            &request.success
        } else {
            &request.failure
        };
        let responses = state.apply(ops);

        Ok(TxnResponse {
            succeeded,
            revision: state.revision,
            responses,
        })
    }

    async fn status(&self, endpoint: &str) -> anyhow::Result<StatusResponse> {
        if !self.members.is_empty() && !self.members.iter().any(|m| m == endpoint) {
            bail!("no member serves endpoint {}", endpoint);
        }

        let state = self.state.read();
        Ok(StatusResponse {
            version: env!("CARGO_PKG_VERSION").to_string(),
            leader: 1,
            member_id: 1,
            revision: state.revision,
            db_size: state
                .data
                .values()
                .map(|kv| (kv.key.len() + kv.value.len()) as u64)
                .sum(),
        })
    }
}
