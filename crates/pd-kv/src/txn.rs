//! Slow-logging transaction wrapper
//!
//! Wraps a conditional transaction without changing what it does: the
//! compares and operations reach the store exactly as given. The wrapper adds
//! the timeout budget, taken when the transaction is created, slow logging,
//! and outcome metrics on commit.

use std::sync::Arc;

use pd_common::{RequestTimeouts, Result};
use tokio::time::Instant;
use tracing::warn;

use crate::accessor::bounded;
use crate::client::{Compare, KvClient, Op, TxnRequest, TxnResponse};
use crate::metrics::{OUTCOME_FAILED, OUTCOME_SUCCESS, TxnMetricsSink};

/// A transaction under construction.
///
/// `commit` consumes the wrapper, so its deadline is used exactly once.
pub struct SlowLogTxn {
    client: Arc<dyn KvClient>,
    request: TxnRequest,
    deadline: Instant,
    timeouts: RequestTimeouts,
    metrics: Arc<dyn TxnMetricsSink>,
}

impl SlowLogTxn {
    pub(crate) fn new(
        client: Arc<dyn KvClient>,
        timeouts: RequestTimeouts,
        metrics: Arc<dyn TxnMetricsSink>,
    ) -> Self {
        Self {
            client,
            request: TxnRequest::default(),
            deadline: Instant::now() + timeouts.request_timeout,
            timeouts,
            metrics,
        }
    }

    /// Conditions that must all hold for `then` operations to run.
    pub fn when(mut self, compares: impl IntoIterator<Item = Compare>) -> Self {
        self.request.compare.extend(compares);
        self
    }

    /// Operations applied when every condition holds.
    pub fn then(mut self, ops: impl IntoIterator<Item = Op>) -> Self {
        self.request.success.extend(ops);
        self
    }

    /// Operations applied when any condition fails.
    pub fn otherwise(mut self, ops: impl IntoIterator<Item = Op>) -> Self {
        self.request.failure.extend(ops);
        self
    }

    pub fn request(&self) -> &TxnRequest {
        &self.request
    }

    /// Submit the transaction.
    ///
    /// The commit counts as `success` when the store applied the `then`
    /// branch, and as `failed` when it errored, timed out, or a condition
    /// did not hold.
    pub async fn commit(self) -> Result<TxnResponse> {
        let SlowLogTxn {
            client,
            request,
            deadline,
            timeouts,
            metrics,
        } = self;

        let start = Instant::now();
        let result = bounded("txn", "commit", deadline, timeouts, client.txn(request)).await;

        let cost = start.elapsed();
        if cost > timeouts.slow_request_time {
            warn!(
                resp = ?result.as_ref().ok(),
                error = ?result.as_ref().err(),
                cost = ?cost,
                "txn runs too slow"
            );
        }

        let outcome = match &result {
            Ok(resp) if resp.succeeded => OUTCOME_SUCCESS,
            _ => OUTCOME_FAILED,
        };
        metrics.increment_outcome(outcome);
        metrics.observe_duration(outcome, cost.as_secs_f64());

        result
    }
}
