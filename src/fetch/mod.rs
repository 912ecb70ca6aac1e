// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Fetch execution
//!
//! A batch is sent to the chain as a single aggregated read through an
//! [`AggregateCaller`]. The [`FetchExecutor`] bounds each request with a timeout
//! and checks the response shape; [`apply_outcome`] writes the results back into
//! the [`CacheStore`].
//!
//! Batches are independent: one failing batch never affects another, and a
//! reverted call never affects the other calls of its batch.

mod multicall3;

use std::time::Duration;

use alloy_primitives::BlockNumber;
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::call::CallKey;
use crate::errors::{CallError, FetchError};
use crate::scheduler::Batch;
use crate::store::{CacheStore, CallOutcome, WriteOutcome};

pub use multicall3::{Multicall3Caller, IMulticall3};

/// Result of one aggregated read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateResponse {
    /// Block the whole batch was evaluated at
    pub block_number: BlockNumber,
    /// Per-call outcomes, in the order the calls were sent
    pub results: Vec<CallOutcome>,
}

/// Performs one aggregated remote read for a list of calls.
///
/// Implementations must evaluate every call at the same block, allow individual
/// calls to revert without failing the whole request, and return exactly one
/// outcome per call in request order.
#[async_trait]
pub trait AggregateCaller: Send + Sync {
    /// Execute `calls` in one request
    async fn aggregate(&self, calls: &[CallKey]) -> Result<AggregateResponse, FetchError>;
}

#[async_trait]
impl<T: AggregateCaller + ?Sized> AggregateCaller for std::sync::Arc<T> {
    async fn aggregate(&self, calls: &[CallKey]) -> Result<AggregateResponse, FetchError> {
        (**self).aggregate(calls).await
    }
}

/// Dispatches batches through an [`AggregateCaller`] with a per-request timeout
#[derive(Debug, Clone)]
pub struct FetchExecutor<C> {
    caller: C,
    timeout: Duration,
}

impl<C: AggregateCaller> FetchExecutor<C> {
    /// Create an executor that gives up on a request after `timeout`
    pub fn new(caller: C, timeout: Duration) -> Self {
        Self { caller, timeout }
    }

    /// The per-request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The underlying caller
    pub fn caller(&self) -> &C {
        &self.caller
    }

    /// Execute a batch and validate the response length
    pub async fn execute(&self, batch: &Batch) -> Result<AggregateResponse, FetchError> {
        let response = tokio::time::timeout(self.timeout, self.caller.aggregate(batch.keys()))
            .await
            .map_err(|_| FetchError::Timeout {
                timeout: self.timeout,
            })??;

        if response.results.len() != batch.len() {
            return Err(FetchError::LengthMismatch {
                expected: batch.len(),
                actual: response.results.len(),
            });
        }

        Ok(response)
    }
}

/// Per-batch bookkeeping returned by [`apply_outcome`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppliedBatch {
    /// Entries updated
    pub applied: usize,
    /// Writes dropped because a newer value was already stored
    pub stale: usize,
    /// Whether the aggregated request itself succeeded
    pub succeeded: bool,
}

/// Write the outcome of a batch into the store.
///
/// On success each result is written stamped with the response block. On
/// failure every key of the batch is marked failed with the same error; an
/// entry that already holds a success from at or after the dispatch block is
/// left alone.
pub fn apply_outcome(
    store: &mut CacheStore,
    batch: &Batch,
    outcome: Result<AggregateResponse, FetchError>,
) -> AppliedBatch {
    let mut report = AppliedBatch::default();

    match outcome {
        Ok(response) => {
            report.succeeded = true;
            for (key, result) in batch.keys().iter().zip(response.results) {
                match store.write(key, result, response.block_number) {
                    WriteOutcome::Applied => report.applied += 1,
                    WriteOutcome::Stale => report.stale += 1,
                }
            }
            debug!(
                batch = %batch.id(),
                block = response.block_number,
                applied = report.applied,
                stale = report.stale,
                "Applied batch results"
            );
        }
        Err(err) => {
            warn!(batch = %batch.id(), calls = batch.len(), error = %err, "Batch fetch failed");
            let error = CallError::BatchFailed {
                reason: err.to_string(),
            };
            for key in batch.keys() {
                match store.mark_failed(key, error.clone(), batch.dispatched_at()) {
                    WriteOutcome::Applied => report.applied += 1,
                    WriteOutcome::Stale => report.stale += 1,
                }
            }
        }
    }

    report
}
