// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Span creation helpers for multicache operations.
//!
//! Telemetry concerns are kept out of the business logic: instead of using
//! `#[instrument]` attributes, each instrumented operation has a span helper
//! in this module.
//!
//! Usage pattern:
//! ```rust,ignore
//! pub async fn my_operation(&self, param: Type) -> Result<T> {
//!     let span = spans::my_operation(param_value);
//!     async move { /* business logic */ }.instrument(span).await
//! }
//! ```

use alloy_primitives::{Address, BlockNumber};
use std::time::Duration;
use tracing::{Level, Span};

use crate::types::batch::BatchId;

/// Create span for one scheduling pass.
///
/// Parent: None, or the engine's `run` loop span
/// Children: execute_batch spans (one per dispatched batch)
#[inline]
pub(crate) fn scheduling_pass(head: Option<BlockNumber>) -> Span {
    tracing::debug_span!(
        "multicache.scheduling_pass",
        head = ?head,
        batches = tracing::field::Empty,
    )
}

/// Create span for fetching one batch.
///
/// Parent: scheduling_pass span
/// Children: aggregate_call span
#[inline]
pub(crate) fn execute_batch(batch: BatchId, calls: usize, dispatched_at: BlockNumber) -> Span {
    tracing::debug_span!(
        "multicache.execute_batch",
        batch = %batch,
        calls = calls,
        dispatched_at = dispatched_at,
    )
}

/// Create span for the aggregated `eth_call` against the Multicall3 contract.
///
/// Parent: execute_batch span
#[inline]
pub(crate) fn aggregate_call(multicall: Address, calls: usize) -> Span {
    tracing::trace_span!(
        "multicache.aggregate_call",
        multicall = %multicall,
        calls = calls,
    )
}

/// Create span for the long-running engine loop.
///
/// Parent: None (root span for this operation)
/// Children: scheduling_pass spans
#[inline]
pub(crate) fn run_engine(fallback_poll_interval: Duration) -> Span {
    tracing::span!(
        Level::INFO,
        "multicache.run_engine",
        fallback_poll_ms = fallback_poll_interval.as_millis() as u64,
    )
}

/// Create span for polling the chain head over HTTP.
///
/// Parent: None (root span for this operation)
#[inline]
pub(crate) fn poll_block_numbers(interval: Duration) -> Span {
    tracing::debug_span!(
        "multicache.poll_block_numbers",
        interval_ms = interval.as_millis() as u64,
    )
}
