// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Batch-level fetch errors.

use std::time::Duration;

/// Failure of an aggregated remote read as a whole.
///
/// Any of these marks every key of the batch `fetch-failed`. Individual call
/// reverts are not `FetchError`s; they are reported per item.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The aggregated call did not complete within the configured timeout.
    #[error("Aggregate call timed out after {}ms", timeout.as_millis())]
    Timeout {
        /// The timeout that elapsed
        timeout: Duration,
    },

    /// The transport or the aggregation contract itself failed.
    #[error("Aggregate call failed: {operation}")]
    Transport {
        /// Description of the operation that failed
        operation: String,
        /// The underlying provider error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The aggregated response could not be decoded.
    #[error("Failed to decode aggregate response: {reason}")]
    Decode {
        /// Decoder error message
        reason: String,
    },

    /// The response carried a different number of results than calls sent.
    #[error("Aggregate response has {actual} results for {expected} calls")]
    LengthMismatch {
        /// Number of calls in the batch
        expected: usize,
        /// Number of results returned
        actual: usize,
    },
}

impl FetchError {
    /// Helper to create a `Transport` error from any error type.
    pub fn transport(
        operation: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        FetchError::Transport {
            operation: operation.into(),
            source: Box::new(source),
        }
    }

    /// Helper to create a `Decode` error from any displayable error.
    pub fn decode(reason: impl std::fmt::Display) -> Self {
        FetchError::Decode {
            reason: reason.to_string(),
        }
    }
}
