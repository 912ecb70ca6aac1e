// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Errors surfaced to callers reading cached call results.

use alloy_primitives::Bytes;

/// A call request was rejected at the boundary before it reached the registry.
///
/// These are produced when parsing string inputs (addresses, hex call data, or
/// serialized call keys). Typed inputs built from [`Address`](alloy_primitives::Address)
/// and [`Bytes`] cannot be malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedCallError {
    /// The target is not a 20-byte hex address.
    #[error("Invalid target address: {input}")]
    InvalidAddress {
        /// The rejected input
        input: String,
    },

    /// The payload is not valid hex call data.
    #[error("Invalid call data {input}: {reason}")]
    InvalidCallData {
        /// The rejected input
        input: String,
        /// Why the payload was rejected
        reason: String,
    },

    /// A serialized call key is not of the form `<address>-<calldata>`.
    #[error("Invalid call key: {input}")]
    InvalidKey {
        /// The rejected input
        input: String,
    },
}

/// Why a cached call result is unavailable or failed.
///
/// This is the `error` field of [`CallState`](crate::CallState). It is cheap to clone
/// since every reader of a cache entry receives its own copy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallError {
    /// The individual call reverted inside an otherwise successful batch.
    #[error("Call reverted ({} bytes of revert data)", return_data.len())]
    Reverted {
        /// Raw revert data returned by the target
        return_data: Bytes,
    },

    /// The whole aggregated request failed (timeout, transport, or decoding).
    #[error("Batch failed: {reason}")]
    BatchFailed {
        /// Description of the batch-level failure
        reason: String,
    },

    /// The request was rejected before it was registered.
    #[error(transparent)]
    Malformed(#[from] MalformedCallError),

    /// The return data could not be decoded into the requested type.
    #[error("Failed to decode return data: {reason}")]
    Decode {
        /// Decoder error message
        reason: String,
    },
}

impl CallError {
    /// Returns `true` if the failure came from the remote call itself rather
    /// than the caller's input.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Reverted { .. } | Self::BatchFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverted_display_reports_length() {
        let err = CallError::Reverted {
            return_data: Bytes::from_static(&[0x08, 0xc3, 0x79, 0xa0]),
        };
        assert_eq!(err.to_string(), "Call reverted (4 bytes of revert data)");
    }

    #[test]
    fn test_malformed_is_not_remote() {
        let err = CallError::from(MalformedCallError::InvalidKey {
            input: "nope".to_string(),
        });
        assert!(!err.is_remote());
        assert!(CallError::BatchFailed {
            reason: "timeout".to_string()
        }
        .is_remote());
    }
}
