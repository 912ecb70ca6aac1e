// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Shared RPC error types for provider construction and chain-head sources.

/// Errors that can occur while building providers or watching the chain head.
///
/// # Examples
///
/// ```rust
/// use multicache::RpcError;
///
/// let error = RpcError::InvalidUrl {
///     url: "not a url".to_string(),
///     reason: "relative URL without a base".to_string(),
/// };
/// println!("Error: {}", error);
/// ```
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// The RPC endpoint URL could not be parsed.
    #[error("Invalid RPC URL {url}: {reason}")]
    InvalidUrl {
        /// The rejected URL
        url: String,
        /// Parser error message
        reason: String,
    },

    /// Failed to fetch the current block number.
    #[error("Failed to get current block number")]
    GetBlockNumberFailed {
        /// The underlying provider error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Failed to establish a block header subscription.
    #[error("Failed to subscribe to {subscription}")]
    SubscriptionFailed {
        /// What was being subscribed to
        subscription: &'static str,
        /// The underlying provider error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl RpcError {
    /// Helper to create a `GetBlockNumberFailed` error from any error type.
    pub fn get_block_number_failed(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        RpcError::GetBlockNumberFailed {
            source: Box::new(source),
        }
    }

    /// Helper to create a `SubscriptionFailed` error from any error type.
    pub fn subscription_failed(
        subscription: &'static str,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        RpcError::SubscriptionFailed {
            subscription,
            source: Box::new(source),
        }
    }
}
