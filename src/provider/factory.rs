// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Provider factory functions

use alloy_network::{AnyNetwork, Network};
use alloy_provider::{ProviderBuilder, RootProvider};
use alloy_rpc_client::ClientBuilder;
use tracing::debug;

use crate::errors::RpcError;
use crate::transport::RequestSpacingLayer;

use super::config::ProviderConfig;

/// Type-erased HTTP provider returned by [`create_http_provider`]
pub type AnyHttpProvider = RootProvider<AnyNetwork>;

/// Create an HTTP provider with the given configuration
///
/// The provider uses `AnyNetwork`, so one engine setup works for any EVM chain.
/// When the configuration asks for rate limiting, requests are spaced out by a
/// [`RequestSpacingLayer`].
///
/// # Examples
///
/// ```rust
/// use multicache::{create_http_provider, ProviderConfig};
///
/// let provider = create_http_provider(
///     ProviderConfig::new("https://eth.llamarpc.com").with_rate_limit(10)
/// ).unwrap();
/// ```
///
/// # Errors
///
/// Returns [`RpcError::InvalidUrl`] if the URL cannot be parsed.
pub fn create_http_provider(config: ProviderConfig) -> Result<AnyHttpProvider, RpcError> {
    create_typed_http_provider::<AnyNetwork>(config)
}

/// Create an HTTP provider for a specific network type
///
/// # Examples
///
/// ```rust
/// use alloy_network::Ethereum;
/// use multicache::{create_typed_http_provider, ProviderConfig};
///
/// let provider = create_typed_http_provider::<Ethereum>(
///     ProviderConfig::local_node("http://localhost:8545")
/// ).unwrap();
/// ```
///
/// # Errors
///
/// Returns [`RpcError::InvalidUrl`] if the URL cannot be parsed.
pub fn create_typed_http_provider<N: Network>(
    config: ProviderConfig,
) -> Result<RootProvider<N>, RpcError> {
    let url: url::Url = config.url.parse().map_err(|e: url::ParseError| RpcError::InvalidUrl {
        url: config.url.clone(),
        reason: e.to_string(),
    })?;

    let client = match config.request_spacing() {
        Some(spacing) => {
            debug!(spacing_ms = spacing.as_millis() as u64, "Spacing RPC requests");
            ClientBuilder::default()
                .layer(RequestSpacingLayer::new(spacing))
                .http(url)
        }
        None => ClientBuilder::default().http(url),
    };

    Ok(ProviderBuilder::new()
        .disable_recommended_fillers()
        .network::<N>()
        .connect_client(client))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url_rejected() {
        let err = create_http_provider(ProviderConfig::new("not a url")).unwrap_err();
        assert!(matches!(err, RpcError::InvalidUrl { .. }));
    }

    #[test]
    fn test_rate_limited_provider_builds() {
        let config = ProviderConfig::public_endpoint("https://eth.llamarpc.com");
        assert!(create_http_provider(config).is_ok());
    }
}
