// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Provider configuration options

use std::time::Duration;

/// Configuration for creating providers
///
/// # Example
///
/// ```rust
/// use multicache::ProviderConfig;
///
/// let config = ProviderConfig::new("https://eth.llamarpc.com")
///     .with_rate_limit(10);
/// assert!(config.has_rate_limiting());
/// ```
///
/// RPC request/response logging is handled natively by alloy's transport
/// layer at DEBUG/TRACE level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// RPC endpoint URL
    pub url: String,
    /// Rate limit in requests per second (None for unlimited)
    pub rate_limit_per_second: Option<u32>,
    /// Minimum delay between requests (alternative to rate limiting)
    pub min_delay: Option<Duration>,
}

impl ProviderConfig {
    /// Create a new provider configuration with the specified URL
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            rate_limit_per_second: None,
            min_delay: None,
        }
    }

    /// Set rate limiting (requests per second)
    #[must_use]
    pub fn with_rate_limit(mut self, requests_per_second: u32) -> Self {
        self.rate_limit_per_second = Some(requests_per_second);
        self
    }

    /// Set rate limiting from an optional value
    #[must_use]
    pub fn with_rate_limit_opt(mut self, requests_per_second: Option<u32>) -> Self {
        self.rate_limit_per_second = requests_per_second;
        self
    }

    /// Set minimum delay between requests
    #[must_use]
    pub fn with_min_delay(mut self, delay: Duration) -> Self {
        self.min_delay = Some(delay);
        self
    }

    /// Check if this configuration includes rate limiting
    #[must_use]
    pub fn has_rate_limiting(&self) -> bool {
        self.request_spacing().is_some()
    }

    /// Interval enforced between request starts, if any
    ///
    /// A rate limit takes precedence over a minimum delay.
    #[must_use]
    pub fn request_spacing(&self) -> Option<Duration> {
        match (self.rate_limit_per_second, self.min_delay) {
            (Some(rps), _) if rps > 0 => Some(Duration::from_secs(1) / rps),
            (_, Some(delay)) if !delay.is_zero() => Some(delay),
            _ => None,
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::new("http://localhost:8545")
    }
}

/// Preset configurations for common RPC providers
impl ProviderConfig {
    /// Configuration preset for public endpoints (conservative rate limiting)
    #[must_use]
    pub fn public_endpoint(url: impl Into<String>) -> Self {
        Self::new(url).with_rate_limit(5)
    }

    /// Configuration preset for private/paid endpoints (higher limits)
    #[must_use]
    pub fn private_endpoint(url: impl Into<String>) -> Self {
        Self::new(url).with_rate_limit(50)
    }

    /// Configuration preset for local nodes (no rate limiting)
    #[must_use]
    pub fn local_node(url: impl Into<String>) -> Self {
        Self::new(url)
    }
}
