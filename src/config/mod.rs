// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Configuration for the multicall engine
//!
//! This module provides a flexible configuration system for controlling batch
//! sizes, fetch timeouts, the fallback scheduling cadence and the aggregation
//! contract address, globally and per chain.
//!
//! # Example: Using defaults
//!
//! ```rust
//! use multicache::EngineConfig;
//!
//! // 100 calls per batch, 10s timeout, faster fallback polling on rollups
//! let config = EngineConfig::default();
//! ```
//!
//! # Example: Custom configuration
//!
//! ```rust
//! use multicache::EngineConfigBuilder;
//! use std::time::Duration;
//! use alloy_chains::NamedChain;
//!
//! let config = EngineConfigBuilder::with_defaults()
//!     .max_batch_size(50)
//!     .chain_fetch_timeout(NamedChain::Polygon, Duration::from_secs(20))
//!     .build()
//!     .unwrap();
//! ```

use std::collections::HashMap;
use std::time::Duration;

use alloy_chains::NamedChain;
use alloy_primitives::Address;

use crate::errors::ConfigError;
use crate::types::batch::MaxBatchSize;

pub mod constants;

use constants::{
    DEFAULT_FALLBACK_POLL_INTERVAL, DEFAULT_FETCH_TIMEOUT, DEFAULT_MAX_BATCH_SIZE,
    FAST_CHAIN_FALLBACK_POLL_INTERVAL, MULTICALL3_ADDRESS, ZKSYNC_MULTICALL3_ADDRESS,
};

/// Configuration for the multicall engine
///
/// Use [`EngineConfigBuilder`] for a fluent API to construct instances.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum number of calls aggregated into one request
    /// Default: 100
    pub max_batch_size: MaxBatchSize,

    /// Timeout for one aggregated request
    /// Default: 10 seconds
    pub fetch_timeout: Duration,

    /// Interval of scheduling passes when no new chain head arrives
    /// Default: 12 seconds
    pub fallback_poll_interval: Duration,

    /// Address of the Multicall3 contract
    pub multicall_address: Address,

    /// Chain-specific overrides
    pub chain_overrides: HashMap<NamedChain, ChainConfig>,
}

/// Chain-specific configuration overrides
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainConfig {
    /// Override max batch size for this chain
    pub max_batch_size: Option<MaxBatchSize>,

    /// Override fetch timeout for this chain
    pub fetch_timeout: Option<Duration>,

    /// Override fallback poll interval for this chain
    pub fallback_poll_interval: Option<Duration>,

    /// Override the Multicall3 address for this chain
    pub multicall_address: Option<Address>,
}

/// Settings resolved for one chain, as consumed by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    /// Maximum number of calls per batch
    pub max_batch_size: MaxBatchSize,
    /// Timeout for one aggregated request
    pub fetch_timeout: Duration,
    /// Interval of fallback scheduling passes
    pub fallback_poll_interval: Duration,
    /// Address of the Multicall3 contract
    ///
    /// Only used by [`MulticallEngine::with_provider`](crate::MulticallEngine::with_provider);
    /// an engine built from a custom caller fetches wherever that caller points.
    pub multicall_address: Address,
}

impl EngineSettings {
    /// Check that the timeout and fallback interval are non-zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch_timeout.is_zero() {
            return Err(ConfigError::ZeroFetchTimeout);
        }
        if self.fallback_poll_interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }
        Ok(())
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineConfig::minimal().settings()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::with_common_defaults()
    }
}

impl EngineConfig {
    /// Create config with defaults suited to public chains
    ///
    /// Rollups with sub-second or one-second blocks (Arbitrum, Base, Optimism)
    /// get a faster fallback interval; zkSync Era uses its own Multicall3
    /// deployment.
    ///
    /// # Example
    ///
    /// ```rust
    /// use multicache::EngineConfig;
    /// use alloy_chains::NamedChain;
    /// use std::time::Duration;
    ///
    /// let config = EngineConfig::with_common_defaults();
    /// assert_eq!(config.get_fallback_poll_interval(NamedChain::Base), Duration::from_secs(2));
    /// assert_eq!(config.get_fallback_poll_interval(NamedChain::Mainnet), Duration::from_secs(12));
    /// ```
    pub fn with_common_defaults() -> Self {
        let mut config = Self::minimal();

        for chain in [NamedChain::Arbitrum, NamedChain::Base, NamedChain::Optimism] {
            config.set_chain_override(
                chain,
                ChainConfig {
                    fallback_poll_interval: Some(FAST_CHAIN_FALLBACK_POLL_INTERVAL),
                    ..ChainConfig::default()
                },
            );
        }

        config.set_chain_override(
            NamedChain::ZkSync,
            ChainConfig {
                multicall_address: Some(ZKSYNC_MULTICALL3_ADDRESS),
                ..ChainConfig::default()
            },
        );

        config
    }

    /// Create minimal config with global defaults and no chain overrides
    pub fn minimal() -> Self {
        Self {
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            fallback_poll_interval: DEFAULT_FALLBACK_POLL_INTERVAL,
            multicall_address: MULTICALL3_ADDRESS,
            chain_overrides: HashMap::new(),
        }
    }

    /// Get effective max batch size for a specific chain
    pub fn get_max_batch_size(&self, chain: NamedChain) -> MaxBatchSize {
        self.chain_overrides
            .get(&chain)
            .and_then(|c| c.max_batch_size)
            .unwrap_or(self.max_batch_size)
    }

    /// Get effective fetch timeout for a specific chain
    pub fn get_fetch_timeout(&self, chain: NamedChain) -> Duration {
        self.chain_overrides
            .get(&chain)
            .and_then(|c| c.fetch_timeout)
            .unwrap_or(self.fetch_timeout)
    }

    /// Get effective fallback poll interval for a specific chain
    pub fn get_fallback_poll_interval(&self, chain: NamedChain) -> Duration {
        self.chain_overrides
            .get(&chain)
            .and_then(|c| c.fallback_poll_interval)
            .unwrap_or(self.fallback_poll_interval)
    }

    /// Get effective Multicall3 address for a specific chain
    pub fn get_multicall_address(&self, chain: NamedChain) -> Address {
        self.chain_overrides
            .get(&chain)
            .and_then(|c| c.multicall_address)
            .unwrap_or(self.multicall_address)
    }

    /// Set chain-specific override
    pub fn set_chain_override(&mut self, chain: NamedChain, config: ChainConfig) {
        self.chain_overrides.insert(chain, config);
    }

    /// Global settings, ignoring chain overrides
    pub fn settings(&self) -> EngineSettings {
        EngineSettings {
            max_batch_size: self.max_batch_size,
            fetch_timeout: self.fetch_timeout,
            fallback_poll_interval: self.fallback_poll_interval,
            multicall_address: self.multicall_address,
        }
    }

    /// Settings with the overrides for `chain` applied
    ///
    /// # Example
    ///
    /// ```rust
    /// use multicache::{EngineConfig, MaxBatchSize};
    /// use alloy_chains::NamedChain;
    ///
    /// let settings = EngineConfig::default().settings_for(NamedChain::Arbitrum);
    /// assert_eq!(settings.max_batch_size, MaxBatchSize::new(100).unwrap());
    /// ```
    pub fn settings_for(&self, chain: NamedChain) -> EngineSettings {
        EngineSettings {
            max_batch_size: self.get_max_batch_size(chain),
            fetch_timeout: self.get_fetch_timeout(chain),
            fallback_poll_interval: self.get_fallback_poll_interval(chain),
            multicall_address: self.get_multicall_address(chain),
        }
    }

    /// Check that every global and per-chain value is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        let timeouts = std::iter::once(Some(self.fetch_timeout))
            .chain(self.chain_overrides.values().map(|c| c.fetch_timeout));
        if timeouts.flatten().any(|t| t.is_zero()) {
            return Err(ConfigError::ZeroFetchTimeout);
        }

        let intervals = std::iter::once(Some(self.fallback_poll_interval))
            .chain(self.chain_overrides.values().map(|c| c.fallback_poll_interval));
        if intervals.flatten().any(|i| i.is_zero()) {
            return Err(ConfigError::ZeroPollInterval);
        }

        Ok(())
    }
}

/// Builder for [`EngineConfig`]
///
/// # Example
///
/// ```rust
/// use multicache::EngineConfigBuilder;
/// use alloy_chains::NamedChain;
/// use std::time::Duration;
///
/// let config = EngineConfigBuilder::new()
///     .max_batch_size(250)
///     .fetch_timeout(Duration::from_secs(5))
///     .chain_fallback_poll_interval(NamedChain::Polygon, Duration::from_secs(2))
///     .build()
///     .unwrap();
/// ```
#[derive(Debug)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
    error: Option<ConfigError>,
}

impl Default for EngineConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineConfigBuilder {
    /// Create a new builder with minimal defaults
    pub fn new() -> Self {
        Self {
            config: EngineConfig::minimal(),
            error: None,
        }
    }

    /// Start with common defaults
    ///
    /// Initializes the builder with the same defaults as
    /// [`EngineConfig::with_common_defaults`].
    pub fn with_defaults() -> Self {
        Self {
            config: EngineConfig::with_common_defaults(),
            error: None,
        }
    }

    /// Set global max batch size; zero is rejected by [`build`](Self::build)
    pub fn max_batch_size(mut self, size: usize) -> Self {
        match MaxBatchSize::new(size) {
            Some(size) => self.config.max_batch_size = size,
            None => self.error = Some(ConfigError::ZeroBatchSize),
        }
        self
    }

    /// Set global fetch timeout
    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.config.fetch_timeout = timeout;
        self
    }

    /// Set global fallback poll interval
    pub fn fallback_poll_interval(mut self, interval: Duration) -> Self {
        self.config.fallback_poll_interval = interval;
        self
    }

    /// Set the global Multicall3 address
    pub fn multicall_address(mut self, address: Address) -> Self {
        self.config.multicall_address = address;
        self
    }

    /// Add chain-specific configuration
    pub fn chain_config(mut self, chain: NamedChain, config: ChainConfig) -> Self {
        self.config.set_chain_override(chain, config);
        self
    }

    /// Convenience: set max batch size for a specific chain
    pub fn chain_max_batch_size(mut self, chain: NamedChain, size: usize) -> Self {
        match MaxBatchSize::new(size) {
            Some(size) => self.chain_override(chain).max_batch_size = Some(size),
            None => self.error = Some(ConfigError::ZeroBatchSize),
        }
        self
    }

    /// Convenience: set fetch timeout for a specific chain
    pub fn chain_fetch_timeout(mut self, chain: NamedChain, timeout: Duration) -> Self {
        self.chain_override(chain).fetch_timeout = Some(timeout);
        self
    }

    /// Convenience: set fallback poll interval for a specific chain
    pub fn chain_fallback_poll_interval(mut self, chain: NamedChain, interval: Duration) -> Self {
        self.chain_override(chain).fallback_poll_interval = Some(interval);
        self
    }

    /// Convenience: set the Multicall3 address for a specific chain
    pub fn chain_multicall_address(mut self, chain: NamedChain, address: Address) -> Self {
        self.chain_override(chain).multicall_address = Some(address);
        self
    }

    fn chain_override(&mut self, chain: NamedChain) -> &mut ChainConfig {
        self.config.chain_overrides.entry(chain).or_default()
    }

    /// Validate and build the final configuration
    pub fn build(self) -> Result<EngineConfig, ConfigError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();

        assert_eq!(
            config.get_fallback_poll_interval(NamedChain::Arbitrum),
            FAST_CHAIN_FALLBACK_POLL_INTERVAL
        );
        assert_eq!(
            config.get_fallback_poll_interval(NamedChain::Polygon),
            DEFAULT_FALLBACK_POLL_INTERVAL
        );
        assert_eq!(
            config.get_multicall_address(NamedChain::ZkSync),
            ZKSYNC_MULTICALL3_ADDRESS
        );
        assert_eq!(
            config.get_multicall_address(NamedChain::Mainnet),
            MULTICALL3_ADDRESS
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_minimal_config() {
        let config = EngineConfig::minimal();
        assert!(config.chain_overrides.is_empty());
        assert_eq!(
            config.settings_for(NamedChain::Base),
            config.settings()
        );
    }

    #[test]
    fn test_builder_pattern() {
        let config = EngineConfigBuilder::new()
            .max_batch_size(25)
            .chain_fetch_timeout(NamedChain::Polygon, Duration::from_secs(30))
            .build()
            .unwrap();

        let polygon = config.settings_for(NamedChain::Polygon);
        assert_eq!(polygon.max_batch_size.as_usize(), 25);
        assert_eq!(polygon.fetch_timeout, Duration::from_secs(30));
        assert_eq!(
            config.get_fetch_timeout(NamedChain::Mainnet),
            DEFAULT_FETCH_TIMEOUT
        );
    }

    #[test]
    fn test_chain_overrides_preserve_existing() {
        let custom = address!("1111111111111111111111111111111111111111");
        let config = EngineConfigBuilder::with_defaults()
            .chain_multicall_address(NamedChain::Base, custom)
            .chain_max_batch_size(NamedChain::Base, 10)
            .build()
            .unwrap();

        let base = config.settings_for(NamedChain::Base);
        assert_eq!(base.multicall_address, custom);
        assert_eq!(base.max_batch_size.as_usize(), 10);
        assert_eq!(base.fallback_poll_interval, FAST_CHAIN_FALLBACK_POLL_INTERVAL);
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let err = EngineConfigBuilder::new().max_batch_size(0).build().unwrap_err();
        assert_eq!(err, ConfigError::ZeroBatchSize);

        let err = EngineConfigBuilder::new()
            .chain_max_batch_size(NamedChain::Base, 0)
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::ZeroBatchSize);
    }

    #[test]
    fn test_settings_validate_rejects_zero_durations() {
        let settings = EngineSettings {
            fetch_timeout: Duration::ZERO,
            ..EngineSettings::default()
        };
        assert_eq!(settings.validate(), Err(ConfigError::ZeroFetchTimeout));

        let settings = EngineSettings {
            fallback_poll_interval: Duration::ZERO,
            ..EngineSettings::default()
        };
        assert_eq!(settings.validate(), Err(ConfigError::ZeroPollInterval));
        assert!(EngineSettings::default().validate().is_ok());
    }

    #[test]
    fn test_zero_durations_rejected() {
        let err = EngineConfigBuilder::new()
            .fetch_timeout(Duration::ZERO)
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::ZeroFetchTimeout);

        let err = EngineConfigBuilder::new()
            .chain_fallback_poll_interval(NamedChain::Optimism, Duration::ZERO)
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::ZeroPollInterval);
    }
}
