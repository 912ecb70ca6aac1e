// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Well-known addresses and defaults
//!
//! This module centralizes the Multicall3 deployment addresses and the default
//! scheduling parameters used throughout the multicache crate.

use std::time::Duration;

use alloy_primitives::{address, Address};

use crate::types::batch::MaxBatchSize;

/// Canonical Multicall3 deployment, identical on most EVM chains
///
/// Contract: 0xcA11bde05977b3631167028862bE2a173976CA11
pub const MULTICALL3_ADDRESS: Address = address!("ca11bde05977b3631167028862be2a173976ca11");

/// Multicall3 on zkSync Era, which cannot host the canonical deployment
///
/// Contract: 0xF9cda624FBC7e059355ce98a31693d299FACd963
pub const ZKSYNC_MULTICALL3_ADDRESS: Address = address!("f9cda624fbc7e059355ce98a31693d299facd963");

/// Default upper bound on calls per aggregated request
pub const DEFAULT_MAX_BATCH_SIZE: MaxBatchSize = match MaxBatchSize::new(100) {
    Some(size) => size,
    None => unreachable!(),
};

/// Default timeout for one aggregated request
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Default interval of scheduling passes when no new head arrives
pub const DEFAULT_FALLBACK_POLL_INTERVAL: Duration = Duration::from_secs(12);

/// Fallback interval for rollups producing blocks every second or faster
pub const FAST_CHAIN_FALLBACK_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Shortest interval at which block numbers are polled
pub const MIN_BLOCK_POLL_INTERVAL: Duration = Duration::from_millis(1);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multicall3_address() {
        assert_eq!(
            MULTICALL3_ADDRESS.to_checksum(None),
            "0xcA11bde05977b3631167028862bE2a173976CA11"
        );
    }

    #[test]
    fn test_default_batch_size() {
        assert_eq!(DEFAULT_MAX_BATCH_SIZE.as_usize(), 100);
    }
}
