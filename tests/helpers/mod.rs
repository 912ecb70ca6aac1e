// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Test helpers for multicache integration tests
//!
//! Provides a scripted [`AggregateCaller`] so the engine can be exercised
//! without a real blockchain connection.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy_primitives::{Address, BlockNumber, Bytes};
use async_trait::async_trait;
use multicache::{
    AggregateCaller, AggregateResponse, BlocksPerFetch, CallKey, CallOutcome, EngineConfigBuilder,
    EngineSettings, FetchError, MulticallEngine,
};

/// Mock AggregateCaller for testing engine logic
///
/// By default every call succeeds and returns its own call data, evaluated at
/// the configured block.
///
/// # Example
///
/// ```rust,ignore
/// let mock = MockAggregateCaller::at_block(100)
///     .with_result(key.clone(), bytes!("2a"))
///     .with_revert(other.clone());
/// ```
#[derive(Default)]
pub struct MockAggregateCaller {
    block: AtomicU64,
    results: HashMap<CallKey, Bytes>,
    reverts: HashSet<CallKey>,
    delay: Option<Duration>,
    slow_targets: HashMap<Address, Duration>,
    failures_left: AtomicUsize,
    batches: Mutex<Vec<Vec<CallKey>>>,
}

#[allow(dead_code)]
impl MockAggregateCaller {
    /// Create a mock evaluating every batch at `block`
    pub fn at_block(block: BlockNumber) -> Self {
        Self {
            block: AtomicU64::new(block),
            ..Self::default()
        }
    }

    /// Return `data` for `key` instead of echoing its call data
    pub fn with_result(mut self, key: CallKey, data: Bytes) -> Self {
        self.results.insert(key, data);
        self
    }

    /// Make `key` revert
    pub fn with_revert(mut self, key: CallKey) -> Self {
        self.reverts.insert(key);
        self
    }

    /// Delay every response
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Delay requests carrying a call to `target`
    pub fn with_slow_target(mut self, target: Address, delay: Duration) -> Self {
        self.slow_targets.insert(target, delay);
        self
    }

    /// Fail the next `count` requests with a transport error
    pub fn failing(self, count: usize) -> Self {
        self.failures_left.store(count, Ordering::SeqCst);
        self
    }

    /// Move the block responses are evaluated at
    pub fn set_block(&self, block: BlockNumber) {
        self.block.store(block, Ordering::SeqCst);
    }

    /// Number of aggregated requests received
    pub fn request_count(&self) -> usize {
        self.batches.lock().unwrap().len()
    }

    /// Keys of every request received, in arrival order
    pub fn batches(&self) -> Vec<Vec<CallKey>> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl AggregateCaller for MockAggregateCaller {
    async fn aggregate(&self, calls: &[CallKey]) -> Result<AggregateResponse, FetchError> {
        self.batches.lock().unwrap().push(calls.to_vec());

        let slowest = calls
            .iter()
            .filter_map(|key| self.slow_targets.get(&key.target()))
            .chain(self.delay.as_ref())
            .max();
        if let Some(delay) = slowest {
            tokio::time::sleep(*delay).await;
        }

        let failed = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(FetchError::transport(
                "eth_call",
                std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection reset"),
            ));
        }

        let results = calls
            .iter()
            .map(|key| {
                if self.reverts.contains(key) {
                    CallOutcome::Reverted(Bytes::new())
                } else {
                    CallOutcome::Success(
                        self.results
                            .get(key)
                            .cloned()
                            .unwrap_or_else(|| key.call_data().clone()),
                    )
                }
            })
            .collect();

        Ok(AggregateResponse {
            block_number: self.block.load(Ordering::SeqCst),
            results,
        })
    }
}

/// Install a test log subscriber honoring `RUST_LOG`; safe to call repeatedly
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Engine settings for tests: `max_batch_size` calls per batch, 1s timeout
#[allow(dead_code)]
pub fn test_settings(max_batch_size: usize) -> EngineSettings {
    EngineConfigBuilder::new()
        .max_batch_size(max_batch_size)
        .fetch_timeout(Duration::from_secs(1))
        .build()
        .unwrap()
        .settings()
}

/// Engine over a shared mock so tests can inspect the requests it received
#[allow(dead_code)]
pub fn engine_with(
    mock: MockAggregateCaller,
    max_batch_size: usize,
) -> (MulticallEngine<Arc<MockAggregateCaller>>, Arc<MockAggregateCaller>) {
    let mock = Arc::new(mock);
    let engine = MulticallEngine::new(Arc::clone(&mock), test_settings(max_batch_size)).unwrap();
    (engine, mock)
}

/// Call key `target`/`selector ++ [n]`
#[allow(dead_code)]
pub fn call_key(target: Address, n: u8) -> CallKey {
    CallKey::new(target, vec![0x70, 0xa0, 0x82, 0x31, n])
}

/// Freshness shorthand
#[allow(dead_code)]
pub fn every(blocks: u64) -> BlocksPerFetch {
    BlocksPerFetch::new(blocks)
}
