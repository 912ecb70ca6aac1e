// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! The multicall engine
//!
//! [`MulticallEngine`] owns the demand registry, the cache store and the chain
//! head behind one mutex, and drives scheduling passes. The mutex is never held
//! across an await: a pass plans under the lock, releases it while batches are
//! in flight, and takes it again to write results back.
//!
//! # Example
//!
//! ```rust,ignore
//! use multicache::{
//!     create_http_provider, poll_block_numbers, BlocksPerFetch, CallKey, EngineConfig,
//!     Multicall3Caller, MulticallEngine, ProviderConfig,
//! };
//! use alloy_chains::NamedChain;
//! use alloy_network::AnyNetwork;
//! use std::time::Duration;
//!
//! let provider = create_http_provider(ProviderConfig::new("https://eth.llamarpc.com"))?;
//! let settings = EngineConfig::default().settings_for(NamedChain::Mainnet);
//! let engine = MulticallEngine::<Multicall3Caller<_, AnyNetwork>>::with_provider(provider.clone(), settings)?;
//!
//! let mut subscription = engine.subscribe();
//! subscription.observe(key, BlocksPerFetch::EVERY_BLOCK);
//!
//! let heads = poll_block_numbers(provider, Duration::from_secs(2));
//! tokio::spawn(async move { engine.run(heads).await });
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use alloy_network::Network;
use alloy_primitives::BlockNumber;
use alloy_provider::Provider;
use futures::{stream::FuturesUnordered, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, Instrument};

use crate::call::CallKey;
use crate::config::EngineSettings;
use crate::demand::DemandRegistry;
use crate::errors::ConfigError;
use crate::fetch::{apply_outcome, AggregateCaller, FetchExecutor, Multicall3Caller};
use crate::scheduler::BatchScheduler;
use crate::selector::{CallState, CallSubscription};
use crate::spans;
use crate::store::{CacheEntry, CacheStats, CacheStore};
use crate::types::freshness::BlocksPerFetch;
use crate::types::listener::{ListenerId, ListenerIdAllocator};

/// Summary of one scheduling pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassReport {
    /// Chain head the pass ran against
    pub head: Option<BlockNumber>,
    /// Keys found due
    pub due: usize,
    /// Batches dispatched
    pub batches: usize,
    /// Batches whose aggregated request succeeded
    pub succeeded_batches: usize,
    /// Batches that failed as a whole
    pub failed_batches: usize,
    /// Cache entries evicted for lack of listeners
    pub evicted: usize,
}

/// Mutable engine state guarded by a single lock
#[derive(Debug)]
pub(crate) struct EngineState {
    pub(crate) registry: DemandRegistry,
    pub(crate) store: CacheStore,
    pub(crate) scheduler: BatchScheduler,
    pub(crate) head: Option<BlockNumber>,
}

/// State shared between the engine and its subscriptions
#[derive(Debug)]
pub(crate) struct Shared {
    state: Mutex<EngineState>,
    revision: watch::Sender<u64>,
    listeners: ListenerIdAllocator,
}

impl Shared {
    fn new(scheduler: BatchScheduler) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            state: Mutex::new(EngineState {
                registry: DemandRegistry::new(),
                store: CacheStore::new(),
                scheduler,
                head: None,
            }),
            revision,
            listeners: ListenerIdAllocator::default(),
        }
    }

    /// Lock the engine state, recovering from a poisoned lock
    pub(crate) fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn allocate_listener(&self) -> ListenerId {
        self.listeners.allocate()
    }

    /// Notify watchers if the store changed since the last notification
    fn publish(&self, revision: u64) {
        self.revision.send_if_modified(|current| {
            if *current == revision {
                false
            } else {
                *current = revision;
                true
            }
        });
    }
}

/// Deduplicating, block-aware cache of contract reads
///
/// Cloning the engine is cheap; clones share all state.
pub struct MulticallEngine<C> {
    shared: Arc<Shared>,
    executor: Arc<FetchExecutor<C>>,
    fallback_poll_interval: Duration,
}

impl<C> Clone for MulticallEngine<C> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            executor: Arc::clone(&self.executor),
            fallback_poll_interval: self.fallback_poll_interval,
        }
    }
}

impl<C> std::fmt::Debug for MulticallEngine<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MulticallEngine")
            .field("head", &self.chain_head())
            .field("fallback_poll_interval", &self.fallback_poll_interval)
            .finish_non_exhaustive()
    }
}

impl<C> MulticallEngine<C> {
    /// Latest known chain head
    pub fn chain_head(&self) -> Option<BlockNumber> {
        self.shared.lock().head
    }

    /// Record a new chain head; returns `false` for repeated or older blocks
    pub fn on_chain_head(&self, block: BlockNumber) -> bool {
        let mut state = self.shared.lock();
        if state.head.is_some_and(|head| block <= head) {
            return false;
        }
        state.head = Some(block);
        true
    }

    /// Open a subscription for observing calls
    pub fn subscribe(&self) -> CallSubscription {
        CallSubscription::new(Arc::clone(&self.shared))
    }

    /// Current cache entry for `key`; never blocks on the network
    pub fn read(&self, key: &CallKey) -> CacheEntry {
        self.shared.lock().store.read(key)
    }

    /// Current entry for `key` in caller-facing form, without registering demand
    pub fn call_state(&self, key: &CallKey, blocks_per_fetch: BlocksPerFetch) -> CallState {
        let mut state = self.shared.lock();
        let entry = state.store.read(key);
        CallState::from_entry(&entry, state.head, blocks_per_fetch)
    }

    /// Keys with at least one listener, in key order
    pub fn active_keys(&self) -> Vec<CallKey> {
        self.shared.lock().registry.active_keys().cloned().collect()
    }

    /// Effective freshness of `key`, if anyone listens to it
    pub fn effective_freshness(&self, key: &CallKey) -> Option<BlocksPerFetch> {
        self.shared.lock().registry.effective_freshness(key)
    }

    /// Receiver of a counter that changes whenever cached data changes
    pub fn updates(&self) -> watch::Receiver<u64> {
        self.shared.revision.subscribe()
    }

    /// Snapshot of cache statistics
    pub fn stats(&self) -> CacheStats {
        self.shared.lock().store.stats().clone()
    }

    /// Interval of fallback passes in [`run`](Self::run)
    pub fn fallback_poll_interval(&self) -> Duration {
        self.fallback_poll_interval
    }
}

impl<C: AggregateCaller> MulticallEngine<C> {
    /// Create an engine fetching through `caller`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the fetch timeout or fallback interval is zero.
    pub fn new(caller: C, settings: EngineSettings) -> Result<Self, ConfigError> {
        settings.validate()?;
        Ok(Self {
            shared: Arc::new(Shared::new(BatchScheduler::new(settings.max_batch_size))),
            executor: Arc::new(FetchExecutor::new(caller, settings.fetch_timeout)),
            fallback_poll_interval: settings.fallback_poll_interval,
        })
    }

    /// Run one scheduling pass: evict, plan, fetch every batch, write back.
    ///
    /// Batches are fetched concurrently and independently; each one is written
    /// back and published as soon as it completes. Without a known chain head
    /// only eviction happens.
    pub async fn run_pass(&self) -> PassReport {
        let head = self.chain_head();
        let span = spans::scheduling_pass(head);

        async move {
            let plan = {
                let mut guard = self.shared.lock();
                let EngineState {
                    registry,
                    store,
                    scheduler,
                    head,
                } = &mut *guard;
                let plan = scheduler.plan(registry, store, *head);
                self.shared.publish(store.revision());
                plan
            };
            tracing::Span::current().record("batches", plan.batches.len());

            let mut report = PassReport {
                head: plan.head,
                due: plan.due,
                batches: plan.batches.len(),
                evicted: plan.evicted,
                ..PassReport::default()
            };

            let mut in_flight: FuturesUnordered<_> = plan
                .batches
                .iter()
                .map(|batch| {
                    let span = spans::execute_batch(batch.id(), batch.len(), batch.dispatched_at());
                    async move { (batch, self.executor.execute(batch).await) }.instrument(span)
                })
                .collect();

            while let Some((batch, outcome)) = in_flight.next().await {
                let mut state = self.shared.lock();
                if apply_outcome(&mut state.store, batch, outcome).succeeded {
                    report.succeeded_batches += 1;
                } else {
                    report.failed_batches += 1;
                }
                self.shared.publish(state.store.revision());
            }

            if report.batches > 0 {
                debug!(
                    due = report.due,
                    succeeded = report.succeeded_batches,
                    failed = report.failed_batches,
                    "Scheduling pass complete"
                );
            }
            report
        }
        .instrument(span)
        .await
    }

    /// Drive the engine from a stream of chain heads.
    ///
    /// Every strictly newer head triggers a pass. When no new head arrives
    /// within the fallback interval a pass runs anyway, so failed keys are
    /// retried and new demand is served on chains with slow blocks. Returns
    /// when the stream ends.
    pub async fn run<S>(&self, heads: S)
    where
        S: Stream<Item = BlockNumber>,
    {
        let span = spans::run_engine(self.fallback_poll_interval);

        async move {
            let mut heads = std::pin::pin!(heads);
            let mut fallback = tokio::time::interval(self.fallback_poll_interval);
            fallback.set_missed_tick_behavior(MissedTickBehavior::Delay);
            fallback.reset();

            loop {
                tokio::select! {
                    next = heads.next() => match next {
                        Some(block) => {
                            if self.on_chain_head(block) {
                                self.run_pass().await;
                                fallback.reset();
                            }
                        }
                        None => {
                            info!("Chain head stream ended, stopping engine");
                            break;
                        }
                    },
                    _ = fallback.tick() => {
                        self.run_pass().await;
                    }
                }
            }
        }
        .instrument(span)
        .await
    }
}

impl<P, N> MulticallEngine<Multicall3Caller<P, N>>
where
    P: Provider<N>,
    N: Network,
{
    /// Create an engine aggregating through the Multicall3 deployment named
    /// in `settings`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the fetch timeout or fallback interval is zero.
    pub fn with_provider(provider: P, settings: EngineSettings) -> Result<Self, ConfigError> {
        Self::new(
            Multicall3Caller::with_address(provider, settings.multicall_address),
            settings,
        )
    }
}
