// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Batch scheduling
//!
//! On every scheduling pass the [`BatchScheduler`]:
//!
//! 1. evicts cache entries whose keys have no listeners left,
//! 2. collects the active keys that are due at the current chain head
//!    (see [`is_due`]),
//! 3. splits them into batches of at most `max_batch_size` keys,
//! 4. marks every key of every batch as fetching before the batches are handed
//!    to the fetch executor.
//!
//! Batch assignment depends only on the set of due keys: keys are walked in
//! [`CallKey`] order and chunked, so the same due set always yields the same
//! batches.

mod due;

use alloy_primitives::BlockNumber;
use tracing::{debug, trace};

use crate::call::CallKey;
use crate::demand::DemandRegistry;
use crate::store::CacheStore;
use crate::types::batch::{BatchId, MaxBatchSize};

pub use due::is_due;

/// A group of call keys dispatched together in one aggregated request.
///
/// Batches only live for the duration of a scheduling pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    id: BatchId,
    keys: Vec<CallKey>,
    dispatched_at: BlockNumber,
}

impl Batch {
    /// Identifier of this batch
    pub fn id(&self) -> BatchId {
        self.id
    }

    /// Keys carried by this batch
    pub fn keys(&self) -> &[CallKey] {
        &self.keys
    }

    /// Chain head at the time the batch was planned
    pub fn dispatched_at(&self) -> BlockNumber {
        self.dispatched_at
    }

    /// Number of calls in the batch
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if the batch has no calls
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Outcome of planning one scheduling pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassPlan {
    /// Chain head the pass was planned against, if one was known
    pub head: Option<BlockNumber>,
    /// Batches to dispatch; their keys are already marked fetching
    pub batches: Vec<Batch>,
    /// Number of keys found due
    pub due: usize,
    /// Number of cache entries evicted for lack of listeners
    pub evicted: usize,
}

/// Plans scheduling passes over the demand registry and cache store.
#[derive(Debug, Clone)]
pub struct BatchScheduler {
    max_batch_size: MaxBatchSize,
    next_batch: BatchId,
}

impl BatchScheduler {
    /// Create a scheduler producing batches of at most `max_batch_size` keys
    pub fn new(max_batch_size: MaxBatchSize) -> Self {
        Self {
            max_batch_size,
            next_batch: BatchId::new(0),
        }
    }

    /// Maximum number of keys per batch
    pub fn max_batch_size(&self) -> MaxBatchSize {
        self.max_batch_size
    }

    /// Plan one pass: evict, compute due keys, partition, and mark fetching.
    ///
    /// Without a known chain head only eviction runs; nothing can be stamped or
    /// judged stale yet.
    pub fn plan(
        &mut self,
        registry: &DemandRegistry,
        store: &mut CacheStore,
        head: Option<BlockNumber>,
    ) -> PassPlan {
        let evicted = collect_garbage(registry, store);
        let Some(head) = head else {
            return PassPlan {
                evicted,
                ..PassPlan::default()
            };
        };

        let due = due_keys(registry, store, head);
        let due_count = due.len();
        let batches = self.partition(due, head);

        for batch in &batches {
            for key in batch.keys() {
                store.mark_fetching(key);
            }
        }

        if due_count > 0 {
            debug!(
                head,
                due = due_count,
                batches = batches.len(),
                evicted,
                "Planned scheduling pass"
            );
        } else {
            trace!(head, evicted, "Nothing due");
        }

        PassPlan {
            head: Some(head),
            batches,
            due: due_count,
            evicted,
        }
    }

    /// Split due keys into ordered batches bounded by the maximum batch size
    pub fn partition(&mut self, due: Vec<CallKey>, head: BlockNumber) -> Vec<Batch> {
        let size = self.max_batch_size.as_usize();
        due.chunks(size)
            .map(|chunk| {
                let id = self.next_batch;
                self.next_batch = id.next();
                Batch {
                    id,
                    keys: chunk.to_vec(),
                    dispatched_at: head,
                }
            })
            .collect()
    }
}

/// Active keys that are due at `head`, in [`CallKey`] order
pub fn due_keys(registry: &DemandRegistry, store: &CacheStore, head: BlockNumber) -> Vec<CallKey> {
    registry
        .active_demand()
        .filter(|(key, freshness)| is_due(head, store.get(key), *freshness))
        .map(|(key, _)| key.clone())
        .collect()
}

/// Evict every cache entry whose key has no listeners; returns how many were evicted
pub fn collect_garbage(registry: &DemandRegistry, store: &mut CacheStore) -> usize {
    let orphaned: Vec<CallKey> = store
        .keys()
        .filter(|key| !registry.is_active(key))
        .cloned()
        .collect();
    orphaned.iter().filter(|key| store.evict(key)).count()
}
