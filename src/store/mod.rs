// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! In-memory store of call results
//!
//! The [`CacheStore`] keeps the latest known result per [`CallKey`] and the block
//! it was evaluated at. It is only mutated by the scheduler (marking keys as
//! fetching, evicting keys without demand) and by the fetch executor (writing
//! results back). Reads never block and never trigger a fetch.
//!
//! # Monotonicity
//!
//! Writes are accepted only if they are stamped with a block at or after the
//! stored one. Out-of-order network completions are dropped silently and
//! counted in [`CacheStats::stale_writes`].

mod entry;

use std::collections::HashMap;
use std::fmt;

use alloy_primitives::BlockNumber;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::call::CallKey;
use crate::errors::CallError;

pub use entry::{CacheEntry, CallOutcome, EntryState};

/// Whether a write changed the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The write was applied
    Applied,
    /// The write was older than the stored value and was dropped
    Stale,
}

/// Statistics about cache activity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Reads that found a fetched (or failed) entry
    pub hits: u64,
    /// Reads for keys that were never fetched
    pub misses: u64,
    /// Writes applied
    pub writes: u64,
    /// Writes rejected because a newer value was already stored
    pub stale_writes: u64,
    /// Batch failures recorded against entries
    pub failures: u64,
    /// Entries removed because nobody listens to them anymore
    pub evictions: u64,
    /// Current number of entries in the cache
    pub entries: usize,
}

impl CacheStats {
    /// Calculates the read hit rate as a percentage (0.0 to 100.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hits={}, misses={}, writes={}, stale_writes={}, failures={}, evictions={}, entries={}, hit_rate={:.1}%",
            self.hits,
            self.misses,
            self.writes,
            self.stale_writes,
            self.failures,
            self.evictions,
            self.entries,
            self.hit_rate()
        )
    }
}

/// Latest known call results keyed by [`CallKey`].
///
/// # Examples
///
/// ```rust
/// use alloy_primitives::{address, bytes};
/// use multicache::{CacheStore, CallKey, CallOutcome, EntryState, WriteOutcome};
///
/// let key = CallKey::new(address!("00000000000000000000000000000000000000aa"), bytes!("70a08231"));
/// let mut store = CacheStore::new();
///
/// store.write(&key, CallOutcome::Success(bytes!("01")), 100);
/// assert_eq!(store.write(&key, CallOutcome::Success(bytes!("02")), 99), WriteOutcome::Stale);
///
/// let entry = store.get(&key).unwrap();
/// assert_eq!(entry.state(), EntryState::Fetched);
/// assert_eq!(entry.fetched_at(), Some(100));
/// ```
#[derive(Debug, Default)]
pub struct CacheStore {
    entries: HashMap<CallKey, CacheEntry>,
    stats: CacheStats,
    revision: u64,
}

impl CacheStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the current entry for `key`, counting the read in the statistics
    ///
    /// Returns a never-fetched entry for unknown keys. Never blocks and never
    /// triggers a fetch.
    pub fn read(&mut self, key: &CallKey) -> CacheEntry {
        match self.entries.get(key) {
            Some(entry) if entry.settled != EntryState::NeverFetched => {
                self.stats.hits += 1;
                entry.clone()
            }
            Some(entry) => {
                self.stats.misses += 1;
                entry.clone()
            }
            None => {
                self.stats.misses += 1;
                CacheEntry::never_fetched()
            }
        }
    }

    /// Borrow the entry for `key` without touching statistics
    pub fn get(&self, key: &CallKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// Record the result of a call evaluated at `at_block`
    ///
    /// Accepted only if `at_block` is not older than the stored block. Either
    /// way the key is no longer considered in flight. Keys without an entry get
    /// one, even if nobody listens to them anymore; the next scheduling pass
    /// evicts those.
    pub fn write(&mut self, key: &CallKey, outcome: CallOutcome, at_block: BlockNumber) -> WriteOutcome {
        let entry = self.entries.entry(key.clone()).or_default();
        entry.in_flight = false;
        self.revision += 1;

        if entry.fetched_at.is_some_and(|stored| at_block < stored) {
            trace!(key = %key, at_block, stored = ?entry.fetched_at, "Dropping stale write");
            self.stats.stale_writes += 1;
            return WriteOutcome::Stale;
        }

        entry.fetched_at = Some(at_block);
        match outcome {
            CallOutcome::Success(data) => {
                entry.settled = EntryState::Fetched;
                entry.result = Some(data);
                entry.error = None;
            }
            CallOutcome::Reverted(return_data) => {
                entry.settled = EntryState::FetchFailed;
                entry.result = None;
                entry.error = Some(CallError::Reverted { return_data });
            }
        }
        self.stats.writes += 1;
        self.stats.entries = self.entries.len();
        WriteOutcome::Applied
    }

    /// Record that the batch carrying `key`, dispatched at `dispatched_at`, failed
    ///
    /// The previous result and block are kept. If the entry already holds a
    /// result or revert stamped at or after `dispatched_at`, the failure is
    /// older than what is stored and is dropped.
    pub fn mark_failed(
        &mut self,
        key: &CallKey,
        error: CallError,
        dispatched_at: BlockNumber,
    ) -> WriteOutcome {
        let entry = self.entries.entry(key.clone()).or_default();
        entry.in_flight = false;
        self.revision += 1;

        // Fetched values and reverts were evaluated at `fetched_at`; a batch
        // failure keeps the older stamp and never supersedes anything.
        let evaluated = entry.settled == EntryState::Fetched
            || matches!(entry.error, Some(CallError::Reverted { .. }));
        let superseded =
            evaluated && entry.fetched_at.is_some_and(|stored| stored >= dispatched_at);
        if superseded {
            self.stats.stale_writes += 1;
            return WriteOutcome::Stale;
        }

        entry.settled = EntryState::FetchFailed;
        entry.error = Some(error);
        self.stats.failures += 1;
        self.stats.entries = self.entries.len();
        WriteOutcome::Applied
    }

    /// Mark `key` as having a fetch in flight, creating its entry if needed
    pub fn mark_fetching(&mut self, key: &CallKey) {
        self.entries.entry(key.clone()).or_default().in_flight = true;
        self.stats.entries = self.entries.len();
        self.revision += 1;
    }

    /// Remove the entry for `key`
    ///
    /// Callers must only evict keys the demand registry reports as having no
    /// listeners.
    pub fn evict(&mut self, key: &CallKey) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            debug!(key = %key, "Evicting cache entry without listeners");
            self.stats.evictions += 1;
            self.stats.entries = self.entries.len();
            self.revision += 1;
        }
        removed
    }

    /// Iterate over every cached key
    pub fn keys(&self) -> impl Iterator<Item = &CallKey> + '_ {
        self.entries.keys()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the store holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Counter bumped on every mutation readers could observe
    pub fn revision(&self) -> u64 {
        self.revision
    }
}
