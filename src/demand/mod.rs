// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Demand tracking for call keys
//!
//! The [`DemandRegistry`] records which listeners currently need which call
//! keys, and how fresh each of them needs the result to be. It is the single
//! source of truth for "is anyone still listening": the scheduler only fetches
//! keys it reports as active, and cache entries for keys it no longer reports
//! are evicted.
//!
//! The registry is pure bookkeeping. It never touches the network or the cache.

use std::collections::{BTreeMap, HashMap};

use tracing::trace;

use crate::call::CallKey;
use crate::types::{freshness::BlocksPerFetch, listener::ListenerId};

/// Registered listeners of one call key with their freshness requirements
type Listeners = HashMap<ListenerId, BlocksPerFetch>;

/// Tracks active listener registrations per call key.
///
/// Registrations are keyed by `(CallKey, ListenerId)`, which makes
/// [`register`](Self::register) idempotent: a listener re-registering on every
/// render replaces its previous freshness value instead of piling up entries.
///
/// Keys are kept ordered so that [`active_keys`](Self::active_keys) yields
/// them in a deterministic order every pass.
///
/// # Examples
///
/// ```rust
/// use alloy_primitives::{address, bytes};
/// use multicache::{BlocksPerFetch, CallKey, DemandRegistry, ListenerId};
///
/// let key = CallKey::new(address!("00000000000000000000000000000000000000aa"), bytes!("70a08231"));
/// let mut registry = DemandRegistry::default();
///
/// registry.register(key.clone(), ListenerId::new(1), BlocksPerFetch::new(5));
/// registry.register(key.clone(), ListenerId::new(2), BlocksPerFetch::new(2));
/// assert_eq!(registry.effective_freshness(&key), Some(BlocksPerFetch::new(2)));
///
/// registry.unregister(&key, ListenerId::new(2));
/// assert_eq!(registry.effective_freshness(&key), Some(BlocksPerFetch::new(5)));
///
/// registry.unregister(&key, ListenerId::new(1));
/// assert_eq!(registry.effective_freshness(&key), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DemandRegistry {
    keys: BTreeMap<CallKey, Listeners>,
}

impl DemandRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or update a registration
    ///
    /// Re-registering an existing `(key, listener)` pair replaces its freshness.
    pub fn register(&mut self, key: CallKey, listener: ListenerId, blocks_per_fetch: BlocksPerFetch) {
        trace!(key = %key, listener = %listener, blocks_per_fetch = blocks_per_fetch.as_u64(), "Registering demand");
        self.keys
            .entry(key)
            .or_default()
            .insert(listener, blocks_per_fetch);
    }

    /// Remove a registration; a no-op if it does not exist
    ///
    /// When the last listener of a key leaves, the key is dropped entirely so it
    /// stops appearing in [`active_keys`](Self::active_keys).
    pub fn unregister(&mut self, key: &CallKey, listener: ListenerId) {
        let Some(listeners) = self.keys.get_mut(key) else {
            return;
        };
        if listeners.remove(&listener).is_some() {
            trace!(key = %key, listener = %listener, "Unregistered demand");
        }
        if listeners.is_empty() {
            self.keys.remove(key);
        }
    }

    /// Strictest freshness across the key's listeners, or `None` without demand
    pub fn effective_freshness(&self, key: &CallKey) -> Option<BlocksPerFetch> {
        self.keys
            .get(key)
            .and_then(|listeners| listeners.values().min().copied())
    }

    /// Lazily iterate over every key with at least one listener
    ///
    /// The iterator borrows the registry and can be recreated each scheduling
    /// pass. Keys are yielded in [`CallKey`] order.
    pub fn active_keys(&self) -> impl Iterator<Item = &CallKey> + '_ {
        self.keys.keys()
    }

    /// Iterate over active keys together with their effective freshness
    pub fn active_demand(&self) -> impl Iterator<Item = (&CallKey, BlocksPerFetch)> + '_ {
        self.keys.iter().filter_map(|(key, listeners)| {
            listeners.values().min().map(|freshness| (key, *freshness))
        })
    }

    /// Returns `true` if anyone is listening to `key`
    pub fn is_active(&self, key: &CallKey) -> bool {
        self.keys.contains_key(key)
    }

    /// Number of listeners registered for `key`
    pub fn listener_count(&self, key: &CallKey) -> usize {
        self.keys.get(key).map_or(0, HashMap::len)
    }

    /// Number of keys with at least one listener
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if no key has listeners
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    fn key(byte: u8) -> CallKey {
        CallKey::new(
            address!("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"),
            vec![0x70, 0xa0, 0x82, byte],
        )
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut once = DemandRegistry::new();
        once.register(key(1), ListenerId::new(7), BlocksPerFetch::new(3));

        let mut twice = DemandRegistry::new();
        twice.register(key(1), ListenerId::new(7), BlocksPerFetch::new(3));
        twice.register(key(1), ListenerId::new(7), BlocksPerFetch::new(3));

        assert_eq!(once.listener_count(&key(1)), twice.listener_count(&key(1)));
        assert_eq!(
            once.effective_freshness(&key(1)),
            twice.effective_freshness(&key(1))
        );
        assert_eq!(twice.listener_count(&key(1)), 1);
    }

    #[test]
    fn test_reregister_replaces_freshness() {
        let mut registry = DemandRegistry::new();
        registry.register(key(1), ListenerId::new(1), BlocksPerFetch::new(1));
        registry.register(key(1), ListenerId::new(1), BlocksPerFetch::new(10));

        assert_eq!(registry.listener_count(&key(1)), 1);
        assert_eq!(
            registry.effective_freshness(&key(1)),
            Some(BlocksPerFetch::new(10))
        );
    }

    #[test]
    fn test_effective_freshness_is_minimum() {
        let mut registry = DemandRegistry::new();
        registry.register(key(1), ListenerId::new(1), BlocksPerFetch::new(8));
        registry.register(key(1), ListenerId::new(2), BlocksPerFetch::new(3));
        registry.register(key(1), ListenerId::new(3), BlocksPerFetch::new(5));

        assert_eq!(
            registry.effective_freshness(&key(1)),
            Some(BlocksPerFetch::new(3))
        );
    }

    #[test]
    fn test_unregister_absent_is_noop() {
        let mut registry = DemandRegistry::new();
        registry.unregister(&key(1), ListenerId::new(1));
        assert!(registry.is_empty());

        registry.register(key(1), ListenerId::new(1), BlocksPerFetch::new(1));
        registry.unregister(&key(1), ListenerId::new(2));
        assert_eq!(registry.listener_count(&key(1)), 1);
    }

    #[test]
    fn test_last_unregister_removes_key() {
        let mut registry = DemandRegistry::new();
        registry.register(key(1), ListenerId::new(1), BlocksPerFetch::new(1));
        registry.register(key(1), ListenerId::new(2), BlocksPerFetch::new(1));

        registry.unregister(&key(1), ListenerId::new(1));
        assert!(registry.is_active(&key(1)));

        registry.unregister(&key(1), ListenerId::new(2));
        assert!(!registry.is_active(&key(1)));
        assert_eq!(registry.active_keys().count(), 0);
        assert_eq!(registry.effective_freshness(&key(1)), None);
    }

    #[test]
    fn test_shared_key_listed_once() {
        let mut registry = DemandRegistry::new();
        for listener in 0..10 {
            registry.register(key(1), ListenerId::new(listener), BlocksPerFetch::new(1));
        }
        assert_eq!(registry.active_keys().collect::<Vec<_>>(), vec![&key(1)]);
    }

    #[test]
    fn test_active_keys_are_ordered_and_restartable() {
        let mut registry = DemandRegistry::new();
        registry.register(key(3), ListenerId::new(1), BlocksPerFetch::new(1));
        registry.register(key(1), ListenerId::new(1), BlocksPerFetch::new(1));
        registry.register(key(2), ListenerId::new(1), BlocksPerFetch::new(1));

        let first: Vec<_> = registry.active_keys().cloned().collect();
        let second: Vec<_> = registry.active_keys().cloned().collect();
        assert_eq!(first, vec![key(1), key(2), key(3)]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_churn_does_not_leak() {
        let mut registry = DemandRegistry::new();
        for _ in 0..1_000 {
            registry.register(key(1), ListenerId::new(1), BlocksPerFetch::new(1));
            registry.unregister(&key(1), ListenerId::new(1));
            registry.register(key(2), ListenerId::new(2), BlocksPerFetch::new(1));
        }
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.listener_count(&key(2)), 1);
    }
}
