// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Selector layer
//!
//! A [`CallSubscription`] is one consumer's handle on the engine. Observing a
//! call registers demand under the subscription's listener id and returns the
//! current cached state; observing a different call moves the demand over.
//! Dropping the subscription releases everything it registered.
//!
//! Reads never wait for the network. Consumers observe `loading`/`syncing`
//! and re-read once [`MulticallEngine::updates`](crate::MulticallEngine::updates)
//! signals a change.

mod state;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::call::CallKey;
use crate::engine::{EngineState, Shared};
use crate::types::freshness::BlocksPerFetch;
use crate::types::listener::ListenerId;

pub use state::CallState;

/// RAII registration of demand for a set of calls.
///
/// # Examples
///
/// ```rust,ignore
/// let mut subscription = engine.subscribe();
/// let state = subscription.observe(key, BlocksPerFetch::EVERY_BLOCK);
/// if let Some(data) = state.result { /* render */ }
/// drop(subscription); // demand released
/// ```
pub struct CallSubscription {
    shared: Arc<Shared>,
    listener: ListenerId,
    observed: BTreeMap<CallKey, BlocksPerFetch>,
}

impl CallSubscription {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        let listener = shared.allocate_listener();
        Self {
            shared,
            listener,
            observed: BTreeMap::new(),
        }
    }

    /// Listener id this subscription registers under
    pub fn listener(&self) -> ListenerId {
        self.listener
    }

    /// Keys currently registered by this subscription
    pub fn keys(&self) -> impl Iterator<Item = &CallKey> + '_ {
        self.observed.keys()
    }

    /// Observe a single call, replacing whatever was observed before
    pub fn observe(&mut self, key: CallKey, blocks_per_fetch: BlocksPerFetch) -> CallState {
        let mut states = self.observe_many([key], blocks_per_fetch);
        states.pop().unwrap_or_default()
    }

    /// Observe a call given as hex strings.
    ///
    /// Malformed input is rejected before it reaches the registry: previously
    /// observed calls are released and the returned state carries the error.
    pub fn observe_raw(
        &mut self,
        target: &str,
        call_data: &str,
        blocks_per_fetch: BlocksPerFetch,
    ) -> CallState {
        match CallKey::parse_parts(target, call_data) {
            Ok(key) => self.observe(key, blocks_per_fetch),
            Err(error) => {
                self.release();
                CallState::malformed(error)
            }
        }
    }

    /// Observe a set of calls with one freshness requirement.
    ///
    /// Keys no longer in the set are unregistered and new ones registered. The
    /// returned states follow the order of `keys`.
    pub fn observe_many(
        &mut self,
        keys: impl IntoIterator<Item = CallKey>,
        blocks_per_fetch: BlocksPerFetch,
    ) -> Vec<CallState> {
        let keys: Vec<CallKey> = keys.into_iter().collect();
        let wanted: BTreeMap<CallKey, BlocksPerFetch> = keys
            .iter()
            .map(|key| (key.clone(), blocks_per_fetch))
            .collect();

        let shared = Arc::clone(&self.shared);
        let mut state = shared.lock();
        self.retarget(&mut state, wanted);

        let head = state.head;
        keys.iter()
            .map(|key| {
                let entry = state.store.read(key);
                CallState::from_entry(&entry, head, blocks_per_fetch)
            })
            .collect()
    }

    /// Unregister every observed call, keeping the subscription usable
    pub fn release(&mut self) {
        if self.observed.is_empty() {
            return;
        }
        let shared = Arc::clone(&self.shared);
        let mut state = shared.lock();
        self.retarget(&mut state, BTreeMap::new());
    }

    fn retarget(&mut self, state: &mut EngineState, wanted: BTreeMap<CallKey, BlocksPerFetch>) {
        for key in self.observed.keys() {
            if !wanted.contains_key(key) {
                state.registry.unregister(key, self.listener);
                trace!(listener = %self.listener, key = %key, "Released call");
            }
        }
        for (key, blocks_per_fetch) in &wanted {
            if self.observed.get(key) != Some(blocks_per_fetch) {
                state
                    .registry
                    .register(key.clone(), self.listener, *blocks_per_fetch);
            }
        }
        self.observed = wanted;
    }
}

impl fmt::Debug for CallSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallSubscription")
            .field("listener", &self.listener)
            .field("observed", &self.observed)
            .finish()
    }
}

impl Drop for CallSubscription {
    fn drop(&mut self) {
        self.release();
    }
}
