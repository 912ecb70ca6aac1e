// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Caller-facing view of a cache entry

use alloy_primitives::{BlockNumber, Bytes};
use alloy_sol_types::SolCall;

use crate::errors::{CallError, MalformedCallError};
use crate::scheduler::is_due;
use crate::store::CacheEntry;
use crate::types::freshness::BlocksPerFetch;

/// The state of one observed call, as handed to consumers.
///
/// - `loading`: no data and no error yet; a fetch is pending or about to be scheduled
/// - `syncing`: data is present, but a newer fetch is in flight or the data is stale
/// - `result`: return data of the latest successful call
/// - `block_number`: block the latest accepted write was evaluated at
/// - `error`: why the latest fetch failed, or why the call was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallState {
    /// No data and no error yet
    pub loading: bool,
    /// Data present but being refreshed
    pub syncing: bool,
    /// Raw return data
    pub result: Option<Bytes>,
    /// Block the result was evaluated at
    pub block_number: Option<BlockNumber>,
    /// Failure of the latest fetch
    pub error: Option<CallError>,
}

impl CallState {
    /// Translate a cache entry into a caller-facing state
    ///
    /// `head` and `freshness` decide whether present data counts as stale.
    pub fn from_entry(
        entry: &CacheEntry,
        head: Option<BlockNumber>,
        freshness: BlocksPerFetch,
    ) -> Self {
        let result = entry.result().cloned();
        let error = entry.error().cloned();
        let stale = head.is_some_and(|head| is_due(head, Some(entry), freshness));

        Self {
            loading: result.is_none() && error.is_none(),
            syncing: result.is_some() && (entry.is_fetching() || stale),
            result,
            block_number: entry.fetched_at(),
            error,
        }
    }

    /// State for a call rejected before it reached the registry
    pub fn malformed(error: MalformedCallError) -> Self {
        Self {
            loading: false,
            syncing: false,
            result: None,
            block_number: None,
            error: Some(CallError::Malformed(error)),
        }
    }

    /// Returns `true` if the latest fetch produced data and no error
    pub fn is_valid(&self) -> bool {
        self.result.is_some() && self.error.is_none()
    }

    /// Decode the return data as the output of `C`.
    ///
    /// Returns `Ok(None)` while there is no data; a stored error is returned as is.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use alloy_primitives::{Bytes, U256};
    /// use alloy_sol_types::{sol, SolValue};
    /// use multicache::CallState;
    ///
    /// sol! {
    ///     function balanceOf(address owner) external view returns (uint256);
    /// }
    ///
    /// let state = CallState {
    ///     loading: false,
    ///     syncing: false,
    ///     result: Some(Bytes::from(U256::from(42).abi_encode())),
    ///     block_number: Some(100),
    ///     error: None,
    /// };
    /// let balance = state.decode::<balanceOfCall>().unwrap();
    /// assert_eq!(balance, Some(U256::from(42)));
    /// ```
    pub fn decode<C: SolCall>(&self) -> Result<Option<C::Return>, CallError> {
        if let Some(error) = &self.error {
            return Err(error.clone());
        }
        self.result
            .as_ref()
            .map(|data| {
                C::abi_decode_returns(data).map_err(|e| CallError::Decode {
                    reason: e.to_string(),
                })
            })
            .transpose()
    }
}

impl Default for CallState {
    fn default() -> Self {
        Self {
            loading: true,
            syncing: false,
            result: None,
            block_number: None,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::CallKey;
    use crate::store::{CacheStore, CallOutcome};
    use alloy_primitives::{address, bytes, U256};
    use alloy_sol_types::{sol, SolValue};

    sol! {
        function totalSupply() external view returns (uint256);
    }

    fn key() -> CallKey {
        CallKey::new(address!("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"), bytes!("18160ddd"))
    }

    #[test]
    fn test_never_fetched_is_loading() {
        let state = CallState::from_entry(&CacheEntry::never_fetched(), Some(100), BlocksPerFetch::EVERY_BLOCK);
        assert!(state.loading);
        assert!(!state.syncing);
        assert!(state.result.is_none());
    }

    #[test]
    fn test_fresh_result() {
        let mut store = CacheStore::new();
        store.write(&key(), CallOutcome::Success(bytes!("01")), 100);

        let state = CallState::from_entry(store.get(&key()).unwrap(), Some(100), BlocksPerFetch::EVERY_BLOCK);
        assert!(!state.loading);
        assert!(!state.syncing);
        assert_eq!(state.result, Some(bytes!("01")));
        assert_eq!(state.block_number, Some(100));
        assert!(state.is_valid());
    }

    #[test]
    fn test_stale_or_refreshing_result_is_syncing() {
        let mut store = CacheStore::new();
        store.write(&key(), CallOutcome::Success(bytes!("01")), 100);

        let stale = CallState::from_entry(store.get(&key()).unwrap(), Some(101), BlocksPerFetch::EVERY_BLOCK);
        assert!(stale.syncing);

        let within = CallState::from_entry(store.get(&key()).unwrap(), Some(101), BlocksPerFetch::new(5));
        assert!(!within.syncing);

        store.mark_fetching(&key());
        let refreshing = CallState::from_entry(store.get(&key()).unwrap(), Some(100), BlocksPerFetch::new(5));
        assert!(refreshing.syncing);
        assert_eq!(refreshing.result, Some(bytes!("01")));
    }

    #[test]
    fn test_reverted_call_reports_error() {
        let mut store = CacheStore::new();
        store.write(&key(), CallOutcome::Reverted(bytes!("dead")), 100);

        let state = CallState::from_entry(store.get(&key()).unwrap(), Some(100), BlocksPerFetch::EVERY_BLOCK);
        assert!(!state.loading);
        assert!(matches!(state.error, Some(CallError::Reverted { .. })));
        assert!(state.decode::<totalSupplyCall>().is_err());
    }

    #[test]
    fn test_malformed_state() {
        let state = CallState::malformed(MalformedCallError::InvalidKey {
            input: "nope".to_string(),
        });
        assert!(!state.loading);
        assert!(matches!(state.error, Some(CallError::Malformed(_))));
    }

    #[test]
    fn test_decode_typed_return() {
        let state = CallState {
            result: Some(U256::from(7).abi_encode().into()),
            block_number: Some(1),
            loading: false,
            ..CallState::default()
        };
        assert_eq!(state.decode::<totalSupplyCall>().unwrap(), Some(U256::from(7)));
        assert_eq!(CallState::default().decode::<totalSupplyCall>().unwrap(), None);
    }

    #[test]
    fn test_decode_garbage_is_decode_error() {
        let state = CallState {
            result: Some(bytes!("01")),
            loading: false,
            ..CallState::default()
        };
        assert!(matches!(
            state.decode::<totalSupplyCall>(),
            Err(CallError::Decode { .. })
        ));
    }
}
