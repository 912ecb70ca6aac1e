// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Cache entry and its lifecycle states

use alloy_primitives::{BlockNumber, Bytes};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::CallError;

/// Lifecycle state of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryState {
    /// No fetch has completed for this key yet
    NeverFetched,
    /// A fetch is in flight; any previous result is still readable
    Fetching,
    /// The latest fetch returned data
    Fetched,
    /// The latest fetch reverted or its batch failed
    FetchFailed,
}

impl fmt::Display for EntryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NeverFetched => "never-fetched",
            Self::Fetching => "fetching",
            Self::Fetched => "fetched",
            Self::FetchFailed => "fetch-failed",
        };
        f.write_str(s)
    }
}

/// Result of one call inside an aggregated response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    /// The call returned this data
    Success(Bytes),
    /// The call reverted with this data
    Reverted(Bytes),
}

/// Latest known result for a call key.
///
/// `fetched_at` only ever moves forward: writes stamped with an older block are
/// rejected by the store. A failed batch keeps the previous result and block so
/// readers can still show the last good value alongside the error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub(super) settled: EntryState,
    pub(super) in_flight: bool,
    pub(super) result: Option<Bytes>,
    pub(super) error: Option<CallError>,
    pub(super) fetched_at: Option<BlockNumber>,
}

impl CacheEntry {
    /// An entry for a key that has never been fetched
    pub const fn never_fetched() -> Self {
        Self {
            settled: EntryState::NeverFetched,
            in_flight: false,
            result: None,
            error: None,
            fetched_at: None,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> EntryState {
        if self.in_flight {
            EntryState::Fetching
        } else {
            self.settled
        }
    }

    /// State the entry will report once the in-flight fetch (if any) lands
    /// without changing it
    pub fn settled_state(&self) -> EntryState {
        self.settled
    }

    /// Returns `true` while a fetch for this key is outstanding
    pub fn is_fetching(&self) -> bool {
        self.in_flight
    }

    /// Return data of the latest successful call, if any
    pub fn result(&self) -> Option<&Bytes> {
        self.result.as_ref()
    }

    /// Failure of the latest fetch, if it failed
    pub fn error(&self) -> Option<&CallError> {
        self.error.as_ref()
    }

    /// Block the latest accepted write was evaluated at
    pub fn fetched_at(&self) -> Option<BlockNumber> {
        self.fetched_at
    }
}

impl Default for CacheEntry {
    fn default() -> Self {
        Self::never_fetched()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetching_overlays_settled_state() {
        let mut entry = CacheEntry::never_fetched();
        entry.in_flight = true;
        assert_eq!(entry.state(), EntryState::Fetching);
        assert_eq!(entry.settled_state(), EntryState::NeverFetched);
    }

    #[test]
    fn test_state_serializes_kebab_case() {
        let json = serde_json::to_string(&EntryState::FetchFailed).unwrap();
        assert_eq!(json, "\"fetch-failed\"");
        assert_eq!(EntryState::FetchFailed.to_string(), "fetch-failed");
        let back: EntryState = serde_json::from_str("\"never-fetched\"").unwrap();
        assert_eq!(back, EntryState::NeverFetched);
    }
}
