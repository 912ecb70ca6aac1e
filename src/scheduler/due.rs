// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! The staleness rule deciding whether a key must be fetched

use alloy_primitives::BlockNumber;

use crate::store::{CacheEntry, EntryState};
use crate::types::freshness::BlocksPerFetch;

/// Decide whether a key with the given entry and effective freshness is due
/// at chain head `head`.
///
/// - In-flight keys are never due.
/// - Keys that were never fetched, or whose last fetch failed, are always due.
/// - Fetched keys are due once `head - fetched_at >= max(freshness, 1)`.
///   A value is therefore due exactly when its age reaches the freshness
///   requirement, and never at the block it was fetched at.
///
/// # Examples
///
/// ```rust
/// use alloy_primitives::{address, bytes};
/// use multicache::{is_due, BlocksPerFetch, CacheStore, CallKey, CallOutcome};
///
/// let key = CallKey::new(address!("00000000000000000000000000000000000000aa"), bytes!("70a08231"));
/// let mut store = CacheStore::new();
/// store.write(&key, CallOutcome::Success(bytes!("01")), 100);
///
/// let entry = store.get(&key);
/// assert!(!is_due(104, entry, BlocksPerFetch::new(5)));
/// assert!(is_due(105, entry, BlocksPerFetch::new(5)));
/// ```
pub fn is_due(head: BlockNumber, entry: Option<&CacheEntry>, freshness: BlocksPerFetch) -> bool {
    let Some(entry) = entry else {
        return true;
    };
    if entry.is_fetching() {
        return false;
    }
    match entry.settled_state() {
        EntryState::NeverFetched | EntryState::FetchFailed => true,
        EntryState::Fetched => match entry.fetched_at() {
            Some(fetched_at) => head.saturating_sub(fetched_at) >= freshness.due_age(),
            None => true,
        },
        EntryState::Fetching => false,
    }
}
