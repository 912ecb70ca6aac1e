// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Listener identity type

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Stable identity of a caller that declares demand for call results.
///
/// Registrations are keyed by `(CallKey, ListenerId)`, so re-registering with
/// the same id replaces the earlier freshness value instead of adding a
/// duplicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Create a listener id from a raw value
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw id
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

/// Hands out unique listener ids for the lifetime of an engine
#[derive(Debug, Default)]
pub(crate) struct ListenerIdAllocator {
    next: AtomicU64,
}

impl ListenerIdAllocator {
    pub(crate) fn allocate(&self) -> ListenerId {
        ListenerId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}
