// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Freshness requirement for cached call results

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum tolerated staleness of a cached result, in blocks.
///
/// A listener registered with `BlocksPerFetch::new(5)` accepts a value fetched
/// up to five blocks ago. The effective requirement for a call key is the
/// strictest (smallest) value across all of its listeners.
///
/// A value of zero is accepted and treated like one when deciding whether a
/// key is due: a result is never refetched for the block it was fetched at.
///
/// # Examples
///
/// ```
/// use multicache::BlocksPerFetch;
///
/// let every_block = BlocksPerFetch::EVERY_BLOCK;
/// assert_eq!(every_block.as_u64(), 1);
///
/// let relaxed = BlocksPerFetch::new(10);
/// assert!(every_block < relaxed);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct BlocksPerFetch(u64);

impl BlocksPerFetch {
    /// Refresh on every new block
    pub const EVERY_BLOCK: Self = Self(1);

    /// Create a new freshness requirement
    pub const fn new(blocks: u64) -> Self {
        Self(blocks)
    }

    /// Get the raw number of blocks
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Minimum block age at which a fetched value becomes due again.
    ///
    /// Zero collapses to one so that a value is never due at the block it was
    /// fetched at.
    pub const fn due_age(&self) -> u64 {
        if self.0 == 0 {
            1
        } else {
            self.0
        }
    }
}

impl From<u64> for BlocksPerFetch {
    fn from(blocks: u64) -> Self {
        Self(blocks)
    }
}

impl fmt::Display for BlocksPerFetch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} blocks", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_due_age_collapses_zero_to_one() {
        assert_eq!(BlocksPerFetch::new(0).due_age(), 1);
        assert_eq!(BlocksPerFetch::new(1).due_age(), 1);
        assert_eq!(BlocksPerFetch::new(5).due_age(), 5);
    }

    #[test]
    fn test_ordering_prefers_strictest() {
        let values = [
            BlocksPerFetch::new(7),
            BlocksPerFetch::new(2),
            BlocksPerFetch::new(4),
        ];
        assert_eq!(values.iter().min(), Some(&BlocksPerFetch::new(2)));
    }

    #[test]
    fn test_serde_roundtrip() {
        let freshness = BlocksPerFetch::new(5);
        let json = serde_json::to_string(&freshness).unwrap();
        assert_eq!(json, "5");
        let deserialized: BlocksPerFetch = serde_json::from_str(&json).unwrap();
        assert_eq!(freshness, deserialized);
    }
}
