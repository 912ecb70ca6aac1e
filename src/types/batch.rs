// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Batch sizing and identification types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;

/// Upper bound on the number of calls aggregated into one remote request.
///
/// Aggregation contracts and RPC providers reject oversized payloads, so the
/// scheduler splits due keys into batches no larger than this.
///
/// # Examples
///
/// ```
/// use multicache::MaxBatchSize;
///
/// let size = MaxBatchSize::new(100).unwrap();
/// assert_eq!(size.as_usize(), 100);
/// assert!(MaxBatchSize::new(0).is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaxBatchSize(NonZeroUsize);

impl MaxBatchSize {
    /// Create a batch size limit; returns `None` for zero
    pub const fn new(size: usize) -> Option<Self> {
        match NonZeroUsize::new(size) {
            Some(size) => Some(Self(size)),
            None => None,
        }
    }

    /// Get the limit as a `usize`
    pub const fn as_usize(&self) -> usize {
        self.0.get()
    }
}

impl fmt::Display for MaxBatchSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a dispatched batch, unique within one engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(u64);

impl BatchId {
    pub(crate) const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw id
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    pub(crate) const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "batch#{}", self.0)
    }
}
