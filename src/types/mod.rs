// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Strong types for type safety across multicache.
//!
//! This module provides newtype wrappers for the engine's domain concepts:
//! - Freshness requirements (blocks per fetch)
//! - Listener identities
//! - Batch sizing and batch identifiers

pub mod batch;
pub mod freshness;
pub mod listener;

// Note: Public types are re-exported from lib.rs, not here
