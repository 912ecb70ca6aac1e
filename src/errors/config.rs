// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation errors.

/// The engine configuration cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A batch must hold at least one call.
    #[error("max_batch_size must be greater than zero")]
    ZeroBatchSize,

    /// A zero timeout would fail every fetch immediately.
    #[error("fetch_timeout must be greater than zero")]
    ZeroFetchTimeout,

    /// A zero fallback interval would spin the scheduling loop.
    #[error("fallback_poll_interval must be greater than zero")]
    ZeroPollInterval,
}
