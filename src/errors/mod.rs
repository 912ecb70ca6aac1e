// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for the multicache library.
//!
//! This module provides strongly-typed errors for all public APIs in multicache.
//! It follows a hybrid approach:
//!
//! - **Concern-specific errors** for fine-grained handling ([`MalformedCallError`],
//!   [`FetchError`], [`ConfigError`], [`RpcError`])
//! - **Unified error type** ([`MulticacheError`]) for convenience when you don't need
//!   to distinguish between error sources
//!
//! Read-side failures never surface as `Err`: the selector layer reports them in the
//! `error` field of a [`CallState`](crate::CallState) as a [`CallError`].
//!
//! # Examples
//!
//! ```rust
//! use multicache::{CallKey, MalformedCallError};
//!
//! let err = "0x1234-0x".parse::<CallKey>().unwrap_err();
//! assert!(matches!(err, MalformedCallError::InvalidAddress { .. }));
//! ```

mod call;
mod config;
mod fetch;
mod rpc;

pub use call::{CallError, MalformedCallError};
pub use config::ConfigError;
pub use fetch::FetchError;
pub use rpc::RpcError;

/// Unified error type for all multicache operations.
///
/// All concern-specific error types automatically convert to `MulticacheError` via
/// `From` implementations, so you can use `?` to propagate errors naturally.
#[derive(Debug, thiserror::Error)]
pub enum MulticacheError {
    /// A call could not be encoded into a call key.
    #[error("Malformed call: {0}")]
    Malformed(#[from] MalformedCallError),

    /// An aggregated remote read failed as a whole.
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// The engine configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A provider could not be built or queried.
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),
}
