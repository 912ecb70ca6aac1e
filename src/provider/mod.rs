// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Provider construction
//!
//! The engine is generic over any [`AggregateCaller`](crate::AggregateCaller);
//! in production that is a [`Multicall3Caller`](crate::Multicall3Caller) over an
//! alloy provider. This module builds such providers from a [`ProviderConfig`].
//!
//! # Examples
//!
//! ```rust,ignore
//! use multicache::{create_http_provider, ProviderConfig};
//!
//! let provider = create_http_provider(
//!     ProviderConfig::new("https://eth.llamarpc.com").with_rate_limit(10)
//! )?;
//! let block_number = provider.get_block_number().await?;
//! ```

mod config;
mod factory;

pub use config::ProviderConfig;
pub use factory::{create_http_provider, create_typed_http_provider, AnyHttpProvider};
