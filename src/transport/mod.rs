// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Transport layer utilities for Alloy providers.
//!
//! Tower middleware composed into the RPC client by
//! [`create_http_provider`](crate::create_http_provider).
//!
//! ## Usage
//!
//! ```rust,ignore
//! use multicache::transport::RequestSpacingLayer;
//! use alloy_rpc_client::ClientBuilder;
//! use alloy_provider::ProviderBuilder;
//!
//! let client = ClientBuilder::default()
//!     .layer(RequestSpacingLayer::per_second(10))
//!     .http(rpc_url);
//!
//! let provider = ProviderBuilder::new().connect_client(client);
//! ```

mod rate_limit;

pub use rate_limit::{RequestSpacingLayer, RequestSpacingService};
