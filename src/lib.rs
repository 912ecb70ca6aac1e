// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! # multicache
//!
//! Block-aware batching and caching of EVM contract reads.
//!
//! Many independent consumers declare which calls they need and how fresh the
//! results must be, measured in blocks. The engine collapses identical calls
//! into one [`CallKey`], fetches everything that is due on each new chain head
//! in as few Multicall3 round trips as possible, and serves reads from memory
//! without ever blocking on the network.
//!
//! ## Pipeline
//!
//! - [`DemandRegistry`]: who listens to which call, and how fresh they need it
//! - [`CacheStore`]: latest result per call, stamped with its block
//! - [`BatchScheduler`]: due keys per chain head, chunked into batches
//! - [`FetchExecutor`]: one aggregated read per batch, with a timeout
//! - [`CallSubscription`]: RAII demand registration and caller-facing reads
//!
//! [`MulticallEngine`] ties them together.
//!
//! ## Example
//!
//! ```rust,ignore
//! use multicache::{
//!     create_http_provider, BlocksPerFetch, CallKey, EngineConfig, Multicall3Caller,
//!     MulticallEngine, ProviderConfig,
//! };
//! use alloy_chains::NamedChain;
//! use alloy_network::AnyNetwork;
//!
//! let provider = create_http_provider(ProviderConfig::public_endpoint("https://eth.llamarpc.com"))?;
//! let settings = EngineConfig::default().settings_for(NamedChain::Mainnet);
//! let engine = MulticallEngine::<Multicall3Caller<_, AnyNetwork>>::with_provider(provider, settings)?;
//!
//! let mut subscription = engine.subscribe();
//! let state = subscription.observe(CallKey::for_call(token, &balanceOfCall { owner }), BlocksPerFetch::EVERY_BLOCK);
//! assert!(state.loading);
//!
//! engine.on_chain_head(21_000_000);
//! engine.run_pass().await;
//! let balance = subscription
//!     .observe(CallKey::for_call(token, &balanceOfCall { owner }), BlocksPerFetch::EVERY_BLOCK)
//!     .decode::<balanceOfCall>()?;
//! ```

pub mod call;
pub mod chain_head;
pub mod config;
pub mod demand;
pub mod engine;
pub mod errors;
pub mod fetch;
pub mod provider;
pub mod scheduler;
pub mod selector;
mod spans;
pub mod store;
pub mod transport;
pub mod types;

pub use call::CallKey;
#[cfg(feature = "ws")]
pub use chain_head::subscribe_block_numbers;
pub use chain_head::poll_block_numbers;
pub use config::{ChainConfig, EngineConfig, EngineConfigBuilder, EngineSettings};
pub use demand::DemandRegistry;
pub use engine::{MulticallEngine, PassReport};
pub use errors::{
    CallError, ConfigError, FetchError, MalformedCallError, MulticacheError, RpcError,
};
pub use fetch::{
    apply_outcome, AggregateCaller, AggregateResponse, AppliedBatch, FetchExecutor,
    Multicall3Caller,
};
pub use provider::{create_http_provider, create_typed_http_provider, AnyHttpProvider, ProviderConfig};
pub use scheduler::{is_due, Batch, BatchScheduler, PassPlan};
pub use selector::{CallState, CallSubscription};
pub use store::{CacheEntry, CacheStats, CacheStore, CallOutcome, EntryState, WriteOutcome};
pub use types::batch::{BatchId, MaxBatchSize};
pub use types::freshness::BlocksPerFetch;
pub use types::listener::ListenerId;
