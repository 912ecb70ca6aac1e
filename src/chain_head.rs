// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Chain-head sources
//!
//! Streams of block numbers to feed [`MulticallEngine::run`](crate::MulticallEngine::run).
//! [`poll_block_numbers`] works over any transport; `subscribe_block_numbers`
//! needs a pub/sub transport and the `ws` feature.

use std::time::Duration;

use alloy_network::Network;
use alloy_primitives::BlockNumber;
use alloy_provider::Provider;
use futures::{stream, Stream};
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{trace, warn, Instrument, Span};

use crate::config::constants::MIN_BLOCK_POLL_INTERVAL;
use crate::errors::RpcError;
use crate::spans;

struct PollState<P> {
    provider: P,
    ticker: Interval,
    last: Option<BlockNumber>,
    span: Span,
}

/// Poll `eth_blockNumber` every `interval`, yielding strictly increasing block numbers.
///
/// Failed polls are logged and skipped; the stream never ends on its own.
/// Intervals shorter than a millisecond are clamped.
///
/// # Examples
///
/// ```rust,ignore
/// use multicache::poll_block_numbers;
/// use futures::StreamExt;
/// use std::time::Duration;
///
/// let mut heads = std::pin::pin!(poll_block_numbers(provider, Duration::from_secs(2)));
/// while let Some(block) = heads.next().await {
///     println!("head: {block}");
/// }
/// ```
pub fn poll_block_numbers<P, N>(
    provider: P,
    interval: Duration,
) -> impl Stream<Item = BlockNumber> + Send
where
    P: Provider<N> + 'static,
    N: Network,
{
    if interval < MIN_BLOCK_POLL_INTERVAL {
        warn!(
            ?interval,
            min = ?MIN_BLOCK_POLL_INTERVAL,
            "Block poll interval too short, clamping"
        );
    }
    let interval = interval.max(MIN_BLOCK_POLL_INTERVAL);
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let state = PollState {
        provider,
        ticker,
        last: None,
        span: spans::poll_block_numbers(interval),
    };

    stream::unfold(state, |mut state| async move {
        let span = state.span.clone();
        async move {
            loop {
                state.ticker.tick().await;
                match state.provider.get_block_number().await {
                    Ok(block) if state.last.is_none_or(|last| block > last) => {
                        trace!(block, "New chain head");
                        state.last = Some(block);
                        return Some((block, state));
                    }
                    Ok(_) => {}
                    Err(e) => {
                        let error = RpcError::get_block_number_failed(e);
                        warn!(error = %error, "Chain head poll failed");
                    }
                }
            }
        }
        .instrument(span)
        .await
    })
}

/// Subscribe to new block headers and yield their numbers.
///
/// # Errors
///
/// Returns an error if the subscription cannot be established.
#[cfg(feature = "ws")]
pub async fn subscribe_block_numbers<P>(
    provider: &P,
) -> Result<impl Stream<Item = BlockNumber> + Send + 'static, RpcError>
where
    P: Provider,
{
    use futures::StreamExt;

    let subscription = provider
        .subscribe_blocks()
        .await
        .map_err(|e| RpcError::subscription_failed("newHeads", e))?;
    tracing::debug!("Block header subscription established");

    Ok(subscription.into_stream().map(|header| header.number))
}
