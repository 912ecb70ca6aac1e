// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Tower layer spacing out RPC requests.
//!
//! Aggregated reads are few but heavy, and public endpoints throttle bursts.
//! [`RequestSpacingLayer`] hands every request a time slot at least `spacing`
//! after the previous one and delays the request until its slot.

use std::{
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex, PoisonError},
    task::{Context, Poll},
    time::Duration,
};

use tokio::time::Instant;
use tower::Layer;
use tracing::trace;

/// A Tower layer enforcing a minimum interval between request starts.
///
/// # Example
///
/// ```rust,ignore
/// use multicache::transport::RequestSpacingLayer;
/// use alloy_rpc_client::ClientBuilder;
///
/// // At most 10 requests per second
/// let client = ClientBuilder::default()
///     .layer(RequestSpacingLayer::per_second(10))
///     .http(rpc_url);
/// ```
#[derive(Clone, Debug)]
pub struct RequestSpacingLayer {
    spacing: Duration,
    next_slot: Arc<Mutex<Option<Instant>>>,
}

impl RequestSpacingLayer {
    /// Space requests at least `spacing` apart
    pub fn new(spacing: Duration) -> Self {
        Self {
            spacing,
            next_slot: Arc::new(Mutex::new(None)),
        }
    }

    /// Allow at most `requests` request starts per second; zero disables spacing
    ///
    /// ```rust
    /// use multicache::transport::RequestSpacingLayer;
    /// use std::time::Duration;
    ///
    /// let layer = RequestSpacingLayer::per_second(4);
    /// assert_eq!(layer.spacing(), Duration::from_millis(250));
    /// ```
    pub fn per_second(requests: u32) -> Self {
        let spacing = Duration::from_secs(1)
            .checked_div(requests)
            .unwrap_or(Duration::ZERO);
        Self::new(spacing)
    }

    /// Minimum interval between request starts
    pub fn spacing(&self) -> Duration {
        self.spacing
    }
}

impl<S> Layer<S> for RequestSpacingLayer {
    type Service = RequestSpacingService<S>;

    fn layer(&self, service: S) -> Self::Service {
        RequestSpacingService {
            service,
            spacing: self.spacing,
            next_slot: Arc::clone(&self.next_slot),
        }
    }
}

/// Reserve the next free slot and return how long to wait for it
fn reserve(next_slot: &Mutex<Option<Instant>>, spacing: Duration) -> Option<Duration> {
    let now = Instant::now();
    let mut next = next_slot.lock().unwrap_or_else(PoisonError::into_inner);
    let slot = next.map_or(now, |slot| slot.max(now));
    *next = Some(slot + spacing);
    (slot > now).then(|| slot - now)
}

/// A Tower service that delays requests to their reserved slot.
#[derive(Clone, Debug)]
pub struct RequestSpacingService<S> {
    service: S,
    spacing: Duration,
    next_slot: Arc<Mutex<Option<Instant>>>,
}

impl<S, Request> tower::Service<Request> for RequestSpacingService<S>
where
    S: tower::Service<Request> + Clone + Send + 'static,
    S::Future: Send,
    Request: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let wait = reserve(&self.next_slot, self.spacing);
        let mut service = self.service.clone();

        Box::pin(async move {
            if let Some(wait) = wait {
                trace!(wait_ms = wait.as_millis() as u64, "Delaying request");
                tokio::time::sleep(wait).await;
            }
            service.call(request).await
        })
    }
}
