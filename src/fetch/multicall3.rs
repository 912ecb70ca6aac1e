// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Multicall3-backed aggregate caller

use std::marker::PhantomData;

use alloy_network::{Ethereum, Network, TransactionBuilder};
use alloy_primitives::{Address, Bytes};
use alloy_provider::Provider;
use alloy_sol_types::{sol, SolCall};
use async_trait::async_trait;
use tracing::{trace, Instrument};

use crate::call::CallKey;
use crate::config::constants::MULTICALL3_ADDRESS;
use crate::errors::FetchError;
use crate::spans;
use crate::store::CallOutcome;

use super::{AggregateCaller, AggregateResponse};

sol! {
    #[allow(missing_docs)]
    interface IMulticall3 {
        struct Call {
            address target;
            bytes callData;
        }

        struct Result {
            bool success;
            bytes returnData;
        }

        function tryBlockAndAggregate(bool requireSuccess, Call[] calldata calls)
            external
            payable
            returns (uint256 blockNumber, bytes32 blockHash, Result[] memory returnData);
    }
}

/// Aggregates calls through the Multicall3 contract's `tryBlockAndAggregate`.
///
/// Calls are sent with `requireSuccess = false`, so a reverting call is reported
/// as [`CallOutcome::Reverted`] instead of failing the batch. The returned block
/// number stamps every result of the batch.
///
/// # Examples
///
/// ```rust,ignore
/// use multicache::{create_http_provider, Multicall3Caller, ProviderConfig};
/// use alloy_network::AnyNetwork;
///
/// let provider = create_http_provider(ProviderConfig::new("https://eth.llamarpc.com"))?;
/// let caller = Multicall3Caller::<_, AnyNetwork>::new(provider);
/// ```
#[derive(Debug, Clone)]
pub struct Multicall3Caller<P, N = Ethereum> {
    provider: P,
    address: Address,
    _network: PhantomData<fn() -> N>,
}

impl<P, N> Multicall3Caller<P, N>
where
    P: Provider<N>,
    N: Network,
{
    /// Use the canonical Multicall3 deployment
    pub fn new(provider: P) -> Self {
        Self::with_address(provider, MULTICALL3_ADDRESS)
    }

    /// Use a Multicall3 deployment at a custom address
    pub fn with_address(provider: P, address: Address) -> Self {
        Self {
            provider,
            address,
            _network: PhantomData,
        }
    }

    /// Address of the aggregation contract
    pub fn address(&self) -> Address {
        self.address
    }

    /// The wrapped provider
    pub fn provider(&self) -> &P {
        &self.provider
    }
}

#[async_trait]
impl<P, N> AggregateCaller for Multicall3Caller<P, N>
where
    P: Provider<N>,
    N: Network,
{
    async fn aggregate(&self, calls: &[CallKey]) -> Result<AggregateResponse, FetchError> {
        let span = spans::aggregate_call(self.address, calls.len());

        async move {
            let request = N::TransactionRequest::default()
                .with_to(self.address)
                .with_input(encode_batch(calls));

            let raw = self
                .provider
                .call(request)
                .await
                .map_err(|e| FetchError::transport("eth_call tryBlockAndAggregate", e))?;

            let response = decode_batch(&raw)?;
            trace!(
                block = response.block_number,
                results = response.results.len(),
                "Decoded aggregate response"
            );
            Ok(response)
        }
        .instrument(span)
        .await
    }
}

/// ABI-encode a `tryBlockAndAggregate(false, calls)` invocation
pub(crate) fn encode_batch(calls: &[CallKey]) -> Bytes {
    IMulticall3::tryBlockAndAggregateCall {
        requireSuccess: false,
        calls: calls
            .iter()
            .map(|key| IMulticall3::Call {
                target: key.target(),
                callData: key.call_data().clone(),
            })
            .collect(),
    }
    .abi_encode()
    .into()
}

/// Decode the return data of `tryBlockAndAggregate`
pub(crate) fn decode_batch(raw: &[u8]) -> Result<AggregateResponse, FetchError> {
    let decoded =
        IMulticall3::tryBlockAndAggregateCall::abi_decode_returns(raw).map_err(FetchError::decode)?;

    let block_number = u64::try_from(decoded.blockNumber).map_err(|_| {
        FetchError::decode(format!(
            "block number {} does not fit in u64",
            decoded.blockNumber
        ))
    })?;

    let results = decoded
        .returnData
        .into_iter()
        .map(|item| {
            if item.success {
                CallOutcome::Success(item.returnData)
            } else {
                CallOutcome::Reverted(item.returnData)
            }
        })
        .collect();

    Ok(AggregateResponse {
        block_number,
        results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, bytes, B256, U256};
    use alloy_provider::ProviderBuilder;
    use alloy_sol_types::SolValue;
    use alloy_transport::mock::Asserter;

    fn encoded_response(block: u64, items: Vec<(bool, Bytes)>) -> Bytes {
        let results: Vec<IMulticall3::Result> = items
            .into_iter()
            .map(|(success, returnData)| IMulticall3::Result {
                success,
                returnData,
            })
            .collect();
        (U256::from(block), B256::ZERO, results)
            .abi_encode_params()
            .into()
    }

    #[test]
    fn test_encode_batch_uses_try_selector() {
        let key = CallKey::new(address!("1111111111111111111111111111111111111111"), bytes!("70a08231"));
        let encoded = encode_batch(&[key.clone()]);
        assert_eq!(&encoded[..4], &IMulticall3::tryBlockAndAggregateCall::SELECTOR);

        let decoded = IMulticall3::tryBlockAndAggregateCall::abi_decode(&encoded).unwrap();
        assert!(!decoded.requireSuccess);
        assert_eq!(decoded.calls.len(), 1);
        assert_eq!(decoded.calls[0].target, key.target());
        assert_eq!(&decoded.calls[0].callData, key.call_data());
    }

    #[test]
    fn test_decode_batch_maps_success_and_revert() {
        let raw = encoded_response(100, vec![(true, bytes!("2a")), (false, bytes!("08c379a0"))]);
        let response = decode_batch(&raw).unwrap();

        assert_eq!(response.block_number, 100);
        assert_eq!(
            response.results,
            vec![
                CallOutcome::Success(bytes!("2a")),
                CallOutcome::Reverted(bytes!("08c379a0")),
            ]
        );
    }

    #[test]
    fn test_decode_batch_rejects_garbage() {
        let err = decode_batch(&[0xde, 0xad]).unwrap_err();
        assert!(matches!(err, FetchError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_aggregate_through_mocked_provider() {
        let asserter = Asserter::new();
        asserter.push_success(&encoded_response(42, vec![(true, bytes!("01"))]));

        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_mocked_client(asserter.clone());
        let caller = Multicall3Caller::<_, Ethereum>::new(provider);

        let key = CallKey::new(address!("2222222222222222222222222222222222222222"), bytes!("06fdde03"));
        let response = caller.aggregate(&[key]).await.unwrap();

        assert_eq!(response.block_number, 42);
        assert_eq!(response.results, vec![CallOutcome::Success(bytes!("01"))]);
    }

    #[tokio::test]
    async fn test_aggregate_transport_failure() {
        let asserter = Asserter::new();
        asserter.push_failure_msg("upstream unavailable");

        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_mocked_client(asserter.clone());
        let caller = Multicall3Caller::<_, Ethereum>::new(provider);

        let key = CallKey::new(address!("2222222222222222222222222222222222222222"), bytes!("06fdde03"));
        let err = caller.aggregate(&[key]).await.unwrap_err();
        assert!(matches!(err, FetchError::Transport { .. }));
    }
}
