// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Canonical call identities
//!
//! A [`CallKey`] is the identity of a read request: the target contract and the
//! exact ABI-encoded payload. Two requests with the same target and payload are
//! the same key no matter which caller issued them, which is what lets the
//! engine collapse demand from many callers into one fetch.
//!
//! Keys also have a canonical string form, `0x<address>-0x<calldata>` in lower
//! case hex, used when call descriptions arrive as untyped strings.
//!
//! # Examples
//!
//! ```rust
//! use alloy_primitives::{address, bytes};
//! use multicache::CallKey;
//!
//! let key = CallKey::new(
//!     address!("00000000000000000000000000000000000000aa"),
//!     bytes!("70a08231"),
//! );
//! assert_eq!(
//!     key.to_string(),
//!     "0x00000000000000000000000000000000000000aa-0x70a08231"
//! );
//! assert_eq!(key.to_string().parse::<CallKey>().unwrap(), key);
//! ```

use std::fmt;
use std::str::FromStr;

use alloy_primitives::{hex, Address, Bytes};
use alloy_sol_types::SolCall;
use serde::{Deserialize, Serialize};

use crate::errors::MalformedCallError;

/// Length of a hex-encoded address including the `0x` prefix
const ADDRESS_HEX_LEN: usize = 42;

/// Canonical identity of a read request: `(target, call_data)`.
///
/// Immutable once built. Ordering is by target, then payload, which is the
/// order the scheduler walks due keys in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CallKey {
    target: Address,
    call_data: Bytes,
}

impl CallKey {
    /// Create a key from a target address and raw call data
    pub fn new(target: Address, call_data: impl Into<Bytes>) -> Self {
        Self {
            target,
            call_data: call_data.into(),
        }
    }

    /// Create a key by ABI-encoding a `sol!` generated call
    ///
    /// ```rust
    /// use alloy_primitives::address;
    /// use alloy_sol_types::sol;
    /// use multicache::CallKey;
    ///
    /// sol! {
    ///     function balanceOf(address owner) external view returns (uint256);
    /// }
    ///
    /// let owner = address!("00000000000000000000000000000000000000bb");
    /// let key = CallKey::for_call(
    ///     address!("00000000000000000000000000000000000000aa"),
    ///     &balanceOfCall { owner },
    /// );
    /// assert_eq!(&key.call_data()[..4], &[0x70, 0xa0, 0x82, 0x31]);
    /// ```
    pub fn for_call<C: SolCall>(target: Address, call: &C) -> Self {
        Self::new(target, call.abi_encode())
    }

    /// Build a key from untyped string inputs
    ///
    /// The target must be a `0x`-prefixed 20-byte hex address and the payload a
    /// `0x`-prefixed hex string of even length (`0x` alone is an empty payload).
    pub fn parse_parts(target: &str, call_data: &str) -> Result<Self, MalformedCallError> {
        Ok(Self {
            target: parse_address(target)?,
            call_data: parse_call_data(call_data)?,
        })
    }

    /// The contract the call is sent to
    pub fn target(&self) -> Address {
        self.target
    }

    /// The ABI-encoded payload
    pub fn call_data(&self) -> &Bytes {
        &self.call_data
    }

    /// Four-byte selector of the payload, if it has one
    pub fn selector(&self) -> Option<[u8; 4]> {
        self.call_data.get(..4).and_then(|s| s.try_into().ok())
    }
}

impl fmt::Display for CallKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            hex::encode_prefixed(self.target),
            hex::encode_prefixed(&self.call_data)
        )
    }
}

impl FromStr for CallKey {
    type Err = MalformedCallError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (target, call_data) = s
            .split_once('-')
            .ok_or_else(|| MalformedCallError::InvalidKey {
                input: s.to_string(),
            })?;
        Self::parse_parts(target, call_data)
    }
}

fn parse_address(input: &str) -> Result<Address, MalformedCallError> {
    let invalid = || MalformedCallError::InvalidAddress {
        input: input.to_string(),
    };
    if input.len() != ADDRESS_HEX_LEN || !input.starts_with("0x") {
        return Err(invalid());
    }
    input.parse::<Address>().map_err(|_| invalid())
}

fn parse_call_data(input: &str) -> Result<Bytes, MalformedCallError> {
    let digits = input
        .strip_prefix("0x")
        .ok_or_else(|| MalformedCallError::InvalidCallData {
            input: input.to_string(),
            reason: "missing 0x prefix".to_string(),
        })?;
    hex::decode(digits)
        .map(Bytes::from)
        .map_err(|e| MalformedCallError::InvalidCallData {
            input: input.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, bytes};

    const TOKEN: Address = address!("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");

    #[test]
    fn test_identical_inputs_produce_equal_keys() {
        let a = CallKey::new(TOKEN, bytes!("70a08231"));
        let b = CallKey::new(TOKEN, vec![0x70, 0xa0, 0x82, 0x31]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_distinct_inputs_do_not_collide() {
        let other = address!("bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb");
        let base = CallKey::new(TOKEN, bytes!("70a08231"));
        assert_ne!(base, CallKey::new(other, bytes!("70a08231")));
        assert_ne!(base, CallKey::new(TOKEN, bytes!("70a0823100")));
        assert_ne!(base, CallKey::new(TOKEN, Bytes::new()));
    }

    #[test]
    fn test_display_is_lowercase_and_parses_back() {
        let key = CallKey::new(
            address!("AbCdEf0000000000000000000000000000000001"),
            bytes!("DEADBEEF"),
        );
        let s = key.to_string();
        assert_eq!(s, "0xabcdef0000000000000000000000000000000001-0xdeadbeef");
        assert_eq!(s.parse::<CallKey>().unwrap(), key);
    }

    #[test]
    fn test_empty_call_data_round_trips() {
        let key = CallKey::new(TOKEN, Bytes::new());
        assert_eq!(key.to_string().parse::<CallKey>().unwrap(), key);
        assert_eq!(key.selector(), None);
    }

    #[test]
    fn test_rejects_short_address() {
        let err = CallKey::parse_parts("0x1234", "0x").unwrap_err();
        assert!(matches!(err, MalformedCallError::InvalidAddress { .. }));
    }

    #[test]
    fn test_rejects_address_without_prefix() {
        let err = CallKey::parse_parts("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "0x").unwrap_err();
        assert!(matches!(err, MalformedCallError::InvalidAddress { .. }));
    }

    #[test]
    fn test_rejects_odd_length_call_data() {
        let err = CallKey::parse_parts("0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "0x123")
            .unwrap_err();
        assert!(matches!(err, MalformedCallError::InvalidCallData { .. }));
    }

    #[test]
    fn test_rejects_non_hex_call_data() {
        let err = CallKey::parse_parts("0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "0xzz")
            .unwrap_err();
        assert!(matches!(err, MalformedCallError::InvalidCallData { .. }));
    }

    #[test]
    fn test_rejects_key_without_separator() {
        let err = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"
            .parse::<CallKey>()
            .unwrap_err();
        assert!(matches!(err, MalformedCallError::InvalidKey { .. }));
    }

    #[test]
    fn test_selector() {
        let key = CallKey::new(TOKEN, bytes!("70a0823100000000"));
        assert_eq!(key.selector(), Some([0x70, 0xa0, 0x82, 0x31]));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: the string form identifies the key exactly
            #[test]
            fn test_string_form_is_injective(
                target in any::<[u8; 20]>(),
                data in prop::collection::vec(any::<u8>(), 0..64),
            ) {
                let key = CallKey::new(Address::from(target), data);
                let parsed: CallKey = key.to_string().parse().unwrap();
                prop_assert_eq!(parsed, key);
            }
        }
    }
}
