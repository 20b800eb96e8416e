//! Misc Serde helpers for chainfuzz crates.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Deserializer, de};
use std::str::FromStr;

/// An enum that represents either a [serde_json::Number] integer, or a hex [U256].
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum NumberOrHexU256 {
    /// An integer
    Int(serde_json::Number),
    /// A hex or decimal string
    Hex(U256),
}

impl NumberOrHexU256 {
    /// Tries to convert this into a [U256].
    pub fn try_into_u256<E: de::Error>(self) -> Result<U256, E> {
        match self {
            Self::Int(num) => U256::from_str(num.to_string().as_str()).map_err(E::custom),
            Self::Hex(val) => Ok(val),
        }
    }
}

/// Deserializes the input into a U256, accepting both 0x-prefixed hex and decimal strings with
/// arbitrary precision, defined by serde_json's [`Number`](serde_json::Number).
pub fn from_int_or_hex<'de, D>(deserializer: D) -> Result<U256, D::Error>
where
    D: Deserializer<'de>,
{
    NumberOrHexU256::deserialize(deserializer)?.try_into_u256()
}

/// Deserializes the recipient of a transaction.
///
/// `null`, an empty string and the zero address all denote a contract creation.
pub fn deserialize_recipient<'de, D>(deserializer: D) -> Result<Option<Address>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(s) if s.is_empty() || s == "0x" => Ok(None),
        Some(s) => {
            let address = Address::from_str(&s).map_err(de::Error::custom)?;
            Ok((!address.is_zero()).then_some(address))
        }
    }
}
