use std::fmt;
use std::str::FromStr;

use ethers_core::types::Address;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

pub const EVM_ADDR_BYTES_LEN: usize = 20;

/// A 20-byte EVM account or contract address.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EvmAddress(pub(crate) [u8; EVM_ADDR_BYTES_LEN]);

#[derive(Error, Clone, Debug, Eq, PartialEq)]
pub enum EvmAddressError {
    #[error("address is not 20 bytes")]
    LengthError,
    #[error("address is not a hex string")]
    FormatError,
}

impl EvmAddress {
    pub const ZERO: EvmAddress = EvmAddress([0u8; EVM_ADDR_BYTES_LEN]);

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn into_bytes(self) -> [u8; EVM_ADDR_BYTES_LEN] {
        self.0
    }
}

impl fmt::Display for EvmAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for EvmAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EvmAddress({})", self.to_hex())
    }
}

impl AsRef<[u8]> for EvmAddress {
    fn as_ref(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl From<[u8; EVM_ADDR_BYTES_LEN]> for EvmAddress {
    fn from(bytes: [u8; EVM_ADDR_BYTES_LEN]) -> Self {
        EvmAddress(bytes)
    }
}

impl From<EvmAddress> for Address {
    fn from(value: EvmAddress) -> Self {
        Address::from(value.0)
    }
}

impl From<Address> for EvmAddress {
    fn from(value: Address) -> Self {
        EvmAddress(value.0)
    }
}

impl FromStr for EvmAddress {
    type Err = EvmAddressError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let t = text.strip_prefix("0x").unwrap_or(text);
        let raw = hex::decode(t).map_err(|_e| EvmAddressError::FormatError)?;
        EvmAddress::try_from(raw)
    }
}

impl TryFrom<Vec<u8>> for EvmAddress {
    type Error = EvmAddressError;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        if value.len() != EVM_ADDR_BYTES_LEN {
            return Err(EvmAddressError::LengthError);
        }
        let mut c = [0u8; EVM_ADDR_BYTES_LEN];
        c.copy_from_slice(value.as_slice());
        Ok(EvmAddress(c))
    }
}

// The DTOs around this type are JSON-facing, so addresses serialize as
// 0x-prefixed hex strings rather than byte arrays.
impl Serialize for EvmAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for EvmAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        EvmAddress::from_str(&text).map_err(D::Error::custom)
    }
}
