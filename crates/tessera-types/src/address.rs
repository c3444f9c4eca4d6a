//! Account addresses

use bech32::{Bech32, Hrp};
use ripemd::Ripemd160;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid bech32 address: {0}")]
    Bech32(String),

    #[error("invalid address length: {0}")]
    Length(usize),

    #[error("unknown address prefix: {0}")]
    UnknownPrefix(String),
}

/// Network an address belongs to; selects the bech32 prefix
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
}

impl Network {
    pub fn account_prefix(&self) -> &'static str {
        match self {
            Network::Mainnet => "iaa",
            Network::Testnet => "faa",
        }
    }

    fn from_account_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "iaa" => Some(Network::Mainnet),
            "faa" => Some(Network::Testnet),
            _ => None,
        }
    }
}

/// Account address - 20 bytes plus the network it is rendered for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccAddress {
    network: Network,
    bytes: [u8; 20],
}

impl AccAddress {
    pub fn new(network: Network, bytes: [u8; 20]) -> Self {
        Self { network, bytes }
    }

    /// ripemd160(sha256(pubkey_bytes))
    pub fn from_pubkey(network: Network, pubkey_bytes: &[u8]) -> Self {
        let sha256_hash = Sha256::digest(pubkey_bytes);
        let ripemd160_hash = Ripemd160::digest(sha256_hash);
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&ripemd160_hash);
        Self { network, bytes }
    }

    pub fn from_bech32(s: &str) -> Result<Self, AddressError> {
        let (hrp, data) = bech32::decode(s).map_err(|e| AddressError::Bech32(e.to_string()))?;
        let network = Network::from_account_prefix(hrp.as_str())
            .ok_or_else(|| AddressError::UnknownPrefix(hrp.to_string()))?;
        let bytes: [u8; 20] = data
            .as_slice()
            .try_into()
            .map_err(|_| AddressError::Length(data.len()))?;
        Ok(Self { network, bytes })
    }

    pub fn to_bech32(&self) -> String {
        let hrp = Hrp::parse_unchecked(self.network.account_prefix());
        // Encoding a 20-byte payload under a short static prefix cannot exceed
        // the bech32 length limit.
        bech32::encode::<Bech32>(hrp, &self.bytes).unwrap_or_default()
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.bytes
    }
}

impl fmt::Display for AccAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_bech32())
    }
}

impl FromStr for AccAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bech32(s)
    }
}

impl Serialize for AccAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_bech32())
    }
}

impl<'de> Deserialize<'de> for AccAddress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_bech32(&s).map_err(serde::de::Error::custom)
    }
}
