//! Key representations using static enum dispatch

use ed25519_dalek::{SigningKey as Ed25519PrivKey, VerifyingKey as Ed25519PubKey};
use k256::ecdsa::{SigningKey as Secp256k1PrivKey, VerifyingKey as Secp256k1PubKey};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tessera_types::{AccAddress, EncodedPubKey, Network};
use thiserror::Error;
use zeroize::Zeroizing;

pub const SECP256K1_PUBKEY_TYPE: &str = "tendermint/PubKeySecp256k1";
pub const ED25519_PUBKEY_TYPE: &str = "tendermint/PubKeyEd25519";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("unknown public key type: {0}")]
    UnknownType(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),
}

/// All supported public key types
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PublicKey {
    Secp256k1(Secp256k1PubKey),
    Ed25519(Ed25519PubKey),
}

/// All supported private key types
#[derive(Clone, Debug)]
pub enum PrivateKey {
    Secp256k1(Secp256k1PrivKey),
    Ed25519(Ed25519PrivKey),
}

impl PublicKey {
    /// Derive the account address on `network`
    ///
    /// secp256k1 keys hash with ripemd160(sha256); ed25519 keys use the
    /// first 20 bytes of sha256.
    pub fn to_address(&self, network: Network) -> AccAddress {
        match self {
            PublicKey::Secp256k1(_) => AccAddress::from_pubkey(network, &self.to_bytes()),
            PublicKey::Ed25519(key) => {
                let digest = Sha256::digest(key.as_bytes());
                let mut bytes = [0u8; 20];
                bytes.copy_from_slice(&digest[..20]);
                AccAddress::new(network, bytes)
            }
        }
    }

    /// Wire type name for this key
    pub fn key_type(&self) -> &'static str {
        match self {
            PublicKey::Secp256k1(_) => SECP256K1_PUBKEY_TYPE,
            PublicKey::Ed25519(_) => ED25519_PUBKEY_TYPE,
        }
    }

    /// Compressed SEC1 bytes for secp256k1, raw bytes for ed25519
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            PublicKey::Secp256k1(key) => key.to_encoded_point(true).as_bytes().to_vec(),
            PublicKey::Ed25519(key) => key.as_bytes().to_vec(),
        }
    }

    pub fn from_encoded(encoded: &EncodedPubKey) -> Result<Self, KeyError> {
        match encoded.key_type.as_str() {
            SECP256K1_PUBKEY_TYPE => {
                let key = Secp256k1PubKey::from_sec1_bytes(&encoded.value)
                    .map_err(|e| KeyError::InvalidKey(e.to_string()))?;
                Ok(PublicKey::Secp256k1(key))
            }
            ED25519_PUBKEY_TYPE => {
                let bytes: [u8; 32] = encoded.value.as_slice().try_into().map_err(|_| {
                    KeyError::InvalidKey(format!(
                        "ed25519 key must be 32 bytes, got {}",
                        encoded.value.len()
                    ))
                })?;
                let key = Ed25519PubKey::from_bytes(&bytes)
                    .map_err(|e| KeyError::InvalidKey(e.to_string()))?;
                Ok(PublicKey::Ed25519(key))
            }
            other => Err(KeyError::UnknownType(other.to_string())),
        }
    }

    pub fn to_encoded(&self) -> EncodedPubKey {
        EncodedPubKey {
            key_type: self.key_type().to_string(),
            value: self.to_bytes(),
        }
    }
}

impl PrivateKey {
    /// Get the corresponding public key
    pub fn public_key(&self) -> PublicKey {
        match self {
            PrivateKey::Secp256k1(key) => PublicKey::Secp256k1(*key.verifying_key()),
            PrivateKey::Ed25519(key) => PublicKey::Ed25519(key.verifying_key()),
        }
    }

    /// Fresh random secp256k1 key
    pub fn generate_secp256k1() -> Result<Self, KeyError> {
        let mut bytes = Zeroizing::new([0u8; 32]);
        rand::thread_rng().fill_bytes(&mut *bytes);
        Self::secp256k1_from_slice(&*bytes)
    }

    /// Fresh random ed25519 key
    pub fn generate_ed25519() -> Self {
        let mut bytes = Zeroizing::new([0u8; 32]);
        rand::thread_rng().fill_bytes(&mut *bytes);
        PrivateKey::Ed25519(Ed25519PrivKey::from_bytes(&bytes))
    }

    pub fn secp256k1_from_slice(bytes: &[u8]) -> Result<Self, KeyError> {
        let key =
            Secp256k1PrivKey::from_slice(bytes).map_err(|e| KeyError::InvalidKey(e.to_string()))?;
        Ok(PrivateKey::Secp256k1(key))
    }

    pub fn ed25519_from_slice(bytes: &[u8]) -> Result<Self, KeyError> {
        let bytes: [u8; 32] = bytes.try_into().map_err(|_| {
            KeyError::InvalidKey(format!("ed25519 key must be 32 bytes, got {}", bytes.len()))
        })?;
        Ok(PrivateKey::Ed25519(Ed25519PrivKey::from_bytes(&bytes)))
    }

    /// Raw secret bytes, wiped when dropped
    pub fn to_bytes(&self) -> Zeroizing<Vec<u8>> {
        match self {
            PrivateKey::Secp256k1(key) => Zeroizing::new(key.to_bytes().to_vec()),
            PrivateKey::Ed25519(key) => Zeroizing::new(key.to_bytes().to_vec()),
        }
    }

    pub fn algorithm(&self) -> &'static str {
        match self {
            PrivateKey::Secp256k1(_) => "secp256k1",
            PrivateKey::Ed25519(_) => "ed25519",
        }
    }
}

impl Serialize for PublicKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_encoded().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let encoded = EncodedPubKey::deserialize(deserializer)?;
        PublicKey::from_encoded(&encoded).map_err(serde::de::Error::custom)
    }
}
