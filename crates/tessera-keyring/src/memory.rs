//! In-memory keyring
//!
//! Keys live only as long as the process. Intended for tests, scripts and
//! applications that load key material from their own secret store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tessera_crypto::{sign_message, PrivateKey, PublicKey};
use tessera_types::{AccAddress, Network};
use tokio::sync::RwLock;
use tracing::debug;
use zeroize::Zeroizing;

use crate::{KeyInfo, KeyProvider, KeyringError, MessageSigner, ResolvedKey};

struct StoredKey {
    privkey: PrivateKey,
    pubkey: PublicKey,
    address: AccAddress,
}

impl MessageSigner for StoredKey {
    fn public_key(&self) -> PublicKey {
        self.pubkey.clone()
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, KeyringError> {
        sign_message(&self.privkey, message).map_err(|e| KeyringError::SigningFailed(e.to_string()))
    }
}

/// Named keys held in memory
pub struct MemoryKeyring {
    network: Network,
    keys: RwLock<HashMap<String, Arc<StoredKey>>>,
}

impl MemoryKeyring {
    /// Create an empty keyring deriving addresses for `network`
    pub fn new(network: Network) -> Self {
        Self {
            network,
            keys: RwLock::new(HashMap::new()),
        }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// Generate and store a fresh secp256k1 key
    pub async fn create_key(&self, name: &str) -> Result<KeyInfo, KeyringError> {
        let privkey =
            PrivateKey::generate_secp256k1().map_err(|e| KeyringError::InvalidKey(e.to_string()))?;
        self.insert(name, privkey).await
    }

    /// Import a hex-encoded 32-byte private key
    ///
    /// The bytes are read as secp256k1 first and as ed25519 if they are not
    /// a valid secp256k1 scalar.
    pub async fn import_private_key(
        &self,
        name: &str,
        private_key_hex: &str,
    ) -> Result<KeyInfo, KeyringError> {
        let bytes = Zeroizing::new(
            hex::decode(private_key_hex.trim())
                .map_err(|e| KeyringError::InvalidKey(format!("invalid hex: {e}")))?,
        );

        if bytes.len() != 32 {
            return Err(KeyringError::InvalidKey(format!(
                "expected 32 bytes, got {}",
                bytes.len()
            )));
        }

        let privkey = match PrivateKey::secp256k1_from_slice(&bytes) {
            Ok(key) => key,
            Err(_) => PrivateKey::ed25519_from_slice(&bytes)
                .map_err(|e| KeyringError::InvalidKey(e.to_string()))?,
        };
        self.insert(name, privkey).await
    }

    /// Store an already constructed key
    pub async fn insert(&self, name: &str, privkey: PrivateKey) -> Result<KeyInfo, KeyringError> {
        let mut keys = self.keys.write().await;
        if keys.contains_key(name) {
            return Err(KeyringError::KeyExists(name.to_string()));
        }

        let pubkey = privkey.public_key();
        let address = pubkey.to_address(self.network);
        debug!(name, %address, algorithm = privkey.algorithm(), "stored key");

        keys.insert(
            name.to_string(),
            Arc::new(StoredKey {
                privkey,
                pubkey: pubkey.clone(),
                address,
            }),
        );

        Ok(KeyInfo {
            name: name.to_string(),
            pubkey,
            address,
        })
    }

    pub async fn get_key(&self, name: &str) -> Result<KeyInfo, KeyringError> {
        let keys = self.keys.read().await;
        let key = keys
            .get(name)
            .ok_or_else(|| KeyringError::KeyNotFound(name.to_string()))?;

        Ok(KeyInfo {
            name: name.to_string(),
            pubkey: key.pubkey.clone(),
            address: key.address,
        })
    }

    /// All keys, sorted by name
    pub async fn list_keys(&self) -> Vec<KeyInfo> {
        let keys = self.keys.read().await;
        let mut infos: Vec<KeyInfo> = keys
            .iter()
            .map(|(name, key)| KeyInfo {
                name: name.clone(),
                pubkey: key.pubkey.clone(),
                address: key.address,
            })
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }

    pub async fn delete_key(&self, name: &str) -> Result<(), KeyringError> {
        self.keys
            .write()
            .await
            .remove(name)
            .ok_or_else(|| KeyringError::KeyNotFound(name.to_string()))?;
        Ok(())
    }

    pub async fn sign(&self, name: &str, data: &[u8]) -> Result<Vec<u8>, KeyringError> {
        let keys = self.keys.read().await;
        let key = keys
            .get(name)
            .ok_or_else(|| KeyringError::KeyNotFound(name.to_string()))?;
        key.sign(data)
    }
}

impl Default for MemoryKeyring {
    fn default() -> Self {
        Self::new(Network::default())
    }
}

#[async_trait]
impl KeyProvider for MemoryKeyring {
    async fn resolve(&self, name: &str) -> Result<ResolvedKey, KeyringError> {
        let keys = self.keys.read().await;
        let key = keys
            .get(name)
            .ok_or_else(|| KeyringError::KeyNotFound(name.to_string()))?;

        Ok(ResolvedKey {
            address: key.address,
            signer: key.clone(),
        })
    }
}
