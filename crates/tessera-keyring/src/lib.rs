//! Key management for tessera
//!
//! The client never touches key material directly. It asks a
//! [`KeyProvider`] to resolve a signer name into an address plus a
//! [`MessageSigner`], and signs through that capability.

use async_trait::async_trait;
use std::sync::Arc;
use tessera_crypto::PublicKey;
use tessera_types::AccAddress;
use thiserror::Error;

pub mod memory;

pub use memory::MemoryKeyring;

#[derive(Error, Debug)]
pub enum KeyringError {
    #[error("key not found: {0}")]
    KeyNotFound(String),

    #[error("key already exists: {0}")]
    KeyExists(String),

    #[error("invalid private key: {0}")]
    InvalidKey(String),

    #[error("signing failed: {0}")]
    SigningFailed(String),

    #[error("backend error: {0}")]
    BackendError(String),
}

/// Information about a stored key
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyInfo {
    pub name: String,
    pub pubkey: PublicKey,
    pub address: AccAddress,
}

/// Capability to sign on behalf of one key
pub trait MessageSigner: Send + Sync {
    fn public_key(&self) -> PublicKey;

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, KeyringError>;
}

/// A signer name resolved to its address and signing capability
#[derive(Clone)]
pub struct ResolvedKey {
    pub address: AccAddress,
    pub signer: Arc<dyn MessageSigner>,
}

impl std::fmt::Debug for ResolvedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedKey")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Resolves signer names
#[async_trait]
pub trait KeyProvider: Send + Sync {
    async fn resolve(&self, name: &str) -> Result<ResolvedKey, KeyringError>;
}
