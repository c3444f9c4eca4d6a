//! Cryptographic primitives for tessera
//!
//! Key types, signing and verification built on the RustCrypto
//! implementations, plus verification of signed standard transactions.

pub mod keys;
pub mod signature;
pub mod verify;

pub use keys::{KeyError, PrivateKey, PublicKey, ED25519_PUBKEY_TYPE, SECP256K1_PUBKEY_TYPE};
pub use signature::{sign_message, verify_signature, SignatureError};
pub use verify::{verify_std_tx, VerificationError};
