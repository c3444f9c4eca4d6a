//! Client error taxonomy

use tessera_codec::CodecError;
use tessera_keyring::KeyringError;
use tessera_math::CoinError;
use tessera_types::{ResultBroadcastTxCommit, SdkError};
use thiserror::Error;

use crate::config::ConfigError;
use crate::transport::TransportError;

/// Client error types
#[derive(Error, Debug)]
pub enum ClientError {
    /// A message failed its own validation; the message's error is kept as is
    #[error(transparent)]
    Validation(#[from] SdkError),

    /// Malformed parameters or a value that could not be encoded or decoded
    #[error("encoding error: {0}")]
    Encoding(String),

    /// The node answered a query with a non-zero code
    #[error("query failed with code {code}: {log}")]
    Query { code: u32, log: String },

    /// Admission check rejected the transaction; it never entered a block
    #[error("broadcast rejected with code {code}: {log}")]
    BroadcastRejected { code: u32, log: String, hash: String },

    /// The transaction entered a block but its execution failed
    #[error("execution failed with code {}: {}", .0.deliver_tx.code, .0.deliver_tx.log)]
    ExecutionFailed(Box<ResultBroadcastTxCommit>),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("config error: {0}")]
    Config(String),

    #[error("keys error: {0}")]
    Keys(#[from] KeyringError),

    /// More than one distinct signer is required
    #[error("multiple signers are not supported: {}", .signers.join(", "))]
    MultiSignerUnsupported { signers: Vec<String> },

    /// The only signer is not the resolved key's address
    #[error("signer mismatch: messages require {expected}, key resolves to {actual}")]
    SignerMismatch { expected: String, actual: String },

    #[error("already subscribed: {0}")]
    DuplicateSubscription(String),
}

impl From<CodecError> for ClientError {
    fn from(err: CodecError) -> Self {
        ClientError::Encoding(err.to_string())
    }
}

impl From<CoinError> for ClientError {
    fn from(err: CoinError) -> Self {
        ClientError::Encoding(err.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Encoding(err.to_string())
    }
}

impl From<ConfigError> for ClientError {
    fn from(err: ConfigError) -> Self {
        ClientError::Config(err.to_string())
    }
}

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
