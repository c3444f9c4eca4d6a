//! Message validation errors

use thiserror::Error;

/// Error returned by a message's own validation, before any network call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SdkError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid coins: {0}")]
    InvalidCoins(String),

    #[error("insufficient coins: {0}")]
    InsufficientCoins(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("memo too large: {length} characters, maximum is {max}")]
    MemoTooLarge { length: usize, max: usize },

    #[error("no signers")]
    NoSigners,

    #[error("wrong number of signatures: expected {expected}, got {actual}")]
    WrongSignatureCount { expected: usize, actual: usize },

    #[error("too many signatures: {count}, limit is {limit}")]
    TooManySignatures { count: usize, limit: usize },
}

impl SdkError {
    /// Numeric code matching the ledger's root codespace
    pub fn code(&self) -> u32 {
        match self {
            SdkError::InvalidAddress(_) => 7,
            SdkError::InvalidCoins(_) => 10,
            SdkError::InsufficientCoins(_) => 5,
            SdkError::InvalidRequest(_) => 3,
            SdkError::MemoTooLarge { .. } => 12,
            SdkError::NoSigners => 4,
            SdkError::WrongSignatureCount { .. } => 4,
            SdkError::TooManySignatures { .. } => 14,
        }
    }
}
