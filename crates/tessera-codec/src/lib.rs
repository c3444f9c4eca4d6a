//! Encoding and decoding utilities for tessera.
//!
//! Two pieces live here: the canonical JSON form every signature and hash
//! is computed over, and a name-keyed registry that lets one polymorphic
//! container decode as any registered concrete type.

pub mod canonical;
pub mod registry;

pub use canonical::{canonicalize, sort_json, to_canonical_bytes, to_canonical_value};
pub use registry::{Named, TypeRegistry, TypedValue};

use thiserror::Error;

/// Codec errors
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("json encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("type not registered: {0}")]
    TypeNotFound(String),

    #[error("invalid envelope: {0}")]
    InvalidEnvelope(String),

    #[error("failed to decode {type_name}: {source}")]
    Decode {
        type_name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for codec operations
pub type Result<T> = std::result::Result<T, CodecError>;
