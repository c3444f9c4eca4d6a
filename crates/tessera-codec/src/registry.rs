//! Name-keyed type registry for polymorphic decoding
//!
//! Concrete types travel inside a `{"type": <name>, "value": <body>}`
//! envelope. The registry maps each stable name to a decoder producing the
//! container type `T` (for example `Arc<dyn Msg>`). It is built once,
//! then shared read-only.

use crate::{CodecError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// A type with a stable wire name
pub trait Named {
    const TYPE_NAME: &'static str;
}

/// `{"type": ..., "value": ...}` envelope
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TypedValue {
    #[serde(rename = "type")]
    pub type_name: String,
    pub value: Value,
}

impl TypedValue {
    pub fn new(type_name: impl Into<String>, value: Value) -> Self {
        Self {
            type_name: type_name.into(),
            value,
        }
    }

    /// Wrap a named value
    pub fn pack<M: Named + Serialize>(msg: &M) -> Result<Self> {
        Ok(Self::new(M::TYPE_NAME, serde_json::to_value(msg)?))
    }

    /// Read an envelope out of a JSON value
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| CodecError::InvalidEnvelope(e.to_string()))
    }
}

type Decoder<T> = Box<dyn Fn(Value) -> Result<T> + Send + Sync>;

/// Registry of concrete types decodable into `T`
pub struct TypeRegistry<T: 'static> {
    decoders: HashMap<&'static str, Decoder<T>>,
}

impl<T: 'static> TypeRegistry<T> {
    pub fn new() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }

    /// Register a concrete type under its `TYPE_NAME`; `wrap` lifts it into
    /// the container. Re-registering a name replaces the previous entry.
    pub fn register<C>(&mut self, wrap: fn(C) -> T) -> &mut Self
    where
        C: Named + DeserializeOwned + 'static,
    {
        let decoder: Decoder<T> = Box::new(move |value| {
            serde_json::from_value::<C>(value)
                .map(wrap)
                .map_err(|source| CodecError::Decode {
                    type_name: C::TYPE_NAME.to_string(),
                    source,
                })
        });
        self.decoders.insert(C::TYPE_NAME, decoder);
        self
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.decoders.contains_key(type_name)
    }

    /// Registered names, sorted
    pub fn type_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.decoders.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Decode an envelope into the container type
    pub fn decode(&self, envelope: TypedValue) -> Result<T> {
        let decoder = self
            .decoders
            .get(envelope.type_name.as_str())
            .ok_or_else(|| CodecError::TypeNotFound(envelope.type_name.clone()))?;
        decoder(envelope.value)
    }

    /// Decode a raw JSON value holding an envelope
    pub fn decode_value(&self, value: Value) -> Result<T> {
        self.decode(TypedValue::from_value(value)?)
    }
}

impl<T: 'static> Default for TypeRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> fmt::Debug for TypeRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.type_names())
            .finish()
    }
}
