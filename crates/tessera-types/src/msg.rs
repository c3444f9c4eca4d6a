//! The message abstraction
//!
//! A message is one state-transition request inside a transaction. Every
//! concrete message carries a stable type name so a transaction decoded
//! from the wire can be turned back into the right concrete type through a
//! [`MsgRegistry`].

use crate::address::AccAddress;
use crate::error::SdkError;
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tessera_codec::{to_canonical_bytes, CodecError, TypeRegistry, TypedValue};

/// A transaction message
pub trait Msg: fmt::Debug + Send + Sync {
    /// Stable wire name, e.g. `irishub/bank/Send`
    fn type_name(&self) -> &'static str;

    /// Stateless validation; must not touch the network
    fn validate_basic(&self) -> Result<(), SdkError>;

    /// JSON body of the message, without the type envelope
    fn to_value(&self) -> Result<Value, CodecError>;

    /// Canonical bytes of `{"type": name, "value": body}`
    fn get_sign_bytes(&self) -> Result<Vec<u8>, CodecError> {
        to_canonical_bytes(&self.envelope()?)
    }

    /// Addresses whose signatures this message requires
    fn get_signers(&self) -> Vec<AccAddress>;

    fn as_any(&self) -> &dyn Any;

    fn envelope(&self) -> Result<TypedValue, CodecError> {
        Ok(TypedValue::new(self.type_name(), self.to_value()?))
    }
}

/// Registry decoding envelopes into shared message objects
pub type MsgRegistry = TypeRegistry<Arc<dyn Msg>>;

/// Signers of all messages, deduplicated, in first-seen order
pub fn collect_signers(msgs: &[Arc<dyn Msg>]) -> Vec<AccAddress> {
    let mut signers: Vec<AccAddress> = Vec::new();
    for msg in msgs {
        for signer in msg.get_signers() {
            if !signers.contains(&signer) {
                signers.push(signer);
            }
        }
    }
    signers
}

/// Downcast a message to its concrete type
pub fn downcast_msg<M: 'static>(msg: &dyn Msg) -> Option<&M> {
    msg.as_any().downcast_ref::<M>()
}
