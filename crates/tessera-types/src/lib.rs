//! Core types for tessera
//!
//! Addresses, messages, the standard transaction and its sign document,
//! broadcast results, account state and the typed events delivered by
//! subscriptions.

pub mod account;
pub mod address;
pub mod error;
pub mod events;
pub mod msg;
pub mod msgs;
pub mod query;
pub mod result;
pub mod serde_helpers;
pub mod tx;

pub use account::BaseAccount;
pub use address::{AccAddress, AddressError, Network};
pub use error::SdkError;
pub use events::{
    Block, BlockHeader, EventDataNewBlock, EventDataNewBlockHeader, EventDataTx,
    EventDataValidatorSetUpdates, EventPubKey, ResultBeginBlock, ResultEndBlock, Tag, TxResult,
    Validator, ValidatorUpdate,
};
pub use msg::{collect_signers, downcast_msg, Msg, MsgRegistry};
pub use msgs::{default_registry, shared_registry};
pub use query::EventQueryBuilder;
pub use result::{BroadcastResult, ResultBroadcastTx, ResultBroadcastTxCommit, TxPhaseResult};
pub use tx::{
    tx_hash, BaseTx, BroadcastMode, EncodedPubKey, StdFee, StdSignDoc, StdSignature, StdTx,
    MAX_MEMO_CHARACTERS, TX_SIG_LIMIT,
};

pub use tessera_math::{Coin, CoinError, Coins, Int};
