//! tessera: client SDK for Tendermint based chains
//!
//! Re-exports the workspace crates under one roof. Most applications only
//! need [`Client`], a [`MemoryKeyring`] (or their own [`KeyProvider`]) and
//! the message types in [`types::msgs`].

pub use tessera_client as client;
pub use tessera_codec as codec;
pub use tessera_crypto as crypto;
pub use tessera_keyring as keyring;
pub use tessera_log as log;
pub use tessera_math as math;
pub use tessera_types as types;

pub use tessera_client::{
    BankClient, BaseClient, Client, ClientError, EventClient, RpcTransport, SdkConfig, SignedTx,
    Subscription, SubscriptionState, Transport, TxContext,
};
pub use tessera_keyring::{KeyProvider, MemoryKeyring};
pub use tessera_math::{Coin, Coins, Int};
pub use tessera_types::{
    AccAddress, BaseTx, BroadcastMode, BroadcastResult, EventQueryBuilder, Msg, MsgRegistry,
    Network, StdTx,
};
