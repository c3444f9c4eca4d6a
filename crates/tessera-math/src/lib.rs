//! Integer and coin types for tessera
//!
//! Amounts on the ledger are arbitrary precision; fees and transfer
//! amounts are expressed as `Coins`, a denomination-sorted set.

pub mod coin;
pub mod int;

pub use coin::{Coin, CoinError, Coins};
pub use int::Int;
