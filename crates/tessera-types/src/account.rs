//! On-chain account state

use crate::address::AccAddress;
use crate::serde_helpers::{null_as_default, u64_string};
use crate::tx::EncodedPubKey;
use serde::{Deserialize, Serialize};
use tessera_codec::Named;
use tessera_math::Coins;

/// Account as returned by `custom/acc/account`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseAccount {
    pub address: AccAddress,
    #[serde(default, deserialize_with = "null_as_default")]
    pub coins: Coins,
    #[serde(default)]
    pub public_key: Option<EncodedPubKey>,
    #[serde(with = "u64_string", default)]
    pub account_number: u64,
    #[serde(with = "u64_string", default)]
    pub sequence: u64,
    #[serde(default)]
    pub memo_regexp: String,
}

impl Named for BaseAccount {
    const TYPE_NAME: &'static str = "irishub/bank/Account";
}

impl BaseAccount {
    pub fn new(address: AccAddress) -> Self {
        Self {
            address,
            coins: Coins::empty(),
            public_key: None,
            account_number: 0,
            sequence: 0,
            memo_regexp: String::new(),
        }
    }
}
