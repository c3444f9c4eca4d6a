//! Typed events delivered to subscription callbacks

use crate::tx::StdTx;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A decoded key/value pair attached to a block or transaction result
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Block header fields
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub chain_id: String,
    pub height: i64,
    pub time: String,
    pub num_txs: i64,
    pub total_txs: i64,
    pub last_block_hash: String,
    pub last_commit_hash: String,
    pub data_hash: String,
    pub validators_hash: String,
    pub next_validators_hash: String,
    pub consensus_hash: String,
    pub app_hash: String,
    pub last_results_hash: String,
    pub evidence_hash: String,
    pub proposer_address: String,
}

/// A block with its transactions decoded
///
/// Transactions that could not be decoded are absent from `txs`.
#[derive(Clone, Debug, Default)]
pub struct Block {
    pub header: BlockHeader,
    pub txs: Vec<StdTx>,
    pub evidence: Value,
    pub last_commit: Value,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultBeginBlock {
    pub tags: Vec<Tag>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEndBlock {
    pub tags: Vec<Tag>,
    pub validator_updates: Vec<ValidatorUpdate>,
}

/// Public key rendered for events: type name and base64 key bytes
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPubKey {
    #[serde(rename = "type")]
    pub key_type: String,
    pub value: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorUpdate {
    pub pub_key: EventPubKey,
    pub power: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    pub address: String,
    pub pub_key: EventPubKey,
    pub voting_power: i64,
    pub proposer_priority: i64,
}

#[derive(Clone, Debug, Default)]
pub struct EventDataNewBlock {
    pub block: Block,
    pub result_begin_block: ResultBeginBlock,
    pub result_end_block: ResultEndBlock,
}

/// Execution result carried by a transaction event
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxResult {
    pub code: u32,
    pub log: String,
    pub gas_wanted: i64,
    pub gas_used: i64,
    pub tags: Vec<Tag>,
}

#[derive(Clone, Debug)]
pub struct EventDataTx {
    pub hash: String,
    pub height: i64,
    pub index: u32,
    pub tx: StdTx,
    pub result: TxResult,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventDataNewBlockHeader {
    pub header: BlockHeader,
    pub result_begin_block: ResultBeginBlock,
    pub result_end_block: ResultEndBlock,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventDataValidatorSetUpdates {
    pub validator_updates: Vec<Validator>,
}
