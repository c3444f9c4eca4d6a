//! Tendermint JSON shapes and their translation into domain types
//!
//! Nodes encode 64-bit integers as strings, byte strings as base64 and
//! empty lists as `null`; every decoder here accepts all three.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tessera_codec::TypedValue;
use tessera_types::serde_helpers::{base64_bytes, i64_string, null_as_default};
use tessera_types::{
    tx_hash, Block, BlockHeader, EventDataNewBlock, EventDataNewBlockHeader, EventDataTx,
    EventDataValidatorSetUpdates, EventPubKey, MsgRegistry, ResultBeginBlock, ResultBroadcastTx,
    ResultBroadcastTxCommit, ResultEndBlock, StdTx, Tag, TxPhaseResult, TxResult, Validator,
    ValidatorUpdate,
};
use tracing::debug;

use crate::error::{ClientError, Result};
use crate::transport::{AbciQueryResponse, TransportError};

pub const EVENT_NEW_BLOCK: &str = "tendermint/event/NewBlock";
pub const EVENT_NEW_BLOCK_HEADER: &str = "tendermint/event/NewBlockHeader";
pub const EVENT_TX: &str = "tendermint/event/Tx";
pub const EVENT_VALIDATOR_SET_UPDATES: &str = "tendermint/event/ValidatorSetUpdates";

/// Tag with base64 key and value
#[derive(Deserialize)]
pub(crate) struct WireTag {
    #[serde(with = "base64_bytes", default)]
    key: Vec<u8>,
    #[serde(with = "base64_bytes", default)]
    value: Vec<u8>,
}

pub(crate) fn decode_tags(tags: Vec<WireTag>) -> Vec<Tag> {
    tags.into_iter()
        .map(|tag| {
            Tag::new(
                String::from_utf8_lossy(&tag.key),
                String::from_utf8_lossy(&tag.value),
            )
        })
        .collect()
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub(crate) struct WireAbciResponse {
    code: u32,
    log: String,
    #[serde(with = "base64_bytes")]
    value: Vec<u8>,
    #[serde(with = "i64_string")]
    height: i64,
}

#[derive(Deserialize)]
pub(crate) struct WireAbciQuery {
    response: WireAbciResponse,
}

impl From<WireAbciQuery> for AbciQueryResponse {
    fn from(wire: WireAbciQuery) -> Self {
        AbciQueryResponse {
            code: wire.response.code,
            log: wire.response.log,
            value: wire.response.value,
            height: wire.response.height,
        }
    }
}

/// Response of `broadcast_tx_sync` and `broadcast_tx_async`; `data` is hex
#[derive(Deserialize, Default)]
#[serde(default)]
pub(crate) struct WireBroadcastTx {
    code: u32,
    data: String,
    log: String,
    hash: String,
}

impl TryFrom<WireBroadcastTx> for ResultBroadcastTx {
    type Error = TransportError;

    fn try_from(wire: WireBroadcastTx) -> std::result::Result<Self, Self::Error> {
        let data = hex::decode(&wire.data)
            .map_err(|e| TransportError::InvalidResponse(format!("invalid data hex: {e}")))?;
        Ok(ResultBroadcastTx {
            code: wire.code,
            data,
            log: wire.log,
            hash: wire.hash,
        })
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub(crate) struct WireTxPhase {
    code: u32,
    #[serde(with = "base64_bytes")]
    data: Vec<u8>,
    log: String,
    info: String,
    #[serde(with = "i64_string")]
    gas_wanted: i64,
    #[serde(with = "i64_string")]
    gas_used: i64,
    #[serde(deserialize_with = "null_as_default")]
    tags: Vec<WireTag>,
    codespace: String,
}

impl From<WireTxPhase> for TxPhaseResult {
    fn from(wire: WireTxPhase) -> Self {
        TxPhaseResult {
            code: wire.code,
            data: wire.data,
            log: wire.log,
            info: wire.info,
            gas_wanted: wire.gas_wanted,
            gas_used: wire.gas_used,
            tags: decode_tags(wire.tags),
            codespace: wire.codespace,
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub(crate) struct WireBroadcastTxCommit {
    check_tx: WireTxPhase,
    deliver_tx: WireTxPhase,
    hash: String,
    #[serde(with = "i64_string")]
    height: i64,
}

impl From<WireBroadcastTxCommit> for ResultBroadcastTxCommit {
    fn from(wire: WireBroadcastTxCommit) -> Self {
        ResultBroadcastTxCommit {
            check_tx: wire.check_tx.into(),
            deliver_tx: wire.deliver_tx.into(),
            hash: wire.hash,
            height: wire.height,
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct WireBlockId {
    hash: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct WireHeader {
    chain_id: String,
    #[serde(with = "i64_string")]
    height: i64,
    time: String,
    #[serde(with = "i64_string")]
    num_txs: i64,
    #[serde(with = "i64_string")]
    total_txs: i64,
    last_block_id: WireBlockId,
    last_commit_hash: String,
    data_hash: String,
    validators_hash: String,
    next_validators_hash: String,
    consensus_hash: String,
    app_hash: String,
    last_results_hash: String,
    evidence_hash: String,
    proposer_address: String,
}

impl From<WireHeader> for BlockHeader {
    fn from(wire: WireHeader) -> Self {
        BlockHeader {
            chain_id: wire.chain_id,
            height: wire.height,
            time: wire.time,
            num_txs: wire.num_txs,
            total_txs: wire.total_txs,
            last_block_hash: wire.last_block_id.hash,
            last_commit_hash: wire.last_commit_hash,
            data_hash: wire.data_hash,
            validators_hash: wire.validators_hash,
            next_validators_hash: wire.next_validators_hash,
            consensus_hash: wire.consensus_hash,
            app_hash: wire.app_hash,
            last_results_hash: wire.last_results_hash,
            evidence_hash: wire.evidence_hash,
            proposer_address: wire.proposer_address,
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct WireBlockData {
    #[serde(deserialize_with = "null_as_default")]
    txs: Vec<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct WireBlock {
    header: WireHeader,
    data: WireBlockData,
    evidence: Value,
    last_commit: Value,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct WireAbciPubKey {
    #[serde(rename = "type")]
    key_type: String,
    data: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct WireValidatorUpdate {
    pub_key: WireAbciPubKey,
    #[serde(with = "i64_string")]
    power: i64,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct WireResultBeginBlock {
    #[serde(deserialize_with = "null_as_default")]
    tags: Vec<WireTag>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct WireResultEndBlock {
    #[serde(deserialize_with = "null_as_default")]
    validator_updates: Vec<WireValidatorUpdate>,
    #[serde(deserialize_with = "null_as_default")]
    tags: Vec<WireTag>,
}

impl From<WireResultBeginBlock> for ResultBeginBlock {
    fn from(wire: WireResultBeginBlock) -> Self {
        ResultBeginBlock {
            tags: decode_tags(wire.tags),
        }
    }
}

impl From<WireResultEndBlock> for ResultEndBlock {
    fn from(wire: WireResultEndBlock) -> Self {
        ResultEndBlock {
            tags: decode_tags(wire.tags),
            validator_updates: wire
                .validator_updates
                .into_iter()
                .map(|update| ValidatorUpdate {
                    pub_key: EventPubKey {
                        key_type: update.pub_key.key_type,
                        value: update.pub_key.data,
                    },
                    power: update.power,
                })
                .collect(),
        }
    }
}

#[derive(Deserialize)]
struct WireNewBlock {
    block: WireBlock,
    #[serde(default)]
    result_begin_block: WireResultBeginBlock,
    #[serde(default)]
    result_end_block: WireResultEndBlock,
}

#[derive(Deserialize)]
struct WireNewBlockHeader {
    header: WireHeader,
    #[serde(default)]
    result_begin_block: WireResultBeginBlock,
    #[serde(default)]
    result_end_block: WireResultEndBlock,
}

#[derive(Deserialize)]
struct WireTxResult {
    #[serde(with = "i64_string", default)]
    height: i64,
    #[serde(default)]
    index: u32,
    tx: String,
    #[serde(default)]
    result: WireTxPhase,
}

#[derive(Deserialize)]
struct WireTxEvent {
    #[serde(rename = "TxResult")]
    tx_result: WireTxResult,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct WireValidator {
    address: String,
    pub_key: EventPubKey,
    #[serde(with = "i64_string")]
    voting_power: i64,
    #[serde(with = "i64_string")]
    proposer_priority: i64,
}

#[derive(Deserialize)]
struct WireValidatorSetUpdates {
    #[serde(default, deserialize_with = "null_as_default")]
    validator_updates: Vec<WireValidator>,
}

/// Unwrap a `{"type", "value"}` event payload of the expected type
fn event_payload<T: DeserializeOwned>(data: Value, expected: &str) -> Result<T> {
    let envelope = TypedValue::from_value(data)?;
    if envelope.type_name != expected {
        return Err(ClientError::Encoding(format!(
            "unexpected event type {}, wanted {expected}",
            envelope.type_name
        )));
    }
    Ok(serde_json::from_value(envelope.value)?)
}

fn decode_raw_tx(raw: &str, registry: &MsgRegistry) -> Result<(Vec<u8>, StdTx)> {
    let bytes = STANDARD
        .decode(raw)
        .map_err(|e| ClientError::Encoding(format!("invalid tx base64: {e}")))?;
    let tx = StdTx::decode(&bytes, registry)?;
    Ok((bytes, tx))
}

/// Translate a new-block payload; transactions that fail to decode are left out
pub fn translate_new_block(data: Value, registry: &MsgRegistry) -> Result<EventDataNewBlock> {
    let wire: WireNewBlock = event_payload(data, EVENT_NEW_BLOCK)?;
    let height = wire.block.header.height;

    let txs = wire
        .block
        .data
        .txs
        .iter()
        .filter_map(|raw| match decode_raw_tx(raw, registry) {
            Ok((_, tx)) => Some(tx),
            Err(err) => {
                debug!(height, error = %err, "dropping undecodable transaction from block");
                None
            }
        })
        .collect();

    Ok(EventDataNewBlock {
        block: Block {
            header: wire.block.header.into(),
            txs,
            evidence: wire.block.evidence,
            last_commit: wire.block.last_commit,
        },
        result_begin_block: wire.result_begin_block.into(),
        result_end_block: wire.result_end_block.into(),
    })
}

/// Translate a transaction payload; the hash is computed from the raw bytes
pub fn translate_tx(data: Value, registry: &MsgRegistry) -> Result<EventDataTx> {
    let wire: WireTxEvent = event_payload(data, EVENT_TX)?;
    let result = wire.tx_result;
    let (bytes, tx) = decode_raw_tx(&result.tx, registry)?;

    Ok(EventDataTx {
        hash: tx_hash(&bytes),
        height: result.height,
        index: result.index,
        tx,
        result: TxResult {
            code: result.result.code,
            log: result.result.log,
            gas_wanted: result.result.gas_wanted,
            gas_used: result.result.gas_used,
            tags: decode_tags(result.result.tags),
        },
    })
}

pub fn translate_new_block_header(data: Value) -> Result<EventDataNewBlockHeader> {
    let wire: WireNewBlockHeader = event_payload(data, EVENT_NEW_BLOCK_HEADER)?;
    Ok(EventDataNewBlockHeader {
        header: wire.header.into(),
        result_begin_block: wire.result_begin_block.into(),
        result_end_block: wire.result_end_block.into(),
    })
}

pub fn translate_validator_set_updates(data: Value) -> Result<EventDataValidatorSetUpdates> {
    let wire: WireValidatorSetUpdates = event_payload(data, EVENT_VALIDATOR_SET_UPDATES)?;
    Ok(EventDataValidatorSetUpdates {
        validator_updates: wire
            .validator_updates
            .into_iter()
            .map(|v| Validator {
                address: v.address,
                pub_key: v.pub_key,
                voting_power: v.voting_power,
                proposer_priority: v.proposer_priority,
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tessera_types::default_registry;

    fn b64(s: &str) -> String {
        STANDARD.encode(s)
    }

    #[test]
    fn test_commit_result_decoding() {
        let raw = json!({
            "check_tx": {"code": 0, "data": null, "log": "", "gas_wanted": "20000", "gas_used": "1000", "tags": null},
            "deliver_tx": {
                "code": 10,
                "log": "insufficient coins",
                "gas_wanted": "20000",
                "gas_used": "15000",
                "tags": [{"key": b64("action"), "value": b64("send")}]
            },
            "hash": "ABCDEF",
            "height": "77"
        });
        let wire: WireBroadcastTxCommit = serde_json::from_value(raw).unwrap();
        let result: ResultBroadcastTxCommit = wire.into();

        assert!(result.check_tx.is_ok());
        assert_eq!(result.check_tx.gas_used, 1000);
        assert_eq!(result.deliver_tx.code, 10);
        assert_eq!(result.deliver_tx.tags, vec![Tag::new("action", "send")]);
        assert_eq!(result.height, 77);
        assert!(!result.is_success());
    }

    #[test]
    fn test_sync_result_decoding() {
        let wire: WireBroadcastTx =
            serde_json::from_value(json!({"code": 0, "data": "0A0B", "log": "[]", "hash": "FF"}))
                .unwrap();
        let result = ResultBroadcastTx::try_from(wire).unwrap();
        assert_eq!(result.data, vec![0x0a, 0x0b]);
        assert_eq!(result.hash, "FF");

        let bad: WireBroadcastTx = serde_json::from_value(json!({"data": "zz"})).unwrap();
        assert!(ResultBroadcastTx::try_from(bad).is_err());
    }

    #[test]
    fn test_abci_query_decoding() {
        let wire: WireAbciQuery = serde_json::from_value(json!({
            "response": {"code": 0, "log": "", "value": b64("{}"), "height": "9"}
        }))
        .unwrap();
        let response = AbciQueryResponse::from(wire);
        assert_eq!(response.value, b"{}".to_vec());
        assert_eq!(response.height, 9);
        assert!(response.is_ok());
    }

    #[test]
    fn test_new_block_header_translation() {
        let data = json!({
            "type": EVENT_NEW_BLOCK_HEADER,
            "value": {
                "header": {
                    "version": {"block": "10", "app": "0"},
                    "chain_id": "irishub",
                    "height": "12",
                    "time": "2019-07-01T00:00:00Z",
                    "num_txs": "0",
                    "total_txs": "40",
                    "last_block_id": {"hash": "AA", "parts": {"total": "1", "hash": "BB"}},
                    "proposer_address": "CC"
                },
                "result_begin_block": {"tags": [{"key": b64("proposer"), "value": b64("CC")}]},
                "result_end_block": {
                    "validator_updates": [{"pub_key": {"type": "ed25519", "data": "AAAA"}, "power": "10"}],
                    "tags": null
                }
            }
        });

        let event = translate_new_block_header(data).unwrap();
        assert_eq!(event.header.height, 12);
        assert_eq!(event.header.total_txs, 40);
        assert_eq!(event.header.last_block_hash, "AA");
        assert_eq!(event.result_begin_block.tags, vec![Tag::new("proposer", "CC")]);
        assert_eq!(event.result_end_block.validator_updates[0].power, 10);
        assert_eq!(event.result_end_block.validator_updates[0].pub_key.key_type, "ed25519");
        assert!(event.result_end_block.tags.is_empty());
    }

    #[test]
    fn test_validator_set_updates_translation() {
        let data = json!({
            "type": EVENT_VALIDATOR_SET_UPDATES,
            "value": {
                "validator_updates": [{
                    "address": "0A1B",
                    "pub_key": {"type": "tendermint/PubKeyEd25519", "value": "AAAA"},
                    "voting_power": "100",
                    "proposer_priority": "-5"
                }]
            }
        });
        let event = translate_validator_set_updates(data).unwrap();
        assert_eq!(event.validator_updates.len(), 1);
        assert_eq!(event.validator_updates[0].voting_power, 100);
        assert_eq!(event.validator_updates[0].proposer_priority, -5);
    }

    #[test]
    fn test_wrong_event_type_is_rejected() {
        let data = json!({"type": EVENT_TX, "value": {}});
        assert!(matches!(
            translate_new_block_header(data),
            Err(ClientError::Encoding(_))
        ));
    }

    #[test]
    fn test_tx_with_unknown_message_fails() {
        let raw = br#"{"type":"irishub/bank/StdTx","value":{"fee":{"amount":[],"gas":"1"},"memo":"","msg":[{"type":"irishub/gov/Vote","value":{}}],"signatures":[]}}"#;
        let data = json!({
            "type": EVENT_TX,
            "value": {"TxResult": {"height": "3", "index": 0, "tx": STANDARD.encode(raw), "result": {}}}
        });
        assert!(translate_tx(data, &default_registry()).is_err());
    }
}
