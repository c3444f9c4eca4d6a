//! Standard transaction, its sign document and its wire encoding

use crate::address::AccAddress;
use crate::error::SdkError;
use crate::msg::{collect_signers, Msg, MsgRegistry};
use crate::serde_helpers::{base64_bytes, null_as_default, u64_string};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tessera_codec::{to_canonical_bytes, CodecError, TypedValue};
use tessera_math::Coins;

/// Maximum memo length in characters
pub const MAX_MEMO_CHARACTERS: usize = 100;

/// Maximum number of signatures on one transaction
pub const TX_SIG_LIMIT: usize = 7;

/// Wire name of the standard transaction envelope
pub const STD_TX_TYPE: &str = "irishub/bank/StdTx";

/// Fee attached to a transaction
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StdFee {
    #[serde(default, deserialize_with = "null_as_default")]
    pub amount: Coins,
    #[serde(with = "u64_string")]
    pub gas: u64,
}

impl StdFee {
    pub fn new(amount: Coins, gas: u64) -> Self {
        Self { amount, gas }
    }

    pub fn bytes(&self) -> Result<Vec<u8>, CodecError> {
        to_canonical_bytes(self)
    }
}

/// The document a signer signs
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StdSignDoc {
    #[serde(with = "u64_string")]
    pub account_number: u64,
    pub chain_id: String,
    pub fee: Value,
    pub memo: String,
    pub msgs: Vec<Value>,
    #[serde(with = "u64_string")]
    pub sequence: u64,
}

impl StdSignDoc {
    pub fn new(
        chain_id: &str,
        account_number: u64,
        sequence: u64,
        fee: &StdFee,
        msgs: &[Arc<dyn Msg>],
        memo: &str,
    ) -> Result<Self, CodecError> {
        let msgs = msgs
            .iter()
            .map(|msg| Ok(serde_json::from_slice(&msg.get_sign_bytes()?)?))
            .collect::<Result<Vec<Value>, CodecError>>()?;

        Ok(Self {
            account_number,
            chain_id: chain_id.to_string(),
            fee: serde_json::from_slice(&fee.bytes()?)?,
            memo: memo.to_string(),
            msgs,
            sequence,
        })
    }

    /// Canonical bytes; identical inputs always give identical bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        to_canonical_bytes(self)
    }
}

/// Public key as it appears on the wire
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedPubKey {
    #[serde(rename = "type")]
    pub key_type: String,
    #[serde(with = "base64_bytes")]
    pub value: Vec<u8>,
}

/// One signature over a [`StdSignDoc`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StdSignature {
    pub pub_key: EncodedPubKey,
    #[serde(with = "base64_bytes")]
    pub signature: Vec<u8>,
    #[serde(with = "u64_string")]
    pub account_number: u64,
    #[serde(with = "u64_string")]
    pub sequence: u64,
}

/// Standard transaction
#[derive(Clone, Debug)]
pub struct StdTx {
    pub msgs: Vec<Arc<dyn Msg>>,
    pub fee: StdFee,
    pub signatures: Vec<StdSignature>,
    pub memo: String,
}

#[derive(Serialize, Deserialize)]
struct StdTxBody {
    msg: Vec<TypedValue>,
    fee: StdFee,
    #[serde(default, deserialize_with = "null_as_default")]
    signatures: Vec<StdSignature>,
    #[serde(default)]
    memo: String,
}

impl StdTx {
    pub fn new(
        msgs: Vec<Arc<dyn Msg>>,
        fee: StdFee,
        signatures: Vec<StdSignature>,
        memo: impl Into<String>,
    ) -> Self {
        Self {
            msgs,
            fee,
            signatures,
            memo: memo.into(),
        }
    }

    pub fn get_signers(&self) -> Vec<AccAddress> {
        collect_signers(&self.msgs)
    }

    /// Structural checks over the assembled transaction
    pub fn validate_basic(&self) -> Result<(), SdkError> {
        let memo_len = self.memo.chars().count();
        if memo_len > MAX_MEMO_CHARACTERS {
            return Err(SdkError::MemoTooLarge {
                length: memo_len,
                max: MAX_MEMO_CHARACTERS,
            });
        }

        if self.fee.amount.is_any_negative() {
            return Err(SdkError::InsufficientCoins(format!(
                "invalid fee amount: {}",
                self.fee.amount
            )));
        }

        if self.signatures.is_empty() {
            return Err(SdkError::NoSigners);
        }

        if self.signatures.len() > TX_SIG_LIMIT {
            return Err(SdkError::TooManySignatures {
                count: self.signatures.len(),
                limit: TX_SIG_LIMIT,
            });
        }

        let signers = self.get_signers();
        if self.signatures.len() != signers.len() {
            return Err(SdkError::WrongSignatureCount {
                expected: signers.len(),
                actual: self.signatures.len(),
            });
        }

        Ok(())
    }

    /// The enveloped JSON form
    pub fn to_value(&self) -> Result<Value, CodecError> {
        let body = StdTxBody {
            msg: self
                .msgs
                .iter()
                .map(|msg| msg.envelope())
                .collect::<Result<_, _>>()?,
            fee: self.fee.clone(),
            signatures: self.signatures.clone(),
            memo: self.memo.clone(),
        };
        Ok(serde_json::to_value(TypedValue::new(
            STD_TX_TYPE,
            serde_json::to_value(body)?,
        ))?)
    }

    /// Wire bytes
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        to_canonical_bytes(&self.to_value()?)
    }

    /// Decode wire bytes, resolving each message through the registry
    pub fn decode(bytes: &[u8], registry: &MsgRegistry) -> Result<Self, CodecError> {
        let value: Value = serde_json::from_slice(bytes)?;
        Self::from_value(value, registry)
    }

    pub fn from_value(value: Value, registry: &MsgRegistry) -> Result<Self, CodecError> {
        let envelope = TypedValue::from_value(value)?;
        if envelope.type_name != STD_TX_TYPE {
            return Err(CodecError::TypeNotFound(envelope.type_name));
        }

        let body: StdTxBody =
            serde_json::from_value(envelope.value).map_err(|source| CodecError::Decode {
                type_name: STD_TX_TYPE.to_string(),
                source,
            })?;

        let msgs = body
            .msg
            .into_iter()
            .map(|m| registry.decode(m))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            msgs,
            fee: body.fee,
            signatures: body.signatures,
            memo: body.memo,
        })
    }
}

/// Uppercase hex SHA-256 of the wire bytes
pub fn tx_hash(tx_bytes: &[u8]) -> String {
    hex::encode_upper(Sha256::digest(tx_bytes))
}

/// How a node should acknowledge a broadcast
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BroadcastMode {
    /// Wait for the block that includes the transaction
    #[default]
    Commit,
    /// Wait for the admission check only
    Sync,
    /// Return immediately
    Async,
}

impl BroadcastMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BroadcastMode::Commit => "commit",
            BroadcastMode::Sync => "sync",
            BroadcastMode::Async => "async",
        }
    }
}

impl fmt::Display for BroadcastMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BroadcastMode {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "commit" => Ok(BroadcastMode::Commit),
            "sync" => Ok(BroadcastMode::Sync),
            "async" => Ok(BroadcastMode::Async),
            other => Err(SdkError::InvalidRequest(format!(
                "unknown broadcast mode: {other}"
            ))),
        }
    }
}

/// Caller overrides for a single broadcast
///
/// Empty `gas` and `fee` keep the context defaults and `memo` always
/// replaces the context memo. A `mode` of `None` keeps the context mode.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseTx {
    pub from: String,
    pub gas: String,
    pub fee: String,
    pub memo: String,
    pub mode: Option<BroadcastMode>,
    pub simulate: bool,
}

impl BaseTx {
    pub fn new(from: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            ..Default::default()
        }
    }

    pub fn with_gas(mut self, gas: impl Into<String>) -> Self {
        self.gas = gas.into();
        self
    }

    pub fn with_fee(mut self, fee: impl Into<String>) -> Self {
        self.fee = fee.into();
        self
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = memo.into();
        self
    }

    pub fn with_mode(mut self, mode: BroadcastMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_simulate(mut self, simulate: bool) -> Self {
        self.simulate = simulate;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Network;
    use crate::msgs::bank::MsgSend;
    use crate::msgs::default_registry;
    use tessera_math::{Coin, Int};

    fn addr(byte: u8) -> AccAddress {
        AccAddress::new(Network::Mainnet, [byte; 20])
    }

    fn stake(amount: u64) -> Coins {
        Coins::from(Coin::new("stake", Int::from_u64(amount)).unwrap())
    }

    fn signature() -> StdSignature {
        StdSignature {
            pub_key: EncodedPubKey {
                key_type: "tendermint/PubKeySecp256k1".into(),
                value: vec![2; 33],
            },
            signature: vec![7; 64],
            account_number: 4,
            sequence: 9,
        }
    }

    fn send_tx() -> StdTx {
        let msg: Arc<dyn Msg> = Arc::new(MsgSend::new(addr(1), addr(2), stake(1)));
        StdTx::new(
            vec![msg],
            StdFee::new(stake(600), 20000),
            vec![signature()],
            "hello",
        )
    }

    #[test]
    fn test_sign_doc_layout() {
        let tx = send_tx();
        let doc = StdSignDoc::new("irishub", 4, 9, &tx.fee, &tx.msgs, "hello").unwrap();
        let text = String::from_utf8(doc.to_bytes().unwrap()).unwrap();
        assert!(text.starts_with(
            r#"{"account_number":"4","chain_id":"irishub","fee":{"amount":[{"amount":"600","denom":"stake"}],"gas":"20000"},"memo":"hello","msgs":[{"type":"irishub/bank/Send","#
        ));
        assert!(text.ends_with(r#""sequence":"9"}"#));
    }

    #[test]
    fn test_encode_decode_preserves_content() {
        let tx = send_tx();
        let bytes = tx.encode().unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.starts_with(r#"{"type":"irishub/bank/StdTx","value":{"fee":"#));

        let decoded = StdTx::decode(&bytes, &default_registry()).unwrap();
        assert_eq!(decoded.fee, tx.fee);
        assert_eq!(decoded.memo, "hello");
        assert_eq!(decoded.signatures, tx.signatures);
        assert_eq!(decoded.msgs.len(), 1);
        assert_eq!(decoded.msgs[0].type_name(), "irishub/bank/Send");
        assert_eq!(decoded.encode().unwrap(), bytes);
    }

    #[test]
    fn test_decode_unknown_message_fails() {
        let bytes = br#"{"type":"irishub/bank/StdTx","value":{"fee":{"amount":[],"gas":"1"},"memo":"","msg":[{"type":"irishub/gov/Vote","value":{}}],"signatures":null}}"#;
        let err = StdTx::decode(bytes, &default_registry()).unwrap_err();
        assert!(matches!(err, CodecError::TypeNotFound(name) if name == "irishub/gov/Vote"));
    }

    #[test]
    fn test_validate_basic() {
        let tx = send_tx();
        assert!(tx.validate_basic().is_ok());

        let mut long_memo = tx.clone();
        long_memo.memo = "m".repeat(MAX_MEMO_CHARACTERS + 1);
        assert!(matches!(
            long_memo.validate_basic(),
            Err(SdkError::MemoTooLarge { length: 101, max: 100 })
        ));

        let mut unsigned = tx.clone();
        unsigned.signatures.clear();
        assert_eq!(unsigned.validate_basic(), Err(SdkError::NoSigners));

        let mut extra = tx.clone();
        extra.signatures.push(signature());
        assert_eq!(
            extra.validate_basic(),
            Err(SdkError::WrongSignatureCount {
                expected: 1,
                actual: 2
            })
        );

        let mut crowded = tx;
        crowded.signatures = vec![signature(); TX_SIG_LIMIT + 1];
        assert!(matches!(
            crowded.validate_basic(),
            Err(SdkError::TooManySignatures { count: 8, limit: 7 })
        ));
    }

    #[test]
    fn test_tx_hash_is_uppercase_sha256() {
        assert_eq!(
            tx_hash(b""),
            "E3B0C44298FC1C149AFBF4C8996FB92427AE41E4649B934CA495991B7852B855"
        );
    }

    #[test]
    fn test_broadcast_mode_parse() {
        assert_eq!("Sync".parse::<BroadcastMode>().unwrap(), BroadcastMode::Sync);
        assert_eq!(BroadcastMode::Async.to_string(), "async");
        assert!("eventually".parse::<BroadcastMode>().is_err());
        assert_eq!(
            serde_json::to_string(&BroadcastMode::Commit).unwrap(),
            r#""commit""#
        );
    }

    #[test]
    fn test_base_tx_builder() {
        let base = BaseTx::new("alice")
            .with_gas("20000")
            .with_fee("600000000000000000stake")
            .with_mode(BroadcastMode::Async);
        assert_eq!(base.from, "alice");
        assert_eq!(base.mode, Some(BroadcastMode::Async));
        assert!(base.memo.is_empty());
        assert!(!base.simulate);
    }
}
