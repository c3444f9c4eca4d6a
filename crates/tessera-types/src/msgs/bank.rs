//! Bank module messages

use crate::address::AccAddress;
use crate::error::SdkError;
use crate::msg::{Msg, MsgRegistry};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::sync::Arc;
use tessera_codec::{CodecError, Named};
use tessera_math::Coins;

/// Maximum length of a memo regular expression
pub const MAX_MEMO_REGEXP_LEN: usize = 50;

pub fn register(registry: &mut MsgRegistry) {
    registry
        .register::<MsgSend>(|m| Arc::new(m))
        .register::<MsgBurn>(|m| Arc::new(m))
        .register::<MsgSetMemoRegexp>(|m| Arc::new(m));
}

/// One side of a transfer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Input {
    pub address: AccAddress,
    pub coins: Coins,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub address: AccAddress,
    pub coins: Coins,
}

impl Input {
    pub fn new(address: AccAddress, coins: Coins) -> Self {
        Self { address, coins }
    }

    fn validate_basic(&self) -> Result<(), SdkError> {
        if !self.coins.is_all_positive() {
            return Err(SdkError::InvalidCoins(self.coins.to_string()));
        }
        Ok(())
    }
}

impl Output {
    pub fn new(address: AccAddress, coins: Coins) -> Self {
        Self { address, coins }
    }

    fn validate_basic(&self) -> Result<(), SdkError> {
        if !self.coins.is_all_positive() {
            return Err(SdkError::InvalidCoins(self.coins.to_string()));
        }
        Ok(())
    }
}

/// Transfer coins from inputs to outputs
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgSend {
    pub inputs: Vec<Input>,
    pub outputs: Vec<Output>,
}

impl MsgSend {
    /// Single input, single output transfer
    pub fn new(from: AccAddress, to: AccAddress, coins: Coins) -> Self {
        Self {
            inputs: vec![Input::new(from, coins.clone())],
            outputs: vec![Output::new(to, coins)],
        }
    }
}

impl Named for MsgSend {
    const TYPE_NAME: &'static str = "irishub/bank/Send";
}

impl Msg for MsgSend {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn validate_basic(&self) -> Result<(), SdkError> {
        if self.inputs.is_empty() {
            return Err(SdkError::InvalidRequest("no inputs to send transaction".into()));
        }
        if self.outputs.is_empty() {
            return Err(SdkError::InvalidRequest("no outputs to send transaction".into()));
        }

        let mut total_in = Coins::empty();
        for input in &self.inputs {
            input.validate_basic()?;
            total_in = total_in.plus(&input.coins);
        }

        let mut total_out = Coins::empty();
        for output in &self.outputs {
            output.validate_basic()?;
            total_out = total_out.plus(&output.coins);
        }

        if total_in != total_out {
            return Err(SdkError::InvalidCoins(format!(
                "inputs {total_in} and outputs {total_out} don't match"
            )));
        }
        Ok(())
    }

    fn to_value(&self) -> Result<Value, CodecError> {
        Ok(serde_json::to_value(self)?)
    }

    fn get_signers(&self) -> Vec<AccAddress> {
        self.inputs.iter().map(|input| input.address).collect()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Destroy coins held by the owner
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgBurn {
    pub owner: AccAddress,
    pub coins: Coins,
}

impl MsgBurn {
    pub fn new(owner: AccAddress, coins: Coins) -> Self {
        Self { owner, coins }
    }
}

impl Named for MsgBurn {
    const TYPE_NAME: &'static str = "irishub/bank/Burn";
}

impl Msg for MsgBurn {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn validate_basic(&self) -> Result<(), SdkError> {
        if !self.coins.is_all_positive() {
            return Err(SdkError::InvalidCoins(self.coins.to_string()));
        }
        Ok(())
    }

    fn to_value(&self) -> Result<Value, CodecError> {
        Ok(serde_json::to_value(self)?)
    }

    fn get_signers(&self) -> Vec<AccAddress> {
        vec![self.owner]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Require incoming transfers to carry a memo matching `memo_regexp`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgSetMemoRegexp {
    pub owner: AccAddress,
    pub memo_regexp: String,
}

impl MsgSetMemoRegexp {
    pub fn new(owner: AccAddress, memo_regexp: impl Into<String>) -> Self {
        Self {
            owner,
            memo_regexp: memo_regexp.into(),
        }
    }
}

impl Named for MsgSetMemoRegexp {
    const TYPE_NAME: &'static str = "irishub/bank/SetMemoRegexp";
}

impl Msg for MsgSetMemoRegexp {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn validate_basic(&self) -> Result<(), SdkError> {
        let len = self.memo_regexp.chars().count();
        if len > MAX_MEMO_REGEXP_LEN {
            return Err(SdkError::InvalidRequest(format!(
                "memo regexp length {len} exceeds {MAX_MEMO_REGEXP_LEN}"
            )));
        }
        Ok(())
    }

    fn to_value(&self) -> Result<Value, CodecError> {
        Ok(serde_json::to_value(self)?)
    }

    fn get_signers(&self) -> Vec<AccAddress> {
        vec![self.owner]
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Network;
    use crate::msg::downcast_msg;
    use crate::msgs::default_registry;
    use tessera_math::{Coin, Int};

    fn addr(byte: u8) -> AccAddress {
        AccAddress::new(Network::Mainnet, [byte; 20])
    }

    fn coins(denom: &str, amount: u64) -> Coins {
        Coins::from(Coin::new(denom, Int::from_u64(amount)).unwrap())
    }

    #[test]
    fn test_send_validation() {
        let msg = MsgSend::new(addr(1), addr(2), coins("stake", 1));
        assert!(msg.validate_basic().is_ok());
        assert_eq!(msg.get_signers(), vec![addr(1)]);

        let empty = MsgSend::new(addr(1), addr(2), Coins::empty());
        assert!(matches!(empty.validate_basic(), Err(SdkError::InvalidCoins(_))));

        let mut unbalanced = MsgSend::new(addr(1), addr(2), coins("stake", 5));
        unbalanced.outputs[0].coins = coins("stake", 4);
        assert!(matches!(
            unbalanced.validate_basic(),
            Err(SdkError::InvalidCoins(_))
        ));

        let no_inputs = MsgSend {
            inputs: vec![],
            outputs: vec![Output::new(addr(2), coins("stake", 1))],
        };
        assert!(matches!(
            no_inputs.validate_basic(),
            Err(SdkError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_send_sign_bytes_deterministic() {
        let msg = MsgSend::new(addr(1), addr(2), coins("stake", 1));
        let first = msg.get_sign_bytes().unwrap();
        let second = msg.get_sign_bytes().unwrap();
        assert_eq!(first, second);

        let text = String::from_utf8(first).unwrap();
        assert!(text.starts_with(r#"{"type":"irishub/bank/Send","value":{"inputs":[{"address":"iaa1"#));
        assert!(text.contains(r#""coins":[{"amount":"1","denom":"stake"}]"#));
    }

    #[test]
    fn test_memo_regexp_limit() {
        let ok = MsgSetMemoRegexp::new(addr(1), "^[0-9]+$");
        assert!(ok.validate_basic().is_ok());

        let too_long = MsgSetMemoRegexp::new(addr(1), "a".repeat(MAX_MEMO_REGEXP_LEN + 1));
        assert!(too_long.validate_basic().is_err());
    }

    #[test]
    fn test_registry_decodes_bank_messages() {
        let registry = default_registry();
        let burn = MsgBurn::new(addr(3), coins("stake", 10));
        let decoded = registry.decode(burn.envelope().unwrap()).unwrap();
        assert_eq!(decoded.type_name(), "irishub/bank/Burn");
        assert_eq!(downcast_msg::<MsgBurn>(decoded.as_ref()), Some(&burn));
        assert_eq!(
            registry.type_names(),
            vec![
                "irishub/bank/Burn",
                "irishub/bank/Send",
                "irishub/bank/SetMemoRegexp"
            ]
        );
    }
}
