//! Bank module client

use std::sync::Arc;
use tessera_math::Coins;
use tessera_types::msgs::bank::{MsgBurn, MsgSend, MsgSetMemoRegexp};
use tessera_types::{AccAddress, BaseAccount, BaseTx, BroadcastResult, Msg, SdkError};

use crate::base::BaseClient;
use crate::error::Result;

#[derive(Clone)]
pub struct BankClient {
    base: Arc<BaseClient>,
}

impl BankClient {
    pub fn new(base: Arc<BaseClient>) -> Self {
        Self { base }
    }

    /// Transfer `amount` from the `base_tx.from` key to the bech32 address `to`
    pub async fn send(&self, to: &str, amount: Coins, base_tx: &BaseTx) -> Result<BroadcastResult> {
        let from = self.base.signer_address(&base_tx.from).await?;
        let to = parse_address(to)?;
        let msgs: Vec<Arc<dyn Msg>> = vec![Arc::new(MsgSend::new(from, to, amount))];
        self.base.broadcast(base_tx, &msgs).await
    }

    pub async fn burn(&self, amount: Coins, base_tx: &BaseTx) -> Result<BroadcastResult> {
        let owner = self.base.signer_address(&base_tx.from).await?;
        let msgs: Vec<Arc<dyn Msg>> = vec![Arc::new(MsgBurn::new(owner, amount))];
        self.base.broadcast(base_tx, &msgs).await
    }

    /// Require transfers into the sender's account to carry a memo matching `memo_regexp`
    pub async fn set_memo_regexp(
        &self,
        memo_regexp: &str,
        base_tx: &BaseTx,
    ) -> Result<BroadcastResult> {
        let owner = self.base.signer_address(&base_tx.from).await?;
        let msgs: Vec<Arc<dyn Msg>> = vec![Arc::new(MsgSetMemoRegexp::new(owner, memo_regexp))];
        self.base.broadcast(base_tx, &msgs).await
    }

    pub async fn get_account(&self, address: &str) -> Result<BaseAccount> {
        let address = parse_address(address)?;
        self.base.query_account(&address).await
    }
}

fn parse_address(address: &str) -> Result<AccAddress> {
    AccAddress::from_bech32(address)
        .map_err(|e| SdkError::InvalidAddress(format!("{address}: {e}")).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use tessera_types::Network;

    #[test]
    fn test_parse_address() {
        let address = AccAddress::new(Network::Testnet, [9u8; 20]);
        assert_eq!(parse_address(&address.to_bech32()).unwrap(), address);

        assert!(matches!(
            parse_address("not-an-address"),
            Err(ClientError::Validation(SdkError::InvalidAddress(_)))
        ));
    }
}
