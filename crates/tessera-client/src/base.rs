//! Transaction pipeline and node queries
//!
//! [`BaseClient::broadcast`] runs the full pipeline for one call:
//! refresh the account from the node (when online), apply the caller's
//! [`BaseTx`] overrides, optionally simulate for gas, sign and dispatch by
//! broadcast mode. Every step works on a local copy of the base context.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;
use tessera_codec::to_canonical_bytes;
use tessera_math::Coins;
use tessera_types::serde_helpers::u64_string;
use tessera_types::{
    AccAddress, BaseAccount, BaseTx, BroadcastMode, BroadcastResult, Msg, MsgRegistry,
};
use tracing::{debug, info, instrument};

use crate::context::{SignedTx, TxContext};
use crate::error::{ClientError, Result};
use crate::transport::Transport;

/// ABCI path of the account query
pub const ACCOUNT_QUERY_PATH: &str = "custom/acc/account";

/// ABCI path of the simulation query
pub const SIMULATE_PATH: &str = "/app/simulate";

pub const DEFAULT_GAS_ADJUSTMENT: f64 = 1.5;

#[derive(Serialize)]
struct QueryAccountParams {
    #[serde(rename = "Address")]
    address: AccAddress,
}

#[derive(Deserialize)]
struct SimulateResponse {
    #[serde(with = "u64_string")]
    gas_used: u64,
}

pub struct BaseClient {
    ctx: TxContext,
    transport: Arc<dyn Transport>,
    registry: Arc<MsgRegistry>,
    gas_adjustment: f64,
}

impl BaseClient {
    pub fn new(ctx: TxContext, transport: Arc<dyn Transport>, registry: Arc<MsgRegistry>) -> Self {
        Self {
            ctx,
            transport,
            registry,
            gas_adjustment: DEFAULT_GAS_ADJUSTMENT,
        }
    }

    pub fn with_gas_adjustment(mut self, gas_adjustment: f64) -> Self {
        self.gas_adjustment = gas_adjustment;
        self
    }

    /// The base context; never modified after construction
    pub fn context(&self) -> &TxContext {
        &self.ctx
    }

    pub fn registry(&self) -> &Arc<MsgRegistry> {
        &self.registry
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn gas_adjustment(&self) -> f64 {
        self.gas_adjustment
    }

    /// Address of the key registered under `name`
    pub async fn signer_address(&self, name: &str) -> Result<AccAddress> {
        Ok(self.ctx.key_provider().resolve(name).await?.address)
    }

    /// Derive the working context for one call
    ///
    /// Account state is refreshed first so that caller overrides always
    /// win. Overrides are applied in the order gas, fee, mode, simulate,
    /// memo.
    pub async fn prepare(&self, base_tx: &BaseTx) -> Result<TxContext> {
        let mut ctx = self.ctx.clone();

        if ctx.online() {
            let address = self.signer_address(&base_tx.from).await?;
            let account = self.query_account(&address).await?;
            debug!(
                %address,
                account_number = account.account_number,
                sequence = account.sequence,
                "refreshed account"
            );
            ctx = ctx
                .with_account_number(account.account_number)
                .with_sequence(account.sequence);
        }

        if !base_tx.gas.is_empty() {
            let gas = base_tx.gas.parse::<u64>().map_err(|e| {
                ClientError::Config(format!("invalid gas {:?}: {e}", base_tx.gas))
            })?;
            ctx = ctx.with_gas(gas);
        }
        if !base_tx.fee.is_empty() {
            ctx = ctx.with_fee(Coins::from_str(&base_tx.fee)?);
        }
        if let Some(mode) = base_tx.mode {
            ctx = ctx.with_mode(mode);
        }
        if base_tx.simulate {
            ctx = ctx.with_simulate(true);
        }

        Ok(ctx.with_memo(base_tx.memo.clone()))
    }

    /// Prepare the context and sign `msgs` without submitting them
    pub async fn sign(&self, base_tx: &BaseTx, msgs: &[Arc<dyn Msg>]) -> Result<SignedTx> {
        let (_, signed) = self.sign_in_context(base_tx, msgs).await?;
        Ok(signed)
    }

    /// Sign `msgs`, returning the working context the bytes were built in
    async fn sign_in_context(
        &self,
        base_tx: &BaseTx,
        msgs: &[Arc<dyn Msg>],
    ) -> Result<(TxContext, SignedTx)> {
        let mut ctx = self.prepare(base_tx).await?;

        if ctx.simulate() {
            let trial = ctx.build_and_sign(&base_tx.from, msgs).await?;
            let gas_used = self.simulate(&trial.bytes).await?;
            let gas = (gas_used as f64 * self.gas_adjustment).ceil() as u64;
            debug!(gas_used, gas, "adjusted gas from simulation");
            ctx = ctx.with_gas(gas);
        }

        let signed = ctx.build_and_sign(&base_tx.from, msgs).await?;
        Ok((ctx, signed))
    }

    /// Sign `msgs` and submit them in the working context's mode
    ///
    /// In commit mode a non-zero admission code is
    /// [`ClientError::BroadcastRejected`] and a non-zero execution code is
    /// [`ClientError::ExecutionFailed`]. Sync and async results are returned
    /// as they come; check [`BroadcastResult::is_success`].
    #[instrument(skip(self, base_tx, msgs), fields(from = %base_tx.from, msgs = msgs.len()))]
    pub async fn broadcast(
        &self,
        base_tx: &BaseTx,
        msgs: &[Arc<dyn Msg>],
    ) -> Result<BroadcastResult> {
        let (ctx, signed) = self.sign_in_context(base_tx, msgs).await?;
        self.submit(ctx.mode(), signed).await
    }

    /// Submit an already signed transaction
    pub async fn submit(&self, mode: BroadcastMode, signed: SignedTx) -> Result<BroadcastResult> {
        let result = match mode {
            BroadcastMode::Commit => {
                let mut res = self.transport.broadcast_tx_commit(&signed.bytes).await?;
                if res.hash.is_empty() {
                    res.hash = signed.hash;
                }
                if !res.check_tx.is_ok() {
                    return Err(ClientError::BroadcastRejected {
                        code: res.check_tx.code,
                        log: res.check_tx.log,
                        hash: res.hash,
                    });
                }
                if !res.deliver_tx.is_ok() {
                    return Err(ClientError::ExecutionFailed(Box::new(res)));
                }
                BroadcastResult::Commit(res)
            }
            BroadcastMode::Sync => {
                let mut res = self.transport.broadcast_tx_sync(&signed.bytes).await?;
                if res.hash.is_empty() {
                    res.hash = signed.hash;
                }
                BroadcastResult::Sync(res)
            }
            BroadcastMode::Async => {
                let mut res = self.transport.broadcast_tx_async(&signed.bytes).await?;
                if res.hash.is_empty() {
                    res.hash = signed.hash;
                }
                BroadcastResult::Async(res)
            }
        };

        info!(
            %mode,
            hash = result.hash(),
            code = result.code(),
            height = result.height(),
            "broadcast transaction"
        );
        Ok(result)
    }

    /// Gas used by `tx_bytes` according to the node's simulation
    pub async fn simulate(&self, tx_bytes: &[u8]) -> Result<u64> {
        let value = self.query_raw(SIMULATE_PATH, tx_bytes).await?;
        let res: SimulateResponse = serde_json::from_slice(&value)?;
        Ok(res.gas_used)
    }

    /// Query `path` with the canonical encoding of `request`
    pub async fn query<R, T>(&self, path: &str, request: &R) -> Result<T>
    where
        R: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let data = to_canonical_bytes(request)?;
        let value = self.query_raw(path, &data).await?;
        Ok(serde_json::from_slice(&value)?)
    }

    /// Query `path` with raw bytes; a non-zero code fails with the node's log
    pub async fn query_raw(&self, path: &str, data: &[u8]) -> Result<Vec<u8>> {
        debug!(path, len = data.len(), "abci query");
        let res = self.transport.abci_query(path, data).await?;
        if !res.is_ok() {
            return Err(ClientError::Query {
                code: res.code,
                log: res.log,
            });
        }
        Ok(res.value)
    }

    /// Raw lookup in `store_name` under `key`
    pub async fn query_store(&self, key: &[u8], store_name: &str) -> Result<Vec<u8>> {
        let path = format!("/store/{store_name}/subspace");
        self.query_raw(&path, key).await
    }

    /// Current on-chain state of `address`
    pub async fn query_account(&self, address: &AccAddress) -> Result<BaseAccount> {
        let params = QueryAccountParams { address: *address };
        let value: Value = self.query(ACCOUNT_QUERY_PATH, &params).await?;
        Ok(serde_json::from_value(unwrap_envelope(value))?)
    }
}

/// Nodes may answer with a `{"type", "value"}` envelope or the bare value
fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map)
            if map.len() == 2 && map.contains_key("type") && map.contains_key("value") =>
        {
            map.remove("value").unwrap_or(Value::Null)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unwrap_envelope() {
        let wrapped = json!({"type": "irishub/bank/Account", "value": {"sequence": "3"}});
        assert_eq!(unwrap_envelope(wrapped), json!({"sequence": "3"}));

        let bare = json!({"address": "x", "sequence": "3"});
        assert_eq!(unwrap_envelope(bare.clone()), bare);
    }

    #[test]
    fn test_account_params_layout() {
        let address = AccAddress::new(tessera_types::Network::Mainnet, [1u8; 20]);
        let bytes = to_canonical_bytes(&QueryAccountParams { address }).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            format!("{{\"Address\":\"{address}\"}}")
        );
    }

    #[test]
    fn test_simulate_response_accepts_string_or_number() {
        let res: SimulateResponse = serde_json::from_str(r#"{"gas_used":"1234"}"#).unwrap();
        assert_eq!(res.gas_used, 1234);
        let res: SimulateResponse = serde_json::from_str(r#"{"gas_used":99}"#).unwrap();
        assert_eq!(res.gas_used, 99);
    }
}
