//! Transaction context: configuration plus the build-and-sign operation
//!
//! A [`TxContext`] is a value. Every `with_*` call returns a new context and
//! leaves the original untouched, so a client can hand its base context to
//! concurrent broadcasts without them seeing each other's overrides.

use std::fmt;
use std::sync::Arc;
use tessera_keyring::KeyProvider;
use tessera_math::Coins;
use tessera_types::{
    collect_signers, tx_hash, BroadcastMode, Msg, Network, SdkError, StdFee, StdSignDoc,
    StdSignature, StdTx,
};
use tracing::{debug, instrument};

use crate::error::{ClientError, Result};

/// Signed transaction ready for submission
#[derive(Debug, Clone)]
pub struct SignedTx {
    pub tx: StdTx,
    /// Wire bytes
    pub bytes: Vec<u8>,
    /// Uppercase hex SHA-256 of `bytes`
    pub hash: String,
}

#[derive(Clone)]
pub struct TxContext {
    chain_id: String,
    account_number: u64,
    sequence: u64,
    gas: u64,
    fee: Coins,
    memo: String,
    mode: BroadcastMode,
    online: bool,
    simulate: bool,
    network: Network,
    key_provider: Arc<dyn KeyProvider>,
}

impl fmt::Debug for TxContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TxContext")
            .field("chain_id", &self.chain_id)
            .field("account_number", &self.account_number)
            .field("sequence", &self.sequence)
            .field("gas", &self.gas)
            .field("fee", &self.fee)
            .field("memo", &self.memo)
            .field("mode", &self.mode)
            .field("online", &self.online)
            .field("simulate", &self.simulate)
            .field("network", &self.network)
            .finish_non_exhaustive()
    }
}

impl TxContext {
    pub fn new(chain_id: impl Into<String>, key_provider: Arc<dyn KeyProvider>) -> Self {
        Self {
            chain_id: chain_id.into(),
            account_number: 0,
            sequence: 0,
            gas: 200_000,
            fee: Coins::empty(),
            memo: String::new(),
            mode: BroadcastMode::default(),
            online: true,
            simulate: false,
            network: Network::default(),
            key_provider,
        }
    }

    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    pub fn account_number(&self) -> u64 {
        self.account_number
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn gas(&self) -> u64 {
        self.gas
    }

    pub fn fee(&self) -> &Coins {
        &self.fee
    }

    pub fn memo(&self) -> &str {
        &self.memo
    }

    pub fn mode(&self) -> BroadcastMode {
        self.mode
    }

    pub fn online(&self) -> bool {
        self.online
    }

    pub fn simulate(&self) -> bool {
        self.simulate
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn key_provider(&self) -> &Arc<dyn KeyProvider> {
        &self.key_provider
    }

    pub fn with_chain_id(&self, chain_id: impl Into<String>) -> Self {
        Self {
            chain_id: chain_id.into(),
            ..self.clone()
        }
    }

    pub fn with_account_number(&self, account_number: u64) -> Self {
        Self {
            account_number,
            ..self.clone()
        }
    }

    pub fn with_sequence(&self, sequence: u64) -> Self {
        Self {
            sequence,
            ..self.clone()
        }
    }

    pub fn with_gas(&self, gas: u64) -> Self {
        Self {
            gas,
            ..self.clone()
        }
    }

    pub fn with_fee(&self, fee: Coins) -> Self {
        Self {
            fee,
            ..self.clone()
        }
    }

    pub fn with_memo(&self, memo: impl Into<String>) -> Self {
        Self {
            memo: memo.into(),
            ..self.clone()
        }
    }

    pub fn with_mode(&self, mode: BroadcastMode) -> Self {
        Self {
            mode,
            ..self.clone()
        }
    }

    pub fn with_online(&self, online: bool) -> Self {
        Self {
            online,
            ..self.clone()
        }
    }

    pub fn with_simulate(&self, simulate: bool) -> Self {
        Self {
            simulate,
            ..self.clone()
        }
    }

    pub fn with_network(&self, network: Network) -> Self {
        Self {
            network,
            ..self.clone()
        }
    }

    pub fn with_key_provider(&self, key_provider: Arc<dyn KeyProvider>) -> Self {
        Self {
            key_provider,
            ..self.clone()
        }
    }

    /// Bytes the signer signs for `msgs` under this context
    pub fn sign_bytes(&self, msgs: &[Arc<dyn Msg>]) -> Result<Vec<u8>> {
        let fee = StdFee::new(self.fee.clone(), self.gas);
        let doc = StdSignDoc::new(
            &self.chain_id,
            self.account_number,
            self.sequence,
            &fee,
            msgs,
            &self.memo,
        )?;
        Ok(doc.to_bytes()?)
    }

    /// Validate, sign and encode `msgs` with the key named `signer_name`
    ///
    /// Messages are validated in order and the first failure is returned
    /// unchanged. The messages must need exactly one signer, and that
    /// signer must be the resolved key's address.
    #[instrument(skip(self, msgs), fields(chain_id = %self.chain_id, msgs = msgs.len()))]
    pub async fn build_and_sign(&self, signer_name: &str, msgs: &[Arc<dyn Msg>]) -> Result<SignedTx> {
        let key = self.key_provider.resolve(signer_name).await?;

        for msg in msgs {
            msg.validate_basic()?;
        }

        let signers = collect_signers(msgs);
        match signers.as_slice() {
            [] => return Err(SdkError::NoSigners.into()),
            [only] if *only != key.address => {
                return Err(ClientError::SignerMismatch {
                    expected: only.to_string(),
                    actual: key.address.to_string(),
                })
            }
            [_] => {}
            _ => {
                return Err(ClientError::MultiSignerUnsupported {
                    signers: signers.iter().map(ToString::to_string).collect(),
                })
            }
        }

        let sign_bytes = self.sign_bytes(msgs)?;
        let signature = key.signer.sign(&sign_bytes)?;

        let tx = StdTx::new(
            msgs.to_vec(),
            StdFee::new(self.fee.clone(), self.gas),
            vec![StdSignature {
                pub_key: key.signer.public_key().to_encoded(),
                signature,
                account_number: self.account_number,
                sequence: self.sequence,
            }],
            self.memo.clone(),
        );
        tx.validate_basic()?;

        let bytes = tx.encode()?;
        let hash = tx_hash(&bytes);
        debug!(%hash, sequence = self.sequence, "signed transaction");

        Ok(SignedTx { tx, bytes, hash })
    }
}
