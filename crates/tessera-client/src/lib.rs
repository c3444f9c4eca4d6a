//! Client library for tessera chains.
//!
//! [`TxContext`] signs messages, [`BaseClient`] runs the broadcast and query
//! pipeline against a [`Transport`], and [`EventClient`] manages event
//! subscriptions over one shared connection. [`Client`] wires the three
//! together from an [`SdkConfig`].

pub mod bank;
pub mod base;
pub mod config;
pub mod context;
pub mod error;
pub mod event;
pub mod rpc;
pub mod transport;
pub mod wire;

pub use bank::BankClient;
pub use base::BaseClient;
pub use config::{ConfigError, SdkConfig};
pub use context::{SignedTx, TxContext};
pub use error::{ClientError, Result};
pub use event::{EventClient, Subscription, SubscriptionState};
pub use rpc::RpcTransport;
pub use transport::{AbciQueryResponse, EventFrame, Transport, TransportError};

use std::sync::Arc;
use tessera_keyring::KeyProvider;
use tessera_types::{shared_registry, MsgRegistry};

/// Entry point bundling the transaction pipeline, events and module clients
pub struct Client {
    base: Arc<BaseClient>,
    events: EventClient,
    bank: BankClient,
}

impl Client {
    /// Connect to the node named in `config` over JSON-RPC
    pub fn new(config: &SdkConfig, key_provider: Arc<dyn KeyProvider>) -> Result<Self> {
        config.validate()?;
        let transport = RpcTransport::new(&config.node_uri, &config.ws_path, config.timeout())?;
        Self::with_transport(config, key_provider, Arc::new(transport), shared_registry())
    }

    /// Build a client over any transport and message registry
    pub fn with_transport(
        config: &SdkConfig,
        key_provider: Arc<dyn KeyProvider>,
        transport: Arc<dyn Transport>,
        registry: Arc<MsgRegistry>,
    ) -> Result<Self> {
        let ctx = config.tx_context(key_provider)?;
        let base = Arc::new(
            BaseClient::new(ctx, transport.clone(), registry.clone())
                .with_gas_adjustment(config.gas_adjustment),
        );
        let events = EventClient::new(transport, registry, config.subscriber());
        let bank = BankClient::new(base.clone());

        Ok(Self { base, events, bank })
    }

    pub fn base(&self) -> &BaseClient {
        &self.base
    }

    pub fn events(&self) -> &EventClient {
        &self.events
    }

    pub fn bank(&self) -> &BankClient {
        &self.bank
    }
}
