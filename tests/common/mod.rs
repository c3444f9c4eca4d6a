#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tessera::client::{AbciQueryResponse, EventFrame, Transport, TransportError};
use tessera::types::{ResultBroadcastTx, ResultBroadcastTxCommit};
use tessera::{AccAddress, BroadcastMode, Client, MemoryKeyring, Network, SdkConfig};
use tokio::sync::mpsc;

pub const ALICE_HEX: &str = "0101010101010101010101010101010101010101010101010101010101010101";
pub const BOB_HEX: &str = "0202020202020202020202020202020202020202020202020202020202020202";

/// In-process node: scripted responses, recorded submissions, pushable events
#[derive(Default)]
pub struct MockTransport {
    queries: Mutex<HashMap<String, AbciQueryResponse>>,
    query_log: Mutex<Vec<(String, Vec<u8>)>>,
    submitted: Mutex<Vec<(BroadcastMode, Vec<u8>)>>,
    commit_result: Mutex<ResultBroadcastTxCommit>,
    sync_result: Mutex<ResultBroadcastTx>,
    frames: Mutex<Option<mpsc::UnboundedSender<EventFrame>>>,
    connects: AtomicUsize,
    subscriptions: Mutex<Vec<(String, String)>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_query(&self, path: &str, value: impl Into<Vec<u8>>) {
        self.queries.lock().unwrap().insert(
            path.to_string(),
            AbciQueryResponse {
                value: value.into(),
                ..Default::default()
            },
        );
    }

    pub fn set_query_error(&self, path: &str, code: u32, log: &str) {
        self.queries.lock().unwrap().insert(
            path.to_string(),
            AbciQueryResponse {
                code,
                log: log.to_string(),
                ..Default::default()
            },
        );
    }

    pub fn set_commit_result(&self, result: ResultBroadcastTxCommit) {
        *self.commit_result.lock().unwrap() = result;
    }

    pub fn set_sync_result(&self, result: ResultBroadcastTx) {
        *self.sync_result.lock().unwrap() = result;
    }

    pub fn submitted(&self) -> Vec<(BroadcastMode, Vec<u8>)> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn queries(&self) -> Vec<(String, Vec<u8>)> {
        self.query_log.lock().unwrap().clone()
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn subscriptions(&self) -> Vec<(String, String)> {
        self.subscriptions.lock().unwrap().clone()
    }

    /// Push one event frame; false when no connection is open
    pub fn push(&self, query: &str, data: Value) -> bool {
        match self.frames.lock().unwrap().as_ref() {
            Some(sender) => sender
                .send(EventFrame {
                    query: query.to_string(),
                    data,
                })
                .is_ok(),
            None => false,
        }
    }

    /// Drop the event connection
    pub fn close(&self) {
        self.frames.lock().unwrap().take();
    }

    fn record(&self, mode: BroadcastMode, tx: &[u8]) {
        self.submitted.lock().unwrap().push((mode, tx.to_vec()));
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn abci_query(
        &self,
        path: &str,
        data: &[u8],
    ) -> Result<AbciQueryResponse, TransportError> {
        self.query_log
            .lock()
            .unwrap()
            .push((path.to_string(), data.to_vec()));
        Ok(self
            .queries
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .unwrap_or_else(|| AbciQueryResponse {
                code: 1,
                log: format!("unknown query path {path}"),
                ..Default::default()
            }))
    }

    async fn broadcast_tx_async(&self, tx: &[u8]) -> Result<ResultBroadcastTx, TransportError> {
        self.record(BroadcastMode::Async, tx);
        Ok(ResultBroadcastTx::default())
    }

    async fn broadcast_tx_sync(&self, tx: &[u8]) -> Result<ResultBroadcastTx, TransportError> {
        self.record(BroadcastMode::Sync, tx);
        Ok(self.sync_result.lock().unwrap().clone())
    }

    async fn broadcast_tx_commit(
        &self,
        tx: &[u8],
    ) -> Result<ResultBroadcastTxCommit, TransportError> {
        self.record(BroadcastMode::Commit, tx);
        Ok(self.commit_result.lock().unwrap().clone())
    }

    async fn connect(&self) -> Result<mpsc::UnboundedReceiver<EventFrame>, TransportError> {
        let (sender, receiver) = mpsc::unbounded_channel();
        *self.frames.lock().unwrap() = Some(sender);
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(receiver)
    }

    async fn subscribe(&self, subscriber: &str, query: &str) -> Result<(), TransportError> {
        self.subscriptions
            .lock()
            .unwrap()
            .push((subscriber.to_string(), query.to_string()));
        Ok(())
    }

    async fn unsubscribe(&self, subscriber: &str, query: &str) -> Result<(), TransportError> {
        let mut subscriptions = self.subscriptions.lock().unwrap();
        match subscriptions
            .iter()
            .position(|(s, q)| s == subscriber && q == query)
        {
            Some(index) => {
                subscriptions.remove(index);
                Ok(())
            }
            None => Err(TransportError::Rpc {
                code: -32603,
                message: "subscription not found".to_string(),
            }),
        }
    }
}

pub struct Fixture {
    pub client: Client,
    pub transport: Arc<MockTransport>,
    pub keyring: Arc<MemoryKeyring>,
    pub alice: AccAddress,
    pub bob: AccAddress,
}

pub fn offline_config() -> SdkConfig {
    SdkConfig {
        chain_id: "irishub".to_string(),
        online: false,
        network: Network::Mainnet,
        ..Default::default()
    }
}

pub async fn fixture(config: SdkConfig) -> Fixture {
    tessera::log::init_tracing_test();

    let keyring = Arc::new(MemoryKeyring::new(config.network));
    let alice = keyring
        .import_private_key("alice", ALICE_HEX)
        .await
        .unwrap()
        .address;
    let bob = keyring
        .import_private_key("bob", BOB_HEX)
        .await
        .unwrap()
        .address;

    let transport = MockTransport::new();
    let client = Client::with_transport(
        &config,
        keyring.clone(),
        transport.clone(),
        tessera::types::shared_registry(),
    )
    .unwrap();

    Fixture {
        client,
        transport,
        keyring,
        alice,
        bob,
    }
}

/// Poll `condition` for up to two seconds
pub async fn wait_for(condition: impl Fn() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
