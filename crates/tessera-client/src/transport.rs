//! Node transport abstraction
//!
//! Everything the client needs from a node: ABCI queries, the three
//! broadcast verbs and an event stream with subscribe and unsubscribe.
//! [`crate::rpc::RpcTransport`] speaks Tendermint JSON-RPC; tests supply
//! in-process implementations.

use async_trait::async_trait;
use serde_json::Value;
use tessera_types::{ResultBroadcastTx, ResultBroadcastTxCommit};
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("websocket error: {0}")]
    WebSocket(String),

    #[error("json parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("connection closed")]
    ConnectionClosed,

    #[error("not connected")]
    NotConnected,
}

/// Response of an ABCI query
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AbciQueryResponse {
    pub code: u32,
    pub log: String,
    pub value: Vec<u8>,
    pub height: i64,
}

impl AbciQueryResponse {
    pub fn is_ok(&self) -> bool {
        self.code == 0
    }
}

/// One pushed event, tagged with the query it matched
#[derive(Clone, Debug, PartialEq)]
pub struct EventFrame {
    pub query: String,
    /// `{"type": <event type>, "value": <payload>}`
    pub data: Value,
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn abci_query(&self, path: &str, data: &[u8])
        -> Result<AbciQueryResponse, TransportError>;

    /// Submit without waiting for the admission check
    async fn broadcast_tx_async(&self, tx: &[u8]) -> Result<ResultBroadcastTx, TransportError>;

    /// Submit and wait for the admission check
    async fn broadcast_tx_sync(&self, tx: &[u8]) -> Result<ResultBroadcastTx, TransportError>;

    /// Submit and wait for block inclusion
    async fn broadcast_tx_commit(
        &self,
        tx: &[u8],
    ) -> Result<ResultBroadcastTxCommit, TransportError>;

    /// Open the event connection
    ///
    /// Frames for every subscription arrive on the returned receiver. The
    /// receiver yields `None` once the connection is gone.
    async fn connect(&self) -> Result<mpsc::UnboundedReceiver<EventFrame>, TransportError>;

    async fn subscribe(&self, subscriber: &str, query: &str) -> Result<(), TransportError>;

    async fn unsubscribe(&self, subscriber: &str, query: &str) -> Result<(), TransportError>;
}
