//! Tendermint JSON-RPC transport
//!
//! Queries and broadcasts go over HTTP. Subscriptions share one WebSocket;
//! requests on it are correlated with their responses by id, and pushed
//! event frames are forwarded to the receiver handed out by `connect`.
//! A dropped socket ends the frame stream and is not reopened here.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures_util::{SinkExt, StreamExt};
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tessera_types::{ResultBroadcastTx, ResultBroadcastTxCommit};
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, warn};
use url::Url;

use crate::transport::{AbciQueryResponse, EventFrame, Transport, TransportError};
use crate::wire::{WireAbciQuery, WireBroadcastTx, WireBroadcastTxCommit};

/// RPC request
#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: String,
    method: &'a str,
    params: Value,
}

/// RPC response
#[derive(Deserialize)]
struct RpcResponse<T> {
    #[serde(default)]
    id: Value,
    result: Option<T>,
    error: Option<RpcError>,
}

/// RPC error
#[derive(Deserialize)]
struct RpcError {
    code: i64,
    message: String,
    #[serde(default)]
    data: String,
}

impl From<RpcError> for TransportError {
    fn from(err: RpcError) -> Self {
        let message = if err.data.is_empty() {
            err.message
        } else {
            format!("{}: {}", err.message, err.data)
        };
        TransportError::Rpc {
            code: err.code,
            message,
        }
    }
}

type Waiter = oneshot::Sender<Result<Value, TransportError>>;
type PendingMap = Arc<Mutex<HashMap<String, Waiter>>>;

struct WsHandle {
    outgoing: mpsc::UnboundedSender<Message>,
    pending: PendingMap,
}

/// Derive the WebSocket endpoint from the RPC endpoint
pub fn websocket_url(rpc_url: &Url, ws_path: &str) -> Result<Url, TransportError> {
    let mut ws_url = rpc_url.join(ws_path)?;
    let scheme = match rpc_url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(TransportError::WebSocket(format!(
                "unsupported scheme: {other}"
            )))
        }
    };
    ws_url
        .set_scheme(scheme)
        .map_err(|_| TransportError::WebSocket(format!("cannot use scheme {scheme}")))?;
    Ok(ws_url)
}

/// JSON-RPC over HTTP plus a WebSocket for events
pub struct RpcTransport {
    http: HttpClient,
    rpc_url: Url,
    ws_url: Url,
    timeout: Duration,
    next_id: AtomicU64,
    ws: Mutex<Option<WsHandle>>,
}

impl RpcTransport {
    pub fn new(node_uri: &str, ws_path: &str, timeout: Duration) -> Result<Self, TransportError> {
        let rpc_url = Url::parse(node_uri)?;
        let ws_url = websocket_url(&rpc_url, ws_path)?;
        let http = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            rpc_url,
            ws_url,
            timeout,
            next_id: AtomicU64::new(1),
            ws: Mutex::new(None),
        })
    }

    pub fn rpc_url(&self) -> &Url {
        &self.rpc_url
    }

    pub fn ws_url(&self) -> &Url {
        &self.ws_url
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Make an RPC request over HTTP
    async fn rpc_request<T>(&self, method: &str, params: Value) -> Result<T, TransportError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id().to_string(),
            method,
            params,
        };
        debug!(method, id = %request.id, "rpc request");

        let response = self
            .http
            .post(self.rpc_url.clone())
            .json(&request)
            .send()
            .await?;

        let rpc_response: RpcResponse<T> = response.json().await?;

        if let Some(error) = rpc_response.error {
            return Err(error.into());
        }

        rpc_response
            .result
            .ok_or_else(|| TransportError::InvalidResponse("missing result field".to_string()))
    }

    /// Send a request on the WebSocket and wait for its response
    async fn ws_request(
        &self,
        subscriber: &str,
        method: &str,
        params: Value,
    ) -> Result<Value, TransportError> {
        let id = format!("{subscriber}#{}", self.next_id());
        let (waiter, response) = oneshot::channel();

        let pending = {
            let guard = self.ws.lock().await;
            let handle = guard.as_ref().ok_or(TransportError::NotConnected)?;
            handle.pending.lock().await.insert(id.clone(), waiter);

            let request = RpcRequest {
                jsonrpc: "2.0",
                id: id.clone(),
                method,
                params,
            };
            let text = serde_json::to_string(&request)?;
            if handle.outgoing.send(Message::Text(text.into())).is_err() {
                handle.pending.lock().await.remove(&id);
                return Err(TransportError::ConnectionClosed);
            }
            handle.pending.clone()
        };
        debug!(method, %id, "websocket request");

        match tokio::time::timeout(self.timeout, response).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err(TransportError::ConnectionClosed),
            Err(_) => {
                pending.lock().await.remove(&id);
                Err(TransportError::InvalidResponse(format!(
                    "no response to {method} within {:?}",
                    self.timeout
                )))
            }
        }
    }
}

async fn handle_ws_text(
    text: &str,
    pending: &PendingMap,
    frames: &mpsc::UnboundedSender<EventFrame>,
) {
    let response: RpcResponse<Value> = match serde_json::from_str(text) {
        Ok(response) => response,
        Err(e) => {
            debug!(error = %e, "ignoring malformed websocket message");
            return;
        }
    };

    let id = match &response.id {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    };

    if let Some(waiter) = pending.lock().await.remove(&id) {
        let outcome = match response.error {
            Some(error) => Err(error.into()),
            None => Ok(response.result.unwrap_or(Value::Null)),
        };
        let _ = waiter.send(outcome);
        return;
    }

    if let Some(error) = response.error {
        warn!(%id, code = error.code, message = %error.message, "websocket error");
        return;
    }

    let Some(result) = response.result else {
        return;
    };
    if let (Some(query), Some(data)) = (result.get("query").and_then(Value::as_str), result.get("data")) {
        let frame = EventFrame {
            query: query.to_string(),
            data: data.clone(),
        };
        if frames.send(frame).is_err() {
            debug!("event receiver dropped");
        }
    }
}

#[async_trait]
impl Transport for RpcTransport {
    async fn abci_query(
        &self,
        path: &str,
        data: &[u8],
    ) -> Result<AbciQueryResponse, TransportError> {
        let params = json!({
            "path": path,
            "data": hex::encode(data),
            "prove": false,
        });
        let wire: WireAbciQuery = self.rpc_request("abci_query", params).await?;
        Ok(wire.into())
    }

    async fn broadcast_tx_async(&self, tx: &[u8]) -> Result<ResultBroadcastTx, TransportError> {
        let wire: WireBroadcastTx = self
            .rpc_request("broadcast_tx_async", json!({ "tx": STANDARD.encode(tx) }))
            .await?;
        wire.try_into()
    }

    async fn broadcast_tx_sync(&self, tx: &[u8]) -> Result<ResultBroadcastTx, TransportError> {
        let wire: WireBroadcastTx = self
            .rpc_request("broadcast_tx_sync", json!({ "tx": STANDARD.encode(tx) }))
            .await?;
        wire.try_into()
    }

    async fn broadcast_tx_commit(
        &self,
        tx: &[u8],
    ) -> Result<ResultBroadcastTxCommit, TransportError> {
        let wire: WireBroadcastTxCommit = self
            .rpc_request("broadcast_tx_commit", json!({ "tx": STANDARD.encode(tx) }))
            .await?;
        Ok(wire.into())
    }

    async fn connect(&self) -> Result<mpsc::UnboundedReceiver<EventFrame>, TransportError> {
        let (stream, _) = connect_async(self.ws_url.as_str())
            .await
            .map_err(|e| TransportError::WebSocket(e.to_string()))?;
        let (mut sink, mut source) = stream.split();

        let (outgoing, mut outgoing_rx) = mpsc::unbounded_channel::<Message>();
        let (frames, frames_rx) = mpsc::unbounded_channel();
        let pending: PendingMap = Arc::default();

        tokio::spawn(async move {
            while let Some(message) = outgoing_rx.recv().await {
                if let Err(e) = sink.send(message).await {
                    warn!(error = %e, "websocket write failed");
                    break;
                }
            }
            let _ = sink.close().await;
        });

        let reader_pending = pending.clone();
        let pong = outgoing.clone();
        tokio::spawn(async move {
            while let Some(message) = source.next().await {
                match message {
                    Ok(Message::Text(text)) => {
                        handle_ws_text(text.as_str(), &reader_pending, &frames).await;
                    }
                    Ok(Message::Ping(data)) => {
                        let _ = pong.send(Message::Pong(data));
                    }
                    Ok(Message::Close(_)) => break,
                    Err(e) => {
                        warn!(error = %e, "websocket read failed");
                        break;
                    }
                    _ => {}
                }
            }

            for (_, waiter) in reader_pending.lock().await.drain() {
                let _ = waiter.send(Err(TransportError::ConnectionClosed));
            }
            warn!("websocket connection closed");
        });

        *self.ws.lock().await = Some(WsHandle { outgoing, pending });
        debug!(url = %self.ws_url, "websocket connected");
        Ok(frames_rx)
    }

    async fn subscribe(&self, subscriber: &str, query: &str) -> Result<(), TransportError> {
        self.ws_request(subscriber, "subscribe", json!({ "query": query }))
            .await
            .map(|_| ())
    }

    async fn unsubscribe(&self, subscriber: &str, query: &str) -> Result<(), TransportError> {
        self.ws_request(subscriber, "unsubscribe", json!({ "query": query }))
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_websocket_url() {
        let rpc = Url::parse("http://localhost:26657").unwrap();
        assert_eq!(
            websocket_url(&rpc, "/websocket").unwrap().as_str(),
            "ws://localhost:26657/websocket"
        );

        let secure = Url::parse("https://node.example.com/rpc/").unwrap();
        assert_eq!(
            websocket_url(&secure, "websocket").unwrap().as_str(),
            "wss://node.example.com/rpc/websocket"
        );

        let ftp = Url::parse("ftp://node").unwrap();
        assert!(websocket_url(&ftp, "/websocket").is_err());
    }

    #[test]
    fn test_transport_creation() {
        let transport =
            RpcTransport::new("http://localhost:26657", "/websocket", Duration::from_secs(5))
                .unwrap();
        assert_eq!(transport.rpc_url().as_str(), "http://localhost:26657/");
        assert_eq!(transport.ws_url().as_str(), "ws://localhost:26657/websocket");
        assert!(RpcTransport::new("not a url", "/websocket", Duration::from_secs(5)).is_err());
    }

    #[tokio::test]
    async fn test_subscribe_requires_connection() {
        let transport =
            RpcTransport::new("http://localhost:26657", "/websocket", Duration::from_secs(5))
                .unwrap();
        assert!(matches!(
            transport.subscribe("sub", "tm.event = 'Tx'").await,
            Err(TransportError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_ws_text_routing() {
        let pending: PendingMap = Arc::default();
        let (frames, mut frames_rx) = mpsc::unbounded_channel();

        let (waiter, response) = oneshot::channel();
        pending.lock().await.insert("sub#1".to_string(), waiter);

        handle_ws_text(r#"{"jsonrpc":"2.0","id":"sub#1","result":{}}"#, &pending, &frames).await;
        assert_eq!(response.await.unwrap().unwrap(), json!({}));

        handle_ws_text(
            r#"{"jsonrpc":"2.0","id":"sub#1#event","result":{"query":"tm.event = 'Tx'","data":{"type":"tendermint/event/Tx","value":{}}}}"#,
            &pending,
            &frames,
        )
        .await;
        let frame = frames_rx.recv().await.unwrap();
        assert_eq!(frame.query, "tm.event = 'Tx'");
        assert_eq!(frame.data["type"], "tendermint/event/Tx");

        let (waiter, response) = oneshot::channel();
        pending.lock().await.insert("sub#2".to_string(), waiter);
        handle_ws_text(
            r#"{"jsonrpc":"2.0","id":"sub#2","error":{"code":-32603,"message":"Internal error","data":"subscription not found"}}"#,
            &pending,
            &frames,
        )
        .await;
        match response.await.unwrap() {
            Err(TransportError::Rpc { code, message }) => {
                assert_eq!(code, -32603);
                assert_eq!(message, "Internal error: subscription not found");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
