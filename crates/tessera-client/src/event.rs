//! Event subscriptions over one shared connection
//!
//! The connection is opened on the first subscribe. A demultiplexer task
//! routes each frame to the subscription whose query it matched, and every
//! subscription runs its callback on its own dispatch task, in arrival
//! order. Unsubscribing waits for an in-flight callback to return, so no
//! callback fires once [`EventClient::unsubscribe`] has completed.
//!
//! Callbacks must not call back into the client's `unsubscribe` for their
//! own subscription; the dispatch task holds the subscription state for
//! the duration of the callback.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tessera_types::query::{
    NEW_BLOCK_HEADER_VALUE, NEW_BLOCK_VALUE, TX_VALUE, TYPE_KEY, VALIDATOR_SET_UPDATES_VALUE,
};
use tessera_types::{
    EventDataNewBlock, EventDataNewBlockHeader, EventDataTx, EventDataValidatorSetUpdates,
    EventQueryBuilder, MsgRegistry,
};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{ClientError, Result};
use crate::transport::{EventFrame, Transport};
use crate::wire;

/// Lifecycle of one subscription
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubscriptionState {
    /// Frames are being delivered to the callback
    Active,
    /// Ended by [`EventClient::unsubscribe`]
    Unsubscribed,
    /// The shared connection went away; subscriptions are not renewed
    ConnectionLost,
}

/// Handle to an active subscription
#[derive(Clone, Debug)]
pub struct Subscription {
    id: String,
    query: String,
    serial: u64,
    state: Arc<Mutex<SubscriptionState>>,
}

impl Subscription {
    /// Subscriber id the subscription was registered under
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub async fn state(&self) -> SubscriptionState {
        *self.state.lock().await
    }
}

struct Route {
    serial: u64,
    generation: u64,
    sender: mpsc::UnboundedSender<Value>,
}

type Routes = Arc<Mutex<HashMap<String, Route>>>;

struct Connection {
    generation: u64,
    demux: JoinHandle<()>,
    closed: Arc<AtomicBool>,
}

pub struct EventClient {
    transport: Arc<dyn Transport>,
    registry: Arc<MsgRegistry>,
    subscriber_id: String,
    routes: Routes,
    connection: Mutex<Option<Connection>>,
    next_serial: AtomicU64,
    next_generation: AtomicU64,
}

impl EventClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        registry: Arc<MsgRegistry>,
        subscriber_id: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            registry,
            subscriber_id: subscriber_id.into(),
            routes: Arc::new(Mutex::new(HashMap::new())),
            connection: Mutex::new(None),
            next_serial: AtomicU64::new(1),
            next_generation: AtomicU64::new(1),
        }
    }

    pub fn subscriber_id(&self) -> &str {
        &self.subscriber_id
    }

    /// New blocks, optionally narrowed by `filter`
    ///
    /// Transactions in a block that fail to decode are left out of the
    /// delivered block.
    pub async fn subscribe_new_block<F>(
        &self,
        filter: Option<EventQueryBuilder>,
        callback: F,
    ) -> Result<Subscription>
    where
        F: FnMut(EventDataNewBlock) + Send + 'static,
    {
        let query = filter
            .unwrap_or_default()
            .add_condition(TYPE_KEY, NEW_BLOCK_VALUE)
            .build();
        let registry = self.registry.clone();
        self.subscribe_with(
            query,
            move |data| wire::translate_new_block(data, &registry),
            callback,
        )
        .await
    }

    /// Transactions matching `filter`
    pub async fn subscribe_tx<F>(&self, filter: EventQueryBuilder, callback: F) -> Result<Subscription>
    where
        F: FnMut(EventDataTx) + Send + 'static,
    {
        let query = filter.add_condition(TYPE_KEY, TX_VALUE).build();
        let registry = self.registry.clone();
        self.subscribe_with(
            query,
            move |data| wire::translate_tx(data, &registry),
            callback,
        )
        .await
    }

    pub async fn subscribe_new_block_header<F>(&self, callback: F) -> Result<Subscription>
    where
        F: FnMut(EventDataNewBlockHeader) + Send + 'static,
    {
        let query = EventQueryBuilder::new()
            .add_condition(TYPE_KEY, NEW_BLOCK_HEADER_VALUE)
            .build();
        self.subscribe_with(query, wire::translate_new_block_header, callback)
            .await
    }

    pub async fn subscribe_validator_set_updates<F>(&self, callback: F) -> Result<Subscription>
    where
        F: FnMut(EventDataValidatorSetUpdates) + Send + 'static,
    {
        let query = EventQueryBuilder::new()
            .add_condition(TYPE_KEY, VALIDATOR_SET_UPDATES_VALUE)
            .build();
        self.subscribe_with(query, wire::translate_validator_set_updates, callback)
            .await
    }

    /// End `subscription` and tell the node
    ///
    /// A second call for the same subscription returns whatever error the
    /// node reports for an unknown subscription.
    pub async fn unsubscribe(&self, subscription: &Subscription) -> Result<()> {
        {
            let mut state = subscription.state.lock().await;
            if *state == SubscriptionState::Active {
                *state = SubscriptionState::Unsubscribed;
            }
        }

        {
            let mut routes = self.routes.lock().await;
            if routes
                .get(&subscription.query)
                .is_some_and(|route| route.serial == subscription.serial)
            {
                routes.remove(&subscription.query);
            }
        }

        self.transport
            .unsubscribe(&subscription.id, &subscription.query)
            .await?;
        info!(query = %subscription.query, "unsubscribed");
        Ok(())
    }

    async fn subscribe_with<E, T, F>(
        &self,
        query: String,
        translate: T,
        mut callback: F,
    ) -> Result<Subscription>
    where
        E: Send + 'static,
        T: Fn(Value) -> Result<E> + Send + 'static,
        F: FnMut(E) + Send + 'static,
    {
        let generation = self.ensure_connected().await?;

        let serial = self.next_serial.fetch_add(1, Ordering::Relaxed);
        let (sender, mut receiver) = mpsc::unbounded_channel();
        {
            let mut routes = self.routes.lock().await;
            if routes
                .get(&query)
                .is_some_and(|route| route.generation == generation)
            {
                return Err(ClientError::DuplicateSubscription(query));
            }
            routes.insert(
                query.clone(),
                Route {
                    serial,
                    generation,
                    sender,
                },
            );
        }

        if let Err(err) = self.transport.subscribe(&self.subscriber_id, &query).await {
            self.routes.lock().await.remove(&query);
            return Err(err.into());
        }

        let state = Arc::new(Mutex::new(SubscriptionState::Active));
        let task_state = state.clone();
        let task_query = query.clone();
        tokio::spawn(async move {
            while let Some(data) = receiver.recv().await {
                let state = task_state.lock().await;
                if *state != SubscriptionState::Active {
                    break;
                }
                match translate(data) {
                    Ok(event) => callback(event),
                    Err(err) => warn!(query = %task_query, error = %err, "skipping undecodable event"),
                }
            }

            let mut state = task_state.lock().await;
            if *state == SubscriptionState::Active {
                *state = SubscriptionState::ConnectionLost;
                warn!(query = %task_query, "subscription ended by connection loss");
            }
        });

        info!(query = %query, subscriber = %self.subscriber_id, "subscribed");
        Ok(Subscription {
            id: self.subscriber_id.clone(),
            query,
            serial,
            state,
        })
    }

    /// Open the shared connection unless a live one exists, returning its
    /// generation
    async fn ensure_connected(&self) -> Result<u64> {
        let mut connection = self.connection.lock().await;
        if let Some(conn) = connection.as_ref() {
            if !conn.closed.load(Ordering::Acquire) {
                return Ok(conn.generation);
            }
        }

        let frames = self.transport.connect().await?;
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        debug!(subscriber = %self.subscriber_id, generation, "opened event connection");
        let closed = Arc::new(AtomicBool::new(false));
        let demux = tokio::spawn(demultiplex(
            frames,
            self.routes.clone(),
            generation,
            closed.clone(),
        ));
        *connection = Some(Connection {
            generation,
            demux,
            closed,
        });
        Ok(generation)
    }
}

impl Drop for EventClient {
    fn drop(&mut self) {
        if let Some(conn) = self.connection.get_mut().take() {
            conn.demux.abort();
        }
    }
}

async fn demultiplex(
    mut frames: mpsc::UnboundedReceiver<EventFrame>,
    routes: Routes,
    generation: u64,
    closed: Arc<AtomicBool>,
) {
    while let Some(frame) = frames.recv().await {
        let routes = routes.lock().await;
        match routes.get(&frame.query) {
            Some(route) => {
                if route.sender.send(frame.data).is_err() {
                    debug!(query = %frame.query, "dispatch task gone");
                }
            }
            None => debug!(query = %frame.query, "no subscription for event"),
        }
    }

    // marked before routes drop so no dispatch task reports the loss first
    closed.store(true, Ordering::Release);
    let dropped = {
        let mut routes = routes.lock().await;
        let before = routes.len();
        // routes opened on a newer connection stay
        routes.retain(|_, route| route.generation != generation);
        before - routes.len()
    };
    warn!(subscriptions = dropped, generation, "event connection closed");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(serial: u64, generation: u64) -> (Route, mpsc::UnboundedReceiver<Value>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Route {
                serial,
                generation,
                sender,
            },
            receiver,
        )
    }

    #[tokio::test]
    async fn test_closed_connection_keeps_newer_routes() {
        let routes: Routes = Arc::default();
        let (stale, mut stale_rx) = route(1, 1);
        let (fresh, mut fresh_rx) = route(2, 2);
        {
            let mut map = routes.lock().await;
            map.insert("tm.event = 'NewBlock'".to_string(), stale);
            map.insert("tm.event = 'Tx'".to_string(), fresh);
        }

        let (frames_tx, frames_rx) = mpsc::unbounded_channel();
        frames_tx
            .send(EventFrame {
                query: "tm.event = 'NewBlock'".to_string(),
                data: Value::from(7),
            })
            .unwrap();
        drop(frames_tx);

        let closed = Arc::new(AtomicBool::new(false));
        demultiplex(frames_rx, routes.clone(), 1, closed.clone()).await;

        assert!(closed.load(Ordering::Acquire));
        assert_eq!(stale_rx.recv().await, Some(Value::from(7)));
        assert_eq!(stale_rx.recv().await, None);

        let map = routes.lock().await;
        assert_eq!(map.len(), 1);
        assert_eq!(map["tm.event = 'Tx'"].generation, 2);
        drop(map);
        assert!(fresh_rx.try_recv().is_err());
    }
}
