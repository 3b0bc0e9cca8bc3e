//! WebSocket transport for the client.
//!
//! Provides [`WsTransport`] which owns the socket to the execution backend.
//! This is a thin layer that moves text payloads in and out and reports
//! lifecycle changes. Protocol logic remains in the Sans-IO
//! [`RunSession`](crate::RunSession).
//!
//! Connecting and sending never block the caller. The socket runs in a
//! spawned task which talks to the transport through ordered channels, and
//! every notification is published to all subscribers in arrival order.

use std::{
    future::Future,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use futures::{SinkExt, StreamExt};
use runwire_core::{Connection, ConnectionState, Url};
use runwire_proto::ClientMessage;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;

use crate::event::TransportEvent;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection could not be started.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Stream error.
    #[error("stream error: {0}")]
    Stream(String),
}

/// Transport configuration.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Upper bound on the close handshake after [`WsTransport::close`].
    pub close_grace: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self { close_grace: Duration::from_millis(250) }
    }
}

/// Identifies one subscriber of the event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Ordered stream of transport events for one subscriber.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    events: mpsc::UnboundedReceiver<TransportEvent>,
}

impl Subscription {
    /// Identifier to pass to [`WsTransport::unsubscribe`].
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Wait for the next event.
    ///
    /// Returns `None` once the subscription was removed and every buffered
    /// event has been received.
    pub async fn recv(&mut self) -> Option<TransportEvent> {
        self.events.recv().await
    }

    /// Next buffered event, if any.
    pub fn try_recv(&mut self) -> Option<TransportEvent> {
        self.events.try_recv().ok()
    }
}

/// Subscriber registry shared with the socket task.
#[derive(Debug, Default)]
struct Subscribers {
    next_id: AtomicU64,
    senders: Mutex<Vec<(SubscriptionId, mpsc::UnboundedSender<TransportEvent>)>>,
}

impl Subscribers {
    fn subscribe(&self) -> Subscription {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.lock().unwrap_or_else(PoisonError::into_inner).push((id, tx));
        Subscription { id, events: rx }
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.senders.lock().unwrap_or_else(PoisonError::into_inner).retain(|(sid, _)| *sid != id);
    }

    /// Deliver to every live subscriber; dropped receivers are pruned.
    fn publish(&self, event: &TransportEvent) {
        self.senders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(_, tx)| tx.send(event.clone()).is_ok());
    }
}

/// Work queued for the socket task.
#[derive(Debug)]
enum Outbound {
    Text(String),
    Close,
}

/// WebSocket transport to the execution backend.
///
/// Single use: one [`connect`](Self::connect) per instance. After the
/// connection closes a new transport is required to retry.
#[derive(Debug)]
pub struct WsTransport {
    config: TransportConfig,
    subscribers: Arc<Subscribers>,
    state: watch::Receiver<ConnectionState>,
    /// Taken by `connect`; `None` means the transport was used.
    state_tx: Option<watch::Sender<ConnectionState>>,
    outbound: Option<mpsc::UnboundedSender<Outbound>>,
}

impl WsTransport {
    /// Create a transport in [`ConnectionState::Closed`].
    pub fn new(config: TransportConfig) -> Self {
        let (state_tx, state) = watch::channel(ConnectionState::Closed);
        Self {
            config,
            subscribers: Arc::new(Subscribers::default()),
            state,
            state_tx: Some(state_tx),
            outbound: None,
        }
    }

    /// Attach a new subscriber. It receives every event published from now
    /// on, in order.
    pub fn subscribe(&self) -> Subscription {
        self.subscribers.subscribe()
    }

    /// Detach a subscriber. Events already buffered remain readable.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers.unsubscribe(id);
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Start connecting to the socket URL and return immediately.
    ///
    /// The outcome is published as [`TransportEvent::Opened`], or as
    /// [`TransportEvent::Error`] followed by [`TransportEvent::Closed`].
    ///
    /// # Errors
    ///
    /// - `TransportError::Connection` if this transport was already used or no
    ///   tokio runtime is available
    pub fn connect(&mut self, url: &Url) -> Result<(), TransportError> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| TransportError::Connection(format!("no async runtime: {e}")))?;

        let Some(state_tx) = self.state_tx.take() else {
            return Err(TransportError::Connection("transport already used".to_string()));
        };

        let mut connection = Connection::new(url.clone());
        connection.begin_open().map_err(|e| TransportError::Connection(e.to_string()))?;
        state_tx.send_replace(connection.state());

        let (tx, rx) = mpsc::unbounded_channel();
        self.outbound = Some(tx);

        let socket = SocketTask {
            connection,
            state_tx,
            subscribers: Arc::clone(&self.subscribers),
            close_grace: self.config.close_grace,
        };
        handle.spawn(socket.run(rx));

        tracing::debug!(%url, "connect issued");
        Ok(())
    }

    /// Serialize and transmit a message.
    ///
    /// No-op unless the connection is open.
    pub fn send(&self, message: &ClientMessage) {
        if self.state() != ConnectionState::Open {
            tracing::debug!(kind = message.kind(), state = ?self.state(), "send dropped");
            return;
        }

        let text = match message.encode() {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(kind = message.kind(), error = %e, "encode failed");
                return;
            },
        };

        if let Some(outbound) = &self.outbound
            && outbound.send(Outbound::Text(text)).is_err()
        {
            tracing::debug!(kind = message.kind(), "send dropped: socket task gone");
        }
    }

    /// Close the connection after flushing queued messages.
    ///
    /// The close handshake is bounded by [`TransportConfig::close_grace`].
    /// Idempotent.
    pub fn close(&mut self) {
        if let Some(outbound) = self.outbound.take() {
            let _ = outbound.send(Outbound::Close);
        }
    }

    /// Future that resolves once the connection is closed.
    ///
    /// Resolves immediately if the transport never connected.
    pub fn closed(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut state = self.state.clone();
        async move {
            let _ = state.wait_for(|s| *s == ConnectionState::Closed).await;
        }
    }
}

/// Socket task state.
struct SocketTask {
    connection: Connection,
    state_tx: watch::Sender<ConnectionState>,
    subscribers: Arc<Subscribers>,
    close_grace: Duration,
}

impl SocketTask {
    async fn run(mut self, mut outbound: mpsc::UnboundedReceiver<Outbound>) {
        let url = self.connection.url().as_str().to_string();
        let stream = match tokio_tungstenite::connect_async(url.as_str()).await {
            Ok((stream, _response)) => stream,
            Err(e) => {
                tracing::warn!(%url, error = %e, "connect failed");
                self.subscribers.publish(&TransportEvent::Error(format!("connect failed: {e}")));
                self.finish();
                return;
            },
        };

        if let Err(e) = self.connection.mark_open() {
            tracing::warn!(error = %e, "unexpected open");
        }
        self.state_tx.send_replace(self.connection.state());
        tracing::info!(%url, "connection open");
        self.subscribers.publish(&TransportEvent::Opened);

        let (mut sink, mut source) = stream.split();
        loop {
            tokio::select! {
                queued = outbound.recv() => match queued {
                    Some(Outbound::Text(text)) => {
                        if let Err(e) = sink.send(Message::text(text)).await {
                            self.fail(&e.to_string());
                            break;
                        }
                    },
                    Some(Outbound::Close) | None => {
                        let grace = self.close_grace;
                        let handshake = async {
                            let _ = sink.send(Message::Close(None)).await;
                            while let Some(Ok(frame)) = source.next().await {
                                if frame.is_close() {
                                    break;
                                }
                            }
                        };
                        if tokio::time::timeout(grace, handshake).await.is_err() {
                            tracing::debug!(?grace, "close handshake timed out");
                        }
                        break;
                    },
                },
                inbound = source.next() => match inbound {
                    Some(Ok(Message::Text(text))) => {
                        self.subscribers.publish(&TransportEvent::Message(text.as_str().to_owned()));
                    },
                    Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes.to_vec()) {
                        Ok(text) => self.subscribers.publish(&TransportEvent::Message(text)),
                        Err(e) => self.subscribers.publish(&TransportEvent::Error(format!(
                            "binary payload is not utf-8: {e}"
                        ))),
                    },
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {},
                    Some(Err(e)) => {
                        self.fail(&e.to_string());
                        break;
                    },
                },
            }
        }

        self.finish();
    }

    fn fail(&self, reason: &str) {
        tracing::warn!(error = reason, "socket error");
        self.subscribers.publish(&TransportEvent::Error(format!("stream error: {reason}")));
    }

    fn finish(&mut self) {
        self.connection.mark_closed();
        self.state_tx.send_replace(self.connection.state());
        tracing::info!("connection closed");
        self.subscribers.publish(&TransportEvent::Closed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_reaches_every_subscriber_in_order() {
        let subscribers = Subscribers::default();
        let mut first = subscribers.subscribe();
        let mut second = subscribers.subscribe();

        subscribers.publish(&TransportEvent::Opened);
        subscribers.publish(&TransportEvent::Message("a".to_string()));

        for sub in [&mut first, &mut second] {
            assert_eq!(sub.try_recv(), Some(TransportEvent::Opened));
            assert_eq!(sub.try_recv(), Some(TransportEvent::Message("a".to_string())));
            assert_eq!(sub.try_recv(), None);
        }
    }

    #[test]
    fn unsubscribed_receives_nothing_new() {
        let subscribers = Subscribers::default();
        let mut sub = subscribers.subscribe();
        subscribers.publish(&TransportEvent::Opened);
        subscribers.unsubscribe(sub.id());
        subscribers.publish(&TransportEvent::Closed);

        assert_eq!(sub.try_recv(), Some(TransportEvent::Opened));
        assert_eq!(sub.try_recv(), None);
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let subscribers = Subscribers::default();
        drop(subscribers.subscribe());
        let _live = subscribers.subscribe();

        subscribers.publish(&TransportEvent::Opened);
        assert_eq!(subscribers.senders.lock().unwrap().len(), 1);
    }

    #[test]
    fn send_before_connect_is_dropped() {
        let transport = WsTransport::new(TransportConfig::default());
        transport.send(&ClientMessage::Close);
        assert_eq!(transport.state(), ConnectionState::Closed);
    }

    #[test]
    fn connect_requires_runtime() {
        let mut transport = WsTransport::new(TransportConfig::default());
        let url = Url::parse("ws://127.0.0.1:9/ws").unwrap();
        assert!(matches!(transport.connect(&url), Err(TransportError::Connection(_))));
    }
}
