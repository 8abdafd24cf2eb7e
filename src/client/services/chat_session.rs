use std::sync::Arc;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use url::Url;

use crate::common::error::ChatError;
use crate::common::models::ChatMessage;
use crate::common::protocol::{group_destination, group_topic, ClientFrame, ServerFrame};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Lifecycle of the single live websocket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// What the session reports back to the application.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Connect/disconnect outcomes and transport drops.
    Status { connected: bool },
    /// A broadcast message on the subscribed group topic.
    Message(ChatMessage),
}

struct SessionInner {
    state: ConnectionState,
    /// Bumped on every disconnect. An in-flight handshake that observes a
    /// different generation lost the race and drops its socket silently.
    generation: u64,
    outgoing: Option<mpsc::UnboundedSender<ClientFrame>>,
    reader_task: Option<JoinHandle<()>>,
    writer_task: Option<JoinHandle<()>>,
}

/// Sole owner of the live websocket connection. Everything else goes
/// through `connect` / `send` / `disconnect`; nothing reaches into the
/// transport directly.
///
/// There is no automatic reconnection: a dropped link emits one
/// disconnected status and stays down until the next explicit `connect`.
pub struct ChatSession {
    websocket_url: String,
    handshake_timeout: Duration,
    inner: Arc<Mutex<SessionInner>>,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl ChatSession {
    pub fn new(
        websocket_url: String,
        handshake_timeout: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let session = Self {
            websocket_url,
            handshake_timeout,
            inner: Arc::new(Mutex::new(SessionInner {
                state: ConnectionState::Disconnected,
                generation: 0,
                outgoing: None,
                reader_task: None,
                writer_task: None,
            })),
            events,
        };
        (session, receiver)
    }

    pub async fn state(&self) -> ConnectionState {
        self.inner.lock().await.state
    }

    pub async fn is_connected(&self) -> bool {
        self.state().await == ConnectionState::Connected
    }

    /// Open the websocket and subscribe to the group topic.
    ///
    /// Idempotent guard: while a connection is open or opening this is a
    /// no-op, so rapid double invocation cannot leak a second transport.
    /// Connected status is only reported once the server has acknowledged
    /// the subscription; the whole handshake is bounded by the configured
    /// timeout.
    pub async fn connect(&self, group_id: i64) -> Result<(), ChatError> {
        let generation = {
            let mut inner = self.inner.lock().await;
            match inner.state {
                ConnectionState::Connecting | ConnectionState::Connected => {
                    warn!(
                        "[WS] connect for group {} ignored: already {:?}",
                        group_id, inner.state
                    );
                    return Ok(());
                }
                ConnectionState::Disconnected => inner.state = ConnectionState::Connecting,
            }
            inner.generation
        };

        let handshake = timeout(self.handshake_timeout, self.open_and_subscribe(group_id)).await;

        let mut inner = self.inner.lock().await;
        if inner.generation != generation || inner.state != ConnectionState::Connecting {
            // A disconnect won the race; drop the socket without wiring it.
            debug!("[WS] stale handshake for group {} discarded", group_id);
            return Ok(());
        }

        // Status events are emitted under the state lock so a racing
        // disconnect cannot reorder them against the state they describe.
        let stream = match handshake {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                inner.state = ConnectionState::Disconnected;
                let _ = self.events.send(SessionEvent::Status { connected: false });
                return Err(e);
            }
            Err(_) => {
                inner.state = ConnectionState::Disconnected;
                let _ = self.events.send(SessionEvent::Status { connected: false });
                return Err(ChatError::Handshake(format!(
                    "no subscription ack within {:?}",
                    self.handshake_timeout
                )));
            }
        };

        let (ws_sender, ws_receiver) = stream.split();
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel::<ClientFrame>();

        inner.state = ConnectionState::Connected;
        inner.outgoing = Some(outgoing_tx);
        inner.writer_task = Some(tokio::spawn(Self::write_frames(outgoing_rx, ws_sender)));
        inner.reader_task = Some(tokio::spawn(Self::read_frames(
            ws_receiver,
            group_id,
            generation,
            Arc::clone(&self.inner),
            self.events.clone(),
        )));

        info!("[WS] connected and subscribed to group {}", group_id);
        let _ = self.events.send(SessionEvent::Status { connected: true });
        Ok(())
    }

    /// Publish a chat message to the group destination.
    ///
    /// Requires a connected session; otherwise the message is dropped and
    /// reported, never queued. Blank content is a no-op before it reaches
    /// the transport.
    pub async fn send(&self, group_id: i64, content: &str) -> Result<(), ChatError> {
        let content = content.trim();
        if content.is_empty() {
            debug!("[WS] empty message ignored");
            return Ok(());
        }

        let inner = self.inner.lock().await;
        if inner.state != ConnectionState::Connected {
            warn!("[WS] send to group {} rejected: not connected", group_id);
            return Err(ChatError::SendRejected);
        }
        let frame = ClientFrame::Publish {
            destination: group_destination(group_id),
            content: content.to_string(),
        };
        match &inner.outgoing {
            Some(tx) if tx.send(frame).is_ok() => Ok(()),
            _ => {
                warn!("[WS] send to group {} rejected: writer gone", group_id);
                Err(ChatError::SendRejected)
            }
        }
    }

    /// Tear the connection down.
    ///
    /// Safe when never connected, safe while still connecting (the
    /// transport is force-closed by aborting its tasks instead of sending a
    /// polite close frame), and safe called twice. Each call leaves the
    /// state Disconnected and emits exactly one disconnected status.
    pub async fn disconnect(&self) {
        let mut inner = self.inner.lock().await;
        inner.generation += 1;
        let previous = std::mem::replace(&mut inner.state, ConnectionState::Disconnected);
        inner.outgoing = None;
        if let Some(task) = inner.reader_task.take() {
            task.abort();
        }
        if let Some(task) = inner.writer_task.take() {
            task.abort();
        }
        if previous != ConnectionState::Disconnected {
            info!("[WS] disconnected (was {:?})", previous);
        }
        let _ = self.events.send(SessionEvent::Status { connected: false });
    }

    async fn open_and_subscribe(&self, group_id: i64) -> Result<WsStream, ChatError> {
        let url = Url::parse(&self.websocket_url)
            .map_err(|e| ChatError::Handshake(format!("invalid websocket url: {}", e)))?;
        let (mut stream, _) = connect_async(url.as_str())
            .await
            .map_err(|e| ChatError::Handshake(format!("failed to connect: {}", e)))?;

        let topic = group_topic(group_id);
        let subscribe = serde_json::to_string(&ClientFrame::Subscribe {
            topic: topic.clone(),
        })
        .map_err(|e| ChatError::Handshake(format!("failed to encode subscribe: {}", e)))?;
        stream
            .send(Message::Text(subscribe))
            .await
            .map_err(|e| ChatError::Handshake(format!("failed to send subscribe: {}", e)))?;

        // Connected is only reported after the topic is acknowledged, so a
        // true status implies a live subscription, not just a socket.
        loop {
            match stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<ServerFrame>(&text) {
                        Ok(ServerFrame::Subscribed { topic: acked }) if acked == topic => {
                            return Ok(stream);
                        }
                        Ok(ServerFrame::Error { message }) => {
                            return Err(ChatError::Handshake(message));
                        }
                        Ok(other) => {
                            debug!("[WS] frame before subscription ack ignored: {:?}", other);
                        }
                        Err(e) => {
                            return Err(ChatError::Handshake(format!(
                                "invalid frame during handshake: {}",
                                e
                            )));
                        }
                    }
                }
                Some(Ok(Message::Close(_))) => {
                    return Err(ChatError::Handshake(
                        "server closed the connection during handshake".to_string(),
                    ));
                }
                Some(Ok(_)) => {
                    // ping/pong/binary
                }
                Some(Err(e)) => {
                    return Err(ChatError::Handshake(format!(
                        "websocket error during handshake: {}",
                        e
                    )));
                }
                None => {
                    return Err(ChatError::Handshake(
                        "connection closed during handshake".to_string(),
                    ));
                }
            }
        }
    }

    async fn write_frames(
        mut outgoing: mpsc::UnboundedReceiver<ClientFrame>,
        mut ws_sender: SplitSink<WsStream, Message>,
    ) {
        while let Some(frame) = outgoing.recv().await {
            let json = match serde_json::to_string(&frame) {
                Ok(json) => json,
                Err(e) => {
                    error!("[WS] failed to encode outgoing frame: {}", e);
                    continue;
                }
            };
            if let Err(e) = ws_sender.send(Message::Text(json)).await {
                warn!("[WS] failed to send frame: {}", e);
                break;
            }
        }
        // Channel closed on disconnect; dropping the sink closes the socket.
    }

    async fn read_frames(
        mut ws_receiver: SplitStream<WsStream>,
        group_id: i64,
        generation: u64,
        inner: Arc<Mutex<SessionInner>>,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) {
        while let Some(message) = ws_receiver.next().await {
            match message {
                Ok(Message::Text(text)) => match serde_json::from_str::<ServerFrame>(&text) {
                    Ok(ServerFrame::Message(wire)) => {
                        let message = ChatMessage::from_wire(wire, group_id);
                        if events.send(SessionEvent::Message(message)).is_err() {
                            break;
                        }
                    }
                    Ok(ServerFrame::Subscribed { topic }) => {
                        debug!("[WS] duplicate subscription ack for {} ignored", topic);
                    }
                    Ok(ServerFrame::Error { message }) => {
                        warn!("[WS] server error: {}", message);
                    }
                    Err(e) => {
                        warn!("[WS] unparseable frame: {} - raw: {}", e, text);
                    }
                },
                Ok(Message::Close(_)) => {
                    info!("[WS] connection closed by server");
                    break;
                }
                Ok(_) => {
                    // ping/pong/binary
                }
                Err(e) => {
                    warn!("[WS] transport error: {}", e);
                    break;
                }
            }
        }

        // No automatic reconnection: mark the session dropped, unless a
        // disconnect already superseded this connection.
        let mut guard = inner.lock().await;
        if guard.generation == generation && guard.state == ConnectionState::Connected {
            guard.state = ConnectionState::Disconnected;
            guard.outgoing = None;
            guard.reader_task = None;
            guard.writer_task = None;
            let _ = events.send(SessionEvent::Status { connected: false });
        }
    }
}
