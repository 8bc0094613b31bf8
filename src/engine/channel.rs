// Parley Chat Engine — Realtime Channel
//
// One persistent WebSocket connection per client process. Which room's
// events are delivered is controlled entirely by the most recent join/leave
// frame sent, never by a server acknowledgement — so subscription scope is
// modeled as an explicit capability (`RoomSubscription`) that the room
// session owns and releases on every transition, instead of a connection
// whose scope everyone has to assume is right.
//
// Inbound frames are parsed on a background read pump and forwarded over an
// in-process queue; the coordinator drains it on its own schedule.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::atoms::constants::CHANNEL_KEEPALIVE_SECS;
use crate::atoms::error::{ClientError, ClientResult};
use crate::atoms::traits::ChannelTransport;
use crate::atoms::types::{ClientEvent, ServerEvent};

// ── Channel handle ─────────────────────────────────────────────────────────

/// The client's handle on the realtime channel. Cheap to clone; all clones
/// share the one underlying connection.
#[derive(Clone)]
pub struct ChannelHandle {
    transport: Arc<dyn ChannelTransport>,
}

impl ChannelHandle {
    pub fn new(transport: Arc<dyn ChannelTransport>) -> Self {
        ChannelHandle { transport }
    }

    /// Scope the connection to `room` by emitting a join frame. The returned
    /// capability is the only way to send room-scoped frames, and releasing
    /// it is the only way to emit the matching leave.
    pub async fn subscribe(&self, username: &str, room: &str) -> ClientResult<RoomSubscription> {
        self.transport
            .emit(ClientEvent::Join { username: username.to_owned(), room: room.to_owned() })
            .await?;
        debug!("[channel] Subscribed to {}", room);
        Ok(RoomSubscription { room: room.to_owned(), transport: Arc::clone(&self.transport) })
    }

    /// Broadcast an already-persisted system announcement into `room`.
    /// Valid while not subscribed to `room` — the server routes by payload.
    pub async fn announce(
        &self,
        username: &str,
        room: &str,
        message: &str,
        date_time: &str,
    ) -> ClientResult<()> {
        self.transport
            .emit(ClientEvent::ConnectRoom {
                message: message.to_owned(),
                date_time: date_time.to_owned(),
                username: username.to_owned(),
                room: room.to_owned(),
            })
            .await
    }
}

// ── Room subscription capability ───────────────────────────────────────────

/// Proof that this connection is currently scoped to `room`. Consumed by
/// `release` (leave) or `exit`, so a stale subscription cannot be reused
/// after a transition.
pub struct RoomSubscription {
    room: String,
    transport: Arc<dyn ChannelTransport>,
}

impl RoomSubscription {
    pub fn room(&self) -> &str {
        &self.room
    }

    /// Emit the leave frame and drop the capability. Fire-and-forget: only
    /// the local send is awaited, the server never acknowledges.
    pub async fn release(self) -> ClientResult<()> {
        self.transport.emit(ClientEvent::Leave {}).await?;
        debug!("[channel] Left {}", self.room);
        Ok(())
    }

    /// Emit the exit frame after server-side membership removal completed.
    pub async fn exit(self) -> ClientResult<()> {
        self.transport.emit(ClientEvent::Exit {}).await?;
        debug!("[channel] Exited {}", self.room);
        Ok(())
    }

    /// Broadcast an already-persisted message to the room's other
    /// subscribers. Never called before persistence has succeeded.
    pub async fn broadcast(&self, message: &str, date_time: &str) -> ClientResult<()> {
        self.transport
            .emit(ClientEvent::Message { message: message.to_owned(), date_time: date_time.to_owned() })
            .await
    }
}

// ── WebSocket transport ────────────────────────────────────────────────────

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, WsMessage>;
type WsSource = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// tokio-tungstenite implementation of the channel seam.
pub struct WsChannel {
    outbound: tokio::sync::Mutex<WsSink>,
}

impl WsChannel {
    /// Connect and start the read pump. Returns the transport plus the queue
    /// of inbound events; the pump ends when the server closes or errors.
    pub async fn connect(
        url: &str,
    ) -> ClientResult<(Arc<WsChannel>, mpsc::UnboundedReceiver<ServerEvent>)> {
        let (stream, _) = connect_async(url)
            .await
            .map_err(|e| ClientError::channel(format!("connect to {} failed: {}", url, e)))?;
        info!("[channel] Connected to {}", url);

        let (sink, source) = stream.split();
        let channel = Arc::new(WsChannel { outbound: tokio::sync::Mutex::new(sink) });
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        tokio::spawn(read_pump(Arc::clone(&channel), source, event_tx));

        Ok((channel, event_rx))
    }

    async fn send_raw(&self, message: WsMessage) -> ClientResult<()> {
        let mut sink = self.outbound.lock().await;
        sink.send(message).await.map_err(|e| ClientError::channel(e.to_string()))
    }
}

#[async_trait]
impl ChannelTransport for WsChannel {
    async fn emit(&self, event: ClientEvent) -> ClientResult<()> {
        debug!("[channel] Emitting {}", event.name());
        let frame = serde_json::to_string(&event)?;
        self.send_raw(WsMessage::Text(frame)).await
    }
}

async fn read_pump(
    channel: Arc<WsChannel>,
    mut source: WsSource,
    event_tx: mpsc::UnboundedSender<ServerEvent>,
) {
    loop {
        let message = tokio::select! {
            message = source.next() => message,
            _ = tokio::time::sleep(std::time::Duration::from_secs(CHANNEL_KEEPALIVE_SECS)) => {
                let _ = channel.send_raw(WsMessage::Ping(vec![])).await;
                continue;
            }
        };

        let text = match message {
            Some(Ok(WsMessage::Text(text))) => text,
            Some(Ok(WsMessage::Ping(data))) => {
                let _ = channel.send_raw(WsMessage::Pong(data)).await;
                continue;
            }
            Some(Ok(WsMessage::Close(_))) => {
                info!("[channel] Server closed the connection");
                break;
            }
            Some(Err(e)) => {
                warn!("[channel] Read error: {}", e);
                break;
            }
            None => break,
            _ => continue,
        };

        match serde_json::from_str::<ServerEvent>(&text) {
            Ok(event) => {
                if event_tx.send(event).is_err() {
                    // Receiver gone — the client is shutting down.
                    break;
                }
            }
            Err(e) => debug!("[channel] Ignoring unparseable frame: {}", e),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testutil::RecordingChannel;

    #[tokio::test]
    async fn test_subscribe_emits_join_with_payload() {
        let transport = RecordingChannel::new();
        let handle = ChannelHandle::new(transport.clone());

        let sub = handle.subscribe("alice", "alice#1").await.unwrap();

        assert_eq!(sub.room(), "alice#1");
        assert_eq!(
            transport.events(),
            vec![ClientEvent::Join { username: "alice".into(), room: "alice#1".into() }]
        );
    }

    #[tokio::test]
    async fn test_release_and_exit_consume_the_capability() {
        let transport = RecordingChannel::new();
        let handle = ChannelHandle::new(transport.clone());

        let sub = handle.subscribe("alice", "alice#1").await.unwrap();
        sub.release().await.unwrap();
        let sub = handle.subscribe("alice", "bob#2").await.unwrap();
        sub.exit().await.unwrap();

        let names: Vec<&str> = transport.events().iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["join", "leave", "join", "exit"]);
    }

    #[tokio::test]
    async fn test_broadcast_carries_server_authoritative_fields() {
        let transport = RecordingChannel::new();
        let handle = ChannelHandle::new(transport.clone());

        let sub = handle.subscribe("alice", "alice#1").await.unwrap();
        sub.broadcast("hello", "2024-01-01 12:00").await.unwrap();

        assert_eq!(
            transport.events().last().unwrap(),
            &ClientEvent::Message { message: "hello".into(), date_time: "2024-01-01 12:00".into() }
        );
    }
}
