use crate::backend::join_base;
use crate::protocol::{EnginePacket, SocketPacket, SocketPacketKind};
use crate::FeedError;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use glance_core::Email;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;

pub const NEW_EMAIL_EVENT: &str = "new_email";

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    NewEmail(Email),
}

/// Something that can open a live connection to the backend.
#[async_trait]
pub trait PushChannel: Send + Sync + 'static {
    async fn connect(&self) -> Result<Box<dyn PushStream>, FeedError>;
}

/// One open connection. Dropping it releases the underlying socket.
#[async_trait]
pub trait PushStream: Send {
    /// Next decoded event, or `Ok(None)` once the server has closed the connection.
    async fn next_event(&mut self) -> Result<Option<PushEvent>, FeedError>;

    async fn close(&mut self) -> Result<(), FeedError>;
}

/// Socket.IO client speaking the Engine.IO v4 WebSocket transport.
#[derive(Debug, Clone)]
pub struct SocketIoChannel {
    endpoint: Url,
    connect_timeout: Duration,
}

impl SocketIoChannel {
    pub fn new(base_url: &Url) -> Result<Self, FeedError> {
        Ok(Self {
            endpoint: socket_endpoint(base_url)?,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        })
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl PushChannel for SocketIoChannel {
    async fn connect(&self) -> Result<Box<dyn PushStream>, FeedError> {
        let (mut ws, _response) = timeout(self.connect_timeout, connect_async(self.endpoint.as_str()))
            .await
            .map_err(|_| FeedError::Protocol("websocket connect timed out".to_string()))??;

        let open = match read_packet(&mut ws, self.connect_timeout).await? {
            Some(EnginePacket::Open(open)) => open,
            Some(other) => {
                return Err(FeedError::Protocol(format!(
                    "expected open packet, got {other:?}"
                )))
            }
            None => return Err(FeedError::Protocol("closed during handshake".to_string())),
        };

        send_packet(&mut ws, &EnginePacket::Message(SocketPacket::connect().encode())).await?;

        let idle_limit = Duration::from_millis(open.ping_interval + open.ping_timeout);
        loop {
            match read_packet(&mut ws, idle_limit).await? {
                Some(EnginePacket::Message(payload)) => {
                    let packet = SocketPacket::decode(&payload)?;
                    match packet.kind {
                        SocketPacketKind::Connect => break,
                        SocketPacketKind::ConnectError => {
                            let reason = packet.data.map(|data| data.to_string()).unwrap_or_default();
                            return Err(FeedError::Rejected(reason));
                        }
                        kind => tracing::debug!(?kind, "packet before connect ack ignored"),
                    }
                }
                Some(EnginePacket::Ping(payload)) => {
                    send_packet(&mut ws, &EnginePacket::Pong(payload)).await?;
                }
                Some(EnginePacket::Close) | None => {
                    return Err(FeedError::Protocol("closed during handshake".to_string()))
                }
                Some(_) => {}
            }
        }

        tracing::info!(sid = %open.sid, endpoint = %self.endpoint, "push channel connected");
        Ok(Box::new(SocketIoStream {
            ws,
            idle_limit,
            closed: false,
        }))
    }
}

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct SocketIoStream {
    ws: Socket,
    idle_limit: Duration,
    closed: bool,
}

#[async_trait]
impl PushStream for SocketIoStream {
    async fn next_event(&mut self) -> Result<Option<PushEvent>, FeedError> {
        while !self.closed {
            let Some(packet) = read_packet(&mut self.ws, self.idle_limit).await? else {
                self.closed = true;
                break;
            };

            match packet {
                EnginePacket::Ping(payload) => {
                    send_packet(&mut self.ws, &EnginePacket::Pong(payload)).await?;
                }
                EnginePacket::Close => self.closed = true,
                EnginePacket::Message(payload) => {
                    let packet = match SocketPacket::decode(&payload) {
                        Ok(packet) => packet,
                        Err(err) => {
                            tracing::warn!("skipping malformed socket.io packet: {err}");
                            continue;
                        }
                    };
                    match packet.kind {
                        SocketPacketKind::Disconnect => self.closed = true,
                        SocketPacketKind::Event => {
                            if let Some(event) = decode_event(&packet) {
                                return Ok(Some(event));
                            }
                        }
                        kind => tracing::debug!(?kind, "unexpected socket.io packet ignored"),
                    }
                }
                _ => {}
            }
        }

        Ok(None)
    }

    async fn close(&mut self) -> Result<(), FeedError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let _ = send_packet(&mut self.ws, &EnginePacket::Message(SocketPacket::disconnect().encode())).await;
        match self.ws.close(None).await {
            Ok(()) | Err(WsError::ConnectionClosed) | Err(WsError::AlreadyClosed) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

fn decode_event(packet: &SocketPacket) -> Option<PushEvent> {
    let (name, payload) = packet.event_parts()?;
    if name != NEW_EMAIL_EVENT {
        tracing::debug!(event = name, "push event ignored");
        return None;
    }

    let payload = payload.cloned().unwrap_or_default();
    match serde_json::from_value::<Email>(payload) {
        Ok(email) => Some(PushEvent::NewEmail(email)),
        Err(err) => {
            tracing::warn!("dropping undecodable {NEW_EMAIL_EVENT} payload: {err}");
            None
        }
    }
}

async fn read_packet(ws: &mut Socket, limit: Duration) -> Result<Option<EnginePacket>, FeedError> {
    loop {
        let frame = timeout(limit, ws.next())
            .await
            .map_err(|_| FeedError::PingTimeout(limit))?;

        match frame {
            None | Some(Ok(Message::Close(_))) => return Ok(None),
            Some(Err(WsError::ConnectionClosed)) => return Ok(None),
            Some(Err(err)) => return Err(err.into()),
            Some(Ok(Message::Text(text))) => return EnginePacket::decode(&text).map(Some),
            Some(Ok(_)) => {}
        }
    }
}

async fn send_packet(ws: &mut Socket, packet: &EnginePacket) -> Result<(), FeedError> {
    ws.send(Message::Text(packet.encode())).await?;
    Ok(())
}

/// `http://host/base` becomes `ws://host/base/socket.io/?EIO=4&transport=websocket`.
fn socket_endpoint(base_url: &Url) -> Result<Url, FeedError> {
    let mut endpoint = join_base(base_url, "socket.io/")?;
    let scheme = match endpoint.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(FeedError::Protocol(format!("unsupported backend scheme {other}"))),
    };
    endpoint
        .set_scheme(scheme)
        .map_err(|_| FeedError::Protocol(format!("cannot switch {endpoint} to {scheme}")))?;
    endpoint.set_query(Some("EIO=4&transport=websocket"));
    Ok(endpoint)
}
