//! Engine.IO v4 and Socket.IO v5 packet framing for the WebSocket transport.
//!
//! Each WebSocket text frame carries one Engine.IO packet: a single type
//! digit followed by its payload. Socket.IO packets travel inside Engine.IO
//! `message` packets as `<type>[<attachments>-][<namespace>,][<ack id>][<json>]`.

use crate::FeedError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_NAMESPACE: &str = "/";

/// Parameters the server sends in its `open` packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenHandshake {
    pub sid: String,
    #[serde(default)]
    pub upgrades: Vec<String>,
    /// Milliseconds between server pings.
    pub ping_interval: u64,
    /// Milliseconds the server waits for a pong.
    pub ping_timeout: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_payload: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    Open(OpenHandshake),
    Close,
    Ping(String),
    Pong(String),
    Message(String),
    Upgrade,
    Noop,
}

impl EnginePacket {
    pub fn decode(frame: &str) -> Result<Self, FeedError> {
        let mut chars = frame.chars();
        let kind = chars
            .next()
            .ok_or_else(|| FeedError::Protocol("empty engine.io frame".to_string()))?;
        let payload = chars.as_str();

        Ok(match kind {
            '0' => Self::Open(serde_json::from_str(payload)?),
            '1' => Self::Close,
            '2' => Self::Ping(payload.to_string()),
            '3' => Self::Pong(payload.to_string()),
            '4' => Self::Message(payload.to_string()),
            '5' => Self::Upgrade,
            '6' => Self::Noop,
            other => {
                return Err(FeedError::Protocol(format!(
                    "unknown engine.io packet type {other:?}"
                )))
            }
        })
    }

    pub fn encode(&self) -> String {
        match self {
            // Serializing a plain struct of strings and integers cannot fail.
            Self::Open(open) => format!("0{}", serde_json::to_string(open).unwrap_or_default()),
            Self::Close => "1".to_string(),
            Self::Ping(payload) => format!("2{payload}"),
            Self::Pong(payload) => format!("3{payload}"),
            Self::Message(payload) => format!("4{payload}"),
            Self::Upgrade => "5".to_string(),
            Self::Noop => "6".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketPacketKind {
    Connect,
    Disconnect,
    Event,
    Ack,
    ConnectError,
    BinaryEvent,
    BinaryAck,
}

impl SocketPacketKind {
    fn from_digit(digit: char) -> Option<Self> {
        Some(match digit {
            '0' => Self::Connect,
            '1' => Self::Disconnect,
            '2' => Self::Event,
            '3' => Self::Ack,
            '4' => Self::ConnectError,
            '5' => Self::BinaryEvent,
            '6' => Self::BinaryAck,
            _ => return None,
        })
    }

    fn digit(self) -> char {
        match self {
            Self::Connect => '0',
            Self::Disconnect => '1',
            Self::Event => '2',
            Self::Ack => '3',
            Self::ConnectError => '4',
            Self::BinaryEvent => '5',
            Self::BinaryAck => '6',
        }
    }

    fn is_binary(self) -> bool {
        matches!(self, Self::BinaryEvent | Self::BinaryAck)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SocketPacket {
    pub kind: SocketPacketKind,
    pub namespace: String,
    pub ack_id: Option<u64>,
    pub data: Option<Value>,
}

impl SocketPacket {
    pub fn connect() -> Self {
        Self::bare(SocketPacketKind::Connect)
    }

    pub fn disconnect() -> Self {
        Self::bare(SocketPacketKind::Disconnect)
    }

    pub fn event(name: &str, payload: Value) -> Self {
        Self {
            kind: SocketPacketKind::Event,
            namespace: DEFAULT_NAMESPACE.to_string(),
            ack_id: None,
            data: Some(Value::Array(vec![Value::String(name.to_string()), payload])),
        }
    }

    fn bare(kind: SocketPacketKind) -> Self {
        Self {
            kind,
            namespace: DEFAULT_NAMESPACE.to_string(),
            ack_id: None,
            data: None,
        }
    }

    pub fn decode(payload: &str) -> Result<Self, FeedError> {
        let mut chars = payload.chars();
        let kind = chars
            .next()
            .and_then(SocketPacketKind::from_digit)
            .ok_or_else(|| FeedError::Protocol(format!("bad socket.io packet {payload:?}")))?;
        let mut rest = chars.as_str();

        if kind.is_binary() {
            let (_attachments, after) = rest
                .split_once('-')
                .ok_or_else(|| FeedError::Protocol("binary packet without attachment count".to_string()))?;
            rest = after;
        }

        let mut namespace = DEFAULT_NAMESPACE.to_string();
        if rest.starts_with('/') {
            match rest.split_once(',') {
                Some((ns, after)) => {
                    namespace = ns.to_string();
                    rest = after;
                }
                None => {
                    namespace = rest.to_string();
                    rest = "";
                }
            }
        }

        let digits = rest.chars().take_while(char::is_ascii_digit).count();
        let ack_id = if digits > 0 {
            let id = rest[..digits]
                .parse()
                .map_err(|_| FeedError::Protocol("ack id out of range".to_string()))?;
            rest = &rest[digits..];
            Some(id)
        } else {
            None
        };

        let data = if rest.is_empty() {
            None
        } else {
            Some(serde_json::from_str(rest)?)
        };

        Ok(Self {
            kind,
            namespace,
            ack_id,
            data,
        })
    }

    pub fn encode(&self) -> String {
        let mut out = String::new();
        out.push(self.kind.digit());
        if self.kind.is_binary() {
            out.push_str("0-");
        }
        if self.namespace != DEFAULT_NAMESPACE {
            out.push_str(&self.namespace);
            out.push(',');
        }
        if let Some(id) = self.ack_id {
            out.push_str(&id.to_string());
        }
        if let Some(data) = &self.data {
            out.push_str(&data.to_string());
        }
        out
    }

    /// Event name and first argument of an `EVENT` packet.
    pub fn event_parts(&self) -> Option<(&str, Option<&Value>)> {
        if self.kind != SocketPacketKind::Event {
            return None;
        }
        let args = self.data.as_ref()?.as_array()?;
        let name = args.first()?.as_str()?;
        Some((name, args.get(1)))
    }
}
