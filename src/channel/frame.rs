//! Engine.IO v4 / Socket.IO v5 frame codec
//!
//! Pure string codec for the subset of the protocol a client needs. Text
//! packets only; binary attachments are rejected.
//!
//! Engine.IO packet: `<type digit><data>`. Long-polling payloads join
//! packets with the record separator `0x1E`.
//!
//! Socket.IO packet (inside an Engine.IO `message`):
//! `<type>[<namespace>,][<ack id>][<json>]`

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ChannelError, ChannelResult};

/// Separator between packets of a polling payload
pub const RECORD_SEPARATOR: char = '\u{1e}';

/// Default namespace
pub const ROOT_NAMESPACE: &str = "/";

/// Engine.IO `open` packet body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    pub sid: String,
    #[serde(default)]
    pub upgrades: Vec<String>,
    /// Milliseconds between server pings
    #[serde(default = "default_ping_interval")]
    pub ping_interval: u64,
    /// Milliseconds the server waits for a pong
    #[serde(default = "default_ping_timeout")]
    pub ping_timeout: u64,
    #[serde(default = "default_max_payload")]
    pub max_payload: u64,
}

fn default_ping_interval() -> u64 {
    25_000
}

fn default_ping_timeout() -> u64 {
    20_000
}

fn default_max_payload() -> u64 {
    1_000_000
}

/// Engine.IO packet
#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    Open(Handshake),
    Close,
    Ping(String),
    Pong(String),
    Message(String),
    Upgrade,
    Noop,
}

impl EnginePacket {
    pub fn decode(raw: &str) -> ChannelResult<Self> {
        let mut chars = raw.chars();
        let kind = chars.next().ok_or(ChannelError::EmptyPacket)?;
        let body = chars.as_str();

        match kind {
            '0' => {
                let handshake = serde_json::from_str(body)
                    .map_err(|e| ChannelError::InvalidHandshake(e.to_string()))?;
                Ok(Self::Open(handshake))
            }
            '1' => Ok(Self::Close),
            '2' => Ok(Self::Ping(body.to_string())),
            '3' => Ok(Self::Pong(body.to_string())),
            '4' => Ok(Self::Message(body.to_string())),
            '5' => Ok(Self::Upgrade),
            '6' => Ok(Self::Noop),
            'b' => Err(ChannelError::BinaryUnsupported),
            other => Err(ChannelError::UnknownPacketType(other)),
        }
    }

    pub fn encode(&self) -> String {
        match self {
            Self::Open(handshake) => {
                // Handshake always serializes
                format!("0{}", serde_json::to_string(handshake).unwrap_or_default())
            }
            Self::Close => "1".to_string(),
            Self::Ping(data) => format!("2{}", data),
            Self::Pong(data) => format!("3{}", data),
            Self::Message(data) => format!("4{}", data),
            Self::Upgrade => "5".to_string(),
            Self::Noop => "6".to_string(),
        }
    }
}

/// Split a long-polling payload into packets
pub fn decode_payload(payload: &str) -> ChannelResult<Vec<EnginePacket>> {
    payload
        .split(RECORD_SEPARATOR)
        .filter(|p| !p.is_empty())
        .map(EnginePacket::decode)
        .collect()
}

/// Join packets into one long-polling payload
pub fn encode_payload(packets: &[EnginePacket]) -> String {
    packets
        .iter()
        .map(EnginePacket::encode)
        .collect::<Vec<_>>()
        .join(&RECORD_SEPARATOR.to_string())
}

/// Socket.IO packet
#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect {
        namespace: String,
        data: Option<Value>,
    },
    Disconnect {
        namespace: String,
    },
    Event {
        namespace: String,
        id: Option<u64>,
        data: Value,
    },
    Ack {
        namespace: String,
        id: u64,
        data: Value,
    },
    ConnectError {
        namespace: String,
        data: Value,
    },
}

impl SocketPacket {
    /// CONNECT to the root namespace with an auth token
    pub fn connect_with_token(token: &str) -> Self {
        Self::Connect {
            namespace: ROOT_NAMESPACE.to_string(),
            data: Some(serde_json::json!({ "token": token })),
        }
    }

    pub fn disconnect() -> Self {
        Self::Disconnect {
            namespace: ROOT_NAMESPACE.to_string(),
        }
    }

    /// EVENT on the root namespace: `["name", ...args]`
    pub fn event(name: &str, args: Vec<Value>) -> Self {
        let mut items = Vec::with_capacity(args.len() + 1);
        items.push(Value::String(name.to_string()));
        items.extend(args);
        Self::Event {
            namespace: ROOT_NAMESPACE.to_string(),
            id: None,
            data: Value::Array(items),
        }
    }

    fn type_digit(&self) -> char {
        match self {
            Self::Connect { .. } => '0',
            Self::Disconnect { .. } => '1',
            Self::Event { .. } => '2',
            Self::Ack { .. } => '3',
            Self::ConnectError { .. } => '4',
        }
    }

    fn namespace(&self) -> &str {
        match self {
            Self::Connect { namespace, .. }
            | Self::Disconnect { namespace }
            | Self::Event { namespace, .. }
            | Self::Ack { namespace, .. }
            | Self::ConnectError { namespace, .. } => namespace,
        }
    }

    pub fn encode(&self) -> String {
        let mut out = String::new();
        out.push(self.type_digit());

        let namespace = self.namespace();
        if namespace != ROOT_NAMESPACE {
            out.push_str(namespace);
            out.push(',');
        }

        let (id, data) = match self {
            Self::Connect { data, .. } => (None, data.as_ref()),
            Self::Disconnect { .. } => (None, None),
            Self::Event { id, data, .. } => (*id, Some(data)),
            Self::Ack { id, data, .. } => (Some(*id), Some(data)),
            Self::ConnectError { data, .. } => (None, Some(data)),
        };

        if let Some(id) = id {
            out.push_str(&id.to_string());
        }
        if let Some(data) = data {
            out.push_str(&data.to_string());
        }
        out
    }

    pub fn decode(raw: &str) -> ChannelResult<Self> {
        let mut chars = raw.chars();
        let kind = chars.next().ok_or(ChannelError::EmptyPacket)?;
        let mut rest = chars.as_str();

        if matches!(kind, '5' | '6') {
            return Err(ChannelError::BinaryUnsupported);
        }

        let namespace = if rest.starts_with('/') {
            match rest.find(',') {
                Some(end) => {
                    let ns = &rest[..end];
                    rest = &rest[end + 1..];
                    ns.to_string()
                }
                None => {
                    let ns = rest.to_string();
                    rest = "";
                    ns
                }
            }
        } else {
            ROOT_NAMESPACE.to_string()
        };

        let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
        let id = if digits > 0 {
            let parsed = rest[..digits]
                .parse::<u64>()
                .map_err(|e| ChannelError::InvalidPacket(e.to_string()))?;
            rest = &rest[digits..];
            Some(parsed)
        } else {
            None
        };

        let data = if rest.is_empty() {
            None
        } else {
            Some(
                serde_json::from_str::<Value>(rest)
                    .map_err(|e| ChannelError::InvalidPacket(e.to_string()))?,
            )
        };

        match kind {
            '0' => Ok(Self::Connect { namespace, data }),
            '1' => Ok(Self::Disconnect { namespace }),
            '2' => match data {
                Some(data @ Value::Array(_)) => Ok(Self::Event { namespace, id, data }),
                _ => Err(ChannelError::InvalidPacket(
                    "event payload must be an array".to_string(),
                )),
            },
            '3' => Ok(Self::Ack {
                namespace,
                id: id.ok_or_else(|| ChannelError::InvalidPacket("ack without id".to_string()))?,
                data: data.unwrap_or(Value::Array(Vec::new())),
            }),
            '4' => Ok(Self::ConnectError {
                namespace,
                data: data.unwrap_or(Value::Null),
            }),
            other => Err(ChannelError::UnknownPacketType(other)),
        }
    }

    /// Wrap into an Engine.IO `message`
    pub fn into_engine(self) -> EnginePacket {
        EnginePacket::Message(self.encode())
    }
}

/// Split EVENT data into its name and arguments
pub fn split_event(data: Value) -> ChannelResult<(String, Vec<Value>)> {
    let Value::Array(mut items) = data else {
        return Err(ChannelError::InvalidPacket("event payload must be an array".to_string()));
    };
    if items.is_empty() {
        return Err(ChannelError::InvalidPacket("event without a name".to_string()));
    }
    match items.remove(0) {
        Value::String(name) => Ok((name, items)),
        _ => Err(ChannelError::InvalidPacket("event name must be a string".to_string())),
    }
}

/// Message of a CONNECT_ERROR payload (`{"message": ...}` or a bare string)
pub fn connect_error_message(data: &Value) -> String {
    match data {
        Value::String(s) => s.clone(),
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Connection refused")
            .to_string(),
        _ => "Connection refused".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_open_handshake() {
        let raw = r#"0{"sid":"lv_VI97HAXpY6yYWAAAC","upgrades":["websocket"],"pingInterval":25000,"pingTimeout":5000,"maxPayload":1000000}"#;
        match EnginePacket::decode(raw).unwrap() {
            EnginePacket::Open(h) => {
                assert_eq!(h.sid, "lv_VI97HAXpY6yYWAAAC");
                assert_eq!(h.upgrades, vec!["websocket"]);
                assert_eq!(h.ping_timeout, 5000);
            }
            other => panic!("Expected Open, got {:?}", other),
        }
    }

    #[test]
    fn test_ping_pong() {
        assert_eq!(EnginePacket::decode("2").unwrap(), EnginePacket::Ping(String::new()));
        assert_eq!(EnginePacket::Pong(String::new()).encode(), "3");
        assert_eq!(EnginePacket::Pong("probe".into()).encode(), "3probe");
    }

    #[test]
    fn test_multi_packet_payload() {
        let payload = "2\u{1e}42[\"bot_response\",\"hi\"]\u{1e}6";
        let packets = decode_payload(payload).unwrap();
        assert_eq!(packets.len(), 3);
        assert_eq!(packets[1], EnginePacket::Message("2[\"bot_response\",\"hi\"]".into()));

        let joined = encode_payload(&[EnginePacket::Pong(String::new()), EnginePacket::Noop]);
        assert_eq!(joined, "3\u{1e}6");
    }

    #[test]
    fn test_binary_rejected() {
        assert!(matches!(EnginePacket::decode("bAQID"), Err(ChannelError::BinaryUnsupported)));
        assert!(matches!(
            SocketPacket::decode("51-[\"x\",{\"_placeholder\":true,\"num\":0}]"),
            Err(ChannelError::BinaryUnsupported)
        ));
    }

    #[test]
    fn test_connect_with_token() {
        let encoded = SocketPacket::connect_with_token("abc").encode();
        assert_eq!(encoded, r#"0{"token":"abc"}"#);
        assert_eq!(SocketPacket::connect_with_token("abc").into_engine().encode(), r#"40{"token":"abc"}"#);
    }

    #[test]
    fn test_event_roundtrip_and_split() {
        let packet = SocketPacket::decode(r#"2["device_data_update",{"device_id":"ESP32-001"}]"#).unwrap();
        let SocketPacket::Event { namespace, id, data } = packet else {
            panic!("Expected Event");
        };
        assert_eq!(namespace, "/");
        assert_eq!(id, None);
        let (name, args) = split_event(data).unwrap();
        assert_eq!(name, "device_data_update");
        assert_eq!(args[0]["device_id"], "ESP32-001");

        let outbound = SocketPacket::event("clear_conversation", vec![]);
        assert_eq!(outbound.encode(), r#"2["clear_conversation"]"#);
    }

    #[test]
    fn test_namespace_and_ack_id() {
        let packet = SocketPacket::decode(r#"2/admin,13["ping"]"#).unwrap();
        assert_eq!(
            packet,
            SocketPacket::Event {
                namespace: "/admin".into(),
                id: Some(13),
                data: json!(["ping"]),
            }
        );
        assert_eq!(packet.encode(), r#"2/admin,13["ping"]"#);
    }

    #[test]
    fn test_connect_error() {
        let packet = SocketPacket::decode(r#"4{"message":"Authentication error"}"#).unwrap();
        let SocketPacket::ConnectError { data, .. } = packet else {
            panic!("Expected ConnectError");
        };
        assert_eq!(connect_error_message(&data), "Authentication error");
        assert_eq!(connect_error_message(&json!("nope")), "nope");
    }

    #[test]
    fn test_server_disconnect() {
        assert_eq!(
            SocketPacket::decode("1").unwrap(),
            SocketPacket::Disconnect { namespace: "/".into() }
        );
    }

    #[test]
    fn test_garbage() {
        assert!(EnginePacket::decode("").is_err());
        assert!(matches!(EnginePacket::decode("9"), Err(ChannelError::UnknownPacketType('9'))));
        assert!(SocketPacket::decode("2{not json").is_err());
    }
}
