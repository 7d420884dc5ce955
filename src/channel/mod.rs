//! Live Update Channel
//!
//! Socket.IO push channel: the frame codec, the event catalogue, the
//! sans-IO connection state machine with its reconnect backoff, and (with
//! the `native` feature) an HTTP long-polling transport.

pub mod backoff;
pub mod connection;
pub mod event;
pub mod frame;

#[cfg(feature = "native")]
pub mod polling;

pub use backoff::{Backoff, ReconnectPolicy};
pub use connection::{Connection, ConnectionState, Effect};
pub use event::{
    Attachment, ClientEvent, Inbound, Lifecycle, ServerEvent, VitalSignsUpdate,
    CLIENT_DISCONNECT_REASON,
};
pub use frame::{EnginePacket, Handshake, SocketPacket};

#[cfg(feature = "native")]
pub use polling::{PushChannel, PushConfig};

use thiserror::Error;

/// Engine.IO protocol revision spoken by this client
pub const ENGINE_IO_VERSION: &str = "4";

/// Push-channel errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    #[error("Empty packet")]
    EmptyPacket,

    #[error("Unknown packet type: {0:?}")]
    UnknownPacketType(char),

    #[error("Binary packets are not supported")]
    BinaryUnsupported,

    #[error("Invalid handshake: {0}")]
    InvalidHandshake(String),

    #[error("Invalid packet: {0}")]
    InvalidPacket(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Channel closed")]
    Closed,
}

/// Result type for channel operations
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Socket.IO endpoint for a server URL and transport name
///
/// `http(s)://` becomes `ws(s)://` for the websocket transport.
pub fn socket_url(server: &str, transport: &str) -> String {
    let base = server.trim_end_matches('/');
    let base = if transport == "websocket" {
        base.replacen("https://", "wss://", 1)
            .replacen("http://", "ws://", 1)
    } else {
        base.to_string()
    };
    format!(
        "{}/socket.io/?EIO={}&transport={}",
        base, ENGINE_IO_VERSION, transport
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_url() {
        assert_eq!(
            socket_url("http://localhost:5001/", "polling"),
            "http://localhost:5001/socket.io/?EIO=4&transport=polling"
        );
        assert_eq!(
            socket_url("https://vitals.example", "websocket"),
            "wss://vitals.example/socket.io/?EIO=4&transport=websocket"
        );
    }

    #[test]
    fn test_error_display() {
        assert_eq!(ChannelError::UnknownPacketType('9').to_string(), "Unknown packet type: '9'");
    }
}
