//! Connection state machine
//!
//! Sans-IO Socket.IO client. A transport feeds it packets and transport
//! failures; it answers with [`Effect`]s: packets to send, messages for
//! consumers, and when to reconnect or stop.

use std::collections::VecDeque;
use std::time::Duration;

use super::backoff::{Backoff, ReconnectPolicy};
use super::event::{ClientEvent, Inbound, Lifecycle, ServerEvent, CLIENT_DISCONNECT_REASON};
use super::frame::{connect_error_message, split_event, EnginePacket, Handshake, SocketPacket};

/// Disconnect reason when the server closes the namespace
pub const SERVER_DISCONNECT_REASON: &str = "io server disconnect";

/// Disconnect reason when the transport drops
pub const TRANSPORT_CLOSE_REASON: &str = "transport close";

/// Visible connection status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Connecting,
    Connected,
    Disconnected,
    Error,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Error => "error",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Connecting => "Connecting...",
            Self::Connected => "Connected",
            Self::Disconnected => "Disconnected",
            Self::Error => "Connection Error",
        }
    }
}

/// What the transport must do next
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Send(EnginePacket),
    Emit(Inbound),
    /// Open a new transport after `delay`
    Reconnect { attempt: u32, delay: Duration },
    /// Tear the transport down for good
    Close,
}

/// Socket.IO client connection
#[derive(Debug)]
pub struct Connection {
    token: String,
    state: ConnectionState,
    handshake: Option<Handshake>,
    backoff: Backoff,
    outbox: VecDeque<ClientEvent>,
    closed: bool,
}

impl Connection {
    pub fn new(token: impl Into<String>, policy: ReconnectPolicy) -> Self {
        Self {
            token: token.into(),
            state: ConnectionState::Connecting,
            handshake: None,
            backoff: Backoff::new(policy),
            outbox: VecDeque::new(),
            closed: false,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// True once closed locally, by the server, or after reconnects ran out
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn handshake(&self) -> Option<&Handshake> {
        self.handshake.as_ref()
    }

    /// Engine.IO session id of the current transport
    pub fn sid(&self) -> Option<&str> {
        self.handshake.as_ref().map(|h| h.sid.as_str())
    }

    /// Handle one packet from the server
    pub fn on_packet(&mut self, packet: EnginePacket) -> Vec<Effect> {
        if self.closed {
            return Vec::new();
        }

        match packet {
            EnginePacket::Open(handshake) => {
                tracing::debug!(sid = %handshake.sid, "Engine.IO open");
                self.handshake = Some(handshake);
                vec![Effect::Send(
                    SocketPacket::connect_with_token(&self.token).into_engine(),
                )]
            }
            EnginePacket::Ping(data) => vec![Effect::Send(EnginePacket::Pong(data))],
            EnginePacket::Close => self.on_transport_lost(TRANSPORT_CLOSE_REASON),
            EnginePacket::Message(raw) => match SocketPacket::decode(&raw) {
                Ok(packet) => self.on_socket_packet(packet),
                Err(e) => {
                    tracing::warn!("Dropping malformed packet: {}", e);
                    Vec::new()
                }
            },
            EnginePacket::Pong(_) | EnginePacket::Upgrade | EnginePacket::Noop => Vec::new(),
        }
    }

    fn on_socket_packet(&mut self, packet: SocketPacket) -> Vec<Effect> {
        match packet {
            SocketPacket::Connect { .. } => {
                let mut effects = Vec::new();
                let reconnected = self.backoff.attempts();
                self.state = ConnectionState::Connected;
                self.backoff.reset();

                if reconnected > 0 {
                    effects.push(Effect::Emit(Lifecycle::Reconnect { attempt: reconnected }.into()));
                }
                effects.push(Effect::Emit(Lifecycle::Connect.into()));

                while let Some(event) = self.outbox.pop_front() {
                    effects.push(Effect::Send(event_packet(&event)));
                }
                tracing::info!("Push channel connected");
                effects
            }
            SocketPacket::ConnectError { data, .. } => {
                let message = connect_error_message(&data);
                tracing::warn!("Push channel connect error: {}", message);
                self.state = ConnectionState::Error;
                self.closed = true;
                vec![
                    Effect::Emit(Lifecycle::ConnectError { message }.into()),
                    Effect::Close,
                ]
            }
            SocketPacket::Disconnect { .. } => {
                self.state = ConnectionState::Disconnected;
                self.closed = true;
                vec![
                    Effect::Emit(
                        Lifecycle::Disconnect {
                            reason: SERVER_DISCONNECT_REASON.to_string(),
                        }
                        .into(),
                    ),
                    Effect::Close,
                ]
            }
            SocketPacket::Event { data, .. } => match split_event(data) {
                Ok((name, args)) => {
                    tracing::debug!(event = %name, "Push event");
                    vec![Effect::Emit(ServerEvent::decode(&name, args).into())]
                }
                Err(e) => {
                    tracing::warn!("Dropping malformed event: {}", e);
                    Vec::new()
                }
            },
            SocketPacket::Ack { .. } => Vec::new(),
        }
    }

    /// The transport failed or dropped
    ///
    /// A live connection reports `disconnect`; a failed attempt reports
    /// `connect_error`. Either way a reconnect is scheduled while attempts
    /// remain.
    pub fn on_transport_lost(&mut self, reason: &str) -> Vec<Effect> {
        if self.closed {
            return Vec::new();
        }

        let mut effects = Vec::new();
        match self.state {
            ConnectionState::Connected => {
                tracing::warn!("Push channel disconnected: {}", reason);
                effects.push(Effect::Emit(
                    Lifecycle::Disconnect {
                        reason: reason.to_string(),
                    }
                    .into(),
                ));
            }
            _ if self.backoff.attempts() == 0 => {
                tracing::warn!("Push channel connect failed: {}", reason);
                effects.push(Effect::Emit(
                    Lifecycle::ConnectError {
                        message: reason.to_string(),
                    }
                    .into(),
                ));
            }
            _ => {
                tracing::debug!("Reconnect attempt {} failed: {}", self.backoff.attempts(), reason);
            }
        }

        self.state = ConnectionState::Disconnected;
        self.handshake = None;
        effects.extend(self.schedule_reconnect());
        effects
    }

    fn schedule_reconnect(&mut self) -> Vec<Effect> {
        match self.backoff.next_attempt() {
            Some((attempt, delay)) => {
                tracing::info!(attempt, delay_ms = delay.as_millis() as u64, "Scheduling reconnect");
                self.state = ConnectionState::Connecting;
                vec![
                    Effect::Emit(Lifecycle::ReconnectAttempt { attempt }.into()),
                    Effect::Reconnect { attempt, delay },
                ]
            }
            None => {
                tracing::warn!("Push channel gave up reconnecting");
                self.state = ConnectionState::Error;
                self.closed = true;
                vec![Effect::Emit(Lifecycle::ReconnectFailed.into()), Effect::Close]
            }
        }
    }

    /// Send an event, or queue it until connected
    pub fn emit(&mut self, event: ClientEvent) -> Vec<Effect> {
        if self.closed {
            tracing::warn!(event = event.name(), "Dropping event on closed channel");
            return Vec::new();
        }
        if self.is_connected() {
            vec![Effect::Send(event_packet(&event))]
        } else {
            self.outbox.push_back(event);
            Vec::new()
        }
    }

    /// Close from this side
    pub fn close(&mut self) -> Vec<Effect> {
        if self.closed {
            return Vec::new();
        }

        let mut effects = Vec::new();
        if self.is_connected() {
            effects.push(Effect::Send(SocketPacket::disconnect().into_engine()));
        }
        self.state = ConnectionState::Disconnected;
        self.closed = true;
        self.outbox.clear();
        effects.push(Effect::Emit(
            Lifecycle::Disconnect {
                reason: CLIENT_DISCONNECT_REASON.to_string(),
            }
            .into(),
        ));
        effects.push(Effect::Close);
        effects
    }
}

fn event_packet(event: &ClientEvent) -> EnginePacket {
    SocketPacket::event(event.name(), event.args()).into_engine()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open() -> EnginePacket {
        EnginePacket::decode(r#"0{"sid":"abc","upgrades":[],"pingInterval":25000,"pingTimeout":20000}"#)
            .unwrap()
    }

    fn connected() -> Connection {
        let mut conn = Connection::new("tok", ReconnectPolicy::default());
        conn.on_packet(open());
        conn.on_packet(EnginePacket::Message(r#"0{"sid":"xyz"}"#.into()));
        conn
    }

    fn emitted(effects: &[Effect]) -> Vec<Inbound> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Emit(inbound) => Some(inbound.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_handshake_sends_auth() {
        let mut conn = Connection::new("tok", ReconnectPolicy::default());
        let effects = conn.on_packet(open());
        assert_eq!(
            effects,
            vec![Effect::Send(EnginePacket::Message(r#"0{"token":"tok"}"#.into()))]
        );
        assert_eq!(conn.sid(), Some("abc"));
        assert_eq!(conn.state(), ConnectionState::Connecting);
    }

    #[test]
    fn test_connect_flushes_outbox() {
        let mut conn = Connection::new("tok", ReconnectPolicy::default());
        assert!(conn.emit(ClientEvent::ClearConversation).is_empty());
        conn.on_packet(open());
        let effects = conn.on_packet(EnginePacket::Message("0".into()));
        assert_eq!(conn.state(), ConnectionState::Connected);
        assert_eq!(emitted(&effects), vec![Inbound::Lifecycle(Lifecycle::Connect)]);
        assert!(effects.contains(&Effect::Send(EnginePacket::Message(
            r#"2["clear_conversation"]"#.into()
        ))));
    }

    #[test]
    fn test_ping_answered() {
        let mut conn = connected();
        assert_eq!(
            conn.on_packet(EnginePacket::Ping(String::new())),
            vec![Effect::Send(EnginePacket::Pong(String::new()))]
        );
    }

    #[test]
    fn test_event_dispatch() {
        let mut conn = connected();
        let effects = conn.on_packet(EnginePacket::Message(r#"2["bot_response","hi"]"#.into()));
        assert_eq!(
            emitted(&effects),
            vec![Inbound::Event(ServerEvent::BotResponse("hi".into()))]
        );
    }

    #[test]
    fn test_connect_error_does_not_reconnect() {
        let mut conn = Connection::new("bad", ReconnectPolicy::default());
        conn.on_packet(open());
        let effects = conn.on_packet(EnginePacket::Message(r#"4{"message":"Authentication error"}"#.into()));
        assert_eq!(conn.state(), ConnectionState::Error);
        assert!(conn.is_closed());
        assert_eq!(effects.last(), Some(&Effect::Close));
        assert!(!effects.iter().any(|e| matches!(e, Effect::Reconnect { .. })));
    }

    #[test]
    fn test_server_disconnect_does_not_reconnect() {
        let mut conn = connected();
        let effects = conn.on_packet(EnginePacket::Message("1".into()));
        assert_eq!(conn.state(), ConnectionState::Disconnected);
        assert_eq!(
            emitted(&effects),
            vec![Inbound::Lifecycle(Lifecycle::Disconnect {
                reason: SERVER_DISCONNECT_REASON.into()
            })]
        );
        assert!(conn.on_transport_lost("transport close").is_empty());
    }

    #[test]
    fn test_transport_loss_reconnects_then_gives_up() {
        let mut conn = connected();
        let effects = conn.on_transport_lost("transport close");
        assert_eq!(
            effects,
            vec![
                Effect::Emit(Lifecycle::Disconnect { reason: "transport close".into() }.into()),
                Effect::Emit(Lifecycle::ReconnectAttempt { attempt: 1 }.into()),
                Effect::Reconnect { attempt: 1, delay: Duration::from_secs(1) },
            ]
        );

        for expected in 2..=5 {
            let effects = conn.on_transport_lost("xhr poll error");
            assert!(effects.contains(&Effect::Reconnect {
                attempt: expected,
                delay: Duration::from_secs(1 << (expected - 1)),
            }));
        }

        let effects = conn.on_transport_lost("xhr poll error");
        assert_eq!(
            effects,
            vec![Effect::Emit(Lifecycle::ReconnectFailed.into()), Effect::Close]
        );
        assert_eq!(conn.state(), ConnectionState::Error);
    }

    #[test]
    fn test_reconnect_emits_reconnect_event() {
        let mut conn = connected();
        conn.on_transport_lost("transport close");
        conn.on_transport_lost("xhr poll error");
        conn.on_packet(open());
        let effects = conn.on_packet(EnginePacket::Message("0".into()));
        assert_eq!(
            emitted(&effects),
            vec![
                Inbound::Lifecycle(Lifecycle::Reconnect { attempt: 2 }),
                Inbound::Lifecycle(Lifecycle::Connect),
            ]
        );
    }

    #[test]
    fn test_initial_failure_is_connect_error() {
        let mut conn = Connection::new("tok", ReconnectPolicy::default());
        let effects = conn.on_transport_lost("connection refused");
        assert_eq!(
            emitted(&effects)[0],
            Inbound::Lifecycle(Lifecycle::ConnectError {
                message: "connection refused".into()
            })
        );
    }

    #[test]
    fn test_local_close() {
        let mut conn = connected();
        let effects = conn.close();
        assert_eq!(effects[0], Effect::Send(EnginePacket::Message("1".into())));
        assert_eq!(
            emitted(&effects),
            vec![Inbound::Lifecycle(Lifecycle::Disconnect {
                reason: CLIENT_DISCONNECT_REASON.into()
            })]
        );
        assert!(conn.close().is_empty());
    }
}
