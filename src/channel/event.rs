//! Push-channel message types
//!
//! Every inbound message, lifecycle or server event, decodes into
//! [`Inbound`] so that consumers have one dispatch point.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::alerts::AlertPayload;
use crate::notice::NoticeLevel;
use crate::vitals::VitalReading;

/// Disconnect reason of a locally initiated close
pub const CLIENT_DISCONNECT_REASON: &str = "io client disconnect";

/// Server-sent `error` message that ends the session
pub const AUTH_REQUIRED_MESSAGE: &str = "Authentication required";

/// Connect error message that ends the session
pub const AUTH_ERROR_MESSAGE: &str = "Authentication error";

/// Connection lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lifecycle {
    Connect,
    Disconnect { reason: String },
    ConnectError { message: String },
    ReconnectAttempt { attempt: u32 },
    Reconnect { attempt: u32 },
    ReconnectFailed,
}

impl Lifecycle {
    /// Whether the disconnect was requested by this client
    pub fn is_client_disconnect(&self) -> bool {
        matches!(self, Self::Disconnect { reason } if reason == CLIENT_DISCONNECT_REASON)
    }

    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::ConnectError { message } if message == AUTH_ERROR_MESSAGE)
    }
}

/// Payload of `vital_signs_update`
#[derive(Debug, Clone, PartialEq)]
pub enum VitalSignsUpdate {
    VitalSigns(VitalReading),
    EcgData(Vec<f64>),
    Alert(AlertPayload),
    Other { kind: String },
}

/// Events emitted by the server
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    BotResponse(String),
    ConversationCleared { message: Option<String> },
    ConnectionSuccess { message: Option<String> },
    Error { message: String },
    DeviceDataUpdate(VitalReading),
    VitalSignsUpdate(VitalSignsUpdate),
    ProfileUpdateNotification { message: String, level: NoticeLevel },
    SecurityAlert { message: String },
    SystemNotification { message: String, level: NoticeLevel },
    /// Any event name this client does not handle
    Unrecognized { name: String },
}

#[derive(Debug, Default, Deserialize)]
struct MessageBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

impl ServerEvent {
    /// Decode an event from its name and first argument
    ///
    /// Malformed payloads degrade to defaults rather than failing: a broken
    /// event must never take the channel down.
    pub fn decode(name: &str, args: Vec<Value>) -> Self {
        let payload = args.into_iter().next().unwrap_or(Value::Null);

        match name {
            "bot_response" => Self::BotResponse(text_of(payload)),
            "conversation_cleared" => Self::ConversationCleared {
                message: message_body(payload).message,
            },
            "connection_success" => Self::ConnectionSuccess {
                message: message_body(payload).message,
            },
            "error" => {
                let message = match payload {
                    Value::String(s) => s,
                    other => message_body(other)
                        .message
                        .unwrap_or_else(|| "Unknown error".to_string()),
                };
                Self::Error { message }
            }
            "device_data_update" => Self::DeviceDataUpdate(reading_of(payload)),
            "vital_signs_update" => Self::VitalSignsUpdate(vital_signs_of(payload)),
            "profile_update_notification" => {
                let body = message_body(payload);
                Self::ProfileUpdateNotification {
                    message: body.message.unwrap_or_default(),
                    level: NoticeLevel::from_wire(body.kind.as_deref()),
                }
            }
            "security_alert" => Self::SecurityAlert {
                message: message_body(payload).message.unwrap_or_default(),
            },
            "system_notification" => {
                let body = message_body(payload);
                Self::SystemNotification {
                    message: body.message.unwrap_or_default(),
                    level: NoticeLevel::from_wire(body.kind.as_deref()),
                }
            }
            other => {
                tracing::debug!(event = other, "Unrecognized push event");
                Self::Unrecognized {
                    name: other.to_string(),
                }
            }
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::BotResponse(_) => "bot_response",
            Self::ConversationCleared { .. } => "conversation_cleared",
            Self::ConnectionSuccess { .. } => "connection_success",
            Self::Error { .. } => "error",
            Self::DeviceDataUpdate(_) => "device_data_update",
            Self::VitalSignsUpdate(_) => "vital_signs_update",
            Self::ProfileUpdateNotification { .. } => "profile_update_notification",
            Self::SecurityAlert { .. } => "security_alert",
            Self::SystemNotification { .. } => "system_notification",
            Self::Unrecognized { name } => name,
        }
    }

    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Error { message } if message == AUTH_REQUIRED_MESSAGE)
    }
}

fn message_body(payload: Value) -> MessageBody {
    match payload {
        Value::String(message) => MessageBody {
            message: Some(message),
            kind: None,
        },
        other => serde_json::from_value(other).unwrap_or_default(),
    }
}

fn text_of(payload: Value) -> String {
    match payload {
        Value::String(s) => s,
        Value::Object(map) => map
            .get("response")
            .or_else(|| map.get("message"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn reading_of(payload: Value) -> VitalReading {
    VitalReading::from_json(payload).unwrap_or_else(|e| {
        tracing::warn!("Malformed reading in push event: {}", e);
        VitalReading::default()
    })
}

fn vital_signs_of(payload: Value) -> VitalSignsUpdate {
    let Value::Object(mut map) = payload else {
        return VitalSignsUpdate::Other {
            kind: String::new(),
        };
    };

    let kind = map
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let data = map.remove("data").unwrap_or(Value::Null);

    match kind.as_str() {
        "vital_signs" => VitalSignsUpdate::VitalSigns(reading_of(data)),
        "ecg_data" => VitalSignsUpdate::EcgData(samples_of(data)),
        "alert" => VitalSignsUpdate::Alert(serde_json::from_value(data).unwrap_or_default()),
        _ => VitalSignsUpdate::Other { kind },
    }
}

/// ECG samples from a bare array or `{values: [...]}` / `{ecg_data: [...]}`
fn samples_of(data: Value) -> Vec<f64> {
    let array = match data {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("values").or_else(|| map.remove("ecg_data")) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };
    array
        .iter()
        .filter_map(Value::as_f64)
        .filter(|v| v.is_finite())
        .collect()
}

/// Image attached to a chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    /// MIME type
    #[serde(rename = "type")]
    pub mime: String,
    /// Data URL
    pub data: String,
    pub size: u64,
}

/// Events sent by the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    UserInput {
        text: String,
        attachment: Option<Attachment>,
    },
    ClearConversation,
}

#[derive(Serialize)]
struct UserInputBody<'a> {
    text: &'a str,
    attachment: Option<&'a Attachment>,
}

impl ClientEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::UserInput { .. } => "user_input",
            Self::ClearConversation => "clear_conversation",
        }
    }

    /// Event arguments as sent on the wire
    pub fn args(&self) -> Vec<Value> {
        match self {
            Self::UserInput { text, attachment } => {
                let body = UserInputBody {
                    text,
                    attachment: attachment.as_ref(),
                };
                vec![serde_json::to_value(body).unwrap_or(Value::Null)]
            }
            Self::ClearConversation => Vec::new(),
        }
    }
}

/// Everything a consumer can receive from the channel
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Lifecycle(Lifecycle),
    Event(ServerEvent),
}

impl From<Lifecycle> for Inbound {
    fn from(lifecycle: Lifecycle) -> Self {
        Self::Lifecycle(lifecycle)
    }
}

impl From<ServerEvent> for Inbound {
    fn from(event: ServerEvent) -> Self {
        Self::Event(event)
    }
}
