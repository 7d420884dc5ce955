//! Assistant Chat
//!
//! Transcript and composer state for the chat page. Messages go out as
//! `user_input` events on the push channel; the reply arrives as
//! `bot_response`. The composer stays disabled while a reply is pending and
//! is released by the reply or by any connection failure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::channel::{Attachment, ClientEvent, Inbound, Lifecycle, ServerEvent};

pub const WELCOME_MESSAGE: &str = "Hello! I'm your VitalWatch health assistant. I'm here to help answer your health questions and provide general medical guidance. How can I assist you today?";
pub const DISCLAIMER: &str =
    "Please note: I provide general health information and should not replace professional medical advice.";
pub const UNREACHABLE_MESSAGE: &str = "Could not reach server, try again later";
pub const RECONNECTING_MESSAGE: &str = "Reconnecting to server...";
pub const RESTORED_MESSAGE: &str = "Connection restored";

/// Largest image accepted as an attachment
pub const MAX_ATTACHMENT_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    #[error("Message is empty")]
    EmptyMessage,

    #[error("Still waiting for a reply")]
    AwaitingReply,

    #[error("Please select an image file.")]
    NotAnImage(String),

    #[error("File size must be less than 5MB.")]
    TooLarge(u64),

    #[error("Cannot read attachment: {0}")]
    Unreadable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub speaker: Speaker,
    pub text: String,
    /// File name of an attached image
    pub attachment: Option<String>,
    pub at: DateTime<Utc>,
}

/// What the caller must do after a dispatched message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatSignal {
    Continue,
    /// The server rejected the session token
    EndSession,
}

/// Check an attachment against the image and size limits
pub fn validate_attachment(attachment: &Attachment) -> Result<(), ChatError> {
    if !attachment.mime.starts_with("image/") {
        return Err(ChatError::NotAnImage(attachment.mime.clone()));
    }
    if attachment.size > MAX_ATTACHMENT_BYTES {
        return Err(ChatError::TooLarge(attachment.size));
    }
    Ok(())
}

/// Chat page state
#[derive(Debug, Clone)]
pub struct ChatSession {
    transcript: Vec<ChatMessage>,
    input_enabled: bool,
    typing: bool,
    attachment: Option<Attachment>,
}

impl ChatSession {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            transcript: vec![welcome(now)],
            input_enabled: true,
            typing: false,
            attachment: None,
        }
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn input_enabled(&self) -> bool {
        self.input_enabled
    }

    /// Whether the typing indicator is shown
    pub fn is_typing(&self) -> bool {
        self.typing
    }

    pub fn attachment(&self) -> Option<&Attachment> {
        self.attachment.as_ref()
    }

    pub fn attach(&mut self, attachment: Attachment) -> Result<(), ChatError> {
        validate_attachment(&attachment)?;
        self.attachment = Some(attachment);
        Ok(())
    }

    pub fn detach(&mut self) {
        self.attachment = None;
    }

    /// Queue a message; returns the event to emit
    pub fn send(&mut self, text: &str, now: DateTime<Utc>) -> Result<ClientEvent, ChatError> {
        if !self.input_enabled {
            return Err(ChatError::AwaitingReply);
        }
        let text = text.trim();
        if text.is_empty() && self.attachment.is_none() {
            return Err(ChatError::EmptyMessage);
        }

        let attachment = self.attachment.take();
        self.transcript.push(ChatMessage {
            speaker: Speaker::User,
            text: text.to_string(),
            attachment: attachment.as_ref().map(|a| a.name.clone()),
            at: now,
        });
        self.input_enabled = false;
        self.typing = true;

        Ok(ClientEvent::UserInput {
            text: text.to_string(),
            attachment,
        })
    }

    /// Reset to the welcome message; returns the event to emit
    pub fn clear(&mut self, now: DateTime<Utc>) -> ClientEvent {
        self.transcript = vec![welcome(now)];
        ClientEvent::ClearConversation
    }

    /// Route one push-channel message
    pub fn dispatch(&mut self, message: Inbound, now: DateTime<Utc>) -> ChatSignal {
        match message {
            Inbound::Lifecycle(lifecycle) => self.on_lifecycle(lifecycle, now),
            Inbound::Event(event) => self.on_event(event, now),
        }
    }

    fn on_lifecycle(&mut self, lifecycle: Lifecycle, now: DateTime<Utc>) -> ChatSignal {
        if lifecycle.is_auth_failure() {
            return ChatSignal::EndSession;
        }

        match lifecycle {
            Lifecycle::Connect => {}
            Lifecycle::Disconnect { reason } => {
                tracing::warn!("Socket disconnected: {}", reason);
                self.typing = false;
                if reason != crate::channel::CLIENT_DISCONNECT_REASON {
                    self.fail(now);
                }
            }
            Lifecycle::ConnectError { message } => {
                tracing::warn!("Connection failed: {}", message);
                self.typing = false;
                self.fail(now);
            }
            Lifecycle::ReconnectAttempt { attempt } => {
                tracing::info!("Reconnection attempt {}", attempt);
                self.bot(RECONNECTING_MESSAGE, now);
            }
            Lifecycle::Reconnect { attempt } => {
                tracing::info!("Reconnected after {} attempts", attempt);
                self.bot(RESTORED_MESSAGE, now);
            }
            Lifecycle::ReconnectFailed => {
                self.bot(UNREACHABLE_MESSAGE, now);
            }
        }
        ChatSignal::Continue
    }

    fn on_event(&mut self, event: ServerEvent, now: DateTime<Utc>) -> ChatSignal {
        if event.is_auth_failure() {
            return ChatSignal::EndSession;
        }

        match event {
            ServerEvent::BotResponse(text) => {
                self.typing = false;
                self.bot(text, now);
                self.input_enabled = true;
            }
            ServerEvent::Error { message } => {
                tracing::warn!("Socket error: {}", message);
                self.typing = false;
                self.fail(now);
            }
            ServerEvent::ConversationCleared { message } | ServerEvent::ConnectionSuccess { message } => {
                tracing::debug!(message = ?message, "Chat server acknowledgement");
            }
            other => {
                tracing::debug!(event = other.name(), "Event not handled by chat");
            }
        }
        ChatSignal::Continue
    }

    fn fail(&mut self, now: DateTime<Utc>) {
        self.bot(UNREACHABLE_MESSAGE, now);
        self.input_enabled = true;
    }

    fn bot(&mut self, text: impl Into<String>, now: DateTime<Utc>) {
        self.transcript.push(ChatMessage {
            speaker: Speaker::Bot,
            text: text.into(),
            attachment: None,
            at: now,
        });
    }
}

fn welcome(now: DateTime<Utc>) -> ChatMessage {
    ChatMessage {
        speaker: Speaker::Bot,
        text: WELCOME_MESSAGE.to_string(),
        attachment: None,
        at: now,
    }
}

/// Load an image from disk as a data-URL attachment
#[cfg(feature = "native")]
pub fn attachment_from_file(path: &std::path::Path) -> Result<Attachment, ChatError> {
    use base64::Engine;

    let mime = match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    };

    let size = std::fs::metadata(path)
        .map_err(|e| ChatError::Unreadable(e.to_string()))?
        .len();
    let probe = Attachment {
        name: String::new(),
        mime: mime.to_string(),
        data: String::new(),
        size,
    };
    validate_attachment(&probe)?;

    let bytes = std::fs::read(path).map_err(|e| ChatError::Unreadable(e.to_string()))?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);

    Ok(Attachment {
        name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        data: format!("data:{};base64,{}", mime, encoded),
        ..probe
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(size: u64) -> Attachment {
        Attachment {
            name: "rash.png".into(),
            mime: "image/png".into(),
            data: "data:image/png;base64,AAAA".into(),
            size,
        }
    }

    #[test]
    fn test_new_session_has_welcome() {
        let chat = ChatSession::new(Utc::now());
        assert_eq!(chat.transcript().len(), 1);
        assert_eq!(chat.transcript()[0].speaker, Speaker::Bot);
        assert!(chat.input_enabled());
    }

    #[test]
    fn test_empty_message_rejected() {
        let mut chat = ChatSession::new(Utc::now());
        assert_eq!(chat.send("   ", Utc::now()), Err(ChatError::EmptyMessage));
        assert!(chat.input_enabled());
    }

    #[test]
    fn test_send_disables_until_reply() {
        let mut chat = ChatSession::new(Utc::now());
        let event = chat.send(" What is a normal resting heart rate? ", Utc::now()).unwrap();
        assert_eq!(
            event,
            ClientEvent::UserInput {
                text: "What is a normal resting heart rate?".into(),
                attachment: None
            }
        );
        assert!(!chat.input_enabled());
        assert!(chat.is_typing());
        assert_eq!(chat.send("again", Utc::now()), Err(ChatError::AwaitingReply));

        chat.dispatch(
            ServerEvent::BotResponse("Usually 60 to 100 bpm.".into()).into(),
            Utc::now(),
        );
        assert!(chat.input_enabled());
        assert!(!chat.is_typing());
        assert_eq!(chat.transcript().last().unwrap().text, "Usually 60 to 100 bpm.");
    }

    #[test]
    fn test_attachment_only_message() {
        let mut chat = ChatSession::new(Utc::now());
        chat.attach(image(1024)).unwrap();
        let event = chat.send("", Utc::now()).unwrap();
        assert!(matches!(event, ClientEvent::UserInput { attachment: Some(_), .. }));
        assert!(chat.attachment().is_none());
        assert_eq!(chat.transcript().last().unwrap().attachment.as_deref(), Some("rash.png"));
    }

    #[test]
    fn test_attachment_limits() {
        let mut chat = ChatSession::new(Utc::now());
        assert_eq!(
            chat.attach(image(MAX_ATTACHMENT_BYTES + 1)),
            Err(ChatError::TooLarge(MAX_ATTACHMENT_BYTES + 1))
        );
        let pdf = Attachment {
            mime: "application/pdf".into(),
            ..image(10)
        };
        assert!(matches!(chat.attach(pdf), Err(ChatError::NotAnImage(_))));
        assert!(chat.attachment().is_none());
    }

    #[test]
    fn test_failures_release_input() {
        for failure in [
            Inbound::Event(ServerEvent::Error {
                message: "Rate limited".into(),
            }),
            Inbound::Lifecycle(Lifecycle::ConnectError {
                message: "xhr poll error".into(),
            }),
            Inbound::Lifecycle(Lifecycle::Disconnect {
                reason: "transport close".into(),
            }),
        ] {
            let mut chat = ChatSession::new(Utc::now());
            chat.send("hello", Utc::now()).unwrap();
            assert_eq!(chat.dispatch(failure, Utc::now()), ChatSignal::Continue);
            assert!(chat.input_enabled());
            assert_eq!(chat.transcript().last().unwrap().text, UNREACHABLE_MESSAGE);
        }
    }

    #[test]
    fn test_client_disconnect_is_quiet() {
        let mut chat = ChatSession::new(Utc::now());
        chat.dispatch(
            Lifecycle::Disconnect {
                reason: "io client disconnect".into(),
            }
            .into(),
            Utc::now(),
        );
        assert_eq!(chat.transcript().len(), 1);
    }

    #[test]
    fn test_reconnect_messages() {
        let mut chat = ChatSession::new(Utc::now());
        chat.dispatch(Lifecycle::ReconnectAttempt { attempt: 1 }.into(), Utc::now());
        chat.dispatch(Lifecycle::Reconnect { attempt: 1 }.into(), Utc::now());
        let texts: Vec<&str> = chat.transcript()[1..].iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec![RECONNECTING_MESSAGE, RESTORED_MESSAGE]);
    }

    #[test]
    fn test_auth_failure_ends_session() {
        let mut chat = ChatSession::new(Utc::now());
        let signal = chat.dispatch(
            ServerEvent::Error {
                message: "Authentication required".into(),
            }
            .into(),
            Utc::now(),
        );
        assert_eq!(signal, ChatSignal::EndSession);
    }

    #[test]
    fn test_clear_resets_transcript() {
        let mut chat = ChatSession::new(Utc::now());
        chat.send("hi", Utc::now()).unwrap();
        assert_eq!(chat.clear(Utc::now()), ClientEvent::ClearConversation);
        assert_eq!(chat.transcript().len(), 1);
        assert_eq!(chat.transcript()[0].text, WELCOME_MESSAGE);
    }

    #[cfg(feature = "native")]
    #[test]
    fn test_attachment_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.PNG");
        std::fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();

        let attachment = attachment_from_file(&path).unwrap();
        assert_eq!(attachment.mime, "image/png");
        assert_eq!(attachment.size, 4);
        assert_eq!(attachment.data, "data:image/png;base64,iVBORw==");

        let text = dir.path().join("notes.txt");
        std::fs::write(&text, "hi").unwrap();
        assert!(matches!(attachment_from_file(&text), Err(ChatError::NotAnImage(_))));
    }
}
