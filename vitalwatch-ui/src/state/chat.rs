//! Chat binding

use chrono::Utc;
use leptos::*;
use std::cell::RefCell;
use std::rc::Rc;

use vitalwatch::channel::Attachment;
use vitalwatch::chat::{ChatError, ChatMessage, ChatSession, ChatSignal};
use vitalwatch::Inbound;

use super::global::GlobalState;
use super::websocket::PushClient;

/// The session's chat, mirrored into signals after every change
#[derive(Clone)]
pub struct ChatController {
    chat: Rc<RefCell<ChatSession>>,
    pub transcript: RwSignal<Vec<ChatMessage>>,
    pub typing: RwSignal<bool>,
    pub input_enabled: RwSignal<bool>,
    pub attachment: RwSignal<Option<Attachment>>,
    state: GlobalState,
}

impl ChatController {
    pub fn new(state: GlobalState) -> Self {
        let chat = ChatSession::new(Utc::now());
        Self {
            transcript: create_rw_signal(chat.transcript().to_vec()),
            typing: create_rw_signal(chat.is_typing()),
            input_enabled: create_rw_signal(chat.input_enabled()),
            attachment: create_rw_signal(None),
            chat: Rc::new(RefCell::new(chat)),
            state,
        }
    }

    fn sync(&self) {
        let chat = self.chat.borrow();
        self.transcript.set(chat.transcript().to_vec());
        self.typing.set(chat.is_typing());
        self.input_enabled.set(chat.input_enabled());
        self.attachment.set(chat.attachment().cloned());
    }

    /// Send the composer contents; true when the input should be cleared
    pub fn send(&self, text: &str, push: &PushClient) -> bool {
        let result = self.chat.borrow_mut().send(text, Utc::now());
        match result {
            Ok(event) => {
                self.sync();
                push.emit(event);
                true
            }
            Err(ChatError::EmptyMessage) => false,
            Err(e) => {
                self.state.show_error(&e.to_string());
                false
            }
        }
    }

    pub fn clear(&self, push: &PushClient) {
        let event = self.chat.borrow_mut().clear(Utc::now());
        self.sync();
        push.emit(event);
    }

    pub fn attach(&self, attachment: Attachment) {
        let result = self.chat.borrow_mut().attach(attachment);
        match result {
            Ok(()) => self.sync(),
            Err(e) => self.state.show_error(&e.to_string()),
        }
    }

    pub fn detach(&self) {
        self.chat.borrow_mut().detach();
        self.sync();
    }

    pub fn dispatch(&self, message: Inbound) {
        let signal = self.chat.borrow_mut().dispatch(message, Utc::now());
        self.sync();
        if signal == ChatSignal::EndSession {
            self.state.end_session();
        }
    }
}
