//! WebSocket Client
//!
//! Socket.IO push channel over a browser WebSocket. Protocol handling is the
//! core [`Connection`] state machine; this module only moves frames and
//! schedules reconnects.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CloseEvent, MessageEvent, WebSocket};

use vitalwatch::channel::{
    socket_url, ClientEvent, Connection, Effect, EnginePacket, Inbound, ReconnectPolicy,
};

const TRANSPORT_ERROR_REASON: &str = "transport error";

struct Inner {
    url: String,
    connection: RefCell<Connection>,
    ws: RefCell<Option<WebSocket>>,
    /// Bumped per socket; events from older sockets are ignored
    generation: Cell<u32>,
    on_inbound: Box<dyn Fn(Inbound)>,
}

/// Handle to the session's push channel
#[derive(Clone)]
pub struct PushClient {
    inner: Rc<Inner>,
}

impl PushClient {
    /// Open the channel against a server root such as `http://localhost:5001`
    pub fn connect(server: &str, token: &str, on_inbound: impl Fn(Inbound) + 'static) -> Self {
        let client = Self {
            inner: Rc::new(Inner {
                url: socket_url(server, "websocket"),
                connection: RefCell::new(Connection::new(token, ReconnectPolicy::default())),
                ws: RefCell::new(None),
                generation: Cell::new(0),
                on_inbound: Box::new(on_inbound),
            }),
        };
        client.open();
        client
    }

    /// Send an event; queued by the connection until connected
    pub fn emit(&self, event: ClientEvent) {
        let effects = self.inner.connection.borrow_mut().emit(event);
        self.apply(effects);
    }

    /// Close for good
    pub fn close(&self) {
        let effects = self.inner.connection.borrow_mut().close();
        self.apply(effects);
    }

    fn open(&self) {
        let generation = self.inner.generation.get().wrapping_add(1);
        self.inner.generation.set(generation);

        match WebSocket::new(&self.inner.url) {
            Ok(ws) => {
                self.setup_handlers(&ws, generation);
                *self.inner.ws.borrow_mut() = Some(ws);
            }
            Err(e) => {
                web_sys::console::error_1(&format!("WebSocket connection failed: {:?}", e).into());
                self.lost(&format!("{:?}", e));
            }
        }
    }

    /// Set up WebSocket event handlers
    ///
    /// Handlers hold a weak reference so a dropped client is not kept alive
    /// by its socket.
    fn setup_handlers(&self, ws: &WebSocket, generation: u32) {
        let weak = Rc::downgrade(&self.inner);
        let on_message = Closure::wrap(Box::new(move |event: MessageEvent| {
            let Some(client) = current(&weak, generation) else { return };
            match event.data().as_string() {
                Some(text) => client.on_text(&text),
                None => web_sys::console::warn_1(&"Ignoring binary WebSocket frame".into()),
            }
        }) as Box<dyn FnMut(MessageEvent)>);
        ws.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
        on_message.forget();

        let weak = Rc::downgrade(&self.inner);
        let on_close = Closure::wrap(Box::new(move |event: CloseEvent| {
            web_sys::console::log_1(
                &format!("WebSocket closed: code={}, reason={}", event.code(), event.reason()).into(),
            );
            let Some(client) = current(&weak, generation) else { return };
            client.inner.ws.borrow_mut().take();
            let reason = if event.was_clean() {
                vitalwatch::channel::connection::TRANSPORT_CLOSE_REASON
            } else {
                TRANSPORT_ERROR_REASON
            };
            client.lost(reason);
        }) as Box<dyn FnMut(CloseEvent)>);
        ws.set_onclose(Some(on_close.as_ref().unchecked_ref()));
        on_close.forget();

        // The close event that follows does the bookkeeping
        let on_error = Closure::wrap(Box::new(move |e: JsValue| {
            web_sys::console::error_1(&format!("WebSocket error: {:?}", e).into());
        }) as Box<dyn FnMut(JsValue)>);
        ws.set_onerror(Some(on_error.as_ref().unchecked_ref()));
        on_error.forget();
    }

    fn on_text(&self, text: &str) {
        match EnginePacket::decode(text) {
            Ok(packet) => {
                let effects = self.inner.connection.borrow_mut().on_packet(packet);
                self.apply(effects);
            }
            Err(e) => {
                web_sys::console::error_1(&format!("Failed to parse push frame: {}", e).into());
            }
        }
    }

    fn lost(&self, reason: &str) {
        let effects = self.inner.connection.borrow_mut().on_transport_lost(reason);
        self.apply(effects);
    }

    /// Carry out connection effects; no borrow is held while emitting
    fn apply(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Send(packet) => self.send(&packet),
                Effect::Emit(inbound) => (self.inner.on_inbound)(inbound),
                Effect::Reconnect { attempt, delay } => {
                    self.drop_socket();
                    web_sys::console::log_1(&format!("Attempting reconnect (attempt {})", attempt).into());

                    let client = self.clone();
                    let delay_ms = u32::try_from(delay.as_millis()).unwrap_or(u32::MAX);
                    gloo_timers::callback::Timeout::new(delay_ms, move || {
                        if !client.inner.connection.borrow().is_closed() {
                            client.open();
                        }
                    })
                    .forget();
                }
                Effect::Close => self.drop_socket(),
            }
        }
    }

    fn send(&self, packet: &EnginePacket) {
        let ws = self.inner.ws.borrow();
        let Some(ws) = ws.as_ref() else {
            web_sys::console::warn_1(&"Dropping frame: WebSocket not open".into());
            return;
        };
        if let Err(e) = ws.send_with_str(&packet.encode()) {
            web_sys::console::error_1(&format!("WebSocket send failed: {:?}", e).into());
        }
    }

    /// Close the current socket and ignore anything it still reports
    fn drop_socket(&self) {
        self.inner.generation.set(self.inner.generation.get().wrapping_add(1));
        if let Some(ws) = self.inner.ws.borrow_mut().take() {
            ws.set_onmessage(None);
            ws.set_onclose(None);
            ws.set_onerror(None);
            let _ = ws.close();
        }
    }
}

/// Upgrade a handler's client reference if its socket is still current
fn current(weak: &Weak<Inner>, generation: u32) -> Option<PushClient> {
    let inner = weak.upgrade()?;
    (inner.generation.get() == generation).then_some(PushClient { inner })
}
