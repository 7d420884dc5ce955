//! State Management
//!
//! Global signals, the browser session store, and the per-login services:
//! dashboard, chat, and the push channel feeding both.

pub mod chat;
pub mod dashboard;
pub mod global;
pub mod storage;
pub mod websocket;

pub use chat::ChatController;
pub use dashboard::DashboardController;
pub use global::{provide_global_state, GlobalState, PageMode};
pub use websocket::PushClient;

use leptos::*;

use crate::api::{get_api_base, get_push_base, HttpApi};

/// Start the services of a logged-in session and provide them as context
///
/// Everything is torn down with the calling component.
pub fn provide_session() {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let token = state.token().unwrap_or_default();

    let api = HttpApi::new(get_api_base()).with_token(token.clone());
    provide_context(api.clone());

    let dashboard = DashboardController::new(state, api);
    let chat = ChatController::new(state);

    let (dashboard_rx, chat_rx) = (dashboard.clone(), chat.clone());
    let push = PushClient::connect(&get_push_base(), &token, move |message| {
        dashboard_rx.dispatch(message.clone());
        chat_rx.dispatch(message);
    });

    dashboard.start();

    let poller = dashboard.clone();
    let interval = gloo_timers::callback::Interval::new(dashboard::POLL_INTERVAL_MS, move || {
        poller.poll_tick();
    });

    provide_context(dashboard);
    provide_context(chat);
    provide_context(push.clone());

    on_cleanup(move || {
        drop(interval);
        push.close();
    });
}
