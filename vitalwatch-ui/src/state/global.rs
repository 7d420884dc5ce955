//! Global Application State
//!
//! Reactive state management using Leptos signals.

use chrono::{DateTime, Utc};
use leptos::*;

use vitalwatch::alerts::Alert;
use vitalwatch::api::{DeviceInfo, UserProfile};
use vitalwatch::chart::{ChartPoint, EcgTrace, HistoryChart, TimeRange};
use vitalwatch::{ConnectionState, Notice, NoticeLevel, Session, VitalsPanel};

use super::storage::session_store;

/// Which part of the vitals page is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMode {
    /// Link status not known yet
    Loading,
    LinkForm,
    Dashboard,
}

/// Signals the dashboard renders into
#[derive(Clone, Copy)]
pub struct DashboardSignals {
    pub mode: RwSignal<PageMode>,
    pub device: RwSignal<Option<DeviceInfo>>,
    pub panel: RwSignal<VitalsPanel>,
    pub last_updated: RwSignal<Option<DateTime<Utc>>>,
    /// Live chart, oldest point first
    pub live: RwSignal<Vec<ChartPoint>>,
    pub history: RwSignal<HistoryChart>,
    pub waveform: RwSignal<EcgTrace>,
    /// Newest first
    pub alerts: RwSignal<Vec<Alert>>,
    pub connection: RwSignal<ConnectionState>,
    pub range: RwSignal<TimeRange>,
    pub link_pending: RwSignal<bool>,
    pub link_input: RwSignal<String>,
}

impl DashboardSignals {
    fn new() -> Self {
        Self {
            mode: create_rw_signal(PageMode::Loading),
            device: create_rw_signal(None),
            panel: create_rw_signal(VitalsPanel::unlinked()),
            last_updated: create_rw_signal(None),
            live: create_rw_signal(Vec::new()),
            history: create_rw_signal(HistoryChart::default()),
            waveform: create_rw_signal(EcgTrace::default()),
            alerts: create_rw_signal(Vec::new()),
            connection: create_rw_signal(ConnectionState::default()),
            range: create_rw_signal(TimeRange::default()),
            link_pending: create_rw_signal(false),
            link_input: create_rw_signal(String::new()),
        }
    }

    /// Forget everything from the previous session
    pub fn reset(&self) {
        self.mode.set(PageMode::Loading);
        self.device.set(None);
        self.panel.set(VitalsPanel::unlinked());
        self.last_updated.set(None);
        self.live.set(Vec::new());
        self.history.set(HistoryChart::default());
        self.waveform.set(EcgTrace::default());
        self.alerts.set(Vec::new());
        self.connection.set(ConnectionState::default());
        self.link_pending.set(false);
        self.link_input.set(String::new());
    }
}

/// Global application state provided to all components
#[derive(Clone, Copy)]
pub struct GlobalState {
    /// Current login; `None` shows the login page
    pub session: RwSignal<Option<Session>>,
    pub dashboard: DashboardSignals,
    /// Toast currently on screen
    pub notice: RwSignal<Option<Notice>>,
}

/// Provide global state to the component tree
pub fn provide_global_state() {
    let state = GlobalState {
        session: create_rw_signal(session_store().load()),
        dashboard: DashboardSignals::new(),
        notice: create_rw_signal(None),
    };

    provide_context(state);
}

impl GlobalState {
    /// Store a fresh login and open the app
    pub fn begin_session(&self, session: Session) {
        if let Err(e) = session_store().save(&session) {
            web_sys::console::error_1(&format!("Failed to store session: {}", e).into());
        }
        self.session.set(Some(session));
    }

    /// Keep the stored user snapshot current
    pub fn update_user(&self, user: UserProfile) {
        if let Err(e) = session_store().save_user(&user) {
            web_sys::console::error_1(&format!("Failed to store user: {}", e).into());
        }
        self.session.update(|s| {
            if let Some(session) = s {
                session.user = Some(user);
            }
        });
    }

    /// Log out, or drop a session the server no longer accepts
    ///
    /// Deferred to a microtask so callers still inside a socket or
    /// dashboard callback finish before the session tree is torn down.
    pub fn end_session(&self) {
        let state = *self;
        queue_microtask(move || {
            if let Err(e) = session_store().clear() {
                web_sys::console::error_1(&format!("Failed to clear session: {}", e).into());
            }
            state.dashboard.reset();
            state.session.set(None);
        });
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.session.with(|s| s.as_ref().and_then(|s| s.user.clone()))
    }

    pub fn token(&self) -> Option<String> {
        self.session.with_untracked(|s| s.as_ref().map(|s| s.token.clone()))
    }

    /// Show a notice; errors stay up longer
    pub fn notify(&self, notice: Notice) {
        let timeout = match notice.level {
            NoticeLevel::Error => 5000,
            _ => 3000,
        };
        self.notice.set(Some(notice.clone()));

        let signal = self.notice;
        gloo_timers::callback::Timeout::new(timeout, move || {
            // A newer notice owns its own timeout
            if signal.with_untracked(|n| n.as_ref() == Some(&notice)) {
                signal.set(None);
            }
        })
        .forget();
    }

    pub fn show_success(&self, message: &str) {
        self.notify(Notice::success(message));
    }

    pub fn show_error(&self, message: &str) {
        self.notify(Notice::error(message));
    }
}
