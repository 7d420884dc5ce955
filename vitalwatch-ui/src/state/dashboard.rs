//! Dashboard binding
//!
//! Runs the core [`Dashboard`] against the browser: its view writes into
//! [`DashboardSignals`], its commands go through [`HttpApi`].

use chrono::{DateTime, Utc};
use leptos::*;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use vitalwatch::alerts::AlertFeed;
use vitalwatch::api::DeviceInfo;
use vitalwatch::chart::{EcgTrace, HistoryChart, LiveChart, TimeRange};
use vitalwatch::dashboard::{execute, Command, Dashboard, DashboardSettings, DashboardView};
use vitalwatch::{ConnectionState, Inbound, Notice, VitalsPanel};

use super::global::{GlobalState, PageMode};
use crate::api::HttpApi;

/// Poll period for the latest reading while linked
pub const POLL_INTERVAL_MS: u32 = 30_000;

/// [`DashboardView`] over the global signals
pub struct SignalView {
    state: GlobalState,
}

impl DashboardView for SignalView {
    fn show_link_form(&mut self) {
        self.state.dashboard.device.set(None);
        self.state.dashboard.mode.set(PageMode::LinkForm);
    }

    fn show_dashboard(&mut self, device: &DeviceInfo) {
        self.state.dashboard.device.set(Some(device.clone()));
        self.state.dashboard.mode.set(PageMode::Dashboard);
    }

    fn render_vitals(&mut self, panel: &VitalsPanel) {
        self.state.dashboard.panel.set(panel.clone());
    }

    fn render_last_updated(&mut self, at: Option<DateTime<Utc>>) {
        self.state.dashboard.last_updated.set(at);
    }

    fn render_live_chart(&mut self, chart: &LiveChart) {
        self.state.dashboard.live.set(chart.to_vec());
    }

    fn render_history(&mut self, chart: &HistoryChart) {
        self.state.dashboard.history.set(chart.clone());
    }

    fn render_waveform(&mut self, trace: &EcgTrace) {
        self.state.dashboard.waveform.set(trace.clone());
    }

    fn render_alerts(&mut self, alerts: &AlertFeed) {
        self.state.dashboard.alerts.set(alerts.to_vec());
    }

    fn render_connection(&mut self, state: ConnectionState) {
        self.state.dashboard.connection.set(state);
    }

    fn render_time_range(&mut self, range: TimeRange) {
        self.state.dashboard.range.set(range);
    }

    fn set_link_pending(&mut self, pending: bool) {
        self.state.dashboard.link_pending.set(pending);
    }

    fn clear_link_input(&mut self) {
        self.state.dashboard.link_input.set(String::new());
    }

    fn notify(&mut self, notice: Notice) {
        self.state.notify(notice);
    }
}

/// Shared handle to the session's dashboard
#[derive(Clone)]
pub struct DashboardController {
    dashboard: Rc<RefCell<Dashboard<SignalView>>>,
    api: HttpApi,
    state: GlobalState,
}

impl DashboardController {
    pub fn new(state: GlobalState, api: HttpApi) -> Self {
        let view = SignalView { state };
        Self {
            dashboard: Rc::new(RefCell::new(Dashboard::new(view, DashboardSettings::default()))),
            api,
            state,
        }
    }

    /// Run a handler and then the commands it returns
    pub fn handle(&self, handler: impl FnOnce(&mut Dashboard<SignalView>) -> Vec<Command>) {
        let commands = {
            let mut dashboard = self.dashboard.borrow_mut();
            handler(&mut dashboard)
        };
        self.run(commands);
    }

    pub fn start(&self) {
        self.handle(Dashboard::start);
    }

    pub fn dispatch(&self, message: Inbound) {
        self.handle(|d| d.dispatch(message, Utc::now()));
    }

    pub fn link(&self, raw_id: &str) {
        self.handle(|d| d.link(raw_id));
    }

    pub fn unlink(&self, confirmed: bool) {
        self.handle(|d| d.unlink(confirmed));
    }

    pub fn refresh(&self) {
        self.handle(Dashboard::refresh);
    }

    pub fn poll_tick(&self) {
        self.handle(Dashboard::poll_tick);
    }

    pub fn select_time_range(&self, range: TimeRange) {
        self.handle(|d| d.select_time_range(range));
    }

    /// Execute commands in order, feeding each outcome back
    ///
    /// The dashboard is never borrowed across an await.
    fn run(&self, commands: Vec<Command>) {
        if commands.is_empty() {
            return;
        }

        let this = self.clone();
        spawn_local(async move {
            let mut queue: VecDeque<Command> = commands.into();
            while let Some(command) = queue.pop_front() {
                if command == Command::EndSession {
                    this.state.end_session();
                    return;
                }
                if let Some(outcome) = execute(&this.api, command).await {
                    let follow_up = this.dashboard.borrow_mut().apply(outcome, Utc::now());
                    queue.extend(follow_up);
                }
            }
        });
    }
}
