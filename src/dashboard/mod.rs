//! Vital-signs Dashboard
//!
//! The device-link state machine and the live vitals page, as a sans-IO
//! controller. Handlers take `&mut self`, update [`DashboardState`], render
//! through the bound [`DashboardView`] and return the [`Command`]s a driver
//! has to run. Results come back through [`Dashboard::apply`].
//!
//! Polled responses and pushed events may arrive in any order; whichever is
//! applied last is what the page shows.

pub mod command;
pub mod state;
pub mod view;

#[cfg(feature = "native")]
pub mod driver;
#[cfg(feature = "native")]
pub mod terminal;

pub use command::{execute, Command, Outcome};
pub use state::{DashboardSettings, DashboardState};
pub use view::DashboardView;

#[cfg(feature = "native")]
pub use driver::{DashboardDriver, DriverExit, UserAction, DEFAULT_POLL_INTERVAL};
#[cfg(feature = "native")]
pub use terminal::TerminalView;

use chrono::{DateTime, Utc};

use crate::alerts::Alert;
use crate::api::{ApiError, DeviceInfo, DeviceSeries};
use crate::channel::{ConnectionState, Inbound, Lifecycle, ServerEvent, VitalSignsUpdate};
use crate::chart::{ChartPoint, EcgTrace, HistoryChart, TimeRange};
use crate::device::{
    LinkError, LINKED_MESSAGE, LINK_FAILED_MESSAGE, UNLINKED_MESSAGE, UNLINK_FAILED_MESSAGE,
};
use crate::notice::Notice;
use crate::vitals::{VitalReading, VitalsPanel};

pub const CONNECTED_NOTICE: &str = "Connected to real-time updates";
pub const DISCONNECTED_NOTICE: &str = "Disconnected from real-time updates";
pub const CONNECT_FAILED_NOTICE: &str = "Failed to connect to real-time updates";
pub const RECONNECTING_NOTICE: &str = "Reconnecting to server...";
pub const RESTORED_NOTICE: &str = "Connection restored";
pub const UNREACHABLE_NOTICE: &str = "Could not reach server, try again later";
pub const REFRESHED_NOTICE: &str = "Data refreshed successfully";
pub const REFRESH_FAILED_NOTICE: &str = "Failed to refresh data";

/// Device type assumed when the link response carries no device info
const DEFAULT_DEVICE_TYPE: &str = "ESP32";

/// Dashboard controller
pub struct Dashboard<V> {
    state: DashboardState,
    view: V,
    refreshing: bool,
}

impl<V: DashboardView> Dashboard<V> {
    pub fn new(view: V, settings: DashboardSettings) -> Self {
        Self {
            state: DashboardState::new(settings),
            view,
            refreshing: false,
        }
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn is_linked(&self) -> bool {
        self.state.link.is_linked()
    }

    /// Page load: show the link form until the backend says otherwise
    pub fn start(&mut self) -> Vec<Command> {
        self.render_unlinked();
        self.view.render_connection(self.state.connection);
        self.view.render_time_range(self.state.range);
        vec![Command::FetchDeviceInfo]
    }

    /// Link button
    pub fn link(&mut self, raw_id: &str) -> Vec<Command> {
        match self.state.link.begin_link(raw_id) {
            Ok(device_id) => {
                self.view.set_link_pending(true);
                vec![Command::Link { device_id }]
            }
            Err(LinkError::Pending) => Vec::new(),
            Err(e) => {
                self.view.notify(Notice::error(e.to_string()));
                Vec::new()
            }
        }
    }

    /// Unlink button; `confirmed` is the user's answer to the confirmation
    pub fn unlink(&mut self, confirmed: bool) -> Vec<Command> {
        if !confirmed {
            return Vec::new();
        }
        match self.state.link.begin_unlink() {
            Ok(()) => {
                self.view.set_link_pending(true);
                vec![Command::Unlink]
            }
            Err(LinkError::Pending) => Vec::new(),
            Err(e) => {
                self.view.notify(Notice::warning(e.to_string()));
                Vec::new()
            }
        }
    }

    /// Poll timer; only a linked dashboard polls
    pub fn poll_tick(&mut self) -> Vec<Command> {
        self.load_device_data()
    }

    /// Refresh button
    pub fn refresh(&mut self) -> Vec<Command> {
        let commands = self.load_device_data();
        self.refreshing = !commands.is_empty();
        commands
    }

    pub fn select_time_range(&mut self, range: TimeRange) -> Vec<Command> {
        self.state.range = range;
        self.view.render_time_range(range);
        self.load_device_data()
    }

    fn load_device_data(&self) -> Vec<Command> {
        if !self.is_linked() {
            return Vec::new();
        }
        vec![
            Command::FetchHistory {
                range: self.state.range,
            },
            Command::FetchLatest,
        ]
    }

    /// Route one push-channel message
    pub fn dispatch(&mut self, message: Inbound, now: DateTime<Utc>) -> Vec<Command> {
        match message {
            Inbound::Lifecycle(lifecycle) => self.on_lifecycle(lifecycle),
            Inbound::Event(event) => self.on_event(event, now),
        }
    }

    fn on_lifecycle(&mut self, lifecycle: Lifecycle) -> Vec<Command> {
        tracing::debug!(?lifecycle, "Push lifecycle");

        if lifecycle.is_auth_failure() {
            return vec![Command::EndSession];
        }

        match lifecycle {
            Lifecycle::Connect => self.set_connection(ConnectionState::Connected),
            Lifecycle::Disconnect { reason } => {
                self.set_connection(ConnectionState::Disconnected);
                if reason != crate::channel::CLIENT_DISCONNECT_REASON {
                    self.view.notify(Notice::warning(DISCONNECTED_NOTICE));
                }
            }
            Lifecycle::ConnectError { message } => {
                tracing::warn!("Push channel connect error: {}", message);
                self.set_connection(ConnectionState::Error);
                self.view.notify(Notice::error(CONNECT_FAILED_NOTICE));
            }
            Lifecycle::ReconnectAttempt { attempt } => {
                tracing::info!("Reconnection attempt {}", attempt);
                self.set_connection(ConnectionState::Connecting);
                self.view.notify(Notice::info(RECONNECTING_NOTICE));
            }
            Lifecycle::Reconnect { attempt } => {
                tracing::info!("Reconnected after {} attempts", attempt);
                self.view.notify(Notice::success(RESTORED_NOTICE));
            }
            Lifecycle::ReconnectFailed => {
                self.set_connection(ConnectionState::Error);
                self.view.notify(Notice::error(UNREACHABLE_NOTICE));
            }
        }
        Vec::new()
    }

    fn on_event(&mut self, event: ServerEvent, now: DateTime<Utc>) -> Vec<Command> {
        if event.is_auth_failure() {
            return vec![Command::EndSession];
        }

        match event {
            ServerEvent::ConnectionSuccess { .. } => {
                self.view.notify(Notice::success(CONNECTED_NOTICE));
            }
            ServerEvent::Error { message } => {
                tracing::warn!("Push channel error: {}", message);
                self.view.notify(Notice::error(message));
            }
            ServerEvent::DeviceDataUpdate(reading) => self.on_pushed_reading(reading, now, false),
            ServerEvent::VitalSignsUpdate(update) => match update {
                VitalSignsUpdate::VitalSigns(reading) => self.on_pushed_reading(reading, now, true),
                VitalSignsUpdate::EcgData(samples) => {
                    if self.state.link.accepts_untagged() {
                        self.set_waveform(samples, Some(now));
                    }
                }
                VitalSignsUpdate::Alert(payload) => {
                    self.state.alerts.push(Alert::from_payload(payload, now));
                    self.view.render_alerts(&self.state.alerts);
                }
                VitalSignsUpdate::Other { kind } => {
                    tracing::debug!(kind = %kind, "Ignoring vital_signs_update");
                }
            },
            ServerEvent::ProfileUpdateNotification { message, level }
            | ServerEvent::SystemNotification { message, level } => {
                self.view.notify(Notice::new(level, message));
            }
            ServerEvent::SecurityAlert { message } => {
                self.view.notify(Notice::warning(message));
            }
            other => {
                tracing::debug!(event = other.name(), "Event not handled by dashboard");
            }
        }
        Vec::new()
    }

    /// `untagged_ok` is set for event kinds that never carry a device id
    fn on_pushed_reading(&mut self, reading: VitalReading, now: DateTime<Utc>, untagged_ok: bool) {
        let accepted = match reading.device_id.as_deref() {
            None if untagged_ok => self.state.link.accepts_untagged(),
            device_id => self.state.link.accepts(device_id),
        };
        if !accepted {
            tracing::debug!(
                device_id = ?reading.device_id,
                linked = ?self.state.link.device_id(),
                "Dropping reading for another device"
            );
            return;
        }
        self.apply_reading(reading, now, true);
    }

    /// Feed back the result of an executed command
    pub fn apply(&mut self, outcome: Outcome, now: DateTime<Utc>) -> Vec<Command> {
        match outcome {
            Outcome::DeviceInfo(result) => self.on_device_info(result),
            Outcome::Linked { device_id, result } => self.on_linked(device_id, result, now),
            Outcome::Unlinked(result) => self.on_unlinked(result),
            Outcome::History { range, result } => self.on_history(range, result),
            Outcome::Latest(result) => self.on_latest(result, now),
        }
    }

    fn on_device_info(&mut self, result: Result<Option<DeviceInfo>, ApiError>) -> Vec<Command> {
        match result {
            Ok(Some(info)) => {
                self.show_linked(info);
                self.load_device_data()
            }
            Ok(None) => {
                self.show_not_linked();
                Vec::new()
            }
            Err(ApiError::Unauthorized) => vec![Command::EndSession],
            Err(e) => {
                tracing::warn!("Error checking device status: {}", e);
                self.show_not_linked();
                Vec::new()
            }
        }
    }

    fn on_linked(
        &mut self,
        device_id: String,
        result: Result<Option<DeviceInfo>, ApiError>,
        now: DateTime<Utc>,
    ) -> Vec<Command> {
        self.state.link.finish();
        self.view.set_link_pending(false);

        match result {
            Ok(info) => {
                let info = info.unwrap_or_else(|| DeviceInfo {
                    device_id,
                    device_type: Some(DEFAULT_DEVICE_TYPE.to_string()),
                    linked_at: Some(now.to_rfc3339()),
                });
                tracing::info!(device_id = %info.device_id, "Device linked");
                self.view.notify(Notice::success(LINKED_MESSAGE));
                self.show_linked(info);
                self.load_device_data()
            }
            Err(ApiError::Unauthorized) => vec![Command::EndSession],
            Err(e) => {
                tracing::warn!("Device linking failed: {}", e);
                self.view.notify(Notice::error(e.user_message(LINK_FAILED_MESSAGE)));
                Vec::new()
            }
        }
    }

    fn on_unlinked(&mut self, result: Result<(), ApiError>) -> Vec<Command> {
        self.state.link.finish();
        self.view.set_link_pending(false);

        match result {
            Ok(()) => {
                tracing::info!("Device unlinked");
                self.view.notify(Notice::success(UNLINKED_MESSAGE));
                self.show_not_linked();
                Vec::new()
            }
            Err(ApiError::Unauthorized) => vec![Command::EndSession],
            Err(e) => {
                tracing::warn!("Device unlinking failed: {}", e);
                self.view.notify(Notice::error(e.user_message(UNLINK_FAILED_MESSAGE)));
                Vec::new()
            }
        }
    }

    fn on_history(
        &mut self,
        range: TimeRange,
        result: Result<Option<DeviceSeries>, ApiError>,
    ) -> Vec<Command> {
        // A response for a range the user already left is stale
        if !self.is_linked() || range != self.state.range {
            tracing::debug!(?range, "Dropping stale history response");
            return match result {
                Err(ApiError::Unauthorized) => vec![Command::EndSession],
                _ => Vec::new(),
            };
        }
        let refreshing = std::mem::take(&mut self.refreshing);

        match result {
            Ok(series) => {
                if refreshing {
                    self.view.notify(Notice::success(REFRESHED_NOTICE));
                }
                let series = series.unwrap_or_default();
                if series.is_empty() {
                    // Never show the previous range's points under the new label
                    if self.state.history.range != range {
                        self.state.history = HistoryChart {
                            range,
                            points: Vec::new(),
                        };
                        self.view.render_history(&self.state.history);
                    }
                    return Vec::new();
                }

                self.state.history = HistoryChart::from_series(range, &series);
                self.view.render_history(&self.state.history);

                if self.state.live.is_empty() {
                    self.state.live.seed_from_history(&self.state.history);
                    self.view.render_live_chart(&self.state.live);
                }
                if let Some(samples) = series.latest_waveform() {
                    self.set_waveform(samples.to_vec(), None);
                }
                Vec::new()
            }
            Err(ApiError::Unauthorized) => vec![Command::EndSession],
            Err(e) => {
                tracing::warn!("Failed to load device data: {}", e);
                if refreshing {
                    self.view.notify(Notice::error(REFRESH_FAILED_NOTICE));
                }
                Vec::new()
            }
        }
    }

    fn on_latest(
        &mut self,
        result: Result<Option<VitalReading>, ApiError>,
        now: DateTime<Utc>,
    ) -> Vec<Command> {
        match result {
            Ok(_) if !self.is_linked() => Vec::new(),
            Ok(Some(reading)) => {
                self.apply_reading(reading, now, false);
                Vec::new()
            }
            Ok(None) => {
                if self.state.latest.is_none() {
                    self.state.panel = VitalsPanel::waiting();
                    self.view.render_vitals(&self.state.panel);
                }
                Vec::new()
            }
            Err(ApiError::Unauthorized) => vec![Command::EndSession],
            Err(e) => {
                tracing::warn!("Error loading latest vital signs: {}", e);
                Vec::new()
            }
        }
    }

    /// Show a reading; pushed readings also add a live chart point
    fn apply_reading(&mut self, reading: VitalReading, now: DateTime<Utc>, pushed: bool) {
        if reading.has_waveform() {
            self.set_waveform(reading.waveform.clone(), reading.timestamp.or(Some(now)));
        }
        if reading.is_empty() {
            return;
        }

        self.state.panel = VitalsPanel::from_reading(&reading);
        self.view.render_vitals(&self.state.panel);

        self.state.last_updated = Some(reading.timestamp.unwrap_or(now));
        self.view.render_last_updated(self.state.last_updated);

        if pushed {
            self.state.live.push(ChartPoint::from_reading(&reading, now));
            self.view.render_live_chart(&self.state.live);
        }
        self.state.latest = Some(reading);
    }

    fn set_waveform(&mut self, samples: Vec<f64>, at: Option<DateTime<Utc>>) {
        let trace = EcgTrace::new(samples, at);
        if trace.is_empty() {
            return;
        }
        self.state.ecg = trace;
        self.view.render_waveform(&self.state.ecg);
    }

    fn set_connection(&mut self, connection: ConnectionState) {
        self.state.connection = connection;
        self.view.render_connection(connection);
    }

    fn show_linked(&mut self, info: DeviceInfo) {
        self.view.show_dashboard(&info);
        self.state.link.set_linked(info);
        if self.state.latest.is_none() {
            self.state.panel = VitalsPanel::waiting();
        }
        self.view.render_vitals(&self.state.panel);
    }

    fn show_not_linked(&mut self) {
        self.state.link.set_not_linked();
        self.render_unlinked();
    }

    /// Link form with placeholders; the link state itself is left alone
    fn render_unlinked(&mut self) {
        self.state.reset_readings();
        self.view.show_link_form();
        self.view.clear_link_input();
        self.view.render_vitals(&self.state.panel);
        self.view.render_last_updated(None);
        self.view.render_live_chart(&self.state.live);
        self.view.render_alerts(&self.state.alerts);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::AlertPayload;
    use crate::api::{ApiResult, DeviceApi};
    use crate::device::LinkState;
    use crate::notice::NoticeLevel;
    use crate::vitals::{StatusClass, UNLINKED_TEXT};
    use async_trait::async_trait;
    use chrono::TimeZone;

    /// Records every call so tests can assert on what was shown
    #[derive(Default)]
    struct RecordingView {
        link_form_visible: bool,
        dashboard_device: Option<String>,
        panel: Option<VitalsPanel>,
        live_len: usize,
        history_len: usize,
        waveform_len: usize,
        alerts: usize,
        connection: Option<ConnectionState>,
        pending: bool,
        input_cleared: bool,
        notices: Vec<Notice>,
    }

    impl DashboardView for RecordingView {
        fn show_link_form(&mut self) {
            self.link_form_visible = true;
            self.dashboard_device = None;
        }

        fn show_dashboard(&mut self, device: &DeviceInfo) {
            self.link_form_visible = false;
            self.dashboard_device = Some(device.device_id.clone());
        }

        fn render_vitals(&mut self, panel: &VitalsPanel) {
            self.panel = Some(panel.clone());
        }

        fn render_last_updated(&mut self, _at: Option<DateTime<Utc>>) {}

        fn render_live_chart(&mut self, chart: &crate::chart::LiveChart) {
            self.live_len = chart.len();
        }

        fn render_history(&mut self, chart: &HistoryChart) {
            self.history_len = chart.len();
        }

        fn render_waveform(&mut self, trace: &EcgTrace) {
            self.waveform_len = trace.samples.len();
        }

        fn render_alerts(&mut self, alerts: &crate::alerts::AlertFeed) {
            self.alerts = alerts.len();
        }

        fn render_connection(&mut self, state: ConnectionState) {
            self.connection = Some(state);
        }

        fn set_link_pending(&mut self, pending: bool) {
            self.pending = pending;
        }

        fn clear_link_input(&mut self) {
            self.input_cleared = true;
        }

        fn notify(&mut self, notice: Notice) {
            self.notices.push(notice);
        }
    }

    struct FakeApi {
        device: Option<DeviceInfo>,
    }

    #[async_trait(?Send)]
    impl DeviceApi for FakeApi {
        async fn device_info(&self) -> ApiResult<Option<DeviceInfo>> {
            Ok(self.device.clone())
        }

        async fn link_device(&self, device_id: &str) -> ApiResult<Option<DeviceInfo>> {
            if device_id == "TAKEN" {
                return Err(ApiError::Rejected {
                    status: 400,
                    message: "Device is already linked to another user".into(),
                });
            }
            Ok(None)
        }

        async fn unlink_device(&self) -> ApiResult<()> {
            Ok(())
        }

        async fn device_data(&self, _hours: u32) -> ApiResult<Option<DeviceSeries>> {
            Ok(Some(DeviceSeries {
                timestamps: vec![Some("2024-05-01T10:00:00".into())],
                heart_rate: vec![Some(72.0)],
                spo2: vec![Some(98.0)],
                temperature: vec![Some(98.6)],
                ecg_data: vec![Some(vec![0.1, 0.4, -0.2])],
            }))
        }

        async fn latest_data(&self) -> ApiResult<Option<VitalReading>> {
            Ok(Some(reading(Some("ESP32-001"), 72.0)))
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn info(id: &str) -> DeviceInfo {
        DeviceInfo {
            device_id: id.to_string(),
            device_type: Some("ESP32".to_string()),
            linked_at: None,
        }
    }

    fn reading(device_id: Option<&str>, bpm: f64) -> VitalReading {
        VitalReading {
            device_id: device_id.map(str::to_string),
            heart_rate_bpm: Some(bpm),
            spo2_percent: Some(97.0),
            temperature_f: None,
            ..Default::default()
        }
    }

    fn dashboard() -> Dashboard<RecordingView> {
        Dashboard::new(RecordingView::default(), DashboardSettings::default())
    }

    fn linked(id: &str) -> Dashboard<RecordingView> {
        let mut dash = dashboard();
        dash.start();
        dash.apply(Outcome::DeviceInfo(Ok(Some(info(id)))), now());
        dash
    }

    /// Execute commands until none are left
    async fn run(dash: &mut Dashboard<RecordingView>, api: &FakeApi, mut commands: Vec<Command>) {
        while let Some(command) = commands.pop() {
            if let Some(outcome) = execute(api, command).await {
                commands.extend(dash.apply(outcome, now()));
            }
        }
    }

    fn pushed(reading: VitalReading) -> Inbound {
        Inbound::Event(ServerEvent::DeviceDataUpdate(reading))
    }

    #[test]
    fn test_start_resolves_link_state() {
        let mut dash = dashboard();
        assert_eq!(dash.start(), vec![Command::FetchDeviceInfo]);
        assert!(dash.view().link_form_visible);

        let commands = dash.apply(Outcome::DeviceInfo(Ok(Some(info("ESP32-001")))), now());
        assert_eq!(
            commands,
            vec![
                Command::FetchHistory {
                    range: TimeRange::Day
                },
                Command::FetchLatest
            ]
        );
        assert_eq!(dash.view().dashboard_device.as_deref(), Some("ESP32-001"));
        assert_eq!(dash.state().panel, VitalsPanel::waiting());
    }

    #[test]
    fn test_no_device_shows_link_form() {
        let mut dash = dashboard();
        dash.start();
        assert!(dash.apply(Outcome::DeviceInfo(Ok(None)), now()).is_empty());
        assert_eq!(dash.state().link.state(), &LinkState::NotLinked);
        assert!(dash.view().link_form_visible);
        assert_eq!(dash.state().panel.heart_rate.status_text, UNLINKED_TEXT);
    }

    #[test]
    fn test_link_success_fetches_immediately() {
        let mut dash = dashboard();
        dash.start();
        dash.apply(Outcome::DeviceInfo(Ok(None)), now());

        assert_eq!(
            dash.link("  ESP32-001 "),
            vec![Command::Link {
                device_id: "ESP32-001".into()
            }]
        );
        assert!(dash.view().pending);

        let commands = dash.apply(
            Outcome::Linked {
                device_id: "ESP32-001".into(),
                result: Ok(None),
            },
            now(),
        );
        assert_eq!(commands.len(), 2);
        assert!(!dash.view().pending);
        assert_eq!(dash.state().link.device_id(), Some("ESP32-001"));
        assert!(!dash.view().link_form_visible);
        assert_eq!(dash.view().notices.last().unwrap().message, LINKED_MESSAGE);
    }

    #[test]
    fn test_link_rejects_empty_id() {
        let mut dash = dashboard();
        assert!(dash.link("   ").is_empty());
        assert_eq!(dash.view().notices[0].message, "Please enter a device ID");
        assert!(!dash.view().pending);
    }

    #[test]
    fn test_link_failure_surfaces_server_error() {
        let mut dash = dashboard();
        dash.link("TAKEN");
        let commands = dash.apply(
            Outcome::Linked {
                device_id: "TAKEN".into(),
                result: Err(ApiError::Rejected {
                    status: 400,
                    message: "Device is already linked to another user".into(),
                }),
            },
            now(),
        );
        assert!(commands.is_empty());
        assert!(!dash.state().link.is_pending());
        assert!(!dash.is_linked());
        let notice = dash.view().notices.last().unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.message, "Device is already linked to another user");
    }

    #[test]
    fn test_unlink_confirmed() {
        let mut dash = linked("ESP32-001");
        dash.dispatch(pushed(reading(Some("ESP32-001"), 80.0)), now());
        assert_eq!(dash.view().live_len, 1);

        assert!(dash.unlink(false).is_empty());
        assert_eq!(dash.unlink(true), vec![Command::Unlink]);
        dash.apply(Outcome::Unlinked(Ok(())), now());

        assert_eq!(dash.state().link.state(), &LinkState::NotLinked);
        assert!(dash.view().link_form_visible);
        assert!(dash.view().input_cleared);
        assert_eq!(dash.view().live_len, 0);
        let panel = dash.view().panel.as_ref().unwrap();
        assert_eq!(panel.heart_rate.class, StatusClass::Waiting);
        assert_eq!(panel.device.value, "Not Connected");
    }

    #[test]
    fn test_poll_only_while_linked() {
        let mut dash = dashboard();
        dash.start();
        assert!(dash.poll_tick().is_empty());

        dash.apply(Outcome::DeviceInfo(Ok(Some(info("ESP32-001")))), now());
        assert_eq!(dash.poll_tick().len(), 2);
    }

    #[test]
    fn test_pushed_reading_filtered_by_device() {
        let mut dash = linked("ESP32-001");

        dash.dispatch(pushed(reading(Some("ESP32-999"), 120.0)), now());
        assert!(dash.state().latest.is_none());

        dash.dispatch(pushed(reading(Some("ESP32-001"), 120.0)), now());
        assert_eq!(dash.state().panel.heart_rate.value, "120");
        assert_eq!(dash.state().live.len(), 1);
    }

    #[test]
    fn test_pushed_reading_accepted_before_resolution() {
        let mut dash = dashboard();
        dash.start();
        assert_eq!(dash.state().link.state(), &LinkState::Unresolved);
        dash.dispatch(pushed(reading(Some("ESP32-001"), 72.0)), now());
        assert_eq!(dash.state().live.len(), 1);
    }

    #[test]
    fn test_pushed_reading_dropped_when_not_linked() {
        let mut dash = dashboard();
        dash.start();
        dash.apply(Outcome::DeviceInfo(Ok(None)), now());
        dash.dispatch(pushed(reading(None, 72.0)), now());
        assert!(dash.state().live.is_empty());
    }

    #[test]
    fn test_untagged_reading_by_event_kind() {
        let mut dash = linked("ESP32-001");
        dash.dispatch(pushed(reading(None, 72.0)), now());
        assert!(dash.state().live.is_empty());

        dash.dispatch(
            Inbound::Event(ServerEvent::VitalSignsUpdate(VitalSignsUpdate::VitalSigns(reading(None, 74.0)))),
            now(),
        );
        assert_eq!(dash.state().live.len(), 1);
        assert_eq!(dash.state().panel.heart_rate.value, "74");

        dash.dispatch(
            Inbound::Event(ServerEvent::VitalSignsUpdate(VitalSignsUpdate::VitalSigns(reading(
                Some("ESP32-999"),
                90.0,
            )))),
            now(),
        );
        assert_eq!(dash.state().live.len(), 1);
    }

    #[test]
    fn test_live_chart_evicts_oldest() {
        let mut dash = linked("ESP32-001");
        for i in 0..21 {
            dash.dispatch(pushed(reading(Some("ESP32-001"), 60.0 + i as f64)), now());
        }
        assert_eq!(dash.state().live.len(), 20);
        assert_eq!(
            dash.state().live.points().next().unwrap().heart_rate,
            Some(61.0)
        );
    }

    #[test]
    fn test_empty_reading_never_fabricates() {
        let mut dash = linked("ESP32-001");
        let empty = VitalReading {
            device_id: Some("ESP32-001".into()),
            ..Default::default()
        };
        dash.dispatch(pushed(empty), now());
        assert!(dash.state().live.is_empty());
        assert_eq!(dash.state().panel, VitalsPanel::waiting());
    }

    #[test]
    fn test_disconnect_notices() {
        let mut dash = dashboard();
        dash.dispatch(Inbound::Lifecycle(Lifecycle::Connect), now());
        assert_eq!(dash.view().connection, Some(ConnectionState::Connected));

        dash.dispatch(
            Inbound::Lifecycle(Lifecycle::Disconnect {
                reason: "io client disconnect".into(),
            }),
            now(),
        );
        assert_eq!(dash.state().connection, ConnectionState::Disconnected);
        assert!(dash.view().notices.is_empty());

        dash.dispatch(
            Inbound::Lifecycle(Lifecycle::Disconnect {
                reason: "transport close".into(),
            }),
            now(),
        );
        assert_eq!(dash.view().notices.len(), 1);
        assert_eq!(dash.view().notices[0].message, DISCONNECTED_NOTICE);
    }

    #[test]
    fn test_auth_failures_end_session() {
        let mut dash = dashboard();
        let commands = dash.dispatch(
            Inbound::Event(ServerEvent::Error {
                message: "Authentication required".into(),
            }),
            now(),
        );
        assert_eq!(commands, vec![Command::EndSession]);

        let commands = dash.dispatch(
            Inbound::Lifecycle(Lifecycle::ConnectError {
                message: "Authentication error".into(),
            }),
            now(),
        );
        assert_eq!(commands, vec![Command::EndSession]);

        let commands = dash.apply(Outcome::Latest(Err(ApiError::Unauthorized)), now());
        assert_eq!(commands, vec![Command::EndSession]);
    }

    #[test]
    fn test_connect_error_notice() {
        let mut dash = dashboard();
        dash.dispatch(
            Inbound::Lifecycle(Lifecycle::ConnectError {
                message: "xhr poll error".into(),
            }),
            now(),
        );
        assert_eq!(dash.state().connection, ConnectionState::Error);
        assert_eq!(dash.view().notices[0].message, CONNECT_FAILED_NOTICE);
    }

    #[test]
    fn test_alerts_capped() {
        let mut dash = linked("ESP32-001");
        for i in 0..6 {
            let payload = AlertPayload {
                kind: Some("warning".into()),
                title: Some(format!("Alert {}", i)),
                message: Some("High heart rate".into()),
            };
            dash.dispatch(
                Inbound::Event(ServerEvent::VitalSignsUpdate(VitalSignsUpdate::Alert(payload))),
                now(),
            );
        }
        assert_eq!(dash.view().alerts, 5);
        assert_eq!(dash.state().alerts.iter().next().unwrap().title, "Alert 5");
    }

    #[test]
    fn test_network_failure_keeps_values() {
        let mut dash = linked("ESP32-001");
        dash.dispatch(pushed(reading(Some("ESP32-001"), 88.0)), now());
        dash.apply(
            Outcome::Latest(Err(ApiError::Network("connection refused".into()))),
            now(),
        );
        assert_eq!(dash.state().panel.heart_rate.value, "88");
        assert!(dash.view().notices.is_empty());
    }

    #[test]
    fn test_stale_history_range_ignored() {
        let mut dash = linked("ESP32-001");
        dash.select_time_range(TimeRange::Week);
        dash.apply(
            Outcome::History {
                range: TimeRange::Day,
                result: Ok(Some(DeviceSeries {
                    timestamps: vec![Some("2024-05-01T10:00:00".into())],
                    heart_rate: vec![Some(70.0)],
                    ..Default::default()
                })),
            },
            now(),
        );
        assert!(dash.state().history.is_empty());
    }

    #[test]
    fn test_empty_history_for_new_range_clears_chart() {
        let mut dash = linked("ESP32-001");
        dash.apply(
            Outcome::History {
                range: TimeRange::Day,
                result: Ok(Some(DeviceSeries {
                    timestamps: vec![Some("2024-05-01T10:00:00".into())],
                    heart_rate: vec![Some(70.0)],
                    ..Default::default()
                })),
            },
            now(),
        );
        assert_eq!(dash.state().history.len(), 1);

        dash.select_time_range(TimeRange::Week);
        dash.apply(
            Outcome::History {
                range: TimeRange::Week,
                result: Ok(Some(DeviceSeries::default())),
            },
            now(),
        );
        assert!(dash.state().history.is_empty());
        assert_eq!(dash.state().history.range, TimeRange::Week);
    }

    #[test]
    fn test_stale_refresh_response_no_notice() {
        let mut dash = linked("ESP32-001");
        dash.refresh();
        dash.select_time_range(TimeRange::Week);
        dash.apply(
            Outcome::History {
                range: TimeRange::Day,
                result: Ok(None),
            },
            now(),
        );
        assert!(dash.view().notices.iter().all(|n| n.message != REFRESHED_NOTICE));

        dash.apply(
            Outcome::History {
                range: TimeRange::Week,
                result: Ok(None),
            },
            now(),
        );
        assert_eq!(dash.view().notices.last().unwrap().message, REFRESHED_NOTICE);
    }

    #[test]
    fn test_refresh_notice() {
        let mut dash = linked("ESP32-001");
        assert_eq!(dash.refresh().len(), 2);
        dash.apply(
            Outcome::History {
                range: TimeRange::Day,
                result: Ok(None),
            },
            now(),
        );
        assert_eq!(dash.view().notices.last().unwrap().message, REFRESHED_NOTICE);
    }

    #[tokio::test]
    async fn test_full_cycle_against_fake_api() {
        let api = FakeApi {
            device: Some(info("ESP32-001")),
        };
        let mut dash = dashboard();
        let commands = dash.start();
        run(&mut dash, &api, commands).await;

        assert!(dash.is_linked());
        assert_eq!(dash.view().history_len, 1);
        assert_eq!(dash.view().waveform_len, 3);
        assert_eq!(dash.state().panel.heart_rate.value, "72");
        // Seeded from history, since nothing was pushed yet
        assert_eq!(dash.state().live.len(), 1);
    }

    #[tokio::test]
    async fn test_execute_end_session_is_local() {
        let api = FakeApi { device: None };
        assert!(execute(&api, Command::EndSession).await.is_none());
    }
}
