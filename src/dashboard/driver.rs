//! Native dashboard driver
//!
//! One task owns the [`Dashboard`] and selects over the poll interval, the
//! push channel, user actions and a shutdown future. Commands run inline,
//! one at a time, so handlers never interleave.

use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::{execute, Command, Dashboard, DashboardView};
use crate::api::DeviceApi;
use crate::channel::Inbound;
use crate::chart::TimeRange;

/// Default poll fallback period
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Something the user did on the dashboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    Link(String),
    /// Unlink, already confirmed
    Unlink,
    Refresh,
    SelectRange(TimeRange),
}

/// Why the driver returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverExit {
    Shutdown,
    /// The backend or push channel rejected the session token
    SessionEnded,
}

pub struct DashboardDriver<A, V> {
    dashboard: Dashboard<V>,
    api: A,
    poll_interval: Duration,
}

impl<A: DeviceApi, V: DashboardView> DashboardDriver<A, V> {
    pub fn new(dashboard: Dashboard<V>, api: A, poll_interval: Duration) -> Self {
        Self {
            dashboard,
            api,
            poll_interval: poll_interval.max(Duration::from_secs(1)),
        }
    }

    pub fn dashboard(&self) -> &Dashboard<V> {
        &self.dashboard
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Run until `shutdown` resolves or the session ends
    pub async fn run<F>(
        &mut self,
        mut inbound: mpsc::UnboundedReceiver<Inbound>,
        mut actions: mpsc::UnboundedReceiver<UserAction>,
        shutdown: F,
    ) -> DriverExit
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let start = self.dashboard.start();
        if let Some(exit) = self.run_commands(start).await {
            return exit;
        }

        let mut poll = interval_at(Instant::now() + self.poll_interval, self.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut inbound_open = true;
        let mut actions_open = true;

        loop {
            let commands = tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Dashboard shutting down");
                    return DriverExit::Shutdown;
                }
                _ = poll.tick() => {
                    tracing::debug!("Poll tick");
                    self.dashboard.poll_tick()
                }
                message = inbound.recv(), if inbound_open => match message {
                    Some(message) => self.dashboard.dispatch(message, Utc::now()),
                    None => {
                        tracing::debug!("Push channel closed; polling only");
                        inbound_open = false;
                        Vec::new()
                    }
                },
                action = actions.recv(), if actions_open => match action {
                    Some(action) => self.on_action(action),
                    None => {
                        actions_open = false;
                        Vec::new()
                    }
                },
            };

            if let Some(exit) = self.run_commands(commands).await {
                return exit;
            }
        }
    }

    fn on_action(&mut self, action: UserAction) -> Vec<Command> {
        match action {
            UserAction::Link(device_id) => self.dashboard.link(&device_id),
            UserAction::Unlink => self.dashboard.unlink(true),
            UserAction::Refresh => self.dashboard.refresh(),
            UserAction::SelectRange(range) => self.dashboard.select_time_range(range),
        }
    }

    /// Execute commands in order, including any they lead to
    async fn run_commands(&mut self, commands: Vec<Command>) -> Option<DriverExit> {
        let mut queue: std::collections::VecDeque<Command> = commands.into();

        while let Some(command) = queue.pop_front() {
            if command == Command::EndSession {
                tracing::warn!("Session rejected by the server");
                return Some(DriverExit::SessionEnded);
            }
            if let Some(outcome) = execute(&self.api, command).await {
                queue.extend(self.dashboard.apply(outcome, Utc::now()));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiResult, DeviceInfo, DeviceSeries};
    use crate::channel::ServerEvent;
    use crate::dashboard::DashboardSettings;
    use crate::notice::Notice;
    use crate::vitals::VitalReading;
    use async_trait::async_trait;
    use std::cell::Cell;

    struct NullView;

    impl DashboardView for NullView {
        fn show_link_form(&mut self) {}
        fn show_dashboard(&mut self, _device: &DeviceInfo) {}
        fn render_vitals(&mut self, _panel: &crate::vitals::VitalsPanel) {}
        fn render_last_updated(&mut self, _at: Option<chrono::DateTime<Utc>>) {}
        fn render_live_chart(&mut self, _chart: &crate::chart::LiveChart) {}
        fn render_history(&mut self, _chart: &crate::chart::HistoryChart) {}
        fn render_waveform(&mut self, _trace: &crate::chart::EcgTrace) {}
        fn render_alerts(&mut self, _alerts: &crate::alerts::AlertFeed) {}
        fn render_connection(&mut self, _state: crate::channel::ConnectionState) {}
        fn set_link_pending(&mut self, _pending: bool) {}
        fn notify(&mut self, _notice: Notice) {}
    }

    struct CountingApi {
        linked: bool,
        latest_calls: Cell<u32>,
    }

    impl CountingApi {
        fn new(linked: bool) -> Self {
            Self {
                linked,
                latest_calls: Cell::new(0),
            }
        }
    }

    #[async_trait(?Send)]
    impl DeviceApi for CountingApi {
        async fn device_info(&self) -> ApiResult<Option<DeviceInfo>> {
            Ok(self.linked.then(|| DeviceInfo {
                device_id: "ESP32-001".into(),
                device_type: None,
                linked_at: None,
            }))
        }

        async fn link_device(&self, _device_id: &str) -> ApiResult<Option<DeviceInfo>> {
            Ok(None)
        }

        async fn unlink_device(&self) -> ApiResult<()> {
            Ok(())
        }

        async fn device_data(&self, _hours: u32) -> ApiResult<Option<DeviceSeries>> {
            Ok(None)
        }

        async fn latest_data(&self) -> ApiResult<Option<VitalReading>> {
            self.latest_calls.set(self.latest_calls.get() + 1);
            Ok(None)
        }
    }

    fn driver(linked: bool) -> DashboardDriver<CountingApi, NullView> {
        let dashboard = Dashboard::new(NullView, DashboardSettings::default());
        DashboardDriver::new(dashboard, CountingApi::new(linked), DEFAULT_POLL_INTERVAL)
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_every_30s_while_linked() {
        let mut driver = driver(true);
        let (_push_tx, push_rx) = mpsc::unbounded_channel();
        let (_action_tx, action_rx) = mpsc::unbounded_channel();

        let exit = driver
            .run(push_rx, action_rx, tokio::time::sleep(Duration::from_secs(95)))
            .await;

        assert_eq!(exit, DriverExit::Shutdown);
        // Initial load plus ticks at 30, 60 and 90 seconds
        assert_eq!(driver.api().latest_calls.get(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_polling_while_unlinked() {
        let mut driver = driver(false);
        let (_push_tx, push_rx) = mpsc::unbounded_channel();
        let (_action_tx, action_rx) = mpsc::unbounded_channel();

        driver
            .run(push_rx, action_rx, tokio::time::sleep(Duration::from_secs(95)))
            .await;

        assert_eq!(driver.api().latest_calls.get(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_link_action_starts_polling() {
        let mut driver = driver(false);
        let (_push_tx, push_rx) = mpsc::unbounded_channel();
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        action_tx.send(UserAction::Link("ESP32-001".into())).unwrap();

        driver
            .run(push_rx, action_rx, tokio::time::sleep(Duration::from_secs(35)))
            .await;

        assert!(driver.dashboard().is_linked());
        // Immediate fetch after linking, then the 30 s tick
        assert_eq!(driver.api().latest_calls.get(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auth_error_ends_session() {
        let mut driver = driver(true);
        let (push_tx, push_rx) = mpsc::unbounded_channel();
        let (_action_tx, action_rx) = mpsc::unbounded_channel();
        push_tx
            .send(Inbound::Event(ServerEvent::Error {
                message: "Authentication required".into(),
            }))
            .unwrap();

        let exit = driver
            .run(push_rx, action_rx, std::future::pending::<()>())
            .await;
        assert_eq!(exit, DriverExit::SessionEnded);
    }
}
