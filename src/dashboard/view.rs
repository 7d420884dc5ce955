//! Dashboard view interface
//!
//! Everything the dashboard shows goes through this trait, bound once when
//! the [`Dashboard`](super::Dashboard) is built. The terminal renderer and
//! the browser UI each implement it.

use chrono::{DateTime, Utc};

use crate::alerts::AlertFeed;
use crate::api::DeviceInfo;
use crate::channel::ConnectionState;
use crate::chart::{EcgTrace, HistoryChart, LiveChart, TimeRange};
use crate::notice::Notice;
use crate::vitals::VitalsPanel;

pub trait DashboardView {
    /// Show the link form and hide the dashboard sections
    fn show_link_form(&mut self);

    /// Show the dashboard sections for a linked device
    fn show_dashboard(&mut self, device: &DeviceInfo);

    fn render_vitals(&mut self, panel: &VitalsPanel);

    /// `None` renders the placeholder
    fn render_last_updated(&mut self, at: Option<DateTime<Utc>>);

    fn render_live_chart(&mut self, chart: &LiveChart);

    fn render_history(&mut self, chart: &HistoryChart);

    fn render_waveform(&mut self, trace: &EcgTrace);

    fn render_alerts(&mut self, alerts: &AlertFeed);

    fn render_connection(&mut self, state: ConnectionState);

    fn render_time_range(&mut self, _range: TimeRange) {}

    /// Disable or re-enable the link/unlink controls
    fn set_link_pending(&mut self, pending: bool);

    /// Reset the device-id input
    fn clear_link_input(&mut self) {}

    fn notify(&mut self, notice: Notice);
}
