//! Dashboard state
//!
//! Everything the vitals page knows, in one value owned by the
//! [`Dashboard`](super::Dashboard).

use chrono::{DateTime, Utc};

use crate::alerts::AlertFeed;
use crate::channel::ConnectionState;
use crate::chart::{EcgTrace, HistoryChart, LiveChart, TimeRange};
use crate::device::DeviceLink;
use crate::vitals::{VitalReading, VitalsPanel};

/// Dashboard tunables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardSettings {
    /// Live chart capacity
    pub live_points: usize,
    pub max_alerts: usize,
    pub default_range: TimeRange,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            live_points: crate::chart::LIVE_CHART_CAPACITY,
            max_alerts: crate::alerts::MAX_ALERTS,
            default_range: TimeRange::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DashboardState {
    pub link: DeviceLink,
    pub panel: VitalsPanel,
    /// Last reading applied to the panel
    pub latest: Option<VitalReading>,
    pub last_updated: Option<DateTime<Utc>>,
    pub live: LiveChart,
    pub history: HistoryChart,
    pub range: TimeRange,
    pub ecg: EcgTrace,
    pub alerts: AlertFeed,
    pub connection: ConnectionState,
}

impl DashboardState {
    pub fn new(settings: DashboardSettings) -> Self {
        Self {
            link: DeviceLink::new(),
            panel: VitalsPanel::waiting(),
            latest: None,
            last_updated: None,
            live: LiveChart::new(settings.live_points),
            history: HistoryChart {
                range: settings.default_range,
                points: Vec::new(),
            },
            range: settings.default_range,
            ecg: EcgTrace::default(),
            alerts: AlertFeed::new(settings.max_alerts),
            connection: ConnectionState::default(),
        }
    }

    /// Drop every device-derived value and show the unlinked placeholders
    pub fn reset_readings(&mut self) {
        self.panel = VitalsPanel::unlinked();
        self.latest = None;
        self.last_updated = None;
        self.live.clear();
        self.history.points.clear();
        self.ecg = EcgTrace::default();
        self.alerts.clear();
    }
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new(DashboardSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_waits() {
        let state = DashboardState::default();
        assert_eq!(state.panel, VitalsPanel::waiting());
        assert_eq!(state.live.capacity(), 20);
        assert_eq!(state.range, TimeRange::Day);
        assert_eq!(state.connection, ConnectionState::Connecting);
    }

    #[test]
    fn test_reset_readings() {
        let mut state = DashboardState::default();
        state.latest = Some(VitalReading::default());
        state.last_updated = Some(Utc::now());
        state.reset_readings();

        assert_eq!(state.panel, VitalsPanel::unlinked());
        assert!(state.latest.is_none());
        assert!(state.last_updated.is_none());
        assert!(state.live.is_empty());
    }
}
