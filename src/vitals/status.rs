//! Vitals Presentation
//!
//! Pure derivation from a [`VitalReading`] to what the vital cards show.
//! Nothing here touches a view; the dashboard hands the results to one.

use serde::{Deserialize, Serialize};

use super::reading::VitalReading;

/// Value shown when a metric is absent
pub const PLACEHOLDER: &str = "--";

/// Status text shown while a linked device has not reported a metric
pub const WAITING_TEXT: &str = "Waiting for data...";

/// Status text shown while no device is linked
pub const UNLINKED_TEXT: &str = "Device not linked";

/// Classification of one metric against its normal range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricStatus {
    Low,
    Normal,
    High,
}

impl MetricStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Normal => "Normal",
            Self::High => "High",
        }
    }
}

/// Heart rate: normal between 60 and 100 bpm inclusive
pub fn heart_rate_status(bpm: f64) -> MetricStatus {
    if bpm < 60.0 {
        MetricStatus::Low
    } else if bpm > 100.0 {
        MetricStatus::High
    } else {
        MetricStatus::Normal
    }
}

/// SpO2: anything under 95% is low, there is no high
pub fn spo2_status(percent: f64) -> MetricStatus {
    if percent < 95.0 {
        MetricStatus::Low
    } else {
        MetricStatus::Normal
    }
}

/// Body temperature in °F: normal between 97.0 and 99.5 inclusive
pub fn temperature_status(fahrenheit: f64) -> MetricStatus {
    if fahrenheit < 97.0 {
        MetricStatus::Low
    } else if fahrenheit > 99.5 {
        MetricStatus::High
    } else {
        MetricStatus::Normal
    }
}

/// The three metrics with a card on the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VitalKind {
    HeartRate,
    Spo2,
    Temperature,
}

impl VitalKind {
    pub const ALL: [VitalKind; 3] = [VitalKind::HeartRate, VitalKind::Spo2, VitalKind::Temperature];

    pub fn label(&self) -> &'static str {
        match self {
            Self::HeartRate => "Heart Rate",
            Self::Spo2 => "SpO2",
            Self::Temperature => "Temperature",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Self::HeartRate => "bpm",
            Self::Spo2 => "%",
            Self::Temperature => "°F",
        }
    }

    pub fn classify(&self, value: f64) -> MetricStatus {
        match self {
            Self::HeartRate => heart_rate_status(value),
            Self::Spo2 => spo2_status(value),
            Self::Temperature => temperature_status(value),
        }
    }

    /// Format a value the way its card displays it
    pub fn format(&self, value: f64) -> String {
        match self {
            Self::HeartRate | Self::Spo2 => format!("{:.0}", value),
            Self::Temperature => format!("{:.1}°F", value),
        }
    }

    /// Pick this metric out of a reading
    pub fn value_in(&self, reading: &VitalReading) -> Option<f64> {
        match self {
            Self::HeartRate => reading.heart_rate_bpm,
            Self::Spo2 => reading.spo2_percent,
            Self::Temperature => reading.temperature_f,
        }
    }
}

/// CSS-style class attached to a card's status line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusClass {
    Normal,
    Warning,
    Waiting,
}

impl StatusClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Warning => "warning",
            Self::Waiting => "waiting",
        }
    }
}

impl From<Option<MetricStatus>> for StatusClass {
    fn from(status: Option<MetricStatus>) -> Self {
        match status {
            Some(MetricStatus::Normal) => Self::Normal,
            Some(MetricStatus::Low | MetricStatus::High) => Self::Warning,
            None => Self::Waiting,
        }
    }
}

/// What a single vital card renders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalDisplay {
    pub kind: VitalKind,
    pub value: String,
    pub status: Option<MetricStatus>,
    pub status_text: String,
    pub class: StatusClass,
}

impl VitalDisplay {
    /// Derive a card from an optional value; absent renders as waiting
    pub fn from_value(kind: VitalKind, value: Option<f64>) -> Self {
        match value.filter(|v| v.is_finite()) {
            Some(v) => {
                let status = kind.classify(v);
                Self {
                    kind,
                    value: kind.format(v),
                    status: Some(status),
                    status_text: status.as_str().to_string(),
                    class: StatusClass::from(Some(status)),
                }
            }
            None => Self::waiting(kind),
        }
    }

    pub fn waiting(kind: VitalKind) -> Self {
        Self::placeholder(kind, WAITING_TEXT)
    }

    pub fn unlinked(kind: VitalKind) -> Self {
        Self::placeholder(kind, UNLINKED_TEXT)
    }

    fn placeholder(kind: VitalKind, text: &str) -> Self {
        Self {
            kind,
            value: PLACEHOLDER.to_string(),
            status: None,
            status_text: text.to_string(),
            class: StatusClass::Waiting,
        }
    }
}

/// The device status card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStatusDisplay {
    pub value: String,
    pub status_text: String,
    pub class: StatusClass,
}

impl DeviceStatusDisplay {
    pub fn receiving() -> Self {
        Self {
            value: "Connected".to_string(),
            status_text: "Receiving data".to_string(),
            class: StatusClass::Normal,
        }
    }

    pub fn awaiting() -> Self {
        Self {
            value: PLACEHOLDER.to_string(),
            status_text: WAITING_TEXT.to_string(),
            class: StatusClass::Waiting,
        }
    }

    pub fn unlinked() -> Self {
        Self {
            value: "Not Connected".to_string(),
            status_text: "No device linked".to_string(),
            class: StatusClass::Waiting,
        }
    }
}

/// All cards at once
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalsPanel {
    pub heart_rate: VitalDisplay,
    pub spo2: VitalDisplay,
    pub temperature: VitalDisplay,
    pub device: DeviceStatusDisplay,
}

impl VitalsPanel {
    pub fn from_reading(reading: &VitalReading) -> Self {
        Self {
            heart_rate: VitalDisplay::from_value(VitalKind::HeartRate, reading.heart_rate_bpm),
            spo2: VitalDisplay::from_value(VitalKind::Spo2, reading.spo2_percent),
            temperature: VitalDisplay::from_value(VitalKind::Temperature, reading.temperature_f),
            device: DeviceStatusDisplay::receiving(),
        }
    }

    /// Linked but nothing received yet
    pub fn waiting() -> Self {
        Self {
            heart_rate: VitalDisplay::waiting(VitalKind::HeartRate),
            spo2: VitalDisplay::waiting(VitalKind::Spo2),
            temperature: VitalDisplay::waiting(VitalKind::Temperature),
            device: DeviceStatusDisplay::awaiting(),
        }
    }

    pub fn unlinked() -> Self {
        Self {
            heart_rate: VitalDisplay::unlinked(VitalKind::HeartRate),
            spo2: VitalDisplay::unlinked(VitalKind::Spo2),
            temperature: VitalDisplay::unlinked(VitalKind::Temperature),
            device: DeviceStatusDisplay::unlinked(),
        }
    }

    pub fn cards(&self) -> [&VitalDisplay; 3] {
        [&self.heart_rate, &self.spo2, &self.temperature]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heart_rate_thresholds() {
        assert_eq!(heart_rate_status(59.9), MetricStatus::Low);
        assert_eq!(heart_rate_status(60.0), MetricStatus::Normal);
        assert_eq!(heart_rate_status(100.0), MetricStatus::Normal);
        assert_eq!(heart_rate_status(100.1), MetricStatus::High);
    }

    #[test]
    fn test_spo2_thresholds() {
        assert_eq!(spo2_status(94.9), MetricStatus::Low);
        assert_eq!(spo2_status(95.0), MetricStatus::Normal);
        assert_eq!(spo2_status(100.0), MetricStatus::Normal);
    }

    #[test]
    fn test_temperature_thresholds() {
        assert_eq!(temperature_status(96.9), MetricStatus::Low);
        assert_eq!(temperature_status(97.0), MetricStatus::Normal);
        assert_eq!(temperature_status(99.5), MetricStatus::Normal);
        assert_eq!(temperature_status(99.6), MetricStatus::High);
    }

    #[test]
    fn test_display_formatting() {
        let hr = VitalDisplay::from_value(VitalKind::HeartRate, Some(72.4));
        assert_eq!(hr.value, "72");
        assert_eq!(hr.status_text, "Normal");
        assert_eq!(hr.class, StatusClass::Normal);

        let temp = VitalDisplay::from_value(VitalKind::Temperature, Some(100.24));
        assert_eq!(temp.value, "100.2°F");
        assert_eq!(temp.status, Some(MetricStatus::High));
        assert_eq!(temp.class, StatusClass::Warning);
    }

    #[test]
    fn test_missing_value_never_renders_zero() {
        let spo2 = VitalDisplay::from_value(VitalKind::Spo2, None);
        assert_eq!(spo2.value, PLACEHOLDER);
        assert_eq!(spo2.status_text, WAITING_TEXT);
        assert_eq!(spo2.class, StatusClass::Waiting);

        let nan = VitalDisplay::from_value(VitalKind::HeartRate, Some(f64::NAN));
        assert_eq!(nan.value, PLACEHOLDER);
        assert!(nan.status.is_none());
    }

    #[test]
    fn test_panel_from_partial_reading() {
        let reading = VitalReading {
            heart_rate_bpm: Some(45.0),
            ..Default::default()
        };
        let panel = VitalsPanel::from_reading(&reading);
        assert_eq!(panel.heart_rate.status, Some(MetricStatus::Low));
        assert_eq!(panel.spo2.value, PLACEHOLDER);
        assert_eq!(panel.temperature.status_text, WAITING_TEXT);
        assert_eq!(panel.device.value, "Connected");
    }

    #[test]
    fn test_unlinked_panel() {
        let panel = VitalsPanel::unlinked();
        for card in panel.cards() {
            assert_eq!(card.value, PLACEHOLDER);
            assert_eq!(card.status_text, UNLINKED_TEXT);
        }
        assert_eq!(panel.device.value, "Not Connected");
    }
}
