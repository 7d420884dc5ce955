//! Alert Feed
//!
//! Transient alerts pushed by the backend, newest first and capped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Alerts kept on screen at once
pub const MAX_ALERTS: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    #[default]
    Info,
    Warning,
    Critical,
}

impl AlertKind {
    /// Lenient parse of the wire `type`; unknown kinds are informational
    pub fn from_wire(value: Option<&str>) -> Self {
        match value.map(str::to_ascii_lowercase).as_deref() {
            Some("warning") => Self::Warning,
            Some("critical") => Self::Critical,
            _ => Self::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::Info => "ℹ️",
            Self::Warning => "⚠️",
            Self::Critical => "🚨",
        }
    }
}

/// Alert payload as pushed under `vital_signs_update{type: "alert"}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AlertPayload {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// A displayed alert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub title: String,
    pub message: String,
    /// Receive time
    pub timestamp: DateTime<Utc>,
}

impl Alert {
    pub fn from_payload(payload: AlertPayload, received_at: DateTime<Utc>) -> Self {
        let kind = AlertKind::from_wire(payload.kind.as_deref());
        Self {
            kind,
            title: payload.title.unwrap_or_else(|| "Alert".to_string()),
            message: payload.message.unwrap_or_default(),
            timestamp: received_at,
        }
    }
}

/// Newest-first list of alerts; the oldest falls off the end
#[derive(Debug, Clone)]
pub struct AlertFeed {
    alerts: VecDeque<Alert>,
    capacity: usize,
}

impl Default for AlertFeed {
    fn default() -> Self {
        Self::new(MAX_ALERTS)
    }
}

impl AlertFeed {
    pub fn new(capacity: usize) -> Self {
        Self {
            alerts: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, alert: Alert) {
        self.alerts.push_front(alert);
        self.alerts.truncate(self.capacity);
    }

    pub fn clear(&mut self) {
        self.alerts.clear();
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.iter()
    }

    pub fn to_vec(&self) -> Vec<Alert> {
        self.alerts.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alert(n: usize) -> Alert {
        Alert {
            kind: AlertKind::Warning,
            title: format!("Alert {}", n),
            message: String::new(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_sixth_alert_evicts_oldest() {
        let mut feed = AlertFeed::default();
        for n in 1..=6 {
            feed.push(alert(n));
        }
        assert_eq!(feed.len(), MAX_ALERTS);
        let titles: Vec<_> = feed.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, ["Alert 6", "Alert 5", "Alert 4", "Alert 3", "Alert 2"]);
    }

    #[test]
    fn test_alert_from_payload() {
        let payload: AlertPayload = serde_json::from_value(serde_json::json!({
            "type": "critical",
            "title": "Low SpO2",
            "message": "SpO2 dropped to 89%"
        }))
        .unwrap();
        let a = Alert::from_payload(payload, Utc::now());
        assert_eq!(a.kind, AlertKind::Critical);
        assert_eq!(a.kind.icon(), "🚨");
        assert_eq!(a.title, "Low SpO2");
    }

    #[test]
    fn test_unknown_kind_is_info() {
        assert_eq!(AlertKind::from_wire(Some("meh")), AlertKind::Info);
        let a = Alert::from_payload(AlertPayload::default(), Utc::now());
        assert_eq!(a.title, "Alert");
    }
}
