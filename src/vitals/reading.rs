//! Vital Readings
//!
//! One reading shape for every source: the polled `/device/data/latest`
//! payload, pushed `device_data_update` events and the `vital_signs`
//! sub-events all deserialize into [`VitalReading`].

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Epoch values above this are treated as milliseconds
const MILLIS_THRESHOLD: i64 = 1_000_000_000_000;

/// A snapshot of a device's vital signs
///
/// Every field is optional: a device may not have reported a metric yet.
/// Non-finite values never make it into a reading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireReading")]
pub struct VitalReading {
    pub device_id: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub heart_rate_bpm: Option<f64>,
    pub spo2_percent: Option<f64>,
    pub temperature_f: Option<f64>,
    /// ECG waveform samples in millivolts
    pub waveform: Vec<f64>,
}

impl VitalReading {
    /// True when none of the displayed metrics is present
    pub fn is_empty(&self) -> bool {
        self.heart_rate_bpm.is_none() && self.spo2_percent.is_none() && self.temperature_f.is_none()
    }

    pub fn has_waveform(&self) -> bool {
        !self.waveform.is_empty()
    }

    /// Parse a reading from an arbitrary JSON payload
    pub fn from_json(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

/// Convert Celsius to Fahrenheit
pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

/// Wire representation accepting every field spelling the backend uses
#[derive(Debug, Default, Deserialize)]
struct WireReading {
    #[serde(default)]
    device_id: Option<String>,
    #[serde(default)]
    timestamp: Option<serde_json::Value>,
    #[serde(default, alias = "heart_rate")]
    heart_rate_bpm: Option<f64>,
    #[serde(default, alias = "spo2")]
    spo2_percent: Option<f64>,
    #[serde(default, alias = "temperature")]
    temperature_f: Option<f64>,
    #[serde(default)]
    temperature_c: Option<f64>,
    #[serde(default, alias = "ecg_mV", alias = "waveform")]
    ecg_data: Option<Vec<f64>>,
}

impl From<WireReading> for VitalReading {
    fn from(wire: WireReading) -> Self {
        let temperature_f = finite(wire.temperature_f)
            .or_else(|| finite(wire.temperature_c).map(celsius_to_fahrenheit));

        Self {
            device_id: wire.device_id.filter(|id| !id.is_empty()),
            timestamp: wire.timestamp.as_ref().and_then(parse_timestamp),
            heart_rate_bpm: finite(wire.heart_rate_bpm),
            spo2_percent: finite(wire.spo2_percent),
            temperature_f,
            waveform: wire
                .ecg_data
                .unwrap_or_default()
                .into_iter()
                .filter(|v| v.is_finite())
                .collect(),
        }
    }
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Parse the timestamp formats seen on the wire
///
/// Accepts RFC 3339, naive ISO-8601 (assumed UTC, as the backend emits
/// `datetime.utcnow().isoformat()`), and epoch seconds or milliseconds.
pub fn parse_timestamp(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    match value {
        serde_json::Value::String(s) => parse_timestamp_str(s),
        serde_json::Value::Number(n) => {
            let raw = match n.as_i64() {
                Some(raw) => raw,
                None => {
                    let f = n.as_f64().filter(|f| f.is_finite())?;
                    // `as` saturates; out-of-range floats are not timestamps
                    if f < i64::MIN as f64 || f >= i64::MAX as f64 {
                        return None;
                    }
                    f as i64
                }
            };
            if raw.unsigned_abs() > MILLIS_THRESHOLD.unsigned_abs() {
                DateTime::from_timestamp_millis(raw)
            } else {
                DateTime::from_timestamp(raw, 0)
            }
        }
        _ => None,
    }
}

/// String form of [`parse_timestamp`]
pub fn parse_timestamp_str(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use serde_json::json;

    #[test]
    fn test_polled_shape() {
        let reading = VitalReading::from_json(json!({
            "device_id": "ESP32-001",
            "timestamp": "2024-05-01T10:15:30.250000",
            "temperature_c": 37.0,
            "temperature_f": 98.6,
            "heart_rate_bpm": 72,
            "spo2_percent": 98,
            "ecg_data": [0.1, 0.4, -0.2]
        }))
        .unwrap();

        assert_eq!(reading.device_id.as_deref(), Some("ESP32-001"));
        assert_eq!(reading.heart_rate_bpm, Some(72.0));
        assert_eq!(reading.spo2_percent, Some(98.0));
        assert_eq!(reading.temperature_f, Some(98.6));
        assert_eq!(reading.waveform.len(), 3);
        assert_eq!(reading.timestamp.unwrap().minute(), 15);
    }

    #[test]
    fn test_pushed_shape_converts_celsius() {
        let reading = VitalReading::from_json(json!({
            "device_id": "ESP32-001",
            "timestamp": 1714558530,
            "temperature_c": 37.0,
            "heart_rate_bpm": null,
            "spo2_percent": 97,
            "ecg_data": []
        }))
        .unwrap();

        assert_eq!(reading.heart_rate_bpm, None);
        let temp = reading.temperature_f.unwrap();
        assert!((temp - 98.6).abs() < 1e-9);
        assert!(!reading.has_waveform());
        assert!(reading.timestamp.is_some());
    }

    #[test]
    fn test_legacy_field_names() {
        let reading = VitalReading::from_json(json!({
            "heart_rate": 55,
            "spo2": 93,
            "temperature": 100.2
        }))
        .unwrap();

        assert_eq!(reading.heart_rate_bpm, Some(55.0));
        assert_eq!(reading.spo2_percent, Some(93.0));
        assert_eq!(reading.temperature_f, Some(100.2));
        assert_eq!(reading.device_id, None);
    }

    #[test]
    fn test_empty_payload_is_empty_reading() {
        let reading = VitalReading::from_json(json!({})).unwrap();
        assert!(reading.is_empty());
        assert_eq!(reading, VitalReading::default());
    }

    #[test]
    fn test_timestamp_variants() {
        let millis = parse_timestamp(&json!(1714558530123_i64)).unwrap();
        assert_eq!(millis.timestamp_millis(), 1714558530123);

        let rfc = parse_timestamp(&json!("2024-05-01T10:15:30+02:00")).unwrap();
        assert_eq!(rfc.hour(), 8);

        assert!(parse_timestamp(&json!("yesterday-ish")).is_none());
        assert!(parse_timestamp(&json!(true)).is_none());
    }

    #[test]
    fn test_out_of_range_epoch_is_dropped() {
        assert!(parse_timestamp(&json!(-1e30)).is_none());
        assert!(parse_timestamp(&json!(1e300)).is_none());
        assert!(parse_timestamp(&json!(i64::MIN)).is_none());

        let reading = VitalReading::from_json(json!({
            "device_id": "ESP32-001",
            "timestamp": i64::MIN,
            "heart_rate_bpm": 72
        }))
        .unwrap();
        assert_eq!(reading.timestamp, None);
        assert_eq!(reading.heart_rate_bpm, Some(72.0));
    }

    #[test]
    fn test_serialized_reading_reads_back() {
        let reading = VitalReading {
            device_id: Some("ESP32-001".into()),
            timestamp: None,
            heart_rate_bpm: Some(80.0),
            spo2_percent: None,
            temperature_f: Some(99.1),
            waveform: vec![0.5],
        };
        let value = serde_json::to_value(&reading).unwrap();
        assert_eq!(VitalReading::from_json(value).unwrap(), reading);
    }
}
