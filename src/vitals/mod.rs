//! Vital signs: the unified reading shape and its presentation

pub mod reading;
pub mod status;

pub use reading::{celsius_to_fahrenheit, parse_timestamp, parse_timestamp_str, VitalReading};
pub use status::{
    heart_rate_status, spo2_status, temperature_status, DeviceStatusDisplay, MetricStatus,
    StatusClass, VitalDisplay, VitalKind, VitalsPanel, PLACEHOLDER, UNLINKED_TEXT, WAITING_TEXT,
};
