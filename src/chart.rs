//! Chart Buffers
//!
//! The data behind the dashboard charts: a rolling live buffer fed by push
//! and poll updates, the historical series for the selected time range, and
//! the latest ECG trace. Rendering is left to the view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use crate::api::DeviceSeries;
use crate::vitals::{parse_timestamp_str, VitalReading};

/// Points kept in the live chart
pub const LIVE_CHART_CAPACITY: usize = 20;

/// One point on the live chart; absent metrics stay absent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub at: DateTime<Utc>,
    pub heart_rate: Option<f64>,
    pub spo2: Option<f64>,
    pub temperature: Option<f64>,
}

impl ChartPoint {
    pub fn from_reading(reading: &VitalReading, at: DateTime<Utc>) -> Self {
        Self {
            at,
            heart_rate: reading.heart_rate_bpm,
            spo2: reading.spo2_percent,
            temperature: reading.temperature_f,
        }
    }

    /// Label shown on the x axis
    pub fn label(&self) -> String {
        self.at.format("%H:%M:%S").to_string()
    }
}

/// Rolling buffer for the live chart, oldest point first
#[derive(Debug, Clone)]
pub struct LiveChart {
    points: VecDeque<ChartPoint>,
    capacity: usize,
}

impl Default for LiveChart {
    fn default() -> Self {
        Self::new(LIVE_CHART_CAPACITY)
    }
}

impl LiveChart {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a point, evicting the oldest beyond capacity
    pub fn push(&mut self, point: ChartPoint) {
        self.points.push_back(point);
        while self.points.len() > self.capacity {
            self.points.pop_front();
        }
    }

    /// Replace the buffer with the tail of a historical series
    pub fn seed_from_history(&mut self, history: &HistoryChart) {
        self.points.clear();
        let skip = history.points.len().saturating_sub(self.capacity);
        for p in history.points.iter().skip(skip) {
            if let Some(at) = p.at {
                self.points.push_back(ChartPoint {
                    at,
                    heart_rate: p.heart_rate,
                    spo2: p.spo2,
                    temperature: p.temperature,
                });
            }
        }
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn points(&self) -> impl Iterator<Item = &ChartPoint> {
        self.points.iter()
    }

    pub fn latest(&self) -> Option<&ChartPoint> {
        self.points.back()
    }

    pub fn to_vec(&self) -> Vec<ChartPoint> {
        self.points.iter().cloned().collect()
    }
}

/// Selectable history windows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "6h")]
    SixHours,
    #[default]
    #[serde(rename = "24h")]
    Day,
    #[serde(rename = "7d")]
    Week,
}

impl TimeRange {
    pub const ALL: [TimeRange; 4] = [Self::OneHour, Self::SixHours, Self::Day, Self::Week];

    pub fn hours(&self) -> u32 {
        match self {
            Self::OneHour => 1,
            Self::SixHours => 6,
            Self::Day => 24,
            Self::Week => 168,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneHour => "1h",
            Self::SixHours => "6h",
            Self::Day => "24h",
            Self::Week => "7d",
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown time range: {} (expected 1h, 6h, 24h or 7d)", s))
    }
}

/// One historical sample; `0` from the backend becomes `None`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub at: Option<DateTime<Utc>>,
    pub heart_rate: Option<f64>,
    pub spo2: Option<f64>,
    pub temperature: Option<f64>,
}

/// History chart for the selected range
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryChart {
    pub range: TimeRange,
    pub points: Vec<HistoryPoint>,
}

impl HistoryChart {
    pub fn from_series(range: TimeRange, series: &DeviceSeries) -> Self {
        let points = (0..series.len())
            .map(|i| HistoryPoint {
                at: series
                    .timestamps
                    .get(i)
                    .and_then(|t| t.as_deref())
                    .and_then(parse_timestamp_str),
                heart_rate: sample(&series.heart_rate, i),
                spo2: sample(&series.spo2, i),
                temperature: sample(&series.temperature, i),
            })
            .collect();

        Self { range, points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }
}

fn sample(values: &[Option<f64>], i: usize) -> Option<f64> {
    values
        .get(i)
        .copied()
        .flatten()
        .filter(|v| v.is_finite() && *v != 0.0)
}

/// Latest ECG waveform
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EcgTrace {
    pub samples: Vec<f64>,
    pub at: Option<DateTime<Utc>>,
}

impl EcgTrace {
    pub fn new(samples: Vec<f64>, at: Option<DateTime<Utc>>) -> Self {
        Self {
            samples: samples.into_iter().filter(|v| v.is_finite()).collect(),
            at,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Min and max sample, for axis scaling
    pub fn bounds(&self) -> Option<(f64, f64)> {
        self.samples.iter().fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }
}
