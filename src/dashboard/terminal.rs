//! Line-oriented terminal rendering of the dashboard

use chrono::{DateTime, Local, Utc};
use std::fmt;
use std::io::{self, Stdout, Write};

use super::DashboardView;
use crate::alerts::AlertFeed;
use crate::api::DeviceInfo;
use crate::channel::ConnectionState;
use crate::chart::{EcgTrace, HistoryChart, LiveChart, TimeRange};
use crate::notice::Notice;
use crate::vitals::{VitalsPanel, PLACEHOLDER};

const SPARK: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Writes each update as it happens
pub struct TerminalView<W = Stdout> {
    out: W,
}

impl TerminalView<Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, args: fmt::Arguments<'_>) {
        if let Err(e) = self.out.write_fmt(args).and_then(|_| self.out.write_all(b"\n")) {
            tracing::warn!("Failed to write to terminal: {}", e);
        }
    }
}

impl<W: Write> DashboardView for TerminalView<W> {
    fn show_link_form(&mut self) {
        self.line(format_args!("No device linked. Link one with `vitalwatch device link <ID>`."));
    }

    fn show_dashboard(&mut self, device: &DeviceInfo) {
        let kind = device.device_type.as_deref().unwrap_or("ESP32 Device");
        self.line(format_args!("Device: {} ({})", kind, device.device_id));
    }

    fn render_vitals(&mut self, panel: &VitalsPanel) {
        for card in panel.cards() {
            self.line(format_args!(
                "  {:<12} {:>8}  {}",
                card.kind.label(),
                card.value,
                card.status_text
            ));
        }
        self.line(format_args!(
            "  {:<12} {:>8}  {}",
            "Device", panel.device.value, panel.device.status_text
        ));
    }

    fn render_last_updated(&mut self, at: Option<DateTime<Utc>>) {
        match at {
            Some(at) => {
                let local = at.with_timezone(&Local);
                self.line(format_args!("Last updated: {}", local.format("%H:%M:%S")));
            }
            None => self.line(format_args!("Last updated: {}", PLACEHOLDER)),
        }
    }

    fn render_live_chart(&mut self, chart: &LiveChart) {
        if chart.is_empty() {
            return;
        }
        let heart_rate: Vec<Option<f64>> = chart.points().map(|p| p.heart_rate).collect();
        let spo2: Vec<Option<f64>> = chart.points().map(|p| p.spo2).collect();
        self.line(format_args!("  HR   {}", sparkline(&heart_rate)));
        self.line(format_args!("  SpO2 {}", sparkline(&spo2)));
    }

    fn render_history(&mut self, chart: &HistoryChart) {
        let heart_rate: Vec<f64> = chart.points.iter().filter_map(|p| p.heart_rate).collect();
        if heart_rate.is_empty() {
            self.line(format_args!("History ({}): no samples", chart.range));
            return;
        }
        let avg = heart_rate.iter().sum::<f64>() / heart_rate.len() as f64;
        let min = heart_rate.iter().copied().fold(f64::INFINITY, f64::min);
        let max = heart_rate.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        self.line(format_args!(
            "History ({}): {} samples, heart rate avg {:.0} (min {:.0}, max {:.0})",
            chart.range,
            chart.len(),
            avg,
            min,
            max
        ));
    }

    fn render_waveform(&mut self, trace: &EcgTrace) {
        if let Some((lo, hi)) = trace.bounds() {
            self.line(format_args!(
                "ECG: {} samples, {:.2}..{:.2} mV",
                trace.samples.len(),
                lo,
                hi
            ));
        }
    }

    fn render_alerts(&mut self, alerts: &AlertFeed) {
        for alert in alerts.iter() {
            self.line(format_args!(
                "{} {}: {} ({})",
                alert.kind.icon(),
                alert.title,
                alert.message,
                alert.timestamp.with_timezone(&Local).format("%H:%M:%S")
            ));
        }
    }

    fn render_connection(&mut self, state: ConnectionState) {
        self.line(format_args!("Real-time: {}", state.label()));
    }

    fn render_time_range(&mut self, range: TimeRange) {
        tracing::debug!(range = %range, "Time range selected");
    }

    fn set_link_pending(&mut self, pending: bool) {
        if pending {
            self.line(format_args!("Working..."));
        }
    }

    fn notify(&mut self, notice: Notice) {
        self.line(format_args!("{}", notice));
    }
}

/// Scale values onto block characters; gaps render as spaces
fn sparkline(values: &[Option<f64>]) -> String {
    let present = values.iter().flatten().copied();
    let (lo, hi) = present.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    let span = hi - lo;

    values
        .iter()
        .map(|v| match v {
            None => ' ',
            Some(_) if span <= 0.0 => SPARK[SPARK.len() / 2],
            Some(v) => {
                let idx = ((v - lo) / span * (SPARK.len() - 1) as f64).round() as usize;
                SPARK[idx.min(SPARK.len() - 1)]
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vitals::VitalReading;

    fn output(view: TerminalView<Vec<u8>>) -> String {
        String::from_utf8(view.into_inner()).unwrap()
    }

    #[test]
    fn test_sparkline() {
        assert_eq!(sparkline(&[Some(1.0), None, Some(8.0)]), "▁ █");
        assert_eq!(sparkline(&[Some(5.0), Some(5.0)]), "▅▅");
        assert_eq!(sparkline(&[]), "");
    }

    #[test]
    fn test_render_vitals() {
        let mut view = TerminalView::new(Vec::new());
        let reading = VitalReading {
            heart_rate_bpm: Some(72.0),
            temperature_f: Some(98.64),
            ..Default::default()
        };
        view.render_vitals(&VitalsPanel::from_reading(&reading));

        let text = output(view);
        assert!(text.contains("72  Normal"));
        assert!(text.contains("98.6°F  Normal"));
        assert!(text.contains("--  Waiting for data..."));
        assert!(text.contains("Receiving data"));
    }

    #[test]
    fn test_notify() {
        let mut view = TerminalView::new(Vec::new());
        view.notify(Notice::warning("Disconnected from real-time updates"));
        assert_eq!(output(view), "[warning] Disconnected from real-time updates\n");
    }
}
