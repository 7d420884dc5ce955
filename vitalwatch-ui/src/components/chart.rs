//! Chart Components
//!
//! Live, history and ECG charts drawn on HTML5 Canvas.

use leptos::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use vitalwatch::chart::TimeRange;

use crate::state::{DashboardController, GlobalState};

const HEART_RATE_COLOR: &str = "#F44336";
const SPO2_COLOR: &str = "#2196F3";
const ECG_COLOR: &str = "#4CAF50";

/// One line on a chart; `None` leaves a gap
struct Series {
    color: &'static str,
    values: Vec<Option<f64>>,
}

/// Heart rate and SpO2 as they arrive
#[component]
pub fn LiveChartView() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let canvas_ref = create_node_ref::<html::Canvas>();

    create_effect(move |_| {
        let points = state.dashboard.live.get();
        let labels: Vec<String> = points.iter().map(|p| p.label()).collect();
        let series = [
            Series {
                color: HEART_RATE_COLOR,
                values: points.iter().map(|p| p.heart_rate).collect(),
            },
            Series {
                color: SPO2_COLOR,
                values: points.iter().map(|p| p.spo2).collect(),
            },
        ];

        if let Some(canvas) = canvas_ref.get() {
            draw_series(&canvas, &labels, &series, "Waiting for data...");
        }
    });

    view! {
        <div class="relative">
            <canvas node_ref=canvas_ref width="800" height="300" class="w-full h-64 rounded-lg" />
            <Legend />
        </div>
    }
}

/// Recorded history for the selected range
#[component]
pub fn HistoryChartView() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let canvas_ref = create_node_ref::<html::Canvas>();

    create_effect(move |_| {
        let history = state.dashboard.history.get();
        let labels: Vec<String> = history
            .points
            .iter()
            .map(|p| {
                p.at.map(|t| t.with_timezone(&chrono::Local).format("%m/%d %H:%M").to_string())
                    .unwrap_or_default()
            })
            .collect();
        let series = [
            Series {
                color: HEART_RATE_COLOR,
                values: history.points.iter().map(|p| p.heart_rate).collect(),
            },
            Series {
                color: SPO2_COLOR,
                values: history.points.iter().map(|p| p.spo2).collect(),
            },
        ];

        if let Some(canvas) = canvas_ref.get() {
            draw_series(&canvas, &labels, &series, "No data for selected range");
        }
    });

    view! {
        <div class="relative">
            <canvas node_ref=canvas_ref width="800" height="300" class="w-full h-64 rounded-lg" />
            <Legend />

            <div class="flex justify-center space-x-2 mt-4">
                {TimeRange::ALL.into_iter().map(|range| view! { <TimeRangeButton range=range /> }).collect_view()}
            </div>
        </div>
    }
}

/// Most recent ECG waveform in millivolts
#[component]
pub fn EcgChart() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let canvas_ref = create_node_ref::<html::Canvas>();

    create_effect(move |_| {
        let trace = state.dashboard.waveform.get();
        let labels = vec![String::new(); trace.samples.len()];
        let series = [Series {
            color: ECG_COLOR,
            values: trace.samples.iter().copied().map(Some).collect(),
        }];

        if let Some(canvas) = canvas_ref.get() {
            draw_series(&canvas, &labels, &series, "No ECG data");
        }
    });

    view! {
        <canvas node_ref=canvas_ref width="800" height="200" class="w-full h-40 rounded-lg" />
    }
}

#[component]
fn Legend() -> impl IntoView {
    view! {
        <div class="flex justify-center flex-wrap gap-4 mt-4">
            {[("Heart Rate (BPM)", HEART_RATE_COLOR), ("SpO2 (%)", SPO2_COLOR)]
                .into_iter()
                .map(|(name, color)| view! {
                    <div class="flex items-center space-x-2">
                        <div class="w-3 h-3 rounded-full" style=format!("background-color: {}", color) />
                        <span class="text-sm text-gray-300">{name}</span>
                    </div>
                })
                .collect_view()}
        </div>
    }
}

/// Time range selection button
#[component]
fn TimeRangeButton(range: TimeRange) -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let dashboard = use_context::<DashboardController>().expect("DashboardController not found");

    let is_active = create_memo(move |_| state.dashboard.range.get() == range);
    let on_click = move |_| dashboard.select_time_range(range);

    view! {
        <button
            on:click=on_click
            class=move || {
                let base = "px-4 py-2 rounded-lg text-sm font-medium transition-colors";
                if is_active.get() {
                    format!("{} bg-primary-600 text-white", base)
                } else {
                    format!("{} bg-gray-700 text-gray-300 hover:bg-gray-600", base)
                }
            }
        >
            {range.as_str()}
        </button>
    }
}

/// Draw evenly spaced series on a canvas
fn draw_series(canvas: &HtmlCanvasElement, labels: &[String], series: &[Series], empty_message: &str) {
    let ctx = match canvas.get_context("2d") {
        Ok(Some(ctx)) => match ctx.dyn_into::<CanvasRenderingContext2d>() {
            Ok(ctx) => ctx,
            Err(_) => return,
        },
        _ => return,
    };

    let width = canvas.width() as f64;
    let height = canvas.height() as f64;

    let margin_left = 60.0;
    let margin_right = 20.0;
    let margin_top = 20.0;
    let margin_bottom = 40.0;

    let chart_width = width - margin_left - margin_right;
    let chart_height = height - margin_top - margin_bottom;

    ctx.set_fill_style(&"#1f2937".into()); // gray-800
    ctx.fill_rect(0.0, 0.0, width, height);

    let values = || series.iter().flat_map(|s| s.values.iter().flatten().copied());
    let Some((mut y_min, mut y_max)) = values().fold(None, |acc: Option<(f64, f64)>, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    }) else {
        ctx.set_fill_style(&"#6b7280".into());
        ctx.set_font("16px sans-serif");
        let _ = ctx.fill_text(empty_message, width / 2.0 - 80.0, height / 2.0);
        return;
    };

    let padding = if y_max > y_min { (y_max - y_min) * 0.1 } else { 1.0 };
    y_min -= padding;
    y_max += padding;

    // Horizontal grid with y labels
    ctx.set_stroke_style(&"#374151".into()); // gray-700
    ctx.set_line_width(1.0);
    ctx.set_font("12px sans-serif");
    for i in 0..=5 {
        let y = margin_top + (i as f64 / 5.0) * chart_height;
        ctx.begin_path();
        ctx.move_to(margin_left, y);
        ctx.line_to(width - margin_right, y);
        ctx.stroke();

        let value = y_max - (i as f64 / 5.0) * (y_max - y_min);
        ctx.set_fill_style(&"#9ca3af".into()); // gray-400
        let _ = ctx.fill_text(&format!("{:.1}", value), 5.0, y + 4.0);
    }

    let count = labels.len().max(1);
    let step = if count > 1 { chart_width / (count - 1) as f64 } else { 0.0 };
    let x_at = |i: usize| margin_left + i as f64 * step;
    let y_at = |v: f64| margin_top + ((y_max - v) / (y_max - y_min)) * chart_height;

    for s in series {
        ctx.set_stroke_style(&s.color.into());
        ctx.set_line_width(2.0);
        ctx.begin_path();

        let mut pen_down = false;
        for (i, value) in s.values.iter().enumerate() {
            match value {
                Some(v) if pen_down => ctx.line_to(x_at(i), y_at(*v)),
                Some(v) => {
                    ctx.move_to(x_at(i), y_at(*v));
                    pen_down = true;
                }
                None => pen_down = false,
            }
        }
        ctx.stroke();
    }

    // At most six x labels
    ctx.set_fill_style(&"#9ca3af".into());
    let every = (count / 6).max(1);
    for (i, label) in labels.iter().enumerate().step_by(every) {
        if !label.is_empty() {
            let _ = ctx.fill_text(label, x_at(i) - 20.0, height - 10.0);
        }
    }
}
