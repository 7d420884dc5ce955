//! Vital Cards
//!
//! One card per metric plus the device status card.

use leptos::*;

use vitalwatch::vitals::{DeviceStatusDisplay, StatusClass, VitalDisplay};

fn status_color(class: StatusClass) -> &'static str {
    match class {
        StatusClass::Normal => "text-green-400",
        StatusClass::Warning => "text-yellow-400",
        StatusClass::Waiting => "text-gray-500",
    }
}

/// Metric card
#[component]
pub fn VitalCard(
    /// Current display for this metric
    #[prop(into)]
    display: Signal<VitalDisplay>,
    icon: &'static str,
) -> impl IntoView {
    view! {
        <div class=move || format!(
            "bg-gray-800 rounded-lg p-4 border border-gray-700 vital-{}",
            display.with(|d| d.class.as_str())
        )>
            <div class="flex items-center justify-between">
                <span class="text-gray-400 text-sm">{move || display.with(|d| d.kind.label())}</span>
                <span class="text-xl">{icon}</span>
            </div>

            <div class="text-3xl font-bold mt-2">
                {move || display.with(|d| d.value.clone())}
                <span class="text-gray-500 text-sm ml-1">{move || display.with(|d| d.kind.unit())}</span>
            </div>

            <div class=move || format!("mt-2 text-sm {}", display.with(|d| status_color(d.class)))>
                {move || display.with(|d| d.status_text.clone())}
            </div>
        </div>
    }
}

/// Device status card
#[component]
pub fn DeviceCard(#[prop(into)] display: Signal<DeviceStatusDisplay>) -> impl IntoView {
    view! {
        <div class="bg-gray-800 rounded-lg p-4 border border-gray-700">
            <div class="flex items-center justify-between">
                <span class="text-gray-400 text-sm">"Device"</span>
                <span class="text-xl">"📡"</span>
            </div>
            <div class="text-2xl font-bold mt-2">{move || display.with(|d| d.value.clone())}</div>
            <div class=move || format!("mt-2 text-sm {}", display.with(|d| status_color(d.class)))>
                {move || display.with(|d| d.status_text.clone())}
            </div>
        </div>
    }
}
