//! Vitals Page
//!
//! Live vital signs for the linked device, or the link form without one.

use leptos::*;

use crate::components::{
    AlertList, DeviceCard, DeviceInfoCard, EcgChart, HistoryChartView, LinkForm, LiveChartView,
    VitalCard,
};
use crate::state::{DashboardController, GlobalState, PageMode};

/// Vitals page component
#[component]
pub fn Vitals() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");

    view! {
        <div class="space-y-8">
            <div>
                <h1 class="text-3xl font-bold">"Vital Signs"</h1>
                <p class="text-gray-400 mt-1">"Real-time readings from your monitoring device"</p>
            </div>

            {move || match state.dashboard.mode.get() {
                PageMode::Loading => view! {
                    <div class="h-64 flex items-center justify-center">
                        <div class="loading-spinner w-8 h-8" />
                    </div>
                }.into_view(),
                PageMode::LinkForm => view! { <LinkForm /> }.into_view(),
                PageMode::Dashboard => view! { <LinkedDashboard /> }.into_view(),
            }}
        </div>
    }
}

#[component]
fn LinkedDashboard() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let dashboard = use_context::<DashboardController>().expect("DashboardController not found");
    let panel = state.dashboard.panel;

    view! {
        <DeviceInfoCard />

        <section>
            <div class="flex items-center justify-between mb-4">
                <h2 class="text-lg font-semibold">"Current Readings"</h2>
                <button
                    on:click=move |_| dashboard.refresh()
                    class="px-4 py-2 bg-gray-700 hover:bg-gray-600 rounded-lg text-sm"
                >
                    "↻ Refresh"
                </button>
            </div>
            <div class="grid grid-cols-2 md:grid-cols-4 gap-4">
                <VitalCard display=Signal::derive(move || panel.with(|p| p.heart_rate.clone())) icon="💓" />
                <VitalCard display=Signal::derive(move || panel.with(|p| p.spo2.clone())) icon="🫁" />
                <VitalCard display=Signal::derive(move || panel.with(|p| p.temperature.clone())) icon="🌡️" />
                <DeviceCard display=Signal::derive(move || panel.with(|p| p.device.clone())) />
            </div>
        </section>

        <section class="bg-gray-800 rounded-xl p-6">
            <h2 class="text-xl font-semibold mb-4">"Live Trend"</h2>
            <LiveChartView />
        </section>

        <div class="grid md:grid-cols-2 gap-8">
            <section class="bg-gray-800 rounded-xl p-6">
                <h2 class="text-xl font-semibold mb-4">"ECG"</h2>
                <EcgChart />
            </section>

            <section class="bg-gray-800 rounded-xl p-6">
                <h2 class="text-xl font-semibold mb-4">"Alerts"</h2>
                <AlertList />
            </section>
        </div>

        <section class="bg-gray-800 rounded-xl p-6">
            <h2 class="text-xl font-semibold mb-4">"History"</h2>
            <HistoryChartView />
        </section>
    }
}
