//! Device Link Components
//!
//! The link form shown without a device, and the device card with its
//! unlink button.

use leptos::*;

use crate::state::{DashboardController, GlobalState};

const UNLINK_CONFIRM: &str =
    "Are you sure you want to unlink your device? This will stop real-time monitoring.";

/// Device-id entry form
#[component]
pub fn LinkForm() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let dashboard = use_context::<DashboardController>().expect("DashboardController not found");
    let signals = state.dashboard;

    let on_submit = move |ev: ev::SubmitEvent| {
        ev.prevent_default();
        dashboard.link(&signals.link_input.get_untracked());
    };

    view! {
        <section class="bg-gray-800 rounded-xl p-6 max-w-lg mx-auto">
            <h2 class="text-xl font-semibold mb-2">"Link Your Device"</h2>
            <p class="text-gray-400 text-sm mb-4">
                "Enter the ID printed on your ESP32 monitor to start receiving vital signs."
            </p>

            <form on:submit=on_submit class="flex space-x-2">
                <input
                    type="text"
                    placeholder="Device ID"
                    class="flex-1 bg-gray-700 rounded-lg px-4 py-2 focus:outline-none focus:ring-2 focus:ring-primary-500"
                    prop:value=move || signals.link_input.get()
                    on:input=move |ev| signals.link_input.set(event_target_value(&ev))
                    disabled=move || signals.link_pending.get()
                />
                <button
                    type="submit"
                    class="px-6 py-2 bg-primary-600 hover:bg-primary-700 rounded-lg font-medium disabled:opacity-50"
                    disabled=move || signals.link_pending.get()
                >
                    {move || if signals.link_pending.get() { "Linking..." } else { "Link Device" }}
                </button>
            </form>
        </section>
    }
}

/// Linked device details with the unlink control
#[component]
pub fn DeviceInfoCard() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let dashboard = use_context::<DashboardController>().expect("DashboardController not found");
    let signals = state.dashboard;

    let on_unlink = move |_| {
        let confirmed = web_sys::window()
            .and_then(|w| w.confirm_with_message(UNLINK_CONFIRM).ok())
            .unwrap_or(false);
        dashboard.unlink(confirmed);
    };

    view! {
        <div class="flex items-center justify-between bg-gray-800 rounded-xl px-6 py-4">
            {move || signals.device.get().map(|device| {
                let linked_at = device
                    .linked_at
                    .as_deref()
                    .and_then(vitalwatch::vitals::parse_timestamp_str)
                    .map(|t| t.with_timezone(&chrono::Local).format("%b %d, %Y").to_string())
                    .unwrap_or_else(|| vitalwatch::vitals::PLACEHOLDER.to_string());
                view! {
                    <div>
                        <div class="font-semibold">{device.device_type.unwrap_or_else(|| "ESP32 Device".to_string())}</div>
                        <div class="text-sm text-gray-400">
                            {format!("ID: {} · Linked {}", device.device_id, linked_at)}
                        </div>
                    </div>
                }
            })}

            <button
                on:click=on_unlink
                class="px-4 py-2 bg-red-600 hover:bg-red-700 rounded-lg text-sm font-medium disabled:opacity-50"
                disabled=move || signals.link_pending.get()
            >
                "Unlink Device"
            </button>
        </div>
    }
}
