//! Alert List Component

use leptos::*;

use vitalwatch::alerts::AlertKind;

use crate::state::GlobalState;

/// Recent alerts, newest first
#[component]
pub fn AlertList() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");

    view! {
        <div class="space-y-2">
            {move || {
                let alerts = state.dashboard.alerts.get();
                if alerts.is_empty() {
                    return view! {
                        <p class="text-gray-400 text-sm">"No recent alerts"</p>
                    }.into_view();
                }

                alerts.into_iter().map(|alert| {
                    let border = match alert.kind {
                        AlertKind::Critical => "border-red-500",
                        AlertKind::Warning => "border-yellow-500",
                        AlertKind::Info => "border-blue-500",
                    };
                    let time = alert.timestamp.with_timezone(&chrono::Local).format("%H:%M:%S").to_string();

                    view! {
                        <div class=format!("flex items-start space-x-3 py-2 px-3 bg-gray-900 rounded border-l-4 {}", border)>
                            <span class="text-xl">{alert.kind.icon()}</span>
                            <div class="flex-1">
                                <div class="flex items-center justify-between">
                                    <span class="font-semibold">{alert.title}</span>
                                    <span class="text-gray-400 text-xs">{time}</span>
                                </div>
                                <p class="text-sm text-gray-300">{alert.message}</p>
                            </div>
                        </div>
                    }
                }).collect_view()
            }}
        </div>
    }
}
