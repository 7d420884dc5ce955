//! Toast Notification Component

use leptos::*;

use vitalwatch::{Notice, NoticeLevel};

use crate::state::GlobalState;

/// Toast notification container
#[component]
pub fn Toast() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");

    view! {
        <div class="fixed bottom-20 right-4 z-50 space-y-2">
            {move || state.notice.get().map(|notice| view! { <ToastMessage notice=notice /> })}
        </div>
    }
}

#[component]
fn ToastMessage(notice: Notice) -> impl IntoView {
    let (icon, bg_class) = match notice.level {
        NoticeLevel::Success => ("✓", "bg-green-600"),
        NoticeLevel::Error => ("✕", "bg-red-600"),
        NoticeLevel::Warning => ("⚠", "bg-yellow-600"),
        NoticeLevel::Info => ("ℹ", "bg-blue-600"),
    };

    view! {
        <div class=format!(
            "flex items-center space-x-3 {} text-white px-4 py-3 rounded-lg shadow-lg \
             transform transition-all duration-300 ease-out animate-slide-in",
            bg_class
        )>
            <span class="text-lg">{icon}</span>
            <span class="text-sm font-medium">{notice.message}</span>
        </div>
    }
}
