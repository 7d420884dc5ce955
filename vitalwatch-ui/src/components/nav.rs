//! Navigation Component
//!
//! Header navigation bar with brand, links and logout.

use leptos::*;
use leptos_router::*;

use crate::state::GlobalState;

/// Navigation header component
#[component]
pub fn Nav() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");

    let greeting = move || {
        state
            .user()
            .map(|u| format!("Welcome, {}", u.display_name()))
            .unwrap_or_default()
    };

    view! {
        <nav class="bg-gray-800 border-b border-gray-700">
            <div class="container mx-auto px-4">
                <div class="flex items-center justify-between h-16">
                    <A href="/" class="flex items-center space-x-3">
                        <span class="text-2xl">"❤️"</span>
                        <span class="text-xl font-bold text-white">"VitalWatch"</span>
                    </A>

                    <div class="flex items-center space-x-1">
                        <NavLink href="/" label="Vitals" />
                        <NavLink href="/chat" label="Assistant" />
                        <NavLink href="/profile" label="Profile" />
                    </div>

                    <div class="flex items-center space-x-4">
                        <span class="text-sm text-gray-400">{greeting}</span>
                        <button
                            on:click=move |_| state.end_session()
                            class="px-3 py-2 rounded-lg text-sm text-gray-300 hover:text-white hover:bg-gray-700"
                        >
                            "Logout"
                        </button>
                    </div>
                </div>
            </div>
        </nav>
    }
}

/// Individual navigation link
#[component]
fn NavLink(href: &'static str, label: &'static str) -> impl IntoView {
    view! {
        <A
            href=href
            exact=true
            class="px-4 py-2 rounded-lg text-gray-300 hover:text-white hover:bg-gray-700 transition-colors"
            active_class="bg-gray-700 text-white"
        >
            {label}
        </A>
    }
}
