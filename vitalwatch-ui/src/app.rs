//! App Root Component
//!
//! Routing, global providers, and the login gate.

use leptos::*;
use leptos_router::*;

use crate::components::{Nav, Toast};
use crate::pages::{Chat, Login, Profile, Vitals};
use crate::state::global::{provide_global_state, GlobalState};
use crate::state::provide_session;

/// Root application component
#[component]
pub fn App() -> impl IntoView {
    provide_global_state();
    let state = use_context::<GlobalState>().expect("GlobalState not found");

    view! {
        <div class="min-h-screen bg-gray-900 text-white flex flex-col">
            {move || {
                if state.session.with(Option::is_some) {
                    view! { <Authenticated /> }.into_view()
                } else {
                    view! {
                        <main class="flex-1 container mx-auto px-4 py-8">
                            <Login />
                        </main>
                    }.into_view()
                }
            }}

            <Toast />
        </div>
    }
}

/// Everything behind the login gate
///
/// Rebuilt on every login, so the push channel and dashboard start fresh
/// for each session.
#[component]
fn Authenticated() -> impl IntoView {
    provide_session();

    view! {
        <Router>
            <Nav />

            <main class="flex-1 container mx-auto px-4 py-8 pb-24">
                <Routes>
                    <Route path="/" view=Vitals />
                    <Route path="/chat" view=Chat />
                    <Route path="/profile" view=Profile />
                    <Route path="/*any" view=NotFound />
                </Routes>
            </main>

            <Footer />
        </Router>
    }
}

/// Footer component showing connection status
#[component]
fn Footer() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");

    view! {
        <footer class="fixed bottom-0 left-0 right-0 bg-gray-800 border-t border-gray-700 py-3 px-4">
            <div class="container mx-auto flex items-center justify-between text-sm">
                <div class="flex items-center space-x-2">
                    {move || {
                        let connection = state.dashboard.connection.get();
                        let color = match connection.as_str() {
                            "connected" => "green",
                            "connecting" => "yellow",
                            _ => "red",
                        };
                        view! {
                            <span class=format!("flex items-center space-x-1 text-{}-400", color)>
                                <span class=format!("w-2 h-2 bg-{}-400 rounded-full", color) />
                                <span>{connection.label()}</span>
                            </span>
                        }
                    }}
                </div>

                <div class="text-gray-400">
                    {move || {
                        state.dashboard.last_updated.get()
                            .map(|dt| format!("Last updated: {}", dt.with_timezone(&chrono::Local).format("%H:%M:%S")))
                            .unwrap_or_else(|| "Last updated: --".to_string())
                    }}
                </div>
            </div>
        </footer>
    }
}

/// 404 Not Found page
#[component]
fn NotFound() -> impl IntoView {
    view! {
        <div class="flex flex-col items-center justify-center min-h-[60vh] text-center">
            <div class="text-6xl mb-4">"🔍"</div>
            <h1 class="text-3xl font-bold mb-2">"Page Not Found"</h1>
            <p class="text-gray-400 mb-6">"The page you're looking for doesn't exist."</p>
            <A
                href="/"
                class="px-6 py-3 bg-primary-600 hover:bg-primary-700 rounded-lg font-medium transition-colors"
            >
                "Go to Vitals"
            </A>
        </div>
    }
}
