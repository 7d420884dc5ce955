//! Login Page
//!
//! Login and registration forms; a successful response starts the session.

use leptos::*;

use vitalwatch::api::{ApiError, RegisterRequest};
use vitalwatch::profile::format_phone_number;
use vitalwatch::Session;

use crate::api::{get_api_base, HttpApi};
use crate::state::GlobalState;

const LOGIN_FAILED: &str = "Login failed";
const REGISTER_FAILED: &str = "Registration failed";

/// Login / register page
#[component]
pub fn Login() -> impl IntoView {
    let (registering, set_registering) = create_signal(false);

    view! {
        <div class="max-w-md mx-auto mt-12">
            <div class="text-center mb-8">
                <div class="text-5xl mb-2">"❤️"</div>
                <h1 class="text-3xl font-bold">"VitalWatch"</h1>
                <p class="text-gray-400 mt-1">"Real-time health monitoring"</p>
            </div>

            <div class="bg-gray-800 rounded-xl p-6">
                {move || if registering.get() {
                    view! { <RegisterForm /> }.into_view()
                } else {
                    view! { <LoginForm /> }.into_view()
                }}

                <button
                    class="w-full mt-4 text-sm text-primary-400 hover:underline"
                    on:click=move |_| set_registering.update(|r| *r = !*r)
                >
                    {move || if registering.get() {
                        "Already have an account? Log in"
                    } else {
                        "New here? Create an account"
                    }}
                </button>
            </div>
        </div>
    }
}

#[component]
fn LoginForm() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let (email, set_email) = create_signal(String::new());
    let (password, set_password) = create_signal(String::new());
    let (submitting, set_submitting) = create_signal(false);

    let on_submit = move |ev: ev::SubmitEvent| {
        ev.prevent_default();
        if email.get_untracked().trim().is_empty() || password.get_untracked().is_empty() {
            state.show_error("Please enter your email and password");
            return;
        }

        set_submitting.set(true);
        spawn_local(async move {
            let api = HttpApi::new(get_api_base());
            match api.login(&email.get_untracked(), &password.get_untracked()).await {
                Ok(auth) => state.begin_session(Session::new(auth.token, Some(auth.user))),
                Err(ApiError::Unauthorized) => state.show_error("Invalid email or password"),
                Err(e) => state.show_error(&e.user_message(LOGIN_FAILED)),
            }
            set_submitting.set(false);
        });
    };

    view! {
        <form on:submit=on_submit class="space-y-4">
            <TextField label="Email" kind="email" value=email set_value=set_email />
            <TextField label="Password" kind="password" value=password set_value=set_password />
            <SubmitButton label="Log In" busy=submitting />
        </form>
    }
}

#[component]
fn RegisterForm() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let (name, set_name) = create_signal(String::new());
    let (email, set_email) = create_signal(String::new());
    let (password, set_password) = create_signal(String::new());
    let (phone, set_phone) = create_signal(String::new());
    let (date_of_birth, set_date_of_birth) = create_signal(String::new());
    let (gender, set_gender) = create_signal(String::new());
    let (submitting, set_submitting) = create_signal(false);

    let on_submit = move |ev: ev::SubmitEvent| {
        ev.prevent_default();
        let optional = |value: String| Some(value.trim().to_string()).filter(|v| !v.is_empty());
        let request = RegisterRequest {
            email: email.get_untracked().trim().to_lowercase(),
            password: password.get_untracked(),
            name: name.get_untracked().trim().to_string(),
            phone: optional(phone.get_untracked()),
            date_of_birth: optional(date_of_birth.get_untracked()),
            gender: optional(gender.get_untracked()),
        };
        if request.email.is_empty() || request.password.is_empty() || request.name.is_empty() {
            state.show_error("Name, email and password are required");
            return;
        }

        set_submitting.set(true);
        spawn_local(async move {
            let api = HttpApi::new(get_api_base());
            match api.register(&request).await {
                Ok(auth) => {
                    state.show_success(auth.message.as_deref().unwrap_or("Registration successful"));
                    state.begin_session(Session::new(auth.token, Some(auth.user)));
                }
                Err(e) => state.show_error(&e.user_message(REGISTER_FAILED)),
            }
            set_submitting.set(false);
        });
    };

    view! {
        <form on:submit=on_submit class="space-y-4">
            <TextField label="Full name" kind="text" value=name set_value=set_name />
            <TextField label="Email" kind="email" value=email set_value=set_email />
            <TextField label="Password" kind="password" value=password set_value=set_password />
            <label class="block">
                <span class="text-sm text-gray-400">"Phone"</span>
                <input
                    type="tel"
                    class="w-full mt-1 bg-gray-700 rounded-lg px-4 py-2"
                    prop:value=move || phone.get()
                    on:input=move |ev| set_phone.set(format_phone_number(&event_target_value(&ev)))
                />
            </label>
            <TextField label="Date of birth" kind="date" value=date_of_birth set_value=set_date_of_birth />
            <label class="block">
                <span class="text-sm text-gray-400">"Gender"</span>
                <select
                    class="w-full mt-1 bg-gray-700 rounded-lg px-4 py-2"
                    on:change=move |ev| set_gender.set(event_target_value(&ev))
                >
                    <option value="">"Prefer not to say"</option>
                    <option value="male">"Male"</option>
                    <option value="female">"Female"</option>
                    <option value="other">"Other"</option>
                </select>
            </label>
            <SubmitButton label="Create Account" busy=submitting />
        </form>
    }
}

#[component]
pub(crate) fn TextField(
    label: &'static str,
    kind: &'static str,
    value: ReadSignal<String>,
    set_value: WriteSignal<String>,
) -> impl IntoView {
    view! {
        <label class="block">
            <span class="text-sm text-gray-400">{label}</span>
            <input
                type=kind
                class="w-full mt-1 bg-gray-700 rounded-lg px-4 py-2 focus:outline-none focus:ring-2 focus:ring-primary-500"
                prop:value=move || value.get()
                on:input=move |ev| set_value.set(event_target_value(&ev))
            />
        </label>
    }
}

#[component]
pub(crate) fn SubmitButton(label: &'static str, busy: ReadSignal<bool>) -> impl IntoView {
    view! {
        <button
            type="submit"
            class="w-full py-3 bg-primary-600 hover:bg-primary-700 rounded-lg font-medium disabled:opacity-50"
            disabled=move || busy.get()
        >
            {move || if busy.get() { "Please wait..." } else { label }}
        </button>
    }
}
