//! Profile Page
//!
//! Personal and health details, privacy preferences and the server URL.

use leptos::*;

use vitalwatch::api::{ApiError, EmergencyContact, Preferences};
use vitalwatch::profile::{
    format_phone_number, Bmi, ProfileForm, BMI_PROMPT, PREFERENCES_UPDATED_MESSAGE,
    PROFILE_LOAD_FAILED_MESSAGE, PROFILE_UPDATED_MESSAGE, PROFILE_UPDATE_FAILED_MESSAGE,
};

use crate::api::{self, HttpApi};
use crate::state::GlobalState;

/// Profile page component
#[component]
pub fn Profile() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let client = use_context::<HttpApi>().expect("HttpApi not found");

    let form = create_rw_signal(None::<ProfileForm>);
    let preferences = create_rw_signal(Preferences::default());
    // Editing must not rebuild the editor
    let loaded = create_memo(move |_| form.with(Option::is_some));

    let loader = client.clone();
    spawn_local(async move {
        match loader.profile().await {
            Ok(profile) => {
                preferences.set(
                    profile
                        .metadata
                        .as_ref()
                        .and_then(|m| m.preferences)
                        .unwrap_or_default(),
                );
                form.set(Some(ProfileForm::from_profile(&profile)));
                state.update_user(profile);
            }
            Err(ApiError::Unauthorized) => state.end_session(),
            Err(e) => state.show_error(&e.user_message(PROFILE_LOAD_FAILED_MESSAGE)),
        }
    });

    view! {
        <div class="space-y-8">
            <div>
                <h1 class="text-3xl font-bold">"Profile"</h1>
                <p class="text-gray-400 mt-1">"Your personal and health information"</p>
            </div>

            {move || match loaded.get() {
                true => view! { <ProfileEditor form=form client=client.clone() /> }.into_view(),
                false => view! {
                    <div class="h-32 flex items-center justify-center">
                        <div class="loading-spinner w-8 h-8" />
                    </div>
                }.into_view(),
            }}

            <PrivacySettings preferences=preferences />

            <ServerSettings />
        </div>
    }
}

#[component]
fn ProfileEditor(form: RwSignal<Option<ProfileForm>>, client: HttpApi) -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let (saving, set_saving) = create_signal(false);

    let bmi = move || {
        form.with(|f| {
            match f.as_ref().and_then(|f| Bmi::from_metadata(&f.metadata)) {
                Some(bmi) => format!("{:.1} ({})", bmi.value, bmi.category.label()),
                None => BMI_PROMPT.to_string(),
            }
        })
    };

    let on_submit = move |ev: ev::SubmitEvent| {
        ev.prevent_default();
        let Some(current) = form.get_untracked() else { return };
        let update = current.into_update();
        let client = client.clone();

        set_saving.set(true);
        spawn_local(async move {
            match client.update_profile(&update).await {
                Ok(user) => {
                    form.set(Some(ProfileForm::from_profile(&user)));
                    state.update_user(user);
                    state.show_success(PROFILE_UPDATED_MESSAGE);
                }
                Err(ApiError::Unauthorized) => state.end_session(),
                Err(e) => state.show_error(&e.user_message(PROFILE_UPDATE_FAILED_MESSAGE)),
            }
            set_saving.set(false);
        });
    };

    view! {
        <form on:submit=on_submit class="space-y-8">
            <section class="bg-gray-800 rounded-xl p-6 grid md:grid-cols-2 gap-4">
                <h2 class="md:col-span-2 text-xl font-semibold">"Personal"</h2>
                {text_field(form, "Full name", |f| f.name.clone(), |f, v| f.name = v)}
                {text_field(form, "Phone", |f| f.phone.clone(), |f, v| f.phone = format_phone_number(&v))}
                {text_field(form, "Date of birth (YYYY-MM-DD)", |f| f.date_of_birth.clone(), |f, v| f.date_of_birth = v)}
                {text_field(form, "Gender", |f| f.gender.clone(), |f, v| f.gender = v)}
            </section>

            <section class="bg-gray-800 rounded-xl p-6 grid md:grid-cols-2 gap-4">
                <h2 class="md:col-span-2 text-xl font-semibold">"Health"</h2>
                {text_field(
                    form,
                    "Height (cm)",
                    |f| f.metadata.height.map(|h| h.to_string()).unwrap_or_default(),
                    |f, v| f.metadata.height = v.trim().parse().ok(),
                )}
                {text_field(
                    form,
                    "Weight (kg)",
                    |f| f.metadata.weight.map(|w| w.to_string()).unwrap_or_default(),
                    |f, v| f.metadata.weight = v.trim().parse().ok(),
                )}
                <div class="md:col-span-2 text-sm">
                    <span class="text-gray-400">"BMI: "</span>
                    <span class="font-semibold">{bmi}</span>
                </div>
                {text_field(form, "Blood type", |f| f.metadata.blood_type.clone().unwrap_or_default(), |f, v| f.metadata.blood_type = Some(v))}
                {text_field(form, "Allergies", |f| f.metadata.allergies.clone().unwrap_or_default(), |f, v| f.metadata.allergies = Some(v))}
                {text_field(form, "Medications", |f| f.metadata.medications.clone().unwrap_or_default(), |f, v| f.metadata.medications = Some(v))}
                {text_field(
                    form,
                    "Medical conditions",
                    |f| f.metadata.medical_conditions.clone().unwrap_or_default(),
                    |f, v| f.metadata.medical_conditions = Some(v),
                )}
            </section>

            <section class="bg-gray-800 rounded-xl p-6 grid md:grid-cols-3 gap-4">
                <h2 class="md:col-span-3 text-xl font-semibold">"Emergency Contact"</h2>
                {text_field(
                    form,
                    "Name",
                    |f| contact(f).name.clone().unwrap_or_default(),
                    |f, v| contact_mut(f).name = Some(v),
                )}
                {text_field(
                    form,
                    "Relationship",
                    |f| contact(f).relationship.clone().unwrap_or_default(),
                    |f, v| contact_mut(f).relationship = Some(v),
                )}
                {text_field(
                    form,
                    "Phone",
                    |f| contact(f).phone.clone().unwrap_or_default(),
                    |f, v| contact_mut(f).phone = Some(format_phone_number(&v)),
                )}
            </section>

            <button
                type="submit"
                class="px-6 py-3 bg-primary-600 hover:bg-primary-700 rounded-lg font-medium disabled:opacity-50"
                disabled=move || saving.get()
            >
                {move || if saving.get() { "Saving..." } else { "Save Profile" }}
            </button>
        </form>
    }
}

/// Text input bound to one string of the form
fn text_field(
    form: RwSignal<Option<ProfileForm>>,
    label: &'static str,
    get: fn(&ProfileForm) -> String,
    set: fn(&mut ProfileForm, String),
) -> impl IntoView {
    view! {
        <label class="block">
            <span class="text-sm text-gray-400">{label}</span>
            <input
                type="text"
                class="w-full mt-1 bg-gray-700 rounded-lg px-4 py-2"
                prop:value=move || form.with(|f| f.as_ref().map(get).unwrap_or_default())
                on:input=move |ev| {
                    let value = event_target_value(&ev);
                    form.update(|f| {
                        if let Some(f) = f {
                            set(f, value);
                        }
                    });
                }
            />
        </label>
    }
}

fn contact(form: &ProfileForm) -> EmergencyContact {
    form.metadata.emergency_contact.clone().unwrap_or_default()
}

fn contact_mut(form: &mut ProfileForm) -> &mut EmergencyContact {
    form.metadata.emergency_contact.get_or_insert_with(Default::default)
}

/// Privacy toggles, saved on change
#[component]
fn PrivacySettings(preferences: RwSignal<Preferences>) -> impl IntoView {
    view! {
        <section class="bg-gray-800 rounded-xl p-6">
            <h2 class="text-xl font-semibold mb-4">"Privacy"</h2>
            {privacy_toggle(preferences, "Marketing emails", |p| p.marketing_emails, |p, on| p.marketing_emails = on)}
            {privacy_toggle(preferences, "SMS notifications", |p| p.sms_notifications, |p, on| p.sms_notifications = on)}
            {privacy_toggle(
                preferences,
                "Share anonymized data for research",
                |p| p.data_sharing,
                |p, on| p.data_sharing = on,
            )}
        </section>
    }
}

fn privacy_toggle(
    preferences: RwSignal<Preferences>,
    label: &'static str,
    get: fn(&Preferences) -> bool,
    change: fn(&mut Preferences, bool),
) -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let client = use_context::<HttpApi>().expect("HttpApi not found");

    let on_change = move |ev: ev::Event| {
        let on = event_target_checked(&ev);
        let previous = preferences.get_untracked();
        preferences.update(|p| change(p, on));
        let next = preferences.get_untracked();
        let client = client.clone();

        spawn_local(async move {
            match client.update_preferences(next).await {
                Ok(()) => state.show_success(PREFERENCES_UPDATED_MESSAGE),
                Err(ApiError::Unauthorized) => state.end_session(),
                Err(e) => {
                    // Roll the checkbox back
                    preferences.set(previous);
                    state.show_error(&e.user_message("Failed to update privacy settings"));
                }
            }
        });
    };

    view! {
        <label class="flex items-center justify-between py-2">
            <span>{label}</span>
            <input type="checkbox" prop:checked=move || preferences.with(get) on:change=on_change />
        </label>
    }
}

/// Backend URL, stored in localStorage
#[component]
fn ServerSettings() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let (api_url, set_api_url) = create_signal(api::get_api_base());

    let save_url = move |_| {
        api::set_api_base(&api_url.get_untracked());
        state.show_success("API URL saved. Log in again to reconnect.");
    };

    view! {
        <section class="bg-gray-800 rounded-xl p-6">
            <h2 class="text-xl font-semibold mb-4">"Server"</h2>
            <label class="block text-sm text-gray-400 mb-2">"VitalWatch API URL"</label>
            <div class="flex space-x-2">
                <input
                    type="text"
                    prop:value=move || api_url.get()
                    on:input=move |ev| set_api_url.set(event_target_value(&ev))
                    class="flex-1 bg-gray-700 rounded-lg px-4 py-3 border border-gray-600 focus:border-primary-500 focus:outline-none"
                />
                <button
                    on:click=save_url
                    class="px-4 py-3 bg-primary-600 hover:bg-primary-700 rounded-lg font-medium transition-colors"
                >
                    "Save"
                </button>
            </div>
        </section>
    }
}
