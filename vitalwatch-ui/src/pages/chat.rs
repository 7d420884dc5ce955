//! Chat Page
//!
//! Conversation with the health assistant over the push channel.

use leptos::*;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{File, FileReader, HtmlInputElement};

use vitalwatch::channel::Attachment;
use vitalwatch::chat::{Speaker, DISCLAIMER};

use crate::state::{ChatController, PushClient};

/// Chat page component
#[component]
pub fn Chat() -> impl IntoView {
    let chat = use_context::<ChatController>().expect("ChatController not found");
    let push = use_context::<PushClient>().expect("PushClient not found");
    let (input, set_input) = create_signal(String::new());

    let transcript = chat.transcript;
    let typing = chat.typing;
    let enabled = chat.input_enabled;
    let attachment = chat.attachment;

    let send = {
        let (chat, push) = (chat.clone(), push.clone());
        move || {
            if chat.send(&input.get_untracked(), &push) {
                set_input.set(String::new());
            }
        }
    };
    let send_on_enter = send.clone();

    let on_clear = {
        let (chat, push) = (chat.clone(), push.clone());
        move |_| chat.clear(&push)
    };

    let on_file = {
        let chat = chat.clone();
        move |ev: ev::Event| {
            let Some(input) = ev.target().and_then(|t| t.dyn_into::<HtmlInputElement>().ok()) else {
                return;
            };
            if let Some(file) = input.files().and_then(|files| files.get(0)) {
                read_attachment(file, chat.clone());
            }
            input.set_value("");
        }
    };

    let on_detach = move |_| chat.detach();

    view! {
        <div class="max-w-3xl mx-auto flex flex-col h-[75vh] bg-gray-800 rounded-xl">
            <div class="flex items-center justify-between px-6 py-4 border-b border-gray-700">
                <div>
                    <h1 class="text-xl font-bold">"Health Assistant"</h1>
                    <p class="text-xs text-gray-400">{DISCLAIMER}</p>
                </div>
                <button on:click=on_clear class="px-3 py-2 bg-gray-700 hover:bg-gray-600 rounded-lg text-sm">
                    "Clear"
                </button>
            </div>

            <div class="flex-1 overflow-y-auto px-6 py-4 space-y-3">
                {move || transcript.get().into_iter().map(|message| {
                    let (align, bubble) = match message.speaker {
                        Speaker::User => ("justify-end", "bg-primary-600"),
                        Speaker::Bot => ("justify-start", "bg-gray-700"),
                    };
                    let time = message.at.with_timezone(&chrono::Local).format("%H:%M").to_string();
                    view! {
                        <div class=format!("flex {}", align)>
                            <div class=format!("max-w-[75%] rounded-lg px-4 py-2 {}", bubble)>
                                {message.attachment.map(|name| view! {
                                    <div class="text-xs text-gray-300 mb-1">{format!("📎 {}", name)}</div>
                                })}
                                <p class="whitespace-pre-wrap">{message.text}</p>
                                <div class="text-[10px] text-gray-400 mt-1 text-right">{time}</div>
                            </div>
                        </div>
                    }
                }).collect_view()}

                {move || typing.get().then(|| view! {
                    <div class="text-sm text-gray-400 italic">"Assistant is typing..."</div>
                })}
            </div>

            {move || attachment.get().map(|a| view! {
                <div class="px-6 py-2 text-sm text-gray-300 flex items-center space-x-2">
                    <span>{format!("📎 {}", a.name)}</span>
                    <button on:click=on_detach.clone() class="text-red-400 hover:underline">"Remove"</button>
                </div>
            })}

            <div class="flex items-center space-x-2 px-6 py-4 border-t border-gray-700">
                <label class="cursor-pointer px-3 py-2 bg-gray-700 hover:bg-gray-600 rounded-lg">
                    "📎"
                    <input type="file" accept="image/*" class="hidden" on:change=on_file />
                </label>
                <input
                    type="text"
                    placeholder="Type your health question..."
                    class="flex-1 bg-gray-700 rounded-lg px-4 py-2 focus:outline-none focus:ring-2 focus:ring-primary-500"
                    prop:value=move || input.get()
                    on:input=move |ev| set_input.set(event_target_value(&ev))
                    on:keydown=move |ev: ev::KeyboardEvent| {
                        if ev.key() == "Enter" && !ev.shift_key() {
                            ev.prevent_default();
                            send_on_enter();
                        }
                    }
                    disabled=move || !enabled.get()
                />
                <button
                    on:click=move |_| send()
                    class="px-6 py-2 bg-primary-600 hover:bg-primary-700 rounded-lg font-medium disabled:opacity-50"
                    disabled=move || !enabled.get()
                >
                    "Send"
                </button>
            </div>
        </div>
    }
}

/// Read an image file as a data URL and hand it to the chat
fn read_attachment(file: File, chat: ChatController) {
    let reader = match FileReader::new() {
        Ok(reader) => reader,
        Err(e) => {
            web_sys::console::error_1(&format!("FileReader unavailable: {:?}", e).into());
            return;
        }
    };

    let name = file.name();
    let mime = file.type_();
    let size = file.size() as u64;

    let reader_ref = reader.clone();
    let on_load = Closure::once(move |_: web_sys::ProgressEvent| {
        let Some(data) = reader_ref.result().ok().and_then(|r| r.as_string()) else {
            web_sys::console::error_1(&"Could not read attachment".into());
            return;
        };
        chat.attach(Attachment { name, mime, data, size });
    });
    reader.set_onload(Some(on_load.as_ref().unchecked_ref()));
    on_load.forget();

    if let Err(e) = reader.read_as_data_url(&file) {
        web_sys::console::error_1(&format!("Failed to read file: {:?}", e).into());
    }
}
