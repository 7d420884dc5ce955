//! VitalWatch Dashboard
//!
//! Browser frontend for the VitalWatch monitoring service, built with
//! Leptos (WASM).
//!
//! # Features
//!
//! - Live vital signs from a linked ESP32 device
//! - Heart-rate/SpO2 chart, history ranges and the ECG trace
//! - Health assistant chat with image attachments
//! - Profile and privacy settings
//!
//! # Architecture
//!
//! The page logic lives in the `vitalwatch` core crate. This crate binds its
//! [`Dashboard`](vitalwatch::Dashboard) to Leptos signals, implements the
//! REST seam with `gloo-net` and runs the push channel over a browser
//! WebSocket.

use leptos::*;

mod api;
mod app;
mod components;
mod pages;
mod state;

fn main() {
    // Set up panic hook for better error messages in WASM
    console_error_panic_hook::set_once();

    mount_to_body(|| view! { <app::App /> });
}
