//! Backend access for the browser

pub mod client;

pub use client::{get_api_base, get_push_base, set_api_base, HttpApi};
