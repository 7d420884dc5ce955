//! Pages
//!
//! Top-level page components for each route.

pub mod chat;
pub mod login;
pub mod profile;
pub mod vitals;

pub use chat::Chat;
pub use login::Login;
pub use profile::Profile;
pub use vitals::Vitals;
