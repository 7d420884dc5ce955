//! # VitalWatch
//!
//! Client for a healthcare monitoring service: login and session handling,
//! a real-time vital-signs dashboard fed by an ESP32 monitoring device, an
//! assistant chat and a profile editor.
//!
//! ## Modules
//!
//! - [`session`]: Stored credential and user snapshot, the login guard
//! - [`device`]: Device link state machine
//! - [`vitals`]: Reading shape and status classification
//! - [`chart`], [`alerts`]: Live/history chart buffers and the alert list
//! - [`channel`]: Socket.IO push channel (codec, connection FSM, transport)
//! - [`dashboard`]: Sans-IO dashboard controller and its driver
//! - [`chat`], [`profile`]: Chat page and profile helpers
//! - [`api`]: Backend REST client
//!
//! The core is platform neutral. The `native` feature (default) adds the
//! reqwest client, the long-polling transport, the file session store,
//! configuration and the `vitalwatch` CLI; the browser UI builds with
//! `default-features = false`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vitalwatch::api::{ApiClient, DeviceApi};
//! use vitalwatch::api::client::ApiClientConfig;
//! use vitalwatch::vitals::VitalsPanel;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = ApiClient::new(ApiClientConfig::default())?;
//!     let auth = client.login("ada@example.com", "secret").await?;
//!     client.set_token(Some(auth.token));
//!
//!     if let Some(reading) = client.latest_data().await? {
//!         let panel = VitalsPanel::from_reading(&reading);
//!         println!("Heart rate: {} ({})", panel.heart_rate.value, panel.heart_rate.status_text);
//!     }
//!     Ok(())
//! }
//! ```

pub mod alerts;
pub mod api;
pub mod channel;
pub mod chart;
pub mod chat;
pub mod dashboard;
pub mod device;
pub mod notice;
pub mod profile;
pub mod session;
pub mod vitals;

#[cfg(feature = "native")]
pub mod config;
#[cfg(feature = "native")]
pub mod logging;

// Re-export top-level types for convenience
pub use alerts::{Alert, AlertFeed, AlertKind};

pub use api::{ApiError, ApiResult, DeviceApi, DeviceInfo, DeviceSeries, UserProfile};

pub use channel::{
    ChannelError, ClientEvent, Connection, ConnectionState, Inbound, Lifecycle, ServerEvent,
};

pub use chart::{ChartPoint, HistoryChart, LiveChart, TimeRange};

pub use chat::{ChatError, ChatSession};

pub use dashboard::{Command, Dashboard, DashboardSettings, DashboardView, Outcome};

pub use device::{DeviceLink, LinkState};

pub use notice::{Notice, NoticeLevel};

pub use session::{KeyValueStore, MemoryStore, Session, SessionError, SessionStore};

pub use vitals::{MetricStatus, VitalReading, VitalsPanel};

#[cfg(feature = "native")]
pub use api::ApiClient;

#[cfg(feature = "native")]
pub use channel::{PushChannel, PushConfig};

#[cfg(feature = "native")]
pub use config::{Config, ConfigError};

#[cfg(feature = "native")]
pub use session::FileStore;
