//! VitalWatch REST API
//!
//! Everything needed to talk to the monitoring backend.
//!
//! # Endpoints
//!
//! ## Auth (no token)
//! - `POST /register` - Create an account, returns `{token, user}`
//! - `POST /login` - Log in, returns `{token, user}`
//!
//! ## Device
//! - `GET /device/info` - Linked device, if any
//! - `POST /device/link` - Link a device by id
//! - `POST /device/unlink` - Unlink the current device
//! - `GET /device/data?hours=N` - Historical series
//! - `GET /device/data/latest` - Most recent reading
//!
//! ## Profile
//! - `GET /profile` / `PUT /profile` - Read or update the user profile
//! - `PUT /profile/preferences` - Update privacy preferences
//!
//! All device and profile routes send `Authorization: Bearer <token>`.
//!
//! [`DeviceApi`] is the seam the dashboard is driven through; the native
//! [`ApiClient`] and the browser client both implement it.

pub mod dto;
pub mod error;

#[cfg(feature = "native")]
pub mod client;

pub use dto::{
    DeviceInfo, DeviceSeries, EmergencyContact, HealthMetadata, Preferences, ProfileUpdate,
    RegisterRequest, UserProfile,
};
pub use error::{ApiError, ApiResult, NETWORK_ERROR_MESSAGE};

#[cfg(feature = "native")]
pub use client::ApiClient;

use async_trait::async_trait;

use crate::vitals::VitalReading;

/// Default backend base URL
pub const DEFAULT_API_BASE: &str = "http://localhost:5001/api";

/// Device endpoints the dashboard depends on
///
/// Futures are not `Send` so that the browser client can implement it.
#[async_trait(?Send)]
pub trait DeviceApi {
    /// `None` when no device is linked
    async fn device_info(&self) -> ApiResult<Option<DeviceInfo>>;

    async fn link_device(&self, device_id: &str) -> ApiResult<Option<DeviceInfo>>;

    async fn unlink_device(&self) -> ApiResult<()>;

    /// `None` when the backend reports no linked device
    async fn device_data(&self, hours: u32) -> ApiResult<Option<DeviceSeries>>;

    /// `None` when there is no device or no data yet
    async fn latest_data(&self) -> ApiResult<Option<VitalReading>>;
}

/// Join a base URL and a path without doubling slashes
pub fn endpoint(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_join() {
        assert_eq!(
            endpoint("http://localhost:5001/api/", "/device/info"),
            "http://localhost:5001/api/device/info"
        );
        assert_eq!(endpoint(DEFAULT_API_BASE, "login"), "http://localhost:5001/api/login");
    }
}
