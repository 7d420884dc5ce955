//! HTTP API Client
//!
//! `gloo-net` implementation of the VitalWatch REST API, including the
//! [`DeviceApi`] seam the dashboard runs on.

use async_trait::async_trait;
use gloo_net::http::{Request, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use vitalwatch::api::dto::{
    AuthResponse, DeviceDataResponse, DeviceInfoResponse, LatestDataResponse, LinkRequest,
    LinkResponse, LoginRequest, MessageResponse, PreferencesUpdate, ProfileResponse,
    ProfileUpdateResponse,
};
use vitalwatch::api::{
    endpoint, ApiError, ApiResult, DeviceApi, DeviceInfo, DeviceSeries, Preferences,
    ProfileUpdate, RegisterRequest, UserProfile, DEFAULT_API_BASE,
};
use vitalwatch::VitalReading;

/// localStorage key overriding the API base URL
pub const API_URL_KEY: &str = "vitalwatch_api_url";

/// Get the API base URL from local storage or use default
pub fn get_api_base() -> String {
    let url = web_sys::window()
        .and_then(|w| w.local_storage().ok().flatten())
        .and_then(|s| s.get_item(API_URL_KEY).ok().flatten())
        .filter(|url| !url.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
    url.trim_end_matches('/').to_string()
}

/// Set the API base URL in local storage
pub fn set_api_base(url: &str) {
    if let Some(storage) = web_sys::window().and_then(|w| w.local_storage().ok().flatten()) {
        let _ = storage.set_item(API_URL_KEY, url);
    }
}

/// Server root for the push channel: the API base without its `/api` suffix
pub fn get_push_base() -> String {
    push_base(&get_api_base())
}

fn push_base(api_base: &str) -> String {
    let base = api_base.trim_end_matches('/');
    base.strip_suffix("/api").unwrap_or(base).to_string()
}

/// REST client bound to an optional bearer token
#[derive(Debug, Clone)]
pub struct HttpApi {
    base: String,
    token: Option<String>,
}

impl HttpApi {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> String {
        endpoint(&self.base, path)
    }

    fn authed(&self, builder: RequestBuilder) -> ApiResult<RequestBuilder> {
        let token = self.token.as_deref().ok_or(ApiError::Unauthorized)?;
        Ok(builder.header("Authorization", &format!("Bearer {}", token)))
    }

    // ============ Auth ============

    pub async fn register(&self, request: &RegisterRequest) -> ApiResult<AuthResponse> {
        send(Request::post(&self.url("register")).json(request)).await
    }

    pub async fn login(&self, email: &str, password: &str) -> ApiResult<AuthResponse> {
        let body = LoginRequest {
            email: email.trim().to_lowercase(),
            password: password.to_string(),
        };
        send(Request::post(&self.url("login")).json(&body)).await
    }

    // ============ Profile ============

    pub async fn profile(&self) -> ApiResult<UserProfile> {
        let builder = self.authed(Request::get(&self.url("profile")))?;
        let resp: ProfileResponse = send(builder.build()).await?;
        Ok(resp.user)
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> ApiResult<UserProfile> {
        let builder = self.authed(Request::put(&self.url("profile")))?;
        let resp: ProfileUpdateResponse = send(builder.json(update)).await?;
        Ok(resp.user)
    }

    pub async fn update_preferences(&self, preferences: Preferences) -> ApiResult<()> {
        let builder = self.authed(Request::put(&self.url("profile/preferences")))?;
        let _: MessageResponse = send(builder.json(&PreferencesUpdate { preferences })).await?;
        Ok(())
    }

    async fn get_authed<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let builder = self.authed(Request::get(&self.url(path)))?;
        send(builder.build()).await
    }
}

#[async_trait(?Send)]
impl DeviceApi for HttpApi {
    async fn device_info(&self) -> ApiResult<Option<DeviceInfo>> {
        let resp: DeviceInfoResponse = self.get_authed("device/info").await?;
        Ok(resp.into_device())
    }

    async fn link_device(&self, device_id: &str) -> ApiResult<Option<DeviceInfo>> {
        let builder = self.authed(Request::post(&self.url("device/link")))?;
        let body = LinkRequest {
            device_id: device_id.to_string(),
        };
        let resp: LinkResponse = send(builder.json(&body)).await?;
        Ok(resp.device_info)
    }

    async fn unlink_device(&self) -> ApiResult<()> {
        let builder = self.authed(Request::post(&self.url("device/unlink")))?;
        let _: MessageResponse = send(builder.json(&serde_json::json!({}))).await?;
        Ok(())
    }

    async fn device_data(&self, hours: u32) -> ApiResult<Option<DeviceSeries>> {
        let resp: DeviceDataResponse = self.get_authed(&format!("device/data?hours={}", hours)).await?;
        Ok(if resp.has_device { resp.data } else { None })
    }

    async fn latest_data(&self) -> ApiResult<Option<VitalReading>> {
        let resp: LatestDataResponse = self.get_authed("device/data/latest").await?;
        Ok(resp.into_reading())
    }
}

async fn send<T: DeserializeOwned>(request: Result<Request, gloo_net::Error>) -> ApiResult<T> {
    let request = request.map_err(|e| ApiError::Network(e.to_string()))?;
    let response = request
        .send()
        .await
        .map_err(|e| ApiError::Network(e.to_string()))?;
    decode(response).await
}

async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    if !response.ok() {
        let text = response.text().await.unwrap_or_default();
        return Err(ApiError::rejected(response.status(), &text));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| ApiError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_base_strips_api_suffix() {
        assert_eq!(push_base(DEFAULT_API_BASE), "http://localhost:5001");
        assert_eq!(push_base("https://vitals.example.com/api/"), "https://vitals.example.com");
    }

    #[test]
    fn test_push_base_without_suffix() {
        assert_eq!(push_base("https://vitals.example.com"), "https://vitals.example.com");
    }
}
