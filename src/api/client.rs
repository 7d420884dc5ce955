//! Backend REST API Client
//!
//! reqwest client for the monitoring backend. Holds the bearer token of the
//! current session and maps every failure onto [`ApiError`].

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use super::dto::{
    AuthResponse, DeviceDataResponse, DeviceInfo, DeviceInfoResponse, DeviceSeries,
    LatestDataResponse, LinkRequest, LinkResponse, LoginRequest, MessageResponse, Preferences,
    PreferencesUpdate, ProfileResponse, ProfileUpdate, ProfileUpdateResponse, RegisterRequest,
    UserProfile,
};
use super::error::{ApiError, ApiResult};
use super::{endpoint, DeviceApi};
use crate::vitals::VitalReading;

/// Backend REST API client
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    config: ApiClientConfig,
    token: Option<String>,
}

/// Configuration for the API client
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL including the `/api` prefix
    pub base_url: String,
    /// Request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: super::DEFAULT_API_BASE.to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl ApiClient {
    /// Create a new client without a session token
    pub fn new(config: ApiClientConfig) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            client,
            config,
            token: None,
        })
    }

    /// Attach a session token to every authenticated request
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn config(&self) -> &ApiClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        endpoint(&self.config.base_url, path)
    }

    fn authed(&self, builder: RequestBuilder) -> ApiResult<RequestBuilder> {
        match &self.token {
            Some(token) => Ok(builder.bearer_auth(token)),
            None => Err(ApiError::Unauthorized),
        }
    }

    // ============================================
    // Auth
    // ============================================

    pub async fn register(&self, request: &RegisterRequest) -> ApiResult<AuthResponse> {
        let builder = self.client.post(self.url("register")).json(request);
        send_json(builder).await
    }

    pub async fn login(&self, email: &str, password: &str) -> ApiResult<AuthResponse> {
        let body = LoginRequest {
            email: email.trim().to_lowercase(),
            password: password.to_string(),
        };
        let builder = self.client.post(self.url("login")).json(&body);
        send_json(builder).await
    }

    // ============================================
    // Profile
    // ============================================

    pub async fn profile(&self) -> ApiResult<UserProfile> {
        let builder = self.authed(self.client.get(self.url("profile")))?;
        let resp: ProfileResponse = send_json(builder).await?;
        Ok(resp.user)
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> ApiResult<UserProfile> {
        let builder = self.authed(self.client.put(self.url("profile")).json(update))?;
        let resp: ProfileUpdateResponse = send_json(builder).await?;
        Ok(resp.user)
    }

    pub async fn update_preferences(&self, preferences: Preferences) -> ApiResult<()> {
        let body = PreferencesUpdate { preferences };
        let builder = self.authed(self.client.put(self.url("profile/preferences")).json(&body))?;
        let _: MessageResponse = send_json(builder).await?;
        Ok(())
    }

    async fn get_authed<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let builder = self.authed(self.client.get(self.url(path)))?;
        send_json(builder).await
    }

    async fn post_authed<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let builder = self.authed(self.client.post(self.url(path)).json(body))?;
        send_json(builder).await
    }
}

#[async_trait(?Send)]
impl DeviceApi for ApiClient {
    async fn device_info(&self) -> ApiResult<Option<DeviceInfo>> {
        let resp: DeviceInfoResponse = self.get_authed("device/info").await?;
        Ok(resp.into_device())
    }

    async fn link_device(&self, device_id: &str) -> ApiResult<Option<DeviceInfo>> {
        let body = LinkRequest {
            device_id: device_id.to_string(),
        };
        let resp: LinkResponse = self.post_authed("device/link", &body).await?;
        tracing::info!(device_id, "Device linked");
        Ok(resp.device_info)
    }

    async fn unlink_device(&self) -> ApiResult<()> {
        let _: MessageResponse = self.post_authed("device/unlink", &serde_json::json!({})).await?;
        tracing::info!("Device unlinked");
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

/// Send a request and decode a 2xx JSON body
async fn send_json<T: DeserializeOwned>(builder: RequestBuilder) -> ApiResult<T> {
    let response = builder.send().await.map_err(map_transport)?;
    decode(response).await
}

async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        tracing::debug!(status = status.as_u16(), body = %text, "Request rejected");
        return Err(ApiError::rejected(status.as_u16(), &text));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| ApiError::Decode(e.to_string()))
}

fn map_transport(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Network("request timed out".to_string())
    } else if e.is_decode() {
        ApiError::Decode(e.to_string())
    } else {
        ApiError::Network(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApiClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:5001/api");
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn test_url_building() {
        let client = ApiClient::new(ApiClientConfig {
            base_url: "http://example.test/api/".into(),
            request_timeout_secs: 5,
        })
        .unwrap();
        assert_eq!(client.url("device/info"), "http://example.test/api/device/info");
    }

    #[tokio::test]
    async fn test_authenticated_call_without_token() {
        let client = ApiClient::new(ApiClientConfig::default()).unwrap();
        let err = client.device_info().await.unwrap_err();
        assert!(err.is_unauthorized());
    }
}
