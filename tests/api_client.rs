//! REST client against a mock backend

use axum::{
    extract::Query,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;

use vitalwatch::api::client::ApiClientConfig;
use vitalwatch::api::{ApiClient, ApiError, DeviceApi};

const TOKEN: &str = "test-token";

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", TOKEN))
        .unwrap_or(false)
}

async fn device_info(headers: HeaderMap) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Invalid token" })));
    }
    (
        StatusCode::OK,
        Json(json!({
            "has_device": true,
            "device_info": { "device_id": "ESP32-001", "device_type": "ESP32", "linked_at": "2024-01-01T00:00:00Z" }
        })),
    )
}

async fn link(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Invalid token" })));
    }
    if body["device_id"] == "TAKEN" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Device already linked to another account" })),
        );
    }
    (StatusCode::OK, Json(json!({ "message": "Device linked" })))
}

async fn device_data(headers: HeaderMap, Query(query): Query<HashMap<String, String>>) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Invalid token" })));
    }
    let hours = query.get("hours").cloned().unwrap_or_default();
    (
        StatusCode::OK,
        Json(json!({
            "has_device": true,
            "data": {
                "timestamps": ["2024-01-01T00:00:00Z", format!("hours={}", hours)],
                "heart_rate": [72, 0],
                "spo2": [98, 0],
                "temperature": [98.6, 0],
                "ecg_data": [null, [0.1, 0.2]]
            }
        })),
    )
}

async fn latest(headers: HeaderMap) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Invalid token" })));
    }
    (
        StatusCode::OK,
        Json(json!({
            "has_device": true,
            "has_data": true,
            "latest_data": {
                "device_id": "ESP32-001",
                "timestamp": "2024-01-01T00:00:00Z",
                "heart_rate": 72,
                "spo2": 98,
                "temperature": 98.6
            }
        })),
    )
}

async fn login(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["email"] != "ada@example.com" || body["password"] != "secret" {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Invalid email or password" })));
    }
    (
        StatusCode::OK,
        Json(json!({
            "token": TOKEN,
            "user": { "id": 1, "email": "ada@example.com", "name": "Ada" },
            "message": "Login successful"
        })),
    )
}

async fn spawn_backend() -> String {
    let app = Router::new()
        .route("/api/login", post(login))
        .route("/api/device/info", get(device_info))
        .route("/api/device/link", post(link))
        .route("/api/device/data", get(device_data))
        .route("/api/device/data/latest", get(latest));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/api", addr)
}

fn client(base_url: String) -> ApiClient {
    ApiClient::new(ApiClientConfig {
        base_url,
        request_timeout_secs: 5,
    })
    .unwrap()
}

#[tokio::test]
async fn test_login_lowercases_email() {
    let base = spawn_backend().await;
    let auth = client(base).login("  Ada@Example.COM ", "secret").await.unwrap();
    assert_eq!(auth.token, TOKEN);
    assert_eq!(auth.user.display_name(), "Ada");
}

#[tokio::test]
async fn test_bearer_token_sent() {
    let base = spawn_backend().await;
    let api = client(base).with_token(TOKEN);

    let device = api.device_info().await.unwrap().unwrap();
    assert_eq!(device.device_id, "ESP32-001");

    let reading = api.latest_data().await.unwrap().unwrap();
    assert_eq!(reading.heart_rate_bpm, Some(72.0));
    assert_eq!(reading.spo2_percent, Some(98.0));
}

#[tokio::test]
async fn test_bad_token_is_unauthorized() {
    let base = spawn_backend().await;
    let api = client(base).with_token("stale");

    let err = api.device_info().await.unwrap_err();
    assert_eq!(err, ApiError::Unauthorized);
}

#[tokio::test]
async fn test_rejection_carries_server_error() {
    let base = spawn_backend().await;
    let api = client(base).with_token(TOKEN);

    let err = api.link_device("TAKEN").await.unwrap_err();
    assert_eq!(
        err,
        ApiError::Rejected {
            status: 400,
            message: "Device already linked to another account".into()
        }
    );
    assert_eq!(err.user_message("Failed to link device"), "Device already linked to another account");

    assert!(api.link_device("ESP32-002").await.unwrap().is_none());
}

#[tokio::test]
async fn test_history_passes_hours() {
    let base = spawn_backend().await;
    let api = client(base).with_token(TOKEN);

    let series = api.device_data(168).await.unwrap().unwrap();
    assert_eq!(series.len(), 2);
    assert_eq!(series.timestamps[1].as_deref(), Some("hours=168"));
    assert_eq!(series.latest_waveform(), Some(&[0.1, 0.2][..]));
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(format!("http://{}/api", addr))
        .with_token(TOKEN)
        .device_info()
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
}
