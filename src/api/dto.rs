//! Data Transfer Objects
//!
//! Request and response bodies of the backend REST API.
//! These types are serialized/deserialized to/from JSON.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::vitals::VitalReading;

// ============================================
// DEVICE DTOs
// ============================================

/// A device associated with the current user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub device_id: String,
    #[serde(default)]
    pub device_type: Option<String>,
    /// ISO-8601 link time as sent by the backend
    #[serde(default)]
    pub linked_at: Option<String>,
}

/// `GET /device/info`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceInfoResponse {
    #[serde(default)]
    pub has_device: bool,
    #[serde(default)]
    pub device_info: Option<DeviceInfo>,
}

impl DeviceInfoResponse {
    /// The linked device, if the backend reports one
    pub fn into_device(self) -> Option<DeviceInfo> {
        if self.has_device {
            self.device_info
        } else {
            None
        }
    }
}

/// `POST /device/link` body
#[derive(Debug, Clone, Serialize)]
pub struct LinkRequest {
    pub device_id: String,
}

/// `POST /device/link` response
#[derive(Debug, Clone, Deserialize)]
pub struct LinkResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub device_info: Option<DeviceInfo>,
}

/// Responses that only carry a message
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

/// Historical samples as parallel arrays
///
/// The backend writes `0` for samples a device did not report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceSeries {
    #[serde(default)]
    pub timestamps: Vec<Option<String>>,
    #[serde(default)]
    pub heart_rate: Vec<Option<f64>>,
    #[serde(default)]
    pub spo2: Vec<Option<f64>>,
    /// Fahrenheit
    #[serde(default)]
    pub temperature: Vec<Option<f64>>,
    #[serde(default)]
    pub ecg_data: Vec<Option<Vec<f64>>>,
}

impl DeviceSeries {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Most recent non-empty waveform
    pub fn latest_waveform(&self) -> Option<&[f64]> {
        self.ecg_data
            .iter()
            .rev()
            .flatten()
            .find(|w| !w.is_empty())
            .map(Vec::as_slice)
    }
}

/// `GET /device/data?hours=N`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceDataResponse {
    #[serde(default)]
    pub has_device: bool,
    #[serde(default)]
    pub data: Option<DeviceSeries>,
}

/// `GET /device/data/latest`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LatestDataResponse {
    #[serde(default)]
    pub has_device: bool,
    #[serde(default)]
    pub has_data: bool,
    #[serde(default)]
    pub latest_data: Option<VitalReading>,
    #[serde(default)]
    pub message: Option<String>,
}

impl LatestDataResponse {
    pub fn into_reading(self) -> Option<VitalReading> {
        if self.has_device && self.has_data {
            self.latest_data
        } else {
            None
        }
    }
}

// ============================================
// PROFILE DTOs
// ============================================

/// Privacy and notification preferences
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub marketing_emails: bool,
    #[serde(default)]
    pub sms_notifications: bool,
    #[serde(default)]
    pub data_sharing: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyContact {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub relationship: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Health profile stored under `metadata`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthMetadata {
    /// Centimetres
    #[serde(default)]
    pub height: Option<f64>,
    /// Kilograms
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub blood_type: Option<String>,
    #[serde(default)]
    pub allergies: Option<String>,
    #[serde(default)]
    pub medications: Option<String>,
    #[serde(default)]
    pub medical_conditions: Option<String>,
    #[serde(default)]
    pub emergency_contact: Option<EmergencyContact>,
    #[serde(default)]
    pub preferences: Option<Preferences>,
}

/// The user object stored in the session and returned by the profile API
///
/// Unknown fields are kept so that a stored profile round-trips untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub metadata: Option<HealthMetadata>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    /// Name for greetings, falling back to the email
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or(self.email.as_deref())
            .unwrap_or("User")
    }
}

/// `GET /profile`
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileResponse {
    pub user: UserProfile,
}

/// `PUT /profile` body
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HealthMetadata>,
}

/// `PUT /profile` response
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileUpdateResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub user: UserProfile,
}

/// `PUT /profile/preferences` body
#[derive(Debug, Clone, Serialize)]
pub struct PreferencesUpdate {
    pub preferences: Preferences,
}

// ============================================
// AUTH DTOs
// ============================================

/// `POST /register` body
#[derive(Debug, Clone, Default, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

/// `POST /login` body
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Returned by both register and login
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
    #[serde(default)]
    pub message: Option<String>,
}

/// Error body the backend sends with non-2xx responses
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_device_info_response() {
        let linked: DeviceInfoResponse = serde_json::from_value(json!({
            "has_device": true,
            "device_info": {"device_id": "ESP32-001", "device_type": "ESP32", "linked_at": null}
        }))
        .unwrap();
        assert_eq!(linked.into_device().unwrap().device_id, "ESP32-001");

        let unlinked: DeviceInfoResponse =
            serde_json::from_value(json!({"has_device": false, "message": "No device linked"})).unwrap();
        assert!(unlinked.into_device().is_none());
    }

    #[test]
    fn test_series_with_nulls() {
        let series: DeviceSeries = serde_json::from_value(json!({
            "timestamps": ["2024-05-01T10:00:00", null],
            "heart_rate": [72, 0],
            "spo2": [98, null],
            "temperature": [98.6, 0],
            "temperature_c": [37.0, 0],
            "ecg_data": [[0.1, 0.2], null]
        }))
        .unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.spo2[1], None);
        assert_eq!(series.latest_waveform(), Some(&[0.1, 0.2][..]));
    }

    #[test]
    fn test_latest_without_data() {
        let resp: LatestDataResponse = serde_json::from_value(json!({
            "has_device": true,
            "has_data": false,
            "message": "No device data found"
        }))
        .unwrap();
        assert!(resp.into_reading().is_none());
    }

    #[test]
    fn test_user_profile_keeps_unknown_fields() {
        let value = json!({
            "id": 7,
            "email": "a@b.c",
            "name": "Ada",
            "has_health_profile": true
        });
        let user: UserProfile = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(user.display_name(), "Ada");
        assert_eq!(user.extra.get("has_health_profile"), Some(&json!(true)));

        let back = serde_json::to_value(&user).unwrap();
        assert_eq!(back["has_health_profile"], json!(true));
    }

    #[test]
    fn test_profile_update_skips_absent_fields() {
        let update = ProfileUpdate {
            name: Some("Ada".into()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&update).unwrap(), json!({"name": "Ada"}));
    }
}
