//! API Error Types
//!
//! Client-side failures of a REST call, split the way the UI reacts to them:
//! a 401 ends the session, a rejection shows the server's message, a
//! transport failure shows a generic network notice.

use thiserror::Error;

/// Shown when the backend cannot be reached
pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please try again.";

/// API error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Missing, expired or invalid token
    #[error("Unauthorized")]
    Unauthorized,

    /// Non-2xx response; `message` is the server's `error` string when present
    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The request never produced a response
    #[error("Network error: {0}")]
    Network(String),

    /// A 2xx response whose body did not match the expected shape
    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Build a rejection from a status and raw body, preferring `{"error": ...}`
    pub fn rejected(status: u16, body: &str) -> Self {
        if status == 401 {
            return Self::Unauthorized;
        }

        let message = serde_json::from_str::<super::dto::ErrorBody>(body)
            .map(|b| b.error)
            .unwrap_or_else(|_| body.trim().to_string());

        Self::Rejected { status, message }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// Text for a user-facing notice, with a fallback for empty server messages
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Unauthorized => "Session expired. Please log in again.".to_string(),
            Self::Rejected { message, .. } if !message.is_empty() => message.clone(),
            Self::Rejected { .. } | Self::Decode(_) => fallback.to_string(),
            Self::Network(_) => NETWORK_ERROR_MESSAGE.to_string(),
        }
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_prefers_error_field() {
        let err = ApiError::rejected(400, r#"{"error": "Device is already linked to another user"}"#);
        assert_eq!(
            err,
            ApiError::Rejected {
                status: 400,
                message: "Device is already linked to another user".into()
            }
        );
    }

    #[test]
    fn test_rejected_401_is_unauthorized() {
        assert!(ApiError::rejected(401, r#"{"message": "Token is invalid"}"#).is_unauthorized());
    }

    #[test]
    fn test_user_message_fallbacks() {
        let empty = ApiError::rejected(500, "");
        assert_eq!(empty.user_message("Failed to link device"), "Failed to link device");

        let network = ApiError::Network("connection refused".into());
        assert_eq!(network.user_message("ignored"), NETWORK_ERROR_MESSAGE);
    }
}
